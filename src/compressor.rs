use flate2::{Compress, Compression, Crc, FlushCompress, Status};
use tracing::trace;

use crate::config::{FlushMode, Framing, MIN_BLOCK_SIZE};
use crate::error::{LoggerError, Result};
use crate::sink::Sink;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_METHOD_DEFLATE: u8 = 8;
const GZIP_OS_UNKNOWN: u8 = 0xff;

/// Streaming deflate writer with a fixed output block.
///
/// Every call to [`write_segment`](Self::write_segment) compresses its input
/// and ends with a flush, so the bytes handed to the sink so far always form
/// a decodable prefix of the stream. The engine and the output block are
/// allocated once in [`new`](Self::new); writing never reallocates.
///
/// The stream is finalized exactly once by [`finish`](Self::finish).
///
/// `flate2`'s `GzEncoder` and `ZlibEncoder` pick their own flush points and
/// buffer sizes, so the engine is driven through [`Compress`] directly and
/// the gzip header and trailer are written here.
pub struct StreamingCompressor<S: Sink> {
    engine: Compress,
    block: Box<[u8]>,
    sink: Option<S>,
    framing: Framing,
    level: u32,
    flush: FlushCompress,
    crc: Crc,
    started: bool,
    finished: bool,
}

impl<S: Sink> StreamingCompressor<S> {
    /// Sets up a compression context writing `block_size` byte blocks.
    pub fn new(
        sink: S,
        level: u32,
        block_size: usize,
        framing: Framing,
        flush_mode: FlushMode,
    ) -> Result<Self> {
        if level > 9 {
            return Err(LoggerError::Config(format!(
                "compression level must be 0..=9, got {level}"
            )));
        }
        if block_size < MIN_BLOCK_SIZE {
            return Err(LoggerError::Config(format!(
                "block_size must be at least {MIN_BLOCK_SIZE}, got {block_size}"
            )));
        }

        // zlib framing is produced by the engine itself; gzip is framed here.
        let zlib_header = framing == Framing::Zlib;
        Ok(Self {
            engine: Compress::new(Compression::new(level), zlib_header),
            block: vec![0u8; block_size].into_boxed_slice(),
            sink: Some(sink),
            framing,
            level,
            flush: flush_mode.into(),
            crc: Crc::new(),
            started: false,
            finished: false,
        })
    }

    /// Compresses `input` and flushes, emitting as many blocks as needed.
    pub fn write_segment(&mut self, input: &[u8]) -> Result<()> {
        if self.finished {
            return Err(LoggerError::Closed);
        }
        self.start()?;
        if self.framing == Framing::Gzip {
            self.crc.update(input);
        }

        let flush = self.flush;
        let mut remaining = input;
        let mut blocks = 0usize;
        loop {
            let (consumed, produced, _) = self.step(remaining, flush)?;
            remaining = &remaining[consumed..];
            if produced > 0 {
                self.emit(produced)?;
                blocks += 1;
            }

            if remaining.is_empty() {
                // The flush ran and left room in the block: nothing is pending.
                // A drain call that only repeats the flush emits a marker
                // shorter than MIN_BLOCK_SIZE, so this branch is always reached.
                if produced < self.block.len() {
                    break;
                }
            } else if consumed == 0 && produced == 0 {
                return Err(LoggerError::Compression(
                    "engine made no progress on pending input".into(),
                ));
            }
        }

        trace!(input = input.len(), blocks, "segment flushed");
        Ok(())
    }

    /// Drains the engine, writes the container trailer and flushes the sink.
    ///
    /// Only the first call does anything.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.start()?;

        loop {
            let (_, produced, status) = self.step(&[], FlushCompress::Finish)?;
            if produced > 0 {
                self.emit(produced)?;
            }
            if status == Status::StreamEnd {
                break;
            }
            if produced == 0 {
                return Err(LoggerError::Compression(
                    "engine stalled while finishing the stream".into(),
                ));
            }
        }

        if self.framing == Framing::Gzip {
            let mut trailer = [0u8; 8];
            trailer[..4].copy_from_slice(&self.crc.sum().to_le_bytes());
            trailer[4..].copy_from_slice(&self.crc.amount().to_le_bytes());
            self.sink_mut()?.write_all(&trailer)?;
        }
        self.sink_mut()?.flush()?;
        Ok(())
    }

    /// Finishes the stream, then closes the sink.
    pub fn close(&mut self) -> Result<()> {
        self.finish()?;
        self.sink_mut()?.close()?;
        Ok(())
    }

    /// Uncompressed bytes fed so far.
    pub fn bytes_in(&self) -> u64 {
        self.engine.total_in()
    }

    /// Compressed bytes produced so far, container framing excluded.
    pub fn bytes_out(&self) -> u64 {
        self.engine.total_out()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Hands the sink back; later writes fail with `Closed`.
    pub fn take_sink(&mut self) -> Option<S> {
        self.finished = true;
        self.sink.take()
    }

    /// Runs the engine once into the output block.
    fn step(&mut self, input: &[u8], flush: FlushCompress) -> Result<(usize, usize, Status)> {
        let before_in = self.engine.total_in();
        let before_out = self.engine.total_out();
        let status = self.engine.compress(input, &mut self.block, flush)?;
        let consumed = (self.engine.total_in() - before_in) as usize;
        let produced = (self.engine.total_out() - before_out) as usize;
        Ok((consumed, produced, status))
    }

    fn emit(&mut self, produced: usize) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(LoggerError::Closed)?;
        sink.write_all(&self.block[..produced])?;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        if self.framing == Framing::Gzip {
            let header = gzip_header(self.level);
            self.sink_mut()?.write_all(&header)?;
        }
        Ok(())
    }

    fn sink_mut(&mut self) -> Result<&mut S> {
        self.sink.as_mut().ok_or(LoggerError::Closed)
    }
}

fn gzip_header(level: u32) -> [u8; 10] {
    let extra_flags = match level {
        9 => 2,
        0 | 1 => 4,
        _ => 0,
    };
    [
        GZIP_MAGIC[0],
        GZIP_MAGIC[1],
        GZIP_METHOD_DEFLATE,
        0, // flags
        0, // mtime
        0,
        0,
        0,
        extra_flags,
        GZIP_OS_UNKNOWN,
    ]
}
