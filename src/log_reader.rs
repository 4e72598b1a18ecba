use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::config::{Framing, MAX_CHUNK_SIZE};
use crate::error::{LoggerError, Result};
use crate::field_registry::{FieldDefinition, FieldId, FieldRegistry};
use crate::header::{read_full, read_header};
use crate::timestep_buffer::ELEMENT_SIZE;

/// Decompressing front end for either container.
enum Decoder<R: Read> {
    Gzip(GzDecoder<R>),
    Zlib(ZlibDecoder<R>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decoder::Gzip(d) => d.read(buf),
            Decoder::Zlib(d) => d.read(buf),
        }
    }
}

/// Sequential decoder for files written by [`DataLogger`](crate::DataLogger).
///
/// The header is parsed on construction; timesteps are then read one at a
/// time, each as a flat vector of `f32` laid out in registration order.
///
/// Timesteps wider than [`MAX_CHUNK_SIZE`] bytes are refused when the
/// header is parsed, since no logger could have written them.
///
/// Works on streams that were never finalized: everything up to the last
/// flushed timestep decodes, and the next read reports an error.
///
/// # Examples
///
/// ```
/// use data_logger::{DataLogger, Framing, LogReader, LoggerConfig};
///
/// let mut logger = DataLogger::with_writer(Vec::new(), LoggerConfig::default())?;
/// let speed = logger.add_field("speed", 1)?;
/// logger.begin_timestep()?;
/// logger.log_scalar(speed, 2.5)?;
/// logger.end_timestep()?;
/// let bytes = logger.into_inner()?;
///
/// let mut reader = LogReader::new(&bytes[..], Framing::Gzip)?;
/// assert_eq!(reader.fields()[0].name(), "speed");
/// assert_eq!(reader.read_timestep()?, Some(vec![2.5]));
/// assert_eq!(reader.read_timestep()?, None);
/// # Ok::<(), data_logger::LoggerError>(())
/// ```
pub struct LogReader<R: Read> {
    decoder: Decoder<R>,
    registry: FieldRegistry,
    frame: Vec<u8>,
    timesteps_read: u64,
}

impl LogReader<BufReader<File>> {
    /// Opens a gzip-framed log file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_framing(path, Framing::Gzip)
    }

    pub fn open_with_framing<P: AsRef<Path>>(path: P, framing: Framing) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), framing)
    }
}

impl<R: Read> LogReader<R> {
    /// Wraps a compressed stream and parses its header.
    pub fn new(reader: R, framing: Framing) -> Result<Self> {
        let mut decoder = match framing {
            Framing::Gzip => Decoder::Gzip(GzDecoder::new(reader)),
            Framing::Zlib => Decoder::Zlib(ZlibDecoder::new(reader)),
        };
        let fields = read_header(&mut decoder)?;
        let registry = FieldRegistry::from_fields(fields, MAX_CHUNK_SIZE / ELEMENT_SIZE)?;
        let frame = vec![0u8; registry.packed_len() * ELEMENT_SIZE];

        Ok(Self {
            decoder,
            registry,
            frame,
            timesteps_read: 0,
        })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        self.registry.fields()
    }

    /// Values per timestep.
    pub fn packed_len(&self) -> usize {
        self.registry.packed_len()
    }

    pub fn timesteps_read(&self) -> u64 {
        self.timesteps_read
    }

    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.registry.find(name)
    }

    /// Reads the next timestep, or `None` at the end of the stream.
    ///
    /// A stream ending partway through a timestep yields
    /// [`LoggerError::TruncatedTimestep`].
    pub fn read_timestep(&mut self) -> Result<Option<Vec<f32>>> {
        if self.frame.is_empty() {
            return Ok(None);
        }

        let got = read_full(&mut self.decoder, &mut self.frame)?;
        if got == 0 {
            return Ok(None);
        }
        if got < self.frame.len() {
            return Err(LoggerError::TruncatedTimestep {
                expected: self.frame.len(),
                actual: got,
            });
        }

        self.timesteps_read += 1;
        let values = self
            .frame
            .chunks_exact(ELEMENT_SIZE)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Some(values))
    }

    /// The slice of `frame` that belongs to `field`.
    pub fn field_values<'f>(&self, frame: &'f [f32], field: FieldId) -> Option<&'f [f32]> {
        frame.get(self.registry.slot_range(field)?)
    }

    /// Iterates over the remaining timesteps.
    pub fn timesteps(&mut self) -> Timesteps<'_, R> {
        Timesteps { reader: self }
    }

    /// Reads every remaining timestep.
    pub fn read_all(&mut self) -> Result<Vec<Vec<f32>>> {
        self.timesteps().collect()
    }
}

/// Iterator returned by [`LogReader::timesteps`].
pub struct Timesteps<'a, R: Read> {
    reader: &'a mut LogReader<R>,
}

impl<R: Read> Iterator for Timesteps<'_, R> {
    type Item = Result<Vec<f32>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_timestep().transpose()
    }
}
