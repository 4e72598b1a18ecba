use std::path::Path;

use tracing::{debug, error, info, trace};

use crate::compressor::StreamingCompressor;
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::field_registry::{FieldDefinition, FieldId, FieldRegistry};
use crate::header::encode_header;
use crate::loggable::Loggable;
use crate::sink::{FileSink, Sink};
use crate::timestep_buffer::{TimestepBuffer, ELEMENT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Faulted,
    Closed,
}

/// Records fixed-width numeric fields once per timestep into a compressed
/// stream.
///
/// Usage follows a fixed rhythm:
///
/// 1. Register every field with [`add_field`](Self::add_field).
/// 2. Per control-loop iteration call [`begin_timestep`](Self::begin_timestep),
///    then [`log`](Self::log) each field, then
///    [`end_timestep`](Self::end_timestep).
/// 3. Call [`close_file`](Self::close_file) once at shutdown.
///
/// The first `begin_timestep` writes the header and freezes the schema.
///
/// # Real-time behaviour
///
/// `log` only copies into a buffer allocated at construction: no allocation,
/// no I/O, bounded by the field width. `end_timestep` and `close_file`
/// compress and issue blocking writes; keep them off a hard-deadline thread
/// if that matters.
///
/// # Thread Safety
///
/// A logger has a single owner. It is never shared between threads and
/// provides no locking.
///
/// # Stale values
///
/// A field that is not logged during a timestep keeps whatever it held
/// before (zero if it was never logged). Log every field every timestep.
///
/// # Examples
///
/// ```
/// use data_logger::DataLogger;
///
/// let path = std::env::temp_dir().join("data_logger_doc_example.mds");
/// let mut logger = DataLogger::create(&path)?;
/// let position = logger.add_field("position", 3)?;
///
/// for step in 0..10 {
///     logger.begin_timestep()?;
///     logger.log(position, &[step as f64, 0.0, 1.0])?;
///     logger.end_timestep()?;
/// }
/// logger.close_file()?;
/// # std::fs::remove_file(&path)?;
/// # Ok::<(), data_logger::LoggerError>(())
/// ```
pub struct DataLogger<S: Sink = FileSink> {
    registry: FieldRegistry,
    buffer: TimestepBuffer,
    compressor: StreamingCompressor<S>,
    header_written: bool,
    state: State,
    timesteps: u64,
}

impl DataLogger<FileSink> {
    /// Opens `path` for truncating writes with the default configuration.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_config(path, LoggerConfig::default())
    }

    /// Opens `path` for truncating writes.
    pub fn create_with_config<P: AsRef<Path>>(path: P, config: LoggerConfig) -> Result<Self> {
        config.validate()?;
        let sink = FileSink::create(path)?;
        Self::with_writer(sink, config)
    }
}

impl<S: Sink> DataLogger<S> {
    /// Builds a logger writing into an arbitrary sink.
    ///
    /// All buffers are allocated here and nothing is written until the
    /// first timestep.
    pub fn with_writer(sink: S, config: LoggerConfig) -> Result<Self> {
        config.validate()?;
        let buffer = TimestepBuffer::new(config.chunk_size);
        let registry = FieldRegistry::new(config.max_fields, buffer.capacity_slots());
        let compressor = StreamingCompressor::new(
            sink,
            config.compression_level,
            config.block_size,
            config.framing,
            config.flush_mode,
        )?;

        debug!(
            max_fields = config.max_fields,
            chunk_size = config.chunk_size,
            level = config.compression_level,
            framing = ?config.framing,
            "data logger ready"
        );

        Ok(Self {
            registry,
            buffer,
            compressor,
            header_written: false,
            state: State::Open,
            timesteps: 0,
        })
    }

    /// Registers a field of `width` scalars and returns its handle.
    ///
    /// Names longer than 64 bytes are truncated. Fails once the header has
    /// been written.
    pub fn add_field(&mut self, name: &str, width: u32) -> Result<FieldId> {
        self.check_open()?;
        let id = self.registry.add_field(name, width)?;
        debug!(field = %id, name, width, "field registered");
        Ok(id)
    }

    /// Starts a timestep, writing the header on the first call.
    pub fn begin_timestep(&mut self) -> Result<()> {
        self.check_open()?;
        if !self.header_written {
            self.write_header()?;
        }
        Ok(())
    }

    /// Stores `values` as the current value of `field`.
    ///
    /// `values.len()` must equal the field's width; on mismatch the buffer
    /// is left untouched. Logging the same field twice in one timestep keeps
    /// the last values.
    #[inline]
    pub fn log<T: Loggable>(&mut self, field: FieldId, values: &[T]) -> Result<()> {
        self.check_open()?;
        let range = self
            .registry
            .slot_range(field)
            .ok_or(LoggerError::UnknownField(field))?;
        if values.len() != range.len() {
            return Err(LoggerError::SizeMismatch {
                field,
                expected: range.len(),
                actual: values.len(),
            });
        }
        self.buffer.write(range.start, values);
        Ok(())
    }

    /// Stores a single value into a width-1 field.
    #[inline]
    pub fn log_scalar<T: Loggable>(&mut self, field: FieldId, value: T) -> Result<()> {
        self.log(field, &[value])
    }

    /// Compresses the current timestep and writes it out.
    ///
    /// Writes the header first if `begin_timestep` was never called.
    pub fn end_timestep(&mut self) -> Result<()> {
        self.check_open()?;
        if !self.header_written {
            self.write_header()?;
        }

        let slots = self.registry.packed_len();
        let result = self
            .compressor
            .write_segment(self.buffer.packed_bytes(slots));
        self.track(result)?;

        self.timesteps += 1;
        trace!(timestep = self.timesteps, bytes = slots * ELEMENT_SIZE, "timestep written");
        Ok(())
    }

    /// Finalizes the compressed stream and closes the sink.
    ///
    /// A logger that never saw a timestep still produces a valid,
    /// header-only file. Calling this again is a no-op.
    pub fn close_file(&mut self) -> Result<()> {
        match self.state {
            State::Closed => return Ok(()),
            State::Faulted => {
                self.state = State::Closed;
                return Err(LoggerError::Faulted);
            }
            State::Open => {}
        }

        if !self.header_written {
            self.write_header()?;
        }
        let result = self.compressor.close();
        self.track(result)?;
        self.state = State::Closed;

        info!(
            timesteps = self.timesteps,
            bytes_in = self.compressor.bytes_in(),
            bytes_out = self.compressor.bytes_out(),
            "log file closed"
        );
        Ok(())
    }

    /// Closes the logger and returns the sink.
    pub fn into_inner(mut self) -> Result<S> {
        self.close_file()?;
        self.compressor.take_sink().ok_or(LoggerError::Closed)
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Value currently held in the timestep buffer for `field`.
    pub fn current_values(&self, field: FieldId) -> Option<Vec<f32>> {
        let range = self.registry.slot_range(field)?;
        Some(range.map(|slot| self.buffer.value(slot)).collect())
    }

    /// Bytes written per timestep.
    pub fn timestep_size(&self) -> usize {
        self.registry.packed_len() * ELEMENT_SIZE
    }

    pub fn timestep_count(&self) -> u64 {
        self.timesteps
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    pub fn is_faulted(&self) -> bool {
        self.state == State::Faulted
    }

    fn write_header(&mut self) -> Result<()> {
        self.registry.freeze();
        let header = encode_header(self.registry.fields());
        let result = self.compressor.write_segment(&header);
        self.track(result)?;
        self.header_written = true;
        debug!(
            fields = self.registry.len(),
            timestep_size = self.timestep_size(),
            "header written"
        );
        Ok(())
    }

    #[inline]
    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Faulted => Err(LoggerError::Faulted),
            State::Closed => Err(LoggerError::Closed),
        }
    }

    /// Marks the logger faulted when `result` carries an integrity error.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                error!(error = %e, "output stream is no longer trustworthy");
                self.state = State::Faulted;
            }
        }
        result
    }
}

impl<S: Sink> Drop for DataLogger<S> {
    fn drop(&mut self) {
        if self.state == State::Open {
            if let Err(e) = self.close_file() {
                error!(error = %e, "failed to close log on drop");
            }
        }
    }
}
