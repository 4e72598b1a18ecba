//! Logger configuration.
//!
//! All sizes are fixed at construction so nothing on the logging path
//! has to grow later.

use crate::error::{LoggerError, Result};
use crate::timestep_buffer::ELEMENT_SIZE;

/// Maximum number of fields a logger holds by default.
pub const DEFAULT_MAX_FIELDS: usize = 1024;

/// Default timestep buffer and compressed block size (256 kB).
pub const DEFAULT_CHUNK_SIZE: usize = 256_000;

/// Default deflate level: best compression.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Upper bound accepted for `max_fields`.
pub const MAX_FIELDS_LIMIT: usize = 65_536;

/// Upper bound accepted for `chunk_size` (64 MiB). Readers refuse files
/// whose timesteps are larger than this.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Smallest compressed output block. A bare flush marker must fit in one
/// block with room to spare, otherwise draining a flush never ends.
pub const MIN_BLOCK_SIZE: usize = 64;

/// Container wrapped around the deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// gzip member: 10-byte header, raw deflate body, CRC32 + length trailer.
    #[default]
    Gzip,
    /// zlib stream: 2-byte header, deflate body, Adler-32 trailer.
    Zlib,
}

/// Flush issued after every segment (the header and each timestep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Byte-aligned flush with an empty stored block marker.
    #[default]
    Sync,
    /// Flush without byte alignment; slightly smaller output.
    Partial,
}

impl From<FlushMode> for flate2::FlushCompress {
    fn from(mode: FlushMode) -> Self {
        match mode {
            FlushMode::Sync => flate2::FlushCompress::Sync,
            FlushMode::Partial => flate2::FlushCompress::Partial,
        }
    }
}

/// Construction-time settings for a [`DataLogger`](crate::DataLogger).
///
/// ```
/// use data_logger::{Framing, LoggerConfig};
///
/// let config = LoggerConfig::default()
///     .with_max_fields(16)
///     .with_framing(Framing::Zlib);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Upper bound on registered fields.
    pub max_fields: usize,
    /// Timestep buffer size in bytes.
    pub chunk_size: usize,
    /// Size of the compressed output block handed to the sink.
    pub block_size: usize,
    /// Deflate level, 0 to 9.
    pub compression_level: u32,
    pub framing: Framing,
    pub flush_mode: FlushMode,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_fields: DEFAULT_MAX_FIELDS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            block_size: DEFAULT_CHUNK_SIZE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            framing: Framing::default(),
            flush_mode: FlushMode::default(),
        }
    }
}

impl LoggerConfig {
    pub fn with_max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = max_fields;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_flush_mode(mut self, flush_mode: FlushMode) -> Self {
        self.flush_mode = flush_mode;
        self
    }

    /// Checks that the settings describe a usable logger.
    pub fn validate(&self) -> Result<()> {
        if self.max_fields == 0 || self.max_fields > MAX_FIELDS_LIMIT {
            return Err(LoggerError::Config(format!(
                "max_fields must be 1..={MAX_FIELDS_LIMIT}, got {}",
                self.max_fields
            )));
        }
        if self.chunk_size < ELEMENT_SIZE || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(LoggerError::Config(format!(
                "chunk_size must be {ELEMENT_SIZE}..={MAX_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(LoggerError::Config(format!(
                "block_size must be at least {MIN_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.compression_level > 9 {
            return Err(LoggerError::Config(format!(
                "compression level must be 0..=9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
