//! # Data Logger
//!
//! A real-time friendly logger for control loops. Fixed-width numeric
//! vectors ("fields") are captured once per timestep and streamed to disk
//! as a compressed, self-describing binary file.
//!
//! * **Allocation-free hot path**: [`DataLogger::log`] copies into a buffer
//!   sized at construction and never touches the disk
//! * **Segmented compression**: the header and every timestep end with a
//!   deflate flush, so a file cut short still decodes up to its last
//!   complete timestep
//! * **Plain container**: output is a standard gzip (or zlib) stream
//!
//! ## File layout
//!
//! ```text
//! compressed stream of:
//!   header:    u32 version (0) | u32 field_count | field_count x ([u8; 64] name | u32 width)
//!   timestep:  sum(width) x f32, fields in registration order
//!   timestep:  ...
//! ```
//!
//! Integers and floats are little-endian.
//!
//! ## Main Components
//!
//! * [`DataLogger`]: registration, timestep rhythm, file lifecycle
//! * [`FieldRegistry`]: field names, widths and cached offsets
//! * [`StreamingCompressor`]: deflate engine writing fixed-size blocks
//! * [`LogReader`]: decoder for written files
//!
//! ## Quick Start
//!
//! ```
//! use data_logger::{DataLogger, LogReader};
//!
//! let path = std::env::temp_dir().join("data_logger_quick_start.mds");
//!
//! let mut logger = DataLogger::create(&path)?;
//! let joints = logger.add_field("joint_positions", 4)?;
//! let sliders = logger.add_field("slider_positions", 2)?;
//!
//! logger.begin_timestep()?;
//! logger.log(joints, &[1.0, 2.0, 3.0, 4.0])?;
//! logger.log(sliders, &[11.0, 12.0])?;
//! logger.end_timestep()?;
//! logger.close_file()?;
//!
//! let mut reader = LogReader::open(&path)?;
//! assert_eq!(reader.fields().len(), 2);
//! assert_eq!(
//!     reader.read_timestep()?,
//!     Some(vec![1.0, 2.0, 3.0, 4.0, 11.0, 12.0])
//! );
//! # std::fs::remove_file(&path)?;
//! # Ok::<(), data_logger::LoggerError>(())
//! ```

pub mod compressor;
pub mod config;
pub mod data_logger;
pub mod error;
pub mod field_registry;
pub mod header;
pub mod log_reader;
pub mod loggable;
pub mod sink;
pub mod timestep_buffer;

pub use compressor::StreamingCompressor;
pub use config::{
    FlushMode, Framing, LoggerConfig, MAX_CHUNK_SIZE, MAX_FIELDS_LIMIT, MIN_BLOCK_SIZE,
};
pub use data_logger::DataLogger;
pub use error::{LoggerError, Result};
pub use field_registry::{FieldDefinition, FieldId, FieldRegistry, FIELD_NAME_LEN};
pub use log_reader::LogReader;
pub use loggable::Loggable;
pub use sink::{FileSink, Sink};
