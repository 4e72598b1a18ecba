//! Binary header codec.
//!
//! The header is the first segment of every log:
//!
//! ```text
//! u32 format_version      (0)
//! u32 field_count
//! field_count x {
//!     [u8; 64] name       zero padded, no terminator when all 64 bytes are used
//!     u32      width
//! }
//! ```
//!
//! All integers are little-endian, independent of the host.

use std::io::Read;

use crate::error::{LoggerError, Result};
use crate::field_registry::{FieldDefinition, FIELD_NAME_LEN};

/// The only format version this crate reads or writes.
pub const FORMAT_VERSION: u32 = 0;

/// Bytes taken by `format_version` and `field_count`.
pub const PREAMBLE_LEN: usize = 8;

/// Bytes taken by one serialized field definition.
pub const FIELD_RECORD_LEN: usize = FIELD_NAME_LEN + 4;

/// Size of an encoded header for `field_count` fields.
pub const fn encoded_len(field_count: usize) -> usize {
    PREAMBLE_LEN + field_count * FIELD_RECORD_LEN
}

/// Serializes `fields` into a header.
pub fn encode_header(fields: &[FieldDefinition]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(fields.len()));
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for field in fields {
        out.extend_from_slice(field.raw_name());
        out.extend_from_slice(&field.width().to_le_bytes());
    }
    out
}

/// Parses a header from the front of `bytes`.
///
/// Returns the field list and the number of bytes consumed.
pub fn decode_header(bytes: &[u8]) -> Result<(Vec<FieldDefinition>, usize)> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(LoggerError::TruncatedHeader {
            needed: PREAMBLE_LEN,
            available: bytes.len(),
        });
    }
    let count = decode_preamble(&bytes[..PREAMBLE_LEN])?;

    let needed = encoded_len(count);
    if bytes.len() < needed {
        return Err(LoggerError::TruncatedHeader {
            needed,
            available: bytes.len(),
        });
    }

    let fields = bytes[PREAMBLE_LEN..needed]
        .chunks_exact(FIELD_RECORD_LEN)
        .map(decode_field)
        .collect::<Result<Vec<_>>>()?;
    Ok((fields, needed))
}

/// Reads a header from a stream, consuming exactly its bytes.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Vec<FieldDefinition>> {
    let mut preamble = [0u8; PREAMBLE_LEN];
    let got = read_full(reader, &mut preamble)?;
    if got < PREAMBLE_LEN {
        return Err(LoggerError::TruncatedHeader {
            needed: PREAMBLE_LEN,
            available: got,
        });
    }
    let count = decode_preamble(&preamble)?;

    // The count comes from the file, so grow as records actually arrive.
    let mut fields = Vec::with_capacity(count.min(1024));
    let mut record = [0u8; FIELD_RECORD_LEN];
    for i in 0..count {
        let got = read_full(reader, &mut record)?;
        if got < FIELD_RECORD_LEN {
            return Err(LoggerError::TruncatedHeader {
                needed: encoded_len(count),
                available: encoded_len(i) + got,
            });
        }
        fields.push(decode_field(&record)?);
    }
    Ok(fields)
}

fn decode_preamble(bytes: &[u8]) -> Result<usize> {
    let version = read_u32(&bytes[0..4]);
    if version != FORMAT_VERSION {
        return Err(LoggerError::UnsupportedVersion(version));
    }
    Ok(read_u32(&bytes[4..8]) as usize)
}

fn decode_field(record: &[u8]) -> Result<FieldDefinition> {
    let mut name = [0u8; FIELD_NAME_LEN];
    name.copy_from_slice(&record[..FIELD_NAME_LEN]);
    let width = read_u32(&record[FIELD_NAME_LEN..FIELD_RECORD_LEN]);
    if width == 0 {
        return Err(LoggerError::InvalidWidth);
    }
    Ok(FieldDefinition::from_raw(name, width))
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(raw)
}

/// Fills `buf` as far as the stream allows and returns the byte count.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("joint_positions", 4),
            FieldDefinition::new("joint_velocities", 6),
            FieldDefinition::new("slider_positions", 2),
        ]
    }

    #[test]
    fn test_layout() {
        let bytes = encode_header(&sample_fields());
        assert_eq!(bytes.len(), 8 + 3 * 68);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(&bytes[8..23], b"joint_positions");
        assert!(bytes[23..72].iter().all(|&b| b == 0));
        assert_eq!(&bytes[72..76], &4u32.to_le_bytes());
    }

    #[test]
    fn test_decode_matches_encode() {
        let fields = sample_fields();
        let bytes = encode_header(&fields);
        let (decoded, consumed) = decode_header(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, fields);
        assert_eq!(decoded[1].name(), "joint_velocities");
    }

    #[test]
    fn test_empty_header() {
        let bytes = encode_header(&[]);
        assert_eq!(bytes, vec![0u8; 8]);
        let (decoded, consumed) = decode_header(&bytes).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(consumed, 8);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = encode_header(&sample_fields());
        bytes[0] = 1;
        assert!(matches!(
            decode_header(&bytes),
            Err(LoggerError::UnsupportedVersion(1))
        ));
        assert!(matches!(
            read_header(&mut &bytes[..]),
            Err(LoggerError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = encode_header(&sample_fields());
        assert!(matches!(
            decode_header(&bytes[..5]),
            Err(LoggerError::TruncatedHeader { needed: 8, available: 5 })
        ));
        assert!(matches!(
            decode_header(&bytes[..100]),
            Err(LoggerError::TruncatedHeader { needed: 212, available: 100 })
        ));
        assert!(matches!(
            read_header(&mut &bytes[..100]),
            Err(LoggerError::TruncatedHeader { needed: 212, available: 100 })
        ));
    }

    #[test]
    fn test_full_length_name_has_no_terminator() {
        let name = "x".repeat(FIELD_NAME_LEN);
        let bytes = encode_header(&[FieldDefinition::new(&name, 1)]);
        assert!(bytes[8..72].iter().all(|&b| b == b'x'));

        let (decoded, _) = decode_header(&bytes).unwrap();
        assert_eq!(decoded[0].name(), name);
    }

    #[test]
    fn test_stream_read_stops_at_header_end() {
        let mut bytes = encode_header(&sample_fields());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());

        let mut cursor = &bytes[..];
        let fields = read_header(&mut cursor).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(cursor, &1.0f32.to_le_bytes());
    }
}
