use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use tracing::warn;

use crate::error::{LoggerError, Result};
use crate::timestep_buffer::ELEMENT_SIZE;

/// Fixed size of a field name on disk.
pub const FIELD_NAME_LEN: usize = 64;

/// Handle returned by registration and passed back to `log`.
///
/// Ids are dense: the n-th registered field has index `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named, fixed-width vector of scalars.
///
/// The name is kept in its on-disk form: 64 bytes, zero padded. A name that
/// uses all 64 bytes has no terminating zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    name: [u8; FIELD_NAME_LEN],
    width: u32,
}

impl FieldDefinition {
    /// Builds a definition, truncating `name` to at most 64 bytes.
    ///
    /// Truncation backs off to the previous UTF-8 character boundary, so the
    /// stored name is always valid UTF-8 and may be shorter than 64 bytes.
    pub fn new(name: &str, width: u32) -> Self {
        let mut end = name.len().min(FIELD_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut raw = [0u8; FIELD_NAME_LEN];
        raw[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self { name: raw, width }
    }

    /// Builds a definition from the raw on-disk name bytes.
    pub fn from_raw(name: [u8; FIELD_NAME_LEN], width: u32) -> Self {
        Self { name, width }
    }

    /// The name up to the first zero byte.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    /// The name bytes up to the first zero byte.
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FIELD_NAME_LEN);
        &self.name[..len]
    }

    /// All 64 name bytes, padding included.
    pub fn raw_name(&self) -> &[u8; FIELD_NAME_LEN] {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// Ordered, capacity-bounded set of registered fields.
///
/// Storage for `max_fields` entries is reserved up front. Each field's slot
/// offset (sum of the widths registered before it) is cached at
/// registration. Once [`freeze`](Self::freeze) is called, further
/// registrations fail with [`LoggerError::SchemaFrozen`].
///
/// # Examples
///
/// ```
/// # use data_logger::FieldRegistry;
/// let mut registry = FieldRegistry::new(8, 64);
/// let pos = registry.add_field("pos", 4).unwrap();
/// let vel = registry.add_field("vel", 6).unwrap();
///
/// assert_eq!(registry.slot_range(pos), Some(0..4));
/// assert_eq!(registry.slot_range(vel), Some(4..10));
/// assert_eq!(registry.packed_len(), 10);
/// ```
#[derive(Debug)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    offsets: Vec<usize>,
    packed_len: usize,
    max_fields: usize,
    max_slots: usize,
    frozen: bool,
}

impl FieldRegistry {
    /// Creates a registry for at most `max_fields` fields whose widths sum
    /// to at most `max_slots`.
    pub fn new(max_fields: usize, max_slots: usize) -> Self {
        Self {
            fields: Vec::with_capacity(max_fields),
            offsets: Vec::with_capacity(max_fields),
            packed_len: 0,
            max_fields,
            max_slots,
            frozen: false,
        }
    }

    /// Rebuilds a frozen registry from definitions decoded off disk.
    ///
    /// Fails with [`LoggerError::BufferCapacity`] when the widths add up to
    /// more than `max_slots`.
    pub fn from_fields(fields: Vec<FieldDefinition>, max_slots: usize) -> Result<Self> {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut packed_len = 0usize;
        for field in &fields {
            offsets.push(packed_len);
            let required = packed_len.saturating_add(field.width as usize);
            if required > max_slots {
                return Err(LoggerError::BufferCapacity {
                    required: required.saturating_mul(ELEMENT_SIZE),
                    capacity: max_slots.saturating_mul(ELEMENT_SIZE),
                });
            }
            packed_len = required;
        }

        Ok(Self {
            max_fields: fields.len(),
            fields,
            offsets,
            packed_len,
            max_slots,
            frozen: true,
        })
    }

    /// Registers a field and returns its id.
    ///
    /// On error nothing is added.
    pub fn add_field(&mut self, name: &str, width: u32) -> Result<FieldId> {
        if self.frozen {
            return Err(LoggerError::SchemaFrozen);
        }
        if width == 0 {
            return Err(LoggerError::InvalidWidth);
        }
        if self.fields.len() >= self.max_fields {
            return Err(LoggerError::RegistryFull {
                capacity: self.max_fields,
            });
        }

        let required = self.packed_len + width as usize;
        if required > self.max_slots {
            return Err(LoggerError::BufferCapacity {
                required: required * ELEMENT_SIZE,
                capacity: self.max_slots * ELEMENT_SIZE,
            });
        }

        if name.len() > FIELD_NAME_LEN {
            warn!(name, limit = FIELD_NAME_LEN, "field name truncated");
        }

        let id = FieldId(self.fields.len());
        self.fields.push(FieldDefinition::new(name, width));
        self.offsets.push(self.packed_len);
        self.packed_len = required;
        Ok(id)
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.fields.get(id.0)
    }

    /// Looks up a field by its stored (possibly truncated) name.
    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .position(|f| f.name_bytes() == name.as_bytes())
            .map(FieldId)
    }

    /// Slot offset of the field, in elements.
    pub fn offset(&self, id: FieldId) -> Option<usize> {
        self.offsets.get(id.0).copied()
    }

    /// Slots owned by the field within a timestep.
    #[inline]
    pub fn slot_range(&self, id: FieldId) -> Option<Range<usize>> {
        let offset = *self.offsets.get(id.0)?;
        let width = self.fields[id.0].width as usize;
        Some(offset..offset + width)
    }

    /// Sum of all registered widths.
    pub fn packed_len(&self) -> usize {
        self.packed_len
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldDefinition)> {
        self.fields.iter().enumerate().map(|(i, f)| (FieldId(i), f))
    }

    /// Rejects all further registrations.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
