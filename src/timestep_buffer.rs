use crate::loggable::Loggable;

/// Size in bytes of one stored element (`f32`).
pub const ELEMENT_SIZE: usize = 4;

/// Fixed-capacity scratch area holding the latest value of every field.
///
/// The buffer is allocated once, zeroed, and never resized. Values are
/// stored as little-endian `f32`, so the bytes handed to the compressor
/// are exactly the on-disk timestep payload.
///
/// Nothing here checks field bounds; the caller resolves a field to a slot
/// range through the registry first.
pub struct TimestepBuffer {
    bytes: Box<[u8]>,
}

impl TimestepBuffer {
    /// Allocates a buffer of `capacity_bytes`, rounded down to whole elements.
    pub fn new(capacity_bytes: usize) -> Self {
        let slots = capacity_bytes / ELEMENT_SIZE;
        Self {
            bytes: vec![0u8; slots * ELEMENT_SIZE].into_boxed_slice(),
        }
    }

    /// Capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Capacity in `f32` slots.
    pub fn capacity_slots(&self) -> usize {
        self.bytes.len() / ELEMENT_SIZE
    }

    /// Narrows `values` to `f32` and stores them starting at `slot`.
    ///
    /// Panics if the range runs past the end of the buffer.
    #[inline]
    pub fn write<T: Loggable>(&mut self, slot: usize, values: &[T]) {
        let start = slot * ELEMENT_SIZE;
        let end = start + values.len() * ELEMENT_SIZE;
        let dst = &mut self.bytes[start..end];
        for (chunk, value) in dst.chunks_exact_mut(ELEMENT_SIZE).zip(values) {
            chunk.copy_from_slice(&value.to_f32().to_le_bytes());
        }
    }

    /// Reads back the value in `slot`.
    pub fn value(&self, slot: usize) -> f32 {
        let start = slot * ELEMENT_SIZE;
        let mut raw = [0u8; ELEMENT_SIZE];
        raw.copy_from_slice(&self.bytes[start..start + ELEMENT_SIZE]);
        f32::from_le_bytes(raw)
    }

    /// The first `slots` elements as raw bytes.
    #[inline]
    pub fn packed_bytes(&self, slots: usize) -> &[u8] {
        &self.bytes[..slots * ELEMENT_SIZE]
    }
}
