//! Segment completion bitmap.

/// One bit per segment (LSB of byte 0 = segment 0), plus a count of set bits.
#[derive(Debug, Clone, Default)]
pub struct SegmentBitmap {
    bytes: Vec<u8>,
    completed: usize,
}

impl SegmentBitmap {
    /// New empty bitmap with capacity for `segment_count` bits.
    pub fn new(segment_count: usize) -> Self {
        let len = (segment_count + 7) / 8;
        SegmentBitmap {
            bytes: vec![0u8; len],
            completed: 0,
        }
    }

    /// Mark segment at `index` as completed. Returns false if it already was.
    pub fn set_completed(&mut self, index: usize) -> bool {
        let byte_idx = index / 8;
        let bit = index % 8;
        if byte_idx >= self.bytes.len() {
            self.bytes.resize(byte_idx + 1, 0);
        }
        if self.bytes[byte_idx] & (1 << bit) != 0 {
            return false;
        }
        self.bytes[byte_idx] |= 1 << bit;
        self.completed += 1;
        true
    }

    /// Number of distinct segments marked completed.
    pub fn completed_count(&self) -> usize {
        self.completed
    }

    /// True if all segments in [0, segment_count) are completed.
    pub fn all_completed(&self, segment_count: usize) -> bool {
        if segment_count == 0 {
            return true;
        }
        let full_bytes = segment_count / 8;
        let remainder_bits = segment_count % 8;

        for (i, &b) in self.bytes.iter().enumerate() {
            let expected = if i < full_bytes {
                0xFF
            } else if i == full_bytes && remainder_bits > 0 {
                (1u8 << remainder_bits) - 1
            } else {
                break;
            };
            if (b & expected) != expected {
                return false;
            }
        }

        let needed_bytes = (segment_count + 7) / 8;
        self.bytes.len() >= needed_bytes
    }
}
