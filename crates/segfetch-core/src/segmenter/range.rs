//! Segment type and range planning.

use crate::error::ValidationError;

/// A single segment: byte range [start, end) (half-open) of the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Position in the plan (0-based).
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Segment {
    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive end offset, or `None` for an empty segment.
    pub fn last_byte(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }
}

/// Upper bound on concurrent connections (worker threads) per run.
pub const MAX_CONNECTION_COUNT: usize = 256;
/// Upper bound on the requested segment count. Plan, queue and completion
/// bitmap are all sized by it.
pub const MAX_SEGMENT_COUNT: usize = 1 << 16;

/// Normalizes the requested segment count against the connection count.
///
/// Auto (0) or anything below `connections` becomes `connections`, so every
/// connection gets at least one segment.
pub fn effective_segment_count(
    requested: usize,
    connections: usize,
) -> Result<usize, ValidationError> {
    if connections == 0 {
        return Err(ValidationError::ConnectionCount(0));
    }
    if connections > MAX_CONNECTION_COUNT {
        return Err(ValidationError::TooManyConnections {
            got: connections,
            max: MAX_CONNECTION_COUNT,
        });
    }
    if requested > MAX_SEGMENT_COUNT {
        return Err(ValidationError::TooManySegments {
            got: requested,
            max: MAX_SEGMENT_COUNT,
        });
    }
    if requested == 0 || requested < connections {
        Ok(connections)
    } else {
        Ok(requested)
    }
}

/// Immutable partition of `[0, total_size)` into ordered segments.
///
/// Every segment but the last has `floor(total_size / n)` bytes; the last one
/// absorbs the remainder and always ends at `total_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    segment_size: u64,
    segments: Vec<Segment>,
}

impl SegmentPlan {
    /// Builds the plan. A zero-length resource yields a plan with no segments.
    pub fn new(
        total_size: u64,
        requested: usize,
        connections: usize,
    ) -> Result<Self, ValidationError> {
        let count = effective_segment_count(requested, connections)?;
        if total_size == 0 {
            return Ok(SegmentPlan {
                segment_size: 0,
                segments: Vec::new(),
            });
        }

        let segment_size = total_size / count as u64;
        let segments = (0..count)
            .map(|index| {
                let i = index as u64;
                let start = i * segment_size;
                let end = if index == count - 1 {
                    total_size
                } else {
                    (i + 1) * segment_size
                };
                Segment { index, start, end }
            })
            .collect();

        Ok(SegmentPlan {
            segment_size,
            segments,
        })
    }

    /// Size of every segment except (possibly) the last.
    pub fn segment_size(&self) -> u64 {
        self.segment_size
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
