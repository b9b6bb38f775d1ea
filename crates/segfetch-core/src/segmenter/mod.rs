//! Range math and segment planning.
//!
//! Splits a resource into N segments, computes HTTP Range header bounds,
//! and provides a per-segment completion bitmap.

mod bitmap;
mod range;

pub use bitmap::SegmentBitmap;
pub use range::{
    effective_segment_count, Segment, SegmentPlan, MAX_CONNECTION_COUNT, MAX_SEGMENT_COUNT,
};
