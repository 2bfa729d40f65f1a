//! Segment plan value object.

use std::time::Duration;

/// Which part of a video to play.
///
/// Built once per asset by the [`SegmentPlanner`](crate::SegmentPlanner) and
/// never changed afterwards; loading a new asset produces a new plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VideoSegmentPlan {
    is_segmented: bool,
    segment_start: Duration,
    segment_end: Duration,
}

impl VideoSegmentPlan {
    /// Play the whole video.
    pub const fn full() -> Self {
        Self {
            is_segmented: false,
            segment_start: Duration::ZERO,
            segment_end: Duration::ZERO,
        }
    }

    /// Play `[start, end)`. Returns `None` for an empty or inverted range.
    pub fn segment(start: Duration, end: Duration) -> Option<Self> {
        (end > start).then_some(Self {
            is_segmented: true,
            segment_start: start,
            segment_end: end,
        })
    }

    pub fn is_segmented(&self) -> bool {
        self.is_segmented
    }

    pub fn segment_start(&self) -> Duration {
        self.segment_start
    }

    pub fn segment_end(&self) -> Duration {
        self.segment_end
    }

    /// Length of the segment, zero for a full-video plan.
    pub fn segment_length(&self) -> Duration {
        self.segment_end.saturating_sub(self.segment_start)
    }

    /// Where the player should seek to when the asset is loaded.
    pub fn initial_position(&self) -> Duration {
        self.segment_start
    }

    /// Player position expressed relative to the segment start.
    ///
    /// Positions before the segment (the seek has not landed yet) count as zero.
    pub fn local_position(&self, position: Duration) -> Duration {
        position.saturating_sub(self.segment_start)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
