//! Random segment selection for videos longer than the length limit.

use std::time::Duration;

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::{debug, info};

use crate::plan::{VideoSegmentPlan, millis};
use crate::policy::MIN_VIDEO_LENGTH;

/// Splits a video into equal segments of at least the length limit and
/// picks one of them at random.
///
/// The random source is a type parameter so tests can use a seeded
/// [`StdRng`](rand::rngs::StdRng).
#[derive(Debug, Clone)]
pub struct SegmentPlanner<R = ThreadRng> {
    rng: R,
}

impl SegmentPlanner<ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for SegmentPlanner<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SegmentPlanner<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Choose the segment of a `total_duration` video to play.
    ///
    /// The video is cut into `total / max` equal parts (integer milliseconds).
    /// Fewer than two parts, or a limit below ten seconds, yields a
    /// full-video plan.
    pub fn plan(
        &mut self,
        total_duration: Duration,
        max_segment_length: Duration,
    ) -> VideoSegmentPlan {
        let total = millis(total_duration);
        let max = millis(max_segment_length);
        if total == 0 || max == 0 {
            return VideoSegmentPlan::full();
        }

        let count = total / max;
        if max_segment_length < MIN_VIDEO_LENGTH || count < 2 {
            debug!(total, max, "Video too short for segments");
            return VideoSegmentPlan::full();
        }

        let length = total / count;
        let chosen = self.rng.random_range(1..=count);
        let start = Duration::from_millis((chosen - 1) * length);
        let end = Duration::from_millis(chosen * length);

        info!(
            start = ?start,
            end = ?end,
            chosen,
            count,
            total = ?total_duration,
            "Segment chosen"
        );
        VideoSegmentPlan::segment(start, end).unwrap_or_default()
    }
}
