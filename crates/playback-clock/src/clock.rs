//! # End-of-video timing
//!
//! Works out how long the current asset keeps playing before the host
//! should fade to the next one. The decision depends on the length limit,
//! the segment plan, short-video looping, the playback speed and the
//! fade-out. Everything is computed in whole milliseconds.

use std::time::Duration;

use tracing::{debug, info};

use crate::plan::{VideoSegmentPlan, millis};
use crate::policy::{MIN_VIDEO_LENGTH, PlaybackPolicy};

/// Repeat behaviour requested from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
}

/// The media player, as far as timing is concerned.
pub trait PlayerHandle {
    /// Length of the loaded media.
    fn duration(&self) -> Duration;

    /// Current playback position.
    fn position(&self) -> Duration;

    fn set_repeat_mode(&mut self, mode: RepeatMode);
}

/// Outcome of one end-of-video calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfVideo {
    /// Wall-clock time until the transition should start.
    pub delay: Duration,
    /// Length the delay was measured against (segment, limit, loops or full video).
    pub effective_duration: Duration,
    /// Number of plays when repeat-all looping must be engaged.
    pub loop_count: Option<u32>,
}

impl EndOfVideo {
    pub fn is_looping(&self) -> bool {
        self.loop_count.is_some()
    }
}

pub struct PlaybackClock;

impl PlaybackClock {
    /// Time left before the current asset should end.
    ///
    /// Rules, first match wins:
    /// 1. A limit under ten seconds plays the full video.
    /// 2. A segmented plan plays the segment only, measured in segment-local time.
    /// 3. With looping on, a video shorter than the limit repeats
    ///    `ceil(limit / duration)` times.
    /// 4. A video longer than the limit stops at the limit unless longer
    ///    videos are allowed.
    /// 5. Otherwise the full video plays.
    ///
    /// The remaining time is divided by the speed, truncated to whole
    /// milliseconds, reduced by the fade-out and clamped at zero.
    pub fn remaining_delay(
        position: Duration,
        total_duration: Duration,
        plan: &VideoSegmentPlan,
        policy: &PlaybackPolicy,
    ) -> EndOfVideo {
        let max = policy.max_video_length;

        if max < MIN_VIDEO_LENGTH {
            return end_of_video(position, total_duration, None, plan, policy);
        }

        if plan.is_segmented() {
            return end_of_video(
                plan.local_position(position),
                plan.segment_length(),
                None,
                plan,
                policy,
            );
        }

        let total_ms = millis(total_duration);
        if policy.loop_short_videos && total_duration < max && total_ms > 0 {
            let loops = millis(max).div_ceil(total_ms);
            info!(
                loops,
                duration = ?total_duration,
                limit = ?max,
                "Looping video"
            );
            if loops > 1 {
                let loop_count = u32::try_from(loops).unwrap_or(u32::MAX);
                let looped = total_duration.saturating_mul(loop_count);
                return end_of_video(position, looped, Some(loop_count), plan, policy);
            }
            return end_of_video(position, total_duration, None, plan, policy);
        }

        if max < total_duration && !policy.allow_longer_videos {
            info!(duration = ?total_duration, limit = ?max, "Limiting duration");
            return end_of_video(position, max, None, plan, policy);
        }

        debug!(duration = ?total_duration, limit = ?max, "Ignoring limit");
        end_of_video(position, total_duration, None, plan, policy)
    }

    /// Run [`remaining_delay`](Self::remaining_delay) against a live player,
    /// switching it to [`RepeatMode::All`] when looping is engaged.
    pub fn tick<P: PlayerHandle + ?Sized>(
        player: &mut P,
        plan: &VideoSegmentPlan,
        policy: &PlaybackPolicy,
    ) -> EndOfVideo {
        let end = Self::remaining_delay(player.position(), player.duration(), plan, policy);
        if end.is_looping() {
            player.set_repeat_mode(RepeatMode::All);
        }
        end
    }
}

fn end_of_video(
    position: Duration,
    duration: Duration,
    loop_count: Option<u32>,
    plan: &VideoSegmentPlan,
    policy: &PlaybackPolicy,
) -> EndOfVideo {
    let remaining = millis(duration).saturating_sub(millis(position));
    // Scaled by the speed in effect now, not the one at load time.
    let scaled = (remaining as f64 / policy.playback_speed()).trunc() as u64;
    let delay = scaled.saturating_sub(millis(policy.fade_out_duration));

    debug!(
        delay_ms = delay,
        duration = ?duration,
        position = ?position.saturating_add(plan.segment_start()),
        "Delay"
    );
    EndOfVideo {
        delay: Duration::from_millis(delay),
        effective_duration: duration,
        loop_count,
    }
}
