//! # Playback Clock
//!
//! Timing for slideshow-style video playback: which part of a video to
//! play, whether to loop it, and when to move on to the next asset.
//!
//! ## Core Types
//!
//! - [`SegmentPlanner`] - Picks a random limit-sized segment of a long video
//! - [`PlaybackClock`] - Remaining delay until the end of the current asset
//! - [`AssetTimeline`] - Planner and clock bound to the asset on screen
//! - [`PlaybackPrefs`] / [`PlaybackPolicy`] - Preferences and their validated form
//!
//! Everything here is synchronous and never blocks; call it from the
//! player's position-update callback.

pub mod clock;
pub mod plan;
pub mod planner;
pub mod policy;
pub mod timeline;

pub use clock::{EndOfVideo, PlaybackClock, PlayerHandle, RepeatMode};
pub use plan::VideoSegmentPlan;
pub use planner::SegmentPlanner;
pub use policy::{
    LimitLongerVideos, MIN_VIDEO_LENGTH, PlaybackPolicy, PlaybackPrefs, PlayerSettings,
    PreferenceSource,
};
pub use timeline::{AssetLoad, AssetTimeline};
