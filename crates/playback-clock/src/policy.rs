//! Playback preferences and the validated policy derived from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Shortest length limit that is honoured. Anything below disables the limit.
pub const MIN_VIDEO_LENGTH: Duration = Duration::from_secs(10);

/// What to do with videos longer than the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitLongerVideos {
    /// Stop after the limit.
    #[default]
    Limit,
    /// Play one randomly chosen limit-sized segment.
    Segment,
    /// Play the whole video.
    Ignore,
}

/// Inputs to the end-of-video calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPolicy {
    pub loop_short_videos: bool,
    pub allow_longer_videos: bool,
    pub max_video_length: Duration,
    playback_speed: f64,
    pub fade_out_duration: Duration,
}

impl PlaybackPolicy {
    pub fn new(max_video_length: Duration) -> Self {
        Self {
            max_video_length,
            ..Default::default()
        }
    }

    pub fn with_loop_short_videos(mut self, enabled: bool) -> Self {
        self.loop_short_videos = enabled;
        self
    }

    pub fn with_longer_videos_allowed(mut self, allowed: bool) -> Self {
        self.allow_longer_videos = allowed;
        self
    }

    /// Non-positive or non-finite speeds fall back to 1.0.
    pub fn with_playback_speed(mut self, speed: f64) -> Self {
        self.playback_speed = validate_speed(speed);
        self
    }

    pub fn with_fade_out(mut self, fade_out: Duration) -> Self {
        self.fade_out_duration = fade_out;
        self
    }

    /// Always strictly positive and finite.
    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    /// Whether the length limit is enabled at all.
    pub fn limit_enabled(&self) -> bool {
        self.max_video_length >= MIN_VIDEO_LENGTH
    }
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            loop_short_videos: false,
            allow_longer_videos: false,
            max_video_length: Duration::ZERO,
            playback_speed: 1.0,
            fade_out_duration: Duration::ZERO,
        }
    }
}

fn validate_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        warn!(speed, "Invalid playback speed, using 1.0");
        1.0
    }
}

/// Player-facing settings derived from the preferences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    /// Linear volume in `0.0..=1.0`.
    pub volume: f32,
    pub speed: f64,
}

/// Snapshot of the playback preferences as the host stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPrefs {
    /// Repeat videos shorter than the length limit until the limit is filled.
    #[serde(default = "default_true")]
    pub loop_short_videos: bool,
    #[serde(default)]
    pub limit_longer_videos: LimitLongerVideos,
    /// Length limit in seconds; values under 10 disable the limit.
    #[serde(default)]
    pub max_video_length_secs: u64,
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,
    /// Fade-out before the next asset, in milliseconds.
    #[serde(default = "default_media_fade_out_ms")]
    pub media_fade_out_ms: u64,
    #[serde(default = "default_true")]
    pub mute_videos: bool,
    /// Volume percentage, 0 to 100.
    #[serde(default = "default_video_volume")]
    pub video_volume: u8,
}

fn default_true() -> bool {
    true
}

fn default_playback_speed() -> f64 {
    1.0
}

fn default_media_fade_out_ms() -> u64 {
    1000
}

fn default_video_volume() -> u8 {
    100
}

impl PlaybackPrefs {
    pub fn max_video_length(&self) -> Duration {
        Duration::from_secs(self.max_video_length_secs)
    }

    /// Whether long videos should be cut down to a random segment.
    pub fn segments_longer_videos(&self) -> bool {
        self.limit_longer_videos == LimitLongerVideos::Segment
            && self.max_video_length() >= MIN_VIDEO_LENGTH
    }

    pub fn policy(&self) -> PlaybackPolicy {
        PlaybackPolicy::new(self.max_video_length())
            .with_loop_short_videos(self.loop_short_videos)
            .with_longer_videos_allowed(self.limit_longer_videos == LimitLongerVideos::Ignore)
            .with_playback_speed(self.playback_speed)
            .with_fade_out(Duration::from_millis(self.media_fade_out_ms))
    }

    pub fn player_settings(&self) -> PlayerSettings {
        let volume = if self.mute_videos {
            0.0
        } else {
            f32::from(self.video_volume.min(100)) / 100.0
        };
        PlayerSettings {
            volume,
            speed: validate_speed(self.playback_speed),
        }
    }
}

impl Default for PlaybackPrefs {
    fn default() -> Self {
        Self {
            loop_short_videos: default_true(),
            limit_longer_videos: LimitLongerVideos::default(),
            max_video_length_secs: 0,
            playback_speed: default_playback_speed(),
            media_fade_out_ms: default_media_fade_out_ms(),
            mute_videos: default_true(),
            video_volume: default_video_volume(),
        }
    }
}

/// Read access to the host's preference store.
///
/// Called once per asset load; implementations may read persisted settings
/// on every call.
pub trait PreferenceSource {
    fn playback_prefs(&self) -> PlaybackPrefs;
}

impl PreferenceSource for PlaybackPrefs {
    fn playback_prefs(&self) -> PlaybackPrefs {
        self.clone()
    }
}
