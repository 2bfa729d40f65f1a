//! Per-asset timing state.

use std::time::Duration;

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::debug;

use crate::clock::{EndOfVideo, PlaybackClock, PlayerHandle};
use crate::plan::VideoSegmentPlan;
use crate::planner::SegmentPlanner;
use crate::policy::{PlaybackPolicy, PlaybackPrefs, PlayerSettings, PreferenceSource};

/// What the host applies to the player once an asset is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetLoad {
    pub plan: VideoSegmentPlan,
    /// Initial seek, the segment start for segmented plans.
    pub seek_to: Duration,
    pub settings: PlayerSettings,
}

/// Ties the segment planner and the playback clock to the asset currently
/// on screen.
///
/// `load` runs once per asset and fixes the plan and policy; `tick` runs on
/// every position update.
#[derive(Debug)]
pub struct AssetTimeline<R = ThreadRng> {
    planner: SegmentPlanner<R>,
    plan: VideoSegmentPlan,
    policy: PlaybackPolicy,
}

impl AssetTimeline<ThreadRng> {
    pub fn new() -> Self {
        Self::with_planner(SegmentPlanner::new())
    }
}

impl Default for AssetTimeline<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> AssetTimeline<R> {
    pub fn with_planner(planner: SegmentPlanner<R>) -> Self {
        Self {
            planner,
            plan: VideoSegmentPlan::full(),
            policy: PlaybackPolicy::default(),
        }
    }

    /// Start timing a new asset of `total_duration`, replacing the previous plan.
    pub fn load(&mut self, total_duration: Duration, prefs: &PlaybackPrefs) -> AssetLoad {
        self.policy = prefs.policy();
        self.plan = if prefs.segments_longer_videos() {
            self.planner.plan(total_duration, prefs.max_video_length())
        } else {
            VideoSegmentPlan::full()
        };

        debug!(
            duration = ?total_duration,
            segmented = self.plan.is_segmented(),
            "Asset loaded"
        );
        AssetLoad {
            plan: self.plan,
            seek_to: self.plan.initial_position(),
            settings: prefs.player_settings(),
        }
    }

    /// [`load`](Self::load) with a fresh snapshot from the preference store.
    pub fn load_from<S: PreferenceSource + ?Sized>(
        &mut self,
        total_duration: Duration,
        prefs: &S,
    ) -> AssetLoad {
        self.load(total_duration, &prefs.playback_prefs())
    }

    pub fn plan(&self) -> &VideoSegmentPlan {
        &self.plan
    }

    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    pub fn tick<P: PlayerHandle + ?Sized>(&self, player: &mut P) -> EndOfVideo {
        PlaybackClock::tick(player, &self.plan, &self.policy)
    }
}
