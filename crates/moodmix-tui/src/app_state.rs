//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only thing that writes to AppState.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use moodmix_proto::playlist::PlaylistDocument;

use crate::generation::Timeline;
use crate::playback::PlaybackSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Upload,
    Generating,
    Playlist,
}

/// Result of the startup `GET /health` probe.  Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApiHealth {
    #[default]
    Checking,
    Up(String),
    Down(String),
}

/// What the generating screen shows.  Fed by `GenerationEvent::Step`.
#[derive(Debug, Clone, Default)]
pub struct GenerationProgress {
    pub labels: Vec<&'static str>,
    pub durations: Vec<Duration>,
    /// Index of the running step; `labels.len()` once the timeline is done.
    pub step: usize,
    pub percent: u8,
    pub step_started: Option<Instant>,
}

impl GenerationProgress {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            labels: timeline.steps().iter().map(|s| s.label).collect(),
            durations: timeline.steps().iter().map(|s| s.duration).collect(),
            step: 0,
            percent: 0,
            step_started: None,
        }
    }

    pub fn advance(&mut self, step: usize, percent: u8, now: Instant) {
        self.step = step;
        self.percent = percent;
        self.step_started = Some(now);
    }

    pub fn is_done(&self) -> bool {
        self.step >= self.labels.len()
    }

    /// Percent for the bar, eased toward the next step's percent while the
    /// current step runs.
    pub fn display_percent(&self, now: Instant) -> f64 {
        if self.is_done() || self.labels.is_empty() {
            return self.percent as f64;
        }
        let span = 100.0 / self.labels.len() as f64;
        let (Some(started), Some(duration)) = (self.step_started, self.durations.get(self.step))
        else {
            return self.percent as f64;
        };
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let frac = if duration.is_zero() {
            1.0
        } else {
            (elapsed / duration.as_secs_f64()).min(1.0)
        };
        (self.percent as f64 + span * frac).min(100.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub screen: Screen,
    /// The live document; replaced wholesale by each generation cycle.
    pub document: Option<PlaylistDocument>,
    pub playback: PlaybackSnapshot,
    pub generation: GenerationProgress,
    pub api_health: ApiHealth,
    pub api_base: String,
    /// False when mpv could not be started; the player runs silent.
    pub audio_available: bool,
    /// Image of the current cycle, reused by regenerate.
    pub image_path: Option<PathBuf>,
    pub pending_downloads: usize,
}
