//! Playback & seek controller.
//!
//! The controller is the only owner of the audio sink.  Position comes from
//! the sink (`on_time_update`), but every seek is applied locally first so
//! the bar never snaps back while the sink catches up.

use tracing::{debug, warn};

use moodmix_proto::playlist::PlaylistDocument;

/// The audio element, reduced to what the player needs.  Calls are fire and
/// forget; position comes back through `PlaybackController::on_time_update`.
pub trait AudioSink {
    /// Load `url` paused at 0.
    fn load(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, secs: f64);
    /// Unload the current media.
    fn stop(&mut self) {}
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn load(&mut self, url: &str) {
        (**self).load(url)
    }
    fn play(&mut self) {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn seek(&mut self, secs: f64) {
        (**self).seek(secs)
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Used when mpv is unavailable: controls keep working, nothing is heard.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn load(&mut self, url: &str) {
        debug!("null sink: load {} ignored", url);
    }
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _secs: f64) {}
}

/// Horizontal extent of the rendered seek bar, in terminal columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarGeometry {
    pub left: u16,
    pub width: u16,
}

impl BarGeometry {
    pub fn fraction_at(&self, x: u16) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        clamp01((x as f64 - self.left as f64) / self.width as f64)
    }
}

pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Index of the last track whose start is at or before `t`.
pub fn track_index_for(starts: &[f64], t: f64) -> usize {
    starts.iter().rposition(|&s| s <= t).unwrap_or(0)
}

/// Position reports farther than this from a just-issued seek are treated as
/// stale.
const SEEK_SETTLE_SECS: f64 = 1.5;
/// Stale reports ignored before trusting the sink again.
const SEEK_STALE_BUDGET: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    pub current_index: usize,
    pub total_duration: f64,
    pub progress_percent: f64,
    pub playing: bool,
    pub loaded: bool,
}

pub struct PlaybackController<S: AudioSink> {
    sink: S,
    starts: Vec<f64>,
    total_duration: f64,
    current_time: f64,
    current_index: usize,
    playing: bool,
    loaded: bool,
    pending_seek: Option<(f64, u8)>,
}

impl<S: AudioSink> PlaybackController<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            starts: Vec::new(),
            total_duration: 0.0,
            current_time: 0.0,
            current_index: 0,
            playing: false,
            loaded: false,
            pending_seek: None,
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn replace_sink(&mut self, sink: S) {
        self.sink = sink;
    }

    pub fn load(&mut self, document: &PlaylistDocument) {
        self.starts = document.track_starts();
        self.total_duration = document.total_duration.max(0.0);
        self.current_time = 0.0;
        self.current_index = 0;
        self.playing = false;
        self.pending_seek = None;
        self.loaded = true;
        if document.audio_url.is_empty() {
            warn!("playback: document has no audio, controls will be silent");
            self.sink.stop();
        } else {
            self.sink.load(&document.audio_url);
        }
    }

    /// Position report from the sink.  Returns true when the current track
    /// changed.
    pub fn on_time_update(&mut self, t: f64) -> bool {
        if !t.is_finite() {
            return false;
        }
        if let Some((target, budget)) = self.pending_seek {
            if (t - target).abs() > SEEK_SETTLE_SECS && budget > 0 {
                self.pending_seek = Some((target, budget - 1));
                return false;
            }
            self.pending_seek = None;
        }
        self.current_time = t.max(0.0);
        self.refresh_index()
    }

    /// Tracks sharing a start time are one span; the index already chosen
    /// inside that span (e.g. by a track click) is kept.
    fn refresh_index(&mut self) -> bool {
        let index = self.track_index_at(self.current_time);
        let same_span = self.starts.get(index) == self.starts.get(self.current_index);
        if index != self.current_index && !same_span {
            debug!("playback: track {} -> {}", self.current_index, index);
            self.current_index = index;
            true
        } else {
            false
        }
    }

    pub fn track_index_at(&self, t: f64) -> usize {
        track_index_for(&self.starts, t)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_duration > 0.0 {
            self.current_time / self.total_duration * 100.0
        } else {
            0.0
        }
    }

    fn seek_to(&mut self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.total_duration);
        self.sink.seek(t);
        self.current_time = t;
        self.pending_seek = Some((t, SEEK_STALE_BUDGET));
        self.refresh_index();
        t
    }

    pub fn seek_by_click(&mut self, x: u16, bar: BarGeometry) -> f64 {
        let target = bar.fraction_at(x) * self.total_duration;
        self.seek_to(target)
    }

    /// Scrubbing only applies while the primary button is held.
    pub fn seek_by_drag(&mut self, x: u16, bar: BarGeometry, primary_held: bool) -> Option<f64> {
        primary_held.then(|| self.seek_by_click(x, bar))
    }

    pub fn seek_relative(&mut self, delta: f64) -> f64 {
        self.seek_to(self.current_time + delta)
    }

    pub fn click_track(&mut self, index: usize) {
        let Some(&start) = self.starts.get(index) else {
            return;
        };
        self.seek_to(start);
        self.current_index = index;
        if !self.playing {
            self.play();
        }
    }

    pub fn next_track(&mut self) {
        if self.current_index + 1 < self.starts.len() {
            self.click_track(self.current_index + 1);
        }
    }

    /// Back to the start of the current track, or the previous one when
    /// already near its start.
    pub fn prev_track(&mut self) {
        let start = self.starts.get(self.current_index).copied().unwrap_or(0.0);
        if self.current_time - start > 3.0 || self.current_index == 0 {
            self.click_track(self.current_index);
        } else {
            self.click_track(self.current_index - 1);
        }
    }

    fn play(&mut self) {
        self.sink.play();
        self.playing = true;
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.playing = false;
    }

    /// Returns the new playing state.
    pub fn toggle_play(&mut self) -> bool {
        if !self.loaded {
            return false;
        }
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
        self.playing
    }

    pub fn on_ended(&mut self) {
        debug!("playback: ended");
        self.pause();
        self.seek_to(0.0);
    }

    /// Drop the playlist entirely.
    pub fn reset_to_start(&mut self) {
        self.sink.stop();
        self.starts.clear();
        self.total_duration = 0.0;
        self.current_time = 0.0;
        self.current_index = 0;
        self.playing = false;
        self.loaded = false;
        self.pending_seek = None;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_time: self.current_time,
            current_index: self.current_index,
            total_duration: self.total_duration,
            progress_percent: self.progress_percent(),
            playing: self.playing,
            loaded: self.loaded,
        }
    }
}
