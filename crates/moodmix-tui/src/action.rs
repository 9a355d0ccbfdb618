//! Action enum: all user-initiated intents and internal events.

use std::path::PathBuf;

use moodmix_proto::mood::MoodSliders;

use crate::playback::BarGeometry;

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Upload / generation ──────────────────────────────────────────────────
    SubmitImage(PathBuf),
    CancelGeneration,
    /// A fresh document was installed; components reset their local state.
    DocumentReady,

    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay,
    SeekClick { x: u16, bar: BarGeometry },
    SeekDrag { x: u16, bar: BarGeometry, primary_held: bool },
    SeekRelative(f64),
    PlayTrack(usize),
    NextTrack,
    PrevTrack,

    // ── Remix ────────────────────────────────────────────────────────────────
    OpenRemix,
    CloseRemix,
    /// Start a new generation cycle for the current image.
    Regenerate { hint: Option<MoodSliders> },

    // ── Player buttons ───────────────────────────────────────────────────────
    ResetToStart,
    DownloadImage(usize),
    SaveMix,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
