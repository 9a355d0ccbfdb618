//! Wire schema of the curator backend and its validator.
//!
//! `POST /generate-playlist` answers with the body below.  Decoding is
//! lenient (optional fields may be absent); `validate()` then enforces what
//! the normalizer relies on and reports violations as `SchemaError`, kept
//! apart from transport failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mood::{Mood, MoodAxis, MoodAxisKind};

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub success: bool,
    pub session_id: Option<String>,
    pub playlist_title: Option<String>,
    pub mood: Option<RawMood>,
    pub analysis: Option<String>,
    pub reason: Option<String>,
    pub total_duration: Option<TotalDuration>,
    #[serde(default)]
    pub songs: UpstreamSongs,
    pub download_url: Option<String>,
    #[serde(default)]
    pub images: UpstreamImages,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMood {
    pub energy: RawMoodAxis,
    pub tempo: RawMoodAxis,
    pub temperature: RawMoodAxis,
    pub brightness: RawMoodAxis,
    pub atmosphere: RawMoodAxis,
    pub density: RawMoodAxis,
}

impl RawMood {
    fn axis(&self, kind: MoodAxisKind) -> &RawMoodAxis {
        match kind {
            MoodAxisKind::Energy => &self.energy,
            MoodAxisKind::Tempo => &self.tempo,
            MoodAxisKind::Temperature => &self.temperature,
            MoodAxisKind::Brightness => &self.brightness,
            MoodAxisKind::Atmosphere => &self.atmosphere,
            MoodAxisKind::Density => &self.density,
        }
    }
}

/// Intensity arrives as a JSON number that is not always an integer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMoodAxis {
    pub selected: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TotalDuration {
    pub ms: Option<f64>,
    pub sec: Option<f64>,
}

impl TotalDuration {
    pub fn seconds(&self) -> Option<f64> {
        self.sec.or(self.ms.map(|ms| ms / 1000.0))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamSongs {
    #[serde(default)]
    pub requested: Vec<UpstreamSong>,
    #[serde(default)]
    pub downloaded: Vec<UpstreamSong>,
    #[serde(default)]
    pub failed: Vec<UpstreamSong>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamSong {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub reason: Option<String>,
    pub duration_ms: Option<f64>,
    pub duration_sec: Option<f64>,
    pub start_time_ms: Option<f64>,
    pub start_time_sec: Option<f64>,
}

impl UpstreamSongs {
    /// Downloaded songs when there are any, otherwise the requested list.
    pub fn playable(&self) -> &[UpstreamSong] {
        if self.downloaded.is_empty() {
            &self.requested
        } else {
            &self.downloaded
        }
    }
}

impl UpstreamSong {
    fn timings(&self) -> [Option<f64>; 4] {
        [
            self.duration_ms,
            self.duration_sec,
            self.start_time_ms,
            self.start_time_sec,
        ]
    }
}

/// Relative paths to generated artwork; each may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamImages {
    pub youtube_thumbnail: Option<String>,
    pub lp_cover: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("upstream reported success=false")]
    Rejected,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("{axis} intensity {value} is outside 0..=100")]
    IntensityOutOfRange { axis: &'static str, value: f64 },

    #[error("response contains no songs")]
    NoSongs,

    #[error("invalid timing on song {index}: {value}")]
    InvalidTiming { index: usize, value: f64 },
}

/// A response that passed `validate()`.
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    pub session_id: Option<String>,
    pub playlist_title: Option<String>,
    pub mood: Mood,
    pub analysis: Option<String>,
    pub reason: Option<String>,
    pub total_duration_secs: Option<f64>,
    pub songs: UpstreamSongs,
    pub download_url: String,
    pub images: UpstreamImages,
}

impl ValidatedResponse {
    /// The songs that make up the merged audio: downloaded ones when the
    /// backend reports any, otherwise the requested list.
    pub fn playable_songs(&self) -> &[UpstreamSong] {
        self.songs.playable()
    }
}

impl UpstreamResponse {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn validate(self) -> Result<ValidatedResponse, SchemaError> {
        if !self.success {
            return Err(SchemaError::Rejected);
        }

        let raw_mood = self.mood.ok_or(SchemaError::MissingField("mood"))?;
        let mood = validate_mood(&raw_mood)?;

        let download_url = self
            .download_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(SchemaError::MissingField("download_url"))?;

        let playable = self.songs.playable();
        if playable.is_empty() {
            return Err(SchemaError::NoSongs);
        }
        // index is the position within the playable list
        for (index, song) in playable.iter().enumerate() {
            for value in song.timings().into_iter().flatten() {
                if !value.is_finite() || value < 0.0 {
                    return Err(SchemaError::InvalidTiming { index, value });
                }
            }
        }

        let total_duration_secs = self
            .total_duration
            .and_then(|d| d.seconds())
            .filter(|s| s.is_finite() && *s >= 0.0);

        Ok(ValidatedResponse {
            session_id: self.session_id,
            playlist_title: self.playlist_title,
            mood,
            analysis: self.analysis,
            reason: self.reason,
            total_duration_secs,
            songs: self.songs,
            download_url,
            images: self.images,
        })
    }
}

fn validate_mood(raw: &RawMood) -> Result<Mood, SchemaError> {
    let axis = |kind: MoodAxisKind| {
        let axis = raw.axis(kind);
        if !(0.0..=100.0).contains(&axis.intensity) {
            return Err(SchemaError::IntensityOutOfRange {
                axis: kind.key(),
                value: axis.intensity,
            });
        }
        Ok(MoodAxis::new(axis.selected.clone(), axis.intensity.round() as u8))
    };
    Ok(Mood {
        energy: axis(MoodAxisKind::Energy)?,
        tempo: axis(MoodAxisKind::Tempo)?,
        temperature: axis(MoodAxisKind::Temperature)?,
        brightness: axis(MoodAxisKind::Brightness)?,
        atmosphere: axis(MoodAxisKind::Atmosphere)?,
        density: axis(MoodAxisKind::Density)?,
    })
}
