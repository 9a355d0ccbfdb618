//! The playlist document the player consumes, and the normalizer that builds
//! it from a validated backend response.
//!
//! A document is built once per generation cycle and never mutated
//! afterwards; the remix panel works on a copy of `mood_sliders`.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::mood::Keyword;
use crate::mood::{keywords_from_mood, sliders_from_mood, Mood, MoodAxis, MoodSliders};
use crate::upstream::{UpstreamSong, ValidatedResponse};

pub const DEFAULT_TRACK_SECS: f64 = 180.0;
pub const DEFAULT_TITLE: &str = "AI Curated Playlist";
pub const DEFAULT_TRACK_REASON: &str = "Picked to match the mood of your photo.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub reason: String,
    /// Offset into the merged audio, seconds.
    pub start_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Original,
    Youtube,
    Lp,
}

impl ImageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Youtube => "youtube",
            Self::Lp => "lp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub kind: ImageKind,
    /// Local path for the original upload, absolute URL otherwise.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDocument {
    pub session_id: Option<String>,
    pub title: String,
    pub tracks: Vec<Track>,
    pub keywords: Vec<Keyword>,
    pub keyword_explanation: String,
    pub playlist_reason: String,
    /// `Original` first, then whichever generated images exist.
    pub images: Vec<Image>,
    pub audio_url: String,
    pub total_duration: f64,
    pub mood_sliders: MoodSliders,
}

impl PlaylistDocument {
    pub fn track_starts(&self) -> Vec<f64> {
        self.tracks.iter().map(|t| t.start_time).collect()
    }

    /// Fixed demo content used when the backend cannot deliver.
    pub fn fallback(original_image: &str, audio_url: &str) -> Self {
        let mood = Mood {
            energy: MoodAxis::new("잔잔함", 70),
            tempo: MoodAxis::new("차분한", 65),
            temperature: MoodAxis::new("따뜻한", 60),
            brightness: MoodAxis::new("밝은", 55),
            atmosphere: MoodAxis::new("몽환적인", 75),
            density: MoodAxis::new("미니멀한", 60),
        };
        let demo = [
            ("Through the Night", "IU", "A hushed, warm vocal for a quiet scene."),
            ("Love Poem", "IU", "Soft piano that lingers like afternoon light."),
            ("Eight", "IU, SUGA", "A dreamy lift to close the set."),
        ];
        let tracks = demo
            .iter()
            .enumerate()
            .map(|(i, (title, artist, reason))| Track {
                title: title.to_string(),
                artist: artist.to_string(),
                reason: reason.to_string(),
                start_time: i as f64 * DEFAULT_TRACK_SECS,
            })
            .collect::<Vec<_>>();
        let total_duration = tracks.len() as f64 * DEFAULT_TRACK_SECS;

        Self {
            session_id: None,
            title: "Slow Afternoon".to_string(),
            keywords: keywords_from_mood(&mood),
            mood_sliders: sliders_from_mood(&mood),
            tracks,
            keyword_explanation: "Soft light and calm colours suggest a gentle, warm mood."
                .to_string(),
            playlist_reason: "Calm songs for an unhurried moment.".to_string(),
            images: vec![Image {
                kind: ImageKind::Original,
                url: original_image.to_string(),
            }],
            audio_url: audio_url.to_string(),
            total_duration,
        }
    }
}

/// Join a backend-relative path onto the API base.  Absolute URLs pass
/// through untouched.
pub fn resolve_url(api_base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        api_base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turns backend responses into `PlaylistDocument`s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pub api_base: String,
    pub default_track_secs: f64,
}

impl Normalizer {
    pub fn new(api_base: impl Into<String>, default_track_secs: f64) -> Self {
        Self {
            api_base: api_base.into(),
            default_track_secs,
        }
    }

    /// Start offset for the song at `index`: explicit seconds, then
    /// milliseconds, then evenly spaced.
    pub fn start_time(&self, index: usize, song: &UpstreamSong) -> f64 {
        song.start_time_sec
            .or(song.start_time_ms.map(|ms| ms / 1000.0))
            .unwrap_or(index as f64 * self.default_track_secs)
    }

    pub fn tracks(&self, songs: &[UpstreamSong]) -> Vec<Track> {
        let mut last_start = 0.0_f64;
        songs
            .iter()
            .enumerate()
            .map(|(i, song)| {
                let mut start = self.start_time(i, song);
                if start < last_start {
                    debug!(
                        "normalizer: song {} starts at {} before previous {}, clamping",
                        i, start, last_start
                    );
                    start = last_start;
                }
                last_start = start;
                Track {
                    title: song.title.clone(),
                    artist: song.artist.clone(),
                    reason: song
                        .reason
                        .clone()
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_TRACK_REASON.to_string()),
                    start_time: start,
                }
            })
            .collect()
    }

    pub fn normalize(&self, response: &ValidatedResponse, original_image: &str) -> PlaylistDocument {
        let tracks = self.tracks(response.playable_songs());

        let last_start = tracks.last().map(|t| t.start_time).unwrap_or(0.0);
        let total_duration = response
            .total_duration_secs
            .unwrap_or(tracks.len() as f64 * self.default_track_secs)
            .max(last_start);

        let mut images = vec![Image {
            kind: ImageKind::Original,
            url: original_image.to_string(),
        }];
        if let Some(path) = &response.images.youtube_thumbnail {
            images.push(Image {
                kind: ImageKind::Youtube,
                url: resolve_url(&self.api_base, path),
            });
        }
        if let Some(path) = &response.images.lp_cover {
            images.push(Image {
                kind: ImageKind::Lp,
                url: resolve_url(&self.api_base, path),
            });
        }

        PlaylistDocument {
            session_id: response.session_id.clone(),
            title: response
                .playlist_title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            tracks,
            keywords: keywords_from_mood(&response.mood),
            keyword_explanation: response.analysis.clone().unwrap_or_default(),
            playlist_reason: response.reason.clone().unwrap_or_default(),
            images,
            audio_url: resolve_url(&self.api_base, &response.download_url),
            total_duration,
            mood_sliders: sliders_from_mood(&response.mood),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("http://localhost:8000", DEFAULT_TRACK_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::tests::sample_body;
    use crate::upstream::UpstreamResponse;
    use serde_json::json;

    fn validated(body: serde_json::Value) -> ValidatedResponse {
        UpstreamResponse::parse(body.to_string().as_bytes())
            .unwrap()
            .validate()
            .unwrap()
    }

    fn normalizer() -> Normalizer {
        Normalizer::new("http://api.test:8000/", DEFAULT_TRACK_SECS)
    }

    #[test]
    fn test_untimed_song_is_evenly_spaced() {
        let mut body = sample_body();
        body["songs"]["downloaded"] = json!([]);
        let doc = normalizer().normalize(&validated(body), "/tmp/photo.jpg");
        assert_eq!(doc.tracks.len(), 3);
        assert_eq!(doc.tracks[2].title, "E");
        assert_eq!(doc.tracks[2].start_time, 2.0 * 180.0);
        assert_eq!(doc.total_duration, 540.0);
    }

    #[test]
    fn test_start_time_priority() {
        let n = normalizer();
        let song = UpstreamSong {
            start_time_sec: Some(12.0),
            start_time_ms: Some(99_000.0),
            ..Default::default()
        };
        assert_eq!(n.start_time(4, &song), 12.0);
        let song = UpstreamSong {
            start_time_ms: Some(99_000.0),
            ..Default::default()
        };
        assert_eq!(n.start_time(4, &song), 99.0);
        assert_eq!(n.start_time(4, &UpstreamSong::default()), 720.0);
    }

    #[test]
    fn test_start_times_never_decrease() {
        let songs = vec![
            UpstreamSong {
                start_time_sec: Some(0.0),
                ..Default::default()
            },
            UpstreamSong {
                start_time_sec: Some(200.0),
                ..Default::default()
            },
            UpstreamSong {
                start_time_sec: Some(150.0),
                ..Default::default()
            },
        ];
        let starts: Vec<f64> = normalizer().tracks(&songs).iter().map(|t| t.start_time).collect();
        assert_eq!(starts, vec![0.0, 200.0, 200.0]);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let body = json!({
            "success": true,
            "mood": sample_body()["mood"].clone(),
            "songs": {"requested": [{"title": "A", "artist": "B"}]},
            "download_url": "download/x"
        });
        let doc = normalizer().normalize(&validated(body), "photo.png");
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.tracks[0].reason, DEFAULT_TRACK_REASON);
        assert_eq!(doc.keyword_explanation, "");
        assert_eq!(doc.playlist_reason, "");
        assert_eq!(doc.audio_url, "http://api.test:8000/download/x");
        assert_eq!(doc.images.len(), 1);
        assert!(doc.session_id.is_none());
    }

    #[test]
    fn test_images_resolved_and_original_first() {
        let mut body = sample_body();
        body["images"]["lp_cover"] = json!("/download/image/abc-123?type=lp");
        let doc = normalizer().normalize(&validated(body), "/home/me/pic.jpg");
        let kinds: Vec<ImageKind> = doc.images.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![ImageKind::Original, ImageKind::Youtube, ImageKind::Lp]);
        assert_eq!(doc.images[0].url, "/home/me/pic.jpg");
        assert_eq!(
            doc.images[1].url,
            "http://api.test:8000/download/image/abc-123?type=youtube"
        );
    }

    #[test]
    fn test_total_duration_covers_last_start() {
        let mut body = sample_body();
        body["total_duration"] = json!({"sec": 100.0});
        body["songs"]["downloaded"][1]["start_time_sec"] = json!(240.0);
        let doc = normalizer().normalize(&validated(body), "p.jpg");
        assert_eq!(doc.total_duration, 240.0);
    }

    #[test]
    fn test_explicit_total_duration_in_ms() {
        let mut body = sample_body();
        body["total_duration"] = json!({"ms": 421_500.0});
        let doc = normalizer().normalize(&validated(body), "p.jpg");
        assert_eq!(doc.total_duration, 421.5);
    }

    #[test]
    fn test_mood_flows_into_keywords_and_sliders() {
        let doc = normalizer().normalize(&validated(sample_body()), "p.jpg");
        assert_eq!(doc.keywords.len(), 6);
        assert_eq!(doc.keywords[0].keyword, "잔잔함");
        assert_eq!(doc.mood_sliders.energy, 75);
        assert_eq!(doc.mood_sliders.atmosphere, 35);
    }

    #[test]
    fn test_fallback_is_complete() {
        let doc = PlaylistDocument::fallback("p.jpg", "");
        assert_eq!(doc.track_starts(), vec![0.0, 180.0, 360.0]);
        assert_eq!(doc.total_duration, 540.0);
        assert_eq!(doc.images[0].kind, ImageKind::Original);
        assert_eq!(doc.keywords.len(), 6);
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url("http://a/", "/b"), "http://a/b");
        assert_eq!(resolve_url("http://a", "b"), "http://a/b");
        assert_eq!(resolve_url("http://a", "https://cdn/x.png"), "https://cdn/x.png");
    }
}
