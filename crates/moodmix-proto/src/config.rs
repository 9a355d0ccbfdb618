use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Curator backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Generation can take minutes upstream (analysis, search, download,
    /// merge), so this is generous.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Extra attempts after the first, for transport errors and 5xx only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineMode {
    /// 1.5s / 2s / 2.5s / 2s / 1.5s
    #[default]
    Fast,
    /// Five 10s steps.
    Slow,
}

impl std::str::FromStr for TimelineMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "slow" => Ok(Self::Slow),
            other => anyhow::bail!("unknown timeline mode '{}' (expected fast or slow)", other),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub timeline: TimelineMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Spacing used for songs without explicit start times.
    #[serde(default = "default_track_secs")]
    pub default_track_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// User-configurable paths for downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where saved images and mixes go.  Defaults to `~/moodmix-downloads`.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

/// Audio played with the demo playlist when the backend is unavailable.
/// Empty means the fallback playlist is silent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default)]
    pub audio_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            default_track_secs: default_track_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    180
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_track_secs() -> f64 {
    crate::playlist::DEFAULT_TRACK_SECS
}

fn default_volume() -> f32 {
    0.7
}

fn default_downloads_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moodmix-downloads")
}

impl Config {
    /// Load `config.toml`, writing the defaults first if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(180));
        assert_eq!(config.api.max_retries, 1);
        assert_eq!(config.generation.timeline, TimelineMode::Fast);
        assert_eq!(config.playlist.default_track_secs, 180.0);
        assert!(config.fallback.audio_url.is_empty());
        assert!(config.paths.downloads_dir.ends_with("moodmix-downloads"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://curator.lan:9000"

            [generation]
            timeline = "slow"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://curator.lan:9000");
        assert_eq!(config.api.retry_backoff_ms, 2000);
        assert_eq!(config.generation.timeline, TimelineMode::Slow);
        assert_eq!(config.player.volume, 0.7);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.max_retries, 1);

        let again = Config::load_from(&path).unwrap();
        assert_eq!(again.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_timeline_mode_from_str() {
        assert_eq!("SLOW".parse::<TimelineMode>().unwrap(), TimelineMode::Slow);
        assert!("medium".parse::<TimelineMode>().is_err());
    }
}
