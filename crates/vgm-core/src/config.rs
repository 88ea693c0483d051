use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

/// Upper bound for every duration in the config.
const MAX_SECS: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Where the metadata snapshot and the live audio come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
    /// Upper bound for a single metadata fetch.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: f64,
}

/// Knobs for the self-rescheduling poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Fixed back-off after a failed poll.
    #[serde(default = "default_retry_secs")]
    pub retry_secs: f64,
    /// Used whenever the buffer estimate is unavailable.
    #[serde(default = "default_buffer_delay_secs")]
    pub default_buffer_delay_secs: f64,
    /// Pin the buffer delay to a constant instead of asking the player.
    #[serde(default)]
    pub buffer_delay_secs: Option<f64>,
    /// Floor for the computed delay so a zero-length track can't spin.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Slider position at startup; effective gain is its square.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,
    #[serde(default)]
    pub mpv_path: Option<PathBuf>,
}

/// What to show while the metadata source is down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_game")]
    pub game: String,
    #[serde(default = "default_fallback_track")]
    pub track: String,
    #[serde(default)]
    pub cover: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            stream_url: default_stream_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_secs: default_retry_secs(),
            default_buffer_delay_secs: default_buffer_delay_secs(),
            buffer_delay_secs: None,
            min_delay_secs: default_min_delay_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            mpv_path: None,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            game: default_fallback_game(),
            track: default_fallback_track(),
            cover: None,
        }
    }
}

fn default_metadata_url() -> String {
    "https://leheny.ddns.net/metadata".to_string()
}

fn default_stream_url() -> String {
    "https://leheny.ddns.net/vgmradio".to_string()
}

fn default_request_timeout_secs() -> f64 {
    10.0
}

fn default_retry_secs() -> f64 {
    60.0
}

fn default_buffer_delay_secs() -> f64 {
    4.0
}

fn default_min_delay_secs() -> f64 {
    1.0
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_fallback_game() -> String {
    "Music server is down".to_string()
}

fn default_fallback_track() -> String {
    "I'm probably doing maintenance".to_string()
}

/// Seconds as a `Duration`; negative or NaN is zero, too large saturates.
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v.max(0.0)).unwrap_or(Duration::MAX)
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }
}

impl TimingConfig {
    pub fn retry(&self) -> Duration {
        secs(self.retry_secs)
    }

    pub fn min_delay(&self) -> Duration {
        secs(self.min_delay_secs)
    }
}

impl Config {
    /// Load from the default location. A missing file yields the defaults;
    /// nothing is ever written back.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    fn validate(&self) -> anyhow::Result<()> {
        let seconds = |name: &str, v: f64, allow_zero: bool| {
            let in_range = Duration::try_from_secs_f64(v).is_ok_and(|d| d <= MAX_SECS);
            if in_range && (allow_zero || v > 0.0) {
                Ok(())
            } else {
                Err(anyhow::anyhow!(
                    "{} must be between 0 and {} seconds, got {}",
                    name,
                    MAX_SECS.as_secs(),
                    v
                ))
            }
        };
        seconds("source.request_timeout_secs", self.source.request_timeout_secs, false)?;
        seconds("timing.retry_secs", self.timing.retry_secs, false)?;
        seconds("timing.min_delay_secs", self.timing.min_delay_secs, true)?;
        seconds(
            "timing.default_buffer_delay_secs",
            self.timing.default_buffer_delay_secs,
            true,
        )?;
        if let Some(buffer) = self.timing.buffer_delay_secs {
            seconds("timing.buffer_delay_secs", buffer, true)?;
        }
        if !(0.0..=1.0).contains(&self.player.initial_volume) {
            anyhow::bail!("player.initial_volume must be within 0.0..=1.0");
        }
        reqwest::Url::parse(&self.source.metadata_url)?;
        reqwest::Url::parse(&self.source.stream_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timing.retry(), Duration::from_secs(60));
        assert_eq!(config.timing.default_buffer_delay_secs, 4.0);
        assert!(config.timing.buffer_delay_secs.is_none());
        assert_eq!(config.player.initial_volume, 1.0);
        assert!(config.source.metadata_url.starts_with("https://"));
        assert!(Config::config_path().ends_with("vgm-radio/config.toml"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [source]
            metadata_url = "http://127.0.0.1:8080/metadata"

            [timing]
            buffer_delay_secs = 8.5
            "#,
        )
        .unwrap();
        assert_eq!(config.source.metadata_url, "http://127.0.0.1:8080/metadata");
        assert_eq!(config.source.stream_url, "https://leheny.ddns.net/vgmradio");
        assert_eq!(config.timing.buffer_delay_secs, Some(8.5));
        assert_eq!(config.timing.retry_secs, 60.0);
        assert_eq!(config.fallback.game, "Music server is down");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_toml_str("[timing]\nretry_secs = 0").is_err());
        assert!(Config::from_toml_str("[player]\ninitial_volume = 1.5").is_err());
        assert!(Config::from_toml_str("[source]\nstream_url = \"not a url\"").is_err());
        assert!(Config::from_toml_str("[source]\nrequest_timeout_secs = 1e30").is_err());
        assert!(Config::from_toml_str("[timing]\nretry_secs = 1e30").is_err());
        assert!(Config::from_toml_str("[timing]\nmin_delay_secs = 1e30").is_err());
        assert!(Config::from_toml_str("[timing]\nmin_delay_secs = -1").is_err());
        assert!(Config::from_toml_str("[timing]\nbuffer_delay_secs = 1e30").is_err());
        assert!(Config::from_toml_str("[timing]\nmin_delay_secs = 0").is_ok());
    }

    #[test]
    fn test_duration_getters_never_panic() {
        let mut config = Config::default();
        config.source.request_timeout_secs = 1e30;
        config.timing.retry_secs = f64::NAN;
        config.timing.min_delay_secs = -3.0;
        assert_eq!(config.source.request_timeout(), Duration::MAX);
        assert_eq!(config.timing.retry(), Duration::ZERO);
        assert_eq!(config.timing.min_delay(), Duration::ZERO);
    }
}
