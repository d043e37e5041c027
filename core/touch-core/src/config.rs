//! Runtime configuration.
//!
//! Loaded from TOML (`~/.touchmouse/config.toml` unless a path is given).
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [gesture]
//! mode = "timed"          # or "tap"
//! drag_delay_ms = 250
//! move_delay_ms = 1
//! jitter_threshold = 0
//!
//! [decoder]
//! profile = "/tuio/2Dcur"
//! verify_alive = false
//!
//! [channel]
//! depth = 20              # 1 = single slot, last write wins
//! nonblocking = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::DEFAULT_RING_DEPTH;
use crate::error::{Result, TouchError};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".touchmouse/config.toml";

pub const DEFAULT_DRAG_DELAY_MS: u64 = 250;
pub const DEFAULT_MOVE_DELAY_MS: u64 = 1;
pub const DEFAULT_JITTER_THRESHOLD: u32 = 0;

/// Which rule set the gesture machine runs.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    /// Drag and move deadlines; click, drag, hover and right click.
    #[default]
    Timed,
    /// No timers; movement starts a drag, touch-up clicks.
    Tap,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GestureConfig {
    #[serde(default)]
    pub mode: GestureMode,
    #[serde(default = "default_drag_delay_ms")]
    pub drag_delay_ms: u64,
    #[serde(default = "default_move_delay_ms")]
    pub move_delay_ms: u64,
    #[serde(default = "default_jitter_threshold")]
    pub jitter_threshold: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            mode: GestureMode::default(),
            drag_delay_ms: DEFAULT_DRAG_DELAY_MS,
            move_delay_ms: DEFAULT_MOVE_DELAY_MS,
            jitter_threshold: DEFAULT_JITTER_THRESHOLD,
        }
    }
}

impl GestureConfig {
    pub fn drag_delay(&self) -> Duration {
        Duration::from_millis(self.drag_delay_ms)
    }

    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DecoderConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Log `alive` ids that never received a `set` in the same bundle.
    #[serde(default)]
    pub verify_alive: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            verify_alive: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChannelConfig {
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default)]
    pub nonblocking: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_RING_DEPTH,
            nonblocking: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TouchConfig {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl TouchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel.depth == 0 {
            return Err(TouchError::ConfigInvalid(
                "channel.depth must be at least 1".to_string(),
            ));
        }
        if self.decoder.profile.trim().is_empty() {
            return Err(TouchError::ConfigInvalid(
                "decoder.profile must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

fn default_drag_delay_ms() -> u64 {
    DEFAULT_DRAG_DELAY_MS
}

fn default_move_delay_ms() -> u64 {
    DEFAULT_MOVE_DELAY_MS
}

fn default_jitter_threshold() -> u32 {
    DEFAULT_JITTER_THRESHOLD
}

fn default_profile() -> String {
    tuio_protocol::PROFILE_2DCUR.to_string()
}

fn default_depth() -> usize {
    DEFAULT_RING_DEPTH
}

/// Returns the default config path (`~/.touchmouse/config.toml`).
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(TouchError::HomeDirNotFound)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads configuration, returning defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<TouchConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file; using defaults");
        return Ok(TouchConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| TouchError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;
    let config: TouchConfig =
        toml::from_str(&content).map_err(|err| TouchError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config, TouchConfig::default());
        assert_eq!(config.gesture.drag_delay(), Duration::from_millis(250));
        assert_eq!(config.channel.depth, 20);
        assert_eq!(config.decoder.profile, "/tuio/2Dcur");
        assert_eq!(config.gesture.mode, GestureMode::Timed);
    }

    #[test]
    fn gesture_section_without_mode_is_timed() {
        let config: TouchConfig = toml::from_str("[gesture]\ndrag_delay_ms = 100\n").expect("parse");
        assert_eq!(config.gesture.mode, GestureMode::Timed);
        assert_eq!(GestureMode::default(), GestureMode::Timed);
    }

    #[test]
    fn load_config_fills_missing_fields() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            r#"
[gesture]
mode = "tap"
jitter_threshold = 3

[channel]
depth = 1
"#,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.gesture.mode, GestureMode::Tap);
        assert_eq!(config.gesture.jitter_threshold, 3);
        assert_eq!(config.gesture.drag_delay_ms, DEFAULT_DRAG_DELAY_MS);
        assert_eq!(config.channel.depth, 1);
        assert!(!config.channel.nonblocking);
        assert!(!config.decoder.verify_alive);
    }

    #[test]
    fn load_config_rejects_malformed_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "[gesture]\nmode = \"swipe\"\n").expect("write config");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, TouchError::ConfigMalformed { .. }));
    }

    #[test]
    fn load_config_rejects_zero_depth() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "[channel]\ndepth = 0\n").expect("write config");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, TouchError::ConfigInvalid(_)));
    }

    #[test]
    fn toml_output_round_trips() {
        let mut config = TouchConfig::default();
        config.gesture.mode = GestureMode::Tap;
        let parsed: TouchConfig = toml::from_str(&config.to_toml()).expect("parse");
        assert_eq!(parsed, config);
    }
}
