//! Tunables of a gesture session, loadable from JSON.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use hand_pose::{Side, DEFAULT_BBOX_MARGIN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::KeyLayout;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config file")]
    Io(#[from] io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("chord cooldown must be a finite, non-negative number of seconds (got {0})")]
    InvalidCooldown(f64),

    #[error("{0} hand keys must be strictly ascending")]
    LayoutNotAscending(Side),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum time between two chords, whichever hand plays them. A chord
    /// exactly this long after the previous one is allowed.
    pub chord_cooldown_secs: f64,
    pub layout:              KeyLayout,
    /// Margin around the drawn hand bounding box, in pixels.
    pub bbox_margin:         i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            chord_cooldown_secs: 1.0,
            layout:              KeyLayout::default(),
            bbox_margin:         DEFAULT_BBOX_MARGIN,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chord_cooldown_secs.is_finite() || self.chord_cooldown_secs < 0.0 {
            return Err(ConfigError::InvalidCooldown(self.chord_cooldown_secs));
        }
        for side in Side::ALL {
            if !self.layout.for_side(side).is_ascending() {
                return Err(ConfigError::LayoutNotAscending(side));
            }
        }
        Ok(())
    }

    /// The cooldown as a `Duration`. Call [`SessionConfig::validate`] first.
    pub fn chord_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.chord_cooldown_secs.max(0.0))
    }

    /// Load and validate; a missing file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::Note;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.chord_cooldown(), Duration::from_secs(1));
        assert_eq!(cfg.bbox_margin, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = SessionConfig::load_from(dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut cfg = SessionConfig::default();
        cfg.chord_cooldown_secs = 0.25;
        cfg.layout.right.notes[4] = Note::from_midi(79).unwrap(); // sol5
        cfg.save_to(&path).unwrap();
        assert_eq!(SessionConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"chord_cooldown_secs": 2.0}"#).unwrap();
        let cfg = SessionConfig::load_from(&path).unwrap();
        assert_eq!(cfg.chord_cooldown(), Duration::from_secs(2));
        assert_eq!(cfg.layout, KeyLayout::default());
    }

    #[test]
    fn rejects_negative_cooldown() {
        let cfg = SessionConfig { chord_cooldown_secs: -1.0, ..SessionConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCooldown(_))));
    }

    #[test]
    fn rejects_descending_layout() {
        let mut cfg = SessionConfig::default();
        cfg.layout.left.notes.swap(0, 1);
        assert!(matches!(cfg.validate(), Err(ConfigError::LayoutNotAscending(Side::Left))));
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(SessionConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
