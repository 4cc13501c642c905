//! Application configuration, stored as JSON next to the binary by default.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use piano_keys::SessionConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "cam_piano.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session:        SessionConfig,
    /// Substring of the MIDI output port to open; first softsynth otherwise.
    pub midi_port:      Option<String>,
    /// General MIDI program (0 = Acoustic Grand Piano).
    pub instrument:     u8,
    pub velocity:       u8,
    pub channel:        u8,
    /// How long each note sounds before its MIDI note-off.
    pub note_length_ms: u64,
    /// Frame size reported by the keyboard simulator.
    pub frame_width:    u32,
    pub frame_height:   u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            session:        SessionConfig::default(),
            midi_port:      None,
            instrument:     0,
            velocity:       100,
            channel:        0,
            note_length_ms: 1000,
            frame_width:    640,
            frame_height:   480,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file gives the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.session.validate()?;
        config.clamp();
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Pull MIDI fields into their valid ranges.
    pub fn clamp(&mut self) {
        self.instrument = self.instrument.min(127);
        self.velocity   = self.velocity.min(127);
        self.channel    = self.channel.min(15);
        self.frame_width  = self.frame_width.max(1);
        self.frame_height = self.frame_height.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.velocity, 100);
        assert_eq!(cfg.note_length_ms, 1000);
        assert_eq!((cfg.frame_width, cfg.frame_height), (640, 480));
        assert!(cfg.midi_port.is_none());
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut cfg = AppConfig::default();
        cfg.midi_port = Some("fluid".to_string());
        cfg.instrument = 11;
        cfg.session.chord_cooldown_secs = 0.5;
        cfg.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempdir().unwrap();
        assert_eq!(AppConfig::load_from(dir.path().join("none.json")).unwrap(), AppConfig::default());
    }

    #[test]
    fn out_of_range_midi_values_are_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loud.json");
        fs::write(&path, r#"{"velocity": 200, "channel": 40, "instrument": 250}"#).unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!((cfg.velocity, cfg.channel, cfg.instrument), (127, 15, 127));
    }

    #[test]
    fn invalid_session_section_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"session": {"chord_cooldown_secs": -3}}"#).unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
