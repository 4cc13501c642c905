//! Notes named in solfège with octave numbers (`do4` = middle C = MIDI 60).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PITCH_CLASSES: [&str; 12] = [
    "do", "do#", "re", "re#", "mi", "fa", "fa#", "sol", "sol#", "la", "la#", "si",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("unknown note name: {0:?}")]
    UnknownName(String),

    #[error("note {0:?} is outside the MIDI range 0–127")]
    OutOfRange(String),
}

/// A pitch, stored as its MIDI note number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(u8);

impl Note {
    pub const DO4:  Note = Note(60);
    pub const RE4:  Note = Note(62);
    pub const MI4:  Note = Note(64);
    pub const FA4:  Note = Note(65);
    pub const SOL4: Note = Note(67);
    pub const LA4:  Note = Note(69);
    pub const SI4:  Note = Note(71);
    pub const DO5:  Note = Note(72);
    pub const RE5:  Note = Note(74);
    pub const MI5:  Note = Note(76);

    /// Note from a MIDI number; `None` above 127.
    pub fn from_midi(midi: u8) -> Option<Note> {
        (midi <= 127).then_some(Note(midi))
    }

    pub fn midi(self) -> u8 { self.0 }

    /// Octave number, middle C being octave 4.
    pub fn octave(self) -> i32 { self.0 as i32 / 12 - 1 }

    /// Lower-case solfège name, e.g. `"sol4"` or `"fa#3"`.
    pub fn name(self) -> String {
        format!("{}{}", PITCH_CLASSES[(self.0 % 12) as usize], self.octave())
    }

    /// Upper-case key label, e.g. `"SOL4"`.
    pub fn label(self) -> String { self.name().to_uppercase() }

    /// Equal-tempered frequency with A4 = 440 Hz.
    pub fn frequency(self) -> f64 {
        440.0 * 2f64.powf((self.0 as f64 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let split = lower
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| NoteError::UnknownName(s.to_string()))?;
        let (class, octave) = lower.split_at(split);

        let pc = PITCH_CLASSES.iter()
            .position(|&p| p == class)
            .ok_or_else(|| NoteError::UnknownName(s.to_string()))?;
        let octave: i32 = octave.parse()
            .map_err(|_| NoteError::UnknownName(s.to_string()))?;

        let midi = (octave + 1) * 12 + pc as i32;
        if !(0..=127).contains(&midi) {
            return Err(NoteError::OutOfRange(s.to_string()));
        }
        Ok(Note(midi as u8))
    }
}

impl TryFrom<String> for Note {
    type Error = NoteError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Note> for String {
    fn from(n: Note) -> String { n.name() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_constants_match_midi_numbers() {
        assert_eq!("do4".parse::<Note>().unwrap(), Note::DO4);
        assert_eq!("sol4".parse::<Note>().unwrap(), Note::SOL4);
        assert_eq!("mi5".parse::<Note>().unwrap(), Note::MI5);
        assert_eq!(Note::LA4.midi(), 69);
    }

    #[test]
    fn names_round_trip() {
        for midi in 0..=127u8 {
            let n = Note::from_midi(midi).unwrap();
            assert_eq!(n.name().parse::<Note>().unwrap(), n);
        }
    }

    #[test]
    fn sharps_and_low_octaves() {
        assert_eq!("fa#3".parse::<Note>().unwrap().midi(), 54);
        assert_eq!("do-1".parse::<Note>().unwrap().midi(), 0);
        assert_eq!(Note::from_midi(1).unwrap().name(), "do#-1");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("SOL4".parse::<Note>().unwrap(), Note::SOL4);
        assert_eq!(Note::SOL4.label(), "SOL4");
    }

    #[test]
    fn rejects_bad_names() {
        assert!(matches!("ti4".parse::<Note>(), Err(NoteError::UnknownName(_))));
        assert!(matches!("do".parse::<Note>(), Err(NoteError::UnknownName(_))));
        assert!(matches!("la9".parse::<Note>(), Err(NoteError::OutOfRange(_))));
        assert!(Note::from_midi(128).is_none());
    }

    #[test]
    fn frequencies() {
        assert!((Note::LA4.frequency() - 440.0).abs() < 1e-9);
        assert!((Note::DO4.frequency() - 261.63).abs() < 0.01);
        assert!((Note::MI5.frequency() - 659.26).abs() < 0.01);
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(serde_json::to_string(&Note::RE5).unwrap(), r#""re5""#);
        let n: Note = serde_json::from_str(r#""si4""#).unwrap();
        assert_eq!(n, Note::SI4);
        assert!(serde_json::from_str::<Note>(r#""xx""#).is_err());
    }
}
