//! Events emitted by the gesture session, consumed within the same frame.

use std::fmt;

use crate::notes::Note;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    /// A finger was raised.
    NoteOn(Note),
    /// A finger was lowered. Silent; only clears the key highlight.
    NoteOff(Note),
    /// A hand closed into a fist: all of its keys, lowest first.
    Chord(Vec<Note>),
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteEvent::NoteOn(n)  => write!(f, "on {}", n),
            NoteEvent::NoteOff(n) => write!(f, "off {}", n),
            NoteEvent::Chord(ns)  => {
                let names: Vec<String> = ns.iter().map(|n| n.name()).collect();
                write!(f, "chord {}", names.join("+"))
            }
        }
    }
}
