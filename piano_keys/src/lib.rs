//! # piano_keys
//!
//! Turns per-frame finger states into piano events.
//!
//! * Raising a finger plays its key (`NoteOn`), lowering it releases the key
//!   (`NoteOff`, silent).
//! * Closing a hand into a fist plays all five of that hand's keys as a
//!   `Chord`, at most once per cooldown window (shared by both hands).
//!
//! ## Default layout
//!
//! | Hand | Thumb | Index | Middle | Ring | Little |
//! |---|---|---|---|---|---|
//! | Right | LA4 | SI4 | DO5 | RE5 | MI5 |
//! | Left  | SOL4 | FA4 | MI4 | RE4 | DO4 |
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use hand_pose::{synthetic_hand, FingerVector, Side};
//! use piano_keys::{GestureSession, NoteEvent, Note};
//!
//! let mut session = GestureSession::default();
//! let hand = synthetic_hand(Side::Right, FingerVector([true, false, false, false, false]), 320, 400);
//! let out = session.process_frame(&[hand], Duration::ZERO);
//! assert_eq!(out.events, vec![NoteEvent::NoteOn(Note::LA4)]);
//! ```

pub mod config;
pub mod event;
pub mod keyboard;
pub mod layout;
pub mod notes;
pub mod session;
pub mod sink;

pub use config::{ConfigError, SessionConfig};
pub use event::NoteEvent;
pub use keyboard::KeyboardState;
pub use layout::{HandLayout, KeyLayout};
pub use notes::{Note, NoteError};
pub use session::{FrameOutput, GestureSession, HandGestureState};
pub use sink::{dispatch, MemorySink, NoteSink, SinkCall};
