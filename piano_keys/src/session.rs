//! The gesture state machine.
//!
//! A [`GestureSession`] remembers, per hand side, which fingers were up and
//! whether the hand was a fist on the previous observation. Each frame it
//! diffs the new finger state against that memory:
//!
//! | transition | event | keyboard |
//! |---|---|---|
//! | finger down → up | `NoteOn(note)` | key lit |
//! | finger up → down | `NoteOff(note)` | key cleared |
//! | open → fist, cooldown elapsed | `Chord(all keys)` | all keys lit |
//! | fist → open | — | all keys cleared |
//!
//! One chord cooldown is shared by both hands: a chord from either side
//! blocks chords from both until it has elapsed.
//!
//! Sides are processed Right then Left; within a side, finger events come in
//! thumb → little order, followed by the chord or release. A side with no
//! observation in a frame keeps its state untouched.

use std::time::Duration;

use hand_pose::{extract, is_fist, Finger, FingerVector, HandObservation, Side};
use tracing::{debug, trace};

use crate::config::{ConfigError, SessionConfig};
use crate::event::NoteEvent;
use crate::keyboard::KeyboardState;

/// What the session remembers about one hand between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandGestureState {
    pub previous_fingers: FingerVector,
    pub previous_fist:    bool,
    /// Set once the side has been processed at least once. A fist on the
    /// very first observation is not a closing edge.
    pub observed:         bool,
}

/// Result of one [`GestureSession::process_frame`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameOutput {
    pub events:   Vec<NoteEvent>,
    pub keyboard: KeyboardState,
}

pub struct GestureSession {
    config:     SessionConfig,
    cooldown:   Duration,
    right:      HandGestureState,
    left:       HandGestureState,
    last_chord: Option<Duration>,
    keyboard:   KeyboardState,
}

impl Default for GestureSession {
    fn default() -> Self {
        let config = SessionConfig::default();
        GestureSession {
            cooldown:   config.chord_cooldown(),
            config,
            right:      HandGestureState::default(),
            left:       HandGestureState::default(),
            last_chord: None,
            keyboard:   KeyboardState::default(),
        }
    }
}

impl GestureSession {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(GestureSession {
            cooldown: config.chord_cooldown(),
            config,
            ..GestureSession::default()
        })
    }

    /// Feed one frame's observations. `now` is the frame time on a monotonic
    /// session clock.
    ///
    /// A hand already closed into a fist when its side is first observed
    /// plays no chord; only a later closing edge does.
    pub fn process_frame(&mut self, observations: &[HandObservation], now: Duration) -> FrameOutput {
        let mut events = Vec::new();

        for side in Side::ALL {
            let mut candidates = observations.iter()
                .filter(|o| o.side() == Some(side) && !o.is_empty());
            let Some(hand) = candidates.next() else { continue };

            let duplicates = candidates.count();
            if duplicates > 0 {
                debug!(%side, duplicates, "ignoring extra observations for side");
            }
            self.process_hand(side, hand, now, &mut events);
        }

        let unlabelled = observations.iter().filter(|o| o.side().is_none()).count();
        if unlabelled > 0 {
            trace!(unlabelled, "ignoring observations without a side label");
        }

        FrameOutput { events, keyboard: self.keyboard }
    }

    fn process_hand(&mut self, side: Side, hand: &HandObservation, now: Duration, events: &mut Vec<NoteEvent>) {
        let fingers = extract(hand);
        let fist    = is_fist(&fingers);
        let layout  = self.config.layout.for_side(side);
        let state   = match side {
            Side::Right => &mut self.right,
            Side::Left  => &mut self.left,
        };

        for finger in Finger::ALL {
            let up  = fingers[finger];
            let was = state.previous_fingers[finger];
            if up == was { continue; }

            let note = layout.note_for(finger);
            self.keyboard.set_key(side, layout.key_for(finger), up);
            events.push(if up { NoteEvent::NoteOn(note) } else { NoteEvent::NoteOff(note) });
        }

        if fist && !state.previous_fist && state.observed {
            let open = match self.last_chord {
                None       => true,
                Some(last) => now.saturating_sub(last) >= self.cooldown,
            };
            if open {
                debug!(%side, at = ?now, "fist chord");
                events.push(NoteEvent::Chord(layout.chord()));
                self.last_chord = Some(now);
                self.keyboard.set_all(side, true);
            } else {
                debug!(%side, at = ?now, last = ?self.last_chord, "fist chord suppressed by cooldown");
            }
        }

        if !fist && state.previous_fist {
            self.keyboard.set_all(side, false);
        }

        state.previous_fingers = fingers;
        state.previous_fist    = fist;
        state.observed         = true;
    }

    pub fn state(&self, side: Side) -> &HandGestureState {
        match side {
            Side::Right => &self.right,
            Side::Left  => &self.left,
        }
    }

    pub fn keyboard(&self) -> &KeyboardState         { &self.keyboard }
    pub fn last_chord(&self) -> Option<Duration>     { self.last_chord }
    pub fn config(&self) -> &SessionConfig           { &self.config }

    /// Forget all hand state and the cooldown; keep the configuration.
    pub fn reset(&mut self) {
        self.right      = HandGestureState::default();
        self.left       = HandGestureState::default();
        self.last_chord = None;
        self.keyboard   = KeyboardState::default();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
