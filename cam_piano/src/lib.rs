//! # cam_piano
//!
//! A five-key-per-hand piano played with bare hands in front of a camera.
//! Landmarks come from an external detector process (or a recorded replay,
//! or keyboard simulation), the gesture session turns finger movements into
//! notes, and a MIDI player sounds them.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Raise a finger | Either | Play that finger's key |
//! | Lower a finger | Either | Release the key (visual only) |
//! | Close into a fist | Either | Play all five keys of that hand as a chord (1 s cooldown shared by both hands) |
//!
//! ## Input modes
//!
//! * (default) **Simulation**: keyboard shortcuts raise puppet fingers.
//! * `--replay FILE`: JSON-lines frames recorded from a detector.
//! * `--detector CMD`: a live detector process streaming JSON lines.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `A S D F G` (hold) | Left little, ring, middle, index, thumb |
//! | `H J K L ;` (hold) | Right thumb, index, middle, ring, little |
//! | `Z` / `M` | Hide or show the left / right hand |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod config;
pub mod logging;
pub mod player;
pub mod source;
pub mod visualizer;
