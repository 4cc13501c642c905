//! Real-time MIDI playback thread.
//!
//! The gesture session hands notes to a [`Player`] through the
//! [`NoteSink`] trait. Each note sounds for a fixed length, then the thread
//! sends its note-off. Playing a note that is still sounding retriggers it.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use piano_keys::{Note, NoteSink};
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Longest the thread sleeps when no note-off is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub enum PlayerCommand {
    /// Sound these MIDI notes together.
    Play(Vec<u8>),
    /// Silence everything and terminate the thread.
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSettings {
    pub port:        Option<String>,
    pub instrument:  u8,
    pub velocity:    u8,
    pub channel:     u8,
    pub note_length: Duration,
}

impl From<&AppConfig> for PlayerSettings {
    fn from(cfg: &AppConfig) -> Self {
        PlayerSettings {
            port:        cfg.midi_port.clone(),
            instrument:  cfg.instrument,
            velocity:    cfg.velocity,
            channel:     cfg.channel,
            note_length: Duration::from_millis(cfg.note_length_ms),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidirOut {
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.conn.send(msg) {
            warn!("MIDI send failed: {e}");
        }
    }
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Names of all MIDI output ports, in system order.
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = midir::MidiOutput::new("cam_piano_probe")
        .map_err(|e| anyhow!("MIDI init error: {e}"))?;
    Ok(midi_out.ports().iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

/// Pick a port: the first whose name contains `preferred` (case-insensitive),
/// else the first softsynth, else the first port.
fn choose_port(names: &[String], preferred: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    if let Some(want) = preferred {
        let want = want.to_lowercase();
        if let Some(i) = names.iter().position(|n| n.to_lowercase().contains(&want)) {
            return Some(i);
        }
        warn!("no MIDI port matches \"{want}\", picking a default");
    }
    let softsynth = names.iter().position(|n| {
        let n = n.to_lowercase();
        n.contains("fluid") || n.contains("timidity") ||
        n.contains("microsoft") || n.contains("gm") ||
        n.contains("synth")
    });
    Some(softsynth.unwrap_or(0))
}

/// Open the chosen MIDI output port.
/// Falls back to `NullOut` with a warning if none can be opened.
fn open_midi_output(preferred: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("cam_piano_player") {
        Ok(m)  => m,
        Err(e) => {
            warn!("MIDI init error: {e}; notes will be silent");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let Some(idx) = choose_port(&names, preferred) else {
        warn!("no MIDI output ports found; notes will be silent");
        warn!("install a synthesiser such as `fluidsynth` or `timidity -iA` on Linux");
        return Box::new(NullOut);
    };

    info!("opening MIDI port: {}", names[idx]);
    match midi_out.connect(&ports[idx], "cam-piano") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!("failed to connect to {}: {e}; notes will be silent", names[idx]);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteScheduler — pending note-offs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct NoteScheduler {
    pending: Vec<(Instant, u8)>,
}

impl NoteScheduler {
    /// Schedule `note` to stop at `until`. Returns true if it was already
    /// sounding (its earlier note-off is cancelled).
    fn start(&mut self, note: u8, until: Instant) -> bool {
        let was_sounding = self.pending.iter().any(|&(_, n)| n == note);
        self.pending.retain(|&(_, n)| n != note);
        self.pending.push((until, note));
        was_sounding
    }

    /// Remove and return every note whose time is up.
    fn take_due(&mut self, now: Instant) -> Vec<u8> {
        let mut due = Vec::new();
        self.pending.retain(|&(at, n)| {
            if at <= now { due.push(n); false } else { true }
        });
        due
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|&(at, _)| at).min()
    }

    fn drain_all(&mut self) -> Vec<u8> {
        self.pending.drain(..).map(|(_, n)| n).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — the playback thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the MIDI playback thread. Dropping it silences and joins.
pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the playback thread on the configured (or default) port.
    pub fn spawn(settings: PlayerSettings) -> Self {
        Self::spawn_with(settings, |s| open_midi_output(s.port.as_deref()))
    }

    fn spawn_with<F>(settings: PlayerSettings, open: F) -> Self
    where
        F: FnOnce(&PlayerSettings) -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let handle = thread::spawn(move || {
            let midi = open(&settings);
            player_thread(midi, settings, cmd_rx);
        });
        Player { cmd_tx, handle: Some(handle) }
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

impl NoteSink for Player {
    fn play_note(&mut self, note: Note) {
        let _ = self.cmd_tx.send(PlayerCommand::Play(vec![note.midi()]));
    }

    fn play_chord(&mut self, notes: &[Note]) {
        let _ = self.cmd_tx.send(PlayerCommand::Play(notes.iter().map(|n| n.midi()).collect()));
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.quit();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread(
    mut midi:  Box<dyn MidiOut>,
    settings:  PlayerSettings,
    cmd_rx:    Receiver<PlayerCommand>,
) {
    let channel = settings.channel;
    let mut sched = NoteScheduler::default();

    debug!(program = settings.instrument, channel, "player thread started");
    midi.program_change(channel, settings.instrument);

    loop {
        let timeout = sched.next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);

        match cmd_rx.recv_timeout(timeout) {
            Ok(PlayerCommand::Play(notes)) => {
                let until = Instant::now() + settings.note_length;
                for note in notes {
                    if sched.start(note, until) {
                        midi.note_off(channel, note);
                    }
                    midi.note_on(channel, note, settings.velocity);
                }
            }
            Ok(PlayerCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                for note in sched.drain_all() {
                    midi.note_off(channel, note);
                }
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        for note in sched.take_due(Instant::now()) {
            midi.note_off(channel, note);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
