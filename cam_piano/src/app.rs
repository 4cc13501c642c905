//! Top-level application state and loop.
//!
//! `AppState` owns the `GestureSession` and the note sink. It processes one
//! `Frame` at a time and keeps what the visualizer needs to draw.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use hand_pose::{Frame, HandObservation};
use piano_keys::{dispatch, FrameOutput, GestureSession, KeyboardState, NoteEvent, NoteSink, SessionConfig};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::player::{Player, PlayerSettings};
use crate::source::{
    spawn_landmark_source, DetectorProcess, JsonLinesSource, SimLandmarkSource, SourceEvent,
};
use crate::visualizer::{Scene, Visualizer};

/// Where landmark frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Keyboard-driven puppet hands.
    Simulate,
    /// A recorded JSON-lines file, played back at its recorded pace.
    Replay(PathBuf),
    /// A shell command that streams JSON-lines frames on stdout.
    Detector(String),
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState<S: NoteSink> {
    session:    GestureSession,
    sink:       S,
    started:    Instant,

    // ── last frame, for rendering ─────────────────────────────────────────
    hands:      Vec<HandObservation>,
    frame_size: (u32, u32),
    frames:     u64,

    status:     String,
}

impl<S: NoteSink> AppState<S> {
    pub fn new(config: SessionConfig, sink: S) -> Result<Self> {
        let session = GestureSession::new(config).context("invalid session config")?;
        Ok(AppState {
            session,
            sink,
            started:    Instant::now(),
            hands:      Vec::new(),
            frame_size: (640, 480),
            frames:     0,
            status:     "Ready: raise a finger to play".to_string(),
        })
    }

    /// Process a frame stamped with its own time, or with the app clock
    /// when the source gave none.
    pub fn handle_frame(&mut self, frame: Frame) -> FrameOutput {
        let now = frame_time(frame.timestamp, self.started.elapsed());
        self.handle_frame_at(frame, now)
    }

    pub fn handle_frame_at(&mut self, frame: Frame, now: Duration) -> FrameOutput {
        let out = self.session.process_frame(&frame.hands, now);
        dispatch(&out.events, &mut self.sink);

        for event in &out.events {
            match event {
                NoteEvent::Chord(_) => info!(at = ?now, "{event}"),
                _                   => debug!(at = ?now, "{event}"),
            }
        }
        if !out.events.is_empty() {
            self.status = out.events.iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("  ");
        }

        self.frames += 1;
        self.frame_size = (frame.width, frame.height);
        self.hands = frame.hands;
        out
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn hands(&self)      -> &[HandObservation] { &self.hands }
    pub fn frame_size(&self) -> (u32, u32)         { self.frame_size }
    pub fn frames(&self)     -> u64                { self.frames }
    pub fn keyboard(&self)   -> &KeyboardState     { self.session.keyboard() }
    pub fn session(&self)    -> &GestureSession    { &self.session }
    pub fn status(&self)     -> &str               { &self.status }
    pub fn sink(&self)       -> &S                 { &self.sink }
}

/// The frame's own capture time when it is usable, else `fallback`.
fn frame_time(timestamp: Option<f64>, fallback: Duration) -> Duration {
    timestamp
        .and_then(|t| Duration::try_from_secs_f64(t).ok())
        .unwrap_or(fallback)
}

// ════════════════════════════════════════════════════════════════════════════
// FpsCounter
// ════════════════════════════════════════════════════════════════════════════

/// Exponentially smoothed render rate.
pub struct FpsCounter {
    last: Option<Instant>,
    fps:  f32,
}

impl FpsCounter {
    pub fn new() -> Self { FpsCounter { last: None, fps: 0.0 } }

    pub fn tick(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last.replace(now) {
            let dt = now.saturating_duration_since(last).as_secs_f32();
            if dt > 0.0 {
                let inst = 1.0 / dt;
                self.fps = if self.fps == 0.0 { inst } else { self.fps * 0.9 + inst * 0.1 };
            }
        }
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self { Self::new() }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the landmark source for `mode`, the visualizer and the MIDI
/// player, then drives the event/render loop at ~60 fps until the window
/// closes, `Q` is pressed, or the source reports a fatal error.
pub fn run(cfg: AppConfig, mode: InputMode) -> Result<()> {
    // ── Landmark source ───────────────────────────────────────────────────
    let mut sim_tx = None;
    let mut _detector = None;
    let frame_rx = match &mode {
        InputMode::Simulate => {
            let (tx, rx) = mpsc::channel();
            sim_tx = Some(tx);
            spawn_landmark_source(SimLandmarkSource {
                rx,
                width:  cfg.frame_width,
                height: cfg.frame_height,
            })
        }
        InputMode::Replay(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening replay {}", path.display()))?;
            let label = path.display().to_string();
            spawn_landmark_source(JsonLinesSource::new(BufReader::new(file), label).realtime(true))
        }
        InputMode::Detector(cmd) => {
            let (process, source) = DetectorProcess::spawn(cmd)?;
            _detector = Some(process);
            spawn_landmark_source(source)
        }
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let player = Player::spawn(PlayerSettings::from(&cfg));
    let mut app = AppState::new(cfg.session.clone(), player)?;
    let mut fps = FpsCounter::new();
    let mut source_done = false;

    info!(?mode, "session started");

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → translate to SimInput
        if !vis.poll_input() { break; }

        // 2. Drain frames, each processed once in arrival order
        while !source_done {
            match frame_rx.try_recv() {
                Ok(SourceEvent::Frame(frame)) => { app.handle_frame(frame); }
                Ok(SourceEvent::Fatal(msg))   => bail!("landmark source failed: {msg}"),
                Err(TryRecvError::Empty)      => break,
                Err(TryRecvError::Disconnected) => {
                    source_done = true;
                    info!(frames = app.frames(), "input finished");
                    app.set_status("Input finished, press Q to quit");
                }
            }
        }

        // 3. Render
        let fps_now = fps.tick(Instant::now());
        vis.render(&Scene {
            hands:       app.hands(),
            frame_size:  app.frame_size(),
            bbox_margin: cfg.session.bbox_margin,
            keyboard:    app.keyboard(),
            layout:      &cfg.session.layout,
            status:      app.status(),
            fps:         fps_now,
        });
    }

    info!(frames = app.frames(), "session ended");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
