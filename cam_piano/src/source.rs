//! Landmark sources: the keyboard simulator, a recorded replay file, or a
//! live detector process writing JSON lines on stdout.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! Consumers don't need to know whether frames came from a camera or the
//! simulator.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use hand_pose::wire::FrameRecord;
use hand_pose::{synthetic_hand, Finger, FingerVector, Frame, Side, FINGER_COUNT};
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// One detector frame, hands already in pixel coordinates.
    Frame(Frame),
    /// The source broke the landmark contract; the session must stop.
    Fatal(String),
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
///
/// A source returns when its input is exhausted or the receiver is gone.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — keyboard-driven puppet hands
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated key codes (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    /// Hold to raise one finger of one hand.
    Finger(Side, Finger),
    /// Press to show or hide a hand.
    ToggleHand(Side),
}

/// Turns [`SimInput`]s into frames of synthetic hands.
///
/// Every input produces one frame containing the visible hands, with each
/// finger raised while its key is held.
pub struct SimLandmarkSource {
    pub rx:     Receiver<SimInput>,
    pub width:  u32,
    pub height: u32,
}

/// Key-held state of the simulated hands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimHands {
    pub right_visible: bool,
    pub left_visible:  bool,
    pub right:         [bool; FINGER_COUNT],
    pub left:          [bool; FINGER_COUNT],
}

impl SimHands {
    /// Both hands visible, all fingers down.
    pub fn new() -> Self {
        SimHands { right_visible: true, left_visible: true, ..SimHands::default() }
    }

    pub fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::Finger(side, finger)) => self.fingers_mut(side)[finger.index()] = true,
            SimInput::KeyUp(SimKey::Finger(side, finger))   => self.fingers_mut(side)[finger.index()] = false,
            SimInput::KeyDown(SimKey::ToggleHand(Side::Right)) => self.right_visible = !self.right_visible,
            SimInput::KeyDown(SimKey::ToggleHand(Side::Left))  => self.left_visible  = !self.left_visible,
            SimInput::KeyUp(SimKey::ToggleHand(_)) => {}
        }
    }

    fn fingers_mut(&mut self, side: Side) -> &mut [bool; FINGER_COUNT] {
        match side {
            Side::Right => &mut self.right,
            Side::Left  => &mut self.left,
        }
    }

    /// Visible hands as a frame. The right hand sits on the right third of
    /// the (mirrored) picture, the left hand on the left third.
    pub fn frame(&self, width: u32, height: u32) -> Frame {
        let w = width as i32;
        let wrist_y = height as i32 - 40;
        let mut hands = Vec::with_capacity(2);
        if self.right_visible {
            hands.push(synthetic_hand(Side::Right, FingerVector(self.right), w * 2 / 3, wrist_y));
        }
        if self.left_visible {
            hands.push(synthetic_hand(Side::Left, FingerVector(self.left), w / 3, wrist_y));
        }
        Frame { width, height, timestamp: None, hands }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let mut hands = SimHands::new();
        if tx.send(SourceEvent::Frame(hands.frame(self.width, self.height))).is_err() {
            return;
        }
        for input in self.rx.iter() {
            hands.apply(input);
            if tx.send(SourceEvent::Frame(hands.frame(self.width, self.height))).is_err() {
                return;
            }
        }
        debug!("simulator input closed");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource — replay files and detector processes
// ════════════════════════════════════════════════════════════════════════════

/// Reads one [`FrameRecord`] per line.
///
/// Malformed lines are logged and skipped. A line that parses but violates
/// the landmark contract (wrong count or order) is fatal.
pub struct JsonLinesSource<R> {
    reader:   R,
    /// Sleep between frames so recorded timestamps play back in real time.
    realtime: bool,
    label:    String,
}

impl<R: BufRead + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        JsonLinesSource { reader, realtime: false, label: label.into() }
    }

    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let JsonLinesSource { reader, realtime, label } = *self;
        let started = Instant::now();
        let mut first_ts: Option<f64> = None;
        let mut frames = 0usize;

        for (lineno, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    let _ = tx.send(SourceEvent::Fatal(format!("{label}: read error: {e}")));
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let record = match FrameRecord::parse_line(&line) {
                Ok(r)  => r,
                Err(e) => {
                    warn!(source = %label, line = lineno + 1, "skipping malformed frame: {e}");
                    continue;
                }
            };
            let frame = match record.into_frame() {
                Ok(f)  => f,
                Err(e) => {
                    let _ = tx.send(SourceEvent::Fatal(format!("{label} line {}: {e}", lineno + 1)));
                    return;
                }
            };

            if realtime {
                if let Some(t) = frame.timestamp {
                    let t0 = *first_ts.get_or_insert(t);
                    if let Some(wait) = replay_delay(t - t0, started.elapsed()) {
                        thread::sleep(wait);
                    }
                }
            }

            frames += 1;
            if tx.send(SourceEvent::Frame(frame)).is_err() {
                return;
            }
        }
        info!(source = %label, frames, "landmark source finished");
    }
}

/// How long to wait before emitting a frame recorded `offset_secs` after the
/// first one, given `elapsed` wall time since playback started.
fn replay_delay(offset_secs: f64, elapsed: Duration) -> Option<Duration> {
    let due = Duration::try_from_secs_f64(offset_secs).ok()?;
    due.checked_sub(elapsed).filter(|d| !d.is_zero())
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorProcess — external camera + landmark model
// ════════════════════════════════════════════════════════════════════════════

/// A child process that captures the camera, runs a hand landmark model,
/// and prints one JSON frame per line. Killed on drop.
pub struct DetectorProcess {
    child: Child,
}

impl DetectorProcess {
    /// Launch `command` through the platform shell.
    pub fn spawn(command: &str) -> Result<(Self, JsonLinesSource<BufReader<ChildStdout>>)> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector `{command}`"))?;

        let stdout = child.stdout.take().context("detector stdout not captured")?;
        info!(pid = child.id(), "detector started: {command}");
        let source = JsonLinesSource::new(BufReader::new(stdout), "detector");
        Ok((DetectorProcess { child }, source))
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::extract;
    use std::io::Cursor;

    fn collect<S: LandmarkSource>(source: S) -> Vec<SourceEvent> {
        spawn_landmark_source(source).iter().collect()
    }

    fn hand_line(label: &str) -> String {
        let pts: Vec<String> = (0..21).map(|i| format!("[0.{:02},0.5]", i + 10)).collect();
        format!(r#"{{"handedness":"{label}","landmarks":[{}]}}"#, pts.join(","))
    }

    #[test]
    fn sim_hands_toggle_and_raise() {
        let mut hands = SimHands::new();
        hands.apply(SimInput::KeyDown(SimKey::Finger(Side::Left, Finger::Index)));
        hands.apply(SimInput::KeyDown(SimKey::ToggleHand(Side::Right)));
        let frame = hands.frame(640, 480);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].side(), Some(Side::Left));
        assert_eq!(extract(&frame.hands[0]), FingerVector([false, true, false, false, false]));

        hands.apply(SimInput::KeyUp(SimKey::Finger(Side::Left, Finger::Index)));
        hands.apply(SimInput::KeyUp(SimKey::ToggleHand(Side::Right)));
        let frame = hands.frame(640, 480);
        assert_eq!(extract(&frame.hands[0]), FingerVector::CLOSED);
        assert_eq!(frame.hands.len(), 1);
    }

    #[test]
    fn sim_source_emits_a_frame_per_input() {
        let (tx, rx) = mpsc::channel();
        tx.send(SimInput::KeyDown(SimKey::Finger(Side::Right, Finger::Thumb))).unwrap();
        tx.send(SimInput::KeyUp(SimKey::Finger(Side::Right, Finger::Thumb))).unwrap();
        drop(tx);
        let events = collect(SimLandmarkSource { rx, width: 640, height: 480 });
        assert_eq!(events.len(), 3);
        let SourceEvent::Frame(frame) = &events[1] else { panic!("expected frame") };
        let right = frame.hands.iter().find(|h| h.side() == Some(Side::Right)).unwrap();
        assert!(extract(right)[Finger::Thumb]);
    }

    #[test]
    fn json_lines_skip_malformed_and_blank() {
        let input = format!(
            "{{\"width\":640,\"height\":480,\"hands\":[{}]}}\n\nnot json\n{{\"width\":640,\"height\":480,\"hands\":[]}}\n",
            hand_line("Right"),
        );
        let events = collect(JsonLinesSource::new(Cursor::new(input), "test"));
        assert_eq!(events.len(), 2);
        let SourceEvent::Frame(frame) = &events[0] else { panic!("expected frame") };
        assert_eq!(frame.hands[0].side(), Some(Side::Right));
        assert_eq!(frame.hands[0].landmark(0).x, 64);
    }

    #[test]
    fn json_lines_contract_violation_is_fatal() {
        let input = concat!(
            "{\"width\":640,\"height\":480,\"hands\":[{\"landmarks\":[[0.1,0.1],[0.2,0.2]]}]}\n",
            "{\"width\":640,\"height\":480,\"hands\":[]}\n",
        );
        let events = collect(JsonLinesSource::new(Cursor::new(input), "test"));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SourceEvent::Fatal(msg) if msg.contains("line 1")));
    }

    #[test]
    fn replay_delay_waits_only_for_future_frames() {
        assert_eq!(replay_delay(0.5, Duration::from_millis(200)), Some(Duration::from_millis(300)));
        assert_eq!(replay_delay(0.1, Duration::from_millis(200)), None);
        assert_eq!(replay_delay(-1.0, Duration::ZERO), None);
    }

    #[cfg(unix)]
    #[test]
    fn detector_process_output_is_read() {
        let (_proc, source) = DetectorProcess::spawn(
            r#"echo '{"width":320,"height":240,"t":0.0,"hands":[]}'"#,
        ).unwrap();
        let events = collect(source);
        assert_eq!(events.len(), 1);
        let SourceEvent::Frame(frame) = &events[0] else { panic!("expected frame") };
        assert_eq!((frame.width, frame.height), (320, 240));
    }
}
