//! # hand_pose
//!
//! Data model for 21-point hand skeletons as reported by an external
//! landmark detector, plus the finger-state extractor that turns one hand
//! into a five-flag [`FingerVector`].
//!
//! ## Landmark topology
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19        DIP
//!        4   6   10  14  18        PIP   (thumb: 4 = tip, 3 = IP)
//!        3   5   9   13  17        MCP   (thumb: 2 = MCP)
//!        2 \  \  |   /  /
//!        1  \__\_|__/__/
//!                0                 wrist
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{extract, is_fist, HandObservation, Landmark, Side};
//!
//! let lms: Vec<Landmark> = (0..21).map(|i| Landmark::new(i, 100, 100)).collect();
//! let hand = HandObservation::new(Some(Side::Right), lms).unwrap();
//! let fingers = extract(&hand);
//! assert!(is_fist(&fingers));
//! ```

use std::fmt;
use std::ops::Index;

use thiserror::Error;

pub mod wire;

/// Number of landmarks in a complete hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

/// Number of fingers tracked per hand.
pub const FINGER_COUNT: usize = 5;

/// Default pixel margin around a hand's bounding box.
pub const DEFAULT_BBOX_MARGIN: i32 = 20;

/// Landmark indices of the hand skeleton.
pub mod landmarks {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;

    /// Fingertip of each finger, thumb first.
    pub const TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}

// ════════════════════════════════════════════════════════════════════════════
// PoseError
// ════════════════════════════════════════════════════════════════════════════

/// Contract violations in landmark data handed over by the detector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoseError {
    #[error("hand observation has {0} landmarks, expected 0 or 21")]
    LandmarkCount(usize),

    #[error("landmark at position {position} carries index {index}")]
    LandmarkOrder { position: usize, index: usize },

    #[error("landmark at position {position} lies far outside the frame")]
    LandmarkRange { position: usize },
}

// ════════════════════════════════════════════════════════════════════════════
// Side
// ════════════════════════════════════════════════════════════════════════════

/// Handedness classification supplied by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in processing order.
    pub const ALL: [Side; 2] = [Side::Right, Side::Left];

    /// Parse a detector label. Anything but "left"/"right" is no side.
    pub fn from_label(label: &str) -> Option<Side> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left"  => Some(Side::Left),
            "right" => Some(Side::Right),
            _       => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Left  => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / HandObservation / Frame
// ════════════════════════════════════════════════════════════════════════════

/// One skeleton point in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub index: usize,
    pub x:     i32,
    pub y:     i32,
}

impl Landmark {
    pub fn new(index: usize, x: i32, y: i32) -> Self {
        Landmark { index, x, y }
    }

    /// Convert detector coordinates (0.0–1.0 of the frame) to pixels.
    /// Truncates toward zero, like an integer cast of `nx * width`.
    pub fn from_normalized(index: usize, nx: f32, ny: f32, width: u32, height: u32) -> Self {
        Landmark {
            index,
            x: (nx * width as f32) as i32,
            y: (ny * height as f32) as i32,
        }
    }
}

/// The landmarks of one detected hand plus its side label.
///
/// Either empty or exactly [`LANDMARK_COUNT`] landmarks in index order;
/// [`HandObservation::new`] enforces this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandObservation {
    side:      Option<Side>,
    landmarks: Vec<Landmark>,
}

impl HandObservation {
    pub fn new(side: Option<Side>, landmarks: Vec<Landmark>) -> Result<Self, PoseError> {
        if !landmarks.is_empty() && landmarks.len() != LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount(landmarks.len()));
        }
        if let Some((position, lm)) = landmarks.iter().enumerate().find(|(i, lm)| lm.index != *i) {
            return Err(PoseError::LandmarkOrder { position, index: lm.index });
        }
        Ok(HandObservation { side, landmarks })
    }

    /// A hand with no landmarks (detector reported the hand but no points).
    pub fn empty(side: Option<Side>) -> Self {
        HandObservation { side, landmarks: Vec::new() }
    }

    /// Build from `(x, y)` pixel pairs in index order.
    pub fn from_points(side: Option<Side>, points: &[(i32, i32)]) -> Result<Self, PoseError> {
        let lms = points.iter().enumerate()
            .map(|(i, &(x, y))| Landmark::new(i, x, y))
            .collect();
        Self::new(side, lms)
    }

    pub fn side(&self) -> Option<Side>      { self.side }
    pub fn landmarks(&self) -> &[Landmark]  { &self.landmarks }
    pub fn is_empty(&self) -> bool          { self.landmarks.is_empty() }

    /// Landmark by skeleton index. Panics on an empty observation.
    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }
}

/// Everything the detector reported for one video frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub width:  u32,
    pub height: u32,
    /// Capture time in seconds, when the source knows it.
    pub timestamp: Option<f64>,
    pub hands:  Vec<HandObservation>,
}

// ════════════════════════════════════════════════════════════════════════════
// Finger / FingerVector
// ════════════════════════════════════════════════════════════════════════════

/// Fingers in anatomical order, independent of hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb  = 0,
    Index  = 1,
    Middle = 2,
    Ring   = 3,
    Little = 4,
}

impl Finger {
    pub const ALL: [Finger; FINGER_COUNT] =
        [Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Little];

    pub fn index(self) -> usize { self as usize }
}

/// Extended/not-extended flag for each finger, thumb first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerVector(pub [bool; FINGER_COUNT]);

impl FingerVector {
    /// All fingers down.
    pub const CLOSED: FingerVector = FingerVector([false; FINGER_COUNT]);
    /// All fingers up.
    pub const OPEN: FingerVector = FingerVector([true; FINGER_COUNT]);

    pub fn new(flags: [bool; FINGER_COUNT]) -> Self { FingerVector(flags) }

    pub fn get(&self, i: usize) -> bool { self.0[i] }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ { self.0.iter().copied() }

    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }
}

impl Index<Finger> for FingerVector {
    type Output = bool;
    fn index(&self, finger: Finger) -> &bool { &self.0[finger.index()] }
}

impl From<[bool; FINGER_COUNT]> for FingerVector {
    fn from(flags: [bool; FINGER_COUNT]) -> Self { FingerVector(flags) }
}

/// Compact `[1,0,0,1,1]`-style rendering.
impl fmt::Display for FingerVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, up) in self.iter().enumerate() {
            if i > 0 { f.write_str(",")?; }
            f.write_str(if up { "1" } else { "0" })?;
        }
        f.write_str("]")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Extraction
// ════════════════════════════════════════════════════════════════════════════

/// Decide which fingers of `hand` are extended.
///
/// Screen-space heuristic, assuming an upright hand facing a mirrored camera:
///
/// * **Thumb**: tip x versus thumb MCP x. A right thumb points left on
///   screen, so it is extended when `tip.x < base.x`; a left thumb (and a
///   hand with no side label) when `tip.x > base.x`.
/// * **Other fingers**: extended when the tip is strictly above (smaller y
///   than) the PIP joint two points down the chain.
///
/// An empty observation yields [`FingerVector::CLOSED`].
pub fn extract(hand: &HandObservation) -> FingerVector {
    if hand.is_empty() {
        return FingerVector::CLOSED;
    }
    assert_eq!(
        hand.landmarks.len(), LANDMARK_COUNT,
        "hand observation must carry {} landmarks", LANDMARK_COUNT,
    );

    let mut flags = [false; FINGER_COUNT];

    let tip  = hand.landmark(landmarks::THUMB_TIP);
    let base = hand.landmark(landmarks::THUMB_MCP);
    flags[0] = match hand.side {
        Some(Side::Right) => tip.x < base.x,
        _                 => tip.x > base.x,
    };

    for finger in 1..FINGER_COUNT {
        let tip_idx = landmarks::TIPS[finger];
        flags[finger] = hand.landmark(tip_idx).y < hand.landmark(tip_idx - 2).y;
    }

    FingerVector(flags)
}

/// A fist is a hand with no finger extended.
pub fn is_fist(fingers: &FingerVector) -> bool {
    fingers.extended_count() == 0
}

// ════════════════════════════════════════════════════════════════════════════
// Bounding box
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x:      i32,
    pub y:      i32,
    pub width:  i32,
    pub height: i32,
}

/// Rectangle around all landmarks of `hand`, grown by `margin` pixels and
/// clamped to the `frame_width × frame_height` frame.
pub fn bounding_box(
    hand:         &HandObservation,
    frame_width:  u32,
    frame_height: u32,
    margin:       i32,
) -> Option<BoundingBox> {
    let first = hand.landmarks.first()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
    for lm in &hand.landmarks[1..] {
        x_min = x_min.min(lm.x);
        y_min = y_min.min(lm.y);
        x_max = x_max.max(lm.x);
        y_max = y_max.max(lm.y);
    }

    let w = i32::try_from(frame_width).unwrap_or(i32::MAX);
    let h = i32::try_from(frame_height).unwrap_or(i32::MAX);
    let x0 = x_min.saturating_sub(margin).max(0);
    let y0 = y_min.saturating_sub(margin).max(0);
    let x1 = x_max.saturating_add(margin).min(w);
    let y1 = y_max.saturating_add(margin).min(h);

    Some(BoundingBox {
        x:      x0,
        y:      y0,
        width:  x1.saturating_sub(x0).max(0),
        height: y1.saturating_sub(y0).max(0),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Build an upright hand whose landmarks make [`extract`] report exactly
/// `fingers` for the given side.
///
/// `(cx, cy)` is the wrist position in pixels; the hand spans roughly
/// 120 × 160 pixels above it. Used by the keyboard simulator and tests.
pub fn synthetic_hand(side: Side, fingers: FingerVector, cx: i32, cy: i32) -> HandObservation {
    // A right hand seen in a mirror has its thumb on the screen-left.
    let dir = match side { Side::Right => -1, Side::Left => 1 };
    let mut pts = [(0i32, 0i32); LANDMARK_COUNT];

    pts[landmarks::WRIST] = (cx, cy);

    // Thumb: CMC → MCP → IP → TIP running sideways; a folded thumb tucks
    // back across the palm.
    let thumb_up = fingers[Finger::Thumb];
    pts[landmarks::THUMB_CMC] = (cx + dir * 20, cy - 15);
    pts[landmarks::THUMB_MCP] = (cx + dir * 40, cy - 30);
    if thumb_up {
        pts[landmarks::THUMB_IP]  = (cx + dir * 55, cy - 45);
        pts[landmarks::THUMB_TIP] = (cx + dir * 70, cy - 60);
    } else {
        pts[landmarks::THUMB_IP]  = (cx + dir * 30, cy - 50);
        pts[landmarks::THUMB_TIP] = (cx + dir * 15, cy - 55);
    }

    // Fingers: columns spread away from the thumb.
    for finger in 1..FINGER_COUNT {
        let col = cx + dir * (30 - (finger as i32) * 20);
        let mcp = landmarks::TIPS[finger] - 3;
        let up = fingers.get(finger);
        pts[mcp]     = (col, cy - 70);
        pts[mcp + 1] = (col, cy - 100);
        if up {
            pts[mcp + 2] = (col, cy - 125);
            pts[mcp + 3] = (col, cy - 150);
        } else {
            pts[mcp + 2] = (col, cy - 85);
            pts[mcp + 3] = (col, cy - 75);
        }
    }

    let lms = pts.iter().enumerate().map(|(i, &(x, y))| Landmark::new(i, x, y)).collect();
    HandObservation { side: Some(side), landmarks: lms }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
