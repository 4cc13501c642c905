//! JSON-lines wire format spoken by external landmark detectors.
//!
//! One frame per line:
//!
//! ```json
//! {"width":640,"height":480,"t":1.25,
//!  "hands":[{"handedness":"Right","landmarks":[[0.51,0.62], ...21 pairs]}]}
//! ```
//!
//! Landmarks are normalized `[x, y]` pairs; `t` (seconds) and `handedness`
//! are optional. Detectors may place a partly visible hand slightly outside
//! the frame, so coordinates in [`NORMALIZED_RANGE`] are accepted.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{Frame, HandObservation, Landmark, PoseError, Side};

/// Normalized coordinates a landmark may take.
pub const NORMALIZED_RANGE: RangeInclusive<f32> = -1.0..=2.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    #[serde(default)]
    pub handedness: Option<String>,
    #[serde(default)]
    pub landmarks:  Vec<[f32; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub width:  u32,
    pub height: u32,
    #[serde(default, rename = "t", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub hands:  Vec<HandRecord>,
}

impl FrameRecord {
    /// Parse one line of detector output.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Convert normalized coordinates to pixels and validate every hand.
    pub fn into_frame(self) -> Result<Frame, PoseError> {
        let (w, h) = (self.width, self.height);
        let hands = self.hands.into_iter()
            .map(|rec| {
                let out_of_range = rec.landmarks.iter()
                    .position(|p| !p.iter().all(|v| NORMALIZED_RANGE.contains(v)));
                if let Some(position) = out_of_range {
                    return Err(PoseError::LandmarkRange { position });
                }
                let side = rec.handedness.as_deref().and_then(Side::from_label);
                let lms = rec.landmarks.iter().enumerate()
                    .map(|(i, [nx, ny])| Landmark::from_normalized(i, *nx, *ny, w, h))
                    .collect();
                HandObservation::new(side, lms)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame { width: w, height: h, timestamp: self.timestamp, hands })
    }

    /// Inverse of [`FrameRecord::into_frame`], up to pixel rounding.
    pub fn from_frame(frame: &Frame) -> Self {
        let (w, h) = (frame.width.max(1) as f32, frame.height.max(1) as f32);
        FrameRecord {
            width:     frame.width,
            height:    frame.height,
            timestamp: frame.timestamp,
            hands: frame.hands.iter().map(|hand| HandRecord {
                handedness: hand.side().map(|s| s.name().to_string()),
                landmarks:  hand.landmarks().iter()
                    .map(|lm| [(lm.x as f32 + 0.5) / w, (lm.y as f32 + 0.5) / h])
                    .collect(),
            }).collect(),
        }
    }
}
