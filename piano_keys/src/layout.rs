//! Which note each finger of each hand plays.
//!
//! Each hand owns five keys in ascending pitch order. The right hand plays
//! them thumb → little; the left hand is `reversed`, so its little finger
//! plays the lowest key and its thumb the highest. Curling the fingers of
//! either hand "inward" then walks the scale in the same direction on a
//! mirrored camera view.

use hand_pose::{Finger, Side, FINGER_COUNT};
use serde::{Deserialize, Serialize};

use crate::notes::Note;

/// Five ascending keys for one hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandLayout {
    pub notes:    [Note; FINGER_COUNT],
    /// When set, finger `i` plays key `4 - i`.
    pub reversed: bool,
}

impl HandLayout {
    pub fn new(notes: [Note; FINGER_COUNT], reversed: bool) -> Self {
        HandLayout { notes, reversed }
    }

    /// Key position (0 = lowest) pressed by `finger`.
    pub fn key_for(&self, finger: Finger) -> usize {
        if self.reversed { FINGER_COUNT - 1 - finger.index() } else { finger.index() }
    }

    pub fn note_for(&self, finger: Finger) -> Note {
        self.notes[self.key_for(finger)]
    }

    /// Key position of `note`, if this hand has it.
    pub fn key_index(&self, note: Note) -> Option<usize> {
        self.notes.iter().position(|&n| n == note)
    }

    /// Every key of the hand, lowest first.
    pub fn chord(&self) -> Vec<Note> {
        self.notes.to_vec()
    }

    pub fn is_ascending(&self) -> bool {
        self.notes.windows(2).all(|w| w[0] < w[1])
    }
}

/// Key assignment for both hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    pub right: HandLayout,
    pub left:  HandLayout,
}

impl KeyLayout {
    pub fn for_side(&self, side: Side) -> &HandLayout {
        match side {
            Side::Right => &self.right,
            Side::Left  => &self.left,
        }
    }
}

impl Default for KeyLayout {
    /// LA4–MI5 under the right hand, DO4–SOL4 under the left.
    fn default() -> Self {
        KeyLayout {
            right: HandLayout::new([Note::LA4, Note::SI4, Note::DO5, Note::RE5, Note::MI5], false),
            left:  HandLayout::new([Note::DO4, Note::RE4, Note::MI4, Note::FA4, Note::SOL4], true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_hand_plays_thumb_to_little_ascending() {
        let layout = KeyLayout::default();
        let notes: Vec<Note> = Finger::ALL.iter().map(|&f| layout.right.note_for(f)).collect();
        assert_eq!(notes, vec![Note::LA4, Note::SI4, Note::DO5, Note::RE5, Note::MI5]);
    }

    #[test]
    fn left_hand_is_reversed() {
        let layout = KeyLayout::default();
        assert_eq!(layout.left.note_for(Finger::Little), Note::DO4);
        assert_eq!(layout.left.note_for(Finger::Ring),   Note::RE4);
        assert_eq!(layout.left.note_for(Finger::Thumb),  Note::SOL4);
        assert_eq!(layout.left.key_for(Finger::Thumb), 4);
    }

    #[test]
    fn chord_is_in_key_order() {
        let layout = KeyLayout::default();
        assert_eq!(layout.left.chord(), vec![Note::DO4, Note::RE4, Note::MI4, Note::FA4, Note::SOL4]);
    }

    #[test]
    fn key_index_lookup() {
        let layout = KeyLayout::default();
        assert_eq!(layout.right.key_index(Note::DO5), Some(2));
        assert_eq!(layout.right.key_index(Note::DO4), None);
    }

    #[test]
    fn ascending_check() {
        assert!(KeyLayout::default().right.is_ascending());
        let flat = HandLayout::new([Note::DO4; FINGER_COUNT], false);
        assert!(!flat.is_ascending());
    }

    #[test]
    fn layout_json_uses_note_names() {
        let json = serde_json::to_string(&KeyLayout::default().right).unwrap();
        assert_eq!(json, r#"{"notes":["la4","si4","do5","re5","mi5"],"reversed":false}"#);
    }
}
