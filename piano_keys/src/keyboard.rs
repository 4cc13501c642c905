//! Which on-screen keys are lit.

use hand_pose::{Side, FINGER_COUNT};

/// Per-side "active" flags, indexed by key position (lowest key first,
/// the order keys are drawn left to right).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    right: [bool; FINGER_COUNT],
    left:  [bool; FINGER_COUNT],
}

impl KeyboardState {
    pub fn keys(&self, side: Side) -> &[bool; FINGER_COUNT] {
        match side {
            Side::Right => &self.right,
            Side::Left  => &self.left,
        }
    }

    fn keys_mut(&mut self, side: Side) -> &mut [bool; FINGER_COUNT] {
        match side {
            Side::Right => &mut self.right,
            Side::Left  => &mut self.left,
        }
    }

    pub fn is_active(&self, side: Side, key: usize) -> bool {
        self.keys(side)[key]
    }

    pub fn set_key(&mut self, side: Side, key: usize, active: bool) {
        self.keys_mut(side)[key] = active;
    }

    pub fn set_all(&mut self, side: Side, active: bool) {
        *self.keys_mut(side) = [active; FINGER_COUNT];
    }

    pub fn active_count(&self, side: Side) -> usize {
        self.keys(side).iter().filter(|&&a| a).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_are_independent() {
        let mut kb = KeyboardState::default();
        kb.set_key(Side::Right, 2, true);
        kb.set_all(Side::Left, true);
        assert!(kb.is_active(Side::Right, 2));
        assert_eq!(kb.active_count(Side::Right), 1);
        assert_eq!(kb.active_count(Side::Left), 5);
        kb.set_all(Side::Left, false);
        assert_eq!(kb.active_count(Side::Left), 0);
        assert_eq!(kb.active_count(Side::Right), 1);
    }
}
