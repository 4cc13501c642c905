//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ FPS                                                      │
//! │   [do4][re4][mi4][fa4][sol4]    [la4][si4][do5][re5][mi5] │
//! │                                                          │
//! │        ┌─ Left ──┐                 ┌─ Right ─┐           │
//! │        │ skeleton│                 │ skeleton│           │
//! │        └─────────┘                 └─────────┘           │
//! ├──────────────────────────────────────────────────────────┤
//! │ instructions / status                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Result};
use hand_pose::{bounding_box, landmarks as lm, Finger, HandObservation, Side};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use piano_keys::{HandLayout, KeyLayout, KeyboardState};

use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const CAM_W:      usize = 640;
pub const CAM_H:      usize = 480;
const PANEL_H:        usize = 80;
pub const WIN_W:      usize = CAM_W;
pub const WIN_H:      usize = CAM_H + PANEL_H;

const KEY_W:          usize = 40;
const KEY_H:          usize = 120;
const KEYS_Y:         usize = 50;
const LEFT_KEYS_X:    usize = 50;
const RIGHT_KEYS_X:   usize = 350;

/// Line endpoints beyond this many pixels off-window are not drawn.
const DRAW_LIMIT:     i32   = 4 * WIN_W as i32;

const BG_COLOR:       u32   = 0xFF1A1A2E;
const PANEL_BG:       u32   = 0xFF0F3460;
const KEY_COLOR:      u32   = 0xFFFFFFFF;
const KEY_ACTIVE:     u32   = 0xFFADD8E6;  // light blue
const KEY_BORDER:     u32   = 0xFF000000;
const BOX_COLOR:      u32   = 0xFF00FF00;
const BONE_COLOR:     u32   = 0xFFFFFFFF;
const JOINT_COLOR:    u32   = 0xFFFF3050;
const TEXT_COLOR:     u32   = 0xFFEEEEEE;
const DIM_TEXT:       u32   = 0xFF888888;

/// Simulator bindings: `A S D F G` are the left hand little → thumb,
/// `H J K L ;` the right hand thumb → little.
pub const SIM_FINGER_KEYS: [(Key, Side, Finger); 10] = [
    (Key::A,         Side::Left,  Finger::Little),
    (Key::S,         Side::Left,  Finger::Ring),
    (Key::D,         Side::Left,  Finger::Middle),
    (Key::F,         Side::Left,  Finger::Index),
    (Key::G,         Side::Left,  Finger::Thumb),
    (Key::H,         Side::Right, Finger::Thumb),
    (Key::J,         Side::Right, Finger::Index),
    (Key::K,         Side::Right, Finger::Middle),
    (Key::L,         Side::Right, Finger::Ring),
    (Key::Semicolon, Side::Right, Finger::Little),
];

/// Bones of the 21-point hand skeleton.
const HAND_BONES: [(usize, usize); 21] = [
    (lm::WRIST, lm::THUMB_CMC), (lm::THUMB_CMC, lm::THUMB_MCP),
    (lm::THUMB_MCP, lm::THUMB_IP), (lm::THUMB_IP, lm::THUMB_TIP),
    (lm::WRIST, lm::INDEX_MCP), (lm::INDEX_MCP, lm::INDEX_PIP),
    (lm::INDEX_PIP, lm::INDEX_DIP), (lm::INDEX_DIP, lm::INDEX_TIP),
    (lm::MIDDLE_MCP, lm::MIDDLE_PIP), (lm::MIDDLE_PIP, lm::MIDDLE_DIP),
    (lm::MIDDLE_DIP, lm::MIDDLE_TIP),
    (lm::RING_MCP, lm::RING_PIP), (lm::RING_PIP, lm::RING_DIP),
    (lm::RING_DIP, lm::RING_TIP),
    (lm::WRIST, lm::PINKY_MCP), (lm::PINKY_MCP, lm::PINKY_PIP),
    (lm::PINKY_PIP, lm::PINKY_DIP), (lm::PINKY_DIP, lm::PINKY_TIP),
    (lm::INDEX_MCP, lm::MIDDLE_MCP), (lm::MIDDLE_MCP, lm::RING_MCP),
    (lm::RING_MCP, lm::PINKY_MCP),
];

/// Everything one rendered frame shows.
pub struct Scene<'a> {
    pub hands:       &'a [HandObservation],
    pub frame_size:  (u32, u32),
    pub bbox_margin: i32,
    pub keyboard:    &'a KeyboardState,
    pub layout:      &'a KeyLayout,
    pub status:      &'a str,
    pub fps:         f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Window,
    buf:      Vec<u32>,
    /// Present in simulation mode only.
    sim_tx:   Option<Sender<SimInput>>,
    held:     [bool; 10],
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self> {
        let mut window = Window::new(
            "Cam Piano",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("failed to open window: {e}"))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            held: [false; 10],
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs; in simulation mode translate them to
    /// `SimInput` events. Returns false on quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return false;
        }

        let Some(tx) = &self.sim_tx else { return true };

        for (side, key) in [(Side::Left, Key::Z), (Side::Right, Key::M)] {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = tx.send(SimInput::KeyDown(SimKey::ToggleHand(side)));
            }
        }

        for (i, &(key, side, finger)) in SIM_FINGER_KEYS.iter().enumerate() {
            let down = self.window.is_key_down(key);
            if down != self.held[i] {
                self.held[i] = down;
                let sim = SimKey::Finger(side, finger);
                let _ = tx.send(if down { SimInput::KeyDown(sim) } else { SimInput::KeyUp(sim) });
            }
        }

        true
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene<'_>) {
        self.buf.fill(BG_COLOR);

        // ── Hands ─────────────────────────────────────────────────────────
        let (fw, fh) = (scene.frame_size.0.max(1), scene.frame_size.1.max(1));
        let sx = CAM_W as f32 / fw as f32;
        let sy = CAM_H as f32 / fh as f32;
        for hand in scene.hands {
            self.draw_hand(hand, sx, sy);
            if let Some(bb) = bounding_box(hand, fw, fh, scene.bbox_margin) {
                let x = (bb.x as f32 * sx) as usize;
                let y = (bb.y as f32 * sy) as usize;
                let w = (bb.width as f32 * sx) as usize;
                let h = (bb.height as f32 * sy) as usize;
                if w > 1 && h > 1 {
                    self.draw_border(x, y, w, h, BOX_COLOR);
                    self.draw_border(x + 1, y + 1, w - 2, h - 2, BOX_COLOR);
                }
                let label = hand.side().map(Side::name).unwrap_or("?");
                self.draw_text(label, x, y.saturating_sub(14), 2, BOX_COLOR);
            }
        }

        // ── Keyboards ─────────────────────────────────────────────────────
        self.draw_keys(&scene.layout.left,  scene.keyboard.keys(Side::Left),  LEFT_KEYS_X);
        self.draw_keys(&scene.layout.right, scene.keyboard.keys(Side::Right), RIGHT_KEYS_X);

        self.draw_text(&format!("FPS: {}", scene.fps.round() as i64), 10, 10, 2, TEXT_COLOR);

        // ── Instruction panel ─────────────────────────────────────────────
        self.fill_rect(0, CAM_H, WIN_W, PANEL_H, PANEL_BG);
        let left  = &scene.layout.left;
        let right = &scene.layout.right;
        let line1 = format!(
            "Left hand: {}-{}   Right hand: {}-{}",
            left.notes[0].label(), left.notes[4].label(),
            right.notes[0].label(), right.notes[4].label(),
        );
        self.draw_text(&line1, 10, CAM_H + 8, 2, TEXT_COLOR);
        self.draw_text("Fist = chord   Q = quit", 10, CAM_H + 26, 2, TEXT_COLOR);
        if self.sim_tx.is_some() {
            self.draw_text(
                "Sim: hold A S D F G / H J K L ; to raise fingers   Z/M toggle hands",
                10, CAM_H + 46, 1, DIM_TEXT,
            );
        }
        self.draw_text(scene.status, 10, WIN_H - 14, 2, 0xFFFFD700);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Piano keys ────────────────────────────────────────────────────────

    fn draw_keys(&mut self, layout: &HandLayout, active: &[bool; 5], x0: usize) {
        for (i, note) in layout.notes.iter().enumerate() {
            let x = x0 + i * KEY_W;
            let color = if active[i] { KEY_ACTIVE } else { KEY_COLOR };
            self.fill_rect(x, KEYS_Y, KEY_W, KEY_H, color);
            self.draw_border(x, KEYS_Y, KEY_W, KEY_H, KEY_BORDER);
            self.draw_border(x + 1, KEYS_Y + 1, KEY_W - 2, KEY_H - 2, KEY_BORDER);
            self.draw_text(&note.label(), x + 5, KEYS_Y + KEY_H - 16, 2, KEY_BORDER);
        }
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandObservation, sx: f32, sy: f32) {
        if hand.is_empty() { return; }
        let at = |i: usize| {
            let p = hand.landmark(i);
            ((p.x as f32 * sx) as i32, (p.y as f32 * sy) as i32)
        };
        for &(a, b) in HAND_BONES.iter() {
            let (x0, y0) = at(a);
            let (x1, y1) = at(b);
            if [x0, y0, x1, y1].iter().all(|v| v.abs() <= DRAW_LIMIT) {
                self.draw_line(x0, y0, x1, y1, BONE_COLOR);
            }
        }
        for i in 0..hand.landmarks().len() {
            let (x, y) = at(i);
            for dy in -2..=2 {
                for dx in -2..=2 {
                    self.set_pixel_i(x.saturating_add(dx), y.saturating_add(dy), JOINT_COLOR);
                }
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Bresenham line, clipped per pixel.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel_i(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += step_x; }
            if e2 <= dx { err += dx; y += step_y; }
        }
    }

    /// 3×5 bitmap font, each pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ';' => [0b000, 0b010, 0b000, 0b010, 0b100],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sim_bindings_cover_every_finger_once() {
        let bound: HashSet<(Side, Finger)> =
            SIM_FINGER_KEYS.iter().map(|&(_, side, finger)| (side, finger)).collect();
        assert_eq!(bound.len(), 10);
        let keys: HashSet<u32> = SIM_FINGER_KEYS.iter().map(|&(k, _, _)| k as u32).collect();
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn keyboards_fit_the_camera_panel() {
        assert!(LEFT_KEYS_X + 5 * KEY_W <= RIGHT_KEYS_X);
        assert!(RIGHT_KEYS_X + 5 * KEY_W <= CAM_W);
        assert!(KEYS_Y + KEY_H < CAM_H);
    }

    #[test]
    fn skeleton_bones_stay_in_range() {
        for &(a, b) in HAND_BONES.iter() {
            assert!(a < hand_pose::LANDMARK_COUNT && b < hand_pose::LANDMARK_COUNT);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn note_labels_have_glyphs() {
        let fallback = char_glyph('\u{1}');
        for c in "DORE MIFASOLLASI0123456789".chars().filter(|c| *c != ' ') {
            assert_ne!(char_glyph(c), fallback, "missing glyph for {c}");
        }
    }
}
