//! pose_probe — print the finger state of every hand in a landmark stream.
//!
//! Reads detector output (one JSON frame per line) from the file given as
//! the first argument, or from stdin, and prints side, finger vector, fist
//! flag and bounding box for each hand.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};
use hand_pose::wire::FrameRecord;
use hand_pose::{bounding_box, extract, is_fist, DEFAULT_BBOX_MARGIN};

fn main() -> Result<()> {
    let reader: Box<dyn BufRead> = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening {}", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading landmark stream")?;
        if line.trim().is_empty() { continue; }

        let record = match FrameRecord::parse_line(&line) {
            Ok(r)  => r,
            Err(e) => {
                eprintln!("  line {}: skipped ({})", lineno + 1, e);
                continue;
            }
        };
        let frame = record.into_frame()
            .with_context(|| format!("line {}: invalid hand", lineno + 1))?;

        println!("frame {:>5}  {}x{}  hands={}", lineno + 1, frame.width, frame.height, frame.hands.len());
        for hand in &frame.hands {
            let side = hand.side().map(|s| s.name()).unwrap_or("?");
            let fingers = extract(hand);
            let bbox = bounding_box(hand, frame.width, frame.height, DEFAULT_BBOX_MARGIN)
                .map(|b| format!("({},{} {}x{})", b.x, b.y, b.width, b.height))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {:<5} fingers={} fist={} bbox={}",
                side, fingers, is_fist(&fingers), bbox,
            );
        }
    }

    Ok(())
}
