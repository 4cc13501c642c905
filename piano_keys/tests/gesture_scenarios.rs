//! End-to-end gesture sequences through `GestureSession`.

use std::time::Duration;

use hand_pose::{synthetic_hand, FingerVector, HandObservation, Side};
use piano_keys::{GestureSession, Note, NoteEvent};
use proptest::prelude::*;

fn at(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn right(bits: [u8; 5]) -> HandObservation {
    synthetic_hand(Side::Right, FingerVector(bits.map(|b| b != 0)), 420, 420)
}

fn left(bits: [u8; 5]) -> HandObservation {
    synthetic_hand(Side::Left, FingerVector(bits.map(|b| b != 0)), 200, 420)
}

fn chords(events: &[NoteEvent]) -> usize {
    events.iter().filter(|e| matches!(e, NoteEvent::Chord(_))).count()
}

const RIGHT_NOTES: [Note; 5] = [Note::LA4, Note::SI4, Note::DO5, Note::RE5, Note::MI5];

#[test]
fn right_hand_walkthrough() {
    let mut s = GestureSession::default();

    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(0));
    assert!(out.events.is_empty());

    let out = s.process_frame(&[right([1, 0, 0, 0, 0])], at(100));
    assert_eq!(out.events, vec![NoteEvent::NoteOn(Note::LA4)]);

    let out = s.process_frame(&[right([1, 1, 1, 1, 1])], at(200));
    let expected: Vec<NoteEvent> = RIGHT_NOTES[1..].iter().map(|&n| NoteEvent::NoteOn(n)).collect();
    assert_eq!(out.events, expected);

    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(300));
    let mut expected: Vec<NoteEvent> = RIGHT_NOTES.iter().map(|&n| NoteEvent::NoteOff(n)).collect();
    expected.push(NoteEvent::Chord(RIGHT_NOTES.to_vec()));
    assert_eq!(out.events, expected);

    // Open and close again inside the cooldown: notes, but no chord.
    s.process_frame(&[right([1, 1, 1, 1, 1])], at(600));
    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(900));
    assert_eq!(chords(&out.events), 0);
    assert_eq!(out.events.len(), 5);

    // Once the cooldown has passed the next closing edge chords again.
    s.process_frame(&[right([1, 1, 1, 1, 1])], at(1000));
    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(1300));
    assert_eq!(chords(&out.events), 1);
}

#[test]
fn repeated_frame_is_idempotent() {
    let mut s = GestureSession::default();
    let frame = [right([1, 0, 1, 0, 1]), left([0, 1, 1, 0, 0])];
    let first = s.process_frame(&frame, at(50));
    assert_eq!(first.events.len(), 5);
    let second = s.process_frame(&frame, at(50));
    assert!(second.events.is_empty());
    assert_eq!(first.keyboard, second.keyboard);
}

#[test]
fn lost_hand_keeps_its_state() {
    let mut s = GestureSession::default();
    for t in 0..3 {
        s.process_frame(&[left([1, 1, 0, 0, 0]), right([0, 0, 0, 0, 1])], at(t * 33));
    }
    let before = *s.state(Side::Left);

    let out = s.process_frame(&[right([0, 0, 0, 0, 1])], at(100));
    assert!(out.events.is_empty());
    assert_eq!(*s.state(Side::Left), before);

    // When the hand comes back unchanged nothing fires either.
    let out = s.process_frame(&[left([1, 1, 0, 0, 0]), right([0, 0, 0, 0, 1])], at(133));
    assert!(out.events.is_empty());
}

#[test]
fn chord_from_one_hand_blocks_the_other() {
    let mut s = GestureSession::default();
    s.process_frame(&[left([1, 1, 1, 1, 1]), right([1, 1, 1, 1, 1])], at(0));

    let out = s.process_frame(&[left([0, 0, 0, 0, 0])], at(400));
    assert_eq!(chords(&out.events), 1);

    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(1399));
    assert_eq!(chords(&out.events), 0);

    s.process_frame(&[right([1, 1, 1, 1, 1])], at(1450));
    let out = s.process_frame(&[right([0, 0, 0, 0, 0])], at(1500));
    assert_eq!(chords(&out.events), 1);
}

#[test]
fn both_hands_closing_in_one_frame_chord_once() {
    let mut s = GestureSession::default();
    s.process_frame(&[left([1, 1, 1, 1, 1]), right([1, 1, 1, 1, 1])], at(0));
    let out = s.process_frame(&[left([0, 0, 0, 0, 0]), right([0, 0, 0, 0, 0])], at(100));
    // Right is processed first and takes the shared cooldown.
    assert_eq!(chords(&out.events), 1);
    assert_eq!(out.events.last(), Some(&NoteEvent::NoteOff(Note::DO4)));
    assert!(out.events.contains(&NoteEvent::Chord(RIGHT_NOTES.to_vec())));
}

proptest! {
    #[test]
    fn single_finger_transitions(
        start in proptest::array::uniform5(any::<bool>()),
        finger in 0usize..5,
    ) {
        let mut s = GestureSession::default();
        let before = FingerVector(start);
        let mut flipped = start;
        flipped[finger] = !flipped[finger];
        let after = FingerVector(flipped);

        s.process_frame(&[synthetic_hand(Side::Right, before, 320, 400)], at(0));
        let out = s.process_frame(&[synthetic_hand(Side::Right, after, 320, 400)], at(10));

        let note = RIGHT_NOTES[finger];
        let ons  = out.events.iter().filter(|e| matches!(e, NoteEvent::NoteOn(_))).count();
        let offs = out.events.iter().filter(|e| matches!(e, NoteEvent::NoteOff(_))).count();
        if flipped[finger] {
            prop_assert_eq!(ons, 1);
            prop_assert_eq!(offs, 0);
            prop_assert_eq!(&out.events[0], &NoteEvent::NoteOn(note));
        } else {
            prop_assert_eq!(ons, 0);
            prop_assert_eq!(offs, 1);
            prop_assert_eq!(&out.events[0], &NoteEvent::NoteOff(note));
        }
    }

    #[test]
    fn unchanged_fingers_emit_nothing(flags in proptest::array::uniform5(any::<bool>())) {
        let mut s = GestureSession::default();
        let hand = synthetic_hand(Side::Left, FingerVector(flags), 200, 400);
        s.process_frame(std::slice::from_ref(&hand), at(0));
        let out = s.process_frame(std::slice::from_ref(&hand), at(500));
        prop_assert!(out.events.is_empty());
    }
}
