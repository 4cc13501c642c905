//! Where note events go to make sound.

use crate::event::NoteEvent;
use crate::notes::Note;

/// A sound backend. Implementations decide what to do with notes they
/// cannot play and report that themselves.
pub trait NoteSink {
    fn play_note(&mut self, note: Note);
    fn play_chord(&mut self, notes: &[Note]);
}

/// Forward one frame's events to `sink`, in emission order.
/// `NoteOff` is visual only and produces no call.
pub fn dispatch<S: NoteSink + ?Sized>(events: &[NoteEvent], sink: &mut S) {
    for event in events {
        match event {
            NoteEvent::NoteOn(note)  => sink.play_note(*note),
            NoteEvent::Chord(notes)  => sink.play_chord(notes),
            NoteEvent::NoteOff(_)    => {}
        }
    }
}

/// A call received by a [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    Note(Note),
    Chord(Vec<Note>),
}

/// Sink that records every call; useful for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub calls: Vec<SinkCall>,
}

impl NoteSink for MemorySink {
    fn play_note(&mut self, note: Note) {
        self.calls.push(SinkCall::Note(note));
    }
    fn play_chord(&mut self, notes: &[Note]) {
        self.calls.push(SinkCall::Chord(notes.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_preserves_order_and_skips_note_off() {
        let events = vec![
            NoteEvent::NoteOn(Note::LA4),
            NoteEvent::NoteOff(Note::SI4),
            NoteEvent::Chord(vec![Note::DO4, Note::RE4]),
            NoteEvent::NoteOn(Note::MI5),
        ];
        let mut sink = MemorySink::default();
        dispatch(&events, &mut sink);
        assert_eq!(sink.calls, vec![
            SinkCall::Note(Note::LA4),
            SinkCall::Chord(vec![Note::DO4, Note::RE4]),
            SinkCall::Note(Note::MI5),
        ]);
    }

    #[test]
    fn dispatch_through_trait_object() {
        let mut sink = MemorySink::default();
        {
            let dyn_sink: &mut dyn NoteSink = &mut sink;
            dispatch(&[NoteEvent::NoteOn(Note::DO4)], dyn_sink);
        }
        assert_eq!(sink.calls.len(), 1);
    }
}
