//! MIDI note payload carried by `message` events.
//!
//! The engine reports the note it is currently playing as a small JSON
//! object. Velocity is optional on the wire; some engine builds only send
//! the note number.

use serde::{Deserialize, Serialize};

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;

/// A note reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiNote {
    /// MIDI note number (0-127). 60 = Middle C (C4).
    pub note: u8,

    /// Note velocity (0-127). Missing on the wire means 0.
    #[serde(default)]
    pub velocity: u8,
}

impl MidiNote {
    /// Creates a note, clamping both fields into the MIDI range.
    pub fn new(note: u8, velocity: u8) -> Self {
        Self {
            note: note.min(MAX_NOTE),
            velocity: velocity.min(MAX_NOTE),
        }
    }

    /// Returns true if both fields are inside the MIDI range.
    pub fn is_valid(&self) -> bool {
        self.note <= MAX_NOTE && self.velocity <= MAX_NOTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_clamping() {
        let note = MidiNote::new(200, 200);
        assert_eq!(note.note, 127);
        assert_eq!(note.velocity, 127);
        assert!(note.is_valid());
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(MidiNote::new(64, 100)).unwrap();
        assert_eq!(value, json!({ "note": 64, "velocity": 100 }));
    }

    #[test]
    fn test_velocity_is_optional() {
        let note: MidiNote = serde_json::from_value(json!({ "note": 61 })).unwrap();
        assert_eq!(note, MidiNote { note: 61, velocity: 0 });
    }

    #[test]
    fn test_out_of_range_note_is_invalid() {
        let note: MidiNote = serde_json::from_value(json!({ "note": 200 })).unwrap();
        assert!(!note.is_valid());

        // Does not fit a u8 at all.
        assert!(serde_json::from_value::<MidiNote>(json!({ "note": 300 })).is_err());
        assert!(serde_json::from_value::<MidiNote>(json!({ "note": -1 })).is_err());
    }
}
