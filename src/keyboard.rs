//! Keyboard display model.
//!
//! The keyboard is a fixed row of 24 keys. It has no state of its own: the
//! notes come from the base note and the highlighted key from the current
//! note, both passed in by the root view.

/// Number of keys on the display (two octaves).
pub const KEY_COUNT: usize = 24;

/// Leftmost key when none is configured: Middle C.
pub const DEFAULT_BASE_NOTE: u8 = 60;

/// Returns the notes of all keys, left to right.
///
/// With a base note the keys run `base..base + 24`. An unparameterized
/// keyboard (`None`) has every key set to note 0.
pub fn keys(base: Option<u8>) -> [u8; KEY_COUNT] {
    let mut keys = [0u8; KEY_COUNT];
    if let Some(base) = base {
        for (i, key) in keys.iter_mut().enumerate() {
            *key = base.saturating_add(i as u8);
        }
    }
    keys
}

/// Index of the key to mark as selected, if any.
///
/// Only the first matching key is ever selected, so at most one key is
/// marked even when several keys share a note.
pub fn selected_index(keys: &[u8], current: Option<u8>) -> Option<usize> {
    let current = current?;
    keys.iter().position(|&note| note == current)
}
