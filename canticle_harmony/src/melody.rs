// Melody events and slot selection.
//
// The melody arrives as an ordered list of notes, each with a beat strength
// in [0, 1] (1.0 on the downbeat, smaller for weaker metric positions; see
// meter.rs). Only notes at or above the strength threshold are harmonized;
// these are the slots. A slot remembers its position in the full melody so
// chords can be re-aligned with the original notes when rendering.
//
// Timing (onset, duration) is carried through untouched. The core never
// reads it; the harmonizer uses it to compute chord durations.

use crate::error::HarmonizeError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Notes with beat strength at or above this are harmonized by default.
pub const DEFAULT_STRENGTH_THRESHOLD: f64 = 0.25;

/// Fewest slots that can carry the I ... V I frame.
pub const MIN_SLOTS: usize = 3;

/// One melody note, as produced by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelodyEvent {
    /// MIDI pitch number.
    pub pitch: u8,
    /// Metric strength in [0, 1].
    pub beat_strength: f64,
    /// Onset in quarter notes from the start of the piece.
    #[serde(default)]
    pub onset: f64,
    /// Duration in quarter notes.
    #[serde(default)]
    pub duration: f64,
}

impl MelodyEvent {
    /// An event with no timing information.
    pub fn new(pitch: u8, beat_strength: f64) -> Self {
        MelodyEvent {
            pitch,
            beat_strength,
            onset: 0.0,
            duration: 0.0,
        }
    }

    pub fn timed(pitch: u8, beat_strength: f64, onset: f64, duration: f64) -> Self {
        MelodyEvent {
            pitch,
            beat_strength,
            onset,
            duration,
        }
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }
}

/// A melody note selected for harmonization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Index of the note in the full melody.
    pub position: usize,
    pub pitch: u8,
    pub onset: f64,
    pub duration: f64,
}

impl Slot {
    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }
}

/// Select the notes to harmonize, in melody order.
///
/// Fails with `InsufficientSlots` when fewer than three notes qualify, since
/// the first, penultimate, and last slots each carry a fixed constraint.
pub fn select_slots(events: &[MelodyEvent], threshold: f64) -> Result<Vec<Slot>, HarmonizeError> {
    let slots: Vec<Slot> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.beat_strength >= threshold)
        .map(|(position, e)| Slot {
            position,
            pitch: e.pitch,
            onset: e.onset,
            duration: e.duration,
        })
        .collect();

    debug!(
        total = events.len(),
        selected = slots.len(),
        threshold,
        "selected harmonization slots"
    );

    if slots.len() < MIN_SLOTS {
        return Err(HarmonizeError::InsufficientSlots { found: slots.len() });
    }
    Ok(slots)
}

/// Give untimed melodies a plain pulse: one quarter note per event.
///
/// Applies only when no event carries a duration, so partially timed input
/// is left alone.
pub fn fill_missing_timing(events: &mut [MelodyEvent]) {
    if events.iter().any(|e| e.duration > 0.0) {
        return;
    }
    for (i, e) in events.iter_mut().enumerate() {
        e.onset = i as f64;
        e.duration = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let events = [
            MelodyEvent::new(60, 1.0),
            MelodyEvent::new(62, 0.125),
            MelodyEvent::new(64, 0.25),
            MelodyEvent::new(65, 0.0625),
            MelodyEvent::new(67, 0.5),
        ];
        let slots = select_slots(&events, DEFAULT_STRENGTH_THRESHOLD).unwrap();
        let positions: Vec<usize> = slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 2, 4]);
        assert_eq!(slots[1].pitch, 64);
    }

    #[test]
    fn test_too_few_slots() {
        let events = [
            MelodyEvent::new(60, 1.0),
            MelodyEvent::new(62, 0.1),
            MelodyEvent::new(60, 1.0),
        ];
        assert_eq!(
            select_slots(&events, DEFAULT_STRENGTH_THRESHOLD),
            Err(HarmonizeError::InsufficientSlots { found: 2 })
        );
    }

    #[test]
    fn test_timing_carried_through() {
        let events = [
            MelodyEvent::timed(60, 1.0, 0.0, 1.0),
            MelodyEvent::timed(62, 0.25, 1.0, 0.5),
            MelodyEvent::timed(64, 0.5, 2.0, 2.0),
        ];
        let slots = select_slots(&events, DEFAULT_STRENGTH_THRESHOLD).unwrap();
        assert_eq!(slots[2].onset, 2.0);
        assert_eq!(slots[2].duration, 2.0);
    }

    #[test]
    fn test_event_json_timing_optional() {
        let e: MelodyEvent = serde_json::from_str(r#"{"pitch": 67, "beat_strength": 0.5}"#).unwrap();
        assert_eq!(e, MelodyEvent::new(67, 0.5));
        assert_eq!(e.pitch_class(), 7);
    }

    #[test]
    fn test_fill_missing_timing() {
        let mut untimed = [MelodyEvent::new(60, 1.0), MelodyEvent::new(62, 0.5)];
        fill_missing_timing(&mut untimed);
        assert_eq!(untimed[1].onset, 1.0);
        assert_eq!(untimed[1].duration, 1.0);

        let mut timed = [MelodyEvent::timed(60, 1.0, 0.0, 2.0), MelodyEvent::new(62, 0.5)];
        fill_missing_timing(&mut timed);
        assert_eq!(timed[1].onset, 0.0);
    }
}
