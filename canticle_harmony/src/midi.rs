// MIDI input and output around the harmonizer.
//
// Input: a Standard MIDI File holding a melody. Notes from all tracks are
// merged and reduced to a single line (the highest note wins when onsets
// coincide). The first time signature (default 4/4) drives beat strengths
// via meter.rs; the first tempo (default 120 BPM) is kept for output.
//
// Output: SMF Format 1 with a tempo track, the melody track, and a chord
// track with one voiced chord per harmonized slot. Onsets and durations are
// in quarter notes and are converted to ticks here.
//
// Uses the `midly` crate for parsing and writing.

use crate::harmonizer::VoicedSlot;
use crate::melody::MelodyEvent;
use crate::meter::Meter;
use anyhow::{Context, Result, bail};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Largest microseconds-per-quarter a tempo meta event can hold (24 bits).
const MAX_TEMPO_MICROSECONDS: u32 = 0xFF_FFFF;

/// General MIDI program numbers.
const PROGRAM_MELODY: u8 = 73; // flute
const PROGRAM_CHORDS: u8 = 0; // acoustic grand piano

/// A melody read from a MIDI file.
#[derive(Debug, Clone)]
pub struct ImportedMelody {
    pub meter: Meter,
    pub tempo_bpm: f64,
    pub events: Vec<MelodyEvent>,
}

/// Read a melody from a MIDI file on disk.
pub fn read_melody(path: &Path) -> Result<ImportedMelody> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_melody(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a melody from SMF bytes.
pub fn parse_melody(bytes: &[u8]) -> Result<ImportedMelody> {
    let smf = Smf::parse(bytes).context("Failed to parse MIDI file")?;
    let ppq = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(..) => bail!("SMPTE timecode timing is not supported"),
    };
    if ppq == 0 {
        bail!("MIDI header has zero ticks per quarter note");
    }

    let mut meter: Option<(u64, Meter)> = None;
    let mut tempo: Option<(u64, f64)> = None;
    // (start, end, pitch)
    let mut notes: Vec<(u64, u64, u8)> = Vec::new();

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        let mut sounding: HashMap<(u8, u8), u64> = HashMap::new();

        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                    if meter.is_none_or(|(t, _)| tick < t) {
                        meter = Some((tick, Meter::new(num, 1u8 << denom_pow.min(6))));
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                    if tempo.is_none_or(|(t, _)| tick < t) && us.as_int() > 0 {
                        tempo = Some((tick, 60_000_000.0 / us.as_int() as f64));
                    }
                }
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let key = key.as_int();
                            if let Some(start) = sounding.insert((channel, key), tick) {
                                notes.push((start, tick, key));
                            }
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let key = key.as_int();
                            if let Some(start) = sounding.remove(&(channel, key)) {
                                notes.push((start, tick, key));
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if !sounding.is_empty() {
            warn!(count = sounding.len(), "notes still sounding at end of track, closing them");
            for ((_, key), start) in sounding {
                notes.push((start, tick, key));
            }
        }
    }

    let meter = meter.map(|(_, m)| m).unwrap_or_default();
    let tempo_bpm = tempo.map(|(_, bpm)| bpm).unwrap_or(DEFAULT_TEMPO_BPM);

    // Highest pitch first within a shared onset, then keep the first per onset.
    notes.sort_by(|a, b| a.0.cmp(&b.0).then(b.2.cmp(&a.2)));
    notes.dedup_by_key(|n| n.0);

    let q = ppq as f64;
    let events: Vec<MelodyEvent> = notes
        .iter()
        .map(|&(start, end, pitch)| {
            MelodyEvent::timed(
                pitch,
                meter.beat_strength_at_tick(start, ppq),
                start as f64 / q,
                end.saturating_sub(start) as f64 / q,
            )
        })
        .collect();

    debug!(
        notes = events.len(),
        numerator = meter.numerator,
        denominator = meter.denominator,
        tempo_bpm,
        "imported melody"
    );

    Ok(ImportedMelody {
        meter,
        tempo_bpm,
        events,
    })
}

/// Write melody plus voiced chords to a MIDI file.
pub fn write_harmonization(
    path: &Path,
    melody: &[MelodyEvent],
    chords: &[VoicedSlot],
    meter: Meter,
    tempo_bpm: f64,
) -> Result<()> {
    let smf = harmonization_to_smf(melody, chords, meter, tempo_bpm);
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(anyhow::Error::msg)
        .context("encoding MIDI")?;
    std::fs::write(path, &buf).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn to_ticks(quarters: f64) -> u64 {
    (quarters.max(0.0) * TICKS_PER_QUARTER as f64).round() as u64
}

/// Build the in-memory SMF: tempo track, melody track, chord track.
pub fn harmonization_to_smf(
    melody: &[MelodyEvent],
    chords: &[VoicedSlot],
    meter: Meter,
    tempo_bpm: f64,
) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let bpm = if tempo_bpm > 0.0 { tempo_bpm } else { DEFAULT_TEMPO_BPM };
    let exact = (60_000_000.0 / bpm).round();
    if exact > MAX_TEMPO_MICROSECONDS as f64 {
        warn!(tempo_bpm = bpm, "tempo too slow for a MIDI tempo event, clamping");
    }
    let tempo_microseconds = exact.min(MAX_TEMPO_MICROSECONDS as f64) as u32;
    let denom_pow = meter.denominator.max(1).trailing_zeros() as u8;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(meter.numerator, denom_pow, 24, 8)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let melody_notes: Vec<(u64, u64, u8)> = melody
        .iter()
        .map(|e| {
            let start = to_ticks(e.onset);
            (start, start + to_ticks(e.duration), e.pitch)
        })
        .collect();
    smf.tracks.push(notes_to_track("Melody", u4::new(0), PROGRAM_MELODY, &melody_notes));

    let chord_notes: Vec<(u64, u64, u8)> = chords
        .iter()
        .flat_map(|c| {
            let start = to_ticks(c.onset);
            let end = start + to_ticks(c.duration);
            c.notes.iter().map(move |&p| (start, end, p))
        })
        .collect();
    smf.tracks.push(notes_to_track("Harmony", u4::new(1), PROGRAM_CHORDS, &chord_notes));

    smf
}

/// One track from (start, end, pitch) triples. Note-offs sort ahead of
/// note-ons at the same tick so repeated pitches re-attack cleanly.
fn notes_to_track(name: &'static str, channel: u4, program: u8, notes: &[(u64, u64, u8)]) -> Track<'static> {
    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(program),
            },
        },
    });

    // (tick, is_on, pitch)
    let mut timeline: Vec<(u64, bool, u8)> = Vec::with_capacity(notes.len() * 2);
    for &(start, end, pitch) in notes {
        if end <= start {
            continue;
        }
        let pitch = pitch.min(127);
        timeline.push((start, true, pitch));
        timeline.push((end, false, pitch));
    }
    timeline.sort();

    let mut last_tick = 0u64;
    for (tick, is_on, pitch) in timeline {
        let delta = (tick - last_tick) as u32;
        last_tick = tick;
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(pitch),
                vel: u7::new(80),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(pitch),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}
