// Canticle Harmony: CLI entry point.
//
// Reads a melody (JSON or MIDI), harmonizes it, prints each pipeline stage,
// and writes melody plus chords to a MIDI file.
// The pipeline: load melody → build vocabulary → derive and propagate
// candidates → enumerate progressions → choose → voice → MIDI output.
//
// Usage:
//   cargo run -p canticle_harmony -- melody.json [-o out.mid] [--seed N]
//   cargo run -p canticle_harmony -- tune.mid --tonic G --mode major
//
// A JSON melody looks like:
//   { "tonic": "C", "mode": "major",
//     "events": [ { "pitch": 60, "beat_strength": 1.0 }, ... ] }
// Events without onset/duration are laid out one quarter note apart.

use anyhow::{Context, Result, bail};
use canticle_harmony::config::HarmonizerConfig;
use canticle_harmony::harmonizer::Harmonizer;
use canticle_harmony::melody::{MelodyEvent, fill_missing_timing};
use canticle_harmony::meter::Meter;
use canticle_harmony::midi::{read_melody, write_harmonization};
use canticle_harmony::mode::{Key, Mode};
use canticle_harmony::names::{note_name, parse_pitch_class, pitch_name};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{Level, debug};

#[derive(Parser)]
#[command(name = "harmonize")]
#[command(about = "Harmonize a melody with diatonic chords")]
#[command(version)]
struct Cli {
    /// Melody file (.json, .mid or .midi)
    input: PathBuf,

    /// Output MIDI file
    #[arg(short, long, default_value = "harmonized.mid")]
    output: PathBuf,

    /// Tonic note name (C, F#, Bb, ...); overrides the melody file
    #[arg(long)]
    tonic: Option<String>,

    /// Mode (major or minor); overrides the melody file
    #[arg(long)]
    mode: Option<String>,

    /// RNG seed for choosing among valid progressions
    #[arg(long)]
    seed: Option<u64>,

    /// Harmonizer config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Beat-strength threshold for harmonized notes
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum prefix extensions during search
    #[arg(long)]
    node_budget: Option<u64>,

    /// Print every valid progression
    #[arg(long)]
    list: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// JSON melody file.
#[derive(Deserialize)]
struct MelodyFile {
    tonic: Option<String>,
    mode: Option<String>,
    #[serde(default)]
    meter: Option<Meter>,
    #[serde(default)]
    tempo_bpm: Option<f64>,
    events: Vec<MelodyEvent>,
}

/// Melody plus whatever key and timing hints came with it.
struct LoadedMelody {
    tonic: Option<String>,
    mode: Option<String>,
    meter: Meter,
    tempo_bpm: f64,
    events: Vec<MelodyEvent>,
}

fn load_melody(path: &Path) -> Result<LoadedMelody> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let file: MelodyFile = serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?;
            if let Some(e) = file.events.iter().find(|e| e.pitch > 127) {
                bail!("pitch {} is outside the MIDI range", e.pitch);
            }
            let mut events = file.events;
            fill_missing_timing(&mut events);
            Ok(LoadedMelody {
                tonic: file.tonic,
                mode: file.mode,
                meter: file.meter.unwrap_or_default(),
                tempo_bpm: file.tempo_bpm.unwrap_or(120.0),
                events,
            })
        }
        "mid" | "midi" => {
            let imported = read_melody(path)?;
            Ok(LoadedMelody {
                tonic: None,
                mode: None,
                meter: imported.meter,
                tempo_bpm: imported.tempo_bpm,
                events: imported.events,
            })
        }
        _ => bail!(
            "unrecognized melody format '{}' (expected .json, .mid or .midi)",
            path.display()
        ),
    }
}

fn resolve_key(tonic: Option<&str>, mode: Option<&str>) -> Result<Key> {
    let Some(tonic) = tonic else {
        bail!("no tonic given: pass --tonic or set \"tonic\" in the melody file");
    };
    let tonic_pc =
        parse_pitch_class(tonic).with_context(|| format!("unrecognized tonic '{}'", tonic))?;
    let mode: Mode = mode.unwrap_or("major").parse()?;
    Ok(Key::new(tonic_pc, mode))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => HarmonizerConfig::load(path)?,
        None => HarmonizerConfig::default(),
    };
    if let Some(t) = cli.threshold {
        config.strength_threshold = t;
    }
    if let Some(n) = cli.node_budget {
        config.node_budget = n;
    }
    debug!(?config, "configuration");

    println!("=== Canticle Harmony ===");
    println!("Input: {}", cli.input.display());
    println!("Output: {}", cli.output.display());

    println!("[1/4] Loading melody...");
    let melody = load_melody(&cli.input)?;
    let key = resolve_key(
        cli.tonic.as_deref().or(melody.tonic.as_deref()),
        cli.mode.as_deref().or(melody.mode.as_deref()),
    )?;
    let flats = key.uses_flats();
    println!(
        "  {} notes, {}/{} at {:.0} BPM",
        melody.events.len(),
        melody.meter.numerator,
        melody.meter.denominator,
        melody.tempo_bpm
    );
    println!("  Key: {} {}", note_name(key.tonic_pc(), flats), key.mode());

    println!("[2/4] Harmonizing (threshold {})...", config.strength_threshold);
    let harmonizer = Harmonizer::new(config);
    let harmonization = harmonizer
        .harmonize(&melody.events, key)
        .context("harmonization failed")?;

    println!("  Chord vocabulary:");
    for chord in harmonization.vocabulary().iter() {
        let names: Vec<&str> = chord.tones().iter().map(|&pc| note_name(pc, flats)).collect();
        println!("    {:<4} {}", chord.degree.roman(), names.join(" "));
    }
    println!("  Candidates:");
    for (slot, set) in harmonization.slots().iter().zip(harmonization.candidates().iter()) {
        println!(
            "    note {:>3} {:<4} {}",
            slot.position,
            pitch_name(slot.pitch, flats),
            set
        );
    }
    let progressions = harmonization.progressions();
    println!(
        "  {} valid progressions ({} nodes expanded, {} rejected for parallel fifths)",
        progressions.len(),
        progressions.nodes_expanded,
        progressions.rejected_parallel_fifths
    );
    if cli.list {
        for p in progressions.iter() {
            println!("    {}", p);
        }
    }

    println!("[3/4] Choosing progression...");
    let mut rng = match cli.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let chosen = harmonization.choose(&mut rng);
    println!("  {}", chosen);
    let voiced = harmonization.realize(chosen);

    println!("[4/4] Writing MIDI...");
    write_harmonization(&cli.output, &melody.events, &voiced, melody.meter, melody.tempo_bpm)?;
    println!("  Wrote {} chords to {}", voiced.len(), cli.output.display());

    Ok(())
}
