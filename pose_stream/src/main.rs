//! pose_inspect: run a pose recording through the classifier and print
//! the per-frame energy and gestures.
//!
//! ```text
//! pose_inspect <recording.jsonl> [width] [height] [--mirror] [--gestures-only]
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

use pose_stream::{GestureClassifier, PoseFrame};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=trace shows discarded keypoints
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mirror        = args.iter().any(|a| a == "--mirror");
    let gestures_only = args.iter().any(|a| a == "--gestures-only");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let Some(path) = positional.first() else {
        eprintln!("usage: pose_inspect <recording.jsonl> [width] [height] [--mirror] [--gestures-only]");
        process::exit(2);
    };
    let width:  u32 = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(1280);
    let height: u32 = positional.get(2).and_then(|s| s.parse().ok()).unwrap_or(720);

    let file = match File::open(path) {
        Ok(f)  => f,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", path, e);
            process::exit(1);
        }
    };

    println!();
    println!("  ┌─ {} ({}×{}{}) ─", path, width, height, if mirror { ", mirrored" } else { "" });
    println!("  │");

    match inspect(BufReader::new(file), width, height, mirror, gestures_only) {
        Ok(stats) => {
            println!("  │");
            println!(
                "  └─ {} frames, {} skipped, {} with gestures, peak energy {:.1}",
                stats.frames, stats.skipped, stats.gesture_frames, stats.peak_energy
            );
            println!();
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    frames:         usize,
    skipped:        usize,
    gesture_frames: usize,
    peak_energy:    f32,
}

fn inspect<R: BufRead>(
    reader: R,
    width: u32,
    height: u32,
    mirror: bool,
    gestures_only: bool,
) -> io::Result<Stats> {
    let mut classifier = GestureClassifier::new();
    let mut stats = Stats::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }

        let frame = match PoseFrame::from_json(&line) {
            Ok(f)  => f,
            Err(e) => {
                eprintln!("  ⚠  line {}: {}", lineno + 1, e);
                stats.skipped += 1;
                continue;
            }
        };

        let analysis = classifier.classify(frame.to_snapshot(width, height, mirror));
        let idx = stats.frames;
        stats.frames += 1;
        stats.peak_energy = stats.peak_energy.max(analysis.movement_energy);
        if !analysis.gestures.is_empty() {
            stats.gesture_frames += 1;
        }

        if gestures_only && analysis.gestures.is_empty() { continue; }
        println!(
            "  │  {:>5}  points={:>2}  energy={:>4.1}  {}",
            idx,
            analysis.keypoints.len(),
            analysis.movement_energy,
            analysis.gestures,
        );
    }
    Ok(stats)
}
