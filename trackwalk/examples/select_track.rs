//! Select a track by segment uuid and print its members and length.

use std::path::Path;
use trackwalk::{TrackOptions, TrackWalkCore, TrackWalkError};

fn main() -> Result<(), TrackWalkError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/two_layer.json".to_string());
    let segment = args.next().unwrap_or_else(|| "sig-a".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example select_track [path/to/board.json] [segment-uuid]");
        std::process::exit(1);
    }

    let mut board = TrackWalkCore::load_board(path)?;
    let report = TrackWalkCore::select_track(&mut board, &segment, &TrackOptions::default())?;

    println!("Track containing {} on {}", report.reference, report.board);
    for item in &report.segments {
        println!("  {} {} {} -> {}", item.kind, item.uuid, item.start, item.end);
    }
    println!();
    println!("Segments:   {}", report.count);
    println!("Length:     {}", report.length);
    println!("Die length: {}", report.die_length);

    Ok(())
}
