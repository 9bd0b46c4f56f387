use markeranchor::{replay, Recording, RegistryConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <recording.json> [config.json] [out.json]", args[0]);
        std::process::exit(2);
    }

    let recording = Recording::from_json_file(Path::new(&args[1]))?;
    let config = match args.get(2) {
        Some(path) => Some(RegistryConfig::from_json_file(Path::new(path))?),
        None => None,
    };

    let frames = replay(&recording, config);
    let hidden_at_end = frames
        .last()
        .map(|f| f.markers.iter().filter(|m| !m.active).count())
        .unwrap_or(0);
    println!(
        "Replayed {} frames; {} of {} markers hidden at the end.",
        frames.len(),
        hidden_at_end,
        recording.markers.len()
    );

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&frames)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
