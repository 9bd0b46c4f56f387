//! markeranchor CLI — replay and inspect recorded marker tracking streams.

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use markeranchor::{
    FrameRecord, MarkerDescriptor, PoseParams, Recording, RegistryConfig, SampleParams,
    TrackingQuality,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "markeranchor")]
#[command(about = "Stabilize and replay image-marker tracking streams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded tracking stream and write per-frame marker states.
    Replay(CliReplayArgs),

    /// Print (or write) the default registry configuration as JSON.
    DefaultConfig {
        /// Write to this path instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Load and validate a registry configuration file.
    CheckConfig {
        /// Path to the configuration (JSON).
        #[arg(long)]
        config: PathBuf,
    },

    /// Generate a seeded, noisy single-marker recording.
    Synth(CliSynthArgs),
}

#[derive(Debug, Clone, Args)]
struct CliReplayArgs {
    /// Path to the recording (JSON).
    #[arg(long)]
    input: PathBuf,

    /// Path to write replay snapshots (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Registry configuration overriding the one embedded in the recording.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliSynthArgs {
    /// Path to write the recording (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Marker name.
    #[arg(long, default_value = "Poster")]
    name: String,

    /// Number of frames.
    #[arg(long, default_value = "300")]
    frames: usize,

    /// Frame rate (frames per second).
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// RNG seed.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Uniform position jitter amplitude (m).
    #[arg(long, default_value = "0.003")]
    jitter: f64,

    /// Start a dropout every N frames (0 disables dropouts).
    #[arg(long, default_value = "90")]
    dropout_every: usize,

    /// Length of each dropout in frames.
    #[arg(long, default_value = "12")]
    dropout_frames: usize,

    /// Probability that a tracked frame is reported at limited quality.
    #[arg(long, default_value = "0.1")]
    limited_ratio: f64,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => run_replay(&args),
        Commands::DefaultConfig { out } => run_default_config(out.as_deref()),
        Commands::CheckConfig { config } => run_check_config(&config),
        Commands::Synth(args) => run_synth(&args),
    }
}

// ── replay ─────────────────────────────────────────────────────────────

fn run_replay(args: &CliReplayArgs) -> CliResult<()> {
    tracing::info!("Loading recording: {}", args.input.display());
    let recording = Recording::from_json_file(&args.input).map_err(|e| -> CliError {
        format!("Failed to load {}: {}", args.input.display(), e).into()
    })?;

    let config = match &args.config {
        Some(path) => Some(RegistryConfig::from_json_file(path)?),
        None => None,
    };

    tracing::info!(
        "Replaying {} frames ({:.2}s) for {} markers",
        recording.frames.len(),
        recording.duration(),
        recording.markers.len(),
    );

    let frames = markeranchor::replay(&recording, config);
    if frames.is_empty() && !recording.frames.is_empty() {
        return Err("replay produced no frames; check the configuration".into());
    }

    let visible_frames = frames
        .iter()
        .filter(|f| f.markers.iter().any(|m| m.active))
        .count();
    tracing::info!(
        "{} of {} frames had at least one visible marker",
        visible_frames,
        frames.len()
    );

    let json = serde_json::to_string_pretty(&frames)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Snapshots written to {}", args.out.display());
    Ok(())
}

// ── default-config / check-config ──────────────────────────────────────

fn run_default_config(out: Option<&std::path::Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(&RegistryConfig::default())?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Default configuration written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_check_config(path: &std::path::Path) -> CliResult<()> {
    let cfg = RegistryConfig::from_json_file(path)?;
    println!("configuration OK: {}", path.display());
    println!("  deactivation delay:   {} s", cfg.deactivation_delay);
    println!("  allow reactivation:   {}", cfg.allow_reactivation);
    println!("  error threshold:      {} s", cfg.stabilizer.error_threshold);
    println!("  no-pose threshold:    {} s", cfg.stabilizer.non_track_threshold);
    println!("  dead zone:            {} m", cfg.stabilizer.dead_zone_threshold);
    println!("  max reacquire jump:   {} m", cfg.stabilizer.max_reacquire_jump);
    Ok(())
}

// ── synth ──────────────────────────────────────────────────────────────

fn validate_synth_args(args: &CliSynthArgs) -> CliResult<()> {
    if !args.fps.is_finite() || args.fps <= 0.0 {
        return Err("--fps must be finite and > 0".into());
    }
    if !args.jitter.is_finite() || args.jitter < 0.0 {
        return Err("--jitter must be finite and >= 0".into());
    }
    if !args.limited_ratio.is_finite() {
        return Err("--limited-ratio must be finite".into());
    }
    Ok(())
}

fn run_synth(args: &CliSynthArgs) -> CliResult<()> {
    validate_synth_args(args)?;
    let recording = synth_recording(args);
    let json = serde_json::to_string_pretty(&recording)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!(
        "Wrote {} synthetic frames for '{}' to {}",
        recording.frames.len(),
        args.name,
        args.out.display()
    );
    Ok(())
}

fn synth_recording(args: &CliSynthArgs) -> Recording {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let dt = 1.0 / args.fps;
    let limited_ratio = args.limited_ratio.clamp(0.0, 1.0);
    let base = [0.0, 0.0, 1.5];

    let frames = (0..args.frames)
        .map(|i| {
            let in_dropout = args.dropout_every > 0
                && i >= args.dropout_every
                && i % args.dropout_every < args.dropout_frames;
            let quality = if in_dropout {
                TrackingQuality::None
            } else if rng.gen_bool(limited_ratio) {
                TrackingQuality::Limited
            } else {
                TrackingQuality::Tracking
            };
            let mut position = base;
            if quality.has_pose() && args.jitter > 0.0 {
                for v in &mut position {
                    *v += rng.gen_range(-args.jitter..=args.jitter);
                }
            }
            let sample = SampleParams {
                name: args.name.as_str().into(),
                pose: PoseParams {
                    position,
                    rotation: [0.0, 0.0, 0.0, 1.0],
                },
                quality,
            };
            let mut record = FrameRecord {
                dt,
                ..Default::default()
            };
            if i == 0 {
                record.added.push(sample);
            } else {
                record.updated.push(sample);
            }
            record
        })
        .collect();

    Recording {
        markers: vec![MarkerDescriptor::new(args.name.as_str())],
        config: None,
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth_args() -> CliSynthArgs {
        CliSynthArgs {
            out: PathBuf::from("unused.json"),
            name: "Poster".to_string(),
            frames: 100,
            fps: 20.0,
            seed: 7,
            jitter: 0.002,
            dropout_every: 40,
            dropout_frames: 5,
            limited_ratio: 0.0,
        }
    }

    #[test]
    fn synth_is_deterministic_per_seed() {
        let a = serde_json::to_string(&synth_recording(&synth_args())).unwrap();
        let b = serde_json::to_string(&synth_recording(&synth_args())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn synth_places_dropouts() {
        let rec = synth_recording(&synth_args());
        assert_eq!(rec.frames.len(), 100);
        assert_eq!(rec.frames[0].added.len(), 1);
        assert_eq!(rec.frames[40].updated[0].quality, TrackingQuality::None);
        assert_eq!(rec.frames[44].updated[0].quality, TrackingQuality::None);
        assert_eq!(rec.frames[45].updated[0].quality, TrackingQuality::Tracking);
    }

    #[test]
    fn synth_replays_with_marker_visible_at_end() {
        let rec = synth_recording(&synth_args());
        let frames = markeranchor::replay(&rec, None);
        assert_eq!(frames.len(), 100);
        assert!(frames.last().unwrap().markers[0].active);
    }

    #[test]
    fn synth_rejects_non_finite_arguments() {
        assert!(validate_synth_args(&synth_args()).is_ok());

        let nan_ratio = CliSynthArgs {
            limited_ratio: f64::NAN,
            ..synth_args()
        };
        assert!(validate_synth_args(&nan_ratio).is_err());

        let inf_jitter = CliSynthArgs {
            jitter: f64::INFINITY,
            ..synth_args()
        };
        assert!(validate_synth_args(&inf_jitter).is_err());

        let negative_jitter = CliSynthArgs {
            jitter: -0.1,
            ..synth_args()
        };
        assert!(validate_synth_args(&negative_jitter).is_err());

        let zero_fps = CliSynthArgs {
            fps: 0.0,
            ..synth_args()
        };
        assert!(validate_synth_args(&zero_fps).is_err());
    }

    #[test]
    fn cli_parses_replay() {
        let cli = Cli::try_parse_from([
            "markeranchor",
            "replay",
            "--input",
            "in.json",
            "--out",
            "out.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Replay(_)));
    }
}
