use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use serde_json::json;
use stamp_tracker_rs::recording::load_recording;
use stamp_tracker_rs::{RecognizerConfig, StampRecognizer};

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recorded session (*.jsonl[.gz])
    #[arg(long, conflicts_with = "golden_dir")]
    log: Option<PathBuf>,

    /// Directory of recordings to batch replay
    #[arg(long)]
    golden_dir: Option<PathBuf>,

    /// JSON file overriding retention and thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the retention window (ms)
    #[arg(long)]
    retention_ms: Option<i64>,

    /// Override the minimum knee depth change (m)
    #[arg(long)]
    knee_depth: Option<f64>,

    /// Override the minimum ankle/foot height change (m)
    #[arg(long)]
    foot_height: Option<f64>,
}

fn build_config(args: &Args) -> anyhow::Result<RecognizerConfig> {
    let mut config = match &args.config {
        Some(path) => RecognizerConfig::load(path)?,
        None => RecognizerConfig::default(),
    };
    if let Some(retention) = args.retention_ms {
        config.retention_ms = retention;
    }
    if let Some(knee) = args.knee_depth {
        config.thresholds.min_knee_depth_change = knee;
    }
    if let Some(height) = args.foot_height {
        config.thresholds.min_foot_height_change = height;
    }
    config.validate()?;
    Ok(config)
}

/// Replay one recording frame by frame, letting every evaluation finish
/// before the next frame so results do not depend on machine speed.
fn run_once(path: &Path, config: &RecognizerConfig) -> anyhow::Result<serde_json::Value> {
    let frames = load_recording(path)?;
    let recognizer = StampRecognizer::new(config.clone())?;
    let stamp_rx = recognizer.bus().subscribe_channel();

    let started = Instant::now();
    let mut invalid = 0usize;
    for frame in &frames {
        invalid += recognizer.ingest_frame(frame)?;
        if !recognizer.wait_idle(Duration::from_secs(5)) {
            anyhow::bail!("evaluation did not finish for frame t={}", frame.timestamp);
        }
    }
    let elapsed = started.elapsed();

    let stamps: Vec<_> = stamp_rx.try_iter().collect();
    let counts = recognizer.total_counts();
    let duration_ms = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => 0,
    };

    Ok(json!({
        "log": path.display().to_string(),
        "frames": frames.len(),
        "duration_ms": duration_ms,
        "invalid_samples": invalid,
        "stamps": stamps,
        "left_stamps": recognizer.counts(stamp_tracker_rs::Side::Left).matches,
        "right_stamps": recognizer.counts(stamp_tracker_rs::Side::Right).matches,
        "evaluations": counts.evaluations_started,
        "busy_drops": counts.busy_drops,
        "replay_secs": elapsed.as_secs_f64(),
    }))
}

fn is_recording(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".jsonl") || name.ends_with(".jsonl.gz")
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let config = build_config(&args)?;

    if let Some(log) = &args.log {
        let result = run_once(log, &config)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let Some(dir) = &args.golden_dir else {
        anyhow::bail!("Provide --log or --golden-dir");
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_recording(p))
        .collect();
    paths.sort();

    let mut results = Vec::new();
    for path in &paths {
        match run_once(path, &config) {
            Ok(result) => results.push(result),
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                results.push(json!({ "log": path.display().to_string(), "error": e.to_string() }));
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
