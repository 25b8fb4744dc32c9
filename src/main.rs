use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{sleep, Duration};

use stamp_tracker_rs::evaluator::EvaluatorCounts;
use stamp_tracker_rs::live_status::LiveStatus;
use stamp_tracker_rs::recording::load_recording;
use stamp_tracker_rs::source::{replay_loop, synthetic_loop, SyntheticMotion};
use stamp_tracker_rs::{
    ItemSelector, JointKind, RecognizerConfig, SelectionEvent, SkeletonFrame,
    StampDetected, StampRecognizer,
};

#[derive(Parser, Debug)]
#[command(name = "stamp_tracker")]
#[command(about = "Foot-stamp gesture tracker over a live or recorded skeleton stream", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until the source ends)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Recorded session (*.jsonl or *.jsonl.gz); synthetic stream if omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Playback speed multiplier for recordings
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// JSON file overriding retention and thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of selectable items to calibrate
    #[arg(long, default_value = "8")]
    items: usize,

    /// Output directory
    #[arg(long, default_value = "stamp_tracker_sessions")]
    output_dir: String,
}

#[derive(Serialize, Deserialize)]
struct SessionSummary {
    started_at: String,
    frames_received: u64,
    frames_dropped: u64,
    invalid_samples: u64,
    counts: EvaluatorCounts,
    stamps: Vec<StampDetected>,
    selection: Vec<SelectionEvent>,
    selected_item: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RecognizerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RecognizerConfig::default(),
    };

    info!("Stamp Tracker RS Starting");
    info!("  Duration: {} seconds (0=until source ends)", args.duration);
    info!("  Source: {}", args.input.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "synthetic".into()));
    info!("  Retention: {} ms, thresholds: {:?}", config.retention_ms, config.thresholds);
    info!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let recognizer = StampRecognizer::new(config)?;
    let stamp_rx = recognizer.bus().subscribe_channel();
    let mut selector = ItemSelector::new(args.items);

    let (frame_tx, mut frame_rx) = mpsc::channel::<SkeletonFrame>(64);
    let dropped = Arc::new(AtomicU64::new(0));

    // Hold the handle so the source task stays alive
    let _source_handle = match &args.input {
        Some(path) => {
            let frames = load_recording(path).with_context(|| format!("loading {}", path.display()))?;
            info!("Loaded {} frames from {}", frames.len(), path.display());
            let speed = args.speed;
            let replay_dropped = dropped.clone();
            tokio::spawn(async move {
                replay_loop(frame_tx, frames, speed, replay_dropped).await;
            })
        }
        None => tokio::spawn(synthetic_loop(frame_tx, SyntheticMotion::default(), dropped.clone())),
    };

    let started_at = Utc::now();
    let mut last_status_update = Utc::now();
    let mut status = LiveStatus::new();
    let mut stamps: Vec<StampDetected> = Vec::new();
    let mut selection_log: Vec<SelectionEvent> = Vec::new();
    let mut frames_received = 0u64;
    let mut invalid_samples = 0u64;

    if let Some(next) = selector.calibrating() {
        info!("Calibration: stamp on the spot of item {}", next + 1);
    }

    'main: loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(started_at);
            if elapsed.num_seconds() as u64 >= args.duration {
                info!("Duration reached, stopping...");
                break;
            }
        }

        // Drain available frames
        loop {
            match frame_rx.try_recv() {
                Ok(frame) => {
                    frames_received += 1;
                    invalid_samples += recognizer.ingest_frame(&frame)? as u64;

                    let spine = frame
                        .joint_events()
                        .into_iter()
                        .find(|e| e.joint == JointKind::Spine);
                    if let Some(event) = spine.and_then(|s| selector.on_spine(&s.position)) {
                        log_selection(&event);
                        selection_log.push(event);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Frame source finished");
                    break 'main;
                }
            }
        }

        while let Ok(stamp) = stamp_rx.try_recv() {
            handle_stamp(&stamp, &mut selector, &mut status, &mut selection_log);
            stamps.push(stamp);
        }

        // Update live status every 2 seconds
        let now = Utc::now();
        if now.signed_duration_since(last_status_update).num_seconds() >= 2 {
            write_status(
                &mut status,
                &recognizer,
                &selector,
                frames_received,
                dropped.load(Ordering::Relaxed),
                invalid_samples,
                now.signed_duration_since(started_at).num_seconds().max(0) as u64,
                &Path::new(&args.output_dir).join("live_status.json"),
            );
            last_status_update = now;
        }

        sleep(Duration::from_millis(1)).await;
    }

    // Let the last evaluations land before the final save
    if !recognizer.wait_idle(std::time::Duration::from_secs(2)) {
        warn!("Evaluations still in flight at shutdown");
    }
    while let Ok(stamp) = stamp_rx.try_recv() {
        handle_stamp(&stamp, &mut selector, &mut status, &mut selection_log);
        stamps.push(stamp);
    }

    let uptime = Utc::now().signed_duration_since(started_at).num_seconds().max(0) as u64;
    write_status(
        &mut status,
        &recognizer,
        &selector,
        frames_received,
        dropped.load(Ordering::Relaxed),
        invalid_samples,
        uptime,
        &Path::new(&args.output_dir).join("live_status_final.json"),
    );

    let counts = recognizer.total_counts();
    let summary = SessionSummary {
        started_at: started_at.to_rfc3339(),
        frames_received,
        frames_dropped: dropped.load(Ordering::Relaxed),
        invalid_samples,
        counts,
        stamps: stamps.clone(),
        selection: selection_log,
        selected_item: selector.selected(),
    };
    let filename = format!("{}/stamps_{}.json", args.output_dir, ts_now_clean());
    std::fs::write(&filename, serde_json::to_string_pretty(&summary)?)?;
    info!("Saved {} stamps to {}", stamps.len(), filename);

    println!("\n=== Final Stats ===");
    println!("Frames received: {}", frames_received);
    println!("Foot arrivals: {}", counts.foot_arrivals);
    println!("Evaluations: {} ({} dropped while busy)", counts.evaluations_started, counts.busy_drops);
    println!("Stamps: {}", counts.matches);
    if let Some(item) = selector.selected() {
        println!("Selected item: {}", item + 1);
    }

    Ok(())
}

fn handle_stamp(
    stamp: &StampDetected,
    selector: &mut ItemSelector,
    status: &mut LiveStatus,
    selection_log: &mut Vec<SelectionEvent>,
) {
    status.record_stamp(stamp);
    for event in selector.on_stamp(stamp) {
        log_selection(&event);
        selection_log.push(event);
    }
}

fn log_selection(event: &SelectionEvent) {
    match event {
        SelectionEvent::ItemCalibrated { index, next, .. } => {
            info!("Item {} calibrated", index + 1);
            if let Some(next) = next {
                info!("Calibration: stamp on the spot of item {}", next + 1);
            }
        }
        SelectionEvent::Calibrated => info!("All items calibrated"),
        SelectionEvent::Hovered { index, .. } => info!("Hovering item {}", index + 1),
        SelectionEvent::Selected { index, .. } => info!("Selected item {}", index + 1),
    }
}

#[allow(clippy::too_many_arguments)]
fn write_status(
    status: &mut LiveStatus,
    recognizer: &StampRecognizer,
    selector: &ItemSelector,
    frames_received: u64,
    frames_dropped: u64,
    invalid_samples: u64,
    uptime_seconds: u64,
    path: &Path,
) {
    status.update_from(recognizer);
    status.frames_received = frames_received;
    status.frames_dropped = frames_dropped;
    status.invalid_samples = invalid_samples;
    status.uptime_seconds = uptime_seconds;
    status.selector_calibrated = selector.is_calibrated();
    status.hovered_item = selector.hovered();
    status.selected_item = selector.selected();
    if let Err(e) = status.save(path) {
        warn!("Failed to write {}: {}", path.display(), e);
    }
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
