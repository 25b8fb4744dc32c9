//! Per-side single-flight evaluation
//!
//! Each side owns one worker thread fed through a bounded(1) job channel.
//! A foot arrival either dispatches a snapshot to the worker or, while an
//! evaluation is still running, is dropped and counted. The ingestion path
//! never waits on the worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::bus::GestureBus;
use crate::error::{RecognizerError, Result};
use crate::matcher::PatternMatcher;
use crate::tracking::SideTracks;
use crate::types::{Side, StampDetected, Timestamp};

/// Outcome of a foot arrival on the ingestion path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    /// An evaluation was already in flight; this arrival was dropped
    Busy,
}

#[derive(Debug, Default)]
pub struct EvaluatorStats {
    foot_arrivals: AtomicU64,
    evaluations_started: AtomicU64,
    busy_drops: AtomicU64,
    matches: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorCounts {
    pub foot_arrivals: u64,
    pub evaluations_started: u64,
    pub busy_drops: u64,
    pub matches: u64,
}

impl EvaluatorStats {
    pub fn counts(&self) -> EvaluatorCounts {
        EvaluatorCounts {
            foot_arrivals: self.foot_arrivals.load(Ordering::Relaxed),
            evaluations_started: self.evaluations_started.load(Ordering::Relaxed),
            busy_drops: self.busy_drops.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
        }
    }
}

impl std::ops::Add for EvaluatorCounts {
    type Output = EvaluatorCounts;

    fn add(self, other: EvaluatorCounts) -> EvaluatorCounts {
        EvaluatorCounts {
            foot_arrivals: self.foot_arrivals + other.foot_arrivals,
            evaluations_started: self.evaluations_started + other.evaluations_started,
            busy_drops: self.busy_drops + other.busy_drops,
            matches: self.matches + other.matches,
        }
    }
}

/// Busy flag with an idle notification
#[derive(Debug, Default)]
struct InFlight {
    busy: Mutex<bool>,
    idle: Condvar,
}

impl InFlight {
    fn try_acquire(&self) -> bool {
        let mut busy = match self.busy.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *busy {
            return false;
        }
        *busy = true;
        true
    }

    fn release(&self) {
        let mut busy = match self.busy.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *busy = false;
        self.idle.notify_all();
    }

    fn is_busy(&self) -> bool {
        self.busy.lock().map(|b| *b).unwrap_or(true)
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut busy = match self.busy.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while *busy {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            busy = match self.idle.wait_timeout(busy, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

/// Frees the side when an evaluation ends, however it ends.
struct ReleaseOnDrop<'a>(&'a InFlight);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

struct EvaluationJob {
    snapshot: SideTracks,
    trigger_ts: Timestamp,
}

pub struct SideEvaluator {
    side: Side,
    tracks: Arc<Mutex<SideTracks>>,
    in_flight: Arc<InFlight>,
    stats: Arc<EvaluatorStats>,
    jobs: Option<Sender<EvaluationJob>>,
    worker: Option<JoinHandle<()>>,
}

impl SideEvaluator {
    /// Start the worker thread for `side`. `tracks` is the live state shared
    /// with the ingestion path.
    pub fn spawn(
        side: Side,
        tracks: Arc<Mutex<SideTracks>>,
        matcher: Arc<dyn PatternMatcher>,
        bus: GestureBus,
    ) -> Result<Self> {
        let (job_tx, job_rx) = bounded::<EvaluationJob>(1);
        let in_flight = Arc::new(InFlight::default());
        let stats = Arc::new(EvaluatorStats::default());

        let worker = {
            let tracks = tracks.clone();
            let in_flight = in_flight.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name(format!("stamp-eval-{}", side.as_str()))
                .spawn(move || run_worker(side, job_rx, tracks, matcher, bus, in_flight, stats))?
        };

        Ok(SideEvaluator {
            side,
            tracks,
            in_flight,
            stats,
            jobs: Some(job_tx),
            worker: Some(worker),
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Called from the ingestion path after a foot sample of this side has
    /// been stored. Returns immediately.
    pub fn on_foot_sample(&self, trigger_ts: Timestamp) -> Result<Dispatch> {
        self.stats.foot_arrivals.fetch_add(1, Ordering::Relaxed);

        if !self.in_flight.try_acquire() {
            self.stats.busy_drops.fetch_add(1, Ordering::Relaxed);
            debug!("[{}] evaluation busy, dropping t={}", self.side.as_str(), trigger_ts);
            return Ok(Dispatch::Busy);
        }

        let snapshot = match self.tracks.lock() {
            Ok(tracks) => tracks.clone(),
            Err(_) => {
                self.in_flight.release();
                return Err(RecognizerError::LockPoisoned(format!(
                    "{} side tracks",
                    self.side.as_str()
                )));
            }
        };

        let job = EvaluationJob { snapshot, trigger_ts };
        let sent = match &self.jobs {
            Some(jobs) => jobs.try_send(job),
            None => Err(TrySendError::Disconnected(job)),
        };

        match sent {
            Ok(()) => {
                self.stats.evaluations_started.fetch_add(1, Ordering::Relaxed);
                Ok(Dispatch::Started)
            }
            Err(TrySendError::Full(_)) => {
                // Unreachable while the busy flag guards the channel
                self.stats.busy_drops.fetch_add(1, Ordering::Relaxed);
                warn!("[{}] job channel full, dropping t={}", self.side.as_str(), trigger_ts);
                Ok(Dispatch::Busy)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.in_flight.release();
                Err(RecognizerError::WorkerStopped(self.side.as_str().to_string()))
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Block until no evaluation is in flight. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_idle(timeout)
    }

    pub fn counts(&self) -> EvaluatorCounts {
        self.stats.counts()
    }
}

impl Drop for SideEvaluator {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop after its current job
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("[{}] evaluation worker panicked", self.side.as_str());
            }
        }
    }
}

fn run_worker(
    side: Side,
    jobs: Receiver<EvaluationJob>,
    tracks: Arc<Mutex<SideTracks>>,
    matcher: Arc<dyn PatternMatcher>,
    bus: GestureBus,
    in_flight: Arc<InFlight>,
    stats: Arc<EvaluatorStats>,
) {
    debug!("[{}] evaluation worker started", side.as_str());

    for job in jobs.iter() {
        let _release = ReleaseOnDrop(&in_flight);

        let position = match panic::catch_unwind(AssertUnwindSafe(|| matcher.evaluate(&job.snapshot))) {
            Ok(position) => position,
            Err(_) => {
                warn!("[{}] matcher panicked on t={}, treating as no match", side.as_str(), job.trigger_ts);
                None
            }
        };

        if let Some(position) = position {
            match tracks.lock() {
                Ok(mut live) => live.clear(),
                Err(poisoned) => {
                    warn!("[{}] side tracks lock poisoned, clearing anyway", side.as_str());
                    poisoned.into_inner().clear();
                }
            }

            let event = StampDetected {
                side,
                position,
                timestamp: job.trigger_ts,
            };
            stats.matches.fetch_add(1, Ordering::Relaxed);
            info!(
                "[{}] stamp at t={} position=({:.3}, {:.3}, {:.3})",
                side.as_str(),
                event.timestamp,
                position.x,
                position.y,
                position.z
            );
            bus.emit(&event);
        }
    }

    debug!("[{}] evaluation worker exiting", side.as_str());
}
