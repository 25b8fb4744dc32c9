//! Skeleton frame sources for the live binary
//!
//! Each loop pushes frames into a bounded channel at frame rate. A full
//! channel drops the frame, like a sensor that outruns its consumer.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, sleep, Duration, Instant};

use crate::frame::SkeletonFrame;
use crate::types::{JointKind, JointRole, Position, Side, Timestamp};

/// Synthetic body that stands on a spot and stamps once per period,
/// alternating feet and moving to the next of eight spots every period.
#[derive(Clone, Debug)]
pub struct SyntheticMotion {
    pub frame_interval_ms: i64,
    pub stamp_period_ms: i64,
    pub stamp_duration_ms: i64,
    /// Peak ankle/foot lift (m)
    pub lift_height: f64,
    /// Peak knee travel towards the sensor (m)
    pub knee_travel: f64,
}

impl Default for SyntheticMotion {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33, // ~30 fps skeleton stream
            stamp_period_ms: 3000,
            stamp_duration_ms: 400,
            lift_height: 0.3,
            knee_travel: 0.2,
        }
    }
}

impl SyntheticMotion {
    /// Side that stamps during the period containing `t`
    pub fn stamping_side(&self, t: Timestamp) -> Side {
        if (t / self.stamp_period_ms) % 2 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn spot(&self, t: Timestamp) -> Position {
        let index = (t / self.stamp_period_ms) % 8;
        Position::new((index % 4) as f64 - 1.5, 1.0, 2.0 + (index / 4) as f64 * 0.8)
    }

    /// 0 at rest, rising to 1 mid-stamp and back
    fn lift(&self, t: Timestamp) -> f64 {
        let start = self.stamp_period_ms / 2;
        let phase = t % self.stamp_period_ms - start;
        if phase < 0 || phase > self.stamp_duration_ms {
            return 0.0;
        }
        (PI * phase as f64 / self.stamp_duration_ms as f64).sin()
    }

    pub fn frame_at(&self, t: Timestamp) -> SkeletonFrame {
        let spine = self.spot(t);
        let stamping = self.stamping_side(t);
        let lift = self.lift(t);

        let mut frame = SkeletonFrame::new(t, 1).with_joint(JointKind::Spine, spine);
        for side in Side::BOTH {
            let offset = match side {
                Side::Left => -0.15,
                Side::Right => 0.15,
            };
            let l = if side == stamping { lift } else { 0.0 };
            let x = spine.x + offset;
            frame = frame
                .with_joint(
                    JointKind::lateral(JointRole::Knee, side),
                    Position::new(x, 0.5 + 0.1 * l, spine.z - 0.05 - self.knee_travel * l),
                )
                .with_joint(
                    JointKind::lateral(JointRole::Ankle, side),
                    Position::new(x, 0.12 + self.lift_height * l, spine.z),
                )
                .with_joint(
                    JointKind::lateral(JointRole::Foot, side),
                    Position::new(x, 0.05 + self.lift_height * l, spine.z - 0.1),
                );
        }
        frame
    }
}

/// Returns `false` once the receiver is gone.
fn push_frame(tx: &Sender<SkeletonFrame>, frame: SkeletonFrame, dropped: &AtomicU64) -> bool {
    match tx.try_send(frame) {
        Ok(_) => true,
        Err(TrySendError::Full(_)) => {
            dropped.fetch_add(1, Ordering::Relaxed);
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

pub async fn synthetic_loop(tx: Sender<SkeletonFrame>, motion: SyntheticMotion, dropped: Arc<AtomicU64>) {
    let mut ticker = interval(Duration::from_millis(motion.frame_interval_ms.max(1) as u64));
    let start = Instant::now();
    let mut frame_count = 0u64;

    loop {
        ticker.tick().await;
        let t = start.elapsed().as_millis() as Timestamp;

        if !push_frame(&tx, motion.frame_at(t), &dropped) {
            info!("[synthetic] Channel closed after {} frames", frame_count);
            break;
        }
        frame_count += 1;
        if frame_count % 300 == 0 {
            debug!("[synthetic] {} frames", frame_count);
        }
    }
}

/// Play back recorded frames, keeping their original spacing scaled by
/// `speed`. Returns the number of frames pushed.
pub async fn replay_loop(
    tx: Sender<SkeletonFrame>,
    frames: Vec<SkeletonFrame>,
    speed: f64,
    dropped: Arc<AtomicU64>,
) -> u64 {
    let speed = if speed > 0.0 { speed } else { 1.0 };
    let mut previous: Option<Timestamp> = None;
    let mut frame_count = 0u64;

    for frame in frames {
        if let Some(prev) = previous {
            let gap_ms = (frame.timestamp - prev).max(0) as f64 / speed;
            if gap_ms > 0.0 {
                sleep(Duration::from_secs_f64(gap_ms / 1000.0)).await;
            }
        }
        previous = Some(frame.timestamp);

        if !push_frame(&tx, frame, &dropped) {
            warn!("[replay] Channel closed after {} frames", frame_count);
            break;
        }
        frame_count += 1;
    }

    info!("[replay] Recording finished: {} frames", frame_count);
    frame_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognizerConfig;
    use crate::recognizer::StampRecognizer;

    #[test]
    fn test_synthetic_rest_pose_is_flat() {
        let motion = SyntheticMotion::default();
        let frame = motion.frame_at(100);
        assert_eq!(frame.joints.len(), 7);
        let foot = frame
            .joints
            .iter()
            .find(|j| j.joint == JointKind::FootLeft)
            .unwrap();
        assert!((foot.position.y - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_synthetic_stream_stamps_each_period() {
        let motion = SyntheticMotion::default();
        let recognizer = StampRecognizer::new(RecognizerConfig::default()).unwrap();
        let rx = recognizer.bus().subscribe_channel();

        let mut t = 0;
        while t < 2 * motion.stamp_period_ms {
            assert_eq!(recognizer.ingest_frame(&motion.frame_at(t)).unwrap(), 0);
            assert!(recognizer.wait_idle(std::time::Duration::from_secs(5)));
            t += motion.frame_interval_ms;
        }

        let stamps: Vec<_> = rx.try_iter().collect();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0].side, Side::Left);
        assert_eq!(stamps[1].side, Side::Right);
        assert!(stamps[0].timestamp > 1500 && stamps[0].timestamp <= 2000);
        assert_eq!(stamps[1].position, motion.frame_at(stamps[1].timestamp).joints[0].position);
    }

    #[tokio::test]
    async fn test_replay_loop_delivers_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let frames: Vec<SkeletonFrame> = (0..4).map(|i| SkeletonFrame::new(i * 5, 1)).collect();
        let dropped = Arc::new(AtomicU64::new(0));

        let sent = replay_loop(tx, frames, 10.0, dropped.clone()).await;
        assert_eq!(sent, 4);

        let mut seen = Vec::new();
        while let Some(frame) = rx.recv().await {
            seen.push(frame.timestamp);
        }
        assert_eq!(seen, vec![0, 5, 10, 15]);
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }
}
