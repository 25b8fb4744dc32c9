//! Foot-stamp gesture recognition from a stream of skeleton joint positions.
//!
//! Joint samples for the knees, ankles, feet and spine are kept in short
//! per-side time windows. Every foot sample triggers an off-thread check of
//! that side's windows for the stamp shape; a match clears the side and
//! publishes a [`StampDetected`] on the [`GestureBus`].

pub mod bus;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod extremum;
pub mod frame;
pub mod live_status;
pub mod matcher;
pub mod recognizer;
pub mod recording;
pub mod selector;
pub mod source;
pub mod tracking;
pub mod types;
pub mod window;

pub use bus::{GestureBus, SubscriptionId};
pub use config::{RecognizerConfig, StampThresholds};
pub use error::{RecognizerError, Result};
pub use evaluator::{Dispatch, EvaluatorCounts, SideEvaluator};
pub use frame::SkeletonFrame;
pub use matcher::{PatternMatcher, StampCheck, StampPatternMatcher};
pub use recognizer::StampRecognizer;
pub use selector::{ItemSelector, SelectionEvent};
pub use tracking::SideTracks;
pub use types::{JointKind, JointSample, JointTracked, Position, Side, StampDetected, Timestamp};
pub use window::TimeWindow;
