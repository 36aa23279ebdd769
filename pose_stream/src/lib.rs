//! # pose_stream
//!
//! Turns a stream of body-keypoint snapshots into discrete gestures and a
//! continuous movement-energy signal.
//!
//! The pose model itself is a black box: it hands over either pixel
//! keypoints or normalized landmarks, and this crate takes it from there.
//!
//! ## Pipeline
//!
//! | Stage | Type | Notes |
//! |---|---|---|
//! | Extract | [`KeypointSnapshot`] | 13 body points + derived `hip_center`, integer pixels |
//! | Remember | [`KeypointHistory`] | last 10 snapshots, oldest evicted first |
//! | Classify | [`GestureClassifier`] | `hands_up`, `arms_wide`, `jump`; energy 0–10 |
//!
//! ## Quick start
//!
//! ```rust
//! use pose_stream::{BodyPoint, GestureClassifier, GestureLabel, KeypointSnapshot};
//!
//! let mut classifier = GestureClassifier::new();
//! let snap = KeypointSnapshot::from_points([
//!     (BodyPoint::Nose,       (640, 200)),
//!     (BodyPoint::LeftWrist,  (520, 90)),
//!     (BodyPoint::RightWrist, (760, 95)),
//! ]);
//! let analysis = classifier.classify(snap);
//! assert!(analysis.gestures.contains(GestureLabel::HandsUp));
//! ```

pub mod keypoint;
pub mod history;
pub mod classifier;

pub use keypoint::{BodyPoint, KeypointSnapshot, Landmark, Point, PoseFrame, COORD_LIMIT};
pub use history::{KeypointHistory, HISTORY_CAPACITY};
pub use classifier::{
    GestureClassifier, GestureLabel, GestureSet, PoseAnalysis, MAX_ENERGY,
    arms_wide, detect_gestures, hands_up, jump, movement_energy,
};
