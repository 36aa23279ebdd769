//! Named body points and the per-frame keypoint snapshot.
//!
//! A [`KeypointSnapshot`] is built once per frame and never mutated after
//! that.  Points that the detector did not report are simply absent; the
//! classifier treats absence as "rule not satisfied".

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// BodyPoint
// ════════════════════════════════════════════════════════════════════════════

/// The tracked body points: 13 base points plus the derived hip centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPoint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    /// Midpoint of the two hips; never read from input, always derived.
    HipCenter,
}

impl BodyPoint {
    pub const COUNT: usize = 14;

    /// All points in storage order.
    pub const ALL: [BodyPoint; BodyPoint::COUNT] = [
        BodyPoint::Nose,
        BodyPoint::LeftShoulder,
        BodyPoint::RightShoulder,
        BodyPoint::LeftElbow,
        BodyPoint::RightElbow,
        BodyPoint::LeftWrist,
        BodyPoint::RightWrist,
        BodyPoint::LeftHip,
        BodyPoint::RightHip,
        BodyPoint::LeftKnee,
        BodyPoint::RightKnee,
        BodyPoint::LeftAnkle,
        BodyPoint::RightAnkle,
        BodyPoint::HipCenter,
    ];

    /// The two hand points, left first.
    pub const HANDS: [BodyPoint; 2] = [BodyPoint::LeftWrist, BodyPoint::RightWrist];

    /// Snake-case name, as used in recordings and log output.
    pub fn name(self) -> &'static str {
        match self {
            BodyPoint::Nose          => "nose",
            BodyPoint::LeftShoulder  => "left_shoulder",
            BodyPoint::RightShoulder => "right_shoulder",
            BodyPoint::LeftElbow     => "left_elbow",
            BodyPoint::RightElbow    => "right_elbow",
            BodyPoint::LeftWrist     => "left_wrist",
            BodyPoint::RightWrist    => "right_wrist",
            BodyPoint::LeftHip       => "left_hip",
            BodyPoint::RightHip      => "right_hip",
            BodyPoint::LeftKnee      => "left_knee",
            BodyPoint::RightKnee     => "right_knee",
            BodyPoint::LeftAnkle     => "left_ankle",
            BodyPoint::RightAnkle    => "right_ankle",
            BodyPoint::HipCenter     => "hip_center",
        }
    }

    /// Index of this point in a MediaPipe Pose landmark list.
    /// `None` for derived points.
    pub fn landmark_index(self) -> Option<usize> {
        match self {
            BodyPoint::Nose          => Some(0),
            BodyPoint::LeftShoulder  => Some(11),
            BodyPoint::RightShoulder => Some(12),
            BodyPoint::LeftElbow     => Some(13),
            BodyPoint::RightElbow    => Some(14),
            BodyPoint::LeftWrist     => Some(15),
            BodyPoint::RightWrist    => Some(16),
            BodyPoint::LeftHip       => Some(23),
            BodyPoint::RightHip      => Some(24),
            BodyPoint::LeftKnee      => Some(25),
            BodyPoint::RightKnee     => Some(26),
            BodyPoint::LeftAnkle     => Some(27),
            BodyPoint::RightAnkle    => Some(28),
            BodyPoint::HipCenter     => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BodyPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// Any finite coordinate is clamped into ±`COORD_LIMIT` pixels.
pub const COORD_LIMIT: f32 = 1_000_000.0;
const COORD_LIMIT_PX: i32 = COORD_LIMIT as i32;

/// Screen-space pixel coordinate; y grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Convert a float coordinate pair, truncating toward zero.
    /// Returns `None` for NaN or infinite input.
    pub fn from_f32(x: f32, y: f32) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let x = x.clamp(-COORD_LIMIT, COORD_LIMIT) as i32;
        let y = y.clamp(-COORD_LIMIT, COORD_LIMIT) as i32;
        Some(Point { x, y })
    }

    /// The same point pulled into ±`COORD_LIMIT` on each axis.
    pub fn clamped(self) -> Self {
        Point {
            x: self.x.clamp(-COORD_LIMIT_PX, COORD_LIMIT_PX),
            y: self.y.clamp(-COORD_LIMIT_PX, COORD_LIMIT_PX),
        }
    }

    /// Euclidean distance in pixels.
    pub fn distance(self, other: Point) -> f32 {
        let dx = (self.x as i64 - other.x as i64) as f32;
        let dy = (self.y as i64 - other.y as i64) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint using floor division on each axis.
    pub fn midpoint(self, other: Point) -> Point {
        // i64 sum: the halved result always fits back into i32
        Point {
            x: (self.x as i64 + other.x as i64).div_euclid(2) as i32,
            y: (self.y as i64 + other.y as i64).div_euclid(2) as i32,
        }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark: normalized pose-model output
// ════════════════════════════════════════════════════════════════════════════

/// One normalized landmark (0.0–1.0 across the camera frame).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Landmark { x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KeypointSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// One frame's worth of detected keypoints, in screen pixels.
///
/// `hip_center` is always derived from the two hips and is present exactly
/// when both hips are.  Any hip centre supplied by the caller is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeypointSnapshot {
    points: [Option<Point>; BodyPoint::COUNT],
}

impl KeypointSnapshot {
    /// A snapshot with no points (no person detected this frame).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(point, position)` pairs.  Later duplicates win; every
    /// position is clamped into ±`COORD_LIMIT`.
    pub fn from_points<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = (BodyPoint, P)>,
        P: Into<Point>,
    {
        let mut snap = Self::default();
        for (bp, p) in points {
            if bp != BodyPoint::HipCenter {
                snap.points[bp.slot()] = Some(Into::<Point>::into(p).clamped());
            }
        }
        snap.derive_hip_center();
        snap
    }

    /// Build from float pixel coordinates, discarding non-finite points.
    pub fn from_pixels<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (BodyPoint, [f32; 2])>,
    {
        let valid = points.into_iter().filter_map(|(bp, [x, y])| {
            let p = Point::from_f32(x, y);
            if p.is_none() {
                tracing::trace!(point = %bp, x, y, "discarding non-finite keypoint");
            }
            p.map(|p| (bp, p))
        });
        Self::from_points(valid)
    }

    /// Convert a normalized landmark list (MediaPipe Pose indexing) into
    /// screen pixels.  With `mirror` set, x is flipped so the picture reads
    /// like a mirror.
    pub fn from_landmarks(landmarks: &[Landmark], width: u32, height: u32, mirror: bool) -> Self {
        let (w, h) = (width as f32, height as f32);
        let pixels = BodyPoint::ALL.iter().filter_map(|&bp| {
            let lm = landmarks.get(bp.landmark_index()?)?;
            let nx = if mirror { 1.0 - lm.x } else { lm.x };
            Some((bp, [nx * w, lm.y * h]))
        });
        Self::from_pixels(pixels)
    }

    /// Copy of this snapshot with one point set.  The hip centre is
    /// re-derived; setting `HipCenter` directly has no effect.
    pub fn with(mut self, bp: BodyPoint, p: impl Into<Point>) -> Self {
        if bp != BodyPoint::HipCenter {
            self.points[bp.slot()] = Some(Into::<Point>::into(p).clamped());
            self.derive_hip_center();
        }
        self
    }

    /// Copy of this snapshot with one point removed.
    pub fn without(mut self, bp: BodyPoint) -> Self {
        if bp != BodyPoint::HipCenter {
            self.points[bp.slot()] = None;
            self.derive_hip_center();
        }
        self
    }

    pub fn get(&self, bp: BodyPoint) -> Option<Point> {
        self.points[bp.slot()]
    }

    pub fn contains(&self, bp: BodyPoint) -> bool {
        self.get(bp).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Number of points present, hip centre included.
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Present points in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyPoint, Point)> + '_ {
        BodyPoint::ALL
            .iter()
            .filter_map(move |&bp| self.get(bp).map(|p| (bp, p)))
    }

    fn derive_hip_center(&mut self) {
        self.points[BodyPoint::HipCenter.slot()] =
            match (self.get(BodyPoint::LeftHip), self.get(BodyPoint::RightHip)) {
                (Some(l), Some(r)) => Some(l.midpoint(r)),
                _ => None,
            };
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PoseFrame: recorded frame format (one JSON object per line)
// ════════════════════════════════════════════════════════════════════════════

/// A recorded frame as written by an external pose estimator.
///
/// ```json
/// {"keypoints": {"left_wrist": [412.0, 180.5], "nose": [640, 120]}}
/// {"landmarks": [[0.51, 0.18], [0.52, 0.17]]}
/// {}
/// ```
///
/// `keypoints` are screen pixels keyed by point name; `landmarks` are
/// normalized and in MediaPipe Pose order.  When both are present the
/// pixel form wins.  Extra fields (timestamps and the like) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<BTreeMap<BodyPoint, [f32; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f32; 2]>>,
}

impl PoseFrame {
    /// Parse one JSON line.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Resolve into a snapshot for a `width × height` screen.
    pub fn to_snapshot(&self, width: u32, height: u32, mirror: bool) -> KeypointSnapshot {
        if let Some(keypoints) = &self.keypoints {
            let w = width as f32;
            return KeypointSnapshot::from_pixels(keypoints.iter().map(|(&bp, &[x, y])| {
                (bp, [if mirror { w - x } else { x }, y])
            }));
        }
        if let Some(landmarks) = &self.landmarks {
            let lms: Vec<Landmark> = landmarks.iter().map(|&[x, y]| Landmark::new(x, y)).collect();
            return KeypointSnapshot::from_landmarks(&lms, width, height, mirror);
        }
        KeypointSnapshot::empty()
    }

    /// Record a snapshot in pixel form.  The hip centre is left out since
    /// it is re-derived on load.
    pub fn from_snapshot(snap: &KeypointSnapshot) -> Self {
        let keypoints = snap
            .iter()
            .filter(|(bp, _)| *bp != BodyPoint::HipCenter)
            .map(|(bp, p)| (bp, [p.x as f32, p.y as f32]))
            .collect();
        PoseFrame { keypoints: Some(keypoints), landmarks: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
