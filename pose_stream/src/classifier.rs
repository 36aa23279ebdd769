//! Rule-based gesture detection and movement energy.
//!
//! Every rule is evaluated on its own, so several gestures can fire in the
//! same frame.  A rule whose inputs are missing simply does not fire.
//!
//! | Gesture | Needs | Fires when |
//! |---|---|---|
//! | `hands_up`  | both wrists, nose | both wrists more than 50 px above the nose |
//! | `arms_wide` | both wrists, both shoulders | wrist span > 1.5 × shoulder span |
//! | `jump`      | 4 prior frames with a hip centre | hip rose more than 30 px over two frames |

use std::fmt;

use crate::history::KeypointHistory;
use crate::keypoint::{BodyPoint, KeypointSnapshot};

// Thresholds
const HANDS_UP_MARGIN:   i32 = 50;   // px above the nose
const ARMS_WIDE_RATIO:   f32 = 1.5;  // wrist span / shoulder span
const JUMP_WINDOW:       usize = 4;  // prior frames examined
const JUMP_VELOCITY:     i32 = -30;  // px over two frames; negative = upward
const ENERGY_DIVISOR:    f32 = 10.0;
pub const MAX_ENERGY:    f32 = 10.0;

/// Points whose frame-to-frame displacement makes up the movement energy.
const ENERGY_POINTS: [BodyPoint; 3] = [
    BodyPoint::LeftWrist,
    BodyPoint::RightWrist,
    BodyPoint::HipCenter,
];

// ════════════════════════════════════════════════════════════════════════════
// GestureLabel / GestureSet
// ════════════════════════════════════════════════════════════════════════════

/// A discrete gesture recognised in a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    HandsUp,
    ArmsWide,
    Jump,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 3] = [GestureLabel::HandsUp, GestureLabel::ArmsWide, GestureLabel::Jump];

    pub fn name(self) -> &'static str {
        match self {
            GestureLabel::HandsUp  => "hands_up",
            GestureLabel::ArmsWide => "arms_wide",
            GestureLabel::Jump     => "jump",
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unordered set of gestures active in one frame.  Inserting a label twice
/// is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GestureSet(u8);

impl GestureSet {
    pub fn new() -> Self {
        GestureSet(0)
    }

    pub fn insert(&mut self, label: GestureLabel) {
        self.0 |= label.bit();
    }

    pub fn contains(self, label: GestureLabel) -> bool {
        self.0 & label.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Labels in `self` that are not in `other`.
    pub fn difference(self, other: GestureSet) -> GestureSet {
        GestureSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = GestureLabel> {
        GestureLabel::ALL.into_iter().filter(move |&l| self.contains(l))
    }
}

impl FromIterator<GestureLabel> for GestureSet {
    fn from_iter<I: IntoIterator<Item = GestureLabel>>(iter: I) -> Self {
        let mut set = GestureSet::new();
        for l in iter { set.insert(l); }
        set
    }
}

impl fmt::Display for GestureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(GestureLabel::name).collect();
        f.write_str(&names.join(", "))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Individual rules
// ════════════════════════════════════════════════════════════════════════════

/// Both wrists more than 50 px above (smaller y than) the nose.
pub fn hands_up(snap: &KeypointSnapshot) -> bool {
    let (Some(lw), Some(rw), Some(nose)) = (
        snap.get(BodyPoint::LeftWrist),
        snap.get(BodyPoint::RightWrist),
        snap.get(BodyPoint::Nose),
    ) else {
        return false;
    };
    let limit = nose.y - HANDS_UP_MARGIN;
    lw.y < limit && rw.y < limit
}

/// Horizontal wrist span exceeds 1.5× the horizontal shoulder span.
pub fn arms_wide(snap: &KeypointSnapshot) -> bool {
    let (Some(lw), Some(rw), Some(ls), Some(rs)) = (
        snap.get(BodyPoint::LeftWrist),
        snap.get(BodyPoint::RightWrist),
        snap.get(BodyPoint::LeftShoulder),
        snap.get(BodyPoint::RightShoulder),
    ) else {
        return false;
    };
    let arm_span      = (lw.x - rw.x).abs() as f32;
    let shoulder_span = (ls.x - rs.x).abs() as f32;
    arm_span > shoulder_span * ARMS_WIDE_RATIO
}

/// Upward hip motion across the four most recent prior frames.
///
/// All four frames must carry a hip centre.  Velocity is the newest hip y
/// minus the hip y two frames before it.
pub fn jump(history: &KeypointHistory) -> bool {
    if history.len() < JUMP_WINDOW {
        return false;
    }
    let hips: Vec<i32> = history
        .recent(JUMP_WINDOW)
        .into_iter()
        .filter_map(|s| s.get(BodyPoint::HipCenter))
        .map(|p| p.y)
        .collect();
    if hips.len() < JUMP_WINDOW {
        return false;
    }
    let velocity = hips[3] - hips[1];
    velocity < JUMP_VELOCITY
}

/// Evaluate every rule for `current` against the prior `history`.
///
/// An empty snapshot (nobody in frame) yields no gestures.
pub fn detect_gestures(current: &KeypointSnapshot, history: &KeypointHistory) -> GestureSet {
    let mut set = GestureSet::new();
    if current.is_empty() {
        return set;
    }
    if hands_up(current)  { set.insert(GestureLabel::HandsUp); }
    if arms_wide(current) { set.insert(GestureLabel::ArmsWide); }
    if jump(history)      { set.insert(GestureLabel::Jump); }
    set
}

/// Summed displacement of wrists and hip centre since the previous frame,
/// scaled into 0.0–10.0.
///
/// Zero until the history holds at least two frames, and zero when the
/// previous frame was empty.
pub fn movement_energy(current: &KeypointSnapshot, history: &KeypointHistory) -> f32 {
    if history.len() < 2 {
        return 0.0;
    }
    let Some(prev) = history.last() else { return 0.0 };
    if prev.is_empty() {
        return 0.0;
    }
    let total: f32 = ENERGY_POINTS
        .iter()
        .filter_map(|&bp| Some(current.get(bp)?.distance(prev.get(bp)?)))
        .sum();
    (total / ENERGY_DIVISOR).clamp(0.0, MAX_ENERGY)
}

// ════════════════════════════════════════════════════════════════════════════
// PoseAnalysis / GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame classifier output handed to the effects layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseAnalysis {
    pub keypoints:       KeypointSnapshot,
    pub gestures:        GestureSet,
    pub movement_energy: f32,
}

/// Owns the keypoint history and classifies one snapshot per tick.
#[derive(Debug, Default)]
pub struct GestureClassifier {
    history:  KeypointHistory,
    previous: GestureSet,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `current` against the history, then append it.
    pub fn classify(&mut self, current: KeypointSnapshot) -> PoseAnalysis {
        let gestures = detect_gestures(&current, &self.history);
        let movement_energy = movement_energy(&current, &self.history);

        let onset = gestures.difference(self.previous);
        if !onset.is_empty() {
            tracing::debug!(gestures = %onset, energy = movement_energy, "gesture onset");
        }
        self.previous = gestures;

        self.history.push(current.clone());
        PoseAnalysis { keypoints: current, gestures, movement_energy }
    }

    pub fn history(&self) -> &KeypointHistory {
        &self.history
    }

    /// Forget all history, as if no frame had been seen.
    pub fn reset(&mut self) {
        self.history.clear();
        self.previous = GestureSet::new();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hips_at(y: i32) -> KeypointSnapshot {
        KeypointSnapshot::from_points([
            (BodyPoint::LeftHip,  (600, y)),
            (BodyPoint::RightHip, (680, y)),
        ])
    }

    fn feed(c: &mut GestureClassifier, ys: &[i32]) -> PoseAnalysis {
        let mut last = PoseAnalysis::default();
        for &y in ys { last = c.classify(hips_at(y)); }
        last
    }

    #[test]
    fn hands_up_above_nose() {
        let s = KeypointSnapshot::from_points([
            (BodyPoint::Nose,       (640, 200)),
            (BodyPoint::LeftWrist,  (500, 149)),
            (BodyPoint::RightWrist, (780, 100)),
        ]);
        assert!(hands_up(&s));
    }

    #[test]
    fn hands_up_needs_more_than_fifty() {
        let s = KeypointSnapshot::from_points([
            (BodyPoint::Nose,       (640, 200)),
            (BodyPoint::LeftWrist,  (500, 150)),
            (BodyPoint::RightWrist, (780, 100)),
        ]);
        assert!(!hands_up(&s));
    }

    #[test]
    fn arms_wide_ratio() {
        let base = KeypointSnapshot::from_points([
            (BodyPoint::LeftShoulder,  (560, 300)),
            (BodyPoint::RightShoulder, (720, 300)),
        ]);
        // shoulder span 160 → threshold 240
        let wide = base.clone()
            .with(BodyPoint::LeftWrist,  (400, 300))
            .with(BodyPoint::RightWrist, (641, 300));
        let narrow = base
            .with(BodyPoint::LeftWrist,  (400, 300))
            .with(BodyPoint::RightWrist, (640, 300));
        assert!(arms_wide(&wide));
        assert!(!arms_wide(&narrow));
    }

    #[test]
    fn arms_wide_missing_shoulder() {
        let s = KeypointSnapshot::from_points([
            (BodyPoint::LeftShoulder, (560, 300)),
            (BodyPoint::LeftWrist,    (0, 300)),
            (BodyPoint::RightWrist,   (1200, 300)),
        ]);
        assert!(!arms_wide(&s));
    }

    #[test]
    fn jump_fires_after_rising_window() {
        let mut c = GestureClassifier::new();
        let fourth = feed(&mut c, &[500, 500, 500, 440]);
        assert!(!fourth.gestures.contains(GestureLabel::Jump));
        let next = c.classify(hips_at(440));
        assert!(next.gestures.contains(GestureLabel::Jump));
    }

    #[test]
    fn jump_not_on_flat_window() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[500, 500, 500, 500]);
        let next = c.classify(hips_at(500));
        assert!(!next.gestures.contains(GestureLabel::Jump));
    }

    #[test]
    fn jump_needs_hip_in_every_window_frame() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[500, 500]);
        c.classify(KeypointSnapshot::from_points([(BodyPoint::Nose, (0, 0))]));
        c.classify(hips_at(400));
        let next = c.classify(hips_at(400));
        assert!(!next.gestures.contains(GestureLabel::Jump));
    }

    #[test]
    fn jump_uses_only_latest_four() {
        let mut c = GestureClassifier::new();
        // the big rise scrolls out of the window
        let last = feed(&mut c, &[500, 300, 300, 300, 300, 300]);
        assert!(!last.gestures.contains(GestureLabel::Jump));
    }

    #[test]
    fn empty_snapshot_has_no_gestures() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[500, 500, 500, 440]);
        let a = c.classify(KeypointSnapshot::empty());
        assert!(a.gestures.is_empty());
        assert_eq!(a.movement_energy, 0.0);
    }

    #[test]
    fn energy_zero_on_short_history() {
        let mut c = GestureClassifier::new();
        assert_eq!(c.classify(hips_at(500)).movement_energy, 0.0);
        // history has one entry here: still zero
        assert_eq!(c.classify(hips_at(100)).movement_energy, 0.0);
    }

    #[test]
    fn energy_sums_displacement() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[500, 500]);
        // hip centre moves 30 px, wrists absent → 3.0
        let a = c.classify(hips_at(470));
        assert!((a.movement_energy - 3.0).abs() < 1e-5);
    }

    #[test]
    fn energy_identical_frames_zero() {
        let mut c = GestureClassifier::new();
        let a = feed(&mut c, &[500, 500, 500]);
        assert_eq!(a.movement_energy, 0.0);
    }

    #[test]
    fn energy_zero_after_empty_frame() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[500, 500]);
        c.classify(KeypointSnapshot::empty());
        assert_eq!(c.classify(hips_at(100)).movement_energy, 0.0);
    }

    #[test]
    fn energy_clamped_to_ten() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[0, 0]);
        assert_eq!(c.classify(hips_at(5000)).movement_energy, MAX_ENERGY);
    }

    #[test]
    fn classify_appends_after_evaluation() {
        let mut c = GestureClassifier::new();
        c.classify(hips_at(1));
        c.classify(hips_at(2));
        assert_eq!(c.history().len(), 2);
        assert_eq!(c.history().last(), Some(&hips_at(2)));
    }

    #[test]
    fn extreme_wrist_jumps_stay_bounded() {
        let mut c = GestureClassifier::new();
        let wrist = |x: i32| KeypointSnapshot::from_points([(BodyPoint::LeftWrist, (x, 0))]);
        c.classify(wrist(0));
        c.classify(wrist(i32::MIN));
        let a = c.classify(wrist(i32::MAX));
        assert_eq!(a.movement_energy, MAX_ENERGY);
    }

    #[test]
    fn reset_clears_history() {
        let mut c = GestureClassifier::new();
        feed(&mut c, &[1, 2, 3]);
        c.reset();
        assert!(c.history().is_empty());
    }

    #[test]
    fn gesture_set_semantics() {
        let mut s = GestureSet::new();
        s.insert(GestureLabel::Jump);
        s.insert(GestureLabel::Jump);
        assert_eq!(s.len(), 1);
        let both: GestureSet = [GestureLabel::HandsUp, GestureLabel::Jump].into_iter().collect();
        assert_eq!(both.difference(s).iter().collect::<Vec<_>>(), vec![GestureLabel::HandsUp]);
        assert_eq!(both.to_string(), "hands_up, jump");
    }

    fn opt_point() -> impl Strategy<Value = Option<(i32, i32)>> {
        proptest::option::of((-2000i32..2000, -2000i32..2000))
    }

    proptest! {
        #[test]
        fn hands_up_matches_rule(lw in opt_point(), rw in opt_point(), nose in opt_point()) {
            let mut s = KeypointSnapshot::empty();
            if let Some(p) = lw   { s = s.with(BodyPoint::LeftWrist, p); }
            if let Some(p) = rw   { s = s.with(BodyPoint::RightWrist, p); }
            if let Some(p) = nose { s = s.with(BodyPoint::Nose, p); }
            let expected = match (lw, rw, nose) {
                (Some(l), Some(r), Some(n)) => l.1 < n.1 - 50 && r.1 < n.1 - 50,
                _ => false,
            };
            prop_assert_eq!(hands_up(&s), expected);
        }

        #[test]
        fn energy_always_in_range(
            frames in proptest::collection::vec(
                (opt_point(), opt_point(), opt_point()), 0..15)
        ) {
            let mut c = GestureClassifier::new();
            for (lw, rw, hip) in frames {
                let mut s = KeypointSnapshot::empty();
                if let Some(p) = lw  { s = s.with(BodyPoint::LeftWrist, p); }
                if let Some(p) = rw  { s = s.with(BodyPoint::RightWrist, p); }
                if let Some(p) = hip {
                    s = s.with(BodyPoint::LeftHip, p).with(BodyPoint::RightHip, p);
                }
                let e = c.classify(s).movement_energy;
                prop_assert!((0.0..=MAX_ENERGY).contains(&e));
            }
        }
    }
}
