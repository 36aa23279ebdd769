//! Bounded hand trails rendered as fading polylines.
//!
//! Each hand owns a [`Trail`]: a short ring of recent wrist positions.  New
//! points go on the back; the oldest fall off the front once the trail is
//! full.

use std::collections::VecDeque;

use pose_stream::{BodyPoint, KeypointSnapshot, Point};

use crate::color::Rgb;
use crate::surface::Surface;

pub const DEFAULT_TRAIL_LENGTH: usize = 15;
pub const TRAIL_WIDTH:          i32   = 3;
/// Color of the newest segment; older segments scale toward black.
pub const TRAIL_COLOR:          Rgb   = Rgb::new(255, 200, 100);

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    /// The body point that drives this hand's trail.
    pub fn wrist(self) -> BodyPoint {
        match self {
            Hand::Left  => BodyPoint::LeftWrist,
            Hand::Right => BodyPoint::RightWrist,
        }
    }

    fn slot(self) -> usize {
        match self {
            Hand::Left  => 0,
            Hand::Right => 1,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Trail
// ════════════════════════════════════════════════════════════════════════════

/// Recent positions of one hand, oldest first.
#[derive(Clone, Debug)]
pub struct Trail {
    points:   VecDeque<Point>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Trail { points: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, p: Point) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    /// Change the capacity, dropping the oldest points if it shrank.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn capacity(&self) -> usize  { self.capacity }
    pub fn len(&self) -> usize       { self.points.len() }
    pub fn is_empty(&self) -> bool   { self.points.is_empty() }
    pub fn clear(&mut self)          { self.points.clear(); }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    /// Segment `i` joins point `i − 1` to point `i` at brightness `i / len`.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        let len = self.points.len();
        for i in 1..len {
            let alpha = i as f32 / len as f32;
            surface.draw_line(self.points[i - 1], self.points[i], TRAIL_WIDTH, TRAIL_COLOR.scale(alpha));
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrailTracker
// ════════════════════════════════════════════════════════════════════════════

/// One trail per hand.
#[derive(Clone, Debug)]
pub struct TrailTracker {
    trails: [Trail; 2],
}

impl Default for TrailTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_LENGTH)
    }
}

impl TrailTracker {
    pub fn new(capacity: usize) -> Self {
        TrailTracker { trails: [Trail::new(capacity), Trail::new(capacity)] }
    }

    pub fn trail(&self, hand: Hand) -> &Trail {
        &self.trails[hand.slot()]
    }

    /// Append each visible wrist; a missing wrist leaves its trail alone.
    pub fn update(&mut self, keypoints: &KeypointSnapshot) {
        for hand in Hand::ALL {
            if let Some(p) = keypoints.get(hand.wrist()) {
                self.trails[hand.slot()].push(p);
            }
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        for t in &mut self.trails {
            t.set_capacity(capacity);
        }
    }

    pub fn capacity(&self) -> usize {
        self.trails[0].capacity()
    }

    pub fn clear(&mut self) {
        for t in &mut self.trails {
            t.clear();
        }
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        for t in &self.trails {
            t.draw(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Canvas;

    fn left_at(x: i32) -> KeypointSnapshot {
        KeypointSnapshot::from_points([(BodyPoint::LeftWrist, (x, 10))])
    }

    #[test]
    fn twenty_appends_keep_last_fifteen() {
        let mut tracker = TrailTracker::default();
        for x in 0..20 {
            tracker.update(&left_at(x));
        }
        let xs: Vec<i32> = tracker.trail(Hand::Left).points().map(|p| p.x).collect();
        assert_eq!(xs, (5..20).collect::<Vec<_>>());
        assert!(tracker.trail(Hand::Right).is_empty());
    }

    #[test]
    fn absent_wrist_leaves_trail_unchanged() {
        let mut tracker = TrailTracker::default();
        tracker.update(&left_at(1));
        tracker.update(&KeypointSnapshot::empty());
        assert_eq!(tracker.trail(Hand::Left).len(), 1);
    }

    #[test]
    fn shrinking_capacity_drops_oldest() {
        let mut tracker = TrailTracker::new(10);
        for x in 0..10 {
            tracker.update(&left_at(x));
        }
        tracker.set_capacity(3);
        let xs: Vec<i32> = tracker.trail(Hand::Left).points().map(|p| p.x).collect();
        assert_eq!(xs, vec![7, 8, 9]);
        assert_eq!(tracker.capacity(), 3);
    }

    #[test]
    fn newest_segment_is_brightest() {
        let mut trail = Trail::new(15);
        for x in [2, 10, 18, 26] {
            trail.push(Point::new(x, 5));
        }
        let mut canvas = Canvas::new(30, 10);
        trail.draw(&mut canvas);
        let old = canvas.pixel(5, 5).unwrap_or_default();
        let new = canvas.pixel(22, 5).unwrap_or_default();
        assert!(new.r > old.r);
        // last segment: alpha 3/4
        assert_eq!(new, TRAIL_COLOR.scale(0.75));
    }

    #[test]
    fn single_point_draws_nothing() {
        let mut trail = Trail::new(15);
        trail.push(Point::new(5, 5));
        let mut canvas = Canvas::new(10, 10);
        trail.draw(&mut canvas);
        assert!(canvas.pixels().iter().all(|&p| p == Rgb::BLACK.to_argb()));
    }
}
