//! Pose sources: anything that produces a [`KeypointSnapshot`] per frame.
//!
//! The render loop does not care where snapshots come from.  Each source
//! runs on its own thread and hands frames over an `mpsc` channel, so a slow
//! producer never blocks drawing.

use std::f32::consts::{PI, TAU};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use pose_stream::{BodyPoint, KeypointSnapshot, PoseFrame};
use thiserror::Error;
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// PoseSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait PoseSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<KeypointSnapshot>);
}

/// Run a pose source on its own thread and return the receiving end.
pub fn spawn_pose_source<S: PoseSource>(source: S) -> Receiver<KeypointSnapshot> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Sleep until the next frame boundary.
fn pace(next: &mut Instant, period: Duration) {
    *next += period;
    let now = Instant::now();
    if *next > now {
        thread::sleep(*next - now);
    } else {
        // fell behind; don't try to catch up with a burst
        *next = now;
    }
}

fn frame_period(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

// ════════════════════════════════════════════════════════════════════════════
// SimDancer: keyboard-driven stick figure
// ════════════════════════════════════════════════════════════════════════════

/// A move requested from the window's keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimMove {
    /// H: both hands over the head.
    HandsUp,
    /// W: arms stretched sideways.
    ArmsWide,
    /// J: a quick hop.
    Jump,
    /// Space: fast arm circles (high energy).
    Flourish,
}

impl SimMove {
    /// How many frames the move lasts.
    pub fn duration(self) -> u32 {
        match self {
            SimMove::HandsUp  => 30,
            SimMove::ArmsWide => 30,
            SimMove::Jump     => 14,
            SimMove::Flourish => 45,
        }
    }
}

const JUMP_HEIGHT: f32 = 150.0;

/// Procedural figure.  Idles with a gentle sway; a queued move overrides
/// the idle pose until it runs out.
#[derive(Clone, Debug)]
pub struct Choreography {
    width:  f32,
    height: f32,
    tick:   u32,
    active: Option<(SimMove, u32)>,
}

impl Choreography {
    pub fn new(width: usize, height: usize) -> Self {
        Choreography { width: width as f32, height: height as f32, tick: 0, active: None }
    }

    /// Start `mv`, replacing any move in progress.
    pub fn perform(&mut self, mv: SimMove) {
        self.active = Some((mv, 0));
    }

    pub fn current(&self) -> Option<SimMove> {
        self.active.map(|(mv, _)| mv)
    }

    /// Pose for the next frame.
    pub fn step(&mut self) -> KeypointSnapshot {
        let s  = self.height / 720.0;
        let cx = self.width / 2.0;
        let t  = self.tick as f32;
        let sway = 20.0 * (t * 0.15).sin() * s;

        let mut lift = 0.0;
        let mut elbows = [(-80.0, -130.0), (80.0, -130.0)];
        let mut wrists = [(-90.0 + sway, -70.0), (90.0 + sway, -70.0)];

        if let Some((mv, k)) = self.active {
            let k = k as f32;
            match mv {
                SimMove::HandsUp => {
                    elbows = [(-75.0, -280.0), (75.0, -280.0)];
                    wrists = [(-70.0, -360.0), (70.0, -360.0)];
                }
                SimMove::ArmsWide => {
                    elbows = [(-160.0, -200.0), (160.0, -200.0)];
                    wrists = [(-260.0, -200.0), (260.0, -200.0)];
                }
                SimMove::Jump => {
                    lift = JUMP_HEIGHT * (PI * k / mv.duration() as f32).sin();
                }
                SimMove::Flourish => {
                    let a = TAU * k / 8.0;
                    let (sin, cos) = a.sin_cos();
                    elbows = [(-60.0 - 60.0 * cos, -200.0 + 60.0 * sin), (60.0 + 60.0 * cos, -200.0 + 60.0 * sin)];
                    wrists = [(-60.0 - 120.0 * cos, -200.0 + 120.0 * sin), (60.0 + 120.0 * cos, -200.0 + 120.0 * sin)];
                }
            }
        }

        let hip_y = self.height * 0.6 - lift * s;
        let at = |dx: f32, dy: f32| -> [f32; 2] { [cx + dx * s, hip_y + dy * s] };

        let snap = KeypointSnapshot::from_pixels([
            (BodyPoint::Nose,          at(0.0, -260.0)),
            (BodyPoint::LeftShoulder,  at(-60.0, -200.0)),
            (BodyPoint::RightShoulder, at(60.0, -200.0)),
            (BodyPoint::LeftElbow,     at(elbows[0].0, elbows[0].1)),
            (BodyPoint::RightElbow,    at(elbows[1].0, elbows[1].1)),
            (BodyPoint::LeftWrist,     at(wrists[0].0, wrists[0].1)),
            (BodyPoint::RightWrist,    at(wrists[1].0, wrists[1].1)),
            (BodyPoint::LeftHip,       at(-40.0, 0.0)),
            (BodyPoint::RightHip,      at(40.0, 0.0)),
            (BodyPoint::LeftKnee,      at(-45.0, 110.0)),
            (BodyPoint::RightKnee,     at(45.0, 110.0)),
            (BodyPoint::LeftAnkle,     at(-50.0, 220.0)),
            (BodyPoint::RightAnkle,    at(50.0, 220.0)),
        ]);

        self.tick = self.tick.wrapping_add(1);
        if let Some((mv, k)) = self.active {
            self.active = if k + 1 >= mv.duration() { None } else { Some((mv, k + 1)) };
        }
        snap
    }
}

/// Pose source driven by [`SimMove`]s sent from the window.
///
/// Ends when the window drops its sender or stops listening.
pub struct SimDancer {
    pub rx:     Receiver<SimMove>,
    pub fps:    u32,
    choreo:     Choreography,
}

impl SimDancer {
    pub fn new(rx: Receiver<SimMove>, width: usize, height: usize, fps: u32) -> Self {
        SimDancer { rx, fps, choreo: Choreography::new(width, height) }
    }
}

impl PoseSource for SimDancer {
    fn run(mut self: Box<Self>, tx: Sender<KeypointSnapshot>) {
        info!("simulated dancer started (H hands up, W arms wide, J jump, Space flourish)");
        let period = frame_period(self.fps);
        let mut next = Instant::now();
        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(mv) => {
                        debug!(?mv, "sim move");
                        self.choreo.perform(mv);
                    }
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if tx.send(self.choreo.step()).is_err() {
                return;
            }
            pace(&mut next, period);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource: JSON Lines recording
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read recording {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {source}")]
    Parse {
        line:   usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("recording {} has no usable frames", path.display())]
    Empty { path: PathBuf },
}

/// Parse every line of a recording.  Blank lines are ignored; malformed
/// ones come back as errors alongside the frames that did parse.
pub fn read_frames<R: BufRead>(reader: R) -> io::Result<(Vec<PoseFrame>, Vec<ReplayError>)> {
    let mut frames = Vec::new();
    let mut errors = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match PoseFrame::from_json(&line) {
            Ok(f)       => frames.push(f),
            Err(source) => errors.push(ReplayError::Parse { line: i + 1, source }),
        }
    }
    Ok((frames, errors))
}

/// Plays back a recorded session at a fixed frame rate.
pub struct ReplaySource {
    frames:  Vec<KeypointSnapshot>,
    fps:     u32,
    looping: bool,
}

impl ReplaySource {
    /// Load and convert a recording.  Malformed lines are logged and skipped.
    pub fn open(path: &Path, width: u32, height: u32, mirror: bool) -> Result<Self, ReplayError> {
        let io_err = |source: io::Error| ReplayError::Io { path: path.to_path_buf(), source };
        let file = File::open(path).map_err(io_err)?;
        let (frames, errors) = read_frames(BufReader::new(file)).map_err(io_err)?;
        for e in &errors {
            warn!(path = %path.display(), error = %e, "skipping frame");
        }
        if frames.is_empty() {
            return Err(ReplayError::Empty { path: path.to_path_buf() });
        }
        info!(path = %path.display(), frames = frames.len(), skipped = errors.len(), "recording loaded");
        Ok(Self::from_frames(&frames, width, height, mirror))
    }

    pub fn from_frames(frames: &[PoseFrame], width: u32, height: u32, mirror: bool) -> Self {
        ReplaySource {
            frames:  frames.iter().map(|f| f.to_snapshot(width, height, mirror)).collect(),
            fps:     30,
            looping: false,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize      { self.frames.len() }
    pub fn is_empty(&self) -> bool  { self.frames.is_empty() }
}

impl PoseSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<KeypointSnapshot>) {
        let period = frame_period(self.fps);
        let mut next = Instant::now();
        loop {
            for snap in &self.frames {
                if tx.send(snap.clone()).is_err() {
                    return;
                }
                pace(&mut next, period);
            }
            if !self.looping {
                info!("recording finished");
                return;
            }
            debug!("recording looped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_stream::{arms_wide, hands_up, GestureClassifier, GestureLabel, Point};
    use std::io::Cursor;

    fn run_until_idle(c: &mut Choreography, n: usize) -> Vec<KeypointSnapshot> {
        (0..n).map(|_| c.step()).collect()
    }

    #[test]
    fn idle_pose_has_every_point() {
        let mut c = Choreography::new(1280, 720);
        let snap = c.step();
        assert_eq!(snap.len(), BodyPoint::COUNT);
        assert!(!hands_up(&snap));
        assert!(!arms_wide(&snap));
    }

    #[test]
    fn hands_up_move_is_recognised_then_ends() {
        let mut c = Choreography::new(1280, 720);
        c.perform(SimMove::HandsUp);
        assert!(hands_up(&c.step()));
        run_until_idle(&mut c, SimMove::HandsUp.duration() as usize);
        assert_eq!(c.current(), None);
        assert!(!hands_up(&c.step()));
    }

    #[test]
    fn arms_wide_move_is_recognised() {
        let mut c = Choreography::new(800, 480);
        c.perform(SimMove::ArmsWide);
        assert!(arms_wide(&c.step()));
    }

    #[test]
    fn jump_move_fires_jump() {
        let mut c = Choreography::new(1280, 720);
        let mut classifier = GestureClassifier::new();
        for snap in run_until_idle(&mut c, 6) {
            classifier.classify(snap);
        }
        c.perform(SimMove::Jump);
        let fired = run_until_idle(&mut c, 6)
            .into_iter()
            .any(|s| classifier.classify(s).gestures.contains(GestureLabel::Jump));
        assert!(fired);
    }

    #[test]
    fn flourish_is_energetic() {
        let mut c = Choreography::new(1280, 720);
        let mut classifier = GestureClassifier::new();
        c.perform(SimMove::Flourish);
        let peak = run_until_idle(&mut c, 10)
            .into_iter()
            .map(|s| classifier.classify(s).movement_energy)
            .fold(0.0f32, f32::max);
        assert!(peak > 6.0, "peak energy {}", peak);
    }

    #[test]
    fn bad_lines_are_reported_with_numbers() {
        let text = "{\"keypoints\":{\"nose\":[10,20]}}\n\nnot json\n{}\n";
        let (frames, errors) = read_frames(Cursor::new(text)).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ReplayError::Parse { line: 3, .. }));
    }

    #[test]
    fn replay_sends_every_frame_then_closes() {
        let frames = vec![
            PoseFrame::from_json("{\"keypoints\":{\"nose\":[1,2]}}").unwrap(),
            PoseFrame::from_json("{\"keypoints\":{\"nose\":[3,4]}}").unwrap(),
        ];
        let src = ReplaySource::from_frames(&frames, 640, 480, false).with_fps(1000);
        let rx = spawn_pose_source(src);
        let got: Vec<KeypointSnapshot> = rx.iter().collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].get(BodyPoint::Nose), Some(Point::new(3, 4)));
    }

    #[test]
    fn missing_recording_is_io_error() {
        let err = ReplaySource::open(Path::new("/definitely/not/here.jsonl"), 640, 480, false);
        assert!(matches!(err, Err(ReplayError::Io { .. })));
    }
}
