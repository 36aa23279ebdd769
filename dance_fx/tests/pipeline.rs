//! End-to-end: recorded frames → classifier → effects → framebuffer.

use std::io::Cursor;
use std::path::PathBuf;

use dance_fx::app::AppState;
use dance_fx::config::{ConfigUpdate, EffectsConfig, Preset};
use dance_fx::control::{parse_command, ControlCommand};
use dance_fx::source::{read_frames, Choreography, SimMove};
use dance_fx::surface::{Canvas, Surface};
use dance_fx::Rgb;
use pose_stream::{BodyPoint, GestureLabel, KeypointSnapshot, PoseFrame};

const W: usize = 640;
const H: usize = 480;

fn app() -> AppState {
    AppState::new(W, H, EffectsConfig::default(), PathBuf::from("unused.json"), Some(99))
}

fn frame(nose: (i32, i32), lw: (i32, i32), rw: (i32, i32), hip_y: i32) -> String {
    let snap = KeypointSnapshot::from_points([
        (BodyPoint::Nose,          nose),
        (BodyPoint::LeftShoulder,  (290, 200)),
        (BodyPoint::RightShoulder, (350, 200)),
        (BodyPoint::LeftWrist,     lw),
        (BodyPoint::RightWrist,    rw),
        (BodyPoint::LeftHip,       (300, hip_y)),
        (BodyPoint::RightHip,      (340, hip_y)),
    ]);
    serde_json::to_string(&PoseFrame::from_snapshot(&snap)).unwrap()
}

#[test]
fn recording_drives_gestures_and_particles() {
    let mut lines = Vec::new();
    // idle, idle, idle
    for _ in 0..3 {
        lines.push(frame((320, 150), (280, 300), (360, 300), 350));
    }
    // hip rises 60 px
    lines.push(frame((320, 90), (280, 240), (360, 240), 290));
    // next frame: jump fires (window is the four frames above)
    lines.push(frame((320, 80), (280, 230), (360, 230), 280));
    // hands up
    lines.push(frame((320, 150), (280, 60), (360, 60), 350));
    lines.push("this line is not json".to_string());

    let text = lines.join("\n");
    let (frames, errors) = read_frames(Cursor::new(text)).unwrap();
    assert_eq!(frames.len(), 6);
    assert_eq!(errors.len(), 1);

    let mut app = app();
    let mut seen = Vec::new();
    for f in &frames {
        let analysis = app.tick(Some(f.to_snapshot(W as u32, H as u32, false))).unwrap();
        seen.push(analysis.gestures);
    }

    assert!(seen[4].contains(GestureLabel::Jump));
    assert!(seen[5].contains(GestureLabel::HandsUp));
    assert!(seen[..4].iter().all(|g| g.is_empty()));
    // fireworks (25) + explosions (30), plus any ambient sparkle
    assert!(app.effects().particles().len() >= 55);

    let mut canvas = Canvas::new(W, H);
    app.render(&mut canvas);
    assert!(canvas.pixels().iter().any(|&p| p != canvas.pixels()[0]));
}

#[test]
fn control_lines_reconfigure_live() {
    let mut app = app();
    for line in ["preset calm", "set color_scheme neon", "set background_effects off", "stop"] {
        if let Some(cmd) = parse_command(line).unwrap() {
            app.handle_command(cmd);
        }
    }
    assert_eq!(app.config().particle_count, 30);
    assert_eq!(app.config().trail_length, 25);
    assert!(!app.config().background_effects);
    assert!(!app.is_running());

    // stopped: background stays black regardless of energy
    let mut dancer = Choreography::new(W, H);
    dancer.perform(SimMove::Flourish);
    for _ in 0..5 {
        app.tick(Some(dancer.step()));
    }
    let mut canvas = Canvas::new(W, H);
    app.render(&mut canvas);
    assert_eq!(canvas.pixel(0, 0), Some(Rgb::BLACK));
    assert!(app.effects().particles().is_empty());

    app.handle_command(ControlCommand::Start);
    app.handle_command(ControlCommand::Configure(ConfigUpdate::BackgroundEffects(true)));
    for _ in 0..3 {
        app.tick(Some(dancer.step()));
    }
    assert!(app.effects().energy() > 0.0);
}

#[test]
fn simulated_moves_trigger_their_effects() {
    let mut app = app();
    let mut dancer = Choreography::new(W, H);
    for _ in 0..3 {
        app.tick(Some(dancer.step()));
    }

    dancer.perform(SimMove::ArmsWide);
    let a = app.tick(Some(dancer.step())).unwrap();
    assert!(a.gestures.contains(GestureLabel::ArmsWide));

    dancer.perform(SimMove::HandsUp);
    let a = app.tick(Some(dancer.step())).unwrap();
    assert!(a.gestures.contains(GestureLabel::HandsUp));
}

#[test]
fn preset_settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visualizer_config.json");

    let mut app = AppState::new(W, H, EffectsConfig::default(), path.clone(), Some(1));
    app.handle_command(ControlCommand::Configure(ConfigUpdate::ApplyPreset(Preset::Party)));
    app.handle_command(ControlCommand::Save);

    let restarted = EffectsConfig::load_or_default(&path);
    assert_eq!(&restarted, app.config());
    assert_eq!(restarted, Preset::Party.config());
}

#[test]
fn canvas_size_matches_surface_size() {
    let canvas = Canvas::new(W, H);
    assert_eq!(canvas.size(), (W, H));
    assert_eq!(canvas.pixels().len(), W * H);
}
