//! Checks that the built-in scene matches its storyboard: a written
//! title, a paired fade-in, a vertical pass and return, and the waits
//! between them.

use vignette::{
    AnimationRequest, Canvas, Color, Fps, FrameIndex, Mobject, Placement, Step, Vec2,
    circle_and_square, compile_timeline,
};

fn scene() -> vignette::Scene {
    circle_and_square(
        Fps::new(30, 1).unwrap(),
        Canvas {
            width: 1280,
            height: 720,
        },
        None,
    )
    .unwrap()
}

#[test]
fn steps_follow_the_storyboard() {
    let scene = scene();
    let kinds: Vec<String> = scene
        .steps
        .iter()
        .map(|s| match s {
            Step::Play { requests, .. } => {
                let mut names: Vec<&str> = Vec::new();
                for r in requests {
                    names.push(match r {
                        AnimationRequest::Write { .. } => "write",
                        AnimationRequest::FadeIn { .. } => "fade_in",
                        AnimationRequest::Shift { .. } => "shift",
                    });
                }
                names.join("+")
            }
            Step::Wait { .. } => "wait".to_string(),
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "write",
            "wait",
            "fade_in+fade_in",
            "wait",
            "shift+shift",
            "shift+shift",
            "wait",
        ]
    );
}

#[test]
fn run_times_and_waits_are_the_scripted_ones() {
    let scene = scene();
    let secs: Vec<f64> = scene
        .steps
        .iter()
        .map(|s| match s {
            Step::Play { run_time_secs, .. } => *run_time_secs,
            Step::Wait { secs } => *secs,
        })
        .collect();
    assert_eq!(secs, vec![1.0, 0.5, 1.5, 1.0, 0.8, 0.8, 1.0]);
    assert!((scene.total_duration_secs() - 6.6).abs() < 1e-9);
}

#[test]
fn mobjects_carry_the_scripted_geometry_and_colors() {
    let scene = scene();

    let title = &scene.mobject("title").unwrap();
    let Mobject::Text {
        content,
        font_size,
        color,
        ..
    } = &title.mobject
    else {
        panic!("title should be text");
    };
    assert_eq!(content, "Red Circle & Blue Square");
    assert_eq!(*font_size, 36.0);
    assert_eq!(*color, Color::WHITE);
    assert!(matches!(title.placement, Placement::TopEdge { buff } if buff == 0.5));

    let circle = &scene.mobject("circle").unwrap();
    let Mobject::Circle {
        radius,
        color,
        fill_opacity,
    } = &circle.mobject
    else {
        panic!("circle should be a circle");
    };
    assert_eq!(*radius, 1.5);
    assert_eq!(*color, Color::RED);
    assert_eq!(*fill_opacity, 0.8);
    assert!(matches!(circle.placement, Placement::At(p) if p == Vec2::new(-2.0, 0.0)));

    let square = &scene.mobject("square").unwrap();
    let Mobject::Square {
        side,
        color,
        fill_opacity,
    } = &square.mobject
    else {
        panic!("square should be a square");
    };
    assert_eq!(*side, 2.0);
    assert_eq!(*color, Color::BLUE);
    assert_eq!(*fill_opacity, 0.8);
    assert!(matches!(square.placement, Placement::At(p) if p == Vec2::new(2.0, 0.0)));
}

#[test]
fn shifts_are_paired_and_opposite() {
    let scene = scene();
    let shifts: Vec<(String, Vec2)> = scene
        .request_sequence()
        .into_iter()
        .filter_map(|r| match r {
            AnimationRequest::Shift { target, by } => Some((target.clone(), *by)),
            _ => None,
        })
        .collect();

    assert_eq!(shifts.len(), 4);
    assert_eq!(shifts[0], ("circle".to_string(), Vec2::new(0.0, 0.5)));
    assert_eq!(shifts[1], ("square".to_string(), Vec2::new(0.0, -0.5)));
    assert_eq!(shifts[2], ("circle".to_string(), Vec2::new(0.0, -0.5)));
    assert_eq!(shifts[3], ("square".to_string(), Vec2::new(0.0, 0.5)));
}

#[test]
fn timeline_runs_198_frames_at_30fps() {
    let timeline = compile_timeline(&scene()).unwrap();
    assert_eq!(timeline.duration, FrameIndex(198));
    assert_eq!(timeline.actors.len(), 3);
}

#[test]
fn shapes_return_to_their_starting_height() {
    let timeline = compile_timeline(&scene()).unwrap();
    let circle = timeline
        .actors
        .iter()
        .find(|a| a.id == "circle")
        .unwrap();

    let ctx = |frame: u64| vignette::anim::SampleCtx {
        frame: FrameIndex(frame),
        fps: timeline.fps,
    };

    // At rest before the shifts and again at the end.
    let before = circle.transform.sample(ctx(100)).unwrap().translate;
    let after = circle.transform.sample(ctx(197)).unwrap().translate;
    assert_eq!(before, Vec2::ZERO);
    assert_eq!(after, Vec2::ZERO);

    // Raised by half a unit (45 px on a 720-tall canvas) at the turn.
    let raised = circle.transform.sample(ctx(144)).unwrap().translate;
    assert_eq!(raised, Vec2::new(0.0, -45.0));
}
