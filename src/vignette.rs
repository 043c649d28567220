//! The vignette script: a red circle and a blue square fade in under a
//! written title, then trade places vertically and settle back.

use crate::{
    core::{Canvas, Fps},
    error::VignetteResult,
    scene::{AnimationRequest, Color, DOWN, LEFT, Mobject, Placement, RIGHT, Scene, SceneBuilder, UP},
};

pub const DEFAULT_CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};

/// "Red Circle & Blue Square": every parameter below is a literal; the
/// whole scene runs 6.6 seconds.
pub fn circle_and_square(
    fps: Fps,
    canvas: Canvas,
    font_source: Option<String>,
) -> VignetteResult<Scene> {
    SceneBuilder::new("circle_and_square", fps, canvas)
        .background(Color::BLACK)
        .mobject(
            "title",
            Mobject::Text {
                content: "Red Circle & Blue Square".to_string(),
                font_size: 36.0,
                color: Color::WHITE,
                font_source,
            },
            Placement::TopEdge { buff: 0.5 },
        )?
        .mobject(
            "circle",
            Mobject::Circle {
                radius: 1.5,
                color: Color::RED,
                fill_opacity: 0.8,
            },
            Placement::At(LEFT * 2.0),
        )?
        .mobject(
            "square",
            Mobject::Square {
                side: 2.0,
                color: Color::BLUE,
                fill_opacity: 0.8,
            },
            Placement::At(RIGHT * 2.0),
        )?
        .play(
            vec![AnimationRequest::Write {
                target: "title".to_string(),
            }],
            1.0,
        )
        .wait(0.5)
        .play(
            vec![
                AnimationRequest::FadeIn {
                    target: "circle".to_string(),
                    scale_from: 0.5,
                },
                AnimationRequest::FadeIn {
                    target: "square".to_string(),
                    scale_from: 0.5,
                },
            ],
            1.5,
        )
        .wait(1.0)
        .play(
            vec![
                AnimationRequest::Shift {
                    target: "circle".to_string(),
                    by: UP * 0.5,
                },
                AnimationRequest::Shift {
                    target: "square".to_string(),
                    by: DOWN * 0.5,
                },
            ],
            0.8,
        )
        .play(
            vec![
                AnimationRequest::Shift {
                    target: "circle".to_string(),
                    by: DOWN * 0.5,
                },
                AnimationRequest::Shift {
                    target: "square".to_string(),
                    by: UP * 0.5,
                },
            ],
            0.8,
        )
        .wait(1.0)
        .build()
}
