use crate::{
    anim::SampleCtx,
    core::{FrameIndex, Transform2D},
    error::{VignetteError, VignetteResult},
    timeline::Timeline,
};

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedGraph {
    pub frame: FrameIndex,
    pub nodes: Vec<EvaluatedNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedNode {
    pub id: String,
    pub z: i32,
    pub transform: Transform2D,
    pub opacity: f64,
    pub reveal: f64,
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(timeline))]
    pub fn eval_frame(timeline: &Timeline, frame: FrameIndex) -> VignetteResult<EvaluatedGraph> {
        timeline.validate()?;
        if frame.0 >= timeline.duration.0 {
            return Err(VignetteError::evaluation("frame is out of bounds"));
        }

        let ctx = SampleCtx {
            frame,
            fps: timeline.fps,
        };

        let mut nodes_with_key: Vec<((i32, String), EvaluatedNode)> =
            Vec::with_capacity(timeline.actors.len());
        for actor in &timeline.actors {
            let node = EvaluatedNode {
                id: actor.id.clone(),
                z: actor.z,
                transform: actor.transform.sample(ctx)?,
                opacity: actor.opacity.sample(ctx)?.clamp(0.0, 1.0),
                reveal: actor.reveal.sample(ctx)?.clamp(0.0, 1.0),
            };
            nodes_with_key.push(((node.z, node.id.clone()), node));
        }

        nodes_with_key.sort_by(|a, b| a.0.cmp(&b.0));
        let nodes = nodes_with_key.into_iter().map(|(_, n)| n).collect();

        Ok(EvaluatedGraph { frame, nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Canvas, Fps, Vec2},
        scene::{AnimationRequest, Color, Mobject, Placement, SceneBuilder},
        timeline::compile_timeline,
    };

    fn two_shape_timeline() -> Timeline {
        let scene = SceneBuilder::new(
            "t",
            Fps::new(30, 1).unwrap(),
            Canvas {
                width: 640,
                height: 360,
            },
        )
        .mobject(
            "a",
            Mobject::Circle {
                radius: 1.0,
                color: Color::RED,
                fill_opacity: 0.8,
            },
            Placement::At(Vec2::new(-2.0, 0.0)),
        )
        .unwrap()
        .mobject(
            "b",
            Mobject::Square {
                side: 2.0,
                color: Color::BLUE,
                fill_opacity: 0.8,
            },
            Placement::At(Vec2::new(2.0, 0.0)),
        )
        .unwrap()
        .play(
            vec![
                AnimationRequest::FadeIn {
                    target: "a".to_string(),
                    scale_from: 0.5,
                },
                AnimationRequest::FadeIn {
                    target: "b".to_string(),
                    scale_from: 0.5,
                },
            ],
            1.0,
        )
        .wait(1.0)
        .build()
        .unwrap();
        compile_timeline(&scene).unwrap()
    }

    #[test]
    fn nodes_come_out_in_declaration_order() {
        let tl = two_shape_timeline();
        let g = Evaluator::eval_frame(&tl, FrameIndex(45)).unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.nodes[0].id, "a");
        assert_eq!(g.nodes[1].id, "b");
        assert!(g.nodes[0].z < g.nodes[1].z);
    }

    #[test]
    fn out_of_bounds_frame_is_rejected() {
        let tl = two_shape_timeline();
        assert_eq!(tl.duration, FrameIndex(60));
        assert!(Evaluator::eval_frame(&tl, FrameIndex(60)).is_err());
        assert!(Evaluator::eval_frame(&tl, FrameIndex(59)).is_ok());
    }

    #[test]
    fn opacity_mid_fade_is_partial() {
        let tl = two_shape_timeline();
        let g = Evaluator::eval_frame(&tl, FrameIndex(15)).unwrap();
        let o = g.nodes[0].opacity;
        assert!(o > 0.0 && o < 1.0);
    }
}
