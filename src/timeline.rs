//! Lowers a declarative [`Scene`](crate::scene::Scene) into per-actor
//! keyframed channels indexed by frame.
//!
//! A running clock walks the play/wait steps in script order. Each play
//! step keyframes the channels of the mobjects it targets over the step's
//! frame window; everything else holds its current value. Mobjects are
//! invisible until a `Write` or `FadeIn` request introduces them.

use crate::{
    anim::{Anim, InterpMode},
    anim_ease::Ease,
    core::{Canvas, Fps, FrameIndex, Transform2D, Vec2},
    error::{VignetteError, VignetteResult},
    scene::{self, AnimationRequest, Color, Mobject, Placement, Scene, Step},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub id: String,
    pub z: i32,
    pub mobject: Mobject,
    pub placement: Placement,
    /// Offset and scale on top of the resolved placement, in pixel space.
    pub transform: Anim<Transform2D>,
    pub opacity: Anim<f64>,
    /// Write progress for text actors; held at 1 for shapes.
    pub reveal: Anim<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    pub name: String,
    pub fps: Fps,
    pub canvas: Canvas,
    pub background: Color,
    pub duration: FrameIndex, // total frames
    pub actors: Vec<Actor>,
}

impl Timeline {
    pub fn validate(&self) -> VignetteResult<()> {
        if self.duration.0 == 0 {
            return Err(VignetteError::validation("timeline duration must be > 0"));
        }
        for actor in &self.actors {
            actor.transform.validate()?;
            actor.opacity.validate()?;
            actor.reveal.validate()?;
        }
        Ok(())
    }
}

struct ActorState {
    opacity: f64,
    transform: Transform2D,
    reveal: f64,
}

#[tracing::instrument(skip(scene), fields(scene = %scene.name))]
pub fn compile_timeline(scene: &Scene) -> VignetteResult<Timeline> {
    scene.validate()?;

    let mut actors: Vec<Actor> = Vec::with_capacity(scene.mobjects.len());
    let mut states: Vec<ActorState> = Vec::with_capacity(scene.mobjects.len());

    for (idx, decl) in scene.mobjects.iter().enumerate() {
        let is_text = matches!(decl.mobject, Mobject::Text { .. });
        let state = ActorState {
            opacity: 0.0,
            transform: Transform2D::default(),
            // Shapes are always fully "revealed"; only Write moves this.
            reveal: if is_text { 0.0 } else { 1.0 },
        };

        let mut transform = Anim {
            keys: vec![],
            mode: InterpMode::Linear,
        };
        let mut opacity = Anim {
            keys: vec![],
            mode: InterpMode::Linear,
        };
        let mut reveal = Anim {
            keys: vec![],
            mode: InterpMode::Linear,
        };
        transform.key(FrameIndex(0), state.transform, Ease::Linear);
        opacity.key(FrameIndex(0), state.opacity, Ease::Linear);
        reveal.key(FrameIndex(0), state.reveal, Ease::Linear);

        actors.push(Actor {
            id: decl.id.clone(),
            z: idx as i32,
            mobject: decl.mobject.clone(),
            placement: decl.placement,
            transform,
            opacity,
            reveal,
        });
        states.push(state);
    }

    let mut clock_secs = 0.0_f64;
    for step in &scene.steps {
        match step {
            Step::Wait { secs } => {
                clock_secs += secs;
            }
            Step::Play {
                requests,
                run_time_secs,
            } => {
                let start = FrameIndex(scene.fps.secs_to_frames_round(clock_secs));
                clock_secs += run_time_secs;
                let end = FrameIndex(scene.fps.secs_to_frames_round(clock_secs));

                for req in requests {
                    let idx = actors
                        .iter()
                        .position(|a| a.id == req.target())
                        .ok_or_else(|| {
                            VignetteError::evaluation(format!(
                                "request targets unknown mobject '{}' (post-validate bug)",
                                req.target()
                            ))
                        })?;
                    apply_request(
                        scene.canvas,
                        &mut actors[idx],
                        &mut states[idx],
                        req,
                        start,
                        end,
                    );
                }
            }
        }
    }

    let duration = FrameIndex(scene.fps.secs_to_frames_round(clock_secs).max(1));
    tracing::debug!(
        frames = duration.0,
        actors = actors.len(),
        "compiled timeline"
    );

    let timeline = Timeline {
        name: scene.name.clone(),
        fps: scene.fps,
        canvas: scene.canvas,
        background: scene.background,
        duration,
        actors,
    };
    timeline.validate()?;
    Ok(timeline)
}

fn apply_request(
    canvas: Canvas,
    actor: &mut Actor,
    state: &mut ActorState,
    req: &AnimationRequest,
    start: FrameIndex,
    end: FrameIndex,
) {
    match req {
        AnimationRequest::Write { .. } => {
            // Text pops on stage at the step start; the reveal channel
            // does the progressive uncovering.
            actor.opacity.key(start, state.opacity, Ease::Linear);
            actor.opacity.key(start, 1.0, Ease::Linear);
            state.opacity = 1.0;

            actor.reveal.key(start, 0.0, Ease::Smooth);
            actor.reveal.key(end, 1.0, Ease::Linear);
            state.reveal = 1.0;
        }
        AnimationRequest::FadeIn { scale_from, .. } => {
            actor.opacity.key(start, 0.0, Ease::Smooth);
            actor.opacity.key(end, 1.0, Ease::Linear);
            state.opacity = 1.0;

            let scaled = Transform2D {
                scale: Vec2::new(*scale_from, *scale_from),
                ..state.transform
            };
            let unscaled = Transform2D {
                scale: Vec2::new(1.0, 1.0),
                ..state.transform
            };
            // Hold, jump to the scaled-down pose, ease back to full size.
            actor.transform.key(start, state.transform, Ease::Linear);
            actor.transform.key(start, scaled, Ease::Smooth);
            actor.transform.key(end, unscaled, Ease::Linear);
            state.transform = unscaled;
        }
        AnimationRequest::Shift { by, .. } => {
            let delta = scene::scene_delta_to_px(canvas, *by);
            let moved = Transform2D {
                translate: state.transform.translate + delta,
                ..state.transform
            };
            actor.transform.key(start, state.transform, Ease::Smooth);
            actor.transform.key(end, moved, Ease::Linear);
            state.transform = moved;
        }
    }
}
