//! Declarative scene model: a handful of visual primitives placed in a
//! unit-based coordinate space, plus an ordered list of play/wait steps.
//!
//! Scene space follows the convention of the classic animation engines:
//! the canvas is [`UNITS_PER_HEIGHT`] units tall regardless of pixel
//! resolution, the origin sits at the canvas center and +y points up.

use crate::{
    core::{Canvas, Fps, Vec2},
    error::{VignetteError, VignetteResult},
};

/// Height of the visible canvas in scene units.
pub const UNITS_PER_HEIGHT: f64 = 8.0;

pub const UP: Vec2 = Vec2::new(0.0, 1.0);
pub const DOWN: Vec2 = Vec2::new(0.0, -1.0);
pub const LEFT: Vec2 = Vec2::new(-1.0, 0.0);
pub const RIGHT: Vec2 = Vec2::new(1.0, 0.0);

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(0xFC, 0x62, 0x55);
    pub const BLUE: Color = Color::rgb(0x58, 0xC4, 0xDD);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Mobject {
    Circle {
        radius: f64,
        color: Color,
        fill_opacity: f64,
    },
    Square {
        side: f64,
        color: Color,
        fill_opacity: f64,
    },
    Text {
        content: String,
        font_size: f64,
        color: Color,
        font_source: Option<String>,
    },
}

impl Mobject {
    fn validate(&self) -> VignetteResult<()> {
        match self {
            Self::Circle {
                radius,
                fill_opacity,
                ..
            } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(VignetteError::validation("circle radius must be > 0"));
                }
                validate_fill_opacity(*fill_opacity)
            }
            Self::Square {
                side, fill_opacity, ..
            } => {
                if !side.is_finite() || *side <= 0.0 {
                    return Err(VignetteError::validation("square side must be > 0"));
                }
                validate_fill_opacity(*fill_opacity)
            }
            Self::Text {
                content, font_size, ..
            } => {
                if content.is_empty() {
                    return Err(VignetteError::validation("text content must be non-empty"));
                }
                if !font_size.is_finite() || *font_size <= 0.0 {
                    return Err(VignetteError::validation("text font_size must be > 0"));
                }
                Ok(())
            }
        }
    }
}

fn validate_fill_opacity(v: f64) -> VignetteResult<()> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(VignetteError::validation("fill_opacity must be in [0, 1]"));
    }
    Ok(())
}

/// Where a mobject sits before any animation moves it.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum Placement {
    /// Center at the given point in scene units.
    At(Vec2),
    /// Centered horizontally, with the bounding-box top `buff` units
    /// below the top canvas edge. Resolved against the measured size at
    /// compile time (text height depends on the font).
    TopEdge { buff: f64 },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MobjectDecl {
    pub id: String,
    pub mobject: Mobject,
    pub placement: Placement,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum AnimationRequest {
    /// Progressive reveal of a text mobject.
    Write { target: String },
    /// Fade opacity in while scaling from `scale_from` up to 1.
    FadeIn { target: String, scale_from: f64 },
    /// Move by a delta in scene units.
    Shift { target: String, by: Vec2 },
}

impl AnimationRequest {
    pub fn target(&self) -> &str {
        match self {
            Self::Write { target } => target,
            Self::FadeIn { target, .. } => target,
            Self::Shift { target, .. } => target,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Step {
    Play {
        requests: Vec<AnimationRequest>,
        run_time_secs: f64,
    },
    Wait {
        secs: f64,
    },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub name: String,
    pub fps: Fps,
    pub canvas: Canvas,
    pub background: Color,
    /// Declaration order doubles as draw order (later on top).
    pub mobjects: Vec<MobjectDecl>,
    pub steps: Vec<Step>,
}

impl Scene {
    pub fn validate(&self) -> VignetteResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(VignetteError::validation("canvas width/height must be > 0"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(VignetteError::validation("fps must have num>0 and den>0"));
        }
        if self.steps.is_empty() {
            return Err(VignetteError::validation("scene must have at least one step"));
        }

        for decl in &self.mobjects {
            if decl.id.trim().is_empty() {
                return Err(VignetteError::validation("mobject id must be non-empty"));
            }
            if self.mobjects.iter().filter(|d| d.id == decl.id).count() > 1 {
                return Err(VignetteError::validation(format!(
                    "duplicate mobject id '{}'",
                    decl.id
                )));
            }
            decl.mobject.validate()?;
        }

        for step in &self.steps {
            match step {
                Step::Wait { secs } => {
                    if !secs.is_finite() || *secs <= 0.0 {
                        return Err(VignetteError::validation("wait secs must be > 0"));
                    }
                }
                Step::Play {
                    requests,
                    run_time_secs,
                } => {
                    if requests.is_empty() {
                        return Err(VignetteError::validation(
                            "play step must have at least one request",
                        ));
                    }
                    if !run_time_secs.is_finite() || *run_time_secs <= 0.0 {
                        return Err(VignetteError::validation("play run_time_secs must be > 0"));
                    }
                    for (i, req) in requests.iter().enumerate() {
                        let target = req.target();
                        if self.mobject(target).is_none() {
                            return Err(VignetteError::validation(format!(
                                "request targets unknown mobject '{target}'"
                            )));
                        }
                        if requests[..i].iter().any(|r| r.target() == target) {
                            return Err(VignetteError::validation(format!(
                                "mobject '{target}' is targeted twice in one play step"
                            )));
                        }
                        if let AnimationRequest::Write { .. } = req
                            && !matches!(
                                self.mobject(target).map(|d| &d.mobject),
                                Some(Mobject::Text { .. })
                            )
                        {
                            return Err(VignetteError::validation(format!(
                                "write request targets non-text mobject '{target}'"
                            )));
                        }
                        if let AnimationRequest::FadeIn { scale_from, .. } = req
                            && (!scale_from.is_finite() || *scale_from <= 0.0)
                        {
                            return Err(VignetteError::validation(
                                "fade-in scale_from must be > 0",
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn mobject(&self, id: &str) -> Option<&MobjectDecl> {
        self.mobjects.iter().find(|d| d.id == id)
    }

    pub fn to_json_pretty(&self) -> VignetteResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| VignetteError::serde(e.to_string()))
    }

    /// Parses and validates a scene from JSON.
    pub fn from_json(json: &str) -> VignetteResult<Self> {
        let scene: Scene =
            serde_json::from_str(json).map_err(|e| VignetteError::serde(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Play { run_time_secs, .. } => *run_time_secs,
                Step::Wait { secs } => *secs,
            })
            .sum()
    }

    /// All animation requests in script order, flattened across steps.
    pub fn request_sequence(&self) -> Vec<&AnimationRequest> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Play { requests, .. } => Some(requests.iter()),
                Step::Wait { .. } => None,
            })
            .flatten()
            .collect()
    }
}

/// Pixels per scene unit for a given canvas.
pub fn px_per_unit(canvas: Canvas) -> f64 {
    f64::from(canvas.height) / UNITS_PER_HEIGHT
}

/// Map a point in scene units (origin center, +y up) to pixel space
/// (origin top-left, +y down).
pub fn scene_to_px(canvas: Canvas, p: Vec2) -> Vec2 {
    let ppu = px_per_unit(canvas);
    Vec2::new(
        f64::from(canvas.width) / 2.0 + p.x * ppu,
        f64::from(canvas.height) / 2.0 - p.y * ppu,
    )
}

/// Map a delta in scene units to a pixel-space delta (y flips).
pub fn scene_delta_to_px(canvas: Canvas, d: Vec2) -> Vec2 {
    let ppu = px_per_unit(canvas);
    Vec2::new(d.x * ppu, -d.y * ppu)
}

pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>, fps: Fps, canvas: Canvas) -> Self {
        Self {
            scene: Scene {
                name: name.into(),
                fps,
                canvas,
                background: Color::BLACK,
                mobjects: Vec::new(),
                steps: Vec::new(),
            },
        }
    }

    pub fn background(mut self, color: Color) -> Self {
        self.scene.background = color;
        self
    }

    pub fn mobject(
        mut self,
        id: impl Into<String>,
        mobject: Mobject,
        placement: Placement,
    ) -> VignetteResult<Self> {
        let id = id.into();
        if self.scene.mobject(&id).is_some() {
            return Err(VignetteError::validation(format!(
                "duplicate mobject id '{id}'"
            )));
        }
        self.scene.mobjects.push(MobjectDecl {
            id,
            mobject,
            placement,
        });
        Ok(self)
    }

    pub fn play(mut self, requests: Vec<AnimationRequest>, run_time_secs: f64) -> Self {
        self.scene.steps.push(Step::Play {
            requests,
            run_time_secs,
        });
        self
    }

    pub fn wait(mut self, secs: f64) -> Self {
        self.scene.steps.push(Step::Wait { secs });
        self
    }

    pub fn build(self) -> VignetteResult<Scene> {
        self.scene.validate()?;
        Ok(self.scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes_scene() -> SceneBuilder {
        SceneBuilder::new(
            "test",
            Fps::new(30, 1).unwrap(),
            Canvas {
                width: 640,
                height: 360,
            },
        )
        .mobject(
            "c",
            Mobject::Circle {
                radius: 1.0,
                color: Color::RED,
                fill_opacity: 0.8,
            },
            Placement::At(LEFT * 2.0),
        )
        .unwrap()
    }

    #[test]
    fn json_roundtrip() {
        let scene = shapes_scene()
            .play(
                vec![AnimationRequest::FadeIn {
                    target: "c".to_string(),
                    scale_from: 0.5,
                }],
                1.5,
            )
            .wait(1.0)
            .build()
            .unwrap();

        let s = scene.to_json_pretty().unwrap();
        let de = Scene::from_json(&s).unwrap();
        assert_eq!(de.mobjects.len(), 1);
        assert_eq!(de.steps.len(), 2);
        assert_eq!(de.total_duration_secs(), 2.5);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = shapes_scene()
            .play(
                vec![AnimationRequest::Shift {
                    target: "nope".to_string(),
                    by: UP,
                }],
                0.5,
            )
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_target_in_one_play_is_rejected() {
        let err = shapes_scene()
            .play(
                vec![
                    AnimationRequest::Shift {
                        target: "c".to_string(),
                        by: UP,
                    },
                    AnimationRequest::Shift {
                        target: "c".to_string(),
                        by: DOWN,
                    },
                ],
                0.5,
            )
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn write_on_shape_is_rejected() {
        let err = shapes_scene()
            .play(
                vec![AnimationRequest::Write {
                    target: "c".to_string(),
                }],
                1.0,
            )
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn empty_steps_are_rejected() {
        assert!(shapes_scene().build().is_err());
    }

    #[test]
    fn scene_space_maps_to_pixels() {
        let canvas = Canvas {
            width: 640,
            height: 360,
        };
        // 360 px / 8 units = 45 px per unit.
        assert_eq!(px_per_unit(canvas), 45.0);

        let center = scene_to_px(canvas, Vec2::ZERO);
        assert_eq!(center, Vec2::new(320.0, 180.0));

        // +y in scene space goes up, i.e. pixel y decreases.
        let up = scene_to_px(canvas, UP);
        assert_eq!(up, Vec2::new(320.0, 135.0));

        let d = scene_delta_to_px(canvas, UP * 0.5);
        assert_eq!(d, Vec2::new(0.0, -22.5));
    }
}
