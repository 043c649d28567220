//! Turns one evaluated frame into a flat, ordered list of draw ops.
//!
//! Placement is resolved here rather than in the evaluator because the
//! top-edge placement needs the measured text size, which lives in the
//! prepared asset store.

use kurbo::Shape;

use crate::{
    assets::{AssetId, PreparedAssetStore},
    core::{Affine, BezPath, Canvas, Vec2},
    error::{VignetteError, VignetteResult},
    eval::EvaluatedGraph,
    scene::{self, Color, Mobject, Placement},
    timeline::Timeline,
};

/// Outline width in pixels on a 1080-tall canvas; scales with height.
const STROKE_WIDTH_REF: f64 = 4.0;

/// Flattening tolerance for circle-to-bezier conversion, in pixels.
const PATH_TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    /// Opaque background, straight RGB.
    pub background: Color,
    /// Already in paint order (back to front).
    pub ops: Vec<DrawOp>,
}

/// Straight (non-premultiplied) RGBA8 paint color; the rasterizer
/// applies alpha itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaintColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    FillPath {
        path: BezPath,
        transform: Affine,
        color: PaintColor,
        opacity: f32,
        z: i32,
    },
    StrokePath {
        path: BezPath,
        transform: Affine,
        color: PaintColor,
        width: f64,
        opacity: f32,
        z: i32,
    },
    Text {
        asset: AssetId,
        transform: Affine,
        opacity: f32,
        /// Fraction of glyphs uncovered, in [0, 1].
        reveal: f32,
        z: i32,
    },
}

#[tracing::instrument(skip_all, fields(frame = eval.frame.0))]
pub fn compile_frame(
    timeline: &Timeline,
    eval: &EvaluatedGraph,
    assets: &PreparedAssetStore,
) -> VignetteResult<RenderPlan> {
    let canvas = timeline.canvas;
    let mut ops = Vec::with_capacity(eval.nodes.len() * 2);

    for node in &eval.nodes {
        let opacity = node.opacity as f32;
        if opacity <= 0.0 {
            continue;
        }

        let actor = timeline
            .actors
            .iter()
            .find(|a| a.id == node.id)
            .ok_or_else(|| {
                VignetteError::evaluation(format!(
                    "evaluated node '{}' has no actor in the timeline",
                    node.id
                ))
            })?;

        match &actor.mobject {
            Mobject::Circle {
                radius,
                color,
                fill_opacity,
            } => {
                let r_px = radius * scene::px_per_unit(canvas);
                let path = kurbo::Circle::new((0.0, 0.0), r_px).to_path(PATH_TOLERANCE);
                let transform =
                    shape_transform(canvas, actor.placement, node.transform.to_affine())?;
                push_shape_ops(
                    &mut ops,
                    path,
                    transform,
                    *color,
                    *fill_opacity,
                    opacity,
                    canvas,
                    node.z,
                );
            }
            Mobject::Square {
                side,
                color,
                fill_opacity,
            } => {
                let half = side * scene::px_per_unit(canvas) / 2.0;
                let path = kurbo::Rect::new(-half, -half, half, half).to_path(PATH_TOLERANCE);
                let transform =
                    shape_transform(canvas, actor.placement, node.transform.to_affine())?;
                push_shape_ops(
                    &mut ops,
                    path,
                    transform,
                    *color,
                    *fill_opacity,
                    opacity,
                    canvas,
                    node.z,
                );
            }
            Mobject::Text { .. } => {
                let asset = assets.id_for(&node.id)?;
                let prepared = assets.get(asset)?;
                let base = text_base_px(
                    canvas,
                    actor.placement,
                    f64::from(prepared.width_px),
                    f64::from(prepared.height_px),
                )?;
                let transform = Affine::translate(base) * node.transform.to_affine();
                ops.push(DrawOp::Text {
                    asset,
                    transform,
                    opacity,
                    reveal: node.reveal as f32,
                    z: node.z,
                });
            }
        }
    }

    Ok(RenderPlan {
        canvas,
        background: timeline.background,
        ops,
    })
}

/// Base-then-animated affine for a shape whose path is centered on its
/// local origin, so animated scale pivots on the shape center.
fn shape_transform(
    canvas: Canvas,
    placement: Placement,
    animated: Affine,
) -> VignetteResult<Affine> {
    let center = match placement {
        Placement::At(p) => scene::scene_to_px(canvas, p),
        Placement::TopEdge { .. } => {
            return Err(VignetteError::evaluation(
                "top-edge placement requires a measured size and only applies to text",
            ));
        }
    };
    Ok(Affine::translate(center) * animated)
}

/// Pixel position of the text layout box origin (its top-left corner).
fn text_base_px(
    canvas: Canvas,
    placement: Placement,
    width_px: f64,
    height_px: f64,
) -> VignetteResult<Vec2> {
    match placement {
        Placement::At(p) => {
            // Centered on the point, like shapes.
            let c = scene::scene_to_px(canvas, p);
            Ok(Vec2::new(c.x - width_px / 2.0, c.y - height_px / 2.0))
        }
        Placement::TopEdge { buff } => {
            let top = buff * scene::px_per_unit(canvas);
            Ok(Vec2::new((f64::from(canvas.width) - width_px) / 2.0, top))
        }
    }
}

#[expect(clippy::too_many_arguments)]
fn push_shape_ops(
    ops: &mut Vec<DrawOp>,
    path: BezPath,
    transform: Affine,
    color: Color,
    fill_opacity: f64,
    opacity: f32,
    canvas: Canvas,
    z: i32,
) {
    let fill_alpha = (fill_opacity * 255.0).round().clamp(0.0, 255.0) as u8;
    ops.push(DrawOp::FillPath {
        path: path.clone(),
        transform,
        color: PaintColor {
            r: color.r,
            g: color.g,
            b: color.b,
            a: fill_alpha,
        },
        opacity,
        z,
    });
    ops.push(DrawOp::StrokePath {
        path,
        transform,
        color: PaintColor {
            r: color.r,
            g: color.g,
            b: color.b,
            a: 255,
        },
        width: STROKE_WIDTH_REF * f64::from(canvas.height) / 1080.0,
        opacity,
        z,
    });
}
