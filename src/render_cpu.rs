//! CPU rasterizer on vello_cpu sparse strips.

use crate::{
    assets::{PreparedAssetStore, PreparedText},
    compile::{DrawOp, RenderPlan},
    error::{VignetteError, VignetteResult},
    render::{FrameRGBA, RenderBackend, RenderSettings},
};

pub struct CpuBackend {
    settings: RenderSettings,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(skip_all)]
    fn render_plan(
        &mut self,
        plan: &RenderPlan,
        assets: &PreparedAssetStore,
    ) -> VignetteResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| VignetteError::evaluation("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| VignetteError::evaluation("canvas height exceeds u16"))?;

        // The pixmap starts transparent; the background is painted as
        // the first drawing command with straight-alpha components.
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        let [r, g, b, a] = self.settings.clear_rgba.unwrap_or([
            plan.background.r,
            plan.background.g,
            plan.background.b,
            255,
        ]);

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
        for op in &plan.ops {
            draw_op(&mut ctx, op, assets)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

fn draw_op(
    ctx: &mut vello_cpu::RenderContext,
    op: &DrawOp,
    assets: &PreparedAssetStore,
) -> VignetteResult<()> {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::FillPath {
            path,
            transform,
            color,
            opacity,
            z: _,
        } => {
            ctx.set_transform(affine_to_cpu(*transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.fill_path(&bezpath_to_cpu(path));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
        DrawOp::StrokePath {
            path,
            transform,
            color,
            width,
            opacity,
            z: _,
        } => {
            ctx.set_transform(affine_to_cpu(*transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.stroke_path(&bezpath_to_cpu(path));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
        DrawOp::Text {
            asset,
            transform,
            opacity,
            reveal,
            z: _,
        } => {
            let prepared = assets.get(*asset)?;
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(prepared.font_bytes.as_ref().clone()),
                0,
            );

            ctx.set_transform(affine_to_cpu(*transform));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            draw_text_revealed(ctx, prepared, &font, *reveal);
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
    }
}

/// Draws a text layout with the first `reveal` fraction of its glyphs
/// visible. The glyph on the boundary fades in with the fractional part,
/// which is what makes a write-on look continuous instead of ticking.
fn draw_text_revealed(
    ctx: &mut vello_cpu::RenderContext,
    prepared: &PreparedText,
    font: &vello_cpu::peniko::FontData,
    reveal: f32,
) {
    if reveal <= 0.0 || prepared.glyph_count == 0 {
        return;
    }
    let visible = f64::from(reveal) * prepared.glyph_count as f64;
    let full = visible.floor() as usize;
    let frac = visible - full as f64;

    let mut next_index = 0usize;
    for line in prepared.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;

            let mut shown = Vec::new();
            let mut boundary = None;
            for g in run.glyphs() {
                let glyph = vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                };
                if next_index < full {
                    shown.push(glyph);
                } else if next_index == full && frac > 0.0 {
                    boundary = Some(glyph);
                }
                next_index += 1;
            }

            if !shown.is_empty() {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(shown.into_iter());
            }
            if let Some(glyph) = boundary {
                let alpha = (frac * f64::from(brush.a)).round() as u8;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, alpha,
                ));
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(std::iter::once(glyph));
            }
        }
    }
}

fn affine_to_cpu(a: crate::core::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: crate::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &crate::core::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
