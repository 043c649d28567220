//! Prepared text assets: font resolution and parley layout.
//!
//! The only asset kind the vignette needs is text. Shapes are pure
//! geometry and never touch the store.

use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{
    error::{VignetteError, VignetteResult},
    scene::Mobject,
    timeline::Timeline,
};

/// Pixel size of a nominal font-size point, anchored to a 540-unit-tall
/// reference canvas so text scales with output resolution.
const FONT_REFERENCE_HEIGHT: f64 = 540.0;

/// Well-known font locations probed when a text mobject does not name a
/// font file of its own.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct AssetId(pub u32);

/// RGBA8 brush color carried through parley layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Clone)]
pub struct PreparedText {
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    pub font_bytes: Arc<Vec<u8>>,
    pub font_family: String,
    pub width_px: f32,
    pub height_px: f32,
    pub glyph_count: usize,
}

/// Eagerly prepared assets for one timeline, keyed by actor id.
pub struct PreparedAssetStore {
    texts: Vec<PreparedText>,
    ids: HashMap<String, AssetId>,
}

impl PreparedAssetStore {
    #[tracing::instrument(skip(timeline), fields(scene = %timeline.name))]
    pub fn prepare(timeline: &Timeline, assets_root: &Path) -> VignetteResult<Self> {
        let mut engine = TextLayoutEngine::new();
        let mut texts = Vec::new();
        let mut ids = HashMap::new();

        for actor in &timeline.actors {
            let Mobject::Text {
                content,
                font_size,
                color,
                font_source,
            } = &actor.mobject
            else {
                continue;
            };

            let font_bytes = resolve_font_bytes(font_source.as_deref(), assets_root)?;
            let size_px =
                (font_size * f64::from(timeline.canvas.height) / FONT_REFERENCE_HEIGHT) as f32;
            let brush = TextBrushRgba8 {
                r: color.r,
                g: color.g,
                b: color.b,
                a: 255,
            };

            let prepared = engine.layout_plain(content, &font_bytes, size_px, brush)?;
            tracing::debug!(
                actor = %actor.id,
                family = %prepared.font_family,
                glyphs = prepared.glyph_count,
                "prepared text asset"
            );

            let id = AssetId(texts.len() as u32);
            texts.push(prepared);
            ids.insert(actor.id.clone(), id);
        }

        Ok(Self { texts, ids })
    }

    pub fn id_for(&self, actor_id: &str) -> VignetteResult<AssetId> {
        self.ids.get(actor_id).copied().ok_or_else(|| {
            VignetteError::evaluation(format!("no prepared text asset for actor '{actor_id}'"))
        })
    }

    pub fn get(&self, id: AssetId) -> VignetteResult<&PreparedText> {
        self.texts
            .get(id.0 as usize)
            .ok_or_else(|| VignetteError::evaluation(format!("unknown asset id {:?}", id)))
    }
}

fn resolve_font_bytes(font_source: Option<&str>, assets_root: &Path) -> VignetteResult<Vec<u8>> {
    if let Some(source) = font_source {
        let path = assets_root.join(source);
        return std::fs::read(&path).map_err(|e| {
            VignetteError::validation(format!("failed to read font '{}': {e}", path.display()))
        });
    }

    for candidate in SYSTEM_FONT_PATHS {
        if let Ok(bytes) = std::fs::read(candidate) {
            return Ok(bytes);
        }
    }

    Err(VignetteError::validation(
        "no usable font found: pass an explicit font file (--font) or install DejaVu/Liberation/Noto fonts",
    ))
}

/// Stateful helper for building parley text layouts from raw font bytes.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> VignetteResult<PreparedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(VignetteError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            VignetteError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VignetteError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let glyph_count = layout
            .lines()
            .map(|line| {
                line.items()
                    .filter_map(|item| match item {
                        parley::layout::PositionedLayoutItem::GlyphRun(run) => {
                            Some(run.glyphs().count())
                        }
                        _ => None,
                    })
                    .sum::<usize>()
            })
            .sum();

        Ok(PreparedText {
            width_px: layout.width(),
            height_px: layout.height(),
            glyph_count,
            layout: Arc::new(layout),
            font_bytes: Arc::new(font_bytes.to_vec()),
            font_family: family_name,
        })
    }
}
