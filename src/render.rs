use crate::{assets::PreparedAssetStore, compile::RenderPlan, error::VignetteResult};

/// One rendered frame: tightly packed rows of premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Straight (non-premultiplied) RGBA; overrides the plan's
    /// background when set.
    pub clear_rgba: Option<[u8; 4]>,
}

pub trait RenderBackend {
    fn render_plan(
        &mut self,
        plan: &RenderPlan,
        assets: &PreparedAssetStore,
    ) -> VignetteResult<FrameRGBA>;
}
