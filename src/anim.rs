use crate::{
    anim_ease::Ease,
    core::{FrameIndex, Transform2D, Vec2},
    error::{VignetteError, VignetteResult},
};

#[derive(Clone, Copy, Debug)]
pub struct SampleCtx {
    pub frame: FrameIndex,
    pub fps: crate::core::Fps,
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Transform2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            rotation_rad: a.rotation_rad + (b.rotation_rad - a.rotation_rad) * t,
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            anchor: <Vec2 as Lerp>::lerp(&a.anchor, &b.anchor, t),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Anim<T> {
    pub keys: Vec<Keyframe<T>>, // sorted by frame
    pub mode: InterpMode,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    pub frame: FrameIndex,
    pub value: T,
    pub ease: Ease, // ease applied toward the next key
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InterpMode {
    Hold,
    Linear,
}

impl<T> Anim<T>
where
    T: Lerp + Clone,
{
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                frame: FrameIndex(0),
                value,
                ease: Ease::Linear,
            }],
            mode: InterpMode::Hold,
        }
    }

    /// Append a key. Frames must be pushed in non-decreasing order;
    /// `validate` catches violations.
    pub fn key(&mut self, frame: FrameIndex, value: T, ease: Ease) {
        self.keys.push(Keyframe { frame, value, ease });
    }

    pub fn validate(&self) -> VignetteResult<()> {
        if self.keys.is_empty() {
            return Err(VignetteError::animation("Anim must have at least one key"));
        }
        if !self.keys.windows(2).all(|w| w[0].frame.0 <= w[1].frame.0) {
            return Err(VignetteError::animation("Anim keys must be sorted by frame"));
        }
        Ok(())
    }

    pub fn sample(&self, ctx: SampleCtx) -> VignetteResult<T> {
        if self.keys.is_empty() {
            return Err(VignetteError::animation("Anim has no keys"));
        }

        let f = ctx.frame.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);

        if idx == 0 {
            return Ok(self.keys[0].value.clone());
        }
        if idx >= self.keys.len() {
            return Ok(self.keys[self.keys.len() - 1].value.clone());
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 {
            return Ok(a.value.clone());
        }

        let t = ((f - a.frame.0) as f64) / (denom as f64);
        let te = a.ease.apply(t);
        match self.mode {
            InterpMode::Hold => Ok(a.value.clone()),
            InterpMode::Linear => Ok(T::lerp(&a.value, &b.value, te)),
        }
    }
}
