pub type VignetteResult<T> = Result<T, VignetteError>;

#[derive(thiserror::Error, Debug)]
pub enum VignetteError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VignetteError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            VignetteError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            VignetteError::animation("x")
                .to_string()
                .contains("animation error:")
        );
        assert!(
            VignetteError::evaluation("x")
                .to_string()
                .contains("evaluation error:")
        );
        assert!(
            VignetteError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = VignetteError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
