/// Convenience result type used across pixreel.
pub type PixreelResult<T> = Result<T, PixreelError>;

/// Top-level error taxonomy used by timeline and compositor APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixreelError {
    /// Invalid user-provided values (frame counts, durations, buffer sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Rejected keyframe edits (occupied or out-of-range targets).
    #[error("keyframe error: {0}")]
    Keyframe(String),

    /// A reel, audio file or image could not be resolved.
    #[error("resource error: {0}")]
    Resource(String),

    /// Errors while producing pixels for a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing project data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixreelError {
    /// Build a [`PixreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixreelError::Keyframe`] value.
    pub fn keyframe(msg: impl Into<String>) -> Self {
        Self::Keyframe(msg.into())
    }

    /// Build a [`PixreelError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`PixreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PixreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for PixreelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
