pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy for a render call.
///
/// Resolution and cache failures are normally recovered inside the image resolver and only
/// surface here when a caller asks for them explicitly. `NothingToRender` and `Encoding` are the
/// two fatal outcomes a caller sees from a failed render.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("cache io error: {0}")]
    CacheIo(String),

    #[error("composition error: {0}")]
    Composition(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("nothing to render: {0}")]
    NothingToRender(String),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn cache_io(msg: impl Into<String>) -> Self {
        Self::CacheIo(msg.into())
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn nothing_to_render(msg: impl Into<String>) -> Self {
        Self::NothingToRender(msg.into())
    }

    /// `true` for the "no content" class of failure, as opposed to an encoder fault.
    pub fn is_nothing_to_render(&self) -> bool {
        matches!(self, Self::NothingToRender(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
