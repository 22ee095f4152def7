use thiserror::Error;

use crate::image::ImageId;

pub type Result<T> = std::result::Result<T, MarqueeError>;

/// Errors surfaced by the marquee engine.
///
/// Individual image failures and partial timeouts are recovered inside the
/// loader and never show up here; only outcomes that make the whole effect
/// impossible (or misuse of the API) do.
#[derive(Debug, Error)]
pub enum MarqueeError {
    #[error("no images loaded")]
    NoImages,

    #[error("unknown image id: {id}")]
    UnknownImage { id: ImageId },

    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not ready: {what}")]
    NotReady { what: &'static str },

    #[error("session already started")]
    AlreadyStarted,
}

impl MarqueeError {
    #[must_use]
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error means "skip the effect" rather than a caller bug.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoImages)
    }
}
