//! Decode errors

use thiserror::Error;

/// Error returned by every decoder
///
/// Decoders fail on the first violation; a partially built font is never
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    /// Malformed, truncated or out-of-range structural data
    #[error("malformed font data: {0}")]
    Format(String),
    /// Unknown format tag, or no locatable font in the input
    #[error("unsupported font format: {0}")]
    UnsupportedFormat(String),
    /// Container parsed but holds no usable font resource
    #[error("font resource not found: {0}")]
    ResourceNotFound(String),
}

impl FontError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        FontError::Format(msg.into())
    }
}
