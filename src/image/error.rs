//! Image rendering error types

use thiserror::Error;

/// Errors surfaced by the rendering pipeline
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("protocol disabled for rendering")]
    ProtocolDisabled,

    #[error("render failed: {0}")]
    RenderFailed(String),

    #[error("failed to decode image: {0}")]
    DecodeError(String),
}

impl ImageError {
    /// Whether the cache should be left untouched after this error. Every
    /// variant here leaves the cache unpopulated per spec.
    pub fn cache_populated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failed_message() {
        let err = ImageError::RenderFailed("panic in resize".to_string());
        assert!(err.to_string().contains("panic in resize"));
        assert!(!err.cache_populated());
    }
}
