//! Error types for s2-mosaic crates.

use thiserror::Error;

/// Result type alias using MosaicError.
pub type MosaicResult<T> = Result<T, MosaicError>;

/// Primary error type for mosaic operations.
#[derive(Debug, Error)]
pub enum MosaicError {
    // === Startup Errors ===
    #[error("failed to load grid definitions: {0}")]
    GridLoad(String),

    // === Request Errors ===
    #[error("invalid band name '{band}' (known bands: {known})")]
    InvalidBandName { band: String, known: String },

    #[error("invalid band math expression: {0}")]
    Expression(String),

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("no assets found for {0}")]
    NoAssetFound(String),

    // === Per-Asset Errors (recoverable during mosaic assembly) ===
    #[error("asset unreachable: {0}")]
    AssetUnreachable(String),

    #[error("requested geometry is outside asset bounds: {0}")]
    OutsideBounds(String),

    // === Data Errors ===
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    // === Rendering Errors ===
    #[error("rendering failed: {0}")]
    Render(String),
}

impl MosaicError {
    /// Create a GridLoad error.
    pub fn grid_load(msg: impl Into<String>) -> Self {
        Self::GridLoad(msg.into())
    }

    /// Create an Expression error.
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Create an AssetUnreachable error.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::AssetUnreachable(msg.into())
    }

    /// Create an OutsideBounds error.
    pub fn outside_bounds(msg: impl Into<String>) -> Self {
        Self::OutsideBounds(msg.into())
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create a Render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the mosaic engine may skip the failing cell and continue.
    ///
    /// Only per-asset conditions qualify: the archive is dynamic and a
    /// missing or unreachable asset is an expected state, not a fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MosaicError::AssetUnreachable(_) | MosaicError::OutsideBounds(_)
        )
    }

    /// Get the HTTP status code for this error (used by the serving layer).
    pub fn http_status_code(&self) -> u16 {
        match self {
            MosaicError::InvalidBandName { .. }
            | MosaicError::Expression(_)
            | MosaicError::InvalidParameter { .. } => 400,

            MosaicError::NoAssetFound(_) => 404,

            _ => 500,
        }
    }
}

impl From<serde_json::Error> for MosaicError {
    fn from(err: serde_json::Error) -> Self {
        MosaicError::GridLoad(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(MosaicError::unreachable("timeout").is_recoverable());
        assert!(MosaicError::outside_bounds("tile 9/0/0").is_recoverable());

        assert!(!MosaicError::grid_load("bad json").is_recoverable());
        assert!(!MosaicError::NoAssetFound("tile 9-482-164".into()).is_recoverable());
        assert!(!MosaicError::expression("unbalanced parens").is_recoverable());
    }

    #[test]
    fn test_http_status_codes() {
        let invalid = MosaicError::InvalidBandName {
            band: "B99".into(),
            known: "B02".into(),
        };
        assert_eq!(invalid.http_status_code(), 400);
        assert_eq!(
            MosaicError::NoAssetFound("point (0,0)".into()).http_status_code(),
            404
        );
        assert_eq!(MosaicError::unreachable("io").http_status_code(), 500);
    }
}
