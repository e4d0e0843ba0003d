//! Error handling primitives shared across the core.
//!
//! Every fallible operation returns [`CropResult`]. The [`ErrorCode`] table is
//! what crosses the FFI boundary, so its numeric values must never be reused.
//!
//! TODO: Give `InvalidConfig` its own code instead of sharing `InvalidInput`.

use std::io;

/// Stable error codes that cross the FFI boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Crop name was not part of the training set.
    UnknownCategory = 1,
    /// Prediction or introspection requested before a successful fit.
    NotTrained = 2,
    /// Too few rows, or a constant target, for the split/CV scheme.
    InsufficientData = 3,
    /// Input record lacks a required key.
    MissingField = 4,
    /// Input failed validation.
    InvalidInput = 5,
    /// Stored artifact does not match the running feature schema or is incomplete.
    Artifact = 6,
    /// Filesystem or serialization failure.
    Io = 7,
}

/// Canonical error type for the core.
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("unknown crop category: {crop}")]
    UnknownCategory { crop: String },

    #[error("pipeline is not trained")]
    NotTrained,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("missing field: {field}")]
    MissingField { field: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("feature schema mismatch: artifact has {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type CropResult<T> = Result<T, CropError>;

impl CropError {
    pub fn unknown_category(crop: impl Into<String>) -> Self {
        Self::UnknownCategory { crop: crop.into() }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownCategory { .. } => ErrorCode::UnknownCategory,
            Self::NotTrained => ErrorCode::NotTrained,
            Self::InsufficientData(_) => ErrorCode::InsufficientData,
            Self::MissingField { .. } => ErrorCode::MissingField,
            Self::InvalidInput(_) | Self::InvalidConfig(_) => ErrorCode::InvalidInput,
            Self::SchemaMismatch { .. } | Self::Artifact(_) => ErrorCode::Artifact,
            Self::Io(_) | Self::Json(_) => ErrorCode::Io,
        }
    }
}
