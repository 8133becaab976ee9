//! Domain error types.

/// Top-level error type for tradelens.
#[derive(Debug, thiserror::Error)]
pub enum TradelensError {
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("insufficient data: have {have} points, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradelensError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        TradelensError::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        TradelensError::Data {
            reason: reason.into(),
        }
    }
}

/// Fails with `DimensionMismatch` unless `actual == expected`.
pub fn ensure_same_len(expected: usize, actual: usize) -> Result<(), TradelensError> {
    if expected != actual {
        return Err(TradelensError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Fails with `InsufficientData` when fewer than `need` points are available.
pub fn ensure_len(have: usize, need: usize) -> Result<(), TradelensError> {
    if have < need {
        return Err(TradelensError::InsufficientData { have, need });
    }
    Ok(())
}

impl From<&TradelensError> for std::process::ExitCode {
    fn from(err: &TradelensError) -> Self {
        let code: u8 = match err {
            TradelensError::Io(_) | TradelensError::Report { .. } => 1,
            TradelensError::ConfigParse { .. }
            | TradelensError::ConfigMissing { .. }
            | TradelensError::ConfigInvalid { .. } => 2,
            TradelensError::Data { .. } => 3,
            TradelensError::InvalidParameter { .. } | TradelensError::DimensionMismatch { .. } => 4,
            TradelensError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
