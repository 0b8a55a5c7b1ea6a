//! Error types split by when they surface.
//!
//! Builder errors are raised synchronously while a field's rules are being
//! declared. Mapping errors surface later, through the future returned by a
//! transform.

/// Error type for visor operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Builder errors
    #[error("Unknown permission level: {level}")]
    UnknownPermissionLevel { level: String },

    #[error("Accessor {accessor} is unsupported on a custom permission ranking")]
    UnsupportedDefaultAccessor { accessor: String },

    #[error("Unknown accessor: {0}")]
    UnknownAccessor(String),

    // Ranking errors
    #[error("Duplicate permission level in ranking: {level}")]
    DuplicatePermissionLevel { level: String },

    #[error("Permission ranking must contain at least one level")]
    EmptyRanking,

    // Mapping errors
    #[error("Unknown transformer: {0}")]
    UnknownTransformer(String),

    #[error("Transformer registry was dropped before {0} could be resolved")]
    RegistryDropped(String),

    #[error("Expected a list for field {field}, found {found}")]
    ExpectedList { field: String, found: String },

    #[error("Mapper error: {0}")]
    Mapper(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // System errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error was raised while declaring rules rather than while
    /// mapping a value.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::UnknownPermissionLevel { .. }
            | Error::UnsupportedDefaultAccessor { .. }
            | Error::UnknownAccessor(_)
            | Error::DuplicatePermissionLevel { .. }
            | Error::EmptyRanking
            | Error::Config(_) => true,

            Error::UnknownTransformer(_)
            | Error::RegistryDropped(_)
            | Error::ExpectedList { .. }
            | Error::Mapper(_)
            | Error::Io(_)
            | Error::Json(_) => false,
        }
    }

    pub(crate) fn unknown_level(level: impl std::fmt::Display) -> Self {
        Error::UnknownPermissionLevel {
            level: level.to_string(),
        }
    }
}

/// Result type alias using visor's Error.
pub type Result<T> = std::result::Result<T, Error>;
