//! Domain error types.

/// Top-level error type for folioback.
#[derive(Debug, thiserror::Error)]
pub enum FoliobackError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("constraint violation: {reason}")]
    ConstraintViolation { reason: String },

    #[error("insufficient holdings in {ticker}: have {held}, tried to sell {requested}")]
    InsufficientHoldings {
        ticker: String,
        held: i64,
        requested: i64,
    },

    #[error("insufficient funds in account {account}: balance {balance}, order requires {required}")]
    InsufficientFunds {
        account: i64,
        balance: f64,
        required: f64,
    },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FoliobackError {
    /// True for failures worth retrying after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, FoliobackError::StorageUnavailable { .. })
    }
}

impl From<&FoliobackError> for std::process::ExitCode {
    fn from(err: &FoliobackError) -> Self {
        let code: u8 = match err {
            FoliobackError::Io(_) => 1,
            FoliobackError::ConfigParse { .. }
            | FoliobackError::ConfigMissing { .. }
            | FoliobackError::ConfigInvalid { .. } => 2,
            FoliobackError::StorageUnavailable { .. } | FoliobackError::Database { .. } => 3,
            FoliobackError::InvalidOrder { .. } => 4,
            FoliobackError::NotFound { .. }
            | FoliobackError::ConstraintViolation { .. }
            | FoliobackError::InsufficientHoldings { .. }
            | FoliobackError::InsufficientFunds { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
