use thiserror::Error;

/// Reasons a gentx fails the minimum-fee check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("gentx fee is empty")]
    EmptyFeeList,

    #[error("gentx fee amount is empty")]
    EmptyAmount,

    #[error("invalid gentx fee format: {amount}")]
    UnparseableAmount { amount: String },

    #[error("gentx fee is less than minimum required fee: {amount} / {minimum}")]
    BelowMinimum { amount: String, minimum: String },
}

impl FeeError {
    /// Stable machine-readable code for the failure.
    pub fn reason(&self) -> &'static str {
        match self {
            FeeError::EmptyFeeList => "empty-fee-list",
            FeeError::EmptyAmount => "empty-amount",
            FeeError::UnparseableAmount { .. } => "unparseable-amount",
            FeeError::BelowMinimum { .. } => "below-minimum",
        }
    }
}

/// Errors decoding a gentx document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("failed to parse gentx JSON: {reason}")]
    Parse { reason: String },
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Parse {
            reason: err.to_string(),
        }
    }
}
