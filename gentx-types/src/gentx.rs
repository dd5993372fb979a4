use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// A denomination and amount pair. The amount is a decimal string so large
/// token amounts survive decoding without truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    #[serde(default)]
    pub denom: String,
    #[serde(default)]
    pub amount: String,
}

/// The `fee` section of a transaction's auth info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub amount: Vec<Coin>,
}

/// Signer and fee information of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub fee: Fee,
}

/// A genesis transaction submitted by a prospective validator.
///
/// Only the parts needed for validation are modelled; everything else in the
/// document is ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GentxDocument {
    #[serde(default)]
    pub auth_info: AuthInfo,
}

impl GentxDocument {
    /// Decode a gentx from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Fee entries in document order.
    pub fn fees(&self) -> &[Coin] {
        &self.auth_info.fee.amount
    }

    /// The fee entry the minimum-fee check applies to.
    pub fn first_fee(&self) -> Option<&Coin> {
        self.fees().first()
    }
}
