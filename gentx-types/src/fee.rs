use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FeeError;
use crate::gentx::GentxDocument;

/// Parse a base-10 amount made only of ASCII digits.
fn parse_amount(amount: &str) -> Option<BigUint> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(amount.as_bytes(), 10)
}

/// The smallest fee amount a gentx may carry.
///
/// Compared numerically against the first fee entry only. No denomination
/// conversion happens, so the configured value must be expressed in the same
/// unit the gentx fees use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinimumFee(BigUint);

impl MinimumFee {
    pub fn new(amount: BigUint) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> &BigUint {
        &self.0
    }
}

impl Default for MinimumFee {
    fn default() -> Self {
        Self(parse_amount(crate::constants::DEFAULT_MIN_FEE).unwrap_or_default())
    }
}

impl FromStr for MinimumFee {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s)
            .map(MinimumFee)
            .ok_or_else(|| FeeError::UnparseableAmount {
                amount: s.to_string(),
            })
    }
}

impl fmt::Display for MinimumFee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for MinimumFee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for MinimumFee {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A fee that passed the minimum check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFee {
    pub denom: String,
    pub amount: BigUint,
}

/// Enforces the minimum-fee invariant on gentx documents.
#[derive(Debug, Clone, Default)]
pub struct FeeValidator {
    minimum: MinimumFee,
}

impl FeeValidator {
    pub fn new(minimum: MinimumFee) -> Self {
        Self { minimum }
    }

    pub fn minimum(&self) -> &MinimumFee {
        &self.minimum
    }

    /// Check the document's first fee entry against the minimum.
    ///
    /// Equality passes. Any further entries are ignored.
    pub fn validate(&self, document: &GentxDocument) -> Result<CheckedFee, FeeError> {
        let fee = document.first_fee().ok_or(FeeError::EmptyFeeList)?;
        if fee.amount.is_empty() {
            return Err(FeeError::EmptyAmount);
        }

        let amount = parse_amount(&fee.amount).ok_or_else(|| FeeError::UnparseableAmount {
            amount: fee.amount.clone(),
        })?;

        if amount < *self.minimum.amount() {
            return Err(FeeError::BelowMinimum {
                amount: fee.amount.clone(),
                minimum: self.minimum.to_string(),
            });
        }

        Ok(CheckedFee {
            denom: fee.denom.clone(),
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gentx::{AuthInfo, Coin, Fee};

    fn doc_with_fees(fees: &[(&str, &str)]) -> GentxDocument {
        GentxDocument {
            auth_info: AuthInfo {
                fee: Fee {
                    amount: fees
                        .iter()
                        .map(|(denom, amount)| Coin {
                            denom: denom.to_string(),
                            amount: amount.to_string(),
                        })
                        .collect(),
                },
            },
        }
    }

    fn validator(min: &str) -> FeeValidator {
        FeeValidator::new(min.parse().unwrap())
    }

    #[test]
    fn test_default_minimum() {
        let v = FeeValidator::default();
        assert_eq!(v.minimum().to_string(), "180000000000000000");
    }

    #[test]
    fn test_equal_to_minimum_passes() {
        let v = FeeValidator::default();
        let doc = doc_with_fees(&[("award", "180000000000000000")]);
        let checked = v.validate(&doc).unwrap();
        assert_eq!(checked.denom, "award");
        assert_eq!(checked.amount.to_string(), "180000000000000000");
    }

    #[test]
    fn test_one_below_minimum_fails() {
        let v = FeeValidator::default();
        let doc = doc_with_fees(&[("award", "179999999999999999")]);
        let err = v.validate(&doc).unwrap_err();
        assert_eq!(err.reason(), "below-minimum");
    }

    #[test]
    fn test_above_minimum_passes() {
        let v = FeeValidator::default();
        let doc = doc_with_fees(&[("award", "1000000000000000000000000000000")]);
        assert!(v.validate(&doc).is_ok());
    }

    #[test]
    fn test_amount_beyond_u128_compares_correctly() {
        let v = validator("340282366920938463463374607431768211456"); // 2^128
        let below = doc_with_fees(&[("award", "340282366920938463463374607431768211455")]);
        let equal = doc_with_fees(&[("award", "340282366920938463463374607431768211456")]);
        assert_eq!(v.validate(&below).unwrap_err().reason(), "below-minimum");
        assert!(v.validate(&equal).is_ok());
    }

    #[test]
    fn test_non_numeric_amount_is_unparseable() {
        let v = FeeValidator::default();
        for bad in ["abc", "1.5", "-5", "+5", " 5", "1e18", "1_000"] {
            let doc = doc_with_fees(&[("award", bad)]);
            let err = v.validate(&doc).unwrap_err();
            assert_eq!(err.reason(), "unparseable-amount", "amount {bad:?}");
        }
    }

    #[test]
    fn test_empty_fee_list_fails() {
        let v = validator("0");
        let err = v.validate(&GentxDocument::default()).unwrap_err();
        assert_eq!(err, FeeError::EmptyFeeList);
    }

    #[test]
    fn test_empty_amount_fails() {
        let v = validator("0");
        let doc = doc_with_fees(&[("award", "")]);
        assert_eq!(v.validate(&doc).unwrap_err(), FeeError::EmptyAmount);
    }

    #[test]
    fn test_only_first_entry_is_checked() {
        let v = validator("100");
        let first_low = doc_with_fees(&[("award", "99"), ("uusdc", "1000")]);
        let first_high = doc_with_fees(&[("award", "100"), ("uusdc", "1")]);
        assert!(v.validate(&first_low).is_err());
        assert!(v.validate(&first_high).is_ok());
    }

    #[test]
    fn test_minimum_fee_parse_rejects_garbage() {
        assert!("12x".parse::<MinimumFee>().is_err());
        assert!("".parse::<MinimumFee>().is_err());
        assert_eq!("007".parse::<MinimumFee>().unwrap().to_string(), "7");
    }

    #[test]
    fn test_minimum_fee_serde_as_string() {
        let min: MinimumFee = "180000000000000000".parse().unwrap();
        let json = serde_json::to_string(&min).unwrap();
        assert_eq!(json, "\"180000000000000000\"");
        let back: MinimumFee = serde_json::from_str(&json).unwrap();
        assert_eq!(back, min);
        assert!(serde_json::from_str::<MinimumFee>("\"nope\"").is_err());
    }
}
