//! Error taxonomy for rate derivation

use crate::core::currency::CurrencyCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RateError>;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("Unknown currency: {0}")]
    UnresolvedCurrency(String),

    #[error("No rate available for {from}/{to}: {reason}")]
    RateUnavailable {
        from: CurrencyCode,
        to: CurrencyCode,
        reason: String,
    },

    #[error("Failed to store rate {from}/{to}: {reason}")]
    StoreWrite {
        from: CurrencyCode,
        to: CurrencyCode,
        reason: String,
    },

    #[error("Failed to read rates: {0}")]
    StoreRead(String),
}

impl RateError {
    pub fn unavailable(from: &CurrencyCode, to: &CurrencyCode, reason: impl ToString) -> Self {
        RateError::RateUnavailable {
            from: from.clone(),
            to: to.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn store_write(from: &CurrencyCode, to: &CurrencyCode, reason: impl ToString) -> Self {
        RateError::StoreWrite {
            from: from.clone(),
            to: to.clone(),
            reason: reason.to_string(),
        }
    }
}
