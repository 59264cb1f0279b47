//! Rate source and rate store abstractions

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supplies direct rates from a reference currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Updates the source's table of direct rates from the first of
    /// `currencies` to each of the others. An empty list refreshes nothing.
    async fn refresh(&self, currencies: &[CurrencyCode]) -> Result<()>;

    /// Returns the last known direct rate. Must be strictly positive.
    async fn get_direct_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64>;
}

/// Lookup table of rates keyed by ordered currency pair.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Overwrites the rate for `(from, to)`.
    async fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) -> Result<()>;

    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Option<StoredRate>>;

    async fn all_rates(&self) -> Result<Vec<(CurrencyCode, CurrencyCode, StoredRate)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredRate {
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

impl StoredRate {
    pub fn now(rate: f64) -> Self {
        StoredRate {
            rate,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
}

/// Scaling factors for specific ordered pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Multipliers(HashMap<(CurrencyCode, CurrencyCode), f64>);

impl Multipliers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from: CurrencyCode, to: CurrencyCode, factor: f64) -> Self {
        self.0.insert((from, to), factor);
        self
    }

    /// Factor for the exact ordered pair, 1.0 when not configured.
    pub fn factor(&self, from: &CurrencyCode, to: &CurrencyCode) -> f64 {
        self.0
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(1.0)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CurrencyCode, CurrencyCode, f64)> for Multipliers {
    fn from_iter<T: IntoIterator<Item = (CurrencyCode, CurrencyCode, f64)>>(iter: T) -> Self {
        Multipliers(
            iter.into_iter()
                .map(|(from, to, factor)| ((from, to), factor))
                .collect(),
        )
    }
}
