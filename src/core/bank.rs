//! Currency conversion backed by a rate store

use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, Result};
use crate::core::rates::RateStore;
use std::sync::Arc;
use tracing::debug;

/// Converts amounts using whatever rates are currently in the store.
pub struct Bank {
    store: Arc<dyn RateStore>,
}

impl Bank {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    pub async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        if from == to {
            return Ok(1.0);
        }
        let stored = self
            .store
            .get_rate(from, to)
            .await?
            .ok_or_else(|| RateError::unavailable(from, to, "rate not in store"))?;
        debug!("Using stored rate {}/{} = {}", from, to, stored.rate);
        Ok(stored.rate)
    }

    pub async fn exchange(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64> {
        Ok(amount * self.get_rate(from, to).await?)
    }
}
