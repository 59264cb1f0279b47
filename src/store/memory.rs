use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use crate::core::rates::{RateStore, StoredRate};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory rate store keyed by ordered currency pair.
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<Mutex<HashMap<(CurrencyCode, CurrencyCode), StoredRate>>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) -> Result<()> {
        let mut rates = self.inner.lock().await;
        debug!("Rate PUT for {}/{}", from, to);
        rates.insert((from.clone(), to.clone()), StoredRate::now(rate));
        Ok(())
    }

    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Option<StoredRate>> {
        let rates = self.inner.lock().await;
        Ok(rates.get(&(from.clone(), to.clone())).copied())
    }

    async fn all_rates(&self) -> Result<Vec<(CurrencyCode, CurrencyCode, StoredRate)>> {
        let rates = self.inner.lock().await;
        let mut all: Vec<_> = rates
            .iter()
            .map(|((from, to), stored)| (from.clone(), to.clone(), *stored))
            .collect();
        all.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        Ok(all)
    }
}
