use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::config::FixedProviderConfig;
use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, Result};
use crate::core::rates::RateSource;

/// Direct rates taken from configuration instead of a remote feed.
#[derive(Debug, Clone)]
pub struct FixedRateSource {
    reference: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
}

impl FixedRateSource {
    pub fn new(reference: CurrencyCode, rates: BTreeMap<CurrencyCode, f64>) -> Self {
        Self { reference, rates }
    }

    fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        if from == to {
            return Ok(1.0);
        }
        if from != &self.reference {
            return Err(RateError::unavailable(
                from,
                to,
                format!("fixed rates are quoted from {}", self.reference),
            ));
        }
        self.rates
            .get(to)
            .copied()
            .ok_or_else(|| RateError::unavailable(from, to, "no fixed rate configured"))
    }
}

impl From<&FixedProviderConfig> for FixedRateSource {
    fn from(config: &FixedProviderConfig) -> Self {
        FixedRateSource::new(config.reference.clone(), config.rates.clone())
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    /// Nothing to fetch; fails early when a requested pair has no configured rate.
    async fn refresh(&self, currencies: &[CurrencyCode]) -> Result<()> {
        let Some((reference, targets)) = currencies.split_first() else {
            return Ok(());
        };
        for target in targets {
            self.rate(reference, target)?;
        }
        debug!("Fixed rates cover {} targets of {}", targets.len(), reference);
        Ok(())
    }

    async fn get_direct_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        self.rate(from, to)
    }
}
