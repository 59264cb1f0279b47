use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::cache::Cache;
use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, Result as RateResult};
use crate::core::rates::RateSource;
use crate::providers::util::with_retry;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Direct rates from the Yahoo Finance chart endpoint (`{FROM}{TO}=X` symbols).
pub struct YahooRateSource {
    base_url: String,
    rates: Arc<Cache<String, f64>>,
    retries: usize,
    retry_delay_ms: u64,
}

impl YahooRateSource {
    pub fn new(base_url: &str, rates: Arc<Cache<String, f64>>) -> Self {
        YahooRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            rates,
            retries: 2,
            retry_delay_ms: 500,
        }
    }

    pub fn with_retries(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    #[instrument(name = "YahooRateFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_rate(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder().user_agent("xrate/1.0").build()?;
        let response = with_retry(|| client.get(&url).send(), self.retries, self.retry_delay_ms)
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        let rate = item.meta.regular_market_price;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(anyhow!("Invalid rate {} for currency pair: {}", rate, symbol));
        }
        Ok(rate)
    }
}

fn pair_symbol(from: &CurrencyCode, to: &CurrencyCode) -> String {
    format!("{from}{to}=X")
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl RateSource for YahooRateSource {
    async fn refresh(&self, currencies: &[CurrencyCode]) -> RateResult<()> {
        let Some((reference, targets)) = currencies.split_first() else {
            debug!("No currencies to refresh");
            return Ok(());
        };
        info!(reference = %reference, targets = targets.len(), "Refreshing Yahoo rates");
        for target in targets.iter().filter(|t| *t != reference) {
            let symbol = pair_symbol(reference, target);
            match self.fetch_rate(&symbol).await {
                Ok(rate) => self.rates.put(symbol, rate).await,
                Err(e) => {
                    self.rates.remove(&symbol).await;
                    return Err(RateError::unavailable(reference, target, e));
                }
            }
        }
        Ok(())
    }

    async fn get_direct_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> RateResult<f64> {
        if from == to {
            return Ok(1.0);
        }
        self.rates
            .get(&pair_symbol(from, to))
            .await
            .ok_or_else(|| RateError::unavailable(from, to, "not fetched by the last refresh"))
    }
}
