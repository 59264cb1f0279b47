pub mod fixed;
pub mod util;
pub mod yahoo_finance;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::rates::RateSource;
use fixed::FixedRateSource;
use std::sync::Arc;
use tracing::debug;
use yahoo_finance::YahooRateSource;

/// Builds the rate source named by the configuration. Fixed rates win over
/// Yahoo when both are configured.
pub fn default_rate_source(config: &AppConfig) -> Arc<dyn RateSource> {
    if let Some(fixed) = &config.providers.fixed {
        debug!("Using fixed rate source quoted from {}", fixed.reference);
        return Arc::new(FixedRateSource::from(fixed));
    }

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or(yahoo_finance::DEFAULT_BASE_URL, |p| p.base_url.as_str());
    debug!("Using Yahoo rate source at {}", base_url);
    Arc::new(YahooRateSource::new(base_url, Arc::new(Cache::new())))
}
