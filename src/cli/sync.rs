use super::{rates::rate_matrix_table, ui};
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyId;
use crate::store::open_rate_store;
use crate::sync::{RateRequest, RateSync, SyncReport};
use anyhow::{Result, bail};
use tracing::debug;

/// Builds the request from command line values, falling back to the config.
pub fn build_request(
    config: &AppConfig,
    currencies: Vec<String>,
    reference: Option<String>,
) -> Result<RateRequest> {
    let currencies: Vec<CurrencyId> = if currencies.is_empty() {
        debug!("Using currencies from config");
        config.currencies.iter().map(CurrencyId::from).collect()
    } else {
        currencies.into_iter().map(CurrencyId::from).collect()
    };
    if currencies.is_empty() {
        bail!("No currencies given and none configured");
    }

    let request = RateRequest::new(currencies);
    let reference: Option<CurrencyId> = reference
        .map(CurrencyId::from)
        .or_else(|| config.reference.as_ref().map(CurrencyId::from));
    Ok(match reference {
        Some(reference) => request.reference(reference),
        None => request,
    })
}

/// Runs one derivation pass and prints the resulting matrix.
pub async fn run(
    config: &AppConfig,
    currencies: Vec<String>,
    reference: Option<String>,
) -> Result<SyncReport> {
    let request = build_request(config, currencies, reference)?;
    let sync = RateSync::from_config(config, open_rate_store(config)?);

    let spinner = ui::new_spinner("Fetching exchange rates");
    let result = sync.derive_and_store(request).await;
    spinner.finish_and_clear();
    let report = result?;

    let rates = sync.store().all_rates().await?;
    println!(
        "{}\n",
        ui::style_text(
            &format!("Stored {} rates for {} currencies", report.writes, report.currencies.len()),
            ui::StyleType::Title
        )
    );
    println!("{}", rate_matrix_table(&report.currencies, &rates));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;

    fn config(yaml: &str) -> AppConfig {
        AppConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_cli_currencies_override_config() {
        let config = config("currencies: [GBP, JPY]\nreference: GBP\n");
        let request = build_request(
            &config,
            vec!["eur".into(), "usd".into()],
            Some("usd".into()),
        )
        .unwrap();

        assert_eq!(
            request.currencies(),
            &[CurrencyId::from("eur"), CurrencyId::from("usd")]
        );
        assert_eq!(request.reference_currency(), Some(&CurrencyId::from("usd")));
    }

    #[test]
    fn test_falls_back_to_config() {
        let config = config("currencies: [GBP, JPY]\nreference: JPY\n");
        let request = build_request(&config, vec![], None).unwrap();

        let gbp: CurrencyCode = "GBP".parse().unwrap();
        let jpy: CurrencyCode = "JPY".parse().unwrap();
        assert_eq!(
            request.currencies(),
            &[CurrencyId::from(gbp), CurrencyId::from(jpy.clone())]
        );
        assert_eq!(request.reference_currency(), Some(&CurrencyId::from(jpy)));
    }

    #[test]
    fn test_no_currencies_anywhere() {
        let err = build_request(&AppConfig::default(), vec![], None).unwrap_err();
        assert!(err.to_string().contains("No currencies given"));
    }
}
