use super::ui;
use crate::core::bank::Bank;
use crate::core::config::AppConfig;
use crate::core::currency::{Currency, find_currency};
use crate::store::open_rate_store;
use anyhow::{Context, Result};

fn lookup_currency(code: &str) -> Result<Currency> {
    find_currency(code).with_context(|| format!("Unknown currency: {code}"))
}

/// Formats `amount` with the currency's number of minor units.
pub fn format_amount(amount: f64, currency: &Currency) -> String {
    format!(
        "{:.*} {}",
        currency.minor_units() as usize,
        amount,
        currency.code()
    )
}

/// Converts `amount` using the stored rate for `from -> to`.
pub async fn run(config: &AppConfig, amount: f64, from: &str, to: &str) -> Result<()> {
    let from = lookup_currency(from)?;
    let to = lookup_currency(to)?;

    let bank = Bank::new(open_rate_store(config)?);
    let converted = bank.exchange(amount, from.code(), to.code()).await?;

    println!(
        "{} = {}",
        format_amount(amount, &from),
        ui::style_text(&format_amount(converted, &to), ui::StyleType::Value)
    );
    Ok(())
}
