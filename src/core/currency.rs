//! Currency codes, identifiers and their normalization

use crate::core::error::{RateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

/// An uppercase ISO 4217 style three letter code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Uppercases `raw` and checks that it has the shape of a currency code.
    /// Whether the code is actually known is up to a [`CurrencyResolver`].
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code))
        } else {
            Err(RateError::UnresolvedCurrency(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RateError;

    fn try_from(value: String) -> Result<Self> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Currency metadata as known by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    code: CurrencyCode,
    name: &'static str,
    minor_units: u8,
}

impl Currency {
    pub fn code(&self) -> &CurrencyCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn minor_units(&self) -> u8 {
        self.minor_units
    }
}

/// Any of the accepted ways of naming a currency.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyId {
    Text(String),
    Code(CurrencyCode),
    Currency(Currency),
}

impl CurrencyId {
    fn raw_code(&self) -> String {
        match self {
            CurrencyId::Text(text) => text.trim().to_ascii_uppercase(),
            CurrencyId::Code(code) => code.as_str().to_string(),
            CurrencyId::Currency(currency) => currency.code().as_str().to_string(),
        }
    }
}

impl Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyId::Text(text) => f.write_str(text),
            CurrencyId::Code(code) => write!(f, "{code}"),
            CurrencyId::Currency(currency) => write!(f, "{}", currency.code()),
        }
    }
}

impl From<&str> for CurrencyId {
    fn from(value: &str) -> Self {
        CurrencyId::Text(value.to_string())
    }
}

impl From<String> for CurrencyId {
    fn from(value: String) -> Self {
        CurrencyId::Text(value)
    }
}

impl From<CurrencyCode> for CurrencyId {
    fn from(value: CurrencyCode) -> Self {
        CurrencyId::Code(value)
    }
}

impl From<&CurrencyCode> for CurrencyId {
    fn from(value: &CurrencyCode) -> Self {
        CurrencyId::Code(value.clone())
    }
}

impl From<Currency> for CurrencyId {
    fn from(value: Currency) -> Self {
        CurrencyId::Currency(value)
    }
}

/// Maps a code to known currency metadata.
pub trait CurrencyResolver: Send + Sync {
    fn resolve(&self, code: &str) -> Option<Currency>;
}

// (code, name, minor units)
const ISO_CURRENCIES: &[(&str, &str, u8)] = &[
    ("AED", "UAE Dirham", 2),
    ("ARS", "Argentine Peso", 2),
    ("AUD", "Australian Dollar", 2),
    ("BGN", "Bulgarian Lev", 2),
    ("BHD", "Bahraini Dinar", 3),
    ("BRL", "Brazilian Real", 2),
    ("CAD", "Canadian Dollar", 2),
    ("CHF", "Swiss Franc", 2),
    ("CLP", "Chilean Peso", 0),
    ("CNY", "Yuan Renminbi", 2),
    ("COP", "Colombian Peso", 2),
    ("CZK", "Czech Koruna", 2),
    ("DKK", "Danish Krone", 2),
    ("EGP", "Egyptian Pound", 2),
    ("EUR", "Euro", 2),
    ("GBP", "Pound Sterling", 2),
    ("HKD", "Hong Kong Dollar", 2),
    ("HUF", "Forint", 2),
    ("IDR", "Rupiah", 2),
    ("ILS", "New Israeli Sheqel", 2),
    ("INR", "Indian Rupee", 2),
    ("ISK", "Iceland Krona", 0),
    ("JPY", "Yen", 0),
    ("KRW", "Won", 0),
    ("KWD", "Kuwaiti Dinar", 3),
    ("MXN", "Mexican Peso", 2),
    ("MYR", "Malaysian Ringgit", 2),
    ("NGN", "Naira", 2),
    ("NOK", "Norwegian Krone", 2),
    ("NZD", "New Zealand Dollar", 2),
    ("PHP", "Philippine Peso", 2),
    ("PKR", "Pakistan Rupee", 2),
    ("PLN", "Zloty", 2),
    ("RON", "Romanian Leu", 2),
    ("SAR", "Saudi Riyal", 2),
    ("SEK", "Swedish Krona", 2),
    ("SGD", "Singapore Dollar", 2),
    ("THB", "Baht", 2),
    ("TRY", "Turkish Lira", 2),
    ("TWD", "New Taiwan Dollar", 2),
    ("USD", "US Dollar", 2),
    ("VND", "Dong", 0),
    ("ZAR", "Rand", 2),
];

static ISO_TABLE: OnceLock<HashMap<&'static str, (&'static str, u8)>> = OnceLock::new();

fn iso_table() -> &'static HashMap<&'static str, (&'static str, u8)> {
    ISO_TABLE.get_or_init(|| {
        ISO_CURRENCIES
            .iter()
            .map(|(code, name, minor)| (*code, (*name, *minor)))
            .collect()
    })
}

/// Resolver backed by a static table of ISO 4217 currencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoCurrencyResolver;

impl CurrencyResolver for IsoCurrencyResolver {
    fn resolve(&self, code: &str) -> Option<Currency> {
        let code = CurrencyCode::parse(code).ok()?;
        iso_table()
            .get(code.as_str())
            .map(|&(name, minor_units)| Currency {
                code,
                name,
                minor_units,
            })
    }
}

/// Looks up `code` in the ISO table.
pub fn find_currency(code: &str) -> Option<Currency> {
    IsoCurrencyResolver.resolve(code)
}

/// Turns identifiers into codes, keeping input order and dropping repeats.
pub fn normalize_currencies(
    ids: &[CurrencyId],
    resolver: &dyn CurrencyResolver,
) -> Result<Vec<CurrencyCode>> {
    let mut codes: Vec<CurrencyCode> = Vec::with_capacity(ids.len());
    for id in ids {
        let code = normalize_currency(id, resolver)?;
        if codes.contains(&code) {
            debug!("Dropping repeated currency {}", code);
            continue;
        }
        codes.push(code);
    }
    Ok(codes)
}

pub fn normalize_currency(
    id: &CurrencyId,
    resolver: &dyn CurrencyResolver,
) -> Result<CurrencyCode> {
    resolver
        .resolve(&id.raw_code())
        .map(|currency| currency.code)
        .ok_or_else(|| RateError::UnresolvedCurrency(id.to_string()))
}
