//! Core rate model, derivation and conversion

pub mod bank;
pub mod cache;
pub mod config;
pub mod currency;
pub mod derive;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use bank::Bank;
pub use currency::{Currency, CurrencyCode, CurrencyId, CurrencyResolver, IsoCurrencyResolver};
pub use derive::CrossRateDeriver;
pub use error::RateError;
pub use rates::{DerivedRate, Multipliers, RateSource, RateStore, StoredRate};
