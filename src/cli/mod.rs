pub mod convert;
pub mod rates;
pub mod setup;
pub mod sync;
pub mod ui;
