//! Data models for Frankfurter API responses.
//!
//! This module contains strongly-typed representations of the rate
//! snapshot and rate series payloads, plus the currency code newtype they
//! are keyed by.

mod currency;
mod series;
mod snapshot;

pub use chrono::NaiveDate;
pub use currency::CurrencyCode;
pub use series::RateSeries;
pub use snapshot::RateSnapshot;
