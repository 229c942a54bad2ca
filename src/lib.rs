//! Currency conversion and historical rate charts for the
//! [Frankfurter](https://www.frankfurter.app/) exchange rate API.
//!
//! The crate fetches the latest rates and a date-range series, converts
//! amounts between any two quoted currencies through the shared base
//! currency, and reshapes the series into flat chart records. All
//! dashboard state lives in [`dashboard::DashboardState`], an immutable
//! value updated through pure transitions.

pub mod chart;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod models;
