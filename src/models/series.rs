//! Historical rate series model.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;
use super::snapshot::default_amount;

/// Rate tables indexed by date over a requested window.
///
/// Only `rates` is required; the remaining fields echo the request and
/// are tolerated when absent. Dates without publications (weekends,
/// holidays) are simply missing from `rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSeries {
    /// Amount of the base currency the rates are quoted for.
    #[serde(default = "default_amount")]
    pub amount: f64,
    /// Currency all rates are relative to.
    #[serde(default)]
    pub base: Option<CurrencyCode>,
    /// First date actually covered by the series.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last date actually covered by the series.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Rate table for each published date.
    pub rates: BTreeMap<NaiveDate, BTreeMap<CurrencyCode, f64>>,
}

impl RateSeries {
    /// Returns `true` if the series contains no dates.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Returns the number of dates in the series.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }
}
