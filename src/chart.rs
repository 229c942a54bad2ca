//! Projection of a [`RateSeries`] into chart-ready records.
//!
//! A chart wants one flat row per x-axis point: `{ date, USD: 1.1, ... }`.
//! [`project`] produces those rows and [`line`] picks the single plotted
//! currency out of them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CurrencyCode, RateSeries};

/// One chart row: a date plus the rate of every currency published on it.
///
/// Serializes to a flat JSON object, e.g.
/// `{"date": "2022-01-01", "EUR": 1.0, "USD": 1.1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    /// X-axis value.
    pub date: NaiveDate,
    /// Rate of each currency on `date`.
    #[serde(flatten)]
    pub rates: BTreeMap<CurrencyCode, f64>,
}

impl ChartRecord {
    /// Returns the rate of `code` on this record's date.
    #[inline]
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

/// A single plotted line: one currency's rate at every record date.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    /// Currency the line plots.
    pub currency: CurrencyCode,
    /// `(date, rate)` points; `None` where the currency was not quoted.
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl ChartLine {
    /// Returns the points that carry a rate.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|&(date, rate)| rate.map(|value| (date, value)))
    }

    /// Returns the lowest and highest rate on the line, if any.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values().fold(None, |acc, (_, value)| match acc {
            None => Some((value, value)),
            Some((low, high)) => Some((low.min(value), high.max(value))),
        })
    }
}

/// Flattens a series into one record per date, in the series' date order.
#[inline]
#[must_use]
pub fn project(series: &RateSeries) -> Vec<ChartRecord> {
    series
        .rates
        .iter()
        .map(|(date, rates)| ChartRecord {
            date: *date,
            rates: rates.clone(),
        })
        .collect()
}

/// Extracts the line for `currency` from projected records.
#[inline]
#[must_use]
pub fn line(records: &[ChartRecord], currency: &CurrencyCode) -> ChartLine {
    ChartLine {
        currency: currency.clone(),
        points: records
            .iter()
            .map(|record| (record.date, record.rate(currency.as_str())))
            .collect(),
    }
}
