//! Latest-rates snapshot model.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;

/// Default quoted amount when the service omits it.
pub(super) const fn default_amount() -> f64 {
    1.0_f64
}

/// Point-in-time rate table for a single date.
///
/// Every rate is expressed relative to [`RateSnapshot::base`]. The base
/// currency itself is not listed in [`RateSnapshot::rates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Amount of the base currency the rates are quoted for.
    #[serde(default = "default_amount")]
    pub amount: f64,
    /// Currency all rates are relative to.
    pub base: CurrencyCode,
    /// Publication date of the rates.
    pub date: NaiveDate,
    /// Rate of each quoted currency relative to the base.
    pub rates: BTreeMap<CurrencyCode, f64>,
}

impl RateSnapshot {
    /// Returns the rate of `code` relative to the base.
    ///
    /// The base currency has an implicit rate of `1.0`. Returns `None` for
    /// currencies the snapshot does not quote.
    #[inline]
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<f64> {
        if self.base.as_str() == code {
            return Some(1.0_f64);
        }
        self.rates.get(code).copied()
    }

    /// Returns the quoted currency codes, in code order.
    #[inline]
    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.rates.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATEST_JSON: &str = r#"{
        "amount": 1.0,
        "base": "EUR",
        "date": "2024-03-15",
        "rates": {"USD": 1.0892, "GBP": 0.85505, "JPY": 161.79}
    }"#;

    #[test]
    fn deserialize_latest_response() {
        let snapshot: RateSnapshot = serde_json::from_str(LATEST_JSON).unwrap();
        assert_eq!(snapshot.base, CurrencyCode::new("EUR"));
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(snapshot.rates.len(), 3);
        assert!((snapshot.amount - 1.0).abs() < f64::EPSILON);
        assert!((snapshot.rates["USD"] - 1.0892).abs() < f64::EPSILON);
    }

    #[test]
    fn amount_defaults_to_one() {
        let json = r#"{"base": "EUR", "date": "2022-01-03", "rates": {}}"#;
        let snapshot: RateSnapshot = serde_json::from_str(json).unwrap();
        assert!((snapshot.amount - 1.0).abs() < f64::EPSILON);
        assert!(snapshot.rates.is_empty());
    }

    #[test]
    fn rate_lookup() {
        let snapshot: RateSnapshot = serde_json::from_str(LATEST_JSON).unwrap();
        assert_eq!(snapshot.rate("GBP"), Some(0.85505));
        assert_eq!(snapshot.rate("EUR"), Some(1.0));
        assert_eq!(snapshot.rate("XXX"), None);
    }

    #[test]
    fn currencies_are_sorted_keys() {
        let snapshot: RateSnapshot = serde_json::from_str(LATEST_JSON).unwrap();
        let codes: Vec<&str> = snapshot.currencies().map(CurrencyCode::as_str).collect();
        assert_eq!(codes, ["GBP", "JPY", "USD"]);
    }

    #[test]
    fn rejects_invalid_date() {
        let json = r#"{"base": "EUR", "date": "15.03.2024", "rates": {}}"#;
        assert!(serde_json::from_str::<RateSnapshot>(json).is_err());
    }
}
