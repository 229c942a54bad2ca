//! Cross-rate currency conversion.
//!
//! All rates share one base currency, so converting between two quoted
//! currencies always goes through the base:
//! `amount / rate[source] * rate[target]`.

use crate::models::{CurrencyCode, RateSnapshot};

/// Converts `amount` given the base-relative rates of the source and
/// target currencies, rounded to two decimal places.
///
/// Missing rates should be passed as `f64::NAN`. A NaN or zero source rate
/// propagates into the result as NaN or an infinity.
#[inline]
#[must_use]
pub fn convert(amount: f64, source_rate: f64, target_rate: f64) -> f64 {
    round2((amount / source_rate) * target_rate)
}

/// Rounds the exact decimal value of `value` to two decimal places.
///
/// A value sitting exactly halfway between two cents rounds away from
/// zero. Anything else rounds to the nearer cent, so `1.045` (stored as
/// `1.04499...`) becomes `1.04`. NaN and infinities are returned unchanged.
#[inline]
#[must_use]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // Only odd multiples of 1/8 are exact ties at two decimals.
    let eighths = value * 8.0_f64;
    if eighths.fract() == 0.0_f64 && eighths % 2.0_f64 != 0.0_f64 {
        return (value * 100.0_f64).round() / 100.0_f64;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

/// A user's conversion inputs. Either currency may still be unselected.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// Currency the amount is expressed in.
    pub source: Option<CurrencyCode>,
    /// Currency to express the amount in.
    pub target: Option<CurrencyCode>,
    /// Amount of the source currency.
    pub amount: f64,
}

impl ConversionRequest {
    /// Creates a request with both currencies selected.
    #[inline]
    #[must_use]
    pub fn new<S: Into<CurrencyCode>, T: Into<CurrencyCode>>(
        source: S,
        target: T,
        amount: f64,
    ) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            amount,
        }
    }

    /// Converts the request against `snapshot`.
    ///
    /// Returns `None` when either currency is unselected. Currencies the
    /// snapshot does not quote are treated as a NaN rate, so the result is
    /// NaN rather than an error.
    #[inline]
    #[must_use]
    pub fn convert_with(&self, snapshot: &RateSnapshot) -> Option<f64> {
        let (source, target) = self.source.as_ref().zip(self.target.as_ref())?;
        let source_rate = snapshot.rate(source.as_str()).unwrap_or(f64::NAN);
        let target_rate = snapshot.rate(target.as_str()).unwrap_or(f64::NAN);
        tracing::trace!(%source, %target, source_rate, target_rate, "converting");
        Some(convert(self.amount, source_rate, target_rate))
    }
}
