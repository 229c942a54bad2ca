//! Currency code newtype.

use core::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Three-letter currency code as reported by the rate service (e.g. `"USD"`).
///
/// The code is kept verbatim: no case folding and no validation against a
/// known currency list. Unknown codes simply have no rate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a new currency code from the given string.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(value: T) -> Self {
        Self(value.into())
    }

    /// Returns the code as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for CurrencyCode {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CurrencyCode {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// Lets rate maps keyed by `CurrencyCode` be queried with a plain `&str`.
impl Borrow<str> for CurrencyCode {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}
