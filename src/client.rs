//! HTTP client for the Frankfurter exchange rate API.
//!
//! Provides both async and blocking client variants behind feature flags.

use chrono::NaiveDate;

/// Base URL for the Frankfurter API.
const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Latest-rates endpoint path.
const LATEST_PATH: &str = "/latest";

/// Date format used in range paths.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Builds the path of the inclusive date-range endpoint, e.g.
/// `/2022-01-01..2022-12-31`.
fn series_path(start: NaiveDate, end: NaiveDate) -> String {
    format!("/{}..{}", start.format(DATE_FORMAT), end.format(DATE_FORMAT))
}

/// Generates a Frankfurter client (async or blocking) with builder, methods, and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        http_type: $http_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Base URL override (for testing or a self-hosted instance).
            base_url: Option<String>,
        }

        impl $builder {
            /// Overrides the base URL (useful for testing with a mock server).
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`FxError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let base_url = self.base_url.map_or_else(
                    || DEFAULT_BASE_URL.to_owned(),
                    |url| url.trim_end_matches('/').to_owned(),
                );
                tracing::debug!(base_url = %base_url, "building client");
                let http = <$http_type>::builder().build()?;

                Ok($client { http, base_url })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// API base URL, without a trailing slash.
            base_url: String,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder { base_url: None }
            }

            /// Returns the API base URL this client talks to.
            #[inline]
            #[must_use]
            pub fn base_url(&self) -> &str {
                &self.base_url
            }

            /// Fetches the most recent rates via the `/latest` endpoint.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn latest(&self) -> Result<RateSnapshot> {
                tracing::debug!("calling latest endpoint");
                self.get_json(LATEST_PATH) $( .$await_ext )?
            }

            /// Fetches the rates for every published date in the inclusive
            /// range `start..end`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(%start, %end))]
            pub $($async_kw)? fn series(
                &self,
                start: NaiveDate,
                end: NaiveDate,
            ) -> Result<RateSeries> {
                tracing::debug!("calling range endpoint");
                self.get_json(&series_path(start, end)) $( .$await_ext )?
            }

            /// Sends a JSON GET request and deserializes the response.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn get_json<Resp: serde::de::DeserializeOwned>(
                &self,
                path: &str,
            ) -> Result<Resp> {
                let url = format!("{}{path}", self.base_url);
                tracing::trace!(url = %url, "sending GET request");
                let response: $resp_type = self
                    .http
                    .get(&url)
                    .header(ACCEPT, "application/json")
                    .send()
                    $( .$await_ext )?
                    ?;

                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    let body = response.text() $( .$await_ext )? ?;
                    tracing::trace!(body_len = body.len(), "parsing response body");
                    serde_json::from_str(&body).map_err(FxError::from)
                } else {
                    let message = response
                        .text()
                        $( .$await_ext )?
                        .unwrap_or_else(|_| "unknown error".to_owned());
                    tracing::debug!(status = status.as_u16(), message = %message, "API error");
                    Err(FxError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }

    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client for the Frankfurter API.

    use chrono::NaiveDate;
    use reqwest::header::ACCEPT;

    use super::{DEFAULT_BASE_URL, LATEST_PATH, series_path};
    use crate::error::{FxError, Result};
    use crate::models::{RateSeries, RateSnapshot};

    define_client! {
        client_name: FrankfurterClient,
        builder_name: FrankfurterClientBuilder,
        http_type: reqwest::Client,
        response_type: reqwest::Response,
        client_doc: "Async client for the Frankfurter API.\n\nUse [`FrankfurterClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`FrankfurterClient`].",
        async_kw: async,
        await_kw: await,
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client for the Frankfurter API.

    use chrono::NaiveDate;
    use reqwest::header::ACCEPT;

    use super::{DEFAULT_BASE_URL, LATEST_PATH, series_path};
    use crate::error::{FxError, Result};
    use crate::models::{RateSeries, RateSnapshot};

    define_client! {
        client_name: FrankfurterBlockingClient,
        builder_name: FrankfurterBlockingClientBuilder,
        http_type: reqwest::blocking::Client,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the Frankfurter API.\n\nUse [`FrankfurterBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`FrankfurterBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{FrankfurterClient, FrankfurterClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{FrankfurterBlockingClient, FrankfurterBlockingClientBuilder};
