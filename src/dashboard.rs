//! Dashboard state and the fetch drivers that feed it.
//!
//! [`DashboardState`] is an immutable value: every user action or fetch
//! completion is a transition that consumes the state and returns the next
//! one. The converted amount is recomputed by [`recompute`] after each
//! transition that can affect it.
//!
//! Fetch failures never reach the caller. They are logged and the previous
//! snapshot or series stays in place. Each fetch is tagged with a
//! [`RequestTicket`] so that a slow, stale response cannot overwrite the
//! result of a newer request.

use chrono::NaiveDate;

use crate::chart::{self, ChartLine, ChartRecord};
use crate::convert::ConversionRequest;
use crate::error::Result;
use crate::models::{CurrencyCode, RateSeries, RateSnapshot};

/// First day of the initial chart window.
const DEFAULT_START: NaiveDate = match NaiveDate::from_ymd_opt(2022, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Last day of the initial chart window.
const DEFAULT_END: NaiveDate = match NaiveDate::from_ymd_opt(2022, 12, 31) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// Amount entered before the user types anything.
const DEFAULT_AMOUNT: f64 = 1.0_f64;

/// Which endpoint a request was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// The latest-rates endpoint.
    Latest,
    /// The date-range endpoint.
    Series,
}

/// Identifies one issued fetch; newer tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    /// Endpoint the request targets.
    kind: FetchKind,
    /// Monotonic sequence number within `kind`.
    seq: u64,
}

impl RequestTicket {
    /// Returns the endpoint this ticket was issued for.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Returns the sequence number of this ticket.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// Issued/applied counters for one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sequencer {
    /// Sequence number of the most recently issued request.
    issued: u64,
    /// Sequence number of the most recently applied response.
    applied: u64,
}

impl Sequencer {
    /// Issues the next ticket for `kind`.
    const fn issue(mut self, kind: FetchKind) -> (Self, RequestTicket) {
        self.issued += 1;
        (
            self,
            RequestTicket {
                kind,
                seq: self.issued,
            },
        )
    }

    /// Returns `true` if `ticket` belongs to `kind` and is newer than the
    /// last applied response.
    fn admits(self, ticket: RequestTicket, kind: FetchKind) -> bool {
        if ticket.kind != kind {
            tracing::warn!(expected = ?kind, got = ?ticket.kind, "ticket for another endpoint ignored");
            return false;
        }
        if ticket.seq <= self.applied {
            tracing::debug!(seq = ticket.seq, applied = self.applied, "discarding stale response");
            return false;
        }
        true
    }
}

/// Complete, immutable state of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Latest-rates snapshot, once loaded.
    snapshot: Option<RateSnapshot>,
    /// Historical series for the chart, once loaded.
    series: Option<RateSeries>,
    /// Currency converted from.
    source: Option<CurrencyCode>,
    /// Currency converted to.
    target: Option<CurrencyCode>,
    /// Currency plotted on the chart.
    chart_currency: Option<CurrencyCode>,
    /// Amount to convert.
    amount: f64,
    /// First day of the chart window (inclusive).
    start_date: NaiveDate,
    /// Last day of the chart window (inclusive).
    end_date: NaiveDate,
    /// Last successfully computed conversion result.
    converted: Option<f64>,
    /// Ticket bookkeeping for the latest-rates endpoint.
    latest_seq: Sequencer,
    /// Ticket bookkeeping for the date-range endpoint.
    series_seq: Sequencer,
}

impl Default for DashboardState {
    #[inline]
    fn default() -> Self {
        Self {
            snapshot: None,
            series: None,
            source: None,
            target: None,
            chart_currency: None,
            amount: DEFAULT_AMOUNT,
            start_date: DEFAULT_START,
            end_date: DEFAULT_END,
            converted: None,
            latest_seq: Sequencer::default(),
            series_seq: Sequencer::default(),
        }
    }
}

/// Computes the conversion result for `state`.
///
/// Conversion only happens once the snapshot is loaded, both currencies
/// are selected, and the amount is neither zero nor NaN. Otherwise the
/// previously computed result is returned unchanged.
#[inline]
#[must_use]
pub fn recompute(state: &DashboardState) -> Option<f64> {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return state.converted;
    };
    if state.amount == 0.0_f64 || state.amount.is_nan() {
        return state.converted;
    }
    state
        .conversion_request()
        .convert_with(snapshot)
        .or(state.converted)
}

impl DashboardState {
    /// Creates the initial state: amount `1`, window
    /// `2022-01-01..2022-12-31`, nothing selected or loaded.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Returns the latest-rates snapshot, if loaded.
    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    /// Returns the historical series, if loaded.
    #[inline]
    #[must_use]
    pub const fn series(&self) -> Option<&RateSeries> {
        self.series.as_ref()
    }

    /// Returns `true` while the latest-rates snapshot has not arrived.
    #[inline]
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Returns the selected source currency.
    #[inline]
    #[must_use]
    pub const fn source(&self) -> Option<&CurrencyCode> {
        self.source.as_ref()
    }

    /// Returns the selected target currency.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Option<&CurrencyCode> {
        self.target.as_ref()
    }

    /// Returns the currency plotted on the chart.
    #[inline]
    #[must_use]
    pub const fn chart_currency(&self) -> Option<&CurrencyCode> {
        self.chart_currency.as_ref()
    }

    /// Returns the amount to convert.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.amount
    }

    /// Returns the chart window as `(start, end)`, both inclusive.
    #[inline]
    #[must_use]
    pub const fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date)
    }

    /// Returns the last computed conversion result.
    #[inline]
    #[must_use]
    pub const fn converted(&self) -> Option<f64> {
        self.converted
    }

    /// Returns the current conversion inputs.
    #[inline]
    #[must_use]
    pub fn conversion_request(&self) -> ConversionRequest {
        ConversionRequest {
            source: self.source.clone(),
            target: self.target.clone(),
            amount: self.amount,
        }
    }

    /// Returns the currencies the user can pick from: the codes quoted by
    /// the snapshot, or nothing while loading.
    #[inline]
    #[must_use]
    pub fn currencies(&self) -> Vec<&CurrencyCode> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.currencies().collect())
            .unwrap_or_default()
    }

    /// Projects the loaded series into chart records (empty if none).
    #[inline]
    #[must_use]
    pub fn chart_records(&self) -> Vec<ChartRecord> {
        self.series.as_ref().map(chart::project).unwrap_or_default()
    }

    /// Returns the line for the selected chart currency, if one is selected.
    #[inline]
    #[must_use]
    pub fn chart_line(&self) -> Option<ChartLine> {
        let currency = self.chart_currency.as_ref()?;
        Some(chart::line(&self.chart_records(), currency))
    }

    // ── User transitions ─────────────────────────────────────────────

    /// Sets the amount to convert.
    #[inline]
    #[must_use]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self.refreshed()
    }

    /// Selects the source currency.
    #[inline]
    #[must_use]
    pub fn with_source<T: Into<CurrencyCode>>(mut self, code: T) -> Self {
        self.source = Some(code.into());
        self.refreshed()
    }

    /// Selects the target currency.
    #[inline]
    #[must_use]
    pub fn with_target<T: Into<CurrencyCode>>(mut self, code: T) -> Self {
        self.target = Some(code.into());
        self.refreshed()
    }

    /// Selects the currency plotted on the chart.
    #[inline]
    #[must_use]
    pub fn with_chart_currency<T: Into<CurrencyCode>>(mut self, code: T) -> Self {
        self.chart_currency = Some(code.into());
        self
    }

    /// Sets the chart window. The series is not refetched by this
    /// transition; callers follow up with a series refresh.
    #[inline]
    #[must_use]
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    // ── Fetch transitions ────────────────────────────────────────────

    /// Issues a ticket for a latest-rates request.
    #[inline]
    #[must_use]
    pub fn begin_latest(mut self) -> (Self, RequestTicket) {
        let (seq, ticket) = self.latest_seq.issue(FetchKind::Latest);
        self.latest_seq = seq;
        (self, ticket)
    }

    /// Issues a ticket for a date-range request.
    #[inline]
    #[must_use]
    pub fn begin_series(mut self) -> (Self, RequestTicket) {
        let (seq, ticket) = self.series_seq.issue(FetchKind::Series);
        self.series_seq = seq;
        (self, ticket)
    }

    /// Applies the outcome of a latest-rates request.
    ///
    /// Errors are logged and leave the state untouched. A response older
    /// than the last applied one is discarded.
    #[must_use]
    pub fn finish_latest(mut self, ticket: RequestTicket, result: Result<RateSnapshot>) -> Self {
        if !self.latest_seq.admits(ticket, FetchKind::Latest) {
            return self;
        }
        match result {
            Ok(snapshot) => {
                tracing::debug!(seq = ticket.seq, date = %snapshot.date, "applying latest rates");
                self.snapshot = Some(snapshot);
                self.latest_seq.applied = ticket.seq;
                self.refreshed()
            }
            Err(err) => {
                tracing::error!(seq = ticket.seq, error = %err, "error while fetching rates");
                self
            }
        }
    }

    /// Applies the outcome of a date-range request.
    ///
    /// Errors are logged and leave the state untouched. A response older
    /// than the last applied one is discarded.
    #[must_use]
    pub fn finish_series(mut self, ticket: RequestTicket, result: Result<RateSeries>) -> Self {
        if !self.series_seq.admits(ticket, FetchKind::Series) {
            return self;
        }
        match result {
            Ok(series) => {
                tracing::debug!(seq = ticket.seq, dates = series.len(), "applying rate series");
                self.series = Some(series);
                self.series_seq.applied = ticket.seq;
                self
            }
            Err(err) => {
                tracing::error!(seq = ticket.seq, error = %err, "error while fetching chart data");
                self
            }
        }
    }

    /// Recomputes the derived conversion result.
    fn refreshed(mut self) -> Self {
        self.converted = recompute(&self);
        self
    }
}

/// Issues both requests at once and waits for both to complete.
#[cfg(feature = "async")]
async fn fetch_both(
    client: &crate::client::FrankfurterClient,
    start: NaiveDate,
    end: NaiveDate,
) -> (Result<RateSnapshot>, Result<RateSeries>) {
    futures_util::future::join(client.latest(), client.series(start, end)).await
}

/// Issues both requests on separate threads and waits for both to complete.
#[cfg(feature = "blocking")]
fn fetch_both_blocking(
    client: &crate::client::FrankfurterBlockingClient,
    start: NaiveDate,
    end: NaiveDate,
) -> (Result<RateSnapshot>, Result<RateSeries>) {
    std::thread::scope(|scope| {
        let latest = scope.spawn(|| client.latest());
        let series = client.series(start, end);
        let latest = latest
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        (latest, series)
    })
}

/// Generates a dashboard driver (async or blocking) around a client.
macro_rules! define_dashboard {
    (
        dashboard_name: $dashboard:ident,
        http_client: $http_client:ty,
        fetch_both: $fetch_both:ident,
        dashboard_doc: $dashboard_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $dashboard_doc]
        #[derive(Debug)]
        pub struct $dashboard {
            /// Client used for every fetch.
            client: $http_client,
        }

        impl $dashboard {
            /// Wraps an already configured client.
            #[inline]
            #[must_use]
            pub const fn new(client: $http_client) -> Self {
                Self { client }
            }

            /// Returns a reference to the underlying HTTP client.
            #[inline]
            #[must_use]
            pub const fn inner_client(&self) -> &$http_client {
                &self.client
            }

            /// Refetches the latest rates and applies them to `state`.
            ///
            /// A failed fetch is logged and the previous snapshot is kept.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_latest(&self, state: DashboardState) -> DashboardState {
                let (state, ticket) = state.begin_latest();
                let result = self.client.latest() $( .$await_ext )?;
                state.finish_latest(ticket, result)
            }

            /// Refetches the series for the state's chart window and applies
            /// it to `state`.
            ///
            /// A failed fetch is logged and the previous series is kept.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_series(&self, state: DashboardState) -> DashboardState {
                let (state, ticket) = state.begin_series();
                let (start, end) = state.date_range();
                let result = self.client.series(start, end) $( .$await_ext )?;
                state.finish_series(ticket, result)
            }

            /// Fetches the latest rates and the series concurrently and
            /// applies each result independently.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_all(&self, state: DashboardState) -> DashboardState {
                let (state, latest_ticket) = state.begin_latest();
                let (state, series_ticket) = state.begin_series();
                let (start, end) = state.date_range();
                tracing::debug!(%start, %end, "fetching latest rates and series");
                let (latest, series) = $fetch_both(&self.client, start, end) $( .$await_ext )?;
                state
                    .finish_latest(latest_ticket, latest)
                    .finish_series(series_ticket, series)
            }
        }
    };
}

#[cfg(feature = "async")]
define_dashboard! {
    dashboard_name: Dashboard,
    http_client: crate::client::FrankfurterClient,
    fetch_both: fetch_both,
    dashboard_doc: "Async driver that fetches rates into a [`DashboardState`].",
    async_kw: async,
    await_kw: await,
}

#[cfg(feature = "blocking")]
define_dashboard! {
    dashboard_name: BlockingDashboard,
    http_client: crate::client::FrankfurterBlockingClient,
    fetch_both: fetch_both_blocking,
    dashboard_doc: "Blocking driver that fetches rates into a [`DashboardState`].",
}
