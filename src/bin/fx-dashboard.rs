//! Terminal front end for the Frankfurter currency dashboard.

use std::io::{self, Write as _};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use fx_dashboard::chart::{ChartLine, ChartRecord};
use fx_dashboard::client::FrankfurterBlockingClient;
use fx_dashboard::dashboard::{BlockingDashboard, DashboardState};
use fx_dashboard::models::{CurrencyCode, NaiveDate, RateSnapshot};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Environment variable overriding the API base URL.
const BASE_URL_ENV: &str = "FX_DASHBOARD_BASE_URL";

/// Width of the widest bar in the chart table.
const BAR_WIDTH: u32 = 40;

/// Frankfurter currency dashboard — latest rates, conversion and
/// historical charts.
#[derive(Debug, Parser)]
#[command(name = "fx-dashboard", version, about)]
struct Cli {
    /// Override the API base URL (default: public Frankfurter API).
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Show the latest rates relative to the base currency.
    Latest,
    /// Convert an amount between two currencies.
    Convert(ConvertArgs),
    /// Show the rate history of one currency over a date range.
    Chart(ChartArgs),
    /// Fetch everything at once and show the full dashboard.
    Dashboard(DashboardArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(Debug, Args)]
struct ConvertArgs {
    /// Currency to convert from (e.g. USD).
    #[arg(long)]
    from: String,
    /// Currency to convert to (e.g. GBP).
    #[arg(long)]
    to: String,
    /// Amount of the source currency.
    #[arg(long, default_value_t = 1.0)]
    amount: f64,
}

/// Arguments for the `chart` subcommand.
#[derive(Debug, Args)]
struct ChartArgs {
    /// Currency to plot.
    #[arg(long)]
    currency: String,
    /// Window start (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Window end (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
    /// Print every projected chart record as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `dashboard` subcommand.
#[derive(Debug, Args)]
struct DashboardArgs {
    /// Currency to convert from.
    #[arg(long)]
    from: Option<String>,
    /// Currency to convert to.
    #[arg(long)]
    to: Option<String>,
    /// Amount of the source currency.
    #[arg(long, default_value_t = 1.0)]
    amount: f64,
    /// Currency to plot.
    #[arg(long)]
    currency: Option<String>,
    /// Window start (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Window end (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Picks the base URL: the flag wins, then a non-empty environment value.
fn resolve_base_url(flag: Option<String>, env_value: Option<String>) -> Option<String> {
    flag.or_else(|| env_value.filter(|val| !val.is_empty()))
}

/// Applies optional window bounds on top of the state's current window.
fn with_window(
    state: DashboardState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> DashboardState {
    let (default_start, default_end) = state.date_range();
    state.with_date_range(start.unwrap_or(default_start), end.unwrap_or(default_end))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let dashboard = match build_dashboard(cli.base_url) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to build client: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&dashboard, cli.command)
}

/// Builds the blocking dashboard from the CLI flag and environment.
fn build_dashboard(flag: Option<String>) -> fx_dashboard::error::Result<BlockingDashboard> {
    let mut builder = FrankfurterBlockingClient::builder();
    if let Some(url) = resolve_base_url(flag, std::env::var(BASE_URL_ENV).ok()) {
        builder = builder.base_url(url);
    }
    Ok(BlockingDashboard::new(builder.build()?))
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(dashboard: &BlockingDashboard, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Latest => cmd_latest(dashboard),
        Command::Convert(args) => cmd_convert(dashboard, &args),
        Command::Chart(args) => cmd_chart(dashboard, &args),
        Command::Dashboard(args) => cmd_dashboard(dashboard, &args),
    }
}

/// Prints the standard "nothing loaded" error.
fn report_missing(what: &str) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} no {what} available (fetch failed, see log)",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Executes the `latest` subcommand: fetches and lists the latest rates.
fn cmd_latest(dashboard: &BlockingDashboard) -> io::Result<ExitCode> {
    let spinner = make_spinner("Fetching latest rates...");
    let state = dashboard.refresh_latest(DashboardState::new());
    spinner.finish_and_clear();

    match state.snapshot() {
        Some(snapshot) => {
            print_rates_table(snapshot)?;
            Ok(ExitCode::SUCCESS)
        }
        None => report_missing("rates"),
    }
}

/// Executes the `convert` subcommand.
fn cmd_convert(dashboard: &BlockingDashboard, args: &ConvertArgs) -> io::Result<ExitCode> {
    let state = DashboardState::new()
        .with_source(args.from.as_str())
        .with_target(args.to.as_str())
        .with_amount(args.amount);

    let spinner = make_spinner("Fetching latest rates...");
    let state = dashboard.refresh_latest(state);
    spinner.finish_and_clear();

    if state.is_loading() {
        return report_missing("rates");
    }
    print_conversion(&state)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `chart` subcommand.
fn cmd_chart(dashboard: &BlockingDashboard, args: &ChartArgs) -> io::Result<ExitCode> {
    let state = with_window(DashboardState::new(), args.start, args.end)
        .with_chart_currency(args.currency.as_str());

    let spinner = make_spinner("Fetching rate history...");
    let state = dashboard.refresh_series(state);
    spinner.finish_and_clear();

    if state.series().is_none() {
        return report_missing("rate history");
    }
    if args.json {
        print_records_json(&state.chart_records())?;
    } else if let Some(line) = state.chart_line() {
        print_chart_table(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `dashboard` subcommand: both fetches, everything printed.
fn cmd_dashboard(dashboard: &BlockingDashboard, args: &DashboardArgs) -> io::Result<ExitCode> {
    let mut state = with_window(DashboardState::new(), args.start, args.end).with_amount(args.amount);
    if let Some(code) = args.from.as_deref() {
        state = state.with_source(code);
    }
    if let Some(code) = args.to.as_deref() {
        state = state.with_target(code);
    }
    if let Some(code) = args.currency.as_deref() {
        state = state.with_chart_currency(code);
    }

    let spinner = make_spinner("Fetching rates and history...");
    let state = dashboard.refresh_all(state);
    spinner.finish_and_clear();

    let Some(snapshot) = state.snapshot() else {
        return report_missing("rates");
    };
    print_rates_table(snapshot)?;
    if state.source().is_some() && state.target().is_some() {
        print_conversion(&state)?;
    }
    match state.chart_line() {
        Some(line) if state.series().is_some() => print_chart_table(&line)?,
        Some(_) => {
            writeln!(
                io::stderr().lock(),
                "{} rate history unavailable",
                "warning:".yellow().bold()
            )?;
        }
        None => {}
    }
    Ok(ExitCode::SUCCESS)
}

// ── Output formatting ────────────────────────────────────────────────

/// Prints the base currency, rate date and every quoted rate.
fn print_rates_table(snapshot: &RateSnapshot) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        format_args!("Base currency: {}", snapshot.base).green().bold(),
        format_args!("(rates of {})", snapshot.date).dimmed()
    )?;
    writeln!(out)?;
    if snapshot.rates.is_empty() {
        writeln!(out, "{}", "No rates found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Currency").fg(Color::Cyan),
        Cell::new("Rate").fg(Color::Cyan),
    ]);
    for (code, rate) in &snapshot.rates {
        _ = table.add_row(vec![Cell::new(code), Cell::new(rate)]);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the conversion result of `state`.
fn print_conversion(state: &DashboardState) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let target = state.target().map_or("", CurrencyCode::as_str);
    let source = state.source().map_or("", CurrencyCode::as_str);
    let converted = state.converted().unwrap_or(0.0_f64);
    writeln!(
        out,
        "{} {} {source} = {} {target}",
        "Converted amount:".bold(),
        state.amount(),
        format_args!("{converted:.2}").green().bold()
    )?;
    Ok(())
}

/// Prints all projected chart records as pretty JSON.
fn print_records_json(records: &[ChartRecord]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(io::Error::other)?;
    writeln!(io::stdout().lock(), "{json}")
}

/// Renders a proportional bar for `value` within `[low, high]`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "bar length is clamped to 0..=BAR_WIDTH before the cast"
)]
fn render_bar(value: f64, low: f64, high: f64) -> String {
    let span = high - low;
    let fraction = if span > 0.0_f64 {
        ((value - low) / span).clamp(0.0_f64, 1.0_f64)
    } else {
        1.0_f64
    };
    let len = (fraction * f64::from(BAR_WIDTH)).round() as usize;
    "\u{2588}".repeat(len.max(1))
}

/// Prints one currency's rate history as a table with bars.
fn print_chart_table(line: &ChartLine) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let Some((low, high)) = line.bounds() else {
        writeln!(
            out,
            "{}",
            format_args!("No rates for {} in this range.", line.currency).dimmed()
        )?;
        return Ok(());
    };

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new(&line.currency).fg(Color::Cyan),
        Cell::new("").fg(Color::Cyan),
    ]);
    for &(date, rate) in &line.points {
        let (rate_cell, bar_cell) = match rate {
            Some(value) => (
                Cell::new(value),
                Cell::new(render_bar(value, low, high)).fg(Color::Green),
            ),
            None => (
                Cell::new("\u{2014}").fg(Color::DarkGrey),
                Cell::new(""),
            ),
        };
        _ = table.add_row(vec![Cell::new(date), rate_cell, bar_cell]);
    }

    writeln!(
        out,
        "{} {}",
        format_args!("{} history", line.currency).green().bold(),
        format_args!("({} dates, min {low}, max {high})", line.points.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last-resort error output — if stderr itself failed, nothing
            // we can do.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fx_dashboard::chart;
    use fx_dashboard::models::RateSeries;

    use super::*;

    /// Address nothing listens on, so every fetch fails fast.
    const DEAD_URL: &str = "http://127.0.0.1:9";

    fn dead_dashboard() -> BlockingDashboard {
        build_dashboard(Some(DEAD_URL.to_owned())).unwrap()
    }

    fn test_snapshot() -> RateSnapshot {
        RateSnapshot {
            amount: 1.0,
            base: CurrencyCode::new("EUR"),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            rates: BTreeMap::from([
                (CurrencyCode::new("USD"), 1.0892),
                (CurrencyCode::new("GBP"), 0.85505),
            ]),
        }
    }

    fn test_line() -> ChartLine {
        let series: RateSeries = serde_json::from_str(
            r#"{"rates": {
                "2022-01-03": {"USD": 1.1355},
                "2022-01-04": {"GBP": 0.8363},
                "2022-01-05": {"USD": 1.1319}
            }}"#,
        )
        .unwrap();
        chart::line(&chart::project(&series), &CurrencyCode::new("USD"))
    }

    // ── parse_date tests ──────────────────────────────────────────────

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2022-01-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("01-15-2024").is_err());
    }

    // ── configuration tests ──────────────────────────────────────────

    #[test]
    fn base_url_flag_wins() {
        let url = resolve_base_url(Some("http://flag".to_owned()), Some("http://env".to_owned()));
        assert_eq!(url.as_deref(), Some("http://flag"));
    }

    #[test]
    fn base_url_falls_back_to_env() {
        let url = resolve_base_url(None, Some("http://env".to_owned()));
        assert_eq!(url.as_deref(), Some("http://env"));
    }

    #[test]
    fn empty_env_base_url_is_ignored() {
        assert!(resolve_base_url(None, Some(String::new())).is_none());
        assert!(resolve_base_url(None, None).is_none());
    }

    #[test]
    fn build_dashboard_uses_flag() {
        let dashboard = dead_dashboard();
        assert_eq!(dashboard.inner_client().base_url(), DEAD_URL);
    }

    #[test]
    fn window_keeps_unset_bounds() {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let state = with_window(DashboardState::new(), Some(start), None);
        assert_eq!(
            state.date_range(),
            (start, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap())
        );
    }

    #[test]
    fn cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "fx-dashboard",
            "convert",
            "--from",
            "USD",
            "--to",
            "GBP",
            "--amount",
            "100",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Convert(ref args) if args.to == "GBP"));
    }

    #[test]
    fn cli_rejects_bad_chart_date() {
        let result = Cli::try_parse_from([
            "fx-dashboard",
            "chart",
            "--currency",
            "USD",
            "--start",
            "yesterday",
        ]);
        assert!(result.is_err());
    }

    // ── print function tests ─────────────────────────────────────────

    #[test]
    fn render_bar_scales_within_bounds() {
        assert_eq!(render_bar(1.0, 1.0, 2.0).chars().count(), 1);
        assert_eq!(render_bar(2.0, 1.0, 2.0).chars().count(), 40);
        assert_eq!(render_bar(1.5, 1.0, 2.0).chars().count(), 20);
        assert_eq!(render_bar(5.0, 5.0, 5.0).chars().count(), 40);
    }

    #[test]
    fn print_rates_table_with_data() {
        assert!(print_rates_table(&test_snapshot()).is_ok());
    }

    #[test]
    fn print_rates_table_empty() {
        let mut snapshot = test_snapshot();
        snapshot.rates.clear();
        assert!(print_rates_table(&snapshot).is_ok());
    }

    #[test]
    fn print_conversion_works() {
        let state = DashboardState::new()
            .with_source("USD")
            .with_target("GBP")
            .with_amount(100.0);
        assert!(print_conversion(&state).is_ok());
    }

    #[test]
    fn print_chart_table_with_gaps() {
        assert!(print_chart_table(&test_line()).is_ok());
    }

    #[test]
    fn print_chart_table_without_values() {
        let line = ChartLine {
            currency: CurrencyCode::new("JPY"),
            points: Vec::new(),
        };
        assert!(print_chart_table(&line).is_ok());
    }

    #[test]
    fn print_records_json_works() {
        let series: RateSeries =
            serde_json::from_str(r#"{"rates": {"2022-01-01": {"USD": 1.1, "EUR": 1.0}}}"#)
                .unwrap();
        assert!(print_records_json(&chart::project(&series)).is_ok());
    }

    // ── make_spinner test ────────────────────────────────────────────

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }

    // ── cmd_* tests ──────────────────────────────────────────────────

    #[test]
    fn cmd_latest_unreachable_fails() {
        let code = cmd_latest(&dead_dashboard()).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn cmd_convert_unreachable_fails() {
        let args = ConvertArgs {
            from: "USD".to_owned(),
            to: "GBP".to_owned(),
            amount: 100.0,
        };
        let code = cmd_convert(&dead_dashboard(), &args).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn cmd_chart_unreachable_fails() {
        let args = ChartArgs {
            currency: "USD".to_owned(),
            start: None,
            end: None,
            json: false,
        };
        let code = cmd_chart(&dead_dashboard(), &args).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn dispatch_dashboard_unreachable_fails() {
        let args = DashboardArgs {
            from: Some("USD".to_owned()),
            to: Some("GBP".to_owned()),
            amount: 1.0,
            currency: Some("USD".to_owned()),
            start: None,
            end: None,
        };
        let code = dispatch(&dead_dashboard(), Command::Dashboard(args)).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    mod against_mock_api {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use super::*;

        const LATEST: &str =
            r#"{"amount":1.0,"base":"EUR","date":"2024-03-15","rates":{"USD":1.1,"GBP":0.85}}"#;
        const RANGE: &str = r#"{"amount":1.0,"base":"EUR","start_date":"2022-01-03","end_date":"2022-01-05",
            "rates":{"2022-01-03":{"USD":1.1355},"2022-01-04":{"GBP":0.8363},"2022-01-05":{"USD":1.1319}}}"#;

        /// Starts a server answering `/latest` and the default window
        /// with the given number of expected hits each.
        async fn mock_api(latest_hits: u64, range_hits: u64) -> MockServer {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/latest"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(LATEST, "application/json"))
                .expect(latest_hits)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/2022-01-01..2022-12-31"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(RANGE, "application/json"))
                .expect(range_hits)
                .mount(&server)
                .await;
            server
        }

        /// Runs a handler against `server` on a blocking thread.
        async fn run_blocking<F>(server: &MockServer, handler: F) -> ExitCode
        where
            F: FnOnce(&BlockingDashboard) -> io::Result<ExitCode> + Send + 'static,
        {
            let uri = server.uri();
            tokio::task::spawn_blocking(move || {
                let dashboard = build_dashboard(Some(uri)).unwrap();
                handler(&dashboard).unwrap()
            })
            .await
            .unwrap()
        }

        #[tokio::test]
        async fn cmd_latest_prints_rates() {
            let server = mock_api(1, 0).await;
            let code = run_blocking(&server, cmd_latest).await;
            assert_eq!(code, ExitCode::SUCCESS);
        }

        #[tokio::test]
        async fn cmd_convert_prints_result() {
            let server = mock_api(1, 0).await;
            let args = ConvertArgs {
                from: "USD".to_owned(),
                to: "GBP".to_owned(),
                amount: 100.0,
            };
            let code = run_blocking(&server, move |dashboard| cmd_convert(dashboard, &args)).await;
            assert_eq!(code, ExitCode::SUCCESS);
        }

        #[tokio::test]
        async fn cmd_chart_prints_table() {
            let server = mock_api(0, 1).await;
            let args = ChartArgs {
                currency: "USD".to_owned(),
                start: None,
                end: None,
                json: false,
            };
            let code = run_blocking(&server, move |dashboard| cmd_chart(dashboard, &args)).await;
            assert_eq!(code, ExitCode::SUCCESS);
        }

        #[tokio::test]
        async fn cmd_chart_prints_json() {
            let server = mock_api(0, 1).await;
            let args = ChartArgs {
                currency: "USD".to_owned(),
                start: None,
                end: None,
                json: true,
            };
            let code = run_blocking(&server, move |dashboard| cmd_chart(dashboard, &args)).await;
            assert_eq!(code, ExitCode::SUCCESS);
        }

        #[tokio::test]
        async fn dispatch_dashboard_prints_everything() {
            let server = mock_api(1, 1).await;
            let args = DashboardArgs {
                from: Some("USD".to_owned()),
                to: Some("GBP".to_owned()),
                amount: 100.0,
                currency: Some("USD".to_owned()),
                start: None,
                end: None,
            };
            let code = run_blocking(&server, move |dashboard| {
                dispatch(dashboard, Command::Dashboard(args))
            })
            .await;
            assert_eq!(code, ExitCode::SUCCESS);
        }
    }
}
