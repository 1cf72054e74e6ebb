use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    EXTREME_EVENT_MONTH, MonthlyRecord, ProjectionSummary, Severity, ShockEvent, ShockOutcome,
    SimulationParameters, TARIFF_EVENT_MONTH, shock_outcomes, simulate, summarize,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const MAX_YEARS: u32 = 100;
const MAX_RATE_MAGNITUDE: f64 = 100.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliSeverity {
    Low,
    Medium,
    High,
}

impl From<CliSeverity> for Severity {
    fn from(value: CliSeverity) -> Self {
        match value {
            CliSeverity::Low => Severity::Low,
            CliSeverity::Medium => Severity::Medium,
            CliSeverity::High => Severity::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiSeverity {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM", alias = "med")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl From<ApiSeverity> for CliSeverity {
    fn from(value: ApiSeverity) -> Self {
        match value {
            ApiSeverity::Low => CliSeverity::Low,
            ApiSeverity::Medium => CliSeverity::Medium,
            ApiSeverity::High => CliSeverity::High,
        }
    }
}

/// A user-defined shock given as `MONTH:PERCENT` or `MONTH:PERCENT:LABEL`.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomShockArg {
    pub month: u32,
    pub drop_percent: f64,
    pub label: Option<String>,
}

fn parse_custom_shock(raw: &str) -> Result<CustomShockArg, String> {
    let mut parts = raw.splitn(3, ':');
    let month = parts
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| format!("invalid shock month in '{raw}', expected MONTH:PERCENT"))?;
    let drop_percent = parts
        .next()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| format!("invalid shock percent in '{raw}', expected MONTH:PERCENT"))?;
    let label = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(CustomShockArg {
        month,
        drop_percent,
        label,
    })
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 20, help = "Investment period in years")]
    pub years: u32,
    #[arg(long, default_value_t = 500.0, help = "Amount deposited every month")]
    pub monthly_deposit: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        allow_negative_numbers = true,
        help = "Nominal annual interest rate in percent, e.g. 7"
    )]
    pub annual_rate: f64,
    #[arg(long, help = "Simulate the tariff impact event at month 24")]
    pub tariff: bool,
    #[arg(long, value_enum, default_value_t = CliSeverity::Medium)]
    pub tariff_severity: CliSeverity,
    #[arg(
        long,
        help = "Tariff drop in percent; overrides --tariff-severity when set"
    )]
    pub tariff_drop: Option<f64>,
    #[arg(long, help = "Simulate the extreme market event at month 36")]
    pub extreme: bool,
    #[arg(long, value_enum, default_value_t = CliSeverity::Medium)]
    pub extreme_severity: CliSeverity,
    #[arg(
        long,
        help = "Extreme event drop in percent; overrides --extreme-severity when set"
    )]
    pub extreme_drop: Option<f64>,
    #[arg(
        long = "shock",
        value_parser = parse_custom_shock,
        help = "Additional shock as MONTH:PERCENT[:LABEL]; may be repeated"
    )]
    pub shocks: Vec<CustomShockArg>,
}

impl Default for ProjectArgs {
    fn default() -> Self {
        Self {
            years: 20,
            monthly_deposit: 500.0,
            annual_rate: 7.0,
            tariff: false,
            tariff_severity: CliSeverity::Medium,
            tariff_drop: None,
            extreme: false,
            extreme_severity: CliSeverity::Medium,
            extreme_drop: None,
            shocks: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCustomShock {
    month: u32,
    drop_percent: f64,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    years: Option<u32>,
    monthly_deposit: Option<f64>,
    annual_rate: Option<f64>,

    tariff_enabled: Option<bool>,
    tariff_severity: Option<ApiSeverity>,
    tariff_drop_percent: Option<f64>,

    extreme_enabled: Option<bool>,
    extreme_severity: Option<ApiSeverity>,
    extreme_drop_percent: Option<f64>,

    shocks: Option<Vec<ApiCustomShock>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    horizon_months: u32,
    monthly_rate: f64,
    summary: Option<ProjectionSummary>,
    events: Vec<ShockOutcome>,
    records: Vec<MonthlyRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeverityPreset {
    severity: Severity,
    tariff_drop_percent: f64,
    extreme_drop_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetsResponse {
    tariff_month: u32,
    extreme_month: u32,
    max_years: u32,
    default_years: u32,
    default_monthly_deposit: f64,
    default_annual_rate: f64,
    severities: Vec<SeverityPreset>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_parameters(args: ProjectArgs) -> Result<SimulationParameters, String> {
    if args.years == 0 {
        return Err("--years must be > 0".to_string());
    }
    if args.years > MAX_YEARS {
        return Err(format!("--years must be <= {MAX_YEARS}"));
    }
    if !args.monthly_deposit.is_finite() || args.monthly_deposit < 0.0 {
        return Err("--monthly-deposit must be a finite amount >= 0".to_string());
    }
    if !args.annual_rate.is_finite() || args.annual_rate.abs() > MAX_RATE_MAGNITUDE {
        return Err(format!(
            "--annual-rate must be between -{MAX_RATE_MAGNITUDE} and {MAX_RATE_MAGNITUDE}"
        ));
    }

    let mut shocks = Vec::new();
    if args.tariff {
        let drop = args
            .tariff_drop
            .unwrap_or_else(|| Severity::from(args.tariff_severity).tariff_drop_percent());
        validate_drop_percent(drop, "--tariff-drop")?;
        shocks.push(ShockEvent::tariff(drop));
    }
    if args.extreme {
        let drop = args
            .extreme_drop
            .unwrap_or_else(|| Severity::from(args.extreme_severity).extreme_drop_percent());
        validate_drop_percent(drop, "--extreme-drop")?;
        shocks.push(ShockEvent::extreme(drop));
    }
    for custom in args.shocks {
        if custom.month == 0 {
            return Err("--shock month must be >= 1".to_string());
        }
        validate_drop_percent(custom.drop_percent, "--shock percent")?;
        let label = custom
            .label
            .unwrap_or_else(|| format!("Shock at month {}", custom.month));
        shocks.push(ShockEvent::custom(label, custom.month, custom.drop_percent));
    }

    Ok(SimulationParameters {
        horizon_months: args.years * 12,
        monthly_deposit: args.monthly_deposit,
        annual_rate_percent: args.annual_rate,
        shocks,
    })
}

fn validate_drop_percent(value: f64, flag: &str) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(format!("{flag} must be between 0 and 100"));
    }
    Ok(())
}

pub fn build_simulate_response(params: &SimulationParameters) -> SimulateResponse {
    let records = simulate(params);
    let summary = summarize(&records);
    debug!(
        horizon_months = params.horizon_months,
        monthly_deposit = params.monthly_deposit,
        annual_rate_percent = params.annual_rate_percent,
        shocks = params.shocks.len(),
        final_value = summary.map(|s| s.final_value),
        "projection computed"
    );
    SimulateResponse {
        horizon_months: params.horizon_months,
        monthly_rate: params.monthly_rate(),
        summary,
        events: shock_outcomes(params),
        records,
    }
}

/// Runs one projection from command-line arguments and renders it as JSON.
pub fn project_json(args: ProjectArgs) -> Result<String, String> {
    let params = build_parameters(args)?;
    let response = build_simulate_response(&params);
    serde_json::to_string_pretty(&response).map_err(|e| format!("failed to render projection: {e}"))
}

fn app() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/presets", get(presets_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fundsim HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app()).await
}

async fn index_handler() -> Response {
    static_asset("text/html; charset=utf-8", INDEX_HTML)
}

async fn styles_handler() -> Response {
    static_asset("text/css; charset=utf-8", STYLES_CSS)
}

async fn app_js_handler() -> Response {
    static_asset("application/javascript; charset=utf-8", APP_JS)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn presets_handler() -> Response {
    let defaults = ProjectArgs::default();
    let severities = Severity::ALL
        .into_iter()
        .map(|severity| SeverityPreset {
            severity,
            tariff_drop_percent: severity.tariff_drop_percent(),
            extreme_drop_percent: severity.extreme_drop_percent(),
        })
        .collect();
    json_response(
        StatusCode::OK,
        PresetsResponse {
            tariff_month: TARIFF_EVENT_MONTH,
            extreme_month: EXTREME_EVENT_MONTH,
            max_years: MAX_YEARS,
            default_years: defaults.years,
            default_monthly_deposit: defaults.monthly_deposit,
            default_annual_rate: defaults.annual_rate,
            severities,
        },
    )
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let params = match parameters_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => {
            warn!(error = %msg, "rejected simulation request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    json_response(StatusCode::OK, build_simulate_response(&params))
}

fn static_asset(content_type: &'static str, body: &'static str) -> Response {
    no_store(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Every response is computed per request and must never be served from a cache.
fn no_store(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    no_store((status, Json(body)).into_response())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn parameters_from_json(json: &str) -> Result<SimulationParameters, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    parameters_from_payload(payload)
}

fn parameters_from_payload(payload: SimulatePayload) -> Result<SimulationParameters, String> {
    let mut args = ProjectArgs::default();

    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.monthly_deposit {
        args.monthly_deposit = v;
    }
    if let Some(v) = payload.annual_rate {
        args.annual_rate = v;
    }

    if let Some(v) = payload.tariff_enabled {
        args.tariff = v;
    }
    if let Some(v) = payload.tariff_severity {
        args.tariff_severity = v.into();
    }
    args.tariff_drop = payload.tariff_drop_percent;

    if let Some(v) = payload.extreme_enabled {
        args.extreme = v;
    }
    if let Some(v) = payload.extreme_severity {
        args.extreme_severity = v.into();
    }
    args.extreme_drop = payload.extreme_drop_percent;

    if let Some(shocks) = payload.shocks {
        args.shocks = shocks
            .into_iter()
            .map(|s| CustomShockArg {
                month: s.month,
                drop_percent: s.drop_percent,
                label: s.label.filter(|label| !label.trim().is_empty()),
            })
            .collect();
    }

    build_parameters(args)
}
