use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::{
    CsvFundRepository, DEFAULT_HORIZONS, DEFAULT_SIMULATIONS, DEFAULT_STEPS_PER_YEAR,
    FundRepository, FundSummary, ProjectionError, SimulationRequest, run_projection,
};

const DEFAULT_DATA_PATH: &str = "data/fund_allocation.csv";
const MAX_SIMULATIONS: u32 = 100_000;
const MAX_STEPS_PER_HORIZON: u64 = 1_200;
const MAX_HORIZONS: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "fundcast",
    about = "Monte Carlo fund value projections (GBM paths summarized into percentile bands)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[command(flatten)]
        data: DataArgs,
    },
    /// Run one projection and print it as JSON
    Project {
        #[command(flatten)]
        args: ProjectArgs,
        #[command(flatten)]
        data: DataArgs,
    },
    /// List the funds in the allocation table
    Funds {
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct DataArgs {
    #[arg(
        long = "data",
        default_value = DEFAULT_DATA_PATH,
        help = "Fund allocation CSV (FUND_ID, FUND_NAME, PERCENT_OF_FUND, AVG_RETURN_10Y, STD_DEV_10Y)"
    )]
    path: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    #[arg(long)]
    fund_id: i64,
    #[arg(long, help = "Initial investment amount")]
    amount: f64,
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = DEFAULT_HORIZONS,
        help = "Projection horizons in years, comma separated"
    )]
    horizons: Vec<u32>,
    #[arg(long, default_value_t = DEFAULT_SIMULATIONS)]
    simulations: u32,
    #[arg(long, default_value_t = DEFAULT_STEPS_PER_YEAR)]
    steps_per_year: u32,
    #[arg(long, help = "Seed for reproducible runs; omitted means a fresh random seed")]
    seed: Option<u64>,
}

impl ProjectArgs {
    fn with_defaults(fund_id: i64, amount: f64) -> Self {
        Self {
            fund_id,
            amount,
            horizons: DEFAULT_HORIZONS.to_vec(),
            simulations: DEFAULT_SIMULATIONS,
            steps_per_year: DEFAULT_STEPS_PER_YEAR,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum HorizonsField {
    List(Vec<u32>),
    Text(String),
}

impl HorizonsField {
    fn into_years(self) -> Result<Vec<u32>, String> {
        match self {
            HorizonsField::List(years) => Ok(years),
            HorizonsField::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<u32>()
                        .map_err(|_| format!("--horizons: '{s}' is not a whole number of years"))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    #[serde(alias = "fund", alias = "fund_id")]
    fund_id: Option<i64>,
    #[serde(alias = "initialAmount", alias = "initial_amount")]
    amount: Option<f64>,
    #[serde(alias = "years")]
    horizons: Option<HorizonsField>,
    #[serde(alias = "nSims", alias = "n_sims")]
    simulations: Option<u32>,
    #[serde(alias = "steps_per_year")]
    steps_per_year: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct FundsResponse {
    funds: Vec<FundSummary>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    funds: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    repo: Arc<dyn FundRepository + Send + Sync>,
}

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Serve { port, data } => {
            let repo = load_repository(&data)?;
            run_http_server(port, Arc::new(repo)).await?;
        }
        Command::Project { args, data } => {
            let repo = load_repository(&data)?;
            let request = build_request(args)?;
            let result = run_projection(&repo, &request)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Funds { data } => {
            let repo = load_repository(&data)?;
            let response = FundsResponse {
                funds: repo.funds()?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}

fn load_repository(data: &DataArgs) -> Result<CsvFundRepository, ProjectionError> {
    let repo = CsvFundRepository::open(&data.path)?;
    info!(
        path = %data.path.display(),
        rows = repo.len(),
        "loaded fund allocation table"
    );
    Ok(repo)
}

fn build_request(args: ProjectArgs) -> Result<SimulationRequest, String> {
    if args.simulations > MAX_SIMULATIONS {
        return Err(format!("--simulations must be <= {MAX_SIMULATIONS}"));
    }

    if args.horizons.len() > MAX_HORIZONS {
        return Err(format!("--horizons accepts at most {MAX_HORIZONS} entries"));
    }

    let longest = args.horizons.iter().copied().max().unwrap_or(0);
    if u64::from(longest) * u64::from(args.steps_per_year) > MAX_STEPS_PER_HORIZON {
        return Err(format!(
            "--horizons x --steps-per-year must be <= {MAX_STEPS_PER_HORIZON} steps per horizon"
        ));
    }

    Ok(SimulationRequest {
        fund_id: args.fund_id,
        initial_amount: args.amount,
        horizons: args.horizons,
        n_sims: args.simulations,
        steps_per_year: args.steps_per_year,
        seed: args.seed,
    })
}

fn request_from_payload(payload: ProjectPayload) -> Result<SimulationRequest, String> {
    let fund_id = payload.fund_id.ok_or("fundId is required")?;
    let amount = payload.amount.ok_or("amount is required")?;
    let mut args = ProjectArgs::with_defaults(fund_id, amount);

    if let Some(v) = payload.horizons {
        args.horizons = v.into_years()?;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.steps_per_year {
        args.steps_per_year = v;
    }
    if payload.seed.is_some() {
        args.seed = payload.seed;
    }

    build_request(args)
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<SimulationRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/funds", get(funds_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(
    port: u16,
    repo: Arc<dyn FundRepository + Send + Sync>,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState { repo });

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fundcast HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/funds");

    axum::serve(listener, app).await
}

async fn health_handler(State(state): State<AppState>) -> Response {
    match state.repo.funds() {
        Ok(funds) => json_response(
            StatusCode::OK,
            HealthResponse {
                status: "ok",
                funds: funds.len(),
            },
        ),
        Err(e) => projection_error_response(&e),
    }
}

async fn funds_handler(State(state): State<AppState>) -> Response {
    match state.repo.funds() {
        Ok(funds) => json_response(StatusCode::OK, FundsResponse { funds }),
        Err(e) => projection_error_response(&e),
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ProjectPayload>,
) -> Response {
    project_handler_impl(state, payload).await
}

async fn project_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Response {
    project_handler_impl(state, payload).await
}

async fn project_handler_impl(state: AppState, payload: ProjectPayload) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(reason = %msg, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let started = Instant::now();
    let fund_id = request.fund_id;
    let horizons = request.horizons.clone();
    let n_sims = request.n_sims;

    let repo = Arc::clone(&state.repo);
    let outcome =
        tokio::task::spawn_blocking(move || run_projection(repo.as_ref(), &request)).await;

    match outcome {
        Ok(Ok(result)) => {
            info!(
                fund_id,
                ?horizons,
                n_sims,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "projection complete"
            );
            json_response(StatusCode::OK, result)
        }
        Ok(Err(e)) => projection_error_response(&e),
        Err(join_err) => {
            error!(error = %join_err, fund_id, "projection task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation error")
        }
    }
}

fn status_for(err: &ProjectionError) -> StatusCode {
    match err {
        ProjectionError::FundNotFound { .. } => StatusCode::NOT_FOUND,
        ProjectionError::InvalidAmount { .. } | ProjectionError::InvalidParameter { .. } => {
            StatusCode::BAD_REQUEST
        }
        ProjectionError::DataSource(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn projection_error_response(err: &ProjectionError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        error!(error = %err, "fund data unavailable");
    } else {
        warn!(error = %err, "projection rejected");
    }
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
