mod aggregate;
mod engine;
mod error;
mod repository;
mod simulate;
mod summarize;
mod types;

pub use aggregate::{aggregate_fund_statistics, resolve_fund_statistics};
pub use engine::{run_projection, run_projection_with_rng, validate_request};
pub use error::ProjectionError;
pub use repository::{CsvFundRepository, FundRepository, InMemoryFundRepository};
pub use simulate::{PathSpec, simulate_paths};
pub use summarize::{BAND_PERCENTILES, percentile_sorted, summarize_ensemble};
pub use types::{
    DEFAULT_HORIZONS, DEFAULT_SIMULATIONS, DEFAULT_STEPS_PER_YEAR, FundAllocationRow,
    FundStatistics, FundSummary, HorizonResult, PathEnsemble, ProjectionResult, SimulationRequest,
};
