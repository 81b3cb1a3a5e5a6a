use serde::Serialize;

pub const DEFAULT_HORIZONS: [u32; 3] = [1, 5, 10];
pub const DEFAULT_SIMULATIONS: u32 = 3_000;
pub const DEFAULT_STEPS_PER_YEAR: u32 = 1;

/// One asset class of a fund, as loaded from the composition table.
///
/// Percent fields keep their source units: `percent_of_fund` is 0..=100 and
/// the 10 year figures are percentages, not fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct FundAllocationRow {
    pub fund_id: i64,
    pub fund_name: String,
    pub asset_class: String,
    pub percent_of_fund: f64,
    pub avg_return_10y: f64,
    pub std_dev_10y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundSummary {
    pub fund_id: i64,
    pub fund_name: String,
}

/// Aggregate drift and volatility of a fund, both as fractional annual rates.
#[derive(Debug, Clone, PartialEq)]
pub struct FundStatistics {
    pub fund_id: i64,
    pub fund_name: String,
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub fund_id: i64,
    pub initial_amount: f64,
    pub horizons: Vec<u32>,
    pub n_sims: u32,
    pub steps_per_year: u32,
    /// Seeds the per-request generator; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl SimulationRequest {
    pub fn new(fund_id: i64, initial_amount: f64) -> Self {
        Self {
            fund_id,
            initial_amount,
            horizons: DEFAULT_HORIZONS.to_vec(),
            n_sims: DEFAULT_SIMULATIONS,
            steps_per_year: DEFAULT_STEPS_PER_YEAR,
            seed: None,
        }
    }
}

/// Simulated value trajectories for one horizon, stored row-major:
/// `values[sim * points + step]`.
#[derive(Debug, Clone)]
pub struct PathEnsemble {
    sims: usize,
    points: usize,
    values: Vec<f64>,
}

impl PathEnsemble {
    pub(crate) fn from_values(sims: usize, points: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), sims * points);
        Self {
            sims,
            points,
            values,
        }
    }

    pub fn sims(&self) -> usize {
        self.sims
    }

    /// Number of time points per path, including step 0.
    pub fn points(&self) -> usize {
        self.points
    }

    pub fn path(&self, sim: usize) -> &[f64] {
        let start = sim * self.points;
        &self.values[start..start + self.points]
    }

    pub fn paths(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.points.max(1))
    }

    /// Copies the cross-section at `step` (one value per simulation) into `out`.
    pub fn cross_section_into(&self, step: usize, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.paths().map(|path| path[step]));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonResult {
    pub years: u32,
    pub timeline: Vec<u32>,
    pub p10: Vec<f64>,
    pub p25: Vec<f64>,
    pub median: Vec<f64>,
    pub p75: Vec<f64>,
    pub p90: Vec<f64>,
    pub final_p25: f64,
    pub final_median: f64,
    pub final_p75: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub fund_name: String,
    pub results: Vec<HorizonResult>,
}
