use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

use super::error::ProjectionError;
use super::types::PathEnsemble;

/// Parameters of one geometric Brownian motion run.
#[derive(Debug, Clone, Copy)]
pub struct PathSpec {
    pub mu: f64,
    pub sigma: f64,
    pub initial_amount: f64,
    pub years: u32,
    pub steps_per_year: u32,
    pub n_sims: u32,
}

impl PathSpec {
    pub fn steps(&self) -> usize {
        self.years as usize * self.steps_per_year as usize
    }
}

/// Simulates `n_sims` value paths of `steps + 1` points each.
///
/// Log space discretization with `dt = 1 / steps_per_year`:
/// `ln S[t+1] - ln S[t] = (mu - sigma²/2)·dt + sigma·√dt·z`, `z ~ N(0, 1)`
/// drawn independently per simulation and step. Every path starts at exactly
/// `initial_amount`. A non-positive sigma leaves pure drift and no draws.
pub fn simulate_paths<R: Rng + ?Sized>(
    spec: &PathSpec,
    rng: &mut R,
) -> Result<PathEnsemble, ProjectionError> {
    if spec.n_sims == 0 {
        return Err(ProjectionError::invalid_parameter(
            "n_sims",
            "at least one simulation is required",
        ));
    }
    if spec.steps_per_year == 0 {
        return Err(ProjectionError::invalid_parameter(
            "steps_per_year",
            "must be > 0",
        ));
    }

    let sims = spec.n_sims as usize;
    let steps = spec.steps();
    let points = steps + 1;
    let dt = 1.0 / spec.steps_per_year as f64;
    let sigma = spec.sigma.max(0.0);
    let drift = (spec.mu - 0.5 * sigma * sigma) * dt;
    let diffusion = sigma * dt.sqrt();

    let normal = if diffusion > 0.0 {
        Some(Normal::new(0.0, 1.0).map_err(|e| {
            ProjectionError::invalid_parameter("sigma", format!("normal sampler: {e}"))
        })?)
    } else {
        None
    };

    let mut values = Vec::with_capacity(sims * points);
    for _ in 0..sims {
        let mut log_value = 0.0_f64;
        values.push(spec.initial_amount);
        for _ in 0..steps {
            let shock = match &normal {
                Some(n) => diffusion * n.sample(&mut *rng),
                None => 0.0,
            };
            log_value += drift + shock;
            values.push(spec.initial_amount * log_value.exp());
        }
    }

    Ok(PathEnsemble::from_values(sims, points, values))
}
