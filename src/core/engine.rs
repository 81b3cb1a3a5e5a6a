use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::aggregate::resolve_fund_statistics;
use super::error::ProjectionError;
use super::repository::FundRepository;
use super::simulate::{PathSpec, simulate_paths};
use super::summarize::summarize_ensemble;
use super::types::{ProjectionResult, SimulationRequest};

/// Projects a fund over every requested horizon.
///
/// The generator is seeded from `request.seed`, or from OS entropy when the
/// request carries none, so concurrent requests never share random state.
/// Entropy is only read once the request has passed validation.
pub fn run_projection<F: FundRepository + ?Sized>(
    repo: &F,
    request: &SimulationRequest,
) -> Result<ProjectionResult, ProjectionError> {
    validate_request(request)?;
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    run_projection_with_rng(repo, request, &mut rng)
}

/// Same as [`run_projection`] with a caller supplied generator.
///
/// The request is validated and the fund resolved before the generator is
/// touched; a rejected request consumes no randomness.
pub fn run_projection_with_rng<F, R>(
    repo: &F,
    request: &SimulationRequest,
    rng: &mut R,
) -> Result<ProjectionResult, ProjectionError>
where
    F: FundRepository + ?Sized,
    R: Rng + ?Sized,
{
    validate_request(request)?;
    let stats = resolve_fund_statistics(repo, request.fund_id)?;

    let mut results = Vec::with_capacity(request.horizons.len());
    for &years in &request.horizons {
        let spec = PathSpec {
            mu: stats.mu,
            sigma: stats.sigma,
            initial_amount: request.initial_amount,
            years,
            steps_per_year: request.steps_per_year,
            n_sims: request.n_sims,
        };
        let ensemble = simulate_paths(&spec, &mut *rng)?;
        results.push(summarize_ensemble(years, &ensemble));
    }

    Ok(ProjectionResult {
        fund_name: stats.fund_name,
        results,
    })
}

/// Checks the caller supplied fields. The amount is checked first so a bad
/// amount never reaches the repository.
pub fn validate_request(request: &SimulationRequest) -> Result<(), ProjectionError> {
    if !request.initial_amount.is_finite() || request.initial_amount <= 0.0 {
        return Err(ProjectionError::InvalidAmount {
            amount: request.initial_amount,
        });
    }

    if request.horizons.is_empty() {
        return Err(ProjectionError::invalid_parameter(
            "horizons",
            "at least one horizon is required",
        ));
    }

    if let Some(bad) = request.horizons.iter().find(|&&years| years == 0) {
        return Err(ProjectionError::invalid_parameter(
            "horizons",
            format!("horizon {bad} must be a positive number of years"),
        ));
    }

    if request.n_sims == 0 {
        return Err(ProjectionError::invalid_parameter("n_sims", "must be > 0"));
    }

    if request.steps_per_year == 0 {
        return Err(ProjectionError::invalid_parameter(
            "steps_per_year",
            "must be > 0",
        ));
    }

    Ok(())
}
