use super::types::{HorizonResult, PathEnsemble};

pub const BAND_PERCENTILES: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];

/// Reduces an ensemble to rounded p10/p25/p50/p75/p90 bands.
///
/// Each time index is summarized on its own, so the p10 sequence traces the
/// lower decile boundary over time rather than any single simulated path.
pub fn summarize_ensemble(years: u32, ensemble: &PathEnsemble) -> HorizonResult {
    let points = ensemble.points();
    let mut bands: [Vec<f64>; 5] = std::array::from_fn(|_| Vec::with_capacity(points));
    let mut column = Vec::with_capacity(ensemble.sims());

    for step in 0..points {
        ensemble.cross_section_into(step, &mut column);
        column.sort_by(|a, b| a.total_cmp(b));
        for (band, p) in bands.iter_mut().zip(BAND_PERCENTILES) {
            band.push(percentile_sorted(&column, p).round_ties_even());
        }
    }

    let [p10, p25, median, p75, p90] = bands;

    HorizonResult {
        years,
        timeline: (0..points as u32).collect(),
        final_p25: last_value(&p25),
        final_median: last_value(&median),
        final_p75: last_value(&p75),
        p10,
        p25,
        median,
        p75,
        p90,
    }
}

fn last_value(band: &[f64]) -> f64 {
    band.last().copied().unwrap_or(0.0)
}

/// Linear interpolation between closest ranks on already sorted data,
/// with `rank = p/100 × (n - 1)`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        // Exact when both neighbours are equal.
        sorted[lower] + (sorted[upper] - sorted[lower]) * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn ensemble(paths: &[&[f64]]) -> PathEnsemble {
        let points = paths[0].len();
        let values = paths.iter().flat_map(|p| p.iter().copied()).collect();
        PathEnsemble::from_values(paths.len(), points, values)
    }

    #[test]
    fn percentile_interpolates_between_points() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_approx(percentile_sorted(&values, 25.0), 1.75);
        assert_approx(percentile_sorted(&values, 50.0), 2.5);
        assert_approx(percentile_sorted(&values, 90.0), 3.7);
        assert_approx(percentile_sorted(&values, 0.0), 1.0);
        assert_approx(percentile_sorted(&values, 100.0), 4.0);
    }

    #[test]
    fn percentile_of_single_and_empty_inputs() {
        assert_eq!(percentile_sorted(&[42.0], 10.0), 42.0);
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
    }

    #[test]
    fn percentile_of_identical_values_is_exact() {
        let values = [107_250.818_125_8; 7];
        for p in BAND_PERCENTILES {
            assert_eq!(percentile_sorted(&values, p), values[0]);
        }
    }

    #[test]
    fn bands_are_cross_sectional_not_path_tracking() {
        // Path A is worst at step 1 but best at step 2.
        let a: &[f64] = &[100.0, 50.0, 300.0];
        let b: &[f64] = &[100.0, 150.0, 100.0];
        let c: &[f64] = &[100.0, 100.0, 200.0];
        let result = summarize_ensemble(2, &ensemble(&[a, b, c]));

        assert_eq!(result.timeline, vec![0, 1, 2]);
        assert_eq!(result.median, vec![100.0, 100.0, 200.0]);
        // p10 at step 1: 50 + (100 - 50) * 0.2 = 60; at step 2: 100 + 100 * 0.2 = 120.
        assert_eq!(result.p10, vec![100.0, 60.0, 120.0]);
        assert_eq!(result.p90, vec![100.0, 140.0, 280.0]);
        assert_eq!(result.final_median, 200.0);
        assert_eq!(result.final_p25, 150.0);
        assert_eq!(result.final_p75, 250.0);
    }

    #[test]
    fn values_are_rounded_to_whole_units() {
        let a: &[f64] = &[1_000.0, 1_234.3];
        let b: &[f64] = &[1_000.0, 1_234.9];
        let result = summarize_ensemble(1, &ensemble(&[a, b]));
        assert_eq!(result.p10[1], 1_234.0);
        assert_eq!(result.median[1], 1_235.0);
        assert_eq!(result.p90[1], 1_235.0);
    }

    #[test]
    fn half_units_round_to_even() {
        let a: &[f64] = &[2_500.5, 0.5, 1_501.5];
        let b: &[f64] = &[2_500.5, 0.5, 1_501.5];
        let result = summarize_ensemble(2, &ensemble(&[a, b]));
        assert_eq!(result.median, vec![2_500.0, 0.0, 1_502.0]);
        assert_eq!(result.final_p25, 1_502.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_bands_are_ordered_and_aligned(
            sims in 1usize..40,
            points in 1usize..12,
            raw in proptest::collection::vec(1.0f64..1_000_000.0, 480),
        ) {
            let values: Vec<f64> = raw.iter().cycle().take(sims * points).copied().collect();
            let result = summarize_ensemble(3, &PathEnsemble::from_values(sims, points, values));

            prop_assert_eq!(result.timeline.len(), points);
            for band in [&result.p10, &result.p25, &result.median, &result.p75, &result.p90] {
                prop_assert_eq!(band.len(), points);
            }
            for t in 0..points {
                prop_assert!(result.p10[t] <= result.p25[t]);
                prop_assert!(result.p25[t] <= result.median[t]);
                prop_assert!(result.median[t] <= result.p75[t]);
                prop_assert!(result.p75[t] <= result.p90[t]);
            }
            prop_assert_eq!(result.final_p25, result.p25[points - 1]);
            prop_assert_eq!(result.final_median, result.median[points - 1]);
            prop_assert_eq!(result.final_p75, result.p75[points - 1]);
        }
    }
}
