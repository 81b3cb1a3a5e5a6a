use super::error::ProjectionError;
use super::repository::FundRepository;
use super::types::{FundAllocationRow, FundStatistics};

/// Weighted drift and volatility for one fund.
///
/// Weights and the 10 year figures are both percentages, so each weighted sum
/// is divided by 100 twice: `mu = Σ(w/100 × r) / 100`. The weights are used as
/// given; a fund whose weights do not total 100 is not rescaled.
pub fn aggregate_fund_statistics(
    fund_id: i64,
    rows: &[FundAllocationRow],
) -> Result<FundStatistics, ProjectionError> {
    let mut matching = rows.iter().filter(|row| row.fund_id == fund_id).peekable();
    let Some(first) = matching.peek() else {
        return Err(ProjectionError::FundNotFound { fund_id });
    };
    let fund_name = first.fund_name.clone();

    let mut return_terms = Vec::new();
    let mut vol_terms = Vec::new();
    for row in matching {
        let weight = row.percent_of_fund / 100.0;
        return_terms.push(weight * row.avg_return_10y);
        vol_terms.push(weight * row.std_dev_10y);
    }

    Ok(FundStatistics {
        fund_id,
        fund_name,
        mu: ordered_sum(&mut return_terms) / 100.0,
        sigma: ordered_sum(&mut vol_terms) / 100.0,
    })
}

/// Looks the fund up in `repo` and aggregates it.
pub fn resolve_fund_statistics<R: FundRepository + ?Sized>(
    repo: &R,
    fund_id: i64,
) -> Result<FundStatistics, ProjectionError> {
    let rows = repo.composition(fund_id)?;
    aggregate_fund_statistics(fund_id, &rows)
}

// Summing in sorted order makes the result independent of row order.
fn ordered_sum(terms: &mut [f64]) -> f64 {
    terms.sort_by(|a, b| a.total_cmp(b));
    terms.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert_eq, proptest};

    const EPS: f64 = 1e-12;

    fn row(fund_id: i64, asset: &str, pct: f64, ret: f64, sd: f64) -> FundAllocationRow {
        FundAllocationRow {
            fund_id,
            fund_name: format!("Fund {fund_id}"),
            asset_class: asset.to_string(),
            percent_of_fund: pct,
            avg_return_10y: ret,
            std_dev_10y: sd,
        }
    }

    #[test]
    fn single_asset_fund_converts_percent_to_fraction() {
        let stats =
            aggregate_fund_statistics(1, &[row(1, "Equities", 100.0, 7.0, 0.0)]).expect("found");
        assert!((stats.mu - 0.07).abs() < EPS);
        assert_eq!(stats.sigma, 0.0);
        assert_eq!(stats.fund_name, "Fund 1");
    }

    #[test]
    fn weighted_average_matches_hand_calculation() {
        let rows = [
            row(1, "Equities", 60.0, 8.5, 15.0),
            row(1, "Bonds", 40.0, 3.0, 5.0),
            row(2, "Other", 100.0, 50.0, 50.0),
        ];
        let stats = aggregate_fund_statistics(1, &rows).expect("found");
        // 0.6 * 8.5 + 0.4 * 3.0 = 6.3, 0.6 * 15 + 0.4 * 5 = 11
        assert!((stats.mu - 0.063).abs() < EPS);
        assert!((stats.sigma - 0.11).abs() < EPS);
    }

    #[test]
    fn weights_not_summing_to_hundred_are_used_as_given() {
        let rows = [row(5, "Equities", 50.0, 10.0, 20.0)];
        let stats = aggregate_fund_statistics(5, &rows).expect("found");
        assert!((stats.mu - 0.05).abs() < EPS);
        assert!((stats.sigma - 0.10).abs() < EPS);
    }

    #[test]
    fn first_row_name_wins_when_names_disagree() {
        let mut second = row(9, "Bonds", 50.0, 2.0, 3.0);
        second.fund_name = "Renamed".to_string();
        let rows = [row(9, "Equities", 50.0, 6.0, 12.0), second];
        let stats = aggregate_fund_statistics(9, &rows).expect("found");
        assert_eq!(stats.fund_name, "Fund 9");
    }

    #[test]
    fn missing_fund_is_reported() {
        let err = aggregate_fund_statistics(42, &[row(1, "Equities", 100.0, 7.0, 10.0)])
            .expect_err("fund 42 has no rows");
        assert_eq!(err, ProjectionError::FundNotFound { fund_id: 42 });

        let err = aggregate_fund_statistics(42, &[]).expect_err("empty table");
        assert_eq!(err, ProjectionError::FundNotFound { fund_id: 42 });
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_permuting_rows_does_not_change_statistics(
            weights in proptest::collection::vec(0.0f64..100.0, 1..8),
            returns in proptest::collection::vec(-20.0f64..30.0, 8),
            vols in proptest::collection::vec(0.0f64..40.0, 8),
            sort_keys in proptest::collection::vec(any::<u64>(), 8),
        ) {
            let rows: Vec<_> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| row(3, &format!("class-{i}"), *w, returns[i], vols[i]))
                .collect();

            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by_key(|&i| sort_keys[i]);
            let permuted: Vec<_> = order.iter().map(|&i| rows[i].clone()).collect();

            let base = aggregate_fund_statistics(3, &rows).expect("found");
            let shuffled = aggregate_fund_statistics(3, &permuted).expect("found");
            prop_assert_eq!(base.mu.to_bits(), shuffled.mu.to_bits());
            prop_assert_eq!(base.sigma.to_bits(), shuffled.sigma.to_bits());
        }
    }
}
