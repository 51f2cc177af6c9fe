use log::{debug, info};
use std::collections::HashMap;

use crate::config::*;
use crate::stats;

/// Summary of the distribution of the elasticities of one allocation.
pub fn elasticity_summary(table: &IndicatorTable) -> ElasticitySummary {
    let elasticities: Vec<Option<f64>> = table.records.iter().map(|r| r.elasticity).collect();
    ElasticitySummary {
        allocation: table.allocation.clone(),
        mean: stats::mean(&elasticities),
        median: stats::median(&elasticities),
        p10: stats::percentile(&elasticities, 10.0),
        p90: stats::percentile(&elasticities, 90.0),
    }
}

/// Mean of |spm_candidate - spm_baseline| / spm_baseline over the regions of
/// the candidate, matched by name with the baseline.
///
/// Regions without a baseline value, or with a baseline value of zero, do not
/// contribute.
pub fn mean_relative_change(candidate: &IndicatorTable, baseline: &IndicatorTable) -> Option<f64> {
    let baseline_spm: HashMap<&str, Option<f64>> = baseline
        .records
        .iter()
        .map(|r| (r.region.as_str(), r.seats_per_million))
        .collect();
    let changes: Vec<Option<f64>> = candidate
        .records
        .iter()
        .map(|r| {
            match (r.seats_per_million, baseline_spm.get(r.region.as_str())) {
                (Some(cur), Some(Some(base))) if *base != 0.0 => {
                    Some(((cur - base) / base).abs())
                }
                _ => {
                    debug!(
                        "mean_relative_change: {}: no baseline for region {:?}",
                        candidate.allocation, r.region
                    );
                    None
                }
            }
        })
        .collect();
    stats::mean(&changes)
}

/// Compares an allocation with the proportional baseline.
///
/// Returns nothing when the candidate is the baseline itself.
pub fn compare_to_baseline(
    candidate: &IndicatorTable,
    baseline: &IndicatorTable,
) -> Option<ComparativeRecord> {
    if candidate.allocation == baseline.allocation {
        debug!(
            "compare_to_baseline: skipping the baseline {}",
            baseline.allocation
        );
        return None;
    }
    let es = elasticity_summary(candidate);
    let mrc = mean_relative_change(candidate, baseline);
    info!(
        "{} vs {}: mrc: {:?} elasticity p10: {:?} p90: {:?}",
        candidate.allocation, baseline.allocation, mrc, es.p10, es.p90
    );
    Some(ComparativeRecord {
        allocation: candidate.allocation.clone(),
        elasticity_p10: es.p10,
        elasticity_p90: es.p90,
        mrc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{compute_indicators, RegionSeats};

    fn table(name: &str, data: &[(&str, f64, u32)]) -> IndicatorTable {
        let rows: Vec<RegionSeats> = data
            .iter()
            .map(|(r, p, s)| RegionSeats {
                region: r.to_string(),
                population: *p,
                seats: *s,
            })
            .collect();
        compute_indicators(name, &rows)
    }

    #[test]
    fn mrc_against_itself_is_zero() {
        let t = table("a", &[("A", 1e6, 3), ("B", 2e6, 1), ("C", 5e5, 2)]);
        assert_eq!(mean_relative_change(&t, &t), Some(0.0));
        assert_eq!(compare_to_baseline(&t, &t), None);
    }

    #[test]
    fn mrc_matches_by_region() {
        let base = table("proportional", &[("A", 1e6, 2), ("B", 1e6, 2)]);
        // Regions in a different order. A: 4 vs 2 (+100%), B: 1 vs 2 (-50%)
        let cand = table("dp", &[("B", 1e6, 1), ("A", 1e6, 4)]);
        let c = compare_to_baseline(&cand, &base).unwrap();
        assert!((c.mrc.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(c.allocation, "dp");
    }

    #[test]
    fn mrc_skips_zero_baseline() {
        let base = table("proportional", &[("A", 1e6, 2), ("B", 1e6, 0), ("C", 0.0, 0)]);
        let cand = table("dp", &[("A", 1e6, 1), ("B", 1e6, 1), ("C", 0.0, 0)]);
        let mrc = mean_relative_change(&cand, &base).unwrap();
        assert!((mrc - 0.5).abs() < 1e-12);

        let none = table("none", &[("Z", 1e6, 1)]);
        assert_eq!(mean_relative_change(&none, &base), None);
    }

    #[test]
    fn elasticity_percentiles() {
        let t = table(
            "t",
            &[
                ("A", 1e6, 1),
                ("B", 1e6, 2),
                ("C", 1e6, 3),
                ("D", 1e6, 4),
                ("E", 1e6, 5),
            ],
        );
        // elasticities: 1/3, 2/3, 1, 4/3, 5/3
        let es = elasticity_summary(&t);
        assert!((es.median.unwrap() - 1.0).abs() < 1e-12);
        assert!((es.p10.unwrap() - (1.0 / 3.0 + 0.4 / 3.0)).abs() < 1e-12);
        assert!((es.p90.unwrap() - (4.0 / 3.0 + 0.6 / 3.0)).abs() < 1e-12);
    }
}
