use log::{debug, warn};
use std::collections::HashMap;

use crate::config::*;
use crate::stats;

const PER_MILLION: f64 = 1_000_000.0;

/// One line of the table that joins the populations with an allocation.
#[derive(PartialEq, Debug, Clone)]
pub struct RegionSeats {
    pub region: String,
    pub population: f64,
    pub seats: u32,
}

/// The result of joining a population table with an allocation table.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinedTable {
    /// In the order of the population table.
    pub rows: Vec<RegionSeats>,
    /// The regions that had no seats in the allocation. They are given 0 seats.
    pub unmatched: Vec<String>,
}

/// Joins populations and seats by region name.
///
/// Regions missing from the allocation are kept with 0 seats and a warning.
/// Seats given to regions that are unknown to the population table are ignored.
pub fn join_allocation(populations: &[Region], seats: &[(String, u32)]) -> JoinedTable {
    let seats_by_region: HashMap<&str, u32> =
        seats.iter().map(|(r, s)| (r.as_str(), *s)).collect();
    if seats_by_region.len() != seats.len() {
        warn!(
            "join_allocation: {} duplicated region entries in the allocation, keeping the last one",
            seats.len() - seats_by_region.len()
        );
    }
    let mut rows: Vec<RegionSeats> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();
    for r in populations.iter() {
        let seats = match seats_by_region.get(r.name.as_str()) {
            Some(s) => *s,
            None => {
                unmatched.push(r.name.clone());
                0
            }
        };
        rows.push(RegionSeats {
            region: r.name.clone(),
            population: r.population,
            seats,
        });
    }
    if !unmatched.is_empty() {
        warn!(
            "join_allocation: {} regions without an allocation, filling seats=0: {:?}",
            unmatched.len(),
            unmatched
        );
    }
    for (r, _) in seats.iter() {
        if !populations.iter().any(|p| p.name == *r) {
            debug!("join_allocation: ignoring seats of unknown region {:?}", r);
        }
    }
    JoinedTable { rows, unmatched }
}

impl From<&Allocation> for JoinedTable {
    fn from(allocation: &Allocation) -> JoinedTable {
        JoinedTable {
            rows: allocation
                .records
                .iter()
                .map(|r| RegionSeats {
                    region: r.region.clone(),
                    population: r.population,
                    seats: r.seats,
                })
                .collect(),
            unmatched: Vec::new(),
        }
    }
}

/// `num / denom`, absent when the denominator is zero or the result is not finite.
fn ratio(num: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        return None;
    }
    Some(num / denom).filter(|r| r.is_finite())
}

/// Computes the fairness indicators of an allocation.
///
/// Degenerate regions (no population, or no seats at all in the allocation)
/// get absent ratios, which the aggregates skip.
pub fn compute_indicators(allocation: &str, rows: &[RegionSeats]) -> IndicatorTable {
    let total_seats: u64 = rows.iter().map(|r| r.seats as u64).sum();
    let total_population: f64 = rows.iter().map(|r| r.population).sum();
    let seats_f = total_seats as f64;

    let records: Vec<IndicatorRecord> = rows
        .iter()
        .map(|r| {
            let seats = r.seats as f64;
            let seats_share = ratio(seats, seats_f);
            let pop_share = ratio(r.population, total_population);
            let elasticity = match (seats_share, pop_share) {
                (Some(ss), Some(ps)) => ratio(ss, ps),
                _ => None,
            };
            let record = IndicatorRecord {
                region: r.region.clone(),
                population: r.population,
                seats: r.seats,
                seats_share,
                pop_share,
                seats_per_million: ratio(seats, r.population / PER_MILLION),
                elasticity,
                seats_per_person: ratio(seats, r.population),
            };
            if record.elasticity.is_none() || record.seats_per_million.is_none() {
                debug!(
                    "compute_indicators: {}: degenerate metrics for region {:?}",
                    allocation, record
                );
            }
            record
        })
        .collect();

    let summary = summarize(&records, total_seats, total_population);
    debug!("compute_indicators: {}: summary: {:?}", allocation, summary);
    IndicatorTable {
        allocation: allocation.to_string(),
        records,
        summary,
    }
}

fn summarize(records: &[IndicatorRecord], total_seats: u64, total_population: f64) -> SummaryRecord {
    let malapportionment_index = ratio(total_seats as f64, total_population).map(|avg| {
        let deviations: f64 = records
            .iter()
            .filter_map(|r| r.seats_per_person)
            .map(|spp| (spp - avg).abs())
            .sum();
        0.5 * deviations * PER_MILLION
    });
    let spm: Vec<Option<f64>> = records.iter().map(|r| r.seats_per_million).collect();
    let elasticities: Vec<Option<f64>> = records.iter().map(|r| r.elasticity).collect();
    SummaryRecord {
        total_seats,
        total_population,
        malapportionment_index,
        gini: stats::gini(&spm),
        mean_elasticity: stats::mean(&elasticities),
        median_elasticity: stats::median(&elasticities),
        mean_seats_per_million: stats::mean(&spm),
    }
}
