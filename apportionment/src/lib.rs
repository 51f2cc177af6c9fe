mod allocation;
pub mod builder;
mod comparative;
mod config;
mod indicators;
pub mod manual;
pub mod stats;

use log::{debug, info, warn};

pub use crate::allocation::*;
pub use crate::comparative::*;
pub use crate::config::*;
pub use crate::indicators::*;

/// Allocates the seats between the regions with the given rule.
///
/// Arguments:
/// * `regions` the regions, in the order in which ties are resolved
/// * `rule` the apportionment rule
/// * `seats_total` the number of seats to distribute
pub fn run_allocation(
    regions: &[Region],
    rule: &AllocationRule,
    seats_total: u32,
) -> Result<Allocation, AllocationErrors> {
    info!(
        "run_allocation: {} regions, {} seats, rule: {:?}",
        regions.len(),
        seats_total,
        rule
    );
    let rule: AllocationRule = match rule {
        AllocationRule::Proportional => AllocationRule::Proportional,
        AllocationRule::Degressive { alpha } => AllocationRule::degressive(*alpha)?,
    };

    let weighted = weigh_regions(regions, &rule);
    let weights: Vec<f64> = weighted.iter().map(|wr| wr.weight).collect();
    let seats = allocate_seats(&weights, seats_total).map_err(|e| match e {
        AllocationErrors::InvalidWeight { index, weight } => {
            AllocationErrors::InvalidRegionWeight {
                region: regions[index].name.clone(),
                weight,
            }
        }
        e => e,
    })?;

    let records: Vec<AllocationRecord> = weighted
        .iter()
        .zip(seats.iter())
        .map(|(wr, s)| AllocationRecord {
            region: wr.region.name.clone(),
            population: wr.region.population,
            seats: *s,
        })
        .collect();
    for r in records.iter() {
        debug!("run_allocation: {}: {} -> {}", rule.label(), r.region, r.seats);
    }
    Ok(Allocation {
        rule,
        seats_total,
        records,
    })
}

/// Runs every rule of the configuration independently.
///
/// The results are in the order of the rules. A failing rule does not
/// prevent the other ones from running.
pub fn run_apportionment(
    regions: &[Region],
    config: &ApportionmentConfig,
) -> Vec<Result<Allocation, AllocationErrors>> {
    if !config.is_standard_size() {
        warn!(
            "run_apportionment: {} seats is not one of the legislature sizes {:?}",
            config.seats_total,
            ApportionmentConfig::LEGISLATURE_SIZES
        );
    }
    config
        .rules
        .iter()
        .map(|rule| {
            let res = run_allocation(regions, rule, config.seats_total);
            if let Err(e) = &res {
                warn!("run_apportionment: {}: {}", rule.label(), e);
            }
            res
        })
        .collect()
}

/// Computes the indicator tables of all the allocations, followed by the
/// comparison of each degressive allocation with the proportional one.
///
/// The baseline is the first proportional allocation. If there is none, no
/// comparison is made.
pub fn analyze_allocations(
    allocations: &[Allocation],
) -> (Vec<IndicatorTable>, Vec<ComparativeRecord>) {
    let tables: Vec<IndicatorTable> = allocations
        .iter()
        .map(|a| compute_indicators(&a.label(), &JoinedTable::from(a).rows))
        .collect();
    let baseline = allocations
        .iter()
        .position(|a| a.rule.is_baseline())
        .map(|idx| &tables[idx]);
    let comparisons = match baseline {
        Some(base) => tables
            .iter()
            .filter_map(|t| compare_to_baseline(t, base))
            .collect(),
        None => Vec::new(),
    };
    (tables, comparisons)
}
