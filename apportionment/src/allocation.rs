use log::debug;
use std::cmp::Ordering;

use crate::config::*;

/// Distributes `seats_total` seats proportionally to `weights` using the
/// largest remainder (Hamilton) method.
///
/// Every position receives the integer part of its quota, and the seats that
/// are left are given one by one to the largest fractional remainders. Equal
/// remainders are resolved by position: the earlier position wins.
///
/// ```
/// # use apportionment::allocate_seats;
/// let seats = allocate_seats(&[100.0, 200.0, 300.0], 6)?;
/// assert_eq!(seats, vec![1, 2, 3]);
/// # Ok::<(), apportionment::AllocationErrors>(())
/// ```
pub fn allocate_seats(weights: &[f64], seats_total: u32) -> Result<Vec<u32>, AllocationErrors> {
    if seats_total == 0 {
        return Err(AllocationErrors::InvalidSeatTotal);
    }
    if let Some((index, &weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(AllocationErrors::InvalidWeight { index, weight });
    }
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Err(AllocationErrors::ZeroTotalWeight);
    }

    let seats_f = seats_total as f64;
    // Multiply first: exact divisions then stay exact.
    let quotas: Vec<f64> = weights
        .iter()
        .map(|w| w * seats_f / total_weight)
        .collect();
    let mut seats: Vec<u32> = quotas.iter().map(|q| q.floor() as u32).collect();
    let remainders: Vec<f64> = quotas
        .iter()
        .zip(seats.iter())
        .map(|(q, s)| q - *s as f64)
        .collect();
    debug!("allocate_seats: quotas: {:?}", quotas);

    // Positions by decreasing remainder, then by increasing position.
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| match remainders[b].total_cmp(&remainders[a]) {
        Ordering::Equal => a.cmp(&b),
        o => o,
    });

    let assigned: u64 = seats.iter().map(|s| *s as u64).sum();
    let leftover = seats_total as i64 - assigned as i64;
    debug!(
        "allocate_seats: base seats: {:?}, leftover: {}",
        seats, leftover
    );

    if leftover >= 0 {
        for idx in order.iter().cycle().take(leftover as usize) {
            seats[*idx] += 1;
        }
    } else {
        // Only reachable through floating point drift in the quotas.
        let mut excess = (-leftover) as usize;
        for idx in order.iter().rev().cycle() {
            if excess == 0 {
                break;
            }
            if seats[*idx] > 0 {
                seats[*idx] -= 1;
                excess -= 1;
            }
        }
    }
    Ok(seats)
}

/// Computes the weight of every region under the given rule.
pub fn weigh_regions(regions: &[Region], rule: &AllocationRule) -> Vec<WeightedRegion> {
    regions
        .iter()
        .map(|r| WeightedRegion {
            region: r.clone(),
            weight: rule.weight(r.population),
        })
        .collect()
}
