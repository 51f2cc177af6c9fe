//! Reducers over distributions in which some values may be absent.
//!
//! Absent values (`None`) and non-finite values are skipped by every function
//! of this module.

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| match v {
            Some(x) if x.is_finite() => Some(*x),
            _ => None,
        })
        .collect()
}

fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut xs = present(values);
    xs.sort_by(|a, b| a.total_cmp(b));
    xs
}

pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let xs = present(values);
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

pub fn median(values: &[Option<f64>]) -> Option<f64> {
    percentile(values, 50.0)
}

/// The q-th percentile (q in [0, 100]), interpolating linearly between the
/// two closest ranks.
pub fn percentile(values: &[Option<f64>], q: f64) -> Option<f64> {
    let xs = sorted_present(values);
    if xs.is_empty() {
        return None;
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (xs.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(xs[lo] + (xs[hi] - xs[lo]) * frac)
}

/// Gini coefficient of a distribution.
///
/// Negative distributions are shifted by their minimum first. A distribution
/// that sums to zero has a coefficient of zero. An empty distribution has no
/// coefficient.
pub fn gini(values: &[Option<f64>]) -> Option<f64> {
    let mut xs = sorted_present(values);
    if xs.is_empty() {
        return None;
    }
    let min = xs[0];
    if min < 0.0 {
        for x in xs.iter_mut() {
            *x -= min;
        }
    }
    let total: f64 = xs.iter().sum();
    if total == 0.0 {
        return Some(0.0);
    }
    let n = xs.len() as f64;
    let weighted: f64 = xs
        .iter()
        .enumerate()
        .map(|(idx, x)| (idx + 1) as f64 * x)
        .sum();
    Some(2.0 * weighted / (n * total) - (n + 1.0) / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(xs: &[f64]) -> Vec<Option<f64>> {
        xs.iter().map(|x| Some(*x)).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn gini_uniform_is_zero() {
        assert_close(gini(&some(&[3.0, 3.0, 3.0, 3.0])).unwrap(), 0.0);
    }

    #[test]
    fn gini_scale_invariant() {
        let xs = [1.0, 2.0, 5.0, 11.0];
        let scaled: Vec<f64> = xs.iter().map(|x| x * 37.5).collect();
        assert_close(gini(&some(&xs)).unwrap(), gini(&some(&scaled)).unwrap());
    }

    #[test]
    fn gini_concentrated() {
        // One holder out of four: (n - 1) / n
        assert_close(gini(&some(&[0.0, 0.0, 0.0, 8.0])).unwrap(), 0.75);
    }

    #[test]
    fn gini_degenerate() {
        assert_eq!(gini(&[]), None);
        assert_eq!(gini(&[None, Some(f64::NAN)]), None);
        assert_close(gini(&some(&[0.0, 0.0])).unwrap(), 0.0);
        // Shifted by the minimum: same as [0, 1, 2]
        assert_close(
            gini(&some(&[-1.0, 0.0, 1.0])).unwrap(),
            gini(&some(&[0.0, 1.0, 2.0])).unwrap(),
        );
    }

    #[test]
    fn reducers_skip_absent() {
        let xs = vec![Some(1.0), None, Some(3.0), Some(f64::INFINITY)];
        assert_close(mean(&xs).unwrap(), 2.0);
        assert_close(median(&xs).unwrap(), 2.0);
        assert_eq!(mean(&[None]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn percentile_interpolates() {
        let xs = some(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_close(percentile(&xs, 10.0).unwrap(), 1.4);
        assert_close(percentile(&xs, 90.0).unwrap(), 4.6);
        assert_close(percentile(&xs, 0.0).unwrap(), 1.0);
        assert_close(percentile(&xs, 100.0).unwrap(), 5.0);
        assert_close(percentile(&some(&[7.0]), 90.0).unwrap(), 7.0);
    }
}
