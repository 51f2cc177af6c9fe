pub use crate::config::*;
use crate::{run_allocation, run_apportionment};

/// A builder for assembling the regions of an apportionment.
///
/// The builder rejects the datasets that the allocation engine does not
/// expect: duplicated region names and negative or non-finite populations.
///
/// ```
/// pub use apportionment::builder::Builder;
/// pub use apportionment::AllocationRule;
/// # use apportionment::AllocationErrors;
///
/// let mut builder = Builder::new(10)?;
/// builder.add_region("North", 1_500_000.0)?;
/// builder.add_region("South", 500_000.0)?;
///
/// let allocation = builder.allocate(&AllocationRule::Proportional)?;
/// assert_eq!(allocation.seats(), vec![8, 2]);
///
/// # Ok::<(), AllocationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _seats_total: u32,
    pub(crate) _regions: Vec<Region>,
}

impl Builder {
    pub fn new(seats_total: u32) -> Result<Builder, AllocationErrors> {
        if seats_total == 0 {
            return Err(AllocationErrors::InvalidSeatTotal);
        }
        Ok(Builder {
            _seats_total: seats_total,
            _regions: Vec::new(),
        })
    }

    /// Adds all the given regions, stopping at the first invalid one.
    pub fn regions(mut self, regions: &[Region]) -> Result<Builder, AllocationErrors> {
        for r in regions {
            self.add_region(&r.name, r.population)?;
        }
        Ok(self)
    }

    /// Adds one region.
    ///
    /// A population of zero is accepted: the region will not receive seats.
    pub fn add_region(&mut self, name: &str, population: f64) -> Result<(), AllocationErrors> {
        if !population.is_finite() || population < 0.0 {
            return Err(AllocationErrors::InvalidPopulation {
                region: name.to_string(),
                population,
            });
        }
        if self._regions.iter().any(|r| r.name == name) {
            return Err(AllocationErrors::DuplicateRegion {
                region: name.to_string(),
            });
        }
        self._regions.push(Region::new(name, population));
        Ok(())
    }

    pub fn allocate(&self, rule: &AllocationRule) -> Result<Allocation, AllocationErrors> {
        run_allocation(&self._regions, rule, self._seats_total)
    }

    /// Runs the proportional baseline and one degressive allocation per exponent.
    pub fn allocate_all(&self, alphas: &[f64]) -> Vec<Result<Allocation, AllocationErrors>> {
        run_apportionment(
            &self._regions,
            &ApportionmentConfig::new(self._seats_total, alphas),
        )
    }

    pub fn regions_list(&self) -> &[Region] {
        &self._regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_regions() {
        let mut b = Builder::new(5).unwrap();
        b.add_region("A", 10.0).unwrap();
        assert_eq!(
            b.add_region("A", 3.0),
            Err(AllocationErrors::DuplicateRegion {
                region: "A".to_string()
            })
        );
        assert!(matches!(
            b.add_region("B", -1.0),
            Err(AllocationErrors::InvalidPopulation { .. })
        ));
        assert!(b.add_region("C", f64::NAN).is_err());
        assert_eq!(b.regions_list().len(), 1);
        assert!(Builder::new(0).is_err());
    }

    #[test]
    fn allocate_all_keeps_going() {
        let b = Builder::new(10)
            .unwrap()
            .regions(&[Region::new("A", 64.0), Region::new("B", 16.0)])
            .unwrap();
        let res = b.allocate_all(&[0.5, 0.0, 1.0]);
        assert_eq!(res.len(), 4);
        assert_eq!(res[0].as_ref().unwrap().seats(), vec![8, 2]);
        // Weights 8 and 4: quotas 6.67 and 3.33
        assert_eq!(res[1].as_ref().unwrap().seats(), vec![7, 3]);
        assert_eq!(
            res[2],
            Err(AllocationErrors::InvalidExponent { alpha: 0.0 })
        );
        assert_eq!(res[3].as_ref().unwrap().seats(), vec![8, 2]);
    }
}
