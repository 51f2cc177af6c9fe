// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// An administrative region and its population.
///
/// The population is expected to be positive. A population of zero is
/// tolerated: the region gets a zero weight and its ratios are reported as
/// absent.
#[derive(PartialEq, Debug, Clone)]
pub struct Region {
    pub name: String,
    pub population: f64,
}

impl Region {
    pub fn new(name: &str, population: f64) -> Region {
        Region {
            name: name.to_string(),
            population,
        }
    }
}

/// A region with the weight that the allocation rule derived from its population.
#[derive(PartialEq, Debug, Clone)]
pub struct WeightedRegion {
    pub region: Region,
    pub weight: f64,
}

// ******** Output data structures *********

/// The seats given to one region by an allocation run.
#[derive(PartialEq, Debug, Clone)]
pub struct AllocationRecord {
    pub region: String,
    pub population: f64,
    pub seats: u32,
}

/// The outcome of one allocation run.
///
/// The seats of the records always sum to `seats_total`.
#[derive(PartialEq, Debug, Clone)]
pub struct Allocation {
    pub rule: AllocationRule,
    pub seats_total: u32,
    pub records: Vec<AllocationRecord>,
}

impl Allocation {
    /// The identifier of this allocation, derived from the rule.
    pub fn label(&self) -> String {
        self.rule.label()
    }

    pub fn seats(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.seats).collect()
    }
}

/// Fairness metrics of one region.
///
/// Ratios with a zero denominator are `None`.
#[derive(PartialEq, Debug, Clone)]
pub struct IndicatorRecord {
    pub region: String,
    pub population: f64,
    pub seats: u32,
    pub seats_share: Option<f64>,
    pub pop_share: Option<f64>,
    pub seats_per_million: Option<f64>,
    /// seats_share / pop_share. Above 1 means over-represented.
    pub elasticity: Option<f64>,
    pub seats_per_person: Option<f64>,
}

/// Aggregate statistics of one allocation.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryRecord {
    pub total_seats: u64,
    pub total_population: f64,
    /// Malapportionment index, in seats per million.
    pub malapportionment_index: Option<f64>,
    /// Gini coefficient of the seats per million distribution.
    pub gini: Option<f64>,
    pub mean_elasticity: Option<f64>,
    pub median_elasticity: Option<f64>,
    pub mean_seats_per_million: Option<f64>,
}

/// Per-region indicators and summary of one allocation.
#[derive(PartialEq, Debug, Clone)]
pub struct IndicatorTable {
    pub allocation: String,
    pub records: Vec<IndicatorRecord>,
    pub summary: SummaryRecord,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ElasticitySummary {
    pub allocation: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
}

/// A non-baseline allocation compared with the strict proportional baseline.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparativeRecord {
    pub allocation: String,
    pub elasticity_p10: Option<f64>,
    pub elasticity_p90: Option<f64>,
    /// Mean relative change of the seats per million.
    pub mrc: Option<f64>,
}

/// Errors that prevent an allocation run from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum AllocationErrors {
    InvalidSeatTotal,
    InvalidWeight { index: usize, weight: f64 },
    InvalidRegionWeight { region: String, weight: f64 },
    ZeroTotalWeight,
    InvalidExponent { alpha: f64 },
    DuplicateRegion { region: String },
    InvalidPopulation { region: String, population: f64 },
}

impl Error for AllocationErrors {}

impl Display for AllocationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationErrors::InvalidSeatTotal => {
                write!(f, "the total number of seats must be positive")
            }
            AllocationErrors::InvalidWeight { index, weight } => {
                write!(f, "invalid weight {} at position {}", weight, index)
            }
            AllocationErrors::InvalidRegionWeight { region, weight } => {
                write!(f, "invalid weight {} for region {}", weight, region)
            }
            AllocationErrors::ZeroTotalWeight => write!(f, "the sum of the weights is zero"),
            AllocationErrors::InvalidExponent { alpha } => {
                write!(f, "exponent {} is outside of (0, 1]", alpha)
            }
            AllocationErrors::DuplicateRegion { region } => {
                write!(f, "region {} is declared more than once", region)
            }
            AllocationErrors::InvalidPopulation { region, population } => {
                write!(f, "invalid population {} for region {}", population, region)
            }
        }
    }
}

// ********* Configuration **********

/// The apportionment rule.
///
/// - Proportional: seats proportional to population (Hamilton method).
/// - Degressive: seats proportional to population^alpha, with alpha in (0, 1].
/// Smaller alphas favor the small regions.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum AllocationRule {
    Proportional,
    Degressive { alpha: f64 },
}

impl AllocationRule {
    pub fn degressive(alpha: f64) -> Result<AllocationRule, AllocationErrors> {
        if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
            Ok(AllocationRule::Degressive { alpha })
        } else {
            Err(AllocationErrors::InvalidExponent { alpha })
        }
    }

    /// The allocation weight of a population under this rule.
    pub fn weight(&self, population: f64) -> f64 {
        match self {
            AllocationRule::Proportional => population,
            // Identity at 1 so that the run matches the proportional one exactly.
            AllocationRule::Degressive { alpha } if *alpha == 1.0 => population,
            AllocationRule::Degressive { alpha } => population.powf(*alpha),
        }
    }

    pub fn label(&self) -> String {
        match self {
            AllocationRule::Proportional => "proportional".to_string(),
            AllocationRule::Degressive { alpha } => format!("dp_alpha_{}", alpha),
        }
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, AllocationRule::Proportional)
    }
}

/// The parameters of a full apportionment run: one total, several rules.
#[derive(PartialEq, Debug, Clone)]
pub struct ApportionmentConfig {
    pub seats_total: u32,
    pub rules: Vec<AllocationRule>,
}

impl ApportionmentConfig {
    /// The exponents studied by default.
    pub const DEFAULT_ALPHAS: [f64; 5] = [0.4, 0.5, 0.6, 0.8, 0.9];

    /// The two legislature sizes under study.
    pub const LEGISLATURE_SIZES: [u32; 2] = [543, 888];

    /// The proportional baseline followed by one degressive rule per exponent.
    ///
    /// Invalid exponents are kept: they fail in their own run only.
    pub fn new(seats_total: u32, alphas: &[f64]) -> ApportionmentConfig {
        let mut rules = vec![AllocationRule::Proportional];
        rules.extend(
            alphas
                .iter()
                .map(|&alpha| AllocationRule::Degressive { alpha }),
        );
        ApportionmentConfig { seats_total, rules }
    }

    pub fn is_standard_size(&self) -> bool {
        ApportionmentConfig::LEGISLATURE_SIZES.contains(&self.seats_total)
    }
}
