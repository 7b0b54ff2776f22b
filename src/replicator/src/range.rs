use std::fmt::{self, Display, Formatter};

use located_error::prelude::*;
use log::warn;

use crate::ReplicatorError;

/// Return `count` evenly spaced values between `low` and `high` (both inclusive).
///
/// When a single value is requested, `high` is returned.
#[must_use]
pub fn even_space(low: f64, high: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => {
            if (low - high).abs() > f64::EPSILON {
                warn!("Requested a single step between {low} and {high}. Using the upper bound ({high})");
            }
            vec![high]
        },
        _ => {
            let step = (high - low) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { high } else { step.mul_add(i as f64, low) })
                .collect()
        }
    }
}

/// A swept parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Minor allele frequency of the disease predisposing locus.
    Maf,
    /// Number of controls.
    SampleSize,
    /// Wild-type risk.
    Wtr,
    /// Genotype relative risk.
    Grr,
}

impl Dimension {
    pub const ALL: [Self; 4] = [Self::Maf, Self::SampleSize, Self::Wtr, Self::Grr];

    /// Directory name prefix of this dimension.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Maf        => "MAF",
            Self::SampleSize => "cc",
            Self::Wtr        => "WTR",
            Self::Grr        => "GRR",
        }
    }

    /// Accepted values: `(min, max)`, both inclusive.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Maf | Self::Wtr => (0.0, 1.0),
            Self::SampleSize      => (1.0, f64::MAX),
            Self::Grr             => (0.0, f64::MAX),
        }
    }

    /// Format a level of this dimension, as found within a directory name.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::SampleSize => format!("{}", value.round()),
            _                => format!("{value:.2}"),
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maf        => write!(f, "minor allele frequency"),
            Self::SampleSize => write!(f, "sample size"),
            Self::Wtr        => write!(f, "wild-type risk"),
            Self::Grr        => write!(f, "genotype relative risk"),
        }
    }
}

/// One value of a swept dimension, along with its 1-based replicate index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub value    : f64,
    pub replicate: usize,
}

/// Validated sweep settings of a single dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionRange {
    dimension : Dimension,
    low       : f64,
    high      : f64,
    steps     : usize,
    replicates: usize,
}

impl DimensionRange {
    /// # Errors
    /// - `InvalidSteps` or `InvalidReplicates` when `steps` or `replicates` is zero.
    /// - `OutOfBounds` if either `low` or `high` is not a finite value within `dimension.bounds()`
    /// - `InvertedRange` if `low > high`
    /// - `GridOverflow` if `steps * replicates` overflows
    pub fn new(dimension: Dimension, low: f64, high: f64, steps: usize, replicates: usize) -> Result<Self> {
        use ReplicatorError::{InvalidSteps, InvalidReplicates, OutOfBounds, InvertedRange, GridOverflow};
        let loc_msg = || format!("While validating the {dimension} sweep range");

        if steps == 0 {
            return Err(InvalidSteps(dimension)).with_loc(loc_msg)
        }
        if replicates == 0 {
            return Err(InvalidReplicates(dimension)).with_loc(loc_msg)
        }
        if steps.checked_mul(replicates).is_none() {
            return Err(GridOverflow).with_loc(loc_msg)
        }

        let (min, max) = dimension.bounds();
        for value in [low, high] {
            if !(value.is_finite() && (min..=max).contains(&value)) {
                return Err(OutOfBounds{dimension, value, min, max}).with_loc(loc_msg)
            }
        }

        if low > high {
            return Err(InvertedRange{dimension, low, high}).with_loc(loc_msg)
        }
        Ok(Self{dimension, low, high, steps, replicates})
    }

    /// A fixed, single level.
    ///
    /// # Errors
    /// - `OutOfBounds` if `value` is not a finite value within `dimension.bounds()`
    pub fn constant(dimension: Dimension, value: f64) -> Result<Self> {
        Self::new(dimension, value, value, 1, 1)
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        even_space(self.low, self.high, self.steps)
    }

    /// Directory name segment of every level, without the replicate index: `<prefix>_<value>`
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        self.values().into_iter()
            .map(|value| format!("{}_{}", self.dimension.prefix(), self.dimension.format_value(value)))
            .collect()
    }

    /// Ensure no two levels of this range are written under the same directory name.
    ///
    /// # Errors
    /// - `IndistinctLevels` if two distinct levels are formatted the same way.
    pub fn check_distinct(&self) -> Result<()> {
        let segments = self.segments();
        if let Some(pair) = segments.windows(2).find(|pair| pair[0] == pair[1]) {
            let (dimension, segment) = (self.dimension, pair[0].clone());
            return Err(ReplicatorError::IndistinctLevels{dimension, segment})
                .with_loc(|| format!("While validating the {dimension} sweep range"))
        }
        Ok(())
    }

    /// Every level of this dimension, each repeated `replicates` times.
    #[must_use]
    pub fn levels(&self) -> Vec<Level> {
        self.values().into_iter()
            .flat_map(|value| (1..=self.replicates).map(move |replicate| Level{value, replicate}))
            .collect()
    }

    /// Number of levels, replicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps * self.replicates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
