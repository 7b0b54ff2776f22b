use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
    path::PathBuf,
    iter::FusedIterator,
};

use located_error::prelude::*;

use crate::{Dimension, DimensionRange, Level, ReplicatorError};

/// Validated replicates grid: one range per swept dimension, plus the set of target programs.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    ranges     : [DimensionRange; 4],
    programs   : Vec<String>,
    create_dirs: bool,
    total      : usize,
}

impl SweepConfig {
    /// # Arguments
    /// - `maf`, `cc`, `wtr`, `grr`: range of each swept dimension. Order matters and is checked.
    /// - `programs`: names of the target analysis methods. Must be unique (case insensitive).
    /// - `create_dirs`: whether the directory hierarchy should be materialized before running stages.
    ///
    /// # Errors
    /// - `MissingPrograms` if `programs` is empty.
    /// - `DuplicateProgram` if a program is requested twice.
    /// - `OutOfBounds` if a range was not built for its slot (e.g. a GRR range given as `maf`).
    /// - `IndistinctLevels` if two levels of a range would share the same directory.
    /// - `GridOverflow` if the number of grid points does not fit within a `usize`.
    pub fn new(maf: DimensionRange, cc: DimensionRange, wtr: DimensionRange, grr: DimensionRange, programs: Vec<String>, create_dirs: bool) -> Result<Self> {
        use ReplicatorError::{MissingPrograms, DuplicateProgram, GridOverflow};
        let loc_msg = "While validating the replicates grid";

        let ranges = [maf, cc, wtr, grr];
        for (range, expected) in ranges.iter().zip(Dimension::ALL) {
            if range.dimension() != expected {
                let (min, max) = expected.bounds();
                let value = range.values().first().copied().unwrap_or(f64::NAN);
                return Err(ReplicatorError::OutOfBounds{dimension: expected, value, min, max}).loc(loc_msg)
            }
            range.check_distinct().loc(loc_msg)?;
        }

        if programs.is_empty() {
            return Err(MissingPrograms).loc(loc_msg)
        }
        let mut seen = HashSet::with_capacity(programs.len());
        for program in &programs {
            if !seen.insert(program.to_uppercase()) {
                return Err(DuplicateProgram(program.clone())).loc(loc_msg)
            }
        }

        let total = ranges.iter()
            .try_fold(programs.len(), |total, range| total.checked_mul(range.len()))
            .ok_or(GridOverflow)
            .loc(loc_msg)?;

        Ok(Self{ranges, programs, create_dirs, total})
    }

    #[must_use]
    pub fn range(&self, dimension: Dimension) -> &DimensionRange {
        let index = Dimension::ALL.iter().position(|d| *d == dimension).unwrap_or_default();
        &self.ranges[index]
    }

    #[must_use]
    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    #[must_use]
    pub fn create_dirs(&self) -> bool {
        self.create_dirs
    }

    /// Enumerate every grid point of this sweep. Each call yields a fresh enumeration.
    #[must_use]
    pub fn grid(&self) -> GridEnumerator<'_> {
        GridEnumerator::new(self)
    }

    /// Number of grid points sharing the same MAF directory.
    #[must_use]
    pub fn points_per_maf(&self) -> usize {
        self.total / self.ranges[0].len()
    }
}

/// One concrete combination of swept values, replicate indices and target program.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub maf    : Level,
    pub cc     : Level,
    pub wtr    : Level,
    pub grr    : Level,
    pub program: String,
}

impl GridPoint {
    fn segment(dimension: Dimension, level: &Level) -> String {
        format!("{}_{}_{}", dimension.prefix(), dimension.format_value(level.value), level.replicate)
    }

    /// `MAF_<maf>_<rep>`
    #[must_use]
    pub fn maf_dir(&self) -> PathBuf {
        PathBuf::from(Self::segment(Dimension::Maf, &self.maf))
    }

    /// `MAF_<maf>_<rep>/cc_<controls>_<rep>/WTR_<wtr>_<rep>/GRR_<grr>_<rep>`
    #[must_use]
    pub fn sample_dir(&self) -> PathBuf {
        let mut path = self.maf_dir();
        path.push(Self::segment(Dimension::SampleSize, &self.cc));
        path.push(Self::segment(Dimension::Wtr, &self.wtr));
        path.push(Self::segment(Dimension::Grr, &self.grr));
        path
    }

    /// Full directory of this grid point, relative to the sweep root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.sample_dir().join(&self.program)
    }

    /// Requested number of controls.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn controls(&self) -> usize {
        self.cc.value.round() as usize
    }
}

impl Display for GridPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// Finite, ordered enumeration of a sweep's grid points.
///
/// Nesting order (outermost first): MAF, sample size, wild-type risk, genotype relative risk, program.
/// Within each dimension, replicates are nested within levels.
#[derive(Debug, Clone)]
pub struct GridEnumerator<'a> {
    programs: &'a [String],
    levels  : [Vec<Level>; 4],
    index   : usize,
    total   : usize,
}

impl<'a> GridEnumerator<'a> {
    fn new(sweep: &'a SweepConfig) -> Self {
        let levels = [0, 1, 2, 3].map(|i| sweep.ranges[i].levels());
        Self{programs: &sweep.programs, levels, index: 0, total: sweep.total}
    }

    fn point_at(&self, index: usize) -> GridPoint {
        // ---- Decode `index` as an odometer: the program is the fastest moving digit.
        let mut rest = index;
        let program = &self.programs[rest % self.programs.len()];
        rest /= self.programs.len();

        let mut picked = [Level{value: 0.0, replicate: 0}; 4];
        for (slot, levels) in picked.iter_mut().zip(&self.levels).rev() {
            *slot = levels[rest % levels.len()];
            rest /= levels.len();
        }

        let [maf, cc, wtr, grr] = picked;
        GridPoint{maf, cc, wtr, grr, program: program.clone()}
    }
}

impl Iterator for GridEnumerator<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.total {
            return None
        }
        let point = self.point_at(self.index);
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridEnumerator<'_> {}
impl FusedIterator for GridEnumerator<'_> {}
