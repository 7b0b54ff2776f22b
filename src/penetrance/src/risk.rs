use std::fmt::{self, Display, Formatter};

use located_error::prelude::*;

use crate::PenetranceError;

/// Number of copies of the risk allele carried at the disease predisposing locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dosage(u8);

impl Dosage {
    pub const WILD_TYPE   : Self = Self(0);
    pub const HETEROZYGOUS: Self = Self(1);
    pub const HOMOZYGOUS  : Self = Self(2);

    #[must_use]
    pub fn is_wild_type(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Dosage {
    type Error = PenetranceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=2 => Ok(Self(value)),
            _     => Err(PenetranceError::InvalidDosage(value)),
        }
    }
}

impl Display for Dosage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute disease risk of each genotype, indexed by dosage.
///
/// # Single gene model
/// - `r0 = wtr`
/// - `r1 = wtr * grr`
/// - `r2 = wtr * grr * 2` when `grr > 1`, otherwise `r2 = wtr`
///
/// Risks are never clamped: any value outside of `[0, 1]` is rejected upon construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskTable([f64; 3]);

impl RiskTable {
    /// Compute the risk table of the single gene model.
    ///
    /// # Arguments
    /// - `wtr`: wild-type risk, i.e. disease risk of individuals carrying no risk allele.
    /// - `grr`: genotype relative risk.
    ///
    /// # Errors
    /// - `RiskOutOfBounds` if any of the resulting risks is not a finite value within `[0, 1]`
    pub fn compute(wtr: f64, grr: f64) -> Result<Self> {
        let r2 = if grr > 1.0 { wtr * grr * 2.0 } else { wtr };
        let risks = [wtr, wtr * grr, r2];

        for (dosage, risk) in (0u8..).zip(risks) {
            if !(risk.is_finite() && (0.0..=1.0).contains(&risk)) {
                return Err(PenetranceError::RiskOutOfBounds{dosage, risk, wtr, grr})
                    .loc("While computing the risk table of the single gene model")
            }
        }
        Ok(Self(risks))
    }

    #[must_use]
    pub fn risk(&self, dosage: Dosage) -> f64 {
        self.0[usize::from(dosage.value())]
    }

    #[must_use]
    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }
}

impl Display for RiskTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}, {:.4}]", self.0[0], self.0[1], self.0[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_risks(table: &RiskTable, expected: [f64; 3]) {
        for (got, want) in table.as_array().iter().zip(expected) {
            assert!((got - want).abs() < f64::EPSILON, "got {table}, expected {expected:?}");
        }
    }

    #[test]
    fn dominant_risk_doubles_homozygotes() -> Result<()> {
        let table = RiskTable::compute(0.05, 2.0)?;
        assert_risks(&table, [0.05, 0.1, 0.2]);
        Ok(())
    }

    #[test]
    fn homozygote_risk_collapses_to_baseline() -> Result<()> {
        assert_risks(&RiskTable::compute(0.05, 1.0)?, [0.05, 0.05, 0.05]);
        assert_risks(&RiskTable::compute(0.1, 0.5)?, [0.1, 0.05, 0.1]);
        Ok(())
    }

    #[test]
    fn risks_are_indexed_by_dosage() -> Result<()> {
        let table = RiskTable::compute(0.2, 1.5)?;
        assert!((table.risk(Dosage::WILD_TYPE) - 0.2).abs() < f64::EPSILON);
        assert!((table.risk(Dosage::HETEROZYGOUS) - 0.3).abs() < 1e-12);
        assert!((table.risk(Dosage::HOMOZYGOUS) - 0.6).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn out_of_bounds_risk_is_rejected() {
        for (wtr, grr) in [(0.3, 2.0), (1.5, 1.0), (-0.1, 1.0), (0.5, f64::INFINITY)] {
            let err = RiskTable::compute(wtr, grr).expect_err("Risk table should be invalid");
            assert!(matches!(
                err.downcast_ref::<PenetranceError>(),
                Some(PenetranceError::RiskOutOfBounds{..})
            ));
        }
    }

    #[test]
    fn extreme_but_valid_risks() -> Result<()> {
        assert_risks(&RiskTable::compute(0.0, 3.0)?, [0.0, 0.0, 0.0]);
        assert_risks(&RiskTable::compute(0.25, 2.0)?, [0.25, 0.5, 1.0]);
        Ok(())
    }

    #[test]
    fn dosage_conversion() {
        assert_eq!(Dosage::try_from(2).ok(), Some(Dosage::HOMOZYGOUS));
        assert!(Dosage::WILD_TYPE.is_wild_type());
        assert!(!Dosage::HETEROZYGOUS.is_wild_type());
        assert!(matches!(Dosage::try_from(3), Err(PenetranceError::InvalidDosage(3))));
    }
}
