use std::fmt::{self, Display, Formatter};

use located_error::prelude::*;

use crate::{Dosage, RiskTable, PenetranceError};

/// Requested size of a case/control dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTarget {
    cases   : usize,
    controls: usize,
}

impl SampleTarget {
    /// # Errors
    /// - `InvalidTarget` if either `cases` or `controls` is zero.
    pub fn new(cases: usize, controls: usize) -> Result<Self> {
        if cases == 0 || controls == 0 {
            return Err(PenetranceError::InvalidTarget{cases, controls}).loc("While defining a sample target")
        }
        Ok(Self{cases, controls})
    }

    #[must_use]
    pub fn cases(&self) -> usize {
        self.cases
    }

    #[must_use]
    pub fn controls(&self) -> usize {
        self.controls
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cases + self.controls
    }
}

impl Display for SampleTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} cases, {} controls", self.cases, self.controls)
    }
}

/// Counters of a single sampling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingState {
    pub selected_cases   : usize,
    pub selected_controls: usize,
    pub discarded        : usize,
    pub wild_type_cases  : usize,
    pub mutant_controls  : usize,
}

impl SamplingState {
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.selected_cases + self.selected_controls + self.discarded
    }

    /// Check the counters against a sample target, and the number of candidates fed to the sampler.
    ///
    /// # Errors
    /// - `StateConsistency` if any quota is exceeded, or if counters do not add up to `consumed`.
    pub fn check(&self, target: &SampleTarget, consumed: usize) -> Result<()> {
        use PenetranceError::StateConsistency;
        let violation = if self.selected_cases > target.cases {
            Some(format!("{} selected cases exceed the target of {}", self.selected_cases, target.cases))
        } else if self.selected_controls > target.controls {
            Some(format!("{} selected controls exceed the target of {}", self.selected_controls, target.controls))
        } else if self.consumed() != consumed {
            Some(format!("counters account for {} candidates, while {consumed} were consumed", self.consumed()))
        } else if self.wild_type_cases > self.selected_cases || self.mutant_controls > self.selected_controls {
            Some(String::from("genotype counters exceed their phenotype counters"))
        } else {
            None
        };

        match violation {
            None      => Ok(()),
            Some(msg) => Err(StateConsistency(msg)).loc("While checking sampling counters"),
        }
    }
}

impl Display for SamplingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f,
            "cases: {} (wild-type: {}) | controls: {} (mutant: {}) | discarded: {}",
            self.selected_cases, self.wild_type_cases, self.selected_controls, self.mutant_controls, self.discarded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phenotype {Case, Control}

impl Phenotype {
    /// PLINK-style affection status (2: affected, 1: unaffected)
    #[must_use]
    pub fn status(&self) -> u8 {
        match self {
            Self::Case    => 2,
            Self::Control => 1,
        }
    }
}

impl Display for Phenotype {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case    => write!(f, "case"),
            Self::Control => write!(f, "control"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Phenotype),
    Rejected,
}

/// Rejection sampling engine of the single gene model.
///
/// Bound to a `RiskTable` and a `SampleTarget`. Candidates are fed one at a time through
/// [`PhenotypeSampler::accept_candidate`], until [`PhenotypeSampler::is_complete`] returns `true`.
/// The sampler does not bound the number of candidates it examines: see [`crate::assign_phenotypes`].
#[derive(Debug, Clone)]
pub struct PhenotypeSampler {
    risks : RiskTable,
    target: SampleTarget,
    state : SamplingState,
}

impl PhenotypeSampler {
    #[must_use]
    pub fn new(risks: RiskTable, target: SampleTarget) -> Self {
        Self{risks, target, state: SamplingState::default()}
    }

    /// Decide the fate of a single candidate.
    ///
    /// The candidate is affected whenever `draw < risk(dosage)`. Affected candidates are kept as cases
    /// while the case quota is open, unaffected ones as controls while the control quota is open.
    /// Anything else is discarded: an affected candidate is never kept as a control, nor the opposite.
    pub fn accept_candidate(&mut self, dosage: Dosage, draw: f64) -> Verdict {
        let affected = draw < self.risks.risk(dosage);
        let state = &mut self.state;
        match affected {
            true if state.selected_cases < self.target.cases => {
                state.selected_cases += 1;
                if dosage.is_wild_type() {
                    state.wild_type_cases += 1;
                }
                Verdict::Accepted(Phenotype::Case)
            },
            false if state.selected_controls < self.target.controls => {
                state.selected_controls += 1;
                if !dosage.is_wild_type() {
                    state.mutant_controls += 1;
                }
                Verdict::Accepted(Phenotype::Control)
            },
            _ => {
                state.discarded += 1;
                Verdict::Rejected
            }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.selected_cases == self.target.cases && self.state.selected_controls == self.target.controls
    }

    #[must_use]
    pub fn state(&self) -> &SamplingState {
        &self.state
    }

    #[must_use]
    pub fn target(&self) -> &SampleTarget {
        &self.target
    }

    #[must_use]
    pub fn risks(&self) -> &RiskTable {
        &self.risks
    }

    /// Zero all counters and return their final values.
    pub fn reset(&mut self) -> SamplingState {
        std::mem::take(&mut self.state)
    }

    /// Bind this sampler to a new risk table and sample target. Counters are zeroed.
    pub fn rearm(&mut self, risks: RiskTable, target: SampleTarget) -> SamplingState {
        self.risks  = risks;
        self.target = target;
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(wtr: f64, grr: f64, cases: usize, controls: usize) -> Result<PhenotypeSampler> {
        Ok(PhenotypeSampler::new(RiskTable::compute(wtr, grr)?, SampleTarget::new(cases, controls)?))
    }

    #[test]
    fn invalid_targets() {
        assert!(SampleTarget::new(0, 10).is_err());
        assert!(SampleTarget::new(10, 0).is_err());
        assert_eq!(SampleTarget::new(3, 4).map(|t| t.total()).ok(), Some(7));
    }

    #[test]
    fn affected_candidate_becomes_case() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 1, 1)?;
        assert_eq!(sampler.accept_candidate(Dosage::WILD_TYPE, 0.1), Verdict::Accepted(Phenotype::Case));
        assert_eq!(sampler.state().selected_cases, 1);
        assert_eq!(sampler.state().wild_type_cases, 1);
        Ok(())
    }

    #[test]
    fn draw_equal_to_risk_is_unaffected() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 1, 1)?;
        assert_eq!(sampler.accept_candidate(Dosage::HETEROZYGOUS, 0.5), Verdict::Accepted(Phenotype::Control));
        assert_eq!(sampler.state().mutant_controls, 1);
        Ok(())
    }

    #[test]
    fn full_case_quota_discards_affected() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 1, 2)?;
        sampler.accept_candidate(Dosage::WILD_TYPE, 0.0);
        // Affected, but the case quota is full: never reinterpreted as a control.
        assert_eq!(sampler.accept_candidate(Dosage::HOMOZYGOUS, 0.0), Verdict::Rejected);
        let state = sampler.state();
        assert_eq!((state.selected_cases, state.selected_controls, state.discarded), (1, 0, 1));
        Ok(())
    }

    #[test]
    fn full_control_quota_discards_unaffected() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 2, 1)?;
        sampler.accept_candidate(Dosage::WILD_TYPE, 0.9);
        assert_eq!(sampler.accept_candidate(Dosage::WILD_TYPE, 0.9), Verdict::Rejected);
        assert!(!sampler.is_complete());
        sampler.accept_candidate(Dosage::HOMOZYGOUS, 0.1);
        sampler.accept_candidate(Dosage::HETEROZYGOUS, 0.2);
        assert!(sampler.is_complete());
        assert_eq!(sampler.state().wild_type_cases, 0);
        Ok(())
    }

    #[test]
    fn counters_stay_consistent() -> Result<()> {
        let mut sampler = sampler(0.05, 2.0, 25, 40)?;
        let mut rng = fastrand::Rng::with_seed(42);
        let mut consumed = 0;
        while !sampler.is_complete() {
            let dosage = Dosage::try_from(rng.u8(0..=2))?;
            sampler.accept_candidate(dosage, rng.f64());
            consumed += 1;
            sampler.state().check(sampler.target(), consumed)?;
        }
        let state = sampler.state();
        assert_eq!(state.selected_cases, 25);
        assert_eq!(state.selected_controls, 40);
        assert_eq!(state.discarded, consumed - 65);
        Ok(())
    }

    #[test]
    fn inconsistent_state_is_reported() -> Result<()> {
        let target = SampleTarget::new(1, 1)?;
        let state = SamplingState{selected_cases: 2, ..Default::default()};
        assert!(state.check(&target, 2).is_err());

        let state = SamplingState{selected_cases: 1, discarded: 3, ..Default::default()};
        assert!(state.check(&target, 2).is_err());
        assert!(state.check(&target, 4).is_ok());
        Ok(())
    }

    #[test]
    fn reset_returns_snapshot() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 1, 1)?;
        sampler.accept_candidate(Dosage::WILD_TYPE, 0.0);
        sampler.accept_candidate(Dosage::WILD_TYPE, 0.0);
        let snapshot = sampler.reset();
        assert_eq!(snapshot.selected_cases, 1);
        assert_eq!(snapshot.discarded, 1);
        assert_eq!(*sampler.state(), SamplingState::default());
        Ok(())
    }

    #[test]
    fn rearm_binds_new_parameters() -> Result<()> {
        let mut sampler = sampler(0.5, 1.0, 1, 1)?;
        sampler.accept_candidate(Dosage::WILD_TYPE, 0.0);
        sampler.rearm(RiskTable::compute(0.0, 1.0)?, SampleTarget::new(2, 2)?);
        assert_eq!(sampler.target().cases(), 2);
        assert_eq!(*sampler.state(), SamplingState::default());
        // Zero risk: nobody is ever affected.
        assert_eq!(sampler.accept_candidate(Dosage::HOMOZYGOUS, 0.0), Verdict::Accepted(Phenotype::Control));
        Ok(())
    }
}
