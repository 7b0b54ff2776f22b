use std::fmt::{self, Display, Formatter};

use located_error::prelude::*;
use log::{info, trace};

use crate::{
    CandidateSource, Dosage, Phenotype, PhenotypeSampler, SamplingState, Verdict,
    error::{ExhaustionReason, PenetranceError},
};

/// Upper bound on the number of candidates examined during a single sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingBudget {
    max_candidates: usize,
}

impl SamplingBudget {
    pub const DEFAULT_MAX_CANDIDATES: usize = 10_000_000;

    /// # Errors
    /// - `InvalidBudget` if `max_candidates` is zero.
    pub fn new(max_candidates: usize) -> Result<Self> {
        if max_candidates == 0 {
            return Err(PenetranceError::InvalidBudget).loc("While defining a sampling budget")
        }
        Ok(Self{max_candidates})
    }

    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }
}

impl Default for SamplingBudget {
    fn default() -> Self {
        Self{max_candidates: Self::DEFAULT_MAX_CANDIDATES}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledIndividual {
    pub phenotype: Phenotype,
    pub dosage   : Dosage,
}

/// A labeled row of a case/control dataset: `<id>\t<status>\t<dosage>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub id        : String,
    pub individual: SampledIndividual,
}

impl Display for SampleRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, self.individual.phenotype.status(), self.individual.dosage)
    }
}

/// A complete case/control dataset, with individuals listed in acceptance order.
#[derive(Debug, Clone)]
pub struct CaseControlDataset {
    pub individuals: Vec<SampledIndividual>,
    pub state      : SamplingState,
    pub consumed   : usize,
}

impl CaseControlDataset {
    pub const HEADER: &'static str = "Id\tStatus\tDosage";

    /// Label each individual as `case<i>` or `control<i>` (1-based, counted per phenotype).
    pub fn rows(&self) -> impl Iterator<Item = SampleRow> + '_ {
        let (mut cases, mut controls) = (0usize, 0usize);
        self.individuals.iter().map(move |individual| {
            let counter = match individual.phenotype {
                Phenotype::Case    => &mut cases,
                Phenotype::Control => &mut controls,
            };
            *counter += 1;
            SampleRow{id: format!("{}{counter}", individual.phenotype), individual: *individual}
        })
    }

    /// Fraction of cases carrying at least one risk allele. `None` if the dataset holds no case.
    #[must_use]
    pub fn mutant_case_ratio(&self) -> Option<f64> {
        match self.state.selected_cases {
            0 => None,
            n => Some((n - self.state.wild_type_cases) as f64 / n as f64),
        }
    }
}

/// Feed candidates from `source` to `sampler` until both of its targets are met.
///
/// # Behavior
/// - The sampler is reset before returning, whatever the outcome. The final counters are returned
///   within the dataset, or within the error.
/// - A partial dataset is never returned.
///
/// # Errors
/// - `SamplingExhaustion` if `budget` is spent, or if `source` ends before both targets are met.
/// - `StateConsistency` if the final counters do not add up.
/// - Any error raised by `source`.
pub fn assign_phenotypes<S>(source: &mut S, sampler: &mut PhenotypeSampler, budget: &SamplingBudget) -> Result<CaseControlDataset>
where
    S: CandidateSource + ?Sized,
{
    let mut individuals = Vec::with_capacity(sampler.target().total());
    let mut consumed = 0;

    // ---- Rejection sampling loop.
    while !sampler.is_complete() {
        let reason = if consumed >= budget.max_candidates() {
            Some(ExhaustionReason::BudgetSpent(budget.max_candidates()))
        } else {
            match source.next_candidate() {
                Ok(Some(candidate)) => {
                    consumed += 1;
                    let verdict = sampler.accept_candidate(candidate.dosage, candidate.draw);
                    trace!("candidate {consumed} (dosage: {}, draw: {:.6}): {verdict:?}", candidate.dosage, candidate.draw);
                    if let Verdict::Accepted(phenotype) = verdict {
                        individuals.push(SampledIndividual{phenotype, dosage: candidate.dosage});
                    }
                    None
                },
                Ok(None) => Some(ExhaustionReason::StreamEnded),
                Err(e) => {
                    sampler.reset();
                    return Err(e).loc("While fetching the next sampling candidate")
                },
            }
        };

        if let Some(reason) = reason {
            let state = sampler.reset();
            return Err(PenetranceError::SamplingExhaustion{reason, consumed, state}).loc("While assigning phenotypes")
        }
    }

    // ---- Final sanity check and reset.
    let check = sampler.state().check(sampler.target(), consumed);
    let state = sampler.reset();
    check?;

    info!("Sampled {} individuals out of {consumed} candidates [{state}]", individuals.len());
    Ok(CaseControlDataset{individuals, state, consumed})
}
