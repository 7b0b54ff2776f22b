use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::SamplingState;

/// Why a sampling run stopped before both targets were met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    BudgetSpent(usize),
    StreamEnded,
}

impl Display for ExhaustionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetSpent(max) => write!(f, "sampling budget of {max} candidates was spent"),
            Self::StreamEnded      => write!(f, "candidate stream ended"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PenetranceError {
    #[error("Disease risk of genotype dosage {dosage} lies outside of [0, 1] (got {risk}, using wild-type risk = {wtr} and genotype relative risk = {grr})")]
    RiskOutOfBounds{dosage: u8, risk: f64, wtr: f64, grr: f64},

    #[error("Invalid genotype dosage: {0}. Dosage must either be 0, 1 or 2")]
    InvalidDosage(u8),

    #[error("Invalid allele: {0}. Alleles must either be 0 (wild-type) or 1 (risk allele)")]
    InvalidAllele(u8),

    #[error("Invalid random draw: {0}. Draws must lie within [0, 1)")]
    InvalidDraw(f64),

    #[error("Invalid sample target ({cases} cases, {controls} controls). Both must be strictly positive")]
    InvalidTarget{cases: usize, controls: usize},

    #[error("Invalid sampling budget: the maximum number of candidates must be strictly positive")]
    InvalidBudget,

    #[error("Sampling state is inconsistent: {0}")]
    StateConsistency(String),

    #[error("Failed to sample a complete case/control dataset: {reason} after {consumed} candidates [{state}]")]
    SamplingExhaustion{reason: ExhaustionReason, consumed: usize, state: SamplingState},

    #[error("Cannot mate individuals from an empty population")]
    EmptyPopulation,

    #[error("Failed to parse candidate at line {line}: '{content}'")]
    ParseCandidate{line: usize, content: String},
}
