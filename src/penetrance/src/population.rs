use located_error::prelude::*;

use crate::{Dosage, PenetranceError};

/// A founder individual, carrying two alleles at the disease predisposing locus (1: risk allele).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Founder {
    pub id : String,
    alleles: [u8; 2],
}

impl Founder {
    /// # Errors
    /// - `InvalidAllele` if any of the provided alleles is neither 0 nor 1.
    pub fn new(id: impl Into<String>, alleles: [u8; 2]) -> Result<Self> {
        if let Some(allele) = alleles.iter().find(|allele| **allele > 1) {
            return Err(PenetranceError::InvalidAllele(*allele)).loc("While creating founder individual")
        }
        Ok(Self{id: id.into(), alleles})
    }

    #[must_use]
    pub fn alleles(&self) -> [u8; 2] {
        self.alleles
    }

    #[must_use]
    pub fn dosage(&self) -> Dosage {
        Dosage::try_from(self.alleles[0] + self.alleles[1]).unwrap_or_default()
    }
}

/// Founder population of a simulation, optionally tagged with the name of its disease predisposing locus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    pub dpl     : Option<String>,
    pub founders: Vec<Founder>,
}

impl Population {
    #[must_use]
    pub fn new(dpl: Option<String>, founders: Vec<Founder>) -> Self {
        Self{dpl, founders}
    }

    /// Draw `size` founders under Hardy-Weinberg equilibrium, where each allele independently carries
    /// the risk variant with probability `maf`.
    #[must_use]
    pub fn hardy_weinberg(size: usize, maf: f64, dpl: Option<String>, rng: &mut fastrand::Rng) -> Self {
        let founders = (0..size)
            .map(|i| Founder{
                id: format!("ind{i}"),
                alleles: [u8::from(rng.f64() < maf), u8::from(rng.f64() < maf)]
            })
            .collect();
        Self{dpl, founders}
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.founders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.founders.is_empty()
    }

    /// Observed frequency of the risk allele. `None` for an empty population.
    #[must_use]
    pub fn allele_frequency(&self) -> Option<f64> {
        if self.is_empty() {
            return None
        }
        let risk_alleles: usize = self.founders.iter().map(|f| usize::from(f.dosage().value())).sum();
        Some(risk_alleles as f64 / (2 * self.len()) as f64)
    }
}
