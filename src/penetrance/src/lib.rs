//! Single gene disease model: risk tables, candidate streams and rejection sampling of case/control datasets.

mod error;
pub use error::{PenetranceError, ExhaustionReason};

mod risk;
pub use risk::{Dosage, RiskTable};

mod sampler;
pub use sampler::{PhenotypeSampler, SampleTarget, SamplingState, Phenotype, Verdict};

mod population;
pub use population::{Founder, Population};

mod candidate;
pub use candidate::{Candidate, CandidateSource, CandidateReader, PanmicticMating};
#[cfg(test)]
pub use candidate::MockCandidateSource;

mod driver;
pub use driver::{assign_phenotypes, CaseControlDataset, SampledIndividual, SampleRow, SamplingBudget};
