//! Pipeline orchestration: stage sequencing, skip-if-exists resumability and fail-isolated replicate sweeps.

mod error;
pub use error::PipelineError;

mod stage;
pub use stage::{Stage, StageFlags, StageState, StageOutcome, StageRun};

pub mod registry;
pub use registry::{AnalysisMethod, Capabilities, REGISTRY};

mod collaborators;
pub use collaborators::{Collaborators, ExternalTools, CommandTemplate};
#[cfg(test)]
pub use collaborators::MockCollaborators;

pub mod config;
pub use config::{PipelineConfig, Plan, SamplingParams, SingleArtifacts};

mod driver;
pub use driver::{PipelineDriver, PipelineReport};
