use std::path::Path;

use anyhow::Result;
use penetrance::Population;

#[cfg(test)]
use mockall::automock;

use crate::AnalysisMethod;

mod external;
pub use external::{ExternalTools, CommandTemplate};

/// Everything the pipeline delegates to third party programs: reference data, forward population
/// simulation, and per-method file formats.
///
/// Every method receives the path of the artifact it is expected to produce.
#[cfg_attr(test, automock)]
pub trait Collaborators {
    /// Fetch the reference populations into the `dir` directory.
    fn download(&self, dir: &Path) -> Result<()>;

    /// Build the initial founder population from the reference data found in `reference`.
    fn init_population(&self, reference: &Path, artifact: &Path) -> Result<()>;

    /// Evolve the initial population until its disease allele reaches frequency `maf`.
    fn expand_population(&self, init: &Path, maf: f64, artifact: &Path) -> Result<()>;

    /// Load a previously expanded population.
    fn load_population(&self, artifact: &Path) -> Result<Population>;

    /// Convert a case/control dataset into the input format of `method`.
    fn format(&self, method: &AnalysisMethod, sample: &Path, artifact: &Path) -> Result<()>;

    /// Write a script running `method` on its formatted `input`.
    fn write_run_script(&self, method: &AnalysisMethod, input: &Path, artifact: &Path) -> Result<()>;
}
