use std::{
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use located_error::prelude::*;
use log::{debug, info, warn};

use crate::PipelineError;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    InitPopulation,
    ExpandPopulation,
    AssignPhenotypes,
    FormatForTools,
    GenerateRunScripts,
}

impl Stage {
    pub const ALL: [Self; 6] = [
        Self::Download, Self::InitPopulation, Self::ExpandPopulation,
        Self::AssignPhenotypes, Self::FormatForTools, Self::GenerateRunScripts
    ];

    /// Name of the command line flag enabling this stage.
    #[must_use]
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Download           => "download",
            Self::InitPopulation     => "init",
            Self::ExpandPopulation   => "expand",
            Self::AssignPhenotypes   => "penetrance",
            Self::FormatForTools     => "format",
            Self::GenerateRunScripts => "cline",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Download           => "Download",
            Self::InitPopulation     => "InitPopulation",
            Self::ExpandPopulation   => "ExpandPopulation",
            Self::AssignPhenotypes   => "AssignPhenotypes",
            Self::FormatForTools     => "FormatForTools",
            Self::GenerateRunScripts => "GenerateRunScripts",
        };
        write!(f, "{name}")
    }
}

/// Enabled stages.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub download  : bool,
    pub init      : bool,
    pub expand    : bool,
    pub penetrance: bool,
    pub format    : bool,
    pub cline     : bool,
}

impl StageFlags {
    #[must_use]
    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Download           => self.download,
            Stage::InitPopulation     => self.init,
            Stage::ExpandPopulation   => self.expand,
            Stage::AssignPhenotypes   => self.penetrance,
            Stage::FormatForTools     => self.format,
            Stage::GenerateRunScripts => self.cline,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> Vec<Stage> {
        Stage::ALL.into_iter().filter(|stage| self.is_enabled(*stage)).collect()
    }
}

impl From<&parser::PipelineArgs> for StageFlags {
    fn from(args: &parser::PipelineArgs) -> Self {
        Self {
            download  : args.download,
            init      : args.init,
            expand    : args.expand,
            penetrance: args.penetrance,
            format    : args.format,
            cline     : args.cline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Done,
}

/// Result of a stage execution. Both variants point to the stage's output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Skipped(PathBuf),
    Completed(PathBuf),
}

/// A single execution of a stage, for a given grid point.
///
/// `Pending -> Running -> Done`. The stage never leaves `Pending` when its artifact already exists.
#[derive(Debug)]
pub struct StageRun<'a> {
    stage   : Stage,
    point   : &'a str,
    artifact: &'a Path,
    state   : StageState,
}

impl<'a> StageRun<'a> {
    #[must_use]
    pub fn new(stage: Stage, point: &'a str, artifact: &'a Path) -> Self {
        Self{stage, point, artifact, state: StageState::Pending}
    }

    #[must_use]
    pub fn state(&self) -> StageState {
        self.state
    }

    fn advance(&mut self, next: StageState) {
        debug!("[{}] {}: {:?} -> {next:?}", self.point, self.stage, self.state);
        self.state = next;
    }

    /// Run `job`, unless the artifact of this stage already exists.
    ///
    /// # Errors
    /// - `StageFailed` wrapping the error of `job`. Whatever `job` left at the artifact's location is removed,
    ///   so that a subsequent run does not mistake it for a completed artifact.
    pub fn execute<F>(&mut self, job: F) -> Result<StageOutcome>
    where
        F: FnOnce() -> Result<()>,
    {
        if self.artifact.exists() {
            info!("[{}] Skipping {}: '{}' already exists", self.point, self.stage, self.artifact.display());
            return Ok(StageOutcome::Skipped(self.artifact.to_path_buf()))
        }

        self.advance(StageState::Running);
        if let Err(e) = job() {
            self.discard_partial_artifact();
            return Err(e).with_loc(|| PipelineError::StageFailed{
                stage: self.stage,
                point: self.point.to_string(),
                path : self.artifact.to_path_buf()
            })
        }
        self.advance(StageState::Done);
        Ok(StageOutcome::Completed(self.artifact.to_path_buf()))
    }

    fn discard_partial_artifact(&self) {
        let removed = if self.artifact.is_dir() {
            fs::remove_dir_all(self.artifact)
        } else if self.artifact.exists() {
            fs::remove_file(self.artifact)
        } else {
            return
        };
        match removed {
            Ok(()) => warn!("[{}] Removed partial {} artifact '{}'", self.point, self.stage, self.artifact.display()),
            Err(e) => warn!("[{}] Failed to remove partial artifact '{}': {e}", self.point, self.artifact.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_artifact_is_skipped() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let artifact = tmpdir.path().join("sample.pop");
        fs::write(&artifact, "done")?;

        let mut run = StageRun::new(Stage::AssignPhenotypes, "single", &artifact);
        let outcome = run.execute(|| panic!("Job should never run"))?;
        assert_eq!(outcome, StageOutcome::Skipped(artifact.clone()));
        assert_eq!(run.state(), StageState::Pending);
        assert_eq!(fs::read_to_string(&artifact)?, "done");
        Ok(())
    }

    #[test]
    fn missing_artifact_is_built() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let artifact = tmpdir.path().join("expanded.pop");

        let mut run = StageRun::new(Stage::ExpandPopulation, "single", &artifact);
        let outcome = run.execute(|| Ok(fs::write(&artifact, "founders")?))?;
        assert_eq!(outcome, StageOutcome::Completed(artifact.clone()));
        assert_eq!(run.state(), StageState::Done);

        let mut rerun = StageRun::new(Stage::ExpandPopulation, "single", &artifact);
        assert_eq!(rerun.execute(|| Ok(()))?, StageOutcome::Skipped(artifact.clone()));
        Ok(())
    }

    #[test]
    fn failure_is_located_and_cleaned() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let artifact = tmpdir.path().join("PLINK").join("sample.ped");
        fs::create_dir(tmpdir.path().join("PLINK"))?;

        let mut run = StageRun::new(Stage::FormatForTools, "MAF_0.05_1/PLINK", &artifact);
        let err = run.execute(|| {
            fs::write(&artifact, "partial")?;
            bail!("formatter crashed")
        }).expect_err("Job failed");

        let msg = format!("{err:#}");
        assert!(msg.contains("FormatForTools stage failed for grid point 'MAF_0.05_1/PLINK'"), "{msg}");
        assert!(msg.contains("formatter crashed"));
        assert!(!artifact.exists());
        assert_eq!(run.state(), StageState::Running);
        Ok(())
    }

    #[test]
    fn flags_follow_stage_order() {
        let flags = StageFlags{download: true, penetrance: true, cline: true, ..Default::default()};
        assert_eq!(flags.enabled(), vec![Stage::Download, Stage::AssignPhenotypes, Stage::GenerateRunScripts]);
        assert!(!flags.is_enabled(Stage::FormatForTools));
        assert_eq!(Stage::AssignPhenotypes.flag(), "penetrance");
    }
}
