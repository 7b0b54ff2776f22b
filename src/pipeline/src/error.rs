use std::path::PathBuf;

use thiserror::Error;

use crate::Stage;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown analysis method '{0}'. Valid programs are: {1}")]
    UnknownProgram(String, String),

    #[error("The {0} stage was requested, but no command template was provided. Please specify one using '--{1}'")]
    MissingCommand(Stage, &'static str),

    #[error("'{0}' cannot be used in replicates mode")]
    IncompatibleOption(&'static str),

    #[error("{stage} stage failed for grid point '{point}' (artifact: {})", .path.display())]
    StageFailed{stage: Stage, point: String, path: PathBuf},

    #[error("Command '{command}' exited with {status}: {stderr}")]
    CommandFailed{command: String, status: std::process::ExitStatus, stderr: String},

    #[error("{failed} out of {total} grid points failed. Relaunch the same command to resume")]
    FailedGridPoints{failed: usize, total: usize},

    #[error("Failed to instantiate threadpool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),
}
