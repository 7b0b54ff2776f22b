use std::path::PathBuf;

use thiserror::Error;

use crate::Dimension;

#[derive(Debug, Error)]
pub enum ReplicatorError {
    #[error("Invalid number of {0} steps. At least one step is required")]
    InvalidSteps(Dimension),

    #[error("Invalid number of {0} replicates. At least one replicate is required")]
    InvalidReplicates(Dimension),

    #[error("Invalid {dimension} value: {value} lies outside of the accepted range [{min}, {max}]")]
    OutOfBounds{dimension: Dimension, value: f64, min: f64, max: f64},

    #[error("Invalid {dimension} range: lower bound ({low}) is greater than upper bound ({high})")]
    InvertedRange{dimension: Dimension, low: f64, high: f64},

    #[error("Invalid {dimension} range: distinct levels share the same directory name '{segment}'. Use fewer steps, or a wider range")]
    IndistinctLevels{dimension: Dimension, segment: String},

    #[error("The replicates grid is too large: its number of points overflows")]
    GridOverflow,

    #[error("At least one target program is required")]
    MissingPrograms,

    #[error("Target program '{0}' was requested more than once")]
    DuplicateProgram(String),

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory{path: PathBuf, source: std::io::Error},

    #[error("'{0}' already exists, but is not a directory")]
    NotADirectory(PathBuf),
}
