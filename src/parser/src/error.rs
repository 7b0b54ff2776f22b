use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("The provided value ({0}) must lie between 0.0 and 1.0")]
    ParseProbability(f64),

    #[error("The provided value ({0}) must be strictly positive")]
    NonPositive(f64),

    #[error("Failed to serialize command line arguments. got [{0}]")]
    Serialize(String),

    #[error("Unable to deserialize arguments from {0}: [{1}]")]
    Deserialize(String, String),

    #[error("Output directory path contains invalid characters: {0}")]
    InvalidOutputDir(String),
}
