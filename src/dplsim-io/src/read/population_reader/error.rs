use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopulationError {
    #[error("Malformed population entry at line {line}: '{content}'. Expected '<id> <allele> <allele>', with alleles being either 0 or 1")]
    Malformed{line: usize, content: String},

    #[error("Population file {0} does not contain any founder individual")]
    Empty(PathBuf),
}
