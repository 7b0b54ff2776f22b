mod population_reader;
pub use population_reader::{PopulationReader, PopulationError};
