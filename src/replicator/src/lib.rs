//! Replicates grid: typed sweep settings, grid point enumeration and experiment directory management.

mod error;
pub use error::ReplicatorError;

mod range;
pub use range::{even_space, Dimension, DimensionRange, Level};

mod sweep;
pub use sweep::{SweepConfig, GridPoint, GridEnumerator};

mod directory;
pub use directory::{ensure_directory, create_all, DirStatus};
