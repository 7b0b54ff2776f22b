#[cfg(test)]
mod fixture;
pub use fixture::Fixture;

#[cfg(test)]
mod dplsim_runner;
pub use dplsim_runner::{DplsimRunner, DplsimRunnerBuilder};

#[macro_export]
macro_rules! validate_file {
    ($want:expr, $obtained_file:expr) => {
        let got = std::fs::read_to_string($obtained_file)
            .unwrap_or_else(|_| panic!("Failed to open {:?}", $obtained_file));
        assert_eq!($want, got)
    };
}
