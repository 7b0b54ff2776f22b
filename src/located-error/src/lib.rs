use std::{fmt::Display, panic::Location};

use anyhow::{Context, Result};

pub mod prelude {
    extern crate anyhow;
    pub use anyhow::{anyhow, bail, Context, Result};

    extern crate thiserror;
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
}

macro_rules! loc_caller {
    ($caller:expr) => {
        format!("[{}:{}:{}]", $caller.file(), $caller.line(), $caller.column())
    }
}

pub trait LocatedError<T, E> {
    /// Wrap the error value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with additional context that is evaluated lazily
    /// only once an error does occur + the location at which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T, E> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(_) => {
                let loc = loc_caller!(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(_) => {
                let loc = loc_caller!(Location::caller());
                self.with_context(|| format!("{loc} {}", f()))
            }
        }
    }
}

pub trait LocatedOption<T> {
    /// Convert a `None` into an error carrying `context` + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Lazy version of [`LocatedOption::loc`]: `f` is only evaluated on `None`.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        match self {
            Some(ok) => Ok(ok),
            None => {
                let loc = loc_caller!(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        match self {
            Some(ok) => Ok(ok),
            None => {
                let loc = loc_caller!(Location::caller());
                self.with_context(|| format!("{loc} {}", f()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;
    use std::fs;

    #[derive(Error, Debug)]
    pub enum SweepError {
        #[error(transparent)]
        Io(#[from] anyhow::Error),

        #[error("Grid point could not be materialized")]
        GridPoint,

        #[error("Missing expanded population")]
        MissingPopulation,
    }

    fn create_experiment_dir(path: &str) -> Result<(), SweepError> {
        fs::create_dir(path).loc(format!("failed to create directory: '{path}'"))?;
        Ok(())
    }

    fn bubble_0() -> Result<()> {
        create_experiment_dir("missing-parent/MAF_0.05_1/cc_1000_1").with_loc(|| "While creating sample directory")
    }

    fn bubble_1() -> Result<()> {
        bubble_0().with_loc(|| SweepError::GridPoint)
    }

    fn bubble_2() -> Result<()> {
        bubble_1().with_loc(|| "While running replicates")
    }

    #[test]
    fn error_chain_carries_locations() {
        let err = bubble_2().expect_err("Directory creation should fail without a parent");
        let mut chain = err.chain();
        let results = [bubble_2(), bubble_1(), bubble_0()];
        for result in results {
            assert_eq!(
                format!("{}", chain.next().unwrap()),
                format!("{}", result.err().unwrap())
            );
        }
        let top = format!("{err}");
        assert!(top.starts_with('['));
        assert!(top.contains(file!()));
        assert!(top.ends_with("While running replicates"));
    }

    #[test]
    fn ok_values_pass_through() -> Result<()> {
        let value: Result<u32, SweepError> = Ok(3);
        assert_eq!(value.loc("unused context")?, 3);
        assert_eq!(Some(4).with_loc(|| "unused context")?, 4);
        Ok(())
    }

    #[test]
    fn missing_option_is_located() {
        let none: Option<()> = None;
        let err = none.loc(SweepError::MissingPopulation).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Missing expanded population"));
        assert!(msg.contains(file!()));
    }
}
