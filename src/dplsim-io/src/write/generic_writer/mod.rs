use std::{fs::{self, File}, io::{Write, BufWriter}, path::Path};
use anyhow::Result;

use located_error::LocatedError;

pub mod error;
pub use error::WriterError;

/// Field separator of every artifact written by dplsim-rs.
pub const WRITER_SEPARATOR: &str = "\t";

/// A generic line writer.
/// - source: Boxed `BufWriter` (can either handle file-writing, or stdout).
pub struct GenericWriter<'a> {
    source: BufWriter<Box<dyn Write + 'a>>
}

impl<'a> GenericWriter<'a>{
    /// Instantiate a new `Writer`, linked to a file. Missing parent directories are created.
    /// Writes to stdout when `path` is `None`.
    ///
    /// # Errors
    /// if `path` is either an invalid file, or the user does not have the proper
    /// UNIX permissions to write at this location.
    pub fn new(path: Option<impl AsRef<Path>>) -> Result<GenericWriter<'a>>{
        use WriterError::{IOError, CreateParentDirectory};
        Ok(GenericWriter{ source: match path {
            Some(path) => {
                let path = path.as_ref();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .map_err(IOError)
                        .with_loc(|| CreateParentDirectory(path.to_path_buf()))?;
                }
                let file = File::create(path).map_err(IOError).with_loc(|| format!("While creating {}", path.display()))?;
                BufWriter::new(Box::new(file))
            },
            None => {
                BufWriter::new(Box::new(std::io::stdout()))
            }
        }})
    }

    /// Write a single line, as is.
    ///
    /// # Errors
    /// - if the line cannot be written.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.source, "{line}").map_err(WriterError::IOError).loc("While writing line into file")
    }

    /// Write the contents of a generic iterator within a file/stdout.
    /// one Iteration step = one line. Items are expected to carry their own `WRITER_SEPARATOR`s.
    ///
    /// # Errors
    /// - If any of the Items within `iter` fails to get written within the file.
    pub fn write_iter<T, I>(&mut self, iter: T) -> Result<()>
    where   T: IntoIterator<Item = I>,
            I: std::fmt::Display,
    {
        for obj in iter {
            writeln!(self.source, "{obj}")
                .map_err(WriterError::IOError)
                .loc("While writing contents into file")?;
        }

        self.source.flush().loc("While flushing buffer contents of Writer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, u8);

    impl std::fmt::Display for Row {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}{WRITER_SEPARATOR}{}", self.0, self.1)
        }
    }

    #[test]
    fn write_file() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path       = tmpdir.path().join("nested").join("founders.pop");
        let mut writer = GenericWriter::new(Some(&path))?;

        writer.write_line("#dpl rs4491689")?;
        writer.write_iter([Row("ind1", 0), Row("ind2", 1)])?;

        let got = std::fs::read_to_string(path)?;
        assert_eq!(got, "#dpl rs4491689\nind1\t0\nind2\t1\n");
        Ok(())
    }
}
