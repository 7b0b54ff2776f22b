use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use located_error::prelude::*;
use log::debug;
use penetrance::{Founder, Population};

mod error;
pub use error::PopulationError;

const DPL_TAG: &str = "#dpl";

/// Founder population reader.
/// ### File characteristics:
/// - Optional header: `#dpl <name of the disease predisposing locus>`
/// - Other lines starting with `#` are comments.
/// - Whitespace separated fields. Columns: <Individual-id>  <allele>  <allele>
/// - Alleles: 0 (wild-type) | 1 (risk allele)
pub struct PopulationReader;

impl PopulationReader {
    /// Read a population from a file.
    ///
    /// # Errors
    /// - if `path` cannot be opened.
    /// - `Malformed` if any line does not follow the expected layout.
    /// - `Empty` if the file does not contain a single founder.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Population> {
        let path = path.as_ref();
        let loc_msg = || format!("While reading population from {}", path.display());
        let file = File::open(path).with_loc(loc_msg)?;
        let population = Self::parse(BufReader::new(file)).with_loc(loc_msg)?;

        if population.is_empty() {
            return Err(PopulationError::Empty(path.to_path_buf())).with_loc(loc_msg)
        }
        debug!("Read {} founders from {}", population.len(), path.display());
        Ok(population)
    }

    /// Parse a population from any buffered source.
    ///
    /// # Errors
    /// - `Malformed` if any line does not follow the expected layout.
    pub fn parse<R: BufRead>(source: R) -> Result<Population> {
        let mut population = Population::default();
        for (i, line) in source.lines().enumerate() {
            let line = line.loc("While reading population line")?;
            let line = line.trim();
            let malformed = || PopulationError::Malformed{line: i + 1, content: line.to_string()};

            if let Some(dpl) = line.strip_prefix(DPL_TAG) {
                let dpl = dpl.trim();
                if dpl.is_empty() {
                    return Err(malformed()).loc("Missing locus name within #dpl header")
                }
                population.dpl = Some(dpl.to_string());
                continue
            }
            if line.is_empty() || line.starts_with('#') {
                continue
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let [id, a1, a2] = fields.as_slice() else {
                return Err(malformed()).loc("Expected exactly three fields")
            };
            let alleles = [*a1, *a2].map(str::parse::<u8>);
            let [Ok(a1), Ok(a2)] = alleles else {
                return Err(malformed()).loc("Failed to parse alleles")
            };
            let founder = Founder::new(*id, [a1, a2]).with_loc(malformed)?;
            population.founders.push(founder);
        }
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::write::write_population;

    #[test]
    fn parse_population() -> Result<()> {
        let source = "#dpl rs4491689\n# comment\nind0\t0\t1\n\nind1 1 1\n";
        let population = PopulationReader::parse(Cursor::new(source))?;
        assert_eq!(population.dpl.as_deref(), Some("rs4491689"));
        assert_eq!(population.len(), 2);
        assert_eq!(population.founders[1].alleles(), [1, 1]);
        assert_eq!(population.allele_frequency(), Some(0.75));
        Ok(())
    }

    #[test]
    fn headerless_population() -> Result<()> {
        let population = PopulationReader::parse(Cursor::new("a 0 0\n"))?;
        assert!(population.dpl.is_none());
        assert_eq!(population.len(), 1);
        Ok(())
    }

    #[test]
    fn malformed_lines() {
        for source in ["a 0", "a 0 1 1", "a 0 x", "a 0 2", "#dpl"] {
            let err = PopulationReader::parse(Cursor::new(source)).expect_err("Line is malformed");
            assert!(err.chain().any(|e| e.to_string().contains("line 1")), "{source}: {err:?}");
        }
    }

    #[test]
    fn write_then_read() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("init.pop");
        let population = Population::new(Some("rs1".into()), vec![Founder::new("x", [1, 0])?]);
        write_population(&path, &population)?;
        assert_eq!(PopulationReader::from_path(&path)?, population);
        Ok(())
    }

    #[test]
    fn empty_or_missing_files() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("empty.pop");
        std::fs::write(&path, "#dpl rs1\n")?;
        let err = PopulationReader::from_path(&path).expect_err("Population is empty");
        assert!(matches!(err.downcast_ref::<PopulationError>(), Some(PopulationError::Empty(_))));

        assert!(PopulationReader::from_path(tmpdir.path().join("missing.pop")).is_err());
        Ok(())
    }
}
