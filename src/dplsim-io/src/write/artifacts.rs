use std::{ffi::OsString, fmt::{self, Display, Formatter}, fs, path::{Path, PathBuf}};

use located_error::prelude::*;
use log::debug;
use penetrance::{CaseControlDataset, Founder, Population};

use super::{GenericWriter, WRITER_SEPARATOR};

/// `<id>\t<allele>\t<allele>`
struct FounderRow<'a>(&'a Founder);

impl Display for FounderRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a1, a2] = self.0.alleles();
        write!(f, "{}{WRITER_SEPARATOR}{a1}{WRITER_SEPARATOR}{a2}", self.0.id)
    }
}

/// Side file of `artifact`, where its contents are written before being moved in place: `<artifact>.partial`
///
/// # Errors
/// - if `artifact` does not point to a file name.
pub fn partial_path(artifact: &Path) -> Result<PathBuf> {
    let mut name: OsString = artifact.file_name()
        .with_loc(|| format!("Invalid artifact path: {}", artifact.display()))?
        .to_os_string();
    name.push(".partial");
    Ok(artifact.with_file_name(name))
}

/// Run `write` against the side file of `artifact`, then rename it to `artifact`.
///
/// An interrupted write never leaves anything at `artifact`. A stale side file left behind by a
/// previous run is overwritten.
///
/// # Errors
/// - any error of `write`. The side file is then removed.
/// - if the side file cannot be renamed.
pub fn persist<F>(artifact: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let partial = partial_path(artifact)?;
    if let Err(e) = write(&partial) {
        fs::remove_file(&partial).ok();
        return Err(e)
    }
    fs::rename(&partial, artifact)
        .with_loc(|| format!("While moving {} to {}", partial.display(), artifact.display()))
}

/// Atomically write a founder population at `path`, using the `#dpl <name>` + `<id>\t<allele>\t<allele>` format.
///
/// # Errors
/// - if `path` cannot be created or written to.
pub fn write_population(path: &Path, population: &Population) -> Result<()> {
    persist(path, |partial| {
        let loc_msg = || format!("While writing population into {}", partial.display());
        let mut writer = GenericWriter::new(Some(partial)).with_loc(loc_msg)?;
        if let Some(dpl) = &population.dpl {
            writer.write_line(&format!("#dpl {dpl}")).with_loc(loc_msg)?;
        }
        writer.write_iter(population.founders.iter().map(FounderRow)).with_loc(loc_msg)
    })?;
    debug!("Wrote {} founders into {}", population.len(), path.display());
    Ok(())
}

/// Atomically write a case/control dataset at `path`, as `Id\tStatus\tDosage` rows.
///
/// # Errors
/// - if `path` cannot be created or written to.
pub fn write_dataset(path: &Path, dataset: &CaseControlDataset) -> Result<()> {
    persist(path, |partial| {
        let loc_msg = || format!("While writing case/control dataset into {}", partial.display());
        let mut writer = GenericWriter::new(Some(partial)).with_loc(loc_msg)?;
        writer.write_line(CaseControlDataset::HEADER).with_loc(loc_msg)?;
        writer.write_iter(dataset.rows()).with_loc(loc_msg)
    })?;
    debug!("Wrote {} individuals into {}", dataset.individuals.len(), path.display());
    Ok(())
}
