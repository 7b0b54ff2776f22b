use std::fmt::{self, Display, Formatter};

use located_error::prelude::*;

use crate::{PipelineError, Stage};

/// What dplsim-rs can do for a given analysis method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Input files can be generated from a case/control dataset.
    pub format      : bool,
    /// A run script can be generated.
    pub command_line: bool,
    /// Populations produced by this program can be read.
    pub input       : bool,
}

const TOOL: Capabilities = Capabilities{format: true, command_line: true, input: false};

#[derive(Debug, PartialEq, Eq)]
pub struct AnalysisMethod {
    pub name        : &'static str,
    pub capabilities: Capabilities,
    /// Extension of the formatted input file.
    pub extension   : &'static str,
}

impl AnalysisMethod {
    /// Whether this method takes part in `stage`. Only formatting and run scripts depend on the method.
    #[must_use]
    pub fn supports(&self, stage: Stage) -> bool {
        match stage {
            Stage::FormatForTools     => self.capabilities.format,
            Stage::GenerateRunScripts => self.capabilities.command_line,
            _                         => true,
        }
    }

    /// Name of the formatted input file, within the method's directory.
    #[must_use]
    pub fn input_file(&self) -> String {
        format!("sample.{}", self.extension)
    }
}

impl Display for AnalysisMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub static REGISTRY: [AnalysisMethod; 6] = [
    AnalysisMethod{name: "PLINK",     capabilities: TOOL, extension: "ped"},
    AnalysisMethod{name: "BLOSSOC",   capabilities: TOOL, extension: "txt"},
    AnalysisMethod{name: "MARGARITA", capabilities: TOOL, extension: "txt"},
    AnalysisMethod{name: "TREEDT",    capabilities: TOOL, extension: "txt"},
    AnalysisMethod{name: "BETA",      capabilities: TOOL, extension: "txt"},
    AnalysisMethod{name: "SIMUPOP",   capabilities: Capabilities{format: false, command_line: false, input: true}, extension: "pop"},
];

/// Case-insensitive lookup of an analysis method.
///
/// # Errors
/// - `UnknownProgram` if `name` does not match any registered method.
pub fn lookup(name: &str) -> Result<&'static AnalysisMethod> {
    REGISTRY.iter()
        .find(|method| method.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let valid = REGISTRY.iter().map(|m| m.name).collect::<Vec<_>>().join(", ");
            PipelineError::UnknownProgram(name.to_string(), valid)
        })
        .loc("While looking up analysis method")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() -> Result<()> {
        assert_eq!(lookup("plink")?.name, "PLINK");
        assert_eq!(lookup("TreeDT")?.name, "TREEDT");
        Ok(())
    }

    #[test]
    fn unknown_program() {
        let err = lookup("GENEHUNTER").expect_err("Unregistered method");
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::UnknownProgram(name, _)) if name == "GENEHUNTER"));
    }

    #[test]
    fn capabilities() -> Result<()> {
        let simupop = lookup("simupop")?;
        assert!(!simupop.supports(Stage::FormatForTools));
        assert!(!simupop.supports(Stage::GenerateRunScripts));
        assert!(simupop.capabilities.input);

        let plink = lookup("PLINK")?;
        assert!(plink.supports(Stage::FormatForTools) && plink.supports(Stage::GenerateRunScripts));
        assert_eq!(plink.input_file(), "sample.ped");
        Ok(())
    }
}
