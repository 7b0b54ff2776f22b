use std::{
    path::Path,
    process::Command,
};

use located_error::prelude::*;
use log::{debug, info, trace};

use dplsim_io::{read::PopulationReader, write::write_population};
use penetrance::Population;

use crate::{AnalysisMethod, Collaborators, PipelineError, Stage, StageFlags};

/// A shell command, with `{placeholder}` substitution.
///
/// # Placeholders
/// `{input}`, `{output}`, `{dir}` (parent directory of `{output}`), `{program}`, `{maf}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate(String);

impl CommandTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[must_use]
    pub fn render(&self, vars: &[(&str, String)]) -> String {
        vars.iter().fold(self.0.clone(), |command, (key, value)| command.replace(&format!("{{{key}}}"), value))
    }

    /// Render this template and run it through `sh -c`.
    ///
    /// # Errors
    /// - if `sh` cannot be spawned.
    /// - `CommandFailed` if the command exits with a non-zero status.
    pub fn run(&self, vars: &[(&str, String)]) -> Result<()> {
        let command = self.render(vars);
        debug!("Running: {command}");
        let output = Command::new("sh").arg("-c").arg(&command).output()
            .with_loc(|| format!("While spawning '{command}'"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            trace!("{command}: {}", stdout.trim());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PipelineError::CommandFailed{command, status: output.status, stderr})
                .loc("While running external command")
        }
        Ok(())
    }
}

fn path_vars(input: &Path, output: &Path) -> Vec<(&'static str, String)> {
    let dir = output.parent().unwrap_or(output);
    vec![
        ("input",  input.display().to_string()),
        ("output", output.display().to_string()),
        ("dir",    dir.display().to_string()),
    ]
}

/// Production collaborators: user supplied command templates.
///
/// Population expansion falls back to a built-in Hardy-Weinberg draw of `founders` individuals
/// at the requested allele frequency, when no `--expand-cmd` is given.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    download: Option<CommandTemplate>,
    init    : Option<CommandTemplate>,
    expand  : Option<CommandTemplate>,
    format  : Option<CommandTemplate>,
    cline   : Option<CommandTemplate>,
    founders: usize,
    dpl     : String,
    seed    : u64,
}

impl ExternalTools {
    /// # Errors
    /// - `MissingCommand` if an enabled stage requires a command template that was not provided.
    pub fn new(commands: &parser::CommandArgs, stages: &StageFlags, founders: usize, dpl: &str, seed: u64) -> Result<Self> {
        let template = |cmd: &Option<String>| cmd.as_ref().map(CommandTemplate::new);
        let tools = Self {
            download: template(&commands.download_cmd),
            init    : template(&commands.init_cmd),
            expand  : template(&commands.expand_cmd),
            format  : template(&commands.format_cmd),
            cline   : template(&commands.cline_cmd),
            founders,
            dpl: dpl.to_string(),
            seed,
        };

        let required = [
            (Stage::Download, &tools.download, "download-cmd"),
            (Stage::InitPopulation, &tools.init, "init-cmd"),
            (Stage::FormatForTools, &tools.format, "format-cmd"),
            (Stage::GenerateRunScripts, &tools.cline, "cline-cmd"),
        ];
        for (stage, template, flag) in required {
            if stages.is_enabled(stage) && template.is_none() {
                return Err(PipelineError::MissingCommand(stage, flag)).loc("While checking external command templates")
            }
        }
        Ok(tools)
    }

    fn require<'a>(template: &'a Option<CommandTemplate>, stage: Stage, flag: &'static str) -> Result<&'a CommandTemplate> {
        template.as_ref().ok_or(PipelineError::MissingCommand(stage, flag)).loc("While fetching command template")
    }
}

impl Collaborators for ExternalTools {
    fn download(&self, dir: &Path) -> Result<()> {
        let template = Self::require(&self.download, Stage::Download, "download-cmd")?;
        let dir = dir.display().to_string();
        template.run(&[("input", dir.clone()), ("output", dir.clone()), ("dir", dir)])
    }

    fn init_population(&self, reference: &Path, artifact: &Path) -> Result<()> {
        let template = Self::require(&self.init, Stage::InitPopulation, "init-cmd")?;
        template.run(&path_vars(reference, artifact))
    }

    fn expand_population(&self, init: &Path, maf: f64, artifact: &Path) -> Result<()> {
        if let Some(template) = &self.expand {
            let mut vars = path_vars(init, artifact);
            vars.push(("maf", maf.to_string()));
            return template.run(&vars)
        }

        info!("Drawing {} founders at MAF = {maf} (built-in Hardy-Weinberg expansion)", self.founders);
        let mut rng = fastrand::Rng::with_seed(self.seed ^ maf.to_bits());
        let population = Population::hardy_weinberg(self.founders, maf, Some(self.dpl.clone()), &mut rng);
        write_population(artifact, &population)
    }

    fn load_population(&self, artifact: &Path) -> Result<Population> {
        let population = PopulationReader::from_path(artifact)?;
        match &population.dpl {
            Some(dpl) if *dpl != self.dpl => log::warn!("{} carries locus '{dpl}', while '{}' was requested", artifact.display(), self.dpl),
            _ => (),
        }
        Ok(population)
    }

    fn format(&self, method: &AnalysisMethod, sample: &Path, artifact: &Path) -> Result<()> {
        let template = Self::require(&self.format, Stage::FormatForTools, "format-cmd")?;
        let mut vars = path_vars(sample, artifact);
        vars.push(("program", method.name.to_string()));
        template.run(&vars)
    }

    fn write_run_script(&self, method: &AnalysisMethod, input: &Path, artifact: &Path) -> Result<()> {
        let template = Self::require(&self.cline, Stage::GenerateRunScripts, "cline-cmd")?;
        let mut vars = path_vars(input, artifact);
        vars.push(("program", method.name.to_string()));
        template.run(&vars)
    }
}
