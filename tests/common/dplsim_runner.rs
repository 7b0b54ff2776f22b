use std::path::{Path, PathBuf};

use clap::Parser;

use super::Fixture;

/// Assemble a `dplsim-rs run` command line, one argument at a time.
pub struct DplsimRunnerBuilder {
    args      : Vec<String>,
    fixtures  : Vec<Fixture>,
    output_dir: Option<Fixture>,
}

impl DplsimRunnerBuilder {
    pub fn new(mode: parser::Mode) -> Self {
        let args = ["dplsim-rs", "run", "--mode", &mode.to_string()].map(String::from).to_vec();
        Self{args, fixtures: Vec::new(), output_dir: None}
    }

    /// Enable pipeline stages, using their flag name (e.g. `expand`, `penetrance`)
    pub fn stages(mut self, stages: &[&str]) -> Self {
        self.args.extend(stages.iter().map(|stage| format!("--{stage}")));
        self
    }

    pub fn arg(mut self, flag: &str, value: impl ToString) -> Self {
        self.args.push(format!("--{flag}"));
        self.args.push(value.to_string());
        self
    }

    pub fn programs(mut self, programs: &[&str]) -> Self {
        self.args.push(String::from("--programs"));
        self.args.extend(programs.iter().map(ToString::to_string));
        self
    }

    /// Copy a file from `tests/test-data`, and pass its location to `--<flag>`
    pub fn fixture(mut self, flag: &str, name: &str) -> Self {
        let fixture = Fixture::copy(name);
        self = self.arg(flag, &fixture);
        self.fixtures.push(fixture);
        self
    }

    pub fn set_output_dir(mut self, name: &str) -> Self {
        self.output_dir = Some(Fixture::blank(name));
        self
    }

    pub fn build(mut self) -> Result<DplsimRunner, String> {
        let output_dir = self.output_dir.ok_or("Missing output directory")?;
        self.args.push(String::from("--output-dir"));
        self.args.push(output_dir.to_string());
        Ok(DplsimRunner{args: self.args, output_dir, _fixtures: self.fixtures})
    }
}

pub struct DplsimRunner {
    args      : Vec<String>,
    output_dir: Fixture,
    _fixtures : Vec<Fixture>,
}

impl DplsimRunner {
    pub fn cli(&self) -> parser::Cli {
        parser::Cli::parse_from(&self.args)
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        eprintln!("{}", self.args.join(" "));
        dplsim_rs::run(self.cli())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(relative)
    }
}
