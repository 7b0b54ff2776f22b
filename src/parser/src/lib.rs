use std::{
    fs::File,
    path::{Path, PathBuf},
    fmt::{self, Display, Formatter},
    ffi::OsStr,
};

use located_error::prelude::*;

use clap::{Parser, Subcommand, ArgEnum};
use serde::{Serialize, Deserialize};
use log::debug;

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="dplsim-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// DPLSim-rs: Disease-Predisposing Locus simulations for benchmarking gene mapping methods
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-{module name}.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    /// - `from-yaml` and `cite` are never serialized.
    ///
    /// # Errors
    /// - if `serde_yaml` fails to parse `Self` to a string.
    /// - if the yaml file cannot be written within `--output-dir`
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        let Commands::Run(run) = &self.commands else {
            return Ok(None)
        };

        // Parse arguments to yaml and print to console.
        let serialized = serde_yaml::to_string(&self)
            .map_err(|err| ParserError::Serialize(err.to_string()))
            .loc("While serializing command line arguments")?;

        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file = run.pipeline.output_dir.join(format!("{current_time}-dplsim-run.yaml"));

        std::fs::write(&output_file, serialized)
            .with_loc(|| format!("Unable to serialize arguments into {}", output_file.display()))?;
        Ok(Some(output_file))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    ///
    /// # Errors
    /// - Returns `FileNotFound` or `PermissionDenied` if the provided `.yaml` is invalid,
    ///   or does not carry read permissions
    /// - if `serde_yaml` fails to parse the provided file to `Self`.
    pub fn deserialize(yaml: impl AsRef<Path>) -> Result<Self> {
        let yaml = yaml.as_ref();
        let file = File::open(yaml).with_loc(|| format!("While opening {}", yaml.display()))?;
        serde_yaml::from_reader(file)
            .map_err(|e| ParserError::Deserialize(yaml.display().to_string(), e.to_string()))
            .loc("While parsing a previously serialized run")
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Run one or more stages of the case/control simulation pipeline.
    ///
    /// Stages are enabled with their respective flag (--download, --init, --expand, --penetrance,
    /// --format, --cline) and always run in that order. A stage is skipped whenever its output
    /// artifact already exists, so an interrupted run may simply be relaunched.
    Run(Box<Run>),

    /// Run dplsim-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply (or resume) a dplsim-rs run using the exact same
    /// parameters and arguments.
    FromYaml {
        yaml: PathBuf,
    },

    /// Print all citations tied to this project
    Cite
}

#[derive(clap::Args, Debug, Default, Serialize, Deserialize)]
pub struct Run {
    #[clap(flatten)]
    pub pipeline: PipelineArgs,
    #[clap(flatten)]
    pub population: PopulationArgs,
    #[clap(flatten)]
    pub penetrance: PenetranceArgs,
    #[clap(flatten)]
    pub sweep: SweepArgs,
    #[clap(flatten)]
    pub commands: CommandArgs,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ArgEnum, Serialize, Deserialize)]
pub enum Mode {
    Single,
    Replicates,
}

impl Default for Mode {
    fn default() -> Self {Self::Single}
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single     => write!(f, "single"),
            Self::Replicates => write!(f, "replicates"),
        }
    }
}

/// Pipeline stages and run-level settings.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct PipelineArgs {
    /// Download reference HapMap populations.
    #[clap(long)]
    pub download: bool,

    /// Select markers and initialize the merged founder population.
    #[clap(long)]
    pub init: bool,

    /// Expand the initial population forward in time, up to the requested disease allele frequency.
    #[clap(long)]
    pub expand: bool,

    /// Assign case/control phenotypes through rejection sampling (single gene model).
    #[clap(long)]
    pub penetrance: bool,

    /// Create input files for the requested analysis methods (see --programs).
    #[clap(long)]
    pub format: bool,

    /// Write run scripts for the requested analysis methods (see --programs).
    #[clap(long)]
    pub cline: bool,

    /// Run the pipeline for one parameter setting, or sweep a grid of replicates.
    ///
    /// single: every enabled stage runs once, using the --wtr, --grr, --num-cases and --num-controls values.{n}
    /// replicates: every enabled stage runs once per grid point, using the --{maf,cc,wtr,grr}-* sweep arguments.{n}
    #[clap(short='m', long, arg_enum, default_value("single"))]
    pub mode: Mode,

    /// Output directory where results will be written.
    ///
    /// Note that dplsim-rs will create the specified leaf directory if it is not present, but does not
    /// allow itself from creating parent directories. In replicates mode, this is the root of the
    /// experiment directory hierarchy.
    #[clap(short, long, default_value("dplsim-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Provide the RNG with a set seed.
    ///
    /// Each case/control sampling run derives its own seed from this value, so that results are
    /// reproducible regardless of --threads.
    #[clap(long, required(false), default_value_t=fastrand::u64(u64::MIN..=u64::MAX))]
    pub seed: u64,

    /// Number of parallel case/control sampling runs (replicates mode only).
    #[clap(short='@', long, default_value("1"))]
    pub threads: usize,

    /// Maximum number of offspring candidates examined while sampling a single case/control dataset.
    ///
    /// Sampling fails (and no dataset is written) whenever this budget is spent before both the
    /// requested number of cases and controls are reached.
    #[clap(long, default_value("10000000"))]
    pub max_candidates: usize,
}

/// Founder population settings, forwarded to the population simulation collaborator.
#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct PopulationArgs {
    /// Name of the disease predisposing locus (DPL).
    #[clap(long, default_value("rs4491689"))]
    pub dpl: String,

    /// Target disease allele frequency of the expanded population (single mode).
    #[clap(long, default_value("0.05"), parse(try_from_str=parse_probability))]
    pub maf: f64,

    /// Number of founder individuals generated by the built-in population expansion.
    ///
    /// Only used when --expand is requested without an --expand-cmd.
    #[clap(long, default_value("10000"))]
    pub founders: usize,

    /// Path to the initial population (single mode). Default: '<output-dir>/init.pop'
    #[clap(long)]
    pub init_pop: Option<PathBuf>,

    /// Path to the expanded population (single mode). Default: '<output-dir>/expanded.pop'
    #[clap(long)]
    pub expanded_pop: Option<PathBuf>,
}

/// Single gene disease model.
#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct PenetranceArgs {
    /// Wild-type risk: disease risk of individuals carrying no copy of the risk allele.
    #[clap(long, default_value("0.05"), parse(try_from_str=parse_probability))]
    pub wtr: f64,

    /// Genotype relative risk of heterozygous individuals.
    #[clap(long, default_value("1.0"), parse(try_from_str=parse_positive))]
    pub grr: f64,

    /// Number of cases within each sampled dataset.
    #[clap(long, default_value("1000"))]
    pub num_cases: usize,

    /// Number of controls within each sampled dataset (single mode). See --cc-* in replicates mode.
    #[clap(long, default_value("1000"))]
    pub num_controls: usize,

    /// Path to the sampled case/control dataset (single mode). Default: '<output-dir>/sample.pop'
    #[clap(long)]
    pub sampled_pop: Option<PathBuf>,

    /// Replay a pre-generated stream of offspring candidates instead of mating the expanded population (single mode).
    ///
    /// One candidate per line: '<dosage> [<draw>]'. Missing draws are generated using --seed.
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub candidates: Option<PathBuf>,
}

/// Replicates grid. Each dimension is swept over `--<dim>-steps` evenly spaced levels between
/// `--<dim>-lo` and `--<dim>-hi` (inclusive), with `--<dim>-reps` replicates per level.
#[derive(Parser, Debug, Serialize, Deserialize)]
pub struct SweepArgs {
    /// Minimum minor allele frequency.
    #[clap(long, default_value("0.05"))]
    pub maf_lo: f64,
    /// Maximum minor allele frequency.
    #[clap(long, default_value("0.05"))]
    pub maf_hi: f64,
    /// Number of minor allele frequency levels.
    #[clap(long, default_value("1"))]
    pub maf_steps: usize,
    /// Replicates within each minor allele frequency level.
    #[clap(long, default_value("1"))]
    pub maf_reps: usize,

    /// Minimum number of controls.
    #[clap(long, default_value("1000"))]
    pub cc_lo: f64,
    /// Maximum number of controls.
    #[clap(long, default_value("1000"))]
    pub cc_hi: f64,
    /// Number of control levels.
    #[clap(long, default_value("1"))]
    pub cc_steps: usize,
    /// Replicates within each control level.
    #[clap(long, default_value("1"))]
    pub cc_reps: usize,

    /// Minimum wild-type risk.
    #[clap(long, default_value("0.05"))]
    pub wtr_lo: f64,
    /// Maximum wild-type risk.
    #[clap(long, default_value("0.05"))]
    pub wtr_hi: f64,
    /// Number of wild-type risk levels.
    #[clap(long, default_value("1"))]
    pub wtr_steps: usize,
    /// Replicates within each wild-type risk level.
    #[clap(long, default_value("1"))]
    pub wtr_reps: usize,

    /// Minimum genotype relative risk.
    #[clap(long, default_value("1.0"))]
    pub grr_lo: f64,
    /// Maximum genotype relative risk.
    #[clap(long, default_value("2.0"))]
    pub grr_hi: f64,
    /// Number of genotype relative risk levels.
    #[clap(long, default_value("5"))]
    pub grr_steps: usize,
    /// Replicates within each genotype relative risk level.
    #[clap(long, default_value("100"))]
    pub grr_reps: usize,

    /// Names of the analysis methods for which input files and run scripts are created.
    ///
    /// Accepted values (case insensitive): PLINK, BLOSSOC, MARGARITA, TREEDT, BETA, SIMUPOP
    #[clap(short='p', long, multiple_values(true), default_values(&["PLINK"]))]
    pub programs: Vec<String>,

    /// Do not create the experiment directory hierarchy before running stages.
    #[clap(long)]
    pub no_create_dirs: bool,
}

impl Default for SweepArgs {
    fn default() -> Self {
        Self {
            maf_lo: 0.05, maf_hi: 0.05, maf_steps: 1, maf_reps: 1,
            cc_lo: 1000.0, cc_hi: 1000.0, cc_steps: 1, cc_reps: 1,
            wtr_lo: 0.05, wtr_hi: 0.05, wtr_steps: 1, wtr_reps: 1,
            grr_lo: 1.0, grr_hi: 2.0, grr_steps: 5, grr_reps: 100,
            programs: vec![String::from("PLINK")],
            no_create_dirs: false,
        }
    }
}

/// External command templates, used to delegate stages to third-party tools.
///
/// Templates are run through `sh -c`, after substitution of the following placeholders:{n}
/// {input}: input artifact | {output}: output artifact | {dir}: working directory{n}
/// {program}: analysis method name | {maf}: target minor allele frequency{n}
#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct CommandArgs {
    /// Command used to download reference populations (--download).
    #[clap(long)]
    pub download_cmd: Option<String>,

    /// Command used to select markers and build the initial population (--init).
    #[clap(long)]
    pub init_cmd: Option<String>,

    /// Command used to expand the initial population (--expand). Default: built-in Hardy-Weinberg founders.
    #[clap(long)]
    pub expand_cmd: Option<String>,

    /// Command used to format a case/control dataset for an analysis method (--format).
    #[clap(long)]
    pub format_cmd: Option<String>,

    /// Command used to write the run script of an analysis method (--cline).
    #[clap(long)]
    pub cline_cmd: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir()
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }

    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if ! Path::new(s).exists() {
        std::fs::create_dir(s).with_loc(|| format!("While creating output directory {s:?}"))?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

/// Parse a probability, i.e. a float within the [0.0, 1.0] range.
fn parse_probability(s: &str) -> Result<f64> {
    let value = s.parse::<f64>().with_loc(|| format!("While parsing {s}"))?;
    match (0.0..=1.0).contains(&value) {
        true  => Ok(value),
        false => Err(ParserError::ParseProbability(value)).with_loc(|| format!("While parsing {s}"))
    }
}

/// Parse a strictly positive float.
fn parse_positive(s: &str) -> Result<f64> {
    let value = s.parse::<f64>().with_loc(|| format!("While parsing {s}"))?;
    match value > 0.0 {
        true  => Ok(value),
        false => Err(ParserError::NonPositive(value)).with_loc(|| format!("While parsing {s}"))
    }
}
