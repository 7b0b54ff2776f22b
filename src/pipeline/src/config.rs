use std::path::{Path, PathBuf};

use located_error::prelude::*;
use log::{debug, warn};

use parser::Mode;
use penetrance::{RiskTable, SampleTarget, SamplingBudget};
use replicator::{Dimension, DimensionRange, SweepConfig};

use crate::{registry, AnalysisMethod, PipelineError, Stage, StageFlags};

/// Reference data directory, relative to the output directory.
pub const REFERENCE_DIR: &str = "HapMap";
/// Initial founder population, relative to the output directory.
pub const INIT_POP: &str = "init.pop";
/// Default expanded population of single mode, relative to the output directory.
pub const EXPANDED_POP: &str = "expanded.pop";
/// Sampled case/control dataset, relative to its sample directory.
pub const SAMPLE_POP: &str = "sample.pop";
/// Run script, relative to the directory of its analysis method.
pub const RUN_SCRIPT: &str = "run.bash";

/// Disease model of a single sampling run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub risks : RiskTable,
    pub target: SampleTarget,
}

/// Artifact locations of single mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleArtifacts {
    pub reference: PathBuf,
    pub init     : PathBuf,
    pub expanded : PathBuf,
    pub sampled  : PathBuf,
}

#[derive(Debug, Clone)]
pub enum Plan {
    Single {
        maf      : f64,
        /// `None` when the penetrance stage is disabled.
        sampling : Option<SamplingParams>,
        artifacts: SingleArtifacts,
    },
    Replicates(SweepConfig),
}

/// Validated run configuration. Every parameter is checked here, before any stage runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stages    : StageFlags,
    pub output_dir: PathBuf,
    pub seed      : u64,
    pub threads   : usize,
    pub budget    : SamplingBudget,
    pub num_cases : usize,
    pub methods   : Vec<&'static AnalysisMethod>,
    /// Pre-generated candidate stream (single mode only).
    pub candidates: Option<PathBuf>,
    pub plan      : Plan,
}

impl PipelineConfig {
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self.plan {
            Plan::Single{..}    => Mode::Single,
            Plan::Replicates(_) => Mode::Replicates,
        }
    }

    fn methods(programs: &[String]) -> Result<Vec<&'static AnalysisMethod>> {
        let mut methods: Vec<&'static AnalysisMethod> = Vec::with_capacity(programs.len());
        for program in programs {
            let method = registry::lookup(program)?;
            if methods.contains(&method) {
                warn!("{method} was requested more than once. Ignoring duplicate entry '{program}'");
                continue
            }
            methods.push(method);
        }
        Ok(methods)
    }

    fn single_plan(run: &parser::Run, stages: &StageFlags) -> Result<Plan> {
        let root = &run.pipeline.output_dir;
        let or_default = |path: &Option<PathBuf>, default: &str| path.clone().unwrap_or_else(|| root.join(default));

        let sampling = match stages.is_enabled(Stage::AssignPhenotypes) {
            true => Some(SamplingParams{
                risks : RiskTable::compute(run.penetrance.wtr, run.penetrance.grr)?,
                target: SampleTarget::new(run.penetrance.num_cases, run.penetrance.num_controls)?,
            }),
            false => None,
        };

        Ok(Plan::Single {
            maf: run.population.maf,
            sampling,
            artifacts: SingleArtifacts {
                reference: root.join(REFERENCE_DIR),
                init     : or_default(&run.population.init_pop, INIT_POP),
                expanded : or_default(&run.population.expanded_pop, EXPANDED_POP),
                sampled  : or_default(&run.penetrance.sampled_pop, SAMPLE_POP),
            },
        })
    }

    fn replicates_plan(run: &parser::Run, stages: &StageFlags, methods: &[&'static AnalysisMethod]) -> Result<Plan> {
        let args = &run.sweep;
        if run.penetrance.candidates.is_some() {
            return Err(PipelineError::IncompatibleOption("--candidates")).loc("While validating replicates mode")
        }

        let sweep = SweepConfig::new(
            DimensionRange::new(Dimension::Maf,        args.maf_lo, args.maf_hi, args.maf_steps, args.maf_reps)?,
            DimensionRange::new(Dimension::SampleSize, args.cc_lo,  args.cc_hi,  args.cc_steps,  args.cc_reps)?,
            DimensionRange::new(Dimension::Wtr,        args.wtr_lo, args.wtr_hi, args.wtr_steps, args.wtr_reps)?,
            DimensionRange::new(Dimension::Grr,        args.grr_lo, args.grr_hi, args.grr_steps, args.grr_reps)?,
            methods.iter().map(|method| method.name.to_string()).collect(),
            !args.no_create_dirs,
        )?;

        // Every risk table and sample target of the grid must be valid before the first stage runs.
        if stages.is_enabled(Stage::AssignPhenotypes) {
            for wtr in sweep.range(Dimension::Wtr).values() {
                for grr in sweep.range(Dimension::Grr).values() {
                    RiskTable::compute(wtr, grr).with_loc(|| format!("While validating the risk table of WTR={wtr}, GRR={grr}"))?;
                }
            }
            for controls in sweep.range(Dimension::SampleSize).values() {
                SampleTarget::new(run.penetrance.num_cases, controls_of(controls))?;
            }
        }
        Ok(Plan::Replicates(sweep))
    }
}

/// Number of controls requested by a sample size level.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn controls_of(value: f64) -> usize {
    value.round() as usize
}

impl TryFrom<&parser::Run> for PipelineConfig {
    type Error = anyhow::Error;

    fn try_from(run: &parser::Run) -> Result<Self> {
        let loc_msg = "While validating run configuration";
        let stages = StageFlags::from(&run.pipeline);
        let methods = Self::methods(&run.sweep.programs).loc(loc_msg)?;

        let plan = match run.pipeline.mode {
            Mode::Single     => Self::single_plan(run, &stages),
            Mode::Replicates => Self::replicates_plan(run, &stages, &methods),
        }.loc(loc_msg)?;

        let config = Self {
            stages,
            output_dir: run.pipeline.output_dir.clone(),
            seed      : run.pipeline.seed,
            threads   : run.pipeline.threads,
            budget    : SamplingBudget::new(run.pipeline.max_candidates).loc(loc_msg)?,
            num_cases : run.penetrance.num_cases,
            methods,
            candidates: run.penetrance.candidates.clone(),
            plan,
        };
        debug!("{config:#?}");
        Ok(config)
    }
}

impl PipelineConfig {
    /// Location of the artifact of a method-specific stage, within `method_dir`.
    #[must_use]
    pub fn method_artifact(method: &AnalysisMethod, method_dir: &Path, stage: Stage) -> PathBuf {
        match stage {
            Stage::GenerateRunScripts => method_dir.join(RUN_SCRIPT),
            _                         => method_dir.join(method.input_file()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parser::{PenetranceArgs, PipelineArgs, PopulationArgs, Run, SweepArgs};
    use replicator::ReplicatorError;

    pub(crate) fn run_args(mode: Mode, root: &Path) -> Run {
        Run {
            pipeline: PipelineArgs {
                expand: true, penetrance: true, format: true, mode,
                output_dir: root.to_path_buf(), seed: 42, threads: 1, max_candidates: 100_000,
                ..Default::default()
            },
            population: PopulationArgs{dpl: "rs4491689".into(), maf: 0.3, founders: 500, ..Default::default()},
            penetrance: PenetranceArgs{wtr: 0.1, grr: 2.0, num_cases: 10, num_controls: 10, ..Default::default()},
            sweep: SweepArgs {
                maf_lo: 0.05, maf_hi: 0.10, maf_steps: 2,
                cc_lo: 10.0, cc_hi: 10.0,
                grr_lo: 2.0, grr_hi: 2.0, grr_steps: 1, grr_reps: 2,
                programs: vec!["plink".into(), "Beta".into()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn single_defaults() -> Result<()> {
        let root = Path::new("out");
        let config = PipelineConfig::try_from(&run_args(Mode::Single, root))?;
        assert_eq!(config.mode(), Mode::Single);
        assert_eq!(config.methods.iter().map(|m| m.name).collect::<Vec<_>>(), vec!["PLINK", "BETA"]);

        let Plan::Single{maf, sampling, artifacts} = &config.plan else {
            panic!("Expected a single mode plan")
        };
        assert!((maf - 0.3).abs() < f64::EPSILON);
        assert_eq!(sampling.map(|s| s.target), Some(SampleTarget::new(10, 10)?));
        assert_eq!(artifacts.expanded, root.join("expanded.pop"));
        assert_eq!(artifacts.sampled, root.join("sample.pop"));
        assert_eq!(artifacts.reference, root.join("HapMap"));
        Ok(())
    }

    #[test]
    fn replicates_uses_canonical_program_names() -> Result<()> {
        let config = PipelineConfig::try_from(&run_args(Mode::Replicates, Path::new("out")))?;
        let Plan::Replicates(sweep) = &config.plan else {
            panic!("Expected a replicates plan")
        };
        assert_eq!(sweep.programs(), ["PLINK", "BETA"]);
        assert_eq!(sweep.grid().len(), 8);
        assert!(sweep.create_dirs());
        Ok(())
    }

    #[test]
    fn invalid_risk_is_detected_upfront() {
        let mut run = run_args(Mode::Replicates, Path::new("out"));
        run.sweep.wtr_lo = 0.3;
        run.sweep.wtr_hi = 0.3;
        let err = PipelineConfig::try_from(&run).expect_err("0.3 * 2.0 * 2 > 1");
        assert!(err.chain().any(|e| e.to_string().contains("WTR=0.3, GRR=2")), "{err:?}");

        // Only relevant when sampling.
        run.pipeline.penetrance = false;
        assert!(PipelineConfig::try_from(&run).is_ok());
    }

    #[test]
    fn invalid_settings() {
        let root = Path::new("out");

        let mut run = run_args(Mode::Single, root);
        run.sweep.programs.push("GENEHUNTER".into());
        assert!(PipelineConfig::try_from(&run).is_err());

        let mut run = run_args(Mode::Single, root);
        run.penetrance.num_controls = 0;
        assert!(PipelineConfig::try_from(&run).is_err());

        let mut run = run_args(Mode::Single, root);
        run.pipeline.max_candidates = 0;
        assert!(PipelineConfig::try_from(&run).is_err());

        let mut run = run_args(Mode::Replicates, root);
        run.sweep.grr_steps = 0;
        assert!(PipelineConfig::try_from(&run).is_err());

        let mut run = run_args(Mode::Replicates, root);
        (run.sweep.maf_lo, run.sweep.maf_hi, run.sweep.maf_steps) = (0.05, 0.06, 5);
        let err = PipelineConfig::try_from(&run).expect_err("MAF levels would share a directory");
        assert!(matches!(err.downcast_ref::<ReplicatorError>(), Some(ReplicatorError::IndistinctLevels{..})));

        let mut run = run_args(Mode::Replicates, root);
        run.penetrance.candidates = Some(PathBuf::from("candidates.txt"));
        let err = PipelineConfig::try_from(&run).expect_err("Candidates are single mode only");
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::IncompatibleOption("--candidates"))));
    }

    #[test]
    fn duplicate_methods_are_ignored_in_single_mode() -> Result<()> {
        let mut run = run_args(Mode::Single, Path::new("out"));
        run.sweep.programs = vec!["PLINK".into(), "plink".into()];
        assert_eq!(PipelineConfig::try_from(&run)?.methods.len(), 1);
        Ok(())
    }
}
