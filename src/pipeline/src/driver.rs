use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use located_error::prelude::*;
use log::{error, info, warn};
use rayon::prelude::*;

use dplsim_io::write::write_dataset;
use logger::Logger;
use penetrance::{
    assign_phenotypes, CandidateReader, CandidateSource, CaseControlDataset, PanmicticMating,
    PhenotypeSampler, Population, RiskTable, SampleTarget, SamplingBudget
};
use replicator::{create_all, ensure_directory, GridPoint, SweepConfig};

use crate::{
    config::{self, PipelineConfig, Plan, SamplingParams, SingleArtifacts},
    AnalysisMethod, Collaborators, PipelineError, Stage, StageOutcome, StageRun,
};

/// Stage tallies of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub completed    : usize,
    pub skipped      : usize,
    pub failed_points: usize,
    pub total_points : usize,
}

impl PipelineReport {
    fn record(&mut self, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Completed(_) => self.completed += 1,
            StageOutcome::Skipped(_)   => self.skipped += 1,
        }
    }
}

impl Display for PipelineReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage(s) completed, {} skipped. {} out of {} grid point(s) failed",
            self.completed, self.skipped, self.failed_points, self.total_points
        )
    }
}

/// Sample `params.target` individuals out of `source`, and atomically write them at `artifact`.
fn sample_into<S>(source: &mut S, params: SamplingParams, budget: &SamplingBudget, artifact: &Path) -> Result<()>
where
    S: CandidateSource + ?Sized,
{
    let mut sampler = PhenotypeSampler::new(params.risks, params.target);
    let dataset = assign_phenotypes(source, &mut sampler, budget)?;
    write_dataset(artifact, &dataset)
}

/// Sampling stage of one sample directory. Runs on the rayon pool: only shared, read-only state is borrowed.
fn sample_grid_point(config: &PipelineConfig, population: Option<&Population>, point: &GridPoint, seed: u64) -> Result<StageOutcome> {
    let sample_dir = config.output_dir.join(point.sample_dir());
    let artifact = sample_dir.join(config::SAMPLE_POP);
    let label = point.sample_dir().display().to_string();

    StageRun::new(Stage::AssignPhenotypes, &label, &artifact).execute(|| {
        ensure_directory(&sample_dir)?;
        let params = SamplingParams {
            risks : RiskTable::compute(point.wtr.value, point.grr.value)?,
            target: SampleTarget::new(config.num_cases, point.controls())?,
        };
        let population = population.loc("Expanded population was not loaded")?;
        let mut source = PanmicticMating::new(population, seed)?;
        sample_into(&mut source, params, &config.budget, &artifact)
    })
}

/// Runs the enabled stages, in order, once (single mode) or once per grid point (replicates mode).
///
/// # Resumability
/// Every stage is skipped when its artifact already exists: relaunching an interrupted run only
/// executes the remaining work.
pub struct PipelineDriver<'a, C: Collaborators> {
    config: &'a PipelineConfig,
    tools : &'a C,
}

impl<'a, C: Collaborators> PipelineDriver<'a, C> {
    #[must_use]
    pub fn new(config: &'a PipelineConfig, tools: &'a C) -> Self {
        Self{config, tools}
    }

    /// # Errors
    /// - single mode: the first `StageFailed` error.
    /// - replicates mode: a failure of the directory hierarchy, download or init stages aborts the run.
    ///   Other failures are isolated to their grid points, and reported at the end as `FailedGridPoints`.
    pub fn run(&self) -> Result<PipelineReport> {
        let stages = self.config.stages.enabled();
        if stages.is_empty() {
            warn!("No stage was requested. Use any of --download, --init, --expand, --penetrance, --format or --cline");
        }
        let stages = stages.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        info!("Running stages [{stages}] in {} mode, within {}", self.config.mode(), self.config.output_dir.display());

        let mut report = PipelineReport::default();
        match &self.config.plan {
            Plan::Single{maf, sampling, artifacts} => self.run_single(*maf, *sampling, artifacts, &mut report)?,
            Plan::Replicates(sweep)                => self.run_replicates(sweep, &mut report)?,
        }
        info!("{report}");

        if report.failed_points > 0 {
            return Err(PipelineError::FailedGridPoints{failed: report.failed_points, total: report.total_points})
                .loc("While running replicates")
        }
        Ok(report)
    }

    /// Run `job` as `stage` if that stage was requested.
    fn stage<F>(&self, stage: Stage, point: &str, artifact: &Path, report: &mut PipelineReport, job: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.config.stages.is_enabled(stage) {
            return Ok(())
        }
        let outcome = StageRun::new(stage, point, artifact).execute(job)?;
        report.record(&outcome);
        Ok(())
    }

    /// Format and run-script stages of `method`, within `method_dir`.
    fn method_stages(&self, method: &AnalysisMethod, method_dir: &Path, sample: &Path, point: &str, report: &mut PipelineReport) -> Result<()> {
        let input = PipelineConfig::method_artifact(method, method_dir, Stage::FormatForTools);

        for stage in [Stage::FormatForTools, Stage::GenerateRunScripts] {
            if !self.config.stages.is_enabled(stage) {
                continue
            }
            if !method.supports(stage) {
                info!("[{point}] {stage} is not supported by {method}. Skipping.");
                continue
            }
            let artifact = PipelineConfig::method_artifact(method, method_dir, stage);
            self.stage(stage, point, &artifact, report, || {
                ensure_directory(method_dir)?;
                match stage {
                    Stage::FormatForTools => self.tools.format(method, sample, &artifact),
                    _                     => self.tools.write_run_script(method, &input, &artifact),
                }
            })?;
        }
        Ok(())
    }

    fn run_single(&self, maf: f64, sampling: Option<SamplingParams>, artifacts: &SingleArtifacts, report: &mut PipelineReport) -> Result<()> {
        let point = "single";
        let SingleArtifacts{reference, init, expanded, sampled} = artifacts;
        report.total_points = 1;

        self.stage(Stage::Download, point, reference, report, || self.tools.download(reference))?;
        self.stage(Stage::InitPopulation, point, init, report, || self.tools.init_population(reference, init))?;
        self.stage(Stage::ExpandPopulation, point, expanded, report, || self.tools.expand_population(init, maf, expanded))?;

        if let Some(params) = sampling {
            self.stage(Stage::AssignPhenotypes, point, sampled, report, || {
                match &self.config.candidates {
                    Some(path) => {
                        let file = File::open(path).with_loc(|| format!("While opening candidates file {}", path.display()))?;
                        let mut source = CandidateReader::new(BufReader::new(file), self.config.seed);
                        sample_into(&mut source, params, &self.config.budget, sampled)
                    },
                    None => {
                        let population = self.tools.load_population(expanded)?;
                        let mut source = PanmicticMating::new(&population, self.config.seed)?;
                        sample_into(&mut source, params, &self.config.budget, sampled)
                    },
                }
            })?;
        }

        for method in &self.config.methods {
            let method_dir = self.config.output_dir.join(method.name);
            self.method_stages(method, &method_dir, sampled, point, report)?;
        }
        Ok(())
    }

    fn run_replicates(&self, sweep: &SweepConfig, report: &mut PipelineReport) -> Result<()> {
        let root = &self.config.output_dir;
        let points: Vec<GridPoint> = sweep.grid().collect();
        report.total_points = points.len();

        if sweep.create_dirs() {
            let created = create_all(points.iter().map(|point| root.join(point.relative_path())))
                .loc("While creating the experiment directory hierarchy")?;
            info!("Created {created} new grid point directories ({} in total)", points.len());
        }

        // ---- Shared by every grid point: any failure is fatal.
        let reference = root.join(config::REFERENCE_DIR);
        let init = root.join(config::INIT_POP);
        self.stage(Stage::Download, "sweep", &reference, report, || self.tools.download(&reference))?;
        self.stage(Stage::InitPopulation, "sweep", &init, report, || self.tools.init_population(&reference, &init))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(PipelineError::BuildThreadPool)
            .loc("While building the sampling threadpool")?;

        let progress = Logger::progress_bar(points.len() as u64, "grid points");
        let samples_per_maf = sweep.points_per_maf() / sweep.programs().len();
        for (block_index, block) in points.chunks(sweep.points_per_maf()).enumerate() {
            let first_sample = (block_index * samples_per_maf) as u64;
            let failed = self.run_maf_block(block, sweep.programs().len(), first_sample, &pool, &init, report);
            report.failed_points += failed;
            progress.inc(block.len() as u64);
        }
        progress.finish_and_clear();
        Ok(())
    }

    /// Run every stage of the grid points sharing a single MAF directory. Returns the number of failed points.
    fn run_maf_block(&self, block: &[GridPoint], programs: usize, first_sample: u64, pool: &rayon::ThreadPool, init: &Path, report: &mut PipelineReport) -> usize {
        let Some(first) = block.first() else {
            return 0
        };
        let root = &self.config.output_dir;
        let maf_dir = root.join(first.maf_dir());
        let expanded = maf_dir.join(format!("{}.pop", first.maf_dir().display()));
        let maf_label = first.maf_dir().display().to_string();

        // ---- Population expansion: a failure is shared by the whole block.
        let expansion = self.stage(Stage::ExpandPopulation, &maf_label, &expanded, report, || {
            ensure_directory(&maf_dir)?;
            self.tools.expand_population(init, first.maf.value, &expanded)
        });
        if let Err(e) = expansion {
            error!("{e:?}");
            return block.len()
        }

        // ---- Case/control sampling, once per sample directory.
        let samples: Vec<&[GridPoint]> = block.chunks(programs).collect();
        let mut sample_ok = vec![true; samples.len()];
        if self.config.stages.is_enabled(Stage::AssignPhenotypes) {
            let pending = samples.iter().any(|points| !root.join(points[0].sample_dir()).join(config::SAMPLE_POP).exists());
            let population = match pending {
                true => match self.tools.load_population(&expanded) {
                    Ok(population) => Some(population),
                    Err(e) => {
                        error!("{:?}", e.context(format!("Failed to load population of {maf_label}")));
                        return block.len()
                    },
                },
                false => None,
            };

            let config = self.config;
            let population = population.as_ref();
            let outcomes: Vec<Result<StageOutcome>> = pool.install(|| {
                samples.par_iter().enumerate()
                    .map(|(i, points)| sample_grid_point(config, population, &points[0], config.seed.wrapping_add(first_sample + i as u64)))
                    .collect()
            });

            for (outcome, ok) in outcomes.into_iter().zip(sample_ok.iter_mut()) {
                match outcome {
                    Ok(outcome) => report.record(&outcome),
                    Err(e) => {
                        error!("{e:?}");
                        *ok = false;
                    },
                }
            }
        }

        // ---- Per-method stages.
        let mut failed = 0;
        for (points, ok) in samples.iter().zip(sample_ok) {
            if !ok {
                failed += points.len();
                continue
            }
            for point in points.iter() {
                let Ok(method) = crate::registry::lookup(&point.program) else {
                    failed += 1;
                    continue
                };
                let sample = root.join(point.sample_dir()).join(config::SAMPLE_POP);
                let method_dir: PathBuf = root.join(point.relative_path());
                if let Err(e) = self.method_stages(method, &method_dir, &sample, &point.to_string(), report) {
                    error!("{e:?}");
                    failed += 1;
                }
            }
        }
        failed
    }
}
