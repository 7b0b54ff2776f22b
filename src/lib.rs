extern crate parser;
extern crate logger;

use parser::{Cli, Commands::{Run, FromYaml, Cite}};
use pipeline::{ExternalTools, PipelineConfig, PipelineDriver, PipelineReport};

#[macro_use]
extern crate log;

use std::error::Error;

pub fn cite() {
    const CITATIONS: &str = r###"
    A. Case/control datasets are generated following the simulation protocol of
       simuGWAS, relying on the simuPOP forward-time population genetics
       simulation environment:

        1. Peng, B, Amos, CI. Forward-time simulation of realistic samples for
           genome-wide association studies. BMC Bioinformatics 11, 442 (2010).
           https://doi.org/10.1186/1471-2105-11-442

        2. Peng, B, Kimmel, M. simuPOP: a forward-time population genetics
           simulation environment. Bioinformatics 21, 3686–3687 (2005).
           https://doi.org/10.1093/bioinformatics/bti584


    B. If you plan to use the HapMap3 reference populations as founders, please
       cite the International HapMap 3 Consortium:

        1. The International HapMap 3 Consortium. Integrating common and rare
           genetic variation in diverse human populations. Nature 467, 52–58 (2010).
           https://doi.org/10.1038/nature09298

    "###;
    println!("{CITATIONS}");
}

/// Validate a `run` command, and drive the pipeline with the user provided command templates.
///
/// # Errors
/// - if any argument is invalid. Nothing is run in that case.
/// - if the pipeline fails (see [`PipelineDriver::run`])
pub fn run_pipeline(args: &parser::Run) -> anyhow::Result<PipelineReport> {
    let config = PipelineConfig::try_from(args)?;
    let tools = ExternalTools::new(
        &args.commands,
        &config.stages,
        args.population.founders,
        &args.population.dpl,
        config.seed,
    )?;
    PipelineDriver::new(&config, &tools).run()
}

pub fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.commands {
        Run(args) => {
            let report = run_pipeline(&args)?;
            info!("Done: {report}");
        },

        FromYaml{yaml} => {
            let cli = Cli::deserialize(&yaml)?;
            info!("Replaying run from {}", yaml.display());
            self::run(cli)?;
        },

        Cite => {
            cite();
        }
    };
    Ok(())
}
