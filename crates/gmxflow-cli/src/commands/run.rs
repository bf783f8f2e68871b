use crate::cli::RunArgs;
use crate::confirm::confirmer;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use gmxflow::core::process::runner::GmxRunner;
use gmxflow::engine::progress::ProgressReporter;
use gmxflow::engine::step::StepOutcome;
use gmxflow::workflows::pipeline::{self, PipelineOptions};
use std::env;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let run_dir = match args.run_dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    info!("Run directory: {:?}", run_dir);

    let options = PipelineOptions {
        config_path: args.config,
        run_dir,
        schema_path: args.template,
    };

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let mut confirm = confirmer(args.yes);

    let result = pipeline::run(&options, &GmxRunner, &mut confirm, &reporter)?;

    for (name, outcome) in &result.outcomes {
        match outcome {
            StepOutcome::Ran => println!("  {name}: ran"),
            StepOutcome::Skipped => println!("  {name}: already complete, skipped"),
        }
    }
    Ok(())
}
