use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::step::{PipelineStep, StepOutcome};
use crate::core::config::validator::ValidatedConfig;
use crate::core::environment::gromacs::GromacsEnv;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One pipeline run over one run directory.
///
/// Owns the validated configuration, the file ledger and the resolved
/// toolchain environment; steps borrow them and never retain a reference
/// back. Strictly sequential: a step fully completes or fails before the
/// next begins, and the ledger is only persisted after a verified success.
pub struct Session<'r> {
    config: ValidatedConfig,
    ledger: FileLedger,
    env: GromacsEnv,
    runner: &'r dyn CommandRunner,
    run_dir: PathBuf,
}

impl<'r> Session<'r> {
    pub fn new(
        config: ValidatedConfig,
        env: GromacsEnv,
        runner: &'r dyn CommandRunner,
        run_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let ledger = FileLedger::load(&run_dir)?;
        Ok(Self {
            config,
            ledger,
            env,
            runner,
            run_dir,
        })
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn ledger(&self) -> &FileLedger {
        &self.ledger
    }

    pub fn env(&self) -> &GromacsEnv {
        &self.env
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Queries `gmx --version` under the resolved environment.
    pub fn gmx_version(&self) -> Result<String, EngineError> {
        let spec = CommandSpec::new("gmx").arg("--version");
        let result = self.runner.run(&spec, &self.env, None)?;
        result
            .output
            .lines()
            .find_map(|line| line.strip_prefix("GROMACS version:"))
            .map(|version| version.trim().to_string())
            .ok_or_else(|| {
                EngineError::Internal("gmx --version output carried no version line".to_string())
            })
    }

    /// Runs one step through the ledger gate.
    ///
    /// When every declared output is already registered on disk the step is
    /// skipped. Otherwise the command runs with its output captured to a
    /// per-step log in the minor zone, and every declared output must exist
    /// afterwards; a missing output fails the step and the ledger is not
    /// persisted for it.
    pub fn run_step(
        &mut self,
        step: &dyn PipelineStep,
        reporter: &ProgressReporter,
    ) -> Result<StepOutcome, EngineError> {
        let name = step.name();
        let outputs = step.outputs(&self.config)?;

        // Build the command against pre-registration ledger state, so input
        // lookups see upstream outputs rather than this step's own.
        let resolved: Vec<PathBuf> = outputs.iter().map(|n| self.ledger.resolve(n)).collect();
        let spec = step
            .command(&self.config, &self.ledger, &resolved)?
            .current_dir(&self.run_dir);

        let Some(paths) = self.ledger.register_outputs(&outputs)? else {
            info!("Found outputs for {} already, skipping.", name);
            reporter.report(Progress::StepSkipped { name });
            return Ok(StepOutcome::Skipped);
        };

        reporter.report(Progress::StepStart { name });
        let capture = self.capture_path(name);
        info!("Running {} (output -> {:?})", name, capture);
        self.runner.run(&spec, &self.env, Some(&capture))?;

        for path in &paths {
            if !path.exists() {
                return Err(EngineError::MissingOutput {
                    step: name,
                    path: path.clone(),
                });
            }
        }

        reporter.report(Progress::StepFinish { name });
        Ok(StepOutcome::Ran)
    }

    /// Persists the ledger; called by the orchestrator after each verified
    /// step so that side effects stay visible at the call site.
    pub fn save_ledger(&self) -> Result<(), EngineError> {
        self.ledger.save()?;
        Ok(())
    }

    /// Reports files in the run zones the ledger does not know about.
    pub fn warn_untracked_files(&self) -> Result<(), EngineError> {
        let strays = self.ledger.untracked_files()?;
        if !strays.is_empty() {
            warn!(
                "Found {} unregistered file(s) in the run zones: {:?}",
                strays.len(),
                strays
            );
        }
        Ok(())
    }

    /// Collision-free capture-file path for a step's command output.
    fn capture_path(&self, step_name: &str) -> PathBuf {
        let mut index = 0;
        loop {
            let file_name = if index == 0 {
                format!("{step_name}.out")
            } else {
                format!("{step_name}_{index}.out")
            };
            let path = self.ledger.minor_dir().join(file_name);
            if !path.exists() {
                return path;
            }
            index += 1;
        }
    }
}
