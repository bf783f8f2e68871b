use super::forcefield;
use super::steps::{Grompp, Mdrun, Pdb2gmx, Solvate};
use crate::core::config::schema::ReferenceSchema;
use crate::core::config::validator::{RawConfig, ValidatedConfig};
use crate::core::environment::gromacs::{EnvSpec, GromacsEnv};
use crate::core::process::runner::CommandRunner;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::session::Session;
use crate::engine::step::{PipelineStep, StepOutcome};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Where a pipeline run reads its inputs from.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// The user's run configuration (TOML).
    pub config_path: PathBuf,
    /// Directory the run lives in; the ledger and both zones are anchored
    /// here.
    pub run_dir: PathBuf,
    /// Reference template override; the embedded template when `None`.
    pub schema_path: Option<PathBuf>,
}

/// What happened to each configured step, in execution order.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub outcomes: Vec<(&'static str, StepOutcome)>,
}

/// Validates a run configuration without executing anything.
///
/// This is the `check` entry point: the same schema lookup and fuzzy
/// correction as a real run, but no environment resolution, no ledger and
/// no commands.
pub fn check(
    config_path: &Path,
    schema_path: Option<&Path>,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<ValidatedConfig, EngineError> {
    let schema = load_schema(schema_path)?;
    let raw = RawConfig::from_file(config_path)?;
    Ok(raw.validate(&schema, confirm)?)
}

/// Runs the configured pipeline end to end.
///
/// Steps execute in toolchain order — pdb2gmx, solvate, grompp, mdrun —
/// and only when their section appears in the configuration. Each step
/// passes through the ledger gate: already-complete steps are skipped, and
/// the ledger is persisted after each verified success, so an interrupted
/// run resumes where it stopped.
#[instrument(skip_all, name = "pipeline_workflow")]
pub fn run(
    options: &PipelineOptions,
    runner: &dyn CommandRunner,
    confirm: &mut dyn FnMut(&str) -> bool,
    reporter: &ProgressReporter,
) -> Result<PipelineResult, EngineError> {
    reporter.report(Progress::Message("Validating configuration".to_string()));
    let config = check(&options.config_path, options.schema_path.as_deref(), confirm)?;

    reporter.report(Progress::Message("Resolving environment".to_string()));
    let env_spec = EnvSpec::from_config(&config);
    let env = GromacsEnv::resolve(&env_spec)?;

    let steps = build_steps(&config, &env, confirm)?;
    info!("Pipeline has {} configured step(s)", steps.len());

    let mut session = Session::new(config, env, runner, options.run_dir.clone())?;
    let mut outcomes = Vec::with_capacity(steps.len());

    for step in &steps {
        let outcome = session.run_step(step.as_ref(), reporter)?;
        if outcome == StepOutcome::Ran {
            session.save_ledger()?;
        }
        outcomes.push((step.name(), outcome));
    }

    session.warn_untracked_files()?;
    Ok(PipelineResult { outcomes })
}

/// The steps whose sections are configured, in fixed toolchain order.
///
/// The pdb2gmx force field is resolved here, before anything runs, so a
/// misspelled force field aborts the run while it is still side-effect
/// free.
fn build_steps(
    config: &ValidatedConfig,
    env: &GromacsEnv,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<Vec<Box<dyn PipelineStep>>, EngineError> {
    let mut steps: Vec<Box<dyn PipelineStep>> = Vec::new();

    if config.has_section("pdb2gmx") {
        let name = config
            .get_str("pdb2gmx", "forcefield")
            .ok_or(EngineError::MissingParameter {
                section: "pdb2gmx",
                key: "forcefield",
            })?;
        let resolved = forcefield::resolve(name, env, confirm)?;
        steps.push(Box::new(Pdb2gmx::new(resolved)));
    }
    if config.has_section("solvate") {
        steps.push(Box::new(Solvate));
    }
    if config.has_section("grompp") {
        steps.push(Box::new(Grompp));
    }
    if config.has_section("mdrun") {
        steps.push(Box::new(Mdrun));
    }

    Ok(steps)
}

fn load_schema(path: Option<&Path>) -> Result<ReferenceSchema, EngineError> {
    match path {
        Some(path) => Ok(ReferenceSchema::load(path)?),
        None => Ok(ReferenceSchema::builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::gromacs::GromacsEnv;
    use crate::core::process::runner::{CommandOutput, CommandSpec, ProcessError};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Creates every path named by a `-o`/`-x`/`-c`/`-e`/`-g`/`-p`/`-i`
    /// output flag, as the real toolchain would.
    struct CreatingRunner {
        commands: RefCell<Vec<String>>,
    }

    impl CreatingRunner {
        fn new() -> Self {
            Self {
                commands: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for CreatingRunner {
        fn run(
            &self,
            spec: &CommandSpec,
            _env: &GromacsEnv,
            capture: Option<&Path>,
        ) -> Result<CommandOutput, ProcessError> {
            self.commands.borrow_mut().push(spec.to_string());
            let argv = spec.argv();
            for pair in argv.windows(2) {
                if matches!(pair[0].as_str(), "-o" | "-x" | "-c" | "-e" | "-g" | "-p" | "-i") {
                    fs::write(&pair[1], "produced").unwrap();
                }
            }
            if let Some(path) = capture {
                fs::write(path, "command output").unwrap();
            }
            Ok(CommandOutput {
                output: "command output".to_string(),
            })
        }
    }

    fn write_run_inputs(dir: &Path) -> PathBuf {
        fs::write(dir.join("protein.pdb"), "ATOM").unwrap();
        fs::write(dir.join("md.mdp"), "integrator = md").unwrap();
        fs::create_dir(dir.join("charmm36.ff")).unwrap();

        let config_path = dir.join("run.toml");
        fs::write(
            &config_path,
            format!(
                "[environment]\ngmx_lib = \"{}\"\n\n\
                 [pdb2gmx]\npdbfile = \"protein.pdb\"\nforcefield = \"charmm36\"\nwater = \"tip3p\"\n\n\
                 [solvate]\nbox_size = 1.5\n\n\
                 [grompp]\nmdpfile = \"md.mdp\"\n\n\
                 [mdrun]\ndeffnm = \"md\"\n",
                dir.display()
            ),
        )
        .unwrap();
        config_path
    }

    #[test]
    fn full_pipeline_runs_every_configured_step_once() {
        let dir = tempdir().unwrap();
        let config_path = write_run_inputs(dir.path());
        let options = PipelineOptions {
            config_path,
            run_dir: dir.path().to_path_buf(),
            schema_path: None,
        };
        let runner = CreatingRunner::new();

        let result = run(&options, &runner, &mut |_| true, &ProgressReporter::new()).unwrap();

        assert_eq!(
            result.outcomes,
            vec![
                ("pdb2gmx", StepOutcome::Ran),
                ("solvate", StepOutcome::Ran),
                ("grompp", StepOutcome::Ran),
                ("mdrun", StepOutcome::Ran),
            ]
        );
        assert_eq!(runner.commands.borrow().len(), 4);
        assert!(dir.path().join("files.toml").is_file());
        // The trajectory is major, the rest minor.
        assert!(dir.path().join("md.xtc").is_file());
        assert!(dir.path().join("simfiles/topol.top").is_file());
    }

    #[test]
    fn rerun_skips_completed_steps() {
        let dir = tempdir().unwrap();
        let config_path = write_run_inputs(dir.path());
        let options = PipelineOptions {
            config_path,
            run_dir: dir.path().to_path_buf(),
            schema_path: None,
        };

        let runner = CreatingRunner::new();
        run(&options, &runner, &mut |_| true, &ProgressReporter::new()).unwrap();
        assert_eq!(runner.commands.borrow().len(), 4);

        let rerun = CreatingRunner::new();
        let result = run(&options, &rerun, &mut |_| true, &ProgressReporter::new()).unwrap();

        assert!(rerun.commands.borrow().is_empty(), "nothing may re-run");
        assert!(
            result
                .outcomes
                .iter()
                .all(|(_, outcome)| *outcome == StepOutcome::Skipped)
        );
    }

    #[test]
    fn unconfigured_steps_are_not_built() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("protein.pdb"), "ATOM").unwrap();
        fs::create_dir(dir.path().join("charmm36.ff")).unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(
            &config_path,
            format!(
                "[environment]\ngmx_lib = \"{}\"\n\n\
                 [pdb2gmx]\npdbfile = \"protein.pdb\"\nforcefield = \"charmm36\"\nwater = \"tip3p\"\n",
                dir.path().display()
            ),
        )
        .unwrap();
        let options = PipelineOptions {
            config_path,
            run_dir: dir.path().to_path_buf(),
            schema_path: None,
        };
        let runner = CreatingRunner::new();

        let result = run(&options, &runner, &mut |_| true, &ProgressReporter::new()).unwrap();

        assert_eq!(result.outcomes, vec![("pdb2gmx", StepOutcome::Ran)]);
    }

    #[test]
    fn misspelled_force_field_aborts_before_any_command() {
        let dir = tempdir().unwrap();
        let config_path = write_run_inputs(dir.path());
        let options = PipelineOptions {
            config_path,
            run_dir: dir.path().to_path_buf(),
            schema_path: None,
        };
        let runner = CreatingRunner::new();

        // Accept the config-key corrections but decline the force field.
        let mut confirm = |prompt: &str| !prompt.contains("force field");
        let config = fs::read_to_string(dir.path().join("run.toml")).unwrap();
        fs::write(
            dir.path().join("run.toml"),
            config.replace("charmm36", "charm36"),
        )
        .unwrap();

        let result = run(&options, &runner, &mut confirm, &ProgressReporter::new());

        assert!(matches!(
            result,
            Err(EngineError::ForceFieldRejected { .. })
        ));
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn check_validates_without_side_effects() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(&config_path, "[pdb2gmx]\nforcefeild = \"charmm36\"\n").unwrap();

        let validated = check(&config_path, None, &mut |_| true).unwrap();

        assert_eq!(validated.get_str("pdb2gmx", "forcefield"), Some("charmm36"));
        assert!(!dir.path().join("simfiles").exists());
        assert!(!dir.path().join("files.toml").exists());
    }

    #[test]
    fn check_propagates_rejection() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(&config_path, "[pdb2gmx]\nforcefeild = \"charmm36\"\n").unwrap();

        let result = check(&config_path, None, &mut |_| false);

        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }
}
