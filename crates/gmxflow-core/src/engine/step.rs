use super::error::EngineError;
use crate::core::config::validator::ValidatedConfig;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::CommandSpec;
use std::path::PathBuf;

/// One unit of toolchain-command execution, gated by the ledger and
/// parameterized by validated configuration.
///
/// Implementations declare their outputs up front and build their command
/// from the configuration, the pre-step ledger state (to locate upstream
/// inputs) and the zone paths resolved for their outputs. They never touch
/// the file system themselves; the session owns registration, execution and
/// output verification.
pub trait PipelineStep {
    fn name(&self) -> &'static str;

    /// Filenames this step will produce, in a fixed order.
    fn outputs(&self, config: &ValidatedConfig) -> Result<Vec<String>, EngineError>;

    /// The external command to run, with `outputs` positionally aligned to
    /// the filenames returned by [`PipelineStep::outputs`].
    fn command(
        &self,
        config: &ValidatedConfig,
        ledger: &FileLedger,
        outputs: &[PathBuf],
    ) -> Result<CommandSpec, EngineError>;
}

/// What the session did with a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The command ran and every declared output was verified on disk.
    Ran,
    /// All declared outputs already existed; the command was not re-run.
    Skipped,
}
