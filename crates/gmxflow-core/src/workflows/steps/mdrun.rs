use super::require_str;
use crate::core::config::validator::ValidatedConfig;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::CommandSpec;
use crate::engine::error::EngineError;
use crate::engine::step::PipelineStep;
use std::path::PathBuf;

/// The simulation itself.
///
/// All outputs share the configured default filename stem; the trajectory
/// is the one artifact that lands in the major zone.
pub struct Mdrun;

impl PipelineStep for Mdrun {
    fn name(&self) -> &'static str {
        "mdrun"
    }

    fn outputs(&self, config: &ValidatedConfig) -> Result<Vec<String>, EngineError> {
        let deffnm = require_str(config, "mdrun", "deffnm")?;
        Ok(vec![
            format!("{deffnm}.xtc"),
            format!("{deffnm}.gro"),
            format!("{deffnm}.edr"),
            format!("{deffnm}.log"),
        ])
    }

    fn command(
        &self,
        config: &ValidatedConfig,
        ledger: &FileLedger,
        outputs: &[PathBuf],
    ) -> Result<CommandSpec, EngineError> {
        let deffnm = require_str(config, "mdrun", "deffnm")?;
        let tpr = ledger.latest("tpr").ok_or(EngineError::MissingUpstream {
            step: self.name(),
            category: "tpr",
        })?;

        // mdrun would name everything from -deffnm relative to the working
        // directory; each output is pinned explicitly so the trajectory
        // lands in the major zone and the rest in the minor zone.
        let mut spec = CommandSpec::new("gmx")
            .arg("mdrun")
            .arg("-s")
            .arg(tpr.to_string_lossy().to_string())
            .arg("-deffnm")
            .arg(deffnm)
            .arg("-x")
            .arg(outputs[0].to_string_lossy().to_string())
            .arg("-c")
            .arg(outputs[1].to_string_lossy().to_string())
            .arg("-e")
            .arg(outputs[2].to_string_lossy().to_string())
            .arg("-g")
            .arg(outputs[3].to_string_lossy().to_string());
        if let Some(ntomp) = config.get_int("mdrun", "ntomp") {
            if ntomp > 0 {
                spec = spec.arg("-ntomp").arg(ntomp.to_string());
            }
        }
        Ok(spec)
    }
}
