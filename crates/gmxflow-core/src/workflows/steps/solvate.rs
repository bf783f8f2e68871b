use super::require_float;
use crate::core::config::validator::ValidatedConfig;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::CommandSpec;
use crate::engine::error::EngineError;
use crate::engine::step::PipelineStep;
use std::path::PathBuf;

const DEFAULT_SOLVENT: &str = "spc216";

/// Fills the simulation box with solvent around the generated conformation.
pub struct Solvate;

impl PipelineStep for Solvate {
    fn name(&self) -> &'static str {
        "solvate"
    }

    fn outputs(&self, _config: &ValidatedConfig) -> Result<Vec<String>, EngineError> {
        Ok(vec!["solvated.gro".to_string()])
    }

    fn command(
        &self,
        config: &ValidatedConfig,
        ledger: &FileLedger,
        outputs: &[PathBuf],
    ) -> Result<CommandSpec, EngineError> {
        let box_size = require_float(config, "solvate", "box_size")?;
        let solvent = config
            .get_str("solvate", "solvent")
            .unwrap_or(DEFAULT_SOLVENT);

        let conf = ledger.latest("gro").ok_or(EngineError::MissingUpstream {
            step: self.name(),
            category: "gro",
        })?;
        let topology = ledger.latest("top").ok_or(EngineError::MissingUpstream {
            step: self.name(),
            category: "top",
        })?;

        let box_size = box_size.to_string();
        Ok(CommandSpec::new("gmx")
            .arg("solvate")
            .arg("-cp")
            .arg(conf.to_string_lossy().to_string())
            .arg("-cs")
            .arg(format!("{solvent}.gro"))
            .arg("-box")
            .args([&box_size, &box_size, &box_size])
            .arg("-p")
            .arg(topology.to_string_lossy().to_string())
            .arg("-o")
            .arg(outputs[0].to_string_lossy().to_string()))
    }
}
