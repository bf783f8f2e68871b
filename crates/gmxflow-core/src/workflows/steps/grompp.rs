use super::require_str;
use crate::core::config::validator::ValidatedConfig;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::CommandSpec;
use crate::engine::error::EngineError;
use crate::engine::step::PipelineStep;
use std::path::PathBuf;

/// Preprocessing: assembles the run input file from the solvated structure,
/// the topology and the run parameters.
pub struct Grompp;

impl PipelineStep for Grompp {
    fn name(&self) -> &'static str {
        "grompp"
    }

    fn outputs(&self, _config: &ValidatedConfig) -> Result<Vec<String>, EngineError> {
        Ok(vec!["topol.tpr".to_string()])
    }

    fn command(
        &self,
        config: &ValidatedConfig,
        ledger: &FileLedger,
        outputs: &[PathBuf],
    ) -> Result<CommandSpec, EngineError> {
        let mdpfile = require_str(config, "grompp", "mdpfile")?;
        let mdp_path = ledger.run_dir().join(mdpfile);
        if !mdp_path.is_file() {
            return Err(EngineError::InputNotFound {
                step: self.name(),
                path: mdp_path,
            });
        }

        let conf = ledger.latest("gro").ok_or(EngineError::MissingUpstream {
            step: self.name(),
            category: "gro",
        })?;
        let topology = ledger.latest("top").ok_or(EngineError::MissingUpstream {
            step: self.name(),
            category: "top",
        })?;

        let mut spec = CommandSpec::new("gmx")
            .arg("grompp")
            .arg("-f")
            .arg(mdp_path.to_string_lossy().to_string())
            .arg("-c")
            .arg(conf.to_string_lossy().to_string())
            .arg("-p")
            .arg(topology.to_string_lossy().to_string())
            .arg("-o")
            .arg(outputs[0].to_string_lossy().to_string());
        if let Some(maxwarn) = config.get_int("grompp", "maxwarn") {
            spec = spec.arg("-maxwarn").arg(maxwarn.to_string());
        }
        Ok(spec)
    }
}
