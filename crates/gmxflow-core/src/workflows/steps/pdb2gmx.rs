use super::require_str;
use crate::core::config::validator::ValidatedConfig;
use crate::core::files::ledger::FileLedger;
use crate::core::process::runner::CommandSpec;
use crate::engine::error::EngineError;
use crate::engine::step::PipelineStep;
use std::path::PathBuf;

/// Topology generation: converts a PDB structure into a GROMACS topology.
///
/// The force-field name is resolved (and possibly fuzzy-corrected) before
/// the step is constructed, so by the time the command is built it is known
/// to exist.
pub struct Pdb2gmx {
    force_field: String,
}

impl Pdb2gmx {
    pub fn new(force_field: impl Into<String>) -> Self {
        Self {
            force_field: force_field.into(),
        }
    }
}

impl PipelineStep for Pdb2gmx {
    fn name(&self) -> &'static str {
        "pdb2gmx"
    }

    fn outputs(&self, _config: &ValidatedConfig) -> Result<Vec<String>, EngineError> {
        Ok(vec![
            "conf.gro".to_string(),
            "topol.top".to_string(),
            "posre.itp".to_string(),
        ])
    }

    fn command(
        &self,
        config: &ValidatedConfig,
        ledger: &FileLedger,
        outputs: &[PathBuf],
    ) -> Result<CommandSpec, EngineError> {
        let pdbfile = require_str(config, "pdb2gmx", "pdbfile")?;
        let pdb_path = ledger.run_dir().join(pdbfile);
        if !pdb_path.is_file() {
            return Err(EngineError::InputNotFound {
                step: self.name(),
                path: pdb_path,
            });
        }
        let water = require_str(config, "pdb2gmx", "water")?;

        let mut spec = CommandSpec::new("gmx")
            .arg("pdb2gmx")
            .arg("-f")
            .arg(pdb_path.to_string_lossy().to_string())
            .arg("-o")
            .arg(outputs[0].to_string_lossy().to_string())
            .arg("-p")
            .arg(outputs[1].to_string_lossy().to_string())
            .arg("-i")
            .arg(outputs[2].to_string_lossy().to_string())
            .arg("-ff")
            .arg(&self.force_field)
            .arg("-water")
            .arg(water);
        if config.get_bool("pdb2gmx", "ignh").unwrap_or(false) {
            spec = spec.arg("-ignh");
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::schema::ReferenceSchema;
    use crate::core::config::validator::RawConfig;
    use std::fs;
    use tempfile::tempdir;

    fn config(content: &str) -> ValidatedConfig {
        let raw: RawConfig = content.parse().unwrap();
        raw.validate(&ReferenceSchema::builtin(), &mut |_| true)
            .unwrap()
    }

    #[test]
    fn command_names_all_outputs_and_the_force_field() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("protein.pdb"), "ATOM").unwrap();
        let ledger = FileLedger::load(dir.path()).unwrap();
        let config = config(
            "[pdb2gmx]\npdbfile = \"protein.pdb\"\nwater = \"tip3p\"\nignh = true\n",
        );

        let step = Pdb2gmx::new("charmm36");
        let outputs: Vec<_> = step
            .outputs(&config)
            .unwrap()
            .iter()
            .map(|n| ledger.resolve(n))
            .collect();
        let spec = step.command(&config, &ledger, &outputs).unwrap();

        assert_eq!(spec.program(), "gmx");
        let argv = spec.argv();
        assert_eq!(argv[0], "pdb2gmx");
        assert!(argv.contains(&"-ff".to_string()));
        assert!(argv.contains(&"charmm36".to_string()));
        assert!(argv.contains(&"-water".to_string()));
        assert!(argv.contains(&"tip3p".to_string()));
        assert!(argv.contains(&"-ignh".to_string()));
        assert!(argv.iter().any(|a| a.ends_with("conf.gro")));
        assert!(argv.iter().any(|a| a.ends_with("topol.top")));
        assert!(argv.iter().any(|a| a.ends_with("posre.itp")));
    }

    #[test]
    fn missing_pdb_file_is_an_input_error() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::load(dir.path()).unwrap();
        let config = config("[pdb2gmx]\npdbfile = \"absent.pdb\"\nwater = \"tip3p\"\n");

        let step = Pdb2gmx::new("charmm36");
        let outputs: Vec<_> = step
            .outputs(&config)
            .unwrap()
            .iter()
            .map(|n| ledger.resolve(n))
            .collect();
        let result = step.command(&config, &ledger, &outputs);

        assert!(matches!(result, Err(EngineError::InputNotFound { .. })));
    }

    #[test]
    fn missing_water_model_is_a_parameter_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("protein.pdb"), "ATOM").unwrap();
        let ledger = FileLedger::load(dir.path()).unwrap();
        let config = config("[pdb2gmx]\npdbfile = \"protein.pdb\"\n");

        let step = Pdb2gmx::new("charmm36");
        let outputs: Vec<_> = step
            .outputs(&config)
            .unwrap()
            .iter()
            .map(|n| ledger.resolve(n))
            .collect();
        let result = step.command(&config, &ledger, &outputs);

        assert!(matches!(
            result,
            Err(EngineError::MissingParameter {
                section: "pdb2gmx",
                key: "water"
            })
        ));
    }
}
