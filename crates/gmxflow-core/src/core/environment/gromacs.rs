use crate::core::config::validator::ValidatedConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How the GROMACS environment should be obtained.
///
/// Built from the `[environment]` configuration section; with neither an RC
/// script nor a module configured, a `gmx` already on `PATH` is assumed and
/// the current process environment is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvSpec {
    pub gmx_rc: Option<PathBuf>,
    pub module: Option<String>,
    pub gmx_lib: Option<String>,
    pub clean_path: bool,
}

impl EnvSpec {
    pub fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            gmx_rc: config
                .get_str("environment", "gmx_rc")
                .map(PathBuf::from),
            module: config
                .get_str("environment", "module")
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            gmx_lib: config
                .get_str("environment", "gmx_lib")
                .map(str::to_string),
            clean_path: config.get_bool("environment", "clean_path").unwrap_or(false),
        }
    }
}

/// The resolved environment of one GROMACS installation.
///
/// An immutable value passed to every external command invocation; the
/// process-wide environment is never mutated, so repeated resolution across
/// steps cannot leave stale variables behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GromacsEnv {
    vars: BTreeMap<String, String>,
}

impl GromacsEnv {
    pub fn resolve(spec: &EnvSpec) -> Result<Self, EnvError> {
        let mut env = if let Some(rc) = &spec.gmx_rc {
            Self::from_rc(rc)?
        } else if let Some(module) = &spec.module {
            Self::from_module(module)?
        } else {
            debug!("No GMXRC or module configured, assuming gmx on PATH");
            Self::from_current()
        };

        if spec.clean_path {
            env.clean_path()?;
        }
        if let Some(lib) = &spec.gmx_lib {
            info!("Setting GMXLIB: {}", lib);
            env.vars.insert("GMXLIB".to_string(), lib.clone());
        }
        Ok(env)
    }

    /// Sources a GMXRC script in a scratch shell and scrapes the resulting
    /// environment.
    fn from_rc(rc: &Path) -> Result<Self, EnvError> {
        if !rc.is_file() {
            return Err(EnvError::RcNotFound {
                path: rc.to_path_buf(),
            });
        }
        info!("Loading GROMACS environment from {:?}", rc);
        let output = Self::probe(&format!(". {} && env", rc.display()))?;
        Ok(Self::parse_env_output(&output))
    }

    /// Loads an environment module in a scratch shell and scrapes the
    /// resulting environment.
    fn from_module(module: &str) -> Result<Self, EnvError> {
        info!("Loading GROMACS environment from module '{}'", module);
        let output = Self::probe(&format!(
            ". /etc/profile && module purge && module load {module} && env"
        ))?;
        Ok(Self::parse_env_output(&output))
    }

    /// Inherits the relevant variables of the current process environment.
    fn from_current() -> Self {
        let mut env = Self::default();
        for (key, value) in std::env::vars() {
            if is_relevant(&key, &value) {
                env.vars.insert(key, value);
            }
        }
        env
    }

    fn probe(script: &str) -> Result<String, EnvError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .map_err(|e| EnvError::Io { source: e })?;
        if !output.status.success() {
            return Err(EnvError::Probe {
                script: script.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Keeps the GROMACS-related lines of `env` output. Lines without an
    /// equals sign are ignored.
    fn parse_env_output(output: &str) -> Self {
        let mut env = Self::default();
        for line in output.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if is_relevant(key, value) {
                env.vars.insert(key.to_string(), value.to_string());
            }
        }
        env
    }

    /// Reduces `PATH` to the single GROMACS entry.
    ///
    /// Exactly one entry may match; two installations on the path is an
    /// error rather than a guess about which one the run would pick up.
    pub fn clean_path(&mut self) -> Result<(), EnvError> {
        let path = self.get("PATH").unwrap_or_default().to_string();
        let mut gmx_entry: Option<&str> = None;
        for entry in path.split(':') {
            if entry.contains("gromacs") || entry.contains("gmx") || entry.contains("GMX") {
                if let Some(first) = gmx_entry {
                    return Err(EnvError::AmbiguousGromacsPath {
                        first: first.to_string(),
                        second: entry.to_string(),
                    });
                }
                gmx_entry = Some(entry);
            }
        }
        match gmx_entry {
            Some(entry) => {
                let entry = entry.to_string();
                self.vars.insert("PATH".to_string(), entry);
                Ok(())
            }
            None => Err(EnvError::GromacsNotOnPath { path }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Directories searched for force fields: `$GMXDATA/top`, `$GMXLIB` and
    /// the working directory.
    pub fn force_field_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(data) = self.get("GMXDATA") {
            dirs.push(Path::new(data).join("top"));
        }
        if let Some(lib) = self.get("GMXLIB") {
            dirs.push(PathBuf::from(lib));
        }
        dirs.push(PathBuf::from("."));
        dirs
    }

    /// Names of the `*.ff` entries found in the force-field directories,
    /// sorted and deduplicated.
    pub fn available_force_fields(&self) -> Vec<String> {
        let mut names = Vec::new();
        for dir in self.force_field_dirs() {
            let Ok(entries) = fs::read_dir(&dir) else {
                debug!("Skipping unreadable force-field directory {:?}", dir);
                continue;
            };
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if name.ends_with(".ff") {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        if names.is_empty() {
            warn!("No force fields found in $GMXDATA/top, $GMXLIB or the working directory");
        }
        names
    }
}

fn is_relevant(key: &str, value: &str) -> bool {
    key.contains("GMX")
        || key.contains("gromacs")
        || value.contains("gromacs")
        || key == "PATH"
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Path to GMXRC not found: '{path}'", path = path.display())]
    RcNotFound { path: PathBuf },

    #[error("Environment probe `{script}` failed: {message}")]
    Probe { script: String, message: String },

    #[error("Could not spawn environment probe shell: {source}")]
    Io { source: std::io::Error },

    #[error("Found two matches for gromacs in PATH: '{first}' and '{second}'")]
    AmbiguousGromacsPath { first: String, second: String },

    #[error("Could not find gromacs in PATH: '{path}'")]
    GromacsNotOnPath { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::schema::ReferenceSchema;
    use crate::core::config::validator::RawConfig;
    use tempfile::tempdir;

    #[test]
    fn parse_env_output_keeps_gromacs_variables() {
        let output = "GMXDATA=/opt/gromacs/share/gromacs\n\
                      HOME=/home/user\n\
                      PATH=/opt/gromacs/bin:/usr/bin\n\
                      GMXLIB=/data/forcefields\n\
                      LD_LIBRARY_PATH=/opt/gromacs/lib\n\
                      malformed line without equals\n";

        let env = GromacsEnv::parse_env_output(output);

        assert_eq!(env.get("GMXDATA"), Some("/opt/gromacs/share/gromacs"));
        assert_eq!(env.get("GMXLIB"), Some("/data/forcefields"));
        assert_eq!(env.get("PATH"), Some("/opt/gromacs/bin:/usr/bin"));
        assert_eq!(env.get("HOME"), None);
        // Value mentions gromacs, so the variable is kept.
        assert_eq!(env.get("LD_LIBRARY_PATH"), Some("/opt/gromacs/lib"));
    }

    #[test]
    fn clean_path_keeps_the_single_gromacs_entry() {
        let mut env = GromacsEnv::parse_env_output("PATH=/usr/bin:/opt/gromacs/bin:/bin\n");
        env.clean_path().unwrap();
        assert_eq!(env.get("PATH"), Some("/opt/gromacs/bin"));
    }

    #[test]
    fn clean_path_rejects_two_installations() {
        let mut env =
            GromacsEnv::parse_env_output("PATH=/opt/gromacs-2023/bin:/opt/gromacs-2024/bin\n");
        let result = env.clean_path();
        assert!(matches!(result, Err(EnvError::AmbiguousGromacsPath { .. })));
    }

    #[test]
    fn clean_path_requires_a_gromacs_entry() {
        let mut env = GromacsEnv::parse_env_output("PATH=/usr/bin:/bin\n");
        let result = env.clean_path();
        assert!(matches!(result, Err(EnvError::GromacsNotOnPath { .. })));
    }

    #[test]
    fn resolve_rejects_missing_rc() {
        let dir = tempdir().unwrap();
        let spec = EnvSpec {
            gmx_rc: Some(dir.path().join("GMXRC")),
            ..Default::default()
        };
        let result = GromacsEnv::resolve(&spec);
        assert!(matches!(result, Err(EnvError::RcNotFound { .. })));
    }

    #[test]
    fn resolve_applies_gmx_lib_override() {
        let spec = EnvSpec {
            gmx_lib: Some("/data/forcefields".to_string()),
            ..Default::default()
        };
        let env = GromacsEnv::resolve(&spec).unwrap();
        assert_eq!(env.get("GMXLIB"), Some("/data/forcefields"));
    }

    #[test]
    fn available_force_fields_scans_gmxlib() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("charmm36.ff")).unwrap();
        fs::create_dir(dir.path().join("amber99.ff")).unwrap();
        fs::create_dir(dir.path().join("not_a_forcefield")).unwrap();

        let spec = EnvSpec {
            gmx_lib: Some(dir.path().to_string_lossy().to_string()),
            ..Default::default()
        };
        let env = GromacsEnv::resolve(&spec).unwrap();
        let fields = env.available_force_fields();

        assert!(fields.contains(&"charmm36.ff".to_string()));
        assert!(fields.contains(&"amber99.ff".to_string()));
        assert!(!fields.contains(&"not_a_forcefield".to_string()));
    }

    #[test]
    fn env_spec_reads_the_environment_section() {
        let schema = ReferenceSchema::builtin();
        let config: RawConfig = "[environment]\n\
                                 gmx_lib = \"/data/ff\"\n\
                                 clean_path = true\n"
            .parse()
            .unwrap();
        let validated = config.validate(&schema, &mut |_| true).unwrap();

        let spec = EnvSpec::from_config(&validated);
        assert_eq!(spec.gmx_lib.as_deref(), Some("/data/ff"));
        assert!(spec.clean_path);
        assert_eq!(spec.gmx_rc, None);
        assert_eq!(spec.module, None);
    }
}
