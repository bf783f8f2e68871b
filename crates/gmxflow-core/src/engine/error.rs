use thiserror::Error;

use crate::core::config::schema::SchemaError;
use crate::core::config::validator::ValidationError;
use crate::core::environment::gromacs::EnvError;
use crate::core::files::ledger::LedgerError;
use crate::core::process::runner::ProcessError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Schema error: {source}")]
    Schema {
        #[from]
        source: SchemaError,
    },

    #[error("Configuration validation failed: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    #[error("Ledger error: {source}")]
    Ledger {
        #[from]
        source: LedgerError,
    },

    #[error("Environment resolution failed: {source}")]
    Environment {
        #[from]
        source: EnvError,
    },

    #[error("Command execution failed: {source}")]
    Process {
        #[from]
        source: ProcessError,
    },

    #[error("Missing required parameter '{key}' in section [{section}]")]
    MissingParameter {
        section: &'static str,
        key: &'static str,
    },

    #[error("Invalid parameter '{key}' in section [{section}]: {message}")]
    InvalidParameter {
        section: &'static str,
        key: &'static str,
        message: String,
    },

    #[error("Step '{step}' input not found: '{path}'", path = path.display())]
    InputNotFound { step: &'static str, path: PathBuf },

    #[error("Step '{step}' did not produce declared output: '{path}'", path = path.display())]
    MissingOutput { step: &'static str, path: PathBuf },

    #[error("Step '{step}' requires a registered '{category}' file from an earlier step")]
    MissingUpstream {
        step: &'static str,
        category: &'static str,
    },

    #[error("Force field '{name}' not found in $GMXDATA/top, $GMXLIB or the working directory")]
    ForceFieldNotFound { name: String },

    #[error("Force field correction '{name}' -> '{suggestion}' was declined")]
    ForceFieldRejected { name: String, suggestion: String },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
