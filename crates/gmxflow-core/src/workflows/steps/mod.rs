//! Concrete pipeline steps, one per toolchain command.

pub mod grompp;
pub mod mdrun;
pub mod pdb2gmx;
pub mod solvate;

pub use grompp::Grompp;
pub use mdrun::Mdrun;
pub use pdb2gmx::Pdb2gmx;
pub use solvate::Solvate;

use crate::core::config::validator::ValidatedConfig;
use crate::engine::error::EngineError;

pub(crate) fn require_str<'c>(
    config: &'c ValidatedConfig,
    section: &'static str,
    key: &'static str,
) -> Result<&'c str, EngineError> {
    config
        .get(section, key)
        .ok_or(EngineError::MissingParameter { section, key })?
        .as_str()
        .ok_or_else(|| EngineError::InvalidParameter {
            section,
            key,
            message: "expected a string".to_string(),
        })
}

pub(crate) fn require_float(
    config: &ValidatedConfig,
    section: &'static str,
    key: &'static str,
) -> Result<f64, EngineError> {
    if config.get(section, key).is_none() {
        return Err(EngineError::MissingParameter { section, key });
    }
    config
        .get_float(section, key)
        .ok_or_else(|| EngineError::InvalidParameter {
            section,
            key,
            message: "expected a number".to_string(),
        })
}
