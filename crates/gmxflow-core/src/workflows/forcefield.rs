use crate::core::config::matching::closest_match;
use crate::core::environment::gromacs::GromacsEnv;
use crate::engine::error::EngineError;
use tracing::info;

/// Checks a configured force-field name against the installations visible
/// to the toolchain.
///
/// The `.ff` suffix is optional in the configuration. An unknown name gets
/// the closest available candidate proposed through `confirm`; no candidate
/// or a declined proposal aborts rather than guessing. Returns the resolved
/// name without the `.ff` suffix, as `gmx pdb2gmx -ff` expects it.
pub fn resolve(
    name: &str,
    env: &GromacsEnv,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<String, EngineError> {
    let mut ff = name.to_string();
    if !ff.ends_with(".ff") {
        ff.push_str(".ff");
    }

    let available = env.available_force_fields();
    if !available.iter().any(|candidate| candidate == &ff) {
        let Some(candidate) =
            closest_match(&ff, available.iter().map(String::as_str))
        else {
            return Err(EngineError::ForceFieldNotFound {
                name: name.to_string(),
            });
        };
        let prompt = format!(
            "Could not find force field '{ff}' in $GMXDATA/top, $GMXLIB or the \
             working directory. Did you mean '{candidate}'?"
        );
        if !confirm(&prompt) {
            return Err(EngineError::ForceFieldRejected {
                name: ff,
                suggestion: candidate.to_string(),
            });
        }
        info!("Accepted force-field correction: '{}' -> '{}'", ff, candidate);
        ff = candidate.to_string();
    }

    Ok(ff.trim_end_matches(".ff").to_string())
}
