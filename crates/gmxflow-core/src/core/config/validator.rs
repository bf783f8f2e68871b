use super::matching::closest_match;
use super::schema::ReferenceSchema;
use std::path::Path;
use thiserror::Error;
use toml::{Table, Value};
use tracing::{debug, info};

/// A user-supplied run configuration as parsed, with arbitrary key spelling.
///
/// Consumed once by [`RawConfig::validate`]; the result is a
/// [`ValidatedConfig`] whose section and key names are guaranteed to exist in
/// the reference schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig(Table);

impl RawConfig {
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ValidationError::ConfigNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ValidationError::Io {
                path: path.to_string_lossy().to_string(),
                source: e,
            },
        })?;
        content.parse()
    }

    /// Checks every section and key against the schema, proposing the closest
    /// match through `confirm` for any unknown name.
    ///
    /// Only names are corrected, never values. Any unknown name without a
    /// plausible candidate, and any declined proposal, aborts the whole pass;
    /// no partial result is ever produced.
    pub fn validate(
        self,
        schema: &ReferenceSchema,
        confirm: &mut dyn FnMut(&str) -> bool,
    ) -> Result<ValidatedConfig, ValidationError> {
        let mut sections = Table::new();

        for (section, value) in self.0 {
            let Value::Table(table) = value else {
                return Err(ValidationError::NotASection { key: section });
            };

            let resolved_section = resolve_name(
                &section,
                schema.section_names(),
                confirm,
                &format!("In run configuration, section [{section}] not found in reference template"),
            )?
            .ok_or(ValidationError::UnknownSection { section: section.clone() })?;

            let mut resolved_table = Table::new();
            for (key, item) in table {
                let resolved_key = resolve_name(
                    &key,
                    schema.keys(&resolved_section),
                    confirm,
                    &format!(
                        "In run configuration, key '{key}' (value: {item}) not found in \
                         reference section [{resolved_section}]"
                    ),
                )?
                .ok_or_else(|| ValidationError::UnknownKey {
                    section: resolved_section.clone(),
                    key: key.clone(),
                })?;

                if resolved_table.insert(resolved_key.clone(), item).is_some() {
                    return Err(ValidationError::DuplicateKey {
                        section: resolved_section,
                        key: resolved_key,
                    });
                }
            }

            if sections
                .insert(resolved_section.clone(), Value::Table(resolved_table))
                .is_some()
            {
                return Err(ValidationError::DuplicateSection {
                    section: resolved_section,
                });
            }
        }

        debug!("Run configuration validated: {} section(s)", sections.len());
        Ok(ValidatedConfig { sections })
    }
}

impl std::str::FromStr for RawConfig {
    type Err = ValidationError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let table: Table = content
            .parse()
            .map_err(|source| ValidationError::Malformed { source })?;
        Ok(Self(table))
    }
}

/// Resolves `name` against `known` names, asking `confirm` before renaming.
///
/// `Ok(None)` means no plausible candidate exists; the caller turns that into
/// the appropriate unknown-name error.
fn resolve_name<'a, I>(
    name: &str,
    known: I,
    confirm: &mut dyn FnMut(&str) -> bool,
    context: &str,
) -> Result<Option<String>, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates = Vec::new();
    for candidate in known {
        if candidate == name {
            return Ok(Some(name.to_string()));
        }
        candidates.push(candidate);
    }

    if let Some(candidate) = closest_match(name, candidates) {
        let prompt = format!("{context}. Did you mean '{candidate}'?");
        if !confirm(&prompt) {
            return Err(ValidationError::CorrectionRejected {
                original: name.to_string(),
                suggestion: candidate.to_string(),
            });
        }
        info!("Accepted correction: '{}' -> '{}'", name, candidate);
        return Ok(Some(candidate.to_string()));
    }
    Ok(None)
}

/// A run configuration whose every (section, key) pair is guaranteed to be
/// present in the reference schema. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    sections: Table,
}

impl ValidatedConfig {
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Table> {
        self.sections.get(name).and_then(Value::as_table)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section).and_then(|table| table.get(key))
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key).and_then(Value::as_bool)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.get(section, key).and_then(Value::as_integer)
    }

    /// Numeric lookup; integers widen to floats so `box_size = 1` works.
    pub fn get_float(&self, section: &str, key: &str) -> Option<f64> {
        match self.get(section, key)? {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Run configuration not found: '{path}'")]
    ConfigNotFound { path: String },

    #[error("File I/O error for run configuration '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error in run configuration: {source}")]
    Malformed { source: toml::de::Error },

    #[error("Top-level entry '{key}' in run configuration is not a section")]
    NotASection { key: String },

    #[error("Section [{section}] not found in reference template and no close match exists")]
    UnknownSection { section: String },

    #[error("Key '{key}' in section [{section}] not found in reference template and no close match exists")]
    UnknownKey { section: String, key: String },

    #[error("Correction of '{original}' to '{suggestion}' was declined")]
    CorrectionRejected { original: String, suggestion: String },

    #[error("Sections resolve to the same name [{section}] after correction")]
    DuplicateSection { section: String },

    #[error("Keys resolve to the same name '{key}' in section [{section}] after correction")]
    DuplicateKey { section: String, key: String },
}
