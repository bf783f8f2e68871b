use std::path::Path;
use thiserror::Error;
use toml::Table;

const BUILTIN_TEMPLATE: &str = include_str!("../../../assets/input_template.toml");

/// The canonical set of legal configuration section and key names.
///
/// Loaded once from a TOML template mapping each section to its keys and
/// example values, and immutable from then on. User configurations are
/// checked against this schema by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSchema {
    sections: Table,
}

impl ReferenceSchema {
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SchemaError::NotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => SchemaError::Io {
                path: path.to_string_lossy().to_string(),
                source: e,
            },
        })?;
        Self::from_toml(&content, &path.to_string_lossy())
    }

    /// The template shipped with the crate, used when no path is configured.
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_TEMPLATE, "<builtin>")
            .expect("embedded input template must be valid")
    }

    fn from_toml(content: &str, origin: &str) -> Result<Self, SchemaError> {
        let sections: Table = toml::from_str(content).map_err(|e| SchemaError::Malformed {
            path: origin.to_string(),
            source: e,
        })?;
        for (name, value) in &sections {
            if !value.is_table() {
                return Err(SchemaError::NotASection {
                    path: origin.to_string(),
                    key: name.clone(),
                });
            }
        }
        Ok(Self { sections })
    }

    pub fn contains_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn contains_key(&self, section: &str, key: &str) -> bool {
        self.section_table(section)
            .is_some_and(|table| table.contains_key(key))
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Key names of a section, empty when the section does not exist.
    pub fn keys<'a>(&'a self, section: &str) -> impl Iterator<Item = &'a str> {
        self.section_table(section)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    fn section_table(&self, section: &str) -> Option<&Table> {
        self.sections.get(section).and_then(|value| value.as_table())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Reference template not found: '{path}'")]
    NotFound { path: String },

    #[error("File I/O error for reference template '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for reference template '{path}': {source}")]
    Malformed {
        path: String,
        source: toml::de::Error,
    },

    #[error("Reference template '{path}' has a non-section entry at top level: '{key}'")]
    NotASection { path: String, key: String },
}
