use super::category::{BACKUP_SUFFIX, LEDGER_FILE, MINOR_DIR, category_of, is_major};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Persistent record of the files a pipeline has produced, partitioned by
/// file category.
///
/// The ledger is the idempotency gate for pipeline steps: a step registers
/// its declared outputs before running, and a registration where every path
/// already exists signals that the step is complete and must be skipped.
/// The persisted record — not a directory listing — is the source of truth
/// for what is registered; the file system is only consulted for existence
/// checks and for reporting stray unregistered files.
#[derive(Debug)]
pub struct FileLedger {
    run_dir: PathBuf,
    minor_dir: PathBuf,
    record_path: PathBuf,
    categories: BTreeMap<String, Vec<PathBuf>>,
}

impl FileLedger {
    /// Reconstructs the ledger from the persisted record in `run_dir`, or
    /// starts empty when none exists. Creates the minor zone if missing.
    pub fn load(run_dir: &Path) -> Result<Self, LedgerError> {
        let run_dir = run_dir.to_path_buf();
        let minor_dir = run_dir.join(MINOR_DIR);
        if !minor_dir.is_dir() {
            fs::create_dir_all(&minor_dir).map_err(|e| LedgerError::Io {
                path: minor_dir.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        let record_path = run_dir.join(LEDGER_FILE);
        let categories = if record_path.is_file() {
            let content = fs::read_to_string(&record_path).map_err(|e| LedgerError::Io {
                path: record_path.to_string_lossy().to_string(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| LedgerError::MalformedRecord {
                path: record_path.to_string_lossy().to_string(),
                source: e,
            })?
        } else {
            BTreeMap::new()
        };

        debug!(
            "Ledger loaded from {:?}: {} categorie(s)",
            record_path,
            categories.len()
        );
        Ok(Self {
            run_dir,
            minor_dir,
            record_path,
            categories,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn minor_dir(&self) -> &Path {
        &self.minor_dir
    }

    pub fn categories(&self) -> &BTreeMap<String, Vec<PathBuf>> {
        &self.categories
    }

    /// Zone path a filename resolves to, without registering it.
    pub fn resolve(&self, name: &str) -> PathBuf {
        if is_major(name) {
            self.run_dir.join(name)
        } else {
            self.minor_dir.join(name)
        }
    }

    /// Most recently registered path of a category, used by steps to locate
    /// the currently relevant upstream file.
    pub fn latest(&self, category: &str) -> Option<&Path> {
        self.categories
            .get(category)
            .and_then(|paths| paths.last())
            .map(PathBuf::as_path)
    }

    /// Registers the declared outputs of a step.
    ///
    /// Returns `Ok(None)` when every resolved path already exists on disk —
    /// the step is complete and must not re-run. In a mixed state, every
    /// existing path is first renamed to `<path>bak`; an occupied backup
    /// name is a fatal [`LedgerError::BackupCollision`], never silently
    /// overwritten. The returned paths are positionally aligned with
    /// `names`. In-memory state only; call [`FileLedger::save`] to persist.
    pub fn register_outputs(&mut self, names: &[String]) -> Result<Option<Vec<PathBuf>>, LedgerError> {
        let paths: Vec<PathBuf> = names.iter().map(|name| self.resolve(name)).collect();

        if !paths.is_empty() && paths.iter().all(|path| path.exists()) {
            return Ok(None);
        }

        for path in &paths {
            if path.exists() {
                let backup = backup_path(path);
                if backup.exists() {
                    return Err(LedgerError::BackupCollision { path: backup });
                }
                warn!(
                    "Partial outputs on disk, backing up {} -> {}",
                    path.display(),
                    backup.display()
                );
                fs::rename(path, &backup).map_err(|e| LedgerError::Io {
                    path: path.to_string_lossy().to_string(),
                    source: e,
                })?;
            }
        }

        for (name, path) in names.iter().zip(&paths) {
            let list = self
                .categories
                .entry(category_of(name).to_string())
                .or_default();
            if !list.contains(path) {
                list.push(path.clone());
            }
        }

        Ok(Some(paths))
    }

    /// Persists the full category mapping, overwriting the prior record.
    ///
    /// Tracked paths missing on disk are reported as integrity warnings but
    /// do not abort the save; the run may still have other valid state
    /// worth persisting.
    pub fn save(&self) -> Result<(), LedgerError> {
        for (category, paths) in &self.categories {
            for path in paths {
                if !path.is_file() {
                    warn!(
                        "Integrity: expected {} (category '{}') to exist on disk, but it was not found",
                        path.display(),
                        category
                    );
                }
            }
        }

        let content =
            toml::to_string_pretty(&self.categories).map_err(|e| LedgerError::Serialize {
                source: e,
            })?;
        fs::write(&self.record_path, content).map_err(|e| LedgerError::Io {
            path: self.record_path.to_string_lossy().to_string(),
            source: e,
        })?;
        info!("Ledger saved to {:?}", self.record_path);
        Ok(())
    }

    /// Files present in either zone that the ledger does not track.
    ///
    /// For reporting only: a stray file is never adopted into the ledger
    /// and never overrides what is registered. The record file itself and
    /// backups made by the ledger are not strays.
    pub fn untracked_files(&self) -> io::Result<Vec<PathBuf>> {
        let tracked: Vec<&PathBuf> = self.categories.values().flatten().collect();
        let mut strays = Vec::new();

        for dir in [&self.run_dir, &self.minor_dir] {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                if path == self.record_path {
                    continue;
                }
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if name.ends_with(BACKUP_SUFFIX) && name.len() > BACKUP_SUFFIX.len() {
                    continue;
                }
                if !tracked.contains(&&path) {
                    strays.push(path);
                }
            }
        }

        strays.sort();
        Ok(strays)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(BACKUP_SUFFIX);
    PathBuf::from(os)
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Backup target already exists, refusing to overwrite: '{path}'", path = path.display())]
    BackupCollision { path: PathBuf },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed ledger record '{path}': {source}")]
    MalformedRecord {
        path: String,
        source: toml::de::Error,
    },

    #[error("Could not serialize ledger record: {source}")]
    Serialize { source: toml::ser::Error },
}
