use crate::error::{CliError, Result};
use directories::ProjectDirs;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CACHE_FILE: &str = "mdp_options.toml";
const FETCH_TIMEOUT_SECS: u64 = 100;

/// Owns the local data directory and the per-version mdp option cache.
///
/// The cache maps a GROMACS version string to the list of legal mdp option
/// names scraped from the online manual, so repeated runs never touch the
/// network for a version already seen.
#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    /// The legal mdp options for a GROMACS version, from the cache when
    /// possible.
    ///
    /// `fetch` maps a manual URL to its HTML body; injected so the cache
    /// logic stays testable without a network. With `force` the cache entry
    /// is refetched and overwritten.
    pub fn mdp_options(
        &self,
        gmx_version: &str,
        force: bool,
        fetch: &dyn Fn(&str) -> Result<String>,
    ) -> Result<Vec<String>> {
        let version = validate_version(gmx_version)?;
        let mut cache = self.load_cache()?;

        if !force {
            if let Some(options) = cache.get(&version) {
                info!("mdp options for {} served from cache", version);
                return Ok(options.clone());
            }
        }

        let url = manual_url(&version);
        info!("Fetching mdp options from {}", url);
        let html = fetch(&url)?;
        let options = extract_mdp_options(&html);
        if options.is_empty() {
            return Err(CliError::Data(format!(
                "Could not find any mdp options in the manual for version '{version}'"
            )));
        }

        cache.insert(version, options.clone());
        self.save_cache(&cache)?;
        Ok(options)
    }

    fn load_cache(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let path = self.base_path.join(CACHE_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| {
            CliError::Data(format!(
                "Malformed mdp option cache '{}': {e}",
                path.display()
            ))
        })
    }

    fn save_cache(&self, cache: &BTreeMap<String, Vec<String>>) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.base_path.join(CACHE_FILE);
        let content = toml::to_string_pretty(cache)
            .map_err(|e| CliError::Data(format!("Could not serialize mdp option cache: {e}")))?;
        fs::write(&path, content)?;
        debug!("mdp option cache written to {:?}", path);
        Ok(())
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path.to_string_lossy().as_bytes()).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        ProjectDirs::from("org", "mdsimlab", "gmxflow")
            .map(|dirs| dirs.config_dir().join("path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "mdsimlab", "gmxflow")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| CliError::Data("Could not determine data directory path.".to_string()))
    }

    #[cfg(test)]
    fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

/// Accepts version strings of the form `2024` or `2024.1`.
fn validate_version(version: &str) -> Result<String> {
    let version = version.trim().to_string();
    let pattern = Regex::new(r"^\d+(\.\d+)?$").expect("Failed to compile version pattern");
    if !pattern.is_match(&version) {
        return Err(CliError::Argument(format!(
            "Invalid GROMACS version '{version}', expected e.g. 2024 or 2024.1"
        )));
    }
    Ok(version)
}

pub fn manual_url(version: &str) -> String {
    format!("https://manual.gromacs.org/documentation/{version}/user-guide/mdp-options.html")
}

/// Downloads a manual page; the production `fetch` for
/// [`DataManager::mdp_options`].
pub fn fetch_html(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;
    let body = client.get(url).send()?.error_for_status()?.text()?;
    Ok(body)
}

/// Pulls the option names out of the manual's anchor elements.
///
/// Every `<a>` whose href mentions `mdp` carries an option name as its
/// text; pilcrow permalinks and empty anchors are dropped. The page links
/// a few non-option anchors the same way, which the original tooling
/// tolerated too.
pub fn extract_mdp_options(html: &str) -> Vec<String> {
    let anchor = Regex::new(r#"<a[^>]*href="[^"]*mdp[^"]*"[^>]*>([^<]*)</a>"#)
        .expect("Failed to compile anchor pattern");
    anchor
        .captures_iter(html)
        .map(|captures| captures[1].trim().to_string())
        .filter(|text| !text.is_empty() && text != "¶")
        .collect()
}
