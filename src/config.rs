//! Layered configuration: built-in defaults, an optional `codeintel.toml`,
//! then `CODEINTEL_`-prefixed environment variable overrides.
//!
//! # Environment variables
//!
//! Double underscores separate nested levels, matching the teacher's
//! convention:
//! - `CODEINTEL_INDEXING__PARALLELISM=8`
//! - `CODEINTEL_CACHE__MAX_ENTRIES=50000`
//! - `CODEINTEL_WATCHER__DEBOUNCE_MS=250`

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

static GLOBAL_DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_global_debug(enabled: bool) {
    GLOBAL_DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_global_debug_enabled() -> bool {
    GLOBAL_DEBUG.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Extra directory names to skip, layered on top of the fixed
    /// denylist (`.git`, build-output dirs, dot-directories).
    #[serde(default)]
    pub extra_ignore_dirs: Vec<String>,
    /// Per-file source size cap; larger files are skipped with a warning.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_parallelism() -> usize {
    num_cpus::get()
}
fn default_max_file_bytes() -> u64 {
    5 * 1024 * 1024
}
fn default_cache_entries() -> usize {
    10_000
}
fn default_debounce_ms() -> u64 {
    100
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            extra_ignore_dirs: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let mut languages = HashMap::new();
        for lang in ["rust", "python", "javascript", "typescript", "go", "java"] {
            languages.insert(lang.to_string(), LanguageConfig { enabled: true });
        }
        Self {
            indexing: IndexingConfig::default(),
            cache: CacheConfig::default(),
            watcher: WatcherConfig::default(),
            languages,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load defaults, then `path` if it exists, then environment overrides.
    pub fn load(path: Option<&PathBuf>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        } else if PathBuf::from("codeintel.toml").exists() {
            figment = figment.merge(Toml::file("codeintel.toml"));
        }

        figment = figment.merge(Env::prefixed("CODEINTEL_").split("__"));
        figment.extract()
    }

    pub fn language_enabled(&self, name: &str) -> bool {
        self.languages
            .get(name)
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_all_shipped_languages() {
        let settings = Settings::default();
        for lang in ["rust", "python", "javascript", "typescript", "go", "java"] {
            assert!(settings.language_enabled(lang), "{lang} should default on");
        }
        assert!(!settings.language_enabled("cobol"));
    }

    #[test]
    fn env_override_splits_nested_keys() {
        std::env::set_var("CODEINTEL_WATCHER__DEBOUNCE_MS", "250");
        let settings = Settings::load(None).expect("settings should load");
        assert_eq!(settings.watcher.debounce_ms, 250);
        std::env::remove_var("CODEINTEL_WATCHER__DEBOUNCE_MS");
    }
}
