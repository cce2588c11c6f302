use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SearchError;

/// Debounce used by the inline search bar.
pub const SEARCH_BAR_DEBOUNCE_MS: u64 = 300;
/// Debounce used by faster list-filtering surfaces.
pub const LIST_FILTER_DEBOUNCE_MS: u64 = 150;

pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_MAX_PROCESSED: usize = 5000;
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5000;

/// A structured-blob field that earns its own weight when it matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CuratedField {
    /// Dotted path into the blob, e.g. `document_type` or `custom.client`.
    pub path: String,
    pub weight: u32,
}

impl CuratedField {
    pub fn new(path: impl Into<String>, weight: u32) -> Self { Self { path: path.into(), weight } }
}

/// Field kind → weight. Curated fields are tested in listed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoreWeights {
    pub name: u32,
    pub curated: Vec<CuratedField>,
    pub custom: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name: 10,
            curated: vec![
                CuratedField::new("document_type", 5),
                CuratedField::new("document_description", 3),
                CuratedField::new("notes", 2),
            ],
            custom: 2,
        }
    }
}

/// The `[search]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
    pub max_processed: usize,
    pub debounce_ms: u64,
    pub remote_timeout_ms: u64,
    pub weights: ScoreWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_processed: DEFAULT_MAX_PROCESSED,
            debounce_ms: SEARCH_BAR_DEBOUNCE_MS,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            weights: ScoreWeights::default(),
        }
    }
}

impl SearchSettings {
    /// Settings for list-filtering surfaces: same caps, shorter debounce.
    pub fn list_filter() -> Self { Self { debounce_ms: LIST_FILTER_DEBOUNCE_MS, ..Self::default() } }

    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    pub fn remote_timeout(&self) -> Duration { Duration::from_millis(self.remote_timeout_ms) }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_results == 0 {
            return Err(SearchError::InvalidConfig("search.max_results must be > 0".into()));
        }
        if self.max_processed == 0 {
            return Err(SearchError::InvalidConfig("search.max_processed must be > 0".into()));
        }
        if self.remote_timeout_ms == 0 {
            return Err(SearchError::InvalidConfig("search.remote_timeout_ms must be > 0".into()));
        }
        for field in &self.weights.curated {
            if field.path.split('.').any(|seg| seg.trim().is_empty()) {
                return Err(SearchError::InvalidConfig(format!("curated field path '{}' has an empty segment", field.path)));
            }
        }
        self.weights.validate()
    }
}

impl ScoreWeights {
    /// A name match must never be outranked by secondary fields: the curated
    /// weights together, and the custom weight alone, are capped by `name`.
    pub fn validate(&self) -> crate::error::Result<()> {
        let curated = self.curated.iter().try_fold(0u32, |sum, f| sum.checked_add(f.weight));
        match curated {
            Some(sum) if sum <= self.name => {}
            Some(sum) => {
                return Err(SearchError::InvalidConfig(format!(
                    "curated weights sum to {} which exceeds the name weight {}",
                    sum, self.name
                )));
            }
            None => return Err(SearchError::InvalidConfig("curated weights overflow".into())),
        }
        if self.custom > self.name {
            return Err(SearchError::InvalidConfig(format!(
                "custom weight {} exceeds the name weight {}",
                self.custom, self.name
            )));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(&env::current_dir()?)
    }

    /// Merge `config.toml`, `config.<env>.toml` and `APP_*` variables found
    /// relative to `base`. `RUST_ENV` selects the environment (default `dev`).
    pub fn load_in(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(base, &env_name)
    }

    pub fn load_for_env(base: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::default("search", SearchSettings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn search_settings(&self) -> anyhow::Result<SearchSettings> {
        self.get("search")
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.search_settings()?;
        settings.validate()?;
        match env {
            "prod" | "production" => {
                if settings.debounce_ms == 0 {
                    return Err(anyhow::anyhow!("Prod config must debounce queries (search.debounce_ms = 0)"));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
