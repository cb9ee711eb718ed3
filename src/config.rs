// Configuration loading and parsing (config/server.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub sleeper: SleeperSection,
    pub cache: CacheSection,
    pub values: ValuesSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Port the HTTP API binds on (127.0.0.1).
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleeperSection {
    /// Sleeper API root, e.g. "https://api.sleeper.app/v1".
    pub base_url: String,
    /// Market valuation endpoint, e.g.
    /// "https://api.fantasycalc.com/values/current".
    pub values_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Time-to-live for the full player directory (large, slow-changing).
    pub players_ttl_secs: u64,
    /// Time-to-live for market valuation lists.
    pub values_ttl_secs: u64,
}

/// Query parameters for the market valuation list. Team count is taken
/// from the league being served, not from config.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuesSection {
    pub dynasty: bool,
    pub num_qbs: u32,
    pub ppr: f64,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/server.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("server.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/server.toml` exists by copying it from `defaults/` on
/// first run. Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_path = base_dir.join("defaults").join("server.toml");
    let config_dir = base_dir.join("config");
    let target = config_dir.join("server.toml");

    if target.exists() {
        return Ok(vec![]);
    }
    if !defaults_path.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} found; run from the project root or create the config file",
                target.display(),
                defaults_path.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&defaults_path, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", defaults_path.display()),
    })?;

    Ok(vec![target])
}

/// Convenience wrapper: loads config relative to the current working
/// directory, copying the default config file first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    for (field, url) in [
        ("sleeper.base_url", &config.sleeper.base_url),
        ("sleeper.values_url", &config.sleeper.values_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError {
                field: field.to_string(),
                message: format!("must be an http(s) URL, got {url:?}"),
            });
        }
    }

    for (field, secs) in [
        ("cache.players_ttl_secs", config.cache.players_ttl_secs),
        ("cache.values_ttl_secs", config.cache.values_ttl_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::ValidationError {
                field: field.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if !(1..=2).contains(&config.values.num_qbs) {
        return Err(ConfigError::ValidationError {
            field: "values.num_qbs".into(),
            message: format!("must be 1 or 2, got {}", config.values.num_qbs),
        });
    }

    let ppr = config.values.ppr;
    if !(0.0..=1.0).contains(&ppr) {
        return Err(ConfigError::ValidationError {
            field: "values.ppr".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {ppr}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
