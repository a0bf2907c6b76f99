use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_ENV_PREFIX: &str = "GH_TRENDING";
const APP_DIR: &str = "gh-trending";

/// Sentinel language that maps to the unfiltered trending page.
pub const ALL_LANGUAGES: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_browser")]
    pub browser: String,
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            browser: default_browser(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec![ALL_LANGUAGES.to_string()]
}

fn default_browser() -> String {
    "google-chrome".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct EnvOverrides {
    languages: Option<Vec<String>>,
    browser: Option<String>,
    fetch_timeout: Option<Duration>,
}

pub fn load(options: LoadOptions) -> Result<Config, ConfigError> {
    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    load_with_env(options.config_file.as_deref(), prefix, env::vars())
}

fn load_with_env<I>(config_file: Option<&Path>, prefix: &str, vars: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut cfg = Config::default();

    let path = match config_file {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };
    if let Some(path) = path {
        if path.exists() {
            cfg = read_config_file(&path)?;
        }
    }

    let overrides = load_env(prefix, vars)?;
    cfg = merge_overrides(cfg, overrides);
    cfg.languages = normalize_languages(cfg.languages);

    if cfg.languages.is_empty() {
        return Err(ConfigError::NoLanguages);
    }
    if cfg.fetch_timeout.is_zero() {
        cfg.fetch_timeout = default_fetch_timeout();
    }

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_overrides(mut base: Config, other: EnvOverrides) -> Config {
    if let Some(languages) = other.languages {
        base.languages = languages;
    }
    if let Some(browser) = other.browser {
        if !browser.trim().is_empty() {
            base.browser = browser;
        }
    }
    if let Some(timeout) = other.fetch_timeout {
        base.fetch_timeout = timeout;
    }
    base
}

/// Trims entries, drops blanks and keeps the first occurrence of duplicates.
fn normalize_languages(languages: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(languages.len());
    for language in languages {
        let trimmed = language.trim();
        if trimmed.is_empty() || out.iter().any(|seen| seen == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

fn load_env<I>(prefix: &str, vars: I) -> Result<EnvOverrides, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    let mut overrides = EnvOverrides::default();

    for (key, value) in vars {
        let Some(stripped) = key.strip_prefix(&upper_prefix) else {
            continue;
        };
        apply_env_value(&mut overrides, &stripped.to_ascii_lowercase(), value)?;
    }

    Ok(overrides)
}

fn apply_env_value(overrides: &mut EnvOverrides, key: &str, value: String) -> Result<(), ConfigError> {
    match key {
        "languages" => {
            overrides.languages = Some(
                value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        "browser" => overrides.browser = Some(value),
        "fetch_timeout" => match humantime::parse_duration(value.trim()) {
            Ok(duration) => overrides.fetch_timeout = Some(duration),
            Err(_) => {
                return Err(ConfigError::InvalidEnv {
                    key: key.to_string(),
                    value,
                })
            }
        },
        _ => {}
    }
    Ok(())
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

/// Writes a default config to `path` (or the default location) unless one exists.
pub fn ensure_config_file(path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => default_config_path().ok_or(ConfigError::NoConfigDir)?,
    };
    if path.exists() {
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let contents = serde_yaml::to_string(&Config::default()).map_err(ConfigError::Serialize)?;
    fs::write(&path, contents).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote default config");

    Ok(path)
}

pub fn editor_command() -> String {
    env::var("EDITOR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string())
}

/// Opens the config file in the user's editor and waits for it to exit.
pub fn edit(path: Option<PathBuf>, editor: &str) -> Result<()> {
    let path = ensure_config_file(path).context("prepare config file")?;
    let status = Command::new(editor)
        .arg(&path)
        .status()
        .with_context(|| format!("launch editor {editor:?}"))?;
    if !status.success() {
        bail!("editor {editor:?} exited with {status}");
    }
    Ok(())
}
