use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use booking_core::DEFAULT_STORAGE_KEY;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "booking.toml";
const APP_DIR_NAME: &str = "onyx_auto_lab";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.into(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then `booking.toml` (or the explicit `config_path`), then
/// environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_cfg = match config_path {
        Some(path) => Some(read_file_settings(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(read_file_settings(default_path)?)
            } else {
                None
            }
        }
    };
    if let Some(file_cfg) = file_cfg {
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    storage::validate_key(&settings.storage_key)
        .with_context(|| format!("invalid storage_key '{}'", settings.storage_key))?;

    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file '{}'", path.display()))
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.data_dir {
        settings.data_dir = Some(v);
    }
    if let Some(v) = file_cfg.storage_key {
        settings.storage_key = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(v) = read("BOOKING_DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = read("APP__DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = read("BOOKING_STORAGE_KEY") {
        settings.storage_key = v;
    }
    if let Some(v) = read("APP__STORAGE_KEY") {
        settings.storage_key = v;
    }

    if let Some(v) = read("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

pub fn resolve_data_dir(settings: &Settings) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &settings.data_dir {
        return Ok(dir.clone());
    }
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("unable to resolve local app data dir; set BOOKING_DATA_DIR"))?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn prepare_data_dir(settings: &Settings) -> anyhow::Result<PathBuf> {
    let dir = resolve_data_dir(settings)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory '{}'", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
