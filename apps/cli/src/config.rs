use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::PageLimit;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Backend base url. Empty or absent means requests go to `origin`.
    pub backend_url: Option<String>,
    pub origin: String,
    pub page_limit: PageLimit,
    pub preferences_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            origin: "http://127.0.0.1:8000".into(),
            page_limit: PageLimit::default(),
            preferences_path: PathBuf::from(".contentforge/preferences.json"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    origin: Option<String>,
    page_limit: Option<u32>,
    preferences_path: Option<PathBuf>,
}

/// Defaults, then the optional config file, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<FileSettings>(raw)?;
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = Some(v);
    }
    if let Some(v) = file_cfg.origin {
        settings.origin = v;
    }
    if let Some(v) = file_cfg.page_limit {
        settings.page_limit = PageLimit::try_from(v).map_err(anyhow::Error::msg)?;
    }
    if let Some(v) = file_cfg.preferences_path {
        settings.preferences_path = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("BACKEND_URL") {
        settings.backend_url = Some(v);
    }
    if let Some(v) = lookup("APP__BACKEND_URL") {
        settings.backend_url = Some(v);
    }

    if let Some(v) = lookup("APP__ORIGIN") {
        settings.origin = v;
    }

    if let Some(v) = lookup("APP__PAGE_LIMIT") {
        match v.parse::<u32>().ok().and_then(PageLimit::new) {
            Some(limit) => settings.page_limit = limit,
            None => warn!("config: ignoring APP__PAGE_LIMIT={v}, expected one of {:?}", PageLimit::ALLOWED),
        }
    }

    if let Some(v) = lookup("APP__PREFERENCES_PATH") {
        settings.preferences_path = PathBuf::from(v);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
