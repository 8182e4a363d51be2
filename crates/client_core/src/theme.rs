//! Appearance preference: persisted mode plus the resolved dark flag.
//!
//! The stored mode is read once when the controller is built and written on
//! every change. The system appearance arrives through a `watch` channel
//! supplied by the host; while the mode is `system` the dark flag follows it.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Result};
use shared::domain::ThemeMode;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

pub const THEME_KEY: &str = "theme";

/// String key/value store for user preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a flat JSON object in one file.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read preferences '{}'", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse preferences '{}'", self.path.display()))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // An unreadable file is left alone rather than replaced by one key.
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create preferences dir '{}'", parent.display())
            })?;
        }
        let contents = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write preferences '{}'", self.path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub dark: bool,
}

pub struct ThemeController {
    store: Arc<dyn PreferenceStore>,
    system_dark: watch::Receiver<bool>,
    state: watch::Sender<ThemeState>,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl ThemeController {
    /// Reads the stored mode once. A missing, unreadable or unknown value
    /// falls back to `system`.
    pub fn new(store: Arc<dyn PreferenceStore>, system_dark: watch::Receiver<bool>) -> Self {
        let mode = match store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse::<ThemeMode>().unwrap_or_else(|err| {
                warn!("theme: ignoring stored value: {err}");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(err) => {
                warn!("theme: failed to read preference: {err:#}");
                ThemeMode::default()
            }
        };
        let dark = mode.is_dark(*system_dark.borrow());
        let (state, _) = watch::channel(ThemeState { mode, dark });
        Self {
            store,
            system_dark,
            state,
            follower: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> ThemeState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.state.subscribe()
    }

    /// Applies and persists a new mode. The in-memory state changes even if
    /// the write fails.
    pub fn set_mode(&self, mode: ThemeMode) -> Result<ThemeState> {
        let system_dark = *self.system_dark.borrow();
        let next = ThemeState {
            mode,
            dark: mode.is_dark(system_dark),
        };
        self.state.send_replace(next);
        self.store
            .set(THEME_KEY, mode.as_str())
            .context("failed to persist theme preference")?;
        Ok(next)
    }

    /// Follows system appearance changes until [`ThemeController::stop`].
    pub fn start(self: &Arc<Self>) {
        let mut follower = self.follower();
        if follower.is_some() {
            return;
        }
        let controller = Arc::clone(self);
        let mut system_dark = self.system_dark.clone();
        *follower = Some(tokio::spawn(async move {
            while system_dark.changed().await.is_ok() {
                let prefers_dark = *system_dark.borrow_and_update();
                controller.state.send_if_modified(|state| {
                    if state.mode != ThemeMode::System || state.dark == prefers_dark {
                        return false;
                    }
                    debug!(dark = prefers_dark, "theme: system appearance changed");
                    state.dark = prefers_dark;
                    true
                });
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(task) = self.follower().take() {
            task.abort();
        }
    }

    fn follower(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.follower.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/theme_tests.rs"]
mod tests;
