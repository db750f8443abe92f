use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_AUTOMATION_KEY: &str = "{F9}";
pub const DEFAULT_LAUNCH_COMMAND: &str = "pnpm start";
pub const DEFAULT_SHELL: &str = "cmd.exe";

/// User-editable panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub automation_key: String,
    pub launch_command: String,
    pub default_shell: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            automation_key: DEFAULT_AUTOMATION_KEY.to_string(),
            launch_command: DEFAULT_LAUNCH_COMMAND.to_string(),
            default_shell: DEFAULT_SHELL.to_string(),
        }
    }
}

/// On-disk record. Each field stays `None` until explicitly written so
/// defaults are applied at read time rather than baked into the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_roots: Option<Vec<PathBuf>>,
}

/// Default location of the state file.
pub fn state_file_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("one-workflow/state.json")
}

/// Persisted key-value store for settings and project roots.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings, or defaults when none were ever saved.
    pub fn settings(&self) -> Settings {
        self.load().settings.unwrap_or_default()
    }

    /// Overwrite the stored settings wholesale.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut state = self.load();
        state.settings = Some(settings.clone());
        self.write(&state)
    }

    /// Configured roots, or `fallback` (the active workspace) when the list
    /// is absent or empty.
    pub fn project_roots(&self, fallback: Option<&Path>) -> Vec<PathBuf> {
        match self.load().project_roots {
            Some(roots) if !roots.is_empty() => roots,
            _ => fallback.map(|p| vec![p.to_path_buf()]).unwrap_or_default(),
        }
    }

    pub fn save_project_roots(&self, roots: &[PathBuf]) -> Result<()> {
        let mut state = self.load();
        state.project_roots = Some(roots.to_vec());
        self.write(&state)
    }

    /// A missing or corrupt file reads as empty state. Corruption is logged
    /// so a silent reset is visible.
    fn load(&self) -> StoredState {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoredState::default(),
            Err(e) => {
                tracing::warn!("{}", Error::StateRead { path: self.path.clone(), source: e });
                return StoredState::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("corrupt state file {}: {e}; using defaults", self.path.display());
                StoredState::default()
            }
        }
    }

    /// Write via temp file + rename so a crash never leaves half a file.
    fn write(&self, state: &StoredState) -> Result<()> {
        let write_err = |source| Error::StateWrite { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let temp = self.path.with_extension(format!("json.tmp.{}", std::process::id()));
        fs::write(&temp, json).map_err(write_err)?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(write_err(e));
        }
        tracing::debug!("state written to {}", self.path.display());
        Ok(())
    }
}
