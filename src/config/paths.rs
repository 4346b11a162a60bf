//! Where the settings file and downloaded classifier checkpoints live.
//!
//! The platform layout keeps settings in the config dir and checkpoints in
//! the local data dir, each under `ai-voice-detector/`:
//!
//! | | settings.toml | models/ |
//! |---|---|---|
//! | Linux | `~/.config/ai-voice-detector/` | `~/.local/share/ai-voice-detector/` |
//! | macOS | `~/Library/Application Support/ai-voice-detector/` | same |
//! | Windows | `%APPDATA%\ai-voice-detector\` | `%LOCALAPPDATA%\ai-voice-detector\` |
//!
//! When [`HOME_ENV`] is set, both live directly under that directory.

use std::path::{Path, PathBuf};

/// Overrides the platform layout with a single root directory.
pub const HOME_ENV: &str = "AI_VOICE_DETECTOR_HOME";

const APP_DIR: &str = "ai-voice-detector";
const SETTINGS_FILE: &str = "settings.toml";
const MODELS_DIR: &str = "models";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// The TOML settings read by `AppConfig::load`.
    pub settings_file: PathBuf,
    /// Hugging Face hub cache for classifier checkpoints.
    pub models_dir: PathBuf,
}

impl AppPaths {
    /// [`HOME_ENV`] if set and non-empty, the platform layout otherwise.
    pub fn new() -> Self {
        match std::env::var_os(HOME_ENV).filter(|home| !home.is_empty()) {
            Some(home) => Self::under(home),
            None => Self::platform(),
        }
    }

    /// `root/settings.toml` and `root/models/`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            settings_file: root.join(SETTINGS_FILE),
            models_dir: root.join(MODELS_DIR),
        }
    }

    fn platform() -> Self {
        // No platform dir: relative to the working directory.
        let app_dir = |base: Option<PathBuf>| base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR);
        Self {
            settings_file: app_dir(dirs::config_dir()).join(SETTINGS_FILE),
            models_dir: app_dir(dirs::data_local_dir()).join(MODELS_DIR),
        }
    }

    /// Create the checkpoint cache if needed and return it.
    pub fn ensure_models_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.models_dir)?;
        Ok(&self.models_dir)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_root_layout() {
        let paths = AppPaths::under("/srv/detector");
        assert_eq!(paths.settings_file, Path::new("/srv/detector/settings.toml"));
        assert_eq!(paths.models_dir, Path::new("/srv/detector/models"));
    }

    #[test]
    fn platform_layout_is_namespaced() {
        let paths = AppPaths::platform();
        let parent = paths.settings_file.parent().and_then(Path::file_name);
        assert_eq!(parent.and_then(|n| n.to_str()), Some(APP_DIR));
        assert!(paths.models_dir.ends_with(Path::new(APP_DIR).join(MODELS_DIR)));
    }

    #[test]
    fn models_dir_is_created_on_demand() {
        let root = tempfile::tempdir().unwrap();
        let paths = AppPaths::under(root.path().join("nested"));
        assert!(!paths.models_dir.exists());
        let created = paths.ensure_models_dir().unwrap();
        assert!(created.is_dir());
        // Idempotent.
        assert!(paths.ensure_models_dir().is_ok());
    }
}
