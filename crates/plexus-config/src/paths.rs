//! Platform-specific paths for plexus configuration.
//!
//! - **User config**: `~/.config/plexus/` (Linux), `~/Library/Application Support/plexus/` (macOS), `%APPDATA%\plexus\` (Windows)
//! - **Scheduler config**: `scheduler.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use plexus_config::paths;
//!
//! if let Some(path) = paths::find_scheduler_config(None) {
//!     println!("Using scheduler config at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "plexus";

/// File name of the default scheduler config.
pub const SCHEDULER_CONFIG_FILE: &str = "scheduler.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the scheduler config.
pub fn default_scheduler_config() -> PathBuf {
    user_config_dir().join(SCHEDULER_CONFIG_FILE)
}

/// Locates a scheduler config.
///
/// An explicit path is returned if it exists. Without one, the default
/// location is used if a file is there.
pub fn find_scheduler_config(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.is_file().then(|| path.to_path_buf()),
        None => {
            let path = default_scheduler_config();
            path.is_file().then_some(path)
        }
    }
}

/// Ensures the user config directory exists.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}
