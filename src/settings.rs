// SPDX-License-Identifier: GPL-3.0-only

//! Window position persistence in `<config dir>/ga-dashlet/settings.ini`.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const SETTINGS_DIR: &str = "ga-dashlet";
const SETTINGS_FILE: &str = "settings.ini";
const WINDOW_SECTION: &str = "window";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no user config directory available")]
    NoConfigDir,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-left corner of the window in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the per-user default location.
    pub fn new() -> Result<Self, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::at(dir.join(SETTINGS_DIR).join(SETTINGS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved position. Anything missing or malformed yields the origin.
    pub fn load(&self) -> Position {
        if let Err(err) = self.ensure_dir() {
            warn!(path = %self.path.display(), %err, "Could not create settings directory");
        }

        let conf = match Ini::load_from_file(&self.path) {
            Ok(conf) => conf,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "No usable settings file, using default position");
                return Position::default();
            }
        };

        let Some(window) = conf.section(Some(WINDOW_SECTION)) else {
            return Position::default();
        };

        let parse = |key: &str| window.get(key).and_then(|v| v.trim().parse::<i32>().ok());
        match (parse("x"), parse("y")) {
            (Some(x), Some(y)) => Position::new(x, y),
            _ => {
                warn!(path = %self.path.display(), "Malformed window section, using default position");
                Position::default()
            }
        }
    }

    /// Overwrite the settings file with `position`.
    pub fn save(&self, position: Position) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };

        self.ensure_dir().map_err(write_err)?;

        let mut conf = Ini::new();
        conf.with_section(Some(WINDOW_SECTION))
            .set("x", position.x.to_string())
            .set("y", position.y.to_string());
        conf.write_to_file(&self.path).map_err(write_err)?;

        debug!(x = position.x, y = position.y, "Saved window position");
        Ok(())
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        let Some(dir) = self.path.parent() else {
            return Ok(());
        };
        if dir.as_os_str().is_empty() || dir.is_dir() {
            return Ok(());
        }

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(dir)
    }
}
