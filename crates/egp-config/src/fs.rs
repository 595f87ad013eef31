// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings as JSON files in one directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::store::{check_key, ConfigError, ConfigStore};

const EXTENSION: &str = "json";

/// Keeps each key as `<dir>/<key>.json`.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a reader never sees half a blob.
#[derive(Clone, Debug)]
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    /// A store in the platform config directory for `egp` (for example
    /// `~/.config/egp` on Linux).
    ///
    /// # Errors
    /// [`ConfigError::Backend`] when no home directory can be found, or
    /// [`ConfigError::Io`] if the directory cannot be created.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "egp")
            .ok_or_else(|| ConfigError::Backend("no home directory for config".into()))?;
        Self::at(dirs.config_dir())
    }

    /// A store in `dir`, created if missing.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the directory cannot be created.
    pub fn at(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| io(".", source))?;
        Ok(Self { dir })
    }

    /// The directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

fn io(key: &str, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        key: key.to_owned(),
        source,
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound(key.to_owned())),
            Err(e) => Err(io(key, e)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let staged = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&staged, data).map_err(|e| io(key, e))?;
        fs::rename(&staged, &path).map_err(|e| io(key, e))?;
        debug!(key, bytes = data.len(), path = %path.display(), "config saved");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, ConfigError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io(".", e)),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io(".", e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                if check_key(key).is_ok() {
                    keys.push(key.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
