//! Persistence for profile records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CodecProfile;
use crate::engine::error::ProfileError;

/// Storage backing the profile registry.
pub trait ProfileStore: Send + Sync {
    /// Every readable record. Records that fail to parse are skipped, not fatal.
    fn read_all(&self) -> Result<Vec<CodecProfile>, ProfileError>;

    fn write(&self, profile: &CodecProfile) -> Result<(), ProfileError>;

    /// Erase the record for `name`. Missing records are not an error.
    fn delete(&self, name: &str) -> Result<(), ProfileError>;
}

/// One pretty-printed JSON file per profile.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the profile called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(file_name(name))
    }
}

/// File name for a profile: `[A-Za-z0-9_-]` kept, every other byte
/// percent-encoded, so distinct names never share a file and no name can
/// leave the store directory. `My Profile` -> `My%20Profile.json`
pub fn file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 5);
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(char::from(byte)),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out.push_str(".json");
    out
}

impl ProfileStore for JsonDirStore {
    fn read_all(&self) -> Result<Vec<CodecProfile>, ProfileError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut profiles = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(ProfileError::from)
                .and_then(|json| serde_json::from_str::<CodecProfile>(&json).map_err(ProfileError::from));
            match parsed {
                Ok(profile) => profiles.push(profile),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable profile"),
            }
        }
        Ok(profiles)
    }

    fn write(&self, profile: &CodecProfile) -> Result<(), ProfileError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(profile)?;
        fs::write(self.path_for(profile.name()), json)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), ProfileError> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
