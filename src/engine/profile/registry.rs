//! Name-keyed table of loaded profiles.
//!
//! Profiles are handed out as `Arc<CodecProfile>`. Removing a profile only
//! unlinks it from the table; a stream still holding the `Arc` keeps it alive.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::store::ProfileStore;
use super::CodecProfile;
use crate::engine::codec::Codec;
use crate::engine::error::{FieldError, ProfileError};
use crate::engine::registry::CodecRegistry;
use crate::engine::visibility::validate_profile;

/// Outcome of [`ProfileRegistry::load_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Profiles kept although their codec is not registered
    pub unresolved: Vec<String>,
}

pub struct ProfileRegistry {
    profiles: RwLock<HashMap<String, Arc<CodecProfile>>>,
    store: Box<dyn ProfileStore>,
}

impl ProfileRegistry {
    pub fn new(store: impl ProfileStore + 'static) -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            store: Box::new(store),
        }
    }

    /// Replace the table with every record in the store.
    pub fn load_all(&self, codecs: &CodecRegistry) -> Result<LoadReport, ProfileError> {
        let mut table = HashMap::new();
        let mut report = LoadReport::default();

        for mut profile in self.store.read_all()? {
            normalize(&mut profile, codecs);
            let name = profile.name().to_string();
            if !profile.base().is_auto() && codecs.find(profile.codec_name()).is_none() {
                tracing::warn!(profile = %name, codec = profile.codec_name(), "profile codec not registered");
                report.unresolved.push(name.clone());
            }
            if table.insert(name.clone(), Arc::new(profile)).is_some() {
                tracing::warn!(profile = %name, "duplicate profile record, keeping the last one");
            } else {
                report.loaded.push(name);
            }
        }

        tracing::info!(
            loaded = report.loaded.len(),
            unresolved = report.unresolved.len(),
            "profiles loaded"
        );
        *self.profiles.write().unwrap_or_else(PoisonError::into_inner) = table;
        Ok(report)
    }

    pub fn find(&self, name: &str) -> Option<Arc<CodecProfile>> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All profiles, sorted by name.
    pub fn list(&self) -> Vec<Arc<CodecProfile>> {
        let mut profiles: Vec<_> = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.name().cmp(b.name()));
        profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Codec the profile refers to. `None` for "auto" and unresolved codecs.
    pub fn get_codec(&self, profile: &CodecProfile, codecs: &CodecRegistry) -> Option<Arc<Codec>> {
        if profile.base().is_auto() {
            return None;
        }
        codecs.find(profile.codec_name())
    }

    /// Validate, persist and publish a profile, replacing any profile of the same name.
    pub fn save(&self, mut profile: CodecProfile, codecs: &CodecRegistry) -> Result<Arc<CodecProfile>, ProfileError> {
        normalize(&mut profile, codecs);
        validate_profile(&profile, codecs).map_err(|errors| ProfileError::Validation {
            profile: profile.name().to_string(),
            errors,
        })?;
        // case-insensitive filesystems would fold both records into one file
        if let Some(other) = self.case_twin(profile.name()) {
            return Err(ProfileError::Validation {
                profile: profile.name().to_string(),
                errors: vec![FieldError::new(
                    "name",
                    format!("differs from existing profile '{}' only in case", other),
                )],
            });
        }

        self.store.write(&profile)?;
        let profile = Arc::new(profile);
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.name().to_string(), Arc::clone(&profile));
        tracing::debug!(profile = profile.name(), "profile saved");
        Ok(profile)
    }

    /// Another loaded profile whose name equals `name` ignoring case.
    fn case_twin(&self, name: &str) -> Option<String> {
        let folded = name.to_lowercase();
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .find(|k| k.as_str() != name && k.to_lowercase() == folded)
            .cloned()
    }

    /// Unlink a profile, optionally erasing its stored record.
    pub fn remove(&self, name: &str, delete_persisted: bool) -> Result<Arc<CodecProfile>, ProfileError> {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        if !profiles.contains_key(name) {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        if delete_persisted {
            self.store.delete(name)?;
        }
        let removed = profiles
            .remove(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;
        tracing::debug!(profile = name, delete_persisted, "profile removed");
        Ok(removed)
    }

    /// Clear the table. Stored records are kept.
    pub fn remove_all(&self) {
        self.profiles.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Attach or drop the VA-API extension and refresh its probe-owned bits.
fn normalize(profile: &mut CodecProfile, codecs: &CodecRegistry) {
    profile.normalize_extension();
    if let CodecProfile::Video(video) = profile {
        if let Some(ext) = video.vaapi.as_mut() {
            let features = codecs
                .find(&video.base.codec_name)
                .map(|c| c.descriptor.hw_features)
                .unwrap_or_default();
            ext.apply_probe(features);
        }
    }
}
