//! Process-wide codec table.
//!
//! Registration builds a complete table off to the side and swaps it in under
//! the write lock, so lookups never observe a half-populated registry.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::codec::catalogue::default_profiles;
use super::codec::{CATALOGUE, CapabilityDescriptor, Codec, CodecSpec, HwFeatures, MediaKind};
use super::error::RegistryError;
use super::hardware::HardwareProbe;
use super::library::CodecLibrary;

/// Knobs for a registration pass.
#[derive(Debug, Clone, Copy)]
pub struct RegisterOptions {
    /// Run the hardware probe. When off, hardware codecs the library resolves
    /// are assumed usable.
    pub hw_probe: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self { hw_probe: true }
    }
}

/// Outcome of a registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterReport {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    /// Vendor codecs whose feature was not compiled in
    pub skipped: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: RwLock<BTreeMap<String, Arc<Codec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in codec.
    pub fn register_all(
        &self,
        library: &dyn CodecLibrary,
        probe: &dyn HardwareProbe,
        options: RegisterOptions,
    ) -> Result<RegisterReport, RegistryError> {
        self.register_with(CATALOGUE, library, probe, options)
    }

    /// Register the codecs in `catalogue`, replacing the current table.
    ///
    /// A duplicate name aborts the pass and leaves the current table untouched.
    pub fn register_with(
        &self,
        catalogue: &[CodecSpec],
        library: &dyn CodecLibrary,
        probe: &dyn HardwareProbe,
        options: RegisterOptions,
    ) -> Result<RegisterReport, RegistryError> {
        let mut table = BTreeMap::new();
        let mut report = RegisterReport::default();

        for spec in catalogue {
            if table.contains_key(spec.name) || report.skipped.iter().any(|s| s == spec.name) {
                tracing::error!(codec = spec.name, "duplicate codec registration");
                return Err(RegistryError::RegistrationConflict(spec.name.to_string()));
            }
            if let Some(vendor) = spec.vendor {
                if !vendor.compiled_in() {
                    tracing::debug!(codec = spec.name, vendor = vendor.as_str(), "vendor not compiled in");
                    report.skipped.push(spec.name.to_string());
                    continue;
                }
            }

            let codec = build_codec(spec, library, probe, options);
            if codec.is_enabled() {
                report.enabled.push(spec.name.to_string());
            } else {
                report.disabled.push(spec.name.to_string());
            }
            table.insert(spec.name.to_string(), Arc::new(codec));
        }

        tracing::info!(
            enabled = report.enabled.len(),
            disabled = report.disabled.len(),
            "codecs registered"
        );
        *self.codecs.write().unwrap_or_else(PoisonError::into_inner) = table;
        Ok(report)
    }

    pub fn find(&self, name: &str) -> Option<Arc<Codec>> {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.find(name).map(|c| c.is_enabled()).unwrap_or(false)
    }

    pub fn get_type(&self, name: &str) -> Option<MediaKind> {
        self.find(name).map(|c| c.kind())
    }

    pub fn get_type_string(&self, name: &str) -> Option<&'static str> {
        self.get_type(name).map(|k| k.as_str())
    }

    /// All codecs in name order.
    pub fn list(&self) -> Vec<Arc<Codec>> {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codecs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered codec. Outstanding `Arc<Codec>` holders keep theirs.
    pub fn forget_all(&self) {
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        if !codecs.is_empty() {
            tracing::debug!(count = codecs.len(), "forgetting codecs");
        }
        codecs.clear();
    }
}

fn build_codec(
    spec: &CodecSpec,
    library: &dyn CodecLibrary,
    probe: &dyn HardwareProbe,
    options: RegisterOptions,
) -> Codec {
    let Some(mut handle) = library.open(spec.name) else {
        tracing::debug!(codec = spec.name, "not provided by codec library");
        return Codec {
            descriptor: CapabilityDescriptor::unresolved(spec),
            handle: None,
        };
    };

    if handle.kind != spec.kind {
        tracing::warn!(
            codec = spec.name,
            expected = %spec.kind,
            actual = %handle.kind,
            "codec library reports a different media kind"
        );
        return Codec {
            descriptor: CapabilityDescriptor::unresolved(spec),
            handle: None,
        };
    }
    if handle.profiles.is_empty() {
        handle.profiles = default_profiles(spec.name);
    }

    let (features, enabled) = match spec.vendor {
        None => (HwFeatures::empty(), true),
        Some(_) if !options.hw_probe => (HwFeatures::ENCODE, true),
        Some(vendor) => match probe.features(spec.name, vendor) {
            Ok(features) => {
                tracing::debug!(codec = spec.name, ?features, "hardware probe");
                (features, features.can_encode())
            }
            Err(e) => {
                tracing::warn!(codec = spec.name, error = %e, "hardware probe failed, codec disabled");
                (HwFeatures::empty(), false)
            }
        },
    };

    Codec {
        descriptor: CapabilityDescriptor::from_handle(&handle, spec.vendor, features, enabled),
        handle: Some(handle),
    }
}
