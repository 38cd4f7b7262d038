#![allow(dead_code)] // Not every test module needs every fixture

use codecprof::engine::codec::layout::{MONO, STEREO, SURROUND_5_1};
use codecprof::engine::codec::{CATALOGUE, HwFeatures, HwVendor};
use codecprof::engine::error::ProbeError;
use codecprof::engine::profile::VaapiExtension;
use codecprof::engine::{
    CodecProfile, CodecRegistry, DerivationEngine, HardwareProbe, JsonDirStore, LibCodec, ProfileRegistry,
    RegisterOptions, StaticLibrary,
};
use std::path::Path;
use std::sync::Arc;

/// Probe that reports the same features for every hardware encoder
pub struct FixedProbe(pub HwFeatures);

impl HardwareProbe for FixedProbe {
    fn features(&self, _codec: &str, _vendor: HwVendor) -> Result<HwFeatures, ProbeError> {
        Ok(self.0)
    }
}

/// Probe for a host without any GPU
pub struct NoDeviceProbe;

impl HardwareProbe for NoDeviceProbe {
    fn features(&self, _codec: &str, _vendor: HwVendor) -> Result<HwFeatures, ProbeError> {
        Err(ProbeError::NoDevice)
    }
}

/// A handful of software and VA-API encoders, the rest of the catalogue unresolved
pub fn test_library() -> StaticLibrary {
    StaticLibrary::new()
        .with(
            LibCodec::video("libx264", &["yuv420p", "yuv422p", "nv12"])
                .with_long_name("libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10"),
        )
        .with(LibCodec::video("mpeg2video", &["yuv420p", "yuv422p"]))
        .with(
            LibCodec::audio("aac", &["fltp"], &[96000, 48000, 44100], &[MONO, STEREO, SURROUND_5_1])
                .with_long_name("AAC (Advanced Audio Coding)"),
        )
        .with(LibCodec::audio("flac", &["s16", "s32"], &[], &[]))
        .with(LibCodec::video("h264_vaapi", &["vaapi"]))
        .with(LibCodec::video("hevc_vaapi", &["vaapi"]))
        .with(LibCodec::video("vp9_vaapi", &["vaapi"]))
}

/// Hardware with both encode entry points and post-processing
pub fn full_hw() -> FixedProbe {
    FixedProbe(HwFeatures::ENCODE | HwFeatures::ENCODE_LOW_POWER | HwFeatures::VIDEO_PROC | HwFeatures::DECODE)
}

pub fn registry_with(library: &StaticLibrary, probe: &dyn HardwareProbe) -> CodecRegistry {
    let registry = CodecRegistry::new();
    registry
        .register_with(CATALOGUE, library, probe, RegisterOptions::default())
        .unwrap();
    registry
}

pub fn test_registry() -> CodecRegistry {
    registry_with(&test_library(), &full_hw())
}

pub fn test_engine() -> DerivationEngine {
    DerivationEngine::new(Arc::new(test_library()))
}

pub fn profile_registry(dir: &Path) -> ProfileRegistry {
    ProfileRegistry::new(JsonDirStore::new(dir))
}

/// Video profile for a VA-API encoder with its extension attached and edited
pub fn vaapi_profile(name: &str, codec: &str, edit: impl FnOnce(&mut VaapiExtension)) -> CodecProfile {
    let mut profile = CodecProfile::video(name, codec);
    profile.normalize_extension();
    if let CodecProfile::Video(video) = &mut profile {
        if let Some(ext) = video.vaapi.as_mut() {
            edit(ext);
        }
    }
    profile
}

/// Video profile with its video fields edited
pub fn video_profile(name: &str, codec: &str, edit: impl FnOnce(&mut codecprof::engine::profile::VideoProfile)) -> CodecProfile {
    let mut profile = CodecProfile::video(name, codec);
    if let CodecProfile::Video(video) = &mut profile {
        edit(video);
    }
    profile
}
