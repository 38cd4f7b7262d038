// Integration tests for profile save/load/remove workflows
//
// Profiles go through the registry into a temporary JSON directory and are
// read back by a fresh registry, the way a restart would.

use codecprof::engine::codec::layout::STEREO;
use codecprof::engine::profile::store::file_name;
use codecprof::engine::profile::video::{DeintRate, ScalingMode};
use codecprof::engine::profile::{JsonDirStore, ProfileStore};
use codecprof::engine::{CodecProfile, ProfileError};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::helpers::*;

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn video_profile_roundtrip_keeps_sentinels() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();

    let mut profile = video_profile("1080p Archive", "libx264", |v| {
        v.height = 1080;
        v.scaling_mode = ScalingMode::DownOnly;
        v.deinterlace = true;
        v.deinterlace_field_rate = DeintRate::Field;
        v.crf = 21;
    });
    profile.set_bit_rate(0.0);

    let saved = profile_registry(tmp.path()).save(profile, &codecs).unwrap();

    let reloaded = profile_registry(tmp.path());
    let report = reloaded.load_all(&codecs).unwrap();
    assert_eq!(report.loaded, vec!["1080p Archive".to_string()]);
    assert!(report.unresolved.is_empty());

    let loaded = reloaded.find("1080p Archive").unwrap();
    assert_eq!(*loaded, *saved);

    let video = loaded.as_video().unwrap();
    assert_eq!(video.pix_fmt, "none");
    assert_eq!(loaded.base().bit_rate, 0.0);
    assert_eq!(loaded.base().profile, -99);
    assert!(video.vaapi.is_none());
}

#[test]
fn audio_profile_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();

    let mut profile = CodecProfile::audio("Stereo AAC", "aac");
    profile.set_bit_rate(192.0);
    if let CodecProfile::Audio(audio) = &mut profile {
        audio.channel_layout = STEREO;
        audio.language1 = "eng".to_string();
    }
    let saved = profile_registry(tmp.path()).save(profile, &codecs).unwrap();

    let reloaded = profile_registry(tmp.path());
    reloaded.load_all(&codecs).unwrap();
    let loaded = reloaded.find("Stereo AAC").unwrap();
    assert_eq!(*loaded, *saved);
    let audio = loaded.as_audio().unwrap();
    assert_eq!(audio.sample_rate, 0);
    assert_eq!(audio.sample_fmt, "none");
    assert_eq!(audio.preferred_languages(), vec!["eng"]);
}

#[test]
#[cfg(feature = "vaapi")]
fn vaapi_extension_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let profile = vaapi_profile("HEVC HW", "hevc_vaapi", |ext| {
        ext.tier = 1;
        ext.max_bit_rate = 8000.0;
    });
    let saved = profile_registry(tmp.path()).save(profile, &codecs).unwrap();
    let ext = saved.as_video().unwrap().vaapi.as_ref().unwrap();
    assert!(ext.ui && ext.uilp);

    let reloaded = profile_registry(tmp.path());
    reloaded.load_all(&codecs).unwrap();
    let loaded = reloaded.find("HEVC HW").unwrap();
    assert_eq!(*loaded, *saved);
    let ext = loaded.as_video().unwrap().vaapi.as_ref().unwrap();
    assert_eq!(ext.qmin, -1);
    assert_eq!(ext.level, -99);
}

#[test]
fn software_profile_json_has_no_vaapi_section() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    profile_registry(tmp.path())
        .save(CodecProfile::video("Plain", "libx264"), &codecs)
        .unwrap();
    let json = std::fs::read_to_string(tmp.path().join(file_name("Plain"))).unwrap();
    assert!(json.contains("\"class\": \"video\""));
    assert!(!json.contains("vaapi"));
}

// ============================================================================
// Unresolved codecs
// ============================================================================

#[test]
fn profile_with_unknown_codec_survives_load() {
    let tmp = TempDir::new().unwrap();
    let store = JsonDirStore::new(tmp.path());
    store.write(&CodecProfile::video("QSV", "h264_qsv")).unwrap();
    store.write(&CodecProfile::video("Auto", "auto")).unwrap();

    let registry = profile_registry(tmp.path());
    let report = registry.load_all(&test_registry()).unwrap();
    assert_eq!(report.unresolved, vec!["QSV".to_string()]);
    assert_eq!(registry.len(), 2);
    assert!(registry.find("QSV").is_some());
    assert!(registry.get_codec(&registry.find("QSV").unwrap(), &test_registry()).is_none());
}

#[test]
#[cfg(feature = "vaapi")]
fn vaapi_profile_keeps_extension_when_gpu_is_gone() {
    let tmp = TempDir::new().unwrap();
    let profile = vaapi_profile("HW", "h264_vaapi", |ext| ext.qp = 24);
    profile_registry(tmp.path()).save(profile, &test_registry()).unwrap();

    let no_gpu = registry_with(&test_library(), &NoDeviceProbe);
    let registry = profile_registry(tmp.path());
    registry.load_all(&no_gpu).unwrap();
    let loaded = registry.find("HW").unwrap();
    let ext = loaded.as_video().unwrap().vaapi.as_ref().unwrap();
    assert_eq!(ext.qp, 24);
    assert!(!ext.ui && !ext.uilp);
}

// ============================================================================
// Removal and shared ownership
// ============================================================================

#[test]
fn remove_while_in_use() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let registry = profile_registry(tmp.path());
    registry
        .save(CodecProfile::audio("Radio", "aac"), &codecs)
        .unwrap();

    // a live stream holds the profile
    let in_use = registry.find("Radio").unwrap();
    let removed = registry.remove("Radio", true).unwrap();
    assert!(Arc::ptr_eq(&in_use, &removed));
    drop(removed);

    assert_eq!(Arc::strong_count(&in_use), 1);
    assert_eq!(in_use.codec_name(), "aac");
    assert!(!tmp.path().join(file_name("Radio")).exists());

    assert!(matches!(
        registry.remove("Radio", true),
        Err(ProfileError::NotFound(ref name)) if name == "Radio"
    ));
}

#[test]
fn remove_all_keeps_stored_records() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let registry = profile_registry(tmp.path());
    registry.save(CodecProfile::audio("A", "aac"), &codecs).unwrap();
    registry.save(CodecProfile::video("B", "libx264"), &codecs).unwrap();

    registry.remove_all();
    assert!(registry.is_empty());
    assert!(registry.find("A").is_none());

    let report = registry.load_all(&codecs).unwrap();
    assert_eq!(report.loaded.len(), 2);
    let names: Vec<_> = registry.list().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn save_replaces_but_old_holders_keep_their_copy() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let registry = profile_registry(tmp.path());

    let mut profile = CodecProfile::video("HD", "libx264");
    profile.set_bit_rate(4000.0);
    let first = registry.save(profile.clone(), &codecs).unwrap();

    profile.set_bit_rate(6000.0);
    registry.save(profile, &codecs).unwrap();

    assert_eq!(first.base().bit_rate, 4000.0);
    assert_eq!(registry.find("HD").unwrap().base().bit_rate, 6000.0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn save_rejects_disabled_codec_without_writing() {
    let tmp = TempDir::new().unwrap();
    let registry = profile_registry(tmp.path());
    let err = registry
        .save(CodecProfile::audio("Opus", "libopus"), &test_registry())
        .unwrap_err();
    assert!(matches!(err, ProfileError::Validation { .. }));
    assert!(err.to_string().contains("codec"));
    assert!(!tmp.path().join(file_name("Opus")).exists());
}

// ============================================================================
// Record naming
// ============================================================================

#[test]
fn similar_names_keep_separate_records() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let registry = profile_registry(tmp.path());
    registry.save(CodecProfile::video("My Profile", "libx264"), &codecs).unwrap();
    registry.save(CodecProfile::video("My_Profile", "mpeg2video"), &codecs).unwrap();

    let reloaded = profile_registry(tmp.path());
    let report = reloaded.load_all(&codecs).unwrap();
    assert_eq!(report.loaded.len(), 2);
    assert_eq!(reloaded.find("My Profile").unwrap().codec_name(), "libx264");
    assert_eq!(reloaded.find("My_Profile").unwrap().codec_name(), "mpeg2video");

    // erasing one record leaves the other on disk
    reloaded.remove("My_Profile", true).unwrap();
    let after = profile_registry(tmp.path());
    after.load_all(&codecs).unwrap();
    let names: Vec<_> = after.list().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["My Profile"]);
}

#[test]
fn names_differing_only_in_case_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let codecs = test_registry();
    let registry = profile_registry(tmp.path());
    registry.save(CodecProfile::video("HD", "libx264"), &codecs).unwrap();

    let err = registry
        .save(CodecProfile::video("hd", "mpeg2video"), &codecs)
        .unwrap_err();
    match err {
        ProfileError::Validation { errors, .. } => assert_eq!(errors[0].field, "name"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let reloaded = profile_registry(tmp.path());
    let report = reloaded.load_all(&codecs).unwrap();
    assert_eq!(report.loaded, vec!["HD".to_string()]);
    assert_eq!(reloaded.find("HD").unwrap().codec_name(), "libx264");
    assert!(reloaded.find("hd").is_none());

    // saving the same name again still replaces it
    registry.save(CodecProfile::video("HD", "mpeg2video"), &codecs).unwrap();
}

#[test]
fn profile_name_cannot_escape_the_store() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("profiles");
    let codecs = test_registry();
    let registry = profile_registry(&dir);
    registry.save(CodecProfile::video("../escaped", "libx264"), &codecs).unwrap();

    assert!(!tmp.path().join("escaped.json").exists());
    assert!(dir.join(file_name("../escaped")).exists());

    registry.remove("../escaped", true).unwrap();
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}
