// Encoder option derivation against a registered codec table

use codecprof::engine::codec::profile_ids::HEVC_MAIN;
use codecprof::engine::library::AVERROR_EINVAL;
use codecprof::engine::profile::vaapi::VaapiRcMode;
use codecprof::engine::{
    CodecProfile, CodecRegistry, DerivationEngine, LibCodec, LibraryError, ProfileError, QualityMode, StaticLibrary,
    StreamParams,
};
use proptest::prelude::*;
use std::sync::Arc;

use crate::common::helpers::*;

fn quality_keys(profile: &CodecProfile, mode: QualityMode) -> Vec<String> {
    let out = test_engine()
        .with_quality_mode(mode)
        .derive(profile, &test_registry(), &StreamParams::default())
        .unwrap();
    out.keys()
        .filter(|k| *k == "crf" || *k == "global_quality")
        .map(str::to_string)
        .collect()
}

#[test]
fn runtime_pix_fmt_is_used_when_profile_has_none() {
    let library = StaticLibrary::new().with(LibCodec::video("libx264", &["yuv420p", "yuv422p"]));
    let codecs = registry_with(&library, &NoDeviceProbe);
    let engine = DerivationEngine::new(Arc::new(library));
    let profile = CodecProfile::video("P", "libx264");

    let params = StreamParams {
        pix_fmt: Some("yuv420p".to_string()),
        ..StreamParams::default()
    };
    let out = engine.derive(&profile, &codecs, &params).unwrap();
    assert_eq!(out.get("pix_fmt"), Some("yuv420p"));

    let params = StreamParams {
        pix_fmt: Some("yuv422p".to_string()),
        ..StreamParams::default()
    };
    let out = engine.derive(&profile, &codecs, &params).unwrap();
    assert_eq!(out.get("pix_fmt"), Some("yuv422p"));

    // no runtime value: the codec's first format
    let out = engine.derive(&profile, &codecs, &StreamParams::default()).unwrap();
    assert_eq!(out.get("pix_fmt"), Some("yuv420p"));
}

#[test]
fn profile_pix_fmt_beats_runtime() {
    let profile = video_profile("P", "libx264", |v| v.pix_fmt = "nv12".to_string());
    let params = StreamParams {
        pix_fmt: Some("yuv420p".to_string()),
        ..StreamParams::default()
    };
    let out = test_engine().derive(&profile, &test_registry(), &params).unwrap();
    assert_eq!(out.get("pix_fmt"), Some("nv12"));
}

#[test]
fn bit_rate_is_scaled_to_bits() {
    let codecs = test_registry();
    let mut profile = CodecProfile::audio("Low", "aac");
    profile.set_bit_rate(5.0);
    let out = test_engine().derive(&profile, &codecs, &StreamParams::default()).unwrap();
    assert_eq!(out.get("b"), Some("5000"));

    profile.set_bit_rate(0.0);
    let out = test_engine().derive(&profile, &codecs, &StreamParams::default()).unwrap();
    assert!(!out.contains_key("b"));

    let params = StreamParams {
        default_bit_rate: Some(128.0),
        ..StreamParams::default()
    };
    let out = test_engine().derive(&profile, &codecs, &params).unwrap();
    assert_eq!(out.get("b"), Some("128000"));
}

#[test]
fn crf_and_global_quality_never_both_appear() {
    let profile = video_profile("Q", "libx264", |v| {
        v.crf = 23;
        v.base.qscale = 5;
    });
    assert_eq!(quality_keys(&profile, QualityMode::Crf), vec!["crf"]);
    assert_eq!(quality_keys(&profile, QualityMode::GlobalQuality), vec!["global_quality"]);

    let out = test_engine()
        .with_quality_mode(QualityMode::GlobalQuality)
        .derive(&profile, &test_registry(), &StreamParams::default())
        .unwrap();
    assert_eq!(out.get("global_quality"), Some("590"));
    assert_eq!(out.get("flags"), Some("+qscale"));
}

#[test]
fn per_call_quality_mode_overrides_engine() {
    let profile = video_profile("Q", "libx264", |v| {
        v.crf = 30;
        v.base.qscale = 3;
    });
    let params = StreamParams {
        quality_mode: Some(QualityMode::GlobalQuality),
        global_header: true,
        ..StreamParams::default()
    };
    let out = test_engine().derive(&profile, &test_registry(), &params).unwrap();
    assert!(!out.contains_key("crf"));
    assert_eq!(out.get("flags"), Some("+qscale+global_header"));
}

#[test]
fn require_meta_written_once() {
    let out = test_engine()
        .derive(&CodecProfile::video("M", "libx264"), &test_registry(), &StreamParams::default())
        .unwrap();
    assert_eq!(out.keys().filter(|k| *k == "require_meta").count(), 1);
    assert_eq!(out.get("require_meta"), Some("1"));

    let out = test_engine()
        .with_require_meta(false)
        .derive(&CodecProfile::video("M", "libx264"), &test_registry(), &StreamParams::default())
        .unwrap();
    assert!(!out.contains_key("require_meta"));
}

#[test]
fn unusable_codecs_fail_fast() {
    let codecs = test_registry();
    let engine = test_engine();
    let params = StreamParams::default();

    let err = engine.derive(&CodecProfile::video("X", "libx265"), &codecs, &params).unwrap_err();
    assert!(matches!(err, ProfileError::DisabledCodec(ref c) if c == "libx265"));

    let err = engine.derive(&CodecProfile::video("Q", "h264_qsv"), &codecs, &params).unwrap_err();
    assert!(matches!(err, ProfileError::NotFound(_)));

    let err = engine.derive(&CodecProfile::video("A", "aac"), &codecs, &params).unwrap_err();
    assert!(matches!(err, ProfileError::KindMismatch { .. }));

    codecs.forget_all();
    let err = engine.derive(&CodecProfile::video("P", "libx264"), &codecs, &params).unwrap_err();
    assert!(matches!(err, ProfileError::NotFound(_)));
}

#[test]
fn rejected_directive_aborts_derivation() {
    let library = test_library().rejecting("crf");
    let codecs = registry_with(&library, &full_hw());
    let engine = DerivationEngine::new(Arc::new(library));
    let profile = video_profile("Q", "libx264", |v| v.crf = 23);

    match engine.derive(&profile, &codecs, &StreamParams::default()) {
        Err(ProfileError::Derivation { key, cause }) => {
            assert_eq!(key, "crf");
            assert_eq!(cause, LibraryError::Code(AVERROR_EINVAL));
        }
        other => panic!("expected derivation error, got {:?}", other),
    }
}

#[test]
fn private_options_are_checked_against_the_codec() {
    let library = StaticLibrary::new().with(LibCodec::video("libx264", &["yuv420p"]).with_private_options(&["preset"]));
    let codecs: CodecRegistry = registry_with(&library, &NoDeviceProbe);
    let engine = DerivationEngine::new(Arc::new(library));
    let profile = video_profile("Q", "libx264", |v| v.crf = 23);

    let err = engine.derive(&profile, &codecs, &StreamParams::default()).unwrap_err();
    assert!(matches!(err, ProfileError::Derivation { ref key, .. } if key == "crf"));
}

#[test]
#[cfg(feature = "vaapi")]
fn vaapi_directive_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    let codecs = registry_with(
        &test_library(),
        &FixedProbe(codecprof::engine::HwFeatures::ENCODE_LOW_POWER | codecprof::engine::HwFeatures::VIDEO_PROC),
    );
    let mut profile = vaapi_profile("HEVC HW", "hevc_vaapi", |ext| {
        ext.rc_mode = VaapiRcMode::Vbr;
        ext.max_bit_rate = 6000.0;
        ext.buff_factor = 2.0;
        ext.tier = 1;
    });
    profile.set_bit_rate(3000.0);
    profile.base_mut().profile = HEVC_MAIN;
    let saved = profile_registry(tmp.path()).save(profile, &codecs).unwrap();

    let params = StreamParams {
        global_header: true,
        ..StreamParams::default()
    };
    let out = test_engine().derive(&saved, &codecs, &params).unwrap();
    insta::assert_snapshot!(out.to_string().trim_end(), @r"
    b=3000000
    rc_mode=VBR
    bf=0
    maxrate=6000000
    bufsize=12000000
    tier=1
    low_power=1
    profile=1
    pix_fmt=vaapi
    require_meta=1
    flags=+global_header
    ");
}

#[test]
#[cfg(feature = "vaapi")]
fn vp9_super_frame_adds_bitstream_filter() {
    let profile = vaapi_profile("VP9 HW", "vp9_vaapi", |ext| {
        ext.super_frame = true;
        ext.loop_filter_level = 16;
    });
    let out = test_engine()
        .derive(&profile, &test_registry(), &StreamParams::default())
        .unwrap();
    assert_eq!(out.get("bsf"), Some("vp9_superframe"));
    assert_eq!(out.get("loop_filter_level"), Some("16"));
    assert!(!out.contains_key("low_power"));
}

proptest! {
    #[test]
    fn derivation_is_deterministic(
        kbps in 0u32..20_000,
        crf in 0u32..52,
        qscale in 0u32..32,
        global in any::<bool>(),
        header in any::<bool>(),
    ) {
        let profile = video_profile("D", "libx264", |v| {
            v.crf = crf;
            v.base.qscale = qscale;
            v.base.bit_rate = kbps as f64;
        });
        let params = StreamParams {
            pix_fmt: Some("yuv422p".to_string()),
            global_header: header,
            quality_mode: Some(if global { QualityMode::GlobalQuality } else { QualityMode::Crf }),
            ..StreamParams::default()
        };
        let codecs = test_registry();
        let engine = test_engine();
        let first = engine.derive(&profile, &codecs, &params).unwrap();
        let second = engine.derive(&profile, &codecs, &params).unwrap();
        prop_assert_eq!(first.to_string(), second.to_string());

        let quality = first.keys().filter(|k| *k == "crf" || *k == "global_quality").count();
        prop_assert_eq!(quality, usize::from(crf > 0 || qscale > 0));
        if kbps > 0 {
            let expected_b = (kbps as u64 * 1000).to_string();
            prop_assert_eq!(first.get("b"), Some(expected_b.as_str()));
        } else {
            prop_assert!(!first.contains_key("b"));
        }
    }
}
