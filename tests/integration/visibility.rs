// Field visibility, capability lists and save-time validation

use codecprof::engine::visibility::{
    CapabilityAttr, ListEntry, get_attr_opts, get_list_channel_layouts, get_list_pix_fmts, get_list_profiles,
    get_list_sample_rates, list_rc_modes, list_scaling_modes, validate_profile,
};
use codecprof::engine::{CodecProfile, OptionSet, get_opts};
use proptest::prelude::*;

use crate::common::helpers::*;

#[test]
fn pix_fmt_list_follows_descriptor_order() {
    let registry = test_registry();
    let x264 = registry.find("libx264").unwrap();
    let list = get_list_pix_fmts(Some(&*x264)).unwrap();
    let keys: Vec<_> = list.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["auto", "yuv420p", "yuv422p", "nv12"]);
    assert_eq!(list[0], ListEntry::str("auto", "none"));
}

#[test]
fn audio_lists() {
    let registry = test_registry();
    let aac = registry.find("aac").unwrap();

    let layouts = get_list_channel_layouts(Some(&*aac)).unwrap();
    assert_eq!(layouts[1], ListEntry::int("mono", 0x4));
    assert_eq!(layouts[3], ListEntry::int("5.1(side)", 0x60F));

    let profiles = get_list_profiles(Some(&*aac)).unwrap();
    assert_eq!(profiles[0], ListEntry::int("auto", -99));
    assert_eq!(profiles[2], ListEntry::int("LC", 1));

    // flac lists no sample rates
    let flac = registry.find("flac").unwrap();
    assert!(get_list_sample_rates(Some(&*flac)).is_none());
    assert!(get_opts(Some(&*flac), OptionSet::AUDIO).contains(OptionSet::SAMPLE_FMT));
    assert!(!get_opts(Some(&*flac), OptionSet::AUDIO).contains(OptionSet::SAMPLE_RATE));
}

#[test]
fn disabled_codec_yields_no_lists() {
    let registry = test_registry();
    let x265 = registry.find("libx265").unwrap();
    assert!(get_list_pix_fmts(Some(&*x265)).is_none());
    assert!(get_list_profiles(Some(&*x265)).is_none());
    assert!(get_attr_opts(Some(&*x265), CapabilityAttr::Profiles, OptionSet::PROFILE).is_empty());
}

#[test]
fn enumerations_for_uis() {
    let modes = list_scaling_modes();
    assert_eq!(modes.len(), 3);
    assert_eq!(modes[2], ListEntry::int("Scale down only", 2));
    assert_eq!(list_rc_modes()[0].key, "auto");
}

#[test]
fn validation_accepts_auto_and_rejects_disabled() {
    let registry = test_registry();
    let auto = CodecProfile::video("Auto", "auto");
    assert!(validate_profile(&auto, &registry).is_ok());

    let x265 = CodecProfile::video("HEVC", "libx265");
    let errors = validate_profile(&x265, &registry).unwrap_err();
    assert_eq!(errors[0].field, "codec");

    let wrong_kind = CodecProfile::audio("Wrong", "libx264");
    assert!(validate_profile(&wrong_kind, &registry).is_err());
}

#[test]
fn validation_reports_hidden_fields() {
    let registry = test_registry();
    let mut flac = CodecProfile::audio("Lossless", "flac");
    if let CodecProfile::Audio(audio) = &mut flac {
        audio.sample_rate = 48000;
        audio.sample_fmt = "s32".to_string();
    }
    let errors = validate_profile(&flac, &registry).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["sample_rate"]);
}

#[test]
fn validation_checks_override_values() {
    let registry = test_registry();
    let profile = video_profile("Odd", "libx264", |v| v.pix_fmt = "rgb24".to_string());
    let errors = validate_profile(&profile, &registry).unwrap_err();
    assert_eq!(errors[0].field, "pix_fmt");
}

#[test]
#[cfg(feature = "vaapi")]
fn vaapi_fields_are_codec_specific() {
    let registry = test_registry();
    let h264 = registry.find("h264_vaapi").unwrap();
    let vp9 = registry.find("vp9_vaapi").unwrap();
    assert!(!get_opts(Some(&*h264), OptionSet::VAAPI).contains(OptionSet::SUPER_FRAME));
    assert!(get_opts(Some(&*vp9), OptionSet::VAAPI).contains(OptionSet::SUPER_FRAME | OptionSet::LOOP_FILTER_LEVEL));

    let tiered = vaapi_profile("Tiered", "h264_vaapi", |ext| ext.tier = 1);
    let errors = validate_profile(&tiered, &registry).unwrap_err();
    assert_eq!(errors[0].field, "tier");
}

proptest! {
    #[test]
    fn no_codec_is_identity(bits in any::<u64>()) {
        let requested = OptionSet::from_bits_truncate(bits);
        prop_assert_eq!(get_opts(None, requested), requested);
    }

    #[test]
    fn visible_is_subset_and_empty_when_disabled(bits in any::<u64>()) {
        let requested = OptionSet::from_bits_truncate(bits);
        let registry = test_registry();
        for codec in registry.list() {
            let visible = get_opts(Some(&*codec), requested);
            prop_assert!(requested.contains(visible));
            if !registry.is_enabled(codec.name()) {
                prop_assert!(visible.is_empty());
            }
        }
    }
}
