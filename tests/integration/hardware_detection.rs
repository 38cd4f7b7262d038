// Render node discovery and vainfo parsing

use codecprof::engine::HwFeatures;
use codecprof::engine::hardware::{detect_render_device_in, parse_vainfo};
use std::fs::File;
use tempfile::TempDir;

const VAINFO: &str = "\
vainfo: VA-API version: 1.20 (libva 2.20.0)
vainfo: Driver version: Intel iHD driver for Intel(R) Gen Graphics - 24.1.0
vainfo: Supported profile and entrypoints
      VAProfileNone                   :	VAEntrypointVideoProc
      VAProfileH264Main               :	VAEntrypointVLD
      VAProfileH264Main               :	VAEntrypointEncSliceLP
      VAProfileH264High               :	VAEntrypointEncSliceLP
      VAProfileHEVCMain               :	VAEntrypointVLD
      VAProfileHEVCMain               :	VAEntrypointEncSlice
      VAProfileHEVCMain               :	VAEntrypointEncSliceLP
      VAProfileVP9Profile0            :	VAEntrypointVLD
";

#[test]
fn lowest_render_node_wins() {
    let tmp = TempDir::new().unwrap();
    for node in ["renderD129", "card0", "renderD128"] {
        File::create(tmp.path().join(node)).unwrap();
    }
    let device = detect_render_device_in(tmp.path()).unwrap();
    assert!(device.ends_with("renderD128"), "{}", device);
}

#[test]
fn no_render_node() {
    let tmp = TempDir::new().unwrap();
    File::create(tmp.path().join("card0")).unwrap();
    assert!(detect_render_device_in(tmp.path()).is_none());
    assert!(detect_render_device_in(&tmp.path().join("missing")).is_none());
}

#[test]
fn vainfo_entry_points_per_family() {
    let h264 = parse_vainfo(VAINFO, "VAProfileH264");
    assert_eq!(h264, HwFeatures::ENCODE_LOW_POWER | HwFeatures::DECODE | HwFeatures::VIDEO_PROC);
    assert!(h264.can_encode());

    let hevc = parse_vainfo(VAINFO, "VAProfileHEVC");
    assert!(hevc.contains(HwFeatures::ENCODE | HwFeatures::ENCODE_LOW_POWER));

    // decode only
    let vp9 = parse_vainfo(VAINFO, "VAProfileVP9");
    assert!(!vp9.can_encode());
    assert!(vp9.contains(HwFeatures::DECODE));
}

#[test]
fn vainfo_without_profiles() {
    assert!(parse_vainfo("", "VAProfileH264").is_empty());
    assert_eq!(parse_vainfo(VAINFO, ""), HwFeatures::VIDEO_PROC);
}
