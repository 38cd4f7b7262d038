//! Built-in list of codecs the registry tries to register.

use super::{HwVendor, MediaKind};

/// One codec the registry knows how to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSpec {
    pub name: &'static str,
    pub kind: MediaKind,
    pub vendor: Option<HwVendor>,
}

const fn sw(name: &'static str, kind: MediaKind) -> CodecSpec {
    CodecSpec {
        name,
        kind,
        vendor: None,
    }
}

const fn hw(name: &'static str, vendor: HwVendor) -> CodecSpec {
    CodecSpec {
        name,
        kind: MediaKind::Video,
        vendor: Some(vendor),
    }
}

/// Software codecs first, then hardware variants grouped per vendor.
pub const CATALOGUE: &[CodecSpec] = &[
    // video
    sw("mpeg2video", MediaKind::Video),
    sw("libx264", MediaKind::Video),
    sw("libx265", MediaKind::Video),
    sw("libvpx", MediaKind::Video),
    sw("libvpx-vp9", MediaKind::Video),
    sw("libtheora", MediaKind::Video),
    // audio
    sw("aac", MediaKind::Audio),
    sw("libfdk_aac", MediaKind::Audio),
    sw("libopus", MediaKind::Audio),
    sw("libvorbis", MediaKind::Audio),
    sw("mp2", MediaKind::Audio),
    sw("ac3", MediaKind::Audio),
    sw("flac", MediaKind::Audio),
    // VA-API
    hw("h264_vaapi", HwVendor::Vaapi),
    hw("hevc_vaapi", HwVendor::Vaapi),
    hw("vp8_vaapi", HwVendor::Vaapi),
    hw("vp9_vaapi", HwVendor::Vaapi),
    hw("mpeg2_vaapi", HwVendor::Vaapi),
    // NVENC
    hw("h264_nvenc", HwVendor::Nvenc),
    hw("hevc_nvenc", HwVendor::Nvenc),
    // MMAL / OMX
    hw("h264_omx", HwVendor::Mmal),
];

/// VA-API profile name prefix the probe looks for in `vainfo` output.
pub fn va_profile_prefix(codec: &str) -> Option<&'static str> {
    match codec {
        "h264_vaapi" => Some("VAProfileH264"),
        "hevc_vaapi" => Some("VAProfileHEVC"),
        "vp8_vaapi" => Some("VAProfileVP8"),
        "vp9_vaapi" => Some("VAProfileVP9"),
        "mpeg2_vaapi" => Some("VAProfileMPEG2"),
        "mjpeg_vaapi" => Some("VAProfileJPEG"),
        "av1_vaapi" => Some("VAProfileAV1"),
        _ => None,
    }
}

/// Codec profile ids as the codec library numbers them.
pub mod profile_ids {
    // audio: aac
    pub const AAC_MAIN: i32 = 0;
    pub const AAC_LOW: i32 = 1;
    pub const AAC_LTP: i32 = 3;
    pub const MPEG2_AAC_LOW: i32 = 128;
    // video: vp9
    pub const VP9_0: i32 = 0;
    pub const VP9_1: i32 = 1;
    pub const VP9_2: i32 = 2;
    pub const VP9_3: i32 = 3;
    // video: hevc
    pub const HEVC_MAIN: i32 = 1;
    pub const HEVC_MAIN_10: i32 = 2;
    pub const HEVC_REXT: i32 = 4;
    // video: h264
    pub const H264_BASELINE: i32 = 66;
    pub const H264_CONSTRAINED_BASELINE: i32 = 66 | (1 << 9);
    pub const H264_MAIN: i32 = 77;
    pub const H264_HIGH: i32 = 100;
    pub const H264_HIGH_10: i32 = 110;
    pub const H264_HIGH_422: i32 = 122;
    pub const H264_HIGH_444: i32 = 144;
    // video: mpeg2
    pub const MPEG2_MAIN: i32 = 4;
    pub const MPEG2_SIMPLE: i32 = 5;
}

/// Profiles advertised for a codec family, used when the library does not list them.
pub fn default_profiles(codec: &str) -> Vec<(i32, String)> {
    use profile_ids::*;

    let table: &[(i32, &str)] = match codec {
        "libx264" | "h264_vaapi" | "h264_nvenc" | "h264_omx" => &[
            (H264_BASELINE, "Baseline"),
            (H264_CONSTRAINED_BASELINE, "Constrained Baseline"),
            (H264_MAIN, "Main"),
            (H264_HIGH, "High"),
            (H264_HIGH_10, "High 10"),
            (H264_HIGH_422, "High 4:2:2"),
            (H264_HIGH_444, "High 4:4:4"),
        ],
        "libx265" | "hevc_vaapi" | "hevc_nvenc" => &[
            (HEVC_MAIN, "Main"),
            (HEVC_MAIN_10, "Main 10"),
            (HEVC_REXT, "Rext"),
        ],
        "libvpx-vp9" | "vp9_vaapi" => &[
            (VP9_0, "Profile 0"),
            (VP9_1, "Profile 1"),
            (VP9_2, "Profile 2"),
            (VP9_3, "Profile 3"),
        ],
        "mpeg2video" | "mpeg2_vaapi" => &[(MPEG2_MAIN, "Main"), (MPEG2_SIMPLE, "Simple")],
        "aac" | "libfdk_aac" => &[
            (AAC_MAIN, "Main"),
            (AAC_LOW, "LC"),
            (AAC_LTP, "LTP"),
            (MPEG2_AAC_LOW, "MPEG-2 LC"),
        ],
        _ => &[],
    };

    table.iter().map(|(id, name)| (*id, name.to_string())).collect()
}
