//! Codec capability descriptors.
//!
//! A [`Codec`] pairs the immutable [`CapabilityDescriptor`] built at registration
//! time with the opaque [`LibCodec`] handle the external library returned for it.

pub mod catalogue;
pub mod layout;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::library::LibCodec;
pub use catalogue::{CATALOGUE, CodecSpec, profile_ids};
pub use layout::ChannelLayout;

/// Sentinel accepted wherever a codec name is expected: let the pipeline choose.
pub const AUTO_STR: &str = "auto";

/// Unset pixel/sample format override.
pub const FMT_NONE: &str = "none";

/// Unknown / unset codec profile id.
pub const PROFILE_UNKNOWN: i32 = -99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware acceleration vendors a codec can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HwVendor {
    Vaapi,
    Nvenc,
    Mmal,
}

impl HwVendor {
    pub const ALL: [HwVendor; 3] = [HwVendor::Vaapi, HwVendor::Nvenc, HwVendor::Mmal];

    /// Whether this vendor's branch was compiled in.
    pub fn compiled_in(&self) -> bool {
        match self {
            Self::Vaapi => cfg!(feature = "vaapi"),
            Self::Nvenc => cfg!(feature = "nvenc"),
            Self::Mmal => cfg!(feature = "mmal"),
        }
    }

    /// Vendor implied by an encoder name, independent of what is registered.
    pub fn from_codec_name(name: &str) -> Option<Self> {
        if name.ends_with("_vaapi") {
            Some(Self::Vaapi)
        } else if name.ends_with("_nvenc") {
            Some(Self::Nvenc)
        } else if name.ends_with("_omx") || name.ends_with("_mmal") {
            Some(Self::Mmal)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vaapi => "vaapi",
            Self::Nvenc => "nvenc",
            Self::Mmal => "mmal",
        }
    }
}

bitflags! {
    /// Hardware features found by the device probe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HwFeatures: u32 {
        /// Regular encode entry point (VAEntrypointEncSlice)
        const ENCODE = 1 << 0;
        /// Low-power encode entry point (VAEntrypointEncSliceLP)
        const ENCODE_LOW_POWER = 1 << 1;
        /// Post-processing (deinterlace, denoise, sharpness)
        const VIDEO_PROC = 1 << 2;
        const DECODE = 1 << 3;
    }
}

impl HwFeatures {
    pub fn can_encode(&self) -> bool {
        self.intersects(Self::ENCODE | Self::ENCODE_LOW_POWER)
    }
}

/// Static description of what a codec supports and whether it is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub title: String,
    pub kind: MediaKind,
    pub vendor: Option<HwVendor>,
    pub pix_fmts: Vec<String>,
    pub sample_fmts: Vec<String>,
    pub sample_rates: Vec<u32>,
    pub channel_layouts: Vec<ChannelLayout>,
    pub profiles: Vec<(i32, String)>,
    pub hw_features: HwFeatures,
    pub enabled: bool,
}

impl CapabilityDescriptor {
    /// Build a descriptor from a resolved library handle.
    pub fn from_handle(handle: &LibCodec, vendor: Option<HwVendor>, hw_features: HwFeatures, enabled: bool) -> Self {
        Self {
            name: handle.name.clone(),
            title: codec_title(handle).to_string(),
            kind: handle.kind,
            vendor,
            pix_fmts: handle.pix_fmts.clone(),
            sample_fmts: handle.sample_fmts.clone(),
            sample_rates: handle.sample_rates.clone(),
            channel_layouts: handle.channel_layouts.clone(),
            profiles: handle.profiles.clone(),
            hw_features,
            enabled,
        }
    }

    /// Descriptor for a catalogue entry the library could not resolve.
    pub fn unresolved(spec: &CodecSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            title: spec.name.to_string(),
            kind: spec.kind,
            vendor: spec.vendor,
            pix_fmts: Vec::new(),
            sample_fmts: Vec::new(),
            sample_rates: Vec::new(),
            channel_layouts: Vec::new(),
            profiles: Vec::new(),
            hw_features: HwFeatures::empty(),
            enabled: false,
        }
    }

    pub fn is_hardware(&self) -> bool {
        self.vendor.is_some()
    }
}

/// A registered codec: descriptor plus library handle.
#[derive(Debug, Clone)]
pub struct Codec {
    pub descriptor: CapabilityDescriptor,
    pub handle: Option<LibCodec>,
}

impl Codec {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn title(&self) -> &str {
        &self.descriptor.title
    }

    pub fn kind(&self) -> MediaKind {
        self.descriptor.kind
    }

    pub fn vendor(&self) -> Option<HwVendor> {
        self.descriptor.vendor
    }

    pub fn is_enabled(&self) -> bool {
        self.descriptor.enabled && self.handle.is_some()
    }
}

/// Human-readable title: the library long name, or the short name when none is registered.
pub fn codec_title(handle: &LibCodec) -> &str {
    match handle.long_name.as_deref() {
        Some(long) if !long.is_empty() => long,
        _ => &handle.name,
    }
}
