//! Encoding profiles.
//!
//! A profile is a base record plus an optional video or audio specialization.
//! Video profiles bound to a VA-API encoder additionally carry a
//! [`VaapiExtension`]. Persisted records are tagged with `class` so the
//! concrete type can be rebuilt on load.

pub mod audio;
pub mod registry;
pub mod store;
pub mod vaapi;
pub mod video;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::codec::{AUTO_STR, HwVendor, MediaKind, PROFILE_UNKNOWN};
use super::visibility::OptionSet;
pub use audio::AudioProfile;
pub use registry::{LoadReport, ProfileRegistry};
pub use store::{JsonDirStore, ProfileStore};
pub use vaapi::VaapiExtension;
pub use video::VideoProfile;

fn default_codec_name() -> String {
    AUTO_STR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_profile_id() -> i32 {
    PROFILE_UNKNOWN
}

/// Fields shared by every profile class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseProfile {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Encoder name, or "auto"
    #[serde(default = "default_codec_name")]
    pub codec_name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// kbps, 0 = unset
    #[serde(default)]
    pub bit_rate: f64,
    /// Global quality for codecs driven by qscale, 0 = unset
    #[serde(default)]
    pub qscale: u32,
    /// Codec profile id, -99 = unset
    #[serde(default = "default_profile_id")]
    pub profile: i32,
}

impl BaseProfile {
    pub fn new(name: &str, codec_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            codec_name: codec_name.to_string(),
            enabled: true,
            bit_rate: 0.0,
            qscale: 0,
            profile: PROFILE_UNKNOWN,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.codec_name == AUTO_STR
    }

    /// Fields holding a non-sentinel value.
    pub fn populated(&self) -> OptionSet {
        let mut set = OptionSet::NAME | OptionSet::CODEC | OptionSet::ENABLED;
        set.set(OptionSet::DESCRIPTION, !self.description.is_empty());
        set.set(OptionSet::BIT_RATE, self.bit_rate > 0.0);
        set.set(OptionSet::QSCALE, self.qscale > 0);
        set.set(OptionSet::PROFILE, self.profile != PROFILE_UNKNOWN);
        set
    }
}

/// A profile, tagged by class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum CodecProfile {
    Base(BaseProfile),
    Video(VideoProfile),
    Audio(AudioProfile),
}

impl CodecProfile {
    pub fn video(name: &str, codec_name: &str) -> Self {
        Self::Video(VideoProfile::new(BaseProfile::new(name, codec_name)))
    }

    pub fn audio(name: &str, codec_name: &str) -> Self {
        Self::Audio(AudioProfile::new(BaseProfile::new(name, codec_name)))
    }

    pub fn base(&self) -> &BaseProfile {
        match self {
            Self::Base(base) => base,
            Self::Video(video) => &video.base,
            Self::Audio(audio) => &audio.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseProfile {
        match self {
            Self::Base(base) => base,
            Self::Video(video) => &mut video.base,
            Self::Audio(audio) => &mut audio.base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn codec_name(&self) -> &str {
        &self.base().codec_name
    }

    /// Media kind the profile's codec must have. Base profiles accept either.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::Base(_) => None,
            Self::Video(_) => Some(MediaKind::Video),
            Self::Audio(_) => Some(MediaKind::Audio),
        }
    }

    pub fn class_str(&self) -> &'static str {
        match self {
            Self::Base(_) => "base",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
        }
    }

    pub fn as_video(&self) -> Option<&VideoProfile> {
        match self {
            Self::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioProfile> {
        match self {
            Self::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn set_codec(&mut self, codec_name: &str) {
        self.base_mut().codec_name = codec_name.to_string();
    }

    pub fn set_bit_rate(&mut self, kbps: f64) {
        self.base_mut().bit_rate = kbps.max(0.0);
    }

    /// Attach or drop the VA-API extension to match the codec name.
    pub fn normalize_extension(&mut self) {
        if let Self::Video(video) = self {
            let is_vaapi = HwVendor::from_codec_name(&video.base.codec_name) == Some(HwVendor::Vaapi);
            match (is_vaapi, video.vaapi.is_some()) {
                (true, false) => video.vaapi = Some(VaapiExtension::default()),
                (false, true) => video.vaapi = None,
                _ => {}
            }
        }
    }

    /// Fields holding a non-sentinel value.
    pub fn populated(&self) -> OptionSet {
        match self {
            Self::Base(base) => base.populated(),
            Self::Video(video) => video.populated(),
            Self::Audio(audio) => audio.populated(),
        }
    }
}

/// An enumerated profile setting with a stable numeric value for UIs.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn value(&self) -> i32;

    fn from_value(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.value() == value)
    }
}
