//! Which profile fields a codec can act on.
//!
//! Everything here is a pure function of the codec state and the requested
//! field set. The same queries drive UI field enumeration and save-time
//! validation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::codec::{AUTO_STR, Codec, FMT_NONE, HwVendor, MediaKind, PROFILE_UNKNOWN};
use super::error::FieldError;
use super::profile::vaapi::{BReference, Platform, VaapiDeintMode, VaapiRcMode};
use super::profile::video::{DeintAuto, DeintRate, HwAccel, ScalingMode};
use super::profile::{Choice, CodecProfile};
use super::registry::CodecRegistry;

bitflags! {
    /// One bit per user-editable profile field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OptionSet: u64 {
        // base
        const NAME = 1 << 0;
        const DESCRIPTION = 1 << 1;
        const CODEC = 1 << 2;
        const ENABLED = 1 << 3;
        const BIT_RATE = 1 << 4;
        const QSCALE = 1 << 5;
        const PROFILE = 1 << 6;

        // video
        const DEINTERLACE = 1 << 8;
        const DEINT_FIELD_RATE = 1 << 9;
        const DEINT_AUTO = 1 << 10;
        const HEIGHT = 1 << 11;
        const SCALING_MODE = 1 << 12;
        const HWACCEL = 1 << 13;
        const HWACCEL_DETAILS = 1 << 14;
        const PIX_FMT = 1 << 15;
        const CRF = 1 << 16;
        const HW_DENOISE = 1 << 17;
        const HW_SHARPNESS = 1 << 18;
        const SIZE = 1 << 19;

        // vaapi
        const QP = 1 << 24;
        const QUALITY = 1 << 25;
        const GLOBAL_QUALITY = 1 << 26;
        const ASYNC_DEPTH = 1 << 27;
        const UI = 1 << 28;
        const UILP = 1 << 29;
        const B_REFERENCE = 1 << 30;
        const DESIRED_B_DEPTH = 1 << 31;
        const MAX_BIT_RATE = 1 << 32;
        const BIT_RATE_SCALE = 1 << 33;
        const PLATFORM = 1 << 34;
        const VAAPI_DEINT_MODE = 1 << 35;
        const LOOP_FILTER_LEVEL = 1 << 36;
        const LOOP_FILTER_SHARPNESS = 1 << 37;
        const BUFF_FACTOR = 1 << 38;
        const RC_MODE = 1 << 39;
        const TIER = 1 << 40;
        const LEVEL = 1 << 41;
        const QMIN = 1 << 42;
        const QMAX = 1 << 43;
        const SUPER_FRAME = 1 << 44;

        // audio
        const TRACKS = 1 << 48;
        const LANGUAGE1 = 1 << 49;
        const LANGUAGE2 = 1 << 50;
        const LANGUAGE3 = 1 << 51;
        const SAMPLE_FMT = 1 << 52;
        const SAMPLE_RATE = 1 << 53;
        const CHANNEL_LAYOUT = 1 << 54;
    }
}

impl OptionSet {
    pub const BASE: Self = Self::NAME
        .union(Self::DESCRIPTION)
        .union(Self::CODEC)
        .union(Self::ENABLED)
        .union(Self::BIT_RATE)
        .union(Self::QSCALE)
        .union(Self::PROFILE);

    /// Hardware post-processing filters
    pub const HW_FILTERS: Self = Self::HW_DENOISE.union(Self::HW_SHARPNESS);

    pub const VIDEO: Self = Self::DEINTERLACE
        .union(Self::DEINT_FIELD_RATE)
        .union(Self::DEINT_AUTO)
        .union(Self::HEIGHT)
        .union(Self::SCALING_MODE)
        .union(Self::HWACCEL)
        .union(Self::HWACCEL_DETAILS)
        .union(Self::PIX_FMT)
        .union(Self::CRF)
        .union(Self::HW_FILTERS)
        .union(Self::SIZE);

    pub const VAAPI: Self = Self::QP
        .union(Self::QUALITY)
        .union(Self::GLOBAL_QUALITY)
        .union(Self::ASYNC_DEPTH)
        .union(Self::UI)
        .union(Self::UILP)
        .union(Self::B_REFERENCE)
        .union(Self::DESIRED_B_DEPTH)
        .union(Self::MAX_BIT_RATE)
        .union(Self::BIT_RATE_SCALE)
        .union(Self::PLATFORM)
        .union(Self::VAAPI_DEINT_MODE)
        .union(Self::LOOP_FILTER_LEVEL)
        .union(Self::LOOP_FILTER_SHARPNESS)
        .union(Self::BUFF_FACTOR)
        .union(Self::RC_MODE)
        .union(Self::TIER)
        .union(Self::LEVEL)
        .union(Self::QMIN)
        .union(Self::QMAX)
        .union(Self::SUPER_FRAME);

    /// VA-API fields that only some encoders understand
    const VAAPI_CODEC_SPECIFIC: Self = Self::LOOP_FILTER_LEVEL
        .union(Self::LOOP_FILTER_SHARPNESS)
        .union(Self::TIER)
        .union(Self::SUPER_FRAME);

    pub const AUDIO: Self = Self::TRACKS
        .union(Self::LANGUAGE1)
        .union(Self::LANGUAGE2)
        .union(Self::LANGUAGE3)
        .union(Self::SAMPLE_FMT)
        .union(Self::SAMPLE_RATE)
        .union(Self::CHANNEL_LAYOUT);

    /// Lowercase field names, in bit order.
    pub fn field_names(&self) -> Vec<String> {
        self.iter_names().map(|(name, _)| name.to_lowercase()).collect()
    }
}

/// Fields `codec` can act on, before the enablement gate.
fn codec_fields(codec: &Codec) -> OptionSet {
    let desc = &codec.descriptor;
    let mut fields = OptionSet::BASE;
    if desc.profiles.is_empty() {
        fields.remove(OptionSet::PROFILE);
    }

    match desc.kind {
        MediaKind::Video => {
            fields |= OptionSet::VIDEO;
            if desc.pix_fmts.is_empty() {
                fields.remove(OptionSet::PIX_FMT);
            }
            if !desc.is_hardware() {
                fields.remove(OptionSet::HW_FILTERS);
            }
            if desc.vendor == Some(HwVendor::Vaapi) {
                fields |= OptionSet::VAAPI - OptionSet::VAAPI_CODEC_SPECIFIC;
                fields |= match desc.name.as_str() {
                    "vp8_vaapi" => OptionSet::LOOP_FILTER_LEVEL | OptionSet::LOOP_FILTER_SHARPNESS,
                    "vp9_vaapi" => {
                        OptionSet::LOOP_FILTER_LEVEL | OptionSet::LOOP_FILTER_SHARPNESS | OptionSet::SUPER_FRAME
                    }
                    "hevc_vaapi" => OptionSet::TIER,
                    _ => OptionSet::empty(),
                };
            }
        }
        MediaKind::Audio => {
            fields |= OptionSet::AUDIO;
            if desc.sample_fmts.is_empty() {
                fields.remove(OptionSet::SAMPLE_FMT);
            }
            if desc.sample_rates.is_empty() {
                fields.remove(OptionSet::SAMPLE_RATE);
            }
            if desc.channel_layouts.is_empty() {
                fields.remove(OptionSet::CHANNEL_LAYOUT);
            }
        }
    }
    fields
}

/// Visible subset of `requested`.
///
/// With no codec selected the request passes through unchanged. A disabled
/// codec exposes nothing.
pub fn get_opts(codec: Option<&Codec>, requested: OptionSet) -> OptionSet {
    match codec {
        None => requested,
        Some(c) if !c.is_enabled() => OptionSet::empty(),
        Some(c) => requested & codec_fields(c),
    }
}

/// A capability list carried by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityAttr {
    PixFmts,
    SampleFmts,
    SampleRates,
    ChannelLayouts,
    Profiles,
}

impl CapabilityAttr {
    /// Media kind the attribute belongs to. Profiles exist for both.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::PixFmts => Some(MediaKind::Video),
            Self::SampleFmts | Self::SampleRates | Self::ChannelLayouts => Some(MediaKind::Audio),
            Self::Profiles => None,
        }
    }

    fn is_populated(&self, codec: &Codec) -> bool {
        let desc = &codec.descriptor;
        match self {
            Self::PixFmts => !desc.pix_fmts.is_empty(),
            Self::SampleFmts => !desc.sample_fmts.is_empty(),
            Self::SampleRates => !desc.sample_rates.is_empty(),
            Self::ChannelLayouts => !desc.channel_layouts.is_empty(),
            Self::Profiles => !desc.profiles.is_empty(),
        }
    }
}

/// Whether `codec` is enabled, has the attribute's kind and lists at least one value.
fn attr_available(codec: &Codec, attr: CapabilityAttr) -> bool {
    codec.is_enabled() && attr.kind().is_none_or(|k| k == codec.kind()) && attr.is_populated(codec)
}

/// [`get_opts`] further gated on `attr` being populated for `codec`.
pub fn get_attr_opts(codec: Option<&Codec>, attr: CapabilityAttr, requested: OptionSet) -> OptionSet {
    match codec {
        None => requested,
        Some(c) if attr_available(c, attr) => get_opts(Some(c), requested),
        Some(_) => OptionSet::empty(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListValue {
    Str(String),
    Int(i64),
}

/// One enumerable choice as presented to a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub key: String,
    pub value: ListValue,
}

impl ListEntry {
    pub fn str(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: ListValue::Str(value.to_string()),
        }
    }

    pub fn int(key: &str, value: i64) -> Self {
        Self {
            key: key.to_string(),
            value: ListValue::Int(value),
        }
    }
}

fn codec_list(
    codec: Option<&Codec>,
    attr: CapabilityAttr,
    auto: ListEntry,
    entries: impl FnOnce(&Codec) -> Vec<ListEntry>,
) -> Option<Vec<ListEntry>> {
    let codec = codec.filter(|c| attr_available(c, attr))?;
    let mut list = vec![auto];
    list.extend(entries(codec));
    Some(list)
}

/// Pixel formats in descriptor order, after an "auto" entry.
pub fn get_list_pix_fmts(codec: Option<&Codec>) -> Option<Vec<ListEntry>> {
    codec_list(codec, CapabilityAttr::PixFmts, ListEntry::str(AUTO_STR, FMT_NONE), |c| {
        c.descriptor.pix_fmts.iter().map(|f| ListEntry::str(f, f)).collect()
    })
}

pub fn get_list_sample_fmts(codec: Option<&Codec>) -> Option<Vec<ListEntry>> {
    codec_list(codec, CapabilityAttr::SampleFmts, ListEntry::str(AUTO_STR, FMT_NONE), |c| {
        c.descriptor.sample_fmts.iter().map(|f| ListEntry::str(f, f)).collect()
    })
}

pub fn get_list_sample_rates(codec: Option<&Codec>) -> Option<Vec<ListEntry>> {
    codec_list(codec, CapabilityAttr::SampleRates, ListEntry::int(AUTO_STR, 0), |c| {
        c.descriptor
            .sample_rates
            .iter()
            .map(|r| ListEntry::int(&r.to_string(), i64::from(*r)))
            .collect()
    })
}

pub fn get_list_channel_layouts(codec: Option<&Codec>) -> Option<Vec<ListEntry>> {
    codec_list(codec, CapabilityAttr::ChannelLayouts, ListEntry::int(AUTO_STR, 0), |c| {
        c.descriptor
            .channel_layouts
            .iter()
            .map(|l| ListEntry::int(&l.name, l.mask as i64))
            .collect()
    })
}

pub fn get_list_profiles(codec: Option<&Codec>) -> Option<Vec<ListEntry>> {
    codec_list(
        codec,
        CapabilityAttr::Profiles,
        ListEntry::int(AUTO_STR, i64::from(PROFILE_UNKNOWN)),
        |c| {
            c.descriptor
                .profiles
                .iter()
                .map(|(id, name)| ListEntry::int(name, i64::from(*id)))
                .collect()
        },
    )
}

/// Entries for a fixed set of choices.
pub fn list_choices<T: Choice>(choices: &[T]) -> Vec<ListEntry> {
    choices
        .iter()
        .map(|c| ListEntry::int(c.label(), i64::from(c.value())))
        .collect()
}

/// Decoder preferences whose vendor is compiled in.
pub fn list_hwaccels() -> Vec<ListEntry> {
    list_choices(&HwAccel::available())
}

pub fn list_scaling_modes() -> Vec<ListEntry> {
    list_choices(ScalingMode::ALL)
}

pub fn list_deint_rates() -> Vec<ListEntry> {
    list_choices(DeintRate::ALL)
}

pub fn list_deint_auto() -> Vec<ListEntry> {
    list_choices(DeintAuto::ALL)
}

pub fn list_b_reference() -> Vec<ListEntry> {
    list_choices(BReference::ALL)
}

pub fn list_platforms() -> Vec<ListEntry> {
    list_choices(Platform::ALL)
}

pub fn list_vaapi_deint_modes() -> Vec<ListEntry> {
    list_choices(VaapiDeintMode::ALL)
}

pub fn list_rc_modes() -> Vec<ListEntry> {
    list_choices(VaapiRcMode::ALL)
}

/// Save-time check: the codec must be usable for the profile's kind and every
/// populated field must be visible for it.
pub fn validate_profile(profile: &CodecProfile, codecs: &CodecRegistry) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let base = profile.base();

    if base.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }

    if !base.is_auto() {
        match codecs.find(&base.codec_name) {
            None => errors.push(FieldError::new("codec", format!("unknown codec '{}'", base.codec_name))),
            Some(codec) if !codec.is_enabled() => {
                errors.push(FieldError::new("codec", format!("codec '{}' is unavailable", base.codec_name)))
            }
            Some(codec) if profile.kind().is_some_and(|k| k != codec.kind()) => errors.push(FieldError::new(
                "codec",
                format!("codec '{}' is {}, profile is {}", base.codec_name, codec.kind(), profile.class_str()),
            )),
            Some(codec) => check_fields(profile, &codec, &mut errors),
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_fields(profile: &CodecProfile, codec: &Codec, errors: &mut Vec<FieldError>) {
    let populated = profile.populated();
    let hidden = populated - get_opts(Some(codec), populated);
    for name in hidden.field_names() {
        errors.push(FieldError::new(&name, format!("not supported by {}", codec.name())));
    }

    let desc = &codec.descriptor;
    let base = profile.base();
    if populated.contains(OptionSet::PROFILE) && !hidden.contains(OptionSet::PROFILE) {
        if !desc.profiles.iter().any(|(id, _)| *id == base.profile) {
            errors.push(FieldError::new("profile", format!("unknown profile id {}", base.profile)));
        }
    }

    match profile {
        CodecProfile::Video(video) if visible(populated, hidden, OptionSet::PIX_FMT) => {
            if !desc.pix_fmts.contains(&video.pix_fmt) {
                errors.push(FieldError::new("pix_fmt", format!("'{}' not supported", video.pix_fmt)));
            }
        }
        CodecProfile::Audio(audio) => {
            if visible(populated, hidden, OptionSet::SAMPLE_FMT) && !desc.sample_fmts.contains(&audio.sample_fmt) {
                errors.push(FieldError::new("sample_fmt", format!("'{}' not supported", audio.sample_fmt)));
            }
            if visible(populated, hidden, OptionSet::CHANNEL_LAYOUT)
                && !desc.channel_layouts.iter().any(|l| l.mask == audio.channel_layout)
            {
                errors.push(FieldError::new(
                    "channel_layout",
                    format!("layout {:#x} not supported", audio.channel_layout),
                ));
            }
        }
        _ => {}
    }
}

fn visible(populated: OptionSet, hidden: OptionSet, field: OptionSet) -> bool {
    populated.contains(field) && !hidden.contains(field)
}
