//! Translation of a profile into the directive list an encoder is opened with.
//!
//! Rules run in a fixed order: codec-specific (VA-API) first, then bit rate,
//! quality, codec profile, formats, and finally the pipeline flags. Every key
//! is written with [`WriteMode::DontOverwrite`], so an earlier, more specific
//! rule is never clobbered by a later generic one; only `flags` appends.

pub mod dict;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::codec::layout::{ChannelLayout, LayoutAbi};
use super::codec::{Codec, FMT_NONE, HwVendor, MediaKind, PROFILE_UNKNOWN};
use super::error::ProfileError;
use super::library::{CodecLibrary, LibCodec};
use super::profile::vaapi::{BReference, Platform, VaapiExtension, VaapiRcMode};
use super::profile::{AudioProfile, Choice, CodecProfile, VideoProfile};
use super::registry::CodecRegistry;
pub use dict::{Directive, Directives, OptionDict, WriteMode};

/// Quality-to-lambda scale the codec library applies to `global_quality`.
pub const FF_QP2LAMBDA: u32 = 118;

/// Which quality directive wins when a profile sets both CRF and global quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    #[default]
    Crf,
    GlobalQuality,
}

/// Live values from the stream being set up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamParams {
    /// Decoder output pixel format
    pub pix_fmt: Option<String>,
    pub sample_fmt: Option<String>,
    pub sample_rate: Option<u32>,
    /// Source speaker mask
    pub channel_layout: Option<u64>,
    /// kbps, used when the profile leaves the bit rate unset
    pub default_bit_rate: Option<f64>,
    /// Runtime average quality, used in global quality mode when the profile has none
    pub default_quality: Option<u32>,
    /// Output container wants out-of-band headers
    pub global_header: bool,
    /// Per-call override of the engine's quality mode
    pub quality_mode: Option<QualityMode>,
}

enum Quality {
    Crf(u32),
    Global(u32),
}

pub struct DerivationEngine {
    library: Arc<dyn CodecLibrary>,
    quality_mode: QualityMode,
    require_meta: bool,
}

impl DerivationEngine {
    pub fn new(library: Arc<dyn CodecLibrary>) -> Self {
        Self {
            library,
            quality_mode: QualityMode::default(),
            require_meta: true,
        }
    }

    pub fn with_quality_mode(mut self, mode: QualityMode) -> Self {
        self.quality_mode = mode;
        self
    }

    pub fn with_require_meta(mut self, require_meta: bool) -> Self {
        self.require_meta = require_meta;
        self
    }

    /// Directives for opening `profile`'s encoder.
    ///
    /// Fails before writing anything when the codec is unknown, disabled or of
    /// the wrong kind, and again afterwards if the codec went away meanwhile.
    pub fn derive(
        &self,
        profile: &CodecProfile,
        codecs: &CodecRegistry,
        params: &StreamParams,
    ) -> Result<Directives, ProfileError> {
        let name = profile.codec_name();
        let codec = codecs.find(name).ok_or_else(|| ProfileError::NotFound(name.to_string()))?;
        let directives = self.derive_for(profile, &codec, params)?;

        if !codecs.is_enabled(name) {
            tracing::warn!(codec = name, "codec became unavailable during derivation");
            return Err(ProfileError::DisabledCodec(name.to_string()));
        }
        Ok(directives)
    }

    /// Same as [`derive`](Self::derive) against an already resolved codec.
    pub fn derive_for(
        &self,
        profile: &CodecProfile,
        codec: &Codec,
        params: &StreamParams,
    ) -> Result<Directives, ProfileError> {
        let handle = self.check_codec(profile, codec)?;
        let mut dict = OptionDict::new(self.library.as_ref(), handle);
        let base = profile.base();

        if let CodecProfile::Video(video) = profile {
            if codec.vendor() == Some(HwVendor::Vaapi) {
                if let Some(ext) = &video.vaapi {
                    vaapi_directives(&mut dict, codec.name(), base.bit_rate, ext)?;
                }
            }
        }

        let kbps = Some(base.bit_rate)
            .filter(|b| *b > 0.0)
            .or(params.default_bit_rate.filter(|b| *b > 0.0));
        if let Some(kbps) = kbps {
            dict.set("b", bits_per_second(kbps), WriteMode::DontOverwrite)?;
        }

        match self.quality(profile, params) {
            Some(Quality::Crf(crf)) => dict.set("crf", crf, WriteMode::DontOverwrite)?,
            Some(Quality::Global(q)) => {
                dict.set("flags", "+qscale", WriteMode::Append)?;
                dict.set("global_quality", global_quality(q), WriteMode::DontOverwrite)?;
            }
            None => {}
        }

        if base.profile != PROFILE_UNKNOWN {
            dict.set("profile", base.profile, WriteMode::DontOverwrite)?;
        }

        match profile {
            CodecProfile::Video(video) => video_formats(&mut dict, video, codec, params)?,
            CodecProfile::Audio(audio) => audio_formats(&mut dict, audio, codec, params, self.library.abi())?,
            CodecProfile::Base(_) => {}
        }

        if self.require_meta {
            dict.set("require_meta", 1, WriteMode::DontOverwrite)?;
        }
        if params.global_header {
            dict.set("flags", "+global_header", WriteMode::Append)?;
        }

        let directives = dict.finish();
        tracing::debug!(
            profile = profile.name(),
            codec = codec.name(),
            count = directives.len(),
            "derived encoder options"
        );
        Ok(directives)
    }

    fn check_codec<'c>(&self, profile: &CodecProfile, codec: &'c Codec) -> Result<&'c LibCodec, ProfileError> {
        if !codec.is_enabled() {
            return Err(ProfileError::DisabledCodec(codec.name().to_string()));
        }
        let handle = codec
            .handle
            .as_ref()
            .ok_or_else(|| ProfileError::DisabledCodec(codec.name().to_string()))?;
        if let Some(expected) = profile.kind() {
            if expected != codec.kind() {
                return Err(ProfileError::KindMismatch {
                    profile: profile.name().to_string(),
                    codec: codec.name().to_string(),
                    expected,
                    actual: codec.kind(),
                });
            }
        }
        Ok(handle)
    }

    /// At most one quality directive; ties are broken by the quality mode.
    fn quality(&self, profile: &CodecProfile, params: &StreamParams) -> Option<Quality> {
        let mode = params.quality_mode.unwrap_or(self.quality_mode);
        let crf = profile.as_video().map(|v| v.crf).filter(|c| *c > 0);
        let global = profile
            .as_video()
            .and_then(|v| v.vaapi.as_ref())
            .map(|ext| ext.global_quality)
            .filter(|q| *q > 0)
            .or(Some(profile.base().qscale).filter(|q| *q > 0));

        match (crf, global, mode) {
            (Some(crf), None, _) | (Some(crf), Some(_), QualityMode::Crf) => Some(Quality::Crf(crf)),
            (_, Some(q), _) => Some(Quality::Global(q)),
            (None, None, QualityMode::GlobalQuality) => params.default_quality.map(Quality::Global),
            (None, None, QualityMode::Crf) => None,
        }
    }
}

/// Lambda-scaled quality; widened so any `u32` quality fits.
fn global_quality(q: u32) -> u64 {
    u64::from(q) * u64::from(FF_QP2LAMBDA)
}

fn bits_per_second(kbps: f64) -> i64 {
    (kbps * 1000.0).round() as i64
}

fn vaapi_directives(
    dict: &mut OptionDict<'_>,
    codec: &str,
    bit_rate: f64,
    ext: &VaapiExtension,
) -> Result<(), ProfileError> {
    let target = ext.scaled_bit_rate(bit_rate);
    if target > 0.0 {
        dict.set("b", bits_per_second(target), WriteMode::DontOverwrite)?;
    }
    if ext.rc_mode != VaapiRcMode::Auto {
        dict.set("rc_mode", ext.rc_mode.label(), WriteMode::DontOverwrite)?;
    }
    if ext.qp > 0 {
        dict.set("qp", ext.qp, WriteMode::DontOverwrite)?;
    }
    if ext.quality > 0 {
        dict.set("quality", ext.quality, WriteMode::DontOverwrite)?;
    }
    if ext.async_depth > 0 {
        dict.set("async_depth", ext.async_depth, WriteMode::DontOverwrite)?;
    }

    // B-frames trip up the AMD drivers
    if ext.platform == Platform::Amd {
        dict.set("bf", 0, WriteMode::DontOverwrite)?;
    } else {
        match ext.b_reference {
            BReference::Skip => dict.set("bf", 0, WriteMode::DontOverwrite)?,
            BReference::RefPiOnly | BReference::MultiLayer => {
                let depth = if ext.b_reference == BReference::RefPiOnly { 1 } else { 2 };
                dict.set("b_depth", depth, WriteMode::DontOverwrite)?;
                if ext.desired_b_depth > 0 {
                    dict.set("bf", ext.desired_b_depth, WriteMode::DontOverwrite)?;
                }
            }
        }
    }

    if ext.max_bit_rate > 0.0 {
        dict.set("maxrate", bits_per_second(ext.max_bit_rate), WriteMode::DontOverwrite)?;
    }
    if ext.buff_factor > 0.0 {
        let rate = if ext.max_bit_rate > 0.0 { ext.max_bit_rate } else { target };
        if rate > 0.0 {
            dict.set("bufsize", bits_per_second(rate * ext.buff_factor), WriteMode::DontOverwrite)?;
        }
    }

    if matches!(codec, "vp8_vaapi" | "vp9_vaapi") {
        if ext.loop_filter_level > 0 {
            dict.set("loop_filter_level", ext.loop_filter_level, WriteMode::DontOverwrite)?;
        }
        if ext.loop_filter_sharpness > 0 {
            dict.set("loop_filter_sharpness", ext.loop_filter_sharpness, WriteMode::DontOverwrite)?;
        }
    }
    if codec == "hevc_vaapi" && ext.tier >= 0 {
        dict.set("tier", ext.tier, WriteMode::DontOverwrite)?;
    }
    if ext.level != VaapiExtension::default().level {
        dict.set("level", ext.level, WriteMode::DontOverwrite)?;
    }
    if ext.qmin >= 0 {
        dict.set("qmin", ext.qmin, WriteMode::DontOverwrite)?;
    }
    if ext.qmax >= 0 {
        dict.set("qmax", ext.qmax, WriteMode::DontOverwrite)?;
    }
    if ext.uilp && !ext.ui {
        dict.set("low_power", 1, WriteMode::DontOverwrite)?;
    }
    if codec == "vp9_vaapi" && ext.super_frame {
        dict.set("bsf", "vp9_superframe", WriteMode::DontOverwrite)?;
    }
    Ok(())
}

/// Override, then the live format, then the codec's first listed format.
fn video_formats(
    dict: &mut OptionDict<'_>,
    video: &VideoProfile,
    codec: &Codec,
    params: &StreamParams,
) -> Result<(), ProfileError> {
    let pix_fmt = Some(video.pix_fmt.as_str())
        .filter(|f| *f != FMT_NONE)
        .or(params.pix_fmt.as_deref())
        .or(codec.descriptor.pix_fmts.first().map(String::as_str));
    if let Some(pix_fmt) = pix_fmt {
        dict.set("pix_fmt", pix_fmt, WriteMode::DontOverwrite)?;
    }
    Ok(())
}

fn audio_formats(
    dict: &mut OptionDict<'_>,
    audio: &AudioProfile,
    codec: &Codec,
    params: &StreamParams,
    abi: LayoutAbi,
) -> Result<(), ProfileError> {
    debug_assert_eq!(codec.kind(), MediaKind::Audio);
    let desc = &codec.descriptor;

    let runtime_fmt = params
        .sample_fmt
        .as_deref()
        .filter(|f| desc.sample_fmts.is_empty() || desc.sample_fmts.iter().any(|s| s == f));
    let sample_fmt = Some(audio.sample_fmt.as_str())
        .filter(|f| *f != FMT_NONE)
        .or(runtime_fmt)
        .or(desc.sample_fmts.first().map(String::as_str));
    if let Some(fmt) = sample_fmt {
        dict.set("sample_fmt", fmt, WriteMode::DontOverwrite)?;
    }

    let rate = if audio.sample_rate > 0 {
        Some(audio.sample_rate)
    } else {
        params.sample_rate.map(|r| closest_rate(r, &desc.sample_rates))
    };
    if let Some(rate) = rate {
        dict.set("ar", rate, WriteMode::DontOverwrite)?;
    }

    let mask = Some(audio.channel_layout)
        .filter(|m| *m != 0)
        .or(params.channel_layout.filter(|m| *m != 0));
    if let Some(mask) = mask {
        match abi {
            LayoutAbi::Legacy => dict.set("channel_layout", mask, WriteMode::DontOverwrite)?,
            LayoutAbi::Explicit => {
                dict.set("ch_layout", ChannelLayout::from_mask(mask).name, WriteMode::DontOverwrite)?
            }
        }
    }
    Ok(())
}

/// Supported rate nearest to `rate`; the higher one on a tie.
fn closest_rate(rate: u32, supported: &[u32]) -> u32 {
    supported
        .iter()
        .copied()
        .min_by_key(|r| (r.abs_diff(rate), u32::MAX - r))
        .unwrap_or(rate)
}
