//! VA-API specific profile extension.
//!
//! Only attached to video profiles whose codec is a VA-API encoder; see
//! [`CodecProfile::normalize_extension`](super::CodecProfile::normalize_extension).

use serde::{Deserialize, Serialize};

use super::Choice;
use crate::engine::codec::HwFeatures;
use crate::engine::visibility::OptionSet;

/// Frame used as reference for B-frames (`b_depth`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BReference {
    /// No B-frames
    #[default]
    Skip,
    /// B-frames refer only to P- or I-frames
    RefPiOnly,
    /// Multiple layers of B-frames
    MultiLayer,
}

impl Choice for BReference {
    const ALL: &'static [Self] = &[Self::Skip, Self::RefPiOnly, Self::MultiLayer];

    fn label(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::RefPiOnly => "use P- or I-frames",
            Self::MultiLayer => "multiple layers",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// Target platform hint. Not an encoder option; gates which directives are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Unconstrained,
    Intel,
    Amd,
}

impl Choice for Platform {
    const ALL: &'static [Self] = &[Self::Unconstrained, Self::Intel, Self::Amd];

    fn label(&self) -> &'static str {
        match self {
            Self::Unconstrained => "Unconstrained",
            Self::Intel => "Intel",
            Self::Amd => "AMD",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// `deinterlace_vaapi` algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaapiDeintMode {
    /// Most advanced algorithm the driver offers
    #[default]
    Default,
    Bob,
    Weave,
    MotionAdaptive,
    MotionCompensated,
}

impl VaapiDeintMode {
    pub fn filter_name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Bob => "bob",
            Self::Weave => "weave",
            Self::MotionAdaptive => "motion_adaptive",
            Self::MotionCompensated => "motion_compensated",
        }
    }
}

impl Choice for VaapiDeintMode {
    const ALL: &'static [Self] = &[
        Self::Default,
        Self::Bob,
        Self::Weave,
        Self::MotionAdaptive,
        Self::MotionCompensated,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Bob => "Bob",
            Self::Weave => "Weave",
            Self::MotionAdaptive => "Motion adaptive",
            Self::MotionCompensated => "Motion compensated",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// VA-API rate control (`rc_mode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VaapiRcMode {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "CQP")]
    Cqp,
    #[serde(rename = "CBR")]
    Cbr,
    #[serde(rename = "VBR")]
    Vbr,
    #[serde(rename = "ICQ")]
    Icq,
    #[serde(rename = "QVBR")]
    Qvbr,
    #[serde(rename = "AVBR")]
    Avbr,
}

impl Choice for VaapiRcMode {
    const ALL: &'static [Self] = &[
        Self::Auto,
        Self::Cqp,
        Self::Cbr,
        Self::Vbr,
        Self::Icq,
        Self::Qvbr,
        Self::Avbr,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cqp => "CQP",
            Self::Cbr => "CBR",
            Self::Vbr => "VBR",
            Self::Icq => "ICQ",
            Self::Qvbr => "QVBR",
            Self::Avbr => "AVBR",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

fn default_unset() -> i32 {
    -1
}

fn default_level() -> i32 {
    -99
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaapiExtension {
    /// Constant QP for CQP, 0 = unset
    #[serde(default)]
    pub qp: u32,
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub global_quality: u32,
    #[serde(default)]
    pub async_depth: u32,
    /// Regular encode entry point present. Filled by the probe.
    #[serde(default)]
    pub ui: bool,
    /// Low-power encode entry point present. Filled by the probe.
    #[serde(default)]
    pub uilp: bool,
    #[serde(default)]
    pub b_reference: BReference,
    /// Max consecutive B-frames
    #[serde(default)]
    pub desired_b_depth: u32,
    /// kbps, 0 = unset
    #[serde(default)]
    pub max_bit_rate: f64,
    /// Multiplier applied to the profile bit rate, 0 = unset
    #[serde(default)]
    pub bit_rate_scale_factor: f64,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub deinterlace_vaapi_mode: VaapiDeintMode,
    #[serde(default)]
    pub loop_filter_level: u32,
    #[serde(default)]
    pub loop_filter_sharpness: u32,
    /// Rate control buffer size as a multiple of the bit rate, 0 = unset
    #[serde(default)]
    pub buff_factor: f64,
    #[serde(default)]
    pub rc_mode: VaapiRcMode,
    /// -1 = unset
    #[serde(default = "default_unset")]
    pub tier: i32,
    /// -99 = unset
    #[serde(default = "default_level")]
    pub level: i32,
    /// -1 = unset
    #[serde(default = "default_unset")]
    pub qmin: i32,
    /// -1 = unset
    #[serde(default = "default_unset")]
    pub qmax: i32,
    #[serde(default)]
    pub super_frame: bool,
}

impl Default for VaapiExtension {
    fn default() -> Self {
        Self {
            qp: 0,
            quality: 0,
            global_quality: 0,
            async_depth: 0,
            ui: false,
            uilp: false,
            b_reference: BReference::default(),
            desired_b_depth: 0,
            max_bit_rate: 0.0,
            bit_rate_scale_factor: 0.0,
            platform: Platform::default(),
            deinterlace_vaapi_mode: VaapiDeintMode::default(),
            loop_filter_level: 0,
            loop_filter_sharpness: 0,
            buff_factor: 0.0,
            rc_mode: VaapiRcMode::default(),
            tier: default_unset(),
            level: default_level(),
            qmin: default_unset(),
            qmax: default_unset(),
            super_frame: false,
        }
    }
}

impl VaapiExtension {
    /// Refresh the read-only entry point bits from the probed features.
    pub fn apply_probe(&mut self, features: HwFeatures) {
        self.ui = features.contains(HwFeatures::ENCODE);
        self.uilp = features.contains(HwFeatures::ENCODE_LOW_POWER);
    }

    /// Bit rate after the scale factor, in kbps.
    pub fn scaled_bit_rate(&self, kbps: f64) -> f64 {
        if self.bit_rate_scale_factor > 0.0 {
            kbps * self.bit_rate_scale_factor
        } else {
            kbps
        }
    }

    pub fn populated(&self) -> OptionSet {
        let mut set = OptionSet::empty();
        set.set(OptionSet::QP, self.qp > 0);
        set.set(OptionSet::QUALITY, self.quality > 0);
        set.set(OptionSet::GLOBAL_QUALITY, self.global_quality > 0);
        set.set(OptionSet::ASYNC_DEPTH, self.async_depth > 0);
        set.set(OptionSet::B_REFERENCE, self.b_reference != BReference::default());
        set.set(OptionSet::DESIRED_B_DEPTH, self.desired_b_depth > 0);
        set.set(OptionSet::MAX_BIT_RATE, self.max_bit_rate > 0.0);
        set.set(OptionSet::BIT_RATE_SCALE, self.bit_rate_scale_factor > 0.0);
        set.set(OptionSet::PLATFORM, self.platform != Platform::default());
        set.set(OptionSet::VAAPI_DEINT_MODE, self.deinterlace_vaapi_mode != VaapiDeintMode::default());
        set.set(OptionSet::LOOP_FILTER_LEVEL, self.loop_filter_level > 0);
        set.set(OptionSet::LOOP_FILTER_SHARPNESS, self.loop_filter_sharpness > 0);
        set.set(OptionSet::BUFF_FACTOR, self.buff_factor > 0.0);
        set.set(OptionSet::RC_MODE, self.rc_mode != VaapiRcMode::default());
        set.set(OptionSet::TIER, self.tier >= 0);
        set.set(OptionSet::LEVEL, self.level != default_level());
        set.set(OptionSet::QMIN, self.qmin >= 0);
        set.set(OptionSet::QMAX, self.qmax >= 0);
        set.set(OptionSet::SUPER_FRAME, self.super_frame);
        set
    }
}
