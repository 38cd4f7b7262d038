//! Video profile fields, output geometry and filter descriptions.

use serde::{Deserialize, Serialize};

use super::vaapi::{VaapiDeintMode, VaapiExtension};
use super::{BaseProfile, Choice};
use crate::engine::codec::{FMT_NONE, HwFeatures, HwVendor};
use crate::engine::visibility::OptionSet;

fn default_pix_fmt() -> String {
    FMT_NONE.to_string()
}

/// Deinterlacer output rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeintRate {
    /// One output frame per field pair
    #[default]
    Frame,
    /// One output frame per field
    Field,
}

impl Choice for DeintRate {
    const ALL: &'static [Self] = &[Self::Frame, Self::Field];

    fn label(&self) -> &'static str {
        match self {
            Self::Frame => "Frame rate",
            Self::Field => "Field rate",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// Whether progressive frames bypass the deinterlacer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeintAuto {
    /// Deinterlace everything
    #[default]
    Off,
    /// Only interlaced frames
    On,
}

impl Choice for DeintAuto {
    const ALL: &'static [Self] = &[Self::Off, Self::On];

    fn label(&self) -> &'static str {
        match self {
            Self::Off => "Deinterlace all frames",
            Self::On => "Only interlaced frames",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    #[default]
    UpOrDown,
    UpOnly,
    DownOnly,
}

impl Choice for ScalingMode {
    const ALL: &'static [Self] = &[Self::UpOrDown, Self::UpOnly, Self::DownOnly];

    fn label(&self) -> &'static str {
        match self {
            Self::UpOrDown => "Scale up or down",
            Self::UpOnly => "Scale up only",
            Self::DownOnly => "Scale down only",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// Hardware decoder preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HwAccel {
    #[default]
    Auto,
    PrioritizeVaapi,
    PrioritizeNvdec,
    PrioritizeMmal,
}

impl HwAccel {
    pub fn vendor(&self) -> Option<HwVendor> {
        match self {
            Self::Auto => None,
            Self::PrioritizeVaapi => Some(HwVendor::Vaapi),
            Self::PrioritizeNvdec => Some(HwVendor::Nvenc),
            Self::PrioritizeMmal => Some(HwVendor::Mmal),
        }
    }

    /// Choices whose vendor branch is compiled in.
    pub fn available() -> Vec<HwAccel> {
        Self::ALL
            .iter()
            .copied()
            .filter(|h| h.vendor().map(|v| v.compiled_in()).unwrap_or(true))
            .collect()
    }
}

impl Choice for HwAccel {
    const ALL: &'static [Self] = &[
        Self::Auto,
        Self::PrioritizeVaapi,
        Self::PrioritizeNvdec,
        Self::PrioritizeMmal,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::PrioritizeVaapi => "prioritize VAAPI",
            Self::PrioritizeNvdec => "prioritize NVDEC",
            Self::PrioritizeMmal => "prioritize MMAL",
        }
    }

    fn value(&self) -> i32 {
        *self as i32
    }
}

/// Aspect (num/den) of the output frame; 0/0 keeps the source aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn is_set(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProfile {
    pub base: BaseProfile,
    #[serde(default)]
    pub deinterlace: bool,
    #[serde(default)]
    pub deinterlace_field_rate: DeintRate,
    #[serde(default)]
    pub deinterlace_auto: DeintAuto,
    /// Output height, 0 = source
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub scaling_mode: ScalingMode,
    #[serde(default)]
    pub hwaccel: HwAccel,
    #[serde(default)]
    pub hwaccel_details: u32,
    /// Pixel format override, "none" = unset
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    /// 0 = unset
    #[serde(default)]
    pub crf: u32,
    /// 0 = disabled
    #[serde(default)]
    pub filter_hw_denoise: u32,
    /// 0 = disabled
    #[serde(default)]
    pub filter_hw_sharpness: u32,
    #[serde(default)]
    pub size: Rational,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaapi: Option<VaapiExtension>,
}

impl VideoProfile {
    pub fn new(base: BaseProfile) -> Self {
        Self {
            base,
            deinterlace: false,
            deinterlace_field_rate: DeintRate::default(),
            deinterlace_auto: DeintAuto::default(),
            height: 0,
            scaling_mode: ScalingMode::default(),
            hwaccel: HwAccel::default(),
            hwaccel_details: 0,
            pix_fmt: default_pix_fmt(),
            crf: 0,
            filter_hw_denoise: 0,
            filter_hw_sharpness: 0,
            size: Rational::default(),
            vaapi: None,
        }
    }

    pub fn populated(&self) -> OptionSet {
        let mut set = self.base.populated();
        set.set(OptionSet::DEINTERLACE, self.deinterlace);
        set.set(OptionSet::DEINT_FIELD_RATE, self.deinterlace_field_rate != DeintRate::default());
        set.set(OptionSet::DEINT_AUTO, self.deinterlace_auto != DeintAuto::default());
        set.set(OptionSet::HEIGHT, self.height > 0);
        set.set(OptionSet::SCALING_MODE, self.scaling_mode != ScalingMode::default());
        set.set(OptionSet::HWACCEL, self.hwaccel != HwAccel::default());
        set.set(OptionSet::HWACCEL_DETAILS, self.hwaccel_details != 0);
        set.set(OptionSet::PIX_FMT, self.pix_fmt != FMT_NONE);
        set.set(OptionSet::CRF, self.crf > 0);
        set.set(OptionSet::HW_DENOISE, self.filter_hw_denoise > 0);
        set.set(OptionSet::HW_SHARPNESS, self.filter_hw_sharpness > 0);
        set.set(OptionSet::SIZE, self.size.is_set());
        if let Some(vaapi) = &self.vaapi {
            set |= vaapi.populated();
        }
        set
    }

    /// Hardware decoders to try, most preferred first. Only compiled-in vendors appear.
    pub fn decoder_preference(&self) -> Vec<HwVendor> {
        let mut order: Vec<HwVendor> = HwVendor::ALL.iter().copied().filter(|v| v.compiled_in()).collect();
        if let Some(preferred) = self.hwaccel.vendor() {
            if let Some(pos) = order.iter().position(|v| *v == preferred) {
                let v = order.remove(pos);
                order.insert(0, v);
            }
        }
        order
    }

    /// Output frame size for a `width`x`height` source.
    ///
    /// The target height only applies when the scaling mode allows the
    /// direction of the change. Dimensions are rounded to even values.
    pub fn output_geometry(&self, width: u32, height: u32) -> (u32, u32) {
        if self.height == 0 || height == 0 || width == 0 {
            return (width, height);
        }
        let allowed = match self.scaling_mode {
            ScalingMode::UpOrDown => true,
            ScalingMode::UpOnly => self.height > height,
            ScalingMode::DownOnly => self.height < height,
        };
        if !allowed {
            return (width, height);
        }

        let out_h = even(self.height as u64);
        let out_w = if self.size.is_set() {
            even(out_h * self.size.num as u64 / self.size.den as u64)
        } else {
            even(width as u64 * out_h / height as u64)
        };
        (out_w as u32, out_h as u32)
    }

    /// Filter descriptions for the decode side of the pipeline, in application order.
    pub fn filter_chain(
        &self,
        vendor: Option<HwVendor>,
        features: HwFeatures,
        width: u32,
        height: u32,
    ) -> Vec<String> {
        let mut filters = Vec::new();
        let (out_w, out_h) = self.output_geometry(width, height);
        let scale = (out_w, out_h) != (width, height);
        let rate = self.deinterlace_field_rate.value();
        let auto = self.deinterlace_auto.value();

        match vendor {
            Some(HwVendor::Vaapi) => {
                if self.deinterlace {
                    let mode = self
                        .vaapi
                        .as_ref()
                        .map(|v| v.deinterlace_vaapi_mode)
                        .unwrap_or_default();
                    let rate = match self.deinterlace_field_rate {
                        DeintRate::Frame => "frame",
                        DeintRate::Field => "field",
                    };
                    let mut f = format!("deinterlace_vaapi=rate={}:auto={}", rate, auto);
                    if mode != VaapiDeintMode::Default {
                        f.push_str(&format!(":mode={}", mode.filter_name()));
                    }
                    filters.push(f);
                }
                if features.contains(HwFeatures::VIDEO_PROC) {
                    if self.filter_hw_denoise > 0 {
                        filters.push(format!("denoise_vaapi=denoise={}", self.filter_hw_denoise));
                    }
                    if self.filter_hw_sharpness > 0 {
                        filters.push(format!("sharpness_vaapi=sharpness={}", self.filter_hw_sharpness));
                    }
                }
                if scale {
                    filters.push(format!("scale_vaapi=w={}:h={}", out_w, out_h));
                }
            }
            Some(HwVendor::Nvenc) => {
                if self.deinterlace {
                    filters.push(format!("yadif_cuda=mode={}:deint={}", rate, auto));
                }
                if scale {
                    filters.push(format!("scale_cuda={}:{}", out_w, out_h));
                }
            }
            Some(HwVendor::Mmal) | None => {
                if self.deinterlace {
                    filters.push(format!("yadif=mode={}:deint={}", rate, auto));
                }
                if scale {
                    filters.push(format!("scale={}:{}", out_w, out_h));
                }
            }
        }

        filters
    }
}

fn even(v: u64) -> u64 {
    v.div_ceil(2) * 2
}
