//! Hardware encoder probing (VA-API, NVENC, MMAL)

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use super::codec::catalogue::va_profile_prefix;
use super::codec::{HwFeatures, HwVendor};
use super::error::ProbeError;

/// Device probe consulted during codec registration.
pub trait HardwareProbe: Send + Sync {
    /// Features available for `codec` on this host. An error disables the codec.
    fn features(&self, codec: &str, vendor: HwVendor) -> Result<HwFeatures, ProbeError>;
}

/// Probe that inspects the running system with `vainfo`, `nvidia-smi` and device nodes.
#[derive(Debug)]
pub struct SystemProbe {
    vainfo: String,
    render_device: Option<String>,
    vainfo_output: OnceLock<Result<String, String>>,
}

impl SystemProbe {
    pub fn new(vainfo: &str, render_device: Option<String>) -> Self {
        Self {
            vainfo: vainfo.to_string(),
            render_device,
            vainfo_output: OnceLock::new(),
        }
    }

    fn render_device(&self) -> Option<String> {
        self.render_device.clone().or_else(detect_render_device)
    }

    /// `vainfo` output for the render device, cached for the whole registration pass.
    fn vainfo_output(&self) -> Result<&str, ProbeError> {
        let device = self.render_device().ok_or(ProbeError::NoDevice)?;
        let cached = self.vainfo_output.get_or_init(|| {
            let output = Command::new(&self.vainfo)
                .args(["--display", "drm", "--device", &device])
                .output()
                .map_err(|e| e.to_string())?;
            if !output.status.success() {
                return Err(output.status.to_string());
            }
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        });

        match cached {
            Ok(out) => {
                #[cfg(feature = "dev-logging")]
                tracing::trace!(device = %device, output = %out, "vainfo");
                Ok(out.as_str())
            }
            Err(status) => Err(ProbeError::ToolFailed {
                tool: self.vainfo.clone(),
                status: status.clone(),
            }),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new("vainfo", None)
    }
}

impl HardwareProbe for SystemProbe {
    fn features(&self, codec: &str, vendor: HwVendor) -> Result<HwFeatures, ProbeError> {
        match vendor {
            HwVendor::Vaapi => {
                let output = self.vainfo_output()?;
                let prefix = va_profile_prefix(codec).unwrap_or("");
                Ok(parse_vainfo(output, prefix))
            }
            HwVendor::Nvenc => detect_nvidia_gpu()
                .map(|_| HwFeatures::ENCODE | HwFeatures::DECODE | HwFeatures::VIDEO_PROC)
                .ok_or(ProbeError::NoDevice),
            HwVendor::Mmal => {
                if Path::new("/dev/vchiq").exists() {
                    Ok(HwFeatures::ENCODE | HwFeatures::DECODE)
                } else {
                    Err(ProbeError::NoDevice)
                }
            }
        }
    }
}

/// Extract the entry points `vainfo` lists for one VA profile family.
///
/// Lines look like `VAProfileH264Main               : VAEntrypointEncSlice`.
/// Video post-processing is reported on `VAProfileNone` and applies to every codec.
pub fn parse_vainfo(output: &str, profile_prefix: &str) -> HwFeatures {
    let mut features = HwFeatures::empty();

    for line in output.lines() {
        let Some((profile, entrypoint)) = line.split_once(':') else {
            continue;
        };
        let profile = profile.trim();
        let entrypoint = entrypoint.trim();

        if profile == "VAProfileNone" && entrypoint == "VAEntrypointVideoProc" {
            features |= HwFeatures::VIDEO_PROC;
            continue;
        }
        if profile_prefix.is_empty() || !profile.starts_with(profile_prefix) {
            continue;
        }
        features |= match entrypoint {
            "VAEntrypointEncSlice" => HwFeatures::ENCODE,
            "VAEntrypointEncSliceLP" => HwFeatures::ENCODE_LOW_POWER,
            "VAEntrypointVLD" => HwFeatures::DECODE,
            _ => HwFeatures::empty(),
        };
    }

    features
}

/// First `/dev/dri/renderD*` node.
pub fn detect_render_device() -> Option<String> {
    detect_render_device_in(Path::new("/dev/dri"))
}

/// Scan `dri_path` for `renderD*` nodes and return the lowest-numbered one.
pub fn detect_render_device_in(dri_path: &Path) -> Option<String> {
    let mut devices: Vec<_> = std::fs::read_dir(dri_path)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("renderD"))
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();

    // renderD128 before renderD129
    devices.sort();

    devices.first().map(|p| p.to_string_lossy().to_string())
}

/// Detect NVIDIA GPU using nvidia-smi
pub fn detect_nvidia_gpu() -> Option<String> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let name = stdout.lines().next()?.trim();
    if name.is_empty() { None } else { Some(name.to_string()) }
}
