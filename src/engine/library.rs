//! Boundary to the external codec library.
//!
//! The registry and derivation engine only talk to [`CodecLibrary`]. Two
//! implementations ship: [`FfmpegCli`] reads capabilities from the installed
//! `ffmpeg` binary, and [`StaticLibrary`] is an in-memory table for embedders
//! and tests.

use std::collections::{HashMap, HashSet};
use std::process::Command;
use std::sync::OnceLock;

use super::codec::catalogue::default_profiles;
use super::codec::layout::{ChannelLayout, LayoutAbi};
use super::codec::MediaKind;
use super::error::LibraryError;

/// EINVAL as the codec library reports it.
pub const AVERROR_EINVAL: i32 = -22;

/// Options every encoder context accepts regardless of its private option table.
const GENERIC_OPTIONS: &[&str] = &[
    "b",
    "flags",
    "pix_fmt",
    "global_quality",
    "profile",
    "level",
    "maxrate",
    "minrate",
    "bufsize",
    "qmin",
    "qmax",
    "bf",
    "g",
    "threads",
    "sample_fmt",
    "ar",
    "ac",
    "channel_layout",
    "ch_layout",
];

/// Keys consumed by the transcoding pipeline itself, never by the encoder.
const PIPELINE_OPTIONS: &[&str] = &["require_meta", "bsf"];

/// Opaque encoder handle returned by the library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibCodec {
    pub name: String,
    pub long_name: Option<String>,
    pub kind: MediaKind,
    pub pix_fmts: Vec<String>,
    pub sample_fmts: Vec<String>,
    pub sample_rates: Vec<u32>,
    pub channel_layouts: Vec<ChannelLayout>,
    pub profiles: Vec<(i32, String)>,
    /// Private option names, when the library publishes them.
    pub private_options: Option<Vec<String>>,
}

impl LibCodec {
    pub fn new(name: &str, kind: MediaKind) -> Self {
        Self {
            name: name.to_string(),
            long_name: None,
            kind,
            pix_fmts: Vec::new(),
            sample_fmts: Vec::new(),
            sample_rates: Vec::new(),
            channel_layouts: Vec::new(),
            profiles: Vec::new(),
            private_options: None,
        }
    }

    pub fn video(name: &str, pix_fmts: &[&str]) -> Self {
        Self {
            pix_fmts: pix_fmts.iter().map(|s| s.to_string()).collect(),
            ..Self::new(name, MediaKind::Video)
        }
    }

    pub fn audio(name: &str, sample_fmts: &[&str], sample_rates: &[u32], layouts: &[u64]) -> Self {
        Self {
            sample_fmts: sample_fmts.iter().map(|s| s.to_string()).collect(),
            sample_rates: sample_rates.to_vec(),
            channel_layouts: layouts.iter().map(|m| ChannelLayout::from_mask(*m)).collect(),
            ..Self::new(name, MediaKind::Audio)
        }
    }

    pub fn with_long_name(mut self, long_name: &str) -> Self {
        self.long_name = Some(long_name.to_string());
        self
    }

    pub fn with_private_options(mut self, options: &[&str]) -> Self {
        self.private_options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_profiles(mut self, profiles: Vec<(i32, String)>) -> Self {
        self.profiles = profiles;
        self
    }
}

/// Operations consumed from the codec library.
pub trait CodecLibrary: Send + Sync {
    /// Resolve an encoder by name.
    fn open(&self, name: &str) -> Option<LibCodec>;

    /// Validate one option write before it reaches the encoder.
    fn check_option(&self, codec: &LibCodec, key: &str, value: &str) -> Result<(), LibraryError> {
        check_generic_option(codec, key, value)
    }

    fn abi(&self) -> LayoutAbi {
        LayoutAbi::Explicit
    }
}

/// Default option check: generic and pipeline keys always pass, private keys
/// must be listed when the codec publishes its option table.
pub fn check_generic_option(codec: &LibCodec, key: &str, value: &str) -> Result<(), LibraryError> {
    if value.is_empty() {
        return Err(LibraryError::InvalidValue {
            value: value.to_string(),
        });
    }
    if GENERIC_OPTIONS.contains(&key) || PIPELINE_OPTIONS.contains(&key) {
        return Ok(());
    }
    match &codec.private_options {
        Some(options) if !options.iter().any(|o| o == key) => Err(LibraryError::UnknownOption {
            codec: codec.name.clone(),
        }),
        _ => Ok(()),
    }
}

// ============================================================================
// In-memory library
// ============================================================================

/// Library backed by a fixed table of handles.
#[derive(Debug, Clone, Default)]
pub struct StaticLibrary {
    codecs: HashMap<String, LibCodec>,
    rejected: HashSet<String>,
    abi: LayoutAbi,
}

impl StaticLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, codec: LibCodec) -> Self {
        self.codecs.insert(codec.name.clone(), codec);
        self
    }

    /// Make every write of `key` fail with EINVAL.
    pub fn rejecting(mut self, key: &str) -> Self {
        self.rejected.insert(key.to_string());
        self
    }

    pub fn with_abi(mut self, abi: LayoutAbi) -> Self {
        self.abi = abi;
        self
    }
}

impl CodecLibrary for StaticLibrary {
    fn open(&self, name: &str) -> Option<LibCodec> {
        self.codecs.get(name).cloned()
    }

    fn check_option(&self, codec: &LibCodec, key: &str, value: &str) -> Result<(), LibraryError> {
        if self.rejected.contains(key) {
            return Err(LibraryError::Code(AVERROR_EINVAL));
        }
        check_generic_option(codec, key, value)
    }

    fn abi(&self) -> LayoutAbi {
        self.abi
    }
}

// ============================================================================
// ffmpeg command line
// ============================================================================

/// Library view built from the `ffmpeg` binary's encoder listings.
#[derive(Debug)]
pub struct FfmpegCli {
    program: String,
    abi: LayoutAbi,
    encoders: OnceLock<String>,
}

impl FfmpegCli {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            abi: LayoutAbi::Explicit,
            encoders: OnceLock::new(),
        }
    }

    pub fn with_abi(mut self, abi: LayoutAbi) -> Self {
        self.abi = abi;
        self
    }

    /// Cached output of `ffmpeg -encoders`.
    fn encoders_output(&self) -> &str {
        self.encoders.get_or_init(|| {
            Command::new(&self.program)
                .args(["-hide_banner", "-encoders"])
                .output()
                .ok()
                .map(|o| String::from_utf8_lossy(&o.stdout).to_string())
                .unwrap_or_default()
        })
    }

    fn encoder_help(&self, name: &str) -> Option<String> {
        let output = Command::new(&self.program)
            .args(["-hide_banner", "-h", &format!("encoder={}", name)])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for FfmpegCli {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl CodecLibrary for FfmpegCli {
    fn open(&self, name: &str) -> Option<LibCodec> {
        let entry = parse_encoders_list(self.encoders_output())
            .into_iter()
            .find(|e| e.name == name)?;

        let mut codec = LibCodec::new(&entry.name, entry.kind);
        if !entry.long_name.is_empty() {
            codec.long_name = Some(entry.long_name);
        }
        if let Some(help) = self.encoder_help(name) {
            parse_encoder_help(&help, &mut codec);
        }
        if codec.profiles.is_empty() {
            codec.profiles = default_profiles(name);
        }
        tracing::debug!(codec = name, pix_fmts = codec.pix_fmts.len(), "resolved encoder");
        Some(codec)
    }

    fn abi(&self) -> LayoutAbi {
        self.abi
    }
}

/// One row of `ffmpeg -encoders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderEntry {
    pub kind: MediaKind,
    pub name: String,
    pub long_name: String,
}

/// Parse the table printed by `ffmpeg -encoders`. Subtitle encoders are skipped.
pub fn parse_encoders_list(output: &str) -> Vec<EncoderEntry> {
    let mut entries = Vec::new();
    let mut in_table = false;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("------") {
            in_table = true;
            continue;
        }
        if !in_table || trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.splitn(3, char::is_whitespace);
        let (Some(flags), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        let kind = match flags.chars().next() {
            Some('V') => MediaKind::Video,
            Some('A') => MediaKind::Audio,
            _ => continue,
        };
        let long_name = parts.next().unwrap_or("").trim().to_string();
        entries.push(EncoderEntry {
            kind,
            name: name.to_string(),
            long_name,
        });
    }

    entries
}

/// Fill capability lists and private option names from `ffmpeg -h encoder=NAME`.
pub fn parse_encoder_help(help: &str, codec: &mut LibCodec) {
    let mut options: Option<Vec<String>> = None;

    for line in help.lines() {
        let trimmed = line.trim();

        if let Some(list) = trimmed.strip_prefix("Supported pixel formats:") {
            codec.pix_fmts = list.split_whitespace().map(str::to_string).collect();
        } else if let Some(list) = trimmed.strip_prefix("Supported sample formats:") {
            codec.sample_fmts = list.split_whitespace().map(str::to_string).collect();
        } else if let Some(list) = trimmed.strip_prefix("Supported sample rates:") {
            codec.sample_rates = list.split_whitespace().filter_map(|r| r.parse().ok()).collect();
        } else if let Some(list) = trimmed.strip_prefix("Supported channel layouts:") {
            codec.channel_layouts = list.split_whitespace().filter_map(ChannelLayout::from_name).collect();
        } else if trimmed.ends_with("AVOptions:") {
            options.get_or_insert_with(Vec::new);
        } else if let Some(opts) = options.as_mut() {
            // Option rows are indented two spaces; their named constants sit deeper.
            if line.starts_with("  -") {
                if let Some(name) = trimmed.split_whitespace().next() {
                    opts.push(name.trim_start_matches('-').to_string());
                }
            }
        }
    }

    if options.is_some() {
        codec.private_options = options;
    }
}
