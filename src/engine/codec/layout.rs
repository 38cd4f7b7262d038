//! Audio channel layouts.
//!
//! Older codec library ABIs describe a layout purely by its speaker bitmask.
//! Newer ones pair the mask with an explicit, named layout; both are carried here
//! so the derivation engine can emit whichever form the library expects.

use serde::{Deserialize, Serialize};

pub const FRONT_LEFT: u64 = 0x1;
pub const FRONT_RIGHT: u64 = 0x2;
pub const FRONT_CENTER: u64 = 0x4;
pub const LOW_FREQUENCY: u64 = 0x8;
pub const BACK_LEFT: u64 = 0x10;
pub const BACK_RIGHT: u64 = 0x20;
pub const SIDE_LEFT: u64 = 0x200;
pub const SIDE_RIGHT: u64 = 0x400;

pub const MONO: u64 = FRONT_CENTER;
pub const STEREO: u64 = FRONT_LEFT | FRONT_RIGHT;
pub const SURROUND_2_1: u64 = STEREO | LOW_FREQUENCY;
pub const SURROUND_3_0: u64 = STEREO | FRONT_CENTER;
pub const QUAD: u64 = STEREO | BACK_LEFT | BACK_RIGHT;
pub const SURROUND_5_0: u64 = SURROUND_3_0 | SIDE_LEFT | SIDE_RIGHT;
pub const SURROUND_5_1: u64 = SURROUND_5_0 | LOW_FREQUENCY;
pub const SURROUND_7_1: u64 = SURROUND_5_1 | BACK_LEFT | BACK_RIGHT;

const NAMED: &[(u64, &str)] = &[
    (MONO, "mono"),
    (STEREO, "stereo"),
    (SURROUND_2_1, "2.1"),
    (SURROUND_3_0, "3.0"),
    (QUAD, "quad"),
    (SURROUND_5_0, "5.0(side)"),
    (SURROUND_5_1, "5.1(side)"),
    (SURROUND_7_1, "7.1"),
];

/// Speaker labels in bit order, as the codec library spells them.
const SPEAKERS: &[&str] = &[
    "FL", "FR", "FC", "LFE", "BL", "BR", "FLC", "FRC", "BC", "SL", "SR", "TC", "TFL", "TFC", "TFR", "TBL", "TBC",
    "TBR",
];

/// Which channel layout representation the codec library understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAbi {
    /// Bare speaker bitmask (`channel_layout`)
    Legacy,
    /// Mask plus explicit named layout (`ch_layout`)
    #[default]
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub mask: u64,
    pub name: String,
}

impl ChannelLayout {
    /// Layout for a speaker mask. Unnamed masks are spelled out speaker by
    /// speaker (`FL+LFE`), or as the hex mask when a bit has no label.
    pub fn from_mask(mask: u64) -> Self {
        let name = NAMED
            .iter()
            .find(|(m, _)| *m == mask)
            .map(|(_, n)| n.to_string())
            .unwrap_or_else(|| speaker_list(mask));
        Self { mask, name }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMED
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(mask, n)| Self {
                mask: *mask,
                name: n.to_string(),
            })
    }

    pub fn channels(&self) -> u32 {
        self.mask.count_ones()
    }
}

fn speaker_list(mask: u64) -> String {
    if mask == 0 || mask >> SPEAKERS.len() != 0 {
        return format!("{:#x}", mask);
    }
    SPEAKERS
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, label)| *label)
        .collect::<Vec<_>>()
        .join("+")
}
