use serde::{Deserialize, Serialize};

use super::BaseProfile;
use crate::engine::codec::FMT_NONE;
use crate::engine::codec::layout::ChannelLayout;
use crate::engine::visibility::OptionSet;

fn default_sample_fmt() -> String {
    FMT_NONE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioProfile {
    pub base: BaseProfile,
    /// Number of audio tracks to encode, 0 = all
    #[serde(default)]
    pub tracks: u32,
    /// Preferred track languages, empty = unset
    #[serde(default)]
    pub language1: String,
    #[serde(default)]
    pub language2: String,
    #[serde(default)]
    pub language3: String,
    /// Sample format override, "none" = unset
    #[serde(default = "default_sample_fmt")]
    pub sample_fmt: String,
    /// Hz, 0 = unset
    #[serde(default)]
    pub sample_rate: u32,
    /// Speaker mask, 0 = unset
    #[serde(default)]
    pub channel_layout: u64,
}

impl AudioProfile {
    pub fn new(base: BaseProfile) -> Self {
        Self {
            base,
            tracks: 0,
            language1: String::new(),
            language2: String::new(),
            language3: String::new(),
            sample_fmt: default_sample_fmt(),
            sample_rate: 0,
            channel_layout: 0,
        }
    }

    pub fn populated(&self) -> OptionSet {
        let mut set = self.base.populated();
        set.set(OptionSet::TRACKS, self.tracks > 0);
        set.set(OptionSet::LANGUAGE1, !self.language1.is_empty());
        set.set(OptionSet::LANGUAGE2, !self.language2.is_empty());
        set.set(OptionSet::LANGUAGE3, !self.language3.is_empty());
        set.set(OptionSet::SAMPLE_FMT, self.sample_fmt != FMT_NONE);
        set.set(OptionSet::SAMPLE_RATE, self.sample_rate > 0);
        set.set(OptionSet::CHANNEL_LAYOUT, self.channel_layout != 0);
        set
    }

    /// Languages in preference order, unset slots skipped.
    pub fn preferred_languages(&self) -> Vec<&str> {
        [&self.language1, &self.language2, &self.language3]
            .into_iter()
            .filter(|l| !l.is_empty())
            .map(String::as_str)
            .collect()
    }

    pub fn layout(&self) -> Option<ChannelLayout> {
        (self.channel_layout != 0).then(|| ChannelLayout::from_mask(self.channel_layout))
    }
}
