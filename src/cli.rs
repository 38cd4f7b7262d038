use clap::{Parser, Subcommand, ValueEnum};

use codecprof::engine::QualityMode;

#[derive(Parser)]
#[command(name = "codecprof")]
#[command(about = "Encoder capability discovery and encoding profiles", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip hardware probing and trust every encoder ffmpeg lists (overrides config)
    #[arg(long, global = true)]
    pub no_probe: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered encoders and whether they are usable
    Codecs {
        /// Only show enabled encoders
        #[arg(long)]
        enabled: bool,
    },

    /// Show hardware encoder probe results
    CheckHw,

    /// List saved profiles
    Profiles,

    /// Print a saved profile as JSON
    Show {
        /// Profile name
        name: String,
    },

    /// Show which profile fields the profile's encoder supports
    Fields {
        /// Profile name
        name: String,
    },

    /// Print the encoder options a profile derives to
    Derive {
        /// Profile name
        name: String,

        /// Runtime pixel format of the decoded stream
        #[arg(long)]
        pix_fmt: Option<String>,

        /// Runtime sample rate of the decoded stream
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Output container needs global headers
        #[arg(long)]
        global_header: bool,

        /// Quality directive to prefer when both are set (overrides config)
        #[arg(long, value_enum)]
        quality_mode: Option<QualityArg>,

        /// Source frame size (WxH) for printing the filter chain
        #[arg(long, value_name = "WxH")]
        size: Option<String>,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QualityArg {
    Crf,
    GlobalQuality,
}

impl From<QualityArg> for QualityMode {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Crf => QualityMode::Crf,
            QualityArg::GlobalQuality => QualityMode::GlobalQuality,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
