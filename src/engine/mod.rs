// Codec capabilities, profiles and encoder option derivation - independent of the CLI

pub mod codec;
pub mod derive;
pub mod error;
pub mod hardware;
pub mod library;
pub mod profile;
pub mod registry;
pub mod visibility;

pub use codec::{CapabilityDescriptor, Codec, HwFeatures, HwVendor, MediaKind, codec_title};
pub use derive::{DerivationEngine, Directives, QualityMode, StreamParams};
pub use error::{LibraryError, ProbeError, ProfileError, RegistryError};
pub use hardware::{HardwareProbe, SystemProbe};
pub use library::{CodecLibrary, FfmpegCli, LibCodec, StaticLibrary};
pub use profile::{CodecProfile, JsonDirStore, ProfileRegistry, ProfileStore};
pub use registry::{CodecRegistry, RegisterOptions, RegisterReport};
pub use visibility::{ListEntry, ListValue, OptionSet, get_opts};
