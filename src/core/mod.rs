pub mod layout;
pub mod packer;
pub mod probe;

pub use layout::{IconDir, IconDirEntry, IconDirHeader, MAX_ENTRIES};
pub use packer::{ConvertInput, IcoPacker, DEFAULT_BPP};
pub use probe::{DimensionProber, ImageProber, ImageSize, PngHeaderProber, ProberKind};
