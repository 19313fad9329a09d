mod flags;
mod version;

pub use flags::KubeletFlags;
pub use version::{parse_version, FixedVersion, KubeletBinary, KubeletVersionSource, VersionError};
