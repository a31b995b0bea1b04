//! The legacy header + exports package format (§3, §6)

pub mod package;
pub mod reader;
pub mod writer;

pub use package::{
    DataResourceEntry, LegacyExport, LegacyImport, LegacyPackage, LegacyVersionInfo,
    PreloadArcCounts,
};

/// Magic number every legacy header begins with, little-endian on the wire.
pub const LEGACY_MAGIC: u32 = 0x9E2A_83C1;
/// Fixed legacy package file version this codec targets.
pub const LEGACY_FILE_VERSION: i32 = -8;
/// Fixed legacy UE3 version field, always zero for the targeted runtime.
pub const LEGACY_UE3_VERSION: i32 = 0;
