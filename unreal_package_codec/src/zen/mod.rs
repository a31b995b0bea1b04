//! Zen/IoStore package format: summary + section tables (§3, §4.3, §6)

pub mod dependency_bundle;
pub mod package;
pub mod reader;
pub mod writer;

pub use package::{
    BulkDataMapEntry, ExportBundleEntry, ExportBundleHeader, ExportCommandType, ImportedPackage,
    ZenExport, ZenPackage, ZenPackageSummary,
};
pub use reader::read_zen_package;
pub use writer::write_zen_package;
