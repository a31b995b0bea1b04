//! In-memory model of a zen/IoStore package (§3, §6)

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::flags::{EExportFilterFlags, EObjectFlags, EPackageFlags};
use crate::object_index::PackageObjectIndex;
use crate::types::{MappedName, PackageId};
use crate::zen::dependency_bundle::DependencyBundleHeader;

/// A bulk-data resource table entry, 32 bytes on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BulkDataMapEntry {
    /// Offset into the bulk-data payload
    pub serial_offset: u64,
    /// Offset of the duplicate copy, if any
    pub duplicate_serial_offset: u64,
    /// Serialized size
    pub serial_size: u64,
    /// Bulk-data flags
    pub flags: u32,
    /// Padding to a 32-byte stride
    pub padding: u32,
}

/// A zen export map entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ZenExport {
    /// Byte offset of this export's body, relative to `cooked_header_size`
    pub cooked_serial_offset: i64,
    /// Byte length of this export's body
    pub cooked_serial_size: i64,
    /// Object name
    pub object_name: MappedName,
    /// `UObject` flags
    pub object_flags: EObjectFlags,
    /// Client/server load filtering
    pub filter_flags: EExportFilterFlags,
    /// Reference to the export's class
    pub class_index: PackageObjectIndex,
    /// Reference to the export's super
    pub super_index: PackageObjectIndex,
    /// Reference to the export's archetype/template
    pub template_index: PackageObjectIndex,
    /// Reference to the containing object
    pub outer_index: PackageObjectIndex,
    /// `CityHash64` of the lowercase fully-qualified export path, or zero if
    /// this export does not carry the `Public` flag
    pub public_export_hash: u64,
}

/// `(export, command)` entry describing one step of the runtime's load order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ExportCommandType {
    /// Allocate the export object
    Create = 0,
    /// Serialize the export's body into the allocated object
    Serialize = 1,
}

/// One entry of an export bundle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExportBundleEntry {
    /// Index into the package's export map
    pub local_export_index: u32,
    /// Which step of the export's load this entry represents
    pub command_type: ExportCommandType,
}

/// Describes one contiguous run of [`ExportBundleEntry`] values.
///
/// A converted package always emits exactly one bundle covering every export,
/// but the on-wire format supports more than one per package.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ExportBundleHeader {
    /// Serialized body offset the bundle starts loading from
    pub serial_offset: u64,
    /// Index of the bundle's first entry in the shared entries list
    pub first_entry_index: u32,
    /// Number of entries belonging to this bundle
    pub entry_count: u32,
}

/// Section offsets recorded in a zen package summary (§6). Each offset is
/// relative to the start of the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ZenPackageSummary {
    /// Package's own name
    pub package_name: MappedName,
    /// Package-level flags
    pub package_flags: EPackageFlags,
    /// Size of the header section; export body offsets are relative to this
    pub cooked_header_size: u32,
    /// Offset of the name batch
    pub names_offset: u32,
    /// Offset of the bulk-data map
    pub bulk_data_map_offset: u32,
    /// Offset of the imported-public-export-hashes array
    pub imported_public_export_hashes_offset: u32,
    /// Offset of the import map
    pub import_map_offset: u32,
    /// Offset of the export map
    pub export_map_offset: u32,
    /// Offset of the export-bundle entries
    pub export_bundle_entries_offset: u32,
    /// Offset of the dependency-bundle headers
    pub dependency_bundle_headers_offset: u32,
    /// Offset of the dependency-bundle entries
    pub dependency_bundle_entries_offset: u32,
    /// Offset of the imported-package-names section
    pub imported_package_names_offset: u32,
    /// Total size of the header, i.e. where the opaque body begins
    pub header_size: u32,
}

/// A foreign package referenced by this package's import map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPackage {
    /// Content-addressed id of the foreign package
    pub id: PackageId,
    /// The foreign package's path, carried alongside the id in the
    /// imported-package-names name batch
    pub name: String,
    /// Numeric suffix paired with `name` in the imported-package-names
    /// parallel array (§6); zero for the common unsuffixed case
    pub number: u32,
}

/// A fully parsed zen package.
#[derive(Debug, Clone, Default)]
pub struct ZenPackage {
    /// Section offsets and package-level metadata
    pub summary: ZenPackageSummary,
    /// Name map, in on-wire order
    pub name_map: Vec<String>,
    /// Bulk-data resource table
    pub bulk_data_map: Vec<BulkDataMapEntry>,
    /// Public export hashes of objects this package imports from elsewhere
    pub imported_public_export_hashes: Vec<u64>,
    /// Import map, in on-wire order
    pub import_map: Vec<PackageObjectIndex>,
    /// Export map, in on-wire order
    pub export_map: Vec<ZenExport>,
    /// Export bundle headers
    pub export_bundle_headers: Vec<ExportBundleHeader>,
    /// Flat export-bundle entries, indexed by the headers above
    pub export_bundle_entries: Vec<ExportBundleEntry>,
    /// Per-export dependency bundle headers, one per export map entry
    pub dependency_bundle_headers: Vec<DependencyBundleHeader>,
    /// Flat dependency-bundle entries, indexed by the headers above
    pub dependency_bundle_entries: Vec<PackageObjectIndex>,
    /// Foreign packages this package's import map can reference
    pub imported_packages: Vec<ImportedPackage>,
    /// Opaque bytes following the header (export bodies)
    pub body: Vec<u8>,
}

impl ZenPackage {
    /// Look up a name-map entry by index.
    pub fn name_at(&self, index: u32) -> Option<&str> {
        self.name_map.get(index as usize).map(String::as_str)
    }

    /// Render a `MappedName` against this package's name map.
    pub fn render(&self, name: MappedName) -> Option<String> {
        self.name_at(name.index).map(|base| name.render(base))
    }
}
