//! In-memory model of a legacy (header + exports) package (§3, §6)

use unreal_helpers::Guid;

use crate::flags::{EObjectFlags, EPackageFlags, LegacyExportFilter};
use crate::types::{MappedName, PackageIndex};

/// A legacy import table entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyImport {
    /// Package the import's class lives in (e.g. `/Script/Engine`)
    pub class_package: MappedName,
    /// Class name (e.g. `StaticMesh`)
    pub class_name: MappedName,
    /// Containing object, or null if the import is a package root
    pub outer_index: PackageIndex,
    /// Object name
    pub object_name: MappedName,
    /// Package-name override, written only when the owning package does not
    /// carry `FILTER_EDITOR_ONLY` (§6)
    pub package_name: Option<MappedName>,
    /// Set when the import is allowed to be missing at load time
    pub optional: bool,
}

/// The four preload-arc counts plus the starting slot of a legacy export's
/// slice of the flat preload-dependency array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PreloadArcCounts {
    /// Count of `SerializeBeforeSerialize` arcs
    pub serialize_before_serialize: i32,
    /// Count of `CreateBeforeSerialize` arcs
    pub create_before_serialize: i32,
    /// Count of `SerializeBeforeCreate` arcs
    pub serialize_before_create: i32,
    /// Count of `CreateBeforeCreate` arcs
    pub create_before_create: i32,
    /// Index of the first slot belonging to this export in the flat preload
    /// array, or `-1` if the export has no preload data.
    pub first_export_dependency_index: i32,
}

impl PreloadArcCounts {
    /// Total number of slots this export occupies in the flat preload array.
    pub fn total(&self) -> i32 {
        self.serialize_before_serialize
            + self.create_before_serialize
            + self.serialize_before_create
            + self.create_before_create
    }
}

/// A legacy export table entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyExport {
    /// Reference to the export's class
    pub class_index: PackageIndex,
    /// Reference to the export's super (for classes/functions)
    pub super_index: PackageIndex,
    /// Reference to the export's archetype/template
    pub template_index: PackageIndex,
    /// Reference to the containing object
    pub outer_index: PackageIndex,
    /// Object name
    pub object_name: MappedName,
    /// `UObject` flags
    pub object_flags: EObjectFlags,
    /// Byte length of this export's body in the exports blob
    pub serial_size: i64,
    /// Byte offset of this export's body in the exports blob
    pub serial_offset: i64,
    /// Client/server load filtering
    pub filter: LegacyExportFilter,
    /// Whether this export counts as a standalone, publicly loadable asset
    pub is_asset: bool,
    /// Whether a zen public export hash should be generated for this export
    pub generate_public_hash: bool,
    /// Preload-arc counts and flat-array offset
    pub arcs: PreloadArcCounts,
}

/// A bulk-data resource table entry (§6).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DataResourceEntry {
    /// Legacy bulk-data flags
    pub flags: u32,
    /// Offset into the bulk-data file
    pub serial_offset: i64,
    /// Offset of the duplicate copy, if any
    pub duplicate_serial_offset: i64,
    /// Serialized (possibly compressed) size
    pub serial_size: i64,
    /// Uncompressed size
    pub raw_size: i64,
    /// Reference to the owning export
    pub outer_index: i32,
    /// Legacy bulk-data flags, duplicated field per the on-wire layout
    pub legacy_bulk_data_flags: u32,
}

/// Version information carried by a legacy header, or zeroed when the package
/// is unversioned (§6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyVersionInfo {
    /// Whether the package omits explicit version fields
    pub unversioned: bool,
    /// `FPackageFileVersion::FileVersionUE4`
    pub file_version_ue4: i32,
    /// `FPackageFileVersion::FileVersionUE5`
    pub file_version_ue5: i32,
    /// Licensee file version
    pub licensee_version: i32,
    /// Custom versions: `(guid, version)` pairs
    pub custom_versions: Vec<(Guid, i32)>,
}

/// A fully parsed legacy package: header contents plus the export body blob.
#[derive(Debug, Clone, Default)]
pub struct LegacyPackage {
    /// The package's own name (not itself a serialized header field; used to
    /// derive self-reference checks during conversion)
    pub package_name: String,
    /// Cooked packages almost always carry an empty folder name; kept
    /// distinct from `package_name` because it is the literal serialized
    /// field (§6 item 3)
    pub folder_name: String,
    /// Package-level flags
    pub package_flags: EPackageFlags,
    /// Version fields
    pub version: LegacyVersionInfo,
    /// Name map, in on-wire order
    pub name_map: Vec<String>,
    /// Import table
    pub imports: Vec<LegacyImport>,
    /// Export table
    pub exports: Vec<LegacyExport>,
    /// Flat preload-dependency array, legacy arc order
    pub preload_dependencies: Vec<PackageIndex>,
    /// Bulk-data resource table
    pub data_resources: Vec<DataResourceEntry>,
    /// Export body bytes, indexed by each export's `serial_offset`
    pub exports_blob: Vec<u8>,
    /// Raw bulk-data file contents, if supplied
    pub bulk_data: Option<Vec<u8>>,
    /// Set by the converter when an import could not be resolved and a
    /// fallback was substituted (§7)
    pub has_failed_import_map_entries: bool,
}

impl LegacyPackage {
    /// Look up a name-map entry by index.
    pub fn name_at(&self, index: u32) -> Option<&str> {
        self.name_map.get(index as usize).map(String::as_str)
    }

    /// Render a `MappedName` against this package's name map.
    pub fn render(&self, name: MappedName) -> Option<String> {
        self.name_at(name.index).map(|base| name.render(base))
    }
}
