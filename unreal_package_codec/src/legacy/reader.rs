//! Legacy header + exports parsing, the inverse of `legacy::writer` (§6)

use std::io::{Cursor, Read};

use byteorder::{ReadBytesExt, LE};
use unreal_helpers::{Guid, UnrealReadExt};

use super::package::{DataResourceEntry, LegacyExport, LegacyImport, LegacyVersionInfo, PreloadArcCounts};
use super::{LegacyPackage, LEGACY_MAGIC};
use crate::error::Error;
use crate::flags::{EObjectFlags, EPackageFlags, LegacyExportFilter};
use crate::types::{MappedName, PackageIndex};

fn read_mapped_name<R: Read>(reader: &mut R) -> Result<MappedName, Error> {
    let index = reader.read_i32::<LE>()?;
    let number = reader.read_i32::<LE>()?;
    Ok(MappedName::new(index as u32, number as u32))
}

fn read_name_entry<R: Read>(reader: &mut R) -> Result<String, Error> {
    let len = reader.read_i32::<LE>()?;
    if len < 1 {
        return Err(Error::malformed(
            "legacy name table",
            0,
            format!("name entry length must be >= 1, got {len}"),
        ));
    }
    let mut bytes = vec![0u8; (len - 1) as usize];
    reader.read_exact(&mut bytes)?;
    reader.read_exact(&mut [0u8])?; // null terminator
    let _hash = reader.read_u32::<LE>()?;
    Ok(String::from_utf8(bytes)?)
}

fn skip_engine_version<R: Read>(reader: &mut R) -> Result<(), Error> {
    reader.read_u16::<LE>()?;
    reader.read_u16::<LE>()?;
    reader.read_u16::<LE>()?;
    reader.read_i32::<LE>()?;
    reader.read_fstring()?;
    Ok(())
}

/// Parse a legacy package from its header and exports byte streams.
///
/// `bulk_data` is the optional companion `.ubulk`-equivalent payload; it is
/// carried through unparsed.
pub fn read_legacy_package(
    header_bytes: &[u8],
    exports_bytes: &[u8],
    bulk_data: Option<Vec<u8>>,
) -> Result<LegacyPackage, Error> {
    let mut reader = Cursor::new(header_bytes);

    let magic = reader.read_u32::<LE>()?;
    if magic != LEGACY_MAGIC {
        return Err(Error::malformed(
            "legacy header",
            0,
            format!("bad magic {magic:#x}, expected {LEGACY_MAGIC:#x}"),
        ));
    }

    let _legacy_version = reader.read_i32::<LE>()?;
    let _legacy_ue3_version = reader.read_i32::<LE>()?;
    let file_version_ue4 = reader.read_i32::<LE>()?;
    let file_version_ue5 = reader.read_i32::<LE>()?;
    let licensee_version = reader.read_i32::<LE>()?;
    let custom_version_count = reader.read_i32::<LE>()?;

    let unversioned = file_version_ue4 == 0 && file_version_ue5 == 0 && licensee_version == 0 && custom_version_count == 0;

    let mut custom_versions = Vec::with_capacity(custom_version_count.max(0) as usize);
    for _ in 0..custom_version_count {
        let mut guid_bytes = [0u8; 16];
        reader.read_exact(&mut guid_bytes)?;
        let version = reader.read_i32::<LE>()?;
        custom_versions.push((Guid::new(guid_bytes), version));
    }

    let _total_header_size = reader.read_i32::<LE>()?;
    let folder_name = reader.read_fstring()?.unwrap_or_default();
    let package_flags = EPackageFlags::from_bits_truncate(reader.read_u32::<LE>()?);

    let name_count = reader.read_i32::<LE>()?;
    let name_offset = reader.read_i32::<LE>()?;
    let _soft_object_paths_count = reader.read_i32::<LE>()?;
    let _soft_object_paths_offset = reader.read_i32::<LE>()?;
    let _gatherable_text_count = reader.read_i32::<LE>()?;
    let _gatherable_text_offset = reader.read_i32::<LE>()?;
    let export_count = reader.read_i32::<LE>()?;
    let export_offset = reader.read_i32::<LE>()?;
    let import_count = reader.read_i32::<LE>()?;
    let import_offset = reader.read_i32::<LE>()?;
    let depends_offset = reader.read_i32::<LE>()?;
    let _soft_package_refs_count = reader.read_i32::<LE>()?;
    let _soft_package_refs_offset = reader.read_i32::<LE>()?;
    let _searchable_names_offset = reader.read_i32::<LE>()?;
    let _thumbnail_table_offset = reader.read_i32::<LE>()?;
    let mut _package_guid = [0u8; 16];
    reader.read_exact(&mut _package_guid)?;

    let _generation_export_count = reader.read_i32::<LE>()?;
    let _generation_name_count = reader.read_i32::<LE>()?;

    skip_engine_version(&mut reader)?;
    skip_engine_version(&mut reader)?;

    let _compression_flags = reader.read_i32::<LE>()?;
    let _compressed_chunks_count = reader.read_i32::<LE>()?;
    let _package_source = reader.read_u32::<LE>()?;
    let _additional_packages_to_cook_count = reader.read_i32::<LE>()?;
    let _asset_registry_offset = reader.read_i32::<LE>()?;
    let _bulk_data_start_offset = reader.read_i64::<LE>()?;
    let _world_tile_info_offset = reader.read_i32::<LE>()?;
    let _chunk_id_count = reader.read_i32::<LE>()?;
    let preload_dependency_count = reader.read_i32::<LE>()?;
    let preload_dependency_offset = reader.read_i32::<LE>()?;
    let _names_referenced_from_export_data_count = reader.read_i32::<LE>()?;
    let _payload_toc_offset = reader.read_i64::<LE>()?;
    let data_resource_offset = reader.read_i32::<LE>()?;

    reader.set_position(name_offset as u64);
    let mut name_map = Vec::with_capacity(name_count.max(0) as usize);
    for _ in 0..name_count {
        name_map.push(read_name_entry(&mut reader)?);
    }

    reader.set_position(import_offset as u64);
    let editor_only = package_flags.contains(EPackageFlags::FILTER_EDITOR_ONLY);
    let mut imports = Vec::with_capacity(import_count.max(0) as usize);
    for _ in 0..import_count {
        let class_package = read_mapped_name(&mut reader)?;
        let class_name = read_mapped_name(&mut reader)?;
        let outer_index = PackageIndex::new(reader.read_i32::<LE>()?);
        let object_name = read_mapped_name(&mut reader)?;
        let package_name = if !editor_only {
            Some(read_mapped_name(&mut reader)?)
        } else {
            None
        };
        let optional = reader.read_i32::<LE>()? != 0;
        imports.push(LegacyImport {
            class_package,
            class_name,
            outer_index,
            object_name,
            package_name,
            optional,
        });
    }

    reader.set_position(export_offset as u64);
    let mut exports = Vec::with_capacity(export_count.max(0) as usize);
    for _ in 0..export_count {
        let class_index = PackageIndex::new(reader.read_i32::<LE>()?);
        let super_index = PackageIndex::new(reader.read_i32::<LE>()?);
        let template_index = PackageIndex::new(reader.read_i32::<LE>()?);
        let outer_index = PackageIndex::new(reader.read_i32::<LE>()?);
        let object_name = read_mapped_name(&mut reader)?;
        let object_flags = EObjectFlags::from_bits_truncate(reader.read_u32::<LE>()?);
        let serial_size = reader.read_i64::<LE>()?;
        let serial_offset = reader.read_i64::<LE>()?;
        let _forced_export = reader.read_i32::<LE>()?;
        let not_for_client = reader.read_i32::<LE>()? != 0;
        let not_for_server = reader.read_i32::<LE>()? != 0;
        let _inherited_instance = reader.read_i32::<LE>()?;
        let _pkg_flags = reader.read_u32::<LE>()?;
        let _not_always_loaded = reader.read_i32::<LE>()?;
        let is_asset = reader.read_i32::<LE>()? != 0;
        let generate_public_hash = reader.read_i32::<LE>()? != 0;
        let serialize_before_serialize = reader.read_i32::<LE>()?;
        let create_before_serialize = reader.read_i32::<LE>()?;
        let serialize_before_create = reader.read_i32::<LE>()?;
        let create_before_create = reader.read_i32::<LE>()?;
        let first_export_dependency_index = reader.read_i32::<LE>()?;

        exports.push(LegacyExport {
            class_index,
            super_index,
            template_index,
            outer_index,
            object_name,
            object_flags,
            serial_size,
            serial_offset,
            filter: LegacyExportFilter {
                not_for_client,
                not_for_server,
            },
            is_asset,
            generate_public_hash,
            arcs: PreloadArcCounts {
                serialize_before_serialize,
                create_before_serialize,
                serialize_before_create,
                create_before_create,
                first_export_dependency_index,
            },
        });
    }

    reader.set_position(depends_offset as u64);
    for _ in 0..export_count {
        let _ = reader.read_i32::<LE>()?;
    }

    reader.set_position(preload_dependency_offset as u64);
    let mut preload_dependencies = Vec::with_capacity(preload_dependency_count.max(0) as usize);
    for _ in 0..preload_dependency_count {
        preload_dependencies.push(PackageIndex::new(reader.read_i32::<LE>()?));
    }

    reader.set_position(data_resource_offset as u64);
    let _data_resource_version = reader.read_u32::<LE>()?;
    let data_resource_count = reader.read_i32::<LE>()?;
    let mut data_resources = Vec::with_capacity(data_resource_count.max(0) as usize);
    for _ in 0..data_resource_count {
        data_resources.push(DataResourceEntry {
            flags: reader.read_u32::<LE>()?,
            serial_offset: reader.read_i64::<LE>()?,
            duplicate_serial_offset: reader.read_i64::<LE>()?,
            serial_size: reader.read_i64::<LE>()?,
            raw_size: reader.read_i64::<LE>()?,
            outer_index: reader.read_i32::<LE>()?,
            legacy_bulk_data_flags: reader.read_u32::<LE>()?,
        });
    }

    if exports_bytes.len() < 4 || exports_bytes[exports_bytes.len() - 4..] != LEGACY_MAGIC.to_le_bytes() {
        return Err(Error::malformed(
            "legacy exports blob",
            exports_bytes.len() as u64,
            "missing trailing package-tag footer",
        ));
    }
    let exports_blob = exports_bytes[..exports_bytes.len() - 4].to_vec();

    Ok(LegacyPackage {
        package_name: String::new(),
        folder_name,
        package_flags,
        version: LegacyVersionInfo {
            unversioned,
            file_version_ue4,
            file_version_ue5,
            licensee_version,
            custom_versions,
        },
        name_map,
        imports,
        exports,
        preload_dependencies,
        data_resources,
        exports_blob,
        bulk_data,
        has_failed_import_map_entries: false,
    })
}
