//! Zen header parsing, the inverse of `zen::writer` (§4.3, §6)
//!
//! The summary is fixed-width, so every section's element count is derived
//! from the gap between consecutive offsets rather than a stored count.

use std::io::{Cursor, Read};

use byteorder::{ReadBytesExt, LE};

use super::dependency_bundle::read_dependency_bundles;
use super::package::{
    BulkDataMapEntry, ExportBundleEntry, ExportCommandType, ZenExport, ZenPackage, ZenPackageSummary,
};
use super::writer::{BULK_DATA_ENTRY_SIZE, EXPORT_BUNDLE_ENTRY_SIZE, EXPORT_ENTRY_SIZE};
use crate::error::Error;
use crate::flags::{EExportFilterFlags, EObjectFlags, EPackageFlags};
use crate::name_batch::read_name_batch;
use crate::object_index::PackageObjectIndex;
use crate::types::{MappedName, PackageId};

use super::package::ImportedPackage;

fn read_export_entry<R: Read>(reader: &mut R) -> Result<ZenExport, Error> {
    let cooked_serial_offset = reader.read_i64::<LE>()?;
    let cooked_serial_size = reader.read_i64::<LE>()?;
    let object_name = MappedName::new(reader.read_u32::<LE>()?, reader.read_u32::<LE>()?);
    let object_flags = EObjectFlags::from_bits_truncate(reader.read_u32::<LE>()?);
    let filter_flags = EExportFilterFlags::from_bits_truncate(reader.read_u8()?);
    let mut padding = [0u8; 3];
    reader.read_exact(&mut padding)?;
    let class_index = PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)?;
    let super_index = PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)?;
    let template_index = PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)?;
    let outer_index = PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)?;
    let public_export_hash = reader.read_u64::<LE>()?;

    Ok(ZenExport {
        cooked_serial_offset,
        cooked_serial_size,
        object_name,
        object_flags,
        filter_flags,
        class_index,
        super_index,
        template_index,
        outer_index,
        public_export_hash,
    })
}

fn read_export_bundle_entry<R: Read>(reader: &mut R) -> Result<ExportBundleEntry, Error> {
    let local_export_index = reader.read_u32::<LE>()?;
    let command_type = ExportCommandType::try_from(reader.read_u32::<LE>()?)?;
    Ok(ExportBundleEntry {
        local_export_index,
        command_type,
    })
}

fn read_summary<R: Read>(reader: &mut R) -> Result<ZenPackageSummary, Error> {
    let package_name = MappedName::new(reader.read_u32::<LE>()?, reader.read_u32::<LE>()?);
    let package_flags = EPackageFlags::from_bits_truncate(reader.read_u32::<LE>()?);
    let cooked_header_size = reader.read_u32::<LE>()?;
    let names_offset = reader.read_u32::<LE>()?;
    let bulk_data_map_offset = reader.read_u32::<LE>()?;
    let imported_public_export_hashes_offset = reader.read_u32::<LE>()?;
    let import_map_offset = reader.read_u32::<LE>()?;
    let export_map_offset = reader.read_u32::<LE>()?;
    let export_bundle_entries_offset = reader.read_u32::<LE>()?;
    let dependency_bundle_headers_offset = reader.read_u32::<LE>()?;
    let dependency_bundle_entries_offset = reader.read_u32::<LE>()?;
    let imported_package_names_offset = reader.read_u32::<LE>()?;
    let header_size = reader.read_u32::<LE>()?;

    Ok(ZenPackageSummary {
        package_name,
        package_flags,
        cooked_header_size,
        names_offset,
        bulk_data_map_offset,
        imported_public_export_hashes_offset,
        import_map_offset,
        export_map_offset,
        export_bundle_entries_offset,
        dependency_bundle_headers_offset,
        dependency_bundle_entries_offset,
        imported_package_names_offset,
        header_size,
    })
}

/// Parse a zen package from its full serialized byte stream (header + body).
pub fn read_zen_package(bytes: &[u8]) -> Result<ZenPackage, Error> {
    let mut reader = Cursor::new(bytes);
    let summary = read_summary(&mut reader)?;

    reader.set_position(summary.names_offset as u64);
    let name_map = read_name_batch(&mut reader)?;

    reader.set_position(summary.bulk_data_map_offset as u64);
    let bulk_data_bytes = reader.read_i64::<LE>()?;
    let bulk_data_count = bulk_data_bytes as usize / BULK_DATA_ENTRY_SIZE;
    let mut bulk_data_map = Vec::with_capacity(bulk_data_count);
    for _ in 0..bulk_data_count {
        bulk_data_map.push(BulkDataMapEntry {
            serial_offset: reader.read_u64::<LE>()?,
            duplicate_serial_offset: reader.read_u64::<LE>()?,
            serial_size: reader.read_u64::<LE>()?,
            flags: reader.read_u32::<LE>()?,
            padding: reader.read_u32::<LE>()?,
        });
    }

    let hash_count = (summary.import_map_offset - summary.imported_public_export_hashes_offset) as usize / 8;
    reader.set_position(summary.imported_public_export_hashes_offset as u64);
    let mut imported_public_export_hashes = Vec::with_capacity(hash_count);
    for _ in 0..hash_count {
        imported_public_export_hashes.push(reader.read_u64::<LE>()?);
    }

    let import_count = (summary.export_map_offset - summary.import_map_offset) as usize / 8;
    reader.set_position(summary.import_map_offset as u64);
    let mut import_map = Vec::with_capacity(import_count);
    for _ in 0..import_count {
        import_map.push(PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)?);
    }

    let export_count =
        (summary.export_bundle_entries_offset - summary.export_map_offset) as usize / EXPORT_ENTRY_SIZE;
    reader.set_position(summary.export_map_offset as u64);
    let mut export_map = Vec::with_capacity(export_count);
    for _ in 0..export_count {
        export_map.push(read_export_entry(&mut reader)?);
    }

    let bundle_entry_count = (summary.dependency_bundle_headers_offset - summary.export_bundle_entries_offset)
        as usize
        / EXPORT_BUNDLE_ENTRY_SIZE;
    reader.set_position(summary.export_bundle_entries_offset as u64);
    let mut export_bundle_entries = Vec::with_capacity(bundle_entry_count);
    for _ in 0..bundle_entry_count {
        export_bundle_entries.push(read_export_bundle_entry(&mut reader)?);
    }

    reader.set_position(summary.dependency_bundle_headers_offset as u64);
    let (dependency_bundle_headers, dependency_bundle_entries) =
        read_dependency_bundles(&mut reader, export_count)?;

    reader.set_position(summary.imported_package_names_offset as u64);
    let imported_package_paths = read_name_batch(&mut reader)?;
    let mut imported_packages = Vec::with_capacity(imported_package_paths.len());
    for name in imported_package_paths {
        let number = reader.read_i32::<LE>()? as u32;
        imported_packages.push(ImportedPackage {
            id: PackageId::from_name(&name.to_lowercase()),
            name,
            number,
        });
    }

    let body = bytes[summary.header_size as usize..].to_vec();

    Ok(ZenPackage {
        summary,
        name_map,
        bulk_data_map,
        imported_public_export_hashes,
        import_map,
        export_map,
        export_bundle_headers: Vec::new(),
        export_bundle_entries,
        dependency_bundle_headers,
        dependency_bundle_entries,
        imported_packages,
        body,
    })
}
