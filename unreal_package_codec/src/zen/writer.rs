//! Single-pass zen package serialization with a back-patched summary (§4.3, §6)
//!
//! Every section after the summary is fixed-width or self-describing, so
//! unlike the legacy writer no section needs to be built twice: section
//! lengths are known as soon as each section is built, and the summary
//! (itself fixed-width) is written last with the accumulated offsets.

use std::io::Write;

use byteorder::{WriteBytesExt, LE};

use super::dependency_bundle::write_dependency_bundles;
use super::package::{ExportBundleEntry, ZenExport, ZenPackage, ZenPackageSummary};
use crate::error::Error;
use crate::name_batch::{write_name_batch, NameEncoding};

/// Size in bytes of one serialized [`ZenExport`] entry.
pub const EXPORT_ENTRY_SIZE: usize = 72;
/// Size in bytes of one serialized bulk-data map entry.
pub const BULK_DATA_ENTRY_SIZE: usize = 32;
/// Size in bytes of one serialized export-bundle entry.
pub const EXPORT_BUNDLE_ENTRY_SIZE: usize = 8;
/// Size in bytes of one serialized dependency-bundle header.
pub const DEPENDENCY_HEADER_SIZE: usize = 20;
/// Size in bytes of the fixed-width summary.
pub const SUMMARY_SIZE: usize = 56;

fn write_export_entry<W: Write>(writer: &mut W, export: &ZenExport) -> Result<(), Error> {
    writer.write_i64::<LE>(export.cooked_serial_offset)?;
    writer.write_i64::<LE>(export.cooked_serial_size)?;
    writer.write_u32::<LE>(export.object_name.index)?;
    writer.write_u32::<LE>(export.object_name.number)?;
    writer.write_u32::<LE>(export.object_flags.bits())?;
    writer.write_u8(export.filter_flags.bits())?;
    writer.write_all(&[0u8; 3])?;
    writer.write_u64::<LE>(export.class_index.to_raw())?;
    writer.write_u64::<LE>(export.super_index.to_raw())?;
    writer.write_u64::<LE>(export.template_index.to_raw())?;
    writer.write_u64::<LE>(export.outer_index.to_raw())?;
    writer.write_u64::<LE>(export.public_export_hash)?;
    Ok(())
}

fn write_export_bundle_entry<W: Write>(writer: &mut W, entry: &ExportBundleEntry) -> Result<(), Error> {
    writer.write_u32::<LE>(entry.local_export_index)?;
    writer.write_u32::<LE>(entry.command_type.into())?;
    Ok(())
}

fn write_summary<W: Write>(writer: &mut W, summary: &ZenPackageSummary) -> Result<(), Error> {
    writer.write_u32::<LE>(summary.package_name.index)?;
    writer.write_u32::<LE>(summary.package_name.number)?;
    writer.write_u32::<LE>(summary.package_flags.bits())?;
    writer.write_u32::<LE>(summary.cooked_header_size)?;
    writer.write_u32::<LE>(summary.names_offset)?;
    writer.write_u32::<LE>(summary.bulk_data_map_offset)?;
    writer.write_u32::<LE>(summary.imported_public_export_hashes_offset)?;
    writer.write_u32::<LE>(summary.import_map_offset)?;
    writer.write_u32::<LE>(summary.export_map_offset)?;
    writer.write_u32::<LE>(summary.export_bundle_entries_offset)?;
    writer.write_u32::<LE>(summary.dependency_bundle_headers_offset)?;
    writer.write_u32::<LE>(summary.dependency_bundle_entries_offset)?;
    writer.write_u32::<LE>(summary.imported_package_names_offset)?;
    writer.write_u32::<LE>(summary.header_size)?;
    Ok(())
}

/// Serialize a [`ZenPackage`] into a single byte buffer, back-patching the
/// summary's section offsets once every section's length is known (§4.3).
pub fn write_zen_package(pkg: &ZenPackage, encoding: NameEncoding) -> Result<Vec<u8>, Error> {
    let mut names_bytes = Vec::new();
    write_name_batch(&mut names_bytes, &pkg.name_map, encoding)?;

    let mut bulk_data_bytes = Vec::new();
    bulk_data_bytes.write_i64::<LE>((pkg.bulk_data_map.len() * BULK_DATA_ENTRY_SIZE) as i64)?;
    for entry in &pkg.bulk_data_map {
        bulk_data_bytes.write_u64::<LE>(entry.serial_offset)?;
        bulk_data_bytes.write_u64::<LE>(entry.duplicate_serial_offset)?;
        bulk_data_bytes.write_u64::<LE>(entry.serial_size)?;
        bulk_data_bytes.write_u32::<LE>(entry.flags)?;
        bulk_data_bytes.write_u32::<LE>(entry.padding)?;
    }

    let mut hashes_bytes = Vec::new();
    for hash in &pkg.imported_public_export_hashes {
        hashes_bytes.write_u64::<LE>(*hash)?;
    }

    let mut import_map_bytes = Vec::new();
    for entry in &pkg.import_map {
        import_map_bytes.write_u64::<LE>(entry.to_raw())?;
    }

    let mut export_map_bytes = Vec::new();
    for export in &pkg.export_map {
        write_export_entry(&mut export_map_bytes, export)?;
    }

    let mut export_bundle_bytes = Vec::new();
    for entry in &pkg.export_bundle_entries {
        write_export_bundle_entry(&mut export_bundle_bytes, entry)?;
    }

    let mut dependency_headers_bytes = Vec::new();
    write_dependency_bundles(
        &mut dependency_headers_bytes,
        &pkg.dependency_bundle_headers,
        &pkg.dependency_bundle_entries,
    )?;

    let mut imported_package_names_bytes = Vec::new();
    let names: Vec<String> = pkg.imported_packages.iter().map(|p| p.name.clone()).collect();
    write_name_batch(&mut imported_package_names_bytes, &names, encoding)?;
    for imported in &pkg.imported_packages {
        imported_package_names_bytes.write_i32::<LE>(imported.number as i32)?;
    }

    let names_offset = SUMMARY_SIZE;
    let bulk_data_map_offset = names_offset + names_bytes.len();
    let imported_public_export_hashes_offset = bulk_data_map_offset + bulk_data_bytes.len();
    let import_map_offset = imported_public_export_hashes_offset + hashes_bytes.len();
    let export_map_offset = import_map_offset + import_map_bytes.len();
    let export_bundle_entries_offset = export_map_offset + export_map_bytes.len();
    let dependency_bundle_headers_offset = export_bundle_entries_offset + export_bundle_bytes.len();
    let dependency_headers_len = DEPENDENCY_HEADER_SIZE * pkg.dependency_bundle_headers.len();
    let dependency_bundle_entries_offset = dependency_bundle_headers_offset + dependency_headers_len;
    let imported_package_names_offset = dependency_bundle_headers_offset + dependency_headers_bytes.len();
    let header_size = imported_package_names_offset + imported_package_names_bytes.len();

    let summary = ZenPackageSummary {
        package_name: pkg.summary.package_name,
        package_flags: pkg.summary.package_flags,
        cooked_header_size: pkg.summary.cooked_header_size,
        names_offset: names_offset as u32,
        bulk_data_map_offset: bulk_data_map_offset as u32,
        imported_public_export_hashes_offset: imported_public_export_hashes_offset as u32,
        import_map_offset: import_map_offset as u32,
        export_map_offset: export_map_offset as u32,
        export_bundle_entries_offset: export_bundle_entries_offset as u32,
        dependency_bundle_headers_offset: dependency_bundle_headers_offset as u32,
        dependency_bundle_entries_offset: dependency_bundle_entries_offset as u32,
        imported_package_names_offset: imported_package_names_offset as u32,
        header_size: header_size as u32,
    };

    let mut out = Vec::with_capacity(header_size + pkg.body.len());
    write_summary(&mut out, &summary)?;
    out.extend_from_slice(&names_bytes);
    out.extend_from_slice(&bulk_data_bytes);
    out.extend_from_slice(&hashes_bytes);
    out.extend_from_slice(&import_map_bytes);
    out.extend_from_slice(&export_map_bytes);
    out.extend_from_slice(&export_bundle_bytes);
    out.extend_from_slice(&dependency_headers_bytes);
    out.extend_from_slice(&imported_package_names_bytes);
    out.extend_from_slice(&pkg.body);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_index::PackageObjectIndex;
    use crate::types::MappedName;
    use crate::zen::dependency_bundle::DependencyBundleHeader;

    /// A dependency bundle with at least one header whose entries are
    /// non-empty, so the headers block and entries block have different
    /// lengths and a one-block offset error is observable.
    #[test]
    fn dependency_bundle_entries_offset_points_past_headers_not_names() {
        let pkg = ZenPackage {
            summary: ZenPackageSummary {
                package_name: MappedName::new(0, 0),
                ..Default::default()
            },
            name_map: vec!["Root".to_string()],
            dependency_bundle_headers: vec![DependencyBundleHeader {
                create_before_create_count: 1,
                first_entry_index: 0,
                ..Default::default()
            }],
            dependency_bundle_entries: vec![PackageObjectIndex::Export(0)],
            ..Default::default()
        };

        let bytes = write_zen_package(&pkg, NameEncoding::Strict).unwrap();

        let headers_offset = pkg_summary_field(&bytes, OFFSET_DEPENDENCY_BUNDLE_HEADERS);
        let entries_offset = pkg_summary_field(&bytes, OFFSET_DEPENDENCY_BUNDLE_ENTRIES);
        let names_offset = pkg_summary_field(&bytes, OFFSET_IMPORTED_PACKAGE_NAMES);

        let headers_len = DEPENDENCY_HEADER_SIZE * pkg.dependency_bundle_headers.len();
        assert_eq!(entries_offset, headers_offset + headers_len as u32);
        assert_ne!(entries_offset, names_offset);

        // The entries offset must land on the one flat entry we wrote: its
        // raw `u64` should equal `PackageObjectIndex::Export(0)`'s encoding.
        let entry = u64::from_le_bytes(bytes[entries_offset as usize..entries_offset as usize + 8].try_into().unwrap());
        assert_eq!(entry, PackageObjectIndex::Export(0).to_raw());
    }

    const OFFSET_DEPENDENCY_BUNDLE_HEADERS: usize = 40;
    const OFFSET_DEPENDENCY_BUNDLE_ENTRIES: usize = 44;
    const OFFSET_IMPORTED_PACKAGE_NAMES: usize = 48;

    fn pkg_summary_field(bytes: &[u8], field_offset: usize) -> u32 {
        u32::from_le_bytes(bytes[field_offset..field_offset + 4].try_into().unwrap())
    }
}
