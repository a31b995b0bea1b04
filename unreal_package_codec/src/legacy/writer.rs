//! Two-pass legacy header serialization (§4.2, §6, §9 design notes)
//!
//! The header's own section offsets depend on the header's total size, which
//! in turn depends on the export table. Rather than seek-and-patch a single
//! buffer, each section is built into its own `Vec<u8>` first; once every
//! section's length is known the fixed front-matter (and the export table's
//! `serial_offset` fields) are built a second time with the real offsets.

use std::io::Write;

use byteorder::{WriteBytesExt, LE};
use unreal_helpers::UnrealWriteExt;

use super::{LegacyPackage, LEGACY_FILE_VERSION, LEGACY_MAGIC, LEGACY_UE3_VERSION};
use crate::error::Error;
use crate::flags::EPackageFlags;
use crate::types::MappedName;

fn write_mapped_name<W: Write>(writer: &mut W, name: MappedName) -> Result<(), Error> {
    writer.write_i32::<LE>(name.index as i32)?;
    writer.write_i32::<LE>(name.number as i32)?;
    Ok(())
}

/// Write one legacy name-table entry: a plain UTF-8 fstring plus a zeroed hash.
fn write_name_entry<W: Write>(writer: &mut W, name: &str) -> Result<(), Error> {
    let bytes = name.as_bytes();
    writer.write_i32::<LE>(bytes.len() as i32 + 1)?;
    writer.write_all(bytes)?;
    writer.write_u8(0)?;
    writer.write_u32::<LE>(0)?;
    Ok(())
}

fn build_name_table(pkg: &LegacyPackage) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    for name in &pkg.name_map {
        write_name_entry(&mut buf, name)?;
    }
    Ok(buf)
}

fn build_import_table(pkg: &LegacyPackage) -> Result<Vec<u8>, Error> {
    let editor_only = pkg.package_flags.contains(EPackageFlags::FILTER_EDITOR_ONLY);
    let mut buf = Vec::new();
    for import in &pkg.imports {
        write_mapped_name(&mut buf, import.class_package)?;
        write_mapped_name(&mut buf, import.class_name)?;
        buf.write_i32::<LE>(import.outer_index.index)?;
        write_mapped_name(&mut buf, import.object_name)?;
        if !editor_only {
            write_mapped_name(&mut buf, import.package_name.unwrap_or_default())?;
        }
        buf.write_i32::<LE>(import.optional as i32)?;
    }
    Ok(buf)
}

/// Build the export table. `serial_offsets` overrides each export's
/// `serial_offset` field; pass zeros on the measuring pass.
fn build_export_table(pkg: &LegacyPackage, serial_offsets: &[i64]) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    for (export, &serial_offset) in pkg.exports.iter().zip(serial_offsets) {
        buf.write_i32::<LE>(export.class_index.index)?;
        buf.write_i32::<LE>(export.super_index.index)?;
        buf.write_i32::<LE>(export.template_index.index)?;
        buf.write_i32::<LE>(export.outer_index.index)?;
        write_mapped_name(&mut buf, export.object_name)?;
        buf.write_u32::<LE>(export.object_flags.bits())?;
        buf.write_i64::<LE>(export.serial_size)?;
        buf.write_i64::<LE>(serial_offset)?;
        buf.write_i32::<LE>(0)?; // forced-export
        buf.write_i32::<LE>(export.filter.not_for_client as i32)?;
        buf.write_i32::<LE>(export.filter.not_for_server as i32)?;
        buf.write_i32::<LE>(0)?; // inherited-instance
        buf.write_u32::<LE>(0)?; // package flags
        buf.write_i32::<LE>(0)?; // not-always-loaded
        buf.write_i32::<LE>(export.is_asset as i32)?;
        buf.write_i32::<LE>(export.generate_public_hash as i32)?;
        buf.write_i32::<LE>(export.arcs.serialize_before_serialize)?;
        buf.write_i32::<LE>(export.arcs.create_before_serialize)?;
        buf.write_i32::<LE>(export.arcs.serialize_before_create)?;
        buf.write_i32::<LE>(export.arcs.create_before_create)?;
        buf.write_i32::<LE>(export.arcs.first_export_dependency_index)?;
    }
    Ok(buf)
}

fn build_depends_table(pkg: &LegacyPackage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(pkg.exports.len() * 4);
    for _ in &pkg.exports {
        buf.extend_from_slice(&0i32.to_le_bytes());
    }
    buf
}

fn build_asset_registry_block() -> Vec<u8> {
    0i32.to_le_bytes().to_vec()
}

fn build_preload_dependency_array(pkg: &LegacyPackage) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    for arc in &pkg.preload_dependencies {
        buf.write_i32::<LE>(arc.index)?;
    }
    Ok(buf)
}

fn build_data_resource_block(pkg: &LegacyPackage) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.write_u32::<LE>(0)?; // data resource version
    buf.write_i32::<LE>(pkg.data_resources.len() as i32)?;
    for entry in &pkg.data_resources {
        buf.write_u32::<LE>(entry.flags)?;
        buf.write_i64::<LE>(entry.serial_offset)?;
        buf.write_i64::<LE>(entry.duplicate_serial_offset)?;
        buf.write_i64::<LE>(entry.serial_size)?;
        buf.write_i64::<LE>(entry.raw_size)?;
        buf.write_i32::<LE>(entry.outer_index)?;
        buf.write_u32::<LE>(entry.legacy_bulk_data_flags)?;
    }
    Ok(buf)
}

/// Numeric fields of the fixed header front-matter that depend on section
/// lengths computed after a first measuring pass.
#[derive(Debug, Default)]
struct HeaderOffsets {
    name_offset: i32,
    import_offset: i32,
    export_offset: i32,
    depends_offset: i32,
    asset_registry_offset: i32,
    preload_dependency_offset: i32,
    data_resource_offset: i32,
    total_header_size: i32,
    bulk_data_start_offset: i64,
}

fn write_zero_engine_version<W: Write>(writer: &mut W) -> Result<(), Error> {
    writer.write_u16::<LE>(0)?;
    writer.write_u16::<LE>(0)?;
    writer.write_u16::<LE>(0)?;
    writer.write_i32::<LE>(0)?;
    writer.write_fstring(None)?;
    Ok(())
}

fn build_fixed_header(pkg: &LegacyPackage, offsets: &HeaderOffsets) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();

    buf.write_u32::<LE>(LEGACY_MAGIC)?;
    if pkg.version.unversioned {
        buf.write_i32::<LE>(LEGACY_FILE_VERSION)?;
        buf.write_i32::<LE>(LEGACY_UE3_VERSION)?;
        buf.write_i32::<LE>(0)?;
        buf.write_i32::<LE>(0)?;
        buf.write_i32::<LE>(0)?;
        buf.write_i32::<LE>(0)?; // custom version count
    } else {
        buf.write_i32::<LE>(LEGACY_FILE_VERSION)?;
        buf.write_i32::<LE>(LEGACY_UE3_VERSION)?;
        buf.write_i32::<LE>(pkg.version.file_version_ue4)?;
        buf.write_i32::<LE>(pkg.version.file_version_ue5)?;
        buf.write_i32::<LE>(pkg.version.licensee_version)?;
        buf.write_i32::<LE>(pkg.version.custom_versions.len() as i32)?;
        for (guid, version) in &pkg.version.custom_versions {
            buf.write_all(&guid.0)?;
            buf.write_i32::<LE>(*version)?;
        }
    }

    buf.write_i32::<LE>(offsets.total_header_size)?;
    buf.write_fstring(Some(&pkg.folder_name))?;
    buf.write_u32::<LE>(pkg.package_flags.bits())?;

    buf.write_i32::<LE>(pkg.name_map.len() as i32)?;
    buf.write_i32::<LE>(offsets.name_offset)?;
    buf.write_i32::<LE>(0)?; // soft object paths count
    buf.write_i32::<LE>(0)?; // soft object paths offset
    buf.write_i32::<LE>(0)?; // gatherable text count
    buf.write_i32::<LE>(0)?; // gatherable text offset
    buf.write_i32::<LE>(pkg.exports.len() as i32)?;
    buf.write_i32::<LE>(offsets.export_offset)?;
    buf.write_i32::<LE>(pkg.imports.len() as i32)?;
    buf.write_i32::<LE>(offsets.import_offset)?;
    buf.write_i32::<LE>(offsets.depends_offset)?;
    buf.write_i32::<LE>(0)?; // soft package refs count
    buf.write_i32::<LE>(0)?; // soft package refs offset
    buf.write_i32::<LE>(0)?; // searchable names offset
    buf.write_i32::<LE>(0)?; // thumbnail table offset
    buf.write_all(&[0u8; 16])?; // package guid

    buf.write_i32::<LE>(pkg.exports.len() as i32)?; // generation: export count
    buf.write_i32::<LE>(pkg.name_map.len() as i32)?; // generation: name count

    write_zero_engine_version(&mut buf)?; // engine version
    write_zero_engine_version(&mut buf)?; // compatible engine version

    buf.write_i32::<LE>(0)?; // compression flags
    buf.write_i32::<LE>(0)?; // compressed chunks count
    buf.write_u32::<LE>(0)?; // package source
    buf.write_i32::<LE>(0)?; // additional packages to cook count
    buf.write_i32::<LE>(offsets.asset_registry_offset)?;
    buf.write_i64::<LE>(offsets.bulk_data_start_offset)?;
    buf.write_i32::<LE>(0)?; // world tile info offset
    buf.write_i32::<LE>(0)?; // chunk id count
    buf.write_i32::<LE>(pkg.preload_dependencies.len() as i32)?;
    buf.write_i32::<LE>(offsets.preload_dependency_offset)?;
    buf.write_i32::<LE>(0)?; // names referenced from export data count
    buf.write_i64::<LE>(-1)?; // payload toc offset
    buf.write_i32::<LE>(offsets.data_resource_offset)?;

    Ok(buf)
}

/// Serialize a [`LegacyPackage`] into its header byte stream and exports byte
/// stream, resolving every export's `serial_offset` along the way.
pub fn write_legacy_package(pkg: &LegacyPackage) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let name_bytes = build_name_table(pkg)?;
    let import_bytes = build_import_table(pkg)?;
    let placeholder_offsets = vec![0i64; pkg.exports.len()];
    let export_bytes_measure = build_export_table(pkg, &placeholder_offsets)?;
    let depends_bytes = build_depends_table(pkg);
    let asset_registry_bytes = build_asset_registry_block();
    let preload_bytes = build_preload_dependency_array(pkg)?;
    let data_resource_bytes = build_data_resource_block(pkg)?;

    let fixed_header_len = build_fixed_header(pkg, &HeaderOffsets::default())?.len();

    let name_offset = fixed_header_len;
    let import_offset = name_offset + name_bytes.len();
    let export_offset = import_offset + import_bytes.len();
    let depends_offset = export_offset + export_bytes_measure.len();
    let asset_registry_offset = depends_offset + depends_bytes.len();
    let preload_dependency_offset = asset_registry_offset + asset_registry_bytes.len();
    let data_resource_offset = preload_dependency_offset + preload_bytes.len();
    let header_size = data_resource_offset + data_resource_bytes.len();

    let total_export_size: i64 = pkg.exports.iter().map(|e| e.serial_size).sum();
    let bulk_data_start_offset = header_size as i64 + total_export_size;

    let mut cumulative = header_size as i64;
    let mut serial_offsets = Vec::with_capacity(pkg.exports.len());
    for export in &pkg.exports {
        serial_offsets.push(cumulative);
        cumulative += export.serial_size;
    }

    let export_bytes = build_export_table(pkg, &serial_offsets)?;

    let offsets = HeaderOffsets {
        name_offset: name_offset as i32,
        import_offset: import_offset as i32,
        export_offset: export_offset as i32,
        depends_offset: depends_offset as i32,
        asset_registry_offset: asset_registry_offset as i32,
        preload_dependency_offset: preload_dependency_offset as i32,
        data_resource_offset: data_resource_offset as i32,
        total_header_size: header_size as i32,
        bulk_data_start_offset,
    };

    let fixed_header = build_fixed_header(pkg, &offsets)?;
    if fixed_header.len() != fixed_header_len {
        return Err(Error::invariant(
            "fixed header length changed between measuring and final pass",
        ));
    }

    let mut header = Vec::with_capacity(header_size);
    header.extend_from_slice(&fixed_header);
    header.extend_from_slice(&name_bytes);
    header.extend_from_slice(&import_bytes);
    header.extend_from_slice(&export_bytes);
    header.extend_from_slice(&depends_bytes);
    header.extend_from_slice(&asset_registry_bytes);
    header.extend_from_slice(&preload_bytes);
    header.extend_from_slice(&data_resource_bytes);

    let mut exports_blob = Vec::with_capacity(pkg.exports_blob.len() + 4);
    exports_blob.extend_from_slice(&pkg.exports_blob);
    exports_blob.extend_from_slice(&LEGACY_MAGIC.to_le_bytes());

    Ok((header, exports_blob))
}
