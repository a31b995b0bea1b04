//! Dependency bundles: the zen encoding of preload arcs (§3, §4.3)
//!
//! Unlike the runtime's own internal/external arc-graph representation, this
//! codec treats every arc target uniformly as a [`PackageObjectIndex`] into a
//! single flat entries array, addressed per-export through four counts and a
//! base index, in [`ZEN_ARC_ORDER`](crate::types::ZEN_ARC_ORDER).

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::Error;
use crate::object_index::PackageObjectIndex;
use crate::types::ArcKind;

/// Per-export dependency bundle header: four arc-kind counts plus the base
/// index of this export's slice of the flat entries array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DependencyBundleHeader {
    /// Count of `CreateBeforeCreate` arcs
    pub create_before_create_count: u32,
    /// Count of `SerializeBeforeCreate` arcs
    pub serialize_before_create_count: u32,
    /// Count of `CreateBeforeSerialize` arcs
    pub create_before_serialize_count: u32,
    /// Count of `SerializeBeforeSerialize` arcs
    pub serialize_before_serialize_count: u32,
    /// Index of this export's first entry in the flat entries array
    pub first_entry_index: u32,
}

impl DependencyBundleHeader {
    /// Total number of entries this export occupies.
    pub fn total(&self) -> u32 {
        self.create_before_create_count
            + self.serialize_before_create_count
            + self.create_before_serialize_count
            + self.serialize_before_serialize_count
    }

    /// Count for a given [`ArcKind`].
    pub fn count_for(&self, kind: ArcKind) -> u32 {
        match kind {
            ArcKind::CreateBeforeCreate => self.create_before_create_count,
            ArcKind::SerializeBeforeCreate => self.serialize_before_create_count,
            ArcKind::CreateBeforeSerialize => self.create_before_serialize_count,
            ArcKind::SerializeBeforeSerialize => self.serialize_before_serialize_count,
        }
    }

    /// Write a single header.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u32::<LE>(self.create_before_create_count)?;
        writer.write_u32::<LE>(self.serialize_before_create_count)?;
        writer.write_u32::<LE>(self.create_before_serialize_count)?;
        writer.write_u32::<LE>(self.serialize_before_serialize_count)?;
        writer.write_u32::<LE>(self.first_entry_index)?;
        Ok(())
    }

    /// Read a single header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, Error> {
        Ok(DependencyBundleHeader {
            create_before_create_count: reader.read_u32::<LE>()?,
            serialize_before_create_count: reader.read_u32::<LE>()?,
            create_before_serialize_count: reader.read_u32::<LE>()?,
            serialize_before_serialize_count: reader.read_u32::<LE>()?,
            first_entry_index: reader.read_u32::<LE>()?,
        })
    }
}

/// The arcs belonging to one export, grouped by kind in [`ZEN_ARC_ORDER`](crate::types::ZEN_ARC_ORDER).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportDependencies {
    /// Targets of `CreateBeforeCreate` arcs
    pub create_before_create: Vec<PackageObjectIndex>,
    /// Targets of `SerializeBeforeCreate` arcs
    pub serialize_before_create: Vec<PackageObjectIndex>,
    /// Targets of `CreateBeforeSerialize` arcs
    pub create_before_serialize: Vec<PackageObjectIndex>,
    /// Targets of `SerializeBeforeSerialize` arcs
    pub serialize_before_serialize: Vec<PackageObjectIndex>,
}

impl ExportDependencies {
    /// Mutable access to the arc list for `kind`.
    pub fn list_mut(&mut self, kind: ArcKind) -> &mut Vec<PackageObjectIndex> {
        match kind {
            ArcKind::CreateBeforeCreate => &mut self.create_before_create,
            ArcKind::SerializeBeforeCreate => &mut self.serialize_before_create,
            ArcKind::CreateBeforeSerialize => &mut self.create_before_serialize,
            ArcKind::SerializeBeforeSerialize => &mut self.serialize_before_serialize,
        }
    }

    /// Immutable access to the arc list for `kind`.
    pub fn list(&self, kind: ArcKind) -> &[PackageObjectIndex] {
        match kind {
            ArcKind::CreateBeforeCreate => &self.create_before_create,
            ArcKind::SerializeBeforeCreate => &self.serialize_before_create,
            ArcKind::CreateBeforeSerialize => &self.create_before_serialize,
            ArcKind::SerializeBeforeSerialize => &self.serialize_before_serialize,
        }
    }

    /// Whether every arc list is empty.
    pub fn is_empty(&self) -> bool {
        self.create_before_create.is_empty()
            && self.serialize_before_create.is_empty()
            && self.create_before_serialize.is_empty()
            && self.serialize_before_serialize.is_empty()
    }
}

/// Read every export's dependency bundle: `count` headers followed by the
/// shared flat entries array (length is the sum of the header totals).
pub fn read_dependency_bundles<R: Read>(
    reader: &mut R,
    export_count: usize,
) -> Result<(Vec<DependencyBundleHeader>, Vec<PackageObjectIndex>), Error> {
    let mut headers = Vec::with_capacity(export_count);
    for _ in 0..export_count {
        headers.push(DependencyBundleHeader::read(reader)?);
    }

    let entry_count = headers.iter().map(|h| h.total() as usize).sum();
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        entries.push(PackageObjectIndex::read(reader)?);
    }

    Ok((headers, entries))
}

/// Write dependency bundle headers followed by their shared flat entries.
pub fn write_dependency_bundles<W: Write>(
    writer: &mut W,
    headers: &[DependencyBundleHeader],
    entries: &[PackageObjectIndex],
) -> Result<(), Error> {
    for header in headers {
        header.write(writer)?;
    }
    for entry in entries {
        entry.write(writer)?;
    }
    Ok(())
}

/// Flatten one export's [`ExportDependencies`] into a header (with
/// `first_entry_index` set to the current length of `entries`) and append its
/// arcs to `entries` in [`ZEN_ARC_ORDER`](crate::types::ZEN_ARC_ORDER).
pub fn append_export_dependencies(
    deps: &ExportDependencies,
    entries: &mut Vec<PackageObjectIndex>,
) -> DependencyBundleHeader {
    let first_entry_index = entries.len() as u32;
    entries.extend_from_slice(&deps.create_before_create);
    entries.extend_from_slice(&deps.serialize_before_create);
    entries.extend_from_slice(&deps.create_before_serialize);
    entries.extend_from_slice(&deps.serialize_before_serialize);

    DependencyBundleHeader {
        create_before_create_count: deps.create_before_create.len() as u32,
        serialize_before_create_count: deps.serialize_before_create.len() as u32,
        create_before_serialize_count: deps.create_before_serialize.len() as u32,
        serialize_before_serialize_count: deps.serialize_before_serialize.len() as u32,
        first_entry_index,
    }
}

/// Recover one export's [`ExportDependencies`] from its header and the shared
/// flat entries array.
pub fn export_dependencies_from_bundle(
    header: &DependencyBundleHeader,
    entries: &[PackageObjectIndex],
) -> ExportDependencies {
    let mut offset = header.first_entry_index as usize;
    let mut take = |count: u32| -> Vec<PackageObjectIndex> {
        let slice = entries[offset..offset + count as usize].to_vec();
        offset += count as usize;
        slice
    };

    ExportDependencies {
        create_before_create: take(header.create_before_create_count),
        serialize_before_create: take(header.serialize_before_create_count),
        create_before_serialize: take(header.create_before_serialize_count),
        serialize_before_serialize: take(header.serialize_before_serialize_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_flat_entries() {
        let deps = ExportDependencies {
            create_before_create: vec![PackageObjectIndex::Export(2)],
            serialize_before_create: vec![],
            create_before_serialize: vec![],
            serialize_before_serialize: vec![PackageObjectIndex::Export(3)],
        };

        let mut entries = Vec::new();
        let header = append_export_dependencies(&deps, &mut entries);
        assert_eq!(header.total(), 2);

        let recovered = export_dependencies_from_bundle(&header, &entries);
        assert_eq!(recovered, deps);
    }

    #[test]
    fn header_round_trips_bytes() {
        let header = DependencyBundleHeader {
            create_before_create_count: 1,
            serialize_before_create_count: 0,
            create_before_serialize_count: 0,
            serialize_before_serialize_count: 1,
            first_entry_index: 5,
        };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        let read_back = DependencyBundleHeader::read(&mut buf.as_slice()).unwrap();
        assert_eq!(read_back, header);
    }
}
