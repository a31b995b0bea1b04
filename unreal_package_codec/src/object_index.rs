//! `PackageObjectIndex`, the tagged 64-bit reference used by zen packages (§3)

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::Error;

/// Number of bits available to the payload of a non-`Null` `PackageObjectIndex`.
const INDEX_BITS: u32 = 62;
/// Mask selecting the low [`INDEX_BITS`] bits.
const INDEX_MASK: u64 = (1u64 << INDEX_BITS) - 1;
/// Shift to the two-bit type tag occupying the top of the word.
const TYPE_SHIFT: u32 = INDEX_BITS;
/// Sentinel payload marking the `Null` variant.
const NULL_INDEX: u64 = !0u64;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u64)]
enum Kind {
    Export = 0,
    ScriptImport = 1,
    PackageImport = 2,
    Null = 3,
}

impl Kind {
    fn from_tag(tag: u64) -> Result<Self, Error> {
        match tag {
            0 => Ok(Kind::Export),
            1 => Ok(Kind::ScriptImport),
            2 => Ok(Kind::PackageImport),
            3 => Ok(Kind::Null),
            _ => Err(Error::invariant(format!(
                "package object index tag {tag} out of range"
            ))),
        }
    }
}

/// A tagged 64-bit zen reference: null, an in-package export, a script object
/// hash, or a `(package-slot, hash-slot)` pair into the imported-package and
/// imported-public-export-hash tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PackageObjectIndex {
    /// No reference
    #[default]
    Null,
    /// Refers to export `local_export_index` within the same package
    Export(u32),
    /// A hash of a `/Script/...` object path
    ScriptImport(u64),
    /// `(imported-package-slot, imported-public-export-hash-slot)`
    PackageImport(u32, u32),
}

impl PackageObjectIndex {
    /// The null reference
    pub const NULL: PackageObjectIndex = PackageObjectIndex::Null;

    /// Whether this is [`PackageObjectIndex::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, PackageObjectIndex::Null)
    }

    /// The local export index, if this is [`PackageObjectIndex::Export`]
    pub fn as_export(&self) -> Option<u32> {
        match self {
            PackageObjectIndex::Export(n) => Some(*n),
            _ => None,
        }
    }

    /// Decode a raw on-wire `u64` into a `PackageObjectIndex`.
    pub fn from_raw(raw: u64) -> Result<Self, Error> {
        if raw == NULL_INDEX {
            return Ok(PackageObjectIndex::Null);
        }

        let tag = raw >> TYPE_SHIFT;
        let payload = raw & INDEX_MASK;

        match Kind::from_tag(tag)? {
            Kind::Null => Ok(PackageObjectIndex::Null),
            Kind::Export => {
                let index = u32::try_from(payload).map_err(|_| {
                    Error::capacity_exceeded("export index in package object index overflowed u32")
                })?;
                Ok(PackageObjectIndex::Export(index))
            }
            Kind::ScriptImport => Ok(PackageObjectIndex::ScriptImport(payload)),
            Kind::PackageImport => {
                let package_slot = (payload >> 32) as u32;
                let hash_slot = (payload & 0xFFFF_FFFF) as u32;
                Ok(PackageObjectIndex::PackageImport(package_slot, hash_slot))
            }
        }
    }

    /// Encode this `PackageObjectIndex` to its on-wire `u64` representation.
    pub fn to_raw(self) -> u64 {
        match self {
            PackageObjectIndex::Null => NULL_INDEX,
            PackageObjectIndex::Export(index) => ((Kind::Export as u64) << TYPE_SHIFT) | index as u64,
            PackageObjectIndex::ScriptImport(hash) => {
                ((Kind::ScriptImport as u64) << TYPE_SHIFT) | (hash & INDEX_MASK)
            }
            PackageObjectIndex::PackageImport(package_slot, hash_slot) => {
                let payload = ((package_slot as u64) << 32) | hash_slot as u64;
                ((Kind::PackageImport as u64) << TYPE_SHIFT) | (payload & INDEX_MASK)
            }
        }
    }

    /// Read a `PackageObjectIndex` from `reader`.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, Error> {
        PackageObjectIndex::from_raw(reader.read_u64::<LE>()?)
    }

    /// Write a `PackageObjectIndex` to `writer`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u64::<LE>(self.to_raw())?;
        Ok(())
    }
}

/// Canonical CityHash64-based hash of a `/Script/...` object path, used when no
/// script-objects database entry is available to provide the authoritative hash.
pub fn canonical_script_hash(path: &str) -> u64 {
    crate::crc::cityhash64_to_lower(path) & INDEX_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_round_trips() {
        let mut buf = Vec::new();
        PackageObjectIndex::Null.write(&mut buf).unwrap();
        assert_eq!(
            PackageObjectIndex::read(&mut buf.as_slice()).unwrap(),
            PackageObjectIndex::Null
        );
    }

    #[test]
    fn export_round_trips() {
        let mut buf = Vec::new();
        PackageObjectIndex::Export(7).write(&mut buf).unwrap();
        assert_eq!(
            PackageObjectIndex::read(&mut buf.as_slice()).unwrap(),
            PackageObjectIndex::Export(7)
        );
    }

    #[test]
    fn package_import_round_trips() {
        let mut buf = Vec::new();
        PackageObjectIndex::PackageImport(3, 9)
            .write(&mut buf)
            .unwrap();
        assert_eq!(
            PackageObjectIndex::read(&mut buf.as_slice()).unwrap(),
            PackageObjectIndex::PackageImport(3, 9)
        );
    }

    #[test]
    fn script_import_round_trips() {
        let hash = canonical_script_hash("/Script/Engine/StaticMesh");
        let mut buf = Vec::new();
        PackageObjectIndex::ScriptImport(hash)
            .write(&mut buf)
            .unwrap();
        assert_eq!(
            PackageObjectIndex::read(&mut buf.as_slice()).unwrap(),
            PackageObjectIndex::ScriptImport(hash)
        );
    }
}
