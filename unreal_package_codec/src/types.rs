//! Name and reference primitives shared by the legacy and zen data models (§3)

use crate::crc;
use crate::error::Error;

/// A name-table reference: an index into a name map plus a numeric suffix.
///
/// `number == 0` means the rendered name carries no suffix; `number == k > 0`
/// renders as `"<base>_<k - 1>"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct MappedName {
    /// Index into the owning name map
    pub index: u32,
    /// Numeric suffix, `0` for none
    pub number: u32,
}

impl MappedName {
    /// Create a new `MappedName`
    pub fn new(index: u32, number: u32) -> Self {
        MappedName { index, number }
    }

    /// Render this name against a base string, appending `_<k>` when
    /// `number > 0`.
    pub fn render(&self, base: &str) -> String {
        render_name(base, self.number)
    }
}

/// Render a base name plus its numeric suffix the way the runtime does:
/// `number == 0` has no suffix, `number == k > 0` renders `"<base>_<k - 1>"`.
pub fn render_name(base: &str, number: u32) -> String {
    if number == 0 {
        base.to_string()
    } else {
        format!("{base}_{}", number - 1)
    }
}

/// Split a rendered name into `(base, number)` the way the legacy name map
/// would have stored it: a trailing `_<digits>` suffix with no leading zero
/// becomes `number = digits + 1`.
pub fn split_rendered_name(rendered: &str) -> (&str, u32) {
    if let Some(pos) = rendered.rfind('_') {
        let (base, suffix) = rendered.split_at(pos);
        let suffix = &suffix[1..];
        if let Ok(n) = suffix.parse::<u32>() {
            if suffix == n.to_string() {
                return (base, n + 1);
            }
        }
    }
    (rendered, 0)
}

/// A legacy signed reference: `0` is null, positive `n` refers to export
/// `n - 1`, negative `n` refers to import `-n - 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct PackageIndex {
    /// Raw signed index
    pub index: i32,
}

impl PackageIndex {
    /// The null reference
    pub const NULL: PackageIndex = PackageIndex { index: 0 };

    /// Create a `PackageIndex` from a raw signed value
    pub fn new(index: i32) -> Self {
        PackageIndex { index }
    }

    /// Create a `PackageIndex` referring to import `import_index`
    pub fn from_import(import_index: i32) -> Result<Self, Error> {
        if import_index < 0 {
            return Err(Error::invalid_package_index(
                "import index must not be negative",
            ));
        }
        Ok(PackageIndex::new(-import_index - 1))
    }

    /// Create a `PackageIndex` referring to export `export_index`
    pub fn from_export(export_index: i32) -> Result<Self, Error> {
        if export_index < 0 {
            return Err(Error::invalid_package_index(
                "export index must not be negative",
            ));
        }
        Ok(PackageIndex::new(export_index + 1))
    }

    /// Whether this reference is null
    pub fn is_null(&self) -> bool {
        self.index == 0
    }

    /// Whether this reference points into the import table
    pub fn is_import(&self) -> bool {
        self.index < 0
    }

    /// Whether this reference points into the export table
    pub fn is_export(&self) -> bool {
        self.index > 0
    }

    /// The import-table slot this reference points to, if any
    pub fn import_index(&self) -> Option<i32> {
        self.is_import().then_some(-self.index - 1)
    }

    /// The export-table slot this reference points to, if any
    pub fn export_index(&self) -> Option<i32> {
        self.is_export().then_some(self.index - 1)
    }
}

/// A content-addressed id for a foreign package, keyed by its lowercase path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    /// Raw id
    pub id: u64,
}

impl PackageId {
    /// Derive a `PackageId` from a package path (e.g. `/Game/Library`)
    pub fn from_name(package_path: &str) -> Self {
        PackageId {
            id: crc::package_id_hash(package_path),
        }
    }
}

/// `CityHash64` over the lowercase in-package path of a publicly addressable
/// export. Zero means "not public".
pub fn public_export_hash(in_package_path: &str) -> u64 {
    crc::cityhash64_to_lower(in_package_path)
}

/// The four kinds of preload-ordering arc between two exports (§3, GLOSSARY).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArcKind {
    /// `from` must be created before `to` is created
    CreateBeforeCreate,
    /// `from` must be serialized before `to` is created
    SerializeBeforeCreate,
    /// `from` must be created before `to` is serialized
    CreateBeforeSerialize,
    /// `from` must be serialized before `to` is serialized
    SerializeBeforeSerialize,
}

/// Legacy preload-dependency arrays are emitted in this order (§3, §6).
pub const LEGACY_ARC_ORDER: [ArcKind; 4] = [
    ArcKind::SerializeBeforeSerialize,
    ArcKind::CreateBeforeSerialize,
    ArcKind::SerializeBeforeCreate,
    ArcKind::CreateBeforeCreate,
];

/// Zen dependency bundles are emitted in this order (§3, §4.3).
pub const ZEN_ARC_ORDER: [ArcKind; 4] = [
    ArcKind::CreateBeforeCreate,
    ArcKind::SerializeBeforeCreate,
    ArcKind::CreateBeforeSerialize,
    ArcKind::SerializeBeforeSerialize,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_split_suffix_round_trips() {
        assert_eq!(render_name("Actor", 4), "Actor_3");
        assert_eq!(split_rendered_name("Actor_3"), ("Actor", 4));
        assert_eq!(render_name("Base", 0), "Base");
        assert_eq!(split_rendered_name("Base"), ("Base", 0));
    }

    #[test]
    fn package_index_null_is_zero() {
        assert!(PackageIndex::NULL.is_null());
        assert!(!PackageIndex::NULL.is_import());
        assert!(!PackageIndex::NULL.is_export());
    }

    #[test]
    fn package_index_import_export_round_trip() {
        let import = PackageIndex::from_import(3).unwrap();
        assert_eq!(import.import_index(), Some(3));
        let export = PackageIndex::from_export(2).unwrap();
        assert_eq!(export.export_index(), Some(2));
    }
}
