//! `ResolvedImport`: the structural-equality key the `ZenToLegacy` converter
//! deduplicates imports by (§4.2, §9)

use crate::types::PackageIndex;

/// A fully-qualified import identity resolved from a `PackageObjectIndex`.
///
/// `outer` is the already-finalized legacy reference to the containing
/// object, rather than a nested `ResolvedImport`: since outers are resolved
/// before the entities they contain, comparing the finalized reference is
/// equivalent to comparing the outer chain structurally, and avoids an
/// unbounded recursive type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedImport {
    /// Package the import's class lives in
    pub class_package: String,
    /// Class name
    pub class_name: String,
    /// Object name, fully rendered (suffix already applied)
    pub object_name: String,
    /// Containing object, or `PackageIndex::NULL` for a package root
    pub outer: PackageIndex,
}
