//! The script-objects database: a process-wide, read-only external collaborator (§5, §9)
//!
//! The converter needs to translate `/Script/...` object paths to and from
//! `ScriptImport` hashes, but loading and owning that database is outside the
//! core's responsibility, callers provide an implementation of
//! [`ScriptObjectsDatabase`], typically backed by a singleton initialized once
//! under a mutex and handed out as a shared, read-only view thereafter.

use crate::object_index::canonical_script_hash;

/// One entry of the script-objects database: a compile-time object the
/// runtime provides by path rather than by explicit export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptObjectEntry {
    /// Fully-qualified object path, e.g. `/Script/Engine/Default__StaticMesh`
    pub object_path: String,
    /// Hash of the containing entry, or `None` if this entry is a package root
    pub outer_hash: Option<u64>,
    /// Whether this entry denotes a `UClass` object
    pub is_class: bool,
    /// Authoritative class hash for a class-default-object entry, when known.
    /// Takes priority over the heuristic CDO detection rule (§9 open question b).
    pub cdo_class_hash: Option<u64>,
}

impl ScriptObjectEntry {
    /// Whether this entry is a package root (its outer is null).
    pub fn is_package_root(&self) -> bool {
        self.outer_hash.is_none()
    }
}

/// Read-only lookup interface into the script-objects database.
///
/// Implementations are expected to be cheap to clone (e.g. an `Arc` around a
/// loaded table) and safe to query concurrently; this crate never mutates a
/// database through this trait.
pub trait ScriptObjectsDatabase {
    /// Look up an entry by its `ScriptImport` hash.
    fn lookup(&self, hash: u64) -> Option<ScriptObjectEntry>;

    /// Look up the hash for a fully-qualified script object path.
    fn hash_for_path(&self, path: &str) -> Option<u64>;

    /// Look up the hash for a bare object name, used as the `LegacyToZen`
    /// fallback when a full-path lookup misses (§4.3).
    fn hash_for_name(&self, bare_name: &str) -> Option<u64>;
}

/// A database with no entries. Every lookup misses, so the converters fall
/// back to their synthetic-name and canonical-hash policies.
///
/// Useful for tests and for callers that have not wired up a real database;
/// conversions still succeed, just with `has_failed_import_map_entries` set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScriptObjectsDatabase;

impl ScriptObjectsDatabase for NullScriptObjectsDatabase {
    fn lookup(&self, _hash: u64) -> Option<ScriptObjectEntry> {
        None
    }

    fn hash_for_path(&self, _path: &str) -> Option<u64> {
        None
    }

    fn hash_for_name(&self, _bare_name: &str) -> Option<u64> {
        None
    }
}

/// Resolve the `ScriptImport` hash for `path` the way `LegacyToZen` import
/// translation does: query the database by full path, then by bare object
/// name, then fall back to the canonical hash (§4.3).
pub fn resolve_script_hash(database: &dyn ScriptObjectsDatabase, path: &str) -> u64 {
    if let Some(hash) = database.hash_for_path(path) {
        return hash;
    }
    if let Some(bare_name) = path.rsplit('/').next() {
        if let Some(hash) = database.hash_for_name(bare_name) {
            log::debug!("script object '{path}' resolved by bare name '{bare_name}', not full path");
            return hash;
        }
    }
    log::warn!("script object '{path}' not found in database, falling back to canonical hash");
    canonical_script_hash(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_database_falls_back_to_canonical_hash() {
        let db = NullScriptObjectsDatabase;
        let hash = resolve_script_hash(&db, "/Script/Engine/StaticMesh");
        assert_eq!(hash, canonical_script_hash("/Script/Engine/StaticMesh"));
    }
}
