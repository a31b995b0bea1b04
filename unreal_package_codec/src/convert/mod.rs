//! Conversion pipelines between the legacy and zen package formats (§4.2, §4.3)

pub mod legacy_to_zen;
pub mod resolved_import;
pub mod zen_to_legacy;

use crate::name_batch::NameEncoding;
use crate::script_objects::{NullScriptObjectsDatabase, ScriptObjectsDatabase};
use crate::types::PackageId;

/// One export of a foreign package, as seen through a [`ForeignPackageContext`]:
/// an object name and class name paired with the `public_export_hash` the
/// owning package's export map declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignExportView {
    /// The foreign export's rendered object name
    pub object_name: String,
    /// The foreign export's class name
    pub class_name: String,
    /// The foreign export's `public_export_hash`
    pub public_export_hash: u64,
}

/// A snapshot of a foreign package sufficient to resolve `PackageImport`
/// references against it (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForeignPackageView {
    /// The foreign package's own path, e.g. `/Game/Library`
    pub path: String,
    /// The foreign package's exports, in export-map order
    pub exports: Vec<ForeignExportView>,
}

/// Caller-supplied access to the foreign packages a zen package's import map
/// may reference. Loading and caching foreign packages is outside the core's
/// responsibility (§1); this trait is the seam.
pub trait ForeignPackageContext {
    /// Look up a foreign package's export view by its imported-package id.
    fn lookup(&self, id: PackageId) -> Option<ForeignPackageView>;
}

/// A context with no foreign packages available. Every `PackageImport`
/// resolution falls back to the placeholder policy of §4.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullForeignPackageContext;

impl ForeignPackageContext for NullForeignPackageContext {
    fn lookup(&self, _id: PackageId) -> Option<ForeignPackageView> {
        None
    }
}

static NULL_SCRIPT_OBJECTS: NullScriptObjectsDatabase = NullScriptObjectsDatabase;

/// Options controlling a single conversion call.
pub struct ConversionOptions<'a> {
    /// Strict vs lossy name-batch encoding (§4.1, §9 open question c)
    pub name_encoding: NameEncoding,
    /// Rebuild export bodies by walking the export-bundle serialize order
    /// instead of copying the post-header bytes verbatim.
    ///
    /// Disabled by default (§9 open question a): the bundle-reordering logic
    /// has known bugs in the reference implementation and re-enabling it
    /// requires validating against a corpus.
    pub rebuild_export_bodies: bool,
    /// Script-objects database used to resolve and classify `/Script/...`
    /// object paths (§5)
    pub script_objects: &'a dyn ScriptObjectsDatabase,
}

impl<'a> ConversionOptions<'a> {
    /// Default options: strict name encoding, no body rebuilding, and a
    /// script-objects database with no entries.
    pub fn with_null_database() -> ConversionOptions<'static> {
        ConversionOptions {
            name_encoding: NameEncoding::Strict,
            rebuild_export_bodies: false,
            script_objects: &NULL_SCRIPT_OBJECTS,
        }
    }
}
