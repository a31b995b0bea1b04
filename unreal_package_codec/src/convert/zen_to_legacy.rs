//! `ZenToLegacy`: rebuild a legacy header + exports blob from a zen package (§4.2)

use super::resolved_import::ResolvedImport;
use super::{ConversionOptions, ForeignPackageContext};
use crate::containers::IndexedMap;
use crate::flags::{EObjectFlags, LegacyExportFilter};
use crate::legacy::{DataResourceEntry, LegacyExport, LegacyImport, LegacyPackage, LegacyVersionInfo, PreloadArcCounts};
use crate::object_index::PackageObjectIndex;
use crate::script_objects::ScriptObjectsDatabase;
use crate::types::{split_rendered_name, MappedName, PackageIndex, LEGACY_ARC_ORDER, ZEN_ARC_ORDER};
use crate::zen::dependency_bundle::export_dependencies_from_bundle;
use crate::zen::ZenPackage;
use crate::Error;

/// Append-only name table that starts as a copy of the zen package's own name
/// map (so every pre-existing `MappedName` stays valid unchanged) and grows
/// with the new strings import resolution introduces.
struct NameTable {
    names: Vec<String>,
    index_of: IndexedMap<String, ()>,
}

impl NameTable {
    fn seeded_from(name_map: &[String]) -> Self {
        let mut index_of = IndexedMap::with_capacity(name_map.len());
        for name in name_map {
            index_of.insert(name.clone(), ());
        }
        NameTable {
            names: name_map.to_vec(),
            index_of,
        }
    }

    fn mapped(&mut self, rendered: &str) -> MappedName {
        let (base, number) = split_rendered_name(rendered);
        let index = match self.index_of.index_of(base) {
            Some(i) => i,
            None => {
                let i = self.names.len();
                self.names.push(base.to_string());
                self.index_of.insert(base.to_string(), ());
                i
            }
        };
        MappedName::new(index as u32, number)
    }

    fn into_vec(self) -> Vec<String> {
        self.names
    }
}

struct Resolver<'a> {
    zen: &'a ZenPackage,
    context: &'a dyn ForeignPackageContext,
    script_objects: &'a dyn ScriptObjectsDatabase,
    dedup: IndexedMap<ResolvedImport, ()>,
    degraded: bool,
}

impl<'a> Resolver<'a> {
    fn insert(&mut self, resolved: ResolvedImport) -> Result<PackageIndex, Error> {
        let slot = self.dedup.insert(resolved, ());
        PackageIndex::from_import(i32::try_from(slot).map_err(|_| {
            Error::capacity_exceeded("more resolved imports than fit in a legacy import table")
        })?)
    }

    fn translate(&mut self, idx: PackageObjectIndex) -> Result<PackageIndex, Error> {
        match idx {
            PackageObjectIndex::Null => Ok(PackageIndex::NULL),
            PackageObjectIndex::Export(n) => PackageIndex::from_export(n as i32),
            PackageObjectIndex::ScriptImport(hash) => {
                let resolved = self.resolve_script_import(hash)?;
                self.insert(resolved)
            }
            PackageObjectIndex::PackageImport(package_slot, hash_slot) => {
                let resolved = self.resolve_package_import(package_slot, hash_slot)?;
                self.insert(resolved)
            }
        }
    }

    fn resolve_export_as_import(&mut self, local_export_index: u32) -> Result<ResolvedImport, Error> {
        let export = self
            .zen
            .export_map
            .get(local_export_index as usize)
            .ok_or_else(|| Error::invariant("export-as-import index out of range"))?
            .clone();
        let outer = self.translate(export.outer_index)?;
        let object_name = self.zen.render(export.object_name).unwrap_or_default();
        Ok(ResolvedImport {
            class_package: "/Script/CoreUObject".to_string(),
            class_name: "Object".to_string(),
            object_name,
            outer,
        })
    }

    fn resolve_script_import(&mut self, hash: u64) -> Result<ResolvedImport, Error> {
        let entry = self.script_objects.lookup(hash);
        let Some(entry) = entry else {
            log::warn!("script import hash {hash:016x} not found in database, emitting placeholder name");
            self.degraded = true;
            return Ok(ResolvedImport {
                class_package: "/Script/CoreUObject".to_string(),
                class_name: "Package".to_string(),
                object_name: format!("__ScriptImport_{hash:016x}__"),
                outer: PackageIndex::NULL,
            });
        };

        if entry.is_package_root() {
            return Ok(ResolvedImport {
                class_package: "/Script/CoreUObject".to_string(),
                class_name: "Package".to_string(),
                object_name: entry.object_path,
                outer: PackageIndex::NULL,
            });
        }

        let outer_hash = entry.outer_hash.expect("non-root entry carries an outer hash");
        let outer = self.translate(PackageObjectIndex::ScriptImport(outer_hash))?;
        let outer_entry = self.script_objects.lookup(outer_hash);
        let outer_is_root = outer_entry.map(|e| e.is_package_root()).unwrap_or(false);

        let bare_name = entry
            .object_path
            .rsplit('/')
            .next()
            .unwrap_or(&entry.object_path)
            .to_string();

        let (class_package, class_name) = if let Some(cdo_hash) = entry.cdo_class_hash {
            // §9 open question (b): the database's cdo_class_hash is authoritative
            // over the Default__ heuristic below.
            match self.script_objects.lookup(cdo_hash) {
                Some(class_entry) => (
                    "/Script/CoreUObject".to_string(),
                    class_entry
                        .object_path
                        .rsplit('/')
                        .next()
                        .unwrap_or(&class_entry.object_path)
                        .to_string(),
                ),
                None => ("/Script/CoreUObject".to_string(), "Class".to_string()),
            }
        } else if entry.is_class {
            ("/Script/CoreUObject".to_string(), "Class".to_string())
        } else if outer_is_root && bare_name.starts_with("Default__") {
            ("/Script/CoreUObject".to_string(), "Class".to_string())
        } else {
            ("/Script/CoreUObject".to_string(), "Object".to_string())
        };

        Ok(ResolvedImport {
            class_package,
            class_name,
            object_name: bare_name,
            outer,
        })
    }

    fn resolve_package_import(&mut self, package_slot: u32, hash_slot: u32) -> Result<ResolvedImport, Error> {
        let imported = self
            .zen
            .imported_packages
            .get(package_slot as usize)
            .ok_or_else(|| Error::invariant("package import slot out of range"))?
            .clone();
        let target_hash = *self
            .zen
            .imported_public_export_hashes
            .get(hash_slot as usize)
            .ok_or_else(|| Error::invariant("public export hash slot out of range"))?;

        let view = self.context.lookup(imported.id);

        let (object_name, class_name) = match &view {
            Some(v) if v.exports.iter().any(|e| e.public_export_hash == target_hash) => {
                let export = v.exports.iter().find(|e| e.public_export_hash == target_hash).unwrap();
                (export.object_name.clone(), export.class_name.clone())
            }
            Some(v) if v.exports.len() == 1 => {
                log::warn!("public export hash {target_hash:016x} not found in '{}', falling back to its sole export", v.path);
                self.degraded = true;
                (v.exports[0].object_name.clone(), v.exports[0].class_name.clone())
            }
            Some(v) if (hash_slot as usize) < v.exports.len() => {
                log::warn!("public export hash {target_hash:016x} not found in '{}', falling back to slot index {hash_slot}", v.path);
                self.degraded = true;
                let export = &v.exports[hash_slot as usize];
                (export.object_name.clone(), export.class_name.clone())
            }
            _ => {
                log::warn!("foreign package for id {:?} unavailable or export hash {target_hash:016x} unresolvable, emitting placeholder name", imported.id);
                self.degraded = true;
                (format!("Export_{hash_slot}"), "Object".to_string())
            }
        };

        let package_path = view.map(|v| v.path).unwrap_or(imported.name);
        let package_root = ResolvedImport {
            class_package: "/Script/CoreUObject".to_string(),
            class_name: "Package".to_string(),
            object_name: package_path,
            outer: PackageIndex::NULL,
        };
        let outer = self.insert(package_root)?;

        Ok(ResolvedImport {
            class_package: "/Script/CoreUObject".to_string(),
            class_name,
            object_name,
            outer,
        })
    }
}

fn is_asset(flags: EObjectFlags, outer: PackageIndex) -> bool {
    let required = EObjectFlags::PUBLIC | EObjectFlags::STANDALONE | EObjectFlags::TRANSACTIONAL;
    outer.is_null() && flags.contains(required)
}

fn generate_public_hash(flags: EObjectFlags, zen_public_export_hash: u64) -> bool {
    !flags.contains(EObjectFlags::PUBLIC) && zen_public_export_hash != 0
}

/// Convert a parsed zen package into an in-memory legacy package.
pub fn convert(zen: &ZenPackage, context: &dyn ForeignPackageContext, options: &ConversionOptions) -> Result<LegacyPackage, Error> {
    let mut resolver = Resolver {
        zen,
        context,
        script_objects: options.script_objects,
        dedup: IndexedMap::new(),
        degraded: false,
    };

    // Seed the dedup table in zen's own import-map order so imports that
    // appear there keep stable low slot numbers.
    for &idx in &zen.import_map {
        match idx {
            PackageObjectIndex::Null => {}
            PackageObjectIndex::Export(n) => {
                let resolved = resolver.resolve_export_as_import(n)?;
                resolver.insert(resolved)?;
            }
            PackageObjectIndex::ScriptImport(hash) => {
                let resolved = resolver.resolve_script_import(hash)?;
                resolver.insert(resolved)?;
            }
            PackageObjectIndex::PackageImport(p, h) => {
                let resolved = resolver.resolve_package_import(p, h)?;
                resolver.insert(resolved)?;
            }
        }
    }

    let mut preload_dependencies: Vec<PackageIndex> = Vec::new();
    let mut exports = Vec::with_capacity(zen.export_map.len());

    for (i, export) in zen.export_map.iter().enumerate() {
        let class_index = resolver.translate(export.class_index)?;
        let super_index = resolver.translate(export.super_index)?;
        let template_index = resolver.translate(export.template_index)?;
        let outer_index = resolver.translate(export.outer_index)?;

        let mut arcs = PreloadArcCounts::default();
        if let Some(header) = zen.dependency_bundle_headers.get(i) {
            let zen_deps = export_dependencies_from_bundle(header, &zen.dependency_bundle_entries);
            let mut legacy_deps: [Vec<PackageIndex>; 4] = Default::default();
            for (slot, kind) in ZEN_ARC_ORDER.iter().enumerate() {
                for &target in zen_deps.list(*kind) {
                    legacy_deps[slot].push(resolver.translate(target)?);
                }
            }
            let [mut create_before_create, mut serialize_before_create, mut create_before_serialize, mut serialize_before_serialize] =
                legacy_deps;

            if !outer_index.is_null() && !create_before_create.contains(&outer_index) {
                create_before_create.push(outer_index);
            }
            if !super_index.is_null() && !create_before_create.contains(&super_index) {
                serialize_before_serialize.push(super_index);
            }
            if !class_index.is_null() && !serialize_before_create.contains(&class_index) {
                serialize_before_create.push(class_index);
            }
            if !template_index.is_null() && !serialize_before_create.contains(&template_index) {
                serialize_before_create.push(template_index);
            }

            if create_before_create.is_empty()
                && serialize_before_create.is_empty()
                && create_before_serialize.is_empty()
                && serialize_before_serialize.is_empty()
            {
                arcs.first_export_dependency_index = -1;
            } else {
                arcs.first_export_dependency_index = preload_dependencies.len() as i32;
                arcs.serialize_before_serialize = serialize_before_serialize.len() as i32;
                arcs.create_before_serialize = create_before_serialize.len() as i32;
                arcs.serialize_before_create = serialize_before_create.len() as i32;
                arcs.create_before_create = create_before_create.len() as i32;
                for group in LEGACY_ARC_ORDER {
                    let list = match group {
                        crate::types::ArcKind::SerializeBeforeSerialize => &serialize_before_serialize,
                        crate::types::ArcKind::CreateBeforeSerialize => &create_before_serialize,
                        crate::types::ArcKind::SerializeBeforeCreate => &serialize_before_create,
                        crate::types::ArcKind::CreateBeforeCreate => &create_before_create,
                    };
                    preload_dependencies.extend_from_slice(list);
                }
            }
        } else {
            arcs.first_export_dependency_index = -1;
        }

        exports.push(LegacyExport {
            class_index,
            super_index,
            template_index,
            outer_index,
            object_name: export.object_name,
            object_flags: export.object_flags,
            serial_size: export.cooked_serial_size,
            serial_offset: 0,
            filter: LegacyExportFilter::from(export.filter_flags),
            is_asset: is_asset(export.object_flags, outer_index),
            generate_public_hash: generate_public_hash(export.object_flags, export.public_export_hash),
            arcs,
        });
    }

    let data_resources = zen
        .bulk_data_map
        .iter()
        .map(|entry| DataResourceEntry {
            flags: entry.flags,
            serial_offset: entry.serial_offset as i64,
            duplicate_serial_offset: entry.duplicate_serial_offset as i64,
            serial_size: entry.serial_size as i64,
            raw_size: entry.serial_size as i64,
            outer_index: 0,
            legacy_bulk_data_flags: entry.flags,
        })
        .collect();

    let mut name_table = NameTable::seeded_from(&zen.name_map);
    let imports: Vec<LegacyImport> = resolver
        .dedup
        .iter()
        .map(|(resolved, _)| LegacyImport {
            class_package: name_table.mapped(&resolved.class_package),
            class_name: name_table.mapped(&resolved.class_name),
            outer_index: resolved.outer,
            object_name: name_table.mapped(&resolved.object_name),
            package_name: None,
            optional: false,
        })
        .collect();

    let package_name = zen.render(zen.summary.package_name).unwrap_or_default();

    if resolver.degraded {
        log::warn!("'{package_name}' converted with unresolved import references; output is consumable but may display degraded names");
    }

    Ok(LegacyPackage {
        package_name,
        folder_name: String::new(),
        package_flags: zen.summary.package_flags,
        version: LegacyVersionInfo {
            unversioned: true,
            file_version_ue4: 0,
            file_version_ue5: 0,
            licensee_version: 0,
            custom_versions: Vec::new(),
        },
        name_map: name_table.into_vec(),
        imports,
        exports,
        preload_dependencies,
        data_resources,
        exports_blob: zen.body.clone(),
        bulk_data: None,
        has_failed_import_map_entries: resolver.degraded,
    })
}
