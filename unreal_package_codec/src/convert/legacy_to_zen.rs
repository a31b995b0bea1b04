//! `LegacyToZen`: rebuild a zen package from a legacy header + exports blob (§4.3)

use std::collections::HashMap;

use super::ConversionOptions;
use crate::containers::IndexedMap;
use crate::crc;
use crate::flags::EExportFilterFlags;
use crate::legacy::LegacyPackage;
use crate::object_index::PackageObjectIndex;
use crate::script_objects::resolve_script_hash;
use crate::types::{public_export_hash, split_rendered_name, ArcKind, PackageId, PackageIndex, LEGACY_ARC_ORDER};
use crate::zen::dependency_bundle::{append_export_dependencies, ExportDependencies};
use crate::zen::{
    BulkDataMapEntry, ExportBundleEntry, ExportBundleHeader, ExportCommandType, ImportedPackage, ZenExport,
    ZenPackage, ZenPackageSummary,
};
use crate::Error;

fn suffixed_component(base: &str, number: u32) -> String {
    if number == 0 {
        base.to_string()
    } else {
        format!("{base}_{:02}", number - 1)
    }
}

/// Render the full path leading to (and including) a legacy reference,
/// joining each ancestor's base name with its numeric suffix applied per
/// §4.3's `<base>_<k-1 zero-padded>` convention.
fn chain_path(legacy: &LegacyPackage, idx: PackageIndex) -> String {
    if idx.is_null() {
        return String::new();
    }
    let (rendered, outer) = if let Some(i) = idx.export_index() {
        let export = &legacy.exports[i as usize];
        (legacy.render(export.object_name).unwrap_or_default(), export.outer_index)
    } else if let Some(i) = idx.import_index() {
        let import = &legacy.imports[i as usize];
        (legacy.render(import.object_name).unwrap_or_default(), import.outer_index)
    } else {
        return String::new();
    };
    let (base, number) = split_rendered_name(&rendered);
    let component = suffixed_component(base, number);
    let parent = chain_path(legacy, outer);
    if parent.is_empty() {
        component
    } else {
        format!("{parent}/{component}")
    }
}

/// Split a legacy import into `(package_root_path, in_package_export_path)`.
/// The package root is the ancestor whose own outer is null.
fn classify_package_import(legacy: &LegacyPackage, import: &crate::legacy::LegacyImport) -> (String, String) {
    let own_rendered = legacy.render(import.object_name).unwrap_or_default();
    let (base, number) = split_rendered_name(&own_rendered);
    let mut components = vec![suffixed_component(base, number)];

    let mut cursor = import.outer_index;
    let mut package_root = String::new();
    loop {
        if cursor.is_null() {
            break;
        }
        if let Some(i) = cursor.import_index() {
            let ancestor = &legacy.imports[i as usize];
            if ancestor.outer_index.is_null() {
                package_root = legacy.render(ancestor.object_name).unwrap_or_default();
                break;
            }
            let rendered = legacy.render(ancestor.object_name).unwrap_or_default();
            let (b, n) = split_rendered_name(&rendered);
            components.push(suffixed_component(b, n));
            cursor = ancestor.outer_index;
        } else if let Some(i) = cursor.export_index() {
            let ancestor = &legacy.exports[i as usize];
            let rendered = legacy.render(ancestor.object_name).unwrap_or_default();
            let (b, n) = split_rendered_name(&rendered);
            components.push(suffixed_component(b, n));
            cursor = ancestor.outer_index;
        } else {
            break;
        }
    }

    components.reverse();
    (package_root, components.join("/"))
}

fn full_path(legacy: &LegacyPackage, import: &crate::legacy::LegacyImport) -> String {
    let own = legacy.render(import.object_name).unwrap_or_default();
    if import.outer_index.is_null() {
        own
    } else {
        format!("{}/{own}", chain_path(legacy, import.outer_index))
    }
}

fn translate_ref(idx: PackageIndex, import_map: &[PackageObjectIndex]) -> PackageObjectIndex {
    if idx.is_null() {
        PackageObjectIndex::Null
    } else if let Some(i) = idx.export_index() {
        PackageObjectIndex::Export(i as u32)
    } else if let Some(i) = idx.import_index() {
        import_map.get(i as usize).copied().unwrap_or(PackageObjectIndex::Null)
    } else {
        PackageObjectIndex::Null
    }
}

fn topological_export_order(legacy: &LegacyPackage) -> Vec<usize> {
    let n = legacy.exports.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

    let mut add_edge = |from: PackageIndex, to: usize, adjacency: &mut Vec<Vec<usize>>| {
        if let Some(i) = from.export_index() {
            adjacency[i as usize].push(to);
        }
    };

    for (i, export) in legacy.exports.iter().enumerate() {
        add_edge(export.outer_index, i, &mut adjacency);
        add_edge(export.class_index, i, &mut adjacency);
        add_edge(export.super_index, i, &mut adjacency);
        add_edge(export.template_index, i, &mut adjacency);
        let start = export.arcs.first_export_dependency_index;
        if start >= 0 {
            let total = export.arcs.total() as usize;
            for slot in &legacy.preload_dependencies[start as usize..start as usize + total] {
                add_edge(*slot, i, &mut adjacency);
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(u: usize, adjacency: &[Vec<usize>], state: &mut [State], order: &mut Vec<usize>) {
        state[u] = State::Visiting;
        for &v in &adjacency[u] {
            match state[v] {
                State::Unvisited => visit(v, adjacency, state, order),
                // Back edge onto a node still being visited: this would close
                // a cycle, so it is dropped rather than followed.
                State::Visiting => log::warn!("export dependency cycle detected at export {u}, dropping back edge to {v}"),
                State::Done => {}
            }
        }
        state[u] = State::Done;
        order.push(u);
    }

    let mut state = vec![State::Unvisited; n];
    let mut order = Vec::with_capacity(n);
    for u in 0..n {
        if state[u] == State::Unvisited {
            visit(u, &adjacency, &mut state, &mut order);
        }
    }
    order.reverse();
    order
}

/// Convert a parsed legacy package into an in-memory zen package.
pub fn convert(legacy: &LegacyPackage, package_path: &str, options: &ConversionOptions) -> Result<ZenPackage, Error> {
    let mut package_table: IndexedMap<u64, ImportedPackage> = IndexedMap::new();
    let mut hash_table: IndexedMap<u64, ()> = IndexedMap::new();
    let mut import_map = Vec::with_capacity(legacy.imports.len());
    let own_path_lower = package_path.to_lowercase();

    for import in &legacy.imports {
        let path = full_path(legacy, import);

        let translated = if path.starts_with("/Script/") {
            PackageObjectIndex::ScriptImport(resolve_script_hash(options.script_objects, &path))
        } else if import.outer_index.is_null() {
            PackageObjectIndex::Null
        } else {
            let (package_root, export_path) = classify_package_import(legacy, import);
            if package_root.to_lowercase() == own_path_lower {
                log::debug!("import '{export_path}' self-references '{package_root}', collapsing to Null");
                PackageObjectIndex::Null
            } else {
                let package_id = PackageId::from_name(&package_root);
                let hash = crc::cityhash64_to_lower(&export_path);

                let package_slot = package_table.insert(
                    package_id.id,
                    ImportedPackage {
                        id: package_id,
                        name: package_root,
                        number: 0,
                    },
                );
                let hash_slot = hash_table.insert(hash, ());
                PackageObjectIndex::PackageImport(package_slot as u32, hash_slot as u32)
            }
        };
        import_map.push(translated);
    }

    let imported_packages: Vec<ImportedPackage> = package_table.values().cloned().collect();
    let imported_public_export_hashes: Vec<u64> = hash_table.keys().copied().collect();

    let export_count = legacy.exports.len();
    let mut order: Vec<usize> = (0..export_count).collect();
    order.sort_by_key(|&i| legacy.exports[i].serial_offset);
    let base_offset = order.first().map(|&i| legacy.exports[i].serial_offset).unwrap_or(0);

    let mut cooked_serial_size = vec![0i64; export_count];
    for (pos, &i) in order.iter().enumerate() {
        cooked_serial_size[i] = if pos + 1 < order.len() {
            legacy.exports[order[pos + 1]].serial_offset - legacy.exports[i].serial_offset
        } else {
            legacy.exports[i].serial_size
        };
    }

    let mut export_map = Vec::with_capacity(export_count);
    for (i, export) in legacy.exports.iter().enumerate() {
        let rendered = legacy.render(export.object_name).unwrap_or_default();
        let hash = if export.object_flags.contains(crate::flags::EObjectFlags::PUBLIC) {
            public_export_hash(&rendered.to_lowercase())
        } else {
            0
        };

        export_map.push(ZenExport {
            cooked_serial_offset: export.serial_offset - base_offset,
            cooked_serial_size: cooked_serial_size[i],
            object_name: export.object_name,
            object_flags: export.object_flags,
            filter_flags: EExportFilterFlags::from(export.filter),
            class_index: translate_ref(export.class_index, &import_map),
            super_index: translate_ref(export.super_index, &import_map),
            template_index: translate_ref(export.template_index, &import_map),
            outer_index: translate_ref(export.outer_index, &import_map),
            public_export_hash: hash,
        });
    }

    let order = topological_export_order(legacy);
    let mut export_bundle_entries = Vec::with_capacity(order.len() * 2);
    for &i in &order {
        export_bundle_entries.push(ExportBundleEntry {
            local_export_index: i as u32,
            command_type: ExportCommandType::Create,
        });
    }
    for &i in &order {
        export_bundle_entries.push(ExportBundleEntry {
            local_export_index: i as u32,
            command_type: ExportCommandType::Serialize,
        });
    }
    let export_bundle_headers = vec![ExportBundleHeader {
        serial_offset: 0,
        first_entry_index: 0,
        entry_count: export_bundle_entries.len() as u32,
    }];

    let mut dependency_bundle_entries = Vec::new();
    let mut dependency_bundle_headers = Vec::with_capacity(export_count);
    for export in &legacy.exports {
        let mut deps = ExportDependencies::default();
        if export.arcs.first_export_dependency_index >= 0 {
            let start = export.arcs.first_export_dependency_index as usize;
            let counts: HashMap<ArcKind, i32> = HashMap::from([
                (ArcKind::SerializeBeforeSerialize, export.arcs.serialize_before_serialize),
                (ArcKind::CreateBeforeSerialize, export.arcs.create_before_serialize),
                (ArcKind::SerializeBeforeCreate, export.arcs.serialize_before_create),
                (ArcKind::CreateBeforeCreate, export.arcs.create_before_create),
            ]);
            let mut offset = start;
            for kind in LEGACY_ARC_ORDER {
                let count = counts[&kind] as usize;
                for slot in &legacy.preload_dependencies[offset..offset + count] {
                    deps.list_mut(kind).push(translate_ref(*slot, &import_map));
                }
                offset += count;
            }
        }
        // append_export_dependencies flattens `deps` in ZEN_ARC_ORDER regardless
        // of the order its lists were populated in.
        dependency_bundle_headers.push(append_export_dependencies(&deps, &mut dependency_bundle_entries));
    }

    let carry_through = |entry: &crate::legacy::DataResourceEntry| BulkDataMapEntry {
        serial_offset: entry.serial_offset as u64,
        duplicate_serial_offset: entry.duplicate_serial_offset as u64,
        serial_size: entry.serial_size as u64,
        flags: entry.flags,
        padding: 0,
    };
    let bulk_data_map: Vec<BulkDataMapEntry> = match &legacy.bulk_data {
        Some(bulk) => {
            let bulk_len = bulk.len() as u64;
            let all_fit = legacy
                .data_resources
                .iter()
                .all(|entry| entry.serial_offset as u64 + entry.serial_size as u64 <= bulk_len);
            if all_fit {
                legacy.data_resources.iter().map(carry_through).collect()
            } else {
                // Originals index past the companion bulk file; fall back to a
                // single entry spanning it whole rather than emit ranges the
                // file can't satisfy.
                vec![BulkDataMapEntry {
                    serial_offset: 0,
                    duplicate_serial_offset: u64::MAX,
                    serial_size: bulk_len,
                    flags: 0,
                    padding: 0,
                }]
            }
        }
        None => legacy.data_resources.iter().map(carry_through).collect(),
    };

    let mut name_map = legacy.name_map.clone();
    let package_name_mapped = {
        let (base, number) = split_rendered_name(package_path);
        let index = name_map.iter().position(|n| n == base).unwrap_or_else(|| {
            name_map.push(base.to_string());
            name_map.len() - 1
        });
        crate::types::MappedName::new(index as u32, number)
    };

    // `body` carries pure export bytes, with no legacy package-tag footer:
    // that footer is wire framing `LegacyPackage`'s reader/writer add and
    // strip at their own boundary, not part of a package's logical body.
    let body = legacy.exports_blob.clone();

    Ok(ZenPackage {
        summary: ZenPackageSummary {
            package_name: package_name_mapped,
            package_flags: legacy.package_flags,
            cooked_header_size: base_offset as u32,
            ..Default::default()
        },
        name_map,
        bulk_data_map,
        imported_public_export_hashes,
        import_map,
        export_map,
        export_bundle_headers,
        export_bundle_entries,
        dependency_bundle_headers,
        dependency_bundle_entries,
        imported_packages,
        body,
    })
}
