//! End-to-end conversion scenarios exercising both pipelines against whole,
//! hand-built packages rather than individual field codecs.

use unreal_package_codec::convert::{legacy_to_zen, zen_to_legacy};
use unreal_package_codec::convert::{ConversionOptions, ForeignExportView, ForeignPackageContext, ForeignPackageView};
use unreal_package_codec::flags::{EObjectFlags, EPackageFlags};
use unreal_package_codec::legacy::{
    DataResourceEntry, LegacyExport, LegacyImport, LegacyPackage, LegacyVersionInfo, PreloadArcCounts,
};
use unreal_package_codec::object_index::PackageObjectIndex;
use unreal_package_codec::script_objects::{NullScriptObjectsDatabase, ScriptObjectEntry, ScriptObjectsDatabase};
use unreal_package_codec::types::{MappedName, PackageId, PackageIndex};

fn empty_legacy(package_name: &str) -> LegacyPackage {
    LegacyPackage {
        package_name: package_name.to_string(),
        folder_name: String::new(),
        package_flags: EPackageFlags::COOKED,
        version: LegacyVersionInfo {
            unversioned: true,
            ..Default::default()
        },
        name_map: Vec::new(),
        imports: Vec::new(),
        exports: Vec::new(),
        preload_dependencies: Vec::new(),
        data_resources: Vec::new(),
        exports_blob: Vec::new(),
        bulk_data: None,
        has_failed_import_map_entries: false,
    }
}

/// Scenario 1: an empty package carries no imports or exports, and the zen
/// package that comes out has only the package name in its name map.
#[test]
fn empty_package_round_trips() {
    let legacy = empty_legacy("/Game/Empty");
    let options = ConversionOptions::with_null_database();

    let zen = legacy_to_zen::convert(&legacy, "/Game/Empty", &options).unwrap();
    assert_eq!(zen.export_map.len(), 0);
    assert_eq!(zen.import_map.len(), 0);
    assert_eq!(zen.name_map, vec!["/Game/Empty".to_string()]);

    let context = unreal_package_codec::convert::NullForeignPackageContext;
    let back = zen_to_legacy::convert(&zen, &context, &options).unwrap();
    assert_eq!(back.exports.len(), 0);
    assert_eq!(back.imports.len(), 0);
}

/// Scenario 2: a single public, standalone, transactional export with no
/// imports. Its public export hash is the lowercase-name hash and its body is
/// carried through byte-exact.
#[test]
fn single_public_export_gets_a_public_hash_and_exact_body() {
    let mut legacy = empty_legacy("/Game/Widget");
    legacy.name_map.push("Widget".to_string());
    legacy.exports.push(LegacyExport {
        object_name: MappedName::new(0, 0),
        object_flags: EObjectFlags::PUBLIC | EObjectFlags::STANDALONE | EObjectFlags::TRANSACTIONAL,
        serial_size: 100,
        serial_offset: 0,
        arcs: PreloadArcCounts {
            first_export_dependency_index: -1,
            ..Default::default()
        },
        ..Default::default()
    });
    legacy.exports_blob = vec![0xAA; 100];

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/Widget", &options).unwrap();

    assert_eq!(zen.export_map.len(), 1);
    let export = &zen.export_map[0];
    assert_eq!(export.public_export_hash, unreal_package_codec::types::public_export_hash("widget"));
    assert_eq!(export.cooked_serial_offset, 0);
    assert_eq!(export.cooked_serial_size, 100);
    assert_eq!(zen.body, vec![0xAA; 100]);
}

/// Scenario 3: a script import resolves to the canonical hash when no
/// database entry is present, and to the database's own hash when one is.
#[test]
fn script_import_falls_back_to_canonical_hash_without_a_database() {
    // Legacy script imports chain through a single package-root entry whose
    // own name already carries the full `/Script/<Module>` path, not a
    // multi-level `Script -> Engine` outer chain.
    let mut legacy = empty_legacy("/Game/UsesEngine");
    legacy.name_map.extend(["/Script/Engine".to_string(), "StaticMesh".to_string()]);
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::NULL,
        object_name: MappedName::new(0, 0),
        ..Default::default()
    });
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::from_import(0).unwrap(),
        object_name: MappedName::new(1, 0),
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/UsesEngine", &options).unwrap();

    let expected = unreal_package_codec::object_index::canonical_script_hash("/Script/Engine/StaticMesh");
    assert_eq!(zen.import_map[1], PackageObjectIndex::ScriptImport(expected));
}

struct StaticMeshDatabase;

impl ScriptObjectsDatabase for StaticMeshDatabase {
    fn lookup(&self, hash: u64) -> Option<ScriptObjectEntry> {
        if hash == 0xABCD {
            Some(ScriptObjectEntry {
                object_path: "/Script/Engine/StaticMesh".to_string(),
                outer_hash: Some(0xEF01),
                is_class: true,
                cdo_class_hash: None,
            })
        } else if hash == 0xEF01 {
            Some(ScriptObjectEntry {
                object_path: "/Script/Engine".to_string(),
                outer_hash: None,
                is_class: false,
                cdo_class_hash: None,
            })
        } else {
            None
        }
    }

    fn hash_for_path(&self, path: &str) -> Option<u64> {
        if path == "/Script/Engine/StaticMesh" {
            Some(0xABCD)
        } else {
            None
        }
    }

    fn hash_for_name(&self, _bare_name: &str) -> Option<u64> {
        None
    }
}

#[test]
fn script_import_uses_database_hash_when_available() {
    let mut legacy = empty_legacy("/Game/UsesEngine");
    legacy.name_map.extend(["/Script/Engine".to_string(), "StaticMesh".to_string()]);
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::NULL,
        object_name: MappedName::new(0, 0),
        ..Default::default()
    });
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::from_import(0).unwrap(),
        object_name: MappedName::new(1, 0),
        ..Default::default()
    });

    let db = StaticMeshDatabase;
    let options = ConversionOptions {
        script_objects: &db,
        ..ConversionOptions::with_null_database()
    };
    let zen = legacy_to_zen::convert(&legacy, "/Game/UsesEngine", &options).unwrap();
    assert_eq!(zen.import_map[1], PackageObjectIndex::ScriptImport(0xABCD));
}

/// Scenario 4: a foreign-package import produces an `imported_packages`
/// entry, an `imported_public_export_hashes` entry, and a `PackageImport`
/// pointing at both slots.
#[test]
fn foreign_package_import_allocates_package_and_hash_slots() {
    // Legacy package imports chain through a single package-root entry whose
    // own name is already the full package path, not a per-segment outer
    // chain.
    let mut legacy = empty_legacy("/Game/Consumer");
    legacy.name_map.extend(["/Game/Library".to_string(), "MeshA".to_string()]);
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::NULL,
        object_name: MappedName::new(0, 0),
        ..Default::default()
    });
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::from_import(0).unwrap(),
        object_name: MappedName::new(1, 0),
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/Consumer", &options).unwrap();

    assert_eq!(zen.imported_packages.len(), 1);
    assert_eq!(zen.imported_packages[0].id, PackageId::from_name("/Game/Library"));
    assert_eq!(zen.imported_public_export_hashes.len(), 1);
    assert_eq!(
        zen.imported_public_export_hashes[0],
        unreal_package_codec::types::public_export_hash("mesha")
    );
    assert_eq!(zen.import_map[1], PackageObjectIndex::PackageImport(0, 0));
}

/// Self-reference collapse: an import whose derived package path is the
/// converter's own package path becomes `Null` rather than a `PackageImport`.
#[test]
fn self_referencing_import_collapses_to_null() {
    let mut legacy = empty_legacy("/Game/Consumer");
    legacy.name_map.extend(["/Game/Consumer".to_string(), "Inner".to_string()]);
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::NULL,
        object_name: MappedName::new(0, 0),
        ..Default::default()
    });
    legacy.imports.push(LegacyImport {
        outer_index: PackageIndex::from_import(0).unwrap(),
        object_name: MappedName::new(1, 0),
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/Consumer", &options).unwrap();
    assert_eq!(zen.import_map[1], PackageObjectIndex::Null);
    assert!(zen.imported_packages.is_empty());
}

/// Scenario 6: a name with a numeric suffix keeps a single base entry in the
/// name map and carries the suffix through `MappedName::number`.
#[test]
fn numeric_suffix_shares_one_name_map_entry() {
    let mut legacy = empty_legacy("/Game/Actors");
    legacy.name_map.push("Actor".to_string());
    legacy.exports.push(LegacyExport {
        object_name: MappedName::new(0, 4),
        object_flags: EObjectFlags::PUBLIC,
        serial_size: 0,
        serial_offset: 0,
        arcs: PreloadArcCounts {
            first_export_dependency_index: -1,
            ..Default::default()
        },
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/Actors", &options).unwrap();

    assert_eq!(zen.export_map[0].object_name, MappedName::new(0, 4));
    assert_eq!(zen.name_map.iter().filter(|n| *n == "Actor").count(), 1);
    assert_eq!(
        zen.export_map[0].public_export_hash,
        unreal_package_codec::types::public_export_hash("actor_3")
    );
}

/// Scenario 5 (dependency arc reorder, the `ZenToLegacy` direction): a zen
/// export's dependency bundle carries arcs in zen order; the legacy exports
/// that come back carry them in legacy order, plus whatever augmentation the
/// legacy-format invariants require.
#[test]
fn dependency_arcs_reorder_from_zen_to_legacy_order() {
    use unreal_package_codec::zen::dependency_bundle::{append_export_dependencies, ExportDependencies};
    use unreal_package_codec::zen::{ExportBundleEntry, ExportBundleHeader, ExportCommandType, ZenExport, ZenPackage, ZenPackageSummary};

    let mut zen = ZenPackage {
        summary: ZenPackageSummary {
            package_name: MappedName::new(0, 0),
            package_flags: EPackageFlags::COOKED,
            cooked_header_size: 0,
            ..Default::default()
        },
        name_map: vec!["Root".to_string(), "Other".to_string()],
        ..Default::default()
    };

    zen.export_map.push(ZenExport {
        object_name: MappedName::new(0, 0),
        object_flags: EObjectFlags::PUBLIC,
        ..Default::default()
    });
    zen.export_map.push(ZenExport {
        object_name: MappedName::new(1, 0),
        object_flags: EObjectFlags::empty(),
        ..Default::default()
    });

    let mut deps = ExportDependencies::default();
    deps.create_before_create.push(PackageObjectIndex::Export(1));
    deps.serialize_before_serialize.push(PackageObjectIndex::Export(1));
    let header0 = append_export_dependencies(&deps, &mut zen.dependency_bundle_entries);
    let header1 = append_export_dependencies(&ExportDependencies::default(), &mut zen.dependency_bundle_entries);
    zen.dependency_bundle_headers = vec![header0, header1];

    zen.export_bundle_entries = vec![
        ExportBundleEntry { local_export_index: 1, command_type: ExportCommandType::Create },
        ExportBundleEntry { local_export_index: 0, command_type: ExportCommandType::Create },
        ExportBundleEntry { local_export_index: 1, command_type: ExportCommandType::Serialize },
        ExportBundleEntry { local_export_index: 0, command_type: ExportCommandType::Serialize },
    ];
    zen.export_bundle_headers = vec![ExportBundleHeader {
        serial_offset: 0,
        first_entry_index: 0,
        entry_count: zen.export_bundle_entries.len() as u32,
    }];

    let options = ConversionOptions::with_null_database();
    let context = unreal_package_codec::convert::NullForeignPackageContext;
    let legacy = zen_to_legacy::convert(&zen, &context, &options).unwrap();

    let export0 = &legacy.exports[0];
    assert_eq!(export0.arcs.create_before_create, 1);
    assert_eq!(export0.arcs.serialize_before_serialize, 1);
    let start = export0.arcs.first_export_dependency_index as usize;
    let total = export0.arcs.total() as usize;
    let slots = &legacy.preload_dependencies[start..start + total];
    // Legacy order is SbS, CbS, SbC, CbC: the SerializeBeforeSerialize arc
    // comes first, the CreateBeforeCreate arc last.
    assert_eq!(slots[0], PackageIndex::from_export(1).unwrap());
    assert_eq!(slots[slots.len() - 1], PackageIndex::from_export(1).unwrap());
}

/// An unresolved script import degrades gracefully rather than failing the
/// whole conversion, and flags the output package.
#[test]
fn unresolved_script_import_degrades_instead_of_failing() {
    use unreal_package_codec::zen::{ZenExport, ZenPackage, ZenPackageSummary};

    let zen = ZenPackage {
        summary: ZenPackageSummary {
            package_name: MappedName::new(0, 0),
            ..Default::default()
        },
        name_map: vec!["Orphan".to_string()],
        export_map: vec![ZenExport {
            object_name: MappedName::new(0, 0),
            outer_index: PackageObjectIndex::ScriptImport(0xDEAD_BEEF),
            ..Default::default()
        }],
        ..Default::default()
    };

    let db = NullScriptObjectsDatabase;
    let options = ConversionOptions {
        script_objects: &db,
        ..ConversionOptions::with_null_database()
    };
    let context = unreal_package_codec::convert::NullForeignPackageContext;
    let legacy = zen_to_legacy::convert(&zen, &context, &options).unwrap();

    assert!(legacy.has_failed_import_map_entries);
    assert_eq!(legacy.imports.len(), 1);
}

/// Import dedup: two distinct zen `PackageImport` slots that resolve to the
/// same foreign export collapse to a single legacy import entry.
#[test]
fn resolved_imports_with_equal_identity_are_deduplicated() {
    use unreal_package_codec::zen::{ZenExport, ZenPackage, ZenPackageSummary};

    struct OneExportContext;
    impl ForeignPackageContext for OneExportContext {
        fn lookup(&self, _id: PackageId) -> Option<ForeignPackageView> {
            Some(ForeignPackageView {
                path: "/Game/Library".to_string(),
                exports: vec![ForeignExportView {
                    object_name: "MeshA".to_string(),
                    class_name: "StaticMesh".to_string(),
                    public_export_hash: 42,
                }],
            })
        }
    }

    let package_id = PackageId::from_name("/Game/Library");
    let zen = ZenPackage {
        summary: ZenPackageSummary {
            package_name: MappedName::new(0, 0),
            ..Default::default()
        },
        name_map: vec!["Consumer".to_string()],
        imported_packages: vec![unreal_package_codec::zen::ImportedPackage {
            id: package_id,
            name: "/Game/Library".to_string(),
            number: 0,
        }],
        imported_public_export_hashes: vec![42],
        export_map: vec![
            ZenExport {
                object_name: MappedName::new(0, 0),
                class_index: PackageObjectIndex::PackageImport(0, 0),
                ..Default::default()
            },
            ZenExport {
                object_name: MappedName::new(0, 0),
                super_index: PackageObjectIndex::PackageImport(0, 0),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let options = ConversionOptions::with_null_database();
    let context = OneExportContext;
    let legacy = zen_to_legacy::convert(&zen, &context, &options).unwrap();

    // Both exports reference the same foreign export: it must appear once in
    // the import table, and the package-root import it's nested under must
    // also appear once.
    let mesh_a_imports = legacy
        .imports
        .iter()
        .filter(|i| legacy.render(i.object_name).as_deref() == Some("MeshA"));
    assert_eq!(mesh_a_imports.count(), 1);
    let package_root_imports = legacy
        .imports
        .iter()
        .filter(|i| legacy.render(i.object_name).as_deref() == Some("/Game/Library"));
    assert_eq!(package_root_imports.count(), 1);
}

/// Bulk-data entries that fit inside the companion bulk file carry through
/// verbatim.
#[test]
fn bulk_data_entries_within_file_size_carry_through_verbatim() {
    let mut legacy = empty_legacy("/Game/WithBulk");
    legacy.bulk_data = Some(vec![0u8; 64]);
    legacy.data_resources.push(DataResourceEntry {
        serial_offset: 0,
        duplicate_serial_offset: -1,
        serial_size: 64,
        flags: 7,
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/WithBulk", &options).unwrap();

    assert_eq!(zen.bulk_data_map.len(), 1);
    assert_eq!(zen.bulk_data_map[0].serial_offset, 0);
    assert_eq!(zen.bulk_data_map[0].serial_size, 64);
    assert_eq!(zen.bulk_data_map[0].flags, 7);
}

/// A data-resource entry that indexes past the companion bulk file collapses
/// to a single entry spanning the whole file rather than an out-of-range one.
#[test]
fn bulk_data_entry_over_indexing_file_synthesizes_one_spanning_entry() {
    let mut legacy = empty_legacy("/Game/WithBulk");
    legacy.bulk_data = Some(vec![0u8; 16]);
    legacy.data_resources.push(DataResourceEntry {
        serial_offset: 0,
        duplicate_serial_offset: -1,
        serial_size: 64,
        flags: 7,
        ..Default::default()
    });

    let options = ConversionOptions::with_null_database();
    let zen = legacy_to_zen::convert(&legacy, "/Game/WithBulk", &options).unwrap();

    assert_eq!(zen.bulk_data_map.len(), 1);
    assert_eq!(zen.bulk_data_map[0].serial_offset, 0);
    assert_eq!(zen.bulk_data_map[0].serial_size, 16);
}
