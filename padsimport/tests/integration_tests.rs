//! Integration tests for the PadsImport library

use padsimport::prelude::*;
use padsimport::sch::{LabelType, Layer, PinType, Position};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn import(name: &str) -> ImportResult {
    PadsImportCore::import_file(&fixture_path(name), ImportOptions::default())
        .unwrap_or_else(|e| panic!("{} should import: {}", name, e))
}

#[test]
fn test_import_single_resistor() {
    let result = import("simple_resistor.txt");
    assert!(
        result.is_clean(),
        "Clean fixture should have no diagnostics: {:?}",
        result.diagnostics
    );
    assert_eq!(result.header.version, "V9.0");
    assert_eq!(result.schematic.filename, "simple_resistor.kicad_sch");

    let root = &result.schematic.root;
    assert!(root.sheets.is_empty(), "Single sheet design should be flat");
    assert_eq!(root.symbols.len(), 1);
    assert_eq!(root.title_block.title, "Resistor Demo");
    assert_eq!(root.title_block.revision, "B");

    let r1 = &root.symbols[0];
    assert_eq!(r1.reference.text, "R1");
    assert_eq!(r1.value.text, "10k");
    assert_eq!(r1.position, Position::new(1000.0, 2000.0));
    let tolerance = r1.field("Tolerance").expect("custom field");
    assert_eq!(tolerance.text, "1%");
    assert!(!tolerance.visible);

    let lib = result.schematic.lib_symbol("RES_0805").expect("library symbol");
    assert_eq!(lib.shapes.len(), 4);
    assert_eq!(lib.pins.len(), 2);
    assert_eq!(lib.pins[0].name, "A");
    assert_eq!(lib.pins[1].name, "B");
    assert_eq!(lib.pins[0].pin_type, PinType::Passive);

    assert_eq!(result.stats.lib_symbols, 1);
    assert_eq!(result.stats.sheets, 1);
    assert_eq!(result.stats.total_diagnostics(), 0);
}

#[test]
fn test_import_power_net() {
    let result = import("power_net.txt");
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let schematic = &result.schematic;

    let vcc = schematic.net("VCC").expect("VCC net");
    assert!(vcc.global);
    assert!(vcc.has_connection("R1", "1"));
    assert!(vcc.has_connection("U1", "14"));
    assert!(vcc.has_connection("P1", "1"));
    assert_eq!(vcc.connections.len(), 3);

    // one polyline of three points
    assert_eq!(schematic.root.lines.len(), 2);
    assert!(schematic.root.lines.iter().all(|l| l.layer == Layer::Wire));
    let globals: Vec<_> = schematic.root.labels_of_type(LabelType::Global).collect();
    assert_eq!(globals.len(), 1);
    assert_eq!(globals[0].text, "VCC");

    // both variants of the family are in the library, placed or not
    let vcc_symbol = schematic.lib_symbol("power:VCC").expect("VCC power symbol");
    assert!(vcc_symbol.is_power);
    assert!(schematic.lib_symbol("power:+5V").is_some());
    assert_eq!(schematic.find_symbol("P1").map(|s| s.lib_name.as_str()), Some("power:VCC"));
    assert_eq!(result.stats.lib_symbols, 4);
    assert_eq!(result.stats.symbols, 3);
}

#[test]
fn test_import_multi_sheet_hierarchy() {
    let result = import("multi_sheet.txt");
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let root = &result.schematic.root;

    assert_eq!(root.sheets.len(), 3);
    assert!(root.symbols.is_empty());
    let files: Vec<&str> = root.sheets.iter().map(|s| s.filename.as_str()).collect();
    assert_eq!(
        files,
        vec![
            "multi_sheet_sheet1.kicad_sch",
            "multi_sheet_sheet2.kicad_sch",
            "multi_sheet_sheet3.kicad_sch",
        ]
    );

    // ceil(sqrt(3)) = 2 columns
    assert_eq!(root.sheets[0].position.y, root.sheets[1].position.y);
    assert_eq!(root.sheets[0].position.x, root.sheets[2].position.x);
    assert!(root.sheets[2].position.y > root.sheets[0].position.y);

    for sheet in &root.sheets {
        assert!(sheet.pin("CLK").is_some());
        let hier: Vec<_> = sheet.screen.labels_of_type(LabelType::Hierarchical).collect();
        assert_eq!(hier.len(), 1);
        assert_eq!(hier[0].text, "CLK");
        assert_eq!(sheet.screen.symbols.len(), 1);
    }
    assert!(root.sheets[1].pin("LOCAL2").is_none());

    let clk = result.schematic.net("CLK").unwrap();
    assert!(clk.global);
    assert_eq!(clk.connections.len(), 3);
    assert!(!result.schematic.net("LOCAL2").unwrap().global);
    assert_eq!(result.stats.sheets, 3);
}

#[test]
fn test_import_legacy_powerlogic() {
    let result = import("legacy_powerlogic.asc");
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let schematic = &result.schematic;

    let dgnd = schematic.net("DGND").expect("DGND net");
    assert!(dgnd.global);
    assert!(dgnd.has_connection("U1", "7"));
    assert!(dgnd.has_connection("PG1", "1"));
    assert!(schematic.net("VCC").unwrap().has_connection("U1", "14"));
    assert!(schematic.net("PWRGND").unwrap().has_connection("PG2", "1"));

    assert!(schematic.lib_symbol("power:GNDD").is_some());
    assert!(schematic.lib_symbol("power:GNDPWR").is_some());
    assert_eq!(result.stats.lib_symbols, 3);
}

#[test]
fn test_import_malformed_recovers() {
    let result = import("malformed.txt");
    let stats = &result.stats;

    assert_eq!(stats.desync_errors, 2, "{:?}", result.diagnostics);
    assert_eq!(stats.duplicate_errors, 2, "{:?}", result.diagnostics);
    assert_eq!(stats.mapping_errors, 1, "{:?}", result.diagnostics);
    assert_eq!(stats.reference_errors, 1, "{:?}", result.diagnostics);
    assert_eq!(stats.format_errors, 0, "{:?}", result.diagnostics);
    assert_eq!(result.diagnostics.len(), 6);

    // everything that could be read is still built
    assert_eq!(stats.symbols, 2);
    let u1 = result.schematic.find_symbol("U1").expect("first U1 kept");
    assert_eq!(u1.position, Position::new(0.0, 0.0));
    let n1 = result.schematic.net("N1").unwrap();
    assert_eq!(n1.connections.len(), 1);
    assert!(n1.has_connection("U1", "1"));
    assert!(result.schematic.root.lines.is_empty());
}

#[test]
fn test_strict_mode_rejects_malformed() {
    let options = ImportOptions {
        strict_mode: true,
        ..Default::default()
    };
    let result = PadsImportCore::import_file(&fixture_path("malformed.txt"), options.clone());
    assert!(matches!(result, Err(PadsImportError::Strict(_))));

    let clean = PadsImportCore::import_file(&fixture_path("simple_resistor.txt"), options);
    assert!(clean.is_ok(), "Strict mode accepts a clean file");
}

#[test]
fn test_not_pads_file_is_rejected() {
    let path = fixture_path("not_pads.txt");
    assert!(!PadsImportCore::check_file(&path));
    let result = PadsImportCore::import_file(&path, ImportOptions::default());
    assert!(matches!(result, Err(PadsImportError::Parse(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = padsimport::import_file(&fixture_path("does_not_exist.txt"));
    assert!(matches!(result, Err(PadsImportError::Io(_))));
}

#[test]
fn test_discover_pads_files() {
    let files = padsimport::discover_pads_files(&fixture_path("")).unwrap();
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "legacy_powerlogic.asc",
            "malformed.txt",
            "multi_sheet.txt",
            "power_net.txt",
            "simple_resistor.txt",
        ]
    );
}

#[test]
fn test_import_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixture_path("simple_resistor.txt"),
        dir.path().join("board.txt"),
    )
    .unwrap();
    std::fs::create_dir(dir.path().join(".cache")).unwrap();
    std::fs::copy(
        fixture_path("power_net.txt"),
        dir.path().join(".cache").join("hidden.txt"),
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), "just some notes\n").unwrap();

    let results = PadsImportCore::import_directory(dir.path(), ImportOptions::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].schematic.filename, "board.kicad_sch");
    assert!(results[0].file.ends_with("board.txt"));
}

#[test]
fn test_parse_only() {
    let outcome = padsimport::parse_file(&fixture_path("power_net.txt")).unwrap();
    assert_eq!(outcome.design.decals.len(), 2);
    assert_eq!(outcome.design.part_types.len(), 3);
    assert_eq!(outcome.design.placements.len(), 3);
    assert_eq!(outcome.design.signals.len(), 1);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_stats_serialize() {
    let result = import("multi_sheet.txt");
    let json = serde_json::to_value(&result.stats).unwrap();
    assert_eq!(json["sheets"], 3);
    assert_eq!(json["reference_errors"], 0);
}
