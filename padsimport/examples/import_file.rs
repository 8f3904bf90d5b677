//! Import example: import a PADS-Logic file and print what was built.

use padsimport::prelude::*;
use std::path::Path;

fn main() -> Result<(), PadsImportError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/multi_sheet.txt".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example import_file [path/to/design.txt]");
        std::process::exit(1);
    }

    let result = PadsImportCore::import_file(path, ImportOptions::default())?;

    println!("Import results for: {}", result.file.display());
    println!(
        "Source: {} {}",
        result.header.product.as_str(),
        result.header.version
    );
    println!();

    let schematic = &result.schematic;
    println!("Root: {}", schematic.filename);
    for sheet in &schematic.root.sheets {
        println!(
            "  {} -> {} ({} symbols, {} pins)",
            sheet.name,
            sheet.filename,
            sheet.screen.symbols.len(),
            sheet.pins.len()
        );
    }

    println!();
    println!("Library symbols:");
    for symbol in &schematic.library {
        println!("  {} ({} pins)", symbol.name, symbol.pins.len());
    }

    println!();
    println!("Nets:");
    for net in &schematic.nets {
        let pins: Vec<String> = net
            .connections
            .iter()
            .map(|c| format!("{}.{}", c.component_ref, c.pin_number))
            .collect();
        println!(
            "  {}{} [{}]",
            net.name,
            if net.global { " (global)" } else { "" },
            pins.join(", ")
        );
    }

    if !result.is_clean() {
        println!();
        println!("Diagnostics:");
        for diagnostic in result.diagnostics.iter() {
            println!("  - {}", diagnostic);
        }
    }

    Ok(())
}
