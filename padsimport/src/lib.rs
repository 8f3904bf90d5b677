//! PadsImport - PADS-Logic schematic import library
//!
//! This library reads PADS-Logic and PADS-PowerLogic ASCII exports and turns
//! them into an in-memory hierarchical schematic: library symbols built from
//! CAE decals, placed symbol instances, wires, labels, sheets and nets.
//!
//! # Quick Start
//!
//! ```no_run
//! use padsimport::{ImportOptions, PadsImportCore};
//! use std::path::Path;
//!
//! let options = ImportOptions::default();
//! let result = PadsImportCore::import_file(
//!     Path::new("design.txt"),
//!     options,
//! ).unwrap();
//!
//! println!("{} symbols", result.stats.symbols);
//! for diagnostic in result.diagnostics.iter() {
//!     println!("{}", diagnostic);
//! }
//! ```
//!
//! # Features
//!
//! - **Both dialects**: legacy (pre-V9) and modern decal/part type grammars
//! - **Symbol cache**: one library symbol per decal and pin mapping
//! - **Power families**: `$GND_SYMS`/`$PWR_SYMS` become power symbols
//! - **Hierarchy**: multi-sheet designs become child sheets with sheet pins
//! - **Diagnostics**: malformed records are reported, never fatal

pub mod builder;
pub mod core;
pub mod diagnostics;
pub mod parser;
pub mod sch;
pub mod units;

// Re-export main types
pub use core::{
    discover_pads_files, ImportOptions, ImportResult, ImportStats, PadsImportCore,
    PadsImportError,
};
pub use builder::{SchematicBuilder, SymbolBuilder};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use parser::{PadsDesign, PadsParser, ParseOutcome};
pub use sch::{LibSymbol, Schematic};
pub use units::Units;

/// Parse a PADS file without building a schematic (convenience wrapper).
pub fn parse_file(path: &std::path::Path) -> Result<ParseOutcome, PadsImportError> {
    PadsParser::parse_file(path).map_err(PadsImportError::from)
}

/// Import a PADS file with default options (convenience wrapper).
pub fn import_file(path: &std::path::Path) -> Result<ImportResult, PadsImportError> {
    PadsImportCore::import_file(path, ImportOptions::default())
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        DiagnosticKind, Diagnostics, ImportOptions, ImportResult, ImportStats, PadsImportCore,
        PadsImportError, Schematic,
    };
}
