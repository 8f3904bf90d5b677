//! Core import logic shared by the library API and the CLI.
//! Reads a PADS file, builds the schematic and gathers every diagnostic.

use std::path::{Path, PathBuf};

use crate::builder::SchematicBuilder;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::{check_file_header, Header, PadsDesign, PadsParseError, PadsParser};
use crate::sch::Schematic;

#[derive(Debug, thiserror::Error)]
pub enum PadsImportError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Strict mode: {0}")]
    Strict(String),
    #[error("{0}")]
    Other(String),
}

impl From<PadsParseError> for PadsImportError {
    fn from(e: PadsParseError) -> Self {
        match e {
            PadsParseError::Io(io) => PadsImportError::Io(io),
            other => PadsImportError::Parse(other.to_string()),
        }
    }
}

/// Options for import runs (library or CLI).
#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Fail the import when any diagnostic is collected
    pub strict_mode: bool,
    /// Emit a single-sheet design directly into the root screen
    pub flatten_single_sheet: bool,
    /// Width and height of child sheet symbols, in mils
    pub sheet_size: (f64, f64),
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            flatten_single_sheet: true,
            sheet_size: (2000.0, 1500.0),
        }
    }
}

/// Per-file import result with the built schematic and counts.
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub file: PathBuf,
    pub header: Header,
    pub schematic: Schematic,
    pub diagnostics: Diagnostics,
    pub stats: ImportStats,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ImportStats {
    pub lib_symbols: usize,
    pub symbols: usize,
    /// Placement records read from the file, one per gate
    pub placements: usize,
    pub nets: usize,
    pub sheets: usize,
    pub wires: usize,
    pub labels: usize,
    pub format_errors: usize,
    pub desync_errors: usize,
    pub mapping_errors: usize,
    pub duplicate_errors: usize,
    pub reference_errors: usize,
}

impl ImportStats {
    pub fn total_diagnostics(&self) -> usize {
        self.format_errors
            + self.desync_errors
            + self.mapping_errors
            + self.duplicate_errors
            + self.reference_errors
    }
}

impl ImportResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.has(kind)
    }
}

fn collect_stats(
    design: &PadsDesign,
    schematic: &Schematic,
    diagnostics: &Diagnostics,
) -> ImportStats {
    let screens = schematic.screens();
    ImportStats {
        lib_symbols: schematic.library.len(),
        symbols: screens.iter().map(|s| s.symbols.len()).sum(),
        placements: design.placements.len(),
        nets: schematic.nets.len(),
        // child sheets only, or the flat root
        sheets: if screens.len() > 1 { screens.len() - 1 } else { 1 },
        wires: screens.iter().map(|s| s.lines.len()).sum(),
        labels: screens.iter().map(|s| s.labels.len()).sum(),
        format_errors: diagnostics.count(DiagnosticKind::Format),
        desync_errors: diagnostics.count(DiagnosticKind::Desync),
        mapping_errors: diagnostics.count(DiagnosticKind::Mapping),
        duplicate_errors: diagnostics.count(DiagnosticKind::Duplicate),
        reference_errors: diagnostics.count(DiagnosticKind::Reference),
    }
}

/// Recursively discover PADS-Logic exports in a directory. Candidates are
/// `.txt`/`.asc` files whose first line is a PADS header.
pub fn discover_pads_files(dir: &Path) -> Result<Vec<PathBuf>, PadsImportError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), PadsImportError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() {
            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase());
            if matches!(ext.as_deref(), Some("txt") | Some("asc")) && check_file_header(&path) {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Core import API used by both the library and the CLI.
pub struct PadsImportCore;

impl PadsImportCore {
    /// Cheap probe: does this file start with a PADS-Logic header?
    pub fn check_file(path: &Path) -> bool {
        check_file_header(path)
    }

    /// Import a single PADS file.
    pub fn import_file(
        path: &Path,
        options: ImportOptions,
    ) -> Result<ImportResult, PadsImportError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("untitled.txt")
            .to_string();
        let mut result = Self::import_str(&content, &filename, options)?;
        result.file = path.to_path_buf();
        Ok(result)
    }

    /// Import PADS content already in memory. `source_filename` names the
    /// output sheet files.
    pub fn import_str(
        content: &str,
        source_filename: &str,
        options: ImportOptions,
    ) -> Result<ImportResult, PadsImportError> {
        let outcome = PadsParser::parse_str(content)?;
        let strict = options.strict_mode;

        let build = SchematicBuilder::new(&outcome.design, source_filename, options).build();
        let mut diagnostics = outcome.diagnostics;
        diagnostics.extend(build.diagnostics);

        if strict {
            if let Some(first) = diagnostics.iter().next() {
                return Err(PadsImportError::Strict(format!(
                    "{} diagnostic(s), first: {}",
                    diagnostics.len(),
                    first
                )));
            }
        }

        let stats = collect_stats(&outcome.design, &build.schematic, &diagnostics);
        tracing::info!(
            "Imported {}: {} symbols, {} nets, {} diagnostic(s)",
            source_filename,
            stats.symbols,
            stats.nets,
            stats.total_diagnostics()
        );

        Ok(ImportResult {
            file: PathBuf::from(source_filename),
            header: outcome.design.header.clone(),
            schematic: build.schematic,
            diagnostics,
            stats,
        })
    }

    /// Import every PADS file found under a directory.
    pub fn import_directory(
        dir: &Path,
        options: ImportOptions,
    ) -> Result<Vec<ImportResult>, PadsImportError> {
        let files = discover_pads_files(dir)?;
        let mut results = Vec::new();
        for path in files {
            results.push(Self::import_file(&path, options.clone())?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIGN: &str = "*PADS-LOGIC-V9.0*\n\
*CAEDECAL*\n\
DECAL RES 1 0 0 2\n\
\"f\"\n\
\"f\"\n\
PIN 1 -100 0 100 180\n\
PIN 2 100 0 100 0\n\
*PARTTYPE*\n\
PARTTYPE RES RES 1\n\
G:RES 0 2\n\
1.0.Z 2.0.Z\n\
*PARTS*\n\
R1 RES 0 0 0 0 1\n\
*SIGNAL*\n\
SIGNAL N1\n\
R1.1 R9.1\n";

    #[test]
    fn test_import_str_collects_diagnostics() {
        let result = PadsImportCore::import_str(DESIGN, "demo.txt", ImportOptions::default())
            .unwrap();
        assert!(!result.is_clean());
        assert!(result.has(DiagnosticKind::Reference));
        assert_eq!(result.stats.reference_errors, 1);
        assert_eq!(result.stats.symbols, 1);
        assert_eq!(result.stats.placements, 1);
        assert_eq!(result.stats.sheets, 1);
        assert_eq!(result.stats.total_diagnostics(), 1);
        assert_eq!(result.schematic.filename, "demo.kicad_sch");
    }

    #[test]
    fn test_strict_mode_fails_on_diagnostics() {
        let options = ImportOptions {
            strict_mode: true,
            ..Default::default()
        };
        let err = PadsImportCore::import_str(DESIGN, "demo.txt", options).unwrap_err();
        assert!(matches!(err, PadsImportError::Strict(_)));
        assert!(err.to_string().contains("REFERENCE_ERROR"));
    }

    #[test]
    fn test_bad_header_is_fatal() {
        let content = "EESchema Schematic File Version 4\n";
        let err = PadsImportCore::import_str(content, "x.sch", ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, PadsImportError::Parse(_)));
    }

    #[test]
    fn test_unflattened_single_sheet() {
        let options = ImportOptions {
            flatten_single_sheet: false,
            ..Default::default()
        };
        let result = PadsImportCore::import_str(DESIGN, "demo.txt", options).unwrap();
        assert_eq!(result.schematic.root.sheets.len(), 1);
        assert!(result.schematic.root.symbols.is_empty());
        assert_eq!(result.stats.sheets, 1);
    }
}
