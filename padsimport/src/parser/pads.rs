//! PADS-Logic ASCII Parser
//!
//! Top-level driver for PADS-Logic and PADS-PowerLogic `.txt`/`.asc`
//! exports. The header fixes the grammar dialect once; every section parser
//! receives it instead of guessing field layouts from the data.
//!
//! Sections handled:
//! - header line (`*PADS-LOGIC-V9.0*`, `*PADS-POWERLOGIC-V5.2*`)
//! - `*PARAMETERS*` / `*SCH*` and `*FIELDS*`
//! - `*CAEDECAL*` (see `decal`), `*PARTTYPE*` (see `parttype`)
//! - `*PARTS*` (see `placement`), `*SIGNAL*` (see `signal`)
//!
//! Unknown sections are skipped. Problems other than a bad header are
//! collected as diagnostics and parsing continues.

use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::units::Units;

use super::pads_schema::*;
use super::scanner::{LineKind, Scanner, Section};
use super::{decal, parttype, placement, signal};

/// Error type for PADS parsing
#[derive(Debug, thiserror::Error)]
pub enum PadsParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Parsed design plus everything that went wrong along the way
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub design: PadsDesign,
    pub diagnostics: Diagnostics,
}

/// Parser for PADS-Logic ASCII files
pub struct PadsParser;

impl PadsParser {
    /// Read and parse a PADS file from disk
    pub fn parse_file(path: &Path) -> Result<ParseOutcome, PadsParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse PADS file content
    pub fn parse_str(content: &str) -> Result<ParseOutcome, PadsParseError> {
        let mut scanner = Scanner::new(content);
        let header = Self::parse_header(&mut scanner)?;
        let dialect = header.dialect();
        tracing::debug!(
            "PADS header: {} {} ({:?} dialect)",
            header.product.as_str(),
            header.version,
            dialect
        );

        let mut design = PadsDesign::new(header);
        let mut diags = Diagnostics::new();

        while let Some(line) = scanner.next_line() {
            match line.kind {
                LineKind::Section(Section::Parameters) => {
                    Self::parse_parameters(&mut scanner, &mut design.parameters);
                }
                LineKind::Section(Section::Fields) => {
                    Self::parse_fields(&mut scanner, &mut design.parameters);
                }
                LineKind::Section(Section::CaeDecal) => {
                    decal::parse_decal_section(&mut scanner, dialect, &mut design, &mut diags);
                }
                LineKind::Section(Section::PartType) => {
                    parttype::parse_part_type_section(&mut scanner, dialect, &mut design, &mut diags);
                }
                LineKind::Section(Section::Parts) => {
                    placement::parse_parts_section(&mut scanner, &mut design, &mut diags);
                }
                LineKind::Section(Section::Signal) => {
                    signal::parse_signal_section(&mut scanner, &mut design, &mut diags);
                }
                LineKind::Section(Section::End) => break,
                LineKind::Section(Section::Other(name)) => {
                    let mut skipped = 0usize;
                    while scanner.next_data().is_some() {
                        skipped += 1;
                    }
                    tracing::debug!("Skipped section *{}* ({} lines)", name, skipped);
                }
                LineKind::Data => {
                    tracing::debug!("Ignoring line {} outside any section", line.number);
                }
                LineKind::Blank | LineKind::Comment => {}
            }
        }

        tracing::info!(
            "Parsed {} decals, {} part types, {} placements, {} signals",
            design.decals.len(),
            design.part_types.len(),
            design.placements.len(),
            design.signals.len()
        );

        Ok(ParseOutcome {
            design,
            diagnostics: diags,
        })
    }

    /// Parse the header from the first significant line
    pub fn parse_header(scanner: &mut Scanner<'_>) -> Result<Header, PadsParseError> {
        let line = scanner
            .next_line()
            .ok_or_else(|| PadsParseError::InvalidFormat("File is empty".to_string()))?;
        parse_header_line(line.text)
    }

    /// Parse a `*PARAMETERS*` block into `params`
    pub fn parse_parameters(scanner: &mut Scanner<'_>, params: &mut Parameters) {
        let mut explicit_size = false;

        while let Some(line) = scanner.next_data() {
            if line.text.starts_with('"') {
                if let Some((name, value)) = split_quoted(line.text) {
                    params.fields.insert(name, value);
                }
                continue;
            }

            let parts = line.tokens();
            let key = parts[0].to_ascii_uppercase();
            let rest = rest_after(line.text, 1);
            match key.as_str() {
                "UNITS" => match parts.get(1).and_then(|t| Units::from_token(t)) {
                    Some(units) => params.units = units,
                    None => tracing::debug!("Unknown UNITS value on line {}", line.number),
                },
                "GRID" => {
                    if let Some(x) = parts.get(1).and_then(|t| parse_number(t)) {
                        params.grid_x = x;
                        params.grid_y = parts.get(2).and_then(|t| parse_number(t)).unwrap_or(x);
                    }
                }
                "BORDER_TEMPLATE" | "BORDER" => params.border_template = rest.to_string(),
                "JOB_NAME" | "JOBNAME" => params.job_name = rest.to_string(),
                "SHEET_SIZE" | "SHEETSIZE" => {
                    if let Some(name) = parts.get(1) {
                        params.sheet_size.name = name.to_string();
                        let width = parts.get(2).and_then(|t| parse_number(t));
                        let height = parts.get(3).and_then(|t| parse_number(t));
                        if let (Some(w), Some(h)) = (width, height) {
                            params.sheet_size.width = w;
                            params.sheet_size.height = h;
                            explicit_size = true;
                        }
                    }
                }
                "TEXT_SIZE" | "TEXTSIZE" => {
                    if let Some(v) = parts.get(1).and_then(|t| parse_number(t)) {
                        params.text_size = v;
                    }
                }
                "LINE_WIDTH" | "LINEWIDTH" => {
                    if let Some(v) = parts.get(1).and_then(|t| parse_number(t)) {
                        params.line_width = v;
                    }
                }
                _ => {
                    tracing::debug!("Ignoring parameter {} on line {}", parts[0], line.number);
                }
            }
        }

        // Named sizes are resolved once UNITS is known, whatever the line order
        if !explicit_size && !params.sheet_size.name.is_empty() {
            if let Some((w, h)) = standard_sheet_size_mils(&params.sheet_size.name) {
                params.sheet_size.width = params.units.from_mils(w);
                params.sheet_size.height = params.units.from_mils(h);
            } else {
                tracing::debug!("Unknown sheet size {}", params.sheet_size.name);
            }
        }
    }

    /// Parse a `*FIELDS*` block of `"name" value` lines
    pub fn parse_fields(scanner: &mut Scanner<'_>, params: &mut Parameters) {
        while let Some(line) = scanner.next_data() {
            match split_quoted(line.text) {
                Some((name, value)) => {
                    params.fields.insert(name, value);
                }
                None => {
                    let mut parts = line.text.splitn(2, char::is_whitespace);
                    let name = parts.next().unwrap_or("").to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    if !name.is_empty() {
                        params.fields.insert(name, value);
                    }
                }
            }
        }
    }
}

/// Parse a header line such as `*PADS-LOGIC-V9.0* DESIGN EXPORT FILE` or
/// `PADS-POWERLOGIC V5.2`.
pub fn parse_header_line(line: &str) -> Result<Header, PadsParseError> {
    let body = line.trim().trim_start_matches('*');
    let upper = body.to_ascii_uppercase();

    let product = if upper.starts_with("PADS-POWERLOGIC") {
        Product::PadsPowerLogic
    } else if upper.starts_with("PADS-LOGIC") {
        Product::PadsLogic
    } else {
        return Err(PadsParseError::InvalidFormat(
            "Expected PADS-LOGIC or PADS-POWERLOGIC header".to_string(),
        ));
    };

    let rest = &body[product.as_str().len()..];
    let (version_token, description) = if let Some(suffix) = rest.strip_prefix('-') {
        // -V9.0* DESIGN EXPORT FILE
        let end = suffix
            .find(|c: char| c == '*' || c.is_whitespace())
            .unwrap_or(suffix.len());
        (Some(&suffix[..end]), suffix[end..].trim_start_matches('*').trim())
    } else {
        let rest = rest.trim_start_matches('*').trim();
        let mut parts = rest.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        if looks_like_version(first) {
            (Some(first), parts.next().unwrap_or("").trim())
        } else {
            (None, rest)
        }
    };

    let (version, major, minor) = match version_token.and_then(parse_version) {
        Some((major, minor)) => (version_token.unwrap_or_default().to_string(), major, minor),
        None => {
            tracing::warn!("PADS header has no readable version, assuming V9.0");
            ("V9.0".to_string(), 9, 0)
        }
    };

    Ok(Header {
        product,
        version,
        major,
        minor,
        description: description.to_string(),
    })
}

fn looks_like_version(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some('V') | Some('v')) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// `V5.2` -> (5, 2)
fn parse_version(token: &str) -> Option<(u32, u32)> {
    if !looks_like_version(token) {
        return None;
    }
    let digits = &token[1..];
    let mut parts = digits.split('.');
    let major = leading_number(parts.next()?)?;
    let minor = parts.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor))
}

fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Standard drawing sheet sizes, landscape, in mils
fn standard_sheet_size_mils(name: &str) -> Option<(f64, f64)> {
    let size = match name.to_ascii_uppercase().as_str() {
        "A" => (11000.0, 8500.0),
        "B" => (17000.0, 11000.0),
        "C" => (22000.0, 17000.0),
        "D" => (34000.0, 22000.0),
        "E" => (44000.0, 34000.0),
        "A4" => (11693.0, 8268.0),
        "A3" => (16535.0, 11693.0),
        "A2" => (23386.0, 16535.0),
        "A1" => (33110.0, 23386.0),
        "A0" => (46811.0, 33110.0),
        _ => return None,
    };
    Some(size)
}

/// Parse a decimal literal
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Text after the first `n` whitespace-separated tokens
pub(crate) fn rest_after(text: &str, n: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest.trim_end()
}

/// Split `"quoted name" rest of line` into its two parts
pub(crate) fn split_quoted(text: &str) -> Option<(String, String)> {
    let inner = text.strip_prefix('"')?;
    let end = inner.find('"')?;
    let name = inner[..end].to_string();
    let rest = inner[end + 1..].trim().to_string();
    Some((name, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_starred_form() {
        let header = parse_header_line("*PADS-LOGIC-V9.0* DESIGN EXPORT FILE FROM PADS LOGIC").unwrap();
        assert_eq!(header.product, Product::PadsLogic);
        assert_eq!(header.version, "V9.0");
        assert_eq!((header.major, header.minor), (9, 0));
        assert_eq!(header.description, "DESIGN EXPORT FILE FROM PADS LOGIC");
        assert_eq!(header.dialect(), Dialect::Modern);
    }

    #[test]
    fn test_parse_header_spaced_form() {
        let header = parse_header_line("PADS-POWERLOGIC V5.2 legacy").unwrap();
        assert_eq!(header.product, Product::PadsPowerLogic);
        assert_eq!(header.version, "V5.2");
        assert_eq!(header.dialect(), Dialect::Legacy);
        assert_eq!(header.description, "legacy");
    }

    #[test]
    fn test_parse_header_without_version_defaults() {
        let header = parse_header_line("*PADS-LOGIC* exported").unwrap();
        assert_eq!(header.version, "V9.0");
        assert_eq!(header.description, "exported");
    }

    #[test]
    fn test_parse_header_rejects_other_formats() {
        let result = parse_header_line("EESchema Schematic File Version 4");
        assert!(matches!(result, Err(PadsParseError::InvalidFormat(_))));
        assert!(parse_header_line("*PADS-PCB-V9.0*").is_err());
    }

    #[test]
    fn test_parse_parameters_block() {
        let content = "*PADS-LOGIC-V9.0*\n\
*PARAMETERS*\n\
UNITS 1\n\
GRID 2.54\n\
JOB_NAME Power Supply Rev B\n\
SHEET_SIZE A4\n\
BORDER_TEMPLATE $A4_BORDER\n\
TEXT_SIZE 1.5\n\
\"Company Name\" ACME Widgets\n\
\"Title\" PSU\n\
*END*\n";
        let outcome = PadsParser::parse_str(content).unwrap();
        let params = &outcome.design.parameters;
        assert_eq!(params.units, Units::Metric);
        assert_eq!(params.grid_x, 2.54);
        assert_eq!(params.grid_y, 2.54);
        assert_eq!(params.job_name, "Power Supply Rev B");
        assert_eq!(params.border_template, "$A4_BORDER");
        assert_eq!(params.sheet_size.name, "A4");
        // A4 width converted from mils into the declared metric units
        assert!((params.sheet_size.width - 297.0).abs() < 0.1);
        assert_eq!(params.text_size, 1.5);
        assert_eq!(params.fields.get("Company Name").map(String::as_str), Some("ACME Widgets"));
        assert_eq!(params.fields.get("Title").map(String::as_str), Some("PSU"));
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_fields_section() {
        let content = "*PADS-LOGIC-V9.0*\n*FIELDS*\n\"Revision\" C\nDATE 2024-01-01\n";
        let outcome = PadsParser::parse_str(content).unwrap();
        let fields = &outcome.design.parameters.fields;
        assert_eq!(fields.get("Revision").map(String::as_str), Some("C"));
        assert_eq!(fields.get("DATE").map(String::as_str), Some("2024-01-01"));
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let content = "*PADS-LOGIC-V9.0*\n*TEXT*\n100 100 0 0 hello\n*LINES*\nfoo bar\n*END*\n";
        let outcome = PadsParser::parse_str(content).unwrap();
        assert!(outcome.design.decals.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_rest_after() {
        assert_eq!(rest_after("SIGPIN 11 1", 2), "1");
        assert_eq!(rest_after("JOB_NAME  My   Board ", 1), "My   Board");
        assert_eq!(rest_after("ONE", 3), "");
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            split_quoted("\"Ref.Des.\" R1 Y"),
            Some(("Ref.Des.".to_string(), "R1 Y".to_string()))
        );
        assert_eq!(split_quoted("no quotes"), None);
    }
}
