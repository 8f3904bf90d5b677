//! `*PARTS*` section parser
//!
//! ```text
//! U1.A 7400@NAND2 1200 3400 90 0 1
//! "Ref.Des." U1 Y
//! "Manufacturer" TI N
//! ```
//!
//! Attribute lists carry no count, so a list ends at the first line shaped
//! like a placement record or at the next section marker.

use std::collections::HashSet;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::pads::{parse_number, split_quoted};
use super::pads_schema::*;
use super::scanner::{ScannedLine, Scanner};

/// Parse placements until the next section marker
pub fn parse_parts_section(
    scanner: &mut Scanner<'_>,
    design: &mut PadsDesign,
    diags: &mut Diagnostics,
) {
    let mut keys: HashSet<String> = design.placements.iter().map(|p| p.key()).collect();

    while let Some(line) = scanner.next_data() {
        if !is_placement_line(&line) {
            diags.at(
                DiagnosticKind::Desync,
                line.number,
                format!("Unexpected line in PARTS section: '{}'", line.text),
            );
            continue;
        }

        let Some(mut placement) = parse_placement_line(&line) else {
            continue;
        };

        while let Some(next) = scanner.peek() {
            if next.is_section() || is_placement_line(next) {
                break;
            }
            let Some(attr_line) = scanner.next_line() else { break };
            match parse_attribute_line(&attr_line) {
                Some(attr) => placement.attributes.push(attr),
                None => diags.at(
                    DiagnosticKind::Desync,
                    attr_line.number,
                    format!(
                        "Unreadable attribute line for {}: '{}'",
                        placement.key(),
                        attr_line.text
                    ),
                ),
            }
        }

        let key = placement.key();
        if !keys.insert(key.clone()) {
            diags.at(
                DiagnosticKind::Duplicate,
                placement.line,
                format!("Part {} placed twice, keeping the first placement", key),
            );
            continue;
        }
        design.placements.push(placement);
    }
}

/// A placement record has at least seven tokens, an unquoted reference and
/// numeric position, rotation, mirror and sheet fields.
pub fn is_placement_line(line: &ScannedLine<'_>) -> bool {
    let parts = line.tokens();
    parts.len() >= 7
        && !parts[0].starts_with('"')
        && parts[2..7].iter().all(|t| parse_number(t).is_some())
}

fn parse_placement_line(line: &ScannedLine<'_>) -> Option<PartPlacement> {
    let parts = line.tokens();
    let nums: Vec<f64> = parts[2..7].iter().filter_map(|t| parse_number(t)).collect();
    if nums.len() != 5 {
        return None;
    }

    let (reference, suffix) = match parts[0].rsplit_once('.') {
        Some((reference, suffix)) if !reference.is_empty() && !suffix.is_empty() => {
            (reference.to_string(), Some(suffix.to_string()))
        }
        _ => (parts[0].to_string(), None),
    };
    let (part_type, symbol_name) = match parts[1].split_once('@') {
        Some((part_type, decal)) if !decal.is_empty() => {
            (part_type.to_string(), Some(decal.to_string()))
        }
        _ => (parts[1].to_string(), None),
    };
    let gate_number = suffix.as_deref().and_then(gate_number_from_suffix).unwrap_or(1);

    Some(PartPlacement {
        reference,
        suffix,
        part_type,
        symbol_name,
        position: Point::new(nums[0], nums[1]),
        rotation: nums[2],
        mirror_flags: nums[3].max(0.0) as u8,
        sheet_number: nums[4].max(1.0) as u32,
        gate_number,
        attributes: Vec::new(),
        line: line.number,
    })
}

/// `A` -> 1, `B` -> 2, ..., `AA` -> 27; numeric suffixes are used as is
pub fn gate_number_from_suffix(suffix: &str) -> Option<u32> {
    if let Ok(n) = suffix.parse::<u32>() {
        return Some(n);
    }
    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    suffix.chars().try_fold(0u32, |acc, c| {
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// `"<name>" [<value...>] <Y|N>`
fn parse_attribute_line(line: &ScannedLine<'_>) -> Option<PartAttribute> {
    let (name, rest) = split_quoted(line.text)?;
    let (value, visible) = match rest.rsplit_once(char::is_whitespace) {
        Some((value, flag)) if is_visibility_flag(flag) => {
            (value.trim().to_string(), flag.eq_ignore_ascii_case("Y"))
        }
        _ if is_visibility_flag(&rest) => (String::new(), rest.eq_ignore_ascii_case("Y")),
        _ => {
            tracing::debug!("Attribute {} on line {} has no visibility flag", name, line.number);
            (rest, false)
        }
    };
    Some(PartAttribute {
        name,
        value,
        visible,
    })
}

fn is_visibility_flag(token: &str) -> bool {
    token.eq_ignore_ascii_case("Y") || token.eq_ignore_ascii_case("N")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PadsParser;

    fn parse(body: &str) -> crate::parser::ParseOutcome {
        PadsParser::parse_str(&format!("*PADS-LOGIC-V9.0*\n*PARTS*\n{}", body)).unwrap()
    }

    #[test]
    fn test_gate_number_from_suffix() {
        assert_eq!(gate_number_from_suffix("A"), Some(1));
        assert_eq!(gate_number_from_suffix("d"), Some(4));
        assert_eq!(gate_number_from_suffix("AA"), Some(27));
        assert_eq!(gate_number_from_suffix("3"), Some(3));
        assert_eq!(gate_number_from_suffix("A1"), None);
    }

    #[test]
    fn test_parse_placement_with_attributes() {
        let outcome = parse(
            "R1 RES_0805 1000 2000 0 0 1\n\
\"Value\" 10k Y\n\
\"PCB DECAL\" R0805 N\n\
\"Manufacturer Part\" ERJ 6 GEYJ103V N\n\
\"Notes\" N\n",
        );
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        let p = &outcome.design.placements[0];
        assert_eq!(p.reference, "R1");
        assert!(p.suffix.is_none());
        assert_eq!(p.part_type, "RES_0805");
        assert!(p.symbol_name.is_none());
        assert_eq!(p.position, Point::new(1000.0, 2000.0));
        assert_eq!(p.sheet_number, 1);
        assert_eq!(p.gate_number, 1);
        assert_eq!(p.attributes.len(), 4);
        assert_eq!(p.attributes[0].value, "10k");
        assert!(p.attributes[0].visible);
        assert!(!p.attributes[1].visible);
        assert_eq!(p.attributes[2].value, "ERJ 6 GEYJ103V");
        assert_eq!(p.attributes[3].value, "");
        assert_eq!(p.attribute("pcb decal").map(|a| a.value.as_str()), Some("R0805"));
    }

    #[test]
    fn test_multi_gate_placements() {
        let outcome = parse(
            "U1.A 7400@NAND2 100 100 90 1 2\n\
U1.B 7400 300 100 180 2 2\n",
        );
        let placements = &outcome.design.placements;
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].reference, "U1");
        assert_eq!(placements[0].key(), "U1.A");
        assert_eq!(placements[0].symbol_name.as_deref(), Some("NAND2"));
        assert_eq!(placements[0].rotation, 90.0);
        assert!(placements[0].mirrored_horizontally());
        assert_eq!(placements[0].sheet_number, 2);
        assert_eq!(placements[1].gate_number, 2);
        assert!(placements[1].mirrored_vertically());
    }

    #[test]
    fn test_attribute_list_ends_at_section() {
        let outcome = PadsParser::parse_str(
            "*PADS-LOGIC-V9.0*\n*PARTS*\nC1 CAP 0 0 0 0 1\n\"Value\" 100n Y\n*SIGNAL*\nSIGNAL GND\nC1.2\n",
        )
        .unwrap();
        assert_eq!(outcome.design.placements[0].attributes.len(), 1);
        assert_eq!(outcome.design.signals.len(), 1);
    }

    #[test]
    fn test_duplicate_placement_first_wins() {
        let outcome = parse("R1 RES 0 0 0 0 1\nR1 CAP 10 10 0 0 1\n");
        assert_eq!(outcome.design.placements.len(), 1);
        assert_eq!(outcome.design.placements[0].part_type, "RES");
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Duplicate), 1);
    }

    #[test]
    fn test_unexpected_line_is_reported() {
        let outcome = parse("R1 RES 0 0\nR2 RES 0 0 0 0 1\n");
        assert_eq!(outcome.design.placements.len(), 1);
        assert_eq!(outcome.design.placements[0].reference, "R2");
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Desync), 1);
    }
}
