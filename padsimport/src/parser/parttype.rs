//! `*PARTTYPE*` section parser
//!
//! Ordinary part types list one `G:` line per gate followed by that gate's
//! pin tokens:
//!
//! ```text
//! PARTTYPE 7400 TTL 4
//! G:NAND2 0 3
//! 1.1.L.A 2.1.L.B 3.0.S.Y
//! ...
//! SIGPIN 14 VCC           (legacy dialect)
//! ```
//!
//! The synthetic power families (`$GND_SYMS`, `$PWR_SYMS`, category `GND` or
//! `PWR`) instead list `<decal> <pin type>` variant lines and `SIGPIN` bindings.

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::pads::rest_after;
use super::pads_schema::*;
use super::scanner::{ScannedLine, Scanner};

/// Parse part types until the next section marker
pub fn parse_part_type_section(
    scanner: &mut Scanner<'_>,
    dialect: Dialect,
    design: &mut PadsDesign,
    diags: &mut Diagnostics,
) {
    while let Some(line) = scanner.next_data() {
        if !is_part_type_header(&line) {
            let mut count = 1usize;
            while !at_block_end(scanner) {
                scanner.next_line();
                count += 1;
            }
            diags.at(
                DiagnosticKind::Desync,
                line.number,
                format!("Skipped {} line(s) not belonging to any part type", count),
            );
            continue;
        }

        let Some(part_type) = parse_part_type(scanner, &line, dialect, diags) else {
            continue;
        };
        let name = part_type.name.clone();
        let line_number = part_type.line;
        if !design.insert_part_type(part_type) {
            diags.at(
                DiagnosticKind::Duplicate,
                line_number,
                format!("Part type {} already defined, keeping the first definition", name),
            );
        }
    }
}

fn is_part_type_header(line: &ScannedLine<'_>) -> bool {
    line.first_token().eq_ignore_ascii_case("PARTTYPE")
}

fn at_block_end(scanner: &mut Scanner<'_>) -> bool {
    match scanner.peek() {
        Some(line) => line.is_section() || is_part_type_header(line),
        None => true,
    }
}

fn is_gate_line(line: &ScannedLine<'_>) -> bool {
    line.text
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("G:"))
}

fn is_sigpin_line(line: &ScannedLine<'_>) -> bool {
    line.first_token().eq_ignore_ascii_case("SIGPIN")
}

/// Parse one part type whose header line has already been consumed
pub fn parse_part_type(
    scanner: &mut Scanner<'_>,
    header: &ScannedLine<'_>,
    dialect: Dialect,
    diags: &mut Diagnostics,
) -> Option<PartTypeDef> {
    let parts = header.tokens();
    if parts.len() < 3 {
        diags.at(
            DiagnosticKind::Desync,
            header.number,
            format!("Malformed part type header '{}'", header.text),
        );
        while !at_block_end(scanner) {
            scanner.next_line();
        }
        return None;
    }

    let name = parts[1].to_string();
    let category = parts[2].to_string();
    let num_gates: u32 = parts.get(3).and_then(|t| t.parse().ok()).unwrap_or(1);
    let special_keyword =
        SpecialKeyword::from_token(&category).or_else(|| SpecialKeyword::from_token(&name));

    let mut part_type = PartTypeDef {
        is_connector: category.eq_ignore_ascii_case("CON"),
        name,
        category,
        num_physical: num_gates,
        special_keyword,
        gates: Vec::new(),
        special_variants: Vec::new(),
        sigpins: Vec::new(),
        line: header.number,
    };

    if let Some(keyword) = special_keyword {
        parse_special_body(scanner, &mut part_type, keyword, dialect, diags);
        return Some(part_type);
    }

    for gate_index in 0..num_gates {
        let is_gate = matches!(scanner.peek(), Some(l) if is_gate_line(l));
        if !is_gate {
            let line = scanner.line_number();
            diags.push(
                DiagnosticKind::Desync,
                line,
                format!(
                    "Part type {} declares {} gate(s) but only {} found",
                    part_type.name, num_gates, gate_index
                ),
            );
            break;
        }
        let Some(gate_line) = scanner.next_line() else { break };
        if let Some(gate) = parse_gate(scanner, &gate_line, &part_type.name, diags) {
            part_type.gates.push(gate);
        }
    }

    while let Some(line) = scanner.peek() {
        if !is_sigpin_line(line) {
            break;
        }
        let Some(line) = scanner.next_line() else { break };
        read_sigpin(&line, &mut part_type, dialect, diags);
    }

    if part_type.is_connector {
        // Connector decals carry no pin semantics
        for pin in part_type.gates.iter_mut().flat_map(|g| g.pins.iter_mut()) {
            pin.pin_type = 'S';
        }
    }

    Some(part_type)
}

fn parse_special_body(
    scanner: &mut Scanner<'_>,
    part_type: &mut PartTypeDef,
    keyword: SpecialKeyword,
    dialect: Dialect,
    diags: &mut Diagnostics,
) {
    let default_type = match keyword {
        SpecialKeyword::Gnd => 'G',
        SpecialKeyword::Pwr => 'P',
    };

    while !at_block_end(scanner) {
        let Some(line) = scanner.next_line() else { break };
        if is_sigpin_line(&line) {
            read_sigpin(&line, part_type, dialect, diags);
            continue;
        }
        let parts = line.tokens();
        let pin_type = parts
            .get(1)
            .and_then(|t| t.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or(default_type);
        part_type.special_variants.push(SpecialVariant {
            decal_name: parts[0].to_string(),
            pin_type,
        });
    }
}

fn read_sigpin(
    line: &ScannedLine<'_>,
    part_type: &mut PartTypeDef,
    dialect: Dialect,
    diags: &mut Diagnostics,
) {
    if !dialect.has_sigpins() {
        tracing::debug!(
            "Ignoring SIGPIN on line {} (not part of the modern dialect)",
            line.number
        );
        return;
    }
    let parts = line.tokens();
    if parts.len() < 3 {
        diags.at(
            DiagnosticKind::Desync,
            line.number,
            format!("Malformed SIGPIN in part type {}", part_type.name),
        );
        return;
    }
    part_type.sigpins.push(SigPin {
        pin_number: parts[1].to_string(),
        net_name: rest_after(line.text, 2).to_string(),
    });
}

/// Parse a `G:decal[:decal...] <swap_flag> <num_pins>` line and its pin tokens
fn parse_gate(
    scanner: &mut Scanner<'_>,
    line: &ScannedLine<'_>,
    part_name: &str,
    diags: &mut Diagnostics,
) -> Option<GateDef> {
    let parts = line.tokens();
    let decal_names: Vec<String> = parts[0][2..]
        .split(':')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let swap_flag: i32 = parts.get(1).and_then(|t| t.parse().ok()).unwrap_or(0);
    let Some(num_pins) = parts.get(2).and_then(|t| t.parse::<usize>().ok()) else {
        diags.at(
            DiagnosticKind::Desync,
            line.number,
            format!("Gate line in part type {} has no pin count", part_name),
        );
        return None;
    };

    let mut gate = GateDef {
        num_pins,
        num_decal_variants: decal_names.len(),
        swap_flag,
        decal_names,
        pins: Vec::new(),
    };

    while gate.pins.len() < num_pins {
        let more = matches!(
            scanner.peek(),
            Some(l) if !l.is_section()
                && !is_part_type_header(l)
                && !is_gate_line(l)
                && !is_sigpin_line(l)
        );
        if !more {
            break;
        }
        let Some(pin_line) = scanner.next_line() else { break };
        for token in pin_line.tokens() {
            match parse_pin_token(token) {
                Some(pin) => gate.pins.push(pin),
                None => diags.at(
                    DiagnosticKind::Desync,
                    pin_line.number,
                    format!("Unreadable pin token '{}' in part type {}", token, part_name),
                ),
            }
        }
    }

    if gate.pins.len() != num_pins {
        diags.at(
            DiagnosticKind::Desync,
            line.number,
            format!(
                "Gate of part type {} declares {} pin(s) but {} found",
                part_name,
                num_pins,
                gate.pins.len()
            ),
        );
        gate.pins.truncate(num_pins);
    }

    Some(gate)
}

/// `pin_id.swap_group.pin_type[.pin_name]`
pub fn parse_pin_token(token: &str) -> Option<PartTypePin> {
    let mut fields = token.splitn(4, '.');
    let pin_id = fields.next().filter(|s| !s.is_empty())?;
    let swap_group: i32 = fields.next()?.parse().ok()?;
    let pin_type = fields.next()?.chars().next()?.to_ascii_uppercase();
    let pin_name = fields
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(pin_id);
    Some(PartTypePin {
        pin_id: pin_id.to_string(),
        pin_name: pin_name.to_string(),
        pin_type,
        swap_group,
    })
}
