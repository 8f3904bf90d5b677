//! `*CAEDECAL*` section parser
//!
//! Each decal is count-prefixed:
//!
//! ```text
//! DECAL <name> <gate_count> <num_attrs> <num_pieces> <num_pins> [PINDECAL]
//! "<font1>"                     (modern dialect only)
//! "<font2>"                     (modern dialect only)
//! ATTR <name>                   x num_attrs
//! RECTANGLE|CIRCLE|POLYLINE ... x num_pieces
//! PIN <number> <x> <y> <length> <rotation> [<type>]   x num_pins
//! ```
//!
//! A short block must not swallow the next block or section, so every record
//! is checked against the shape it is expected to have before it is consumed.

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::pads::parse_number;
use super::pads_schema::*;
use super::scanner::{ScannedLine, Scanner};

const PIECE_TAGS: [&str; 5] = ["RECTANGLE", "CIRCLE", "POLYLINE", "OPEN", "CLOSED"];

/// Parse decals until the next section marker
pub fn parse_decal_section(
    scanner: &mut Scanner<'_>,
    dialect: Dialect,
    design: &mut PadsDesign,
    diags: &mut Diagnostics,
) {
    while let Some(line) = scanner.next_data() {
        if !is_decal_header(&line) {
            skip_stray_lines(scanner, &line, diags);
            continue;
        }

        let Some(decal) = parse_decal(scanner, &line, dialect, diags) else {
            continue;
        };
        let name = decal.name.clone();
        let decal_line = decal.line;
        if !design.insert_decal(decal) {
            diags.at(
                DiagnosticKind::Duplicate,
                decal_line,
                format!("Decal {} already defined, keeping the first definition", name),
            );
        }
    }
}

fn is_decal_header(line: &ScannedLine<'_>) -> bool {
    line.first_token().eq_ignore_ascii_case("DECAL")
}

/// Skip data lines that belong to no decal, reporting them once
fn skip_stray_lines(scanner: &mut Scanner<'_>, first: &ScannedLine<'_>, diags: &mut Diagnostics) {
    let mut count = 1usize;
    while let Some(next) = scanner.peek() {
        if next.is_section() || is_decal_header(next) {
            break;
        }
        scanner.next_line();
        count += 1;
    }
    diags.at(
        DiagnosticKind::Desync,
        first.number,
        format!("Skipped {} line(s) not belonging to any decal", count),
    );
}

/// True if the next line ends the current decal (new decal or new section)
fn at_block_end(scanner: &mut Scanner<'_>) -> bool {
    match scanner.peek() {
        Some(line) => line.is_section() || is_decal_header(line),
        None => true,
    }
}

/// Parse one decal whose header line has already been consumed
pub fn parse_decal(
    scanner: &mut Scanner<'_>,
    header: &ScannedLine<'_>,
    dialect: Dialect,
    diags: &mut Diagnostics,
) -> Option<SymbolDef> {
    let parts = header.tokens();
    if parts.len() < 6 {
        diags.at(
            DiagnosticKind::Desync,
            header.number,
            format!("Malformed decal header '{}'", header.text),
        );
        return None;
    }

    let counts: Vec<Option<usize>> = parts[3..6].iter().map(|t| t.parse().ok()).collect();
    let (num_attrs, num_pieces, num_pins) = match counts.as_slice() {
        [Some(a), Some(p), Some(n)] => (*a, *p, *n),
        _ => {
            diags.at(
                DiagnosticKind::Desync,
                header.number,
                format!("Unreadable record counts in decal header '{}'", header.text),
            );
            return None;
        }
    };

    let mut decal = SymbolDef {
        name: parts[1].to_string(),
        gate_count: parts[2].parse().unwrap_or(1),
        num_attrs,
        num_pieces,
        num_pins,
        is_pin_decal: parts[6..].iter().any(|t| t.eq_ignore_ascii_case("PINDECAL")),
        font1: None,
        font2: None,
        attrs: Vec::new(),
        graphics: Vec::new(),
        pins: Vec::new(),
        line: header.number,
    };

    if dialect.has_decal_fonts() {
        decal.font1 = read_font(scanner, &decal.name, diags);
        decal.font2 = read_font(scanner, &decal.name, diags);
    }

    // Attribute placeholders
    while decal.attrs.len() < num_attrs {
        let Some(line) = next_tagged(scanner, &["ATTR"]) else { break };
        let name = line.text[line.first_token().len()..].trim();
        decal.attrs.push(name.to_string());
    }
    if !check_count(scanner, &decal.name, "attribute", decal.attrs.len(), num_attrs, diags) {
        return Some(decal);
    }

    // Graphic pieces
    let mut pieces_read = 0usize;
    while pieces_read < num_pieces {
        let Some(line) = next_tagged(scanner, &PIECE_TAGS) else { break };
        pieces_read += 1;
        match parse_piece(scanner, &line, diags) {
            Some(piece) => decal.graphics.push(piece),
            None => diags.at(
                DiagnosticKind::Desync,
                line.number,
                format!("Unreadable graphic record in decal {}", decal.name),
            ),
        }
    }
    if !check_count(scanner, &decal.name, "graphic", pieces_read, num_pieces, diags) {
        return Some(decal);
    }

    // Pins
    let mut pins_read = 0usize;
    while pins_read < num_pins {
        let Some(line) = next_tagged(scanner, &["PIN"]) else { break };
        pins_read += 1;
        match parse_pin(&line) {
            Some(pin) => decal.pins.push(pin),
            None => diags.at(
                DiagnosticKind::Desync,
                line.number,
                format!("Unreadable pin record in decal {}", decal.name),
            ),
        }
    }
    check_count(scanner, &decal.name, "pin", pins_read, num_pins, diags);

    Some(decal)
}

/// Consume the next line if its first token is one of `tags`
fn next_tagged<'a>(scanner: &mut Scanner<'a>, tags: &[&str]) -> Option<ScannedLine<'a>> {
    let line = scanner.peek()?;
    if line.is_section() {
        return None;
    }
    let first = line.first_token();
    if tags.iter().any(|t| first.eq_ignore_ascii_case(t)) {
        scanner.next_line()
    } else {
        None
    }
}

/// Report a short record list. Returns `false` when the block has ended.
fn check_count(
    scanner: &mut Scanner<'_>,
    decal: &str,
    what: &str,
    read: usize,
    declared: usize,
    diags: &mut Diagnostics,
) -> bool {
    if read >= declared {
        return true;
    }
    let line = scanner.line_number();
    diags.push(
        DiagnosticKind::Desync,
        line,
        format!(
            "Decal {} declares {} {} record(s) but only {} found",
            decal, declared, what, read
        ),
    );
    !at_block_end(scanner)
}

fn read_font(scanner: &mut Scanner<'_>, decal: &str, diags: &mut Diagnostics) -> Option<String> {
    let line = scanner.peek()?;
    if line.is_section() || !line.text.starts_with('"') {
        let number = line.number;
        diags.at(
            DiagnosticKind::Desync,
            number,
            format!("Decal {} is missing a font line", decal),
        );
        return None;
    }
    let line = scanner.next_line()?;
    Some(line.text.trim_matches('"').to_string())
}

fn parse_piece(
    scanner: &mut Scanner<'_>,
    line: &ScannedLine<'_>,
    diags: &mut Diagnostics,
) -> Option<GraphicPrimitive> {
    let parts = line.tokens();
    let nums: Vec<f64> = parts[1..]
        .iter()
        .map(|t| parse_number(t))
        .collect::<Option<_>>()?;
    let tag = parts[0].to_ascii_uppercase();

    match tag.as_str() {
        "RECTANGLE" if nums.len() >= 5 => Some(GraphicPrimitive::Rectangle {
            line_width: nums[0],
            start: Point::new(nums[1], nums[2]),
            end: Point::new(nums[3], nums[4]),
        }),
        "CIRCLE" if nums.len() >= 4 => Some(GraphicPrimitive::Circle {
            line_width: nums[0],
            center: Point::new(nums[1], nums[2]),
            radius: nums[3],
        }),
        "POLYLINE" | "OPEN" | "CLOSED" if nums.len() >= 2 => {
            let line_width = nums[0];
            // saturating cast; the count only bounds the read loop
            let count = nums[1].max(0.0) as usize;
            let mut points = Vec::new();
            while points.len() < count {
                let Some(point) = next_point(scanner) else { break };
                points.push(point);
            }
            if points.len() < count {
                diags.push(
                    DiagnosticKind::Desync,
                    scanner.line_number(),
                    format!(
                        "Polyline on line {} declares {} points but only {} found",
                        line.number,
                        count,
                        points.len()
                    ),
                );
            }
            if tag == "CLOSED" {
                if let Some(&first) = points.first() {
                    points.push(first);
                }
            }
            Some(GraphicPrimitive::Polyline { line_width, points })
        }
        _ => None,
    }
}

/// Consume an `x y` coordinate line
fn next_point(scanner: &mut Scanner<'_>) -> Option<Point> {
    let line = scanner.peek()?;
    if line.is_section() {
        return None;
    }
    let parts = line.tokens();
    if parts.len() != 2 {
        return None;
    }
    let x = parse_number(parts[0])?;
    let y = parse_number(parts[1])?;
    scanner.next_line();
    Some(Point::new(x, y))
}

fn parse_pin(line: &ScannedLine<'_>) -> Option<SymbolPin> {
    let parts = line.tokens();
    if parts.len() < 6 {
        return None;
    }
    Some(SymbolPin {
        number: parts[1].to_string(),
        position: Point::new(parse_number(parts[2])?, parse_number(parts[3])?),
        length: parse_number(parts[4])?,
        rotation: parse_number(parts[5])?,
        pin_type: parts
            .get(6)
            .and_then(|t| t.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U'),
    })
}
