//! `*SIGNAL*` section parser
//!
//! ```text
//! SIGNAL VCC
//! R1.1 U1.14
//! WIRE 1 100 200 300 200 300 400
//! ```

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::pads::{parse_number, rest_after};
use super::pads_schema::*;
use super::scanner::{ScannedLine, Scanner};

/// Parse net records until the next section marker.
///
/// A net name seen twice is merged into the first record: PADS splits long
/// nets over several `SIGNAL` records.
pub fn parse_signal_section(
    scanner: &mut Scanner<'_>,
    design: &mut PadsDesign,
    diags: &mut Diagnostics,
) {
    let mut current: Option<usize> = None;

    while let Some(line) = scanner.next_data() {
        if is_signal_header(&line) {
            current = open_signal(&line, design, diags);
            continue;
        }

        let Some(index) = current else {
            diags.at(
                DiagnosticKind::Desync,
                line.number,
                format!("Net data before any SIGNAL record: '{}'", line.text),
            );
            continue;
        };
        let signal = &mut design.signals[index];

        if line.first_token().eq_ignore_ascii_case("WIRE") {
            match parse_wire_line(&line) {
                Some(segments) => signal.wires.extend(segments),
                None => diags.at(
                    DiagnosticKind::Desync,
                    line.number,
                    format!("Malformed WIRE record in net {}: '{}'", signal.name, line.text),
                ),
            }
            continue;
        }

        for token in line.tokens() {
            match parse_pin_ref(token) {
                Some(pin) => signal.connections.push(pin),
                None => diags.at(
                    DiagnosticKind::Desync,
                    line.number,
                    format!("Bad connection token '{}' in net {}", token, signal.name),
                ),
            }
        }
    }
}

fn is_signal_header(line: &ScannedLine<'_>) -> bool {
    line.first_token().eq_ignore_ascii_case("SIGNAL")
}

/// Start (or reopen) the net named on a `SIGNAL` line and return its index
fn open_signal(
    line: &ScannedLine<'_>,
    design: &mut PadsDesign,
    diags: &mut Diagnostics,
) -> Option<usize> {
    let name = rest_after(line.text, 1);
    if name.is_empty() {
        diags.at(DiagnosticKind::Desync, line.number, "SIGNAL record without a net name");
        return None;
    }

    if let Some(index) = design.signals.iter().position(|s| s.name == name) {
        tracing::debug!("Net {} continued on line {}", name, line.number);
        return Some(index);
    }

    design.signals.push(SchSignal {
        name: name.to_string(),
        connections: Vec::new(),
        wires: Vec::new(),
        line: line.number,
    });
    Some(design.signals.len() - 1)
}

/// `REF.PIN`, split at the last dot so references may themselves hold dots
pub fn parse_pin_ref(token: &str) -> Option<PinRef> {
    let (reference, pin_number) = token.rsplit_once('.')?;
    if reference.is_empty() || pin_number.is_empty() {
        return None;
    }
    Some(PinRef {
        reference: reference.to_string(),
        pin_number: pin_number.to_string(),
    })
}

/// `WIRE <sheet> x1 y1 x2 y2 [x3 y3 ...]` as consecutive segments
fn parse_wire_line(line: &ScannedLine<'_>) -> Option<Vec<WireSegment>> {
    let parts = line.tokens();
    if parts.len() < 6 {
        return None;
    }
    let sheet = parse_number(parts[1])?;
    if sheet < 1.0 {
        return None;
    }
    let coords: Vec<f64> = parts[2..]
        .iter()
        .map(|t| parse_number(t))
        .collect::<Option<_>>()?;
    if coords.len() % 2 != 0 {
        return None;
    }

    let points: Vec<Point> = coords.chunks(2).map(|c| Point::new(c[0], c[1])).collect();
    Some(
        points
            .windows(2)
            .map(|pair| WireSegment {
                start: pair[0],
                end: pair[1],
                sheet_number: sheet as u32,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PadsParser;

    fn parse(body: &str) -> crate::parser::ParseOutcome {
        PadsParser::parse_str(&format!("*PADS-LOGIC-V9.0*\n*SIGNAL*\n{}", body)).unwrap()
    }

    #[test]
    fn test_parse_pin_ref() {
        let pin = parse_pin_ref("U1.14").unwrap();
        assert_eq!(pin.reference, "U1");
        assert_eq!(pin.pin_number, "14");

        let dotted = parse_pin_ref("J1.A.3").unwrap();
        assert_eq!(dotted.reference, "J1.A");
        assert_eq!(dotted.pin_number, "3");

        assert!(parse_pin_ref("U1").is_none());
        assert!(parse_pin_ref(".1").is_none());
        assert!(parse_pin_ref("U1.").is_none());
    }

    #[test]
    fn test_vcc_net_with_two_wires() {
        let outcome = parse(
            "SIGNAL VCC\n\
R1.1 U1.14\n\
WIRE 1 100 200 300 200\n\
WIRE 1 300 200 300 400\n",
        );
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        let signal = &outcome.design.signals[0];
        assert_eq!(signal.name, "VCC");
        assert_eq!(signal.connections.len(), 2);
        assert_eq!(signal.wires.len(), 2);
        assert_eq!(signal.wires[1].end, Point::new(300.0, 400.0));
        assert_eq!(signal.sheet_numbers().len(), 1);
    }

    #[test]
    fn test_polyline_wire_expands_to_segments() {
        let outcome = parse("SIGNAL CLK\nWIRE 2 0 0 100 0 100 100 200 100\n");
        let signal = &outcome.design.signals[0];
        assert_eq!(signal.wires.len(), 3);
        assert!(signal.wires.iter().all(|w| w.sheet_number == 2));
        assert_eq!(signal.wires[0].start, Point::new(0.0, 0.0));
        assert_eq!(signal.wires[2].end, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_net_names_keep_spaces_and_brackets() {
        let outcome = parse("SIGNAL DATA[7:0]\nSIGNAL /RESET N\nU1.3\n");
        assert_eq!(outcome.design.signals[0].name, "DATA[7:0]");
        assert_eq!(outcome.design.signals[1].name, "/RESET N");
        assert_eq!(outcome.design.signals[1].connections.len(), 1);
    }

    #[test]
    fn test_repeated_net_is_merged() {
        let outcome = parse(
            "SIGNAL NET1\nU1.1\nWIRE 1 0 0 10 0\n\
SIGNAL NET2\nU2.1\n\
SIGNAL NET1\nU3.2\nWIRE 2 0 0 10 0\n",
        );
        let signals = &outcome.design.signals;
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].connections.len(), 2);
        assert_eq!(signals[0].sheet_numbers().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_nameless_signal_is_desync() {
        let outcome = parse("SIGNAL\nU1.1\nSIGNAL N2\nU2.1\n");
        assert_eq!(outcome.design.signals.len(), 1);
        assert_eq!(outcome.design.signals[0].name, "N2");
        // the nameless record and its orphan data line
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Desync), 2);
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Format), 0);
    }

    #[test]
    fn test_bad_records_are_reported() {
        let outcome = parse(
            "U9.1\n\
SIGNAL NET1\n\
U1.1 BOGUS\n\
WIRE 1 0 0 10\n\
WIRE 1 0 0 x 5\n",
        );
        let signal = &outcome.design.signals[0];
        assert_eq!(signal.connections.len(), 1);
        assert!(signal.wires.is_empty());
        // recoverable record errors never use the fatal header kind
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Desync), 4);
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::Format), 0);
    }
}
