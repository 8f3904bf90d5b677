//! Power and ground net names
//!
//! Classifies net and variant names as power nets, maps them to canonical
//! `power:` symbol ids and synthesizes the one-pin symbols drawn for them.

use regex::Regex;
use std::sync::LazyLock;

use crate::sch::{LibPin, LibShape, LibSymbol, PinOrientation, PinType, Position, ShapeKind};

const GROUND_NAMES: &[&str] = &[
    "GND", "AGND", "DGND", "PGND", "SGND", "GNDA", "GNDD", "GNDPWR", "PWRGND", "GNDREF", "VSS",
    "VSSA", "0V", "EARTH", "CHASSIS",
];

const SUPPLY_NAMES: &[&str] = &[
    "VCC", "VDD", "VEE", "VPP", "VBAT", "VBUS", "VIN", "VDDA", "VCCA", "AVCC", "AVDD", "DVCC",
    "DVDD", "V+", "V-",
];

/// Canonical ids for names with a dedicated power symbol
const POWER_IDS: &[(&str, &str)] = &[
    ("GND", "GND"),
    ("0V", "GND"),
    ("AGND", "GNDA"),
    ("GNDA", "GNDA"),
    ("DGND", "GNDD"),
    ("GNDD", "GNDD"),
    ("PGND", "GNDPWR"),
    ("PWRGND", "GNDPWR"),
    ("GNDPWR", "GNDPWR"),
    ("SGND", "GNDS"),
    ("GNDREF", "GNDREF"),
    ("EARTH", "Earth"),
    ("CHASSIS", "Chassis"),
    ("VSS", "VSS"),
    ("VSSA", "VSSA"),
    ("VCC", "VCC"),
    ("VDD", "VDD"),
    ("VDDA", "VDDA"),
    ("VEE", "VEE"),
    ("VPP", "VPP"),
    ("VBUS", "VBUS"),
    ("VBAT", "+BATT"),
];

const KNOWN_VOLTAGES: &[&str] = &[
    "+1V0", "+1V1", "+1V2", "+1V5", "+1V8", "+2V5", "+2V8", "+3V0", "+3V3", "+3.3V", "+5V",
    "+6V", "+8V", "+9V", "+10V", "+12V", "+15V", "+18V", "+24V", "+28V", "+36V", "+48V", "-5V",
    "-12V", "-15V", "-24V", "-48V",
];

static VOLTAGE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[+-]?[0-9]+(\.[0-9]+)?V[0-9]*$").unwrap());

/// Signed rail names such as `+V12`, `-V5` or `+VSYS`
static SIGNED_RAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[+-]V[0-9A-Z_.]*$").unwrap());

fn strip_sign(name: &str) -> &str {
    name.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(name)
}

fn is_negative(name: &str) -> bool {
    name.starts_with('-') || name.ends_with('-')
}

/// Case-insensitive check against the ground/supply tables, the
/// voltage-literal pattern (`+5V`, `3V3`, `-12V`) and signed `+V`/`-V` rails
pub fn is_power_symbol(name: &str) -> bool {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return false;
    }
    let bare = strip_sign(&upper);
    GROUND_NAMES.contains(&upper.as_str())
        || SUPPLY_NAMES.contains(&upper.as_str())
        || GROUND_NAMES.contains(&bare)
        || SUPPLY_NAMES.contains(&bare)
        || VOLTAGE_LITERAL.is_match(&upper)
        || SIGNED_RAIL.is_match(&upper)
}

/// Canonical power symbol id for a power net name, `None` for anything else.
///
/// Unlisted power names fall back to the generic `power:VCC`, or `power:VEE`
/// for negative ones.
pub fn power_symbol_id(name: &str) -> Option<String> {
    if !is_power_symbol(name) {
        return None;
    }
    let upper = name.trim().to_ascii_uppercase();

    if let Some((_, id)) = POWER_IDS.iter().find(|(n, _)| *n == upper) {
        return Some(format!("power:{}", id));
    }

    if VOLTAGE_LITERAL.is_match(&upper) {
        let signed = if upper.starts_with(['+', '-']) {
            upper.clone()
        } else {
            format!("+{}", upper)
        };
        if KNOWN_VOLTAGES.contains(&signed.as_str()) {
            return Some(format!("power:{}", signed));
        }
    }

    if is_negative(&upper) {
        Some("power:VEE".to_string())
    } else {
        Some("power:VCC".to_string())
    }
}

/// Drawing style for a synthesized power symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PowerStyle {
    /// Chevron ground
    Gnd,
    Chassis,
    /// Thick-bar ground
    Gndd,
    PwrBar,
    PwrTriangle,
    Vcc,
    Vee,
}

impl PowerStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerStyle::Gnd => "GND",
            PowerStyle::Chassis => "Chassis",
            PowerStyle::Gndd => "GNDD",
            PowerStyle::PwrBar => "PWR_BAR",
            PowerStyle::PwrTriangle => "PWR_TRIANGLE",
            PowerStyle::Vcc => "VCC",
            PowerStyle::Vee => "VEE",
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, PowerStyle::Gnd | PowerStyle::Chassis | PowerStyle::Gndd)
    }
}

/// Pick a style from a power family variant name. The pin type code only
/// decides when the name carries no recognizable hint.
pub fn power_style_from_variant(variant_name: &str, pin_type: char) -> PowerStyle {
    let upper = variant_name.trim().to_ascii_uppercase();
    let negative = is_negative(&upper);

    if upper.contains("CHASSIS") || upper.contains("FRAME") {
        PowerStyle::Chassis
    } else if upper.contains("RAIL") {
        PowerStyle::PwrBar
    } else if upper.contains("ARROW") {
        if negative {
            PowerStyle::Vee
        } else {
            PowerStyle::PwrTriangle
        }
    } else if upper.contains("BUBBLE") {
        if negative {
            PowerStyle::Vee
        } else {
            PowerStyle::Vcc
        }
    } else if upper.contains("DGND") || upper.contains("GNDD") {
        PowerStyle::Gndd
    } else if upper.contains("GND") || upper.contains("VSS") || upper.contains("EARTH") {
        PowerStyle::Gnd
    } else if pin_type.eq_ignore_ascii_case(&'G') {
        PowerStyle::Gnd
    } else if negative {
        PowerStyle::Vee
    } else {
        PowerStyle::Vcc
    }
}

fn polyline(points: &[(f64, f64)], width: f64) -> LibShape {
    LibShape::new(
        ShapeKind::Polyline {
            points: points.iter().map(|&(x, y)| Position::new(x, y)).collect(),
        },
        width,
    )
}

/// One-pin symbol for a power style. Ground styles hang below the pin,
/// supply styles sit above it.
pub fn build_power_symbol(style: PowerStyle) -> LibSymbol {
    let mut symbol = LibSymbol::new(format!("power:{}", style.as_str()));
    symbol.is_power = true;

    let dir = if style.is_ground() { -1.0 } else { 1.0 };
    symbol.add_shape(polyline(&[(0.0, 0.0), (0.0, 50.0 * dir)], 6.0));

    match style {
        PowerStyle::Gnd => {
            symbol.add_shape(polyline(
                &[(-50.0, -50.0), (50.0, -50.0), (0.0, -100.0), (-50.0, -50.0)],
                6.0,
            ));
        }
        PowerStyle::Chassis => {
            symbol.add_shape(polyline(&[(-50.0, -50.0), (50.0, -50.0)], 6.0));
            for x in [-50.0, 0.0, 50.0] {
                symbol.add_shape(polyline(&[(x, -50.0), (x - 25.0, -90.0)], 6.0));
            }
        }
        PowerStyle::Gndd => {
            symbol.add_shape(
                LibShape::new(
                    ShapeKind::Rectangle {
                        start: Position::new(-50.0, -50.0),
                        end: Position::new(50.0, -65.0),
                    },
                    6.0,
                )
                .filled(),
            );
        }
        PowerStyle::PwrBar => {
            symbol.add_shape(polyline(&[(-50.0, 50.0), (50.0, 50.0)], 20.0));
        }
        PowerStyle::PwrTriangle => {
            symbol.add_shape(
                polyline(&[(-30.0, 50.0), (30.0, 50.0), (0.0, 100.0), (-30.0, 50.0)], 6.0).filled(),
            );
        }
        PowerStyle::Vcc => {
            symbol.add_shape(LibShape::new(
                ShapeKind::Circle {
                    center: Position::new(0.0, 75.0),
                    radius: 25.0,
                },
                6.0,
            ));
        }
        PowerStyle::Vee => {
            symbol.add_shape(polyline(&[(-30.0, 50.0), (30.0, 50.0)], 6.0));
            symbol.add_shape(polyline(&[(-30.0, 80.0), (0.0, 50.0), (30.0, 80.0)], 6.0));
        }
    }

    let mut pin = LibPin::new("1", Position::default());
    pin.pin_type = PinType::PowerIn;
    pin.orientation = if style.is_ground() {
        PinOrientation::Down
    } else {
        PinOrientation::Up
    };
    symbol.add_pin(pin);
    symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_names() {
        for name in [
            "GND", "gnd", "AGND", "DGND", "PGND", "VSS", "0V", "EARTH", "CHASSIS", "VCC", "VDD",
            "VEE", "VPP", "VBAT", "VBUS", "V+", "V-", "+5V", "+3V3", "+12V", "-12V", "+1V8",
            "+24V", "+V12", "-V5",
        ] {
            assert!(is_power_symbol(name), "{} should be a power name", name);
        }
    }

    #[test]
    fn test_non_power_names() {
        for name in ["R1", "U1", "NET1", "DATA", "CLK", "RESET", "", "V", "5VOLT"] {
            assert!(!is_power_symbol(name), "{} should not be a power name", name);
        }
    }

    #[test]
    fn test_power_symbol_ids() {
        assert_eq!(power_symbol_id("gnd").as_deref(), Some("power:GND"));
        assert_eq!(power_symbol_id("DGND").as_deref(), Some("power:GNDD"));
        assert_eq!(power_symbol_id("PWRGND").as_deref(), Some("power:GNDPWR"));
        assert_eq!(power_symbol_id("+5V").as_deref(), Some("power:+5V"));
        assert_eq!(power_symbol_id("3V3").as_deref(), Some("power:+3V3"));
        assert_eq!(power_symbol_id("-12V").as_deref(), Some("power:-12V"));
        // generic fallbacks
        assert_eq!(power_symbol_id("+7V").as_deref(), Some("power:VCC"));
        assert_eq!(power_symbol_id("-7V").as_deref(), Some("power:VEE"));
        assert_eq!(power_symbol_id("V-").as_deref(), Some("power:VEE"));
        assert_eq!(power_symbol_id("+V12").as_deref(), Some("power:VCC"));
        assert_eq!(power_symbol_id("-V5").as_deref(), Some("power:VEE"));
        assert_eq!(power_symbol_id("+vsys").as_deref(), Some("power:VCC"));
        assert_eq!(power_symbol_id("VIN").as_deref(), Some("power:VCC"));
        assert_eq!(power_symbol_id("NET1"), None);
    }

    #[test]
    fn test_power_style_from_variant() {
        assert_eq!(power_style_from_variant("GND", 'G'), PowerStyle::Gnd);
        assert_eq!(power_style_from_variant("DGND", 'G'), PowerStyle::Gndd);
        assert_eq!(power_style_from_variant("PWRGND", 'G'), PowerStyle::Gnd);
        assert_eq!(power_style_from_variant("CHASSIS", 'G'), PowerStyle::Chassis);
        assert_eq!(power_style_from_variant("+RAIL", 'P'), PowerStyle::PwrBar);
        assert_eq!(power_style_from_variant("-RAIL", 'P'), PowerStyle::PwrBar);
        assert_eq!(power_style_from_variant("+ARROW", 'P'), PowerStyle::PwrTriangle);
        assert_eq!(power_style_from_variant("-ARROW", 'P'), PowerStyle::Vee);
        assert_eq!(power_style_from_variant("+BUBBLE", 'P'), PowerStyle::Vcc);
        assert_eq!(power_style_from_variant("-BUBBLE", 'P'), PowerStyle::Vee);
        // no hint in the name
        assert_eq!(power_style_from_variant("SYM1", 'G'), PowerStyle::Gnd);
        assert_eq!(power_style_from_variant("+5V", 'P'), PowerStyle::Vcc);
        assert_eq!(power_style_from_variant("-5V", 'P'), PowerStyle::Vee);
    }

    #[test]
    fn test_build_power_symbol_pin_direction() {
        let ground = build_power_symbol(PowerStyle::Gndd);
        assert!(ground.is_power);
        assert_eq!(ground.pins.len(), 1);
        assert_eq!(ground.pins[0].orientation, PinOrientation::Down);
        assert_eq!(ground.pins[0].pin_type, PinType::PowerIn);

        let supply = build_power_symbol(PowerStyle::PwrBar);
        assert_eq!(supply.pins.len(), 1);
        assert_eq!(supply.pins[0].orientation, PinOrientation::Up);
        assert_eq!(supply.shapes.len(), 2);
    }
}
