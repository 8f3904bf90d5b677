//! Coordinate units
//!
//! PADS files declare their units once in the parameter block. Raw numbers are
//! kept as read and converted to mils (the output model's unit) at build time.

use serde::{Deserialize, Serialize};

const MILS_PER_MM: f64 = 1000.0 / 25.4;

/// Unit of raw coordinate literals in a PADS file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    /// Thousandths of an inch
    #[default]
    Mils,
    /// Millimetres
    Metric,
}

impl Units {
    /// Parse the `UNITS` parameter value (`0`/`MILS` or `1`/`METRIC`).
    pub fn from_token(token: &str) -> Option<Units> {
        match token.to_ascii_uppercase().as_str() {
            "0" | "MIL" | "MILS" => Some(Units::Mils),
            "1" | "MM" | "METRIC" => Some(Units::Metric),
            _ => None,
        }
    }

    /// Convert a raw value in these units to mils.
    pub fn to_mils(self, value: f64) -> f64 {
        match self {
            Units::Mils => value,
            Units::Metric => value * MILS_PER_MM,
        }
    }

    /// Convert a raw value in these units to millimetres.
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Mils => value / MILS_PER_MM,
            Units::Metric => value,
        }
    }

    /// Convert a value in mils back into these units.
    pub fn from_mils(self, mils: f64) -> f64 {
        match self {
            Units::Mils => mils,
            Units::Metric => mils / MILS_PER_MM,
        }
    }
}
