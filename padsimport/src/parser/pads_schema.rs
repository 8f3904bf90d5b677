use std::collections::{BTreeMap, BTreeSet, HashMap};
use serde::{Deserialize, Serialize};

use crate::units::Units;

/// A raw coordinate pair, in the file's declared units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Exporting product named in the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    PadsLogic,
    PadsPowerLogic,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::PadsLogic => "PADS-LOGIC",
            Product::PadsPowerLogic => "PADS-POWERLOGIC",
        }
    }
}

/// Grammar variant, resolved once from the header version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// V5.x and older: no decal font lines, SIGPIN bindings in part types
    Legacy,
    /// V9.x and newer: decal font lines present
    Modern,
}

impl Dialect {
    pub fn has_decal_fonts(&self) -> bool {
        matches!(self, Dialect::Modern)
    }

    pub fn has_sigpins(&self) -> bool {
        matches!(self, Dialect::Legacy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub product: Product,
    /// Version as written, e.g. `V9.0`
    pub version: String,
    pub major: u32,
    pub minor: u32,
    pub description: String,
}

impl Header {
    pub fn dialect(&self) -> Dialect {
        if self.major < 9 {
            Dialect::Legacy
        } else {
            Dialect::Modern
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetSize {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub units: Units,
    pub grid_x: f64,
    pub grid_y: f64,
    pub border_template: String,
    pub job_name: String,
    pub sheet_size: SheetSize,
    pub text_size: f64,
    pub line_width: f64,
    /// Title-block and user fields, keyed by their name as written
    pub fields: BTreeMap<String, String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            units: Units::Mils,
            grid_x: 100.0,
            grid_y: 100.0,
            border_template: String::new(),
            job_name: String::new(),
            sheet_size: SheetSize::default(),
            text_size: 100.0,
            line_width: 10.0,
            fields: BTreeMap::new(),
        }
    }
}

/// One graphic piece of a decal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphicPrimitive {
    /// Open sequence of points
    Polyline { line_width: f64, points: Vec<Point> },
    /// Closed axis-aligned box given by two corners
    Rectangle { line_width: f64, start: Point, end: Point },
    Circle { line_width: f64, center: Point, radius: f64 },
}

impl GraphicPrimitive {
    pub fn line_width(&self) -> f64 {
        match self {
            GraphicPrimitive::Polyline { line_width, .. }
            | GraphicPrimitive::Rectangle { line_width, .. }
            | GraphicPrimitive::Circle { line_width, .. } => *line_width,
        }
    }
}

/// Pin geometry from a decal. The number is a placeholder ordinal; the
/// electrical name comes from the part type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPin {
    pub number: String,
    pub position: Point,
    pub length: f64,
    /// Degrees; direction the pin points away from its body
    pub rotation: f64,
    /// PADS pin type code, `U` when the decal does not say
    pub pin_type: char,
}

/// A `CAEDECAL` symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub name: String,
    pub gate_count: u32,
    pub num_attrs: usize,
    pub num_pieces: usize,
    pub num_pins: usize,
    pub is_pin_decal: bool,
    pub font1: Option<String>,
    pub font2: Option<String>,
    pub attrs: Vec<String>,
    pub graphics: Vec<GraphicPrimitive>,
    pub pins: Vec<SymbolPin>,
    pub line: usize,
}

/// One pin of a part-type gate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartTypePin {
    pub pin_id: String,
    pub pin_name: String,
    pub pin_type: char,
    pub swap_group: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDef {
    pub num_pins: usize,
    pub num_decal_variants: usize,
    pub swap_flag: i32,
    pub decal_names: Vec<String>,
    pub pins: Vec<PartTypePin>,
}

/// Marker for the synthetic power/ground families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKeyword {
    Gnd,
    Pwr,
}

impl SpecialKeyword {
    pub fn from_token(token: &str) -> Option<SpecialKeyword> {
        match token.to_ascii_uppercase().as_str() {
            "GND" | "$GND_SYMS" => Some(SpecialKeyword::Gnd),
            "PWR" | "$PWR_SYMS" => Some(SpecialKeyword::Pwr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialVariant {
    pub decal_name: String,
    pub pin_type: char,
}

/// A pin hard-wired to a named net
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigPin {
    pub pin_number: String,
    pub net_name: String,
}

/// A `PARTTYPE` electrical definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartTypeDef {
    pub name: String,
    pub category: String,
    pub is_connector: bool,
    pub num_physical: u32,
    pub special_keyword: Option<SpecialKeyword>,
    pub gates: Vec<GateDef>,
    pub special_variants: Vec<SpecialVariant>,
    pub sigpins: Vec<SigPin>,
    pub line: usize,
}

impl PartTypeDef {
    pub fn is_special(&self) -> bool {
        self.special_keyword.is_some()
    }

    /// Gate for a 1-based gate number
    pub fn gate(&self, gate_number: u32) -> Option<&GateDef> {
        let idx = gate_number.checked_sub(1)? as usize;
        self.gates.get(idx)
    }

    /// True if any gate or binding declares this physical pin
    pub fn has_pin(&self, pin_id: &str) -> bool {
        self.gates
            .iter()
            .flat_map(|g| g.pins.iter())
            .any(|p| p.pin_id == pin_id)
            || self.sigpins.iter().any(|s| s.pin_number == pin_id)
    }

    pub fn special_variant(&self, decal_name: &str) -> Option<(usize, &SpecialVariant)> {
        self.special_variants
            .iter()
            .enumerate()
            .find(|(_, v)| v.decal_name.eq_ignore_ascii_case(decal_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartAttribute {
    pub name: String,
    pub value: String,
    pub visible: bool,
}

pub const MIRROR_HORIZONTAL: u8 = 0x1;
pub const MIRROR_VERTICAL: u8 = 0x2;

/// One `PARTS` instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartPlacement {
    /// Reference without the gate suffix, e.g. `U1`
    pub reference: String,
    /// Raw suffix after the dot, e.g. `A` in `U1.A`
    pub suffix: Option<String>,
    pub part_type: String,
    /// Explicit decal chosen with `PARTTYPE@DECAL`
    pub symbol_name: Option<String>,
    pub position: Point,
    pub rotation: f64,
    pub mirror_flags: u8,
    pub sheet_number: u32,
    pub gate_number: u32,
    pub attributes: Vec<PartAttribute>,
    pub line: usize,
}

impl PartPlacement {
    /// Composite `reference.suffix` key, unique per placed gate
    pub fn key(&self) -> String {
        match &self.suffix {
            Some(s) => format!("{}.{}", self.reference, s),
            None => self.reference.clone(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&PartAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn mirrored_horizontally(&self) -> bool {
        self.mirror_flags & MIRROR_HORIZONTAL != 0
    }

    pub fn mirrored_vertically(&self) -> bool {
        self.mirror_flags & MIRROR_VERTICAL != 0
    }
}

/// A `REF.PIN` connection token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub reference: String,
    pub pin_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireSegment {
    pub start: Point,
    pub end: Point,
    pub sheet_number: u32,
}

/// A named net from the `SIGNAL` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchSignal {
    pub name: String,
    pub connections: Vec<PinRef>,
    pub wires: Vec<WireSegment>,
    pub line: usize,
}

impl SchSignal {
    /// Sheets this net has wires on
    pub fn sheet_numbers(&self) -> BTreeSet<u32> {
        self.wires.iter().map(|w| w.sheet_number).collect()
    }

    pub fn is_on_sheet(&self, sheet: u32) -> bool {
        self.wires.iter().any(|w| w.sheet_number == sheet)
    }
}

/// Everything read from one PADS file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadsDesign {
    pub header: Header,
    pub parameters: Parameters,
    pub decals: Vec<SymbolDef>,
    pub part_types: Vec<PartTypeDef>,
    pub placements: Vec<PartPlacement>,
    pub signals: Vec<SchSignal>,
    #[serde(skip)]
    decal_index: HashMap<String, usize>,
    #[serde(skip)]
    part_type_index: HashMap<String, usize>,
}

impl PadsDesign {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            parameters: Parameters::default(),
            decals: Vec::new(),
            part_types: Vec::new(),
            placements: Vec::new(),
            signals: Vec::new(),
            decal_index: HashMap::new(),
            part_type_index: HashMap::new(),
        }
    }

    /// Add a decal. Returns `false` and keeps the earlier one if the name is taken.
    pub fn insert_decal(&mut self, decal: SymbolDef) -> bool {
        if self.decal_index.contains_key(&decal.name) {
            return false;
        }
        self.decal_index.insert(decal.name.clone(), self.decals.len());
        self.decals.push(decal);
        true
    }

    /// Add a part type. Returns `false` and keeps the earlier one if the name is taken.
    pub fn insert_part_type(&mut self, part_type: PartTypeDef) -> bool {
        if self.part_type_index.contains_key(&part_type.name) {
            return false;
        }
        self.part_type_index
            .insert(part_type.name.clone(), self.part_types.len());
        self.part_types.push(part_type);
        true
    }

    pub fn decal(&self, name: &str) -> Option<&SymbolDef> {
        self.decal_index.get(name).map(|&i| &self.decals[i])
    }

    pub fn part_type(&self, name: &str) -> Option<&PartTypeDef> {
        self.part_type_index.get(name).map(|&i| &self.part_types[i])
    }

    /// Rebuild the name indexes, e.g. after deserializing
    pub fn reindex(&mut self) {
        self.decal_index = self
            .decals
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        self.part_type_index = self
            .part_types
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(version: &str, major: u32, minor: u32) -> Header {
        Header {
            product: Product::PadsLogic,
            version: version.to_string(),
            major,
            minor,
            description: String::new(),
        }
    }

    fn decal(name: &str, pins: usize) -> SymbolDef {
        SymbolDef {
            name: name.to_string(),
            gate_count: 1,
            num_attrs: 0,
            num_pieces: 0,
            num_pins: pins,
            is_pin_decal: false,
            font1: None,
            font2: None,
            attrs: vec![],
            graphics: vec![],
            pins: vec![],
            line: 1,
        }
    }

    #[test]
    fn test_dialect_from_version() {
        assert_eq!(header("V5.2", 5, 2).dialect(), Dialect::Legacy);
        assert_eq!(header("V9.0", 9, 0).dialect(), Dialect::Modern);
        assert_eq!(header("V2007.0", 2007, 0).dialect(), Dialect::Modern);
    }

    #[test]
    fn test_first_decal_wins() {
        let mut design = PadsDesign::new(header("V9.0", 9, 0));
        assert!(design.insert_decal(decal("RES", 2)));
        assert!(!design.insert_decal(decal("RES", 3)));
        assert_eq!(design.decals.len(), 1);
        assert_eq!(design.decal("RES").map(|d| d.num_pins), Some(2));
    }

    #[test]
    fn test_placement_key() {
        let placement = PartPlacement {
            reference: "U1".to_string(),
            suffix: Some("B".to_string()),
            part_type: "7400".to_string(),
            symbol_name: None,
            position: Point::new(0.0, 0.0),
            rotation: 0.0,
            mirror_flags: MIRROR_HORIZONTAL | MIRROR_VERTICAL,
            sheet_number: 1,
            gate_number: 2,
            attributes: vec![],
            line: 1,
        };
        assert_eq!(placement.key(), "U1.B");
        assert!(placement.mirrored_horizontally());
        assert!(placement.mirrored_vertically());
    }

    #[test]
    fn test_signal_sheet_numbers() {
        let seg = |sheet| WireSegment {
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 0.0),
            sheet_number: sheet,
        };
        let signal = SchSignal {
            name: "CLK".to_string(),
            connections: vec![],
            wires: vec![seg(2), seg(1), seg(2)],
            line: 1,
        };
        let sheets: Vec<u32> = signal.sheet_numbers().into_iter().collect();
        assert_eq!(sheets, vec![1, 2]);
        assert!(signal.is_on_sheet(1));
        assert!(!signal.is_on_sheet(3));
    }
}
