//! Symbol Builder
//!
//! Turns CAEDECAL geometry into library symbols. Decal pins are joined to a
//! gate's pin table by position: decal pin `i` takes the name, number and type
//! of gate pin `i`. Built symbols are cached per builder, so the same request
//! always returns the same `Rc`.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::{GraphicPrimitive, PartTypeDef, PartTypePin, Point, SymbolDef};
use crate::sch::{LibPin, LibShape, LibSymbol, PinOrientation, PinType, Position, ShapeKind};
use crate::units::Units;

use super::power::{build_power_symbol, power_symbol_id, PowerStyle};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SymbolVariant {
    /// Decal pins with their own numbering
    Raw,
    /// Decal pins renamed from a gate pin table
    Resolved(Vec<PartTypePin>),
    /// Single-pin connector symbol for one physical pin
    ConnectorPin(String),
    /// Synthesized power symbol bound to a net
    Power(PowerStyle, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    decal: String,
    variant: SymbolVariant,
}

/// Builds library symbols and owns the symbol cache for one import
pub struct SymbolBuilder {
    units: Units,
    cache: HashMap<SymbolKey, Rc<LibSymbol>>,
    /// Library order: first request first
    built: Vec<Rc<LibSymbol>>,
    names: HashSet<String>,
}

impl SymbolBuilder {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            cache: HashMap::new(),
            built: Vec::new(),
            names: HashSet::new(),
        }
    }

    fn point(&self, p: Point) -> Position {
        Position::new(self.units.to_mils(p.x), self.units.to_mils(p.y))
    }

    fn shape(&self, primitive: &GraphicPrimitive) -> LibShape {
        let width = self.units.to_mils(primitive.line_width());
        let kind = match primitive {
            GraphicPrimitive::Polyline { points, .. } => ShapeKind::Polyline {
                points: points.iter().map(|p| self.point(*p)).collect(),
            },
            GraphicPrimitive::Rectangle { start, end, .. } => ShapeKind::Rectangle {
                start: self.point(*start),
                end: self.point(*end),
            },
            GraphicPrimitive::Circle { center, radius, .. } => ShapeKind::Circle {
                center: self.point(*center),
                radius: self.units.to_mils(*radius),
            },
        };
        LibShape::new(kind, width)
    }

    /// Render a decal 1:1 with its own raw pin numbering. Not cached.
    pub fn build_symbol(&self, decal: &SymbolDef) -> LibSymbol {
        let mut symbol = LibSymbol::new(decal.name.clone());
        for primitive in &decal.graphics {
            symbol.add_shape(self.shape(primitive));
        }
        for pin in &decal.pins {
            let mut lib_pin = LibPin::new(pin.number.clone(), self.point(pin.position));
            lib_pin.length = self.units.to_mils(pin.length);
            lib_pin.orientation = PinOrientation::from_rotation(pin.rotation);
            lib_pin.pin_type = PinType::from_code(pin.pin_type);
            symbol.add_pin(lib_pin);
        }
        symbol
    }

    /// Decal geometry merged with a gate's pin table, cached on both.
    ///
    /// A length mismatch is reported as `MAPPING_ERROR`; decal pins past the
    /// end of the gate table fall back to their ordinal as number and name.
    pub fn get_or_create_symbol(
        &mut self,
        decal: &SymbolDef,
        gate_pins: &[PartTypePin],
        diags: &mut Diagnostics,
    ) -> Rc<LibSymbol> {
        let variant = if gate_pins.is_empty() {
            SymbolVariant::Raw
        } else {
            SymbolVariant::Resolved(gate_pins.to_vec())
        };
        let key = SymbolKey {
            decal: decal.name.clone(),
            variant,
        };
        if let Some(symbol) = self.cache.get(&key) {
            return Rc::clone(symbol);
        }

        let mut symbol = self.build_symbol(decal);
        if !gate_pins.is_empty() {
            if decal.pins.len() != gate_pins.len() {
                diags.push(
                    DiagnosticKind::Mapping,
                    Some(decal.line),
                    format!(
                        "Decal {} has {} pins but the gate lists {}",
                        decal.name,
                        decal.pins.len(),
                        gate_pins.len()
                    ),
                );
            }
            for (i, pin) in symbol.pins.iter_mut().enumerate() {
                match gate_pins.get(i) {
                    Some(gate_pin) => {
                        pin.number = gate_pin.pin_id.clone();
                        pin.name = gate_pin.pin_name.clone();
                        pin.pin_type = PinType::from_code(gate_pin.pin_type);
                        pin.swap_group = gate_pin.swap_group;
                    }
                    None => {
                        pin.number = (i + 1).to_string();
                        pin.name = pin.number.clone();
                    }
                }
            }
        }

        symbol.name = self.unique_name(&decal.name);
        self.insert(key, symbol)
    }

    /// One single-pin symbol per physical connector pin, cached by
    /// `(decal, pin_number)`
    pub fn get_or_create_connector_pin_symbol(
        &mut self,
        part_type: &PartTypeDef,
        decal: &SymbolDef,
        pin_number: &str,
    ) -> Rc<LibSymbol> {
        let key = SymbolKey {
            decal: decal.name.clone(),
            variant: SymbolVariant::ConnectorPin(pin_number.to_string()),
        };
        if let Some(symbol) = self.cache.get(&key) {
            return Rc::clone(symbol);
        }

        let mut symbol = self.build_symbol(decal);
        symbol.pins.truncate(1);
        if let Some(first) = symbol.pins.first().map(|p| p.number.clone()) {
            symbol.renumber_pin(&first, pin_number);
        }
        let gate_pin = part_type
            .gates
            .iter()
            .flat_map(|g| g.pins.iter())
            .find(|p| p.pin_id == pin_number);
        if let (Some(pin), Some(gate_pin)) = (symbol.pins.first_mut(), gate_pin) {
            pin.name = gate_pin.pin_name.clone();
            pin.pin_type = PinType::from_code(gate_pin.pin_type);
        }

        symbol.name = self.unique_name(&format!("{}_{}", decal.name, pin_number));
        self.insert(key, symbol)
    }

    /// Synthesized power symbol for one variant of a power family, with its
    /// pin bound to `net_name`
    pub fn get_or_create_power_symbol(
        &mut self,
        variant_decal: &str,
        style: PowerStyle,
        net_name: &str,
    ) -> Rc<LibSymbol> {
        let key = SymbolKey {
            decal: variant_decal.to_string(),
            variant: SymbolVariant::Power(style, net_name.to_string()),
        };
        if let Some(symbol) = self.cache.get(&key) {
            return Rc::clone(symbol);
        }

        let mut symbol = build_power_symbol(style);
        let base = power_symbol_id(net_name)
            .or_else(|| power_symbol_id(variant_decal))
            .unwrap_or_else(|| format!("power:{}", variant_decal));
        symbol.name = self.unique_name(&base);
        symbol.power_net = Some(net_name.to_string());
        self.insert(key, symbol)
    }

    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.names.contains(&name) {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        self.names.insert(name.clone());
        name
    }

    fn insert(&mut self, key: SymbolKey, symbol: LibSymbol) -> Rc<LibSymbol> {
        let symbol = Rc::new(symbol);
        self.cache.insert(key, Rc::clone(&symbol));
        self.built.push(Rc::clone(&symbol));
        symbol
    }

    pub fn len(&self) -> usize {
        self.built.len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }

    /// Owned copies of every built symbol, in build order
    pub fn library(&self) -> Vec<LibSymbol> {
        self.built.iter().map(|s| (**s).clone()).collect()
    }
}
