//! Schematic Builder
//!
//! Single forward pass over a parsed design. Sheets are inferred from the
//! sheet numbers on placements and wires; a design on one sheet is emitted
//! flat into the root screen, anything larger becomes one child sheet per
//! sheet number. Nets that span sheets are tied together with hierarchical
//! labels and sheet pins, power nets with global labels.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::ImportOptions;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::{
    PadsDesign, Parameters, PartAttribute, PartPlacement, PartTypeDef, Point, SchSignal,
    SpecialVariant, WireSegment,
};
use crate::sch::*;
use crate::units::Units;

use super::power::{is_power_symbol, power_style_from_variant};
use super::symbol::SymbolBuilder;

const SHEET_MARGIN: f64 = 500.0;
const SHEET_GAP: f64 = 500.0;
const SHEET_PIN_PITCH: f64 = 100.0;
const CONNECTOR_PIN_PITCH: f64 = 100.0;

/// Attribute names that feed the standard fields instead of custom ones
const RESERVED_FIELDS: &[&str] = &[
    "Ref.Des.",
    "Reference",
    "Part Type",
    "Value",
    "PCB DECAL",
    "Footprint",
];

static BUS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\[<]+(\[[0-9]+(:|\.\.)[0-9]+\]|<[0-9]+(:|\.\.)[0-9]+>)$").unwrap()
});

/// `DATA[7:0]`, `BUS[0..7]` and `ADDR<15:0>` are buses; `DATA0` is not
pub fn is_bus_signal(name: &str) -> bool {
    BUS_NAME.is_match(name)
}

/// Power nets are always global; other nets only when they span sheets
pub fn is_global_signal(name: &str, sheets: &BTreeSet<u32>) -> bool {
    is_power_symbol(name) || sheets.len() > 1
}

/// Grid cell of child sheet `index` (0-based) among `total`, filled left to
/// right then downward, `ceil(sqrt(total))` columns wide
pub fn calculate_sheet_position(index: usize, total: usize, sheet_size: (f64, f64)) -> Position {
    let cols = ((total.max(1) as f64).sqrt().ceil() as usize).max(1);
    let (col, row) = (index % cols, index / cols);
    Position::new(
        SHEET_MARGIN + col as f64 * (sheet_size.0 + SHEET_GAP),
        SHEET_MARGIN + row as f64 * (sheet_size.1 + SHEET_GAP),
    )
}

fn file_stem(source_filename: &str) -> &str {
    Path::new(source_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("untitled")
}

pub fn root_filename(source_filename: &str) -> String {
    format!("{}.kicad_sch", file_stem(source_filename))
}

/// `board.txt`, sheet 2 -> `board_sheet2.kicad_sch`
pub fn sheet_filename(source_filename: &str, sheet_number: u32) -> String {
    format!("{}_sheet{}.kicad_sch", file_stem(source_filename), sheet_number)
}

/// Add a child sheet to `parent` at its grid position. Without a parent this
/// does nothing and returns `None`.
pub fn create_hierarchical_sheet<'s>(
    index: usize,
    total: usize,
    sheet_number: u32,
    parent: Option<&'s mut Screen>,
    source_filename: &str,
    sheet_size: (f64, f64),
) -> Option<&'s mut Sheet> {
    let parent = parent?;
    parent.add_sheet(Sheet::new(
        format!("Sheet {}", sheet_number),
        sheet_filename(source_filename, sheet_number),
        sheet_number,
        calculate_sheet_position(index, total, sheet_size),
        sheet_size,
    ));
    parent.sheets.last_mut()
}

/// Add a pin for `net_name` on the left edge of `sheet`
pub fn create_sheet_pin<'s>(
    sheet: Option<&'s mut Sheet>,
    net_name: &str,
    index: usize,
) -> Option<&'s SheetPin> {
    let sheet = sheet?;
    let position = sheet
        .position
        .offset(0.0, SHEET_PIN_PITCH * (index as f64 + 1.0));
    sheet
        .pins
        .push(SheetPin::new(net_name, SheetSide::Left, position));
    sheet.pins.last()
}

pub fn create_net_label(net_name: &str, position: Position) -> Label {
    Label::new(net_name, position, LabelType::Global)
}

/// Add a hierarchical label to `screen` and return it
pub fn create_hier_label<'s>(
    net_name: &str,
    position: Position,
    screen: &'s mut Screen,
) -> &'s Label {
    screen.add_label(Label::new(net_name, position, LabelType::Hierarchical));
    &screen.labels[screen.labels.len() - 1]
}

fn first_attribute<'p>(placement: &'p PartPlacement, names: &[&str]) -> Option<&'p PartAttribute> {
    names
        .iter()
        .filter_map(|name| placement.attribute(name))
        .find(|attr| !attr.value.is_empty())
}

/// Fill the reference, value and footprint fields from a placement
pub fn apply_part_attributes(symbol: Option<&mut SchSymbol>, placement: &PartPlacement) {
    let Some(symbol) = symbol else { return };

    symbol.reference.text = placement.reference.clone();
    if let Some(attr) = placement.attribute("Ref.Des.") {
        symbol.reference.visible = attr.visible;
    }

    match first_attribute(placement, &["Value", "Part Type"]) {
        Some(attr) => {
            symbol.value.text = attr.value.clone();
            symbol.value.visible = attr.visible;
        }
        None => symbol.value.text = placement.part_type.clone(),
    }

    if let Some(attr) = first_attribute(placement, &["PCB DECAL", "Footprint"]) {
        symbol.footprint.text = attr.value.clone();
        symbol.footprint.visible = attr.visible;
    }
}

/// Copy every non-empty, non-standard attribute into a custom field.
/// Returns the number of fields created.
pub fn create_custom_fields(symbol: Option<&mut SchSymbol>, placement: &PartPlacement) -> usize {
    let Some(symbol) = symbol else { return 0 };
    let mut created = 0;
    for attr in &placement.attributes {
        let reserved = RESERVED_FIELDS
            .iter()
            .any(|r| r.eq_ignore_ascii_case(&attr.name));
        if reserved || attr.value.is_empty() {
            continue;
        }
        let mut field = Field::new(attr.name.clone(), attr.value.clone());
        field.visible = attr.visible;
        symbol.add_field(field);
        created += 1;
    }
    created
}

/// Title block from the conventional parameter fields; the job name stands in
/// for a missing title
pub fn create_title_block(screen: Option<&mut Screen>, params: &Parameters) {
    let Some(screen) = screen else { return };
    let field = |key: &str| {
        params
            .fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let mut title = field("Title");
    if title.is_empty() {
        title = params.job_name.clone();
    }
    screen.title_block = TitleBlock {
        title,
        date: field("DATE"),
        revision: field("Revision"),
        company: field("Company Name"),
    };
}

fn power_net_for(part_type: &PartTypeDef, index: usize, variant: &SpecialVariant) -> String {
    part_type
        .sigpins
        .get(index)
        .map(|s| s.net_name.clone())
        .unwrap_or_else(|| variant.decal_name.clone())
}

fn pin_exists(part_type: &PartTypeDef, pin_number: &str) -> bool {
    part_type.is_special()
        || part_type.has_pin(pin_number)
        || part_type.gates.iter().all(|g| g.pins.is_empty())
}

/// Built schematic plus the problems found while building it
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub schematic: Schematic,
    pub diagnostics: Diagnostics,
}

/// Builds the destination schematic for one parsed design
pub struct SchematicBuilder<'a> {
    design: &'a PadsDesign,
    options: ImportOptions,
    source_filename: String,
    units: Units,
    symbols: SymbolBuilder,
    diags: Diagnostics,
    /// Part type of every placed reference
    placed: HashMap<String, &'a PartTypeDef>,
    /// Connections that exist without a SIGNAL record
    implicit: Vec<(String, Connection)>,
}

impl<'a> SchematicBuilder<'a> {
    pub fn new(design: &'a PadsDesign, source_filename: &str, options: ImportOptions) -> Self {
        let units = design.parameters.units;
        Self {
            design,
            options,
            source_filename: source_filename.to_string(),
            units,
            symbols: SymbolBuilder::new(units),
            diags: Diagnostics::new(),
            placed: HashMap::new(),
            implicit: Vec::new(),
        }
    }

    pub fn default_sheet_size(&self) -> (f64, f64) {
        self.options.sheet_size
    }

    /// Sorted union of placement and wire sheet numbers; sheet 1 when empty
    pub fn sheet_numbers(&self) -> Vec<u32> {
        let mut sheets: BTreeSet<u32> = self
            .design
            .placements
            .iter()
            .map(|p| p.sheet_number)
            .collect();
        for signal in &self.design.signals {
            sheets.extend(signal.wires.iter().map(|w| w.sheet_number));
        }
        if sheets.is_empty() {
            sheets.insert(1);
        }
        sheets.into_iter().collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheet_numbers().len()
    }

    pub fn parts_on_sheet(&self, sheet: u32) -> Vec<&'a PartPlacement> {
        let design = self.design;
        design
            .placements
            .iter()
            .filter(|p| p.sheet_number == sheet)
            .collect()
    }

    pub fn signals_on_sheet(&self, sheet: u32) -> Vec<&'a SchSignal> {
        let design = self.design;
        design.signals.iter().filter(|s| s.is_on_sheet(sheet)).collect()
    }

    fn position(&self, point: Point) -> Position {
        Position::new(self.units.to_mils(point.x), self.units.to_mils(point.y))
    }

    pub fn create_wire(&self, segment: &WireSegment) -> SchLine {
        SchLine::new(self.position(segment.start), self.position(segment.end), Layer::Wire)
    }

    pub fn create_bus_wire(&self, segment: &WireSegment) -> SchLine {
        SchLine::new(self.position(segment.start), self.position(segment.end), Layer::Bus)
    }

    /// Run the whole build
    pub fn build(mut self) -> BuildOutput {
        let mut schematic = Schematic::new(root_filename(&self.source_filename));
        schematic.version = Some(self.design.header.version.clone());
        create_title_block(Some(&mut schematic.root), &self.design.parameters);

        self.build_power_families();

        let sheets = self.sheet_numbers();
        let total = sheets.len();
        let hierarchical = total > 1 || !self.options.flatten_single_sheet;
        tracing::debug!(
            "Building {} sheet(s), {}",
            total,
            if hierarchical { "hierarchical" } else { "flat" }
        );

        for (index, &number) in sheets.iter().enumerate() {
            if hierarchical {
                let mut screen = Screen::new(sheet_filename(&self.source_filename, number));
                screen.title_block = schematic.root.title_block.clone();
                self.populate_screen(number, &mut screen, true);
                if let Some(sheet) = create_hierarchical_sheet(
                    index,
                    total,
                    number,
                    Some(&mut schematic.root),
                    &self.source_filename,
                    self.default_sheet_size(),
                ) {
                    sheet.screen = screen;
                }
            } else {
                self.populate_screen(number, &mut schematic.root, false);
            }
        }

        if hierarchical {
            self.connect_sheets(&mut schematic.root);
        }

        schematic.nets = self.build_nets();
        schematic.library = self.symbols.library();

        tracing::info!(
            "Built schematic: {} symbols, {} library symbols, {} nets, {} sheet(s)",
            schematic.symbols().count(),
            schematic.library.len(),
            schematic.nets.len(),
            total
        );

        BuildOutput {
            schematic,
            diagnostics: self.diags,
        }
    }

    /// One synthesized symbol per variant of every power family, placed or not
    fn build_power_families(&mut self) {
        let design = self.design;
        for part_type in design.part_types.iter().filter(|p| p.is_special()) {
            for (index, variant) in part_type.special_variants.iter().enumerate() {
                let net = power_net_for(part_type, index, variant);
                let style = power_style_from_variant(&variant.decal_name, variant.pin_type);
                self.symbols
                    .get_or_create_power_symbol(&variant.decal_name, style, &net);
            }
        }
    }

    fn populate_screen(&mut self, sheet: u32, screen: &mut Screen, hierarchical: bool) {
        for placement in self.parts_on_sheet(sheet) {
            self.place_part(placement, screen);
        }
        for signal in self.signals_on_sheet(sheet) {
            self.draw_signal(signal, sheet, screen, hierarchical);
        }
    }

    fn instantiate(&self, lib_name: &str, placement: &PartPlacement, position: Position) -> SchSymbol {
        let mut symbol = SchSymbol::new(lib_name, position);
        symbol.rotation = placement.rotation;
        symbol.mirror_horizontal = placement.mirrored_horizontally();
        symbol.mirror_vertical = placement.mirrored_vertically();
        apply_part_attributes(Some(&mut symbol), placement);
        create_custom_fields(Some(&mut symbol), placement);
        symbol
    }

    fn place_part(&mut self, placement: &'a PartPlacement, screen: &mut Screen) {
        let design = self.design;
        let Some(part_type) = design.part_type(&placement.part_type) else {
            self.diags.push(
                DiagnosticKind::Reference,
                Some(placement.line),
                format!(
                    "Part {} uses unknown part type {}",
                    placement.key(),
                    placement.part_type
                ),
            );
            return;
        };

        if part_type.is_special() {
            self.place_power_symbol(part_type, placement, screen);
            return;
        }

        // A numeric suffix on a connector names the physical pin, not a gate
        let pin_suffix = placement
            .suffix
            .as_deref()
            .filter(|s| part_type.is_connector && s.chars().all(|c| c.is_ascii_digit()));
        let gate_number = if pin_suffix.is_some() { 1 } else { placement.gate_number };

        let Some(gate) = part_type.gate(gate_number) else {
            self.diags.push(
                DiagnosticKind::Reference,
                Some(placement.line),
                format!(
                    "Part {} refers to gate {} but {} has {} gate(s)",
                    placement.key(),
                    gate_number,
                    part_type.name,
                    part_type.gates.len()
                ),
            );
            return;
        };

        let decal_name = placement
            .symbol_name
            .as_deref()
            .or_else(|| gate.decal_names.first().map(String::as_str));
        let Some(decal) = decal_name.and_then(|name| design.decal(name)) else {
            self.diags.push(
                DiagnosticKind::Reference,
                Some(placement.line),
                format!(
                    "Part {} uses missing decal {}",
                    placement.key(),
                    decal_name.unwrap_or("<none>")
                ),
            );
            return;
        };

        let origin = self.position(placement.position);
        if decal.is_pin_decal && part_type.is_connector {
            // one unit per connector pin, numbered by its position in the gate
            let unit_of = |pin: &str| {
                gate.pins
                    .iter()
                    .position(|p| p.pin_id == pin)
                    .map_or(1, |i| i as u32 + 1)
            };
            let pins: Vec<&str> = match pin_suffix {
                Some(pin) => vec![pin],
                None => gate.pins.iter().map(|p| p.pin_id.as_str()).collect(),
            };
            for (i, &pin) in pins.iter().enumerate() {
                let lib = self
                    .symbols
                    .get_or_create_connector_pin_symbol(part_type, decal, pin);
                let at = origin.offset(0.0, -CONNECTOR_PIN_PITCH * i as f64);
                let mut symbol = self.instantiate(&lib.name, placement, at);
                symbol.unit = unit_of(pin);
                screen.add_symbol(symbol);
            }
        } else {
            let lib = self
                .symbols
                .get_or_create_symbol(decal, &gate.pins, &mut self.diags);
            let mut symbol = self.instantiate(&lib.name, placement, origin);
            symbol.unit = gate_number;
            screen.add_symbol(symbol);
        }

        if !self.placed.contains_key(&placement.reference) {
            self.placed.insert(placement.reference.clone(), part_type);
            for sigpin in &part_type.sigpins {
                self.implicit.push((
                    sigpin.net_name.clone(),
                    Connection {
                        component_ref: placement.reference.clone(),
                        pin_number: sigpin.pin_number.clone(),
                    },
                ));
            }
        }
    }

    fn place_power_symbol(
        &mut self,
        part_type: &'a PartTypeDef,
        placement: &PartPlacement,
        screen: &mut Screen,
    ) {
        let requested = placement.symbol_name.as_deref();
        let found = match requested.and_then(|name| part_type.special_variant(name)) {
            Some(found) => Some(found),
            None => {
                if let Some(name) = requested {
                    self.diags.push(
                        DiagnosticKind::Reference,
                        Some(placement.line),
                        format!(
                            "Part {} asks for variant {} not listed in {}",
                            placement.key(),
                            name,
                            part_type.name
                        ),
                    );
                }
                part_type.special_variants.first().map(|v| (0, v))
            }
        };
        let Some((index, variant)) = found else {
            self.diags.push(
                DiagnosticKind::Reference,
                Some(placement.line),
                format!("Power family {} has no variants", part_type.name),
            );
            return;
        };

        let net = power_net_for(part_type, index, variant);
        let style = power_style_from_variant(&variant.decal_name, variant.pin_type);
        let lib = self
            .symbols
            .get_or_create_power_symbol(&variant.decal_name, style, &net);
        let mut symbol = self.instantiate(&lib.name, placement, self.position(placement.position));
        symbol.value.text = net.clone();
        screen.add_symbol(symbol);

        self.placed
            .entry(placement.reference.clone())
            .or_insert(part_type);
        self.implicit.push((
            net,
            Connection {
                component_ref: placement.reference.clone(),
                pin_number: lib.pins.first().map(|p| p.number.clone()).unwrap_or_default(),
            },
        ));
    }

    fn draw_signal(&mut self, signal: &SchSignal, sheet: u32, screen: &mut Screen, hierarchical: bool) {
        let bus = is_bus_signal(&signal.name);
        let mut anchor: Option<Position> = None;
        for segment in signal.wires.iter().filter(|w| w.sheet_number == sheet) {
            let line = if bus {
                self.create_bus_wire(segment)
            } else {
                self.create_wire(segment)
            };
            anchor.get_or_insert(line.start);
            screen.add_line(line);
        }
        let Some(at) = anchor else { return };

        let global = is_global_signal(&signal.name, &signal.sheet_numbers());
        if global && is_power_symbol(&signal.name) {
            screen.add_label(create_net_label(&signal.name, at));
        } else if global && hierarchical {
            create_hier_label(&signal.name, at, screen);
        } else {
            screen.add_label(Label::new(signal.name.as_str(), at, LabelType::Local));
        }
    }

    /// Sheet pins for every cross-sheet net, each with a local label in the root
    fn connect_sheets(&self, root: &mut Screen) {
        let design = self.design;
        let cross: Vec<&SchSignal> = design
            .signals
            .iter()
            .filter(|s| !is_power_symbol(&s.name) && s.sheet_numbers().len() > 1)
            .collect();

        for sheet_index in 0..root.sheets.len() {
            let number = root.sheets[sheet_index].sheet_number;
            let mut root_labels = Vec::new();
            for (pin_index, signal) in cross.iter().filter(|s| s.is_on_sheet(number)).enumerate() {
                if let Some(pin) =
                    create_sheet_pin(root.sheets.get_mut(sheet_index), &signal.name, pin_index)
                {
                    root_labels.push(Label::new(pin.name.as_str(), pin.position, LabelType::Local));
                }
            }
            for label in root_labels {
                root.add_label(label);
            }
        }
    }

    /// Nets from SIGNAL records plus implicit power/SIGPIN connections.
    /// Connections to parts or pins that do not exist are dropped.
    fn build_nets(&mut self) -> Vec<Net> {
        let design = self.design;
        let mut nets: Vec<Net> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for signal in &design.signals {
            let mut net = Net {
                name: signal.name.clone(),
                connections: Vec::new(),
                global: is_global_signal(&signal.name, &signal.sheet_numbers()),
                bus: is_bus_signal(&signal.name),
            };
            for pin in &signal.connections {
                match self.placed.get(&pin.reference) {
                    None => self.diags.push(
                        DiagnosticKind::Reference,
                        Some(signal.line),
                        format!(
                            "Net {} connects to {}.{} but {} is not placed",
                            signal.name, pin.reference, pin.pin_number, pin.reference
                        ),
                    ),
                    Some(part_type) if !pin_exists(part_type, &pin.pin_number) => {
                        self.diags.push(
                            DiagnosticKind::Reference,
                            Some(signal.line),
                            format!(
                                "Net {} connects to {}.{} but {} has no pin {}",
                                signal.name,
                                pin.reference,
                                pin.pin_number,
                                part_type.name,
                                pin.pin_number
                            ),
                        )
                    }
                    Some(_) => {
                        if !net.has_connection(&pin.reference, &pin.pin_number) {
                            net.connections.push(Connection {
                                component_ref: pin.reference.clone(),
                                pin_number: pin.pin_number.clone(),
                            });
                        }
                    }
                }
            }
            index.insert(net.name.clone(), nets.len());
            nets.push(net);
        }

        for (name, connection) in std::mem::take(&mut self.implicit) {
            let i = match index.get(&name) {
                Some(&i) => i,
                None => {
                    nets.push(Net {
                        global: is_power_symbol(&name),
                        bus: is_bus_signal(&name),
                        name: name.clone(),
                        connections: Vec::new(),
                    });
                    index.insert(name, nets.len() - 1);
                    nets.len() - 1
                }
            };
            let net = &mut nets[i];
            if !net.has_connection(&connection.component_ref, &connection.pin_number) {
                net.connections.push(connection);
            }
        }

        nets
    }
}
