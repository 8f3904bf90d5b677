use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lib_symbol::{LibSymbol, Position};

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub text: String,
    pub visible: bool,
    pub position: Position,
}

impl Field {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            visible: true,
            position: Position::default(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A placed symbol instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchSymbol {
    pub uuid: String,
    pub lib_name: String,
    pub reference: Field,
    pub value: Field,
    pub footprint: Field,
    pub custom_fields: Vec<Field>,
    pub position: Position,
    pub rotation: f64,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    /// 1-based gate / unit number
    pub unit: u32,
}

impl SchSymbol {
    pub fn new(lib_name: impl Into<String>, position: Position) -> Self {
        Self {
            uuid: new_uuid(),
            lib_name: lib_name.into(),
            reference: Field::new("Reference", ""),
            value: Field::new("Value", ""),
            footprint: Field::new("Footprint", "").hidden(),
            custom_fields: Vec::new(),
            position,
            rotation: 0.0,
            mirror_horizontal: false,
            mirror_vertical: false,
            unit: 1,
        }
    }

    /// Look up a standard or custom field by name (case-insensitive)
    pub fn field(&self, name: &str) -> Option<&Field> {
        [&self.reference, &self.value, &self.footprint]
            .into_iter()
            .chain(self.custom_fields.iter())
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn add_field(&mut self, field: Field) {
        self.custom_fields.push(field);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Wire,
    Bus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchLine {
    pub uuid: String,
    pub start: Position,
    pub end: Position,
    pub layer: Layer,
}

impl SchLine {
    pub fn new(start: Position, end: Position, layer: Layer) -> Self {
        Self {
            uuid: new_uuid(),
            start,
            end,
            layer,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LabelType {
    Local,
    Global,
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub uuid: String,
    pub text: String,
    pub position: Position,
    pub rotation: f64,
    pub label_type: LabelType,
}

impl Label {
    pub fn new(text: impl Into<String>, position: Position, label_type: LabelType) -> Self {
        Self {
            uuid: new_uuid(),
            text: text.into(),
            position,
            rotation: 0.0,
            label_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// Connection point on a sheet symbol, matched to a hierarchical label inside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetPin {
    pub uuid: String,
    pub name: String,
    pub side: SheetSide,
    pub position: Position,
}

/// A child sheet placed on its parent screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub uuid: String,
    pub name: String,
    pub filename: String,
    pub sheet_number: u32,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub pins: Vec<SheetPin>,
    pub screen: Screen,
}

impl SheetPin {
    pub fn new(name: impl Into<String>, side: SheetSide, position: Position) -> Self {
        Self {
            uuid: new_uuid(),
            name: name.into(),
            side,
            position,
        }
    }
}

impl Sheet {
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        sheet_number: u32,
        position: Position,
        (width, height): (f64, f64),
    ) -> Self {
        let filename = filename.into();
        Self {
            uuid: new_uuid(),
            name: name.into(),
            screen: Screen::new(filename.clone()),
            filename,
            sheet_number,
            position,
            width,
            height,
            pins: Vec::new(),
        }
    }

    pub fn pin(&self, name: &str) -> Option<&SheetPin> {
        self.pins.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub revision: String,
    pub company: String,
}

impl TitleBlock {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.date.is_empty()
            && self.revision.is_empty()
            && self.company.is_empty()
    }
}

/// Drawing contents of one schematic page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Screen {
    pub filename: String,
    pub title_block: TitleBlock,
    pub symbols: Vec<SchSymbol>,
    pub lines: Vec<SchLine>,
    pub labels: Vec<Label>,
    pub sheets: Vec<Sheet>,
}

impl Screen {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn add_symbol(&mut self, symbol: SchSymbol) {
        self.symbols.push(symbol);
    }

    pub fn add_line(&mut self, line: SchLine) {
        self.lines.push(line);
    }

    pub fn add_label(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn labels_of_type(&self, label_type: LabelType) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(move |l| l.label_type == label_type)
    }

    pub fn find_symbol(&self, reference: &str) -> Option<&SchSymbol> {
        self.symbols.iter().find(|s| s.reference.text == reference)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Connection {
    pub component_ref: String,
    pub pin_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    pub connections: Vec<Connection>,
    pub global: bool,
    pub bus: bool,
}

impl Net {
    pub fn has_connection(&self, component_ref: &str, pin_number: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.component_ref == component_ref && c.pin_number == pin_number)
    }
}

/// Result of an import: the root screen, its child sheets and the symbol library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schematic {
    pub uuid: String,
    pub filename: String,
    pub version: Option<String>,
    pub root: Screen,
    pub library: Vec<LibSymbol>,
    pub nets: Vec<Net>,
}

impl Schematic {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            uuid: new_uuid(),
            root: Screen::new(filename.clone()),
            filename,
            version: None,
            library: Vec::new(),
            nets: Vec::new(),
        }
    }

    /// Root screen followed by every child sheet's screen
    pub fn screens(&self) -> Vec<&Screen> {
        let mut screens = vec![&self.root];
        let mut i = 0;
        while i < screens.len() {
            let screen = screens[i];
            screens.extend(screen.sheets.iter().map(|s| &s.screen));
            i += 1;
        }
        screens
    }

    pub fn symbols(&self) -> impl Iterator<Item = &SchSymbol> {
        self.screens().into_iter().flat_map(|s| s.symbols.iter())
    }

    pub fn find_symbol(&self, reference: &str) -> Option<&SchSymbol> {
        self.symbols().find(|s| s.reference.text == reference)
    }

    pub fn lib_symbol(&self, name: &str) -> Option<&LibSymbol> {
        self.library.iter().find(|s| s.name == name)
    }

    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn sheet_count(&self) -> usize {
        self.screens().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screens_include_nested_sheets() {
        let mut schematic = Schematic::new("top.kicad_sch");
        let mut child = Screen::new("top_sheet1.kicad_sch");
        child.add_symbol(SchSymbol::new("RES", Position::new(1.0, 2.0)));
        child.symbols[0].reference.text = "R1".to_string();
        let mut sheet = Sheet::new(
            "Sheet 1",
            "top_sheet1.kicad_sch",
            1,
            Position::default(),
            (2000.0, 1500.0),
        );
        sheet.screen = child;
        schematic.root.add_sheet(sheet);
        assert_eq!(schematic.sheet_count(), 2);
        assert_eq!(schematic.find_symbol("R1").map(|s| s.lib_name.as_str()), Some("RES"));
    }

    #[test]
    fn test_symbol_field_lookup() {
        let mut symbol = SchSymbol::new("RES", Position::default());
        symbol.add_field(Field::new("Tolerance", "1%"));
        assert_eq!(symbol.field("value").map(|f| f.name.as_str()), Some("Value"));
        assert_eq!(symbol.field("TOLERANCE").map(|f| f.text.as_str()), Some("1%"));
        assert!(symbol.field("missing").is_none());
        assert!(!symbol.footprint.visible);
    }
}
