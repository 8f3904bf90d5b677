//! Library symbols: shapes plus electrical pins, shared by placed instances

use serde::{Deserialize, Serialize};

/// Position in the output schematic (mils, source orientation)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Electrical type of a library pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
    #[default]
    Unspecified,
}

impl PinType {
    /// Map a PADS pin type code
    pub fn from_code(code: char) -> PinType {
        match code.to_ascii_uppercase() {
            'L' => PinType::Input,
            'S' => PinType::Output,
            'B' => PinType::Bidirectional,
            'T' => PinType::TriState,
            'C' => PinType::OpenCollector,
            'O' => PinType::OpenEmitter,
            'Z' => PinType::Passive,
            'P' | 'G' => PinType::PowerIn,
            'N' => PinType::NoConnect,
            _ => PinType::Unspecified,
        }
    }
}

impl std::fmt::Display for PinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinType::Input => write!(f, "input"),
            PinType::Output => write!(f, "output"),
            PinType::Bidirectional => write!(f, "bidirectional"),
            PinType::TriState => write!(f, "tri_state"),
            PinType::Passive => write!(f, "passive"),
            PinType::PowerIn => write!(f, "power_in"),
            PinType::PowerOut => write!(f, "power_out"),
            PinType::OpenCollector => write!(f, "open_collector"),
            PinType::OpenEmitter => write!(f, "open_emitter"),
            PinType::NoConnect => write!(f, "no_connect"),
            PinType::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Direction a pin extends from its connection point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinOrientation {
    #[default]
    Right,
    Up,
    Left,
    Down,
}

impl PinOrientation {
    /// Nearest quadrant for a rotation in degrees
    pub fn from_rotation(degrees: f64) -> PinOrientation {
        let quadrant = ((degrees / 90.0).round() as i64).rem_euclid(4);
        match quadrant {
            1 => PinOrientation::Up,
            2 => PinOrientation::Left,
            3 => PinOrientation::Down,
            _ => PinOrientation::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibPin {
    pub number: String,
    pub name: String,
    pub pin_type: PinType,
    pub position: Position,
    pub length: f64,
    pub orientation: PinOrientation,
    pub swap_group: i32,
}

impl LibPin {
    pub fn new(number: impl Into<String>, position: Position) -> Self {
        let number = number.into();
        Self {
            name: number.clone(),
            number,
            pin_type: PinType::Unspecified,
            position,
            length: 0.0,
            orientation: PinOrientation::Right,
            swap_group: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    Polyline { points: Vec<Position> },
    Rectangle { start: Position, end: Position },
    Circle { center: Position, radius: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibShape {
    #[serde(flatten)]
    pub kind: ShapeKind,
    pub line_width: f64,
    pub filled: bool,
}

impl LibShape {
    pub fn new(kind: ShapeKind, line_width: f64) -> Self {
        Self {
            kind,
            line_width,
            filled: false,
        }
    }

    pub fn filled(mut self) -> Self {
        self.filled = true;
        self
    }
}

/// A library symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibSymbol {
    pub name: String,
    pub is_power: bool,
    /// Net the sole pin of a power symbol is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_net: Option<String>,
    pub shapes: Vec<LibShape>,
    pub pins: Vec<LibPin>,
}

impl LibSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_power: false,
            power_net: None,
            shapes: Vec::new(),
            pins: Vec::new(),
        }
    }

    pub fn add_shape(&mut self, shape: LibShape) {
        self.shapes.push(shape);
    }

    pub fn add_pin(&mut self, pin: LibPin) {
        self.pins.push(pin);
    }

    pub fn pin(&self, number: &str) -> Option<&LibPin> {
        self.pins.iter().find(|p| p.number == number)
    }

    /// Renumber the pin currently numbered `from`. A pin whose name equals its
    /// old number is renamed too.
    pub fn renumber_pin(&mut self, from: &str, to: &str) -> bool {
        match self.pins.iter_mut().find(|p| p.number == from) {
            Some(pin) => {
                if pin.name == pin.number {
                    pin.name = to.to_string();
                }
                pin.number = to.to_string();
                true
            }
            None => false,
        }
    }
}
