//! Build stage: turns a parsed PADS design into the destination schematic

pub mod power;
pub mod schematic;
pub mod symbol;

pub use power::{
    build_power_symbol, is_power_symbol, power_style_from_variant, power_symbol_id, PowerStyle,
};
pub use schematic::{is_bus_signal, is_global_signal, BuildOutput, SchematicBuilder};
pub use symbol::SymbolBuilder;
