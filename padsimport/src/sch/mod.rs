//! Destination schematic model
//!
//! The builder populates these types; persisting them to disk is left to the
//! caller. All coordinates are mils in the source orientation.

pub mod lib_symbol;
pub mod schema;

pub use lib_symbol::*;
pub use schema::*;
