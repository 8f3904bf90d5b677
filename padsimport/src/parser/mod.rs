pub mod decal;
pub mod pads;
pub mod pads_schema;
pub mod parttype;
pub mod placement;
pub mod scanner;
pub mod signal;

// Re-export for convenience
pub use pads::{parse_header_line, PadsParseError, PadsParser, ParseOutcome};
pub use pads_schema::*;
pub use scanner::{check_file_header, check_header_str, read_file_header, Scanner};
