//! Report line decoding, validation and the record types they produce

pub mod json_text;
pub mod parser;
pub mod record;
pub mod validator;

pub use parser::{ParsedReport, parse_lines};
pub use record::{ErrorRecord, UserId, ValidatedRecord};
