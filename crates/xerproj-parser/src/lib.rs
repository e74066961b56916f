//! # xerproj-parser
//!
//! Turns raw export bytes into a [`xerproj_core::Schedule`]: format
//! auto-detection, the XER tabular stream reader, the schedule builder, and
//! the MS-Project XML boundary.
//!
//! ```rust
//! use xerproj_parser::parse_bytes;
//!
//! let input = b"ERMHDR\n%T\tPROJECT\n%F\tproj_id\n%R\t1000\n%E\n";
//! let schedule = parse_bytes(input).unwrap();
//! assert_eq!(schedule.project.id, "1000");
//! ```

pub mod builder;
pub mod detect;
pub mod xer;
pub mod xml;

use xerproj_core::{CollectingEmitter, DiagnosticEmitter, Schedule, XerProjError};

use detect::InputFormat;

/// Detect the input format and parse it into a [`Schedule`], discarding any
/// collected diagnostics. Use [`parse_bytes_with_diagnostics`] to keep them.
pub fn parse_bytes(bytes: &[u8]) -> Result<Schedule, XerProjError> {
    let mut emitter = CollectingEmitter::new();
    parse_bytes_with_emitter(bytes, &mut emitter)
}

/// Detect the input format, parse it, and return the collected diagnostics
/// alongside the result.
pub fn parse_bytes_with_diagnostics(
    bytes: &[u8],
) -> (Result<Schedule, XerProjError>, CollectingEmitter) {
    let mut emitter = CollectingEmitter::new();
    let result = parse_bytes_with_emitter(bytes, &mut emitter);
    (result, emitter)
}

fn parse_bytes_with_emitter(
    bytes: &[u8],
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<Schedule, XerProjError> {
    match detect::detect(bytes) {
        InputFormat::Xer => {
            let tables = xer::read_tables(bytes, emitter)?;
            builder::build_schedule(&tables, emitter)
        }
        InputFormat::MsProjectXml => xml::parse(bytes),
        InputFormat::UnsupportedBinary => Err(XerProjError::BinaryFormatNotFullySupported),
    }
}
