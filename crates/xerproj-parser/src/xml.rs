//! MS-Project XML import: a narrow external interface. The contract is
//! `bytes -> Result<Schedule, XerProjError>`; a full implementation is out
//! of scope here, so this always reports [`XerProjError::XmlParsingFailed`].
//!
//! A future reader built here must disable external entity resolution (XXE
//! mitigation) before accepting untrusted input.

use xerproj_core::{Schedule, XerProjError};

pub fn parse(_bytes: &[u8]) -> Result<Schedule, XerProjError> {
    Err(XerProjError::XmlParsingFailed(
        "MS-Project XML import not yet implemented".to_string(),
    ))
}
