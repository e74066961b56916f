use thiserror::Error;

/// The closed set of failure kinds the core can raise.
///
/// Anomalies that fall short of failure (unknown enum tokens, coerced dates,
/// dangling relationships, cycles, duplicate ids) are never represented
/// here — they travel through [`crate::Diagnostic`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XerProjError {
    #[error("input is empty")]
    EmptyFile,

    #[error("could not decode input as Windows-1252 or UTF-8")]
    Encoding,

    #[error("input decoded but contains no recognizable XER markers")]
    InvalidFormat,

    #[error("no ERMHDR line encountered")]
    MissingHeader,

    #[error("required table {0:?} is missing")]
    MissingRequiredTable(String),

    #[error("input is {size_mib} MiB, exceeding the {max_mib} MiB limit")]
    FileTooLarge { size_mib: u64, max_mib: u64 },

    #[error("input has {count} data rows, exceeding the {max} row limit")]
    TooManyRows { count: usize, max: usize },

    #[error("XML parsing failed: {0}")]
    XmlParsingFailed(String),

    #[error("compound-binary MPP format is not fully supported")]
    BinaryFormatNotFullySupported,
}
