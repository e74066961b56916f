//! Format auto-detection: inspects a byte buffer and decides which parser
//! path should handle it.

/// Compound-binary OLE2 magic bytes, the header of a native MPP file.
const MPP_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// First N bytes sniffed for an XML prolog or `<Project` root element.
const XML_SNIFF_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xer,
    MsProjectXml,
    /// Compound-binary MPP with no embedded XML to fall back on.
    UnsupportedBinary,
}

/// Detect which parser path `bytes` should be routed to. XER is the
/// default when nothing more specific is recognized; the caller's reader
/// is responsible for rejecting genuinely unparseable XER content.
pub fn detect(bytes: &[u8]) -> InputFormat {
    if bytes.len() >= MPP_MAGIC.len() && bytes[..MPP_MAGIC.len()] == MPP_MAGIC {
        // Some MPP files carry an embedded, recoverable XML project stream;
        // scrape for it before giving up on the whole file.
        if contains(bytes, b"<?xml") && contains(bytes, b"</Project>") {
            return InputFormat::MsProjectXml;
        }
        return InputFormat::UnsupportedBinary;
    }

    let window = &bytes[..bytes.len().min(XML_SNIFF_WINDOW)];
    if contains(window, b"<?xml") || contains(window, b"<Project") {
        return InputFormat::MsProjectXml;
    }

    InputFormat::Xer
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpp_magic_bytes_detected_as_unsupported_binary() {
        let mut bytes = MPP_MAGIC.to_vec();
        bytes.extend_from_slice(b"rest of the compound file");
        assert_eq!(detect(&bytes), InputFormat::UnsupportedBinary);
    }

    #[test]
    fn xml_prolog_routes_to_ms_project() {
        let bytes = b"<?xml version=\"1.0\"?><Project></Project>";
        assert_eq!(detect(bytes), InputFormat::MsProjectXml);
    }

    #[test]
    fn bare_project_root_routes_to_ms_project() {
        let bytes = b"<Project xmlns=\"http://schemas.microsoft.com/project\">";
        assert_eq!(detect(bytes), InputFormat::MsProjectXml);
    }

    #[test]
    fn anything_else_routes_to_xer() {
        let bytes = b"ERMHDR\t18.8\n%T\tPROJECT\n";
        assert_eq!(detect(bytes), InputFormat::Xer);
    }

    #[test]
    fn xml_sniff_is_limited_to_the_first_window() {
        let mut bytes = vec![b' '; XML_SNIFF_WINDOW + 10];
        bytes.extend_from_slice(b"<?xml?>");
        assert_eq!(detect(&bytes), InputFormat::Xer);
    }
}
