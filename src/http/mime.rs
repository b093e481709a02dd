//! MIME type lookup module
//!
//! Maps the fixed set of client asset extensions to their Content-Type.

/// Fallback type for extensions outside the table.
///
/// The caller decides whether to apply it; [`lookup`] itself stays a pure
/// table so an unknown extension is distinguishable from a known one.
pub const FALLBACK: &str = "application/octet-stream";

/// Look up the Content-Type for a file extension.
///
/// An absent extension resolves to `text/plain`. A present but
/// unrecognized extension resolves to `None`.
///
/// # Examples
/// ```
/// use devserve::http::mime::lookup;
/// assert_eq!(lookup(Some("html")), Some("text/html"));
/// assert_eq!(lookup(None), Some("text/plain"));
/// assert_eq!(lookup(Some("pdf")), None);
/// ```
pub fn lookup(extension: Option<&str>) -> Option<&'static str> {
    match extension {
        None => Some("text/plain"),
        Some("html") => Some("text/html"),
        Some("txt") => Some("text/plain"),
        Some("css") => Some("text/css"),
        Some("gif") => Some("image/gif"),
        Some("jpg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("svg") => Some("image/svg+xml"),
        Some("js") => Some("application/javascript"),
        Some("ico") => Some("image/vnd.microsoft.icon"),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(lookup(Some("html")), Some("text/html"));
        assert_eq!(lookup(Some("txt")), Some("text/plain"));
        assert_eq!(lookup(Some("css")), Some("text/css"));
        assert_eq!(lookup(Some("gif")), Some("image/gif"));
        assert_eq!(lookup(Some("jpg")), Some("image/jpeg"));
        assert_eq!(lookup(Some("png")), Some("image/png"));
        assert_eq!(lookup(Some("svg")), Some("image/svg+xml"));
        assert_eq!(lookup(Some("js")), Some("application/javascript"));
        assert_eq!(lookup(Some("ico")), Some("image/vnd.microsoft.icon"));
    }

    #[test]
    fn test_absent_extension_is_plain_text() {
        assert_eq!(lookup(None), Some("text/plain"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(lookup(Some("pdf")), None);
        assert_eq!(lookup(Some("")), None);
        // The table is case-sensitive, like the map it replaces.
        assert_eq!(lookup(Some("HTML")), None);
    }

    #[test]
    fn test_stable_across_calls() {
        for _ in 0..3 {
            assert_eq!(lookup(Some("svg")), Some("image/svg+xml"));
        }
    }
}
