//! Derivation of URL extensions and lookup ids from dotted names
//!
//! Retrieval URLs have the form `<protocol_host><id><ext>` where `<ext>` is
//! the final dot-suffix of the uploaded filename. Names without a dot have
//! no valid derivation and are reported as `None` rather than producing a
//! malformed URL or id.

/// Final dot-suffix of a filename, including the dot
pub fn extension_of(filename: &str) -> Option<&str> {
    filename.rfind('.').map(|index| &filename[index..])
}

/// Bare entry id of a `<id>.<ext>` path segment
pub fn id_of(segment: &str) -> Option<&str> {
    segment.rfind('.').map(|index| &segment[..index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.png"), Some(".png"));
        assert_eq!(extension_of("archive.tar.gz"), Some(".gz"));
        assert_eq!(extension_of(".gitignore"), Some(".gitignore"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(""), None);
    }

    #[test]
    fn test_id_of() {
        assert_eq!(id_of("deadbeef01.png"), Some("deadbeef01"));
        assert_eq!(id_of("a.b.c"), Some("a.b"));
        assert_eq!(id_of("noextension"), None);
        assert_eq!(id_of(""), None);
    }
}
