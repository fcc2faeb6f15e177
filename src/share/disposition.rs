//! Inline-vs-attachment display policy
//!
//! Whitelisted content types are displayed in the client's browser; anything
//! else is offered as a download. The decision is made before any body bytes
//! are written since it sets a response header.

/// How a served file is presented to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }

    /// Value for the Content-Disposition header, e.g.
    /// `inline; filename="photo.png"`. Quotes and backslashes in the
    /// client-supplied filename are escaped so the quoted-string stays
    /// well-formed.
    pub fn header_value(&self, filename: &str) -> String {
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}; filename=\"{}\"", self.as_str(), escaped)
    }
}

/// Case-insensitive whitelist match of the entry's content type
pub fn decide_disposition(content_type: &str, whitelist: &[String]) -> Disposition {
    if whitelist.iter().any(|allowed| allowed.eq_ignore_ascii_case(content_type)) {
        Disposition::Inline
    } else {
        Disposition::Attachment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_whitelisted_type_is_inline() {
        let list = whitelist(&["image/png", "text/plain"]);
        assert_eq!(decide_disposition("image/png", &list), Disposition::Inline);
        assert_eq!(decide_disposition("text/plain", &list), Disposition::Inline);
    }

    #[test]
    fn test_other_type_is_attachment() {
        let list = whitelist(&["image/png"]);
        assert_eq!(decide_disposition("application/octet-stream", &list), Disposition::Attachment);
        assert_eq!(decide_disposition("", &list), Disposition::Attachment);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let list = whitelist(&["image/png"]);
        assert_eq!(decide_disposition("Image/PNG", &list), Disposition::Inline);
        assert_eq!(decide_disposition("IMAGE/PNG", &list), Disposition::Inline);
    }

    #[test]
    fn test_empty_whitelist() {
        assert_eq!(decide_disposition("image/png", &[]), Disposition::Attachment);
    }

    #[test]
    fn test_header_value() {
        assert_eq!(
            Disposition::Inline.header_value("photo.png"),
            "inline; filename=\"photo.png\""
        );
        assert_eq!(
            Disposition::Attachment.header_value("temp.html"),
            "attachment; filename=\"temp.html\""
        );
    }

    #[test]
    fn test_header_value_escapes_quotes_and_backslashes() {
        assert_eq!(
            Disposition::Attachment.header_value("we\"ird.txt"),
            "attachment; filename=\"we\\\"ird.txt\""
        );
        assert_eq!(
            Disposition::Inline.header_value("back\\slash.png"),
            "inline; filename=\"back\\\\slash.png\""
        );
    }
}
