//! Lenient URL splitting.
//!
//! Splits `scheme://netloc/path?query#fragment` without validating anything,
//! so every input string produces a (possibly empty) set of components.
//! Features are measured over the raw components, so nothing here is
//! normalized (unlike `url::Url`, which also rejects relative input).

/// Characters allowed in a scheme after the leading letter
fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

/// Components of a URL string. Borrowed fields would tie the parts to a
/// cleaned copy of the input, so they are owned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParts {
    /// Lower-cased scheme, empty when absent
    pub scheme: String,
    /// Authority component (user-info, host and port as written)
    pub netloc: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    /// Split a URL string into its components. Never fails.
    pub fn split(url: &str) -> Self {
        // Leading C0 controls and spaces are ignored, embedded tab/CR/LF removed.
        let cleaned: String = url
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();

        let mut parts = UrlParts::default();
        let mut rest = cleaned.as_str();

        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            let starts_with_letter = candidate
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic())
                .unwrap_or(false);
            if starts_with_letter && candidate.chars().all(is_scheme_char) {
                parts.scheme = candidate.to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        if let Some(after_slashes) = rest.strip_prefix("//") {
            let end = after_slashes
                .find(|c| matches!(c, '/' | '?' | '#'))
                .unwrap_or(after_slashes.len());
            parts.netloc = after_slashes[..end].to_string();
            rest = &after_slashes[end..];
        }

        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = fragment.to_string();
            rest = before;
        }

        if let Some((before, query)) = rest.split_once('?') {
            parts.query = query.to_string();
            rest = before;
        }

        parts.path = rest.to_string();
        parts
    }

    /// Host without user-info, port or IPv6 brackets
    pub fn host(&self) -> &str {
        let without_userinfo = match self.netloc.rfind('@') {
            Some(at) => &self.netloc[at + 1..],
            None => self.netloc.as_str(),
        };

        if let Some(bracketed) = without_userinfo.strip_prefix('[') {
            return match bracketed.find(']') {
                Some(end) => &bracketed[..end],
                None => bracketed,
            };
        }

        match without_userinfo.rfind(':') {
            Some(colon) => &without_userinfo[..colon],
            None => without_userinfo,
        }
    }

    /// Last `/`-delimited segment of the path (the "file" part)
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}
