//! Request header map with case-insensitive name lookup.

/// A case-insensitive, order-preserving list of request header fields.
///
/// Values are kept as the raw bytes the client sent. [`get`](Self::get) views
/// a value as text; [`get_bytes`](Self::get_bytes) returns it untouched.
/// Repeated fields are kept as separate entries and lookups return the first.
///
/// # Examples
///
/// ```
/// use barehttp::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("User-Agent", "curl/8.4.0");
///
/// assert_eq!(headers.get("user-agent"), Some("curl/8.4.0"));
/// assert!(headers.get("accept-encoding").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: Vec<(String, Vec<u8>)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value for `name` (case-insensitive) as text.
    ///
    /// `None` when the header is absent or its value is not valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_bytes(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Returns the first value for `name` (case-insensitive) as sent.
    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Returns the total number of entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("Accept-Encoding", "gzip");
        assert_eq!(h.get("accept-encoding"), Some("gzip"));
        assert_eq!(h.get("ACCEPT-ENCODING"), Some("gzip"));
    }

    #[test]
    fn first_value_wins() {
        let mut h = Headers::with_capacity(2);
        h.insert("User-Agent", "first");
        h.insert("user-agent", "second");
        assert_eq!(h.get("User-Agent"), Some("first"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn non_utf8_value_is_kept_as_bytes() {
        let mut h = Headers::new();
        h.insert("User-Agent", &b"caf\xe9"[..]);
        assert_eq!(h.get_bytes("user-agent"), Some(&b"caf\xe9"[..]));
        assert_eq!(h.get("user-agent"), None);
        assert!(!h.is_empty());
    }
}
