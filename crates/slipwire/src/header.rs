//! Ordered header storage with case-insensitive lookup.

/// Header name/value pairs in arrival order.
///
/// Names are stored as given but compare case-insensitively on lookup.
/// Duplicate names are kept rather than coalesced, so headers that
/// legitimately repeat (`Set-Cookie` arrives once per cookie) survive
/// intact and iteration reproduces wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    pairs: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Adds a pair at the end, keeping any existing pairs with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Adds a pair only when no pair with this name exists yet.
    pub fn set_default(&mut self, name: &str, value: &str) {
        if !self.contains(name) {
            self.pairs.push((name.to_string(), value.to_string()));
        }
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded under `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.append("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("content-length"), None);
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let mut headers = HeaderMap::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("X-Other", "y");
        headers.append("set-cookie", "b=2");
        assert_eq!(headers.get("Set-Cookie"), Some("a=1"));
        assert_eq!(headers.get_all("Set-Cookie"), vec!["a=1", "b=2"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn set_default_does_not_clobber() {
        let mut headers = HeaderMap::new();
        headers.append("content-type", "application/json");
        headers.set_default("Content-Type", "text/plain");
        assert_eq!(headers.get_all("content-type"), vec!["application/json"]);

        headers.set_default("User-Agent", "slipwire");
        assert_eq!(headers.get("user-agent"), Some("slipwire"));
    }

    #[test]
    fn from_iterator_preserves_wire_order() {
        let wire = vec![
            ("Date".to_string(), "today".to_string()),
            ("Set-Cookie".to_string(), "a=1".to_string()),
            ("Set-Cookie".to_string(), "b=2".to_string()),
        ];
        let headers: HeaderMap = wire.clone().into_iter().collect();
        let collected: Vec<(String, String)> = headers.into_pairs();
        assert_eq!(collected, wire);
    }
}
