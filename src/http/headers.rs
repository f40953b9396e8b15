use std::collections::HashMap;

/// Header map shared by requests and responses.
///
/// Names compare case-insensitively. Inserting a name that is already
/// present replaces its value in place (last write wins), keeping the
/// original position so serialized output stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
    /// Lowercased name -> slot in `entries`.
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header.
    ///
    /// When the name already exists (in any casing) the stored name keeps
    /// the casing of the latest write.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let key = name.to_ascii_lowercase();

        match self.index.get(&key) {
            Some(&idx) => self.entries[idx] = (name, value),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.index.remove(&name.to_ascii_lowercase())?;
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn duplicate_insert_replaces_value() {
        let mut headers = Headers::new();
        headers.insert("X-Trace", "a");
        headers.insert("Accept", "*/*");
        headers.insert("x-trace", "b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("X-Trace"), Some("b"));

        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["x-trace", "Accept"]);
    }

    #[test]
    fn remove_returns_value() {
        let mut headers: Headers = [("Host", "example.com")].into_iter().collect();

        assert_eq!(headers.remove("host"), Some("example.com".to_string()));
        assert!(headers.is_empty());
    }

    #[test]
    fn remove_keeps_later_entries_reachable() {
        let mut headers: Headers = [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();

        headers.remove("a");
        headers.insert("c", "4");

        assert_eq!(headers.get("B"), Some("2"));
        assert_eq!(headers.get("C"), Some("4"));
        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["B", "c"]);
    }
}
