use std::collections::HashMap;

/// Case-insensitive multi-value header map.
///
/// Keys normalize to lowercase on insert; lookups are case-insensitive;
/// iteration preserves first-insertion order, which keeps `Set-Cookie`
/// emission stable.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    /// Entries in insertion order: (lowercased name, value).
    entries: Vec<(String, String)>,
    /// Index from lowercased name to entry positions.
    index: HashMap<String, Vec<usize>>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let key = name.as_ref().to_ascii_lowercase();
        let pos = self.entries.len();
        self.entries.push((key.clone(), value.into()));
        self.index.entry(key).or_default().push(pos);
    }

    /// Replace all values for a name with a single value.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.remove(name.as_ref());
        self.append(name, value);
    }

    /// First value for a name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        self.index
            .get(&key)
            .and_then(|positions| positions.first())
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// All values for a name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let key = name.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(positions) => positions
                .iter()
                .map(|&pos| self.entries[pos].1.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Remove all values for a name; returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        if self.index.remove(&key).is_none() {
            return false;
        }
        self.entries.retain(|(entry_key, _)| entry_key != &key);
        self.reindex();
        true
    }

    /// Insert only if the name is not already present. Used when the
    /// machine decorates responses with computed validators that a
    /// handler-built response may already carry.
    pub fn set_if_absent(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        if !self.contains(name.as_ref()) {
            self.append(name, value);
        }
    }

    /// Append a token to a comma-separated header (e.g. `Vary`) unless
    /// the token is already listed.
    pub fn merge_list_value(&mut self, name: &str, token: &str) {
        let merged = match self.get(name) {
            Some(existing) => {
                let present = existing
                    .split(',')
                    .any(|item| item.trim().eq_ignore_ascii_case(token));
                if present {
                    return;
                }
                Some(format!("{}, {}", existing, token))
            }
            None => None,
        };
        match merged {
            Some(value) => self.set(name, value),
            None => self.append(name, token),
        }
    }

    /// Iterate entries in first-insertion order as (name, value).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit as an ordered list of (name, value-bytes) pairs for the
    /// adapter. Values emit UTF-8; non-ASCII falls back to latin-1
    /// byte-for-byte where the code point permits.
    pub fn to_wire(&self) -> Vec<(String, Vec<u8>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), encode_header_value(value)))
            .collect()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, (key, _)) in self.entries.iter().enumerate() {
            self.index.entry(key.clone()).or_default().push(pos);
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

/// Encode one header value for the wire. ASCII passes through; other
/// code points ≤ U+00FF emit as single latin-1 bytes; anything above
/// falls back to the UTF-8 encoding of the character.
fn encode_header_value(value: &str) -> Vec<u8> {
    if value.is_ascii() {
        return value.as_bytes().to_vec();
    }
    let mut out = Vec::with_capacity(value.len());
    for ch in value.chars() {
        let code = ch as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    out
}
