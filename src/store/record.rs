//! Captured request records

use std::fmt;

use bytes::Bytes;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable snapshot of one inbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Request URL as received
    pub url: RecordUrl,
    /// Protocol version (e.g., "HTTP/1.1")
    pub proto: String,
    /// Request headers, excluding `Host`
    pub headers: MultiMap,
    /// Raw request body
    #[serde(with = "base64_body")]
    pub body: Bytes,
    /// `Host` header as seen by the server
    pub host: String,
    /// Peer address
    pub remote_addr: String,
}

impl Record {
    /// Size of the captured body in bytes
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Structured request URL
///
/// `scheme` and `host` stay empty for origin-form request targets, which is
/// what nearly every client sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUrl {
    /// URL scheme, if the request target was absolute
    pub scheme: String,
    /// Authority, if the request target was absolute
    pub host: String,
    /// Path component, undecoded
    pub path: String,
    /// Query string without the leading `?`
    pub raw_query: String,
    /// Decoded query parameters
    pub query: MultiMap,
}

impl RecordUrl {
    /// Build from the parts of a request target
    #[must_use]
    pub fn new(scheme: &str, host: &str, path: &str, raw_query: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            path: path.to_string(),
            raw_query: raw_query.to_string(),
            query: parse_query(raw_query),
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` query string
///
/// Undecodable components are kept verbatim.
#[must_use]
pub fn parse_query(raw: &str) -> MultiMap {
    let mut query = MultiMap::new();

    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query.append(decode_component(key), decode_component(value));
    }

    query
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Ordered multimap from name to values
///
/// Keeps distinct names in order of first appearance and every value of a
/// repeated name. Serializes as a JSON object of string arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `name`, after any existing values
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// All values for `name`
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Names in order of first appearance
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over names and their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Number of distinct names
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

struct MultiMapVisitor;

impl<'de> Visitor<'de> for MultiMapVisitor {
    type Value = MultiMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of names to string arrays")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MultiMap, A::Error> {
        let mut map = MultiMap::new();
        while let Some((name, values)) = access.next_entry::<String, Vec<String>>()? {
            for value in values {
                map.append(name.clone(), value);
            }
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for MultiMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MultiMapVisitor)
    }
}

/// Render a header name in canonical MIME form (`content-type` -> `Content-Type`)
///
/// Names containing bytes outside the token alphabet are returned unchanged.
#[must_use]
pub fn canonical_header_name(name: &str) -> String {
    let is_token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if !name.chars().all(is_token) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

mod base64_body {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
