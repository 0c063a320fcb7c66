//! Attribute release structures and the SAML derivation rule.

use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Java class tag CAS expects on serialized maps.
pub const JAVA_HASH_MAP: &str = "java.util.HashMap";

/// Java class tag CAS expects on serialized lists.
pub const JAVA_ARRAY_LIST: &str = "java.util.ArrayList";

/// SAML attribute name format assigned to every released attribute.
pub const NAME_FORMAT_URI: &str = "uri";

/// SAML attribute value type assigned to every released attribute.
pub const VALUE_TYPE_XS_STRING: &str = "XSString";

/// Ordered mapping from logical attribute name to SAML attribute URI.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct AttributeMapping {
    pairs: Vec<(String, String)>,
}

impl AttributeMapping {
    /// Append a `logical name → uri` pair. Re-inserting a logical name replaces
    /// its uri but keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, uri: impl Into<String>) {
        let name = name.into();
        let uri = uri.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(pair) => pair.1 = uri,
            None => self.pairs.push((name, uri)),
        }
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, u)| (n.as_str(), u.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<N: Into<String>, U: Into<String>> FromIterator<(N, U)> for AttributeMapping {
    fn from_iter<T: IntoIterator<Item = (N, U)>>(iter: T) -> Self {
        let mut mapping = Self::default();
        for (name, uri) in iter {
            mapping.insert(name, uri);
        }
        mapping
    }
}

/// An ordered string map serialized as a `java.util.HashMap` JSON object,
/// i.e. with a leading `"@class"` entry.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct JavaHashMap {
    entries: Vec<(String, String)>,
}

impl JavaHashMap {
    /// Insert an entry. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries, not counting the class tag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for JavaHashMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        map.serialize_entry("@class", JAVA_HASH_MAP)?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for JavaHashMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct JavaHashMapVisitor;

        impl<'de> Visitor<'de> for JavaHashMapVisitor {
            type Value = JavaHashMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a {JAVA_HASH_MAP} object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = JavaHashMap::default();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if key != "@class" {
                        map.insert(key, value);
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(JavaHashMapVisitor)
    }
}

/// A string list serialized the way CAS expects a `java.util.ArrayList`:
/// `["java.util.ArrayList", [..items]]`.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct JavaArrayList(pub Vec<String>);

impl Serialize for JavaArrayList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (JAVA_ARRAY_LIST, &self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JavaArrayList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (class, items) = <(String, Vec<String>)>::deserialize(deserializer)?;
        if class != JAVA_ARRAY_LIST {
            return Err(serde::de::Error::custom(format!(
                "expected {JAVA_ARRAY_LIST}, found {class}"
            )));
        }
        Ok(Self(items))
    }
}

/// The three SAML release structures, derived together from one mapping.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct SamlReleaseAttributes {
    /// Attribute URI → name format.
    pub name_formats: JavaHashMap,
    /// Attribute URI → value type.
    pub value_types: JavaHashMap,
    /// Logical attribute names, in mapping order.
    pub allowed: Vec<String>,
}

impl SamlReleaseAttributes {
    /// Derive all three structures in a single pass over `mapping`, so they
    /// share one URI set and one iteration order.
    pub fn derive(mapping: &AttributeMapping) -> Self {
        let mut derived = Self::default();
        for (name, uri) in mapping.iter() {
            derived.name_formats.insert(uri, NAME_FORMAT_URI);
            derived.value_types.insert(uri, VALUE_TYPE_XS_STRING);
            derived.allowed.push(name.to_string());
        }
        derived
    }
}
