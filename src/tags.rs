//! Immutable, cheaply shared tag sets.
//!
//! The same tag set is usually attached to many samples, so a [`SampleTags`]
//! is a handle to shared, never-mutated contents. Cloning the handle is an
//! `Arc` clone, comparisons short-circuit on identity, and the JSON encoding
//! is computed once per tag set and reused afterwards.
//!
//! An unset tag set (the [`Default`]) behaves like an empty one for lookups
//! and copies, but serializes as JSON `null` and only equals another unset
//! tag set.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::StatsError;

/// Owned, mutable key/value tags.
pub type TagMap = BTreeMap<String, String>;

#[derive(Debug)]
struct TagsInner {
    tags: TagMap,
    json: OnceLock<Box<RawValue>>,
}

/// An immutable string to string map for sample tags.
#[derive(Debug, Clone, Default)]
pub struct SampleTags {
    inner: Option<Arc<TagsInner>>,
}

impl SampleTags {
    /// Copies the supplied tags; later changes to `data` are not observed.
    pub fn new<'a, I>(data: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let tags = data
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::from_map(tags)
    }

    /// Takes ownership of `data` without copying it.
    pub fn from_map(data: TagMap) -> Self {
        SampleTags {
            inner: Some(Arc::new(TagsInner {
                tags: data,
                json: OnceLock::new(),
            })),
        }
    }

    /// The unset tag set.
    pub fn unset() -> Self {
        SampleTags::default()
    }

    pub fn is_unset(&self) -> bool {
        self.inner.is_none()
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.tags.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.tags.get(key))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|inner| inner.tags.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compares two tag sets, checking identity before contents.
    pub fn is_equal(&self, other: &SampleTags) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                if a.tags.len() != b.tags.len() {
                    return false;
                }
                a.tags.iter().all(|(k, v)| b.tags.get(k) == Some(v))
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns an independent, mutable copy of the tags. Empty if unset.
    pub fn clone_tags(&self) -> TagMap {
        self.inner
            .as_ref()
            .map(|inner| inner.tags.clone())
            .unwrap_or_default()
    }

    /// JSON encoding of the tags, computed on first use and cached.
    pub fn marshal_json(&self) -> Result<&str, StatsError> {
        match self.cached_json()? {
            Some(raw) => Ok(raw.get()),
            None => Ok("null"),
        }
    }

    /// Replaces the contents with the decoded JSON object (or unset for `null`).
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<(), StatsError> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }

    fn cached_json(&self) -> Result<Option<&RawValue>, serde_json::Error> {
        let Some(inner) = &self.inner else {
            return Ok(None);
        };
        if let Some(raw) = inner.json.get() {
            return Ok(Some(&**raw));
        }
        // encode outside the cell, first writer wins
        let raw = serde_json::value::to_raw_value(&inner.tags)?;
        Ok(Some(&**inner.json.get_or_init(|| raw)))
    }

    #[cfg(test)]
    fn is_same_instance(&self, other: &SampleTags) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for SampleTags {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for SampleTags {}

impl From<TagMap> for SampleTags {
    fn from(data: TagMap) -> Self {
        SampleTags::from_map(data)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SampleTags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        SampleTags::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// emits a plain map so any serde format works; the cached bytes are only
// handed out by `marshal_json`
impl Serialize for SampleTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.inner {
            Some(inner) => inner.tags.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for SampleTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Option::<TagMap>::deserialize(deserializer)?;
        Ok(tags.map(SampleTags::from_map).unwrap_or_default())
    }
}
