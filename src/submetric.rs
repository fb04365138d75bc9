//! Submetrics: tag-filtered views of a parent metric.
//!
//! A submetric is named after its parent plus a filter clause, for example
//! `http_req_duration{status:200,method:"GET"}`. Only samples whose tags
//! contain every filter key with the same value are counted by it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::metrics::Metric;
use crate::tags::{SampleTags, TagMap};

const QUOTES: [char; 2] = ['"', '\''];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submetric {
    /// The full name, filter clause included
    pub name: String,
    pub parent: String,
    /// Raw text between the filter braces
    pub suffix: String,
    /// Filter constraints, unset when the name has no filter clause
    pub tags: SampleTags,
    /// The metric aggregating this view, once resolved
    #[serde(skip)]
    pub metric: Option<Arc<Metric>>,
}

impl Submetric {
    /// Parses a possibly filter-bearing metric name.
    ///
    /// Returns the parent metric's name along with an unresolved submetric.
    /// A name without a filter clause yields a submetric with an empty
    /// `parent` and unset tags.
    /// Malformed clauses are accepted as they come: a clause without `:` is a
    /// key with an empty value, empty clauses are skipped and the last of
    /// duplicated keys wins.
    pub fn parse(name: &str) -> (String, Submetric) {
        let trimmed = name.strip_suffix('}').unwrap_or(name);
        let Some((parent, suffix)) = trimmed.split_once('{') else {
            let sm = Submetric {
                name: name.to_string(),
                parent: String::new(),
                suffix: String::new(),
                tags: SampleTags::unset(),
                metric: None,
            };
            return (trimmed.to_string(), sm);
        };

        let mut tags = TagMap::new();
        for kv in suffix.split(',') {
            if kv.is_empty() {
                continue;
            }
            let (key, value) = kv.split_once(':').unwrap_or((kv, ""));
            tags.insert(clean(key).to_string(), clean(value).to_string());
        }

        let sm = Submetric {
            name: name.to_string(),
            parent: parent.to_string(),
            suffix: suffix.to_string(),
            tags: SampleTags::from_map(tags),
            metric: None,
        };
        (parent.to_string(), sm)
    }

    /// Whether a sample carrying `tags` belongs to this view.
    pub fn matches(&self, tags: &SampleTags) -> bool {
        self.tags.iter().all(|(k, v)| tags.get(k) == Some(v))
    }
}

fn clean(s: &str) -> &str {
    s.trim_matches(QUOTES).trim()
}
