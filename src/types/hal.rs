//! HAL Types
//!
//! Link relations as used by the LibLynx API (`_links: {rel: {href}}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single HAL link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: None,
            title: None,
        }
    }
}

/// Relation name to link.
pub type Links = BTreeMap<String, Link>;

/// Root document of the API listing the named entry points.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointDocument {
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl EntryPointDocument {
    /// Look up a relation, accepting it with or without the `@` prefix.
    pub fn href(&self, name: &str) -> Option<&str> {
        self.links
            .get(name)
            .or_else(|| match name.strip_prefix('@') {
                Some(bare) => self.links.get(bare),
                None => self.links.get(&format!("@{name}")),
            })
            .map(|link| link.href.as_str())
    }
}
