//! HAL Resources
//!
//! Every resource returned by the API follows the Hypertext Application
//! Language convention: plain JSON properties plus a `_links` relation map.
//! Properties are read through explicit lookups; an absent property is a
//! [`LogicError::UndeclaredField`] rather than a silent `null`.

pub mod identification;

pub use identification::*;

use serde_json::{Map, Value};

use crate::error::LogicError;
use crate::types::{Link, Links};

/// Generic HAL resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HalResource {
    fields: Map<String, Value>,
    links: Links,
}

impl HalResource {
    /// Wrap a decoded JSON object. Non-object values yield an empty resource.
    ///
    /// Link relations without a string `href` are ignored.
    pub fn from_value(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let links = match fields.remove("_links") {
            Some(Value::Object(raw)) => raw
                .into_iter()
                .filter_map(|(rel, link)| {
                    serde_json::from_value::<Link>(link).ok().map(|l| (rel, l))
                })
                .collect(),
            _ => Links::new(),
        };

        Self { fields, links }
    }

    /// Property value, failing when the resource does not declare it.
    pub fn field(&self, name: &str) -> Result<&Value, LogicError> {
        self.fields
            .get(name)
            .ok_or_else(|| LogicError::UndeclaredField {
                name: name.to_string(),
            })
    }

    /// Property value, if declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String property, if declared and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// `href` of a link relation.
    pub fn get_link(&self, relation: &str) -> Result<&str, LogicError> {
        self.links
            .get(relation)
            .map(|link| link.href.as_str())
            .ok_or_else(|| LogicError::MissingLink {
                relation: relation.to_string(),
            })
    }

    pub fn has_link(&self, relation: &str) -> bool {
        self.links.contains_key(relation)
    }

    /// `href` of the `self` relation.
    pub fn self_link(&self) -> Option<&str> {
        self.links.get("self").map(|link| link.href.as_str())
    }
}
