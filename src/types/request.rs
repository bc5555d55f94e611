//! Identification Request
//!
//! Caller-supplied details of the visitor to identify.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload of an identification request.
///
/// Every field is optional; unset or empty fields are left out of the
/// serialized JSON entirely. A useful request carries at least `ip` and `url`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationRequest {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub ip: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl IdentificationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from CGI-style server variables
    /// (`REMOTE_ADDR`, `HTTP_REFERER`, `REQUEST_URI`, `HTTP_USER_AGENT`).
    pub fn from_server_vars(vars: &HashMap<String, String>) -> Self {
        Self {
            ip: vars.get("REMOTE_ADDR").cloned(),
            referrer: vars.get("HTTP_REFERER").cloned(),
            url: vars.get("REQUEST_URI").cloned(),
            user_agent: vars.get("HTTP_USER_AGENT").cloned(),
        }
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// True when the request carries the recommended `ip` and `url`.
    pub fn is_well_formed(&self) -> bool {
        !is_blank(&self.ip) && !is_blank(&self.url)
    }

    /// Serialize to the JSON body sent to the API.
    pub fn to_json(&self) -> String {
        // A struct of optional strings always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
