//! Identification Resource
//!
//! Outcome of an identification request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::LogicError;
use crate::resources::HalResource;

/// Identification state reported by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentificationStatus {
    /// The visitor was matched to an account.
    Identified,
    /// The visitor has to choose an affiliation at the WAYF page.
    Wayf,
    /// Anything else; treated as not identified.
    Other(String),
}

impl IdentificationStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "identified" => Self::Identified,
            "wayf" => Self::Wayf,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Identified => "identified",
            Self::Wayf => "wayf",
            Self::Other(status) => status,
        }
    }
}

impl fmt::Display for IdentificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account the visitor was identified as.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identification returned by `POST @new_identification`.
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    id: String,
    status: IdentificationStatus,
    account: Option<Account>,
    resource: HalResource,
}

impl Identification {
    /// Build from a decoded response. The response must carry an `id`.
    pub fn from_value(value: Value) -> Result<Self, LogicError> {
        let resource = HalResource::from_value(value);

        let id = match resource.field("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => {
                return Err(LogicError::UndeclaredField {
                    name: "id".to_string(),
                })
            }
        };

        let status = IdentificationStatus::parse(resource.get_str("status").unwrap_or_default());

        let account = resource
            .get("account")
            .filter(|account| account.is_object())
            .and_then(|account| serde_json::from_value(account.clone()).ok());

        Ok(Self {
            id,
            status,
            account,
            resource,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &IdentificationStatus {
        &self.status
    }

    pub fn ip(&self) -> Option<&str> {
        self.resource.get_str("ip")
    }

    pub fn url(&self) -> Option<&str> {
        self.resource.get_str("url")
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.resource.get_str("user_agent")
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account.as_ref()?.account_name.as_deref()
    }

    pub fn is_identified(&self) -> bool {
        self.status == IdentificationStatus::Identified
    }

    pub fn requires_wayf(&self) -> bool {
        self.status == IdentificationStatus::Wayf
    }

    /// Where to send the visitor when [`requires_wayf`](Self::requires_wayf).
    pub fn wayf_url(&self) -> Result<&str, LogicError> {
        self.resource.get_link("wayf")
    }

    /// Any other property of the response.
    pub fn field(&self, name: &str) -> Result<&Value, LogicError> {
        self.resource.field(name)
    }

    pub fn get_link(&self, relation: &str) -> Result<&str, LogicError> {
        self.resource.get_link(relation)
    }

    pub fn has_link(&self, relation: &str) -> bool {
        self.resource.has_link(relation)
    }

    pub fn resource(&self) -> &HalResource {
        &self.resource
    }
}
