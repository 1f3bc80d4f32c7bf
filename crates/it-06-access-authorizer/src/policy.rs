//! Allow/deny policy artifact handed back to the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";
pub const PRINCIPAL_ID: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "Allow"),
            Self::Deny => write!(f, "Deny"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action")]
    pub action: Vec<String>,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Resource")]
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerResponse {
    #[serde(rename = "principalId")]
    pub principal_id: String,
    #[serde(rename = "policyDocument")]
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    /// Single-statement policy for `resource`.
    pub fn new(effect: Effect, resource: impl Into<String>) -> Self {
        Self {
            principal_id: PRINCIPAL_ID.to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: vec![INVOKE_ACTION.to_string()],
                    effect,
                    resource: vec![resource.into()],
                }],
            },
        }
    }

    pub fn allow(resource: impl Into<String>) -> Self {
        Self::new(Effect::Allow, resource)
    }

    pub fn deny(resource: impl Into<String>) -> Self {
        Self::new(Effect::Deny, resource)
    }

    /// True only if every statement allows.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !self.policy_document.statement.is_empty()
            && self
                .policy_document
                .statement
                .iter()
                .all(|s| s.effect == Effect::Allow)
    }
}
