//! # Role Resolver
//!
//! Normalizes the role strings of a caller profile into the fixed set of roles the action
//! registry understands. Unknown roles are dropped silently.

use serde::Serialize;
use std::collections::BTreeSet;

const ROLE_PREFIX: &str = "ROLE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Supervisor => "supervisor",
        }
    }

    /// Parse one raw role string (`ROLE_SUPERVISOR`, `supervisor`, ` Operator `).
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let unprefixed = match trimmed.get(..ROLE_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(ROLE_PREFIX) => &trimmed[ROLE_PREFIX.len()..],
            _ => trimmed,
        };
        match unprefixed.to_lowercase().as_str() {
            "operator" => Some(Role::Operator),
            "supervisor" => Some(Role::Supervisor),
            _ => None,
        }
    }
}

pub type RoleSet = BTreeSet<Role>;

pub fn resolve_roles<S: AsRef<str>>(raw_roles: &[S]) -> RoleSet {
    raw_roles
        .iter()
        .filter_map(|raw| Role::parse(raw.as_ref()))
        .collect()
}
