use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::claims::AccessTokenClaims;
use crate::identity::IdentityStore;

/// Global role that passes every organization-scoped check.
pub const ADMIN_ROLE: &str = "admin";

const ORG_PERMISSION_DENIED: &str =
    "User does not have permission to use this tool for the given organization";

/// Outcome of an access check. Denials carry a caller-facing reason and are a
/// normal, reportable result, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(String),
}

impl AccessDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Per-service access control engine, layered on verified claims plus
/// directory lookups.
#[derive(Clone)]
pub struct AccessControl {
    identity: Arc<IdentityStore>,
}

impl AccessControl {
    pub fn new(identity: Arc<IdentityStore>) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// True if the caller holds at least one of the allowed global roles.
    pub fn has_any_role(&self, claims: &AccessTokenClaims, allowed_roles: &[&str]) -> bool {
        claims
            .roles
            .iter()
            .any(|role| allowed_roles.contains(&role.as_str()))
    }

    /// Organization-scoped check: a qualifying global role allows
    /// unconditionally; otherwise the caller's permission row for the
    /// organization must contain `permission`. An absent row denies.
    pub fn check_org_permission(
        &self,
        claims: &AccessTokenClaims,
        organization: &str,
        permission: &str,
    ) -> AccessDecision {
        if self.has_any_role(claims, &[ADMIN_ROLE]) {
            return AccessDecision::Allow;
        }

        match self.identity.lookup_permissions(&claims.sub, organization) {
            Some(permissions) if permissions.contains(permission) => AccessDecision::Allow,
            Some(_) | None => AccessDecision::Deny(ORG_PERMISSION_DENIED.to_string()),
        }
    }

    /// Permission set of a user within an organization; empty if the user has
    /// no row on record.
    pub fn org_permissions(&self, username: &str, organization: &str) -> BTreeSet<String> {
        self.identity
            .lookup_permissions(username, organization)
            .cloned()
            .unwrap_or_default()
    }
}

/// Shared/unique permission breakdown across a list of users.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionComparison {
    pub shared_permissions: BTreeSet<String>,
    /// Per-user permissions not shared by all requested users, in request
    /// order.
    pub unique_permissions: Vec<(String, BTreeSet<String>)>,
}

/// Intersect per-user permission sets and report what each user holds beyond
/// the shared core. An empty input yields an empty shared set and no per-user
/// entries; that is the canonical result, not an error.
pub fn compare_permission_sets(
    per_user: &[(String, BTreeSet<String>)],
) -> PermissionComparison {
    let mut shared = match per_user.first() {
        Some((_, first)) => first.clone(),
        None => BTreeSet::new(),
    };
    for (_, permissions) in per_user.iter().skip(1) {
        shared = shared.intersection(permissions).cloned().collect();
    }

    let unique = per_user
        .iter()
        .map(|(user, permissions)| {
            (
                user.clone(),
                permissions.difference(&shared).cloned().collect(),
            )
        })
        .collect();

    PermissionComparison {
        shared_permissions: shared,
        unique_permissions: unique,
    }
}
