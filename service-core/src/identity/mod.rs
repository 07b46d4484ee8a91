use std::collections::{BTreeSet, HashMap};

/// A known user in the directory.
///
/// `organization_permissions` is keyed by organization identifier; a missing
/// entry means the user holds no scoped permissions for that organization.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub global_roles: BTreeSet<String>,
    pub organizations: BTreeSet<String>,
    pub organization_permissions: HashMap<String, BTreeSet<String>>,
}

impl User {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            global_roles: BTreeSet::new(),
            organizations: BTreeSet::new(),
            organization_permissions: HashMap::new(),
        }
    }

    fn with_role(mut self, role: &str) -> Self {
        self.global_roles.insert(role.to_string());
        self
    }

    fn with_membership(mut self, organization: &str, permissions: &[&str]) -> Self {
        self.organizations.insert(organization.to_string());
        if !permissions.is_empty() {
            self.organization_permissions.insert(
                organization.to_string(),
                permissions.iter().map(|p| p.to_string()).collect(),
            );
        }
        self
    }
}

/// Read-only directory of users, their global roles, organization memberships
/// and per-(user, organization) permission sets.
///
/// Seeded once at startup; mutation happens through an administrative process
/// outside this subsystem. Lookups never fail hard: an absent row is a normal
/// "not found" result and denies every scoped capability by default.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    users: HashMap<String, User>,
}

impl IdentityStore {
    /// The fixed development directory.
    pub fn seeded() -> Self {
        let users = vec![
            User::new("test-client"),
            User::new("james_smith")
                .with_membership("Dallas_Police", &["view_agency_users", "view_agency_tickets"]),
            User::new("linda_baker").with_membership("Dallas_Police", &["view_agency_users"]),
            User::new("terry_jobs").with_membership("Dallas_Police", &["view_agency_tickets"]),
            User::new("paul_morgan").with_membership("Allen_Firestation", &["view_agency_users"]),
            User::new("admin").with_role("admin"),
        ];

        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    pub fn lookup_user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Permission set for the (username, organization) pair, if a row exists.
    pub fn lookup_permissions(
        &self,
        username: &str,
        organization: &str,
    ) -> Option<&BTreeSet<String>> {
        self.users
            .get(username)?
            .organization_permissions
            .get(organization)
    }

    /// All usernames that are members of the given organization.
    pub fn usernames_in(&self, organization: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .users
            .values()
            .filter(|u| u.organizations.contains(organization))
            .map(|u| u.username.clone())
            .collect();
        names.sort();
        names
    }
}
