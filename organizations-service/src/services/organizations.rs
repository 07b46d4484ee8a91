use serde::Serialize;

/// One organization record in the directory.
#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    pub name: String,
    pub aware_service: String,
    pub status: String,
    pub region: String,
}

/// Static organization table, seeded at startup like the user directory.
#[derive(Debug, Clone)]
pub struct OrganizationDirectory {
    organizations: Vec<Organization>,
}

impl OrganizationDirectory {
    pub fn seeded() -> Self {
        let organizations = vec![
            Organization {
                name: "Dallas_Police".to_string(),
                aware_service: "premium".to_string(),
                status: "active".to_string(),
                region: "south".to_string(),
            },
            Organization {
                name: "Allen_Firestation".to_string(),
                aware_service: "standard".to_string(),
                status: "active".to_string(),
                region: "south".to_string(),
            },
        ];
        Self { organizations }
    }

    pub fn all(&self) -> &[Organization] {
        &self.organizations
    }
}
