use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use service_core::auth::AuthUser;
use service_core::authz::{compare_permission_sets, AccessDecision, ADMIN_ROLE};
use service_core::tool::ToolResponse;

use crate::AppState;

/// Permission a non-admin needs on an organization to inspect its members.
pub const VIEW_AGENCY_USERS: &str = "view_agency_users";

const TOOL_DENIED: &str = "User does not have permission to use this tool";

#[derive(Debug, Deserialize)]
pub struct OrganizationUsersRequest {
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Serialize)]
pub struct OrganizationUsersResponse {
    pub users: Vec<String>,
}

/// Usernames belonging to an organization. The caller must be an admin or
/// hold `view_agency_users` for that organization.
pub async fn get_organization_users(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<OrganizationUsersRequest>,
) -> Json<ToolResponse<OrganizationUsersResponse>> {
    if request.organization.is_empty() {
        return Json(ToolResponse::error(
            "Error, no argument given for organization",
        ));
    }

    if let AccessDecision::Deny(reason) =
        state
            .authz
            .check_org_permission(&claims, &request.organization, VIEW_AGENCY_USERS)
    {
        tracing::info!(user = %claims.sub, organization = %request.organization, "tool denied");
        return Json(ToolResponse::error(reason));
    }

    Json(ToolResponse::Ok(OrganizationUsersResponse {
        users: state.authz.identity().usernames_in(&request.organization),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ComparePermissionsRequest {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub usernames: Vec<String>,
}

/// Shared/unique permission breakdown for a list of users within one
/// organization, behind the same organization-scoped gate. An empty username
/// list yields an empty shared set and no per-user entries.
pub async fn compare_user_permissions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<ComparePermissionsRequest>,
) -> Json<ToolResponse<Value>> {
    if request.organization.is_empty() {
        return Json(ToolResponse::error(
            "Error, no argument given for organization",
        ));
    }

    if let AccessDecision::Deny(reason) =
        state
            .authz
            .check_org_permission(&claims, &request.organization, VIEW_AGENCY_USERS)
    {
        tracing::info!(user = %claims.sub, organization = %request.organization, "tool denied");
        return Json(ToolResponse::error(reason));
    }

    // Users without a permission row contribute the empty set.
    let per_user: Vec<_> = request
        .usernames
        .iter()
        .map(|username| {
            (
                username.clone(),
                state
                    .authz
                    .org_permissions(username, &request.organization),
            )
        })
        .collect();

    let comparison = compare_permission_sets(&per_user);

    let mut out = Map::new();
    out.insert(
        "shared_permissions".to_string(),
        json!(comparison.shared_permissions),
    );
    for (username, unique) in comparison.unique_permissions {
        out.insert(format!("unique_to_{}", username), json!(unique));
    }

    Json(ToolResponse::Ok(Value::Object(out)))
}

/// Full organization records, keyed by name. Admin only.
pub async fn get_organizations(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Json<ToolResponse<Value>> {
    if !state.authz.has_any_role(&claims, &[ADMIN_ROLE]) {
        return Json(ToolResponse::error(TOOL_DENIED));
    }

    let mut out = Map::new();
    for organization in state.organizations.all() {
        out.insert(organization.name.clone(), json!(organization));
    }

    Json(ToolResponse::Ok(Value::Object(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrganizationsConfig;
    use service_core::auth::AccessTokenClaims;

    fn state() -> AppState {
        let config = OrganizationsConfig::from_env().unwrap();
        AppState::from_config(config)
    }

    fn claims(sub: &str, roles: &[&str]) -> AccessTokenClaims {
        AccessTokenClaims {
            iss: "http://127.0.0.1:9400".to_string(),
            aud: vec!["http://127.0.0.1:9001".to_string()],
            sub: sub.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            organizations: vec![],
            iat: 0,
            exp: i64::MAX,
        }
    }

    fn as_json<T: Serialize>(response: &Json<T>) -> Value {
        serde_json::to_value(&response.0).unwrap()
    }

    #[tokio::test]
    async fn test_member_with_permission_lists_users() {
        let response = get_organization_users(
            State(state()),
            AuthUser(claims("linda_baker", &[])),
            Json(OrganizationUsersRequest {
                organization: "Dallas_Police".to_string(),
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(
            json["users"],
            json!(["james_smith", "linda_baker", "terry_jobs"])
        );
    }

    #[tokio::test]
    async fn test_outsider_is_denied() {
        let response = get_organization_users(
            State(state()),
            AuthUser(claims("paul_morgan", &[])),
            Json(OrganizationUsersRequest {
                organization: "Dallas_Police".to_string(),
            }),
        )
        .await;

        let json = as_json(&response);
        assert!(json["error"].as_str().unwrap().contains("permission"));
    }

    #[tokio::test]
    async fn test_admin_lists_any_organization() {
        let response = get_organization_users(
            State(state()),
            AuthUser(claims("admin", &["admin"])),
            Json(OrganizationUsersRequest {
                organization: "Allen_Firestation".to_string(),
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(json["users"], json!(["paul_morgan"]));
    }

    #[tokio::test]
    async fn test_missing_organization_argument() {
        let response = get_organization_users(
            State(state()),
            AuthUser(claims("admin", &["admin"])),
            Json(OrganizationUsersRequest {
                organization: String::new(),
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(json["error"], "Error, no argument given for organization");
    }

    #[tokio::test]
    async fn test_compare_permissions_shared_and_unique() {
        let response = compare_user_permissions(
            State(state()),
            AuthUser(claims("linda_baker", &[])),
            Json(ComparePermissionsRequest {
                organization: "Dallas_Police".to_string(),
                usernames: vec!["james_smith".to_string(), "linda_baker".to_string()],
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(json["shared_permissions"], json!(["view_agency_users"]));
        assert_eq!(json["unique_to_james_smith"], json!(["view_agency_tickets"]));
        assert_eq!(json["unique_to_linda_baker"], json!([]));
    }

    #[tokio::test]
    async fn test_compare_permissions_unknown_target_gets_empty_set() {
        let response = compare_user_permissions(
            State(state()),
            AuthUser(claims("admin", &["admin"])),
            Json(ComparePermissionsRequest {
                organization: "Dallas_Police".to_string(),
                usernames: vec!["linda_baker".to_string(), "ghost".to_string()],
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(json["shared_permissions"], json!([]));
        assert_eq!(json["unique_to_linda_baker"], json!(["view_agency_users"]));
        assert_eq!(json["unique_to_ghost"], json!([]));
    }

    #[tokio::test]
    async fn test_compare_permissions_empty_username_list() {
        let response = compare_user_permissions(
            State(state()),
            AuthUser(claims("admin", &["admin"])),
            Json(ComparePermissionsRequest {
                organization: "Dallas_Police".to_string(),
                usernames: vec![],
            }),
        )
        .await;

        let json = as_json(&response);
        assert_eq!(json["shared_permissions"], json!([]));
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_organizations_admin_only() {
        let response =
            get_organizations(State(state()), AuthUser(claims("linda_baker", &[]))).await;
        assert_eq!(as_json(&response)["error"], TOOL_DENIED);

        let response = get_organizations(State(state()), AuthUser(claims("admin", &["admin"]))).await;
        let json = as_json(&response);
        assert_eq!(json["Dallas_Police"]["region"], "south");
        assert_eq!(json["Allen_Firestation"]["status"], "active");
    }
}
