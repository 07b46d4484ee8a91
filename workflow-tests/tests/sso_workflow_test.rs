use std::sync::Arc;

use serde_json::json;
use sso_client::{LoginOutcome, ResourceClient, SsoSession};
use workflow_tests::{
    spawn_cluster, spawn_cluster_with_token_ttl, spawn_unregistered_resource_server,
};

async fn authenticated_session(issuer_url: &str, user_id: &str) -> Arc<SsoSession> {
    let session = SsoSession::connect(issuer_url)
        .await
        .expect("Failed to connect SSO session");
    session
        .authenticate(user_id)
        .await
        .expect("Authentication failed");
    Arc::new(session)
}

#[tokio::test]
async fn test_single_login_authorizes_both_resource_servers() {
    let cluster = spawn_cluster().await;
    let session = authenticated_session(&cluster.issuer_url, "linda_baker").await;

    let ticketing = ResourceClient::new(session.clone(), &cluster.ticketing_url);
    let organizations = ResourceClient::new(session.clone(), &cluster.organizations_url);

    // Same token, first server.
    let reply = ticketing.call_tool("whoami", json!({})).await.unwrap();
    assert!(reply.status.is_success());
    assert_eq!(reply.body["username"], "linda_baker");
    assert_eq!(reply.body["organizations"], json!(["Dallas_Police"]));

    // Same token, second server, without any further login.
    let reply = organizations
        .call_tool(
            "get_organization_users",
            json!({ "organization": "Dallas_Police" }),
        )
        .await
        .unwrap();
    assert!(reply.status.is_success());
    assert_eq!(
        reply.body["users"],
        json!(["james_smith", "linda_baker", "terry_jobs"])
    );
}

#[tokio::test]
async fn test_unknown_user_is_denied_with_state_echoed() {
    let cluster = spawn_cluster().await;
    let session = SsoSession::connect(&cluster.issuer_url).await.unwrap();
    session
        .register(&["http://127.0.0.1:7777/callback"], "workflow-tests")
        .await
        .unwrap();

    let outcome = session
        .login_as("intruder", "http://127.0.0.1:7777/callback", "csrf-state-1")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        LoginOutcome::Denied {
            error: "access_denied".to_string(),
            state: "csrf-state-1".to_string()
        }
    );
}

#[tokio::test]
async fn test_authorization_code_is_single_use_end_to_end() {
    let cluster = spawn_cluster().await;
    let session = SsoSession::connect(&cluster.issuer_url).await.unwrap();
    session
        .register(&["http://127.0.0.1:7777/callback"], "workflow-tests")
        .await
        .unwrap();

    let outcome = session
        .login_as("james_smith", "http://127.0.0.1:7777/callback", "s")
        .await
        .unwrap();
    let code = match outcome {
        LoginOutcome::Code { code, state } => {
            assert_eq!(state, "s");
            code
        }
        LoginOutcome::Denied { error, .. } => panic!("unexpected denial: {}", error),
    };

    session.exchange(&code).await.expect("first exchange");
    assert!(session.exchange(&code).await.is_err(), "replayed code must fail");
}

#[tokio::test]
async fn test_token_rejected_by_server_outside_audience() {
    let cluster = spawn_cluster().await;
    let unregistered_url = spawn_unregistered_resource_server(&cluster.issuer_url).await;

    let session = authenticated_session(&cluster.issuer_url, "linda_baker").await;

    // Registered server accepts the token.
    let ticketing = ResourceClient::new(session.clone(), &cluster.ticketing_url);
    let reply = ticketing.call_tool("whoami", json!({})).await.unwrap();
    assert!(reply.status.is_success());

    // A server whose canonical URL is not in `aud` rejects the same valid
    // token outright, with a generic message.
    let outsider = ResourceClient::new(session, &unregistered_url);
    let reply = outsider.call_tool("whoami", json!({})).await.unwrap();
    assert_eq!(reply.status, reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "Token verification failed");
}

#[tokio::test]
async fn test_expired_access_token_is_rejected() {
    let cluster = spawn_cluster_with_token_ttl(-10).await;
    let session = authenticated_session(&cluster.issuer_url, "linda_baker").await;

    // The login and exchange succeed; only presentation fails, with the same
    // generic message as any other verification failure.
    let reply = ResourceClient::new(session, &cluster.ticketing_url)
        .call_tool("whoami", json!({}))
        .await
        .unwrap();
    assert_eq!(reply.status, reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "Token verification failed");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let cluster = spawn_cluster().await;

    let response = reqwest::Client::new()
        .post(format!("{}/tools/whoami", cluster.ticketing_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_org_scoped_access_linda_allowed_paul_denied() {
    let cluster = spawn_cluster().await;

    let linda = authenticated_session(&cluster.issuer_url, "linda_baker").await;
    let reply = ResourceClient::new(linda, &cluster.organizations_url)
        .call_tool(
            "get_organization_users",
            json!({ "organization": "Dallas_Police" }),
        )
        .await
        .unwrap();
    assert_eq!(
        reply.body["users"],
        json!(["james_smith", "linda_baker", "terry_jobs"])
    );

    let paul = authenticated_session(&cluster.issuer_url, "paul_morgan").await;
    let reply = ResourceClient::new(paul, &cluster.organizations_url)
        .call_tool(
            "get_organization_users",
            json!({ "organization": "Dallas_Police" }),
        )
        .await
        .unwrap();
    assert!(reply.status.is_success(), "denial is a payload, not an HTTP error");
    assert_eq!(
        reply.tool_error(),
        Some("User does not have permission to use this tool for the given organization")
    );
}

#[tokio::test]
async fn test_admin_passes_every_org_scoped_check() {
    let cluster = spawn_cluster().await;
    let admin = authenticated_session(&cluster.issuer_url, "admin").await;
    let organizations = ResourceClient::new(admin.clone(), &cluster.organizations_url);

    for organization in ["Dallas_Police", "Allen_Firestation"] {
        let reply = organizations
            .call_tool(
                "get_organization_users",
                json!({ "organization": organization }),
            )
            .await
            .unwrap();
        assert!(reply.tool_error().is_none(), "admin denied for {}", organization);
    }

    let reply = organizations
        .call_tool("get_organizations", json!({}))
        .await
        .unwrap();
    assert_eq!(reply.body["Dallas_Police"]["region"], "south");
}

#[tokio::test]
async fn test_compare_user_permissions_end_to_end() {
    let cluster = spawn_cluster().await;
    let linda = authenticated_session(&cluster.issuer_url, "linda_baker").await;
    let organizations = ResourceClient::new(linda, &cluster.organizations_url);

    let reply = organizations
        .call_tool(
            "compare_user_permissions",
            json!({
                "organization": "Dallas_Police",
                "usernames": ["james_smith", "linda_baker"]
            }),
        )
        .await
        .unwrap();

    assert_eq!(reply.body["shared_permissions"], json!(["view_agency_users"]));
    assert_eq!(
        reply.body["unique_to_james_smith"],
        json!(["view_agency_tickets"])
    );
    assert_eq!(reply.body["unique_to_linda_baker"], json!([]));
}

#[tokio::test]
async fn test_ticket_lifecycle_with_role_checks() {
    let cluster = spawn_cluster().await;

    let linda = authenticated_session(&cluster.issuer_url, "linda_baker").await;
    let linda_tickets = ResourceClient::new(linda, &cluster.ticketing_url);

    let reply = linda_tickets
        .call_tool(
            "create_ticket",
            json!({ "title": "radio outage", "description": "no signal downtown" }),
        )
        .await
        .unwrap();
    let ticket_id = reply.body["ticket_id"].as_u64().expect("ticket id");

    // Non-admin cannot resolve.
    let reply = linda_tickets
        .call_tool(
            "resolve_ticket",
            json!({ "ticket_id": ticket_id, "resolution": "self-service" }),
        )
        .await
        .unwrap();
    assert_eq!(
        reply.tool_error(),
        Some("User does not have permission to use this tool")
    );

    // Admin resolves it.
    let admin = authenticated_session(&cluster.issuer_url, "admin").await;
    let admin_tickets = ResourceClient::new(admin, &cluster.ticketing_url);
    let reply = admin_tickets
        .call_tool(
            "resolve_ticket",
            json!({ "ticket_id": ticket_id, "resolution": "tower rebooted" }),
        )
        .await
        .unwrap();
    assert_eq!(
        reply.body["message"],
        format!("Ticket {} resolved", ticket_id)
    );

    // Owner sees the resolution.
    let reply = linda_tickets
        .call_tool("tickets_by_user", json!({}))
        .await
        .unwrap();
    assert_eq!(reply.body["tickets"][0]["status"], "resolved");
    assert_eq!(reply.body["tickets"][0]["resolved_by"], "admin");
}
