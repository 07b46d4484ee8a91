use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::auth::AuthUser;
use service_core::authz::ADMIN_ROLE;
use service_core::tool::ToolResponse;

use crate::services::{Ticket, TicketStatus};
use crate::AppState;

const TOOL_DENIED: &str = "User does not have permission to use this tool";
const USERNAME_DENIED: &str =
    "User does not have permission to use this tool for the given username";

#[derive(Debug, Serialize)]
pub struct Identity {
    pub username: String,
    pub roles: Vec<String>,
    pub organizations: Vec<String>,
}

/// The caller's own identity, straight from the verified claims.
pub async fn whoami(AuthUser(claims): AuthUser) -> Json<Identity> {
    Json(Identity {
        username: claims.sub,
        roles: claims.roles,
        organizations: claims.organizations,
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub ticket_id: u64,
    pub message: String,
}

/// Submit a ticket on behalf of the calling user. Any role.
pub async fn create_ticket(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CreateTicketRequest>,
) -> Json<ToolResponse<CreateTicketResponse>> {
    if request.title.is_empty() {
        return Json(ToolResponse::error("Error, no argument given for title"));
    }
    if request.description.is_empty() {
        return Json(ToolResponse::error(
            "Error, no argument given for description",
        ));
    }

    let id = state
        .tickets
        .create(&request.title, &request.description, &claims.sub);
    tracing::info!(ticket = id, user = %claims.sub, "ticket created");

    Json(ToolResponse::Ok(CreateTicketResponse {
        ticket_id: id,
        message: format!("Ticket successfully created with id: {}", id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResolveTicketRequest {
    pub ticket_id: u64,
    #[serde(default)]
    pub resolution: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveTicketResponse {
    pub message: String,
}

/// Resolve an active ticket. Admin only.
pub async fn resolve_ticket(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<ResolveTicketRequest>,
) -> Json<ToolResponse<ResolveTicketResponse>> {
    if !state.authz.has_any_role(&claims, &[ADMIN_ROLE]) {
        return Json(ToolResponse::error(TOOL_DENIED));
    }
    if request.resolution.is_empty() {
        return Json(ToolResponse::error(
            "Error, no argument given for resolution",
        ));
    }

    match state
        .tickets
        .resolve(request.ticket_id, &request.resolution, &claims.sub)
    {
        Ok(()) => Json(ToolResponse::Ok(ResolveTicketResponse {
            message: format!("Ticket {} resolved", request.ticket_id),
        })),
        Err(err) => Json(ToolResponse::error(err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketsByUserRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<Ticket>,
}

/// Tickets created by one user. Non-admins may only view their own.
pub async fn tickets_by_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<TicketsByUserRequest>,
) -> Json<ToolResponse<TicketListResponse>> {
    let target = request.username.unwrap_or_else(|| claims.sub.clone());

    if target != claims.sub && !state.authz.has_any_role(&claims, &[ADMIN_ROLE]) {
        return Json(ToolResponse::error(USERNAME_DENIED));
    }

    Json(ToolResponse::Ok(TicketListResponse {
        tickets: state.tickets.by_user(&target),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TicketsByStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Tickets filtered by status, or all tickets. Admin only.
pub async fn tickets_by_status(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<TicketsByStatusRequest>,
) -> Json<ToolResponse<TicketListResponse>> {
    if !state.authz.has_any_role(&claims, &[ADMIN_ROLE]) {
        return Json(ToolResponse::error(TOOL_DENIED));
    }

    let status = match request.status.as_deref() {
        Some(raw) => match TicketStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return Json(ToolResponse::error(format!(
                    "Unknown ticket status: {}",
                    raw
                )))
            }
        },
        None => None,
    };

    Json(ToolResponse::Ok(TicketListResponse {
        tickets: state.tickets.by_status(status),
    }))
}
