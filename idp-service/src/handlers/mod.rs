pub mod auth;
pub mod register;
pub mod token;
pub mod well_known;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// 302 redirect, the status OAuth2 front-channel responses conventionally use.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
