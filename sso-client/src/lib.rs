//! sso-client: client-side OAuth negotiation shared across resource servers.
//!
//! One [`SsoSession`] runs the authorization-code flow against the mock
//! authorization server and owns the resulting multi-audience token. Every
//! [`ResourceClient`] adapter borrows the same session, so a single login
//! authorizes calls to all registered resource servers.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    pub authorization_endpoint: String,
    pub issuer: String,
    pub jwks_uri: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
}

/// Outcome of a login submission, read back from the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Code { code: String, state: String },
    Denied { error: String, state: String },
}

/// A single OAuth session against one authorization server.
///
/// Redirects are never followed automatically: the authorization code and the
/// echoed `state` are parsed out of the `Location` header, the way a
/// loopback-redirect client consumes the front channel.
pub struct SsoSession {
    http: reqwest::Client,
    endpoints: DiscoveryDocument,
    client_id: RwLock<Option<String>>,
    token: RwLock<Option<String>>,
}

impl SsoSession {
    /// Fetch the discovery document and prepare a session.
    pub async fn connect(issuer_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        let endpoints: DiscoveryDocument = http
            .get(format!("{}/.well-known/oauth-authorization-server", issuer_url))
            .send()
            .await
            .context("Failed to fetch discovery document")?
            .error_for_status()?
            .json()
            .await
            .context("Malformed discovery document")?;

        tracing::debug!(issuer = %endpoints.issuer, "SSO session connected");

        Ok(Self {
            http,
            endpoints,
            client_id: RwLock::new(None),
            token: RwLock::new(None),
        })
    }

    pub fn endpoints(&self) -> &DiscoveryDocument {
        &self.endpoints
    }

    /// Dynamic client registration.
    pub async fn register(&self, redirect_uris: &[&str], client_name: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct RegistrationResponse {
            client_id: String,
        }

        let response: RegistrationResponse = self
            .http
            .post(&self.endpoints.registration_endpoint)
            .json(&serde_json::json!({
                "redirect_uris": redirect_uris,
                "client_name": client_name,
            }))
            .send()
            .await
            .context("Registration request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Malformed registration response")?;

        *self.client_id.write().await = Some(response.client_id.clone());
        Ok(response.client_id)
    }

    /// Run the front channel: `GET /auth` redirects to the login endpoint,
    /// then the login form is submitted and the outcome read back from the
    /// final redirect.
    pub async fn login_as(
        &self,
        user_id: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<LoginOutcome> {
        let client_id = self
            .client_id
            .read()
            .await
            .clone()
            .unwrap_or_else(|| "sso-client".to_string());

        let query = serde_urlencoded::to_string([
            ("client_id", client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ])?;
        let response = self
            .http
            .get(format!(
                "{}?{}",
                self.endpoints.authorization_endpoint, query
            ))
            .send()
            .await
            .context("Authorization request failed")?;

        let login_url = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Authorization endpoint did not redirect to login"))?;
        let login_url = login_url
            .split_once('?')
            .map(|(base, _)| base)
            .unwrap_or(login_url)
            .to_string();

        let response = self
            .http
            .post(&login_url)
            .form(&[
                ("user_id", user_id),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ])
            .send()
            .await
            .context("Login request failed")?;

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Login response carried no redirect"))?;

        parse_redirect(location)
    }

    /// Exchange an authorization code; the resulting token becomes visible to
    /// every adapter holding this session.
    pub async fn exchange(&self, code: &str) -> Result<()> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response: TokenResponse = self
            .http
            .post(&self.endpoints.token_endpoint)
            .form(&[("code", code)])
            .send()
            .await
            .context("Token request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Malformed token response")?;

        *self.token.write().await = Some(response.access_token);
        tracing::debug!("access token stored for session");
        Ok(())
    }

    /// Convenience: register, log in and exchange in one step.
    pub async fn authenticate(&self, user_id: &str) -> Result<()> {
        let redirect_uri = "http://127.0.0.1:7777/callback";
        self.register(&[redirect_uri], "sso-client").await?;

        match self.login_as(user_id, redirect_uri, "sso-session").await? {
            LoginOutcome::Code { code, .. } => self.exchange(&code).await,
            LoginOutcome::Denied { error, .. } => Err(anyhow!("Login denied: {}", error)),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

fn parse_redirect(location: &str) -> Result<LoginOutcome> {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or("");
    let params: HashMap<String, String> =
        serde_urlencoded::from_str(query).context("Malformed redirect query")?;

    let state = params.get("state").cloned().unwrap_or_default();

    if let Some(code) = params.get("code") {
        return Ok(LoginOutcome::Code {
            code: code.clone(),
            state,
        });
    }
    if let Some(error) = params.get("error") {
        return Ok(LoginOutcome::Denied {
            error: error.clone(),
            state,
        });
    }
    Err(anyhow!("Redirect carried neither code nor error"))
}

/// Reply from a tool invocation. Denials arrive as `{ "error": ... }` bodies
/// with a success status; transport-level rejections surface in `status`.
#[derive(Debug)]
pub struct ToolReply {
    pub status: reqwest::StatusCode,
    pub body: serde_json::Value,
}

impl ToolReply {
    pub fn tool_error(&self) -> Option<&str> {
        self.body.get("error").and_then(|v| v.as_str())
    }
}

/// Adapter for one resource server, borrowing the shared session.
pub struct ResourceClient {
    session: Arc<SsoSession>,
    base_url: String,
    http: reqwest::Client,
}

impl ResourceClient {
    pub fn new(session: Arc<SsoSession>, base_url: &str) -> Self {
        Self {
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Invoke a tool with the session's bearer token.
    pub async fn call_tool(&self, name: &str, body: serde_json::Value) -> Result<ToolReply> {
        let token = self
            .session
            .access_token()
            .await
            .ok_or_else(|| anyhow!("Session is not authenticated"))?;

        let response = self
            .http
            .post(format!("{}/tools/{}", self.base_url, name))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Tool call {} failed", name))?;

        let status = response.status();
        let body = response
            .json()
            .await
            .unwrap_or(serde_json::Value::Null);

        Ok(ToolReply { status, body })
    }
}
