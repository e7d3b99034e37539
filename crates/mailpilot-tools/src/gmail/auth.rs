use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use super::GmailError;

pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
pub const DEFAULT_TOKEN_PATH: &str = ".secrets/token.json";
pub const DEFAULT_CREDENTIALS_PATH: &str = ".secrets/credentials.json";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of a bearer token for the Gmail API
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GmailError>;
}

/// Where the token cache and client secrets live.
///
/// Relative paths resolve against `base_dir`.
#[derive(Debug, Clone)]
pub struct GmailAuthConfig {
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
    pub base_dir: PathBuf,
    pub scopes: Vec<String>,
}

impl Default for GmailAuthConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            base_dir: PathBuf::from("."),
            scopes: vec![GMAIL_SEND_SCOPE.to_string()],
        }
    }
}

impl GmailAuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn resolved_token_path(&self) -> PathBuf {
        resolve(&self.base_dir, &self.token_path)
    }

    pub fn resolved_credentials_path(&self) -> PathBuf {
        resolve(&self.base_dir, &self.credentials_path)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Cached OAuth credentials, stored as JSON in the token file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Access token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl OAuthToken {
    /// An access token with no expiry, or one expiring more than a minute after `now`, is usable
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some()
            && self
                .expiry
                .map_or(true, |expiry| expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > now)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn load(path: &Path) -> Result<Option<Self>, GmailError> {
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write the token file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), GmailError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

/// OAuth client registration downloaded from Google Cloud Console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, GmailError> {
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(GmailError::CredentialsMissing {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        let file: ClientSecretsFile =
            serde_json::from_str(&raw).map_err(|e| GmailError::InvalidClientSecrets {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        file.installed
            .or(file.web)
            .ok_or_else(|| GmailError::InvalidClientSecrets {
                path: path.to_path_buf(),
                reason: "expected an \"installed\" or \"web\" section".to_string(),
            })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Gmail credentials backed by the token cache file.
///
/// Uses the cached token while valid, refreshes it when a refresh token is
/// available, and otherwise runs the installed-app flow in the browser.
pub struct GmailAuth {
    config: GmailAuthConfig,
    http: reqwest::Client,
    cached: Mutex<Option<OAuthToken>>,
}

impl GmailAuth {
    pub fn new(config: GmailAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GmailAuthConfig {
        &self.config
    }

    /// Load, refresh, or acquire credentials, writing any new token back to disk
    pub async fn credentials(&self) -> Result<OAuthToken, GmailError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.clone());
        }

        let token_path = self.config.resolved_token_path();
        let stored = OAuthToken::load(&token_path)?;

        let token = match stored {
            Some(token) if token.is_valid() => {
                tracing::debug!(path = %token_path.display(), "Using cached Gmail token");
                token
            }
            Some(token) if token.refresh_token.is_some() => {
                tracing::info!("Refreshing expired Gmail token");
                let refreshed = self.refresh(&token).await?;
                refreshed.save(&token_path)?;
                refreshed
            }
            _ => {
                let obtained = self.run_local_flow().await?;
                obtained.save(&token_path)?;
                obtained
            }
        };

        *cached = Some(token.clone());
        Ok(token)
    }

    async fn refresh(&self, token: &OAuthToken) -> Result<OAuthToken, GmailError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| GmailError::OAuth("no refresh token".to_string()))?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if let Some(client_id) = token.client_id.as_deref() {
            form.push(("client_id", client_id));
        }
        if let Some(client_secret) = token.client_secret.as_deref() {
            form.push(("client_secret", client_secret));
        }

        let payload = self.post_token_request(&token.token_uri, &form).await?;
        Ok(apply_token_response(token.clone(), payload))
    }

    async fn run_local_flow(&self) -> Result<OAuthToken, GmailError> {
        let credentials_path = self.config.resolved_credentials_path();
        let secrets = ClientSecrets::load(&credentials_path)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://localhost:{}/", port);

        let client = BasicClient::new(
            ClientId::new(secrets.client_id.clone()),
            Some(ClientSecret::new(secrets.client_secret.clone())),
            AuthUrl::new(secrets.auth_uri.clone())?,
            Some(TokenUrl::new(secrets.token_uri.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect_uri.clone())?);

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        println!("Please visit this URL to authorize this application: {}", auth_url);
        tracing::info!(port, "Waiting for OAuth redirect");

        let code = accept_redirect(listener, csrf_state.secret()).await?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ];
        let payload = self.post_token_request(&secrets.token_uri, &form).await?;

        let base = OAuthToken {
            token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: Some(secrets.client_id.clone()),
            client_secret: Some(secrets.client_secret.clone()),
            scopes: self.config.scopes.clone(),
            expiry: None,
        };
        Ok(apply_token_response(base, payload))
    }

    async fn post_token_request(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, GmailError> {
        let resp = self.http.post(token_uri).form(form).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GmailError::OAuth(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CredentialSource for GmailAuth {
    async fn access_token(&self) -> Result<String, GmailError> {
        self.credentials()
            .await?
            .token
            .ok_or_else(|| GmailError::OAuth("credentials carry no access token".to_string()))
    }
}

fn apply_token_response(mut token: OAuthToken, payload: TokenResponse) -> OAuthToken {
    token.token = Some(payload.access_token);
    token.expiry = payload
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs));
    if let Some(refresh_token) = payload.refresh_token {
        token.refresh_token = Some(refresh_token);
    }
    if let Some(scope) = payload.scope {
        token.scopes = scope.split_whitespace().map(str::to_string).collect();
    }
    token
}

#[derive(Clone)]
struct RedirectState {
    params: Arc<Mutex<Option<oneshot::Sender<HashMap<String, String>>>>>,
}

async fn handle_redirect(
    State(state): State<RedirectState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    if !params.contains_key("code") && !params.contains_key("error") {
        // favicon and other stray requests
        return (StatusCode::NOT_FOUND, "Not found");
    }
    if let Some(sender) = state.params.lock().await.take() {
        let _ = sender.send(params);
    }
    (
        StatusCode::OK,
        "The authentication flow has completed. You may close this window.",
    )
}

/// Serve the loopback redirect until one request carries a code or an error,
/// then shut the listener down and validate the redirect against `expected_state`
pub(crate) async fn accept_redirect(
    listener: TcpListener,
    expected_state: &str,
) -> Result<String, GmailError> {
    let (params_tx, params_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new()
        .fallback(handle_redirect)
        .with_state(RedirectState {
            params: Arc::new(Mutex::new(Some(params_tx))),
        });

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let received = params_rx.await;
    let _ = shutdown_tx.send(());
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "OAuth redirect listener stopped with an error"),
        Err(e) => tracing::debug!(error = %e, "OAuth redirect listener task failed"),
    }

    let mut params =
        received.map_err(|_| GmailError::OAuth("redirect listener closed before a redirect arrived".to_string()))?;

    if let Some(error) = params.remove("error") {
        return Err(GmailError::OAuth(format!("authorization denied: {}", error)));
    }
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(GmailError::OAuth("state mismatch in OAuth redirect".to_string()));
    }
    params
        .remove("code")
        .ok_or_else(|| GmailError::OAuth("missing authorization code".to_string()))
}
