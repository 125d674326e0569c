//! OAuth2 installed-app authorisation and Gmail hub construction

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::env;
use std::path::Path;
use tracing::{debug, info};
use yup_oauth2::ApplicationSecret;

use crate::error::{LabelerError, Result};

/// Read messages, list/create labels and add labels to messages.
/// Never grants permanent deletion.
pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Scopes requested when the token is first obtained
pub const REQUIRED_SCOPES: &[&str] = &[GMAIL_SCOPE];

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";

/// Gmail hub over a rustls HTTPS connector
pub type GmailHub = Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Authorise against Gmail and build the API hub
///
/// A browser consent round-trip happens only when `token_cache_path` holds no
/// usable refresh token. Tokens are written back to that file and refreshed
/// automatically afterwards. The client registration comes from
/// `credentials_path`, see [`resolve_application_secret`].
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<GmailHub> {
    let secret = resolve_application_secret(credentials_path).await?;

    if let Some(parent) = token_cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    // Consent is collected through a loopback redirect
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| LabelerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Obtain the token up front so an expired or revoked grant fails here,
    // before any message is touched
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| LabelerError::AuthError(format!("Failed to obtain token: {}", e)))?;

    if tokio::fs::try_exists(token_cache_path).await.unwrap_or(false) {
        secure_token_file(token_cache_path).await?;
    }
    info!("Authenticated with Gmail (token cache: {})", token_cache_path.display());

    // google-gmail1 talks HTTP/1.1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| LabelerError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Locate the OAuth2 client registration
///
/// The credentials file wins when it exists; otherwise `GMAIL_CLIENT_ID` and
/// `GMAIL_CLIENT_SECRET` are used. Neither present is an authentication error.
pub async fn resolve_application_secret(credentials_path: &Path) -> Result<ApplicationSecret> {
    if tokio::fs::try_exists(credentials_path).await.unwrap_or(false) {
        debug!("Reading client registration from {}", credentials_path.display());
        return yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| LabelerError::AuthError(format!("Failed to read credentials: {}", e)));
    }

    load_credentials_from_env().map_err(|_| {
        LabelerError::AuthError(format!(
            "No client registration found: {} does not exist and GMAIL_CLIENT_ID/GMAIL_CLIENT_SECRET are not set",
            credentials_path.display()
        ))
    })
}

/// Build the client registration from `GMAIL_CLIENT_ID` and
/// `GMAIL_CLIENT_SECRET`, with an optional `GMAIL_REDIRECT_URI`
pub fn load_credentials_from_env() -> Result<ApplicationSecret> {
    let client_id = env::var("GMAIL_CLIENT_ID")
        .map_err(|_| LabelerError::ConfigError("GMAIL_CLIENT_ID not set".to_string()))?;
    let client_secret = env::var("GMAIL_CLIENT_SECRET")
        .map_err(|_| LabelerError::ConfigError("GMAIL_CLIENT_SECRET not set".to_string()))?;
    let redirect_uri = env::var("GMAIL_REDIRECT_URI")
        .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());

    Ok(ApplicationSecret {
        client_id,
        client_secret,
        auth_uri: GOOGLE_AUTH_URI.to_string(),
        token_uri: GOOGLE_TOKEN_URI.to_string(),
        redirect_uris: vec![redirect_uri],
        ..Default::default()
    })
}

/// Forget the cached token so the next authentication asks for a fresh grant
pub async fn clear_token_cache(token_cache_path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(token_cache_path).await {
        Ok(()) => {
            info!("Removed cached token {}", token_cache_path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Restrict the token file to its owner (0600)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows protects the file through ACLs inherited from the user profile
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
