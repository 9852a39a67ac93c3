// File: crates/fitgap_gcal/src/auth.rs
use fitgap_config::GcalConfig;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use hyper_util::rt::TokioExecutor;
use std::path::Path;
use thiserror::Error;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing key_path in GcalConfig")]
    MissingKeyPath,
    #[error("Failed to read service account key: {0}")]
    KeyFile(#[from] std::io::Error),
    #[error("Failed to build TLS connector: {0}")]
    Tls(String),
}

/// How a request authenticates against Google Calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// OAuth access token forwarded from the caller.
    Bearer(&'a str),
    /// The server's configured service account.
    ServiceAccount,
}

fn https_connector() -> Result<Connector, AuthError> {
    Ok(HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| AuthError::Tls(e.to_string()))?
        .https_or_http()
        .enable_http1()
        .build())
}

/// Hub authenticated with the configured service account key.
pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, AuthError> {
    let key_path = config.key_path.as_deref().ok_or(AuthError::MissingKeyPath)?;

    let sa_key = read_service_account_key(Path::new(key_path)).await?;
    let auth = ServiceAccountAuthenticator::builder(sa_key).build().await?;

    let client = Client::builder(TokioExecutor::new()).build(https_connector()?);
    Ok(CalendarHub::new(client, auth))
}

/// Hub that sends a caller-supplied access token as is. Google rejects it
/// with 401 once it expires; the token is never refreshed here.
pub fn create_token_hub(access_token: &str) -> Result<HubType, AuthError> {
    let client = Client::builder(TokioExecutor::new()).build(https_connector()?);
    Ok(CalendarHub::new(client, access_token.to_string()))
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
