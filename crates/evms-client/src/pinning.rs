//! Content pinning with a primary and an optional secondary provider.
//!
//! The primary provider (a Walrus IPFS gateway) is always tried. The
//! secondary (Pinata) is tried only if the primary fails and its
//! credentials are configured, and then exactly once.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use crate::config::{PinataCredentials, PinningConfig};

/// A file to pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file; the upload name is its final path component.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());
        Ok(Self { file_name, bytes })
    }

    fn form(&self) -> Form {
        Form::new().part(
            "file",
            Part::bytes(self.bytes.clone()).file_name(self.file_name.clone()),
        )
    }
}

/// Content hash returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedContent {
    pub hash: String,
    /// Name of the provider that pinned it.
    pub provider: String,
}

/// A failed pin attempt at one provider.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// The provider could not be reached.
    #[error("network error contacting {provider}: {source}")]
    Network {
        provider: String,
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("server error from {provider} ({status}): {message}")]
    Server {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider answered 2xx without a usable content hash.
    #[error("{provider} returned no content hash: {reason}")]
    MalformedResponse { provider: String, reason: String },
}

impl PinError {
    pub fn provider(&self) -> &str {
        match self {
            Self::Network { provider, .. }
            | Self::Server { provider, .. }
            | Self::MalformedResponse { provider, .. } => provider,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// What happened at the secondary provider after the primary failed.
#[derive(Debug)]
pub enum SecondaryOutcome {
    /// No credentials are configured, so no attempt was made.
    Unconfigured,
    Failed(PinError),
}

impl std::fmt::Display for SecondaryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "no fallback provider configured"),
            Self::Failed(e) => write!(f, "fallback also failed: {e}"),
        }
    }
}

/// Every configured provider failed.
#[derive(Debug, thiserror::Error)]
#[error("error uploading file: {primary}; {secondary}")]
pub struct UploadError {
    #[source]
    pub primary: PinError,
    pub secondary: SecondaryOutcome,
}

/// A remote service that pins a file and returns its content hash.
#[async_trait]
pub trait PinningProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn pin(&self, file: &UploadFile) -> Result<String, PinError>;
}

/// Walrus IPFS gateway: `POST {endpoint}/upload` with a bearer token.
#[derive(Clone)]
pub struct WalrusIpfsProvider {
    http: reqwest::Client,
    upload_url: String,
    api_key: Zeroizing<String>,
}

impl WalrusIpfsProvider {
    pub const NAME: &'static str = "walrus";

    pub fn new(http: reqwest::Client, endpoint: &Url, api_key: Zeroizing<String>) -> Self {
        Self {
            http,
            upload_url: format!("{}/upload", endpoint.as_str().trim_end_matches('/')),
            api_key,
        }
    }
}

impl std::fmt::Debug for WalrusIpfsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalrusIpfsProvider")
            .field("upload_url", &self.upload_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl PinningProvider for WalrusIpfsProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn pin(&self, file: &UploadFile) -> Result<String, PinError> {
        let request = self
            .http
            .post(&self.upload_url)
            .bearer_auth(self.api_key.as_str())
            .multipart(file.form());
        send_pin(Self::NAME, request).await
    }
}

/// Pinata: `POST {endpoint}` with key headers.
#[derive(Clone)]
pub struct PinataProvider {
    http: reqwest::Client,
    endpoint: Url,
    credentials: PinataCredentials,
}

impl PinataProvider {
    pub const NAME: &'static str = "pinata";

    pub fn new(http: reqwest::Client, endpoint: Url, credentials: PinataCredentials) -> Self {
        Self {
            http,
            endpoint,
            credentials,
        }
    }
}

impl std::fmt::Debug for PinataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataProvider")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[async_trait]
impl PinningProvider for PinataProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn pin(&self, file: &UploadFile) -> Result<String, PinError> {
        let request = self
            .http
            .post(self.endpoint.clone())
            .header("pinata_api_key", self.credentials.api_key.as_str())
            .header("pinata_secret_api_key", self.credentials.secret_key.as_str())
            .multipart(file.form());
        send_pin(Self::NAME, request).await
    }
}

async fn send_pin(provider: &str, request: reqwest::RequestBuilder) -> Result<String, PinError> {
    tracing::debug!(provider, "pinning file");
    let resp = request.send().await.map_err(|e| PinError::Network {
        provider: provider.into(),
        source: e,
    })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PinError::Server {
            provider: provider.into(),
            status: status.as_u16(),
            message: server_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").into()),
        });
    }

    let malformed = |reason: String| PinError::MalformedResponse {
        provider: provider.into(),
        reason,
    };
    let body: Value = resp.json().await.map_err(|e| malformed(e.to_string()))?;
    match body.get("IpfsHash").and_then(Value::as_str).map(str::trim) {
        Some(hash) if !hash.is_empty() => Ok(hash.to_string()),
        _ => Err(malformed("response has no IpfsHash".into())),
    }
}

/// Best human-readable message in an error body: `message`, then `error`
/// (string or `{reason, details}`), then the raw text.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
    text(json.get("message"))
        .or_else(|| text(json.get("error")))
        .or_else(|| text(json.pointer("/error/details")))
        .or_else(|| text(json.pointer("/error/reason")))
        .or_else(|| Some(trimmed.to_string()))
}

/// Pins files through the primary provider, falling back to the secondary.
#[derive(Clone)]
pub struct ContentUploader {
    primary: Arc<dyn PinningProvider>,
    secondary: Option<Arc<dyn PinningProvider>>,
}

impl std::fmt::Debug for ContentUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentUploader")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl ContentUploader {
    pub fn new(
        primary: Arc<dyn PinningProvider>,
        secondary: Option<Arc<dyn PinningProvider>>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Walrus as primary; Pinata as secondary when its credentials are set.
    pub fn from_config(http: reqwest::Client, config: &PinningConfig) -> Self {
        let primary = Arc::new(WalrusIpfsProvider::new(
            http.clone(),
            &config.walrus_endpoint,
            config.walrus_api_key.clone(),
        ));
        let secondary = config.pinata.clone().map(|credentials| {
            Arc::new(PinataProvider::new(
                http,
                config.pinata_endpoint.clone(),
                credentials,
            )) as Arc<dyn PinningProvider>
        });
        Self::new(primary, secondary)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub async fn upload(&self, file: &UploadFile) -> Result<PinnedContent, UploadError> {
        let primary = match self.primary.pin(file).await {
            Ok(hash) => {
                return Ok(PinnedContent {
                    hash,
                    provider: self.primary.name().to_string(),
                })
            }
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            tracing::error!(file = %file.file_name, "upload failed and no fallback is configured: {primary}");
            return Err(UploadError {
                primary,
                secondary: SecondaryOutcome::Unconfigured,
            });
        };

        tracing::warn!(
            file = %file.file_name,
            fallback = secondary.name(),
            "primary upload failed, trying fallback: {primary}"
        );
        match secondary.pin(file).await {
            Ok(hash) => Ok(PinnedContent {
                hash,
                provider: secondary.name().to_string(),
            }),
            Err(e) => {
                tracing::error!(file = %file.file_name, "fallback upload failed: {e}");
                Err(UploadError {
                    primary,
                    secondary: SecondaryOutcome::Failed(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_message_field() {
        assert_eq!(
            server_message(r#"{"message":"quota exceeded","error":"x"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            server_message(r#"{"error":{"reason":"INVALID_CREDENTIALS","details":"bad key"}}"#)
                .as_deref(),
            Some("bad key")
        );
        assert_eq!(server_message("gateway down").as_deref(), Some("gateway down"));
        assert_eq!(server_message("  "), None);
    }

    #[test]
    fn walrus_upload_url_appends_path() {
        let endpoint = Url::parse("https://api.walrus.sui.io/1/ipfs/").unwrap();
        let provider =
            WalrusIpfsProvider::new(reqwest::Client::new(), &endpoint, Zeroizing::new(String::new()));
        assert_eq!(provider.upload_url, "https://api.walrus.sui.io/1/ipfs/upload");
    }

    #[test]
    fn upload_error_reports_both_providers() {
        let err = UploadError {
            primary: PinError::Server {
                provider: "walrus".into(),
                status: 502,
                message: "bad gateway".into(),
            },
            secondary: SecondaryOutcome::Unconfigured,
        };
        assert_eq!(
            err.to_string(),
            "error uploading file: server error from walrus (502): bad gateway; no fallback provider configured"
        );
    }
}
