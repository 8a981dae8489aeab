//! Credential providers for Azure resources.
//!
//! Discovery is explicit and happens once at startup: environment-based
//! client credentials win when configured, otherwise the workload falls back
//! to the managed identity endpoint. A static variant exists for tests and
//! local development against emulators.

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, SecretError};

const AAD_AUTHORITY: &str = "https://login.microsoftonline.com";
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Issues bearer tokens scoped to an Azure resource.
#[async_trait]
pub trait TokenCredential: Send + Sync + 'static {
    async fn token(&self, resource: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client-credentials grant driven by `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`
/// and `AZURE_CLIENT_SECRET`.
pub struct EnvironmentCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl EnvironmentCredential {
    /// Errors name the first missing variable so startup failures are actionable.
    pub fn from_env() -> Result<Self> {
        let read =
            |key: &str| env::var(key).map_err(|_| SecretError::MissingCredentials(key.to_string()));
        Ok(Self {
            tenant_id: read("AZURE_TENANT_ID")?,
            client_id: read("AZURE_CLIENT_ID")?,
            client_secret: read("AZURE_CLIENT_SECRET")?,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    async fn token(&self, resource: &str) -> Result<String> {
        let url = format!("{AAD_AUTHORITY}/{}/oauth2/v2.0/token", self.tenant_id);
        let scope = format!("{resource}/.default");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self.http.post(&url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(SecretError::Token {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.access_token)
    }
}

/// Token from the instance metadata service (Azure-hosted workloads).
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
}

impl ManagedIdentityCredential {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn token(&self, resource: &str) -> Result<String> {
        let response = self
            .http
            .get(IMDS_TOKEN_ENDPOINT)
            .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)])
            .header("Metadata", "true")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SecretError::Token {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.access_token)
    }
}

/// Fixed token, for tests and local development.
pub struct StaticTokenCredential(pub String);

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _resource: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Startup-phase credential discovery.
///
/// Logs which provider was selected; a partially configured environment is
/// reported instead of silently ignored.
pub fn default_credential() -> Arc<dyn TokenCredential> {
    match EnvironmentCredential::from_env() {
        Ok(credential) => {
            info!("using environment credential (client credentials grant)");
            Arc::new(credential)
        }
        Err(reason) => {
            info!(%reason, "environment credential unavailable, using managed identity");
            Arc::new(ManagedIdentityCredential::new())
        }
    }
}
