//! Key Vault secret retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::credentials::TokenCredential;
use crate::error::{Result, SecretError};

/// Resource identifier vault tokens are scoped to.
const VAULT_RESOURCE: &str = "https://vault.azure.net";
const VAULT_API_VERSION: &str = "7.4";

/// Named-secret lookup.
///
/// `KeyVaultClient` is the production implementation; tests substitute fakes.
#[async_trait]
pub trait SecretSource: Send + Sync + 'static {
    async fn get_secret(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

impl SecretBundle {
    fn into_value(self) -> Result<String> {
        self.value.ok_or(SecretError::MissingValue)
    }
}

/// Thin client for the vault's `GET /secrets/{name}` endpoint.
///
/// Secret values are returned to the caller and never logged here.
pub struct KeyVaultClient {
    vault_url: String,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

impl KeyVaultClient {
    pub fn new(vault_url: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            vault_url: vault_url.into(),
            credential,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SecretSource for KeyVaultClient {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let token = self.credential.token(VAULT_RESOURCE).await?;
        let url = format!("{}/secrets/{}", self.vault_url, name);

        let response = self
            .http
            .get(&url)
            .query(&[("api-version", VAULT_API_VERSION)])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SecretError::Secret {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let bundle: SecretBundle = response.json().await?;
        bundle.into_value()
    }
}
