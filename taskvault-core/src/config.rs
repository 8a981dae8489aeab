use std::env;

/// Vault the deployment keeps its database credential in.
pub const DEFAULT_VAULT_NAME: &str = "team1-key-vault-prz";

/// Name of the secret holding the database connection string.
pub const DEFAULT_SECRET_NAME: &str = "AZURE-SQL-CONNECTION-STRING";

/// Vault and secret names, resolved once at startup.
///
/// Env vars override the deployment defaults; nothing is read lazily at
/// request time.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub vault_name: String,
    pub secret_name: String,
}

impl VaultConfig {
    /// Resolve from `TASKVAULT_VAULT_NAME` / `TASKVAULT_SECRET_NAME`,
    /// falling back to the deployment defaults.
    pub fn from_env() -> Self {
        Self {
            vault_name: env::var("TASKVAULT_VAULT_NAME")
                .unwrap_or_else(|_| DEFAULT_VAULT_NAME.to_string()),
            secret_name: env::var("TASKVAULT_SECRET_NAME")
                .unwrap_or_else(|_| DEFAULT_SECRET_NAME.to_string()),
        }
    }

    /// Base URL of the vault, e.g. `https://team1-key-vault-prz.vault.azure.net`.
    pub fn vault_url(&self) -> String {
        format!("https://{}.vault.azure.net", self.vault_name)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_name: DEFAULT_VAULT_NAME.to_string(),
            secret_name: DEFAULT_SECRET_NAME.to_string(),
        }
    }
}
