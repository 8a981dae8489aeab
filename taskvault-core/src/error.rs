use thiserror::Error;

/// Errors raised while acquiring tokens or reading vault secrets.
#[derive(Error, Debug)]
pub enum SecretError {
    /// Transport-level failure talking to AAD or the vault
    #[error("http error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Token endpoint answered with a non-success status
    #[error("token request failed with status {status}: {detail}")]
    Token { status: u16, detail: String },

    /// Vault answered with a non-success status
    #[error("secret request failed with status {status}: {detail}")]
    Secret { status: u16, detail: String },

    /// Vault response carried no secret value
    #[error("secret response missing value")]
    MissingValue,

    /// Required environment variable absent
    #[error("missing credential configuration: {0}")]
    MissingCredentials(String),
}

/// Result type alias for taskvault-core operations
pub type Result<T> = std::result::Result<T, SecretError>;
