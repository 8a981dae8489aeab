//! taskvault-core: how the backend gets from "nothing" to a usable database URL.
//!
//! The pieces, in the order they are used at startup:
//! - credential discovery (`credentials`) yields a bearer-token source
//! - the Key Vault client (`keyvault`) fetches the named connection secret
//! - the builder (`connstring`) turns the raw secret into a driver-qualified URL

pub mod config;
pub mod connstring;
pub mod credentials;
pub mod error;
pub mod keyvault;

pub use error::{Result, SecretError};
