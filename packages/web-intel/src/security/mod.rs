//! Secure handling of credentials.

pub mod credentials;

pub use credentials::{ModelCredentials, SecretString};
