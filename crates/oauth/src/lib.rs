//! Client-credentials OAuth2 for the bol.com Retailer API.
//!
//! - [`TokenManager`] hands out a valid bearer token, reusing the stored one
//!   until it is within the validity buffer of expiring.
//! - [`ClientCredentialsFlow`] talks to the token endpoint.
//! - [`CredentialStore`] is the key-value persistence the token lives in.

pub mod error;
pub mod flow;
pub mod manager;
pub mod storage;
pub mod types;

pub use {
    flow::ClientCredentialsFlow,
    manager::{AccessTokenProvider, DEFAULT_VALIDITY_BUFFER, SharedTokenProvider, TokenManager},
    storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TOKEN_STORE_KEY},
    types::{AccessToken, Credentials, encode_credentials, serialize_secret},
};

pub use error::{Error, Result};
