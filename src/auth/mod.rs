//! Credential acquisition for the Drive API
//!
//! - `types`: `TokenSource` trait, tokens and errors
//! - `service_account`: JWT assertion flow for service-account keys
//! - `installed`: interactive OAuth with a persisted token cache
//! - `loopback`: browser consent with a localhost redirect and PKCE
//! - `oauth`: `oauth2` client and token endpoint plumbing
//! - `token_cache`: JSON token file

mod installed;
mod loopback;
mod oauth;
mod service_account;
mod token_cache;
mod types;

pub use installed::{ClientSecrets, InstalledAppTokens, TokenStage};
pub use service_account::{ServiceAccountKey, ServiceAccountTokens};
pub use types::{AccessToken, AuthError, TokenSource, DEFAULT_TOKEN_URI, DRIVE_READONLY_SCOPE};
