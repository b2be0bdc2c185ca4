//! Konnect API interaction module
//!
//! This module provides the transport used by the resource engine: access
//! token handling, the HTTP client and the regional API client.
//!
//! # Module Structure
//!
//! - [`auth`] - Access token lookup
//! - [`client`] - Main Konnect client, the production [`http::Transport`]
//! - [`http`] - HTTP utilities and the transport trait
//!
//! # Example
//!
//! ```ignore
//! use konnect_sync::konnect::{auth::KonnectCredentials, client::KonnectClient};
//!
//! fn example() -> anyhow::Result<KonnectClient> {
//!     let credentials = KonnectCredentials::from_env();
//!     Ok(KonnectClient::new("https://eu.api.konghq.com", credentials, None)?)
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
