//! konnect-sync
//!
//! Keeps locally declared Kong Konnect entities (services, routes, consumers)
//! in sync with the Konnect REST API.
//!
//! - [`resource`] - Composite ids, path building and the CRUD engine
//! - [`konnect`] - Transport: credentials, HTTP client, regional API client
//! - [`sync`] - Manifest and state file handling on top of the engine
//! - [`config`] - Persistent user configuration

pub mod config;
pub mod error;
pub mod konnect;
pub mod resource;
pub mod sync;

pub use error::{CrudError, RequestError, TransportError};
