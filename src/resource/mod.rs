//! Resource lifecycle layer
//!
//! Maps locally declared Konnect entities onto the REST API and keeps the
//! local record in sync with the server.
//!
//! # Architecture
//!
//! - [`id`] - Composite `runtime_group::entity` identifiers
//! - [`path`] - Collection and item request paths
//! - [`data`] - The local record the engine reads and writes back
//! - [`entity`] - Entity and field mapper traits
//! - [`engine`] - The create/read/update/delete state machine
//! - [`route`], [`consumer`], [`service`] - Concrete entity types
//! - [`dispatch`] - Runtime kind to typed engine call mapping
//! - [`registry`] - Display metadata loaded from embedded JSON
//!
//! # Example
//!
//! ```ignore
//! use konnect_sync::resource::{CrudEngine, ResourceData, RouteMapper};
//!
//! async fn create_route(client: KonnectClient) -> anyhow::Result<()> {
//!     let engine = CrudEngine::new(client);
//!     let mut record = ResourceData::new();
//!     record.set("runtime_group_id", "g1");
//!     record.set("paths", vec!["/foo"]);
//!     engine.create(&RouteMapper, &mut record).await?;
//!     println!("bound to {}", record.id().unwrap_or("-"));
//!     Ok(())
//! }
//! ```

pub mod consumer;
pub mod data;
pub mod dispatch;
pub mod engine;
pub mod entity;
pub mod id;
pub mod path;
pub mod registry;
pub mod route;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use consumer::{Consumer, ConsumerMapper};
pub use data::ResourceData;
pub use dispatch::ResourceKind;
pub use engine::CrudEngine;
pub use entity::{Entity, EntityCollection, FieldMapper, RUNTIME_GROUP_FIELD};
pub use id::{decode_id, encode_id, CompositeId, ID_SEPARATOR};
pub use path::{PathTemplate, ResourceOperation};
pub use route::{Route, RouteMapper, ServiceRef};
pub use service::{Service, ServiceMapper};
