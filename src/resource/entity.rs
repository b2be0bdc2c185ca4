//! Entity and field mapper abstractions
//!
//! The CRUD engine is generic over these two traits: an [`Entity`] is the wire
//! struct of one Konnect entity type together with its path template, and a
//! [`FieldMapper`] translates between that struct and a [`ResourceData`].

use super::data::ResourceData;
use super::path::PathTemplate;
use crate::error::CrudError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Debug;

/// Server-owned fields that never go out in an update body
pub const DEFAULT_IMMUTABLE_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Field holding the runtime group id in every [`ResourceData`]
pub const RUNTIME_GROUP_FIELD: &str = "runtime_group_id";

pub trait Entity: Serialize + DeserializeOwned + Debug + Send + Sync {
    /// Singular kind name, used in logs and computed field names
    const KIND: &'static str;
    const PATH: PathTemplate;
    /// Top-level body keys stripped from update requests
    const IMMUTABLE_FIELDS: &'static [&'static str] = DEFAULT_IMMUTABLE_FIELDS;

    /// Runtime group the entity belongs to. Not part of the wire format.
    fn scope_id(&self) -> &str;
    fn set_scope_id(&mut self, scope_id: String);
    /// Server assigned id, unset before creation
    fn id(&self) -> Option<&str>;
}

pub trait FieldMapper: Send + Sync {
    type Entity: Entity;

    /// Build the entity from the local record for a create request
    fn to_wire(&self, data: &ResourceData) -> Result<Self::Entity, CrudError>;

    /// Build the entity for an update request. Full replacement: fields
    /// absent from `data` are not merged with remote state.
    fn to_wire_update(&self, data: &ResourceData) -> Result<Self::Entity, CrudError> {
        self.to_wire(data)
    }

    /// Write the entity's fields back into the local record
    fn from_wire(&self, entity: &Self::Entity, data: &mut ResourceData) -> Result<(), CrudError>;
}

/// List response envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct EntityCollection<T> {
    #[serde(rename = "data", default)]
    pub items: Vec<T>,
}

/// Name of the computed field holding the bare entity id, e.g. `route_id`
pub fn computed_id_field<E: Entity>() -> String {
    format!("{}_id", E::KIND)
}

/// Runtime group id from the record, required for every operation
pub fn require_scope(data: &ResourceData) -> Result<String, CrudError> {
    data.try_str(RUNTIME_GROUP_FIELD)?
        .map(String::from)
        .ok_or_else(|| CrudError::Validation(format!("{RUNTIME_GROUP_FIELD} is required")))
}

/// Deserialize `null` as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
