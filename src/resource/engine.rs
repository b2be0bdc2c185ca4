//! CRUD Engine
//!
//! Drives the create/read/update/delete lifecycle of any [`Entity`] through
//! its [`FieldMapper`] and a [`Transport`]. A record is either unbound (no
//! composite id) or bound; the engine is the only place that moves it between
//! the two.

use super::data::ResourceData;
use super::entity::{Entity, EntityCollection, FieldMapper};
use super::id::CompositeId;
use super::path::ResourceOperation;
use crate::error::CrudError;
use crate::konnect::http::{Transport, APPLICATION_JSON};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

/// Lifecycle engine bound to one transport
#[derive(Debug, Clone)]
pub struct CrudEngine<T> {
    transport: T,
}

impl<T: Transport> CrudEngine<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create the remote entity and bind the record to it.
    ///
    /// Any failure leaves the record unbound.
    pub async fn create<M: FieldMapper>(
        &self,
        mapper: &M,
        data: &mut ResourceData,
    ) -> Result<(), CrudError> {
        let result = self.try_create(mapper, data).await;
        if result.is_err() {
            data.clear_id();
        }
        result
    }

    async fn try_create<M: FieldMapper>(
        &self,
        mapper: &M,
        data: &mut ResourceData,
    ) -> Result<(), CrudError> {
        let entity = mapper.to_wire(data)?;
        let scope_id = entity.scope_id().to_string();
        if scope_id.is_empty() {
            return Err(CrudError::Validation(format!(
                "{} has no runtime group",
                M::Entity::KIND
            )));
        }

        let body = encode_body(&entity, &[])?;
        let path = M::Entity::PATH.build(ResourceOperation::Create, &scope_id, None)?;
        let response = self
            .send(ResourceOperation::Create, &path, Some(body))
            .await?;

        let mut created: M::Entity = serde_json::from_slice(&response)?;
        // The response never carries the runtime group
        created.set_scope_id(scope_id.clone());
        let entity_id = created.id().ok_or_else(|| {
            CrudError::Validation(format!("created {} has no id", M::Entity::KIND))
        })?;
        let id = CompositeId::new(scope_id, entity_id)?;

        data.set_id(id.encode());
        mapper.from_wire(&created, data)?;
        tracing::info!("Created {} {}", M::Entity::KIND, id);
        Ok(())
    }

    /// Refresh the record from the remote entity.
    ///
    /// A 404 means the entity was deleted out of band: the record becomes
    /// unbound and the read succeeds. Any other failure also unbinds the
    /// record and is returned.
    pub async fn read<M: FieldMapper>(
        &self,
        mapper: &M,
        data: &mut ResourceData,
    ) -> Result<(), CrudError> {
        let id = bound_id(data)?;
        let path = M::Entity::PATH.build(
            ResourceOperation::Read,
            id.scope_id(),
            Some(id.entity_id()),
        )?;

        let response = match self.send(ResourceOperation::Read, &path, None).await {
            Ok(response) => response,
            Err(err) => {
                data.clear_id();
                if err.is_not_found() {
                    tracing::warn!("{} {} no longer exists, unbinding", M::Entity::KIND, id);
                    return Ok(());
                }
                return Err(err);
            }
        };

        let mut entity: M::Entity = match serde_json::from_slice(&response) {
            Ok(entity) => entity,
            Err(err) => {
                data.clear_id();
                return Err(err.into());
            }
        };
        entity.set_scope_id(id.scope_id().to_string());
        mapper.from_wire(&entity, data)?;
        tracing::debug!("Read {} {}", M::Entity::KIND, id);
        Ok(())
    }

    /// Replace the remote entity with the record's current fields.
    ///
    /// Immutable fields are stripped from the body. Failures leave the
    /// record's identity untouched, including a 404.
    pub async fn update<M: FieldMapper>(
        &self,
        mapper: &M,
        data: &mut ResourceData,
    ) -> Result<(), CrudError> {
        let id = bound_id(data)?;
        let mut entity = mapper.to_wire_update(data)?;
        entity.set_scope_id(id.scope_id().to_string());

        let body = encode_body(&entity, M::Entity::IMMUTABLE_FIELDS)?;
        let path = M::Entity::PATH.build(
            ResourceOperation::Update,
            id.scope_id(),
            Some(id.entity_id()),
        )?;
        let response = self
            .send(ResourceOperation::Update, &path, Some(body))
            .await?;

        let mut updated: M::Entity = serde_json::from_slice(&response)?;
        updated.set_scope_id(id.scope_id().to_string());
        mapper.from_wire(&updated, data)?;
        tracing::info!("Updated {} {}", M::Entity::KIND, id);
        Ok(())
    }

    /// Delete the remote entity and unbind the record.
    ///
    /// On failure the record stays bound.
    pub async fn delete<M: FieldMapper>(
        &self,
        _mapper: &M,
        data: &mut ResourceData,
    ) -> Result<(), CrudError> {
        let id = bound_id(data)?;
        let path = M::Entity::PATH.build(
            ResourceOperation::Delete,
            id.scope_id(),
            Some(id.entity_id()),
        )?;
        self.send(ResourceOperation::Delete, &path, None).await?;

        data.clear_id();
        tracing::info!("Deleted {} {}", M::Entity::KIND, id);
        Ok(())
    }

    /// Bind the record to an existing remote entity and read it.
    ///
    /// Unlike [`Self::read`], a missing entity is reported as
    /// [`CrudError::NotFound`].
    pub async fn import<M: FieldMapper>(
        &self,
        mapper: &M,
        data: &mut ResourceData,
        token: &str,
    ) -> Result<(), CrudError> {
        let id = CompositeId::decode(token)?;
        data.set_id(id.encode());
        self.read(mapper, data).await?;
        if !data.is_bound() {
            return Err(CrudError::NotFound {
                path: M::Entity::PATH.item(id.scope_id(), id.entity_id()),
            });
        }
        tracing::info!("Imported {} {}", M::Entity::KIND, id);
        Ok(())
    }

    /// List every entity of the type under `scope_id`
    pub async fn list<E: Entity>(&self, scope_id: &str) -> Result<Vec<E>, CrudError> {
        let path = E::PATH.build(ResourceOperation::List, scope_id, None)?;
        let response = self.send(ResourceOperation::List, &path, None).await?;

        let collection: EntityCollection<E> = serde_json::from_slice(&response)?;
        let mut items = collection.items;
        for item in &mut items {
            item.set_scope_id(scope_id.to_string());
        }
        tracing::debug!("Listed {} {} in {}", items.len(), E::PATH.plural(), scope_id);
        Ok(items)
    }

    async fn send(
        &self,
        op: ResourceOperation,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, CrudError> {
        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        self.transport
            .request(true, op.method(), path, &[], headers, body)
            .await
            .map_err(|err| CrudError::from_transport(err, path))
    }
}

fn bound_id(data: &ResourceData) -> Result<CompositeId, CrudError> {
    let token = data
        .id()
        .ok_or_else(|| CrudError::Validation("record is not bound".to_string()))?;
    CompositeId::decode(token)
}

/// JSON body of `entity` without the `strip` keys
fn encode_body<E: Entity>(entity: &E, strip: &[&str]) -> Result<Vec<u8>, CrudError> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(ref mut map) = value {
        for key in strip {
            map.remove(*key);
        }
    }
    Ok(serde_json::to_vec(&value)?)
}
