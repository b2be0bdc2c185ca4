//! Services
//!
//! Upstream APIs that routes forward to. Routes only ever hold a service's id;
//! the engine does not follow the reference.

use super::data::ResourceData;
use super::entity::{computed_id_field, require_scope, Entity, FieldMapper, RUNTIME_GROUP_FIELD};
use super::path::PathTemplate;
use crate::error::CrudError;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(skip)]
    pub runtime_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_timeout: Option<u64>,
    #[serde(default = "enabled_default", deserialize_with = "null_as_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

fn enabled_default() -> bool {
    true
}

fn null_as_enabled<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Option::<bool>::deserialize(deserializer).map(|v| v.unwrap_or_else(enabled_default))
}

impl Entity for Service {
    const KIND: &'static str = "service";
    const PATH: PathTemplate = PathTemplate::core_entity("services");

    fn scope_id(&self) -> &str {
        &self.runtime_group_id
    }

    fn set_scope_id(&mut self, scope_id: String) {
        self.runtime_group_id = scope_id;
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceMapper;

impl ServiceMapper {
    fn narrow<T: TryFrom<u64>>(data: &ResourceData, key: &str) -> Result<Option<T>, CrudError> {
        data.try_u64(key)?
            .map(|v| {
                T::try_from(v).map_err(|_| CrudError::Validation(format!("{key} out of range: {v}")))
            })
            .transpose()
    }
}

impl FieldMapper for ServiceMapper {
    type Entity = Service;

    fn to_wire(&self, data: &ResourceData) -> Result<Service, CrudError> {
        let host = data
            .try_str("host")?
            .ok_or_else(|| CrudError::Validation("service host is required".to_string()))?;

        Ok(Service {
            runtime_group_id: require_scope(data)?,
            id: None,
            name: data.try_str("name")?.map(String::from),
            protocol: data.try_str("protocol")?.map(String::from),
            host: host.to_string(),
            port: Self::narrow(data, "port")?,
            path: data.try_str("path")?.map(String::from),
            retries: Self::narrow(data, "retries")?,
            connect_timeout: data.try_u64("connect_timeout")?,
            read_timeout: data.try_u64("read_timeout")?,
            write_timeout: data.try_u64("write_timeout")?,
            enabled: data.try_bool("enabled")?.unwrap_or(true),
            tags: data.try_string_list("tags")?,
            created_at: None,
            updated_at: None,
        })
    }

    fn from_wire(&self, service: &Service, data: &mut ResourceData) -> Result<(), CrudError> {
        data.set(RUNTIME_GROUP_FIELD, service.runtime_group_id.as_str());
        data.set(&computed_id_field::<Service>(), service.id.clone());
        data.set("name", service.name.clone());
        data.set("protocol", service.protocol.clone());
        data.set("host", service.host.as_str());
        data.set("port", service.port);
        data.set("path", service.path.clone());
        data.set("retries", service.retries);
        data.set("connect_timeout", service.connect_timeout);
        data.set("read_timeout", service.read_timeout);
        data.set("write_timeout", service.write_timeout);
        data.set("enabled", service.enabled);
        data.set("tags", service.tags.clone());
        data.set("created_at", service.created_at);
        data.set("updated_at", service.updated_at);
        Ok(())
    }
}
