//! Routes
//!
//! A route matches incoming requests (by path, host, method, header) and
//! optionally points at the service that handles them.

use super::data::ResourceData;
use super::entity::{
    computed_id_field, null_as_default, require_scope, Entity, FieldMapper, RUNTIME_GROUP_FIELD,
};
use super::path::PathTemplate;
use crate::error::CrudError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Weak reference to a service: only its id is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(skip)]
    pub runtime_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_redirect_status_code: Option<u16>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub regex_priority: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strip_path: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_handling: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preserve_host: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_buffering: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_buffering: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Entity for Route {
    const KIND: &'static str = "route";
    const PATH: PathTemplate = PathTemplate::core_entity("routes");

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

/// Maps route records. Boolean flags default to the gateway's own defaults
/// when not declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteMapper;

impl FieldMapper for RouteMapper {
    type Entity = Route;

    fn to_wire(&self, data: &ResourceData) -> Result<Route, CrudError> {
        let headers = match data.get_ok("headers") {
            Some(value) => Some(serde_json::from_value(value.clone()).map_err(|e| {
                CrudError::Validation(format!("headers must map names to lists of values: {e}"))
            })?),
            None => None,
        };

        let https_redirect_status_code = match data.try_u64("https_redirect_status_code")? {
            Some(code) => Some(u16::try_from(code).map_err(|_| {
                CrudError::Validation(format!("invalid https_redirect_status_code {code}"))
            })?),
            None => None,
        };

        Ok(Route {
            runtime_group_id: require_scope(data)?,
            id: None,
            name: data.try_str("name")?.map(String::from),
            protocols: data.try_string_list("protocols")?,
            methods: data.try_string_list("methods")?,
            hosts: data.try_string_list("hosts")?,
            paths: data.try_string_list("paths")?,
            headers,
            https_redirect_status_code,
            regex_priority: data.try_i64("regex_priority")?.unwrap_or(0),
            strip_path: data.try_bool("strip_path")?.unwrap_or(true),
            path_handling: data.try_str("path_handling")?.map(String::from),
            preserve_host: data.try_bool("preserve_host")?.unwrap_or(false),
            request_buffering: data.try_bool("request_buffering")?.unwrap_or(true),
            response_buffering: data.try_bool("response_buffering")?.unwrap_or(true),
            tags: data.try_string_list("tags")?,
            service: data
                .try_str("service_id")?
                .map(|id| ServiceRef { id: id.to_string() }),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_wire(&self, route: &Route, data: &mut ResourceData) -> Result<(), CrudError> {
        data.set(RUNTIME_GROUP_FIELD, route.runtime_group_id.as_str());
        data.set(&computed_id_field::<Route>(), route.id.clone());
        data.set("name", route.name.clone());
        data.set("protocols", route.protocols.clone());
        data.set("methods", route.methods.clone());
        data.set("hosts", route.hosts.clone());
        data.set("paths", route.paths.clone());
        data.set("headers", serde_json::to_value(&route.headers)?);
        data.set("https_redirect_status_code", route.https_redirect_status_code);
        data.set("regex_priority", route.regex_priority);
        data.set("strip_path", route.strip_path);
        data.set("path_handling", route.path_handling.clone());
        data.set("preserve_host", route.preserve_host);
        data.set("request_buffering", route.request_buffering);
        data.set("response_buffering", route.response_buffering);
        data.set("tags", route.tags.clone());
        data.set(
            "service_id",
            route.service.as_ref().map(|s| Value::from(s.id.as_str())),
        );
        data.set("created_at", route.created_at);
        data.set("updated_at", route.updated_at);
        Ok(())
    }
}
