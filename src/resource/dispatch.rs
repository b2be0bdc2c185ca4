//! Kind Dispatch
//!
//! Maps a runtime [`ResourceKind`] onto the statically typed engine calls.

use super::consumer::{Consumer, ConsumerMapper};
use super::data::ResourceData;
use super::engine::CrudEngine;
use super::entity::{Entity, FieldMapper, RUNTIME_GROUP_FIELD};
use super::path::ResourceOperation;
use super::route::{Route, RouteMapper};
use super::service::{Service, ServiceMapper};
use crate::error::CrudError;
use crate::konnect::http::Transport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Service,
    Route,
    Consumer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Service,
        ResourceKind::Route,
        ResourceKind::Consumer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Service => Service::KIND,
            ResourceKind::Route => Route::KIND,
            ResourceKind::Consumer => Consumer::KIND,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Service => Service::PATH.plural(),
            ResourceKind::Route => Route::PATH.plural(),
            ResourceKind::Consumer => Consumer::PATH.plural(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CrudError;

    /// Accepts singular or plural names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.plural() == s)
            .ok_or_else(|| CrudError::Validation(format!("unknown resource kind: {s}")))
    }
}

/// Run one lifecycle operation for a record of `kind`
pub async fn execute<T: Transport>(
    engine: &CrudEngine<T>,
    kind: ResourceKind,
    op: ResourceOperation,
    data: &mut ResourceData,
) -> Result<(), CrudError> {
    tracing::debug!("execute: kind={}, op={:?}", kind, op);

    match kind {
        ResourceKind::Service => run(engine, &ServiceMapper, op, data).await,
        ResourceKind::Route => run(engine, &RouteMapper, op, data).await,
        ResourceKind::Consumer => run(engine, &ConsumerMapper, op, data).await,
    }
}

async fn run<T: Transport, M: FieldMapper>(
    engine: &CrudEngine<T>,
    mapper: &M,
    op: ResourceOperation,
    data: &mut ResourceData,
) -> Result<(), CrudError> {
    match op {
        ResourceOperation::Create => engine.create(mapper, data).await,
        ResourceOperation::Read => engine.read(mapper, data).await,
        ResourceOperation::Update => engine.update(mapper, data).await,
        ResourceOperation::Delete => engine.delete(mapper, data).await,
        ResourceOperation::List => Err(CrudError::Validation(
            "list is not a per-record operation".to_string(),
        )),
    }
}

/// Import an existing remote entity of `kind` into `data`
pub async fn import<T: Transport>(
    engine: &CrudEngine<T>,
    kind: ResourceKind,
    data: &mut ResourceData,
    token: &str,
) -> Result<(), CrudError> {
    match kind {
        ResourceKind::Service => engine.import(&ServiceMapper, data, token).await,
        ResourceKind::Route => engine.import(&RouteMapper, data, token).await,
        ResourceKind::Consumer => engine.import(&ConsumerMapper, data, token).await,
    }
}

/// List all entities of `kind` as JSON objects, with the runtime group attached
pub async fn list_values<T: Transport>(
    engine: &CrudEngine<T>,
    kind: ResourceKind,
    scope_id: &str,
) -> Result<Vec<Value>, CrudError> {
    match kind {
        ResourceKind::Service => to_values(engine.list::<Service>(scope_id).await?),
        ResourceKind::Route => to_values(engine.list::<Route>(scope_id).await?),
        ResourceKind::Consumer => to_values(engine.list::<Consumer>(scope_id).await?),
    }
}

fn to_values<E: Entity>(items: Vec<E>) -> Result<Vec<Value>, CrudError> {
    items
        .into_iter()
        .map(|item| -> Result<Value, CrudError> {
            let mut value = serde_json::to_value(&item)?;
            if let Value::Object(ref mut map) = value {
                map.insert(
                    RUNTIME_GROUP_FIELD.to_string(),
                    Value::String(item.scope_id().to_string()),
                );
            }
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{data, MockTransport};
    use reqwest::Method;
    use serde_json::json;
    use tokio_test::block_on;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("route".parse::<ResourceKind>().unwrap(), ResourceKind::Route);
        assert_eq!("Consumers".parse::<ResourceKind>().unwrap(), ResourceKind::Consumer);
        assert_eq!("services".parse::<ResourceKind>().unwrap(), ResourceKind::Service);
        assert!("plugins".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_execute_routes_to_matching_entity() {
        let transport = MockTransport::new();
        transport.respond_json(json!({ "id": "s1", "host": "billing.internal" }));
        let engine = CrudEngine::new(transport.clone());

        let mut record = data(json!({ "runtime_group_id": "g1", "host": "billing.internal" }));
        block_on(execute(&engine, ResourceKind::Service, ResourceOperation::Create, &mut record))
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/v2/runtime-groups/g1/core-entities/services");
        assert!(request.authenticated);
        assert_eq!(record.id(), Some("g1::s1"));
    }

    #[test]
    fn test_list_values_attach_runtime_group() {
        let transport = MockTransport::new();
        transport.respond_json(json!({ "data": [{ "id": "r1", "paths": ["/a"] }] }));
        let engine = CrudEngine::new(transport);

        let values = block_on(list_values(&engine, ResourceKind::Route, "g1")).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["runtime_group_id"], json!("g1"));
        assert_eq!(values[0]["id"], json!("r1"));
    }

    #[test]
    fn test_list_is_not_a_record_operation() {
        let engine = CrudEngine::new(MockTransport::new());
        let mut record = ResourceData::new();
        let err = block_on(execute(
            &engine,
            ResourceKind::Route,
            ResourceOperation::List,
            &mut record,
        ))
        .unwrap_err();
        assert!(matches!(err, CrudError::Validation(_)));
    }
}
