//! Request path building for runtime-group scoped entities.

use crate::error::CrudError;
use reqwest::Method;

/// Root of all runtime group scoped endpoints
pub const RUNTIME_GROUP_PATH: &str = "/v2/runtime-groups";

/// Lifecycle operation a request path is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOperation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl ResourceOperation {
    pub fn method(self) -> Method {
        match self {
            ResourceOperation::Create => Method::POST,
            ResourceOperation::Read | ResourceOperation::List => Method::GET,
            ResourceOperation::Update => Method::PUT,
            ResourceOperation::Delete => Method::DELETE,
        }
    }

    /// Whether the operation addresses a single item rather than the collection
    pub fn targets_item(self) -> bool {
        matches!(
            self,
            ResourceOperation::Read | ResourceOperation::Update | ResourceOperation::Delete
        )
    }
}

/// Collection/item path pair of one entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate {
    plural: &'static str,
}

impl PathTemplate {
    /// Template for an entity under `core-entities/<plural>`
    pub const fn core_entity(plural: &'static str) -> Self {
        Self { plural }
    }

    pub fn plural(&self) -> &'static str {
        self.plural
    }

    /// `/v2/runtime-groups/{scope}/core-entities/{plural}`
    pub fn collection(&self, scope_id: &str) -> String {
        format!(
            "{}/{}/core-entities/{}",
            RUNTIME_GROUP_PATH, scope_id, self.plural
        )
    }

    /// `/v2/runtime-groups/{scope}/core-entities/{plural}/{id}`
    pub fn item(&self, scope_id: &str, entity_id: &str) -> String {
        format!("{}/{}", self.collection(scope_id), entity_id)
    }

    /// Path for `op`. Item operations need an entity id.
    pub fn build(
        &self,
        op: ResourceOperation,
        scope_id: &str,
        entity_id: Option<&str>,
    ) -> Result<String, CrudError> {
        if !op.targets_item() {
            return Ok(self.collection(scope_id));
        }
        match entity_id {
            Some(id) if !id.is_empty() => Ok(self.item(scope_id, id)),
            _ => Err(CrudError::Validation(format!(
                "{:?} on {} requires an entity id",
                op, self.plural
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTES: PathTemplate = PathTemplate::core_entity("routes");

    #[test]
    fn test_create_and_list_use_collection_path() {
        let expected = "/v2/runtime-groups/g1/core-entities/routes";
        assert_eq!(ROUTES.build(ResourceOperation::Create, "g1", None).unwrap(), expected);
        assert_eq!(ROUTES.build(ResourceOperation::List, "g1", Some("r1")).unwrap(), expected);
    }

    #[test]
    fn test_item_operations_use_item_path() {
        for op in [
            ResourceOperation::Read,
            ResourceOperation::Update,
            ResourceOperation::Delete,
        ] {
            assert_eq!(
                ROUTES.build(op, "g1", Some("r1")).unwrap(),
                "/v2/runtime-groups/g1/core-entities/routes/r1"
            );
        }
    }

    #[test]
    fn test_item_operation_without_id_fails() {
        assert!(ROUTES.build(ResourceOperation::Read, "g1", None).is_err());
        assert!(ROUTES.build(ResourceOperation::Delete, "g1", Some("")).is_err());
    }

    #[test]
    fn test_methods() {
        assert_eq!(ResourceOperation::Create.method(), Method::POST);
        assert_eq!(ResourceOperation::Read.method(), Method::GET);
        assert_eq!(ResourceOperation::Update.method(), Method::PUT);
        assert_eq!(ResourceOperation::Delete.method(), Method::DELETE);
    }
}
