//! Consumers

use super::data::ResourceData;
use super::entity::{computed_id_field, require_scope, Entity, FieldMapper, RUNTIME_GROUP_FIELD};
use super::path::PathTemplate;
use crate::error::CrudError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    #[serde(skip)]
    pub runtime_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Entity for Consumer {
    const KIND: &'static str = "consumer";
    const PATH: PathTemplate = PathTemplate::core_entity("consumers");

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

/// Maps consumer records. At least one of `username`/`custom_id` is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerMapper;

impl FieldMapper for ConsumerMapper {
    type Entity = Consumer;

    fn to_wire(&self, data: &ResourceData) -> Result<Consumer, CrudError> {
        let consumer = Consumer {
            runtime_group_id: require_scope(data)?,
            username: data.try_str("username")?.map(String::from),
            custom_id: data.try_str("custom_id")?.map(String::from),
            tags: data.try_string_list("tags")?,
            ..Consumer::default()
        };

        if consumer.username.is_none() && consumer.custom_id.is_none() {
            return Err(CrudError::Validation(
                "consumer needs at least one of username, custom_id".to_string(),
            ));
        }
        Ok(consumer)
    }

    fn from_wire(&self, consumer: &Consumer, data: &mut ResourceData) -> Result<(), CrudError> {
        data.set(RUNTIME_GROUP_FIELD, consumer.runtime_group_id.as_str());
        data.set(&computed_id_field::<Consumer>(), consumer.id.clone());
        data.set("username", consumer.username.clone());
        data.set("custom_id", consumer.custom_id.clone());
        data.set("tags", consumer.tags.clone());
        data.set("created_at", consumer.created_at);
        data.set("updated_at", consumer.updated_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::data;
    use serde_json::json;

    #[test]
    fn test_requires_username_or_custom_id() {
        let err = ConsumerMapper
            .to_wire(&data(json!({ "runtime_group_id": "g1", "username": "" })))
            .unwrap_err();
        assert!(matches!(err, CrudError::Validation(_)));

        assert!(ConsumerMapper
            .to_wire(&data(json!({ "runtime_group_id": "g1", "custom_id": "c-1" })))
            .is_ok());
    }

    #[test]
    fn test_mistyped_fields_rejected() {
        for fields in [
            json!({ "runtime_group_id": "g1", "username": 5 }),
            json!({ "runtime_group_id": "g1", "username": "alice", "tags": "team-a" }),
        ] {
            let err = ConsumerMapper.to_wire(&data(fields.clone())).unwrap_err();
            assert!(matches!(err, CrudError::Validation(_)), "{fields}: {err}");
        }
    }

    #[test]
    fn test_tags_only_sent_when_set() {
        let with_empty = ConsumerMapper
            .to_wire(&data(json!({ "runtime_group_id": "g1", "username": "alice", "tags": [] })))
            .unwrap();
        assert!(serde_json::to_value(&with_empty).unwrap().get("tags").is_none());

        let with_tags = ConsumerMapper
            .to_wire(&data(json!({ "runtime_group_id": "g1", "username": "alice", "tags": ["a"] })))
            .unwrap();
        assert_eq!(serde_json::to_value(&with_tags).unwrap()["tags"], json!(["a"]));
    }

    #[test]
    fn test_from_wire_writes_tags_and_id() {
        let consumer = Consumer {
            runtime_group_id: "g1".to_string(),
            id: Some("c1".to_string()),
            username: Some("alice".to_string()),
            tags: Some(vec!["team-a".to_string()]),
            ..Consumer::default()
        };
        let mut record = ResourceData::new();
        ConsumerMapper.from_wire(&consumer, &mut record).unwrap();

        assert_eq!(record.get_str("consumer_id"), Some("c1"));
        assert_eq!(record.try_string_list("tags").unwrap(), Some(vec!["team-a".to_string()]));
        assert!(record.get_ok("custom_id").is_none());
    }
}
