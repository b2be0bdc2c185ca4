//! Composite identifiers
//!
//! Every Konnect entity lives under a runtime group, so its identity is the
//! pair (runtime group id, entity id). The pair travels outside the crate as a
//! single token `"<runtime_group_id>::<entity_id>"`.

use crate::error::CrudError;
use std::fmt;
use std::str::FromStr;

/// Separator between the two components of an encoded identifier
pub const ID_SEPARATOR: &str = "::";

/// Two-part identity of a remote entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    scope_id: String,
    entity_id: String,
}

impl CompositeId {
    /// Build an identifier, rejecting empty components and components that
    /// embed the separator (they could not be decoded back unambiguously).
    pub fn new(scope_id: impl Into<String>, entity_id: impl Into<String>) -> Result<Self, CrudError> {
        let scope_id = scope_id.into();
        let entity_id = entity_id.into();

        for component in [&scope_id, &entity_id] {
            if component.is_empty() {
                return Err(CrudError::malformed(
                    &format!("{scope_id}{ID_SEPARATOR}{entity_id}"),
                    "empty component",
                ));
            }
            if component.contains(ID_SEPARATOR) {
                return Err(CrudError::malformed(
                    component,
                    "component contains the separator",
                ));
            }
        }
        if scope_id.ends_with(':') || entity_id.starts_with(':') {
            return Err(CrudError::malformed(
                &format!("{scope_id}{ID_SEPARATOR}{entity_id}"),
                "component touches the separator",
            ));
        }

        Ok(Self {
            scope_id,
            entity_id,
        })
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn encode(&self) -> String {
        format!("{}{}{}", self.scope_id, ID_SEPARATOR, self.entity_id)
    }

    /// Parse an encoded token. Exactly one separator and two non-empty
    /// components are accepted.
    pub fn decode(token: &str) -> Result<Self, CrudError> {
        let Some((scope_id, entity_id)) = token.split_once(ID_SEPARATOR) else {
            return Err(CrudError::malformed(token, "missing separator"));
        };
        if entity_id.contains(ID_SEPARATOR) {
            return Err(CrudError::malformed(token, "more than one separator"));
        }
        if scope_id.is_empty() || entity_id.is_empty() {
            return Err(CrudError::malformed(token, "empty component"));
        }
        if entity_id.starts_with(':') {
            return Err(CrudError::malformed(token, "component touches the separator"));
        }

        Ok(Self {
            scope_id: scope_id.to_string(),
            entity_id: entity_id.to_string(),
        })
    }

    pub fn into_parts(self) -> (String, String) {
        (self.scope_id, self.entity_id)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scope_id, ID_SEPARATOR, self.entity_id)
    }
}

impl FromStr for CompositeId {
    type Err = CrudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Encode a (scope id, entity id) pair into its external token
pub fn encode_id(scope_id: &str, entity_id: &str) -> Result<String, CrudError> {
    CompositeId::new(scope_id, entity_id).map(|id| id.encode())
}

/// Decode an external token into its (scope id, entity id) pair
pub fn decode_id(token: &str) -> Result<(String, String), CrudError> {
    CompositeId::decode(token).map(CompositeId::into_parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_joins_with_separator() {
        assert_eq!(encode_id("g1", "r1").unwrap(), "g1::r1");
    }

    #[test]
    fn test_decode_returns_parts_in_order() {
        let (scope, id) = decode_id("g1::r1").unwrap();
        assert_eq!(scope, "g1");
        assert_eq!(id, "r1");
    }

    #[test]
    fn test_decode_without_separator_is_malformed() {
        let err = decode_id("g1r1").unwrap_err();
        assert!(matches!(
            err,
            CrudError::MalformedIdentifier { reason: "missing separator", .. }
        ));
    }

    #[test]
    fn test_decode_with_extra_separator_is_malformed() {
        let err = decode_id("g1::r1::x").unwrap_err();
        assert!(matches!(
            err,
            CrudError::MalformedIdentifier { reason: "more than one separator", .. }
        ));
    }

    #[test]
    fn test_decode_empty_components_rejected() {
        assert!(decode_id("::r1").is_err());
        assert!(decode_id("g1::").is_err());
        assert!(decode_id("").is_err());
    }

    #[test]
    fn test_new_rejects_separator_inside_component() {
        assert!(CompositeId::new("g::1", "r1").is_err());
        assert!(CompositeId::new("g1", "r::1").is_err());
    }

    #[test]
    fn test_colon_next_to_separator_rejected() {
        assert!(CompositeId::new("g1:", "r1").is_err());
        assert!(CompositeId::new("g1", ":r1").is_err());
        assert!(decode_id("g1:::r1").is_err());
    }

    #[test]
    fn test_single_colon_is_allowed() {
        let id = CompositeId::new("g:1", "r:1").unwrap();
        assert_eq!(CompositeId::decode(&id.encode()).unwrap(), id);
    }

    #[test]
    fn test_display_matches_encode() {
        let id: CompositeId = "g1::r1".parse().unwrap();
        assert_eq!(id.to_string(), id.encode());
    }
}
