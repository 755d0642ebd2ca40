//! # KGraph Core
//!
//! Core types and traits for the knowledge graph.
//!
//! This crate provides the fundamental building blocks:
//! - [`EntityId`] and [`RelationshipId`] - Type-safe identifiers
//! - [`PropertyValue`] - Schema-flexible property storage
//! - [`Entity`] and [`Relationship`] - The graph's records
//! - [`KnowledgeGraph`] - The in-memory container with type/name indices
//! - [`GraphBackend`] - Minimal read-only surface a query engine needs

pub mod backend;
pub mod graph;

pub use backend::{GraphBackend, entity_attribute};
pub use graph::{InvertedIndex, KnowledgeGraph, KnowledgeGraphBuilder, NameIndex, TypeIndex};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Identifiers (Newtypes for type safety)
// =============================================================================

/// A unique identifier for an entity in the graph.
///
/// Uses a newtype pattern to prevent mixing up entity IDs with relationship
/// IDs or free-form names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new EntityId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for a relationship in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    /// Creates a new RelationshipId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RelationshipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Property Values
// =============================================================================

/// A property value that can be stored on entities or relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Null/missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Homogeneous or mixed list
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns true if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Attempts to get the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the value as an i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get the value as an f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(v: Vec<PropertyValue>) -> Self {
        PropertyValue::List(v)
    }
}

/// Property map attached to entities and relationships.
pub type Properties = BTreeMap<String, PropertyValue>;

// =============================================================================
// Entities and Relationships
// =============================================================================

/// A named, typed entity in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,
    /// Human-readable name (indexed)
    pub name: String,
    /// Entity type, used as the Cypher label (e.g. `Person`)
    pub entity_type: String,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

impl Entity {
    /// Creates a new entity without properties.
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: entity_type.into(),
            properties: Properties::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns a property by key.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// A directed, typed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,
    /// Source entity
    pub source_id: EntityId,
    /// Target entity
    pub target_id: EntityId,
    /// Relationship type (e.g. `KNOWS`)
    pub relation_type: String,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

impl Relationship {
    /// Creates a new relationship without properties.
    pub fn new(
        id: impl Into<RelationshipId>,
        source_id: impl Into<EntityId>,
        target_id: impl Into<EntityId>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: relation_type.into(),
            properties: Properties::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Entity not found in the graph
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Relationship refers to an entity that does not exist
    #[error("Relationship {id} references missing entity {missing}")]
    DanglingRelationship {
        id: RelationshipId,
        missing: EntityId,
    },
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new("alice");
        assert_eq!(id.as_str(), "alice");
        assert_eq!(format!("{}", id), "alice");

        let id2: EntityId = "bob".into();
        assert_eq!(id2.as_str(), "bob");
        assert!(id < id2);
    }

    #[test]
    fn test_property_value_types() {
        assert!(PropertyValue::Null.is_null());

        let int_val = PropertyValue::from(42i64);
        assert_eq!(int_val.as_int(), Some(42));
        assert_eq!(int_val.as_float(), Some(42.0));

        let float_val = PropertyValue::from(2.5f64);
        assert_eq!(float_val.as_float(), Some(2.5));
        assert_eq!(float_val.as_int(), None);

        assert_eq!(PropertyValue::from("hello").as_str(), Some("hello"));
        assert_eq!(PropertyValue::from(true).as_bool(), Some(true));
    }

    #[test]
    fn test_property_value_serialization() {
        let val = PropertyValue::from(42i64);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, "42");
        let parsed: PropertyValue = serde_json::from_str(&json).unwrap();
        assert_eq!(val, parsed);

        let list = PropertyValue::from(vec![PropertyValue::from("a"), PropertyValue::from(1i64)]);
        let json = serde_json::to_string(&list).unwrap();
        let parsed: PropertyValue = serde_json::from_str(&json).unwrap();
        assert_eq!(list, parsed);
    }

    #[test]
    fn test_entity_builder() {
        let e = Entity::new("p1", "Alice", "Person").with_property("age", 30i64);
        assert_eq!(e.id.as_str(), "p1");
        assert_eq!(e.entity_type, "Person");
        assert_eq!(e.property("age"), Some(&PropertyValue::Int(30)));
        assert!(e.property("missing").is_none());
    }

    #[test]
    fn test_relationship_creation() {
        let r = Relationship::new("r1", "p1", "p2", "KNOWS").with_property("since", 2020i64);
        assert_eq!(r.source_id, EntityId::new("p1"));
        assert_eq!(r.target_id, EntityId::new("p2"));
        assert_eq!(r.relation_type, "KNOWS");
        assert_eq!(r.properties.len(), 1);
    }
}
