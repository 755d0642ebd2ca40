//! Read-only graph access for query engines.
//!
//! [`GraphBackend`] is the whole surface a query engine may rely on: three
//! lookups and no writes. Any store that can answer them can be queried.

use crate::{Entity, EntityId, KnowledgeGraph, Properties, PropertyValue, Relationship};

/// Minimal read-only capability surface of a queryable graph.
pub trait GraphBackend {
    /// Finds entities whose type equals every label in `labels` and whose
    /// attributes equal every entry in `properties`.
    ///
    /// An empty `labels` slice matches any type.
    fn find_nodes(&self, labels: &[&str], properties: &Properties, limit: Option<usize>) -> Vec<&Entity>;

    /// Fetches one entity by id.
    fn get_node(&self, id: &EntityId) -> Option<&Entity>;

    /// Finds relationships with the given optional endpoints whose type is
    /// one of `types`. An empty `types` slice matches any type.
    fn get_relationships(
        &self,
        source_id: Option<&EntityId>,
        target_id: Option<&EntityId>,
        types: &[&str],
        limit: Option<usize>,
    ) -> Vec<&Relationship>;
}

/// Resolves a named attribute of an entity.
///
/// `id`, `name` and `type` map to the entity's own fields; anything else is
/// looked up in the property map.
pub fn entity_attribute(entity: &Entity, key: &str) -> Option<PropertyValue> {
    match key {
        "id" => Some(PropertyValue::String(entity.id.as_str().to_string())),
        "name" => Some(PropertyValue::String(entity.name.clone())),
        "type" | "entity_type" => Some(PropertyValue::String(entity.entity_type.clone())),
        _ => entity.properties.get(key).cloned(),
    }
}

fn matches_node(entity: &Entity, labels: &[&str], properties: &Properties) -> bool {
    labels.iter().all(|label| entity.entity_type == *label)
        && properties
            .iter()
            .all(|(key, expected)| entity_attribute(entity, key).as_ref() == Some(expected))
}

impl GraphBackend for KnowledgeGraph {
    fn find_nodes(&self, labels: &[&str], properties: &Properties, limit: Option<usize>) -> Vec<&Entity> {
        let limit = limit.unwrap_or(usize::MAX);
        match labels.first() {
            // Narrow through the type index when a label is given
            Some(first) => self
                .entities_of_type(first)
                .filter(|e| matches_node(e, labels, properties))
                .take(limit)
                .collect(),
            None => self
                .entities()
                .filter(|e| matches_node(e, labels, properties))
                .take(limit)
                .collect(),
        }
    }

    fn get_node(&self, id: &EntityId) -> Option<&Entity> {
        self.get_entity(id)
    }

    fn get_relationships(
        &self,
        source_id: Option<&EntityId>,
        target_id: Option<&EntityId>,
        types: &[&str],
        limit: Option<usize>,
    ) -> Vec<&Relationship> {
        self.relationships_between(source_id, target_id)
            .filter(|r| types.is_empty() || types.contains(&r.relation_type.as_str()))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}
