//! In-memory knowledge graph container.
//!
//! Entities and relationships are kept in insertion order. Two inverted
//! indices (entity type and entity name) are maintained on every insert so
//! label scans and name lookups never walk the whole entity list.

use crate::{Entity, EntityId, GraphError, Relationship, RelationshipId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// InvertedIndex - key -> entity ids
// =============================================================================

/// Inverted index from a string key to the entities carrying it.
///
/// Ids are kept in insertion order so scans through the index follow the
/// same order as the owning graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// key -> Vec<EntityId>
    index: HashMap<String, Vec<EntityId>>,
}

/// Entity type -> entities.
pub type TypeIndex = InvertedIndex;

/// Entity name -> entities.
pub type NameIndex = InvertedIndex;

impl InvertedIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity under a key.
    pub fn add(&mut self, entity: EntityId, key: &str) {
        self.index.entry(key.to_string()).or_default().push(entity);
    }

    /// Gets all entities under a key.
    pub fn get(&self, key: &str) -> Option<&[EntityId]> {
        self.index.get(key).map(|v| v.as_slice())
    }

    /// Checks if an entity is filed under a key.
    pub fn contains(&self, entity: &EntityId, key: &str) -> bool {
        self.index.get(key).is_some_and(|ids| ids.contains(entity))
    }

    /// Returns the count of distinct keys.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Returns the count of entities under a key.
    pub fn count(&self, key: &str) -> usize {
        self.index.get(key).map(|v| v.len()).unwrap_or(0)
    }

    /// Returns all keys in the index.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(|s| s.as_str())
    }

    /// Removes an entity from a key, dropping the key once it is empty.
    pub fn remove(&mut self, entity: &EntityId, key: &str) {
        if let Some(ids) = self.index.get_mut(key) {
            ids.retain(|id| id != entity);
            if ids.is_empty() {
                self.index.remove(key);
            }
        }
    }
}

// =============================================================================
// KnowledgeGraph
// =============================================================================

/// An in-memory graph of typed entities and typed, directed relationships.
///
/// Relationships are not validated against the entity set on insert; a
/// relationship may reference an entity that is not (or no longer) present.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    entities: Vec<Entity>,
    entity_slots: HashMap<EntityId, usize>,
    relationships: Vec<Relationship>,
    relationship_slots: HashMap<RelationshipId, usize>,
    type_index: TypeIndex,
    name_index: NameIndex,
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `entities` entities.
    pub fn with_capacity(entities: usize) -> Self {
        Self {
            entities: Vec::with_capacity(entities),
            entity_slots: HashMap::with_capacity(entities),
            ..Self::default()
        }
    }

    /// Creates a builder.
    pub fn builder() -> KnowledgeGraphBuilder {
        KnowledgeGraphBuilder::new()
    }

    /// Inserts an entity, replacing any entity with the same id in place.
    pub fn add_entity(&mut self, entity: Entity) {
        if let Some(&slot) = self.entity_slots.get(&entity.id) {
            let old = &self.entities[slot];
            self.type_index.remove(&old.id, &old.entity_type);
            self.name_index.remove(&old.id, &old.name);
            self.type_index.add(entity.id.clone(), &entity.entity_type);
            self.name_index.add(entity.id.clone(), &entity.name);
            self.entities[slot] = entity;
            return;
        }

        self.type_index.add(entity.id.clone(), &entity.entity_type);
        self.name_index.add(entity.id.clone(), &entity.name);
        self.entity_slots.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
    }

    /// Inserts a relationship, replacing any relationship with the same id.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        match self.relationship_slots.get(&relationship.id) {
            Some(&slot) => self.relationships[slot] = relationship,
            None => {
                self.relationship_slots
                    .insert(relationship.id.clone(), self.relationships.len());
                self.relationships.push(relationship);
            }
        }
    }

    /// Inserts a relationship after checking both endpoints exist.
    pub fn try_add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        for endpoint in [&relationship.source_id, &relationship.target_id] {
            if !self.contains_entity(endpoint) {
                return Err(GraphError::DanglingRelationship {
                    id: relationship.id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        self.add_relationship(relationship);
        Ok(())
    }

    /// Fetches an entity, failing if it is absent.
    pub fn require_entity(&self, id: &EntityId) -> Result<&Entity> {
        self.get_entity(id)
            .ok_or_else(|| GraphError::EntityNotFound(id.clone()))
    }

    /// Returns the number of entities.
    pub fn node_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the number of relationships.
    pub fn edge_count(&self) -> usize {
        self.relationships.len()
    }

    /// Returns true if the graph holds no entities and no relationships.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Looks up an entity by id.
    pub fn get_entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entity_slots.get(id).map(|&slot| &self.entities[slot])
    }

    /// Checks if the graph contains an entity.
    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.entity_slots.contains_key(id)
    }

    /// Looks up a relationship by id.
    pub fn get_relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationship_slots
            .get(id)
            .map(|&slot| &self.relationships[slot])
    }

    /// Iterates entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterates entity ids in insertion order.
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter().map(|e| &e.id)
    }

    /// Iterates relationships in insertion order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    /// Iterates entities of a given type via the type index.
    pub fn entities_of_type<'a>(&'a self, entity_type: &str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.type_index
            .get(entity_type)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.get_entity(id))
    }

    /// Iterates entities with a given name via the name index.
    pub fn entities_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.name_index
            .get(name)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.get_entity(id))
    }

    /// Iterates relationships matching optional endpoints.
    pub fn relationships_between<'a>(
        &'a self,
        source: Option<&EntityId>,
        target: Option<&EntityId>,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.relationships.iter().filter(move |r| {
            source.is_none_or(|s| &r.source_id == s) && target.is_none_or(|t| &r.target_id == t)
        })
    }

    /// Returns the type index.
    pub fn type_index(&self) -> &TypeIndex {
        &self.type_index
    }

    /// Returns the name index.
    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    /// Merges several graphs into one.
    ///
    /// Entities are de-duplicated by `(name, entity_type)`: the first one
    /// seen survives and later duplicates are remapped onto its id.
    /// Relationships are de-duplicated by id, with endpoints rewritten
    /// through the same remapping.
    pub fn merge<'a>(graphs: impl IntoIterator<Item = &'a KnowledgeGraph>) -> KnowledgeGraph {
        let graphs: Vec<&KnowledgeGraph> = graphs.into_iter().collect();
        let capacity = graphs.iter().map(|g| g.node_count()).sum();
        let mut merged = KnowledgeGraph::with_capacity(capacity);

        let mut survivors: HashMap<(&str, &str), EntityId> = HashMap::with_capacity(capacity);
        let mut remap: HashMap<EntityId, EntityId> = HashMap::new();

        for graph in graphs.iter().copied() {
            for entity in graph.entities() {
                let key = (entity.name.as_str(), entity.entity_type.as_str());
                match survivors.get(&key) {
                    Some(survivor) if survivor != &entity.id => {
                        remap.insert(entity.id.clone(), survivor.clone());
                    }
                    Some(_) => {}
                    None => {
                        survivors.insert(key, entity.id.clone());
                        merged.add_entity(entity.clone());
                    }
                }
            }
        }

        for graph in graphs.iter().copied() {
            for relationship in graph.relationships() {
                if merged.relationship_slots.contains_key(&relationship.id) {
                    continue;
                }
                let mut relationship = relationship.clone();
                if let Some(id) = remap.get(&relationship.source_id) {
                    relationship.source_id = id.clone();
                }
                if let Some(id) = remap.get(&relationship.target_id) {
                    relationship.target_id = id.clone();
                }
                merged.add_relationship(relationship);
            }
        }

        merged
    }
}

// =============================================================================
// KnowledgeGraphBuilder
// =============================================================================

/// Builder for constructing KnowledgeGraph instances.
#[derive(Debug, Default)]
pub struct KnowledgeGraphBuilder {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

impl KnowledgeGraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity.
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Adds a relationship.
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Builds the graph.
    pub fn build(self) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::with_capacity(self.entities.len());
        for entity in self.entities {
            graph.add_entity(entity);
        }
        for relationship in self.relationships {
            graph.add_relationship(relationship);
        }
        graph
    }
}
