//! The partitioned view of a knowledge graph.

use super::strategy::{PartitionId, StrategyType};
use kgraph_core::{EntityId, KnowledgeGraph, RelationshipId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Node and edge counts of one partition, taken on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    /// Partition index
    pub partition_id: PartitionId,
    /// Entities stored in the partition
    pub node_count: usize,
    /// Relationships stored in the partition, copies included
    pub edge_count: usize,
}

/// An ordered set of partition subgraphs plus the entity→partition index.
///
/// Produced by [`GraphPartitioner`](super::GraphPartitioner) and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct DistributedGraph {
    partitions: Vec<KnowledgeGraph>,
    entity_index: HashMap<EntityId, PartitionId>,
    strategy: StrategyType,
}

impl DistributedGraph {
    pub(crate) fn new(
        partitions: Vec<KnowledgeGraph>,
        entity_index: HashMap<EntityId, PartitionId>,
        strategy: StrategyType,
    ) -> Self {
        Self {
            partitions,
            entity_index,
            strategy,
        }
    }

    /// Returns the partition owning `id`, or `None` if the id is unknown.
    pub fn partition_for_entity(&self, id: &EntityId) -> Option<PartitionId> {
        self.entity_index.get(id).copied()
    }

    /// Returns one statistics snapshot per partition.
    pub fn partition_stats(&self) -> Vec<PartitionStats> {
        self.partitions
            .iter()
            .enumerate()
            .map(|(partition_id, p)| PartitionStats {
                partition_id,
                node_count: p.node_count(),
                edge_count: p.edge_count(),
            })
            .collect()
    }

    /// Total entities across all partitions.
    pub fn total_nodes(&self) -> usize {
        self.partitions.iter().map(KnowledgeGraph::node_count).sum()
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// The partitions in index order.
    pub fn partitions(&self) -> &[KnowledgeGraph] {
        &self.partitions
    }

    /// One partition by index.
    pub fn partition(&self, index: PartitionId) -> Option<&KnowledgeGraph> {
        self.partitions.get(index)
    }

    /// The strategy the graph was partitioned with.
    pub fn strategy(&self) -> StrategyType {
        self.strategy
    }

    /// The entity→partition index.
    pub fn entity_index(&self) -> &HashMap<EntityId, PartitionId> {
        &self.entity_index
    }

    /// Reassembles the partitions into one graph.
    ///
    /// Delegates to [`KnowledgeGraph::merge`], which collapses entities
    /// sharing a name and type and keeps one copy of each relationship.
    pub fn merge_to_single_graph(&self) -> KnowledgeGraph {
        KnowledgeGraph::merge(&self.partitions)
    }

    /// Number of distinct relationships whose endpoints live in different
    /// partitions.
    pub fn cross_partition_edges(&self) -> usize {
        let mut seen: HashSet<&RelationshipId> = HashSet::new();
        let mut cross = 0;
        for rel in self.partitions.iter().flat_map(|p| p.relationships()) {
            if !seen.insert(&rel.id) {
                continue;
            }
            let source = self.partition_for_entity(&rel.source_id);
            let target = self.partition_for_entity(&rel.target_id);
            if source != target {
                cross += 1;
            }
        }
        cross
    }

    /// Share of distinct relationships that cross partitions, in percent.
    pub fn edge_cut_percentage(&self) -> f64 {
        let distinct: HashSet<&RelationshipId> = self
            .partitions
            .iter()
            .flat_map(|p| p.relationships())
            .map(|r| &r.id)
            .collect();
        if distinct.is_empty() {
            return 0.0;
        }
        self.cross_partition_edges() as f64 * 100.0 / distinct.len() as f64
    }
}
