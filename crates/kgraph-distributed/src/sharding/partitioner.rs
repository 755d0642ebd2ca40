//! Builds a [`DistributedGraph`] from a source graph.

use super::distributed::DistributedGraph;
use super::strategy::{PartitionId, StrategyType};
use super::PartitionError;
use crate::config::PartitioningConfig;
use kgraph_core::{EntityId, KnowledgeGraph};
use std::collections::HashMap;
use tracing::{debug, info};

/// Splits a knowledge graph into N partitions.
///
/// The strategy name is resolved when [`partition`](Self::partition) runs,
/// so a misconfigured name surfaces on first use rather than at
/// construction.
#[derive(Debug, Clone)]
pub struct GraphPartitioner {
    num_partitions: usize,
    strategy: String,
    copy_cross_edges: bool,
}

impl GraphPartitioner {
    /// Creates a partitioner with a known strategy.
    pub fn new(num_partitions: usize, strategy: StrategyType) -> Result<Self, PartitionError> {
        Self::with_strategy_name(num_partitions, strategy.as_str())
    }

    /// Creates a partitioner from a strategy name such as `"round_robin"`.
    pub fn with_strategy_name(
        num_partitions: usize,
        strategy: impl Into<String>,
    ) -> Result<Self, PartitionError> {
        if num_partitions < 1 {
            return Err(PartitionError::InvalidPartitionCount(num_partitions));
        }
        Ok(Self {
            num_partitions,
            strategy: strategy.into(),
            copy_cross_edges: true,
        })
    }

    /// Creates a partitioner from configuration.
    pub fn from_config(config: &PartitioningConfig) -> Result<Self, PartitionError> {
        Ok(Self::with_strategy_name(config.num_partitions, config.strategy.clone())?
            .copy_cross_edges(config.copy_cross_edges))
    }

    /// Sets whether cross-partition relationships are also copied into the
    /// target endpoint's partition.
    pub fn copy_cross_edges(mut self, enabled: bool) -> Self {
        self.copy_cross_edges = enabled;
        self
    }

    /// Returns the configured partition count.
    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// Returns the configured strategy name.
    pub fn strategy_name(&self) -> &str {
        &self.strategy
    }

    /// Partitions `graph`.
    ///
    /// Every partition receives its own copies of the entities and
    /// relationships assigned to it; the source graph is not modified.
    pub fn partition(&self, graph: &KnowledgeGraph) -> Result<DistributedGraph, PartitionError> {
        let kind: StrategyType = self.strategy.parse()?;

        if self.num_partitions == 1 {
            let index = graph.entity_ids().map(|id| (id.clone(), 0)).collect();
            debug!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "single partition, copying source graph"
            );
            return Ok(DistributedGraph::new(vec![graph.clone()], index, kind));
        }

        let ids: Vec<&EntityId> = graph.entity_ids().collect();
        let assignment = kind.build_strategy().assign(&ids, self.num_partitions);
        let index: HashMap<EntityId, PartitionId> = ids
            .iter()
            .zip(&assignment)
            .map(|(id, &p)| ((*id).clone(), p))
            .collect();

        let mut partitions: Vec<KnowledgeGraph> = (0..self.num_partitions)
            .map(|_| KnowledgeGraph::with_capacity(graph.node_count() / self.num_partitions + 1))
            .collect();

        for (entity, &p) in graph.entities().zip(&assignment) {
            partitions[p].add_entity(entity.clone());
        }

        let mut orphans = 0usize;
        for rel in graph.relationships() {
            let (Some(&source_p), Some(&target_p)) = (index.get(&rel.source_id), index.get(&rel.target_id))
            else {
                orphans += 1;
                debug!(
                    relationship = %rel.id,
                    source = %rel.source_id,
                    target = %rel.target_id,
                    "dropping relationship with an endpoint missing from the index"
                );
                continue;
            };

            partitions[source_p].add_relationship(rel.clone());
            if self.copy_cross_edges && source_p != target_p {
                partitions[target_p].add_relationship(rel.clone());
            }
        }

        for (i, part) in partitions.iter().enumerate() {
            debug!(
                partition = i,
                nodes = part.node_count(),
                edges = part.edge_count(),
                "partition built"
            );
        }
        info!(
            strategy = %kind,
            partitions = self.num_partitions,
            entities = index.len(),
            orphans,
            "graph partitioned"
        );

        Ok(DistributedGraph::new(partitions, index, kind))
    }
}
