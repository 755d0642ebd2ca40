//! Partition strategies for graph sharding.
//!
//! Defines how entities are distributed across partitions.

use super::PartitionError;
use kgraph_core::EntityId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Index of a partition within a distributed graph.
pub type PartitionId = usize;

/// Trait for partition strategies that determine partition assignment.
///
/// Implementations must be deterministic: the same ordered id sequence and
/// partition count always produce the same assignment.
pub trait PartitionStrategy: Send + Sync {
    /// Assigns every id to a partition in `0..num_partitions`.
    ///
    /// The returned vector is aligned with `ids`.
    fn assign(&self, ids: &[&EntityId], num_partitions: usize) -> Vec<PartitionId>;

    /// The tag this strategy is recorded under.
    fn kind(&self) -> StrategyType;

    /// Returns a description of the strategy for debugging.
    fn describe(&self) -> String;
}

// =============================================================================
// Hash-based Partitioning
// =============================================================================

/// Hash-based partition strategy.
///
/// Uses the first eight bytes of `sha256(id)` so the assignment is stable
/// across processes and platforms, then takes it modulo the partition
/// count. Independent of the order in which entities are visited.
///
/// # Example
///
/// ```
/// use kgraph_distributed::sharding::HashPartition;
/// use kgraph_core::EntityId;
///
/// let p = HashPartition::partition_for(&EntityId::new("alice"), 4);
/// assert!(p < 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HashPartition;

impl HashPartition {
    /// Stable 64-bit hash of an entity id.
    pub fn stable_hash(id: &EntityId) -> u64 {
        let digest = Sha256::digest(id.as_str().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix)
    }

    /// Partition of a single id.
    pub fn partition_for(id: &EntityId, num_partitions: usize) -> PartitionId {
        (Self::stable_hash(id) % num_partitions as u64) as PartitionId
    }
}

impl PartitionStrategy for HashPartition {
    fn assign(&self, ids: &[&EntityId], num_partitions: usize) -> Vec<PartitionId> {
        ids.iter()
            .map(|id| Self::partition_for(id, num_partitions))
            .collect()
    }

    fn kind(&self) -> StrategyType {
        StrategyType::Hash
    }

    fn describe(&self) -> String {
        "HashPartition(sha256)".to_string()
    }
}

// =============================================================================
// Range-based Partitioning
// =============================================================================

/// Range-based partition strategy for locality-preserving distribution.
///
/// Sorts the ids and cuts the sorted sequence into contiguous buckets of
/// `max(1, total / num_partitions)` ids. The last partition absorbs the
/// remainder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangePartition;

impl PartitionStrategy for RangePartition {
    fn assign(&self, ids: &[&EntityId], num_partitions: usize) -> Vec<PartitionId> {
        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by(|&a, &b| ids[a].cmp(ids[b]));

        let bucket_size = (ids.len() / num_partitions).max(1);
        let mut assignment = vec![0; ids.len()];
        for (position, &original) in order.iter().enumerate() {
            assignment[original] = (position / bucket_size).min(num_partitions - 1);
        }
        assignment
    }

    fn kind(&self) -> StrategyType {
        StrategyType::Range
    }

    fn describe(&self) -> String {
        "RangePartition(sorted ids)".to_string()
    }
}

// =============================================================================
// Round-robin Partitioning
// =============================================================================

/// Round-robin partition strategy: the i-th entity goes to `i mod N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinPartition;

impl PartitionStrategy for RoundRobinPartition {
    fn assign(&self, ids: &[&EntityId], num_partitions: usize) -> Vec<PartitionId> {
        (0..ids.len()).map(|i| i % num_partitions).collect()
    }

    fn kind(&self) -> StrategyType {
        StrategyType::RoundRobin
    }

    fn describe(&self) -> String {
        "RoundRobinPartition".to_string()
    }
}

// =============================================================================
// Strategy selection
// =============================================================================

/// Supported partition strategy types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Stable hash of the entity id.
    #[default]
    Hash,
    /// Contiguous ranges of sorted ids.
    Range,
    /// Insertion order modulo partition count.
    RoundRobin,
}

impl StrategyType {
    /// Canonical name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Hash => "hash",
            StrategyType::Range => "range",
            StrategyType::RoundRobin => "round_robin",
        }
    }

    /// Builds the partition strategy.
    pub fn build_strategy(&self) -> Arc<dyn PartitionStrategy> {
        match self {
            StrategyType::Hash => Arc::new(HashPartition),
            StrategyType::Range => Arc::new(RangePartition),
            StrategyType::RoundRobin => Arc::new(RoundRobinPartition),
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(StrategyType::Hash),
            "range" => Ok(StrategyType::Range),
            "round_robin" | "round-robin" | "roundrobin" => Ok(StrategyType::RoundRobin),
            _ => Err(PartitionError::UnknownStrategy(s.to_string())),
        }
    }
}
