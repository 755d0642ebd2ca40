//! Graph sharding.
//!
//! Splits one [`KnowledgeGraph`](kgraph_core::KnowledgeGraph) into N
//! independently owned partition subgraphs.
//!
//! # Partitioning Strategies
//!
//! - **Hash**: stable hash of the entity id, even spread, order independent
//! - **Range**: contiguous runs of sorted ids
//! - **Round-robin**: visit order modulo N
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────────────┐
//!   source graph ─▶│  GraphPartitioner  │
//!                  └─────────┬──────────┘
//!                            │ entity → partition index
//!            ┌───────────────┼───────────────┐
//!     ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!     │ Partition 0 │ │ Partition 1 │ │ Partition 2 │
//!     └─────────────┘ └─────────────┘ └─────────────┘
//!                  DistributedGraph (read-only)
//! ```
//!
//! Entities land in exactly one partition. A relationship is stored with
//! its source endpoint and, when cross-edge copying is on, also with its
//! target endpoint.

mod distributed;
mod partitioner;
mod strategy;

pub use distributed::{DistributedGraph, PartitionStats};
pub use partitioner::GraphPartitioner;
pub use strategy::{
    HashPartition, PartitionId, PartitionStrategy, RangePartition, RoundRobinPartition, StrategyType,
};

use thiserror::Error;

/// Configuration errors raised before any partitioning work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// Partition count below one
    #[error("num_partitions must be >= 1, got {0}")]
    InvalidPartitionCount(usize),

    /// Strategy name not recognized
    #[error("Unknown partitioning strategy: {0:?} (expected hash, range or round_robin)")]
    UnknownStrategy(String),
}
