//! # KGraph Distributed
//!
//! Partitioned knowledge graphs and federated Cypher queries over them.
//!
//! - [`sharding`] - [`GraphPartitioner`] splits a graph into a
//!   [`DistributedGraph`] using a hash, range or round-robin strategy
//! - [`federation`] - [`FederatedExecutor`] fans a query out to every
//!   partition (serially, on a worker pool, as async tasks or as a lazy
//!   stream) and merges the results
//! - [`config`] and [`logging`] - TOML/env configuration and tracing setup
//!
//! # Example
//!
//! ```
//! use kgraph_core::{Entity, KnowledgeGraph};
//! use kgraph_distributed::{FederatedExecutor, GraphPartitioner, StrategyType};
//!
//! let mut graph = KnowledgeGraph::new();
//! for name in ["Alice", "Bob", "Carol"] {
//!     graph.add_entity(Entity::new(name.to_lowercase(), name, "Person"));
//! }
//!
//! let distributed = GraphPartitioner::new(2, StrategyType::Hash)?.partition(&graph)?;
//! let executor = FederatedExecutor::new(distributed);
//! let result = executor.execute_cypher("MATCH (n:Person) RETURN n.name", None);
//! assert_eq!(result.len(), 3);
//! assert!(result.is_complete());
//! # Ok::<(), kgraph_distributed::PartitionError>(())
//! ```

pub mod config;
pub mod federation;
pub mod logging;
pub mod sharding;

pub use config::{ConfigError, FederationConfig};
pub use federation::{
    AdapterError, CypherAdapter, FederatedExecutor, FederatedResult, FederatedStream, PartitionOutput,
    PartitionQueryAdapter, Record,
};
pub use sharding::{
    DistributedGraph, GraphPartitioner, PartitionError, PartitionId, PartitionStats, StrategyType,
};
