//! The per-partition query seam.

use super::normalize::PartitionOutput;
use futures::future::BoxFuture;
use kgraph_core::KnowledgeGraph;
use kgraph_cypher::{Parameters, QueryError, execute_query};
use thiserror::Error;

/// Failure of one partition's query.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The query engine rejected or failed the query
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    /// Any other adapter-specific failure
    #[error("{0}")]
    Failed(String),

    /// The adapter panicked
    #[error("Adapter panicked: {0}")]
    Panicked(String),
}

/// Runs a query against one partition.
///
/// Implementations only read the partition. The executor calls them from
/// worker threads and async tasks, hence `Send + Sync`.
pub trait PartitionQueryAdapter: Send + Sync {
    /// Executes `query` against `partition`.
    fn execute(
        &self,
        partition: &KnowledgeGraph,
        query: &str,
        params: Option<&Parameters>,
    ) -> Result<PartitionOutput, AdapterError>;

    /// Async form of [`execute`](Self::execute).
    ///
    /// The default yields to the scheduler once, then runs the query
    /// inline, so sibling tasks get a turn between partitions.
    fn execute_async<'a>(
        &'a self,
        partition: &'a KnowledgeGraph,
        query: &'a str,
        params: Option<&'a Parameters>,
    ) -> BoxFuture<'a, Result<PartitionOutput, AdapterError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.execute(partition, query, params)
        })
    }
}

/// Adapter running the Cypher engine directly against the partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CypherAdapter;

impl PartitionQueryAdapter for CypherAdapter {
    fn execute(
        &self,
        partition: &KnowledgeGraph,
        query: &str,
        params: Option<&Parameters>,
    ) -> Result<PartitionOutput, AdapterError> {
        Ok(execute_query(partition, query, params)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federation::normalize::normalize;
    use kgraph_core::Entity;
    use kgraph_cypher::Value;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::builder()
            .entity(Entity::new("p1", "Alice", "Person"))
            .build()
    }

    #[test]
    fn test_cypher_adapter() {
        let output = CypherAdapter
            .execute(&graph(), "MATCH (n:Person) RETURN n.name", None)
            .unwrap();
        let records = normalize(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["n.name"], Value::from("Alice"));
    }

    #[test]
    fn test_cypher_adapter_error() {
        let err = CypherAdapter.execute(&graph(), "MATCH", None).unwrap_err();
        assert!(matches!(err, AdapterError::Query(_)));
        assert!(err.to_string().starts_with("Query failed"));
    }

    #[test]
    fn test_default_async_matches_sync() {
        let g = graph();
        let output =
            futures::executor::block_on(CypherAdapter.execute_async(&g, "MATCH (n) RETURN n.name", None)).unwrap();
        assert_eq!(normalize(output).len(), 1);
    }
}
