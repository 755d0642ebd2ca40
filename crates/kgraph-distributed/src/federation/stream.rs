//! Pull-driven streaming over partitions.

use super::executor::FederatedExecutor;
use super::fingerprint::{Fingerprint, fingerprint};
use super::normalize::Record;
use crate::sharding::PartitionId;
use kgraph_cypher::Parameters;
use std::collections::{BTreeMap, HashSet};
use std::iter::FusedIterator;

enum StreamState {
    /// The partition has not been queried yet
    NotStarted(PartitionId),
    /// Yielding the partition's remaining records
    InProgress {
        partition: PartitionId,
        rows: std::vec::IntoIter<Record>,
    },
    Exhausted,
}

/// Lazy `(partition, record)` iterator returned by
/// [`FederatedExecutor::stream_cypher`].
///
/// Partitions are queried in index order, one at a time, only when the
/// consumer asks for the next item. Dropping the stream early means later
/// partitions are never queried. With dedup enabled, a record already
/// yielded by any earlier partition is skipped.
pub struct FederatedStream<'a> {
    executor: &'a FederatedExecutor,
    query: &'a str,
    params: Option<&'a Parameters>,
    state: StreamState,
    seen: HashSet<Fingerprint>,
    errors: BTreeMap<PartitionId, String>,
}

impl<'a> FederatedStream<'a> {
    pub(crate) fn new(executor: &'a FederatedExecutor, query: &'a str, params: Option<&'a Parameters>) -> Self {
        Self {
            executor,
            query,
            params,
            state: StreamState::NotStarted(0),
            seen: HashSet::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Failures of the partitions visited so far.
    pub fn errors(&self) -> &BTreeMap<PartitionId, String> {
        &self.errors
    }
}

impl Iterator for FederatedStream<'_> {
    type Item = (PartitionId, Record);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Exhausted) {
                StreamState::Exhausted => return None,

                StreamState::NotStarted(index) => {
                    let Some(partition) = self.executor.graph().partition(index) else {
                        return None;
                    };
                    let rows = self
                        .executor
                        .run_partition(index, partition, self.query, self.params)
                        .unwrap_or_else(|message| {
                            self.errors.insert(index, message);
                            Vec::new()
                        });
                    self.state = StreamState::InProgress {
                        partition: index,
                        rows: rows.into_iter(),
                    };
                }

                StreamState::InProgress { partition, mut rows } => {
                    let dedup = self.executor.dedup();
                    let seen = &mut self.seen;
                    let next = rows.find(|record| !dedup || seen.insert(fingerprint(record)));
                    match next {
                        Some(record) => {
                            self.state = StreamState::InProgress { partition, rows };
                            return Some((partition, record));
                        }
                        None => self.state = StreamState::NotStarted(partition + 1),
                    }
                }
            }
        }
    }
}

impl FusedIterator for FederatedStream<'_> {}

#[cfg(test)]
mod tests {
    use crate::federation::FederatedExecutor;
    use crate::sharding::{GraphPartitioner, StrategyType};
    use kgraph_core::{Entity, KnowledgeGraph};

    fn executor(n: usize, partitions: usize) -> FederatedExecutor {
        let mut graph = KnowledgeGraph::new();
        for i in 0..n {
            graph.add_entity(Entity::new(format!("p{}", i), format!("P{}", i), "Person"));
        }
        let dg = GraphPartitioner::new(partitions, StrategyType::RoundRobin)
            .unwrap()
            .partition(&graph)
            .unwrap();
        FederatedExecutor::new(dg)
    }

    #[test]
    fn test_stream_yields_partition_order() {
        let executor = executor(5, 2);
        let items: Vec<_> = executor
            .stream_cypher("MATCH (n:Person) RETURN n.name", None)
            .collect();
        let partitions: Vec<usize> = items.iter().map(|(p, _)| *p).collect();
        assert_eq!(partitions, vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_stream_is_fused_and_records_errors() {
        let executor = executor(4, 2);
        let mut stream = executor.stream_cypher("BROKEN", None);
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.errors().keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_stream_dedups_across_partitions() {
        let executor = executor(6, 3);
        let types: Vec<_> = executor
            .stream_cypher("MATCH (n:Person) RETURN n.type", None)
            .collect();
        assert_eq!(types.len(), 1);

        let executor = executor.with_dedup(false);
        let types: Vec<_> = executor
            .stream_cypher("MATCH (n:Person) RETURN n.type", None)
            .collect();
        assert_eq!(types.len(), 6);
    }
}
