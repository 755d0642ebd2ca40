//! Integration tests for federated query execution.
//!
//! Every execution mode runs against the same partitioned graphs; custom
//! adapters inject duplicates, failures, panics and delays.

use futures::future::{self, BoxFuture};
use kgraph_core::{Entity, EntityId, KnowledgeGraph, Relationship};
use kgraph_cypher::{Parameters, Value};
use kgraph_distributed::federation::{RowLike, SerializedFields};
use kgraph_distributed::{
    AdapterError, CypherAdapter, DistributedGraph, FederatedExecutor, FederatedResult, GraphPartitioner,
    PartitionOutput, PartitionQueryAdapter, StrategyType,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const NAMES: &str = "MATCH (n:Person) RETURN n.name";

fn people(n: usize, partitions: usize, strategy: StrategyType) -> DistributedGraph {
    let mut graph = KnowledgeGraph::new();
    for i in 0..n {
        graph.add_entity(
            Entity::new(format!("p{}", i), format!("Person {}", i), "Person").with_property("age", 20 + i as i64),
        );
    }
    GraphPartitioner::new(partitions, strategy)
        .unwrap()
        .partition(&graph)
        .unwrap()
}

fn names(result: &FederatedResult) -> HashSet<String> {
    result
        .records
        .iter()
        .filter_map(|r| r.get("n.name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

/// Fails on the partition holding `p0`.
struct FailOnFirst {
    panic: bool,
}

impl PartitionQueryAdapter for FailOnFirst {
    fn execute(
        &self,
        partition: &KnowledgeGraph,
        query: &str,
        params: Option<&Parameters>,
    ) -> Result<PartitionOutput, AdapterError> {
        if partition.contains_entity(&EntityId::new("p0")) {
            if self.panic {
                panic!("partition exploded");
            }
            return Err(AdapterError::Failed("backend offline".into()));
        }
        CypherAdapter.execute(partition, query, params)
    }
}

/// Counts calls before delegating to Cypher.
struct Counting(Arc<AtomicUsize>);

impl PartitionQueryAdapter for Counting {
    fn execute(
        &self,
        partition: &KnowledgeGraph,
        query: &str,
        params: Option<&Parameters>,
    ) -> Result<PartitionOutput, AdapterError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        CypherAdapter.execute(partition, query, params)
    }
}

#[test]
fn test_hash_partitioned_names_are_complete() {
    let executor = FederatedExecutor::new(people(9, 3, StrategyType::Hash));
    let expected: HashSet<String> = (0..9).map(|i| format!("Person {}", i)).collect();

    let serial = executor.execute_cypher(NAMES, None);
    assert!(serial.is_complete());
    assert_eq!(serial.partition_count, 3);
    assert_eq!(serial.len(), 9);
    assert_eq!(names(&serial), expected);

    let parallel = executor.execute_cypher_parallel(NAMES, None);
    assert_eq!(names(&parallel), expected);

    let streamed: HashSet<String> = executor
        .stream_cypher(NAMES, None)
        .filter_map(|(_, r)| r.get("n.name").and_then(Value::as_str).map(str::to_string))
        .collect();
    assert_eq!(streamed, expected);
}

#[test]
fn test_parameters_reach_every_partition() {
    let executor = FederatedExecutor::new(people(9, 3, StrategyType::RoundRobin));
    let mut params = Parameters::new();
    params.insert("min".into(), Value::Int(25));

    let result = executor.execute_cypher("MATCH (n:Person) WHERE n.age >= $min RETURN n.name", Some(&params));
    assert!(result.is_complete());
    assert_eq!(result.len(), 4);
}

#[test]
fn test_dedup_ignores_field_order() {
    /// Returns the same fields, in a different order per partition.
    struct Shuffled;

    impl PartitionQueryAdapter for Shuffled {
        fn execute(&self, partition: &KnowledgeGraph, _: &str, _: Option<&Parameters>) -> Result<PartitionOutput, AdapterError> {
            let mut pairs = vec![("a".to_string(), Value::Int(1)), ("b".to_string(), Value::from("x"))];
            if partition.node_count() % 2 == 0 {
                pairs.reverse();
            }
            let row: Box<dyn RowLike> = Box::new(pairs);
            Ok(PartitionOutput::Items(vec![row]))
        }
    }

    // Partitions of 2 and 1 entities
    let graph = people(3, 2, StrategyType::RoundRobin);
    let executor = FederatedExecutor::new(graph).with_adapter(Shuffled);
    let result = executor.execute_cypher("ignored", None);
    assert_eq!(result.len(), 1);
    assert_eq!(result.raw_row_count(), 2);

    let executor = executor.with_dedup(false);
    assert_eq!(executor.execute_cypher("ignored", None).len(), 2);
}

#[test]
fn test_failing_partition_is_isolated() {
    let graph = people(6, 3, StrategyType::RoundRobin);
    let executor = FederatedExecutor::new(graph).with_adapter(FailOnFirst { panic: false });

    for result in [
        executor.execute_cypher(NAMES, None),
        executor.execute_cypher_parallel(NAMES, None),
    ] {
        assert_eq!(result.failed_partitions(), vec![0]);
        assert!(result.errors[&0].contains("backend offline"));
        assert!(result.per_partition_records[0].is_empty());
        assert_eq!(result.len(), 4);
    }
}

#[test]
fn test_panicking_partition_is_isolated() {
    let graph = people(6, 3, StrategyType::RoundRobin);
    let executor = FederatedExecutor::new(graph).with_adapter(FailOnFirst { panic: true });

    let result = executor.execute_cypher_parallel(NAMES, None);
    assert_eq!(result.failed_partitions(), vec![0]);
    assert!(result.errors[&0].contains("partition exploded"));
    assert_eq!(result.len(), 4);

    let mut stream = executor.stream_cypher(NAMES, None);
    assert_eq!(stream.by_ref().count(), 4);
    assert!(stream.errors().contains_key(&0));
}

#[test]
fn test_parallel_keeps_partition_order() {
    /// Sleeps longer on lower partitions so workers finish in reverse.
    struct Slow;

    impl PartitionQueryAdapter for Slow {
        fn execute(
            &self,
            partition: &KnowledgeGraph,
            query: &str,
            params: Option<&Parameters>,
        ) -> Result<PartitionOutput, AdapterError> {
            let first = partition
                .entity_ids()
                .filter_map(|id| id.as_str().trim_start_matches('p').parse::<u64>().ok())
                .min()
                .unwrap_or(0);
            std::thread::sleep(Duration::from_millis(30u64.saturating_sub(first * 10)));
            CypherAdapter.execute(partition, query, params)
        }
    }

    let graph = people(8, 4, StrategyType::RoundRobin);
    let executor = FederatedExecutor::new(graph).with_adapter(Slow).with_max_workers(4);

    let serial = executor.execute_cypher(NAMES, None);
    let parallel = executor.execute_cypher_parallel(NAMES, None);
    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn test_async_partitions_interleave_with_other_tasks() {
    /// Records how many ticks had happened when each partition ran.
    struct TickObserver {
        ticks: Arc<AtomicUsize>,
        observed: Arc<Mutex<Vec<usize>>>,
    }

    impl PartitionQueryAdapter for TickObserver {
        fn execute(
            &self,
            partition: &KnowledgeGraph,
            query: &str,
            params: Option<&Parameters>,
        ) -> Result<PartitionOutput, AdapterError> {
            self.observed.lock().unwrap().push(self.ticks.load(Ordering::SeqCst));
            CypherAdapter.execute(partition, query, params)
        }
    }

    let ticks = Arc::new(AtomicUsize::new(0));
    let observed = Arc::new(Mutex::new(Vec::new()));
    let executor = FederatedExecutor::new(people(6, 3, StrategyType::Hash)).with_adapter(TickObserver {
        ticks: ticks.clone(),
        observed: observed.clone(),
    });

    let ticker = async {
        for _ in 0..5 {
            ticks.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    };
    let (result, ()) = tokio::join!(executor.execute_cypher_async(NAMES, None), ticker);

    assert!(result.is_complete());
    assert_eq!(result.len(), 6);
    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 3);
    assert!(observed.iter().all(|&t| t >= 1), "ticks seen: {:?}", observed);
}

#[tokio::test]
async fn test_async_matches_serial() {
    let executor = FederatedExecutor::new(people(10, 4, StrategyType::Range));
    let serial = executor.execute_cypher(NAMES, None);
    let concurrent = executor.execute_cypher_async(NAMES, None).await;
    assert_eq!(serial, concurrent);
}

#[tokio::test]
async fn test_async_failures_are_isolated() {
    for panic in [false, true] {
        let graph = people(6, 3, StrategyType::RoundRobin);
        let executor = FederatedExecutor::new(graph).with_adapter(FailOnFirst { panic });
        let result = executor.execute_cypher_async(NAMES, None).await;

        assert_eq!(result.failed_partitions(), vec![0]);
        assert!(result.per_partition_records[0].is_empty());
        assert_eq!(result.len(), 4);
        let expected = if panic { "partition exploded" } else { "backend offline" };
        assert!(result.errors[&0].contains(expected), "{:?}", result.errors);
    }
}

#[tokio::test]
async fn test_async_panic_while_building_the_call_is_isolated() {
    /// Runs the query before handing back an already-completed future.
    struct Eager;

    impl PartitionQueryAdapter for Eager {
        fn execute(
            &self,
            partition: &KnowledgeGraph,
            query: &str,
            params: Option<&Parameters>,
        ) -> Result<PartitionOutput, AdapterError> {
            FailOnFirst { panic: true }.execute(partition, query, params)
        }

        fn execute_async<'a>(
            &'a self,
            partition: &'a KnowledgeGraph,
            query: &'a str,
            params: Option<&'a Parameters>,
        ) -> BoxFuture<'a, Result<PartitionOutput, AdapterError>> {
            let outcome = self.execute(partition, query, params);
            Box::pin(future::ready(outcome))
        }
    }

    let executor = FederatedExecutor::new(people(6, 3, StrategyType::RoundRobin)).with_adapter(Eager);
    let result = executor.execute_cypher_async(NAMES, None).await;

    assert_eq!(result.failed_partitions(), vec![0]);
    assert!(result.errors[&0].contains("Adapter panicked: partition exploded"));
    assert_eq!(result.len(), 4);
}

#[test]
fn test_cross_partition_relationships_match_single_partition() {
    let mut graph = KnowledgeGraph::new();
    for i in 0..4 {
        graph.add_entity(Entity::new(format!("p{}", i), format!("Person {}", i), "Person"));
    }
    for i in 0..3 {
        graph.add_relationship(Relationship::new(
            format!("knows-{}", i),
            format!("p{}", i),
            format!("p{}", i + 1),
            "KNOWS",
        ));
    }
    let query = "MATCH (a)-[r:KNOWS]->(b) RETURN id(a) AS source, type(r) AS rel, id(b) AS target";

    let run = |partitions: usize, copy_cross_edges: bool| {
        let dg = GraphPartitioner::new(partitions, StrategyType::RoundRobin)
            .unwrap()
            .copy_cross_edges(copy_cross_edges)
            .partition(&graph)
            .unwrap();
        let result = FederatedExecutor::new(dg).execute_cypher(query, None);
        assert!(result.is_complete());
        result
            .records
            .iter()
            .map(|record| serde_json::to_string(record).unwrap())
            .collect::<BTreeSet<_>>()
    };

    let single = run(1, true);
    assert_eq!(single.len(), 3);
    // Round robin over 2 partitions splits every KNOWS edge
    assert_eq!(run(2, true), single);
    assert_eq!(run(2, false), single);
}

#[test]
fn test_stream_stops_querying_when_dropped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let executor = FederatedExecutor::new(people(6, 3, StrategyType::RoundRobin)).with_adapter(Counting(calls.clone()));

    let first: Vec<_> = executor.stream_cypher(NAMES, None).take(1).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].0, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stream_skips_empty_partitions_lazily() {
    // Round robin puts the company alone in partition 0
    let mut graph = KnowledgeGraph::new();
    graph.add_entity(Entity::new("acme", "Acme", "Company"));
    graph.add_entity(Entity::new("p1", "Person 1", "Person"));
    graph.add_entity(Entity::new("p2", "Person 2", "Person"));
    let dg = GraphPartitioner::new(3, StrategyType::RoundRobin)
        .unwrap()
        .partition(&graph)
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let executor = FederatedExecutor::new(dg).with_adapter(Counting(calls.clone()));
    let mut stream = executor.stream_cypher(NAMES, None);

    let (partition, record) = stream.next().unwrap();
    assert_eq!(partition, 1);
    assert_eq!(record.get("n.name"), Some(&Value::from("Person 1")));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_serialized_rows_are_normalized() {
    #[derive(Serialize)]
    struct Summary {
        partition_size: usize,
        label: &'static str,
    }

    struct Summaries;

    impl PartitionQueryAdapter for Summaries {
        fn execute(&self, partition: &KnowledgeGraph, _: &str, _: Option<&Parameters>) -> Result<PartitionOutput, AdapterError> {
            let row: Box<dyn RowLike> = Box::new(SerializedFields(Summary {
                partition_size: partition.node_count(),
                label: "summary",
            }));
            Ok(PartitionOutput::Items(vec![row]))
        }
    }

    let executor = FederatedExecutor::new(people(5, 2, StrategyType::RoundRobin)).with_adapter(Summaries);
    let result = executor.execute_cypher("ignored", None);
    assert_eq!(result.len(), 2);
    assert_eq!(result.records[0].get("partition_size"), Some(&Value::Int(3)));
    assert_eq!(result.records[1].get("partition_size"), Some(&Value::Int(2)));
    assert_eq!(result.records[0].get("label"), Some(&Value::from("summary")));
}

#[test]
fn test_scalar_outputs() {
    struct Scalar;

    impl PartitionQueryAdapter for Scalar {
        fn execute(&self, partition: &KnowledgeGraph, _: &str, _: Option<&Parameters>) -> Result<PartitionOutput, AdapterError> {
            if partition.contains_entity(&EntityId::new("p0")) {
                Ok(PartitionOutput::Scalar(Value::Null))
            } else {
                Ok(PartitionOutput::Scalar(Value::Int(partition.node_count() as i64)))
            }
        }
    }

    let executor = FederatedExecutor::new(people(3, 2, StrategyType::RoundRobin)).with_adapter(Scalar);
    let result = executor.execute_cypher("ignored", None);
    assert_eq!(result.per_partition_records[0].len(), 0);
    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].get("value"), Some(&Value::from("1")));
}

#[test]
fn test_lookups_follow_the_index() {
    let executor = FederatedExecutor::new(people(9, 3, StrategyType::Hash));
    for i in 0..9 {
        let id = EntityId::new(format!("p{}", i));
        let partition = executor.lookup_entity_partition(&id).unwrap();
        assert!(executor.graph().partition(partition).unwrap().contains_entity(&id));
        assert_eq!(executor.lookup_entity(&id).unwrap().name, format!("Person {}", i));
    }
    assert!(executor.lookup_entity(&EntityId::new("p9")).is_none());
}
