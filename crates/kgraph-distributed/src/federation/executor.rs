//! Scatter-gather query execution over a [`DistributedGraph`].
//!
//! Every mode sends the same query to each partition through the
//! configured [`PartitionQueryAdapter`], catches per-partition failures
//! (errors and panics) and merges the normalized rows in partition order.
//! Partitions are never mutated, so the fan-out needs no locks; the dedup
//! set is only touched by the merge after every partition has reported.

use super::adapter::{AdapterError, CypherAdapter, PartitionQueryAdapter};
use super::fingerprint::fingerprint;
use super::normalize::{PartitionOutput, Record, normalize};
use super::result::FederatedResult;
use super::stream::FederatedStream;
use crate::config::ExecutionConfig;
use crate::sharding::{DistributedGraph, PartitionId};
use futures::FutureExt;
use futures::future::{self, join_all};
use kgraph_core::{Entity, EntityId, KnowledgeGraph};
use kgraph_cypher::Parameters;
use rayon::prelude::*;
use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Outcome of one partition: its records, or the failure message.
pub(crate) type PartitionOutcome = Result<Vec<Record>, String>;

/// Default worker pool size for parallel execution.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Runs queries across all partitions of a distributed graph.
pub struct FederatedExecutor {
    graph: DistributedGraph,
    adapter: Arc<dyn PartitionQueryAdapter>,
    dedup: bool,
    max_workers: usize,
    pool: OnceLock<Option<rayon::ThreadPool>>,
}

impl std::fmt::Debug for FederatedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedExecutor")
            .field("partitions", &self.graph.partition_count())
            .field("strategy", &self.graph.strategy())
            .field("dedup", &self.dedup)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

impl FederatedExecutor {
    /// Creates an executor using the Cypher adapter, dedup on.
    pub fn new(graph: DistributedGraph) -> Self {
        Self {
            graph,
            adapter: Arc::new(CypherAdapter),
            dedup: true,
            max_workers: DEFAULT_MAX_WORKERS,
            pool: OnceLock::new(),
        }
    }

    /// Creates an executor from configuration.
    pub fn from_config(graph: DistributedGraph, config: &ExecutionConfig) -> Self {
        Self::new(graph)
            .with_dedup(config.dedup)
            .with_max_workers(config.max_workers)
    }

    /// Enables or disables duplicate suppression in the merge.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Replaces the per-partition adapter.
    pub fn with_adapter(mut self, adapter: impl PartitionQueryAdapter + 'static) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    /// Sets the worker pool size for [`execute_cypher_parallel`](Self::execute_cypher_parallel).
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self.pool = OnceLock::new();
        self
    }

    /// The underlying distributed graph.
    pub fn graph(&self) -> &DistributedGraph {
        &self.graph
    }

    /// Whether the merge drops duplicate records.
    pub fn dedup(&self) -> bool {
        self.dedup
    }

    /// Worker pool size used by parallel execution.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    // =========================================================================
    // Execution modes
    // =========================================================================

    /// Queries the partitions one after another.
    pub fn execute_cypher(&self, query: &str, params: Option<&Parameters>) -> FederatedResult {
        let outcomes = self
            .graph
            .partitions()
            .iter()
            .enumerate()
            .map(|(index, partition)| self.run_partition(index, partition, query, params))
            .collect();
        self.merge(outcomes)
    }

    /// Queries the partitions on a pool of `max_workers` threads.
    ///
    /// Results keep partition order whatever order the workers finish in.
    /// If the pool cannot be created, falls back to serial execution.
    pub fn execute_cypher_parallel(&self, query: &str, params: Option<&Parameters>) -> FederatedResult {
        let Some(pool) = self.pool() else {
            return self.execute_cypher(query, params);
        };
        let outcomes: Vec<PartitionOutcome> = pool.install(|| {
            self.graph
                .partitions()
                .par_iter()
                .enumerate()
                .map(|(index, partition)| self.run_partition(index, partition, query, params))
                .collect()
        });
        self.merge(outcomes)
    }

    /// Queries the partitions as concurrent futures on the caller's
    /// executor, yielding between partitions.
    pub async fn execute_cypher_async(&self, query: &str, params: Option<&Parameters>) -> FederatedResult {
        let calls = self
            .graph
            .partitions()
            .iter()
            .enumerate()
            .map(|(index, partition)| {
                // Building the future runs adapter code too, so it happens
                // on first poll inside the unwind boundary
                let call = AssertUnwindSafe(
                    future::lazy(move |_| self.adapter.execute_async(partition, query, params)).flatten(),
                )
                .catch_unwind();
                async move {
                    let outcome = match call.await {
                        Ok(Ok(output)) => normalize_guarded(output),
                        Ok(Err(err)) => Err(err.to_string()),
                        Err(payload) => Err(AdapterError::Panicked(panic_message(payload)).to_string()),
                    };
                    log_failure(index, &outcome);
                    outcome
                }
            });
        let outcomes = join_all(calls).await;
        self.merge(outcomes)
    }

    /// Lazily yields `(partition, record)` pairs.
    ///
    /// A partition is only queried once the consumer has drained the
    /// previous one and asks for more.
    pub fn stream_cypher<'a>(&'a self, query: &'a str, params: Option<&'a Parameters>) -> FederatedStream<'a> {
        FederatedStream::new(self, query, params)
    }

    // =========================================================================
    // Direct lookups
    // =========================================================================

    /// Fetches an entity from the partition that owns it.
    pub fn lookup_entity(&self, id: &EntityId) -> Option<&Entity> {
        let partition = self.graph.partition_for_entity(id)?;
        self.graph.partition(partition)?.get_entity(id)
    }

    /// Returns the partition owning `id`.
    pub fn lookup_entity_partition(&self, id: &EntityId) -> Option<PartitionId> {
        self.graph.partition_for_entity(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn pool(&self) -> Option<&rayon::ThreadPool> {
        self.pool
            .get_or_init(|| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.max_workers)
                    .thread_name(|i| format!("kgraph-partition-{}", i))
                    .build()
                    .map_err(|err| warn!(error = %err, "worker pool unavailable, running serially"))
                    .ok()
            })
            .as_ref()
    }

    /// Runs the adapter on one partition inside a failure boundary.
    pub(crate) fn run_partition(
        &self,
        index: PartitionId,
        partition: &KnowledgeGraph,
        query: &str,
        params: Option<&Parameters>,
    ) -> PartitionOutcome {
        let call = panic::catch_unwind(AssertUnwindSafe(|| self.adapter.execute(partition, query, params)));
        let outcome = match call {
            Ok(Ok(output)) => normalize_guarded(output),
            Ok(Err(err)) => Err(err.to_string()),
            Err(payload) => Err(AdapterError::Panicked(panic_message(payload)).to_string()),
        };
        log_failure(index, &outcome);
        outcome
    }

    fn merge(&self, outcomes: Vec<PartitionOutcome>) -> FederatedResult {
        let partition_count = outcomes.len();
        let mut errors = BTreeMap::new();
        let mut per_partition_records = Vec::with_capacity(partition_count);

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(records) => per_partition_records.push(records),
                Err(message) => {
                    errors.insert(index, message);
                    per_partition_records.push(Vec::new());
                }
            }
        }

        let mut seen = HashSet::new();
        let mut duplicates = 0usize;
        let mut records = Vec::new();
        for record in per_partition_records.iter().flatten() {
            if self.dedup && !seen.insert(fingerprint(record)) {
                duplicates += 1;
                continue;
            }
            records.push(record.clone());
        }

        debug!(
            partitions = partition_count,
            failed = errors.len(),
            records = records.len(),
            duplicates,
            "federated merge"
        );

        FederatedResult {
            records,
            per_partition_records,
            partition_count,
            errors,
        }
    }
}

/// Normalizes an adapter output, treating a panicking row accessor like
/// an adapter failure.
fn normalize_guarded(output: PartitionOutput) -> PartitionOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| normalize(output)))
        .map_err(|payload| AdapterError::Panicked(panic_message(payload)).to_string())
}

fn log_failure(index: PartitionId, outcome: &PartitionOutcome) {
    if let Err(message) = outcome {
        warn!(partition = index, error = %message, "partition query failed");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
