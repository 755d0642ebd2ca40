//! Partitioning Benchmark
//!
//! Measures:
//! - Partitioning throughput per strategy
//! - Edge cut percentage per strategy
//! - Serial vs parallel federated query latency

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kgraph_core::{Entity, KnowledgeGraph, Relationship};
use kgraph_distributed::{FederatedExecutor, GraphPartitioner, StrategyType};

const STRATEGIES: [StrategyType; 3] = [StrategyType::Hash, StrategyType::Range, StrategyType::RoundRobin];

/// Generates a random graph with `num_nodes` people and about
/// `avg_degree` outgoing `KNOWS` edges each.
fn generate_random_graph(num_nodes: usize, avg_degree: usize, seed: u64) -> KnowledgeGraph {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = KnowledgeGraph::with_capacity(num_nodes);

    for i in 0..num_nodes {
        let age: i64 = rng.gen_range(18..80);
        graph.add_entity(
            Entity::new(format!("person-{}", i), format!("Person {}", i), "Person").with_property("age", age),
        );
    }

    let mut next_edge = 0usize;
    for source in 0..num_nodes {
        for _ in 0..avg_degree {
            let target = rng.gen_range(0..num_nodes);
            if target == source {
                continue;
            }
            graph.add_relationship(Relationship::new(
                format!("knows-{}", next_edge),
                format!("person-{}", source),
                format!("person-{}", target),
                "KNOWS",
            ));
            next_edge += 1;
        }
    }

    graph
}

fn bench_partitioning(c: &mut Criterion) {
    let mut group = c.benchmark_group("Partitioning");
    group.sample_size(10);

    for node_count in [1_000, 10_000] {
        let graph = generate_random_graph(node_count, 4, 42);

        for strategy in STRATEGIES {
            let partitioner = GraphPartitioner::new(8, strategy).expect("valid partition count");

            let dg = partitioner.partition(&graph).expect("known strategy");
            println!(
                "{} partitioning edge cut ({}): {:.2}%",
                strategy,
                node_count,
                dg.edge_cut_percentage()
            );

            group.bench_with_input(
                BenchmarkId::new(strategy.as_str(), node_count),
                &graph,
                |b, graph| b.iter(|| black_box(partitioner.partition(graph).expect("known strategy"))),
            );
        }
    }

    group.finish();
}

fn bench_federated_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Federated Query");
    group.sample_size(20);

    let query = "MATCH (n:Person) WHERE n.age >= 40 RETURN n.name, n.age";

    for partitions in [2, 4, 8] {
        let graph = generate_random_graph(5_000, 2, 7);
        let dg = GraphPartitioner::new(partitions, StrategyType::Hash)
            .expect("valid partition count")
            .partition(&graph)
            .expect("known strategy");
        let executor = FederatedExecutor::new(dg).with_max_workers(partitions);

        group.bench_with_input(BenchmarkId::new("serial", partitions), &executor, |b, executor| {
            b.iter(|| black_box(executor.execute_cypher(query, None)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", partitions), &executor, |b, executor| {
            b.iter(|| black_box(executor.execute_cypher_parallel(query, None)))
        });
        group.bench_with_input(BenchmarkId::new("stream_first", partitions), &executor, |b, executor| {
            b.iter(|| black_box(executor.stream_cypher(query, None).next()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_partitioning, bench_federated_query);
criterion_main!(benches);
