//! Benchmarks for Arvak qubit routing
//!
//! Run with: cargo bench -p arvak-mapping
//! Set `RUST_LOG=arvak_mapping=debug` to see routing decisions.

use std::sync::Arc;

use arvak_ir::Circuit;
use arvak_mapping::{
    Architecture, LexiLabellingMethod, LexiRouteRoutingMethod, MappingManager,
    MultiGateReorderRoutingMethod, RoutingMethodPtr, default_routing_methods,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Smallest square grid with at least `n` nodes.
fn grid_for(n: u32) -> Architecture {
    let side = (1..).find(|s| s * s >= n).unwrap_or(n);
    Architecture::grid(side, side)
}

/// Benchmark routing the QFT, where every qubit pair interacts
fn bench_route_qft(c: &mut Criterion) {
    init_logging();
    let mut group = c.benchmark_group("route_qft");
    group.sample_size(20);

    for num_qubits in &[5u32, 9, 16] {
        let circuit = Circuit::qft(*num_qubits).unwrap();
        let manager = MappingManager::new(grid_for(*num_qubits));
        let methods = default_routing_methods();
        group.bench_with_input(
            BenchmarkId::new("grid", num_qubits),
            num_qubits,
            |b, _| {
                b.iter(|| {
                    let mut dag = circuit.dag().clone();
                    black_box(manager.route_circuit(&mut dag, &methods).unwrap())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the effect of LexiRoute lookahead depth
fn bench_lookahead_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookahead_depth");
    let circuit = Circuit::qft(10).unwrap();
    let manager = MappingManager::new(Architecture::linear(10));

    for depth in &[1usize, 10, 100] {
        let methods: Vec<RoutingMethodPtr> = vec![
            Arc::new(LexiLabellingMethod),
            Arc::new(LexiRouteRoutingMethod::new(*depth)),
        ];
        group.bench_with_input(BenchmarkId::new("linear", depth), depth, |b, _| {
            b.iter(|| {
                let mut dag = circuit.dag().clone();
                black_box(manager.route_circuit(&mut dag, &methods).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark routing with gate reordering enabled
fn bench_reorder(c: &mut Criterion) {
    let circuit = Circuit::ghz(12).unwrap();
    let manager = MappingManager::new(Architecture::ring(12));
    let methods: Vec<RoutingMethodPtr> = vec![
        Arc::new(LexiLabellingMethod),
        Arc::new(MultiGateReorderRoutingMethod::default()),
        Arc::new(LexiRouteRoutingMethod::default()),
    ];

    c.bench_function("route_ghz_with_reorder", |b| {
        b.iter(|| {
            let mut dag = circuit.dag().clone();
            black_box(manager.route_circuit(&mut dag, &methods).unwrap())
        });
    });
}

criterion_group!(benches, bench_route_qft, bench_lookahead_depth, bench_reorder);
criterion_main!(benches);
