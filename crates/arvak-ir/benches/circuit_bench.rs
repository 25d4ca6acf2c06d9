//! Benchmarks for Arvak circuit operations
//!
//! Run with: cargo bench -p arvak-ir

use std::collections::BTreeMap;

use arvak_ir::{Boundary, Circuit, CircuitDag, QubitId, UnitId};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn layered_circuit(n: u32, layers: usize) -> Circuit {
    let mut circuit = Circuit::with_size("bench", n, 0);
    for _ in 0..layers {
        for i in 0..n {
            circuit.h(QubitId(i)).unwrap();
        }
        for i in (0..n - 1).step_by(2) {
            circuit.cx(QubitId(i), QubitId(i + 1)).unwrap();
        }
    }
    circuit
}

fn input_boundary(dag: &CircuitDag) -> Boundary {
    dag.units()
        .filter_map(|u| dag.input_node(u).map(|n| (u, n)))
        .collect()
}

/// Benchmark GHZ state circuit creation
fn bench_ghz_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghz_circuit");

    for num_qubits in &[5, 20, 100] {
        group.bench_with_input(
            BenchmarkId::new("create", num_qubits),
            num_qubits,
            |b, &n| {
                b.iter(|| black_box(Circuit::ghz(n).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark sweeping a circuit cut by cut
fn bench_next_cut_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_cut_sweep");

    for num_qubits in &[10u32, 50] {
        let circuit = layered_circuit(*num_qubits, 10);
        let dag = circuit.dag();

        group.bench_with_input(BenchmarkId::new("sweep", num_qubits), dag, |b, dag| {
            b.iter(|| {
                let mut boundary = input_boundary(dag);
                let mut layers = 0;
                loop {
                    let cut = dag.next_cut(&boundary);
                    if cut.slice.is_empty() {
                        break;
                    }
                    boundary = cut.frontier;
                    layers += 1;
                }
                black_box(layers)
            });
        });
    }

    group.finish();
}

/// Benchmark renaming every wire of a circuit
fn bench_rename_units(c: &mut Criterion) {
    let mut group = c.benchmark_group("rename_units");

    for num_qubits in &[10u32, 50] {
        let circuit = layered_circuit(*num_qubits, 10);
        let map: BTreeMap<UnitId, UnitId> = (0..*num_qubits)
            .map(|i| (QubitId(i).into(), arvak_ir::Node(i).into()))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("place_all", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut dag = circuit.dag().clone();
                    dag.rename_units(&map).unwrap();
                    black_box(dag)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark circuit depth calculation
fn bench_circuit_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("circuit_depth");

    for num_qubits in &[5u32, 20, 50] {
        let circuit = layered_circuit(*num_qubits, 5);
        group.bench_with_input(
            BenchmarkId::new("depth", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| black_box(circuit.depth()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ghz_circuit,
    bench_next_cut_sweep,
    bench_rename_units,
    bench_circuit_depth,
);

criterion_main!(benches);
