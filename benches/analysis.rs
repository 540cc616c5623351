extern crate covscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use covscope::{
    analysis::{
        instruction_signature, merge_method, InsnHandle, InstructionsBuilder, MethodCoverageCalculator,
        MethodEvent,
    },
    coverage::MethodCoverage,
};
use std::hint::black_box;

/// A straight chain of signed instructions on one line each, ending in a single probe.
fn chain(len: u32) -> Vec<MethodEvent> {
    let mut events = Vec::with_capacity(len as usize * 2 + 2);
    for handle in 0..len {
        events.push(MethodEvent::LineNumber(handle / 4 + 1));
        events.push(MethodEvent::Instruction {
            handle: InsnHandle(handle),
            signature: Some(instruction_signature::<&str>(handle as usize, "NOP", &[])),
        });
    }
    events.push(MethodEvent::Probe { probe: 0, branch: 0 });
    events.push(MethodEvent::EndMethod);
    events
}

/// Benchmark graph construction and backward propagation
///
/// The executed probe at the end of the chain has to reach every instruction.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for len in [1_000u32, 10_000, 100_000] {
        let events = chain(len);
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_with_input(BenchmarkId::from_parameter(len), &events, |b, events| {
            b.iter(|| {
                let graph = InstructionsBuilder::build(Some(&[true]), black_box(events)).unwrap();
                black_box(graph)
            });
        });
    }
    group.finish();
}

/// Benchmark the coverage calculation over an already built graph
fn bench_calculate(c: &mut Criterion) {
    let graph = InstructionsBuilder::build(Some(&[true]), &chain(10_000)).unwrap();

    c.bench_function("calculate_10000", |b| {
        b.iter(|| {
            let mut coverage = MethodCoverage::new("run", "()V", None);
            MethodCoverageCalculator::new(black_box(&graph)).calculate(&mut coverage);
            black_box(coverage)
        });
    });
}

/// Benchmark merging a previous run into a fresh graph of the same method
fn bench_merge(c: &mut Criterion) {
    let events = chain(10_000);
    let previous = InstructionsBuilder::build(Some(&[true]), &events)
        .unwrap()
        .signature_map()
        .unwrap();

    c.bench_function("merge_10000", |b| {
        b.iter(|| {
            let mut graph = InstructionsBuilder::build(Some(&[false]), &events).unwrap();
            let mut probes = [false];
            let outcome = merge_method(
                "Bench",
                "run",
                &mut graph,
                Some(&previous),
                Some(&mut probes[..]),
                Some(&[true]),
            )
            .unwrap();
            black_box((outcome, graph))
        });
    });
}

criterion_group!(benches, bench_build, bench_calculate, bench_merge);
criterion_main!(benches);
