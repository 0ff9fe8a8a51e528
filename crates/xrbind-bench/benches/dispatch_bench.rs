//! Dispatch overhead benchmarks.
//!
//! Measures the per-call cost of finding an entry point through each
//! dispatcher: the populating loader, its read-only view and the frozen
//! table. Population itself is measured separately per mode.

use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use xrbind_abi::structs::{ApplicationInfo, InstanceCreateInfo};
use xrbind_abi::sys::{self, CURRENT_API_VERSION, InstanceCreateFlags};
use xrbind_abi::{CommandResolver, DispatchLoaderDynamic, IntoResult, methods};
use xrbind_core::{Command, PopulationMode};
use xrbind_harness::sim_runtime;

fn bench_instance() -> sys::Instance {
    // SAFETY: the simulated resolver lives for the whole process.
    let bootstrap =
        unsafe { DispatchLoaderDynamic::new(sys::Instance::NULL, sim_runtime::resolver()) };
    let app = ApplicationInfo::new("dispatch-bench", 1, "xrbind", 1, CURRENT_API_VERSION);
    let info = InstanceCreateInfo::new(InstanceCreateFlags::empty(), app, &[], &[]);
    // SAFETY: `info` is live for the call.
    let instance = unsafe { methods::create_instance(&bootstrap, &info) }
        .into_result()
        .expect("simulated instance");
    instance.get()
}

fn loader(instance: sys::Instance, mode: PopulationMode) -> DispatchLoaderDynamic {
    // SAFETY: as in `bench_instance`.
    unsafe { DispatchLoaderDynamic::with_mode(instance, sim_runtime::resolver(), mode) }
}

fn timed<R: CommandResolver>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    label: &str,
    dispatcher: &R,
) {
    let command = Command::LocateSpace;
    group.bench_function(BenchmarkId::new("resolve", label), |b| {
        b.iter(|| black_box(dispatcher.resolve(black_box(command)).ok()));
    });
}

fn bench_resolve(c: &mut Criterion) {
    let instance = bench_instance();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let lazy = loader(instance, PopulationMode::Lazy);
    timed(&mut group, "lazy", &lazy);
    timed(&mut group, "read_only", &lazy.read_only());
    let frozen = loader(instance, PopulationMode::Eager).freeze();
    timed(&mut group, "frozen", &frozen);

    group.finish();

    // Only the first lazy lookup may reach the resolver.
    let stats = lazy.stats();
    assert_eq!(stats.resolutions, 1, "{stats:?}");
    println!(
        "dispatch: lazy resolutions={} hits={}, frozen hits={}",
        stats.resolutions,
        stats.hits,
        frozen.stats().hits
    );
}

fn bench_populate(c: &mut Criterion) {
    let instance = bench_instance();
    let mut group = c.benchmark_group("populate");
    group.throughput(Throughput::Elements(Command::COUNT as u64));

    for mode in [PopulationMode::Lazy, PopulationMode::Eager] {
        group.bench_function(BenchmarkId::new("fully", mode.as_str()), |b| {
            b.iter_batched(
                || loader(instance, mode),
                |d| black_box(d.populate_fully()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(100);
    targets = bench_resolve, bench_populate
);
criterion_main!(benches);
