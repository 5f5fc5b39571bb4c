use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use linechat::config::LimitsConfig;
use linechat::hub::{ClientHandle, ClientIdGen, Hub};
use linechat::network::notice;
use linechat::Stopper;
use tokio::runtime::Runtime;

// Fan-out cost of one broadcast through the hub to N drained clients.
// Client queues are drained concurrently so the fast path (try_send) dominates.

fn hub_fanout_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hub_fanout");

    for clients in [1usize, 16, 128] {
        group.throughput(Throughput::Elements(clients as u64));
        group.bench_with_input(BenchmarkId::from_parameter(clients), &clients, |b, &clients| {
            b.to_async(&rt).iter_custom(|iters| async move {
                let limits = LimitsConfig::default();
                let stopper = Stopper::new();
                let hub = Hub::spawn(&limits, &stopper);
                let ids = ClientIdGen::new();

                let mut drains = Vec::with_capacity(clients);
                for _ in 0..clients {
                    let (handle, mut rx) = ClientHandle::new(ids.next(), limits.client_queue);
                    hub.enter(handle).await.unwrap();
                    drains.push(tokio::spawn(async move {
                        let mut n = 0u64;
                        while rx.recv().await.is_some() {
                            n += 1;
                        }
                        n
                    }));
                }
                hub.wait_for_clients(clients).await.unwrap();

                let line = notice::said("127.0.0.1:50000", "Hello world");
                let start = std::time::Instant::now();
                for _ in 0..iters {
                    hub.broadcast(line.as_str()).await.unwrap();
                }
                stopper.stop().await;
                for drain in drains {
                    drain.await.unwrap();
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

fn notice_formatting_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("notice");
    let text = "Hello world";
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("said", |b| {
        b.iter(|| notice::said("127.0.0.1:50000", text))
    });

    group.finish();
}

criterion_group!(benches, hub_fanout_benchmark, notice_formatting_benchmark);
criterion_main!(benches);
