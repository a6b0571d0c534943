use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use error_telemetry::{
    CircuitBreaker, DiagnosticReport, ErrorCategory, ErrorEvent, PrivacyScrubber, RateLimiter,
    Sampler, TelemetryWorker, Transport, TransportError, WorkerConfig,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Transport that accepts everything and does nothing.
#[derive(Debug)]
struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        black_box(report);
        Ok(())
    }
}

/// Benchmark the individual admission gates
fn bench_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("gates");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("circuit_breaker_allow", |b| {
        let breaker = CircuitBreaker::new();
        b.iter(|| {
            for _ in 0..1000 {
                black_box(breaker.allow());
            }
        })
    });

    group.bench_function("sampler", |b| {
        let sampler = Sampler::new();
        b.iter(|| {
            for i in 0..1000 {
                let component = if i % 2 == 0 { "audio" } else { "rtsp" };
                black_box(sampler.should_sample(black_box(component), "network", 0.5));
            }
        })
    });

    for keys in [1usize, 10, 1000] {
        group.bench_with_input(BenchmarkId::new("rate_limiter", keys), &keys, |b, &keys| {
            let limiter = RateLimiter::new(usize::MAX, Duration::from_millis(10));
            let names: Vec<String> = (0..keys).map(|i| format!("component-{}", i)).collect();
            b.iter(|| {
                for i in 0..1000 {
                    black_box(limiter.allow(&names[i % keys]));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark scrubbing of typical messages
fn bench_scrubbing(c: &mut Criterion) {
    let mut group = c.benchmark_group("scrubbing");
    let scrubber = PrivacyScrubber::new();

    group.bench_function("plain_text", |b| {
        b.iter(|| scrubber.scrub_message(black_box("database is locked")))
    });

    group.bench_function("url_and_ip", |b| {
        b.iter(|| {
            scrubber.scrub_message(black_box(
                "failed to connect to rtsp://admin:pw@192.168.1.10:554/live from 10.0.0.2",
            ))
        })
    });

    group.bench_function("urls_only", |b| {
        let scrubber = PrivacyScrubber::urls_only();
        b.iter(|| scrubber.scrub_message(black_box("GET https://api.example.com/v1/users/42 failed")))
    });

    group.finish();
}

/// Benchmark the full pipeline, admitted and rejected paths
fn bench_worker(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker");
    group.throughput(Throughput::Elements(1));

    group.bench_function("admitted_event", |b| {
        let config = WorkerConfig::builder()
            .with_rate_limit(usize::MAX, Duration::from_millis(10))
            .build()
            .unwrap();
        let worker = TelemetryWorker::new(config, NullTransport);
        b.iter(|| {
            let event = ErrorEvent::new("rtsp", ErrorCategory::Rtsp, "stream closed by peer");
            black_box(worker.process_event(&event))
        })
    });

    group.bench_function("rate_limited_event", |b| {
        let config = WorkerConfig::builder()
            .with_rate_limit(1, Duration::from_secs(3600))
            .build()
            .unwrap();
        let worker = TelemetryWorker::new(config, NullTransport);
        let event = ErrorEvent::new("rtsp", ErrorCategory::Rtsp, "stream closed by peer");
        let _ = worker.process_event(&event);
        b.iter(|| black_box(worker.process_event(&event)))
    });

    group.finish();
}

/// Benchmark concurrent producers sharing one worker
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((num_threads * 1000) as u64));
        group.bench_with_input(
            BenchmarkId::new("process_event", num_threads),
            &num_threads,
            |b, &num_threads| {
                let config = WorkerConfig::builder()
                    .with_rate_limit(100, Duration::from_secs(1))
                    .build()
                    .unwrap();
                let worker = Arc::new(TelemetryWorker::new(config, NullTransport));

                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|t| {
                            let worker = Arc::clone(&worker);
                            thread::spawn(move || {
                                for i in 0..1000 {
                                    let event = ErrorEvent::new(
                                        format!("component-{}", (t + i) % 16),
                                        ErrorCategory::Network,
                                        "connection reset",
                                    );
                                    let _ = black_box(worker.process_event(&event));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_gates, bench_scrubbing, bench_worker, bench_concurrent);
criterion_main!(benches);
