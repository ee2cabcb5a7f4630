//! # Split-Sealer Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | ss-02 orderer | sender recovery, heap build and drain |
//! | ss-03 sealer | one local `generate_work` over a full pool |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{group_by_sender, SignedTransaction, U256};
use ss_02_transaction_ordering::TransactionOrderer;
use ss_03_block_assembly::{CancellationSignal, GenerateParams, SealerConfig};
use ss_tests::fixtures::{local_sealer, transfer, GWEI};

const SIZES: [u64; 3] = [16, 64, 256];

fn bench_orderer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ss-02-orderer");

    for size in SIZES {
        // Eight senders, each with a run of nonces and varying tips.
        let txs: Vec<SignedTransaction> = (0..size)
            .map(|i| transfer((i % 8) as u8 + 1, i / 8, 1 + i % 13))
            .collect();

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("build_and_drain", size), &txs, |b, txs| {
            b.iter(|| {
                let mut orderer =
                    TransactionOrderer::new(group_by_sender(txs.clone()), Some(U256::from(GWEI)));
                let mut drained = 0;
                while orderer.peek().is_some() {
                    orderer.shift();
                    drained += 1;
                }
                black_box(drained)
            })
        });
    }
    group.finish();
}

fn bench_local_sealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ss-03-sealer");
    group.measurement_time(Duration::from_secs(10));
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let seeds: Vec<u8> = (1..=8).collect();

    for size in SIZES {
        let (sealer, pool, _chain) = local_sealer(&seeds, SealerConfig::default(), 30_000_000);
        for i in 0..size {
            let seed = (i % 8) as u8 + 1;
            pool.add(transfer(seed, i / 8, 1 + i % 13)).expect("valid signature");
        }
        let params = GenerateParams {
            timestamp: 1_012,
            ..Default::default()
        };

        group.throughput(Throughput::Elements(size));
        group.bench_function(BenchmarkId::new("generate_work", size), |b| {
            b.iter(|| {
                let result = runtime
                    .block_on(sealer.generate_work(&params, Arc::new(CancellationSignal::new())))
                    .expect("sealed");
                black_box(result.block.transactions.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_orderer, bench_local_sealing);
criterion_main!(benches);
