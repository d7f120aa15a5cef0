use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{pow::proof_of_work, Block, Transaction};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn bench_pow(c: &mut Criterion) {
    c.bench_function("proof_of_work_from_genesis", |b| {
        b.iter(|| proof_of_work(black_box(100)));
    });
}

fn bench_hash(c: &mut Criterion) {
    c.bench_function("hash_block_100_txs", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let txs: Vec<Transaction> = (0..100)
            .map(|i| Transaction::new(format!("alice-{i}"), "bob", rng.gen_range(1..10)))
            .collect();
        let block = Block::new(2, txs, 35293, "1");

        b.iter(|| black_box(&block).hash());
    });
}

criterion_group!(benches, bench_pow, bench_hash);
criterion_main!(benches);
