#![allow(
    clippy::unwrap_used,
    clippy::default_numeric_fallback,
    reason = "benchmark"
)]

use {
    criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main},
    drive_crypt::Cipher,
    drive_crypt_protocol::credentials::EncryptionKey,
};

fn criterion_benchmark(c: &mut Criterion) {
    let cipher = Cipher::new(&EncryptionKey::generate()).unwrap();

    let mut group = c.benchmark_group("content");
    for size in [1024, 1024 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || (0..size).map(|_| rand::random::<u8>()).collect::<Vec<u8>>(),
                |mut input| cipher.apply_keystream(&mut input, 1 << 30).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();

    c.bench_function("name", |b| {
        b.iter(|| cipher.encrypt_name("holiday photos 2024/IMG_0001.jpg").unwrap());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
