use argon2::Params;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gatehouse::session::token;
use gatehouse::{PasswordHasher, session::SessionData};
use std::hint::black_box;

/// Helper to build a hasher with the given memory cost (KiB)
fn hasher_with_memory(m_cost: u32) -> PasswordHasher {
    let params = Params::new(m_cost, 2, 1, None).unwrap();
    PasswordHasher::with_params("bench_pepper_value", params)
}

/// Benchmark hashing under the production defaults
fn bench_hash_default(c: &mut Criterion) {
    let hasher = PasswordHasher::new("bench_pepper_value");

    c.bench_function("hash_default_params", |b| {
        b.iter(|| hasher.hash(black_box("correct horse battery staple")).unwrap());
    });
}

/// Benchmark verification, which dominates login latency
fn bench_verify_default(c: &mut Criterion) {
    let hasher = PasswordHasher::new("bench_pepper_value");
    let hash = hasher.hash("correct horse battery staple").unwrap();

    c.bench_function("verify_default_params", |b| {
        b.iter(|| hasher.verify(black_box("correct horse battery staple"), black_box(&hash)));
    });
}

/// Benchmark hashing cost as memory grows
fn bench_hash_memory_cost(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_memory_cost");
    group.sample_size(10);

    for m_cost in [1024u32, 4096, 19 * 1024] {
        let hasher = hasher_with_memory(m_cost);
        group.bench_with_input(BenchmarkId::from_parameter(m_cost), &hasher, |b, hasher| {
            b.iter(|| hasher.hash(black_box("password")).unwrap());
        });
    }

    group.finish();
}

/// Benchmark token generation and digesting
fn bench_token(c: &mut Criterion) {
    c.bench_function("token_generate", |b| b.iter(token::generate));

    let token = token::generate();
    c.bench_function("token_session_id", |b| {
        b.iter(|| token::session_id(black_box(&token)));
    });
}

/// Benchmark the session payload codec
fn bench_payload_json(c: &mut Criterion) {
    let data = SessionData::for_user(42);

    c.bench_function("session_payload_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&data)).unwrap());
    });

    let json = serde_json::to_string(&data).unwrap();
    c.bench_function("session_payload_deserialize", |b| {
        b.iter(|| serde_json::from_str::<SessionData>(black_box(&json)).unwrap());
    });
}

criterion_group!(
    hashing,
    bench_hash_default,
    bench_verify_default,
    bench_hash_memory_cost,
);

criterion_group!(sessions, bench_token, bench_payload_json);

criterion_main!(hashing, sessions);
