use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::block_on;
use futures::stream;
use msgpack_codec::{
    decode, decode_async, encode, encode_with_options, from_slice, msgpack, to_vec,
    DecoderOptions, EncoderOptions, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn sample_user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn benchmark_encode_value(c: &mut Criterion) {
    let value = msgpack!({
        "id": 42,
        "name": "sensor-7",
        "readings": [1.5, 2.25, 3.125, -0.5],
        "tags": ["important", "verified", "production"],
        "meta": { "version": 3, "active": true, "owner": nil }
    });

    c.bench_function("encode_value", |b| b.iter(|| encode(black_box(&value))));

    let sorted = EncoderOptions::new().with_sort_keys(true);
    c.bench_function("encode_value_sorted", |b| {
        b.iter(|| encode_with_options(black_box(&value), sorted.clone()))
    });
}

fn benchmark_decode_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_array");

    for size in [10, 100, 1000].iter() {
        let bytes = to_vec(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_typed(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_products");

    for size in [10, 100, 1000].iter() {
        let items = products(*size);
        let bytes = to_vec(&items).unwrap();

        group.bench_with_input(BenchmarkId::new("serialize", size), &items, |b, items| {
            b.iter(|| to_vec(black_box(items)))
        });
        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, bytes| {
            b.iter(|| from_slice::<Vec<Product>>(black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_map_keys(c: &mut Criterion) {
    // Many maps sharing the same short keys exercise the key cache.
    let rows: Vec<Value> = (0..500)
        .map(|i| msgpack!({ "id": i, "kind": "row", "ok": true }))
        .collect();
    let bytes = encode(&Value::Array(rows)).unwrap();

    let mut group = c.benchmark_group("map_keys");
    group.bench_function("cached", |b| b.iter(|| decode(black_box(&bytes))));

    let uncached = DecoderOptions::new().with_key_decoder(None);
    group.bench_function("uncached", |b| {
        b.iter(|| msgpack_codec::decode_with_options(black_box(&bytes), uncached.clone()))
    });
    group.finish();
}

fn benchmark_chunked(c: &mut Criterion) {
    let bytes = to_vec(&products(200)).unwrap();
    let mut group = c.benchmark_group("decode_async");

    for size in [16usize, 256, 4096].iter() {
        let chunks: Vec<Vec<u8>> = bytes.chunks(*size).map(<[u8]>::to_vec).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunks, |b, chunks| {
            b.iter(|| {
                block_on(decode_async(
                    stream::iter(black_box(chunks.clone())),
                    DecoderOptions::new(),
                ))
            })
        });
    }
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let user = sample_user();
    let mut group = c.benchmark_group("comparison");

    group.bench_function("msgpack_serialize", |b| b.iter(|| to_vec(black_box(&user))));

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_vec(black_box(&user)))
    });

    let packed = to_vec(&user).unwrap();
    let json = serde_json::to_vec(&user).unwrap();

    group.bench_function("msgpack_deserialize", |b| {
        b.iter(|| from_slice::<User>(black_box(&packed)))
    });

    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_slice::<User>(black_box(&json)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode_value,
    benchmark_decode_value,
    benchmark_typed,
    benchmark_map_keys,
    benchmark_chunked,
    benchmark_comparison_with_json
);
criterion_main!(benches);
