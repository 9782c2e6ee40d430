//! Hot paths of every lookup: hashing, the ring interval test and finger
//! selection.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use corelib::{FingerTable, Identifier, KeySpace, PeerRef};

fn bench_hash(c: &mut Criterion) {
    let keyspace = KeySpace::new(6).unwrap();
    c.bench_function("keyspace_hash_str", |b| {
        b.iter(|| keyspace.hash_str(black_box("photon-1234")))
    });
}

fn bench_in_interval(c: &mut Criterion) {
    let keyspace = KeySpace::new(6).unwrap();
    c.bench_function("keyspace_in_interval_wrapping", |b| {
        b.iter(|| {
            keyspace.in_interval(
                black_box(Identifier(900_000)),
                black_box(Identifier(100_000)),
                black_box(Identifier(950_000)),
            )
        })
    });
}

fn bench_closest_preceding_finger(c: &mut Criterion) {
    let keyspace = KeySpace::new(6).unwrap();
    let owner = Identifier(123_456);
    let mut table = FingerTable::new(owner, &keyspace);
    for i in 0..table.len() {
        let target = table.key(i);
        let peer = PeerRef::with_identifier("10.0.0.1", 5000 + i as u16, target);
        table.update(i, peer);
    }

    c.bench_function("finger_closest_preceding", |b| {
        b.iter(|| table.closest_preceding_finger(black_box(Identifier(99_999)), &keyspace))
    });
}

criterion_group!(
    benches,
    bench_hash,
    bench_in_interval,
    bench_closest_preceding_finger
);
criterion_main!(benches);
