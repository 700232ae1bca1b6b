use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dobutsu_tb::{canonical, decode_pos, encode_pos, poscode_aliases, Position};

fn bench_encode(c: &mut Criterion) {
    let pos = canonical(&Position::initial()).expect("initial position is live");
    c.bench_function("encode_pos", |b| b.iter(|| encode_pos(black_box(&pos))));
}

fn bench_decode(c: &mut Criterion) {
    let pc = encode_pos(&canonical(&Position::initial()).expect("initial position is live"));
    c.bench_function("decode_pos", |b| b.iter(|| decode_pos(black_box(&pc))));
}

fn bench_aliases(c: &mut Criterion) {
    let pos = canonical(&"S/-l-/---/---/-L-/CcGgEe".parse::<Position>().unwrap())
        .expect("live position");
    c.bench_function("poscode_aliases", |b| {
        b.iter(|| poscode_aliases(black_box(&pos)))
    });
}

fn bench_movegen(c: &mut Criterion) {
    let pos = Position::initial();
    c.bench_function("legal_moves", |b| b.iter(|| black_box(&pos).legal_moves()));
    c.bench_function("legal_unmoves", |b| {
        b.iter(|| black_box(&pos).legal_unmoves())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_aliases, bench_movegen);
criterion_main!(benches);
