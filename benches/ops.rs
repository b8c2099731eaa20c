use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use rb_symtab::SymbolTable;

fn shuffled_keys(n: usize) -> Vec<String> {
    let mut keys: Vec<String> = (0..n).map(|i| format!("{i:08}")).collect();
    keys.shuffle(&mut ChaCha8Rng::seed_from_u64(7));
    keys
}

fn bench_ops(c: &mut Criterion) {
    let keys = shuffled_keys(1024);

    c.bench_function("put_1024", |b| {
        b.iter(|| {
            let mut table = SymbolTable::new();
            for key in &keys {
                table.put(key, key);
            }
            black_box(table.is_empty())
        })
    });

    let mut table = SymbolTable::new();
    for key in &keys {
        table.put(key, key);
    }

    c.bench_function("get_1024", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for key in &keys {
                if table.get(key).is_some() {
                    hits += 1;
                }
            }
            black_box(hits)
        })
    });

    c.bench_function("churn_1024", |b| {
        b.iter(|| {
            let mut table = SymbolTable::new();
            for key in &keys {
                table.put(key, key);
            }
            for key in &keys {
                black_box(table.remove(key));
            }
            black_box(table.is_empty())
        })
    });
}

criterion_group!(benches, bench_ops);
criterion_main!(benches);
