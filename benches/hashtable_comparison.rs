use core::hint::black_box;

use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use flat_hash::HashEq;
use flat_hash::HashTable as FlatHashTable;
use flat_hash::byte_hash;
use hashbrown::hash_table::Entry as HashbrownEntry;
use hashbrown::hash_table::HashTable as HashbrownHashTable;
use rand::TryRngCore;
use rand::rngs::OsRng;

#[derive(Clone, Debug, PartialEq, Eq)]
struct TestItem {
    key: String,
    value: u64,
}

impl TestItem {
    fn new(key: u64) -> Self {
        black_box(Self {
            key: format!("key_{}", key),
            value: key,
        })
    }
}

struct ItemHash;

impl HashEq<TestItem> for ItemHash {
    fn hash(&self, entry: &TestItem, seed: u64) -> u64 {
        byte_hash(entry.key.as_bytes(), seed)
    }

    fn equals(&self, lhs: &TestItem, rhs: &TestItem) -> bool {
        lhs.key == rhs.key
    }
}

const SIZES: &[usize] = &[1 << 10, 1 << 15, 1 << 19];

fn hashbrown_hash(key: &str) -> u64 {
    black_box(byte_hash(key.as_bytes(), 0))
}

fn bench_insert_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_sequential");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));

        let items = (0..*size)
            .map(|i| TestItem::new(i as u64))
            .collect::<Vec<_>>();

        group.bench_function(format!("flat_hash/{}", size), |b| {
            b.iter(|| {
                let mut table = FlatHashTable::new(ItemHash);
                for item in items.iter().cloned() {
                    black_box(table.insert(item));
                }
                black_box(table)
            })
        });
        group.bench_function(format!("flat_hash_preallocated/{}", size), |b| {
            b.iter(|| {
                let mut table = FlatHashTable::new(ItemHash);
                table.reserve(*size);
                for item in items.iter().cloned() {
                    black_box(table.insert(item));
                }
                black_box(table)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut table = HashbrownHashTable::<TestItem>::with_capacity(0);
                for item in items.iter().cloned() {
                    let hash = hashbrown_hash(&item.key);
                    match table.entry(hash, |v| v.key == item.key, |v| hashbrown_hash(&v.key)) {
                        HashbrownEntry::Vacant(entry) => {
                            black_box(entry.insert(item));
                        }
                        HashbrownEntry::Occupied(_) => unreachable!(),
                    }
                }
                black_box(table)
            })
        });
    }

    group.finish();
}

fn bench_insert_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");

    let mut rng = OsRng;

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));

        let items = (0..*size)
            .map(|_| TestItem::new(rng.try_next_u64().unwrap()))
            .collect::<Vec<_>>();

        group.bench_function(format!("flat_hash/{}", size), |b| {
            b.iter(|| {
                let mut table = FlatHashTable::new(ItemHash);
                for item in items.iter().cloned() {
                    black_box(table.insert(item));
                }
                black_box(table)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut table = HashbrownHashTable::<TestItem>::with_capacity(0);
                for item in items.iter().cloned() {
                    let hash = hashbrown_hash(&item.key);
                    match table.entry(hash, |v| v.key == item.key, |v| hashbrown_hash(&v.key)) {
                        HashbrownEntry::Vacant(entry) => {
                            black_box(entry.insert(item));
                        }
                        HashbrownEntry::Occupied(_) => {}
                    }
                }
                black_box(table)
            })
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));

        let items = (0..*size)
            .map(|i| TestItem::new(i as u64))
            .collect::<Vec<_>>();
        let misses = (0..*size)
            .map(|i| TestItem::new((i + *size) as u64))
            .collect::<Vec<_>>();

        let mut flat_table = FlatHashTable::new(ItemHash);
        let mut hashbrown_table = HashbrownHashTable::<TestItem>::with_capacity(*size);
        for item in items.iter().cloned() {
            flat_table.insert(item.clone());
            let hash = hashbrown_hash(&item.key);
            match hashbrown_table.entry(hash, |v| v.key == item.key, |v| hashbrown_hash(&v.key)) {
                HashbrownEntry::Vacant(entry) => {
                    entry.insert(item);
                }
                HashbrownEntry::Occupied(_) => unreachable!(),
            }
        }

        group.bench_function(format!("flat_hash_hit/{}", size), |b| {
            b.iter(|| {
                for item in items.iter() {
                    black_box(flat_table.find(item));
                }
            })
        });
        group.bench_function(format!("flat_hash_miss/{}", size), |b| {
            b.iter(|| {
                for item in misses.iter() {
                    black_box(flat_table.find(item));
                }
            })
        });

        group.bench_function(format!("hashbrown_hit/{}", size), |b| {
            b.iter(|| {
                for item in items.iter() {
                    let hash = hashbrown_hash(&item.key);
                    black_box(hashbrown_table.find(hash, |v| v.key == item.key));
                }
            })
        });
        group.bench_function(format!("hashbrown_miss/{}", size), |b| {
            b.iter(|| {
                for item in misses.iter() {
                    let hash = hashbrown_hash(&item.key);
                    black_box(hashbrown_table.find(hash, |v| v.key == item.key));
                }
            })
        });
    }

    group.finish();
}

fn bench_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("erase");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));

        let items = (0..*size)
            .map(|i| TestItem::new(i as u64))
            .collect::<Vec<_>>();

        group.bench_function(format!("flat_hash/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut table = FlatHashTable::new(ItemHash);
                    for item in items.iter().cloned() {
                        table.insert(item);
                    }
                    table
                },
                |mut table| {
                    for item in items.iter() {
                        black_box(table.erase(item));
                    }
                    table
                },
                criterion::BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut table = HashbrownHashTable::<TestItem>::with_capacity(*size);
                    for item in items.iter().cloned() {
                        let hash = hashbrown_hash(&item.key);
                        match table.entry(hash, |v| v.key == item.key, |v| hashbrown_hash(&v.key))
                        {
                            HashbrownEntry::Vacant(entry) => {
                                entry.insert(item);
                            }
                            HashbrownEntry::Occupied(_) => unreachable!(),
                        }
                    }
                    table
                },
                |mut table| {
                    for item in items.iter() {
                        let hash = hashbrown_hash(&item.key);
                        if let Ok(entry) = table.find_entry(hash, |v| v.key == item.key) {
                            black_box(entry.remove().0);
                        }
                    }
                    table
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sequential,
    bench_insert_random,
    bench_find,
    bench_erase
);
criterion_main!(benches);
