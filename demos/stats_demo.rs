use clap::Parser;
use flat_hash::HashEq;
use flat_hash::HashTable;
use flat_hash::byte_hash;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,
}

struct U64Hash;

impl HashEq<u64> for U64Hash {
    fn hash(&self, entry: &u64, seed: u64) -> u64 {
        byte_hash(&entry.to_le_bytes(), seed)
    }

    fn equals(&self, lhs: &u64, rhs: &u64) -> bool {
        lhs == rhs
    }
}

// Every public table operation dumps the running counters to stderr under
// the `stats` feature, so redirect stderr if you only want the final
// summary: `cargo run --example stats_demo --features stats 2>/dev/null`
fn main() {
    let args = Args::parse();

    println!(
        "Creating table with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64, U64Hash> = HashTable::new(U64Hash);
    table.reserve(args.target_capacity);
    println!("Capacity after reserve: {}", table.capacity());

    println!("Filling table with u64 values...");
    for value in 0..args.target_capacity as u64 {
        table.insert(value);
    }
    println!("Inserted {} values", table.len());

    let mut missing = 0;
    for value in 0..args.target_capacity as u64 {
        if table.find(&value).is_none() {
            missing += 1;
        }
    }
    assert_eq!(missing, 0, "all inserted values must be findable");

    for value in (0..args.target_capacity as u64).step_by(2) {
        table.erase(&value);
    }
    println!("Erased every second value, {} remain", table.len());

    table.stats().print();
}
