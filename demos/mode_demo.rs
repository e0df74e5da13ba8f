use adaptive_hash::Config;
use adaptive_hash::DefaultHashBuilder;
use adaptive_hash::HashMap;
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    #[arg(short = 'c', long = "capacity", default_value_t = 16)]
    capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    /// Only use keys that are multiples of this stride, to pile up collisions
    #[arg(short = 's', long = "stride", default_value_t = 1)]
    stride: u64,

    #[arg(long = "seed", default_value_t = 7)]
    seed: u64,
}

/// Hashes `u64` keys to themselves so `--stride` controls bucket placement.
#[derive(Default)]
struct StrideHasher(u64);

impl core::hash::Hasher for StrideHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

type StrideBuilder = core::hash::BuildHasherDefault<StrideHasher>;

fn main() {
    let args = Args::parse();

    let config = Config::default()
        .with_capacity(args.capacity)
        .with_load_factor(args.load_factor);

    let mut map = match HashMap::<u64, u64, StrideBuilder>::with_config(config) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    println!(
        "Filling map with {} keys (stride {}, capacity {}, load factor {})",
        args.count, args.stride, args.capacity, args.load_factor
    );

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut keys = Vec::with_capacity(args.count);
    while map.len() < args.count {
        let key = rng.random_range(0..1u64 << 24).wrapping_mul(args.stride.max(1));
        if map.insert(key, key).is_none() {
            keys.push(key);
        }
    }
    map.stats().print();

    println!();
    println!("Removing all but 6 keys...");
    for key in keys.iter().skip(6) {
        if map.remove(key).is_err() {
            eprintln!("key {key} vanished");
        }
    }
    map.stats().print();

    // The default hasher spreads the same keys evenly.
    let spread: HashMap<u64, u64, DefaultHashBuilder> = keys.iter().map(|&k| (k, k)).collect();
    println!();
    println!("Same keys with the default hasher:");
    spread.stats().print();
}
