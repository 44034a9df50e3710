// src/utils/system.rs: System functions

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


/// Creates a project-wide RNG from the system, using entropy pool. Optional seed for
/// reproducibility.
///
/// # Arguments
///
///  * `seed` - Seed number that allows reproducible results.
///
/// # Returns
///
/// A StdRng
pub fn generate_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    StdRng::seed_from_u64(seed)
}


/// Log level for the run: debug when verbose, info otherwise.
pub fn log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}


/// Installs the global logger with a `[timestamp] LEVEL: message` layout.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: LevelFilter) {
    let _ = Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}
