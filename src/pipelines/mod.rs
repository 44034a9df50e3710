pub mod replay;
pub mod scan;

use std::path::Path;

use log::info;

use crate::config::defs::{ReplayError, RunConfig};
use crate::pipelines::replay::{ReplayScheduler, ReplaySummary};
use crate::pipelines::scan::{scan_directory, OrderedFileList};
use crate::utils::cache::{BincodeFileListStore, FileListStore};
use crate::utils::header::TimestampResolver;
use crate::utils::system::generate_rng;

/// Returns the cached queue when there is one, otherwise scans `src_dir` and saves the result
/// before anything is replayed.
pub fn load_or_scan(
    store: &dyn FileListStore,
    src_dir: &Path,
    rescan: bool,
    resolver: &mut TimestampResolver,
) -> Result<OrderedFileList, ReplayError> {
    if !rescan {
        if let Some(files) = store.load() {
            info!("Resuming from cached file list: {} files left", files.len());
            return Ok(files);
        }
    }
    let files = scan_directory(src_dir, resolver)?;
    store.save(&files)?;
    Ok(files)
}

/// Runs the full replay described by `config`.
///
/// # Arguments
///
/// * `config` - Validated run configuration.
///
/// # Returns
/// Result<ReplaySummary, ReplayError>
pub async fn run(config: &RunConfig) -> Result<ReplaySummary, ReplayError> {
    let store = BincodeFileListStore::new(&config.cache_path);
    let mut resolver = TimestampResolver::new(generate_rng(config.seed));
    let files = load_or_scan(&store, &config.src_dir, config.rescan, &mut resolver)?;

    let mut scheduler = ReplayScheduler::new(files, &config.dest_dir);
    if config.checkpoint {
        scheduler = scheduler.with_checkpoint(&store);
    }
    scheduler.run().await
}
