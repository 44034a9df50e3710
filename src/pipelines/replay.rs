use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::config::defs::{ReplayError, SMOOTHING_FACTOR, SMOOTHING_THRESHOLD_SECS};
use crate::pipelines::scan::{FileInfo, OrderedFileList};
use crate::utils::cache::FileListStore;
use crate::utils::file::{copy_into_dir, parent_dir_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Pending,
    Waiting,
    Copying,
    Drained,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub files_copied: usize,
    pub total_wait: Duration,
}

/// Stretches gaps under the smoothing threshold so clustered files do not arrive in a burst.
pub fn smooth_delay(raw: Duration) -> Duration {
    if raw.as_secs_f64() < SMOOTHING_THRESHOLD_SECS {
        raw.mul_f64(SMOOTHING_FACTOR)
    } else {
        raw
    }
}

/// Wait before copying `next`, given that `current` was just copied.
pub fn next_delay(current: &FileInfo, next: &FileInfo) -> Duration {
    let gap = (current.completion_time - next.completion_time).abs();
    smooth_delay(gap.to_std().unwrap_or_default())
}

/// Destination subdirectory for a file: `dest_dir/<name of the file's parent directory>`.
pub fn destination_for(file: &FileInfo, dest_dir: &Path) -> PathBuf {
    match parent_dir_name(&file.file_path) {
        Some(parent) => dest_dir.join(parent),
        None => dest_dir.to_path_buf(),
    }
}

/// Copies queued files into the destination one at a time, paced by their completion times.
pub struct ReplayScheduler<'a> {
    files: OrderedFileList,
    dest_dir: PathBuf,
    checkpoint: Option<&'a dyn FileListStore>,
    delay: Duration,
    state: ReplayState,
    summary: ReplaySummary,
}

impl<'a> ReplayScheduler<'a> {
    pub fn new(files: OrderedFileList, dest_dir: impl Into<PathBuf>) -> Self {
        let state = if files.is_empty() { ReplayState::Drained } else { ReplayState::Pending };
        ReplayScheduler {
            files,
            dest_dir: dest_dir.into(),
            checkpoint: None,
            delay: Duration::ZERO,
            state,
            summary: ReplaySummary::default(),
        }
    }

    /// Saves the remaining queue to `store` after every copy, and clears it once drained.
    pub fn with_checkpoint(mut self, store: &'a dyn FileListStore) -> Self {
        self.checkpoint = Some(store);
        self
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn remaining(&self) -> &OrderedFileList {
        &self.files
    }

    /// Wait that will precede the next copy.
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    pub fn summary(&self) -> &ReplaySummary {
        &self.summary
    }

    /// Replays the front entry of the queue.
    ///
    /// # Returns
    /// Path of the new copy, or None when the queue is already drained.
    pub async fn step(&mut self) -> Result<Option<PathBuf>, ReplayError> {
        let file = match self.files.pop_front() {
            Some(file) => file,
            None => {
                self.state = ReplayState::Drained;
                return Ok(None);
            }
        };

        info!("{}", file.file_path.display());
        let target_dir = destination_for(&file, &self.dest_dir);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| ReplayError::io(&target_dir, e))?;

        self.state = ReplayState::Waiting;
        info!("Waiting time is {:.3}s", self.delay.as_secs_f64());
        tokio::time::sleep(self.delay).await;
        self.summary.total_wait += self.delay;

        self.state = ReplayState::Copying;
        let copied = copy_into_dir(&file.file_path, &target_dir)
            .await
            .map_err(|e| ReplayError::io(&file.file_path, e))?;
        self.summary.files_copied += 1;

        if let Some(store) = self.checkpoint {
            if self.files.is_empty() {
                store.clear()?;
            } else {
                store.save(&self.files)?;
            }
            debug!("Checkpointed {} remaining files", self.files.len());
        }

        self.delay = match self.files.front() {
            Some(next) => next_delay(&file, next),
            None => Duration::ZERO,
        };
        info!(
            "Moved file {}",
            file.file_path.file_name().unwrap_or_default().to_string_lossy()
        );

        self.state = if self.files.is_empty() { ReplayState::Drained } else { ReplayState::Pending };
        Ok(Some(copied))
    }

    /// Drains the whole queue.
    pub async fn run(mut self) -> Result<ReplaySummary, ReplayError> {
        while self.step().await?.is_some() {}
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::header::parse_timestamp;

    fn info_at(path: &str, ts: &str) -> FileInfo {
        FileInfo {
            file_path: PathBuf::from(path),
            completion_time: parse_timestamp(ts).unwrap(),
        }
    }

    #[test]
    fn test_short_gap_is_tripled() {
        let a = info_at("/s/run1/a.fq", "2023-01-01T00:00:00Z");
        let b = info_at("/s/run1/b.fq", "2023-01-01T00:00:03Z");
        assert_eq!(next_delay(&a, &b), Duration::from_secs(9));
    }

    #[test]
    fn test_long_gap_is_kept() {
        let a = info_at("/s/run1/a.fq", "2023-01-01T00:00:00Z");
        let b = info_at("/s/run1/b.fq", "2023-01-01T00:00:20Z");
        assert_eq!(next_delay(&a, &b), Duration::from_secs(20));
    }

    #[test]
    fn test_gap_at_threshold_is_kept() {
        let a = info_at("/s/run1/a.fq", "2023-01-01T00:00:00Z");
        let b = info_at("/s/run1/b.fq", "2023-01-01T00:00:05Z");
        assert_eq!(next_delay(&a, &b), Duration::from_secs(5));
    }

    #[test]
    fn test_gap_is_absolute() {
        let a = info_at("/s/run1/a.fq", "2023-01-01T00:00:20Z");
        let b = info_at("/s/run1/b.fq", "2023-01-01T00:00:00Z");
        assert_eq!(next_delay(&a, &b), Duration::from_secs(20));
        assert_eq!(next_delay(&a, &a), Duration::ZERO);
    }

    #[test]
    fn test_destination_mirrors_parent_dir() {
        let file = info_at("/data/barcode07/a.fastq.gz", "2023-01-01T00:00:00Z");
        assert_eq!(destination_for(&file, Path::new("/out")), PathBuf::from("/out/barcode07"));
    }

    #[test]
    fn test_new_scheduler_state() {
        let empty = ReplayScheduler::new(OrderedFileList::new(), "/out");
        assert_eq!(empty.state(), ReplayState::Drained);
        let queue: OrderedFileList = vec![info_at("/s/r/a.fq", "2023-01-01T00:00:00Z")].into();
        let scheduler = ReplayScheduler::new(queue, "/out");
        assert_eq!(scheduler.state(), ReplayState::Pending);
        assert_eq!(scheduler.current_delay(), Duration::ZERO);
    }
}
