use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::config::defs::ReplayError;
use crate::pipelines::scan::OrderedFileList;

/// Persisted snapshot of the ordered file queue.
pub trait FileListStore {
    /// The saved queue, or `None` when nothing usable is stored.
    fn load(&self) -> Option<OrderedFileList>;

    fn save(&self, files: &OrderedFileList) -> Result<(), ReplayError>;

    /// Forgets the saved queue so the next run scans again.
    fn clear(&self) -> Result<(), ReplayError>;
}

/// Stores the queue as a bincode blob in a single file.
pub struct BincodeFileListStore {
    path: PathBuf,
}

impl BincodeFileListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BincodeFileListStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileListStore for BincodeFileListStore {
    fn load(&self) -> Option<OrderedFileList> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!("Failed to read cached file list {}: {}", self.path.display(), e);
                return None;
            }
        };
        let config = bincode::config::standard();
        match bincode::serde::decode_from_slice::<OrderedFileList, _>(&data, config) {
            Ok((files, _)) if files.is_empty() => {
                debug!("Cached file list {} is empty", self.path.display());
                None
            }
            Ok((files, _)) => {
                debug!("Loaded {} cached entries from {}", files.len(), self.path.display());
                Some(files)
            }
            Err(e) => {
                error!("Failed to load cached file list {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, files: &OrderedFileList) -> Result<(), ReplayError> {
        let config = bincode::config::standard();
        let data = bincode::serde::encode_to_vec(files, config)
            .map_err(|e| ReplayError::Cache(format!("Cannot encode file list: {}", e)))?;
        // Written beside the cache and renamed into place.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).map_err(|e| ReplayError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| ReplayError::io(&self.path, e))
    }

    fn clear(&self) -> Result<(), ReplayError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReplayError::io(&self.path, e)),
        }
    }
}
