use std::path::PathBuf;
use lazy_static::lazy_static;
use std::collections::HashSet;
use thiserror::Error;

use crate::cli::Arguments;

// Recognised file name suffixes
pub const GZIP_EXT: &str = "gz";
pub const INDEX_EXT: &str = "fxi";
pub const FASTA_EXTS: &[&'static str] = &["fna", "fa", "fsa", "fasta"];
pub const FASTQ_EXTS: &[&'static str] = &["fastq", "fq"];

lazy_static! {
    pub static ref SEQUENCE_EXTS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.extend(FASTQ_EXTS.iter().copied());
        s.extend(FASTA_EXTS.iter().copied());
        s
    };
}

// Static Filenames
pub const CACHE_FILE_NAME: &str = "sorted_files.bin";

// Static Parameters

/// Approximate base-call rate of the instrument, bases per second.
pub const BASES_PER_SECOND: f64 = 450.0;
/// Header key holding the read start time.
pub const START_TIME_KEY: &str = "start_time";
/// Upper bound, in seconds, of the offset subtracted from "now" for reads without a start time.
pub const FALLBACK_JITTER_SECS: i64 = 60;
/// Gaps shorter than this are stretched by `SMOOTHING_FACTOR`.
pub const SMOOTHING_THRESHOLD_SECS: f64 = 5.0;
pub const SMOOTHING_FACTOR: f64 = 3.0;


/// Fully resolved description of one run, built from the command line and the optional config file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub src_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub cache_path: PathBuf,
    pub seed: Option<u64>,
    pub rescan: bool,
    pub checkpoint: bool,
    pub args: Arguments,
}


#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Specified {role} directory does not exist: {}. Please double check given path.", .path.display())]
    MissingDirectory {
        role: &'static str,
        path: PathBuf,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache error: {0}")]
    Cache(String),
}

impl ReplayError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReplayError::Io { path: path.into(), source }
    }
}
