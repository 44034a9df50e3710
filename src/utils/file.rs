use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::config::defs::{GZIP_EXT, INDEX_EXT, SEQUENCE_EXTS};

/// Enum to hold either an uncompressed or gzipped file reader
pub enum FileReader {
    Uncompressed(File),
    Gzipped(MultiGzDecoder<File>),
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileReader::Uncompressed(r) => r.read(buf),
            FileReader::Gzipped(r) => r.read(buf),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

impl Compression {
    /// Picks the decompression handler from the file name alone; content is never sniffed.
    pub fn from_path(path: &Path) -> Self {
        if file_suffixes(path).iter().any(|ext| ext == GZIP_EXT) {
            Compression::Gzip
        } else {
            Compression::Plain
        }
    }
}

/// Lower-cased name suffixes, without dots, in order.
/// `reads.fastq.gz` gives `["fastq", "gz"]`; leading dots of hidden files are not separators.
/// Names that are not valid UTF-8 are matched on their lossy form.
pub fn file_suffixes(path: &Path) -> Vec<String> {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return Vec::new(),
    };
    if name.ends_with('.') {
        return Vec::new();
    }
    name.trim_start_matches('.')
        .split('.')
        .skip(1)
        .map(|s| s.to_ascii_lowercase())
        .collect()
}

/// True when the file name marks a FASTA or FASTQ file and is not a sequence index.
pub fn is_sequence_file(path: &Path) -> bool {
    let suffixes = file_suffixes(path);
    if suffixes.last().map(String::as_str) == Some(INDEX_EXT) {
        return false;
    }
    suffixes.iter().any(|ext| SEQUENCE_EXTS.contains(ext.as_str()))
}

/// Opens a sequence file, decompressing it when the name says it is gzipped.
pub fn open_sequence_file(path: &Path) -> io::Result<BufReader<FileReader>> {
    let file = File::open(path)?;
    let reader = match Compression::from_path(path) {
        Compression::Gzip => FileReader::Gzipped(MultiGzDecoder::new(file)),
        Compression::Plain => FileReader::Uncompressed(file),
    };
    Ok(BufReader::new(reader))
}

/// Name of the directory directly containing `path`, used to group replayed files.
pub fn parent_dir_name(path: &Path) -> Option<&std::ffi::OsStr> {
    path.parent().and_then(|p| p.file_name())
}

/// Copies `src` into `dir`, creating `dir` and its parents as needed.
/// An existing file of the same name is overwritten; `src` is left untouched.
///
/// # Returns
/// Path of the new copy.
pub async fn copy_into_dir(src: &Path, dir: &Path) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = src.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("No file name in {}", src.display()))
    })?;
    let target = dir.join(file_name);
    tokio::fs::copy(src, &target).await?;
    Ok(target)
}
