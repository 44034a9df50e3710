use std::collections::VecDeque;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::defs::ReplayError;
use crate::utils::fastx::FastxReader;
use crate::utils::file::{is_sequence_file, open_sequence_file};
use crate::utils::header::{generation_duration, parse_header_fields, TimestampResolver};

/// A sequence file and the estimated time the instrument finished writing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_path: PathBuf,
    pub completion_time: DateTime<Utc>,
}

/// Files in ascending completion order, drained from the front during replay.
pub type OrderedFileList = VecDeque<FileInfo>;

/// Outcome of reading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEstimate {
    pub completion_time: DateTime<Utc>,
    pub records: usize,
    pub estimated_reads: usize,
}

/// Reduces a file's records to the latest read completion time.
///
/// # Arguments
///
/// * `reader` - Buffered FASTA/FASTQ text.
/// * `file_label` - Name used in warnings about reads without a start time.
/// * `resolver` - Resolves each read's header to a time.
///
/// # Returns
/// Ok(None) when the stream holds no records.
pub fn estimate_completion_time<R: BufRead>(
    reader: R,
    file_label: &str,
    resolver: &mut TimestampResolver,
) -> std::io::Result<Option<FileEstimate>> {
    let mut latest: Option<DateTime<Utc>> = None;
    let mut records = 0;
    let mut estimated_reads = 0;

    for record in FastxReader::new(reader) {
        let record = record?;
        let fields = parse_header_fields(&record.desc);
        let read_time = resolver.resolve(&fields, generation_duration(record.seq.len()));
        // Every estimated read is both warned about and counted.
        if read_time.is_estimated() {
            warn!(
                "No start time for read {} in file {}, randomly assigning time....",
                record.name, file_label
            );
            estimated_reads += 1;
        }
        records += 1;
        latest = latest.max(Some(read_time.time()));
    }

    Ok(latest.map(|completion_time| FileEstimate {
        completion_time,
        records,
        estimated_reads,
    }))
}

/// Recursively lists files under `dir`, visiting entries in name order.
/// Links to files are listed; links to directories are never descended into.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ReplayError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| ReplayError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ReplayError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ReplayError::io(&path, e))?;
        if file_type.is_dir() {
            walk_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        } else if file_type.is_symlink() {
            if path.is_file() {
                out.push(path);
            } else if path.is_dir() {
                debug!("Not following directory link {}", path.display());
            }
        }
    }
    Ok(())
}

/// Finds every FASTA/FASTQ file under `src_dir` and orders them by estimated completion time.
///
/// # Arguments
///
/// * `src_dir` - Root of the tree to scan.
/// * `resolver` - Resolves read headers to times.
///
/// # Returns
/// OrderedFileList ascending by completion time. Ties keep the walk order.
pub fn scan_directory(
    src_dir: &Path,
    resolver: &mut TimestampResolver,
) -> Result<OrderedFileList, ReplayError> {
    let mut paths = Vec::new();
    walk_files(src_dir, &mut paths)?;

    let mut file_list: Vec<FileInfo> = Vec::new();
    let mut skipped = 0;
    let mut estimated_reads = 0;

    for path in paths.into_iter().filter(|p| is_sequence_file(p)) {
        // The cached queue stores paths as strings.
        if path.to_str().is_none() {
            warn!("File name of {} is not valid UTF-8 and cannot be cached, skipping", path.display());
            skipped += 1;
            continue;
        }
        let file_label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let reader = open_sequence_file(&path).map_err(|e| ReplayError::io(&path, e))?;
        match estimate_completion_time(reader, &file_label, resolver)
            .map_err(|e| ReplayError::io(&path, e))?
        {
            Some(estimate) => {
                debug!(
                    "{}: {} reads, completion time {}",
                    path.display(),
                    estimate.records,
                    estimate.completion_time.to_rfc3339()
                );
                estimated_reads += estimate.estimated_reads;
                file_list.push(FileInfo {
                    file_path: path,
                    completion_time: estimate.completion_time,
                });
            }
            None => {
                warn!("No reads found in {}, skipping", path.display());
                skipped += 1;
            }
        }
    }

    file_list.sort_by_key(|f| f.completion_time);
    info!(
        "Scanned {}: {} files to replay, {} skipped, {} reads with estimated times",
        src_dir.display(),
        file_list.len(),
        skipped,
        estimated_reads
    );
    Ok(file_list.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::header::parse_timestamp;
    use crate::utils::system::generate_rng;
    use chrono::TimeDelta;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn resolver() -> TimestampResolver {
        TimestampResolver::new(generate_rng(Some(1)))
    }

    #[test]
    fn test_estimate_takes_latest_read() -> anyhow::Result<()> {
        let text = "@r1 start_time=2023-01-01T00:00:10Z\nACGT\n+\nIIII\n\
                    @r2 start_time=2023-01-01T00:00:30Z\nACGT\n+\nIIII\n\
                    @r3 start_time=2023-01-01T00:00:20Z\nACGT\n+\nIIII\n";
        let estimate = estimate_completion_time(Cursor::new(text), "x.fastq", &mut resolver())?.unwrap();
        assert_eq!(estimate.records, 3);
        assert_eq!(estimate.estimated_reads, 0);
        let expected = parse_timestamp("2023-01-01T00:00:30Z").unwrap() + TimeDelta::microseconds(8_889);
        assert_eq!(estimate.completion_time, expected);
        Ok(())
    }

    #[test]
    fn test_estimate_includes_generation_duration() -> anyhow::Result<()> {
        let seq = "A".repeat(900);
        let text = format!(">r1 start_time=2023-01-01T00:00:00Z\n{}\n", seq);
        let estimate = estimate_completion_time(Cursor::new(text), "x.fasta", &mut resolver())?.unwrap();
        assert_eq!(estimate.completion_time, parse_timestamp("2023-01-01T00:00:02Z").unwrap());
        Ok(())
    }

    #[test]
    fn test_estimate_empty_stream() -> anyhow::Result<()> {
        assert!(estimate_completion_time(Cursor::new(""), "e.fa", &mut resolver())?.is_none());
        Ok(())
    }

    #[test]
    fn test_estimate_counts_fallback_reads() -> anyhow::Result<()> {
        let text = ">r1\nACGT\n>r2 start_time=2001-01-01T00:00:00Z\nAC\n";
        let estimate = estimate_completion_time(Cursor::new(text), "m.fa", &mut resolver())?.unwrap();
        assert_eq!(estimate.records, 2);
        assert_eq!(estimate.estimated_reads, 1);
        // The fallback time is recent, so it wins over the 2001 read.
        assert!(estimate.completion_time > parse_timestamp("2020-01-01T00:00:00Z").unwrap());
        Ok(())
    }

    #[test]
    fn test_scan_filters_and_orders() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let run1 = dir.path().join("run1");
        let run2 = dir.path().join("run2");
        fs::create_dir_all(&run1)?;
        fs::create_dir_all(&run2)?;
        fs::write(run1.join("late.fasta"), ">r start_time=2023-01-01T00:05:00Z\nA\n")?;
        fs::write(run2.join("early.fa"), ">r start_time=2023-01-01T00:01:00Z\nA\n")?;
        fs::write(run2.join("mid.fq"), "@r start_time=2023-01-01T00:03:00Z\nA\n+\nI\n")?;
        fs::write(run1.join("late.fasta.fxi"), "index")?;
        fs::write(run1.join("notes.txt"), ">r start_time=2000-01-01T00:00:00Z\nA\n")?;
        fs::write(run1.join("empty.fna"), "")?;

        let files = scan_directory(dir.path(), &mut resolver())?;
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["early.fa", "mid.fq", "late.fasta"]);
        assert!(files.iter().all(|f| f.file_path.starts_with(dir.path())));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_directory_links() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let run1 = dir.path().join("run1");
        fs::create_dir_all(&run1)?;
        fs::write(run1.join("a.fasta"), ">r start_time=2023-01-01T00:00:00Z\nA\n")?;
        std::os::unix::fs::symlink(dir.path(), run1.join("loop"))?;

        let files = scan_directory(dir.path(), &mut resolver())?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_path, run1.join("a.fasta"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_lists_file_links() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let outside = tempdir()?;
        let target = outside.path().join("b.fq");
        fs::write(&target, "@r start_time=2023-01-01T00:00:00Z\nA\n+\nI\n")?;
        std::os::unix::fs::symlink(&target, dir.path().join("b.fq"))?;

        let files = scan_directory(dir.path(), &mut resolver())?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_path, dir.path().join("b.fq"));
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_scan_skips_non_utf8_names() -> anyhow::Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir()?;
        let header = ">r start_time=2023-01-01T00:00:00Z\nA\n";
        fs::write(dir.path().join(OsStr::from_bytes(b"r\xffead.fasta")), header)?;
        fs::write(dir.path().join("read.fasta"), header)?;

        let files = scan_directory(dir.path(), &mut resolver())?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_path, dir.path().join("read.fasta"));
        Ok(())
    }

    #[test]
    fn test_scan_missing_dir_is_error() {
        let err = scan_directory(Path::new("/definitely/not/here"), &mut resolver()).unwrap_err();
        assert!(matches!(err, ReplayError::Io { .. }));
    }
}
