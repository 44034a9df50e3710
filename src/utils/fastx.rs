use std::io::{self, BufRead};

const FASTA_MARKER: u8 = b'>';
const FASTQ_MARKER: u8 = b'@';
const QUALITY_MARKER: u8 = b'+';

/// One FASTA or FASTQ record as read from the stream.
/// `qual` is `None` for FASTA records and for FASTQ records whose quality block was cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub desc: String,
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
}

impl Record {
    fn from_header(header: &[u8]) -> Self {
        let desc = String::from_utf8_lossy(&header[1..]).into_owned();
        let name = desc.split(' ').next().unwrap_or_default().to_string();
        Record {
            desc,
            name,
            seq: Vec::new(),
            qual: None,
        }
    }

    pub fn is_fastq(&self) -> bool {
        self.qual.is_some()
    }
}

fn is_header(line: &[u8]) -> bool {
    matches!(line.first(), Some(&FASTA_MARKER) | Some(&FASTQ_MARKER))
}

fn ends_block(line: &[u8]) -> bool {
    matches!(line.first(), Some(&FASTA_MARKER) | Some(&FASTQ_MARKER) | Some(&QUALITY_MARKER))
}

/// Streaming reader for mixed FASTA/FASTQ text.
///
/// The line that closes one record's sequence is often the header of the next record,
/// so the reader keeps it in `held` until the following call to `next_record`.
pub struct FastxReader<R: BufRead> {
    reader: R,
    held: Option<Vec<u8>>,
    finished: bool,
    line_buf: Vec<u8>,
}

impl<R: BufRead> FastxReader<R> {
    pub fn new(reader: R) -> Self {
        FastxReader {
            reader,
            held: None,
            finished: false,
            line_buf: Vec::with_capacity(256),
        }
    }

    /// The held header line, if the last record ended on one.
    pub fn held_line(&self) -> Option<&[u8]> {
        self.held.as_deref()
    }

    /// Next line without its `\n` or `\r\n` terminator; `None` at end of stream.
    fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.line_buf.clear();
        if self.reader.read_until(b'\n', &mut self.line_buf)? == 0 {
            return Ok(None);
        }
        if self.line_buf.last() == Some(&b'\n') {
            self.line_buf.pop();
            if self.line_buf.last() == Some(&b'\r') {
                self.line_buf.pop();
            }
        }
        Ok(Some(self.line_buf.as_slice()))
    }

    fn finish(&mut self, record: Record) -> Option<Record> {
        self.finished = true;
        Some(record)
    }

    /// Reads one record.
    ///
    /// # Returns
    /// io::Result<Option<Record>>: `None` once the stream holds no further header.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        let mut record = match self.held.take() {
            Some(header) => Record::from_header(&header),
            None => loop {
                match self.next_line()? {
                    None => {
                        self.finished = true;
                        return Ok(None);
                    }
                    Some(line) if is_header(line) => break Record::from_header(line),
                    Some(_) => continue,
                }
            },
        };

        let mut saw_quality_marker = false;
        loop {
            match self.next_line()? {
                None => return Ok(self.finish(record)),
                Some(line) if ends_block(line) => {
                    if line[0] == QUALITY_MARKER {
                        saw_quality_marker = true;
                    } else {
                        self.held = Some(line.to_vec());
                    }
                    break;
                }
                Some(line) => record.seq.extend_from_slice(line),
            }
        }

        if !saw_quality_marker {
            return Ok(Some(record));
        }

        let mut qual = Vec::with_capacity(record.seq.len());
        loop {
            match self.next_line()? {
                // Stream ended inside the quality block: keep the record, drop the partial quality.
                None => return Ok(self.finish(record)),
                Some(line) => {
                    qual.extend_from_slice(line);
                    if qual.len() >= record.seq.len() {
                        record.qual = Some(qual);
                        return Ok(Some(record));
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for FastxReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
