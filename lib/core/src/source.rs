//! Record sources
//!
//! The engine consumes candidates as an iterator. Backing stores expose keyed
//! pagination through [`BatchSource`] and [`ChunkedRecords`] turns that into a
//! lazy iterator holding at most one batch in memory at a time.

use crate::error::{ConfigError, Error, Result};
use crate::record::JsonRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Batch size used when the caller does not pick one
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// A store that can be paged through by a monotonically increasing key
pub trait BatchSource {
    type Record;

    /// Return up to `limit` records whose key is strictly greater than `after`
    /// (or from the beginning when `after` is `None`), ordered by key.
    fn fetch_after(&mut self, after: Option<u64>, limit: usize) -> Result<Vec<(u64, Self::Record)>>;
}

/// Lazy iterator over a [`BatchSource`], one chunk at a time
pub struct ChunkedRecords<S: BatchSource> {
    source: S,
    chunk_size: usize,
    cursor: Option<u64>,
    buffer: std::vec::IntoIter<(u64, S::Record)>,
    exhausted: bool,
    batches_loaded: usize,
}

impl<S: BatchSource> ChunkedRecords<S> {
    pub fn new(source: S, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize.into());
        }
        Ok(Self {
            source,
            chunk_size,
            cursor: None,
            buffer: Vec::new().into_iter(),
            exhausted: false,
            batches_loaded: 0,
        })
    }

    pub fn with_default_chunk(source: S) -> Self {
        Self {
            source,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cursor: None,
            buffer: Vec::new().into_iter(),
            exhausted: false,
            batches_loaded: 0,
        }
    }

    pub fn batches_loaded(&self) -> usize {
        self.batches_loaded
    }

    fn load_next_batch(&mut self) -> Result<bool> {
        // Only an empty batch ends the stream; a short one may precede a deferred error
        let batch = self.source.fetch_after(self.cursor, self.chunk_size)?;
        if batch.is_empty() {
            self.exhausted = true;
            return Ok(false);
        }

        // A source that does not advance would loop forever
        if let (Some(cursor), Some((first, _))) = (self.cursor, batch.first()) {
            if *first <= cursor {
                return Err(Error::Source(format!(
                    "batch starts at key {} which does not advance past {}",
                    first, cursor
                )));
            }
        }

        self.batches_loaded += 1;
        debug!(batch = self.batches_loaded, size = batch.len(), "loaded record batch");
        self.buffer = batch.into_iter();
        Ok(true)
    }
}

impl<S: BatchSource> Iterator for ChunkedRecords<S> {
    type Item = Result<S::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, record)) = self.buffer.next() {
                self.cursor = Some(key);
                return Some(Ok(record));
            }
            if self.exhausted {
                return None;
            }
            match self.load_next_batch() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// In-memory source over a slice, yielding borrowed records keyed by position
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a, R> {
    records: &'a [R],
}

impl<'a, R> SliceSource<'a, R> {
    pub fn new(records: &'a [R]) -> Self {
        Self { records }
    }
}

impl<'a, R> BatchSource for SliceSource<'a, R> {
    type Record = &'a R;

    fn fetch_after(&mut self, after: Option<u64>, limit: usize) -> Result<Vec<(u64, &'a R)>> {
        let start = after.map(|key| key as usize + 1).unwrap_or(0);
        Ok(self
            .records
            .iter()
            .enumerate()
            .skip(start)
            .take(limit)
            .map(|(i, record)| (i as u64, record))
            .collect())
    }
}

/// Forward-only source reading one JSON object per line.
///
/// Keys are 1-based line numbers; blank lines are skipped. A malformed line
/// ends the batch it falls in and is reported by the following fetch, so the
/// records before it are always yielded.
pub struct JsonLinesSource<B> {
    reader: B,
    shape: String,
    line_no: u64,
    last_key: Option<u64>,
    pending: Option<Error>,
}

impl<B: BufRead> JsonLinesSource<B> {
    pub fn new(reader: B, shape: impl Into<String>) -> Self {
        Self {
            reader,
            shape: shape.into(),
            line_no: 0,
            last_key: None,
            pending: None,
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, shape: impl Into<String>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), shape))
    }
}

impl<B: BufRead> BatchSource for JsonLinesSource<B> {
    type Record = JsonRecord;

    fn fetch_after(&mut self, after: Option<u64>, limit: usize) -> Result<Vec<(u64, JsonRecord)>> {
        if let Some(e) = self.pending.take() {
            return Err(e);
        }
        if let (Some(after), Some(last)) = (after, self.last_key) {
            if after < last {
                return Err(Error::Source(format!(
                    "JSON lines source cannot rewind to line {} from line {}",
                    after, last
                )));
            }
        }

        let mut batch = Vec::with_capacity(limit);
        let mut line = String::new();
        while batch.len() < limit {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value = match serde_json::from_str(trimmed) {
                Ok(value) => value,
                Err(e) => {
                    let err = Error::Source(format!("line {}: {}", self.line_no, e));
                    if batch.is_empty() {
                        return Err(err);
                    }
                    self.pending = Some(err);
                    break;
                }
            };
            batch.push((self.line_no, JsonRecord::new(self.shape.clone(), value)));
            self.last_key = Some(self.line_no);
        }
        Ok(batch)
    }
}
