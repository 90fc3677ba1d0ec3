use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::errors::DbError;
use crate::item::InboxItem;
use crate::query::aggregate::Page;
use crate::query::eval::eval_filter;
use crate::query::metrics::QueryMetrics;
use crate::query::types::{FeedOptions, Selection, SqlQuery};

use super::{Container, PageStream};

/// Flat request charge per page, plus a per-document charge, in milli-units.
const PAGE_CHARGE_MILLI: u64 = 2_000;
const DOC_CHARGE_MILLI: u64 = 100;

/// In-process partitioned container. Rows are raw JSON kept per partition in
/// insertion order, which is also the order queries return them in.
pub struct MemoryContainer {
    partition_key_path: String,
    partitions: RwLock<BTreeMap<String, Vec<Value>>>,
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new("inboxId")
    }
}

impl std::fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContainer")
            .field("partition_key_path", &self.partition_key_path)
            .field("partitions", &self.partitions.read().len())
            .finish()
    }
}

impl MemoryContainer {
    #[must_use]
    pub fn new(partition_key_path: impl Into<String>) -> Self {
        Self {
            partition_key_path: partition_key_path.into(),
            partitions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert a raw row. The partition is read from the row's partition key field.
    pub fn insert_raw(&self, row: Value) -> Result<(), DbError> {
        let pk = row
            .get(&self.partition_key_path)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DbError::InvalidArgument(format!("row has no string `{}` field", self.partition_key_path))
            })?
            .to_string();
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DbError::InvalidArgument("row has no string `id` field".into()))?
            .to_string();
        let mut parts = self.partitions.write();
        let rows = parts.entry(pk.clone()).or_default();
        if rows.iter().any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(DbError::Conflict(format!("{id} in partition {pk}")));
        }
        rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load rows from newline-delimited JSON. Blank lines are skipped.
    pub fn load_ndjson<R: Read>(&self, reader: R) -> Result<usize, DbError> {
        let mut n = 0usize;
        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v: Value = serde_json::from_str(line)
                .map_err(|e| DbError::InvalidArgument(format!("line {}: {e}", line_no + 1)))?;
            self.insert_raw(v)?;
            n += 1;
        }
        Ok(n)
    }

    pub fn load_ndjson_file(&self, path: &Path) -> Result<usize, DbError> {
        let f = std::fs::File::open(path).map_err(|e| DbError::Io(format!("{}: {e}", path.display())))?;
        self.load_ndjson(f)
    }

    /// Write every row as NDJSON, partitions in key order.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<usize, DbError> {
        let parts = self.partitions.read();
        let mut n = 0usize;
        for row in parts.values().flatten() {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
            n += 1;
        }
        writer.flush()?;
        Ok(n)
    }

    fn execute(&self, query: &SqlQuery, options: &FeedOptions) -> Vec<Page> {
        let started = Instant::now();
        let parts = self.partitions.read();
        let partition: &[Value] = parts.get(&options.partition_key).map_or(&[][..], Vec::as_slice);
        let matched: Vec<Value> = partition
            .iter()
            .filter(|row| eval_filter(row, &query.filter))
            .cloned()
            .collect();
        drop(parts);
        let prep = started.elapsed();

        match query.selection {
            Selection::Count => {
                let rows = vec![Value::from(matched.len())];
                let metrics = options.populate_query_metrics.then(|| QueryMetrics {
                    retrieved_document_count: usize_to_u64(matched.len()),
                    retrieved_document_size: rows_size(&matched),
                    output_document_count: 1,
                    output_document_size: rows_size(&rows),
                    index_hit_document_count: usize_to_u64(matched.len()),
                    total_query_execution_time: started.elapsed(),
                    query_preparation_time: prep,
                    runtime_execution_time: started.elapsed().saturating_sub(prep),
                    request_charge_milli: PAGE_CHARGE_MILLI,
                    ..QueryMetrics::default()
                });
                vec![Page::new(rows, metrics)]
            }
            Selection::Items => {
                let page_size = options.max_item_count.max(1);
                if matched.is_empty() {
                    let metrics = options
                        .populate_query_metrics
                        .then(|| page_metrics(&[], prep, Duration::ZERO));
                    return vec![Page::new(Vec::new(), metrics)];
                }
                let mut pages = Vec::with_capacity(matched.len().div_ceil(page_size));
                for (i, chunk) in matched.chunks(page_size).enumerate() {
                    let load = Instant::now();
                    let rows = chunk.to_vec();
                    let metrics = options.populate_query_metrics.then(|| {
                        let p = if i == 0 { prep } else { Duration::ZERO };
                        page_metrics(&rows, p, load.elapsed())
                    });
                    pages.push(Page::new(rows, metrics));
                }
                pages
            }
        }
    }
}

fn page_metrics(rows: &[Value], prep: Duration, load: Duration) -> QueryMetrics {
    let n = usize_to_u64(rows.len());
    let size = rows_size(rows);
    QueryMetrics {
        retrieved_document_count: n,
        retrieved_document_size: size,
        output_document_count: n,
        output_document_size: size,
        index_hit_document_count: n,
        total_query_execution_time: prep + load,
        query_preparation_time: prep,
        document_load_time: load,
        request_charge_milli: PAGE_CHARGE_MILLI + n * DOC_CHARGE_MILLI,
        ..QueryMetrics::default()
    }
}

fn rows_size(rows: &[Value]) -> u64 {
    rows.iter().map(|r| usize_to_u64(r.to_string().len())).sum()
}

fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

impl Container for MemoryContainer {
    fn query_items<'a>(&'a self, query: &SqlQuery, options: &FeedOptions) -> PageStream<'a> {
        let pages = self.execute(query, options);
        stream::iter(pages.into_iter().map(Ok)).boxed()
    }

    fn create_item<'a>(
        &'a self,
        item: &InboxItem,
        partition_key: &str,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        let res = if item.inbox_id == partition_key {
            serde_json::to_value(item).map_err(DbError::from).and_then(|row| self.insert_raw(row))
        } else {
            Err(DbError::InvalidArgument(format!(
                "partition key {partition_key} does not match item inbox {}",
                item.inbox_id
            )))
        };
        Box::pin(async move { res })
    }
}
