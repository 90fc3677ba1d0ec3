use serde_json::Value;
use std::time::Instant;

use crate::errors::DbError;
use crate::item::InboxItem;
use crate::logger::{METRICS_TARGET, QUERY_TARGET};
use crate::store::Container;

use super::aggregate::{AggregateResult, aggregate};
use super::builder::InboxQuery;
use super::telemetry;
use super::types::Selection;

/// Build, execute and fold one query, then apply `project` to the folded result.
/// Query text and combined metrics are logged only when the query has logging
/// enabled. A projection failure is recorded as a failed query.
pub async fn execute<C, T, F>(
    container: &C,
    query: &InboxQuery,
    selection: Selection,
    project: F,
) -> Result<T, DbError>
where
    C: Container + ?Sized,
    F: FnOnce(AggregateResult) -> Result<T, DbError>,
{
    let sql = query.build(selection);
    let options = query.feed_options();
    let literal = sql.to_literal();
    if query.logging() {
        crate::qlog!(QUERY_TARGET, log::Level::Info, "Query: {literal}");
    }
    let start = Instant::now();
    let folded = aggregate(container.query_items(&sql, &options)).await;
    let result = match folded {
        Ok(r) => r,
        Err(e) => {
            telemetry::record_error(query.inbox_id(), selection, &e);
            return Err(e);
        }
    };
    if query.logging() {
        match &result.metrics {
            Some(m) => crate::qlog!(METRICS_TARGET, log::Level::Info, "Query metrics:\n{m}"),
            None => crate::qlog!(METRICS_TARGET, log::Level::Info, "Query metrics: not reported"),
        }
    }
    let (pages, rows) = (result.pages, result.rows.len());
    match project(result) {
        Ok(out) => {
            let elapsed = start.elapsed();
            telemetry::record_query(query.inbox_id(), selection, &literal, pages, rows, elapsed);
            Ok(out)
        }
        Err(e) => {
            telemetry::record_error(query.inbox_id(), selection, &e);
            Err(e)
        }
    }
}

/// Read the count out of aggregate rows. Each row is a bare integer or an
/// `{"_aggregate": n}` object; partial aggregates from several pages are summed.
pub fn project_count(rows: &[Value]) -> Result<u64, DbError> {
    if rows.is_empty() {
        return Err(DbError::QueryExecution("count query returned no aggregate row".into()));
    }
    rows.iter().try_fold(0u64, |acc, row| {
        let n = row
            .as_u64()
            .or_else(|| row.get("_aggregate").and_then(Value::as_u64))
            .ok_or_else(|| DbError::QueryExecution(format!("unexpected aggregate row: {row}")))?;
        Ok(acc.saturating_add(n))
    })
}

/// Map rows onto `InboxItem`, stopping at the first row that does not fit.
pub fn project_items(rows: Vec<Value>) -> Result<Vec<InboxItem>, DbError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::Deserialization))
        .collect()
}

impl InboxQuery {
    /// Number of items matching the current filter.
    pub async fn count<C: Container + ?Sized>(&self, container: &C) -> Result<u64, DbError> {
        execute(container, self, Selection::Count, |r| project_count(&r.rows)).await
    }

    /// Items matching the current filter, in page-then-row order.
    pub async fn list<C: Container + ?Sized>(&self, container: &C) -> Result<Vec<InboxItem>, DbError> {
        execute(container, self, Selection::Items, |r| project_items(r.rows)).await
    }
}
