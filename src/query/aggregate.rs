//! Folding a paged query feed into one result.
//!
//! Rows are concatenated in arrival order (page order, then row order within a
//! page). Metrics are combined with [`combine`], which ignores arrival order.

use futures_util::{Stream, TryStreamExt};
use serde_json::Value;

use crate::errors::DbError;

use super::metrics::{QueryMetrics, combine};

/// One response page from the container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    pub metrics: Option<QueryMetrics>,
}

impl Page {
    #[must_use]
    pub const fn new(rows: Vec<Value>, metrics: Option<QueryMetrics>) -> Self {
        Self { rows, metrics }
    }

    /// Build a page whose metrics arrive split per partition key range.
    /// An empty iterator means the container did not collect metrics.
    pub fn from_partition_metrics<I>(rows: Vec<Value>, ranges: I) -> Self
    where
        I: IntoIterator<Item = (String, QueryMetrics)>,
    {
        let metrics = ranges.into_iter().map(|(_, m)| Some(m)).reduce(combine).flatten();
        Self { rows, metrics }
    }
}

/// Everything a query returned, across all pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub rows: Vec<Value>,
    pub metrics: Option<QueryMetrics>,
    pub pages: usize,
}

/// Explicit accumulator for the page fold.
#[derive(Debug, Default)]
pub struct Collector {
    acc: Option<AggregateResult>,
}

impl Collector {
    #[must_use]
    pub const fn new() -> Self {
        Self { acc: None }
    }

    pub fn push(&mut self, page: Page) {
        let acc = self.acc.get_or_insert_with(AggregateResult::default);
        acc.rows.extend(page.rows);
        acc.metrics = combine(acc.metrics, page.metrics);
        acc.pages += 1;
    }

    #[must_use]
    pub fn pages(&self) -> usize {
        self.acc.as_ref().map_or(0, |a| a.pages)
    }

    /// Finish the fold. A feed that produced no page at all is [`DbError::EmptyFeed`],
    /// distinct from a feed of empty pages.
    pub fn finish(self) -> Result<AggregateResult, DbError> {
        self.acc.ok_or(DbError::EmptyFeed)
    }
}

/// Consume `pages` strictly in arrival order and fold them into one result.
/// The first error aborts the fold and is returned unchanged.
pub async fn aggregate<S>(pages: S) -> Result<AggregateResult, DbError>
where
    S: Stream<Item = Result<Page, DbError>>,
{
    let mut pages = std::pin::pin!(pages);
    let mut collector = Collector::new();
    while let Some(page) = pages.try_next().await? {
        collector.push(page);
    }
    collector.finish()
}

/// Synchronous counterpart of [`aggregate`] for already materialized pages.
pub fn aggregate_pages<I>(pages: I) -> Result<AggregateResult, DbError>
where
    I: IntoIterator<Item = Page>,
{
    let mut collector = Collector::new();
    for page in pages {
        collector.push(page);
    }
    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde_json::json;

    fn metrics(n: u64) -> QueryMetrics {
        QueryMetrics { retrieved_document_count: n, output_document_count: n, ..QueryMetrics::default() }
    }

    #[test]
    fn rows_keep_page_then_row_order() {
        let out = aggregate_pages(vec![
            Page::new(vec![json!(1), json!(2)], None),
            Page::new(vec![], None),
            Page::new(vec![json!(3)], None),
        ])
        .unwrap();
        assert_eq!(out.rows, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(out.pages, 3);
        assert_eq!(out.metrics, None);
    }

    #[test]
    fn zero_pages_is_distinct_from_empty_page() {
        assert!(matches!(aggregate_pages(Vec::new()), Err(DbError::EmptyFeed)));
        let one_empty = aggregate_pages(vec![Page::default()]).unwrap();
        assert!(one_empty.rows.is_empty());
        assert_eq!(one_empty.pages, 1);
    }

    #[test]
    fn empty_pages_still_contribute_metrics() {
        let out = aggregate_pages(vec![
            Page::new(vec![json!("a")], Some(metrics(1))),
            Page::new(vec![], Some(QueryMetrics { retrieved_document_count: 5, ..QueryMetrics::default() })),
        ])
        .unwrap();
        assert_eq!(out.metrics.unwrap().retrieved_document_count, 6);
    }

    #[test]
    fn partition_range_metrics_fold_into_page() {
        let page = Page::from_partition_metrics(
            vec![],
            vec![("0".to_string(), metrics(2)), ("1".to_string(), metrics(3))],
        );
        assert_eq!(page.metrics.unwrap().output_document_count, 5);
        assert_eq!(Page::from_partition_metrics(vec![], Vec::new()).metrics, None);
    }

    #[tokio::test]
    async fn stream_fold_matches_sync_fold() {
        let pages = vec![
            Page::new(vec![json!(1)], Some(metrics(1))),
            Page::new(vec![json!(2), json!(3)], Some(metrics(2))),
        ];
        let expected = aggregate_pages(pages.clone()).unwrap();
        let got = aggregate(stream::iter(pages.into_iter().map(Ok))).await.unwrap();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn mid_stream_error_aborts() {
        let items: Vec<Result<Page, DbError>> = vec![
            Ok(Page::new(vec![json!(1)], None)),
            Err(DbError::QueryExecution("connection reset".into())),
            Ok(Page::new(vec![json!(2)], None)),
        ];
        let err = aggregate(stream::iter(items)).await.unwrap_err();
        assert!(matches!(err, DbError::QueryExecution(m) if m == "connection reset"));
    }

    #[tokio::test]
    async fn empty_stream_is_empty_feed() {
        let empty = stream::iter(Vec::<Result<Page, DbError>>::new());
        assert!(matches!(aggregate(empty).await, Err(DbError::EmptyFeed)));
    }
}
