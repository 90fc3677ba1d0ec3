use inboxquery::query::{Page, QueryMetrics, aggregate_pages, combine};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;

fn any_metrics() -> impl Strategy<Value = QueryMetrics> {
    (0u64..1_000_000, 0u64..1_000_000, 0u64..1_000, 0u64..10_000_000, 0u64..100).prop_map(
        |(docs, size, hits, micros, charge)| QueryMetrics {
            retrieved_document_count: docs,
            retrieved_document_size: size,
            output_document_count: docs / 2,
            index_hit_document_count: hits,
            total_query_execution_time: Duration::from_micros(micros),
            document_load_time: Duration::from_micros(micros / 3),
            request_charge_milli: charge * 10,
            ..QueryMetrics::default()
        },
    )
}

/// Split `rows` into consecutive pages at the given cut points.
fn split(rows: &[Value], cuts: &[usize]) -> Vec<Page> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (rows.len() + 1)).collect();
    cuts.sort_unstable();
    let mut pages = Vec::new();
    let mut start = 0;
    for c in cuts {
        pages.push(Page::new(rows[start..c].to_vec(), None));
        start = c;
    }
    pages.push(Page::new(rows[start..].to_vec(), None));
    pages
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_page_split_preserves_row_order(n in 0usize..200, cuts in proptest::collection::vec(any::<usize>(), 0..8)) {
        let rows: Vec<Value> = (0..n).map(|i| json!(i)).collect();
        let pages = split(&rows, &cuts);
        let page_count = pages.len();
        let out = aggregate_pages(pages).unwrap();
        prop_assert_eq!(out.rows, rows);
        prop_assert_eq!(out.pages, page_count);
    }

    #[test]
    fn prop_metrics_combination_is_associative(a in any_metrics(), b in any_metrics(), c in any_metrics()) {
        let left = combine(combine(Some(a), Some(b)), Some(c));
        let right = combine(Some(a), combine(Some(b), Some(c)));
        prop_assert_eq!(left, right);
        let reversed = combine(combine(Some(c), Some(b)), Some(a));
        prop_assert_eq!(left, reversed);
    }

    #[test]
    fn prop_fold_metrics_ignore_page_order(ms in proptest::collection::vec(any_metrics(), 1..10)) {
        let forward = aggregate_pages(ms.iter().map(|m| Page::new(vec![], Some(*m)))).unwrap();
        let backward = aggregate_pages(ms.iter().rev().map(|m| Page::new(vec![], Some(*m)))).unwrap();
        prop_assert_eq!(forward.metrics, backward.metrics);
        prop_assert_eq!(forward.metrics, Some(ms.iter().copied().sum::<QueryMetrics>()));
    }

    #[test]
    fn prop_absent_metrics_never_materialize(n in 1usize..20) {
        let out = aggregate_pages((0..n).map(|_| Page::default())).unwrap();
        prop_assert_eq!(out.metrics, None);
    }
}
