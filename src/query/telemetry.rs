use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::logger::QUERY_TARGET;

use super::types::Selection;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub slow_query_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let slow = std::env::var("INBOXQUERY_SLOW_QUERY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(500);
        Self { slow_query_ms: slow }
    }
}

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub queries_slow_total: AtomicU64,
    pub query_errors_total: AtomicU64,
    pub pages_total: AtomicU64,
    pub rows_total: AtomicU64,
}

#[derive(Default)]
pub struct Telemetry {
    pub cfg: RwLock<TelemetryConfig>,
    pub metrics: Metrics,
}

pub(crate) static TELEMETRY: std::sync::LazyLock<Telemetry> =
    std::sync::LazyLock::new(Telemetry::default);

pub fn set_slow_query_ms(ms: u64) {
    TELEMETRY.cfg.write().slow_query_ms = ms;
}

#[must_use]
pub fn slow_query_ms() -> u64 {
    TELEMETRY.cfg.read().slow_query_ms
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[must_use]
pub fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(input.as_bytes());
    hex::encode(h.finalize())
}

fn to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// Record a completed query. Returns true when it crossed the slow-query threshold.
pub fn record_query(
    inbox_id: &str,
    selection: Selection,
    query_text: &str,
    pages: usize,
    rows: usize,
    elapsed: Duration,
) -> bool {
    let m = &TELEMETRY.metrics;
    m.queries_total.fetch_add(1, Ordering::Relaxed);
    m.pages_total.fetch_add(to_u64(pages), Ordering::Relaxed);
    m.rows_total.fetch_add(to_u64(rows), Ordering::Relaxed);
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let slow = duration_ms >= slow_query_ms();
    if slow {
        m.queries_slow_total.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::json!({
            "ts": now_ts(),
            "inbox": inbox_id,
            "op": selection.to_string(),
            "query_hash": sha256_hex(query_text),
            "pages": pages,
            "rows": rows,
            "duration_ms": duration_ms,
            "slow": true
        })
        .to_string();
        crate::qlog!(QUERY_TARGET, log::Level::Warn, "{line}");
    }
    slow
}

pub fn record_error(inbox_id: &str, selection: Selection, err: &crate::errors::DbError) {
    TELEMETRY.metrics.query_errors_total.fetch_add(1, Ordering::Relaxed);
    let level = match err {
        crate::errors::DbError::EmptyFeed => log::Level::Error,
        _ => log::Level::Warn,
    };
    crate::qlog!(QUERY_TARGET, level, "{selection} on inbox {inbox_id} failed: {err}");
}

#[must_use]
pub fn metrics_text() -> String {
    // OpenMetrics/Prometheus exposition format (no types/HELP for brevity)
    let m = &TELEMETRY.metrics;
    format!(
        "inboxquery_queries_total {}\n\
         inboxquery_queries_slow_total {}\n\
         inboxquery_query_errors_total {}\n\
         inboxquery_pages_total {}\n\
         inboxquery_rows_total {}\n",
        m.queries_total.load(Ordering::Relaxed),
        m.queries_slow_total.load(Ordering::Relaxed),
        m.query_errors_total.load(Ordering::Relaxed),
        m.pages_total.load(Ordering::Relaxed),
        m.rows_total.load(Ordering::Relaxed),
    )
}
