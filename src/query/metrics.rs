use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Server-side execution metrics for one page (or a combination of pages).
///
/// Every field is a counter or an elapsed time, so combining is a field-wise sum:
/// associative, commutative, and `QueryMetrics::default()` is the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub retrieved_document_count: u64,
    pub retrieved_document_size: u64,
    pub output_document_count: u64,
    pub output_document_size: u64,
    pub index_hit_document_count: u64,
    pub total_query_execution_time: Duration,
    pub query_preparation_time: Duration,
    pub index_lookup_time: Duration,
    pub document_load_time: Duration,
    pub runtime_execution_time: Duration,
    pub document_write_time: Duration,
    /// Request units in thousandths, kept integral so sums stay exact.
    pub request_charge_milli: u64,
    pub retries: u64,
}

impl QueryMetrics {
    /// Percentage of retrieved documents that were served from the index.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn index_hit_ratio(&self) -> f64 {
        if self.retrieved_document_count == 0 {
            return 0.0;
        }
        self.index_hit_document_count as f64 / self.retrieved_document_count as f64
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn request_charge(&self) -> f64 {
        self.request_charge_milli as f64 / 1000.0
    }
}

/// Combine optional metrics. Absent is the identity, so all-absent stays absent.
#[must_use]
pub fn combine(a: Option<QueryMetrics>, b: Option<QueryMetrics>) -> Option<QueryMetrics> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (Some(m), None) | (None, Some(m)) => Some(m),
        (None, None) => None,
    }
}

impl Add for QueryMetrics {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

macro_rules! saturating_add_fields {
    ($lhs:ident, $rhs:ident, $($field:ident),+ $(,)?) => {
        $( $lhs.$field = $lhs.$field.saturating_add($rhs.$field); )+
    };
}

impl AddAssign for QueryMetrics {
    fn add_assign(&mut self, rhs: Self) {
        saturating_add_fields!(
            self,
            rhs,
            retrieved_document_count,
            retrieved_document_size,
            output_document_count,
            output_document_size,
            index_hit_document_count,
            total_query_execution_time,
            query_preparation_time,
            index_lookup_time,
            document_load_time,
            runtime_execution_time,
            document_write_time,
            request_charge_milli,
            retries,
        );
    }
}

impl Sum for QueryMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for QueryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = |d: Duration| format!("{:.2}", ms(d));
        line(f, "Retrieved Document Count", self.retrieved_document_count, "")?;
        line(f, "Retrieved Document Size", self.retrieved_document_size, " bytes")?;
        line(f, "Output Document Count", self.output_document_count, "")?;
        line(f, "Output Document Size", self.output_document_size, " bytes")?;
        line(f, "Index Utilization", format!("{:.2}", self.index_hit_ratio() * 100.0), " %")?;
        line(f, "Total Query Execution Time", millis(self.total_query_execution_time), " milliseconds")?;
        line(f, "  Query Preparation Time", millis(self.query_preparation_time), " milliseconds")?;
        line(f, "  Index Lookup Time", millis(self.index_lookup_time), " milliseconds")?;
        line(f, "  Document Load Time", millis(self.document_load_time), " milliseconds")?;
        line(f, "  Runtime Execution Time", millis(self.runtime_execution_time), " milliseconds")?;
        line(f, "  Document Write Time", millis(self.document_write_time), " milliseconds")?;
        line(f, "Request Charge", format!("{:.2}", self.request_charge()), " RUs")?;
        write!(f, "{:<41}: {:>12}", "Retries", self.retries)
    }
}

fn line(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: impl fmt::Display,
    unit: &str,
) -> fmt::Result {
    writeln!(f, "{label:<41}: {value:>12}{unit}")
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: u64) -> QueryMetrics {
        QueryMetrics {
            retrieved_document_count: n,
            output_document_count: n / 2,
            index_hit_document_count: n / 2,
            total_query_execution_time: Duration::from_micros(n * 10),
            request_charge_milli: n * 1000,
            ..QueryMetrics::default()
        }
    }

    #[test]
    fn add_is_fieldwise() {
        let m = sample(4) + sample(6);
        assert_eq!(m.retrieved_document_count, 10);
        assert_eq!(m.output_document_count, 5);
        assert_eq!(m.total_query_execution_time, Duration::from_micros(100));
        assert!((m.request_charge() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sum_groupings_agree() {
        let (a, b, c) = (sample(1), sample(20), sample(300));
        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!([a, b, c].into_iter().sum::<QueryMetrics>(), c + b + a);
    }

    #[test]
    fn absent_is_identity() {
        let a = sample(3);
        assert_eq!(combine(None, None), None);
        assert_eq!(combine(Some(a), None), Some(a));
        assert_eq!(combine(None, Some(a)), Some(a));
    }

    #[test]
    fn zero_row_metrics_still_count() {
        let empty = QueryMetrics { request_charge_milli: 2_500, ..QueryMetrics::default() };
        assert_eq!(combine(Some(sample(2)), Some(empty)).unwrap().request_charge_milli, 4_500);
    }

    #[test]
    fn display_lists_every_section() {
        let text = sample(8).to_string();
        assert!(text.contains("Retrieved Document Count"));
        assert!(text.contains("Index Utilization"));
        assert!(text.contains("Request Charge"));
    }
}
