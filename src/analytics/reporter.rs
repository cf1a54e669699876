//! Aggregate view over the ask log for `mallscope history`.

use crate::analytics::logger::AskLogEntry;

/// Summary of a slice of ask-log entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AskSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

impl AskSummary {
    /// Percentage of successful asks, 0.0 when there are none.
    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

pub fn summarize(entries: &[AskLogEntry]) -> AskSummary {
    if entries.is_empty() {
        return AskSummary::default();
    }

    let succeeded = entries.iter().filter(|e| e.success).count();
    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();

    AskSummary {
        total: entries.len(),
        succeeded,
        failed: entries.len() - succeeded,
        avg_latency_ms: total_latency as f64 / entries.len() as f64,
        max_latency_ms: entries.iter().map(|e| e.latency_ms).max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(latency_ms: u64, success: bool) -> AskLogEntry {
        AskLogEntry {
            timestamp: "2026-10-18T12:00:00Z".to_string(),
            model: "llama3-8b-8192".to_string(),
            question_chars: 10,
            answer_chars: 100,
            latency_ms,
            success,
        }
    }

    #[test]
    fn summarize_counts_and_latency() {
        let summary = summarize(&[entry(100, true), entry(300, true), entry(500, false)]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.avg_latency_ms - 300.0).abs() < f64::EPSILON);
        assert_eq!(summary.max_latency_ms, 500);
        assert!((summary.success_pct() - 66.666).abs() < 0.01);
    }

    #[test]
    fn summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary, AskSummary::default());
        assert_eq!(summary.success_pct(), 0.0);
    }
}
