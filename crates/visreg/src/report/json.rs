use anyhow::{Context, Result};
use serde::Serialize;

use crate::compare::CheckStatus;

/// Machine-readable run summary, written next to the run's fail artifacts.
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub run_id: &'a str,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub new: usize,
    pub errored: usize,
    pub snapshots: Vec<SnapshotEntry>,
}

#[derive(Serialize)]
pub struct SnapshotEntry {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SnapshotEntry {
    pub fn new(id: String, status: &CheckStatus, viewport: Option<String>) -> Self {
        let (status_str, percentage, regions, error) = match status {
            CheckStatus::Pass { percentage } => ("pass", Some(*percentage), None, None),
            CheckStatus::Fail {
                percentage,
                regions,
                ..
            } => ("fail", Some(*percentage), Some(*regions), None),
            CheckStatus::New => ("new", None, None, None),
            CheckStatus::Error(msg) => ("error", None, None, Some(msg.clone())),
        };
        Self {
            id,
            status: status_str,
            percentage,
            regions,
            viewport,
            error,
        }
    }
}

pub fn render(report: &RunReport<'_>) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("Failed to serialize run report")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_status_fields() {
        let fail = CheckStatus::Fail {
            percentage: 12.34,
            regions: 3,
            dimension_mismatch: None,
        };
        let entry = SnapshotEntry::new("a---10x10".into(), &fail, Some("10x10".into()));
        assert_eq!(entry.status, "fail");
        assert_eq!(entry.percentage, Some(12.34));
        assert_eq!(entry.regions, Some(3));
    }

    #[test]
    fn report_serializes_without_empty_fields() {
        let report = RunReport {
            run_id: "100",
            total: 1,
            passed: 0,
            failed: 0,
            new: 1,
            errored: 0,
            snapshots: vec![SnapshotEntry::new("a".into(), &CheckStatus::New, None)],
        };
        let json = String::from_utf8(render(&report).unwrap()).unwrap();
        assert!(json.contains("\"status\": \"new\""));
        assert!(!json.contains("percentage"));
        assert!(!json.contains("viewport"));
    }
}
