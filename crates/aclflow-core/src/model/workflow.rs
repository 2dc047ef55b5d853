// ── Review workflow ──
//
// Stored requests move through a fixed sequence of stages. The backend
// keeps status as free text, so stages are parsed leniently.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use aclflow_api::AclRequestRecord;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[strum(to_string = "Submitted")]
    Submitted,
    #[strum(to_string = "Under Review")]
    UnderReview,
    #[strum(to_string = "Security Approval")]
    SecurityApproval,
    #[strum(to_string = "Network Approval")]
    NetworkApproval,
    #[strum(to_string = "Final Approval")]
    FinalApproval,
    #[strum(to_string = "Implementation")]
    Implementation,
    #[strum(to_string = "Completed")]
    Completed,
    #[strum(to_string = "Rejected")]
    Rejected,
}

/// Status text that names no known stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workflow stage: {0:?}")]
pub struct UnknownStage(pub String);

impl FromStr for WorkflowStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        let norm = norm.split_whitespace().collect::<Vec<_>>().join(" ");

        match norm.as_str() {
            "pending" => return Ok(Self::Submitted),
            "approved" => return Ok(Self::FinalApproval),
            _ => {}
        }
        Self::iter()
            .find(|stage| stage.to_string().to_ascii_lowercase() == norm)
            .ok_or_else(|| UnknownStage(s.to_owned()))
    }
}

impl WorkflowStage {
    /// The stage that normally follows this one. Terminal stages have none.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Submitted => Some(Self::UnderReview),
            Self::UnderReview => Some(Self::SecurityApproval),
            Self::SecurityApproval => Some(Self::NetworkApproval),
            Self::NetworkApproval => Some(Self::FinalApproval),
            Self::FinalApproval => Some(Self::Implementation),
            Self::Implementation => Some(Self::Completed),
            Self::Completed | Self::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Still waiting on a reviewer decision.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }

    /// Approved at some level (including implemented/completed).
    pub fn is_approved(self) -> bool {
        matches!(
            self,
            Self::FinalApproval | Self::Implementation | Self::Completed
        )
    }
}

/// Client-side filter over stored requests. Blank or `"all"` matches anything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub system_type: Option<String>,
}

fn active(want: Option<&String>) -> Option<&str> {
    want.map(|s| s.trim())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

impl RequestFilter {
    pub fn matches(&self, record: &AclRequestRecord) -> bool {
        if let Some(status) = active(self.status.as_ref()) {
            let same_stage = match (status.parse::<WorkflowStage>(), record.status.parse()) {
                (Ok(a), Ok(b)) => a == b,
                _ => status.eq_ignore_ascii_case(record.status.trim()),
            };
            if !same_stage {
                return false;
            }
        }
        if active(self.category.as_ref()).is_some_and(|c| c != record.category) {
            return false;
        }
        if active(self.system_type.as_ref()).is_some_and(|s| s != record.system_type) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [AclRequestRecord]) -> Vec<&'a AclRequestRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Dashboard counters over a request list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub total: usize,
    pub pending: usize,
    pub in_approval: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl WorkflowSummary {
    pub fn from_records(records: &[AclRequestRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for stage in records.iter().filter_map(|r| r.status.parse::<WorkflowStage>().ok()) {
            if stage.is_pending() {
                summary.pending += 1;
            } else if stage.is_approved() {
                summary.approved += 1;
            } else if stage == WorkflowStage::Rejected {
                summary.rejected += 1;
            } else {
                summary.in_approval += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aclflow_api::RecordId;

    fn record(id: i64, status: &str, category: &str) -> AclRequestRecord {
        AclRequestRecord {
            id: RecordId::from(id),
            requester: "bob".into(),
            system_type: "Prod".into(),
            category: category.into(),
            source_ip: String::new(),
            source_host: String::new(),
            destination_ip: String::new(),
            destination_host: String::new(),
            service: String::new(),
            reason: String::new(),
            status: status.into(),
            created_at: None,
            template_id: None,
            comments: Vec::new(),
        }
    }

    #[test]
    fn parses_backend_status_text() {
        assert_eq!("Pending".parse::<WorkflowStage>().unwrap(), WorkflowStage::Submitted);
        assert_eq!("APPROVED".parse::<WorkflowStage>().unwrap(), WorkflowStage::FinalApproval);
        assert_eq!(
            "security_approval".parse::<WorkflowStage>().unwrap(),
            WorkflowStage::SecurityApproval
        );
        assert_eq!(
            " Under  Review ".parse::<WorkflowStage>().unwrap(),
            WorkflowStage::UnderReview
        );
        assert!("shipped".parse::<WorkflowStage>().is_err());
    }

    #[test]
    fn stage_progression() {
        assert_eq!(WorkflowStage::Submitted.next(), Some(WorkflowStage::UnderReview));
        assert_eq!(WorkflowStage::Completed.next(), None);
        assert!(WorkflowStage::Rejected.is_terminal());
    }

    #[test]
    fn filter_by_status_and_category() {
        let records = vec![
            record(1, "Pending", "Web"),
            record(2, "Approved", "Web"),
            record(3, "Pending", "Batch"),
        ];
        let filter = RequestFilter {
            status: Some("submitted".into()),
            category: Some("Web".into()),
            system_type: Some("all".into()),
        };
        let hits = filter.apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "1");
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            record(1, "Pending", "Web"),
            record(2, "Approved", "Web"),
            record(3, "Completed", "Web"),
            record(4, "Rejected", "Web"),
            record(5, "Network Approval", "Web"),
        ];
        let summary = WorkflowSummary::from_records(&records);
        assert_eq!(
            summary,
            WorkflowSummary {
                total: 5,
                pending: 1,
                in_approval: 1,
                approved: 2,
                rejected: 1,
            }
        );
    }
}
