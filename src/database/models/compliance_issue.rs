use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplianceIssue {
    pub id: Uuid,
    pub title: String,
    pub detail: Option<String>,
    pub severity: String,
    pub status: String,
    pub reported_by: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compliance issue lifecycle: open -> in_progress -> resolved -> closed,
/// with early exits to resolved/closed. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(IssueStatus::Open),
            "in_progress" => Some(IssueStatus::InProgress),
            "resolved" => Some(IssueStatus::Resolved),
            "closed" => Some(IssueStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }

    pub fn can_transition(&self, to: IssueStatus) -> bool {
        matches!(
            (self, to),
            (
                IssueStatus::Open,
                IssueStatus::InProgress | IssueStatus::Resolved | IssueStatus::Closed
            ) | (
                IssueStatus::InProgress,
                IssueStatus::Resolved | IssueStatus::Closed
            ) | (IssueStatus::Resolved, IssueStatus::Closed)
        )
    }
}
