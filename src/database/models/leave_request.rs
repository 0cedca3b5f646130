use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: String,
    pub district_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Leave request lifecycle. Only `pending` requests may move; every other
/// state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(LeaveStatus::Pending),
            "approved" => Some(LeaveStatus::Approved),
            "rejected" => Some(LeaveStatus::Rejected),
            "cancelled" => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition(&self, to: LeaveStatus) -> bool {
        matches!(
            (self, to),
            (
                LeaveStatus::Pending,
                LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_anywhere() {
        assert!(LeaveStatus::Pending.can_transition(LeaveStatus::Approved));
        assert!(LeaveStatus::Pending.can_transition(LeaveStatus::Rejected));
        assert!(LeaveStatus::Pending.can_transition(LeaveStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_frozen() {
        assert!(!LeaveStatus::Approved.can_transition(LeaveStatus::Rejected));
        assert!(!LeaveStatus::Rejected.can_transition(LeaveStatus::Pending));
        assert!(!LeaveStatus::Cancelled.can_transition(LeaveStatus::Approved));
        assert!(!LeaveStatus::Pending.can_transition(LeaveStatus::Pending));
    }

    #[test]
    fn parse_round_trips() {
        for s in ["pending", "approved", "rejected", "cancelled"] {
            assert_eq!(LeaveStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(LeaveStatus::parse("on_hold").is_none());
    }
}
