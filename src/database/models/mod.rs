pub mod compliance_issue;
pub mod leave_request;
pub mod notification_template;
pub mod user;
