//! Static resource registry. One entry per managed entity: the table it
//! lives in, its field rules, which columns can filter and order a list,
//! its tenant-scoping columns and the roles its operations require. The
//! generic data plane (`handlers::protected::data`) serves every entry;
//! nothing here is reachable for tables that need dedicated semantics
//! (users, status transitions, notification dispatch).

use crate::api::validate::{FieldKind, FieldRule};
use crate::auth::Role;

#[derive(Debug)]
pub struct ResourceDef {
    pub slug: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldRule],
    pub filterable: &'static [&'static str],
    pub orderable: &'static [&'static str],
    pub default_order: &'static str,
    pub district_col: Option<&'static str>,
    pub agency_col: Option<&'static str>,
    /// Column stamped with the acting user's id on create.
    pub actor_col: Option<&'static str>,
    pub read_role: Role,
    pub create_role: Role,
    pub write_role: Role,
    /// False for append-only/read-only resources (audit logs).
    pub writable: bool,
}

impl ResourceDef {
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|r| r.name == name)
    }
}

pub fn lookup(slug: &str) -> Option<&'static ResourceDef> {
    REGISTRY.iter().find(|r| r.slug == slug)
}

const DISTRICT_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_len(200),
];

const AGENCY_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_len(200),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const ANNOUNCEMENT_FIELDS: &[FieldRule] = &[
    FieldRule::required("title", FieldKind::Text).max_len(200),
    FieldRule::required("body", FieldKind::Text).max_len(10_000),
    FieldRule::required("audience", FieldKind::Text).one_of(&["all", "members", "staff", "leaders"]),
    FieldRule::optional("publish_at", FieldKind::Timestamp),
    FieldRule::optional("expires_at", FieldKind::Timestamp),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::readonly("created_by", FieldKind::Uuid),
];

const MEMBER_FIELDS: &[FieldRule] = &[
    FieldRule::required("first_name", FieldKind::Text).max_len(100),
    FieldRule::required("last_name", FieldKind::Text).max_len(100),
    FieldRule::optional("email", FieldKind::Text).max_len(200),
    FieldRule::optional("phone", FieldKind::Text).max_len(32),
    FieldRule::optional("gender", FieldKind::Text).one_of(&["male", "female"]),
    FieldRule::optional("status", FieldKind::Text)
        .one_of(&["active", "inactive", "transferred", "deceased"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::optional("agency_id", FieldKind::Uuid),
];

const PROJECT_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_len(200),
    FieldRule::optional("description", FieldKind::Text).max_len(10_000),
    FieldRule::optional("status", FieldKind::Text)
        .one_of(&["planned", "active", "on_hold", "completed", "cancelled"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const REQUISITION_FIELDS: &[FieldRule] = &[
    FieldRule::required("project_id", FieldKind::Uuid),
    FieldRule::required("amount", FieldKind::Decimal),
    FieldRule::required("purpose", FieldKind::Text).max_len(500),
    FieldRule::optional("status", FieldKind::Text)
        .one_of(&["pending", "approved", "rejected", "paid"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::readonly("requested_by", FieldKind::Uuid),
];

const ACCOUNT_BOOK_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_len(200),
    FieldRule::required("book_type", FieldKind::Text).one_of(&["cash", "bank", "mobile_money"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::optional("agency_id", FieldKind::Uuid),
];

const TRANSACTION_FIELDS: &[FieldRule] = &[
    FieldRule::required("account_book_id", FieldKind::Uuid),
    FieldRule::required("amount", FieldKind::Decimal),
    FieldRule::required("direction", FieldKind::Text).one_of(&["in", "out"]),
    FieldRule::optional("memo", FieldKind::Text).max_len(500),
    FieldRule::required("occurred_at", FieldKind::Timestamp),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const BUDGET_FIELDS: &[FieldRule] = &[
    FieldRule::required("fiscal_year", FieldKind::Int),
    FieldRule::required("category", FieldKind::Text).max_len(200),
    FieldRule::required("amount", FieldKind::Decimal),
    FieldRule::optional("status", FieldKind::Text)
        .one_of(&["draft", "submitted", "approved", "rejected"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const EVENT_FIELDS: &[FieldRule] = &[
    FieldRule::required("title", FieldKind::Text).max_len(200),
    FieldRule::optional("location", FieldKind::Text).max_len(200),
    FieldRule::required("starts_at", FieldKind::Timestamp),
    FieldRule::optional("ends_at", FieldKind::Timestamp),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const ATTENDANCE_FIELDS: &[FieldRule] = &[
    FieldRule::required("event_id", FieldKind::Uuid),
    FieldRule::required("member_id", FieldKind::Uuid),
    FieldRule::optional("status", FieldKind::Text).one_of(&["present", "absent", "excused"]),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const COMPLIANCE_ISSUE_FIELDS: &[FieldRule] = &[
    FieldRule::required("title", FieldKind::Text).max_len(200),
    FieldRule::optional("detail", FieldKind::Text).max_len(10_000),
    FieldRule::required("severity", FieldKind::Text).one_of(&["low", "medium", "high", "critical"]),
    // Status moves only through the dedicated transition endpoint
    FieldRule::readonly("status", FieldKind::Text),
    FieldRule::optional("district_id", FieldKind::Uuid),
    FieldRule::optional("agency_id", FieldKind::Uuid),
    FieldRule::readonly("reported_by", FieldKind::Uuid),
];

const LEAVE_REQUEST_FIELDS: &[FieldRule] = &[
    FieldRule::required("employee_id", FieldKind::Uuid),
    FieldRule::required("leave_type", FieldKind::Text)
        .one_of(&["annual", "sick", "maternity", "paternity", "study", "unpaid"]),
    FieldRule::required("start_date", FieldKind::Date),
    FieldRule::required("end_date", FieldKind::Date),
    FieldRule::optional("reason", FieldKind::Text).max_len(1000),
    // Status moves only through the dedicated transition endpoint
    FieldRule::readonly("status", FieldKind::Text),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const HR_REPORT_FIELDS: &[FieldRule] = &[
    FieldRule::required("period", FieldKind::Text).max_len(50),
    FieldRule::required("summary", FieldKind::Text).max_len(10_000),
    FieldRule::optional("metrics", FieldKind::Json),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const NOTIFICATION_TEMPLATE_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_len(200),
    FieldRule::required("channel", FieldKind::Text).one_of(&["email", "sms"]),
    FieldRule::required("subject", FieldKind::Text).max_len(200),
    FieldRule::required("body", FieldKind::Text).max_len(10_000),
];

const APPROVAL_WORKFLOW_FIELDS: &[FieldRule] = &[
    FieldRule::required("resource", FieldKind::Text).max_len(100),
    FieldRule::required("steps", FieldKind::Json),
    FieldRule::optional("is_active", FieldKind::Bool),
];

const ACCOUNT_STATEMENT_FIELDS: &[FieldRule] = &[
    FieldRule::required("account_book_id", FieldKind::Uuid),
    FieldRule::required("period_start", FieldKind::Date),
    FieldRule::required("period_end", FieldKind::Date),
    FieldRule::required("opening_balance", FieldKind::Decimal),
    FieldRule::required("closing_balance", FieldKind::Decimal),
    FieldRule::optional("district_id", FieldKind::Uuid),
];

const AUDIT_LOG_FIELDS: &[FieldRule] = &[
    FieldRule::readonly("actor_id", FieldKind::Uuid),
    FieldRule::readonly("action", FieldKind::Text),
    FieldRule::readonly("resource", FieldKind::Text),
    FieldRule::readonly("record_id", FieldKind::Uuid),
];

pub static REGISTRY: &[ResourceDef] = &[
    ResourceDef {
        slug: "districts",
        table: "districts",
        fields: DISTRICT_FIELDS,
        filterable: &["name"],
        orderable: &["created_at", "name"],
        default_order: "name",
        district_col: None,
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::Superadmin,
        write_role: Role::Superadmin,
        writable: true,
    },
    ResourceDef {
        slug: "agencies",
        table: "agencies",
        fields: AGENCY_FIELDS,
        filterable: &["name", "district_id"],
        orderable: &["created_at", "name"],
        default_order: "name",
        district_col: None,
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::Superadmin,
        write_role: Role::Superadmin,
        writable: true,
    },
    ResourceDef {
        slug: "announcements",
        table: "announcements",
        fields: ANNOUNCEMENT_FIELDS,
        filterable: &["audience", "district_id", "created_by"],
        orderable: &["created_at", "publish_at", "title"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: Some("created_by"),
        read_role: Role::Staff,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "members",
        table: "members",
        fields: MEMBER_FIELDS,
        filterable: &["status", "district_id", "agency_id", "last_name", "gender"],
        orderable: &["created_at", "last_name", "first_name"],
        default_order: "last_name",
        district_col: Some("district_id"),
        agency_col: Some("agency_id"),
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::AgencyAdmin,
        write_role: Role::AgencyAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "projects",
        table: "projects",
        fields: PROJECT_FIELDS,
        filterable: &["status", "district_id"],
        orderable: &["created_at", "name"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "requisitions",
        table: "requisitions",
        fields: REQUISITION_FIELDS,
        filterable: &["project_id", "status", "district_id", "requested_by"],
        orderable: &["created_at", "amount"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: Some("requested_by"),
        read_role: Role::Staff,
        create_role: Role::Staff,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "account-books",
        table: "account_books",
        fields: ACCOUNT_BOOK_FIELDS,
        filterable: &["book_type", "district_id", "agency_id"],
        orderable: &["created_at", "name"],
        default_order: "name",
        district_col: Some("district_id"),
        agency_col: Some("agency_id"),
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "transactions",
        table: "transactions",
        fields: TRANSACTION_FIELDS,
        filterable: &["account_book_id", "direction", "district_id"],
        orderable: &["occurred_at", "created_at", "amount"],
        default_order: "occurred_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::AgencyAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "budgets",
        table: "budgets",
        fields: BUDGET_FIELDS,
        filterable: &["fiscal_year", "status", "district_id", "category"],
        orderable: &["fiscal_year", "created_at", "amount"],
        default_order: "fiscal_year",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "events",
        table: "events",
        fields: EVENT_FIELDS,
        filterable: &["district_id"],
        orderable: &["starts_at", "created_at", "title"],
        default_order: "starts_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::AgencyAdmin,
        write_role: Role::AgencyAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "attendance",
        table: "attendance",
        fields: ATTENDANCE_FIELDS,
        filterable: &["event_id", "member_id", "status", "district_id"],
        orderable: &["created_at"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::Staff,
        write_role: Role::AgencyAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "compliance-issues",
        table: "compliance_issues",
        fields: COMPLIANCE_ISSUE_FIELDS,
        filterable: &["severity", "status", "district_id", "agency_id"],
        orderable: &["created_at", "severity"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: Some("agency_id"),
        actor_col: Some("reported_by"),
        read_role: Role::Staff,
        create_role: Role::Staff,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "leave-requests",
        table: "leave_requests",
        fields: LEAVE_REQUEST_FIELDS,
        filterable: &["employee_id", "status", "leave_type", "district_id"],
        orderable: &["created_at", "start_date"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::Staff,
        create_role: Role::Staff,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "hr-reports",
        table: "hr_reports",
        fields: HR_REPORT_FIELDS,
        filterable: &["period", "district_id"],
        orderable: &["created_at", "period"],
        default_order: "created_at",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::DistrictAdmin,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "notification-templates",
        table: "notification_templates",
        fields: NOTIFICATION_TEMPLATE_FIELDS,
        filterable: &["channel", "name"],
        orderable: &["created_at", "name"],
        default_order: "name",
        district_col: None,
        agency_col: None,
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "approval-workflows",
        table: "approval_workflows",
        fields: APPROVAL_WORKFLOW_FIELDS,
        filterable: &["resource", "is_active"],
        orderable: &["created_at", "resource"],
        default_order: "resource",
        district_col: None,
        agency_col: None,
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::Superadmin,
        write_role: Role::Superadmin,
        writable: true,
    },
    ResourceDef {
        slug: "account-statements",
        table: "account_statements",
        fields: ACCOUNT_STATEMENT_FIELDS,
        filterable: &["account_book_id", "district_id"],
        orderable: &["period_start", "created_at"],
        default_order: "period_start",
        district_col: Some("district_id"),
        agency_col: None,
        actor_col: None,
        read_role: Role::AgencyAdmin,
        create_role: Role::DistrictAdmin,
        write_role: Role::DistrictAdmin,
        writable: true,
    },
    ResourceDef {
        slug: "audit-logs",
        table: "audit_logs",
        fields: AUDIT_LOG_FIELDS,
        filterable: &["actor_id", "action", "resource", "record_id"],
        orderable: &["created_at"],
        default_order: "created_at",
        district_col: None,
        agency_col: None,
        actor_col: None,
        read_role: Role::Superadmin,
        create_role: Role::Superadmin,
        write_role: Role::Superadmin,
        writable: false,
    },
];
