//! Generic CRUD data plane. Every registry resource is served by these
//! five handlers; the registry entry supplies validation rules, scope
//! columns and role requirements, so a new entity is one registry entry
//! and one migration away.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::validate::validate_payload;
use crate::database::{audit, manager, query};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::resources::{lookup, ResourceDef};

const RESERVED_PARAMS: &[&str] = &["limit", "offset", "order"];

fn resolve(resource: &str) -> Result<&'static ResourceDef, ApiError> {
    lookup(resource).ok_or_else(|| ApiError::not_found(format!("Unknown resource: {}", resource)))
}

fn resolve_writable(resource: &str) -> Result<&'static ResourceDef, ApiError> {
    let def = resolve(resource)?;
    if !def.writable {
        return Err(ApiError::forbidden(format!(
            "Resource {} is read-only",
            resource
        )));
    }
    Ok(def)
}

fn parse_record_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid record id: {}", id)))
}

/// Scope conditions added to every list query for scoped callers.
fn scope_conditions(def: &ResourceDef, auth: &AuthUser) -> Vec<query::Cond> {
    let mut conds = Vec::new();
    if let (Some(col), Some(district_id)) = (def.district_col, auth.district_id) {
        if auth.district_scoped() {
            conds.push(query::Cond {
                column: col,
                cast: "::uuid",
                value: json!(district_id.to_string()),
            });
        }
    }
    if let (Some(col), Some(agency_id)) = (def.agency_col, auth.agency_id) {
        if auth.agency_scoped() {
            conds.push(query::Cond {
                column: col,
                cast: "::uuid",
                value: json!(agency_id.to_string()),
            });
        }
    }
    conds
}

/// Reject access to a fetched row that sits outside the caller's scope.
fn check_row_scope(def: &ResourceDef, auth: &AuthUser, row: &Value) -> Result<(), ApiError> {
    let row_matches = |col: &str, expected: Uuid| {
        row.get(col).and_then(Value::as_str) == Some(expected.to_string().as_str())
    };

    if auth.district_scoped() {
        if let (Some(col), Some(district_id)) = (def.district_col, auth.district_id) {
            if !row_matches(col, district_id) {
                return Err(ApiError::forbidden("Record is outside your district"));
            }
        }
    }
    if auth.agency_scoped() {
        if let (Some(col), Some(agency_id)) = (def.agency_col, auth.agency_id) {
            if !row_matches(col, agency_id) {
                return Err(ApiError::forbidden("Record is outside your agency"));
            }
        }
    }
    Ok(())
}

/// Force the caller's tenant columns onto a payload. A scoped caller may
/// omit them (they default to the caller's scope) but may not aim at a
/// different district/agency.
fn apply_scope_to_payload(
    def: &ResourceDef,
    auth: &AuthUser,
    payload: &mut Map<String, Value>,
) -> Result<(), ApiError> {
    let mut force = |col: &str, expected: Uuid, label: &str| -> Result<(), ApiError> {
        let expected_str = expected.to_string();
        match payload.get(col).and_then(Value::as_str) {
            Some(given) if given != expected_str => Err(ApiError::forbidden(format!(
                "Cannot target a record outside your {}",
                label
            ))),
            _ => {
                payload.insert(col.to_string(), json!(expected_str));
                Ok(())
            }
        }
    };

    if auth.district_scoped() {
        if let (Some(col), Some(district_id)) = (def.district_col, auth.district_id) {
            force(col, district_id, "district")?;
        }
    }
    if auth.agency_scoped() {
        if let (Some(col), Some(agency_id)) = (def.agency_col, auth.agency_id) {
            force(col, agency_id, "agency")?;
        }
    }
    Ok(())
}

/// Build the INSERT/UPDATE column set from a validated payload.
fn write_set(def: &ResourceDef, payload: &Map<String, Value>) -> query::WriteSet {
    let mut ws = query::WriteSet::default();
    for rule in def.fields {
        if let Some(value) = payload.get(rule.name) {
            ws.push(rule.name, rule.kind.cast(), value.clone());
        }
    }
    ws
}

fn record_uuid(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// GET /api/:resource - paginated, filtered, ordered list
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let def = resolve(&resource)?;
    auth.require_role(def.read_role)?;

    let api = &crate::config::config().api;
    let limit = params
        .get("limit")
        .map(|v| v.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid limit")))
        .transpose()?
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size);
    let offset = params
        .get("offset")
        .map(|v| v.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid offset")))
        .transpose()?
        .unwrap_or(0)
        .max(0);

    let (order_column, order_desc) = match params.get("order") {
        None => (def.default_order.to_string(), def.default_order == "created_at"),
        Some(spec) => {
            let (column, dir) = match spec.split_once(':') {
                Some((c, d)) => (c, d),
                None => (spec.as_str(), "asc"),
            };
            if !def.orderable.contains(&column) {
                return Err(ApiError::bad_request(format!(
                    "Cannot order by {}; valid columns: {}",
                    column,
                    def.orderable.join(", ")
                )));
            }
            match dir {
                "asc" => (column.to_string(), false),
                "desc" => (column.to_string(), true),
                _ => return Err(ApiError::bad_request("Order direction must be asc or desc")),
            }
        }
    };

    let mut conditions = scope_conditions(def, &auth);
    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in &params {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        if !def.filterable.contains(&key.as_str()) {
            errors.insert(key.clone(), "not a filterable column".to_string());
            continue;
        }
        // Scope conditions win over user filters on the same column
        if conditions.iter().any(|c| c.column == key.as_str()) {
            continue;
        }
        let Some(rule) = def.field(key) else {
            errors.insert(key.clone(), "not a filterable column".to_string());
            continue;
        };
        conditions.push(query::Cond {
            column: rule.name,
            cast: rule.kind.cast(),
            value: json!(value),
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid filter parameters", Some(errors)));
    }

    let pool = manager::pool().await?;
    let list_query = query::ListQuery {
        table: def.table,
        conditions,
        order_column,
        order_desc,
        limit,
        offset,
    };
    let (items, total) = list_query.fetch(pool).await?;

    Ok(ApiResponse::success(items)
        .with_meta(json!({ "total": total, "limit": limit, "offset": offset }))
        .into_response())
}

/// POST /api/:resource - create a record
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Path(resource): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let def = resolve_writable(&resource)?;
    auth.require_role(def.create_role)?;

    let Value::Object(mut payload) = payload else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    validate_payload(def.fields, &payload, false)?;
    apply_scope_to_payload(def, &auth, &mut payload)?;

    let mut ws = write_set(def, &payload);
    if let Some(actor_col) = def.actor_col {
        ws.push(actor_col, "::uuid", json!(auth.id.to_string()));
    }

    let pool = manager::pool().await?;
    let row = query::insert_returning(pool, def.table, &ws).await?;

    audit::record(
        &auth,
        "create",
        def.slug,
        record_uuid(&row),
        json!({ "fields": ws.columns }),
    )
    .await;

    Ok(ApiResponse::created(row))
}

/// GET /api/:resource/:id - fetch a single record
pub async fn get_one(
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let def = resolve(&resource)?;
    auth.require_role(def.read_role)?;
    let id = parse_record_id(&id)?;

    let pool = manager::pool().await?;
    let row = query::fetch_by_id(pool, def.table, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found in {}", id, resource)))?;

    check_row_scope(def, &auth, &row)?;
    Ok(ApiResponse::success(row))
}

/// PATCH /api/:resource/:id - partially update a record
pub async fn patch(
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let def = resolve_writable(&resource)?;
    auth.require_role(def.write_role)?;
    let id = parse_record_id(&id)?;

    let Value::Object(mut payload) = payload else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };
    if payload.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    validate_payload(def.fields, &payload, true)?;

    let pool = manager::pool().await?;
    let existing = query::fetch_by_id(pool, def.table, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found in {}", id, resource)))?;
    check_row_scope(def, &auth, &existing)?;

    // A scoped caller may not move a record to another district/agency
    apply_scope_to_payload(def, &auth, &mut payload)?;

    let ws = write_set(def, &payload);
    if ws.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let row = query::update_returning(pool, def.table, id, &ws)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found in {}", id, resource)))?;

    audit::record(&auth, "update", def.slug, Some(id), json!({ "fields": ws.columns })).await;

    Ok(ApiResponse::success(row))
}

/// DELETE /api/:resource/:id - delete a record
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let def = resolve_writable(&resource)?;
    auth.require_role(def.write_role)?;
    let id = parse_record_id(&id)?;

    let pool = manager::pool().await?;
    let existing = query::fetch_by_id(pool, def.table, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found in {}", id, resource)))?;
    check_row_scope(def, &auth, &existing)?;

    if !query::delete_by_id(pool, def.table, id).await? {
        return Err(ApiError::not_found(format!(
            "Record {} not found in {}",
            id, resource
        )));
    }

    audit::record(&auth, "delete", def.slug, Some(id), Value::Null).await;

    Ok(ApiResponse::<()>::no_content())
}
