//! Dynamic SQL construction for the generic data plane. Column and table
//! names always come from the static resource registry, never from request
//! input; request values travel as positional binds with an explicit cast
//! matching the declared field kind.

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

/// One `column = value` condition with the cast applied to the bind.
#[derive(Debug, Clone)]
pub struct Cond {
    pub column: &'static str,
    pub cast: &'static str,
    pub value: Value,
}

/// Column/value sets for INSERT and UPDATE statements.
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    pub columns: Vec<&'static str>,
    pub casts: Vec<&'static str>,
    pub values: Vec<Value>,
}

impl WriteSet {
    pub fn push(&mut self, column: &'static str, cast: &'static str, value: Value) {
        self.columns.push(column);
        self.casts.push(cast);
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A filtered, ordered, paginated list over one table.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub table: &'static str,
    pub conditions: Vec<Cond>,
    pub order_column: String,
    pub order_desc: bool,
    pub limit: i64,
    pub offset: i64,
}

impl ListQuery {
    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, c)| format!("\"{}\" = ${}{}", c.column, i + 1, c.cast))
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    }

    pub fn select_sql(&self) -> String {
        let n = self.conditions.len();
        format!(
            "SELECT row_to_json(t) AS row FROM \"{}\" t{} ORDER BY \"{}\" {} LIMIT ${} OFFSET ${}",
            self.table,
            self.where_clause(),
            self.order_column,
            if self.order_desc { "DESC" } else { "ASC" },
            n + 1,
            n + 2,
        )
    }

    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) AS count FROM \"{}\" t{}",
            self.table,
            self.where_clause()
        )
    }

    /// Fetch the page and the unpaginated total.
    pub async fn fetch(&self, pool: &PgPool) -> Result<(Vec<Value>, i64), sqlx::Error> {
        let select_sql = self.select_sql();
        let mut q = sqlx::query(&select_sql);
        for cond in &self.conditions {
            q = bind_value(q, &cond.value);
        }
        q = q.bind(self.limit).bind(self.offset);
        let rows = q.fetch_all(pool).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(row.try_get::<Value, _>("row")?);
        }

        let count_sql = self.count_sql();
        let mut cq = sqlx::query(&count_sql);
        for cond in &self.conditions {
            cq = bind_value(cq, &cond.value);
        }
        let total: i64 = cq.fetch_one(pool).await?.try_get("count")?;

        Ok((items, total))
    }
}

pub async fn fetch_by_id(
    pool: &PgPool,
    table: &str,
    id: Uuid,
) -> Result<Option<Value>, sqlx::Error> {
    let sql = format!(
        "SELECT row_to_json(t) AS row FROM \"{}\" t WHERE \"id\" = $1",
        table
    );
    match sqlx::query(&sql).bind(id).fetch_optional(pool).await? {
        Some(row) => Ok(Some(row.try_get("row")?)),
        None => Ok(None),
    }
}

pub async fn insert_returning(
    pool: &PgPool,
    table: &str,
    ws: &WriteSet,
) -> Result<Value, sqlx::Error> {
    let columns: Vec<String> = ws.columns.iter().map(|c| format!("\"{}\"", c)).collect();
    let placeholders: Vec<String> = ws
        .casts
        .iter()
        .enumerate()
        .map(|(i, cast)| format!("${}{}", i + 1, cast))
        .collect();
    let sql = format!(
        "INSERT INTO \"{}\" AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS row",
        table,
        columns.join(", "),
        placeholders.join(", "),
    );

    let mut q = sqlx::query(&sql);
    for value in &ws.values {
        q = bind_value(q, value);
    }
    q.fetch_one(pool).await?.try_get("row")
}

pub async fn update_returning(
    pool: &PgPool,
    table: &str,
    id: Uuid,
    ws: &WriteSet,
) -> Result<Option<Value>, sqlx::Error> {
    let assignments: Vec<String> = ws
        .columns
        .iter()
        .zip(ws.casts.iter())
        .enumerate()
        .map(|(i, (col, cast))| format!("\"{}\" = ${}{}", col, i + 2, cast))
        .collect();
    let sql = format!(
        "UPDATE \"{}\" AS t SET {}, \"updated_at\" = now() WHERE \"id\" = $1 RETURNING row_to_json(t) AS row",
        table,
        assignments.join(", "),
    );

    let mut q = sqlx::query(&sql).bind(id);
    for value in &ws.values {
        q = bind_value(q, value);
    }
    match q.fetch_optional(pool).await? {
        Some(row) => Ok(Some(row.try_get("row")?)),
        None => Ok(None),
    }
}

pub async fn delete_by_id(pool: &PgPool, table: &str, id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", table);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Arrays and objects land in jsonb columns
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

pub fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_sql_without_conditions() {
        let q = ListQuery {
            table: "announcements",
            conditions: vec![],
            order_column: "created_at".to_string(),
            order_desc: true,
            limit: 25,
            offset: 0,
        };
        assert_eq!(
            q.select_sql(),
            "SELECT row_to_json(t) AS row FROM \"announcements\" t ORDER BY \"created_at\" DESC LIMIT $1 OFFSET $2"
        );
        assert_eq!(q.count_sql(), "SELECT COUNT(*) AS count FROM \"announcements\" t");
    }

    #[test]
    fn conditions_number_binds_and_carry_casts() {
        let q = ListQuery {
            table: "members",
            conditions: vec![
                Cond {
                    column: "status",
                    cast: "",
                    value: json!("active"),
                },
                Cond {
                    column: "district_id",
                    cast: "::uuid",
                    value: json!("9e7f6f4e-0000-0000-0000-000000000000"),
                },
            ],
            order_column: "last_name".to_string(),
            order_desc: false,
            limit: 10,
            offset: 20,
        };
        let sql = q.select_sql();
        assert!(sql.contains("WHERE \"status\" = $1 AND \"district_id\" = $2::uuid"));
        assert!(sql.ends_with("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn insert_sql_shape() {
        let mut ws = WriteSet::default();
        ws.push("title", "", json!("Harvest Sunday"));
        ws.push("publish_at", "::timestamptz", json!("2026-08-01T09:00:00Z"));

        let columns: Vec<String> = ws.columns.iter().map(|c| format!("\"{}\"", c)).collect();
        assert_eq!(columns.join(", "), "\"title\", \"publish_at\"");
        assert!(!ws.is_empty());
    }
}
