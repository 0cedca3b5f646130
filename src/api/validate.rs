//! Declarative request validation for the generic data plane. Each
//! registry resource carries a set of [`FieldRule`]s; payloads are checked
//! for unknown fields, missing required fields, type mismatches, length
//! overruns and out-of-set enum values before any SQL is built.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Int,
    Bool,
    Decimal,
    Date,
    Timestamp,
    Uuid,
    Json,
}

impl FieldKind {
    /// SQL cast appended to the positional bind for this kind. Values are
    /// bound as text/number/bool/json and Postgres converts explicitly.
    pub fn cast(&self) -> &'static str {
        match self {
            FieldKind::Text => "",
            FieldKind::Int => "::bigint",
            FieldKind::Bool => "::boolean",
            FieldKind::Decimal => "::numeric",
            FieldKind::Date => "::date",
            FieldKind::Timestamp => "::timestamptz",
            FieldKind::Uuid => "::uuid",
            FieldKind::Json => "::jsonb",
        }
    }

    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            FieldKind::Text => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err("must be a string".to_string())
                }
            }
            FieldKind::Int => {
                if value.as_i64().is_some() {
                    Ok(())
                } else {
                    Err("must be an integer".to_string())
                }
            }
            FieldKind::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("must be a boolean".to_string())
                }
            }
            FieldKind::Decimal => match value {
                Value::Number(_) => Ok(()),
                Value::String(s) if Decimal::from_str(s).is_ok() => Ok(()),
                _ => Err("must be a decimal number".to_string()),
            },
            FieldKind::Date => match value.as_str() {
                Some(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => Ok(()),
                _ => Err("must be a date in YYYY-MM-DD format".to_string()),
            },
            FieldKind::Timestamp => match value.as_str() {
                Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(()),
                _ => Err("must be an RFC 3339 timestamp".to_string()),
            },
            FieldKind::Uuid => match value.as_str() {
                Some(s) if Uuid::parse_str(s).is_ok() => Ok(()),
                _ => Err("must be a UUID".to_string()),
            },
            FieldKind::Json => {
                if value.is_object() || value.is_array() {
                    Ok(())
                } else {
                    Err("must be a JSON object or array".to_string())
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Accepted in filters but rejected in request bodies (server-managed).
    pub readonly: bool,
    pub max_len: Option<usize>,
    pub one_of: Option<&'static [&'static str]>,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            readonly: false,
            max_len: None,
            one_of: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            readonly: false,
            max_len: None,
            one_of: None,
        }
    }

    pub const fn readonly(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            readonly: true,
            max_len: None,
            one_of: None,
        }
    }

    pub const fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }
}

/// Validate a JSON payload against the rules. With `partial` set (PATCH),
/// required fields may be absent but still may not be null.
pub fn validate_payload(
    rules: &[FieldRule],
    payload: &Map<String, Value>,
    partial: bool,
) -> Result<(), ApiError> {
    let mut errors: BTreeMap<String, String> = BTreeMap::new();

    for (key, value) in payload {
        let Some(rule) = rules.iter().find(|r| r.name == key.as_str()) else {
            errors.insert(key.clone(), "unknown field".to_string());
            continue;
        };

        if rule.readonly {
            errors.insert(key.clone(), "read-only field".to_string());
            continue;
        }

        if value.is_null() {
            if rule.required {
                errors.insert(key.clone(), "this field cannot be null".to_string());
            }
            continue;
        }

        if let Err(msg) = rule.kind.check(value) {
            errors.insert(key.clone(), msg);
            continue;
        }

        if let (Some(max), Some(s)) = (rule.max_len, value.as_str()) {
            if s.chars().count() > max {
                errors.insert(key.clone(), format!("must be at most {} characters", max));
                continue;
            }
        }

        if let (Some(allowed), Some(s)) = (rule.one_of, value.as_str()) {
            if !allowed.contains(&s) {
                errors.insert(key.clone(), format!("must be one of: {}", allowed.join(", ")));
            }
        }
    }

    if !partial {
        for rule in rules.iter().filter(|r| r.required && !r.readonly) {
            if !payload.contains_key(rule.name) {
                errors.insert(rule.name.to_string(), "this field is required".to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Validation failed", Some(errors)))
    }
}
