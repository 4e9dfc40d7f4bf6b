use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A scalar attribute value.
///
/// Custom fields arrive from the CRM forms layer as loosely-typed JSON; this
/// closed sum keeps them typed while preserving the distinction between a
/// field that is present-but-null and one that is absent entirely (the
/// resolver models absence as `None`, never as a `FieldValue`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Strict numeric view. Numeric-looking strings do not coerce here;
    /// lenient coercion is an operator-evaluation concern.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a text value as a timestamp. Accepts RFC 3339 and bare
    /// `YYYY-MM-DD` dates (midnight UTC).
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        let s = self.as_str()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| ndt.and_utc())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Null or a string with no non-whitespace content. Drives the
    /// `is_empty`/`is_set` operators together with absence.
    pub fn is_empty_like(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// The record kind a segment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Contact,
    Lead,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Lead => "lead",
        }
    }
}

/// Read projection of a contact or lead record: the built-in columns every
/// record carries plus the tenant-defined custom-field map. Built-ins and
/// custom keys share one field namespace; the resolver checks built-ins
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntity {
    pub id: Uuid,
    pub org_id: Uuid,
    pub kind: EntityKind,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub revenue: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_fields: HashMap<String, FieldValue>,
}

impl CandidateEntity {
    /// A blank record owned by `org_id`. Callers fill in the columns they
    /// care about.
    pub fn new(org_id: Uuid, kind: EntityKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            kind,
            first_name: None,
            last_name: None,
            email: None,
            company: None,
            status: None,
            source: None,
            revenue: None,
            created_at: now,
            updated_at: now,
            custom_fields: HashMap::new(),
        }
    }
}

/// Lightweight display projection returned by the preview path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPreview {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
}
