//! Loosely-typed legacy source records
//!
//! A source record is whatever one row of a legacy export contains: an
//! ordered list of field name / raw value pairs, tagged with the extractor
//! that produced it. No schema is implied beyond the field names.

use serde_json::Value;

/// Which extractor produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Flat CSV export
    FlatExport,
    /// Remote no-code platform API
    RemoteApi,
}

impl SourceOrigin {
    /// Prefix used to origin-qualify legacy row ids, so numerically
    /// colliding ids from the two sources cannot merge in the registry.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            SourceOrigin::FlatExport => "csv",
            SourceOrigin::RemoteApi => "api",
        }
    }
}

/// One legacy record, immutable once read
#[derive(Debug, Clone)]
pub struct SourceRecord {
    origin: SourceOrigin,
    fields: Vec<(String, Value)>,
}

impl SourceRecord {
    pub fn new(origin: SourceOrigin) -> Self {
        Self {
            origin,
            fields: Vec::new(),
        }
    }

    pub fn from_pairs(origin: SourceOrigin, fields: Vec<(String, Value)>) -> Self {
        Self { origin, fields }
    }

    /// Append a field (used only while the extractor builds the record)
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    /// Raw value of the first field with this name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Trimmed, non-empty string rendition of a field.
    ///
    /// Numbers and booleans render to their canonical string forms; null,
    /// absent, blank, and structured values all read as "no value".
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// First present value among several candidate legacy field names
    pub fn first_str(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|n| self.get_str(n))
    }

    /// Origin-qualified legacy row id, the natural key for row-scoped
    /// entities (notes, messages, referrals, ...).
    pub fn qualified_id(&self, names: &[&str]) -> Option<String> {
        self.first_str(names)
            .map(|id| format!("{}:{}", self.origin.key_prefix(), id))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
