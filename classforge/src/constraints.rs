//! Constraint extraction
//!
//! Purely syntactic: the constraint list of a field is derived from its name,
//! its raw type spelling and its inline markers. Every field without an
//! explicit optional marker is required.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::source::RawField;
use crate::types::normalize;

/// Kinds of field constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Required,
    Unique,
    Email,
    Url,
    Uuid,
    Regex,
    Nullable,
    Default,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Email => "email",
            ConstraintKind::Url => "url",
            ConstraintKind::Uuid => "uuid",
            ConstraintKind::Regex => "regex",
            ConstraintKind::Nullable => "nullable",
            ConstraintKind::Default => "default",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint attached to a resolved field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub params: BTreeMap<String, String>,
    pub message: String,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, field: &str) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
            message: default_message(kind, field),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Markers understood by the extractor
pub const KNOWN_MARKERS: &[&str] = &[
    "required", "optional", "nullable", "unique", "email", "url", "uuid", "regex", "pattern",
    "default",
];

fn default_message(kind: ConstraintKind, field: &str) -> String {
    let label = field.replace('_', " ");
    match kind {
        ConstraintKind::Required => format!("The {} field is required.", label),
        ConstraintKind::Unique => format!("The {} has already been taken.", label),
        ConstraintKind::Email => format!("The {} must be a valid email address.", label),
        ConstraintKind::Url => format!("The {} must be a valid URL.", label),
        ConstraintKind::Uuid => format!("The {} must be a valid UUID.", label),
        ConstraintKind::Regex => format!("The {} format is invalid.", label),
        ConstraintKind::Nullable => format!("The {} field may be empty.", label),
        ConstraintKind::Default => format!("The {} field has a default value.", label),
    }
}

/// Whether the field carries an explicit optional marker
pub fn is_optional(field: &RawField) -> bool {
    field.raw_type.trim_end().ends_with('?')
        || field.has_marker("optional")
        || field.has_marker("nullable")
}

/// Derive the ordered constraint list of a field
///
/// `table` scopes the implicit `unique` constraint of email-shaped fields.
pub fn extract(field: &RawField, table: &str) -> Vec<Constraint> {
    let name = field.name.as_str();
    let type_key = normalize(&field.raw_type);
    let mut constraints = Vec::new();

    if is_optional(field) {
        constraints.push(Constraint::new(ConstraintKind::Nullable, name));
    } else {
        constraints.push(Constraint::new(ConstraintKind::Required, name));
    }

    let email = field.has_marker("email")
        || name.to_lowercase().contains("email")
        || type_key.contains("email");

    if email || field.has_marker("unique") {
        constraints.push(
            Constraint::new(ConstraintKind::Unique, name)
                .with_param("table", table)
                .with_param("column", name),
        );
    }
    if email {
        constraints.push(Constraint::new(ConstraintKind::Email, name));
    }
    if field.has_marker("url") || type_key == "url" {
        constraints.push(Constraint::new(ConstraintKind::Url, name));
    }
    if field.has_marker("uuid") || matches!(type_key.as_str(), "uuid" | "guid") {
        constraints.push(Constraint::new(ConstraintKind::Uuid, name));
    }
    if let Some(pattern) = field
        .marker_value("regex")
        .or_else(|| field.marker_value("pattern"))
    {
        constraints.push(Constraint::new(ConstraintKind::Regex, name).with_param("pattern", pattern));
    }
    if let Some(value) = field.marker_value("default") {
        constraints.push(Constraint::new(ConstraintKind::Default, name).with_param("value", value));
    }

    for marker in &field.markers {
        if !KNOWN_MARKERS.contains(&marker.name.as_str()) {
            tracing::warn!(field = %name, marker = %marker.name, "Ignoring unknown constraint marker");
        }
    }

    constraints
}

/// Required constraint for a synthesized field
pub fn required(field: &str) -> Constraint {
    Constraint::new(ConstraintKind::Required, field)
}

/// Default-value constraint for a synthesized field
pub fn default_value(field: &str, value: &str) -> Constraint {
    Constraint::new(ConstraintKind::Default, field).with_param("value", value)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn required_unless_optional(
            name in "[a-z][a-z_]{0,10}",
            ty in prop::sample::select(vec!["string", "int", "decimal", "text", "whatever"]),
            optional in any::<bool>(),
        ) {
            let raw = if optional { format!("{}?", ty) } else { ty.to_string() };
            let constraints = extract(&RawField::new(name, raw), "things");
            let required = constraints.iter().any(|c| c.kind == ConstraintKind::Required);
            let nullable = constraints.iter().any(|c| c.kind == ConstraintKind::Nullable);
            prop_assert_eq!(required, !optional);
            prop_assert_eq!(nullable, optional);
        }
    }
}
