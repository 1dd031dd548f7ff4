//! Resolution stage
//!
//! Turns parsed [`ClassModel`]s into [`ResolvedModel`]s. Relationship
//! resolution needs every class name up front, so the whole document is
//! resolved in one pass and the resulting relationships are shared by both
//! endpoint models.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::constraints::{self, ConstraintKind, extract, is_optional};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{ModelSet, RESERVED_COLUMNS, ResolvedField, ResolvedModel};
use crate::lifecycle::{STATUS_FIELD, State, StateContract};
use crate::naming::{is_portable_name, table_name};
use crate::relationship::{self, Relationship, views_for};
use crate::source::{ClassModel, RawField, SourceDocument};
use crate::types::{CanonicalType, TypeCatalog};

/// Resolve a parsed document into a model set
///
/// Dangling relationships, unknown types and dropped declarations are
/// recorded in `diagnostics`; none of them stops resolution.
pub fn resolve(
    document: &SourceDocument,
    catalog: &TypeCatalog,
    diagnostics: &mut Diagnostics,
) -> ModelSet {
    let class_names = document.class_names();
    let resolution = relationship::resolve_lenient(document.relationships(), &class_names);
    for dangling in &resolution.dangling {
        diagnostics.push(Diagnostic::from(dangling));
    }
    for collision in &resolution.collisions {
        diagnostics.invalid_declaration(&collision.class, Some(collision.line), collision.to_string());
    }

    let models = document
        .classes
        .iter()
        .map(|class| resolve_model(class, &resolution.relationships, catalog, diagnostics))
        .collect();

    ModelSet {
        models,
        relationships: resolution.relationships,
    }
}

/// Resolve one class against the already-resolved relationships
pub fn resolve_model(
    class: &ClassModel,
    relationships: &[Arc<Relationship>],
    catalog: &TypeCatalog,
    diagnostics: &mut Diagnostics,
) -> ResolvedModel {
    let table = table_name(&class.name);
    let views = views_for(&class.name, relationships);
    let owned_keys: BTreeSet<&str> = views
        .iter()
        .filter(|v| v.owns_foreign_key())
        .filter_map(|v| v.foreign_key())
        .collect();

    let mut fields = Vec::with_capacity(class.fields.len() + 1);
    for raw in &class.fields {
        if RESERVED_COLUMNS.contains(&raw.name.as_str()) {
            tracing::warn!(
                class = %class.name,
                field = %raw.name,
                "Dropping field that shadows a generated column"
            );
            continue;
        }
        if owned_keys.contains(raw.name.as_str()) {
            tracing::warn!(
                class = %class.name,
                field = %raw.name,
                "Dropping field that shadows a relationship foreign key"
            );
            continue;
        }
        if class.stateful && raw.name == STATUS_FIELD {
            tracing::warn!(
                class = %class.name,
                "Replacing declared status field with the lifecycle status"
            );
            continue;
        }
        if !is_portable_name(&raw.name) {
            diagnostics.invalid_declaration(
                &class.name,
                Some(raw.line),
                format!("field '{}' has no usable column name, dropped", raw.name),
            );
            continue;
        }
        fields.push(resolve_field(&class.name, &table, raw, catalog, diagnostics));
    }

    let state = class.stateful.then(|| StateContract::new(&class.extra_states));
    if let Some(contract) = &state {
        fields.push(status_field(contract));
    }

    ResolvedModel {
        name: class.name.clone(),
        table_name: table,
        fields,
        relationships: views,
        state,
    }
}

/// Resolve a single raw field
pub fn resolve_field(
    class: &str,
    table: &str,
    raw: &RawField,
    catalog: &TypeCatalog,
    diagnostics: &mut Diagnostics,
) -> ResolvedField {
    let resolution = catalog.resolve_spelling(&raw.raw_type);
    if !resolution.recognized {
        tracing::warn!(
            class = %class,
            field = %raw.name,
            raw_type = %raw.raw_type,
            "Unknown field type, using string"
        );
        diagnostics.unknown_type(class, &raw.name, &raw.raw_type);
    }

    let enum_values = if resolution.canonical == CanonicalType::Enum {
        resolution.args
    } else {
        Vec::new()
    };

    let mut constraints = extract(raw, table);
    constraints.retain(|constraint| {
        if constraint.kind != ConstraintKind::Default {
            return true;
        }
        let value = constraint.param("value").unwrap_or_default();
        let fits = if resolution.canonical == CanonicalType::Enum {
            if enum_values.iter().any(|v| v == value) {
                Ok(())
            } else {
                Err(format!("'{}' is not one of the enum values", value))
            }
        } else {
            resolution.canonical.check_default(value)
        };
        match fits {
            Ok(()) => true,
            Err(reason) => {
                diagnostics.invalid_declaration(
                    class,
                    Some(raw.line),
                    format!("default for field '{}' ignored: {}", raw.name, reason),
                );
                false
            }
        }
    });

    ResolvedField {
        name: raw.name.clone(),
        canonical_type: resolution.canonical,
        nullable: is_optional(raw),
        constraints,
        enum_values,
        raw_type: raw.raw_type.clone(),
    }
}

fn status_field(contract: &StateContract) -> ResolvedField {
    ResolvedField {
        name: STATUS_FIELD.to_string(),
        canonical_type: CanonicalType::Enum,
        nullable: false,
        constraints: vec![
            constraints::required(STATUS_FIELD),
            constraints::default_value(STATUS_FIELD, State::Active.as_str()),
        ],
        enum_values: contract.state_names(),
        raw_type: "enum".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flavor;
    use crate::diagnostics::DiagnosticKind;
    use crate::relationship::RelationKind;
    use crate::source::parse_document;

    fn resolve_source(source: &str) -> (ModelSet, Diagnostics) {
        let document = parse_document(source);
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let mut diagnostics = Diagnostics::new();
        let models = resolve(&document, &catalog, &mut diagnostics);
        (models, diagnostics)
    }

    #[test]
    fn test_concrete_scenario() {
        let (models, diagnostics) = resolve_source(
            "class User { email: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n",
        );
        assert!(diagnostics.is_empty());

        let order = models.model("Order").unwrap();
        let view = &order.relationships[0];
        assert_eq!(view.kind(), RelationKind::BelongsTo);
        assert!(view.owns_foreign_key());
        assert_eq!(view.foreign_key(), Some("user_id"));

        let user = models.model("User").unwrap();
        assert_eq!(user.relationships[0].accessor(), "orders");
        assert!(Arc::ptr_eq(
            &user.relationships[0].relationship,
            &order.relationships[0].relationship
        ));

        let email = user.field("email").unwrap();
        assert!(email.is_required());
        assert!(email.is_unique());
        assert_eq!(
            email.constraint(ConstraintKind::Unique).and_then(|c| c.param("table")),
            Some("users")
        );
    }

    #[test]
    fn test_reserved_and_owned_columns_are_dropped() {
        let (models, _) = resolve_source(
            "class User { name: string }\nclass Order { id: int; user_id: int; created_at: datetime; total: decimal }\nUser \"1\" -- \"*\" Order\n",
        );
        let order = models.model("Order").unwrap();
        let names: Vec<_> = order.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["total"]);
    }

    #[test]
    fn test_stateful_status_field() {
        let (models, _) =
            resolve_source("class Account <<stateful(CLOSED)>> { owner: string; status: int }");
        let account = models.model("Account").unwrap();
        assert!(account.is_stateful());
        assert_eq!(account.fields.len(), 2);
        let status = account.field("status").unwrap();
        assert!(status.is_status());
        assert_eq!(status.enum_values, vec!["ACTIVE", "SUSPENDED", "CLOSED"]);
        assert_eq!(status.default_value(), Some("ACTIVE"));
        assert!(!status.nullable);
    }

    #[test]
    fn test_unknown_type_is_one_warning() {
        let (models, diagnostics) = resolve_source("class User { avatar: picture }");
        let avatar = models.model("User").unwrap().field("avatar").unwrap();
        assert_eq!(avatar.canonical_type, CanonicalType::String);
        assert_eq!(diagnostics.count(DiagnosticKind::UnknownType), 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_dangling_relationship_is_dropped() {
        let (models, diagnostics) =
            resolve_source("class User { name: string }\nUser \"1\" -- \"*\" Ghost\n");
        assert_eq!(models.len(), 1);
        assert!(models.relationships.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::DanglingReference), 1);
    }

    #[test]
    fn test_unusable_field_name_is_dropped() {
        let (models, diagnostics) = resolve_source("class Item { _1: int; _: string; name: string }");
        let item = models.model("Item").unwrap();
        let names: Vec<_> = item.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name"]);
        assert_eq!(diagnostics.count(DiagnosticKind::InvalidDeclaration), 2);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_mistyped_default_is_dropped() {
        let (models, diagnostics) = resolve_source(
            "class Item { qty: int [default=abc]; active: bool [default=yes]; state: enum(draft,live) [default=gone] }",
        );
        let item = models.model("Item").unwrap();
        let qty = item.field("qty").unwrap();
        assert_eq!(qty.default_value(), None);
        assert!(qty.is_required());
        assert_eq!(item.field("active").unwrap().default_value(), Some("yes"));
        assert_eq!(item.field("state").unwrap().default_value(), None);
        assert_eq!(diagnostics.count(DiagnosticKind::InvalidDeclaration), 2);
    }

    #[test]
    fn test_accessor_collision_keeps_both_classes() {
        let (models, diagnostics) = resolve_source(
            "class User { name: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\nOrder \"*\" -- \"*\" User\n",
        );
        assert_eq!(models.relationships.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::InvalidDeclaration), 1);
        let user = models.model("User").unwrap();
        let accessors: Vec<_> = user.relationships.iter().map(|v| v.accessor()).collect();
        assert_eq!(accessors, vec!["orders"]);
    }

    #[test]
    fn test_enum_values() {
        let (models, _) = resolve_source("class Post { state: enum(draft,published) }");
        let state = models.model("Post").unwrap().field("state").unwrap();
        assert_eq!(state.canonical_type, CanonicalType::Enum);
        assert_eq!(state.enum_values, vec!["draft", "published"]);
    }
}
