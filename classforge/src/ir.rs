//! Intermediate Representation (IR) for code generation
//!
//! The IR is the flavor-neutral, fully resolved form of a class document:
//! canonical field types, constraint lists, shared relationship objects and
//! optional lifecycle contracts. Every emitter reads from it; none of them
//! recomputes a name the IR already carries.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::constraints::{Constraint, ConstraintKind};
use crate::lifecycle::{STATUS_FIELD, StateContract};
use crate::relationship::{Relationship, RelationshipRef};
use crate::types::CanonicalType;

/// Columns every generated table carries implicitly
pub const RESERVED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

/// A field after canonicalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    /// Field name as declared
    pub name: String,

    /// Exactly one canonical type
    pub canonical_type: CanonicalType,

    /// `false` implies a `required` constraint is present
    pub nullable: bool,

    /// Ordered constraint list
    pub constraints: Vec<Constraint>,

    /// Allowed values for `enum` fields
    pub enum_values: Vec<String>,

    /// Original spelling, kept for diagnostics
    pub raw_type: String,
}

impl ResolvedField {
    /// Look up a constraint by kind
    pub fn constraint(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.kind == kind)
    }

    pub fn has_constraint(&self, kind: ConstraintKind) -> bool {
        self.constraint(kind).is_some()
    }

    pub fn is_required(&self) -> bool {
        self.has_constraint(ConstraintKind::Required)
    }

    pub fn is_unique(&self) -> bool {
        self.has_constraint(ConstraintKind::Unique)
    }

    /// Literal default value, if one was declared
    pub fn default_value(&self) -> Option<&str> {
        self.constraint(ConstraintKind::Default)
            .and_then(|c| c.param("value"))
    }

    /// Whether this is the synthesized lifecycle status field
    pub fn is_status(&self) -> bool {
        self.name == STATUS_FIELD && self.canonical_type == CanonicalType::Enum
    }
}

/// One class after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Class name
    pub name: String,

    /// Database table name
    pub table_name: String,

    /// Fields in declaration order (reserved and owned key columns removed)
    pub fields: Vec<ResolvedField>,

    /// This model's views of the shared relationships
    pub relationships: Vec<RelationshipRef>,

    /// Present for stateful classes
    pub state: Option<StateContract>,
}

impl ResolvedModel {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_stateful(&self) -> bool {
        self.state.is_some()
    }

    /// Relationships whose foreign key lives on this model's table
    pub fn owned_foreign_keys(&self) -> impl Iterator<Item = &RelationshipRef> {
        self.relationships.iter().filter(|r| r.owns_foreign_key())
    }

    /// Accessors that should be eager-loaded
    pub fn eager_accessors(&self) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|r| r.loads_eagerly())
            .map(|r| r.accessor())
            .collect()
    }

    /// Fields with enum values, including the lifecycle status
    pub fn enum_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields
            .iter()
            .filter(|f| f.canonical_type == CanonicalType::Enum && !f.enum_values.is_empty())
    }
}

/// The complete resolved document
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    /// Models in declaration order
    pub models: Vec<ResolvedModel>,

    /// Every resolved relationship, shared with the models' views
    pub relationships: Vec<Arc<Relationship>>,
}

impl ModelSet {
    pub fn model(&self, name: &str) -> Option<&ResolvedModel> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Many-to-many relationships, each once
    pub fn join_relationships(&self) -> impl Iterator<Item = &Arc<Relationship>> {
        self.relationships
            .iter()
            .filter(|r| r.join_table_name.is_some())
    }

    /// The set with some classes and join tables removed
    ///
    /// Relationships touching a removed class or join table disappear from
    /// both endpoint models, together with the foreign keys they implied.
    pub fn without(&self, classes: &BTreeSet<String>, join_tables: &BTreeSet<String>) -> ModelSet {
        let keep = |relationship: &Relationship| {
            !classes.contains(&relationship.source_class)
                && !classes.contains(&relationship.target_class)
                && relationship
                    .join_table_name
                    .as_ref()
                    .is_none_or(|table| !join_tables.contains(table))
        };
        let models = self
            .models
            .iter()
            .filter(|m| !classes.contains(&m.name))
            .map(|m| ResolvedModel {
                relationships: m
                    .relationships
                    .iter()
                    .filter(|view| keep(Arc::as_ref(&view.relationship)))
                    .cloned()
                    .collect(),
                ..m.clone()
            })
            .collect();
        ModelSet {
            models,
            relationships: self
                .relationships
                .iter()
                .filter(|r| keep(Arc::as_ref(r)))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flavor;
    use crate::diagnostics::Diagnostics;
    use crate::resolve::resolve;
    use crate::source::parse_document;
    use crate::types::TypeCatalog;

    #[test]
    fn test_without_drops_relationships_to_removed_classes() {
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let set = resolve(
            &parse_document(
                "class User { name: string }\nclass Order { total: decimal }\nclass Tag { name: string }\nUser \"1\" -- \"*\" Order\nOrder \"*\" -- \"*\" Tag\n",
            ),
            &catalog,
            &mut Diagnostics::new(),
        );

        let removed: BTreeSet<String> = ["User".to_string()].into();
        let rest = set.without(&removed, &BTreeSet::new());
        assert!(rest.model("User").is_none());
        let order = rest.model("Order").unwrap();
        assert_eq!(order.owned_foreign_keys().count(), 0);
        assert_eq!(order.relationships.len(), 1);
        assert_eq!(rest.relationships.len(), 1);

        let joins: BTreeSet<String> = ["order_tag".to_string()].into();
        let rest = set.without(&BTreeSet::new(), &joins);
        assert_eq!(rest.len(), 3);
        assert_eq!(rest.join_relationships().count(), 0);
        assert!(rest.model("Tag").unwrap().relationships.is_empty());
    }
}
