//! Relationship resolution
//!
//! Raw `A "card" -- "card" B` declarations are classified into one-to-one,
//! one-to-many or many-to-many and normalised so that:
//!
//! - one-to-many always has the "1" end as `source_class` and the "*" end as
//!   `target_class`; the target owns the foreign key `snake(source)_id`
//! - one-to-one also puts the foreign key on the target
//! - many-to-many gets a join table named from both class stems in
//!   lexicographic order, whichever side declared it
//!
//! Resolution needs the complete set of class names, so it runs once over the
//! whole document. The resulting [`Relationship`] values are shared through
//! `Arc` by both endpoint models and by every emitter; names are computed here
//! and nowhere else.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::DanglingReferenceError;
use crate::naming::{
    collection_accessor, foreign_key_column, join_table_name, singular_accessor, table_stem,
};
use crate::source::{Multiplicity, RawRelationship};

/// Prefix applied to the owned key and inverse accessor of self-references
const SELF_REF_PREFIX: &str = "parent";
/// Prefix applied to the second pivot column of a self-referential join table
const SELF_PIVOT_PREFIX: &str = "related";

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl Cardinality {
    /// Classify a pair of multiplicities
    pub fn classify(left: Multiplicity, right: Multiplicity) -> Self {
        match (left, right) {
            (Multiplicity::Many, Multiplicity::Many) => Cardinality::ManyToMany,
            (Multiplicity::One, Multiplicity::One) => Cardinality::OneToOne,
            _ => Cardinality::OneToMany,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cardinality::OneToOne => "ONE_TO_ONE",
            Cardinality::OneToMany => "ONE_TO_MANY",
            Cardinality::ManyToMany => "MANY_TO_MANY",
        })
    }
}

/// A resolved relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Relationship {
    pub source_class: String,
    pub target_class: String,
    pub cardinality: Cardinality,
    /// Accessor on `source_class` navigating to `target_class`
    pub accessor_name: String,
    /// Accessor on `target_class` navigating back to `source_class`
    pub inverse_accessor_name: String,
    /// Set for one-to-one and one-to-many; the column lives on `target_class`
    pub foreign_key_column: Option<String>,
    /// Set for many-to-many only
    pub join_table_name: Option<String>,
    pub eager_load: bool,
}

impl Relationship {
    pub fn is_self_referential(&self) -> bool {
        self.source_class == self.target_class
    }

    pub fn involves(&self, class: &str) -> bool {
        self.source_class == class || self.target_class == class
    }

    /// Class holding the foreign key, if any
    pub fn owner(&self) -> Option<&str> {
        match self.cardinality {
            Cardinality::ManyToMany => None,
            _ => Some(&self.target_class),
        }
    }

    /// Key columns of the join table, `(source column, target column)`
    pub fn pivot_columns(&self) -> Option<(String, String)> {
        if self.cardinality != Cardinality::ManyToMany {
            return None;
        }
        let source = format!("{}_id", table_stem(&self.source_class));
        let target = if self.is_self_referential() {
            format!("{}_{}_id", SELF_PIVOT_PREFIX, table_stem(&self.target_class))
        } else {
            format!("{}_id", table_stem(&self.target_class))
        };
        Some((source, target))
    }

    /// Identity used to collapse duplicate declarations
    fn identity(&self) -> (String, String, Cardinality) {
        match &self.join_table_name {
            Some(join) => (join.clone(), String::new(), self.cardinality),
            None => (
                self.source_class.clone(),
                self.target_class.clone(),
                self.cardinality,
            ),
        }
    }
}

/// Which end of a relationship a model sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

/// Relationship kind seen from one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
}

/// One model's view of a shared relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRef {
    pub relationship: Arc<Relationship>,
    pub side: Side,
}

impl RelationshipRef {
    pub fn new(relationship: Arc<Relationship>, side: Side) -> Self {
        Self { relationship, side }
    }

    pub fn kind(&self) -> RelationKind {
        match (self.side, self.relationship.cardinality) {
            (_, Cardinality::ManyToMany) => RelationKind::BelongsToMany,
            (Side::Source, Cardinality::OneToOne) => RelationKind::HasOne,
            (Side::Source, Cardinality::OneToMany) => RelationKind::HasMany,
            (Side::Target, _) => RelationKind::BelongsTo,
        }
    }

    /// Accessor name on this model
    pub fn accessor(&self) -> &str {
        match self.side {
            Side::Source => &self.relationship.accessor_name,
            Side::Target => &self.relationship.inverse_accessor_name,
        }
    }

    /// The class at the other end
    pub fn related_class(&self) -> &str {
        match self.side {
            Side::Source => &self.relationship.target_class,
            Side::Target => &self.relationship.source_class,
        }
    }

    pub fn foreign_key(&self) -> Option<&str> {
        self.relationship.foreign_key_column.as_deref()
    }

    /// Whether the foreign-key column lives on this model's table
    pub fn owns_foreign_key(&self) -> bool {
        self.side == Side::Target && self.relationship.cardinality != Cardinality::ManyToMany
    }

    /// Whether this accessor is eager-loaded
    ///
    /// Eager loading follows the foreign key towards the parent, and a
    /// many-to-many loads from its source side only, so two models never
    /// eager-load each other.
    pub fn loads_eagerly(&self) -> bool {
        self.relationship.eager_load
            && match self.relationship.cardinality {
                Cardinality::ManyToMany => self.side == Side::Source,
                _ => self.side == Side::Target,
            }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind(), RelationKind::HasMany | RelationKind::BelongsToMany)
    }

    pub fn join_table(&self) -> Option<&str> {
        self.relationship.join_table_name.as_deref()
    }

    /// Pivot columns as `(this model's column, related model's column)`
    pub fn pivot_columns(&self) -> Option<(String, String)> {
        let (source, target) = self.relationship.pivot_columns()?;
        Some(match self.side {
            Side::Source => (source, target),
            Side::Target => (target, source),
        })
    }
}

/// A relationship dropped because one of its accessors was already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorCollision {
    pub class: String,
    pub accessor: String,
    pub left: String,
    pub right: String,
    pub line: usize,
}

impl fmt::Display for AccessorCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "relationship {} -- {} dropped: {} already has an accessor named '{}'",
            self.left, self.right, self.class, self.accessor
        )
    }
}

/// Outcome of lenient resolution
#[derive(Debug, Clone, Default)]
pub struct RelationshipResolution {
    pub relationships: Vec<Arc<Relationship>>,
    pub dangling: Vec<DanglingReferenceError>,
    pub collisions: Vec<AccessorCollision>,
}

/// Resolve one declaration against the known class names
pub fn resolve_one(
    raw: &RawRelationship,
    class_names: &BTreeSet<String>,
) -> Result<Relationship, DanglingReferenceError> {
    for endpoint in [&raw.left, &raw.right] {
        if !class_names.contains(endpoint) {
            return Err(DanglingReferenceError {
                left: raw.left.clone(),
                right: raw.right.clone(),
                missing: endpoint.clone(),
                line: raw.line,
            });
        }
    }

    let cardinality = Cardinality::classify(raw.left_multiplicity, raw.right_multiplicity);
    let (source, target) = match (raw.left_multiplicity, raw.right_multiplicity) {
        // The "1" end is always the source of a one-to-many
        (Multiplicity::Many, Multiplicity::One) => (&raw.right, &raw.left),
        _ => (&raw.left, &raw.right),
    };
    let self_ref = source == target;

    let accessor_name = match cardinality {
        Cardinality::OneToOne => singular_accessor(target),
        Cardinality::OneToMany | Cardinality::ManyToMany => collection_accessor(target),
    };

    let inverse_accessor_name = match (cardinality, self_ref) {
        (Cardinality::ManyToMany, true) => {
            collection_accessor(&format!("{}_{}", SELF_PIVOT_PREFIX, source))
        }
        (Cardinality::ManyToMany, false) => collection_accessor(source),
        (_, true) => singular_accessor(&format!("{}_{}", SELF_REF_PREFIX, source)),
        (_, false) => singular_accessor(source),
    };

    let (foreign_key_column, join_table_name) = match cardinality {
        Cardinality::ManyToMany => (None, Some(join_table_name(source, target))),
        _ if self_ref => (
            Some(format!("{}_{}", SELF_REF_PREFIX, foreign_key_column(source))),
            None,
        ),
        _ => (Some(foreign_key_column(source)), None),
    };

    Ok(Relationship {
        source_class: source.clone(),
        target_class: target.clone(),
        cardinality,
        accessor_name,
        inverse_accessor_name,
        foreign_key_column,
        join_table_name,
        eager_load: raw.eager,
    })
}

/// Resolve every declaration, failing on the first dangling reference
pub fn resolve<'a>(
    raws: impl IntoIterator<Item = &'a RawRelationship>,
    class_names: &BTreeSet<String>,
) -> Result<Vec<Relationship>, DanglingReferenceError> {
    let mut seen = HashSet::new();
    let mut relationships = Vec::new();
    for raw in raws {
        let relationship = resolve_one(raw, class_names)?;
        if seen.insert(relationship.identity()) {
            relationships.push(relationship);
        }
    }
    Ok(relationships)
}

/// Resolve every declaration, dropping and recording dangling ones
///
/// A relationship that would give a class a second accessor of the same name
/// is dropped too; the first declaration wins.
pub fn resolve_lenient<'a>(
    raws: impl IntoIterator<Item = &'a RawRelationship>,
    class_names: &BTreeSet<String>,
) -> RelationshipResolution {
    let mut seen = HashSet::new();
    let mut accessors: HashSet<(String, String)> = HashSet::new();
    let mut resolution = RelationshipResolution::default();
    for raw in raws {
        match resolve_one(raw, class_names) {
            Ok(relationship) => {
                if seen.contains(&relationship.identity()) {
                    tracing::debug!(
                        left = %raw.left,
                        right = %raw.right,
                        line = raw.line,
                        "Collapsing duplicate relationship"
                    );
                    continue;
                }
                let ends = [
                    (relationship.source_class.clone(), relationship.accessor_name.clone()),
                    (relationship.target_class.clone(), relationship.inverse_accessor_name.clone()),
                ];
                let taken = ends
                    .iter()
                    .find(|end| accessors.contains(*end))
                    .or_else(|| (ends[0] == ends[1]).then_some(&ends[1]));
                if let Some((class, accessor)) = taken {
                    tracing::warn!(
                        class = %class,
                        accessor = %accessor,
                        line = raw.line,
                        "Dropping relationship with a colliding accessor"
                    );
                    resolution.collisions.push(AccessorCollision {
                        class: class.clone(),
                        accessor: accessor.clone(),
                        left: raw.left.clone(),
                        right: raw.right.clone(),
                        line: raw.line,
                    });
                    continue;
                }
                seen.insert(relationship.identity());
                accessors.extend(ends);
                resolution.relationships.push(Arc::new(relationship));
            }
            Err(err) => {
                tracing::warn!(
                    missing = %err.missing,
                    line = err.line,
                    "Dropping relationship to unknown class"
                );
                resolution.dangling.push(err);
            }
        }
    }
    resolution
}

/// Per-model views of the shared relationships, in resolution order
pub fn views_for(class: &str, relationships: &[Arc<Relationship>]) -> Vec<RelationshipRef> {
    let mut views = Vec::new();
    for relationship in relationships {
        if relationship.source_class == class {
            views.push(RelationshipRef::new(Arc::clone(relationship), Side::Source));
        }
        if relationship.target_class == class {
            views.push(RelationshipRef::new(Arc::clone(relationship), Side::Target));
        }
    }
    views
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn join_table_is_declaration_order_independent(
            a in "[A-Z][a-z]{1,6}",
            b in "[A-Z][a-z]{1,6}",
        ) {
            let all: BTreeSet<String> = [a.clone(), b.clone()].into_iter().collect();
            let ab = resolve_one(
                &RawRelationship::new(&a, Multiplicity::Many, Multiplicity::Many, &b),
                &all,
            ).unwrap();
            let ba = resolve_one(
                &RawRelationship::new(&b, Multiplicity::Many, Multiplicity::Many, &a),
                &all,
            ).unwrap();
            prop_assert_eq!(ab.join_table_name, ba.join_table_name);
        }
    }
}
