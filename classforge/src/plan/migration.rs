//! Table plans and migration ordering

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::ir::{ModelSet, ResolvedModel};
use crate::naming::table_name;
use crate::relationship::Relationship;
use crate::types::{CanonicalType, TypeCatalog};

/// Referential action for a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    Cascade,
    SetNull,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

/// One declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnPlan {
    pub name: String,
    pub canonical_type: CanonicalType,
    /// Flavor-specific storage fragment
    pub fragment: String,
    pub sql_type: String,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<String>,
    pub enum_values: Vec<String>,
}

/// A foreign-key column owned by the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyPlan {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub nullable: bool,
    pub on_delete: OnDelete,
}

/// Everything a migration needs to create one model's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlan {
    pub class_name: String,
    pub table: String,
    pub columns: Vec<ColumnPlan>,
    pub foreign_keys: Vec<ForeignKeyPlan>,
}

impl TablePlan {
    /// Build the table plan of a model
    ///
    /// Foreign keys come from the model's shared relationship views, so the
    /// column names are exactly the ones the entity accessors use.
    pub fn build(model: &ResolvedModel, catalog: &TypeCatalog) -> Self {
        let columns = model
            .fields
            .iter()
            .map(|field| {
                let fragment = if field.enum_values.is_empty() {
                    catalog.migration_fragment(field.canonical_type, &field.name)
                } else {
                    catalog.enum_fragment(&field.name, &field.enum_values)
                };
                ColumnPlan {
                    name: field.name.clone(),
                    canonical_type: field.canonical_type,
                    fragment,
                    sql_type: catalog.sql_equivalent(field.canonical_type).to_string(),
                    nullable: field.nullable,
                    unique: field.is_unique(),
                    default: field.default_value().map(str::to_string),
                    enum_values: field.enum_values.clone(),
                }
            })
            .collect();

        let foreign_keys = model
            .owned_foreign_keys()
            .filter_map(|view| {
                let column = view.foreign_key()?.to_string();
                let self_ref = view.relationship.is_self_referential();
                Some(ForeignKeyPlan {
                    column,
                    references_table: table_name(view.related_class()),
                    references_column: "id".to_string(),
                    nullable: self_ref,
                    on_delete: if self_ref {
                        OnDelete::SetNull
                    } else {
                        OnDelete::Cascade
                    },
                })
            })
            .collect();

        Self {
            class_name: model.name.clone(),
            table: model.table_name.clone(),
            columns,
            foreign_keys,
        }
    }

    /// Tables this one references, excluding itself
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table.as_str())
            .filter(|t| *t != self.table)
            .collect()
    }
}

/// One side of a join table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotColumn {
    pub column: String,
    /// Class the column references
    pub class: String,
    pub references_table: String,
}

/// A many-to-many join table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinTablePlan {
    pub table: String,
    pub left: PivotColumn,
    pub right: PivotColumn,
}

impl JoinTablePlan {
    /// Plan for a many-to-many relationship; `None` for other cardinalities
    pub fn from_relationship(relationship: &Relationship) -> Option<Self> {
        let table = relationship.join_table_name.clone()?;
        let (source_column, target_column) = relationship.pivot_columns()?;
        Some(Self {
            table,
            left: PivotColumn {
                column: source_column,
                class: relationship.source_class.clone(),
                references_table: table_name(&relationship.source_class),
            },
            right: PivotColumn {
                column: target_column,
                class: relationship.target_class.clone(),
                references_table: table_name(&relationship.target_class),
            },
        })
    }
}

/// Order models so every referenced table is created first
///
/// Ties are broken by declaration order; models caught in a reference cycle
/// keep their declaration order.
pub fn migration_order(models: &ModelSet) -> Vec<&ResolvedModel> {
    let index: HashMap<&str, usize> = models
        .models
        .iter()
        .enumerate()
        .map(|(i, m)| (m.table_name.as_str(), i))
        .collect();

    let deps: Vec<BTreeSet<usize>> = models
        .models
        .iter()
        .map(|model| {
            model
                .owned_foreign_keys()
                .filter_map(|view| index.get(table_name(view.related_class()).as_str()).copied())
                .filter(|dep| models.models[*dep].name != model.name)
                .collect()
        })
        .collect();

    let mut placed = vec![false; models.models.len()];
    let mut order = Vec::with_capacity(models.models.len());
    loop {
        let next = (0..models.models.len())
            .find(|&i| !placed[i] && deps[i].iter().all(|d| placed[*d]));
        match next {
            Some(i) => {
                placed[i] = true;
                order.push(&models.models[i]);
            }
            None => break,
        }
    }

    if order.len() < models.models.len() {
        tracing::warn!("Foreign-key cycle between models, using declaration order for the rest");
        for (i, model) in models.models.iter().enumerate() {
            if !placed[i] {
                order.push(model);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flavor;
    use crate::diagnostics::Diagnostics;
    use crate::resolve::resolve;
    use crate::source::parse_document;

    fn models(source: &str) -> ModelSet {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        resolve(&parse_document(source), &catalog, &mut Diagnostics::new())
    }

    fn names<'a>(order: &[&'a ResolvedModel]) -> Vec<&'a str> {
        order.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_table_plan() {
        let set = models(
            "class Order { total: decimal; note: text? [default=none] }\nclass User { email: string }\nUser \"1\" -- \"*\" Order\n",
        );
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let plan = TablePlan::build(set.model("Order").unwrap(), &catalog);
        assert_eq!(plan.table, "orders");
        assert_eq!(plan.columns[0].fragment, "$table->decimal('total', 10, 2)");
        assert!(plan.columns[1].nullable);
        assert_eq!(plan.columns[1].default.as_deref(), Some("none"));
        assert_eq!(plan.foreign_keys.len(), 1);
        assert_eq!(plan.foreign_keys[0].column, "user_id");
        assert_eq!(plan.foreign_keys[0].references_table, "users");
        assert_eq!(plan.foreign_keys[0].on_delete, OnDelete::Cascade);
        assert_eq!(plan.dependencies().into_iter().collect::<Vec<_>>(), vec!["users"]);
    }

    #[test]
    fn test_migration_order_follows_foreign_keys() {
        let set = models(
            "class OrderItem { qty: int }\nclass Order { total: decimal }\nclass User { name: string }\nOrder \"1\" -- \"*\" OrderItem\nUser \"1\" -- \"*\" Order\n",
        );
        assert_eq!(names(&migration_order(&set)), vec!["User", "Order", "OrderItem"]);
    }

    #[test]
    fn test_migration_order_keeps_declaration_order_for_ties() {
        let set = models("class B { x: int }\nclass A { y: int }\nclass C { z: int }\n");
        assert_eq!(names(&migration_order(&set)), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_self_reference_is_not_a_dependency() {
        let set = models("class Category { name: string }\nCategory \"1\" -- \"*\" Category\n");
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let plan = TablePlan::build(set.model("Category").unwrap(), &catalog);
        assert!(plan.dependencies().is_empty());
        assert!(plan.foreign_keys[0].nullable);
        assert_eq!(plan.foreign_keys[0].on_delete, OnDelete::SetNull);
        assert_eq!(migration_order(&set).len(), 1);
    }

    #[test]
    fn test_cycle_falls_back_to_declaration_order() {
        let set = models(
            "class A { x: int }\nclass B { y: int }\nA \"1\" -- \"1\" B\nB \"1\" -- \"*\" A\n",
        );
        assert_eq!(names(&migration_order(&set)), vec!["A", "B"]);
    }

    #[test]
    fn test_join_table_plan() {
        let set = models("class Tag { name: string }\nclass Post { title: string }\nTag \"*\" -- \"*\" Post\n");
        let relationship = set.join_relationships().next().unwrap();
        let plan = JoinTablePlan::from_relationship(relationship).unwrap();
        assert_eq!(plan.table, "post_tag");
        assert_eq!(plan.left.column, "tag_id");
        assert_eq!(plan.left.references_table, "tags");
        assert_eq!(plan.right.column, "post_id");
    }
}
