//! Flavor-neutral emission plans
//!
//! Plans are typed descriptions of what an artifact must contain (columns,
//! keys, rules, operators), built once from the resolved models. Backends only
//! render them, so emitted-output correctness can be checked on the plan
//! without diffing strings.

pub mod filter;
pub mod migration;
pub mod validation;

pub use filter::{FilterField, FilterPlan};
pub use migration::{
    ColumnPlan, ForeignKeyPlan, JoinTablePlan, OnDelete, PivotColumn, TablePlan, migration_order,
};
pub use validation::{FieldRules, Rule, ValidationPlan};
