//! Search/filter plans

use serde::Serialize;

use crate::ir::ResolvedModel;
use crate::types::{CanonicalType, ComparisonClass};

/// One filterable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterField {
    pub field: String,
    pub canonical_type: CanonicalType,
    /// `None` for booleans, which only filter by equality
    pub class: Option<ComparisonClass>,
    pub operators: Vec<&'static str>,
}

/// Filter plan for one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPlan {
    pub class_name: String,
    pub fields: Vec<FilterField>,
}

impl FilterPlan {
    /// Json and binary columns are not filterable
    pub fn build(model: &ResolvedModel) -> Self {
        let mut fields: Vec<FilterField> = model
            .fields
            .iter()
            .filter_map(|field| filter_field(&field.name, field.canonical_type))
            .collect();

        for view in model.owned_foreign_keys() {
            if let Some(column) = view.foreign_key() {
                fields.push(FilterField {
                    field: column.to_string(),
                    canonical_type: CanonicalType::BigInteger,
                    class: Some(ComparisonClass::Numeric),
                    operators: vec!["eq", "in"],
                });
            }
        }

        Self {
            class_name: model.name.clone(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// Fields filterable by the given class
    pub fn by_class(&self, class: ComparisonClass) -> impl Iterator<Item = &FilterField> {
        self.fields.iter().filter(move |f| f.class == Some(class))
    }
}

fn filter_field(name: &str, canonical_type: CanonicalType) -> Option<FilterField> {
    let (class, operators) = match canonical_type.comparison_class() {
        Some(class) => (Some(class), class.operators().to_vec()),
        None if canonical_type == CanonicalType::Boolean => (None, vec!["eq"]),
        None => return None,
    };
    Some(FilterField {
        field: name.to_string(),
        canonical_type,
        class,
        operators,
    })
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
    fn test_operator_classes() {
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let set = resolve(
            &parse_document(
                "class Product { name: string; price: decimal; released: date; active: bool; meta: json }",
            ),
            &catalog,
            &mut Diagnostics::new(),
        );
        let plan = FilterPlan::build(set.model("Product").unwrap());

        assert_eq!(plan.field("price").unwrap().class, Some(ComparisonClass::Numeric));
        assert!(plan.field("price").unwrap().operators.contains(&"between"));
        assert!(plan.field("name").unwrap().operators.contains(&"contains"));
        assert!(plan.field("released").unwrap().operators.contains(&"before"));
        assert_eq!(plan.field("active").unwrap().operators, vec!["eq"]);
        assert!(plan.field("meta").is_none());
        assert_eq!(plan.by_class(ComparisonClass::Temporal).count(), 1);
    }
}
