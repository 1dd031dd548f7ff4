//! Request-validation plans

use serde::Serialize;

use crate::constraints::ConstraintKind;
use crate::ir::{ResolvedField, ResolvedModel};
use crate::naming::table_name;
use crate::types::CanonicalType;

/// A single validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required,
    Nullable,
    Type { canonical: CanonicalType },
    Email,
    Url,
    Uuid,
    Regex { pattern: String },
    Unique { table: String, column: String },
    In { values: Vec<String> },
    Exists { table: String, column: String },
}

impl Rule {
    /// Short rule key, used to attach messages
    pub fn key(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Nullable => "nullable",
            Rule::Type { canonical } => type_rule(*canonical),
            Rule::Email => "email",
            Rule::Url => "url",
            Rule::Uuid => "uuid",
            Rule::Regex { .. } => "regex",
            Rule::Unique { .. } => "unique",
            Rule::In { .. } => "in",
            Rule::Exists { .. } => "exists",
        }
    }
}

/// Type-check rule name for a canonical type
pub fn type_rule(canonical: CanonicalType) -> &'static str {
    match canonical {
        CanonicalType::Integer | CanonicalType::BigInteger | CanonicalType::SmallInteger => {
            "integer"
        }
        CanonicalType::Decimal => "numeric",
        CanonicalType::Boolean => "boolean",
        CanonicalType::Date | CanonicalType::DateTime => "date",
        CanonicalType::Json => "array",
        CanonicalType::String
        | CanonicalType::Text
        | CanonicalType::Time
        | CanonicalType::Binary
        | CanonicalType::Uuid
        | CanonicalType::Enum => "string",
    }
}

/// Rules and messages of one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRules {
    pub field: String,
    pub canonical_type: CanonicalType,
    pub rules: Vec<Rule>,
    /// `(rule key, message)` pairs
    pub messages: Vec<(String, String)>,
}

impl FieldRules {
    pub fn has(&self, key: &str) -> bool {
        self.rules.iter().any(|r| r.key() == key)
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }
}

/// Validation plan for one model's create/update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationPlan {
    pub class_name: String,
    pub fields: Vec<FieldRules>,
}

impl ValidationPlan {
    /// Build the plan from the model's resolved fields and owned foreign keys
    ///
    /// The lifecycle status is changed only through transitions, so it is not
    /// accepted as input.
    pub fn build(model: &ResolvedModel) -> Self {
        let mut fields: Vec<FieldRules> = model
            .fields
            .iter()
            .filter(|f| !f.is_status())
            .map(field_rules)
            .collect();

        for view in model.owned_foreign_keys() {
            let Some(column) = view.foreign_key() else {
                continue;
            };
            let optional = view.relationship.is_self_referential();
            let presence = if optional { Rule::Nullable } else { Rule::Required };
            let related = view.related_class();
            fields.push(FieldRules {
                field: column.to_string(),
                canonical_type: CanonicalType::BigInteger,
                messages: vec![(
                    "exists".to_string(),
                    format!("The selected {} is invalid.", related.to_lowercase()),
                )],
                rules: vec![
                    presence,
                    Rule::Type {
                        canonical: CanonicalType::BigInteger,
                    },
                    Rule::Exists {
                        table: table_name(related),
                        column: "id".to_string(),
                    },
                ],
            });
        }

        Self {
            class_name: model.name.clone(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.field == name)
    }
}

fn field_rules(field: &ResolvedField) -> FieldRules {
    let mut rules = Vec::new();
    let mut messages = Vec::new();

    for constraint in &field.constraints {
        let rule = match constraint.kind {
            ConstraintKind::Required => Some(Rule::Required),
            ConstraintKind::Nullable => Some(Rule::Nullable),
            _ => None,
        };
        if let Some(rule) = rule {
            messages.push((rule.key().to_string(), constraint.message.clone()));
            rules.push(rule);
        }
    }

    rules.push(Rule::Type {
        canonical: field.canonical_type,
    });

    for constraint in &field.constraints {
        let rule = match constraint.kind {
            ConstraintKind::Email => Rule::Email,
            ConstraintKind::Url => Rule::Url,
            ConstraintKind::Uuid => Rule::Uuid,
            ConstraintKind::Regex => Rule::Regex {
                pattern: constraint.param("pattern").unwrap_or_default().to_string(),
            },
            ConstraintKind::Unique => Rule::Unique {
                table: constraint.param("table").unwrap_or_default().to_string(),
                column: constraint
                    .param("column")
                    .unwrap_or(field.name.as_str())
                    .to_string(),
            },
            ConstraintKind::Required | ConstraintKind::Nullable | ConstraintKind::Default => {
                continue;
            }
        };
        messages.push((rule.key().to_string(), constraint.message.clone()));
        rules.push(rule);
    }

    if !field.enum_values.is_empty() {
        rules.push(Rule::In {
            values: field.enum_values.clone(),
        });
    }

    FieldRules {
        field: field.name.clone(),
        canonical_type: field.canonical_type,
        rules,
        messages,
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

    fn plan(source: &str, class: &str) -> ValidationPlan {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let set = resolve(&parse_document(source), &catalog, &mut Diagnostics::new());
        ValidationPlan::build(set.model(class).unwrap())
    }

    #[test]
    fn test_email_rules() {
        let plan = plan("class User { email: string; bio: text? }", "User");
        let email = plan.field("email").unwrap();
        let keys: Vec<_> = email.rules.iter().map(Rule::key).collect();
        assert_eq!(keys, vec!["required", "string", "unique", "email"]);
        assert!(email
            .messages
            .contains(&("required".to_string(), "The email field is required.".to_string())));

        let bio = plan.field("bio").unwrap();
        assert!(!bio.is_required());
        assert!(bio.has("nullable"));
    }

    #[test]
    fn test_foreign_key_exists_rule() {
        let plan = plan(
            "class User { name: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n",
            "Order",
        );
        let user_id = plan.field("user_id").unwrap();
        assert!(user_id.is_required());
        assert!(user_id.rules.contains(&Rule::Exists {
            table: "users".to_string(),
            column: "id".to_string()
        }));
    }

    #[test]
    fn test_status_is_not_input() {
        let plan = plan("class Account <<stateful>> { owner: string }", "Account");
        assert!(plan.field("status").is_none());
        assert_eq!(plan.fields.len(), 1);
    }

    #[test]
    fn test_enum_in_rule() {
        let plan = plan("class Post { state: enum(draft,published) }", "Post");
        let state = plan.field("state").unwrap();
        assert_eq!(
            state.rules.last(),
            Some(&Rule::In {
                values: vec!["draft".to_string(), "published".to_string()]
            })
        );
    }
}
