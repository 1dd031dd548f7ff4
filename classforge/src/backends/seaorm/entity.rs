//! Entity generation for SeaORM
//!
//! One module per model: enum types of its enum fields, the `Model` struct,
//! the `Relation` enum with its `Related` impls and, for stateful models,
//! the guard and transition methods of the lifecycle contract.

use std::collections::BTreeSet;

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::column::{ColumnAttributes, generate_attributes};
use super::enum_gen::{enum_name, generate_enum_tokens, variant_ident};
use super::relation::{generate_join_relations, generate_relations};
use super::types::{key_type, map_canonical_type};
use super::{field_ident, module_path, type_ident};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::{ResolvedField, ResolvedModel};
use crate::lifecycle::StateContract;
use crate::plan::JoinTablePlan;

/// Generate the entity module of a model
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let module_doc = format!(" `{}` entity", model.name);
    let table_name = &model.table_name;

    let mut enums = Vec::new();
    let mut fields = Vec::with_capacity(model.fields.len());
    for field in &model.fields {
        let enum_type = if field.enum_values.is_empty() {
            None
        } else {
            let name = enum_name(model, field);
            enums.push(generate_enum_tokens(
                &name,
                &field.enum_values,
                field.default_value(),
            )?);
            Some(name)
        };
        fields.push(field_tokens(field, enum_type.as_deref(), ctx)?);
    }

    for view in model.owned_foreign_keys() {
        let Some(column) = view.foreign_key() else {
            continue;
        };
        let ident = field_ident(column);
        let ty = key_type().tokens(view.relationship.is_self_referential())?;
        fields.push(quote! { pub #ident: #ty });
    }

    let relations = generate_relations(model)?;
    let variants = &relations.variants;
    let related_impls = &relations.related_impls;
    let links = &relations.links;

    let lifecycle = match &model.state {
        Some(contract) => {
            let status = model
                .fields
                .iter()
                .find(|f| f.is_status())
                .ok_or_else(|| {
                    BackendError::CodeGenError(format!("{} has no status field", model.name))
                })?;
            lifecycle_impl(contract, &enum_name(model, status))?
        }
        None => TokenStream::new(),
    };
    let lifecycle_import = if model.is_stateful() {
        let support = module_path(ctx, &["support"])?;
        quote! { use #support::LifecycleError; }
    } else {
        TokenStream::new()
    };

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use sea_orm::entity::prelude::*;
        use serde::{Deserialize, Serialize};
        #lifecycle_import

        #(#enums)*

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
        #[sea_orm(table_name = #table_name)]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            #(#fields,)*
            pub created_at: DateTimeUtc,
            pub updated_at: DateTimeUtc,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #(#variants),*
        }

        #(#related_impls)*

        #(#links)*

        impl ActiveModelBehavior for ActiveModel {}

        #lifecycle
    };

    format_code(tokens)
}

fn field_tokens(
    field: &ResolvedField,
    enum_type: Option<&str>,
    ctx: &EmitContext<'_>,
) -> Result<TokenStream, BackendError> {
    let mapped = map_canonical_type(ctx.catalog, field.canonical_type, enum_type);
    let ident = field_ident(&field.name);
    let ty = mapped.tokens(field.nullable)?;

    let mut attributes = generate_attributes(field, &mapped);
    if ident.to_string().trim_start_matches("r#") != field.name {
        attributes
            .attributes
            .push(format!("column_name = {:?}", field.name));
    }
    let attributes = attributes.to_tokens()?;

    Ok(quote! {
        #attributes
        pub #ident: #ty
    })
}

/// Guard and transition methods of a stateful model
fn lifecycle_impl(contract: &StateContract, status_enum: &str) -> Result<TokenStream, BackendError> {
    let status_type = type_ident(status_enum)?;

    let mut guards = Vec::new();
    let mut seen = BTreeSet::new();
    for transition in &contract.transitions {
        if !seen.insert(transition.guard) {
            continue;
        }
        let guard = format_ident!("{}", transition.guard.to_snake_case());
        let state = variant_ident(transition.from.as_str())?;
        let doc = format!(" Whether the record is {}", transition.from);
        guards.push(quote! {
            #[doc = #doc]
            pub fn #guard(&self) -> bool {
                self.status == #status_type::#state
            }
        });
    }

    let mut transitions = Vec::new();
    for transition in &contract.transitions {
        let name = format_ident!("{}", transition.name);
        let name_str = transition.name;
        let guard = format_ident!("{}", transition.guard.to_snake_case());
        let expected = transition.from.as_str();
        let to = variant_ident(transition.to.as_str())?;
        let doc = format!(
            " Move from {} to {}, stamping `updated_at`",
            transition.from, transition.to
        );
        transitions.push(quote! {
            #[doc = #doc]
            pub fn #name(&mut self, at: DateTimeUtc) -> Result<(), LifecycleError> {
                if !self.#guard() {
                    return Err(LifecycleError::InvalidTransition {
                        transition: #name_str,
                        from: self.status.to_value(),
                        expected: #expected,
                    });
                }
                self.status = #status_type::#to;
                self.updated_at = at;
                Ok(())
            }
        });
    }

    Ok(quote! {
        impl Model {
            #(#guards)*
            #(#transitions)*
        }
    })
}

/// Generate the junction entity of a many-to-many relationship
pub fn generate_join(plan: &JoinTablePlan) -> Result<String, BackendError> {
    let module_doc = format!(" Junction entity for `{}`", plan.table);
    let table_name = &plan.table;
    let left = field_ident(&plan.left.column);
    let right = field_ident(&plan.right.column);
    let key = ColumnAttributes::primary_key(false).to_tokens()?;
    let variants = generate_join_relations(plan)?.variants;

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use sea_orm::entity::prelude::*;
        use serde::{Deserialize, Serialize};

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
        #[sea_orm(table_name = #table_name)]
        pub struct Model {
            #key
            pub #left: i64,
            #key
            pub #right: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #(#variants),*
        }

        impl ActiveModelBehavior for ActiveModel {}
    };

    format_code(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flavor, GenerationConfig};
    use crate::diagnostics::Diagnostics;
    use crate::ir::ModelSet;
    use crate::resolve::resolve;
    use crate::source::parse_document;
    use crate::types::TypeCatalog;

    fn render(source: &str, class: &str) -> String {
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let set: ModelSet = resolve(&parse_document(source), &catalog, &mut Diagnostics::new());
        generate(set.model(class).unwrap(), &EmitContext::new(&config, &catalog)).unwrap()
    }

    #[test]
    fn test_entity_model() {
        let code = render(
            "class User { email: string; nickname: string?; age: int [default=18]; total: decimal }\nclass Order { note: text }\nUser \"1\" -- \"*\" Order\n",
            "User",
        );
        assert!(code.starts_with("//! `User` entity\n//! @generated\n"));
        assert!(code.contains("#[sea_orm(table_name = \"users\")]"));
        assert!(code.contains("pub id: i64,"));
        assert!(code.contains("#[sea_orm(unique)]\n    pub email: String,"));
        assert!(code.contains("pub nickname: Option<String>,"));
        assert!(code.contains("#[sea_orm(default_value = \"18\")]\n    pub age: i32,"));
        assert!(code.contains("pub total: Decimal,"));
        assert!(code.contains("pub created_at: DateTimeUtc,"));
        assert!(code.contains("impl Related<super::order::Entity> for Entity"));
        assert!(code.contains("impl ActiveModelBehavior for ActiveModel {}"));
        assert!(!code.contains("LifecycleError"));
    }

    #[test]
    fn test_foreign_key_field() {
        let code = render(
            "class User { name: string }\nclass Order { note: text }\nUser \"1\" -- \"*\" Order\n",
            "Order",
        );
        assert!(code.contains("pub user_id: i64,"));
        assert!(code.contains("column_type = \"Text\""));
        assert!(code.contains("belongs_to = \"super::user::Entity\""));
    }

    #[test]
    fn test_stateful_entity() {
        let code = render("class Account <<stateful>> { owner: string }", "Account");
        assert!(code.contains("use crate::app::support::LifecycleError;"));
        assert!(code.contains("pub enum AccountStatus {"));
        assert!(code.contains("pub status: AccountStatus,"));
        assert!(code.contains("pub fn is_active(&self) -> bool {"));
        assert!(code.contains("pub fn is_suspended(&self) -> bool {"));
        assert!(code.contains(
            "pub fn suspend(&mut self, at: DateTimeUtc) -> Result<(), LifecycleError> {"
        ));
        assert!(code.contains("self.status = AccountStatus::Suspended;"));
        assert!(code.contains("self.status = AccountStatus::Active;"));
        assert!(code.contains("self.updated_at = at;"));
    }

    #[test]
    fn test_keyword_and_camel_case_fields() {
        let code = render("class Item { type: string; createdBy: string }", "Item");
        assert!(code.contains("pub r#type: String,"));
        assert!(code.contains("#[sea_orm(column_name = \"createdBy\")]\n    pub created_by: String,"));
    }

    #[test]
    fn test_junction_entity() {
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let set = resolve(
            &parse_document("class Post { title: string }\nclass Tag { name: string }\nPost \"*\" -- \"*\" Tag\n"),
            &catalog,
            &mut Diagnostics::new(),
        );
        let plan = JoinTablePlan::from_relationship(set.join_relationships().next().unwrap()).unwrap();
        let code = generate_join(&plan).unwrap();
        assert!(code.contains("#[sea_orm(table_name = \"post_tag\")]"));
        assert!(code.contains("#[sea_orm(primary_key, auto_increment = false)]\n    pub post_id: i64,"));
        assert!(code.contains("pub tag_id: i64,"));
        assert!(code.contains("belongs_to = \"super::tag::Entity\""));
    }
}
