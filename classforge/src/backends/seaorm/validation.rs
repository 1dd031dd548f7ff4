//! Request payload generation
//!
//! Create payloads carry every writable field, update payloads make every
//! field optional. Format rules become `validator` checks; uniqueness and
//! foreign-key existence are enforced by the database constraints the
//! migrations declare, so they only show up as field docs.

use heck::ToShoutySnakeCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::enum_gen::{enum_name, variant_ident};
use super::types::{key_type, map_canonical_type};
use super::{entity_module_path, field_ident, module_path, type_ident};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::lifecycle::STATUS_FIELD;
use crate::plan::{FieldRules, Rule, ValidationPlan};

pub fn create_request_name(model: &ResolvedModel) -> Ident {
    format_ident!("Create{}Request", model.name)
}

pub fn update_request_name(model: &ResolvedModel) -> Ident {
    format_ident!("Update{}Request", model.name)
}

/// One request field with everything both payloads need
struct RequestField {
    ident: Ident,
    ty: TokenStream,
    nullable: bool,
    /// Omitted on create so the column default applies
    defaulted: bool,
    docs: Vec<String>,
    checks: Vec<TokenStream>,
}

/// Generate the create and update payloads of a model
pub fn generate(
    model: &ResolvedModel,
    plan: &ValidationPlan,
    ctx: &EmitContext<'_>,
) -> Result<String, BackendError> {
    let module_doc = format!(" Request payloads for `{}`", model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let support = module_path(ctx, &["support"])?;
    let uuid_check = format!("{}::validate_uuid", quote!(#support).to_string().replace(' ', ""));

    let mut enum_imports = Vec::new();
    let mut patterns = Vec::new();
    let mut fields = Vec::with_capacity(plan.fields.len());

    for rules in &plan.fields {
        let declared = model.field(&rules.field);
        let enum_type = declared
            .filter(|f| !f.enum_values.is_empty())
            .map(|f| enum_name(model, f));
        if let Some(name) = &enum_type {
            enum_imports.push(type_ident(name)?);
        }
        let mapped = match declared {
            Some(field) => map_canonical_type(ctx.catalog, field.canonical_type, enum_type.as_deref()),
            None => key_type(),
        };
        let nullable = rules.rules.contains(&Rule::Nullable);
        let ident = field_ident(&rules.field);

        let mut docs = Vec::new();
        let mut checks = Vec::new();
        for rule in &rules.rules {
            match rule {
                Rule::Required if mapped.is_string() => {
                    checks.push(check(quote!(length), vec![quote!(min = 1)], rules, "required"));
                }
                Rule::Email if mapped.is_string() => {
                    checks.push(check(quote!(email), Vec::new(), rules, "email"));
                }
                Rule::Url if mapped.is_string() => {
                    checks.push(check(quote!(url), Vec::new(), rules, "url"));
                }
                Rule::Uuid if mapped.is_string() => {
                    checks.push(check(
                        quote!(custom),
                        vec![quote!(function = #uuid_check)],
                        rules,
                        "uuid",
                    ));
                }
                Rule::Regex { pattern } if mapped.is_string() => {
                    let name = format_ident!("{}_PATTERN", rules.field.to_shouty_snake_case());
                    checks.push(check(quote!(regex), vec![quote!(path = *#name)], rules, "regex"));
                    patterns.push(quote! {
                        static #name: Lazy<Regex> =
                            Lazy::new(|| Regex::new(#pattern).expect("valid pattern"));
                    });
                }
                Rule::Unique { table, column } => {
                    docs.push(format!(" Unique in `{}.{}`", table, column));
                }
                Rule::Exists { table, column } => {
                    docs.push(format!(" Must reference an existing `{}.{}`", table, column));
                }
                _ => {}
            }
        }

        fields.push(RequestField {
            ident,
            ty: mapped.tokens(false)?,
            nullable,
            defaulted: nullable && declared.is_some_and(|f| f.default_value().is_some()),
            docs,
            checks,
        });
    }

    let create_name = create_request_name(model);
    let update_name = update_request_name(model);
    let create_fields = fields.iter().map(|f| field_decl(f, f.nullable));
    let update_fields = fields.iter().map(|f| field_decl(f, true));

    let assignments = fields.iter().map(|f| {
        let ident = &f.ident;
        if f.defaulted {
            quote! { #ident: self.#ident.map(|value| Set(Some(value))).unwrap_or(NotSet) }
        } else {
            quote! { #ident: Set(self.#ident) }
        }
    });
    let active_value_import = if fields.iter().any(|f| f.defaulted) {
        quote! { use sea_orm::ActiveValue::{NotSet, Set}; }
    } else {
        quote! { use sea_orm::ActiveValue::Set; }
    };
    let updates = fields.iter().map(|f| {
        let ident = &f.ident;
        if f.nullable {
            quote! {
                if let Some(value) = self.#ident {
                    model.#ident = Set(Some(value));
                }
            }
        } else {
            quote! {
                if let Some(value) = self.#ident {
                    model.#ident = Set(value);
                }
            }
        }
    });

    let initial_status = match &model.state {
        Some(contract) => {
            let status = model
                .field(STATUS_FIELD)
                .ok_or_else(|| BackendError::CodeGenError(format!("{} has no status field", model.name)))?;
            let status_type = type_ident(&enum_name(model, status))?;
            let initial = variant_ident(contract.initial_state().as_str())?;
            enum_imports.push(status_type.clone());
            quote! { status: Set(#status_type::#initial), }
        }
        None => TokenStream::new(),
    };
    enum_imports.sort();
    enum_imports.dedup();

    let entity_import = if enum_imports.is_empty() {
        quote! { use #entity::ActiveModel; }
    } else {
        quote! { use #entity::{ActiveModel, #(#enum_imports),*}; }
    };

    let regex_imports = if patterns.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            use once_cell::sync::Lazy;
            use regex::Regex;
        }
    };

    let create_doc = format!(" Payload for creating a `{}`", model.name);
    let update_doc = format!(" Partial payload for updating a `{}`", model.name);

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        #regex_imports
        #active_value_import
        use sea_orm::entity::prelude::*;
        use serde::Deserialize;
        use validator::Validate;

        #entity_import

        #(#patterns)*

        #[doc = #create_doc]
        #[derive(Debug, Clone, Deserialize, Validate)]
        pub struct #create_name {
            #(#create_fields)*
        }

        impl #create_name {
            pub fn into_active_model(self) -> ActiveModel {
                let now = chrono::Utc::now();
                ActiveModel {
                    #(#assignments,)*
                    #initial_status
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
            }
        }

        #[doc = #update_doc]
        #[derive(Debug, Clone, Default, Deserialize, Validate)]
        pub struct #update_name {
            #(#update_fields)*
        }

        impl #update_name {
            /// Copy the populated fields onto `model` and refresh `updated_at`
            pub fn apply(self, model: &mut ActiveModel) {
                #(#updates)*
                model.updated_at = Set(chrono::Utc::now());
            }
        }
    };

    format_code(tokens)
}

/// A `validator` check with the rule's message attached when there is one
fn check(name: TokenStream, mut args: Vec<TokenStream>, rules: &FieldRules, key: &str) -> TokenStream {
    if let Some((_, message)) = rules.messages.iter().find(|(k, _)| k == key) {
        args.push(quote! { message = #message });
    }
    if args.is_empty() {
        name
    } else {
        quote! { #name(#(#args),*) }
    }
}

fn field_decl(field: &RequestField, optional: bool) -> TokenStream {
    let ident = &field.ident;
    let ty = &field.ty;
    let docs = &field.docs;
    let checks = &field.checks;
    let validate = if checks.is_empty() {
        TokenStream::new()
    } else {
        quote! { #[validate(#(#checks),*)] }
    };
    let ty = if optional {
        quote! { Option<#ty> }
    } else {
        quote! { #ty }
    };
    quote! {
        #(#[doc = #docs])*
        #validate
        pub #ident: #ty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flavor, GenerationConfig};
    use crate::diagnostics::Diagnostics;
    use crate::resolve::resolve;
    use crate::source::parse_document;
    use crate::types::TypeCatalog;

    fn render(source: &str, class: &str) -> String {
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let set = resolve(&parse_document(source), &catalog, &mut Diagnostics::new());
        let model = set.model(class).unwrap();
        generate(model, &ValidationPlan::build(model), &EmitContext::new(&config, &catalog)).unwrap()
    }

    #[test]
    fn test_create_and_update_requests() {
        let code = render(
            "class User { email: string; code: string [regex=\"^[A-Z]+$\"]; bio: text?; age: int }",
            "User",
        );
        assert!(code.contains("pub struct CreateUserRequest {"));
        assert!(code.contains("pub struct UpdateUserRequest {"));
        assert!(code.contains("/// Unique in `users.email`"));
        assert!(code.contains("message = \"The email must be a valid email address.\""));
        assert!(code.contains("static CODE_PATTERN: Lazy<Regex>"));
        assert!(code.contains("regex(path = "));
        assert!(code.contains("message = \"The code format is invalid.\""));
        assert!(code.contains("pub age: i32,"));
        assert!(code.contains("pub age: Option<i32>,"));
        assert!(code.contains("pub bio: Option<String>,"));
        assert!(code.contains("model.bio = Set(Some(value));"));
        assert!(code.contains("model.age = Set(value);"));
        assert!(code.contains("use crate::app::entities::user::ActiveModel;"));
    }

    #[test]
    fn test_foreign_keys_and_enums() {
        let code = render(
            "class User { name: string }\nclass Post { state: enum(draft,published) }\nUser \"1\" -- \"*\" Post\n",
            "Post",
        );
        assert!(code.contains("use crate::app::entities::post::{ActiveModel, PostState};"));
        assert!(code.contains("pub state: PostState,"));
        assert!(code.contains("/// Must reference an existing `users.id`"));
        assert!(code.contains("pub user_id: i64,"));
        assert!(code.contains("user_id: Set(self.user_id)"));
    }

    #[test]
    fn test_omitted_nullable_default_is_not_set() {
        let code = render("class User { name: string; age: int? [default=3]; bio: text? }", "User");
        assert!(code.contains("use sea_orm::ActiveValue::{NotSet, Set};"));
        assert!(code.contains("age: self.age.map(|value| Set(Some(value))).unwrap_or(NotSet),"));
        assert!(!code.contains("age: Set(self.age)"));
        assert!(code.contains("bio: Set(self.bio),"));
        assert!(code.contains("name: Set(self.name),"));
    }

    #[test]
    fn test_stateful_request_starts_active() {
        let code = render("class Account <<stateful>> { owner: string }", "Account");
        assert!(code.contains("status: Set(AccountStatus::Active),"));
        assert!(!code.contains("pub status:"));
    }
}
