//! Relation generation for SeaORM entities
//!
//! Generates the classic-format `Relation` enum and the `Related` impls of an
//! entity from its relationship views. Many-to-many relationships navigate
//! through the junction entity with `via()`.
//!
//! Self-referential relationships keep a `belongs_to` variant for the parent
//! end; every other self-referential accessor becomes a `Linked` struct, as a
//! `Related<Entity> for Entity` impl would be ambiguous.

use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::{module_ident, module_segment};
use crate::backends::BackendError;
use crate::ir::ResolvedModel;
use crate::naming::module_name;
use crate::plan::{JoinTablePlan, PivotColumn};
use crate::relationship::{RelationKind, RelationshipRef};

/// Relation enum variants plus the `Related` impls of one entity
#[derive(Default)]
pub struct RelationTokens {
    pub variants: Vec<TokenStream>,
    pub related_impls: Vec<TokenStream>,
    pub links: Vec<TokenStream>,
}

/// Relation variant name for an accessor: `parentCategory` → `ParentCategory`
pub fn relation_variant(accessor: &str) -> Ident {
    variant(accessor.to_upper_camel_case())
}

/// Junction relation variant for a pivot column: `post_id` → `Post`
pub fn pivot_variant(column: &str) -> Ident {
    let stem = column.strip_suffix("_id").unwrap_or(column);
    variant(stem.to_upper_camel_case())
}

fn variant(name: String) -> Ident {
    if name == "Self" {
        format_ident!("SelfRef")
    } else {
        format_ident!("{}", name)
    }
}

fn column_variant(column: &str) -> String {
    format!("Column::{}", column.to_upper_camel_case())
}

fn entity_path(class: &str) -> String {
    format!("super::{}::Entity", module_segment(&module_name(class)))
}

/// Generate the relation tokens of a model
pub fn generate_relations(model: &ResolvedModel) -> Result<RelationTokens, BackendError> {
    let mut tokens = RelationTokens::default();
    let mut variant_names = BTreeSet::new();
    let mut related_to = BTreeSet::new();

    for view in &model.relationships {
        let self_ref = view.relationship.is_self_referential();
        let related = view.related_class();

        if self_ref && view.kind() != RelationKind::BelongsTo {
            tokens.links.push(self_link(view)?);
            continue;
        }

        if view.kind() != RelationKind::BelongsToMany {
            let variant = relation_variant(view.accessor());
            if !variant_names.insert(variant.to_string()) {
                return Err(BackendError::CodeGenError(format!(
                    "{} declares relation {} twice",
                    model.name, variant
                )));
            }
            tokens.variants.push(relation_variant_tokens(view, &variant)?);

            if !self_ref && related_to.insert(related.to_string()) {
                let target: syn::Path = syn::parse_str(&entity_path(related)).map_err(|e| {
                    BackendError::CodeGenError(format!("invalid entity path: {}", e))
                })?;
                tokens.related_impls.push(quote! {
                    impl Related<#target> for Entity {
                        fn to() -> RelationDef {
                            Relation::#variant.def()
                        }
                    }
                });
            }
        } else if related_to.insert(related.to_string()) {
            tokens.related_impls.push(many_to_many_impl(view)?);
        }
    }

    Ok(tokens)
}

fn relation_variant_tokens(view: &RelationshipRef, variant: &Ident) -> Result<TokenStream, BackendError> {
    let self_ref = view.relationship.is_self_referential();
    let target = if self_ref {
        "Entity".to_string()
    } else {
        entity_path(view.related_class())
    };

    let attribute = match view.kind() {
        RelationKind::BelongsTo => {
            let fk = view.foreign_key().ok_or_else(|| {
                BackendError::CodeGenError(format!("relation {} has no foreign key", variant))
            })?;
            let to = if self_ref {
                "Column::Id".to_string()
            } else {
                format!(
                    "super::{}::Column::Id",
                    module_segment(&module_name(view.related_class()))
                )
            };
            let on_delete = if self_ref { "SetNull" } else { "Cascade" };
            format!(
                "belongs_to = \"{}\", from = \"{}\", to = \"{}\", on_delete = \"{}\"",
                target,
                column_variant(fk),
                to,
                on_delete
            )
        }
        RelationKind::HasMany => format!("has_many = \"{}\"", target),
        RelationKind::HasOne => format!("has_one = \"{}\"", target),
        RelationKind::BelongsToMany => {
            return Err(BackendError::CodeGenError(format!(
                "relation {} needs a junction entity",
                variant
            )));
        }
    };
    let inner: TokenStream = attribute
        .parse()
        .map_err(|e| BackendError::CodeGenError(format!("invalid relation attribute: {}", e)))?;

    Ok(quote! {
        #[sea_orm(#inner)]
        #variant
    })
}

/// `Linked` struct for a self-referential accessor other than the parent
fn self_link(view: &RelationshipRef) -> Result<TokenStream, BackendError> {
    let link = format_ident!("{}Link", view.accessor().to_upper_camel_case());
    let path = match view.kind() {
        RelationKind::BelongsToMany => {
            let (own, other) = view.pivot_columns().ok_or_else(|| {
                BackendError::CodeGenError(format!("{} has no pivot columns", view.accessor()))
            })?;
            let junction = view.join_table().map(module_ident).ok_or_else(|| {
                BackendError::CodeGenError(format!("{} has no join table", view.accessor()))
            })?;
            let own = pivot_variant(&own);
            let other = pivot_variant(&other);
            quote! {
                super::#junction::Relation::#own.def().rev(),
                super::#junction::Relation::#other.def()
            }
        }
        _ => {
            let parent = relation_variant(&view.relationship.inverse_accessor_name);
            quote! { Relation::#parent.def().rev() }
        }
    };

    Ok(quote! {
        pub struct #link;

        impl Linked for #link {
            type FromEntity = Entity;
            type ToEntity = Entity;

            fn link(&self) -> Vec<RelationDef> {
                vec![#path]
            }
        }
    })
}

fn many_to_many_impl(view: &RelationshipRef) -> Result<TokenStream, BackendError> {
    let (own, other) = view.pivot_columns().ok_or_else(|| {
        BackendError::CodeGenError(format!("{} has no pivot columns", view.accessor()))
    })?;
    let junction = view.join_table().ok_or_else(|| {
        BackendError::CodeGenError(format!("{} has no join table", view.accessor()))
    })?;
    let junction = module_ident(junction);
    let target = module_ident(&module_name(view.related_class()));
    let own = pivot_variant(&own);
    let other = pivot_variant(&other);

    Ok(quote! {
        impl Related<super::#target::Entity> for Entity {
            fn to() -> RelationDef {
                super::#junction::Relation::#other.def()
            }

            fn via() -> Option<RelationDef> {
                Some(super::#junction::Relation::#own.def().rev())
            }
        }
    })
}

/// Generate the relation tokens of a junction entity
pub fn generate_join_relations(plan: &JoinTablePlan) -> Result<RelationTokens, BackendError> {
    let mut tokens = RelationTokens::default();
    for side in [&plan.left, &plan.right] {
        tokens.variants.push(pivot_relation(side)?);
    }
    Ok(tokens)
}

fn pivot_relation(side: &PivotColumn) -> Result<TokenStream, BackendError> {
    let variant = pivot_variant(&side.column);
    let module = module_segment(&module_name(&side.class));
    let attribute = format!(
        "belongs_to = \"super::{}::Entity\", from = \"{}\", to = \"super::{}::Column::Id\", on_delete = \"Cascade\"",
        module,
        column_variant(&side.column),
        module
    );
    let inner: TokenStream = attribute
        .parse()
        .map_err(|e| BackendError::CodeGenError(format!("invalid relation attribute: {}", e)))?;
    Ok(quote! {
        #[sea_orm(#inner)]
        #variant
    })
}
