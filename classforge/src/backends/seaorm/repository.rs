//! Repository generation
//!
//! The repository trait is the data-access seam services depend on; the
//! SeaORM implementation is generated separately so tests can substitute
//! their own.

use heck::ToSnakeCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::filter::filter_name;
use super::{entity_module_path, module_path};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::naming::module_name;
use crate::relationship::RelationshipRef;

pub fn repository_name(model: &ResolvedModel) -> Ident {
    format_ident!("{}Repository", model.name)
}

pub fn seaorm_repository_name(model: &ResolvedModel) -> Ident {
    format_ident!("SeaOrm{}Repository", model.name)
}

/// Module of the repository trait: `order_repository`
pub fn repository_module(model: &ResolvedModel) -> String {
    format!("{}_repository", module_name(&model.name))
}

/// One `find_with_*` method per eager accessor, loading the relation alongside
struct EagerLoad {
    method: Ident,
    related: syn::Path,
    collection: bool,
}

fn eager_loads(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<Vec<EagerLoad>, BackendError> {
    let mut loads = Vec::new();
    let eager: Vec<&RelationshipRef> = model
        .relationships
        .iter()
        .filter(|r| r.loads_eagerly() && !r.relationship.is_self_referential())
        .collect();
    for view in eager {
        loads.push(EagerLoad {
            method: format_ident!("find_with_{}", view.accessor().to_snake_case()),
            related: entity_module_path(ctx, view.related_class())?,
            collection: view.is_collection(),
        });
    }
    Ok(loads)
}

/// Generate the repository trait
pub fn generate_trait(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let module_doc = format!(" Data access for `{}`", model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let filters = module_path(ctx, &["filters", &format!("{}_filter", module_name(&model.name))])?;
    let support = module_path(ctx, &["support"])?;
    let name = repository_name(model);
    let filter = filter_name(model);

    let eager = eager_loads(model, ctx)?.into_iter().map(|load| {
        let method = load.method;
        let related = load.related;
        let loaded = if load.collection {
            quote! { Vec<#related::Model> }
        } else {
            quote! { Option<#related::Model> }
        };
        quote! {
            async fn #method(&self, id: i64) -> Result<Option<(Model, #loaded)>, StorageError>;
        }
    });

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use async_trait::async_trait;

        use #entity::{ActiveModel, Model};
        use #filters::#filter;
        use #support::StorageError;

        #[async_trait]
        pub trait #name: Send + Sync {
            async fn find_all(&self, filter: &#filter) -> Result<Vec<Model>, StorageError>;

            async fn find_by_id(&self, id: i64) -> Result<Option<Model>, StorageError>;

            async fn insert(&self, model: ActiveModel) -> Result<Model, StorageError>;

            async fn update(&self, model: ActiveModel) -> Result<Model, StorageError>;

            async fn delete(&self, id: i64) -> Result<(), StorageError>;

            #(#eager)*
        }
    };

    format_code(tokens)
}

/// Generate the SeaORM implementation of the repository trait
pub fn generate_impl(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let module_doc = format!(" SeaORM repository for `{}`", model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let filters = module_path(ctx, &["filters", &format!("{}_filter", module_name(&model.name))])?;
    let repositories = module_path(ctx, &["repositories", &repository_module(model)])?;
    let support = module_path(ctx, &["support"])?;
    let trait_name = repository_name(model);
    let name = seaorm_repository_name(model);
    let filter = filter_name(model);
    let not_found = format!("{} {{}} not found", model.name);

    let eager: Vec<TokenStream> = eager_loads(model, ctx)?
        .into_iter()
        .map(|load| {
            let method = load.method;
            let related = load.related;
            if load.collection {
                quote! {
                    async fn #method(
                        &self,
                        id: i64,
                    ) -> Result<Option<(Model, Vec<#related::Model>)>, StorageError> {
                        let mut rows = Entity::find_by_id(id)
                            .find_with_related(#related::Entity)
                            .all(&self.db)
                            .await?;
                        Ok(rows.pop())
                    }
                }
            } else {
                quote! {
                    async fn #method(
                        &self,
                        id: i64,
                    ) -> Result<Option<(Model, Option<#related::Model>)>, StorageError> {
                        Ok(Entity::find_by_id(id)
                            .find_also_related(#related::Entity)
                            .one(&self.db)
                            .await?)
                    }
                }
            }
        })
        .collect();

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use async_trait::async_trait;
        use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter};

        use #entity::{ActiveModel, Entity, Model};
        use #filters::#filter;
        use #repositories::#trait_name;
        use #support::StorageError;

        pub struct #name {
            db: DatabaseConnection,
        }

        impl #name {
            pub fn new(db: DatabaseConnection) -> Self {
                Self { db }
            }
        }

        #[async_trait]
        impl #trait_name for #name {
            async fn find_all(&self, filter: &#filter) -> Result<Vec<Model>, StorageError> {
                Ok(Entity::find().filter(filter.condition()).all(&self.db).await?)
            }

            async fn find_by_id(&self, id: i64) -> Result<Option<Model>, StorageError> {
                Ok(Entity::find_by_id(id).one(&self.db).await?)
            }

            async fn insert(&self, model: ActiveModel) -> Result<Model, StorageError> {
                Ok(model.insert(&self.db).await?)
            }

            async fn update(&self, model: ActiveModel) -> Result<Model, StorageError> {
                Ok(model.update(&self.db).await?)
            }

            async fn delete(&self, id: i64) -> Result<(), StorageError> {
                let result = Entity::delete_by_id(id).exec(&self.db).await?;
                if result.rows_affected == 0 {
                    return Err(StorageError::NotFound(format!(#not_found, id)));
                }
                Ok(())
            }

            #(#eager)*
        }
    };

    format_code(tokens)
}
