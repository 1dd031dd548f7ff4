//! Service generation
//!
//! Services validate payloads, enforce the lifecycle contract and turn
//! missing records into `StorageError::NotFound`.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::filter::filter_name;
use super::repository::{repository_module, repository_name};
use super::validation::{create_request_name, update_request_name};
use super::{entity_module_path, module_path};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::naming::module_name;

pub fn service_name(model: &ResolvedModel) -> Ident {
    format_ident!("{}Service", model.name)
}

/// Generate the service of a model
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let module_doc = format!(" Business logic for `{}`", model.name);
    let snake = module_name(&model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let filters = module_path(ctx, &["filters", &format!("{}_filter", snake)])?;
    let requests = module_path(ctx, &["requests", &format!("{}_request", snake)])?;
    let repositories = module_path(ctx, &["repositories", &repository_module(model)])?;
    let support = module_path(ctx, &["support"])?;

    let name = service_name(model);
    let repository = repository_name(model);
    let filter = filter_name(model);
    let create_request = create_request_name(model);
    let update_request = update_request_name(model);
    let not_found = format!("{} {{}} not found", model.name);

    let transitions: Vec<TokenStream> = model
        .state
        .iter()
        .flat_map(|contract| contract.transitions.iter())
        .map(|transition| {
            let method = format_ident!("{}", transition.name);
            let doc = format!(
                " {} the `{}` with `id`; fails unless it is {}",
                capitalize(transition.name),
                model.name,
                transition.from
            );
            quote! {
                #[doc = #doc]
                pub async fn #method(&self, id: i64) -> Result<Model, ServiceError> {
                    let mut record = self.get(id).await?;
                    record.#method(Utc::now())?;
                    tracing::info!(id, transition = stringify!(#method), "Lifecycle transition");
                    Ok(self.repository.update(record.into_active_model().reset_all()).await?)
                }
            }
        })
        .collect();
    let lifecycle_imports = if transitions.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            use chrono::Utc;
            use sea_orm::{ActiveModelTrait, IntoActiveModel};
        }
    };

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        #lifecycle_imports
        use validator::Validate;

        use #entity::{ActiveModel, Model};
        use #filters::#filter;
        use #repositories::#repository;
        use #requests::{#create_request, #update_request};
        use #support::{ServiceError, StorageError, ValidationError};

        pub struct #name<R> {
            repository: R,
        }

        impl<R: #repository> #name<R> {
            pub fn new(repository: R) -> Self {
                Self { repository }
            }

            pub async fn list(&self, filter: &#filter) -> Result<Vec<Model>, ServiceError> {
                Ok(self.repository.find_all(filter).await?)
            }

            pub async fn get(&self, id: i64) -> Result<Model, ServiceError> {
                self.repository
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| StorageError::NotFound(format!(#not_found, id)).into())
            }

            pub async fn create(&self, request: #create_request) -> Result<Model, ServiceError> {
                request.validate().map_err(ValidationError::from)?;
                Ok(self.repository.insert(request.into_active_model()).await?)
            }

            pub async fn update(&self, id: i64, request: #update_request) -> Result<Model, ServiceError> {
                request.validate().map_err(ValidationError::from)?;
                let mut model: ActiveModel = self.get(id).await?.into();
                request.apply(&mut model);
                Ok(self.repository.update(model).await?)
            }

            pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
                Ok(self.repository.delete(id).await?)
            }

            #(#transitions)*
        }
    };

    format_code(tokens)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
