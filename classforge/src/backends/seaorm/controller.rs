//! axum router generation

use quote::{format_ident, quote};

use super::filter::filter_name;
use super::repository::{repository_module, repository_name};
use super::service::service_name;
use super::validation::{create_request_name, update_request_name};
use super::{entity_module_path, module_path};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::naming::module_name;

/// Generate the router of a model
///
/// Routes are nested under the table name: list, search, create, show,
/// update, delete and one `POST` route per lifecycle transition.
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let module_doc = format!(" HTTP routes for `{}`", model.name);
    let snake = module_name(&model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let filters = module_path(ctx, &["filters", &format!("{}_filter", snake)])?;
    let requests = module_path(ctx, &["requests", &format!("{}_request", snake)])?;
    let repositories = module_path(ctx, &["repositories", &repository_module(model)])?;
    let services = module_path(ctx, &["services", &format!("{}_service", snake)])?;
    let support = module_path(ctx, &["support"])?;

    let service = service_name(model);
    let repository = repository_name(model);
    let filter = filter_name(model);
    let create_request = create_request_name(model);
    let update_request = update_request_name(model);

    let collection = format!("/{}", model.table_name);
    let search = format!("/{}/search", model.table_name);
    let member = format!("/{}/:id", model.table_name);

    let mut transition_routes = Vec::new();
    let mut transition_handlers = Vec::new();
    for transition in model.state.iter().flat_map(|c| c.transitions.iter()) {
        let method = format_ident!("{}", transition.name);
        let route = format!("/{}/:id/{}", model.table_name, transition.name);
        transition_routes.push(quote! {
            .route(#route, post(#method::<R>))
        });
        transition_handlers.push(quote! {
            async fn #method<R: #repository + 'static>(
                State(service): State<Arc<#service<R>>>,
                Path(id): Path<i64>,
            ) -> Result<Json<Model>, ServiceError> {
                Ok(Json(service.#method(id).await?))
            }
        });
    }

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use std::sync::Arc;

        use axum::extract::{Path, State};
        use axum::http::StatusCode;
        use axum::routing::{get, post};
        use axum::{Json, Router};

        use #entity::Model;
        use #filters::#filter;
        use #repositories::#repository;
        use #requests::{#create_request, #update_request};
        use #services::#service;
        use #support::ServiceError;

        pub fn router<R: #repository + 'static>(service: Arc<#service<R>>) -> Router {
            Router::new()
                .route(#collection, get(index::<R>).post(store::<R>))
                .route(#search, post(search::<R>))
                .route(#member, get(show::<R>).put(update::<R>).delete(destroy::<R>))
                #(#transition_routes)*
                .with_state(service)
        }

        async fn index<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
        ) -> Result<Json<Vec<Model>>, ServiceError> {
            Ok(Json(service.list(&#filter::default()).await?))
        }

        async fn search<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
            Json(filter): Json<#filter>,
        ) -> Result<Json<Vec<Model>>, ServiceError> {
            Ok(Json(service.list(&filter).await?))
        }

        async fn store<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
            Json(request): Json<#create_request>,
        ) -> Result<(StatusCode, Json<Model>), ServiceError> {
            Ok((StatusCode::CREATED, Json(service.create(request).await?)))
        }

        async fn show<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
            Path(id): Path<i64>,
        ) -> Result<Json<Model>, ServiceError> {
            Ok(Json(service.get(id).await?))
        }

        async fn update<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
            Path(id): Path<i64>,
            Json(request): Json<#update_request>,
        ) -> Result<Json<Model>, ServiceError> {
            Ok(Json(service.update(id, request).await?))
        }

        async fn destroy<R: #repository + 'static>(
            State(service): State<Arc<#service<R>>>,
            Path(id): Path<i64>,
        ) -> Result<StatusCode, ServiceError> {
            service.delete(id).await?;
            Ok(StatusCode::NO_CONTENT)
        }

        #(#transition_handlers)*
    };

    format_code(tokens)
}
