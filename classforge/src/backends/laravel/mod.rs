//! Laravel backend for PHP code generation
//!
//! Generates Eloquent models, repositories, services, resource controllers,
//! form requests, query filters and Blueprint migrations. Every file is
//! assembled as a [`php::PhpFile`] and rendered by the same renderer.

mod controller;
mod filter;
mod migration;
mod model;
mod php;
mod project;
mod repository;
mod request;
mod service;

use crate::ir::ResolvedModel;
use crate::plan::{FilterPlan, JoinTablePlan, TablePlan, ValidationPlan};
use crate::types::CanonicalType;

use super::{Backend, BackendError, EmitContext};

/// Laravel / Eloquent backend
pub struct LaravelBackend;

impl Backend for LaravelBackend {
    fn name(&self) -> &str {
        "laravel"
    }

    fn file_extension(&self) -> &str {
        "php"
    }

    fn generate_environment(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
        Ok(project::environment(ctx))
    }

    fn generate_database_config(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
        Ok(project::database_config(ctx))
    }

    fn generate_entity(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        model::generate(model, ctx)
    }

    fn generate_validation(
        &self,
        model: &ResolvedModel,
        plan: &ValidationPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        request::generate(model, plan, ctx)
    }

    fn generate_repository(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(repository::generate_interface(model, ctx))
    }

    fn generate_repository_impl(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(repository::generate_eloquent(model, ctx))
    }

    fn generate_service(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(service::generate(model, ctx))
    }

    fn generate_controller(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(controller::generate(model, ctx))
    }

    fn generate_filter(
        &self,
        _model: &ResolvedModel,
        plan: &FilterPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(filter::generate(plan, ctx))
    }

    fn generate_migration(
        &self,
        plan: &TablePlan,
        _sequence: usize,
        _ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        migration::generate_table(plan)
    }

    fn generate_join_migration(
        &self,
        plan: &JoinTablePlan,
        _sequence: usize,
        _ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(migration::generate_join_table(plan))
    }
}

/// Sub-namespace under the configured root, e.g. `App\Models`
fn namespace(ctx: &EmitContext<'_>, sub: &str) -> String {
    let root = ctx.config.namespace.trim_matches('\\');
    if sub.is_empty() {
        root.to_string()
    } else {
        format!("{}\\{}", root, sub)
    }
}

/// Fully-qualified class name under the configured root
fn qualified(ctx: &EmitContext<'_>, sub: &str, class: &str) -> String {
    format!("{}\\{}", namespace(ctx, sub), class)
}

/// PHP literal for a declared default value
fn literal(canonical: CanonicalType, value: &str) -> Result<String, BackendError> {
    match canonical {
        CanonicalType::Boolean => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok("true".to_string()),
            "false" | "0" | "no" => Ok("false".to_string()),
            other => Err(BackendError::TypeMappingError(format!(
                "'{}' is not a boolean default",
                other
            ))),
        },
        ty if ty.is_numeric() => {
            if value.parse::<f64>().is_ok() {
                Ok(value.to_string())
            } else {
                Err(BackendError::TypeMappingError(format!(
                    "'{}' is not a numeric default",
                    value
                )))
            }
        }
        _ => Ok(php::quote(value)),
    }
}
