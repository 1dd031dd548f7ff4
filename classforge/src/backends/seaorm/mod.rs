//! SeaORM backend for Rust code generation
//!
//! Generates SeaORM 1.x entities in the classic compact format, together with
//! validator request structs, async repositories, services and axum routers.
//! Generated modules live under `crate::{namespace}`:
//!
//! ```text
//! {namespace}/entities/{model}.rs
//! {namespace}/requests/{model}_request.rs
//! {namespace}/filters/{model}_filter.rs
//! {namespace}/repositories/{model}_repository.rs
//! {namespace}/repositories/seaorm_{model}_repository.rs
//! {namespace}/services/{model}_service.rs
//! {namespace}/controllers/{model}_controller.rs
//! {namespace}/support.rs
//! {namespace}/db.rs
//! ```

mod column;
mod controller;
mod entity;
mod enum_gen;
mod filter;
mod migration;
mod project;
mod relation;
mod repository;
mod service;
mod support;
mod types;
mod validation;

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Ident, Span};
use quote::format_ident;

use super::{Backend, BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::naming::{module_name, namespace_segments};
use crate::plan::{FilterPlan, JoinTablePlan, TablePlan, ValidationPlan};

/// SeaORM backend implementation
pub struct SeaOrmBackend;

impl Backend for SeaOrmBackend {
    fn name(&self) -> &str {
        "seaorm"
    }

    fn file_extension(&self) -> &str {
        "rs"
    }

    fn generate_environment(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
        Ok(project::environment(ctx))
    }

    fn generate_database_config(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
        format_code(project::database_module(ctx))
    }

    fn generate_support(&self, _ctx: &EmitContext<'_>) -> Result<Option<String>, BackendError> {
        format_code(support::generate_support()).map(Some)
    }

    fn generate_entity(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        entity::generate(model, ctx)
    }

    fn generate_join_entity(
        &self,
        plan: &JoinTablePlan,
        _ctx: &EmitContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        entity::generate_join(plan).map(Some)
    }

    fn generate_validation(
        &self,
        model: &ResolvedModel,
        plan: &ValidationPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        validation::generate(model, plan, ctx)
    }

    fn generate_repository(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        repository::generate_trait(model, ctx)
    }

    fn generate_repository_impl(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        repository::generate_impl(model, ctx)
    }

    fn generate_service(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        service::generate(model, ctx)
    }

    fn generate_controller(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        controller::generate(model, ctx)
    }

    fn generate_filter(
        &self,
        model: &ResolvedModel,
        plan: &FilterPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        filter::generate(model, plan, ctx)
    }

    fn generate_migration(
        &self,
        plan: &TablePlan,
        sequence: usize,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        migration::generate_table(plan, sequence, ctx)
    }

    fn generate_join_migration(
        &self,
        plan: &JoinTablePlan,
        sequence: usize,
        _ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError> {
        Ok(migration::generate_join_table(plan, sequence))
    }
}

/// Strict and reserved Rust keywords that need a raw identifier
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Field identifier for a declared name, raw when it is a keyword
///
/// Names that do not snake-case into an identifier get a `field_` prefix.
pub(crate) fn field_ident(name: &str) -> Ident {
    let snake = name.to_snake_case();
    match snake.as_str() {
        "self" | "super" | "crate" => format_ident!("{}_", snake),
        s if is_keyword(s) => Ident::new_raw(s, Span::call_site()),
        s => parse_ident(s)
            .or_else(|| parse_ident(&format!("field_{}", s)))
            .unwrap_or_else(|| format_ident!("field")),
    }
}

fn parse_ident(name: &str) -> Option<Ident> {
    syn::parse_str::<Ident>(name).ok()
}

/// `Column` variant for a column name: `user_id` → `UserId`
pub(crate) fn column_ident(name: &str) -> Ident {
    let camel = name.to_upper_camel_case();
    parse_ident(&camel)
        .or_else(|| parse_ident(&format!("Field{}", camel)))
        .unwrap_or_else(|| format_ident!("Field"))
}

/// A module name as a path segment, raw when it is a keyword: `box` → `r#box`
pub(crate) fn module_segment(module: &str) -> String {
    if is_keyword(module) {
        format!("r#{}", module)
    } else {
        module.to_string()
    }
}

/// A module name as an identifier, raw when it is a keyword
pub(crate) fn module_ident(module: &str) -> Ident {
    if is_keyword(module) {
        Ident::new_raw(module, Span::call_site())
    } else {
        format_ident!("{}", module)
    }
}

/// Path of a generated module below the namespace
pub(crate) fn module_path(ctx: &EmitContext<'_>, segments: &[&str]) -> Result<syn::Path, BackendError> {
    let mut parts = vec!["crate".to_string()];
    parts.extend(
        namespace_segments(&ctx.config.namespace)
            .iter()
            .map(|s| module_segment(s)),
    );
    parts.extend(segments.iter().map(|s| module_segment(s)));
    let path = parts.join("::");
    syn::parse_str(&path)
        .map_err(|e| BackendError::CodeGenError(format!("invalid module path '{}': {}", path, e)))
}

/// Path of a model's entity module
pub(crate) fn entity_module_path(ctx: &EmitContext<'_>, class: &str) -> Result<syn::Path, BackendError> {
    module_path(ctx, &["entities", &module_name(class)])
}

pub(crate) fn type_ident(name: &str) -> Result<Ident, BackendError> {
    parse_ident(name)
        .ok_or_else(|| BackendError::CodeGenError(format!("'{}' is not a valid type name", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flavor, GenerationConfig};
    use crate::types::TypeCatalog;
    use quote::ToTokens;

    #[test]
    fn test_field_ident() {
        assert_eq!(field_ident("email").to_string(), "email");
        assert_eq!(field_ident("createdBy").to_string(), "created_by");
        assert_eq!(field_ident("type").to_string(), "r#type");
        assert_eq!(field_ident("self").to_string(), "self_");
        assert_eq!(column_ident("user_id").to_string(), "UserId");
    }

    #[test]
    fn test_idents_never_panic() {
        assert_eq!(field_ident("_1").to_string(), "field_1");
        assert_eq!(field_ident("_").to_string(), "field_");
        assert_eq!(column_ident("1").to_string(), "Field1");
        assert_eq!(column_ident("").to_string(), "Field");
    }

    #[test]
    fn test_keyword_modules_are_raw() {
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let ctx = EmitContext::new(&config, &catalog);
        let path = entity_module_path(&ctx, "Box").unwrap();
        assert_eq!(
            path.to_token_stream().to_string(),
            "crate :: app :: entities :: r#box"
        );
        assert_eq!(module_segment("type"), "r#type");
        assert_eq!(module_ident("match").to_string(), "r#match");
        assert_eq!(module_ident("order_item").to_string(), "order_item");
    }

    #[test]
    fn test_module_path() {
        let mut config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let ctx = EmitContext::new(&config, &catalog);
        let path = entity_module_path(&ctx, "OrderItem").unwrap();
        assert_eq!(
            path.to_token_stream().to_string(),
            "crate :: app :: entities :: order_item"
        );

        config.namespace = "Shop\\Admin".to_string();
        let ctx = EmitContext::new(&config, &catalog);
        let path = module_path(&ctx, &["support"]).unwrap();
        assert_eq!(path.to_token_stream().to_string(), "crate :: shop :: admin :: support");
    }
}
