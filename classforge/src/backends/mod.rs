//! Backend implementations for code generation
//!
//! Each backend renders the flavor-neutral plans and resolved models for one
//! framework flavor. Backends never resolve names themselves; everything they
//! print comes from the IR or a plan.

mod laravel;
mod seaorm;

use proc_macro2::TokenStream;

use crate::config::{Flavor, GenerationConfig};
use crate::ir::ResolvedModel;
use crate::plan::{FilterPlan, JoinTablePlan, TablePlan, ValidationPlan};
use crate::types::TypeCatalog;

pub use laravel::LaravelBackend;
pub use seaorm::SeaOrmBackend;

/// Everything a backend may read besides the model being rendered
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub config: &'a GenerationConfig,
    pub catalog: &'a TypeCatalog,
}

impl<'a> EmitContext<'a> {
    pub fn new(config: &'a GenerationConfig, catalog: &'a TypeCatalog) -> Self {
        Self { config, catalog }
    }
}

/// A code generation backend
pub trait Backend: Send + Sync {
    /// Backend name (e.g., "laravel", "seaorm")
    fn name(&self) -> &str;

    /// File extension for generated source files
    fn file_extension(&self) -> &str;

    /// Generate the environment file
    fn generate_environment(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError>;

    /// Generate the database connection configuration
    fn generate_database_config(&self, ctx: &EmitContext<'_>) -> Result<String, BackendError>;

    /// Generate shared support code (optional)
    fn generate_support(&self, _ctx: &EmitContext<'_>) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    /// Generate entity/model code including relationship accessors
    fn generate_entity(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate a junction entity for a join table (optional)
    fn generate_join_entity(
        &self,
        _plan: &JoinTablePlan,
        _ctx: &EmitContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    /// Generate request validation code
    fn generate_validation(
        &self,
        model: &ResolvedModel,
        plan: &ValidationPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the data-access interface
    fn generate_repository(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the data-access implementation
    fn generate_repository_impl(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the service layer
    fn generate_service(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the HTTP controller
    fn generate_controller(
        &self,
        model: &ResolvedModel,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the search/filter definition
    fn generate_filter(
        &self,
        model: &ResolvedModel,
        plan: &FilterPlan,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the table migration
    fn generate_migration(
        &self,
        plan: &TablePlan,
        sequence: usize,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;

    /// Generate the join-table migration
    fn generate_join_migration(
        &self,
        plan: &JoinTablePlan,
        sequence: usize,
        ctx: &EmitContext<'_>,
    ) -> Result<String, BackendError>;
}

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("code generation error: {0}")]
    CodeGenError(String),

    #[error("type mapping error: {0}")]
    TypeMappingError(String),
}

/// Get the backend for a flavor
pub fn get_backend(flavor: Flavor) -> Box<dyn Backend> {
    match flavor {
        Flavor::Laravel => Box::new(LaravelBackend),
        Flavor::SeaOrm => Box::new(SeaOrmBackend),
    }
}

/// Format generated Rust code using prettyplease
pub(crate) fn format_code(tokens: TokenStream) -> Result<String, BackendError> {
    let code = tokens.to_string();
    let parsed = syn::parse_file(&code).map_err(|e| {
        BackendError::CodeGenError(format!("Failed to parse generated code: {}", e))
    })?;
    Ok(prettyplease::unparse(&parsed))
}

/// Driver defaults for a named storage connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConnectionProfile {
    /// Laravel driver name
    pub driver: &'static str,
    /// URL scheme
    pub scheme: &'static str,
    pub host: &'static str,
    pub port: Option<u16>,
    pub username: &'static str,
}

pub(crate) fn connection_profile(connection: &str) -> ConnectionProfile {
    match connection.to_lowercase().as_str() {
        "mysql" | "mariadb" => ConnectionProfile {
            driver: "mysql",
            scheme: "mysql",
            host: "127.0.0.1",
            port: Some(3306),
            username: "root",
        },
        "pgsql" | "postgres" | "postgresql" => ConnectionProfile {
            driver: "pgsql",
            scheme: "postgres",
            host: "127.0.0.1",
            port: Some(5432),
            username: "postgres",
        },
        "sqlite" => ConnectionProfile {
            driver: "sqlite",
            scheme: "sqlite",
            host: "",
            port: None,
            username: "",
        },
        "sqlsrv" | "mssql" => ConnectionProfile {
            driver: "sqlsrv",
            scheme: "mssql",
            host: "127.0.0.1",
            port: Some(1433),
            username: "sa",
        },
        _ => ConnectionProfile {
            driver: "mysql",
            scheme: "mysql",
            host: "127.0.0.1",
            port: Some(3306),
            username: "root",
        },
    }
}
