//! Project configuration artifacts: `.env` and the `db` module

use std::fmt::Write;

use proc_macro2::TokenStream;
use quote::quote;

use crate::backends::{EmitContext, connection_profile};

/// Connection URL for the configured connection
fn database_url(ctx: &EmitContext<'_>) -> String {
    let config = ctx.config;
    let profile = connection_profile(&config.connection);
    match profile.port {
        Some(port) => format!(
            "{}://{}@{}:{}/{}",
            profile.scheme, profile.username, profile.host, port, config.project_name
        ),
        None => format!("sqlite://{}.sqlite?mode=rwc", config.project_name),
    }
}

/// Generate the `.env` file
pub fn environment(ctx: &EmitContext<'_>) -> String {
    let config = ctx.config;
    let mut out = String::new();
    let _ = writeln!(out, "APP_NAME={}", config.project_name);
    let _ = writeln!(out, "DATABASE_CONNECTION={}", config.connection);
    let _ = writeln!(out, "DATABASE_URL={}", database_url(ctx));
    let _ = writeln!(out, "RUST_LOG=info,sqlx=warn");
    out
}

/// Generate the `db` module that opens the connection pool
pub fn database_module(ctx: &EmitContext<'_>) -> TokenStream {
    let module_doc = format!(
        " Database connection for the `{}` connection",
        ctx.config.connection
    );
    let default_url = database_url(ctx);
    let connection = ctx.config.connection.as_str();

    quote! {
        #![doc = #module_doc]
        //! @generated

        use std::time::Duration;

        use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

        pub const CONNECTION: &str = #connection;

        /// Open a pool from `DATABASE_URL`, falling back to the generated default
        pub async fn connect() -> Result<DatabaseConnection, DbErr> {
            let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| #default_url.to_string());
            let mut options = ConnectOptions::new(url);
            options
                .max_connections(10)
                .connect_timeout(Duration::from_secs(8))
                .sqlx_logging(false);

            tracing::info!(connection = CONNECTION, "Connecting to database");
            Database::connect(options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::format_code;
    use crate::config::{Flavor, GenerationConfig};
    use crate::types::TypeCatalog;

    #[test]
    fn test_environment() {
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let env = environment(&EmitContext::new(&config, &catalog));
        assert!(env.contains("APP_NAME=app\n"));
        assert!(env.contains("DATABASE_CONNECTION=postgres\n"));
        assert!(env.contains("DATABASE_URL=postgres://postgres@127.0.0.1:5432/app\n"));
    }

    #[test]
    fn test_sqlite_environment() {
        let mut config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        config.connection = "sqlite".to_string();
        config.project_name = "shop".to_string();
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let env = environment(&EmitContext::new(&config, &catalog));
        assert!(env.contains("DATABASE_URL=sqlite://shop.sqlite?mode=rwc\n"));
    }

    #[test]
    fn test_database_module() {
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        let code = format_code(database_module(&EmitContext::new(&config, &catalog))).unwrap();
        assert!(code.contains("pub const CONNECTION: &str = \"postgres\";"));
        assert!(code.contains("pub async fn connect() -> Result<DatabaseConnection, DbErr> {"));
        assert!(code.contains("Database::connect(options).await"));
    }
}
