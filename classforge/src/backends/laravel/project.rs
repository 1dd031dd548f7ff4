//! Project configuration artifacts: `.env` and `config/database.php`

use std::fmt::Write;

use super::php::{PhpExpr, render_return};
use crate::backends::{EmitContext, connection_profile};

/// Generate the `.env` file
pub fn environment(ctx: &EmitContext<'_>) -> String {
    let config = ctx.config;
    let profile = connection_profile(&config.connection);

    let mut out = String::new();
    let _ = writeln!(out, "APP_NAME={}", config.project_name);
    out.push_str("APP_ENV=local\nAPP_KEY=\nAPP_DEBUG=true\nAPP_URL=http://localhost\n\n");
    let _ = writeln!(out, "DB_CONNECTION={}", config.connection);
    match profile.port {
        Some(port) => {
            let _ = writeln!(out, "DB_HOST={}", profile.host);
            let _ = writeln!(out, "DB_PORT={}", port);
            let _ = writeln!(out, "DB_DATABASE={}", config.project_name);
            let _ = writeln!(out, "DB_USERNAME={}", profile.username);
            out.push_str("DB_PASSWORD=\n");
        }
        None => {
            let _ = writeln!(out, "DB_DATABASE=database/{}.sqlite", config.project_name);
        }
    }
    out
}

/// Generate `config/database.php` with the configured default connection
pub fn database_config(ctx: &EmitContext<'_>) -> String {
    let config = ctx.config;
    let profile = connection_profile(&config.connection);
    let env = |key: &str, default: &str| PhpExpr::raw(format!("env('{}', '{}')", key, default));

    let mut connection = vec![("driver".to_string(), PhpExpr::str(profile.driver))];
    match profile.port {
        Some(port) => {
            connection.push(("host".to_string(), env("DB_HOST", profile.host)));
            connection.push(("port".to_string(), env("DB_PORT", &port.to_string())));
            connection.push(("database".to_string(), env("DB_DATABASE", &config.project_name)));
            connection.push(("username".to_string(), env("DB_USERNAME", profile.username)));
            connection.push(("password".to_string(), env("DB_PASSWORD", "")));
            let charset = if profile.driver == "mysql" { "utf8mb4" } else { "utf8" };
            connection.push(("charset".to_string(), PhpExpr::str(charset)));
            connection.push(("prefix".to_string(), PhpExpr::str("")));
        }
        None => {
            connection.push((
                "database".to_string(),
                PhpExpr::raw(format!(
                    "env('DB_DATABASE', database_path('{}.sqlite'))",
                    config.project_name
                )),
            ));
            connection.push(("prefix".to_string(), PhpExpr::str("")));
            connection.push((
                "foreign_key_constraints".to_string(),
                PhpExpr::raw("env('DB_FOREIGN_KEYS', true)"),
            ));
        }
    }

    let root = PhpExpr::Map(vec![
        ("default".to_string(), env("DB_CONNECTION", &config.connection)),
        (
            "connections".to_string(),
            PhpExpr::Map(vec![(config.connection.clone(), PhpExpr::Map(connection))]),
        ),
        ("migrations".to_string(), PhpExpr::str("migrations")),
    ]);
    render_return(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flavor, GenerationConfig};
    use crate::types::TypeCatalog;

    #[test]
    fn test_environment() {
        let mut config = GenerationConfig::for_flavor(Flavor::Laravel);
        config.project_name = "shop".to_string();
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let env = environment(&EmitContext::new(&config, &catalog));
        assert!(env.starts_with("APP_NAME=shop\n"));
        assert!(env.contains("DB_CONNECTION=mysql\n"));
        assert!(env.contains("DB_PORT=3306\n"));
        assert!(env.contains("DB_DATABASE=shop\n"));
    }

    #[test]
    fn test_database_config() {
        let mut config = GenerationConfig::for_flavor(Flavor::Laravel);
        config.connection = "pgsql".to_string();
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let php = database_config(&EmitContext::new(&config, &catalog));
        assert!(php.starts_with("<?php\n\nreturn [\n"));
        assert!(php.contains("'default' => env('DB_CONNECTION', 'pgsql'),"));
        assert!(php.contains("'driver' => 'pgsql',"));
        assert!(php.contains("'port' => env('DB_PORT', '5432'),"));
    }

    #[test]
    fn test_sqlite_config() {
        let mut config = GenerationConfig::for_flavor(Flavor::Laravel);
        config.connection = "sqlite".to_string();
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let ctx = EmitContext::new(&config, &catalog);
        assert!(environment(&ctx).contains("DB_DATABASE=database/app.sqlite\n"));
        assert!(!database_config(&ctx).contains("'host'"));
    }
}
