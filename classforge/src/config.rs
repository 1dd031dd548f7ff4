//! Generation configuration
//!
//! The front end supplies a [`GenerationConfig`]: which framework flavor to
//! target, the default storage connection name and the namespace prefix used
//! in generated sources. It can also be built from a `key=value,...`
//! parameter string.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::GeneratorError;

/// Target application-framework flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// PHP / Laravel with Eloquent
    #[default]
    Laravel,
    /// Rust / SeaORM with axum
    SeaOrm,
}

impl Flavor {
    /// All supported flavors
    pub const ALL: [Flavor; 2] = [Flavor::Laravel, Flavor::SeaOrm];

    /// Canonical flavor name
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Laravel => "laravel",
            Flavor::SeaOrm => "seaorm",
        }
    }

    /// Default connection name for the flavor
    pub fn default_connection(&self) -> &'static str {
        match self {
            Flavor::Laravel => "mysql",
            Flavor::SeaOrm => "postgres",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "laravel" | "php" | "eloquent" => Ok(Flavor::Laravel),
            "seaorm" | "sea_orm" | "sea-orm" | "rust" => Ok(Flavor::SeaOrm),
            other => Err(GeneratorError::UnknownFlavor(other.to_string())),
        }
    }
}

/// Configuration for one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationConfig {
    /// Target flavor
    pub flavor: Flavor,
    /// Default storage connection name
    pub connection: String,
    /// Package / namespace prefix for generated sources
    pub namespace: String,
    /// Project name used in configuration artifacts
    pub project_name: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::for_flavor(Flavor::default())
    }
}

impl GenerationConfig {
    /// Default configuration for a flavor
    pub fn for_flavor(flavor: Flavor) -> Self {
        Self {
            flavor,
            connection: flavor.default_connection().to_string(),
            namespace: match flavor {
                Flavor::Laravel => "App".to_string(),
                Flavor::SeaOrm => "app".to_string(),
            },
            project_name: "app".to_string(),
        }
    }

    /// Parse a parameter string such as `flavor=seaorm,connection=sqlite,namespace=shop`
    ///
    /// The flavor is applied first so that the remaining keys override the
    /// flavor defaults regardless of their position.
    pub fn from_params(param: &str) -> Result<Self, GeneratorError> {
        let mut pairs = Vec::new();
        for part in param.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| GeneratorError::InvalidParameter(part.to_string()))?;
            pairs.push((key.trim().to_lowercase(), value.trim().to_string()));
        }

        let flavor = match pairs.iter().find(|(k, _)| k == "flavor" || k == "backend") {
            Some((_, value)) => value.parse()?,
            None => Flavor::default(),
        };

        let mut config = Self::for_flavor(flavor);
        for (key, value) in pairs {
            if value.is_empty() {
                return Err(GeneratorError::InvalidParameter(format!("{}=", key)));
            }
            match key.as_str() {
                "flavor" | "backend" => {}
                "connection" => config.connection = value,
                "namespace" => config.namespace = value,
                "project" | "project_name" => config.project_name = value,
                other => return Err(GeneratorError::InvalidParameter(other.to_string())),
            }
        }
        Ok(config)
    }
}
