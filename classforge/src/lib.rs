//! classforge
//!
//! Resolves lightweight class descriptions into a consistent model and emits
//! CRUD application sources for several framework flavors.
//!
//! ```text
//! class User { email: string }
//! class Order { total: decimal }
//! User "1" -- "*" Order
//! ```
//!
//! The pipeline is parse → resolve → emit. Problems are recovered as locally
//! as possible: a bad field or relationship is dropped with a diagnostic, a
//! bad class is skipped, and only an empty document fails the whole run.

pub mod backends;
pub mod config;
pub mod constraints;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod lifecycle;
pub mod naming;
pub mod orchestrator;
pub mod plan;
pub mod relationship;
pub mod resolve;
pub mod source;
pub mod types;

pub use config::{Flavor, GenerationConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{DanglingReferenceError, GeneratorError, ParseError};
pub use orchestrator::{Artifact, ArtifactId, ArtifactKind, Generation, SkippedClass};

use crate::orchestrator::Orchestrator;
use crate::source::parse_document;
use crate::types::TypeCatalog;

/// Run the whole pipeline over one source document
///
/// Fails only when the document contains no class blocks at all; every other
/// problem ends up in [`Generation::diagnostics`].
pub fn generate(source: &str, config: &GenerationConfig) -> Result<Generation, GeneratorError> {
    let document = parse_document(source);
    if document.class_blocks == 0 {
        return Err(GeneratorError::EmptyDocument);
    }

    let mut diagnostics = Diagnostics::new();
    for error in &document.errors {
        tracing::warn!(line = error.line, class = ?error.class, "{}", error.message);
        diagnostics.push(Diagnostic::from(error));
    }
    let skipped: Vec<SkippedClass> = document
        .failed_classes()
        .into_iter()
        .map(|(class, error)| SkippedClass {
            class: class.to_string(),
            reason: error.to_string(),
        })
        .collect();

    let catalog = TypeCatalog::for_flavor(config.flavor);
    let models = resolve::resolve(&document, &catalog, &mut diagnostics);

    let generation = Orchestrator::new(config, &catalog)
        .with_recovered(diagnostics, skipped)
        .emit(&models);

    tracing::info!(
        flavor = %config.flavor,
        classes = models.len(),
        artifacts = generation.artifacts.len(),
        diagnostics = generation.diagnostics.len(),
        skipped = generation.skipped.len(),
        "Generation finished"
    );
    Ok(generation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let config = GenerationConfig::default();
        assert!(matches!(generate("", &config), Err(GeneratorError::EmptyDocument)));
        assert!(matches!(
            generate("// nothing here\n@startuml\n@enduml\n", &config),
            Err(GeneratorError::EmptyDocument)
        ));
    }

    #[test]
    fn test_parse_failure_is_skipped() {
        let config = GenerationConfig::default();
        let generation = generate("class Broken {\n  name string\n}\nclass Tag { name: string }\n", &config)
            .unwrap();
        assert!(generation.is_skipped("Broken"));
        assert_eq!(generation.diagnostics.count(DiagnosticKind::ParseError), 1);
        assert!(generation.get("Tag:entity").is_some());
    }
}
