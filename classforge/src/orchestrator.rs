//! Emission orchestration
//!
//! Artifacts are emitted stage by stage so every artifact can rely on the
//! names established by the stages before it:
//!
//! 1. configuration (`.env`, database connection, shared support code)
//! 2. entities, then junction entities
//! 3. request validation
//! 4. behaviors (repository, repository implementation, service, controller, filter)
//! 5. migrations in foreign-key order, then join tables
//!
//! A class whose artifact fails to render is skipped entirely: none of its
//! artifacts are kept, and the classes related to it are rendered without
//! that relationship. The rest of the run continues.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::backends::{Backend, BackendError, EmitContext, get_backend};
use crate::config::{Flavor, GenerationConfig};
use crate::diagnostics::Diagnostics;
use crate::ir::{ModelSet, ResolvedModel};
use crate::plan::{FilterPlan, JoinTablePlan, TablePlan, ValidationPlan, migration_order};
use crate::types::TypeCatalog;

/// Subject of the project-wide configuration artifacts
pub const PROJECT_SUBJECT: &str = "project";

/// Emission stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configuration,
    Entities,
    Validation,
    Behaviors,
    Migrations,
}

/// Kind of a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Env,
    DatabaseConfig,
    Support,
    Entity,
    JoinEntity,
    Validation,
    Repository,
    RepositoryImpl,
    Service,
    Controller,
    Filter,
    Migration,
    JoinMigration,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Env => "env",
            ArtifactKind::DatabaseConfig => "database_config",
            ArtifactKind::Support => "support",
            ArtifactKind::Entity => "entity",
            ArtifactKind::JoinEntity => "join_entity",
            ArtifactKind::Validation => "validation",
            ArtifactKind::Repository => "repository",
            ArtifactKind::RepositoryImpl => "repository_impl",
            ArtifactKind::Service => "service",
            ArtifactKind::Controller => "controller",
            ArtifactKind::Filter => "filter",
            ArtifactKind::Migration => "migration",
            ArtifactKind::JoinMigration => "join_migration",
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ArtifactKind::Env | ArtifactKind::DatabaseConfig | ArtifactKind::Support => {
                Stage::Configuration
            }
            ArtifactKind::Entity | ArtifactKind::JoinEntity => Stage::Entities,
            ArtifactKind::Validation => Stage::Validation,
            ArtifactKind::Repository
            | ArtifactKind::RepositoryImpl
            | ArtifactKind::Service
            | ArtifactKind::Controller
            | ArtifactKind::Filter => Stage::Behaviors,
            ArtifactKind::Migration | ArtifactKind::JoinMigration => Stage::Migrations,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BEHAVIORS: [ArtifactKind; 5] = [
    ArtifactKind::Repository,
    ArtifactKind::RepositoryImpl,
    ArtifactKind::Service,
    ArtifactKind::Controller,
    ArtifactKind::Filter,
];

/// Stable identifier of an artifact: `Order:entity`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactId {
    /// Class name, join table name or [`PROJECT_SUBJECT`]
    pub subject: String,
    pub kind: ArtifactKind,
}

impl ArtifactId {
    pub fn new(subject: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject, self.kind)
    }
}

/// One named unit of generated source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: ArtifactId,
    #[serde(skip)]
    pub text: String,
    /// 1-based position among the migrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<usize>,
    /// Table created by a migration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// A class that produced no output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedClass {
    pub class: String,
    pub reason: String,
}

/// Result of a generation run: always artifacts plus diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub flavor: Flavor,
    /// Artifacts in emission order
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Diagnostics,
    pub skipped: Vec<SkippedClass>,
}

impl Generation {
    fn new(flavor: Flavor, diagnostics: Diagnostics, skipped: Vec<SkippedClass>) -> Self {
        Self {
            flavor,
            artifacts: Vec::new(),
            diagnostics,
            skipped,
        }
    }

    /// Look up an artifact by its identifier string
    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.id.to_string() == id)
    }

    pub fn artifact(&self, subject: &str, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|a| a.id.kind == kind && a.id.subject == subject)
    }

    /// Text of an artifact
    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).map(|a| a.text.as_str())
    }

    /// Artifact identifiers in emission order
    pub fn ids(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.id.to_string()).collect()
    }

    /// Identifier to source text
    pub fn artifact_map(&self) -> BTreeMap<String, &str> {
        self.artifacts
            .iter()
            .map(|a| (a.id.to_string(), a.text.as_str()))
            .collect()
    }

    pub fn is_skipped(&self, class: &str) -> bool {
        self.skipped.iter().any(|s| s.class == class)
    }
}

/// Drives one backend over a resolved model set
pub struct Orchestrator<'a> {
    backend: Box<dyn Backend>,
    ctx: EmitContext<'a>,
    generation: Generation,
    failed: BTreeSet<String>,
    failed_joins: BTreeSet<String>,
}

/// A rendering failure inside a pass
enum Failure {
    Model {
        class: String,
        kind: ArtifactKind,
        err: BackendError,
    },
    Join {
        table: String,
        err: BackendError,
    },
}

/// Everything rendered in one pass over a model set
///
/// A pass is committed only when nothing in it failed.
#[derive(Default)]
struct Pass {
    /// Per-model artifacts in stage order
    models: Vec<(String, Vec<(ArtifactKind, String)>)>,
    joins: Vec<(JoinTablePlan, Option<String>)>,
    migrations: Vec<(ArtifactId, String, usize, String)>,
    failures: Vec<Failure>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a GenerationConfig, catalog: &'a TypeCatalog) -> Self {
        Self {
            backend: get_backend(config.flavor),
            ctx: EmitContext::new(config, catalog),
            generation: Generation::new(config.flavor, Diagnostics::new(), Vec::new()),
            failed: BTreeSet::new(),
            failed_joins: BTreeSet::new(),
        }
    }

    /// Seed the run with diagnostics and skipped classes from earlier phases
    pub fn with_recovered(mut self, diagnostics: Diagnostics, skipped: Vec<SkippedClass>) -> Self {
        self.generation.diagnostics = diagnostics;
        self.generation.skipped = skipped;
        self
    }

    /// Emit every artifact of the model set
    ///
    /// When a class fails, it is removed together with every relationship
    /// touching it and the remaining set is rendered again, so the committed
    /// artifacts never mention a skipped class.
    pub fn emit(mut self, models: &ModelSet) -> Generation {
        self.emit_configuration();

        let pass = loop {
            let set = models.without(&self.failed, &self.failed_joins);
            let mut pass = self.render_pass(&set);
            if pass.failures.is_empty() {
                break pass;
            }
            for failure in std::mem::take(&mut pass.failures) {
                match failure {
                    Failure::Model { class, kind, err } => self.model_failed(&class, kind, err),
                    Failure::Join { table, err } => self.join_failed(&table, err),
                }
            }
        };

        self.flag_dependents(models);
        self.commit(pass);
        self.generation
    }

    fn render_pass(&self, set: &ModelSet) -> Pass {
        let mut pass = Pass::default();

        for model in &set.models {
            let rendered: Result<Vec<_>, _> = [ArtifactKind::Entity, ArtifactKind::Validation]
                .into_iter()
                .chain(BEHAVIORS)
                .map(|kind| {
                    self.render(model, kind)
                        .map(|text| (kind, text))
                        .map_err(|err| (kind, err))
                })
                .collect();
            match rendered {
                Ok(rendered) => pass.models.push((model.name.clone(), rendered)),
                Err((kind, err)) => pass.failures.push(Failure::Model {
                    class: model.name.clone(),
                    kind,
                    err,
                }),
            }
        }

        for plan in set.join_relationships().filter_map(|r| JoinTablePlan::from_relationship(r)) {
            match self.backend.generate_join_entity(&plan, &self.ctx) {
                Ok(text) => pass.joins.push((plan, text)),
                Err(err) => pass.failures.push(Failure::Join {
                    table: plan.table.clone(),
                    err,
                }),
            }
        }
        if !pass.failures.is_empty() {
            return pass;
        }

        let mut sequence = 0;
        for model in migration_order(set) {
            let plan = TablePlan::build(model, self.ctx.catalog);
            match self.backend.generate_migration(&plan, sequence + 1, &self.ctx) {
                Ok(text) => {
                    sequence += 1;
                    pass.migrations.push((
                        ArtifactId::new(&model.name, ArtifactKind::Migration),
                        text,
                        sequence,
                        plan.table,
                    ));
                }
                Err(err) => pass.failures.push(Failure::Model {
                    class: model.name.clone(),
                    kind: ArtifactKind::Migration,
                    err,
                }),
            }
        }
        for (plan, _) in &pass.joins {
            match self.backend.generate_join_migration(plan, sequence + 1, &self.ctx) {
                Ok(text) => {
                    sequence += 1;
                    pass.migrations.push((
                        ArtifactId::new(&plan.table, ArtifactKind::JoinMigration),
                        text,
                        sequence,
                        plan.table.clone(),
                    ));
                }
                Err(err) => pass.failures.push(Failure::Join {
                    table: plan.table.clone(),
                    err,
                }),
            }
        }

        pass
    }

    /// Push a successful pass in stage order
    fn commit(&mut self, pass: Pass) {
        let Pass {
            mut models,
            joins,
            migrations,
            ..
        } = pass;

        self.commit_stage(&mut models, Stage::Entities);
        for (plan, text) in joins {
            if let Some(text) = text {
                self.push(ArtifactId::new(&plan.table, ArtifactKind::JoinEntity), text, None);
            }
        }
        self.commit_stage(&mut models, Stage::Validation);
        self.commit_stage(&mut models, Stage::Behaviors);
        for (id, text, sequence, table) in migrations {
            self.push(id, text, Some((sequence, table)));
        }
    }

    fn commit_stage(&mut self, models: &mut [(String, Vec<(ArtifactKind, String)>)], stage: Stage) {
        for (class, rendered) in models.iter_mut() {
            for (kind, text) in rendered.iter_mut() {
                if kind.stage() == stage {
                    let id = ArtifactId::new(class.as_str(), *kind);
                    self.push(id, std::mem::take(text), None);
                }
            }
        }
    }

    fn emit_configuration(&mut self) {
        let env = self.backend.generate_environment(&self.ctx);
        self.push_project(ArtifactKind::Env, env.map(Some));
        let database = self.backend.generate_database_config(&self.ctx);
        self.push_project(ArtifactKind::DatabaseConfig, database.map(Some));
        let support = self.backend.generate_support(&self.ctx);
        self.push_project(ArtifactKind::Support, support);
    }

    fn push_project(&mut self, kind: ArtifactKind, rendered: Result<Option<String>, BackendError>) {
        match rendered {
            Ok(Some(text)) => self.push(ArtifactId::new(PROJECT_SUBJECT, kind), text, None),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(artifact = %kind, error = %err, "Failed to render configuration");
                self.generation
                    .diagnostics
                    .emission_error(PROJECT_SUBJECT, format!("{}: {}", kind, err));
            }
        }
    }

    fn render(&self, model: &ResolvedModel, kind: ArtifactKind) -> Result<String, BackendError> {
        let backend = &self.backend;
        let ctx = &self.ctx;
        match kind {
            ArtifactKind::Entity => backend.generate_entity(model, ctx),
            ArtifactKind::Validation => {
                backend.generate_validation(model, &ValidationPlan::build(model), ctx)
            }
            ArtifactKind::Repository => backend.generate_repository(model, ctx),
            ArtifactKind::RepositoryImpl => backend.generate_repository_impl(model, ctx),
            ArtifactKind::Service => backend.generate_service(model, ctx),
            ArtifactKind::Controller => backend.generate_controller(model, ctx),
            ArtifactKind::Filter => backend.generate_filter(model, &FilterPlan::build(model), ctx),
            other => Err(BackendError::CodeGenError(format!(
                "{} is not a per-model artifact",
                other
            ))),
        }
    }

    fn push(&mut self, id: ArtifactId, text: String, migration: Option<(usize, String)>) {
        tracing::debug!(artifact = %id, bytes = text.len(), "Emitted artifact");
        let (sequence, table) = match migration {
            Some((sequence, table)) => (Some(sequence), Some(table)),
            None => (None, None),
        };
        self.generation.artifacts.push(Artifact {
            id,
            text,
            sequence,
            table,
        });
    }

    fn model_failed(&mut self, class: &str, kind: ArtifactKind, err: BackendError) {
        tracing::warn!(class = %class, artifact = %kind, error = %err, "Skipping class");
        let reason = format!("{}: {}", kind, err);
        self.generation.diagnostics.emission_error(class, reason.clone());
        self.generation.skipped.push(SkippedClass {
            class: class.to_string(),
            reason,
        });
        self.failed.insert(class.to_string());
    }

    fn join_failed(&mut self, table: &str, err: BackendError) {
        tracing::warn!(table = %table, error = %err, "Skipping join table");
        self.generation.diagnostics.emission_error(table, err.to_string());
        self.failed_joins.insert(table.to_string());
    }

    /// Warn every emitted class that lost a relationship to a skipped one
    fn flag_dependents(&mut self, models: &ModelSet) {
        for relationship in &models.relationships {
            let ends = [&relationship.source_class, &relationship.target_class];
            for (this, other) in [(ends[0], ends[1]), (ends[1], ends[0])] {
                if self.failed.contains(other) && !self.failed.contains(this) {
                    self.generation.diagnostics.invalid_declaration(
                        this,
                        None,
                        format!("relationship with skipped class {} dropped", other),
                    );
                }
            }
            if let Some(table) = &relationship.join_table_name {
                let classes_ok = !ends.iter().any(|c| self.failed.contains(*c));
                if classes_ok && self.failed_joins.contains(table) {
                    let classes = if relationship.is_self_referential() {
                        &ends[..1]
                    } else {
                        &ends[..]
                    };
                    for class in classes {
                        self.generation.diagnostics.invalid_declaration(
                            class,
                            None,
                            format!("relationship through skipped join table {} dropped", table),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::resolve::resolve;
    use crate::source::parse_document;

    fn run(source: &str, flavor: Flavor) -> Generation {
        let config = GenerationConfig::for_flavor(flavor);
        let catalog = TypeCatalog::for_flavor(flavor);
        let mut diagnostics = Diagnostics::new();
        let models = resolve(&parse_document(source), &catalog, &mut diagnostics);
        Orchestrator::new(&config, &catalog)
            .with_recovered(diagnostics, Vec::new())
            .emit(&models)
    }

    #[test]
    fn test_artifact_id_display() {
        assert_eq!(ArtifactId::new("Order", ArtifactKind::Entity).to_string(), "Order:entity");
        assert_eq!(
            ArtifactId::new("post_tag", ArtifactKind::JoinMigration).to_string(),
            "post_tag:join_migration"
        );
    }

    #[test]
    fn test_stage_order() {
        let generation = run(
            "class User { email: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n",
            Flavor::Laravel,
        );
        let stages: Vec<Stage> = generation.artifacts.iter().map(|a| a.id.kind.stage()).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);

        let ids = generation.ids();
        assert_eq!(ids[0], "project:env");
        assert_eq!(ids[1], "project:database_config");
        assert!(ids.contains(&"Order:entity".to_string()));
        assert!(ids.contains(&"User:controller".to_string()));
        assert_eq!(ids.last().map(String::as_str), Some("Order:migration"));
    }

    #[test]
    fn test_migration_sequence() {
        let generation = run(
            "class Order { total: decimal }\nclass User { email: string }\nclass Tag { name: string }\nUser \"1\" -- \"*\" Order\nOrder \"*\" -- \"*\" Tag\n",
            Flavor::SeaOrm,
        );
        let migrations: Vec<(&str, usize)> = generation
            .artifacts
            .iter()
            .filter_map(|a| a.sequence.map(|s| (a.id.subject.as_str(), s)))
            .collect();
        assert_eq!(
            migrations,
            vec![("User", 1), ("Order", 2), ("Tag", 3), ("order_tag", 4)]
        );
        let join = generation.artifact("order_tag", ArtifactKind::JoinMigration).unwrap();
        assert_eq!(join.table.as_deref(), Some("order_tag"));
        assert!(generation.text("order_tag:join_entity").is_some());
        assert!(generation.text("project:support").is_some());
    }

    #[test]
    fn test_failed_class_skipped() {
        let generation = run(
            "class Post { state: enum(in_review, IN_REVIEW) }\nclass Tag { name: string }\nPost \"*\" -- \"*\" Tag\n",
            Flavor::SeaOrm,
        );
        assert!(generation.is_skipped("Post"));
        assert_eq!(generation.diagnostics.count(DiagnosticKind::EmissionError), 1);
        assert!(generation.get("Post:entity").is_none());
        assert!(generation.get("Post:migration").is_none());
        assert!(generation.get("post_tag:join_migration").is_none());
        assert!(generation.get("Tag:entity").is_some());
        assert!(generation.get("Tag:migration").is_some());
    }

    #[test]
    fn test_skipped_class_leaves_no_trace() {
        let generation = run(
            "class User { name: string }\nclass Post { state: enum(in_review, IN_REVIEW) }\nclass Comment { body: text }\nUser \"1\" -- \"*\" Post\nPost \"1\" -- \"*\" Comment\n",
            Flavor::SeaOrm,
        );
        assert!(generation.is_skipped("Post"));
        assert!(generation.artifacts.iter().all(|a| a.id.subject != "Post"));
        assert!(generation.artifacts.iter().all(|a| !a.text.contains("entities::post::")));

        let comment = generation.text("Comment:migration").unwrap();
        assert!(!comment.contains("post_id"));
        assert!(!generation.text("Comment:entity").unwrap().contains("post_id"));
        assert!(!generation.text("User:entity").unwrap().contains("super::post::Entity"));

        let migrations: Vec<usize> = generation.artifacts.iter().filter_map(|a| a.sequence).collect();
        assert_eq!(migrations, vec![1, 2]);
        assert_eq!(generation.diagnostics.count(DiagnosticKind::EmissionError), 1);
        assert_eq!(generation.diagnostics.count(DiagnosticKind::InvalidDeclaration), 2);
    }

    #[test]
    fn test_generation_serializes_without_text() {
        let generation = run("class Tag { name: geography }", Flavor::SeaOrm);
        let json = serde_json::to_value(&generation).unwrap();
        assert_eq!(json["flavor"], "seaorm");
        assert_eq!(json["artifacts"][0]["id"]["kind"], "env");
        assert!(json["artifacts"][0].get("text").is_none());
        assert_eq!(json["diagnostics"][0]["kind"], "unknown_type");
        assert_eq!(json["skipped"], serde_json::json!([]));
    }

    #[test]
    fn test_artifact_map_matches_artifacts() {
        let generation = run("class Tag { name: string }", Flavor::Laravel);
        let map = generation.artifact_map();
        assert_eq!(map.len(), generation.artifacts.len());
        assert!(map["Tag:entity"].contains("class Tag extends Model"));
    }
}
