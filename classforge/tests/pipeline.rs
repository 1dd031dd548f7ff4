//! End-to-end pipeline tests: source text in, artifacts and diagnostics out

use classforge::constraints::ConstraintKind;
use classforge::diagnostics::Diagnostics;
use classforge::lifecycle::{Lifecycle, State};
use classforge::relationship::Cardinality;
use classforge::resolve::resolve;
use classforge::source::parse_document;
use classforge::types::{CanonicalType, TypeCatalog};
use classforge::{ArtifactKind, DiagnosticKind, Flavor, GenerationConfig, generate};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

const SHOP: &str = r#"
@startuml
class User {
  email: string
  nickname: string?
}

class Order {
  total: decimal(10,2)
  placed_on: date
}

class Tag <<stateful>> {
  name: string [unique]
}

User "1" -- "*" Order
Order "*" -- "*" Tag : eager
@enduml
"#;

fn config(flavor: Flavor) -> GenerationConfig {
    GenerationConfig::for_flavor(flavor)
}

#[test]
fn test_concrete_scenario() {
    let source = "class User { email: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n";
    let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
    let mut diagnostics = Diagnostics::new();
    let models = resolve(&parse_document(source), &catalog, &mut diagnostics);

    let relationship = &models.relationships[0];
    assert_eq!(relationship.cardinality, Cardinality::OneToMany);
    assert_eq!(relationship.owner(), Some("Order"));
    assert_eq!(relationship.foreign_key_column.as_deref(), Some("user_id"));
    assert_eq!(relationship.accessor_name, "orders");

    let generation = generate(source, &config(Flavor::Laravel)).unwrap();
    let user = generation.text("User:entity").unwrap();
    assert!(user.contains("public function orders(): HasMany"));
    let migration = generation.text("Order:migration").unwrap();
    assert!(migration.contains("$table->foreignId('user_id')"));
}

#[test]
fn test_generation_is_deterministic() {
    for flavor in Flavor::ALL {
        let first = generate(SHOP, &config(flavor)).unwrap();
        let second = generate(SHOP, &config(flavor)).unwrap();
        assert_eq!(first.artifact_map(), second.artifact_map());
        assert_eq!(first.ids(), second.ids());
    }
}

#[test]
fn test_join_table_is_symmetric_end_to_end() {
    let forward = generate(
        "class Post { title: string }\nclass Tag { name: string }\nPost \"*\" -- \"*\" Tag\n",
        &config(Flavor::SeaOrm),
    )
    .unwrap();
    let backward = generate(
        "class Post { title: string }\nclass Tag { name: string }\nTag \"*\" -- \"*\" Post\n",
        &config(Flavor::SeaOrm),
    )
    .unwrap();
    assert!(forward.get("post_tag:join_migration").is_some());
    assert!(backward.get("post_tag:join_migration").is_some());
}

#[test]
fn test_required_by_default() {
    let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
    let models = resolve(&parse_document(SHOP), &catalog, &mut Diagnostics::new());
    let user = models.model("User").unwrap();

    let email = user.field("email").unwrap();
    assert!(!email.nullable);
    assert!(email.has_constraint(ConstraintKind::Required));
    assert!(email.has_constraint(ConstraintKind::Unique));
    assert!(email.has_constraint(ConstraintKind::Email));

    let nickname = user.field("nickname").unwrap();
    assert!(nickname.nullable);
    assert!(!nickname.has_constraint(ConstraintKind::Required));
}

#[test]
fn test_unknown_type_is_lenient() {
    let generation = generate("class Point { location: geography }", &config(Flavor::SeaOrm)).unwrap();
    assert_eq!(generation.diagnostics.count(DiagnosticKind::UnknownType), 1);
    assert!(!generation.diagnostics.has_errors());
    assert!(generation.get("Point:entity").is_some());

    let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
    let models = resolve(
        &parse_document("class Point { location: geography }"),
        &catalog,
        &mut Diagnostics::new(),
    );
    assert_eq!(
        models.model("Point").unwrap().field("location").unwrap().canonical_type,
        CanonicalType::String
    );
}

#[test]
fn test_partial_failure_continuity() {
    let source = "class User { email: string }\nclass Order { total: decimal }\nclass Tag { name: string }\nUser \"1\" -- \"*\" Order\nOrder \"*\" -- \"*\" Coupon\n";
    for flavor in Flavor::ALL {
        let generation = generate(source, &config(flavor)).unwrap();
        for class in ["User", "Order", "Tag"] {
            assert!(
                generation.artifact(class, ArtifactKind::Entity).is_some(),
                "{} entity missing for {}",
                class,
                flavor
            );
        }
        assert_eq!(generation.diagnostics.count(DiagnosticKind::DanglingReference), 1);
        assert!(generation.skipped.is_empty());
    }
}

#[test]
fn test_malformed_class_does_not_abort() {
    let source = "class Broken {\n  total decimal\n}\nclass Tag { name: string }\n";
    let generation = generate(source, &config(Flavor::Laravel)).unwrap();
    assert!(generation.is_skipped("Broken"));
    assert_eq!(generation.diagnostics.count(DiagnosticKind::ParseError), 1);
    assert!(generation.get("Tag:entity").is_some());
    assert!(generation.get("Tag:migration").is_some());
}

#[test]
fn test_configuration_comes_first() {
    for flavor in Flavor::ALL {
        let generation = generate(SHOP, &config(flavor)).unwrap();
        let first_model = generation
            .artifacts
            .iter()
            .position(|a| a.id.subject != "project")
            .unwrap();
        assert!(
            generation.artifacts[first_model..]
                .iter()
                .all(|a| a.id.subject != "project")
        );
        let entity = generation.ids().iter().position(|id| id == "Order:entity").unwrap();
        let validation = generation.ids().iter().position(|id| id == "Order:validation").unwrap();
        let migration = generation.ids().iter().position(|id| id == "Order:migration").unwrap();
        assert!(entity < validation && validation < migration);
    }
}

#[test]
fn test_migration_keys_match_entity_accessors() {
    let generation = generate(SHOP, &config(Flavor::SeaOrm)).unwrap();
    let order = generation.text("Order:entity").unwrap();
    assert!(order.contains("pub user_id: i64,"));
    assert!(order.contains("from = \"Column::UserId\""));
    let migration = generation.text("Order:migration").unwrap();
    assert!(migration.contains("FOREIGN KEY (user_id) REFERENCES users (id)"));

    let junction = generation.text("order_tag:join_entity").unwrap();
    assert!(junction.contains("pub order_id: i64,"));
    assert!(junction.contains("pub tag_id: i64,"));
    let join = generation.text("order_tag:join_migration").unwrap();
    assert!(join.contains("PRIMARY KEY (order_id, tag_id)"));
}

#[test]
fn test_stateful_entity_in_both_flavors() {
    let laravel = generate(SHOP, &config(Flavor::Laravel)).unwrap();
    let tag = laravel.text("Tag:entity").unwrap();
    assert!(tag.contains("public function suspend(): void"));
    assert!(tag.contains("public function activate(): void"));

    let seaorm = generate(SHOP, &config(Flavor::SeaOrm)).unwrap();
    let tag = seaorm.text("Tag:entity").unwrap();
    assert!(tag.contains("pub fn suspend("));
    assert!(tag.contains("pub fn activate("));
    let service = seaorm.text("Tag:service").unwrap();
    assert!(service.contains("pub async fn suspend(&self, id: i64)"));
}

#[test]
fn test_letterless_field_names_do_not_abort() {
    for source in ["class Item { _1: int }\nclass Other { x: int }\n", "class Item { _: int }\n"] {
        for flavor in Flavor::ALL {
            let generation = generate(source, &config(flavor)).unwrap();
            assert!(generation.skipped.is_empty());
            assert!(generation.get("Item:entity").is_some());
            assert_eq!(generation.diagnostics.count(DiagnosticKind::InvalidDeclaration), 1);
        }
    }
}

#[test]
fn test_mistyped_default_only_loses_the_default() {
    let source = "class Item { qty: int [default=abc]; name: string }\nclass Crate { label: string }\n";
    for flavor in Flavor::ALL {
        let generation = generate(source, &config(flavor)).unwrap();
        assert!(generation.skipped.is_empty());
        for kind in [ArtifactKind::Entity, ArtifactKind::Validation, ArtifactKind::Controller, ArtifactKind::Migration] {
            assert!(generation.artifact("Item", kind).is_some(), "Item {} missing for {}", kind, flavor);
        }
        assert_eq!(generation.diagnostics.count(DiagnosticKind::InvalidDeclaration), 1);
        assert!(!generation.text("Item:migration").unwrap().contains("abc"));
    }
}

#[test]
fn test_keyword_class_names() {
    let source = "class Item { name: string }\nclass Box { label: string }\nBox \"1\" -- \"*\" Item\n";
    let generation = generate(source, &config(Flavor::SeaOrm)).unwrap();
    assert!(generation.skipped.is_empty());
    for class in ["Item", "Box"] {
        for kind in [ArtifactKind::Entity, ArtifactKind::Validation, ArtifactKind::Service, ArtifactKind::Migration] {
            assert!(generation.artifact(class, kind).is_some(), "{} {} missing", class, kind);
        }
    }
    let item = generation.text("Item:entity").unwrap();
    assert!(item.contains("belongs_to = \"super::r#box::Entity\""));
    assert!(generation.text("Box:service").unwrap().contains("entities::r#box"));
}

#[test]
fn test_accessor_collision_is_flavor_independent() {
    let source = "class User { name: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\nOrder \"*\" -- \"*\" User\n";
    let laravel = generate(source, &config(Flavor::Laravel)).unwrap();
    let seaorm = generate(source, &config(Flavor::SeaOrm)).unwrap();
    for generation in [&laravel, &seaorm] {
        assert!(generation.skipped.is_empty());
        assert_eq!(generation.diagnostics.count(DiagnosticKind::InvalidDeclaration), 1);
        assert!(generation.get("User:migration").is_some());
        assert!(generation.get("order_user:join_migration").is_none());
    }
    assert!(laravel.text("User:entity").unwrap().contains("public function orders(): HasMany"));
}

#[test]
fn test_lifecycle_round_trip() {
    let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let later = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
    let mut record = Lifecycle::new(created);

    assert!(record.activate(later).is_err());
    assert_eq!(record.updated_at, created);

    record.suspend(later).unwrap();
    assert_eq!(record.status, State::Suspended);
    assert!(record.suspend(later).is_err());

    record.activate(later).unwrap();
    assert_eq!(record, Lifecycle { status: State::Active, updated_at: later });
}

fn class_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][a-z]{2,6}[A-Z][a-z]{2,6}",
        "[A-Z][a-z]{1,8}",
        prop::sample::select(vec![
            "Box", "Type", "Match", "Ref", "Move", "Loop", "Trait", "Self", "Crate", "Where",
            "Async", "Static",
        ])
        .prop_map(String::from),
    ]
}

proptest! {
    #[test]
    fn generation_is_deterministic_for_any_pair(
        a in class_name(),
        b in class_name(),
        many in any::<bool>(),
    ) {
        prop_assume!(a != b);
        let card = if many { "*" } else { "1" };
        let source = format!(
            "class {} {{ name: string }}\nclass {} {{ total: decimal }}\n{} \"{}\" -- \"*\" {}\n",
            a, b, a, card, b
        );
        for flavor in Flavor::ALL {
            let config = GenerationConfig::for_flavor(flavor);
            let first = generate(&source, &config).unwrap();
            let second = generate(&source, &config).unwrap();
            prop_assert_eq!(first.artifact_map(), second.artifact_map());
            prop_assert!(first.skipped.is_empty(), "{} skipped {:?}", flavor, first.skipped);
        }
    }
}
