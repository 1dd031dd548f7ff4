//! Source model parser
//!
//! Turns class-description text into [`ClassModel`]s: class name, ordered raw
//! fields with their constraint markers, and raw relationship declarations.
//!
//! ```text
//! class User {
//!   email: string [unique]
//!   nickname: string?
//! }
//! class Order <<stateful>> {
//!   total: decimal(10,2)
//! }
//! User "1" -- "*" Order
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;

use crate::error::ParseError;

use ast::{ClassBlock, Item, RelationshipLine};

/// Stereotype that attaches the lifecycle contract to a class
pub const STATEFUL_STEREOTYPE: &str = "stateful";

/// One bracketed constraint marker, e.g. `unique` or `regex="^[A-Z]+$"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub value: Option<String>,
}

/// A field as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    /// Full type spelling including arguments and `?`
    pub raw_type: String,
    pub markers: Vec<Marker>,
    pub line: usize,
}

impl RawField {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            markers: Vec::new(),
            line: 0,
        }
    }

    /// Builder-style marker, mainly for tests
    pub fn with_marker(mut self, name: &str, value: Option<&str>) -> Self {
        self.markers.push(Marker {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
        self
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.iter().any(|m| m.name == name)
    }

    pub fn marker_value(&self, name: &str) -> Option<&str> {
        self.markers
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.value.as_deref())
    }

    /// Marker names as a set
    pub fn marker_names(&self) -> BTreeSet<&str> {
        self.markers.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Multiplicity of one relationship end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    One,
    Many,
}

impl Multiplicity {
    /// Interpret a quoted multiplicity marker
    pub fn parse(marker: &str) -> Option<Self> {
        match marker.trim().to_lowercase().as_str() {
            "1" | "0..1" => Some(Multiplicity::One),
            "*" | "0..*" | "1..*" | "n" | "many" => Some(Multiplicity::Many),
            _ => None,
        }
    }
}

/// A relationship declaration as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelationship {
    pub left: String,
    pub left_multiplicity: Multiplicity,
    pub right: String,
    pub right_multiplicity: Multiplicity,
    pub eager: bool,
    pub line: usize,
}

impl RawRelationship {
    pub fn new(
        left: impl Into<String>,
        left_multiplicity: Multiplicity,
        right_multiplicity: Multiplicity,
        right: impl Into<String>,
    ) -> Self {
        Self {
            left: left.into(),
            left_multiplicity,
            right: right.into(),
            right_multiplicity,
            eager: false,
            line: 0,
        }
    }
}

/// One parsed class block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassModel {
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<RawField>,
    /// Relationships declared with this class on the left-hand side
    pub relationships: Vec<RawRelationship>,
    pub stateful: bool,
    /// Domain states added through `<<stateful(...)>>`
    pub extra_states: Vec<String>,
    pub line: usize,
}

/// Result of lenient parsing
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    /// Successfully parsed classes in declaration order
    pub classes: Vec<ClassModel>,
    /// Relationships whose left-hand class has no block
    pub detached: Vec<RawRelationship>,
    /// Every recovered parse error
    pub errors: Vec<ParseError>,
    /// Number of class blocks attempted, including failed ones
    pub class_blocks: usize,
}

impl SourceDocument {
    /// All relationship declarations in source order
    pub fn relationships(&self) -> Vec<&RawRelationship> {
        let mut all: Vec<&RawRelationship> = self
            .classes
            .iter()
            .flat_map(|c| c.relationships.iter())
            .chain(self.detached.iter())
            .collect();
        all.sort_by_key(|r| r.line);
        all
    }

    /// Names of the successfully parsed classes
    pub fn class_names(&self) -> BTreeSet<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }

    /// Classes whose block failed to parse, with the first error for each
    pub fn failed_classes(&self) -> Vec<(&str, &ParseError)> {
        let mut seen = BTreeSet::new();
        self.errors
            .iter()
            .filter_map(|e| e.class.as_deref().map(|c| (c, e)))
            .filter(|(c, _)| seen.insert(*c))
            .collect()
    }
}

/// Parse strictly, failing on the first error
pub fn parse(source: &str) -> Result<Vec<ClassModel>, ParseError> {
    let mut document = parse_document(source);
    if !document.errors.is_empty() {
        return Err(document.errors.remove(0));
    }
    Ok(document.classes)
}

/// Parse leniently, collecting every recoverable error
pub fn parse_document(source: &str) -> SourceDocument {
    let (ast, mut errors) = parser::parse_ast(source);

    let mut classes: Vec<ClassModel> = Vec::new();
    let mut relationships = Vec::new();
    let class_blocks = ast.class_blocks;

    for item in ast.items {
        match item {
            Item::Class(block) => {
                if classes.iter().any(|c| c.name == block.name) {
                    errors.push(
                        ParseError::new(block.line, format!("duplicate class '{}'", block.name))
                            .in_class(&block.name),
                    );
                    continue;
                }
                classes.push(lower_class(block));
            }
            Item::Relationship(line) => match lower_relationship(line) {
                Ok(rel) => relationships.push(rel),
                Err(err) => errors.push(err),
            },
        }
    }

    let mut detached = Vec::new();
    for rel in relationships {
        match classes.iter_mut().find(|c| c.name == rel.left) {
            Some(class) => class.relationships.push(rel),
            None => detached.push(rel),
        }
    }

    errors.sort_by_key(|e| e.line);
    SourceDocument {
        classes,
        detached,
        errors,
        class_blocks,
    }
}

fn lower_class(block: ClassBlock) -> ClassModel {
    let mut stateful = false;
    let mut extra_states = Vec::new();
    for stereotype in &block.stereotypes {
        if stereotype.name.eq_ignore_ascii_case(STATEFUL_STEREOTYPE) {
            stateful = true;
            extra_states.extend(stereotype.args.iter().map(|s| s.to_uppercase()));
        } else {
            tracing::debug!(
                class = %block.name,
                stereotype = %stereotype.name,
                "Ignoring unknown stereotype"
            );
        }
    }

    let fields = block
        .fields
        .iter()
        .map(|f| RawField {
            name: f.name.clone(),
            raw_type: f.raw_type(),
            markers: f
                .markers
                .iter()
                .map(|m| Marker {
                    name: m.name.clone(),
                    value: m.value.clone(),
                })
                .collect(),
            line: f.line,
        })
        .collect();

    ClassModel {
        name: block.name,
        fields,
        relationships: Vec::new(),
        stateful,
        extra_states,
        line: block.line,
    }
}

fn lower_relationship(line: RelationshipLine) -> Result<RawRelationship, ParseError> {
    let left_multiplicity = Multiplicity::parse(&line.left_card).ok_or_else(|| {
        ParseError::new(
            line.line,
            format!("unsupported multiplicity \"{}\"", line.left_card),
        )
    })?;
    let right_multiplicity = Multiplicity::parse(&line.right_card).ok_or_else(|| {
        ParseError::new(
            line.line,
            format!("unsupported multiplicity \"{}\"", line.right_card),
        )
    })?;

    let eager = line
        .label
        .as_deref()
        .is_some_and(|l| l.eq_ignore_ascii_case("eager"));

    Ok(RawRelationship {
        left: line.left,
        left_multiplicity,
        right: line.right,
        right_multiplicity,
        eager,
        line: line.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"
class User {
  email: string
  nickname: string? [optional]
}

class Order <<stateful(CLOSED)>> {
  total: decimal(10,2)
  note: text? [regex="^[a-z ]*$"]
}

User "1" -- "*" Order : eager
"#;

    #[test]
    fn test_parse_shop() {
        let classes = parse(SHOP).unwrap();
        assert_eq!(classes.len(), 2);

        let user = &classes[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.fields[0].raw_type, "string");
        assert_eq!(user.fields[1].raw_type, "string?");
        assert!(user.fields[1].has_marker("optional"));
        assert_eq!(user.relationships.len(), 1);
        assert!(user.relationships[0].eager);
        assert_eq!(user.relationships[0].right_multiplicity, Multiplicity::Many);

        let order = &classes[1];
        assert!(order.stateful);
        assert_eq!(order.extra_states, vec!["CLOSED".to_string()]);
        assert_eq!(order.fields[0].raw_type, "decimal(10,2)");
        assert_eq!(order.fields[1].marker_value("regex"), Some("^[a-z ]*$"));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let classes = parse("class A { z: int; a: int; m: int }").unwrap();
        let names: Vec<_> = classes[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_multiplicities() {
        assert_eq!(Multiplicity::parse("0..1"), Some(Multiplicity::One));
        assert_eq!(Multiplicity::parse("1..*"), Some(Multiplicity::Many));
        assert_eq!(Multiplicity::parse("many"), Some(Multiplicity::Many));
        assert_eq!(Multiplicity::parse("2"), None);
    }

    #[test]
    fn test_unsupported_multiplicity_is_parse_error() {
        let document = parse_document("class A {}\nclass B {}\nA \"2\" -- \"*\" B\n");
        assert_eq!(document.classes.len(), 2);
        assert_eq!(document.errors.len(), 1);
        assert!(document.relationships().is_empty());
    }

    #[test]
    fn test_duplicate_class() {
        let document = parse_document("class A { x: int }\nclass A { y: int }\n");
        assert_eq!(document.classes.len(), 1);
        assert_eq!(document.classes[0].fields[0].name, "x");
        assert_eq!(document.errors.len(), 1);
        assert_eq!(document.class_blocks, 2);
        assert_eq!(document.failed_classes()[0].0, "A");
    }

    #[test]
    fn test_detached_relationships() {
        let document = parse_document("class Order {}\nGhost \"1\" -- \"*\" Order\n");
        assert_eq!(document.detached.len(), 1);
        assert_eq!(document.relationships().len(), 1);
    }

    #[test]
    fn test_strict_parse_reports_first_error() {
        let err = parse("class A {\n  x int\n}\nclass B {\n  y\n}\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.class.as_deref(), Some("A"));
    }

    #[test]
    fn test_empty_document() {
        let document = parse_document("// nothing here\n");
        assert_eq!(document.class_blocks, 0);
        assert!(document.classes.is_empty());
    }
}
