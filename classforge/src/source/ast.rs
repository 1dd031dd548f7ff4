//! Syntax tree of a class-description document

/// A whole document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub items: Vec<Item>,
    /// Number of `class` blocks encountered, parsed or not
    pub class_blocks: usize,
}

/// A top-level item
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Class(ClassBlock),
    Relationship(RelationshipLine),
}

/// `class Name <<stereotype>> { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBlock {
    pub name: String,
    pub stereotypes: Vec<Stereotype>,
    pub fields: Vec<FieldLine>,
    pub line: usize,
}

/// `<<name(arg, ...)>>`
#[derive(Debug, Clone, PartialEq)]
pub struct Stereotype {
    pub name: String,
    pub args: Vec<String>,
}

/// `name: type(args)? [marker, key=value]`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLine {
    pub name: String,
    pub type_name: String,
    pub type_args: Vec<String>,
    pub optional: bool,
    pub markers: Vec<MarkerNode>,
    pub line: usize,
}

impl FieldLine {
    /// The type exactly as it should be handed to the type resolver
    pub fn raw_type(&self) -> String {
        let mut raw = self.type_name.clone();
        if !self.type_args.is_empty() {
            raw.push('(');
            raw.push_str(&self.type_args.join(","));
            raw.push(')');
        }
        if self.optional {
            raw.push('?');
        }
        raw
    }
}

/// A single bracketed marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerNode {
    pub name: String,
    pub value: Option<String>,
}

/// `Left "card" -- "card" Right : label`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipLine {
    pub left: String,
    pub left_card: String,
    pub right_card: String,
    pub right: String,
    pub label: Option<String>,
    pub line: usize,
}
