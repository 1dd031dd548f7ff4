//! Deterministic naming rules
//!
//! Table names, join-table names, foreign-key columns and accessor names are
//! pure functions of class names. Regenerating from the same source always
//! yields the same names, whatever order relationships were declared in.

use heck::{ToLowerCamelCase, ToSnakeCase};

/// Pluralize a word: consonant + `y` becomes `ies`, everything else gets `s`
///
/// This is deliberately naive; irregular nouns come out wrong
/// (`person` → `persons`, `address` → `addresss`).
pub fn pluralize(word: &str) -> String {
    let mut chars = word.chars().rev();
    match (chars.next(), chars.next()) {
        (Some('y'), Some(prev)) if prev.is_alphabetic() && !is_vowel(prev) => {
            format!("{}ies", &word[..word.len() - 1])
        }
        _ => format!("{}s", word),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Database table for a class: `OrderItem` → `order_items`
pub fn table_name(class: &str) -> String {
    pluralize(&class.to_snake_case())
}

/// Table name with the plural suffix removed again: `OrderItem` → `order_item`
///
/// Stripping exactly the suffix [`pluralize`] added gives back the snake-case
/// class name, so this never depends on English singularization.
pub fn table_stem(class: &str) -> String {
    let snake = class.to_snake_case();
    let plural = pluralize(&snake);
    match plural.strip_suffix('s') {
        Some(stem) if stem == snake => stem.to_string(),
        _ => format!("{}y", &plural[..plural.len() - 3]),
    }
}

/// Join table for a many-to-many pair, independent of argument order
pub fn join_table_name(a: &str, b: &str) -> String {
    let mut stems = [table_stem(a), table_stem(b)];
    stems.sort();
    stems.join("_")
}

/// Foreign-key column referencing a class: `User` → `user_id`
pub fn foreign_key_column(class: &str) -> String {
    format!("{}_id", class.to_snake_case())
}

/// Source module for a class: `OrderItem` → `order_item`
///
/// `self`, `super` and `crate` cannot even be raw identifiers and get a
/// trailing underscore.
pub fn module_name(class: &str) -> String {
    let snake = class.to_snake_case();
    match snake.as_str() {
        "self" | "super" | "crate" => format!("{}_", snake),
        _ => snake,
    }
}

/// Namespace segments as module names: `Shop.Admin` → `["shop", "admin"]`
pub fn namespace_segments(namespace: &str) -> Vec<String> {
    namespace
        .split(['\\', '.', ':', '/'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_snake_case())
        .collect()
}

/// Whether a declared name still starts with a letter once snake-cased
///
/// `_user` → `user` is fine; `_1` and `_` collapse to nothing usable as a
/// column, module or identifier.
pub fn is_portable_name(name: &str) -> bool {
    name.to_snake_case()
        .chars()
        .next()
        .is_some_and(char::is_alphabetic)
}

/// Accessor for a single related object: `OrderItem` → `orderItem`
pub fn singular_accessor(class: &str) -> String {
    class.to_lower_camel_case()
}

/// Accessor for a collection of related objects: `OrderItem` → `orderItems`
pub fn collection_accessor(class: &str) -> String {
    pluralize(&class.to_lower_camel_case())
}
