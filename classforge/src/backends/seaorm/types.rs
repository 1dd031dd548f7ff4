//! Type mapping from canonical types to Rust/SeaORM types
//!
//! This module handles the conversion of canonical field types to their
//! corresponding Rust types and column types for SeaORM entities.

use proc_macro2::TokenStream;
use quote::quote;

use crate::backends::BackendError;
use crate::types::{CanonicalType, TypeCatalog};

/// Represents a mapped Rust type for SeaORM entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// The Rust type as a string (e.g., "i32", "String", "DateTimeUtc")
    pub rust_type: String,
    /// Explicit `column_type` when the Rust type alone is ambiguous
    pub column_type: Option<&'static str>,
}

impl MappedType {
    /// Parse the Rust type, wrapping it in `Option` for nullable columns
    pub fn tokens(&self, nullable: bool) -> Result<TokenStream, BackendError> {
        let ty: syn::Type = syn::parse_str(&self.rust_type).map_err(|e| {
            BackendError::TypeMappingError(format!("invalid Rust type '{}': {}", self.rust_type, e))
        })?;
        Ok(if nullable {
            quote! { Option<#ty> }
        } else {
            quote! { #ty }
        })
    }

    pub fn is_string(&self) -> bool {
        self.rust_type == "String"
    }
}

/// Map a canonical type to a Rust type
///
/// Enum columns map to the generated enum named by `enum_type`.
pub fn map_canonical_type(
    catalog: &TypeCatalog,
    canonical: CanonicalType,
    enum_type: Option<&str>,
) -> MappedType {
    let column_type = match canonical {
        CanonicalType::Text => Some("Text"),
        CanonicalType::Decimal => Some("Decimal(Some((10, 2)))"),
        CanonicalType::Json => Some("JsonBinary"),
        CanonicalType::Binary => Some("Blob"),
        _ => None,
    };
    let rust_type = match (canonical, enum_type) {
        (CanonicalType::Enum, Some(name)) => name.to_string(),
        _ => catalog.cast_directive(canonical).to_string(),
    };
    MappedType {
        rust_type,
        column_type,
    }
}

/// Rust type of every foreign-key and primary-key column
pub fn key_type() -> MappedType {
    MappedType {
        rust_type: "i64".to_string(),
        column_type: None,
    }
}
