//! Column attribute generation for SeaORM entities
//!
//! This module generates the #[sea_orm(...)] attributes for entity fields.

use proc_macro2::TokenStream;
use quote::quote;

use super::types::MappedType;
use crate::backends::BackendError;
use crate::ir::ResolvedField;

/// Generated SeaORM column attributes for a field
#[derive(Debug, Default)]
pub struct ColumnAttributes {
    /// The #[sea_orm(...)] attribute contents
    pub attributes: Vec<String>,
}

impl ColumnAttributes {
    /// Primary key attributes; join tables use composite keys
    pub fn primary_key(auto_increment: bool) -> Self {
        let attribute = if auto_increment {
            "primary_key"
        } else {
            "primary_key, auto_increment = false"
        };
        Self {
            attributes: vec![attribute.to_string()],
        }
    }

    /// The `#[sea_orm(...)]` attribute, or nothing when there are no attributes
    pub fn to_tokens(&self) -> Result<TokenStream, BackendError> {
        if self.attributes.is_empty() {
            return Ok(TokenStream::new());
        }
        let inner: TokenStream = self.attributes.join(", ").parse().map_err(|e| {
            BackendError::CodeGenError(format!("invalid column attribute: {}", e))
        })?;
        Ok(quote! { #[sea_orm(#inner)] })
    }
}

/// Generate column attributes from a resolved field and its mapped type
pub fn generate_attributes(field: &ResolvedField, mapped_type: &MappedType) -> ColumnAttributes {
    let mut attributes = Vec::new();

    if field.is_unique() {
        attributes.push("unique".to_string());
    }

    if let Some(column_type) = mapped_type.column_type {
        attributes.push(format!("column_type = \"{}\"", column_type));
    }

    if let Some(default) = field.default_value() {
        attributes.push(format!("default_value = {:?}", default));
    }

    ColumnAttributes { attributes }
}
