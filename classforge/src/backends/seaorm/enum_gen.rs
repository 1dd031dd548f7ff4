//! Enum code generation for SeaORM
//!
//! Enum fields (including the lifecycle status) become string-backed
//! `DeriveActiveEnum` types emitted next to the entity that owns them. The
//! stored and serialized value is always the declared value verbatim.

use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::backends::BackendError;
use crate::ir::{ResolvedField, ResolvedModel};

/// Rust enum name for an enum field: `Post.state` → `PostState`
pub fn enum_name(model: &ResolvedModel, field: &ResolvedField) -> String {
    format!(
        "{}{}",
        model.name.to_upper_camel_case(),
        field.name.to_upper_camel_case()
    )
}

/// Convert a declared enum value to a Rust variant name
///
/// `in_review` and `IN_REVIEW` both become `InReview`; values that do not
/// start with a letter get a `V` prefix.
pub fn convert_enum_variant_name(value: &str) -> String {
    let camel = value.to_upper_camel_case();
    match camel.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            if camel == "Self" {
                "SelfValue".to_string()
            } else {
                camel
            }
        }
        _ => format!("V{}", camel),
    }
}

pub fn variant_ident(value: &str) -> Result<Ident, BackendError> {
    let name = convert_enum_variant_name(value);
    syn::parse_str::<Ident>(&name)
        .map_err(|_| BackendError::CodeGenError(format!("enum value '{}' is not a valid variant", value)))
}

/// Generate the TokenStream for a SeaORM enum
pub fn generate_enum_tokens(
    enum_name: &str,
    values: &[String],
    default: Option<&str>,
) -> Result<TokenStream, BackendError> {
    if values.is_empty() {
        return Err(BackendError::CodeGenError(format!(
            "enum {} has no values",
            enum_name
        )));
    }
    let enum_ident = format_ident!("{}", enum_name);

    let mut seen = BTreeSet::new();
    let mut variants = Vec::with_capacity(values.len());
    let mut has_default = false;

    for value in values {
        let ident = variant_ident(value)?;
        if !seen.insert(ident.to_string()) {
            return Err(BackendError::CodeGenError(format!(
                "enum {} has two values named {}",
                enum_name, ident
            )));
        }

        let default_attr = if default == Some(value.as_str()) {
            has_default = true;
            quote! { #[default] }
        } else {
            quote! {}
        };

        variants.push(quote! {
            #default_attr
            #[sea_orm(string_value = #value)]
            #[serde(rename = #value)]
            #ident
        });
    }

    let derives = if has_default {
        quote! { #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)] }
    } else {
        quote! { #[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)] }
    };

    Ok(quote! {
        #derives
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(255))")]
        pub enum #enum_ident {
            #(#variants),*
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_enum_variant_name() {
        assert_eq!(convert_enum_variant_name("ACTIVE"), "Active");
        assert_eq!(convert_enum_variant_name("in_review"), "InReview");
        assert_eq!(convert_enum_variant_name("IN_REVIEW"), "InReview");
        assert_eq!(convert_enum_variant_name("2fa"), "V2fa");
        assert_eq!(convert_enum_variant_name("self"), "SelfValue");
    }

    #[test]
    fn test_generate_enum_tokens() {
        let values = vec!["ACTIVE".to_string(), "SUSPENDED".to_string()];
        let code = generate_enum_tokens("AccountStatus", &values, Some("ACTIVE"))
            .unwrap()
            .to_string();

        assert!(code.contains("DeriveActiveEnum"));
        assert!(code.contains("Default"));
        assert!(code.contains("rs_type = \"String\""));
        assert!(code.contains("string_value = \"SUSPENDED\""));
        assert!(code.contains("# [default] # [sea_orm (string_value = \"ACTIVE\")]"));
        assert!(code.contains("pub enum AccountStatus"));
    }

    #[test]
    fn test_generate_enum_without_default() {
        let values = vec!["draft".to_string(), "published".to_string()];
        let code = generate_enum_tokens("PostState", &values, None)
            .unwrap()
            .to_string();
        assert!(!code.contains("Default"));
        assert!(code.contains("serde (rename = \"draft\")"));
        assert!(code.contains("Published"));
    }

    #[test]
    fn test_duplicate_variants_rejected() {
        let values = vec!["in_review".to_string(), "IN_REVIEW".to_string()];
        assert!(matches!(
            generate_enum_tokens("PostState", &values, None),
            Err(BackendError::CodeGenError(_))
        ));
    }
}
