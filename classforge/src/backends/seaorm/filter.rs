//! Query filter generation
//!
//! Each filterable field gets one optional filter primitive from the support
//! module, chosen by the field's comparison class.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::types::{key_type, map_canonical_type};
use super::{column_ident, entity_module_path, field_ident, module_path};
use crate::backends::{BackendError, EmitContext, format_code};
use crate::ir::ResolvedModel;
use crate::plan::FilterPlan;
use crate::types::ComparisonClass;

pub fn filter_name(model: &ResolvedModel) -> Ident {
    format_ident!("{}Filter", model.name)
}

/// Generate the filter struct of a model
pub fn generate(
    model: &ResolvedModel,
    plan: &FilterPlan,
    ctx: &EmitContext<'_>,
) -> Result<String, BackendError> {
    let module_doc = format!(" Search filter for `{}`", model.name);
    let entity = entity_module_path(ctx, &model.name)?;
    let support = module_path(ctx, &["support"])?;
    let name = filter_name(model);

    let mut primitives = Vec::new();
    let mut fields = Vec::with_capacity(plan.fields.len());
    let mut conditions = Vec::with_capacity(plan.fields.len());

    for field in &plan.fields {
        let ident = field_ident(&field.field);
        let column = column_ident(&field.field);
        let value_type = match model.field(&field.field) {
            Some(declared) => map_canonical_type(ctx.catalog, declared.canonical_type, None),
            None => key_type(),
        }
        .tokens(false)?;

        let (primitive, ty) = match field.class {
            Some(ComparisonClass::Numeric) => ("NumericFilter", quote! { NumericFilter<#value_type> }),
            Some(ComparisonClass::String) => ("StringFilter", quote! { StringFilter }),
            Some(ComparisonClass::Temporal) => ("TemporalFilter", quote! { TemporalFilter<#value_type> }),
            None => ("BoolFilter", quote! { BoolFilter }),
        };
        if !primitives.contains(&primitive) {
            primitives.push(primitive);
        }

        let doc = format!(" Operators: {}", field.operators.join(", "));
        fields.push(quote! {
            #[doc = #doc]
            pub #ident: Option<#ty>,
        });
        conditions.push(quote! {
            if let Some(filter) = &self.#ident {
                condition = condition.add(filter.condition(Column::#column));
            }
        });
    }

    primitives.sort_unstable();
    let primitives: Vec<Ident> = primitives.iter().map(|p| format_ident!("{}", p)).collect();
    let support_import = if primitives.is_empty() {
        TokenStream::new()
    } else {
        quote! { use #support::{#(#primitives),*}; }
    };
    let condition_body = if conditions.is_empty() {
        quote! { Condition::all() }
    } else {
        quote! {
            let mut condition = Condition::all();
            #(#conditions)*
            condition
        }
    };

    let tokens = quote! {
        #![doc = #module_doc]
        //! @generated

        use sea_orm::Condition;
        use sea_orm::entity::prelude::*;
        use serde::Deserialize;

        use #entity::Column;
        #support_import

        #[derive(Debug, Clone, Default, Deserialize)]
        pub struct #name {
            #(#fields)*
        }

        impl #name {
            /// Conjunction of every populated operator
            pub fn condition(&self) -> Condition {
                #condition_body
            }
        }
    };

    format_code(tokens)
}
