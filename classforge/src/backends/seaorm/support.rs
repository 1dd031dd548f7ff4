//! Shared support module for generated SeaORM applications
//!
//! This module provides token stream generators for the error types and
//! filter primitives every generated entity module imports. The errors
//! bridge between storage, validation and lifecycle failures and HTTP
//! responses.

use proc_macro2::TokenStream;
use quote::quote;

/// Generate the ValidationError enum
///
/// This error type is used for request validation failures.
pub fn generate_validation_error() -> TokenStream {
    quote! {
        /// Validation error for request field failures
        #[derive(Debug, thiserror::Error)]
        pub enum ValidationError {
            /// A field failed validation
            #[error("Invalid field '{field}': {message}")]
            InvalidField {
                /// The field that failed validation
                field: String,
                /// Description of the validation failure
                message: String,
            },
            /// A required field was missing
            #[error("Missing required field: {0}")]
            MissingRequired(String),
            /// Declarative field rules failed
            #[error(transparent)]
            Rules(#[from] validator::ValidationErrors),
        }

        /// Field validator for UUID-formatted strings
        pub fn validate_uuid(value: &str) -> Result<(), validator::ValidationError> {
            uuid::Uuid::parse_str(value)
                .map(|_| ())
                .map_err(|_| validator::ValidationError::new("uuid"))
        }
    }
}

/// Generate the StorageError enum
pub fn generate_storage_error() -> TokenStream {
    quote! {
        /// Storage error returned by repositories
        #[derive(Debug, thiserror::Error)]
        pub enum StorageError {
            /// The requested record does not exist
            #[error("Not found: {0}")]
            NotFound(String),
            /// The database rejected the operation
            #[error("Database error: {0}")]
            Database(#[from] sea_orm::DbErr),
            /// The operation was called with an unusable argument
            #[error("Invalid argument: {0}")]
            InvalidArgument(String),
        }
    }
}

/// Generate the LifecycleError enum raised by guarded transitions
pub fn generate_lifecycle_error() -> TokenStream {
    quote! {
        /// A guarded lifecycle transition was called from the wrong state
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum LifecycleError {
            #[error("cannot {transition} from state {from}; expected {expected}")]
            InvalidTransition {
                transition: &'static str,
                from: String,
                expected: &'static str,
            },
        }
    }
}

/// Generate the ServiceError enum
///
/// This wraps validation, storage and lifecycle errors for unified error
/// handling in services and controllers.
pub fn generate_service_error() -> TokenStream {
    quote! {
        /// Service-level error wrapping validation, storage and lifecycle errors
        #[derive(Debug, thiserror::Error)]
        pub enum ServiceError {
            /// Request validation failed
            #[error("Validation failed: {0}")]
            Validation(#[from] ValidationError),
            /// Storage operation failed
            #[error("Storage error: {0}")]
            Storage(#[from] StorageError),
            /// A transition was rejected
            #[error("{0}")]
            Lifecycle(#[from] LifecycleError),
        }
    }
}

/// Generate the IntoResponse implementation for ServiceError
///
/// This maps service errors to HTTP status codes.
pub fn generate_response_conversion() -> TokenStream {
    quote! {
        impl IntoResponse for ServiceError {
            fn into_response(self) -> Response {
                let status = match &self {
                    ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    ServiceError::Storage(s) => match s {
                        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                        StorageError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                        StorageError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    },
                    ServiceError::Lifecycle(_) => StatusCode::CONFLICT,
                };
                if status.is_server_error() {
                    tracing::error!(error = %self, "Request failed");
                }
                (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
            }
        }
    }
}

/// Generate the per-comparison-class filter primitives
///
/// Entity filters hold one optional primitive per filterable field; each
/// primitive turns its populated operators into a condition on a column.
pub fn generate_filter_primitives() -> TokenStream {
    quote! {
        /// Operators for numeric columns
        #[derive(Debug, Clone, Deserialize)]
        pub struct NumericFilter<T> {
            pub eq: Option<T>,
            pub ne: Option<T>,
            pub gt: Option<T>,
            pub gte: Option<T>,
            pub lt: Option<T>,
            pub lte: Option<T>,
            pub between: Option<(T, T)>,
            pub r#in: Option<Vec<T>>,
        }

        impl<T> NumericFilter<T>
        where
            T: Into<sea_orm::Value> + Clone,
        {
            pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
                let mut condition = Condition::all();
                if let Some(v) = &self.eq {
                    condition = condition.add(column.eq(v.clone()));
                }
                if let Some(v) = &self.ne {
                    condition = condition.add(column.ne(v.clone()));
                }
                if let Some(v) = &self.gt {
                    condition = condition.add(column.gt(v.clone()));
                }
                if let Some(v) = &self.gte {
                    condition = condition.add(column.gte(v.clone()));
                }
                if let Some(v) = &self.lt {
                    condition = condition.add(column.lt(v.clone()));
                }
                if let Some(v) = &self.lte {
                    condition = condition.add(column.lte(v.clone()));
                }
                if let Some((low, high)) = &self.between {
                    condition = condition.add(column.between(low.clone(), high.clone()));
                }
                if let Some(values) = &self.r#in {
                    condition = condition.add(column.is_in(values.clone()));
                }
                condition
            }
        }

        /// Operators for string columns
        #[derive(Debug, Clone, Default, Deserialize)]
        pub struct StringFilter {
            pub eq: Option<String>,
            pub ne: Option<String>,
            pub contains: Option<String>,
            pub starts_with: Option<String>,
            pub ends_with: Option<String>,
            pub r#in: Option<Vec<String>>,
        }

        impl StringFilter {
            pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
                let mut condition = Condition::all();
                if let Some(v) = &self.eq {
                    condition = condition.add(column.eq(v.clone()));
                }
                if let Some(v) = &self.ne {
                    condition = condition.add(column.ne(v.clone()));
                }
                if let Some(v) = &self.contains {
                    condition = condition.add(column.contains(v.as_str()));
                }
                if let Some(v) = &self.starts_with {
                    condition = condition.add(column.starts_with(v.as_str()));
                }
                if let Some(v) = &self.ends_with {
                    condition = condition.add(column.ends_with(v.as_str()));
                }
                if let Some(values) = &self.r#in {
                    condition = condition.add(column.is_in(values.clone()));
                }
                condition
            }
        }

        /// Operators for date and time columns
        #[derive(Debug, Clone, Deserialize)]
        pub struct TemporalFilter<T> {
            pub eq: Option<T>,
            pub before: Option<T>,
            pub after: Option<T>,
            pub between: Option<(T, T)>,
        }

        impl<T> TemporalFilter<T>
        where
            T: Into<sea_orm::Value> + Clone,
        {
            pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
                let mut condition = Condition::all();
                if let Some(v) = &self.eq {
                    condition = condition.add(column.eq(v.clone()));
                }
                if let Some(v) = &self.before {
                    condition = condition.add(column.lt(v.clone()));
                }
                if let Some(v) = &self.after {
                    condition = condition.add(column.gt(v.clone()));
                }
                if let Some((low, high)) = &self.between {
                    condition = condition.add(column.between(low.clone(), high.clone()));
                }
                condition
            }
        }

        /// Equality filter for boolean columns
        #[derive(Debug, Clone, Default, Deserialize)]
        pub struct BoolFilter {
            pub eq: Option<bool>,
        }

        impl BoolFilter {
            pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
                let mut condition = Condition::all();
                if let Some(v) = self.eq {
                    condition = condition.add(column.eq(v));
                }
                condition
            }
        }
    }
}

/// Generate the complete support module
pub fn generate_support() -> TokenStream {
    let validation_error = generate_validation_error();
    let storage_error = generate_storage_error();
    let lifecycle_error = generate_lifecycle_error();
    let service_error = generate_service_error();
    let response_conversion = generate_response_conversion();
    let filters = generate_filter_primitives();

    quote! {
        //! Errors and filter primitives shared by every generated module
        //! @generated

        use axum::Json;
        use axum::http::StatusCode;
        use axum::response::{IntoResponse, Response};
        use sea_orm::{ColumnTrait, Condition};
        use serde::Deserialize;

        #validation_error
        #storage_error
        #lifecycle_error
        #service_error
        #response_conversion
        #filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_validation_error() {
        let code = generate_validation_error().to_string();
        assert!(code.contains("ValidationError"));
        assert!(code.contains("InvalidField"));
        assert!(code.contains("MissingRequired"));
        assert!(code.contains("validator :: ValidationErrors"));
        assert!(code.contains("fn validate_uuid"));
    }

    #[test]
    fn test_generate_service_error() {
        let code = generate_service_error().to_string();
        assert!(code.contains("ServiceError"));
        assert!(code.contains("Validation"));
        assert!(code.contains("Storage"));
        assert!(code.contains("Lifecycle"));
    }

    #[test]
    fn test_generate_response_conversion() {
        let code = generate_response_conversion().to_string();
        assert!(code.contains("IntoResponse for ServiceError"));
        assert!(code.contains("UNPROCESSABLE_ENTITY"));
        assert!(code.contains("NOT_FOUND"));
        assert!(code.contains("CONFLICT"));
    }

    #[test]
    fn test_support_module_formats() {
        let code = crate::backends::format_code(generate_support()).unwrap();
        assert!(code.starts_with("//! Errors and filter primitives"));
        assert!(code.contains("pub struct NumericFilter<T> {"));
        assert!(code.contains("pub r#in: Option<Vec<String>>,"));
        assert!(code.contains("pub enum LifecycleError {"));
    }
}
