//! Error types for model resolution and code generation
//!
//! This module contains error types used across the parser, the resolver and
//! all code generators.

/// Error type for a generation run
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The source document contains no class declarations at all
    #[error("source document contains no class declarations")]
    EmptyDocument,

    /// The requested target flavor is not known
    #[error("unknown flavor: {0}")]
    UnknownFlavor(String),

    /// A configuration parameter could not be understood
    #[error("invalid configuration parameter: {0}")]
    InvalidParameter(String),

    /// Strict parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Code generation failed
    #[error("code generation error: {0}")]
    CodeGenError(String),
}

impl From<String> for GeneratorError {
    fn from(s: String) -> Self {
        GeneratorError::CodeGenError(s)
    }
}

/// A malformed class block, field line or relationship line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line where the problem was detected
    pub line: usize,
    /// Class block the error belongs to, if any
    pub class: Option<String>,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    /// Create a parse error that is not attached to a class
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            class: None,
            message: message.into(),
        }
    }

    /// Attach the error to a class block
    pub fn in_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

/// A relationship whose endpoint names a class absent from the document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: relationship {left} -- {right} references unknown class '{missing}'")]
pub struct DanglingReferenceError {
    /// Left-hand class as written
    pub left: String,
    /// Right-hand class as written
    pub right: String,
    /// The endpoint that could not be found
    pub missing: String,
    /// 1-based line of the relationship declaration
    pub line: usize,
}
