//! Error types for the template compiler and renderer.
//!
//! This module defines the error taxonomy using `thiserror` for zero-overhead,
//! typed errors. Compile-time errors (`CompileError`) abort `Compiler::compile`;
//! runtime errors (`RenderError`) abort `Generator::render`. Neither is
//! recoverable mid-walk.

use std::borrow::Cow;
use thiserror::Error;

/// Errors that can occur while compiling a template into a [`crate::Generator`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CompileError {
    /// The supplied template was absent (see [`crate::Compiler::compile_opt`]).
    #[error("template is null")]
    NullTemplate,

    /// A tag name is not registered with the compiler.
    #[error("unknown tag: {name}")]
    UnknownTag { name: String },

    /// A tag is not permitted in the context it appeared in.
    #[error("tag [{name}] is not permitted in this context")]
    UnexpectedTag { name: String },

    /// A closing tag was found without a matching, currently-open opener.
    #[error("unmatched closing tag: {{{{/{name}}}}}")]
    UnmatchedClose { name: String },

    /// End of template reached with a frame still open.
    #[error("unterminated tag: {{{{#{name}}}}}")]
    UnterminatedTag { name: String },

    /// A second `else` subsection was found inside one `if`.
    #[error("duplicate else in one if")]
    DuplicateElse,

    /// Missing required argument, excess arguments, or malformed argument syntax.
    #[error("bad arguments for [{name}]: {message}")]
    BadArguments { name: String, message: String },

    /// Catch-all for parse failures that don't fit the named kinds above.
    #[error("compile error: {message}")]
    Generic { message: Cow<'static, str> },
}

/// Errors that can occur while rendering a compiled [`crate::Generator`].
#[derive(Debug, Error, PartialEq, Clone)]
pub enum RenderError {
    /// Runtime path resolution failure: a bare key or dotted path could not
    /// be resolved against the scope stack.
    #[error("key not found: {path}")]
    KeyNotFound { path: String },

    /// A placeholder carried a format specifier but no [`crate::FormatProvider`]
    /// was supplied (and [`crate::RenderConfig::strict_format`] is `true`).
    #[error("no format provider available for format {format:?} ({path})")]
    FormatProviderMissing { path: String, format: String },

    /// Catch-all for render failures that don't fit the named kinds above.
    #[error("render error: {message}")]
    Generic { message: Cow<'static, str> },
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
