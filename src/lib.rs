//! # mustang
//!
//! A Mustache-derived template compiler and renderer.
//!
//! A template is compiled once into a [`Generator`] tree, then rendered any
//! number of times against different [`Value`] data. Compilation validates
//! tag nesting and argument binding up front; rendering only fails on data
//! that doesn't match what the template asks for (a missing key, a format
//! specifier with no provider).
//!
//! ## Features
//!
//! - **Zero-copy tokenizing**: the lexer borrows slices of the source
//!   template; only the compiled tree itself is owned.
//! - **Standalone-line whitespace elision**: a control or comment tag alone
//!   on its own line doesn't leave a blank line behind in the output.
//! - **Custom tags**: host code registers inline or compound tag handlers
//!   through [`TagHandler`], resolved by name at compile time.
//! - **Pluggable data model**: [`PropertyResolver`] and [`FormatProvider`]
//!   are injected capabilities, not hard-coded to the crate's own [`Value`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mustang::{Compiler, Value};
//!
//! let compiler = Compiler::new();
//! let generator = compiler.compile("Hello, {{Name}}!!!").unwrap();
//! let data = Value::object([("Name", Value::from("Bob"))]);
//! assert_eq!(generator.render(&data).unwrap(), "Hello, Bob!!!");
//! ```
//!
//! ## Control Tags
//!
//! - `{{#if cond}}...{{#elif cond}}...{{#else}}...{{/if}}`, branches on
//!   truthiness (`false`, null, and empty sequences are falsy).
//! - `{{#each collection}}...{{/each}}`, renders the body once per
//!   element, with the element pushed as the current scope.
//! - `{{#with expr}}...{{/with}}`, renders the body once with `expr`
//!   pushed as the current scope.
//! - `{{#! comment }}`, produces no output.
//!
//! ## Placeholders
//!
//! `{{path}}`, `{{path,align}}`, `{{path:format}}`, a dotted path resolved
//! against the scope stack, optionally padded to `align` characters and
//! passed through a [`FormatProvider`] under `format`.
//!
//! ## Custom Tags
//!
//! ```rust
//! use mustang::{Compiler, RenderResult, TagHandler, TagParameter, Value, FormatProvider};
//! use std::sync::Arc;
//!
//! struct Shout;
//! impl TagHandler for Shout {
//!     fn has_closer(&self) -> bool {
//!         false
//!     }
//!     fn parameters(&self) -> &[TagParameter] {
//!         const PARAMS: &[TagParameter] = &[TagParameter::required("text")];
//!         PARAMS
//!     }
//!     fn get_text(&self, args: &[String], _format_provider: Option<&dyn FormatProvider>) -> RenderResult<String> {
//!         Ok(args[0].to_uppercase())
//!     }
//! }
//!
//! let mut compiler = Compiler::new();
//! compiler.register_tag("shout", Arc::new(Shout), true);
//! let generator = compiler.compile("{{#shout hi}}").unwrap();
//! assert_eq!(generator.render(&Value::Null).unwrap(), "HI");
//! ```

pub mod ast;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod renderer;
pub mod scope;
pub mod tags;
pub mod tokenizer;
pub mod value;

pub use ast::{CustomNode, IfBranch, IfNode, Node};
pub use error::{CompileError, CompileResult, RenderError, RenderResult};
pub use parser::{Compiler, CompilerConfig};
pub use renderer::{Generator, RenderConfig};
pub use scope::ScopeStack;
pub use tags::{BodyRenderer, TagHandler, TagParameter, TagRegistry};
pub use tokenizer::{tokenize, Token};
pub use value::{DefaultPropertyResolver, FormatProvider, PropertyResolver, Value};
