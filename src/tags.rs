//! Custom tag extensibility: the [`TagHandler`] trait and [`TagRegistry`]
//! that resolves user-registered tag names at compile time.
//!
//! ## Custom tags
//!
//! A custom tag is registered by name with a handler implementing
//! [`TagHandler`]. Inline tags (no closer) implement [`TagHandler::get_text`];
//! compound tags (with a body, closed by `{{/name}}`) implement
//! [`TagHandler::render_body`] instead, writing through the [`BodyRenderer`]
//! handed to them so the core's internal scope machinery never crosses the
//! trait-object boundary.
//!
//! ```rust
//! use mustang::{TagHandler, TagParameter, RenderResult};
//!
//! struct Shout;
//! impl TagHandler for Shout {
//!     fn parameters(&self) -> &[TagParameter] {
//!         &[TagParameter { name: "text", is_required: true, default_value: None, is_variadic: false }]
//!     }
//!     fn get_text(&self, args: &[String], _format_provider: Option<&dyn mustang::FormatProvider>) -> RenderResult<String> {
//!         Ok(args[0].to_uppercase())
//!     }
//! }
//! ```

use crate::error::RenderResult;
use crate::ast::Node;
use crate::value::{FormatProvider, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A declared parameter for a custom tag. Parameters bind
/// positionally: a trailing variadic parameter absorbs any remaining
/// arguments.
#[derive(Debug, Clone)]
pub struct TagParameter {
    pub name: &'static str,
    pub is_required: bool,
    pub default_value: Option<Value>,
    pub is_variadic: bool,
}

impl TagParameter {
    pub const fn required(name: &'static str) -> Self {
        TagParameter {
            name,
            is_required: true,
            default_value: None,
            is_variadic: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        TagParameter {
            name,
            is_required: false,
            default_value: None,
            is_variadic: false,
        }
    }
}

/// Capability handed to a compound custom tag so it can render its own body
/// without the core exposing its scope stack across the trait-object
/// boundary. A custom tag cannot push its own scope frame, only the
/// built-in `each`/`with` do that.
pub trait BodyRenderer {
    /// Renders `body` against the current scope and returns the text.
    fn render_to_string(&mut self, body: &[Node]) -> RenderResult<String>;

    /// Appends literal text directly to the output.
    fn write_str(&mut self, text: &str);
}

/// A user-registered tag implementation.
///
/// Implement [`get_text`](TagHandler::get_text) for an inline tag (no
/// closer); implement [`render_body`](TagHandler::render_body) for a
/// compound tag that owns a body closed by `{{/name}}`. [`has_closer`]
/// decides which one the parser expects.
pub trait TagHandler: Send + Sync {
    /// Whether `{{#name}}` opens a body that must be closed with
    /// `{{/name}}`. `false` means the tag is inline and self-contained.
    fn has_closer(&self) -> bool {
        true
    }

    /// Declared parameters, used to bind positional arguments at compile
    /// time.
    fn parameters(&self) -> &[TagParameter] {
        &[]
    }

    /// Renders an inline tag (no body) to text.
    fn get_text(
        &self,
        _args: &[String],
        _format_provider: Option<&dyn FormatProvider>,
    ) -> RenderResult<String> {
        Ok(String::new())
    }

    /// Renders a compound tag's body through `renderer`.
    fn render_body(
        &self,
        _renderer: &mut dyn BodyRenderer,
        _args: &[String],
        _body: &[Node],
    ) -> RenderResult<()> {
        Ok(())
    }

    /// Whether this tag opens a new scope for its body, the way the
    /// built-in `each`/`with` do. When `true`, the renderer resolves the
    /// tag's first bound argument as a path against the current scope and
    /// pushes it before calling [`render_body`](TagHandler::render_body),
    /// popping it on every exit path. Ignored for inline tags.
    fn is_context_sensitive(&self) -> bool {
        false
    }

    /// Restricts which tag names may open directly inside this tag's body.
    /// `None` (the default) means no restriction beyond what the rest of
    /// the registry otherwise allows; `Some(names)` rejects any other
    /// opener as `unexpected_tag`.
    fn child_tags(&self) -> Option<&[&str]> {
        None
    }
}

/// Registry of user-registered custom tags, consulted by the compiler
/// whenever it sees a tag name that isn't one of the built-ins (`if`,
/// `elif`, `else`, `each`, `with`, `#!`).
#[derive(Default)]
pub struct TagRegistry {
    handlers: HashMap<String, Arc<dyn TagHandler>>,
    top_level: HashSet<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`. `is_top_level` controls whether the
    /// tag may appear at the template root, as opposed to only nested inside
    /// another compound tag's body.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn TagHandler>, is_top_level: bool) {
        let name = name.into();
        if is_top_level {
            self.top_level.insert(name.clone());
        }
        self.handlers.insert(name, handler);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn TagHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Whether `name` is any tag known to the compiler: a built-in control
    /// tag or a registered custom tag.
    pub fn is_known(&self, name: &str) -> bool {
        is_builtin(name) || self.handlers.contains_key(name)
    }

    /// Whether `name` may appear at the template root. Built-in `if`/`each`/
    /// `with` always may; a custom tag must have been registered with
    /// `is_top_level = true`.
    pub fn is_top_level(&self, name: &str) -> bool {
        matches!(name, "if" | "each" | "with") || self.top_level.contains(name)
    }
}

/// Whether `name` names one of the built-in control tags (`if`/`elif`/
/// `else`/`each`/`with`/`#!`), as opposed to a custom tag.
pub fn is_builtin(name: &str) -> bool {
    matches!(name, "if" | "elif" | "else" | "each" | "with" | "#!")
}
