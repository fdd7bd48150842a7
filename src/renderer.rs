//! Tree-walking renderer: turns a compiled [`Generator`] plus a data value
//! into output text.

use crate::ast::{CustomNode, IfNode, Node};
use crate::error::{RenderError, RenderResult};
use crate::formatter::format_value;
use crate::scope::ScopeStack;
use crate::tags::BodyRenderer;
use crate::value::{DefaultPropertyResolver, FormatProvider, PropertyResolver, Value};

/// Render-time knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Whether a placeholder with a format specifier but no supplied
    /// [`FormatProvider`] is a hard error (`true`, the default) or falls
    /// back to the value's natural string form.
    pub strict_format: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { strict_format: true }
    }
}

/// A compiled template, ready to render against any number of data values.
/// Immutable after [`crate::Compiler::compile`] produces it; safe to
/// share across threads and render concurrently against independent data.
pub struct Generator {
    root: Vec<Node>,
    config: RenderConfig,
}

impl Generator {
    pub(crate) fn new(root: Vec<Node>, config: RenderConfig) -> Self {
        Self { root, config }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &[Node] {
        &self.root
    }

    /// Renders against `data` with the crate's own [`DefaultPropertyResolver`]
    /// and no format provider.
    pub fn render(&self, data: &Value) -> RenderResult<String> {
        self.render_full(data, &DefaultPropertyResolver, None)
    }

    /// Renders against `data` with a supplied format provider.
    pub fn render_with(&self, data: &Value, format_provider: &dyn FormatProvider) -> RenderResult<String> {
        self.render_full(data, &DefaultPropertyResolver, Some(format_provider))
    }

    /// Renders against `data` resolved through a host-supplied
    /// [`PropertyResolver`], with no format provider.
    pub fn render_with_resolver(&self, data: &Value, resolver: &dyn PropertyResolver) -> RenderResult<String> {
        self.render_full(data, resolver, None)
    }

    /// Renders with every capability supplied explicitly.
    pub fn render_full(
        &self,
        data: &Value,
        resolver: &dyn PropertyResolver,
        format_provider: Option<&dyn FormatProvider>,
    ) -> RenderResult<String> {
        let mut ctx = RenderCtx {
            scope: ScopeStack::new(data),
            resolver,
            format_provider,
            config: &self.config,
        };
        let mut out = String::new();
        if let Err(err) = ctx.render_nodes(&self.root, &mut out) {
            log::warn!("render failed: {err}");
            return Err(err);
        }
        Ok(out)
    }
}

/// Threads the capabilities a render needs through the recursive tree walk
/// without re-deriving them at every call site.
struct RenderCtx<'a> {
    scope: ScopeStack<'a>,
    resolver: &'a dyn PropertyResolver,
    format_provider: Option<&'a dyn FormatProvider>,
    config: &'a RenderConfig,
}

impl<'a> RenderCtx<'a> {
    fn render_nodes(&mut self, nodes: &[Node], out: &mut String) -> RenderResult<()> {
        for node in nodes {
            self.render_node(node, out)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node, out: &mut String) -> RenderResult<()> {
        match node {
            Node::Static(text) => {
                out.push_str(text);
                Ok(())
            }
            Node::Placeholder { path, alignment, format } => {
                let value = self.scope.resolve(path, self.resolver)?;
                if value.is_null() {
                    return Ok(());
                }
                let text = format_value(value, *alignment, format.as_deref(), self.format_provider, self.config)?;
                out.push_str(&text);
                Ok(())
            }
            Node::If(if_node) => self.render_if(if_node, out),
            Node::Each { collection, body } => self.render_each(collection, body, out),
            Node::With { expr, body } => self.render_with(expr, body, out),
            Node::Custom(custom) => self.render_custom(custom, out),
        }
    }

    fn render_if(&mut self, if_node: &IfNode, out: &mut String) -> RenderResult<()> {
        for branch in &if_node.branches {
            let taken = match &branch.condition {
                Some(expr) => self.scope.resolve(expr, self.resolver)?.is_truthy(),
                None => true,
            };
            if taken {
                return self.render_nodes(&branch.body, out);
            }
        }
        Ok(())
    }

    fn render_each(&mut self, collection: &str, body: &[Node], out: &mut String) -> RenderResult<()> {
        let value = self.scope.resolve(collection, self.resolver)?;
        let items: &[Value] = match value {
            Value::Sequence(items) => items,
            _ => {
                return Err(RenderError::Generic {
                    message: format!("`each {collection}` requires a sequence").into(),
                })
            }
        };
        for item in items {
            self.scope.push(item);
            let result = self.render_nodes(body, out);
            self.scope.pop();
            result?;
        }
        Ok(())
    }

    fn render_with(&mut self, expr: &str, body: &[Node], out: &mut String) -> RenderResult<()> {
        let value = self.scope.resolve(expr, self.resolver)?;
        self.scope.push(value);
        let result = self.render_nodes(body, out);
        self.scope.pop();
        result
    }

    fn render_custom(&mut self, custom: &CustomNode, out: &mut String) -> RenderResult<()> {
        match &custom.body {
            None => {
                let text = custom.handler.get_text(&custom.args, self.format_provider)?;
                out.push_str(&text);
                Ok(())
            }
            Some(body) => {
                if custom.handler.is_context_sensitive() {
                    let Some(first_arg) = custom.args.first() else {
                        return self.render_custom_body(custom, body, out);
                    };
                    let value = self.scope.resolve(first_arg, self.resolver)?;
                    self.scope.push(value);
                    let result = self.render_custom_body(custom, body, out);
                    self.scope.pop();
                    result
                } else {
                    self.render_custom_body(custom, body, out)
                }
            }
        }
    }

    fn render_custom_body(&mut self, custom: &CustomNode, body: &[Node], out: &mut String) -> RenderResult<()> {
        let mut body_renderer = BodyRendererImpl { ctx: self, out: String::new() };
        custom.handler.render_body(&mut body_renderer, &custom.args, body)?;
        out.push_str(&body_renderer.out);
        Ok(())
    }
}

/// Bridges a [`TagHandler::render_body`](crate::TagHandler::render_body)
/// implementation back into the core's scope machinery without exposing
/// `RenderCtx` itself across the trait-object boundary.
struct BodyRendererImpl<'ctx, 'a> {
    ctx: &'ctx mut RenderCtx<'a>,
    out: String,
}

impl<'ctx, 'a> BodyRenderer for BodyRendererImpl<'ctx, 'a> {
    fn render_to_string(&mut self, body: &[Node]) -> RenderResult<String> {
        let mut buf = String::new();
        self.ctx.render_nodes(body, &mut buf)?;
        Ok(buf)
    }

    fn write_str(&mut self, text: &str) {
        self.out.push_str(text);
    }
}
