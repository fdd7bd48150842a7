//! Tag-driven grammar: consumes tokens into a tree of [`Node`]s.
//!
//! The parser maintains a stack of open tag frames. `if` is the one
//! built-in with subsections: `elif`/`else` don't push a frame of their
//! own, they append a new branch to whatever `If` frame is on top of the
//! stack. Every other opener (`each`, `with`, a custom compound tag) pushes
//! a frame that collects its own body until the matching closer.
//!
//! Standalone-line elision runs once, on the raw token stream,
//! before any of this, see [`crate::tokenizer::elide_standalone_lines`].
//! By the time this module sees a token stream, whitespace rewriting is
//! already done and every [`Token::Literal`] that reaches [`Node::Static`]
//! is final.

use std::sync::Arc;

use crate::ast::{CustomNode, IfBranch, IfNode, Node};
use crate::error::{CompileError, CompileResult};
use crate::renderer::{Generator, RenderConfig};
use crate::tags::{TagHandler, TagParameter, TagRegistry};
use crate::tokenizer::{elide_standalone_lines, tokenize, Token};

/// Bounds `if`/`each`/`with`/custom-tag nesting to guard against stack
/// overflow on adversarial input.
const MAX_NESTING_DEPTH: usize = 64;

/// Compile-time knobs.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Maximum allowed frame nesting depth.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { max_depth: MAX_NESTING_DEPTH }
    }
}

const IF_PARAMS: &[TagParameter] = &[TagParameter::required("cond")];
const EACH_PARAMS: &[TagParameter] = &[TagParameter::required("collection")];
const WITH_PARAMS: &[TagParameter] = &[TagParameter::required("expr")];
const ELSE_PARAMS: &[TagParameter] = &[];

/// One entry on the parser's frame stack. The root frame is synthetic: its
/// accepted children are "all registered openers plus key placeholders."
enum Frame {
    Root(Vec<Node>),
    If { branches: Vec<(Option<String>, Vec<Node>)>, has_else: bool },
    Each { collection: String, children: Vec<Node> },
    With { expr: String, children: Vec<Node> },
    Custom { name: String, args: Vec<String>, handler: Arc<dyn TagHandler>, children: Vec<Node> },
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::Root(children) => children,
            Frame::If { branches, .. } => {
                &mut branches.last_mut().expect("an if frame always has at least its initial branch").1
            }
            Frame::Each { children, .. } => children,
            Frame::With { children, .. } => children,
            Frame::Custom { children, .. } => children,
        }
    }

    /// The tag name this frame closes under, for matching against
    /// `{{/name}}` and for `unterminated_tag` diagnostics. Empty for root,
    /// which never appears in a close check (nothing can close the root).
    fn tag_name(&self) -> &str {
        match self {
            Frame::Root(_) => "",
            Frame::If { .. } => "if",
            Frame::Each { .. } => "each",
            Frame::With { .. } => "with",
            Frame::Custom { name, .. } => name,
        }
    }
}

/// Binds positional `raw_args` to `params`: missing required
/// arguments and excess arguments beyond a trailing non-variadic parameter
/// are both `bad_arguments` errors; missing optional arguments fall back to
/// the parameter's default, rendered to text.
fn bind_args(tag_name: &str, params: &[TagParameter], raw_args: &[&str]) -> CompileResult<Vec<String>> {
    let mut bound = Vec::with_capacity(params.len());
    let mut idx = 0;

    for param in params {
        if param.is_variadic {
            bound.extend(raw_args[idx..].iter().map(|a| a.to_string()));
            idx = raw_args.len();
            continue;
        }
        if idx < raw_args.len() {
            bound.push(raw_args[idx].to_string());
            idx += 1;
        } else if param.is_required {
            return Err(CompileError::BadArguments {
                name: tag_name.to_string(),
                message: format!("missing required argument `{}`", param.name),
            });
        } else {
            bound.push(param.default_value.as_ref().map(|v| v.to_string()).unwrap_or_default());
        }
    }

    if idx < raw_args.len() {
        return Err(CompileError::BadArguments {
            name: tag_name.to_string(),
            message: format!("expected at most {} argument(s), got {}", params.len(), raw_args.len()),
        });
    }

    Ok(bound)
}

fn check_depth(stack: &[Frame], config: &CompilerConfig) -> CompileResult<()> {
    if stack.len() >= config.max_depth {
        return Err(CompileError::Generic {
            message: format!("maximum nesting depth ({}) exceeded", config.max_depth).into(),
        });
    }
    Ok(())
}

/// Parses a template into a tree of [`Node`]s.
///
/// Holds the tag registry and compile-time configuration; stateless beyond
/// that, so a single `Compiler` may compile many templates. Compiled
/// [`Generator`]s carry their own copy of the render configuration and
/// don't borrow back into the `Compiler` that made them.
pub struct Compiler {
    registry: TagRegistry,
    config: CompilerConfig,
    render_config: RenderConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// A fresh compiler pre-populated with the built-in tag registry
    /// (`if`/`elif`/`else`/`each`/`with`/`#!` are always known; no explicit
    /// registration step is needed for them).
    pub fn new() -> Self {
        Self {
            registry: TagRegistry::new(),
            config: CompilerConfig::default(),
            render_config: RenderConfig::default(),
        }
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { registry: TagRegistry::new(), config, render_config: RenderConfig::default() }
    }

    /// Attaches a render-time configuration (format-provider strictness)
    /// to every [`Generator`] this compiler produces.
    pub fn with_render_config(mut self, render_config: RenderConfig) -> Self {
        self.render_config = render_config;
        self
    }

    /// Installs a user tag definition. `is_top_level` controls
    /// whether `name` may appear at the template root as opposed to only
    /// nested inside another compound tag's body. Re-registration replaces
    /// the prior definition.
    pub fn register_tag(&mut self, name: impl Into<String>, handler: Arc<dyn TagHandler>, is_top_level: bool) {
        self.registry.register(name, handler, is_top_level);
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Compiles `template`, failing with `null_template` if absent.
    pub fn compile_opt(&self, template: Option<&str>) -> CompileResult<Generator> {
        let template = template.ok_or(CompileError::NullTemplate)?;
        self.compile(template)
    }

    /// Parses and builds the generator tree.
    pub fn compile(&self, template: &str) -> CompileResult<Generator> {
        log::trace!("compiling template of {} bytes", template.len());
        let tokens = elide_standalone_lines(tokenize(template));
        let mut stack: Vec<Frame> = vec![Frame::Root(Vec::new())];

        for token in tokens {
            match token {
                Token::Eof => break,
                Token::Literal(text) => {
                    stack.last_mut().unwrap().children_mut().push(Node::Static(text.to_string()));
                }
                Token::Comment(_) => {
                    // Produces no node at all, standalone or not.
                }
                Token::Placeholder { path, alignment, format } => {
                    stack.last_mut().unwrap().children_mut().push(Node::Placeholder {
                        path: path.to_string(),
                        alignment,
                        format: format.map(|f| f.to_string()),
                    });
                }
                Token::Open { name, args } => self.handle_open(&mut stack, name, args)?,
                Token::Close { name } => self.handle_close(&mut stack, name)?,
            }
        }

        if stack.len() > 1 {
            let name = stack.last().unwrap().tag_name().to_string();
            log::warn!("unterminated tag [{name}] at end of template");
            return Err(CompileError::UnterminatedTag { name });
        }

        let Frame::Root(root) = stack.pop().expect("root frame always present") else {
            unreachable!("only the root frame remains after the loop");
        };
        Ok(Generator::new(root, self.render_config.clone()))
    }

    fn handle_open(&self, stack: &mut Vec<Frame>, name: &str, args: Vec<&str>) -> CompileResult<()> {
        if let Some(Frame::Custom { handler, .. }) = stack.last() {
            if let Some(allowed) = handler.child_tags() {
                if !allowed.contains(&name) {
                    return Err(CompileError::UnexpectedTag { name: name.to_string() });
                }
            }
        }
        match name {
            "elif" | "else" => {
                let Some(Frame::If { branches, has_else }) = stack.last_mut() else {
                    return Err(CompileError::UnexpectedTag { name: name.to_string() });
                };
                if *has_else {
                    return Err(if name == "else" {
                        CompileError::DuplicateElse
                    } else {
                        CompileError::UnexpectedTag { name: name.to_string() }
                    });
                }
                if name == "else" {
                    bind_args("else", ELSE_PARAMS, &args)?;
                    branches.push((None, Vec::new()));
                    *has_else = true;
                } else {
                    let bound = bind_args("elif", IF_PARAMS, &args)?;
                    branches.push((Some(bound.into_iter().next().unwrap()), Vec::new()));
                }
                Ok(())
            }
            "if" => {
                check_depth(stack, &self.config)?;
                let bound = bind_args("if", IF_PARAMS, &args)?;
                stack.push(Frame::If {
                    branches: vec![(Some(bound.into_iter().next().unwrap()), Vec::new())],
                    has_else: false,
                });
                Ok(())
            }
            "each" => {
                check_depth(stack, &self.config)?;
                let bound = bind_args("each", EACH_PARAMS, &args)?;
                stack.push(Frame::Each { collection: bound.into_iter().next().unwrap(), children: Vec::new() });
                Ok(())
            }
            "with" => {
                check_depth(stack, &self.config)?;
                let bound = bind_args("with", WITH_PARAMS, &args)?;
                stack.push(Frame::With { expr: bound.into_iter().next().unwrap(), children: Vec::new() });
                Ok(())
            }
            _ => self.handle_custom_open(stack, name, args),
        }
    }

    fn handle_custom_open(&self, stack: &mut Vec<Frame>, name: &str, args: Vec<&str>) -> CompileResult<()> {
        if !self.registry.is_known(name) {
            return Err(CompileError::UnknownTag { name: name.to_string() });
        }
        let at_root = stack.len() == 1;
        if at_root && !self.registry.is_top_level(name) {
            return Err(CompileError::UnexpectedTag { name: name.to_string() });
        }
        let handler = self.registry.resolve(name).expect("is_known guarantees a custom handler here");
        let bound = bind_args(name, handler.parameters(), &args)?;

        if handler.has_closer() {
            check_depth(stack, &self.config)?;
            stack.push(Frame::Custom { name: name.to_string(), args: bound, handler, children: Vec::new() });
        } else {
            let node = Node::Custom(CustomNode { name: name.to_string(), args: bound, body: None, handler });
            stack.last_mut().unwrap().children_mut().push(node);
        }
        Ok(())
    }

    fn handle_close(&self, stack: &mut Vec<Frame>, name: &str) -> CompileResult<()> {
        if stack.len() <= 1 || stack.last().unwrap().tag_name() != name {
            return Err(CompileError::UnmatchedClose { name: name.to_string() });
        }
        let frame = stack.pop().unwrap();
        let node = match frame {
            Frame::If { branches, .. } => Node::If(IfNode {
                branches: branches
                    .into_iter()
                    .map(|(condition, body)| IfBranch { condition, body })
                    .collect(),
            }),
            Frame::Each { collection, children } => Node::Each { collection, body: children },
            Frame::With { expr, children } => Node::With { expr, body: children },
            Frame::Custom { name, args, handler, children } => {
                Node::Custom(CustomNode { name, args, body: Some(children), handler })
            }
            Frame::Root(_) => unreachable!("root is never matched by a close tag"),
        };
        stack.last_mut().unwrap().children_mut().push(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagHandler;
    use crate::value::FormatProvider;

    fn compile(template: &str) -> Generator {
        Compiler::new().compile(template).unwrap_or_else(|e| panic!("compile failed: {e}"))
    }

    #[test]
    fn plain_literal_has_a_single_static_node() {
        let gen = compile("Hello, World!");
        assert_eq!(gen.root().len(), 1);
        assert!(matches!(gen.root()[0], Node::Static(ref s) if s == "Hello, World!"));
    }

    #[test]
    fn placeholder_is_parsed_with_alignment_and_format() {
        let gen = compile("{{When,-10:yyyyMMdd}}");
        match &gen.root()[0] {
            Node::Placeholder { path, alignment, format } => {
                assert_eq!(path, "When");
                assert_eq!(*alignment, -10);
                assert_eq!(format.as_deref(), Some("yyyyMMdd"));
            }
            other => panic!("expected a placeholder, got {other:?}"),
        }
    }

    #[test]
    fn if_elif_else_becomes_one_if_node_with_three_branches() {
        let gen = compile("{{#if First}}A{{#elif Second}}B{{#else}}C{{/if}}");
        let Node::If(if_node) = &gen.root()[0] else { panic!("expected an if node") };
        assert_eq!(if_node.branches.len(), 3);
        assert_eq!(if_node.branches[0].condition.as_deref(), Some("First"));
        assert_eq!(if_node.branches[1].condition.as_deref(), Some("Second"));
        assert_eq!(if_node.branches[2].condition, None);
    }

    #[test]
    fn duplicate_else_is_a_compile_error() {
        let err = Compiler::new().compile("{{#if x}}{{#else}}{{#else}}{{/if}}").unwrap_err();
        assert_eq!(err, CompileError::DuplicateElse);
    }

    #[test]
    fn elif_after_else_is_unexpected() {
        let err = Compiler::new().compile("{{#if x}}{{#else}}{{#elif y}}{{/if}}").unwrap_err();
        assert_eq!(err, CompileError::UnexpectedTag { name: "elif".to_string() });
    }

    #[test]
    fn elif_outside_if_is_unexpected() {
        let err = Compiler::new().compile("{{#elif x}}").unwrap_err();
        assert_eq!(err, CompileError::UnexpectedTag { name: "elif".to_string() });
    }

    #[test]
    fn each_and_with_parse_to_their_nodes() {
        let gen = compile("{{#each items}}{{this}}{{/each}}{{#with user}}{{name}}{{/with}}");
        assert!(matches!(&gen.root()[0], Node::Each { collection, .. } if collection == "items"));
        assert!(matches!(&gen.root()[1], Node::With { expr, .. } if expr == "user"));
    }

    #[test]
    fn unknown_tag_is_a_compile_error() {
        let err = Compiler::new().compile("{{#bogus a}}{{/bogus}}").unwrap_err();
        assert_eq!(err, CompileError::UnknownTag { name: "bogus".to_string() });
    }

    #[test]
    fn unmatched_close_is_a_compile_error() {
        let err = Compiler::new().compile("{{/if}}").unwrap_err();
        assert_eq!(err, CompileError::UnmatchedClose { name: "if".to_string() });
    }

    #[test]
    fn unterminated_tag_is_a_compile_error() {
        let err = Compiler::new().compile("{{#if x}}no closer").unwrap_err();
        assert_eq!(err, CompileError::UnterminatedTag { name: "if".to_string() });
    }

    #[test]
    fn mismatched_close_name_is_unmatched_close() {
        let err = Compiler::new().compile("{{#if x}}{{#each y}}{{/if}}{{/each}}").unwrap_err();
        assert_eq!(err, CompileError::UnmatchedClose { name: "if".to_string() });
    }

    #[test]
    fn missing_required_if_condition_is_bad_arguments() {
        let err = Compiler::new().compile("{{#if}}{{/if}}").unwrap_err();
        assert!(matches!(err, CompileError::BadArguments { name, .. } if name == "if"));
    }

    #[test]
    fn null_template_is_rejected_before_compiling() {
        let err = Compiler::new().compile_opt(None).unwrap_err();
        assert_eq!(err, CompileError::NullTemplate);
    }

    struct Shout;
    impl TagHandler for Shout {
        fn has_closer(&self) -> bool {
            false
        }
        fn parameters(&self) -> &[TagParameter] {
            const PARAMS: &[TagParameter] = &[TagParameter::required("text")];
            PARAMS
        }
        fn get_text(&self, args: &[String], _format_provider: Option<&dyn FormatProvider>) -> crate::error::RenderResult<String> {
            Ok(args[0].to_uppercase())
        }
    }

    #[test]
    fn custom_inline_tag_compiles_to_a_custom_node_with_no_body() {
        let mut compiler = Compiler::new();
        compiler.register_tag("shout", Arc::new(Shout), true);
        let gen = compiler.compile("{{#shout hi}}").unwrap();
        match &gen.root()[0] {
            Node::Custom(n) => {
                assert_eq!(n.name, "shout");
                assert_eq!(n.args, vec!["hi".to_string()]);
                assert!(n.body.is_none());
            }
            other => panic!("expected a custom node, got {other:?}"),
        }
    }

    #[test]
    fn non_top_level_custom_tag_is_unexpected_at_root() {
        let mut compiler = Compiler::new();
        compiler.register_tag("shout", Arc::new(Shout), false);
        let err = compiler.compile("{{#shout hi}}").unwrap_err();
        assert_eq!(err, CompileError::UnexpectedTag { name: "shout".to_string() });
    }

    struct Table;
    impl TagHandler for Table {
        fn parameters(&self) -> &[TagParameter] {
            &[]
        }
        fn child_tags(&self) -> Option<&[&str]> {
            const ALLOWED: &[&str] = &["row"];
            Some(ALLOWED)
        }
    }

    #[test]
    fn child_tags_restriction_accepts_a_listed_child() {
        let mut compiler = Compiler::new();
        compiler.register_tag("table", Arc::new(Table), true);
        compiler.register_tag("row", Arc::new(Shout), false);
        let gen = compiler.compile("{{#table}}{{#row hi}}{{/table}}").unwrap();
        let Node::Custom(table) = &gen.root()[0] else { panic!("expected a custom node") };
        let body = table.body.as_ref().unwrap();
        assert!(matches!(&body[0], Node::Custom(n) if n.name == "row"));
    }

    #[test]
    fn child_tags_restriction_rejects_an_unlisted_child() {
        let mut compiler = Compiler::new();
        compiler.register_tag("table", Arc::new(Table), true);
        let err = compiler.compile("{{#table}}{{#if x}}{{/if}}{{/table}}").unwrap_err();
        assert_eq!(err, CompileError::UnexpectedTag { name: "if".to_string() });
    }

    #[test]
    fn custom_tag_nests_fine_inside_each_body_regardless_of_top_level_flag() {
        let mut compiler = Compiler::new();
        compiler.register_tag("shout", Arc::new(Shout), false);
        let gen = compiler.compile("{{#each items}}{{#shout hi}}{{/each}}").unwrap();
        let Node::Each { body, .. } = &gen.root()[0] else { panic!("expected each") };
        assert!(matches!(&body[0], Node::Custom(n) if n.name == "shout"));
    }
}
