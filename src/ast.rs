//! The compiled template tree.
//!
//! Unlike the tokenizer's zero-copy `Token<'a>`, nodes are owned: a compiled
//! [`crate::Generator`] must outlive the source template string, so the tree
//! it walks cannot borrow from it.

use crate::tags::TagHandler;
use std::fmt;
use std::sync::Arc;

/// A node in the compiled template tree.
pub enum Node {
    /// Literal text, copied through to the output unchanged.
    Static(String),

    /// A key placeholder: `{{path}}`, `{{path,align}}`, `{{path:format}}`.
    Placeholder {
        path: String,
        alignment: i32,
        format: Option<String>,
    },

    /// An `if`/`elif`/`else` chain.
    If(IfNode),

    /// `{{#each collection}}...{{/each}}`: iterates a sequence,
    /// rendering the body once per item with the item pushed as scope.
    Each { collection: String, body: Vec<Node> },

    /// `{{#with expr}}...{{/with}}`: renders the body once,
    /// unconditionally, with `expr` pushed as scope.
    With { expr: String, body: Vec<Node> },

    /// A user-registered custom tag, inline or compound.
    Custom(CustomNode),
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Static(s) => f.debug_tuple("Static").field(s).finish(),
            Node::Placeholder { path, alignment, format } => f
                .debug_struct("Placeholder")
                .field("path", path)
                .field("alignment", alignment)
                .field("format", format)
                .finish(),
            Node::If(n) => f.debug_tuple("If").field(n).finish(),
            Node::Each { collection, body } => f
                .debug_struct("Each")
                .field("collection", collection)
                .field("body", body)
                .finish(),
            Node::With { expr, body } => f
                .debug_struct("With")
                .field("expr", expr)
                .field("body", body)
                .finish(),
            Node::Custom(n) => f.debug_tuple("Custom").field(&n.name).finish(),
        }
    }
}

/// An `if` node: an ordered list of branches, evaluated in order. The final
/// branch may be an unconditional `else` (`condition: None`).
#[derive(Debug)]
pub struct IfNode {
    pub branches: Vec<IfBranch>,
}

#[derive(Debug)]
pub struct IfBranch {
    /// `None` only for the trailing `else` branch.
    pub condition: Option<String>,
    pub body: Vec<Node>,
}

/// A compiled custom tag invocation. `body` is `None` for an inline tag
/// (`handler.has_closer() == false`) and `Some` for a compound tag.
pub struct CustomNode {
    pub name: String,
    pub args: Vec<String>,
    pub body: Option<Vec<Node>>,
    pub handler: Arc<dyn TagHandler>,
}
