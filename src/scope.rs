//! The scope stack that backs dotted-path resolution.

use crate::error::{RenderError, RenderResult};
use crate::value::{PropertyResolver, Value};

/// A stack of nested scopes, innermost last. `each`/`with` push a frame for
/// the duration of their body; everything else resolves against whatever is
/// currently on top, falling back outward on a miss.
pub struct ScopeStack<'a> {
    frames: Vec<&'a Value>,
}

impl<'a> ScopeStack<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, value: &'a Value) {
        self.frames.push(value);
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn current(&self) -> &'a Value {
        self.frames.last().copied().expect("root frame is never popped")
    }

    /// Resolves a dotted path against the stack.
    ///
    /// `this` always resolves to the current scope, even if it's null. For
    /// any other path, the first segment is probed against each frame from
    /// innermost to outermost; the first frame that resolves it becomes the
    /// anchor, and remaining segments drill strictly downward from there.
    /// A miss at any point, including drilling into a value the resolver
    /// can't descend into, is `RenderError::KeyNotFound`.
    pub fn resolve(&self, path: &str, resolver: &dyn PropertyResolver) -> RenderResult<&'a Value> {
        if path == "this" {
            return Ok(self.current());
        }

        let mut segments = path.split('.');
        let first = segments.next().unwrap_or(path);

        let anchor = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| resolver.resolve(frame, first));

        let mut current = anchor.ok_or_else(|| RenderError::KeyNotFound { path: path.to_string() })?;
        for segment in segments {
            current = resolver
                .resolve(current, segment)
                .ok_or_else(|| RenderError::KeyNotFound { path: path.to_string() })?;
        }
        Ok(current)
    }
}
