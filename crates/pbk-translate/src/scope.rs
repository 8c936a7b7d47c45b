//! Lexical scopes for locals.
//!
//! Every pushed frame starts as a copy of its parent, so declarations made
//! inside a block never leak to the parent or to sibling blocks. Kernel-level
//! names (parameters, constants, ...) are not stored here; the context
//! consults its symbol table when a name is not a local.

use indexmap::{IndexMap, IndexSet};
use pbk_ast::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    Variable,
    Constant,
    Argument,
    /// Macro parameter bound while probing or re-typing a macro body.
    MacroParam,
}

impl LocalKind {
    pub fn is_assignable(self) -> bool {
        matches!(self, LocalKind::Variable | LocalKind::Argument)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    /// Name in the output, after renaming.
    pub zig: String,
    pub ty: Type,
    pub kind: LocalKind,
    /// Index into the per-function usage table.
    pub slot: usize,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    locals: IndexMap<String, Local>,
    /// Output names in use, including temporaries.
    taken: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push(&mut self) {
        let top = self.frames.last().cloned().unwrap_or_default();
        self.frames.push(top);
    }

    /// The root frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn top(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn lookup(&self, name: &str) -> Option<&Local> {
        self.frames.last().and_then(|frame| frame.locals.get(name))
    }

    pub fn declare(&mut self, name: &str, local: Local) {
        let frame = self.top();
        frame.taken.insert(local.zig.clone());
        frame.locals.insert(name.to_string(), local);
    }

    /// Claim an output name that has no source name (temporaries).
    pub fn take(&mut self, zig: &str) {
        self.top().taken.insert(zig.to_string());
    }

    pub fn is_taken(&self, zig: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.taken.contains(zig))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(zig: &str, slot: usize) -> Local {
        Local {
            zig: zig.to_string(),
            ty: Type::Float,
            kind: LocalKind::Variable,
            slot,
        }
    }

    #[test]
    fn test_inner_declarations_do_not_leak() {
        let mut scope = ScopeStack::new();
        scope.declare("a", local("a", 0));
        scope.push();
        scope.declare("b", local("b", 1));
        assert!(scope.lookup("a").is_some());
        assert!(scope.lookup("b").is_some());
        scope.pop();
        assert!(scope.lookup("b").is_none());
        assert!(!scope.is_taken("b"));
    }

    #[test]
    fn test_shadowing_is_local_to_the_block() {
        let mut scope = ScopeStack::new();
        scope.declare("x", local("x", 0));
        scope.push();
        scope.declare("x", local("x_1", 1));
        assert_eq!(scope.lookup("x").unwrap().zig, "x_1");
        scope.pop();
        assert_eq!(scope.lookup("x").unwrap().zig, "x");
    }

    #[test]
    fn test_root_frame_survives_extra_pops() {
        let mut scope = ScopeStack::new();
        scope.take("tmp_1");
        scope.pop();
        scope.pop();
        assert!(scope.is_taken("tmp_1"));
        scope.push();
        scope.pop();
        assert!(scope.is_taken("tmp_1"));
    }
}
