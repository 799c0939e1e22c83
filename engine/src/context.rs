use indexmap::IndexMap;

use crate::error::Result;

/// Control-flow escape signal raised by break/continue statements and
/// consumed by the nearest enclosing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    #[default]
    None,
    Break,
    Continue,
}

/// A single context level, opened for a loop or branch body.
#[derive(Debug, Clone)]
pub struct Scope<V> {
    variables: IndexMap<String, V>,
    escape: EscapeMode,
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Scope {
            variables: IndexMap::new(),
            escape: EscapeMode::None,
        }
    }
}

impl<V> Scope<V> {
    pub fn get_variable(&self, name: &str) -> Option<&V> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: V) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variables(&self) -> &IndexMap<String, V> {
        &self.variables
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.escape
    }
}

/// The scope chain shared by interpretation (`V = RuntimeValue`) and
/// generation (`V = Expr`).
///
/// The chain is a stack: index 0 is the root context, the last entry is the
/// current one, and each entry's parent is the entry below it. Lookups only
/// ever consult the current context and the root, never the levels between.
#[derive(Debug, Clone)]
pub struct Context<V> {
    scopes: Vec<Scope<V>>,
}

impl<V> Default for Context<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Context<V> {
    /// A fresh root context with no bindings.
    pub fn new() -> Self {
        Context {
            scopes: vec![Scope::default()],
        }
    }

    /// A root context seeded with host-supplied bindings.
    pub fn with_variables(variables: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut context = Self::new();
        context.scopes[0].variables.extend(variables);
        context
    }

    /// Number of contexts above the root.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Close the current context. The root is never popped.
    pub fn pop_scope(&mut self) -> Option<Scope<V>> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn root(&self) -> &Scope<V> {
        &self.scopes[0]
    }

    pub fn root_mut(&mut self) -> &mut Scope<V> {
        &mut self.scopes[0]
    }

    pub fn current(&self) -> &Scope<V> {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Scope<V> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Look a variable up in the current context, falling back to the root.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.current()
            .get_variable(name)
            .or_else(|| self.root().get_variable(name))
    }

    /// Assign a variable: overwrite it where it already lives (current context
    /// first, then the root), otherwise create it in the current context.
    pub fn set(&mut self, name: &str, value: V) {
        if self.current().contains(name) {
            self.current_mut().set_variable(name, value);
        } else if self.root().contains(name) {
            self.root_mut().set_variable(name, value);
        } else {
            self.current_mut().set_variable(name, value);
        }
    }

    /// Record a binding directly in the root context.
    pub fn declare_root(&mut self, name: &str, value: V) {
        self.root_mut().set_variable(name, value);
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.current().escape
    }

    pub fn set_escape_mode(&mut self, mode: EscapeMode) {
        self.current_mut().escape = mode;
    }

    /// Read and clear the current context's escape signal.
    pub fn take_escape(&mut self) -> EscapeMode {
        std::mem::take(&mut self.current_mut().escape)
    }

    /// Run `body` in a child context opened for a branch. A pending escape
    /// signal is handed back to this context when the branch closes.
    pub fn in_branch<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.push_scope();
        let result = body(self);
        if let Some(scope) = self.pop_scope() {
            if scope.escape != EscapeMode::None {
                self.current_mut().escape = scope.escape;
            }
        }
        result
    }

    /// Run `body` in a child context opened for a loop. The loop owns the
    /// child's escape signal; whatever is left over is dropped with it.
    pub fn in_loop<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.push_scope();
        let result = body(self);
        self.pop_scope();
        result
    }

    /// Consume the context, returning the root bindings.
    pub fn into_variables(mut self) -> IndexMap<String, V> {
        self.scopes.truncate(1);
        self.scopes
            .pop()
            .map(|root| root.variables)
            .unwrap_or_default()
    }
}
