//! Logger context: the name a handle logs under

/// Context attached to records emitted through a logger handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Dotted logger name, e.g. `app` or `app.http`
    pub name: String,
}

impl Context {
    /// Create a root context
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Derive a child context named `<parent>.<name>`
    pub fn child(&self, name: &str) -> Self {
        if self.name.is_empty() {
            return Self::new(name);
        }
        Self {
            name: format!("{}.{}", self.name, name),
        }
    }

    /// Combine with another context, nesting its name under ours
    pub fn merge(&self, other: &Self) -> Self {
        if other.name.is_empty() {
            self.clone()
        } else {
            self.child(&other.name)
        }
    }
}
