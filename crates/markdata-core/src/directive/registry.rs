//! Directive registry.

use std::collections::HashMap;
use std::collections::hash_map;

use super::{BlockDirective, Handler, InlineDirective};

/// Mapping from directive name to handler.
///
/// Registering a name twice replaces the earlier handler. The registry is
/// cheap to clone, so every [`Session`](crate::Session) carries its own
/// snapshot.
///
/// # Example
///
/// ```
/// use markdata_core::directive::{DirectiveArgs, DirectiveContext, DirectiveError, DirectiveRegistry};
///
/// fn shout(mut args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
///     Ok(args.require_str("text")?.to_uppercase())
/// }
///
/// let registry = DirectiveRegistry::with_builtins().with_inline("shout", shout);
/// assert!(registry.contains("table"));
/// assert!(registry.contains("shout"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct DirectiveRegistry {
    handlers: HashMap<String, Handler>,
}

impl DirectiveRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in directives.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_all(&mut registry);
        registry
    }

    /// Insert a handler, replacing any handler registered under `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(directive = %name, "Replaced directive handler");
        }
    }

    /// Register an inline directive.
    #[must_use]
    pub fn with_inline<D: InlineDirective + 'static>(
        mut self,
        name: impl Into<String>,
        directive: D,
    ) -> Self {
        self.register(name, Handler::inline(directive));
        self
    }

    /// Register a block directive.
    #[must_use]
    pub fn with_block<D: BlockDirective + 'static>(
        mut self,
        name: impl Into<String>,
        directive: D,
    ) -> Self {
        self.register(name, Handler::block(directive));
        self
    }

    /// Apply caller-supplied handlers, overriding existing entries.
    pub fn merge<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (S, Handler)>,
        S: Into<String>,
    {
        for (name, handler) in extra {
            self.register(name, handler);
        }
    }

    /// Look up a handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl IntoIterator for DirectiveRegistry {
    type Item = (String, Handler);
    type IntoIter = hash_map::IntoIter<String, Handler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.into_iter()
    }
}
