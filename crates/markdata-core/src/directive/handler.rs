//! Directive handler traits.
//!
//! Inline directives (`` `name{...}` ``) receive only keyword arguments;
//! block directives (```` ``name{...}\ncontent\n``` ````) also receive the
//! captured content. A [`Handler`] tags which forms a registered directive
//! accepts.

use std::sync::Arc;

use super::{DirectiveArgs, DirectiveContext, DirectiveError, InvocationKind};

/// Handler for inline directives: `` `name{...}` ``
///
/// # Thread Safety
///
/// Handlers are `Send + Sync` and take `&self`: a registry is shared by
/// every document resolved from the same session, possibly in parallel.
///
/// # Example
///
/// ```
/// use markdata_core::directive::{
///     DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective,
/// };
///
/// struct KbdDirective;
///
/// impl InlineDirective for KbdDirective {
///     fn process(
///         &self,
///         mut args: DirectiveArgs,
///         _ctx: &DirectiveContext,
///     ) -> Result<String, DirectiveError> {
///         let keys = args.require_str("keys")?;
///         args.finish()?;
///         Ok(format!("<kbd>{keys}</kbd>"))
///     }
/// }
/// ```
pub trait InlineDirective: Send + Sync {
    /// Produce the replacement text for one invocation.
    fn process(&self, args: DirectiveArgs, ctx: &DirectiveContext)
    -> Result<String, DirectiveError>;
}

/// Handler for block directives: ```` ``name{...}\ncontent\n``` ````
///
/// The content between the head line and the closing backticks is passed
/// verbatim; it is not scanned for further directives.
pub trait BlockDirective: Send + Sync {
    /// Produce the replacement text for one invocation.
    fn process(
        &self,
        content: &str,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError>;
}

impl<F> InlineDirective for F
where
    F: Fn(DirectiveArgs, &DirectiveContext) -> Result<String, DirectiveError> + Send + Sync,
{
    fn process(
        &self,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        self(args, ctx)
    }
}

impl<F> BlockDirective for F
where
    F: Fn(&str, DirectiveArgs, &DirectiveContext) -> Result<String, DirectiveError> + Send + Sync,
{
    fn process(
        &self,
        content: &str,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        self(content, args, ctx)
    }
}

/// A registered directive handler.
///
/// Cloning is cheap: handlers are reference counted, so a registry can be
/// snapshotted per session.
#[derive(Clone)]
pub enum Handler {
    /// Accepts only inline invocations.
    Inline(Arc<dyn InlineDirective>),
    /// Accepts only block invocations.
    Block(Arc<dyn BlockDirective>),
    /// Accepts both forms.
    Both {
        /// Used for inline invocations.
        inline: Arc<dyn InlineDirective>,
        /// Used for block invocations.
        block: Arc<dyn BlockDirective>,
    },
}

impl Handler {
    /// Wrap an inline directive.
    pub fn inline(directive: impl InlineDirective + 'static) -> Self {
        Self::Inline(Arc::new(directive))
    }

    /// Wrap a block directive.
    pub fn block(directive: impl BlockDirective + 'static) -> Self {
        Self::Block(Arc::new(directive))
    }

    /// Wrap a directive that accepts both invocation forms.
    pub fn both<D>(directive: D) -> Self
    where
        D: InlineDirective + BlockDirective + 'static,
    {
        let directive = Arc::new(directive);
        Self::Both {
            inline: Arc::clone(&directive) as Arc<dyn InlineDirective>,
            block: directive,
        }
    }

    /// Whether this handler accepts the given invocation form.
    #[must_use]
    pub fn accepts(&self, kind: InvocationKind) -> bool {
        matches!(
            (self, kind),
            (Self::Both { .. }, _)
                | (Self::Inline(_), InvocationKind::Inline)
                | (Self::Block(_), InvocationKind::Block)
        )
    }

    /// Dispatch one invocation. `content` is `Some` for block invocations.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::UnsupportedForm`] if the handler does not
    /// accept the invocation form, otherwise whatever the handler returns.
    pub fn invoke(
        &self,
        content: Option<&str>,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        match (self, content) {
            (Self::Inline(inline) | Self::Both { inline, .. }, None) => inline.process(args, ctx),
            (Self::Block(block) | Self::Both { block, .. }, Some(content)) => {
                block.process(content, args, ctx)
            }
            (Self::Inline(_), Some(_)) => {
                Err(DirectiveError::UnsupportedForm(InvocationKind::Block))
            }
            (Self::Block(_), None) => Err(DirectiveError::UnsupportedForm(InvocationKind::Inline)),
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Handler::Inline"),
            Self::Block(_) => f.write_str("Handler::Block"),
            Self::Both { .. } => f.write_str("Handler::Both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metadata;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct Callout;

    impl BlockDirective for Callout {
        fn process(
            &self,
            content: &str,
            mut args: DirectiveArgs,
            _ctx: &DirectiveContext,
        ) -> Result<String, DirectiveError> {
            let title = args.take_str("title")?.unwrap_or_default();
            args.finish()?;
            Ok(format!("<aside title=\"{title}\">{content}</aside>"))
        }
    }

    struct Echo;

    impl InlineDirective for Echo {
        fn process(
            &self,
            args: DirectiveArgs,
            _ctx: &DirectiveContext,
        ) -> Result<String, DirectiveError> {
            Ok(format!("inline:{}", args.len()))
        }
    }

    impl BlockDirective for Echo {
        fn process(
            &self,
            content: &str,
            _args: DirectiveArgs,
            _ctx: &DirectiveContext,
        ) -> Result<String, DirectiveError> {
            Ok(format!("block:{content}"))
        }
    }

    fn args(literal: &str) -> DirectiveArgs {
        DirectiveArgs::parse(literal).unwrap()
    }

    #[test]
    fn test_block_handler() {
        let metadata = Metadata::new();
        let ctx = DirectiveContext {
            name: "callout",
            metadata: &metadata,
            source_path: None,
            base_dir: Path::new("."),
            line: 1,
            read_file: &|_| Ok(String::new()),
        };

        let handler = Handler::block(Callout);
        let output = handler
            .invoke(Some("Careful!"), args("{'title': 'Warning'}"), &ctx)
            .unwrap();
        assert_eq!(output, "<aside title=\"Warning\">Careful!</aside>");
    }

    #[test]
    fn test_closure_handler() {
        let metadata = Metadata::new();
        let ctx = DirectiveContext {
            name: "greet",
            metadata: &metadata,
            source_path: None,
            base_dir: Path::new("."),
            line: 3,
            read_file: &|_| Ok(String::new()),
        };

        fn greet(mut args: DirectiveArgs, ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            let who = args.require_str("who")?;
            Ok(format!("hello {who} from line {}", ctx.line))
        }

        let handler = Handler::inline(greet);
        let output = handler.invoke(None, args("{'who': 'world'}"), &ctx).unwrap();
        assert_eq!(output, "hello world from line 3");
    }

    #[test]
    fn test_form_mismatch() {
        let metadata = Metadata::new();
        let ctx = DirectiveContext {
            name: "callout",
            metadata: &metadata,
            source_path: None,
            base_dir: Path::new("."),
            line: 1,
            read_file: &|_| Ok(String::new()),
        };

        let block = Handler::block(Callout);
        let err = block.invoke(None, args("{}"), &ctx).unwrap_err();
        assert!(matches!(
            err,
            DirectiveError::UnsupportedForm(InvocationKind::Inline)
        ));

        let inline = Handler::inline(Echo);
        let err = inline.invoke(Some("x"), args("{}"), &ctx).unwrap_err();
        assert!(matches!(
            err,
            DirectiveError::UnsupportedForm(InvocationKind::Block)
        ));
    }

    #[test]
    fn test_both_forms() {
        let metadata = Metadata::new();
        let ctx = DirectiveContext {
            name: "echo",
            metadata: &metadata,
            source_path: None,
            base_dir: Path::new("."),
            line: 1,
            read_file: &|_| Ok(String::new()),
        };

        let handler = Handler::both(Echo);
        assert!(handler.accepts(InvocationKind::Inline));
        assert!(handler.accepts(InvocationKind::Block));
        assert_eq!(handler.invoke(None, args("{'a': 1}"), &ctx).unwrap(), "inline:1");
        assert_eq!(handler.invoke(Some("body"), args("{}"), &ctx).unwrap(), "block:body");
    }
}
