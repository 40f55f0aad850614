//! Resolution engine.
//!
//! Substitutes every registered directive invocation in a document body with
//! its handler's output.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Metadata, ResolveError};

use super::scanner::scan;
use super::{DirectiveArgs, DirectiveContext, DirectiveError, DirectiveRegistry};

/// Type alias for the file reading callback function.
pub type ReadFileFn = dyn Fn(&Path) -> io::Result<String> + Send + Sync;

/// Configuration for the directive processor.
#[derive(Clone)]
pub struct DirectiveProcessorConfig {
    /// Base directory for resolving relative paths.
    pub base_dir: PathBuf,
    /// Path to the source file being resolved (if known).
    pub source_path: Option<PathBuf>,
    /// Lines preceding the processed body in its document, added to
    /// reported line numbers.
    pub line_offset: usize,
    /// Callback to read files from the file system.
    ///
    /// Default: `std::fs::read_to_string`
    pub read_file: Option<Arc<ReadFileFn>>,
}

impl Default for DirectiveProcessorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveProcessorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            source_path: None,
            line_offset: 0,
            read_file: None,
        }
    }

    /// Set the base directory for resolving relative paths.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the source file path.
    #[must_use]
    pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    /// Set the number of document lines preceding the body.
    #[must_use]
    pub fn with_line_offset(mut self, line_offset: usize) -> Self {
        self.line_offset = line_offset;
        self
    }

    /// Set the file reading callback.
    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
    {
        self.read_file = Some(Arc::new(read_file));
        self
    }

    fn create_context<'a>(
        &'a self,
        name: &'a str,
        metadata: &'a Metadata,
        line: usize,
    ) -> DirectiveContext<'a> {
        DirectiveContext {
            name,
            metadata,
            source_path: self.source_path.as_deref(),
            base_dir: &self.base_dir,
            line,
            read_file: self.read_file.as_ref().map_or_else(
                || &default_read_file as &dyn Fn(&Path) -> io::Result<String>,
                |f| f.as_ref(),
            ),
        }
    }
}

impl std::fmt::Debug for DirectiveProcessorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveProcessorConfig")
            .field("base_dir", &self.base_dir)
            .field("source_path", &self.source_path)
            .field("line_offset", &self.line_offset)
            .field("read_file", &self.read_file.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Default file reading function.
fn default_read_file(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Processor that resolves directives against a registry.
///
/// Matches are handled strictly left to right. Each replacement covers
/// exactly the span of its own invocation; the output is assembled from the
/// untouched text between spans and the handler results. Unregistered names
/// are copied verbatim.
///
/// # Example
///
/// ```
/// use markdata_core::Metadata;
/// use markdata_core::directive::{
///     DirectiveArgs, DirectiveContext, DirectiveError, DirectiveProcessor,
///     DirectiveProcessorConfig, DirectiveRegistry,
/// };
///
/// fn kbd(mut args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
///     Ok(format!("<kbd>{}</kbd>", args.require_str("keys")?))
/// }
///
/// let registry = DirectiveRegistry::new().with_inline("kbd", kbd);
/// let config = DirectiveProcessorConfig::default();
/// let processor = DirectiveProcessor::new(&registry, &config);
///
/// let output = processor
///     .process("Press `kbd{'keys': 'Ctrl+C'}` to copy.", &Metadata::new())
///     .unwrap();
/// assert_eq!(output, "Press <kbd>Ctrl+C</kbd> to copy.");
/// ```
pub struct DirectiveProcessor<'a> {
    registry: &'a DirectiveRegistry,
    config: &'a DirectiveProcessorConfig,
}

impl<'a> DirectiveProcessor<'a> {
    #[must_use]
    pub fn new(registry: &'a DirectiveRegistry, config: &'a DirectiveProcessorConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve every registered directive in `body`.
    ///
    /// Nothing is returned on failure: the first argument or handler error
    /// aborts the whole document.
    pub fn process(&self, body: &str, metadata: &Metadata) -> Result<String, ResolveError> {
        let mut output = String::with_capacity(body.len());
        let mut last = 0;

        for m in scan(body) {
            let Some(handler) = self.registry.get(m.name) else {
                continue;
            };
            let line = m.line + self.config.line_offset;

            if !handler.accepts(m.kind()) {
                return Err(ResolveError::Directive {
                    name: m.name.to_owned(),
                    line,
                    source: DirectiveError::UnsupportedForm(m.kind()),
                });
            }

            let args = DirectiveArgs::parse(m.arguments).map_err(|source| {
                ResolveError::Arguments {
                    name: m.name.to_owned(),
                    line,
                    source,
                }
            })?;

            tracing::debug!(
                directive = m.name,
                line,
                kind = %m.kind(),
                "Resolving directive"
            );

            let ctx = self.config.create_context(m.name, metadata, line);
            let replacement =
                handler
                    .invoke(m.content, args, &ctx)
                    .map_err(|source| ResolveError::Directive {
                        name: m.name.to_owned(),
                        line,
                        source,
                    })?;

            output.push_str(&body[last..m.range.start]);
            output.push_str(&replacement);
            last = m.range.end;
        }

        output.push_str(&body[last..]);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveError, InlineDirective, InvocationKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn upper(
        content: &str,
        _args: DirectiveArgs,
        _ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        Ok(content.to_uppercase())
    }

    fn word(mut args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
        let text = args.require_str("text")?;
        args.finish()?;
        Ok(text)
    }

    fn resolve(registry: &DirectiveRegistry, body: &str) -> Result<String, ResolveError> {
        let config = DirectiveProcessorConfig::default();
        DirectiveProcessor::new(registry, &config).process(body, &Metadata::new())
    }

    #[test]
    fn test_text_without_directives() {
        let registry = DirectiveRegistry::with_builtins();
        let text = "# Title\n\nSome `code` and {braces} and ``` fences ```.\n";
        assert_eq!(resolve(&registry, text).unwrap(), text);
    }

    #[test]
    fn test_unregistered_left_verbatim() {
        let registry = DirectiveRegistry::new().with_inline("word", word);
        let text = "`unknown{'a': b}` then `word{'text': 'ok'}`";
        assert_eq!(resolve(&registry, text).unwrap(), "`unknown{'a': b}` then ok");
    }

    #[test]
    fn test_replaced_exactly_once() {
        fn a(_args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            Ok("`b{}`".to_owned())
        }
        fn b(_args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            Ok("B".to_owned())
        }

        // Output of `a` equals the text of the later invocation; only the
        // invocation's own span is replaced.
        let registry = DirectiveRegistry::new().with_inline("a", a).with_inline("b", b);
        assert_eq!(resolve(&registry, "`a{}` `b{}`").unwrap(), "`b{}` B");
    }

    #[test]
    fn test_identical_invocations_each_replaced() {
        let registry = DirectiveRegistry::new().with_inline("word", word);
        let text = "`word{'text': 'a'}` `word{'text': 'a'}`";
        assert_eq!(resolve(&registry, text).unwrap(), "a a");
    }

    #[test]
    fn test_block_directive() {
        let registry = DirectiveRegistry::new().with_block("upper", upper);
        let text = "Before\n``upper{}\nhello\nworld\n```\nAfter";
        assert_eq!(resolve(&registry, text).unwrap(), "Before\nHELLO\nWORLD\nAfter");
    }

    struct Logged(Arc<Mutex<Vec<String>>>);

    impl InlineDirective for Logged {
        fn process(
            &self,
            args: DirectiveArgs,
            ctx: &DirectiveContext,
        ) -> Result<String, DirectiveError> {
            self.0.lock().unwrap().push(ctx.name.to_owned());
            Ok("x".repeat(args.len() * 40))
        }
    }

    #[test]
    fn test_resolution_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DirectiveRegistry::new()
            .with_inline("A", Logged(Arc::clone(&log)))
            .with_inline("B", Logged(Arc::clone(&log)));

        let output = resolve(&registry, "`A{'x': 1}` then `B{'y': 2}`").unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
        assert_eq!(output, format!("{} then {}", "x".repeat(40), "x".repeat(40)));
    }

    #[test]
    fn test_metadata_reaches_handler() {
        fn title(_args: DirectiveArgs, ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            Ok(ctx
                .metadata
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned())
        }

        let registry = DirectiveRegistry::new().with_inline("title", title);
        let config = DirectiveProcessorConfig::default();
        let mut metadata = Metadata::new();
        metadata.insert("title".to_owned(), json!("Guide"));

        let output = DirectiveProcessor::new(&registry, &config)
            .process("# `title{}`", &metadata)
            .unwrap();
        assert_eq!(output, "# Guide");
    }

    #[test]
    fn test_argument_syntax_error() {
        let registry = DirectiveRegistry::with_builtins();
        let err = resolve(&registry, "\n`table{path: 'x.csv'}`").unwrap_err();

        match err {
            ResolveError::Arguments { name, line, .. } => {
                assert_eq!(name, "table");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unregistered_bad_arguments_ignored() {
        let registry = DirectiveRegistry::new();
        let text = "`table{path: 'x.csv'}`";
        assert_eq!(resolve(&registry, text).unwrap(), text);
    }

    #[test]
    fn test_handler_error_aborts() {
        let registry = DirectiveRegistry::new().with_inline("word", word);
        let err = resolve(&registry, "`word{'text': 'a'}` `word{'other': 1}`").unwrap_err();

        assert!(matches!(
            &err,
            ResolveError::Directive {
                source: DirectiveError::MissingArgument(arg),
                ..
            } if arg == "text"
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_wrong_form_is_error() {
        let registry = DirectiveRegistry::new().with_inline("word", word);
        let err = resolve(&registry, "``word{}\ncontent\n```").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Directive {
                source: DirectiveError::UnsupportedForm(InvocationKind::Block),
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_form_checked_before_arguments() {
        let registry = DirectiveRegistry::new().with_block("upper", upper);
        let err = resolve(&registry, "text `upper{path: 'x'}`").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Directive {
                source: DirectiveError::UnsupportedForm(InvocationKind::Inline),
                line: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_base_dir_in_context() {
        fn base(_args: DirectiveArgs, ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            Ok(ctx.base_dir.display().to_string())
        }

        let registry = DirectiveRegistry::new().with_inline("base", base);
        let config = DirectiveProcessorConfig::new().with_base_dir("/docs");
        let output = DirectiveProcessor::new(&registry, &config)
            .process("`base{}`", &Metadata::new())
            .unwrap();
        assert_eq!(output, "/docs");
    }

    #[test]
    fn test_custom_read_file() {
        fn include(mut args: DirectiveArgs, ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            ctx.read_to_string(args.require_str("path")?)
        }

        let registry = DirectiveRegistry::new().with_inline("include", include);
        let config = DirectiveProcessorConfig::new()
            .with_base_dir("root")
            .with_read_file(|path| Ok(format!("<{}>", path.display())));
        let output = DirectiveProcessor::new(&registry, &config)
            .process("`include{'path': 'a.md'}`", &Metadata::new())
            .unwrap();
        assert_eq!(output, format!("<{}>", Path::new("root").join("a.md").display()));
    }

    #[test]
    fn test_config_builder() {
        let config = DirectiveProcessorConfig::new()
            .with_base_dir("/docs")
            .with_source_path("/docs/guide.md");

        assert_eq!(config.base_dir, PathBuf::from("/docs"));
        assert_eq!(config.source_path, Some(PathBuf::from("/docs/guide.md")));
        assert!(config.read_file.is_none());
    }
}
