//! Document resolution sessions.
//!
//! A [`Session`] owns a registry snapshot and the options for resolving
//! documents. It never changes the process working directory: the
//! resolution base is computed per document and handed to every directive
//! through its context. Sessions are `Send + Sync`, so one session can
//! resolve many documents in parallel.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ResolveError;
use crate::directive::{
    DirectiveProcessor, DirectiveProcessorConfig, DirectiveRegistry, Handler, ReadFileFn,
};
use crate::front_matter::{self, FrontMatterFormat};

/// Input document.
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    /// In-memory text with no file location. Relative paths resolve
    /// against the root, or the current directory.
    Text(&'a str),
    /// A file to read. Relative paths resolve against its directory.
    File(&'a Path),
    /// In-memory text that belongs at `path`.
    Named {
        /// Document text.
        text: &'a str,
        /// Where the text came from.
        path: &'a Path,
    },
}

impl Source<'_> {
    fn path(&self) -> Option<&Path> {
        match *self {
            Self::Text(_) => None,
            Self::File(path) | Self::Named { path, .. } => Some(path),
        }
    }
}

/// Options for resolving documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Front matter format to parse. `None` disables front matter.
    pub front_matter: Option<FrontMatterFormat>,
    /// Drop the front matter block from the output.
    ///
    /// Default: `false` (the block is copied through unchanged).
    pub strip_front_matter: bool,
    /// Directory relative directive paths resolve against, overriding the
    /// document's own directory.
    pub root: Option<PathBuf>,
}

/// Resolves directives in documents.
///
/// # Example
///
/// ```
/// use markdata_core::{Session, Source};
/// use markdata_core::front_matter::FrontMatterFormat;
/// use markdata_core::directive::{DirectiveArgs, DirectiveContext, DirectiveError, Handler};
///
/// fn title(_args: DirectiveArgs, ctx: &DirectiveContext) -> Result<String, DirectiveError> {
///     Ok(ctx.metadata["title"].as_str().unwrap_or_default().to_uppercase())
/// }
///
/// let session = Session::new()
///     .with_front_matter(Some(FrontMatterFormat::Yaml))
///     .with_strip_front_matter(true)
///     .with_directives([("title", Handler::inline(title))]);
///
/// let output = session
///     .resolve(Source::Text("---\ntitle: Guide\n---\n# `title{}`\n"))
///     .unwrap();
/// assert_eq!(output, "# GUIDE\n");
/// ```
#[derive(Clone)]
pub struct Session {
    registry: DirectiveRegistry,
    config: SessionConfig,
    read_file: Option<Arc<ReadFileFn>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session with the built-in directives and default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(DirectiveRegistry::with_builtins())
    }

    /// Create a session around an existing registry.
    #[must_use]
    pub fn with_registry(registry: DirectiveRegistry) -> Self {
        Self {
            registry,
            config: SessionConfig::default(),
            read_file: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_front_matter(mut self, format: Option<FrontMatterFormat>) -> Self {
        self.config.front_matter = format;
        self
    }

    #[must_use]
    pub fn with_strip_front_matter(mut self, strip: bool) -> Self {
        self.config.strip_front_matter = strip;
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = Some(root.into());
        self
    }

    /// Merge caller-supplied handlers, overriding built-ins of the same name.
    #[must_use]
    pub fn with_directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = (S, Handler)>,
        S: Into<String>,
    {
        self.registry.merge(directives);
        self
    }

    /// Set the callback directives use to read text files.
    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
    {
        self.read_file = Some(Arc::new(read_file));
        self
    }

    #[must_use]
    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DirectiveRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Directory that relative paths resolve against for a document at
    /// `source_path`.
    ///
    /// The configured root wins; otherwise the document's directory; otherwise
    /// the current directory.
    #[must_use]
    pub fn base_dir(&self, source_path: Option<&Path>) -> PathBuf {
        if let Some(root) = &self.config.root {
            return root.clone();
        }
        source_path
            .and_then(|path| {
                std::path::absolute(path)
                    .ok()
                    .and_then(|abs| abs.parent().map(Path::to_path_buf))
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve one document.
    ///
    /// Returns the full output text, or an error and no output.
    pub fn resolve(&self, source: Source<'_>) -> Result<String, ResolveError> {
        let text: Cow<'_, str> = match source {
            Source::Text(text) | Source::Named { text, .. } => Cow::Borrowed(text),
            Source::File(path) => Cow::Owned(std::fs::read_to_string(path).map_err(|source| {
                ResolveError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
        };
        let source_path = source.path();

        let document = front_matter::extract(&text, self.config.front_matter)?;

        let mut config = DirectiveProcessorConfig::new()
            .with_base_dir(self.base_dir(source_path))
            .with_line_offset(document.raw.matches('\n').count());
        if let Some(path) = source_path {
            config = config.with_source_path(path);
        }
        config.read_file.clone_from(&self.read_file);

        let body = DirectiveProcessor::new(&self.registry, &config)
            .process(document.body, &document.metadata)?;

        if let Some(path) = source_path {
            tracing::info!(path = %path.display(), base_dir = %config.base_dir.display(), "Resolved document");
        }

        if self.config.strip_front_matter {
            Ok(body)
        } else {
            Ok(format!("{}{body}", document.raw))
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("directives", &self.registry.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resolve a document with the built-in directives plus `directives`.
///
/// Shorthand for building a one-off [`Session`].
///
/// # Example
///
/// ```
/// use markdata_core::{Source, markdata};
/// use markdata_core::directive::{DirectiveArgs, DirectiveContext, DirectiveError, Handler};
///
/// fn year(_args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
///     Ok("2024".to_owned())
/// }
///
/// let output = markdata(
///     Source::Text("Copyright `year{}`"),
///     [("year", Handler::inline(year))],
///     None,
///     None,
/// )
/// .unwrap();
/// assert_eq!(output, "Copyright 2024");
/// ```
pub fn markdata<I, S>(
    source: Source<'_>,
    directives: I,
    front_matter: Option<FrontMatterFormat>,
    root: Option<&Path>,
) -> Result<String, ResolveError>
where
    I: IntoIterator<Item = (S, Handler)>,
    S: Into<String>,
{
    let mut session = Session::new()
        .with_front_matter(front_matter)
        .with_directives(directives);
    if let Some(root) = root {
        session = session.with_root(root);
    }
    session.resolve(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn callout(
        content: &str,
        mut args: DirectiveArgs,
        _ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let title = args.take_str("title")?.unwrap_or_default();
        let classes = args.take_str_list("classes")?;
        args.finish()?;
        Ok(format!(
            "<div class=\"admonition {}\">\n    <p class=\"admonition-title\">{title}</p>\n    <p>{content}</p>\n</div>",
            classes.join(" ")
        ))
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }

    #[test]
    fn test_identity_without_front_matter() {
        let text = "---\ntitle: x\n---\n# Plain\n\nNothing to do.\n";
        assert_eq!(Session::new().resolve(Source::Text(text)).unwrap(), text);
    }

    #[test]
    fn test_document_relative_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let docs = temp_dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("data.csv"), "a,b\n1,2\n").unwrap();
        fs::write(
            docs.join("index.md"),
            "# Data\n\n`table{'path': 'data.csv', 'classes': ['t']}`\n",
        )
        .unwrap();

        let output = Session::new()
            .resolve(Source::File(&docs.join("index.md")))
            .unwrap();
        assert_eq!(
            output,
            "# Data\n\n<table class=\"t\">\n<thead>\n<tr><th>a</th><th>b</th></tr>\n</thead>\n\
             <tbody>\n<tr><td>1</td><td>2</td></tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn test_root_overrides_document_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let docs = temp_dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(temp_dir.path().join("f.txt"), "one\ntwo\nthree\n").unwrap();
        fs::write(
            docs.join("index.md"),
            "`document{'path': 'f.txt', 'span': [2, 3]}`",
        )
        .unwrap();

        let output = Session::new()
            .with_root(temp_dir.path())
            .resolve(Source::File(&docs.join("index.md")))
            .unwrap();
        assert_eq!(output, "two\nthree");
    }

    #[test]
    fn test_working_directory_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("f.txt"), "content").unwrap();
        let doc = temp_dir.path().join("doc.md");
        let before = std::env::current_dir().unwrap();

        fs::write(&doc, "`document{'path': 'f.txt'}`").unwrap();
        let output = Session::new().resolve(Source::File(&doc)).unwrap();
        assert_eq!(output, "content");
        assert_eq!(std::env::current_dir().unwrap(), before);

        fs::write(&doc, "`document{'path': 'missing.txt'}`").unwrap();
        assert!(Session::new().resolve(Source::File(&doc)).is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_front_matter_retained_by_default() {
        let text = "---\ncmd: \"`output{'cmd': 'exit 1'}`\"\n---\n``callout{'title': 'Note', 'classes': ['tip']}\nHello\n```\n";
        let session = Session::new()
            .with_front_matter(Some(FrontMatterFormat::Yaml))
            .with_directives([("callout", Handler::block(callout))]);

        let output = session.resolve(Source::Text(text)).unwrap();
        assert_eq!(
            output,
            "---\ncmd: \"`output{'cmd': 'exit 1'}`\"\n---\n<div class=\"admonition tip\">\n    <p class=\"admonition-title\">Note</p>\n    <p>Hello</p>\n</div>\n"
        );
    }

    #[test]
    fn test_front_matter_stripped() {
        let text = "+++\ntitle = \"x\"\n+++\nBody\n";
        let output = Session::new()
            .with_front_matter(Some(FrontMatterFormat::Toml))
            .with_strip_front_matter(true)
            .resolve(Source::Text(text))
            .unwrap();
        assert_eq!(output, "Body\n");
    }

    #[test]
    fn test_malformed_front_matter() {
        let err = Session::new()
            .with_front_matter(Some(FrontMatterFormat::Json))
            .resolve(Source::Text("{\n\"title\": \n}\nBody"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Metadata(_)));
    }

    #[test]
    fn test_argument_syntax_error_yields_nothing() {
        let err = Session::new()
            .resolve(Source::Text("`table{path: 'x.csv'}`"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Arguments { ref name, line: 1, .. } if name == "table"));
    }

    #[test]
    fn test_error_line_counts_front_matter() {
        let err = Session::new()
            .with_front_matter(Some(FrontMatterFormat::Yaml))
            .resolve(Source::Text("---\ntitle: x\n---\n\n`table{path: 'x.csv'}`"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Arguments { line: 5, .. }));
    }

    #[test]
    fn test_data_error_chain_reaches_parser() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("data.json"), "[").unwrap();
        let doc = temp_dir.path().join("doc.md");
        fs::write(&doc, "`table{'path': 'data.json'}`").unwrap();

        let err = Session::new().resolve(Source::File(&doc)).unwrap_err();
        let first: &(dyn std::error::Error + 'static) = &err;
        let mut chain = std::iter::successors(Some(first), |e| e.source());
        assert!(chain.any(|e| e.downcast_ref::<serde_json::Error>().is_some()));
    }

    #[test]
    fn test_missing_source_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Session::new()
            .resolve(Source::File(&temp_dir.path().join("nope.md")))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[test]
    fn test_named_source_uses_path() {
        let session = Session::new().with_read_file(|path| Ok(path.display().to_string()));
        let output = session
            .resolve(Source::Named {
                text: "`document{'path': 'x.txt'}`",
                path: Path::new("/srv/docs/page.md"),
            })
            .unwrap();
        assert_eq!(output, Path::new("/srv/docs/x.txt").display().to_string());
    }

    #[test]
    fn test_base_dir() {
        let session = Session::new();
        assert_eq!(session.base_dir(None), PathBuf::from("."));
        assert_eq!(
            session.base_dir(Some(Path::new("/a/b/c.md"))),
            PathBuf::from("/a/b")
        );
        assert_eq!(
            session.base_dir(Some(Path::new("c.md"))),
            std::env::current_dir().unwrap()
        );

        let session = session.with_root("/root/dir");
        assert_eq!(
            session.base_dir(Some(Path::new("/a/b/c.md"))),
            PathBuf::from("/root/dir")
        );
    }

    #[test]
    fn test_markdata_entry_point() {
        fn shout(mut args: DirectiveArgs, _ctx: &DirectiveContext) -> Result<String, DirectiveError> {
            Ok(args.require_str("text")?.to_uppercase())
        }

        let output = markdata(
            Source::Text("`shout{'text': 'hi'}` `unknown{}`"),
            [("shout", Handler::inline(shout))],
            None,
            None,
        )
        .unwrap();
        assert_eq!(output, "HI `unknown{}`");
    }
}
