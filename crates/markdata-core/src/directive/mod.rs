//! Directive resolution engine.
//!
//! A directive is a backtick-delimited macro embedded in a text document:
//!
//! - **Inline** ([`InlineDirective`]): `` `name{'key': value}` ``
//! - **Block** ([`BlockDirective`]): ```` ``name{'key': value}\ncontent\n``` ````
//!
//! The argument payload is a static data literal (strings, numbers,
//! `True`/`False`/`None`, lists, tuples and mappings) parsed by
//! [`parse_literal`]; nothing in it is evaluated.
//!
//! # Architecture
//!
//! 1. **Scanning** ([`scan`]): one regex pass finds every invocation, left to
//!    right, without overlap. Block content is captured but not re-scanned.
//!
//! 2. **Resolution** ([`DirectiveProcessor::process`]): each match whose name
//!    is in the [`DirectiveRegistry`] has its arguments parsed and its
//!    [`Handler`] invoked with a [`DirectiveContext`]. The replacement is
//!    spliced in at the match's own byte range. Unknown names stay verbatim.
//!
//! # Example
//!
//! ```
//! use markdata_core::Metadata;
//! use markdata_core::directive::{
//!     DirectiveArgs, DirectiveContext, DirectiveError, DirectiveProcessor,
//!     DirectiveProcessorConfig, DirectiveRegistry,
//! };
//!
//! fn callout(
//!     content: &str,
//!     mut args: DirectiveArgs,
//!     _ctx: &DirectiveContext,
//! ) -> Result<String, DirectiveError> {
//!     let title = args.take_str("title")?.unwrap_or_default();
//!     args.finish()?;
//!     Ok(format!("<aside><b>{title}</b> {content}</aside>"))
//! }
//!
//! let registry = DirectiveRegistry::new().with_block("callout", callout);
//! let config = DirectiveProcessorConfig::default();
//!
//! let output = DirectiveProcessor::new(&registry, &config)
//!     .process("``callout{'title': 'Note'}\nMind the gap.\n```", &Metadata::new())
//!     .unwrap();
//! assert_eq!(output, "<aside><b>Note</b> Mind the gap.</aside>");
//! ```

mod args;
mod context;
mod error;
mod handler;
mod literal;
mod processor;
mod registry;
mod scanner;

pub use args::DirectiveArgs;
pub use context::DirectiveContext;
pub use error::{DirectiveError, InvocationKind};
pub use handler::{BlockDirective, Handler, InlineDirective};
pub use literal::{ArgsError, parse_literal};
pub use processor::{DirectiveProcessor, DirectiveProcessorConfig, ReadFileFn};
pub use registry::DirectiveRegistry;
pub use scanner::{DirectiveMatch, scan};
