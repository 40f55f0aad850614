//! Directive preprocessor for text documents.
//!
//! Scans a document for directive invocations and replaces each one with the
//! output of a registered handler:
//!
//! ````text
//! `table{'path': 'data.csv', 'classes': ['table']}`
//!
//! ``callout{'title': 'Note'}
//! Block content goes here.
//! ```
//! ````
//!
//! The pass is purely textual: markup around the invocations is copied
//! unchanged and handler output is not scanned again.
//!
//! # Architecture
//!
//! - [`front_matter`]: splits off and parses a leading YAML/TOML/JSON block
//! - [`directive`]: scanner, argument parser, registry and resolution engine
//! - [`builtin`]: `table`, `document`, `code`, `output` and `image`
//! - [`Session`]: ties these together for one or many documents
//!
//! # Example
//!
//! ```
//! use markdata_core::{Session, Source};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("data.csv"), "a,b\n1,2\n").unwrap();
//! std::fs::write(dir.path().join("doc.md"), "`table{'path': 'data.csv'}`").unwrap();
//!
//! let html = Session::new()
//!     .resolve(Source::File(&dir.path().join("doc.md")))
//!     .unwrap();
//! assert!(html.contains("<tr><td>1</td><td>2</td></tr>"));
//! ```

pub mod builtin;
pub mod directive;
mod error;
pub mod front_matter;
pub mod html;
mod session;

pub use error::ResolveError;
pub use session::{Session, SessionConfig, Source, markdata};

/// Document front matter: an ordered mapping of string keys to values.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
