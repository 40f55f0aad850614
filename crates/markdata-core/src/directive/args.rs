//! Directive argument parsing.
//!
//! Parses the `{'key': value, ...}` literal that follows a directive name
//! into keyword arguments.

use serde_json::{Map, Value};

use super::literal::{ArgsError, parse_literal};
use super::DirectiveError;

/// Keyword arguments of a directive invocation.
///
/// Handlers consume the arguments they accept with the `take_*` and
/// `require_*` methods and call [`finish`](Self::finish) to reject anything
/// left over.
///
/// # Example
///
/// ```
/// use markdata_core::directive::DirectiveArgs;
///
/// let mut args = DirectiveArgs::parse("{'path': 'f.txt', 'classes': ['a', 'b']}").unwrap();
/// assert_eq!(args.require_str("path").unwrap(), "f.txt");
/// assert_eq!(args.take_str_list("classes").unwrap(), vec!["a", "b"]);
/// assert!(args.take_str("caption").unwrap().is_none());
/// assert!(args.finish().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectiveArgs {
    values: Map<String, Value>,
}

impl DirectiveArgs {
    /// Parse an argument literal, including its surrounding braces.
    ///
    /// # Errors
    ///
    /// Returns [`ArgsError`] if the literal is not a static mapping literal.
    pub fn parse(literal: &str) -> Result<Self, ArgsError> {
        match parse_literal(literal)? {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(ArgsError::new(0, "directive arguments must be a mapping")),
        }
    }

    /// Remove and return an argument.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Take an optional string argument. `None` counts as absent.
    pub fn take_str(&mut self, key: &str) -> Result<Option<String>, DirectiveError> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(DirectiveError::invalid(key, "must be a string")),
        }
    }

    /// Take a required string argument.
    pub fn require_str(&mut self, key: &str) -> Result<String, DirectiveError> {
        self.take_str(key)?
            .ok_or_else(|| DirectiveError::MissingArgument(key.to_owned()))
    }

    /// Take an optional list of strings. A single string is read as a
    /// one-element list; absent means empty.
    pub fn take_str_list(&mut self, key: &str) -> Result<Vec<String>, DirectiveError> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s]),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(DirectiveError::invalid(key, "must be a list of strings")),
                })
                .collect(),
            Some(_) => Err(DirectiveError::invalid(key, "must be a list of strings")),
        }
    }

    /// Take an optional boolean argument.
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>, DirectiveError> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(DirectiveError::invalid(key, "must be True or False")),
        }
    }

    /// Reject any arguments that were not consumed.
    pub fn finish(self) -> Result<(), DirectiveError> {
        match self.values.keys().next() {
            Some(key) => Err(DirectiveError::UnexpectedArgument(key.clone())),
            None => Ok(()),
        }
    }

    /// Consume into the remaining arguments.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}
