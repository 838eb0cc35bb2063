/// The name → entry table of every invocable data function.
///
/// Resolving a name takes two checks: the name must be registered, and the
/// entry must be a function rather than a plain attribute.
use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::InvokeError;
use super::params::{Kwargs, ParamSpec};
use crate::sources::Session;
use crate::types::Output;

/// A registry function body.
pub type Handler = fn(&Session, &Kwargs) -> anyhow::Result<Output>;

/// A callable registry entry.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// One-line description for help output.
    pub summary: String,
    /// Declared parameters, or `None` when the signature is not known.
    pub signature: Option<Vec<ParamSpec>>,
    pub handler: Handler,
}

/// Whatever a registry name points at.
#[derive(Debug, Clone)]
pub enum Entry {
    Function(Function),
    /// A plain value (version string, constant table) that cannot be called.
    #[allow(dead_code)]
    Attribute(Value),
}

/// Registry of callable data functions and attributes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, Entry>,
}

impl Catalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function with a known parameter list.
    pub fn register_function(
        &mut self,
        name: &str,
        summary: &str,
        params: Vec<ParamSpec>,
        handler: Handler,
    ) {
        self.insert_function(name, summary, Some(params), handler);
    }

    /// Register a function whose parameters cannot be described.
    #[cfg(test)]
    pub fn register_opaque_function(&mut self, name: &str, summary: &str, handler: Handler) {
        self.insert_function(name, summary, None, handler);
    }

    fn insert_function(
        &mut self,
        name: &str,
        summary: &str,
        signature: Option<Vec<ParamSpec>>,
        handler: Handler,
    ) {
        self.entries.insert(
            name.to_owned(),
            Entry::Function(Function {
                name: name.to_owned(),
                summary: summary.to_owned(),
                signature,
                handler,
            }),
        );
    }

    /// Register a non-callable value.
    pub fn register_attribute(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_owned(), Entry::Attribute(value));
    }

    /// Resolve a name to a callable.
    ///
    /// # Errors
    ///
    /// - `InvokeError::NotFound` — no entry with this name
    /// - `InvokeError::NotCallable` — the entry is an attribute
    pub fn resolve(&self, name: &str) -> Result<&Function, InvokeError> {
        match self.entries.get(name) {
            Some(Entry::Function(function)) => Ok(function),
            Some(Entry::Attribute(_)) => Err(InvokeError::NotCallable {
                name: name.to_owned(),
            }),
            None => Err(InvokeError::NotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// Public functions in name order, for usage text.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Function(f) if !f.name.starts_with('_') => Some(f),
            _ => None,
        })
    }
}

/// Declared parameters of a function; empty when the signature is unknown.
#[must_use]
pub fn describe_parameters(function: &Function) -> &[ParamSpec] {
    function.signature.as_deref().unwrap_or_default()
}
