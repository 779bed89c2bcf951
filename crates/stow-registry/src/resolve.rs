//! Reference resolution.
//!
//! Turns a store lookup into a [`Resolution`]: absence is an ordinary
//! outcome here, every other failure stays an error.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::store::Store;

/// What a reference is currently bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reference points at this content.
    Found(Descriptor),
    /// Nothing is bound to the reference.
    NotFound,
}

impl Resolution {
    /// The bound descriptor, if any.
    pub fn descriptor(&self) -> Option<&Descriptor> {
        match self {
            Resolution::Found(desc) => Some(desc),
            Resolution::NotFound => None,
        }
    }
}

/// Resolves references against a store.
///
/// Each call makes exactly one store request; nothing is cached or retried.
#[derive(Debug, Clone)]
pub struct Resolver<S> {
    store: S,
}

impl<S: Store> Resolver<S> {
    /// Create a resolver over a configured store.
    pub fn new(store: S) -> Self {
        Resolver { store }
    }

    /// Resolve a tag or digest.
    pub fn resolve(&self, reference: &str) -> Result<Resolution> {
        if reference.is_empty() {
            return Err(Error::invalid("empty reference"));
        }

        match self.store.resolve(reference) {
            Ok(desc) => {
                tracing::debug!(reference, digest = %desc.digest, "reference resolved");
                Ok(Resolution::Found(desc))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(reference, "reference not found");
                Ok(Resolution::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
