//! Conditional publishing.
//!
//! Publishing resolves the target reference first and only uploads when the
//! reference is unbound or bound to different content:
//!
//! | resolution         | digests  | action |
//! |--------------------|----------|--------|
//! | not found          | -        | push   |
//! | found              | differ   | push   |
//! | found              | equal    | skip   |
//! | error              | -        | fail   |
//!
//! There is no compare-and-swap. Another writer may rebind the reference
//! between the lookup and the push.

use std::io::Read;

use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::Result;
use crate::reference::validate_reference;
use crate::resolve::{Resolution, Resolver};
use crate::store::Store;

/// What to do with new content given the current binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Upload and (re)bind the reference.
    Push,
    /// The reference already points at this content.
    Skip(Descriptor),
}

/// Decide whether content with `new_digest` must be pushed.
pub fn decide(resolution: &Resolution, new_digest: &Digest) -> Decision {
    match resolution {
        Resolution::Found(existing) if existing.same_content(new_digest) => {
            Decision::Skip(existing.clone())
        }
        Resolution::Found(_) | Resolution::NotFound => Decision::Push,
    }
}

/// Result of a publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Whether content was uploaded.
    pub performed: bool,
    /// The descriptor the reference is now bound to.
    pub descriptor: Descriptor,
}

/// Publishes content to a store, skipping redundant uploads.
#[derive(Debug, Clone)]
pub struct Publisher<S> {
    resolver: Resolver<S>,
}

impl<S: Store> Publisher<S> {
    /// Create a publisher over a configured store.
    pub fn new(store: S) -> Self {
        Publisher {
            resolver: Resolver::new(store),
        }
    }

    /// Publish `descriptor` under `reference`, reading bytes from `content`.
    ///
    /// `content` is only read when a push happens. Errors from the store are
    /// returned as-is.
    pub fn publish(
        &self,
        reference: &str,
        descriptor: &Descriptor,
        content: &mut dyn Read,
    ) -> Result<PublishOutcome> {
        validate_reference(reference)?;

        let resolution = self.resolver.resolve(reference)?;
        match decide(&resolution, &descriptor.digest) {
            Decision::Skip(existing) => {
                tracing::info!(reference, digest = %existing.digest, "content already published, skipping push");
                Ok(PublishOutcome {
                    performed: false,
                    descriptor: existing,
                })
            }
            Decision::Push => {
                if let Some(previous) = resolution.descriptor() {
                    tracing::debug!(reference, previous = %previous.digest, "rebinding reference");
                }
                self.resolver
                    .store()
                    .push_reference(descriptor, content, reference)?;
                tracing::info!(reference, digest = %descriptor.digest, size = descriptor.size, "pushed");
                Ok(PublishOutcome {
                    performed: true,
                    descriptor: descriptor.clone(),
                })
            }
        }
    }
}

/// Publish content through a one-off [`Publisher`].
pub fn publish<S: Store>(
    store: S,
    reference: &str,
    descriptor: &Descriptor,
    content: &mut dyn Read,
) -> Result<PublishOutcome> {
    Publisher::new(store).publish(reference, descriptor, content)
}
