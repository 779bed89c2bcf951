//! Conditional manifest publishing for content-addressable stores.
//!
//! Pushes a manifest to a store under a reference without re-uploading
//! content the reference already points at, and without leaving a tag bound
//! to stale content.
//!
//! # Architecture
//!
//! - **Resolver** — looks up the descriptor currently bound to a reference
//! - **Publisher** — resolve, compare digests, then push or skip
//! - **Store** — the backend seam; [`LocalStore`] keeps manifests on disk
//!
//! Content identity is the digest alone. Size and media type travel with a
//! descriptor but never decide whether a push happens.

pub mod content;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod publish;
pub mod reference;
pub mod resolve;
pub mod store;

// Re-exports for convenience.
pub use content::{parse_media_type, prepare_content};
pub use descriptor::Descriptor;
pub use digest::Digest;
pub use error::{Error, Result};
pub use publish::{decide, publish, Decision, PublishOutcome, Publisher};
pub use reference::Reference;
pub use resolve::{Resolution, Resolver};
pub use store::{LocalStore, Store};
