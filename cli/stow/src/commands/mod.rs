//! CLI command implementations.

pub mod manifest;
