//! `stow manifest push` — publish a manifest file under a reference.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stow_registry::{LocalStore, PublishOutcome, Reference};

use crate::confirmation::Confirm;
use crate::config::StowConfig;

/// Options for `stow manifest push`.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Target reference, `[registry/]repository[:tag|@digest]`.
    pub target: String,
    /// Manifest file to publish.
    pub file: PathBuf,
    /// Media type override; read from the file when absent.
    pub media_type: Option<String>,
    /// Print the descriptor JSON instead of the summary.
    pub descriptor: bool,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Ask before publishing.
    pub confirm: bool,
    /// Store root override.
    pub store_root: Option<PathBuf>,
}

/// Run `stow manifest push`.
///
/// Returns the publish outcome, or `None` when the confirmation was declined.
pub fn push(
    opts: &PushOptions,
    config: &StowConfig,
    config_dir: &Path,
    confirm: &mut dyn Confirm,
    out: &mut dyn Write,
) -> Result<Option<PublishOutcome>> {
    let target = Reference::parse(&opts.target)
        .with_context(|| format!("invalid target '{}'", opts.target))?;

    let media_type = match &opts.media_type {
        Some(media_type) => media_type.clone(),
        None => stow_registry::parse_media_type(&opts.file)
            .with_context(|| format!("reading media type from {}", opts.file.display()))?,
    };

    let (descriptor, mut content) = stow_registry::prepare_content(&opts.file, &media_type)
        .with_context(|| format!("preparing {}", opts.file.display()))?;
    let reference = target.reference_or(&descriptor.digest);

    if opts.confirm {
        let prompt = format!("Push {} to {target}?", opts.file.display());
        if !confirm.confirm(&prompt)? {
            writeln!(out, "Operation cancelled.")?;
            return Ok(None);
        }
    }

    let root = opts
        .store_root
        .clone()
        .unwrap_or_else(|| config.store_root(config_dir));
    let store = LocalStore::open(&root, &target)?;
    tracing::debug!(store = %store.dir().display(), %reference, "publishing manifest");

    let outcome = stow_registry::publish(&store, &reference, &descriptor, &mut content)?;

    if opts.descriptor {
        let json = if opts.pretty || config.output.pretty {
            serde_json::to_string_pretty(&outcome.descriptor)?
        } else {
            serde_json::to_string(&outcome.descriptor)?
        };
        writeln!(out, "{json}")?;
    } else {
        if outcome.performed {
            writeln!(out, "Pushed {}", opts.target)?;
        } else {
            writeln!(out, "Skipped {}: manifest already exists", opts.target)?;
        }
        writeln!(out, "Digest: {}", outcome.descriptor.digest)?;
    }

    Ok(Some(outcome))
}
