//! Preparing local files for publishing.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::{Error, Result};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaTypeProbe {
    #[serde(default)]
    media_type: Option<String>,
}

/// Read the `mediaType` field of a JSON manifest file.
pub fn parse_media_type(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let probe: MediaTypeProbe = serde_json::from_slice(&data)?;
    match probe.media_type {
        Some(media_type) if !media_type.is_empty() => Ok(media_type),
        _ => Err(Error::invalid(format!(
            "media type is not recognized in {}: specify it explicitly",
            path.display()
        ))),
    }
}

/// Describe a file and open it for reading.
///
/// The file is hashed in one streaming pass, then reopened so the returned
/// reader starts at offset zero.
pub fn prepare_content(path: &Path, media_type: &str) -> Result<(Descriptor, File)> {
    if media_type.is_empty() {
        return Err(Error::invalid("media type must not be empty"));
    }

    let mut file = File::open(path)?;
    let (digest, size) = Digest::sha256_reader(&mut file)?;
    let expected = file.metadata()?.len();
    if size != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: size,
        });
    }

    tracing::debug!(path = %path.display(), %digest, size, "prepared content");
    Ok((Descriptor::new(media_type, digest, size), File::open(path)?))
}
