//! Store trait and local filesystem implementation.
//!
//! The `Store` trait is the seam between publishing logic and whatever holds
//! the content (a remote registry, a directory, a test double). The
//! `LocalStore` keeps manifests in a content-addressed directory tree.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::reference::{is_digest_reference, Reference};

/// A content-addressable store that binds references to content.
///
/// A store handle is fully configured on construction; operations carry no
/// credentials or transport settings.
pub trait Store {
    /// Fetch the descriptor bound to a tag or digest.
    ///
    /// Returns [`Error::NotFound`] when nothing is bound to the reference.
    fn resolve(&self, reference: &str) -> Result<Descriptor>;

    /// Upload content and bind it to a reference.
    fn push_reference(
        &self,
        descriptor: &Descriptor,
        content: &mut dyn Read,
        reference: &str,
    ) -> Result<()>;
}

impl<S: Store + ?Sized> Store for &S {
    fn resolve(&self, reference: &str) -> Result<Descriptor> {
        (**self).resolve(reference)
    }

    fn push_reference(
        &self,
        descriptor: &Descriptor,
        content: &mut dyn Read,
        reference: &str,
    ) -> Result<()> {
        (**self).push_reference(descriptor, content, reference)
    }
}

/// On-disk index of a repository in a [`LocalStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct RepositoryIndex {
    /// Stored manifests keyed by digest string.
    #[serde(default)]
    manifests: BTreeMap<String, Descriptor>,
    /// Tag bindings: tag → digest string.
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// A filesystem store for one repository.
///
/// Layout:
/// ```text
/// <root>/
///   [<registry>/]<repository>/
///     index.json
///     blobs/
///       <algorithm>/<encoded>
/// ```
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open the store for a repository under `root`.
    ///
    /// The reference is validated first so every path component stays under
    /// `root`. Nothing is created until the first push.
    pub fn open(root: &Path, target: &Reference) -> Result<Self> {
        target.validate()?;
        let mut dir = root.to_path_buf();
        if let Some(registry) = &target.registry {
            // Ports are not valid path characters everywhere.
            dir.push(registry.replace(':', "_"));
        }
        for component in target.repository.split('/') {
            dir.push(component);
        }
        Ok(LocalStore { dir })
    }

    /// Get the repository directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the raw bytes of stored content.
    pub fn fetch(&self, digest: &Digest) -> Result<Vec<u8>> {
        let path = self.blob_path(digest)?;
        if !path.is_file() {
            return Err(Error::NotFound {
                reference: digest.to_string(),
            });
        }
        Ok(std::fs::read(path)?)
    }

    /// List tags in lexical order.
    pub fn tags(&self) -> Result<Vec<String>> {
        Ok(self.load_index()?.tags.into_keys().collect())
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("index.json")
    }

    fn blob_path(&self, digest: &Digest) -> Result<PathBuf> {
        digest.validate_encoding()?;
        Ok(self
            .dir
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.encoded()))
    }

    fn load_index(&self) -> Result<RepositoryIndex> {
        let path = self.index_path();
        if !path.is_file() {
            return Ok(RepositoryIndex::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_index(&self, index: &RepositoryIndex) -> Result<()> {
        write_atomic(&self.index_path(), serde_json::to_string_pretty(index)?.as_bytes())
    }
}

impl Store for LocalStore {
    fn resolve(&self, reference: &str) -> Result<Descriptor> {
        let index = self.load_index()?;
        let digest = if is_digest_reference(reference) {
            Some(reference)
        } else {
            index.tags.get(reference).map(String::as_str)
        };

        digest
            .and_then(|d| index.manifests.get(d))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                reference: reference.to_string(),
            })
    }

    fn push_reference(
        &self,
        descriptor: &Descriptor,
        content: &mut dyn Read,
        reference: &str,
    ) -> Result<()> {
        let digest_ref = is_digest_reference(reference);
        if digest_ref && reference != descriptor.digest.as_str() {
            return Err(Error::invalid(format!(
                "reference {reference} does not match content digest {}",
                descriptor.digest
            )));
        }

        let blob_path = self.blob_path(&descriptor.digest)?;

        // Read one byte past the declared size so oversize content is caught.
        let mut data = Vec::new();
        content
            .take(descriptor.size.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 != descriptor.size {
            return Err(Error::SizeMismatch {
                expected: descriptor.size,
                actual: data.len() as u64,
            });
        }
        descriptor.digest.verify(&data)?;

        if !blob_path.is_file() {
            write_atomic(&blob_path, &data)?;
        }

        let mut index = self.load_index()?;
        let key = descriptor.digest.to_string();
        index.manifests.insert(key.clone(), descriptor.clone());
        if !digest_ref {
            index.tags.insert(reference.to_string(), key);
        }
        self.save_index(&index)?;

        tracing::debug!(
            dir = %self.dir.display(),
            reference,
            digest = %descriptor.digest,
            "stored manifest"
        );
        Ok(())
    }
}

/// Write a file by persisting a uniquely named sibling temp file over it.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::OCI_IMAGE_MANIFEST;

    const MANIFEST: &[u8] = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json"}"#;

    fn open(dir: &Path) -> LocalStore {
        LocalStore::open(dir, &Reference::parse("localhost:5000/hello").unwrap()).unwrap()
    }

    #[test]
    fn open_rejects_escaping_reference() {
        let dir = tempfile::tempdir().unwrap();
        let escaped = Reference {
            registry: Some("..".to_string()),
            repository: "escaped".to_string(),
            tag: None,
            digest: None,
        };
        assert!(matches!(
            LocalStore::open(dir.path(), &escaped),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn writes_stay_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let store = open(&root);
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, MANIFEST);

        store
            .push_reference(&desc, &mut &MANIFEST[..], "latest")
            .unwrap();

        let outside: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(outside, vec![std::ffi::OsString::from("store")]);
        assert!(store.dir().starts_with(&root));

        let mut repo: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        repo.sort();
        // No temp files left behind.
        assert_eq!(repo, vec!["blobs".to_string(), "index.json".to_string()]);
    }

    #[test]
    fn overlapping_writes_to_one_path_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        std::thread::scope(|scope| {
            let writers: Vec<_> = (0..8u8)
                .map(|i| {
                    let path = &path;
                    scope.spawn(move || {
                        for _ in 0..20 {
                            write_atomic(path, &[i; 64])?;
                        }
                        Ok::<_, Error>(())
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap().unwrap();
            }
        });

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|b| *b == data[0]));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn push_and_resolve_by_tag_and_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, MANIFEST);

        store
            .push_reference(&desc, &mut &MANIFEST[..], "latest")
            .unwrap();

        assert_eq!(store.resolve("latest").unwrap(), desc);
        assert_eq!(store.resolve(desc.digest.as_str()).unwrap(), desc);
        assert_eq!(store.fetch(&desc.digest).unwrap(), MANIFEST);
        assert_eq!(store.tags().unwrap(), vec!["latest".to_string()]);
    }

    #[test]
    fn layout_uses_registry_and_repository() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        assert_eq!(store.dir(), dir.path().join("localhost_5000").join("hello"));
    }

    #[test]
    fn resolve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        assert!(store.resolve("latest").unwrap_err().is_not_found());
        assert!(store
            .resolve(Digest::sha256(b"x").as_str())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn retag_moves_binding() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let first = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, b"{\"v\":1}");
        let second = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, b"{\"v\":2}");

        store
            .push_reference(&first, &mut &b"{\"v\":1}"[..], "latest")
            .unwrap();
        store
            .push_reference(&second, &mut &b"{\"v\":2}"[..], "latest")
            .unwrap();

        assert_eq!(store.resolve("latest").unwrap(), second);
        // The old manifest stays addressable by digest.
        assert_eq!(store.resolve(first.digest.as_str()).unwrap(), first);
    }

    #[test]
    fn push_by_digest_binds_no_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, MANIFEST);

        store
            .push_reference(&desc, &mut &MANIFEST[..], desc.digest.as_str())
            .unwrap();

        assert!(store.tags().unwrap().is_empty());
        assert_eq!(store.resolve(desc.digest.as_str()).unwrap(), desc);
    }

    #[test]
    fn reject_mismatched_digest_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, MANIFEST);
        let other = Digest::sha256(b"other");

        let result = store.push_reference(&desc, &mut &MANIFEST[..], other.as_str());
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn reject_tampered_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, b"abcd");

        let result = store.push_reference(&desc, &mut &b"abce"[..], "latest");
        assert!(matches!(result, Err(Error::DigestMismatch { .. })));
        assert!(store.resolve("latest").unwrap_err().is_not_found());
    }

    #[test]
    fn reject_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::from_bytes(OCI_IMAGE_MANIFEST, b"abcd");

        let long = store.push_reference(&desc, &mut &b"abcde"[..], "latest");
        assert!(matches!(long, Err(Error::SizeMismatch { actual: 5, .. })));
        let short = store.push_reference(&desc, &mut &b"abc"[..], "latest");
        assert!(matches!(short, Err(Error::SizeMismatch { actual: 3, .. })));
    }

    #[test]
    fn reject_uncomputable_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let desc = Descriptor::new(OCI_IMAGE_MANIFEST, Digest::parse("sha256:aaa").unwrap(), 2);

        let result = store.push_reference(&desc, &mut &b"{}"[..], "latest");
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }
}
