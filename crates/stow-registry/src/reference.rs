//! Target references: `[registry/]repository[:tag|@digest]`.
//!
//! The trailing tag or digest is what a store binds content to. A tag is a
//! mutable name; a digest names content immutably.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::digest::Digest;
use crate::error::{Error, Result};

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,127}$").expect("valid tag regex"))
}

fn component_pattern() -> &'static Regex {
    static COMPONENT: OnceLock<Regex> = OnceLock::new();
    COMPONENT.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("valid component regex")
    })
}

fn host_pattern() -> &'static Regex {
    static HOST: OnceLock<Regex> = OnceLock::new();
    HOST.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]+)?$")
            .expect("valid host regex")
    })
}

/// A parsed target reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Registry host (with optional port), if one was given.
    pub registry: Option<String>,
    /// Repository path, e.g. `library/hello`.
    pub repository: String,
    /// Tag, if one was given.
    pub tag: Option<String>,
    /// Digest, if one was given.
    pub digest: Option<Digest>,
}

impl Reference {
    /// Parse `[registry/]repository[:tag|@digest]`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::invalid("empty reference"));
        }

        let (name, digest) = match s.split_once('@') {
            Some((name, digest)) => (name, Some(Digest::parse(digest)?)),
            None => (s, None),
        };

        let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => (Some(first.to_string()), rest),
            _ => (None, name),
        };

        let reference = Reference {
            registry,
            repository: repository.to_string(),
            tag,
            digest,
        };
        reference.validate().map_err(|e| match e {
            Error::InvalidInput { detail } => Error::invalid(format!("{detail} in '{s}'")),
            other => other,
        })?;
        Ok(reference)
    }

    /// Check every part against its grammar.
    ///
    /// Registry and repository become filesystem path components in a
    /// [`LocalStore`](crate::store::LocalStore), so `.` and `..` never pass.
    pub fn validate(&self) -> Result<()> {
        if let Some(registry) = &self.registry {
            if !host_pattern().is_match(registry) {
                return Err(Error::invalid(format!("invalid registry '{registry}'")));
            }
        }

        if self.repository.is_empty()
            || !self
                .repository
                .split('/')
                .all(|component| component_pattern().is_match(component))
        {
            return Err(Error::invalid(format!(
                "invalid repository name '{}'",
                self.repository
            )));
        }

        if let Some(tag) = &self.tag {
            validate_tag(tag)?;
        }
        Ok(())
    }

    /// The tag or digest content is bound to, if any was given.
    ///
    /// A digest takes precedence over a tag.
    pub fn reference(&self) -> Option<String> {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => Some(digest.to_string()),
            (None, Some(tag)) => Some(tag.clone()),
            (None, None) => None,
        }
    }

    /// The reference to publish under, falling back to the content's digest.
    pub fn reference_or(&self, content: &Digest) -> String {
        self.reference().unwrap_or_else(|| content.to_string())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

/// Check that a bare reference is a valid tag or digest.
pub fn validate_reference(reference: &str) -> Result<()> {
    if reference.is_empty() {
        return Err(Error::invalid("empty reference"));
    }
    if reference.contains(':') {
        Digest::parse(reference).map(|_| ())
    } else {
        validate_tag(reference)
    }
}

/// Whether a bare reference names content by digest rather than by tag.
pub fn is_digest_reference(reference: &str) -> bool {
    reference.contains(':') && Digest::parse(reference).is_ok()
}

fn validate_tag(tag: &str) -> Result<()> {
    if !tag_pattern().is_match(tag) {
        return Err(Error::invalid(format!("invalid tag '{tag}'")));
    }
    Ok(())
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}
