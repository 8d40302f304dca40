//! Container image references
//!
//! Parses `[registry[:port]/]repository[/path...][:tag][@digest]` so that a
//! malformed reference is rejected while the descriptor is checked, instead of
//! surfacing later as a provisioning failure.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<name>[A-Za-z0-9._:/-]+?)",
        r"(?::(?P<tag>[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}))?",
        r"(?:@(?P<digest>[a-z0-9]+(?:[+._-][a-z0-9]+)*:[a-fA-F0-9]{32,}))?$",
    ))
    .expect("image reference pattern is valid")
});

static COMPONENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("component pattern is valid")
});

static REGISTRY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]+)?$")
        .expect("registry pattern is valid")
});

/// A parsed container image reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageReference {
    registry: Option<String>,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    /// Parses an image reference.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidImage`] when the reference is empty,
    /// contains whitespace, or a component breaks the reference grammar.
    pub fn parse(reference: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidImage {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(invalid("reference contains whitespace"));
        }

        let caps = REFERENCE_PATTERN
            .captures(reference)
            .ok_or_else(|| invalid("malformed tag or digest"))?;

        let name = caps.name("name").map_or("", |m| m.as_str());
        let tag = caps.name("tag").map(|m| m.as_str().to_string());
        let digest = caps.name("digest").map(|m| m.as_str().to_string());

        let mut components: Vec<&str> = name.split('/').collect();

        let registry = if components.len() > 1 && is_registry(components[0]) {
            let host = components.remove(0);
            if !REGISTRY_PATTERN.is_match(host) {
                return Err(invalid("malformed registry host"));
            }
            Some(host.to_string())
        } else {
            None
        };

        for component in &components {
            if !COMPONENT_PATTERN.is_match(component) {
                return Err(invalid(
                    "repository components must be lowercase alphanumerics separated by '.', '_' or '-'",
                ));
            }
        }

        Ok(Self {
            registry,
            repository: components.join("/"),
            tag,
            digest,
        })
    }

    /// Registry host, if the reference names one
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Repository path without registry, tag or digest
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag, if present
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Digest, if present
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

/// Docker's rule: the first path component is a host only when it looks like one.
fn is_registry(component: &str) -> bool {
    component == "localhost" || component.contains('.') || component.contains(':')
}

impl fmt::Display for ImageReference {
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

impl FromStr for ImageReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageReference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageReference> for String {
    fn from(value: ImageReference) -> Self {
        value.to_string()
    }
}
