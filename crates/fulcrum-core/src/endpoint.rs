//! Endpoint descriptors and the registry that maps logical names to them.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::SyncError;

const KEY_SLOT: &str = "{key}";

/// Which orchestrator drives an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// One flat top-level collection.
    Direct,
    /// One sub-collection per key read from an external key source.
    ListDriven,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Direct => f.pad("direct"),
            SyncMode::ListDriven => f.pad("list-driven"),
        }
    }
}

/// A slash-separated path relative to the API base URL, with at most one
/// `{key}` segment standing in for a parent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathTemplate(&'static str);

impl PathTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    fn raw_segments(&self) -> impl Iterator<Item = &'static str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    fn slot_count(&self) -> usize {
        self.raw_segments().filter(|s| *s == KEY_SLOT).count()
    }

    /// True if the template has a parent-key slot.
    pub fn requires_key(&self) -> bool {
        self.slot_count() > 0
    }

    /// Resolve the template into unescaped path segments.
    ///
    /// A key must be supplied exactly when the template has a slot.
    pub fn segments(&self, key: Option<&str>) -> Result<Vec<String>, SyncError> {
        match (self.requires_key(), key) {
            (true, None) => {
                return Err(SyncError::ConfigError(format!(
                    "path '{}' needs a parent key",
                    self.0
                )));
            }
            (false, Some(key)) => {
                return Err(SyncError::ConfigError(format!(
                    "path '{}' takes no parent key, got '{key}'",
                    self.0
                )));
            }
            _ => {}
        }

        Ok(self
            .raw_segments()
            .map(|s| match (s, key) {
                (KEY_SLOT, Some(key)) => key.to_string(),
                _ => s.to_string(),
            })
            .collect())
    }
}

/// Static description of one remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    /// Logical name used on the command line.
    pub name: &'static str,
    pub description: &'static str,
    pub method: &'static str,
    pub path: PathTemplate,
    /// Entity type tag: selects the decoder and names the checkpoint record.
    pub entity: &'static str,
    pub mode: SyncMode,
}

impl EndpointDescriptor {
    /// Check the descriptor is internally consistent.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.is_empty() || self.entity.is_empty() {
            return Err(SyncError::ConfigError(
                "endpoint name and entity tag must not be empty".into(),
            ));
        }
        if self.path.slot_count() > 1 {
            return Err(SyncError::ConfigError(format!(
                "endpoint '{}': path '{}' has more than one key slot",
                self.name,
                self.path.as_str()
            )));
        }
        let expected = if self.path.requires_key() {
            SyncMode::ListDriven
        } else {
            SyncMode::Direct
        };
        if self.mode != expected {
            return Err(SyncError::ConfigError(format!(
                "endpoint '{}' is registered as {} but path '{}' implies {}",
                self.name,
                self.mode,
                self.path.as_str(),
                expected
            )));
        }
        Ok(())
    }
}

const fn direct(
    name: &'static str,
    entity: &'static str,
    path: &'static str,
    description: &'static str,
) -> EndpointDescriptor {
    EndpointDescriptor {
        name,
        description,
        method: "GET",
        path: PathTemplate::new(path),
        entity,
        mode: SyncMode::Direct,
    }
}

const fn per_candidate(
    name: &'static str,
    entity: &'static str,
    path: &'static str,
    description: &'static str,
) -> EndpointDescriptor {
    EndpointDescriptor {
        name,
        description,
        method: "GET",
        path: PathTemplate::new(path),
        entity,
        mode: SyncMode::ListDriven,
    }
}

/// Endpoints shipped with Fulcrum.
pub const STANDARD_ENDPOINTS: &[EndpointDescriptor] = &[
    direct("users", "users", "users", "Download all users"),
    direct("candidates", "candidates", "candidates", "Download all candidates"),
    direct("postings", "postings", "postings", "Download all job postings"),
    direct(
        "archive-reasons",
        "archive_reasons",
        "archive_reasons",
        "Download the reasons a candidate can be archived for",
    ),
    direct(
        "stages",
        "stages",
        "stages",
        "Download every stage in the pipeline",
    ),
    per_candidate(
        "interviews",
        "interviews",
        "candidates/{key}/interviews",
        "Download interviews for each listed candidate",
    ),
    per_candidate(
        "referrals",
        "referrals",
        "candidates/{key}/referrals",
        "Download referrals for each listed candidate",
    ),
    per_candidate(
        "feedback",
        "feedback",
        "candidates/{key}/feedback",
        "Download feedback forms for each listed candidate",
    ),
    per_candidate(
        "resumes",
        "resumes",
        "candidates/{key}/resumes",
        "Download resumes for each listed candidate",
    ),
    per_candidate(
        "applications",
        "applications",
        "candidates/{key}/applications",
        "Download job applications for each listed candidate",
    ),
];

/// Lookup table from logical endpoint name to descriptor.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointRegistry {
    /// Build a registry, validating every descriptor and rejecting duplicate names.
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Result<Self, SyncError> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            endpoint.validate()?;
            if !seen.insert(endpoint.name) {
                return Err(SyncError::ConfigError(format!(
                    "endpoint '{}' registered twice",
                    endpoint.name
                )));
            }
        }
        Ok(Self { endpoints })
    }

    /// The built-in endpoint set.
    pub fn standard() -> Self {
        Self {
            endpoints: STANDARD_ENDPOINTS.to_vec(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&EndpointDescriptor, SyncError> {
        self.endpoints
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| {
                SyncError::ConfigError(format!(
                    "endpoint '{name}' is not registered (see `fulcrum endpoints`)"
                ))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }
}
