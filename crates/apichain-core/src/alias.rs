//! Contextual aliasing: resource-scoped names for generic ids
//!
//! `GET /drivers` returning `{"id": "42"}` teaches `driver_id`, `driverId`
//! and `driverOf`, so a later `/drivers/{driver_id}` resolves exactly
//! instead of relying on the generic id fallback.

use crate::context::Identifiers;

/// Generic id keys copied into resource-scoped aliases, lowest precedence first.
pub const DEFAULT_SOURCE_KEYS: &[&str] = &["id", "uuid", "_id", "userId"];

/// Strategy for deriving alias keys from a path template and learned ids.
pub trait Aliaser: Send + Sync {
    /// Return `learned` augmented with derived aliases.
    fn alias(&self, path_template: &str, learned: Identifiers) -> Identifiers;
}

/// Naive English singularization of the final path segment.
///
/// `/drivers` → `driver`, `/status` → `statu`, `/people` → `people`.
/// Irregular plurals are not handled.
#[derive(Debug, Clone)]
pub struct PluralStripAliaser {
    source_keys: Vec<String>,
}

impl Default for PluralStripAliaser {
    fn default() -> Self {
        Self::with_source_keys(DEFAULT_SOURCE_KEYS.iter().copied())
    }
}

impl PluralStripAliaser {
    /// Use a custom precedence list. Later keys overwrite earlier ones.
    #[must_use]
    pub fn with_source_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn source_keys(&self) -> &[String] {
        &self.source_keys
    }
}

impl Aliaser for PluralStripAliaser {
    fn alias(&self, path_template: &str, mut learned: Identifiers) -> Identifiers {
        let Some(resource) = resource_name(path_template) else {
            return learned;
        };
        let singular = resource.strip_suffix('s').unwrap_or(resource);

        // Sources are read from the map being augmented, so an alias written
        // for an earlier key is visible when a later source key is checked.
        for key in &self.source_keys {
            let Some(value) = learned.get(key).filter(|v| !v.is_empty()).cloned() else {
                continue;
            };
            for suffix in ["_id", "Id", "Of"] {
                learned.insert(format!("{singular}{suffix}"), value.clone());
            }
        }
        learned
    }
}

/// Final non-empty path segment, unless that segment is a placeholder.
#[must_use]
pub fn resource_name(path_template: &str) -> Option<&str> {
    path_template
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .filter(|s| !s.contains('{'))
}

/// Alias with the default strategy and source keys.
#[must_use]
pub fn alias(path_template: &str, learned: Identifiers) -> Identifiers {
    PluralStripAliaser::default().alias(path_template, learned)
}
