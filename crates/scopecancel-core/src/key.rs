//! Scope key normalization.
//!
//! A [`ScopeKey`] identifies one cancellation domain. Missing or empty parts
//! collapse to the empty string, so keys built from partial input still
//! compare equal to keys built from explicit empty strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Canonical `(scope, project_id, task_id)` triple.
///
/// Equality, ordering and hashing are structural over the three parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeKey {
    #[serde(default, deserialize_with = "empty_if_null")]
    scope: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    project_id: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    task_id: String,
}

impl ScopeKey {
    /// Build a key from three present parts.
    pub fn new(
        scope: impl Into<String>,
        project_id: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            project_id: project_id.into(),
            task_id: task_id.into(),
        }
    }

    /// Build a key from parts that may be absent.
    ///
    /// `None` normalizes to the empty string.
    pub fn from_parts(
        scope: Option<&str>,
        project_id: Option<&str>,
        task_id: Option<&str>,
    ) -> Self {
        Self::new(
            scope.unwrap_or_default(),
            project_id.unwrap_or_default(),
            task_id.unwrap_or_default(),
        )
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.scope, self.project_id, self.task_id)
    }
}

impl<A, B, C> From<(A, B, C)> for ScopeKey
where
    A: Into<String>,
    B: Into<String>,
    C: Into<String>,
{
    fn from((scope, project_id, task_id): (A, B, C)) -> Self {
        Self::new(scope, project_id, task_id)
    }
}

fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
