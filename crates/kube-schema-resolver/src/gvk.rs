use std::fmt;
use std::str::FromStr;

/// An API group and version, e.g. `apps/v1` or `v1` for the core group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    #[must_use]
    pub fn with_kind(self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group,
            version: self.version,
            kind: kind.into(),
        }
    }

    /// Path of this group version in the OpenAPI v3 discovery document.
    ///
    /// The core group lives under `api/<version>`, every other group under
    /// `apis/<group>/<version>`.
    #[must_use]
    pub fn discovery_path(&self) -> String {
        if self.group.is_empty() {
            format!("api/{}", self.version)
        } else {
            format!("apis/{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid apiVersion {0:?}")]
pub struct InvalidApiVersion(pub String);

impl FromStr for GroupVersion {
    type Err = InvalidApiVersion;

    /// Parses an `apiVersion` such as `v1` or `networking.k8s.io/v1`.
    fn from_str(api_version: &str) -> Result<Self, Self::Err> {
        let trimmed = api_version.trim();
        let (group, version) = match trimmed.split_once('/') {
            Some((g, v)) => (g.trim(), v.trim()),
            None => ("", trimmed),
        };
        if version.is_empty() || version.contains('/') || (trimmed.contains('/') && group.is_empty())
        {
            return Err(InvalidApiVersion(api_version.to_string()));
        }
        Ok(Self::new(group, version))
    }
}

/// Group, version and kind of a Kubernetes resource type.
///
/// Equality is structural over all three fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    #[must_use]
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}
