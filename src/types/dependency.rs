use super::package_name::NormalizedPackageName;
use pep440_rs::Version;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use std::fmt::{Display, Formatter};

/// A single resolved package: a name and the concrete version that was selected for it.
///
/// This is the output of a resolution and the input of whatever consumes it, for instance a
/// vulnerability lookup. The version is always an exact release, never a range.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    /// The normalized name of the package
    pub name: NormalizedPackageName,

    /// The selected version
    #[serde_as(as = "DisplayFromStr")]
    pub version: Version,
}

impl Dependency {
    /// Constructs a new instance.
    pub fn new(name: NormalizedPackageName, version: Version) -> Self {
        Self { name, version }
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}
