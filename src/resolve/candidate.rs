use crate::types::{Extra, NormalizedPackageName, Version};
use std::fmt::{Display, Formatter};

/// Identifies a package inside the resolver.
///
/// Requesting an extra of a package, like `requests[socks]`, is modeled as a separate package
/// `requests[socks]`. It has the same versions as the base package, requires the base package at
/// exactly the same version and additionally requires everything the extra enables. This way the
/// resolver never has to know about extras.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageKey {
    /// A regular package
    Base(NormalizedPackageName),

    /// An optional feature of a package
    Extra(NormalizedPackageName, Extra),
}

impl PackageKey {
    /// Returns the name of the underlying package.
    pub fn base(&self) -> &NormalizedPackageName {
        match self {
            PackageKey::Base(name) | PackageKey::Extra(name, _) => name,
        }
    }

    /// Returns the extra this key refers to, if any.
    pub fn extra(&self) -> Option<&Extra> {
        match self {
            PackageKey::Base(_) => None,
            PackageKey::Extra(_, extra) => Some(extra),
        }
    }
}

impl From<NormalizedPackageName> for PackageKey {
    fn from(value: NormalizedPackageName) -> Self {
        PackageKey::Base(value)
    }
}

impl Display for PackageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageKey::Base(name) => write!(f, "{name}"),
            PackageKey::Extra(name, extra) => write!(f, "{name}[{extra}]"),
        }
    }
}

/// One concrete version of one package that is considered by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// The package
    pub name: PackageKey,

    /// The version of the package
    pub version: Version,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
