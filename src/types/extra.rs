use super::package_name::{normalize, ParsePackageNameError};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An optional feature of a package, the `socks` in `requests[socks]`. Extras are compared in
/// their normalized form (PEP 685), so `Socks` and `socks` name the same extra.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Extra(Box<str>);

impl Extra {
    /// Returns the normalized name of the extra.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Extra {
    type Err = ParsePackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).map(Self)
    }
}

impl Display for Extra {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
