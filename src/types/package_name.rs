use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Names allowed by the core metadata `Name` field.
static VALID_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)^[a-z0-9](?:[a-z0-9._-]*[a-z0-9])?$").unwrap());

/// A run of separators, PEP 503 turns each run into a single `-`.
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_.]+").unwrap());

/// The string is not a valid package or extra name.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("'{0}' is not a valid package name")]
pub struct ParsePackageNameError(pub String);

/// Validates `name` and returns its normalized form. Extras share the rules of package names
/// (PEP 685).
pub(crate) fn normalize(name: &str) -> Result<Box<str>, ParsePackageNameError> {
    if !VALID_NAME.is_match(name) {
        return Err(ParsePackageNameError(name.to_owned()));
    }
    let mut normalized = SEPARATOR_RUN.replace_all(name, "-").into_owned();
    normalized.make_ascii_lowercase();
    Ok(normalized.into_boxed_str())
}

/// The [PEP 503](https://peps.python.org/pep-0503/#normalized-names) form of a package name:
/// lowercase, with every run of `-`, `_` and `.` replaced by a single `-`. `Zope.Interface`,
/// `zope_interface` and `ZOPE-INTERFACE` all normalize to `zope-interface`.
///
/// The index is keyed by this form and so is every package the resolver tracks.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct NormalizedPackageName(Box<str>);

impl NormalizedPackageName {
    /// Returns the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NormalizedPackageName {
    type Err = ParsePackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).map(Self)
    }
}

impl Display for NormalizedPackageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedPackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
