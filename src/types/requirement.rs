use super::extra::Extra;
use super::package_name::{NormalizedPackageName, ParsePackageNameError};
use super::version_set::VersionSet;
use miette::Diagnostic;
use pep508_rs::{MarkerEnvironment, MarkerTree, MarkerValue, Requirement, VersionOrUrl};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::borrow::Borrow;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

/// A requirement that the resolver cannot work with.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum RequirementError {
    #[error(transparent)]
    Parse(#[from] pep508_rs::Pep508Error),

    #[error(transparent)]
    InvalidName(#[from] ParsePackageNameError),

    /// Direct references (`name @ url`) cannot be answered by a version index.
    #[error("'{0}' refers to a url, only version specifiers are supported")]
    DirectReference(String),

    #[error("the 'extra' marker can only be used in the metadata of a package")]
    ExtraMarker,
}

/// The questions the resolver asks of a PEP 508 [`Requirement`].
pub trait RequirementExt {
    /// Returns the normalized name of the required package.
    fn package_name(&self) -> Result<NormalizedPackageName, RequirementError>;

    /// Returns the optional features of the package that are required.
    fn requested_extras(&self) -> Result<Vec<Extra>, RequirementError>;

    /// Returns the set of versions this requirement accepts.
    fn version_set(&self) -> Result<VersionSet, RequirementError>;

    /// Returns true if the requirement applies in the given environment. `extra` is the optional
    /// feature of the requiring package that is being evaluated, if any.
    fn applies_to(&self, env: &MarkerEnvironment, extra: Option<&Extra>) -> bool;
}

impl RequirementExt for Requirement {
    fn package_name(&self) -> Result<NormalizedPackageName, RequirementError> {
        Ok(NormalizedPackageName::from_str(&self.name)?)
    }

    fn requested_extras(&self) -> Result<Vec<Extra>, RequirementError> {
        self.extras
            .iter()
            .flatten()
            .map(|extra| Ok(Extra::from_str(extra)?))
            .collect()
    }

    fn version_set(&self) -> Result<VersionSet, RequirementError> {
        match &self.version_or_url {
            None => Ok(VersionSet::any()),
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                Ok(VersionSet::from_specifiers(specifiers))
            }
            Some(VersionOrUrl::Url(_)) => Err(RequirementError::DirectReference(self.name.clone())),
        }
    }

    fn applies_to(&self, env: &MarkerEnvironment, extra: Option<&Extra>) -> bool {
        let extras: Vec<&str> = extra.map(Extra::as_str).into_iter().collect();
        self.marker
            .as_ref()
            .map_or(true, |marker| marker.evaluate(env, &extras))
    }
}

fn refers_to_extra(marker: &MarkerTree) -> bool {
    match marker {
        MarkerTree::Expression(expr) => {
            matches!(expr.l_value, MarkerValue::Extra) || matches!(expr.r_value, MarkerValue::Extra)
        }
        MarkerTree::And(trees) | MarkerTree::Or(trees) => trees.iter().any(refers_to_extra),
    }
}

/// A requirement as written by a user, for example on the command line. These may not refer to
/// the `extra` marker variable and must name versions, not urls.
#[derive(Debug, Clone, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct UserRequirement(Requirement);

impl UserRequirement {
    /// Returns the underlying requirement.
    pub fn into_inner(self) -> Requirement {
        self.0
    }

    /// Returns a reference to the underlying requirement.
    pub fn as_inner(&self) -> &Requirement {
        &self.0
    }
}

impl Display for UserRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserRequirement {
    type Err = RequirementError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let requirement = Requirement::from_str(value)?;
        requirement.package_name()?;
        requirement.requested_extras()?;
        requirement.version_set()?;
        if requirement.marker.as_ref().is_some_and(refers_to_extra) {
            return Err(RequirementError::ExtraMarker);
        }
        Ok(UserRequirement(requirement))
    }
}

impl AsRef<Requirement> for UserRequirement {
    fn as_ref(&self) -> &Requirement {
        &self.0
    }
}

impl Borrow<Requirement> for UserRequirement {
    fn borrow(&self) -> &Requirement {
        &self.0
    }
}

impl Deref for UserRequirement {
    type Target = Requirement;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
