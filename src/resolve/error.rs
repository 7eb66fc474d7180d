use super::candidate::{Candidate, PackageKey};
use crate::index::IndexError;
use crate::types::{Version, VersionSet};
use miette::Diagnostic;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Records who imposed a constraint on a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintOrigin {
    /// The candidate that declared the requirement, `None` for a root requirement.
    pub required_by: Option<Candidate>,

    /// The versions the requirement accepts.
    pub versions: VersionSet,
}

impl Display for ConstraintOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.required_by {
            Some(candidate) => write!(f, "{candidate} requires {}", self.versions),
            None => write!(f, "the root requires {}", self.versions),
        }
    }
}

/// Why the constraints on a package could not be met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// None of the known versions of the package lies within the constraint.
    NoMatchingVersions,

    /// The requirements on the package do not overlap.
    EmptyIntersection,

    /// A version of the package was already selected and a later requirement excludes it.
    ExcludesAssigned(Version),

    /// A pre-release was selected but the final constraint does not name a pre-release.
    PrereleaseNotRequested(Version),

    /// A yanked version was selected but the final constraint does not pin it with `==`.
    YankedNotPinned(Version),
}

/// The last conflict the resolver ran into before it gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The package whose constraints could not be met.
    pub package: PackageKey,

    /// The combined constraint on the package at the time of the conflict.
    pub versions: VersionSet,

    /// Why the constraint could not be met.
    pub reason: ConflictReason,

    /// The requirements that contributed to the constraint, in the order they were added.
    pub origins: Vec<ConstraintOrigin>,
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            ConflictReason::NoMatchingVersions => write!(
                f,
                "there is no version of {} that matches {}",
                self.package, self.versions
            )?,
            ConflictReason::EmptyIntersection => {
                write!(f, "the requirements on {} are incompatible", self.package)?
            }
            ConflictReason::ExcludesAssigned(version) => write!(
                f,
                "{} {version} was selected but is excluded by {}",
                self.package, self.versions
            )?,
            ConflictReason::PrereleaseNotRequested(version) => write!(
                f,
                "{} {version} is a pre-release but {} does not ask for one",
                self.package, self.versions
            )?,
            ConflictReason::YankedNotPinned(version) => write!(
                f,
                "{} {version} has been yanked and {} does not pin it",
                self.package, self.versions
            )?,
        }
        for origin in &self.origins {
            write!(f, "\n  - {origin}")?;
        }
        Ok(())
    }
}

/// The error that is returned by a resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolutionError {
    /// No combination of versions satisfies all requirements.
    #[error("the requirements cannot be satisfied: {0}")]
    UnsatisfiableConstraints(Conflict),

    /// The package index could not be queried. This says nothing about whether a solution exists.
    #[error("failed to look up packages in the index")]
    IndexLookupFailure(
        #[from]
        #[diagnostic_source]
        IndexError,
    ),

    /// A root requirement could not be understood.
    #[error("invalid requirement '{requirement}': {reason}")]
    InvalidRequirement {
        /// The requirement as it was given
        requirement: String,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::VersionSpecifiers;
    use std::str::FromStr;

    fn set(s: &str) -> VersionSet {
        VersionSet::from_specifiers(&VersionSpecifiers::from_str(s).unwrap())
    }

    #[test]
    fn test_conflict_display() {
        let conflict = Conflict {
            package: PackageKey::Base("c".parse().unwrap()),
            versions: set(">=2.0").intersect(&set("==1.0")),
            reason: ConflictReason::EmptyIntersection,
            origins: vec![
                ConstraintOrigin {
                    required_by: Some(Candidate {
                        name: PackageKey::Base("a".parse().unwrap()),
                        version: Version::from_str("1.0").unwrap(),
                    }),
                    versions: set(">=2.0"),
                },
                ConstraintOrigin {
                    required_by: None,
                    versions: set("==1.0"),
                },
            ],
        };
        insta::assert_snapshot!(conflict.to_string(), @r###"
        the requirements on c are incompatible
          - a 1.0 requires >=2.0
          - the root requires ==1.0
        "###);
    }

    #[test]
    fn test_unselectable_display() {
        let conflict = Conflict {
            package: PackageKey::Base("a".parse().unwrap()),
            versions: set(">=1.0"),
            reason: ConflictReason::YankedNotPinned(Version::from_str("2.0").unwrap()),
            origins: vec![ConstraintOrigin {
                required_by: None,
                versions: set(">=1.0"),
            }],
        };
        insta::assert_snapshot!(conflict.to_string(), @r###"
        a 2.0 has been yanked and >=1.0 does not pin it
          - the root requires >=1.0
        "###);

        let conflict = Conflict {
            reason: ConflictReason::PrereleaseNotRequested(Version::from_str("2.0b1").unwrap()),
            origins: Vec::new(),
            ..conflict
        };
        insta::assert_snapshot!(
            conflict.to_string(),
            @"a 2.0b1 is a pre-release but >=1.0 does not ask for one"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ResolutionError::InvalidRequirement {
            requirement: "foo (".to_string(),
            reason: "unexpected end of input".to_string(),
        };
        insta::assert_snapshot!(err.to_string(), @"invalid requirement 'foo (': unexpected end of input");
    }
}
