//! Types that describe python packages, versions and the requirements between them.
//!
//! Versions, version specifiers, requirements and marker environments come from [`pep440_rs`] and
//! [`pep508_rs`]. This module adds the normalized names the index is keyed by and the
//! [`VersionSet`] the resolver narrows while it searches.

mod dependency;
mod env_markers;
mod extra;
mod package_name;
mod requirement;
mod version_set;

pub use dependency::Dependency;
pub use env_markers::{FromPythonError, Pep508EnvMarkers};
pub use extra::Extra;
pub use package_name::{NormalizedPackageName, ParsePackageNameError};
pub use pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};
pub use pep508_rs::{MarkerEnvironment, Requirement, VersionOrUrl};
pub use requirement::{RequirementError, RequirementExt, UserRequirement};
pub use version_set::{intersect, satisfies, VersionSet};
