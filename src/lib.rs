#![deny(missing_docs)]

//! Resolves the dependencies of Python packages against a PyPI compatible index.
//!
//! Given one or more requirements, like `flask>=3`, a [`Resolver`] finds a version for every
//! package that is needed, such that every requirement of every selected package holds. The
//! result is a list of [`Dependency`] records sorted by name, each with an exact version.
//!
//! ```no_run
//! # async fn example() -> miette::Result<()> {
//! use pypi_resolver::{Pep508EnvMarkers, ResolveOptions, Resolver, UserRequirement};
//! use pypi_resolver::index::PyPiSourceConfig;
//!
//! let resolver = Resolver::pypi(
//!     PyPiSourceConfig::default(),
//!     Pep508EnvMarkers::default(),
//!     ResolveOptions::default(),
//! )?;
//! let requirement: UserRequirement = "flask>=3".parse()?;
//! for dependency in resolver.resolve(&requirement).await? {
//!     println!("{dependency}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod index;
pub mod resolve;
pub mod types;

pub use resolve::{ResolutionError, ResolveOptions, Resolver};
pub use types::{
    Dependency, Extra, NormalizedPackageName, Pep508EnvMarkers, Requirement, RequirementError,
    RequirementExt, UserRequirement, Version, VersionSet, VersionSpecifiers,
};
