use super::candidate::{Candidate, PackageKey};
use super::error::Conflict;
use crate::types::{Requirement, VersionSet};

/// Observes the decisions of the resolver. All methods do nothing by default, implement the ones
/// you care about.
pub trait Reporter: Send + Sync {
    /// Called once before the resolution starts.
    fn starting(&self, _roots: &[Requirement]) {}

    /// Called whenever a requirement narrows the versions of a package.
    fn adding_requirement(
        &self,
        _package: &PackageKey,
        _versions: &VersionSet,
        _required_by: Option<&Candidate>,
    ) {
    }

    /// Called when a candidate is selected for its package.
    fn pinning(&self, _candidate: &Candidate) {}

    /// Called when a selected candidate turned out to be incompatible.
    fn rejecting(&self, _candidate: &Candidate, _conflict: &Conflict) {}

    /// Called when every candidate of a package has been tried and the resolver returns to an
    /// earlier decision.
    fn backtracking(&self, _package: &PackageKey) {}

    /// Called once with the final selection when the resolution succeeded.
    fn ending(&self, _result: &[Candidate]) {}
}

/// A reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl Reporter for NoOpReporter {}

/// A reporter that emits every decision as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn starting(&self, roots: &[Requirement]) {
        let roots = roots
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!("resolving {roots}");
    }

    fn adding_requirement(
        &self,
        package: &PackageKey,
        versions: &VersionSet,
        required_by: Option<&Candidate>,
    ) {
        match required_by {
            Some(candidate) => tracing::debug!("{candidate} requires {package} {versions}"),
            None => tracing::debug!("root requires {package} {versions}"),
        }
    }

    fn pinning(&self, candidate: &Candidate) {
        tracing::info!("selecting {candidate}");
    }

    fn rejecting(&self, candidate: &Candidate, conflict: &Conflict) {
        tracing::info!("rejecting {candidate}: {conflict}");
    }

    fn backtracking(&self, package: &PackageKey) {
        tracing::info!("no candidates of {package} left, backtracking");
    }

    fn ending(&self, result: &[Candidate]) {
        tracing::info!("resolved {} packages", result.len());
    }
}
