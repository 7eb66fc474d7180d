//! The backtracking search.
//!
//! The search keeps a [`State`]: the constraint on every package seen so far, the version selected
//! for every package decided so far and a queue of packages that still need a decision. Packages
//! are taken from the queue in insertion order. For every package the candidates that satisfy its
//! constraint are tried newest first. Selecting a candidate adds its requirements to the
//! constraints, which may enqueue new packages. If a requirement cannot be met the next candidate
//! is tried, and once a package runs out of candidates the search returns to the previous decision.
//!
//! Every decision remembers the state from right before it was made, so going back is a matter of
//! restoring that snapshot.

use super::candidate::{Candidate, PackageKey};
use super::error::{Conflict, ConflictReason, ConstraintOrigin, ResolutionError};
use super::options::ResolveOptions;
use super::reporter::Reporter;
use crate::index::{CandidateIndex, IndexError};
use crate::types::{Requirement, RequirementError, RequirementExt, Version, VersionSet};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// The versions a package is still allowed to take and who restricted them.
#[derive(Debug, Clone)]
struct Constraint {
    versions: VersionSet,
    origins: Vec<ConstraintOrigin>,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            versions: VersionSet::any(),
            origins: Vec::new(),
        }
    }
}

/// A version that was selected for a package.
///
/// Pre-releases and yanked releases can be held back when the constraint at the time of the
/// decision does not ask for them. A later requirement may still name the pre-release or pin the
/// yanked version, so they are kept as last resort alternatives. Such a selection only stands if
/// the final constraint allows it, which is checked once all packages are decided.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    version: Version,
    needs_prerelease: bool,
    needs_pin: bool,
}

impl Selection {
    #[cfg(test)]
    fn new(version: Version) -> Self {
        Self {
            version,
            needs_prerelease: false,
            needs_pin: false,
        }
    }

    fn is_deferred(&self) -> bool {
        self.needs_prerelease || self.needs_pin
    }

    /// Returns why `versions` does not allow this selection, if it does not.
    fn rejected_by(&self, versions: &VersionSet) -> Option<ConflictReason> {
        if !versions.contains(&self.version) {
            Some(ConflictReason::ExcludesAssigned(self.version.clone()))
        } else if self.needs_prerelease && !versions.allows_prerelease() {
            Some(ConflictReason::PrereleaseNotRequested(self.version.clone()))
        } else if self.needs_pin && versions.as_exact() != Some(&self.version) {
            Some(ConflictReason::YankedNotPinned(self.version.clone()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    constraints: HashMap<PackageKey, Constraint>,
    assignment: IndexMap<PackageKey, Selection>,
    queue: VecDeque<PackageKey>,
}

impl State {
    /// Narrows the constraint of `package`. Fails if nothing is left or if the version that was
    /// already selected for the package falls outside of it.
    fn add_constraint(
        &mut self,
        package: &PackageKey,
        versions: &VersionSet,
        required_by: Option<&Candidate>,
    ) -> Result<(), Conflict> {
        let constraint = self.constraints.entry(package.clone()).or_default();
        constraint.versions = constraint.versions.intersect(versions);
        constraint.origins.push(ConstraintOrigin {
            required_by: required_by.cloned(),
            versions: versions.clone(),
        });

        let conflict = |reason| Conflict {
            package: package.clone(),
            versions: constraint.versions.clone(),
            reason,
            origins: constraint.origins.clone(),
        };
        if constraint.versions.is_empty() {
            return Err(conflict(ConflictReason::EmptyIntersection));
        }

        match self.assignment.get(package) {
            Some(assigned) if !constraint.versions.contains(&assigned.version) => Err(conflict(
                ConflictReason::ExcludesAssigned(assigned.version.clone()),
            )),
            Some(_) => Ok(()),
            None => {
                if !self.queue.contains(package) {
                    self.queue.push_back(package.clone());
                }
                Ok(())
            }
        }
    }

    fn constraint(&self, package: &PackageKey) -> Constraint {
        self.constraints.get(package).cloned().unwrap_or_default()
    }

    /// The versions `package` may be selected from. An extra is bound by the constraint on its
    /// base package as well.
    fn selectable_versions(&self, package: &PackageKey) -> VersionSet {
        let versions = self.constraint(package).versions;
        match package {
            PackageKey::Base(_) => versions,
            PackageKey::Extra(name, _) => {
                let base = PackageKey::Base(name.clone());
                versions.intersect(&self.constraint(&base).versions)
            }
        }
    }

    /// Returns a conflict for the first selection that its final constraint does not allow.
    fn verify(&self) -> Option<Conflict> {
        self.assignment.iter().find_map(|(package, selection)| {
            let versions = self.selectable_versions(package);
            let reason = selection.rejected_by(&versions)?;
            Some(Conflict {
                package: package.clone(),
                versions,
                reason,
                origins: self.constraint(package).origins,
            })
        })
    }
}

/// A decision point: a package, the state from right before a candidate was selected for it and
/// the candidates that have not been tried yet.
struct Decision {
    package: PackageKey,
    state: State,
    remaining: VecDeque<Selection>,
}

/// Runs a single resolution. All search state lives in here and is dropped when the resolution
/// finishes.
pub(crate) struct Solver<'a> {
    index: &'a CandidateIndex,
    options: &'a ResolveOptions,
    reporter: &'a dyn Reporter,
}

impl<'a> Solver<'a> {
    pub fn new(
        index: &'a CandidateIndex,
        options: &'a ResolveOptions,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            index,
            options,
            reporter,
        }
    }

    /// Finds a version for every package reachable from `roots`. The result contains an entry for
    /// every package, extras included, in the order in which they were selected.
    pub async fn solve(&self, roots: &[Requirement]) -> Result<Vec<Candidate>, ResolutionError> {
        self.reporter.starting(roots);

        let mut state = State::default();
        for root in roots {
            let invalid = |e: RequirementError| ResolutionError::InvalidRequirement {
                requirement: root.to_string(),
                reason: e.to_string(),
            };
            let versions = root.version_set().map_err(invalid)?;
            for package in requirement_keys(root).map_err(invalid)? {
                self.reporter.adding_requirement(&package, &versions, None);
                state
                    .add_constraint(&package, &versions, None)
                    .map_err(ResolutionError::UnsatisfiableConstraints)?;
            }
        }

        let mut stack: Vec<Decision> = Vec::new();
        loop {
            let outcome = match state.queue.pop_front() {
                Some(package) => self.decide(package, &mut state, &mut stack).await?,
                None => match state.verify() {
                    Some(conflict) => Err(conflict),
                    None => break,
                },
            };
            if let Err(conflict) = outcome {
                state = self.backtrack(&mut stack, conflict).await?;
            }
        }

        let result = state
            .assignment
            .into_iter()
            .map(|(name, selection)| Candidate {
                name,
                version: selection.version,
            })
            .collect::<Vec<_>>();
        self.reporter.ending(&result);
        Ok(result)
    }

    /// Makes a decision for `package`: selects its best candidate and records a decision point
    /// for the alternatives.
    async fn decide(
        &self,
        package: PackageKey,
        state: &mut State,
        stack: &mut Vec<Decision>,
    ) -> Result<Result<(), Conflict>, IndexError> {
        let constraint = state.constraint(&package);
        if let Some(assigned) = state.assignment.get(&package) {
            if constraint.versions.contains(&assigned.version) {
                return Ok(Ok(()));
            }
            return Ok(Err(Conflict {
                reason: ConflictReason::ExcludesAssigned(assigned.version.clone()),
                package,
                versions: constraint.versions,
                origins: constraint.origins,
            }));
        }

        let mut remaining = self
            .candidates(&package, &state.selectable_versions(&package))
            .await?;
        let Some(selection) = remaining.pop_front() else {
            tracing::debug!("no versions of {package} match {}", constraint.versions);
            return Ok(Err(Conflict {
                package,
                versions: constraint.versions,
                reason: ConflictReason::NoMatchingVersions,
                origins: constraint.origins,
            }));
        };

        let snapshot = state.clone();
        let outcome = self.pin(state, &package, selection).await?;
        stack.push(Decision {
            package,
            state: snapshot,
            remaining,
        });
        Ok(outcome)
    }

    /// Returns to the most recent decision that still has untried candidates and selects the next
    /// one. Fails with the last conflict when no decision is left.
    async fn backtrack(
        &self,
        stack: &mut Vec<Decision>,
        mut conflict: Conflict,
    ) -> Result<State, ResolutionError> {
        loop {
            let Some(decision) = stack.last_mut() else {
                return Err(ResolutionError::UnsatisfiableConstraints(conflict));
            };
            let Some(selection) = decision.remaining.pop_front() else {
                self.reporter.backtracking(&decision.package);
                stack.pop();
                continue;
            };

            let package = decision.package.clone();
            let mut state = decision.state.clone();
            match self.pin(&mut state, &package, selection).await? {
                Ok(()) => return Ok(state),
                Err(next) => conflict = next,
            }
        }
    }

    /// Selects a version for `package` and adds everything it requires to the constraints.
    async fn pin(
        &self,
        state: &mut State,
        package: &PackageKey,
        selection: Selection,
    ) -> Result<Result<(), Conflict>, IndexError> {
        let candidate = Candidate {
            name: package.clone(),
            version: selection.version.clone(),
        };
        if selection.is_deferred() {
            tracing::debug!("trying held back candidate {candidate}");
        }
        self.reporter.pinning(&candidate);
        state.assignment.insert(package.clone(), selection);

        let outcome = self.add_requirements(state, &candidate).await?;
        if let Err(conflict) = &outcome {
            self.reporter.rejecting(&candidate, conflict);
        }
        Ok(outcome)
    }

    async fn add_requirements(
        &self,
        state: &mut State,
        candidate: &Candidate,
    ) -> Result<Result<(), Conflict>, IndexError> {
        if let PackageKey::Extra(name, _) = &candidate.name {
            let base = PackageKey::Base(name.clone());
            let versions = VersionSet::exact(&candidate.version);
            self.reporter
                .adding_requirement(&base, &versions, Some(candidate));
            if let Err(conflict) = state.add_constraint(&base, &versions, Some(candidate)) {
                return Ok(Err(conflict));
            }
        }

        let requirements = self
            .index
            .requirements(
                candidate.name.base(),
                &candidate.version,
                candidate.name.extra(),
            )
            .await?;
        for requirement in requirements {
            let parsed = requirement
                .version_set()
                .and_then(|versions| Ok((versions, requirement_keys(&requirement)?)));
            let (versions, packages) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("ignoring requirement '{requirement}' of {candidate}: {e}");
                    continue;
                }
            };
            for package in packages {
                self.reporter
                    .adding_requirement(&package, &versions, Some(candidate));
                if let Err(conflict) = state.add_constraint(&package, &versions, Some(candidate)) {
                    return Ok(Err(conflict));
                }
            }
        }
        Ok(Ok(()))
    }

    /// Returns the versions of `package` that may be selected under `versions`, best first.
    ///
    /// Versions the pre-release and yank policy allows right now come first, newest first. They
    /// are followed by the versions it would allow if a later requirement named a pre-release or
    /// pinned the yanked version.
    async fn candidates(
        &self,
        package: &PackageKey,
        versions: &VersionSet,
    ) -> Result<VecDeque<Selection>, IndexError> {
        let name = package.base();
        let releases = self.index.fetch_releases(name).await?;

        let only_prereleases = releases.iter().all(|r| r.version.any_prerelease());
        let policy = &self.options.pre_release_resolution;
        let prereleases_now = policy.allows(name, versions.allows_prerelease(), only_prereleases);
        let prereleases_later = policy.allows(name, true, only_prereleases);
        let pinned = versions.as_exact();

        let mut eligible = VecDeque::new();
        let mut held_back = VecDeque::new();
        for release in releases {
            if !versions.contains(&release.version) {
                continue;
            }
            let is_prerelease = release.version.any_prerelease();
            if is_prerelease && !prereleases_later {
                continue;
            }

            let selection = Selection {
                version: release.version.clone(),
                needs_prerelease: is_prerelease && !prereleases_now,
                needs_pin: release.yanked && pinned != Some(&release.version),
            };
            if selection.needs_pin {
                tracing::debug!("holding back {name} {}, it has been yanked", release.version);
            }
            if selection.is_deferred() {
                held_back.push_back(selection);
            } else {
                eligible.push_back(selection);
            }
        }
        tracing::debug!(
            "{} candidates of {package} match {versions}, {} more are held back",
            eligible.len(),
            held_back.len()
        );

        eligible.extend(held_back);
        Ok(eligible)
    }
}

/// Returns the packages a requirement refers to: the package itself and one virtual package per
/// requested extra.
fn requirement_keys(requirement: &Requirement) -> Result<Vec<PackageKey>, RequirementError> {
    let name = requirement.package_name()?;
    let extras = requirement.requested_extras()?;
    Ok(std::iter::once(PackageKey::Base(name.clone()))
        .chain(
            extras
                .into_iter()
                .map(|extra| PackageKey::Extra(name.clone(), extra)),
        )
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::VersionSpecifiers;
    use std::str::FromStr;

    fn set(s: &str) -> VersionSet {
        VersionSet::from_specifiers(&VersionSpecifiers::from_str(s).unwrap())
    }

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn key(s: &str) -> PackageKey {
        PackageKey::Base(s.parse().unwrap())
    }

    #[test]
    fn test_add_constraint_enqueues_once() {
        let mut state = State::default();
        state.add_constraint(&key("a"), &set(">=1.0"), None).unwrap();
        state.add_constraint(&key("b"), &set(">=1.0"), None).unwrap();
        state.add_constraint(&key("a"), &set("<3.0"), None).unwrap();
        assert_eq!(state.queue, VecDeque::from([key("a"), key("b")]));
        assert_eq!(state.constraint(&key("a")).origins.len(), 2);
    }

    #[test]
    fn test_add_constraint_empty_intersection() {
        let mut state = State::default();
        state.add_constraint(&key("c"), &set(">=2.0"), None).unwrap();
        let conflict = state.add_constraint(&key("c"), &set("<2.0"), None).unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::EmptyIntersection);
        assert_eq!(conflict.origins.len(), 2);
    }

    #[test]
    fn test_add_constraint_excludes_assigned() {
        let mut state = State::default();
        state.assignment.insert(key("c"), Selection::new(v("2.0")));
        state.add_constraint(&key("c"), &set(">=1.0"), None).unwrap();
        assert!(state.queue.is_empty());

        let conflict = state.add_constraint(&key("c"), &set("<2.0"), None).unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::ExcludesAssigned(v("2.0")));
    }

    #[test]
    fn test_verify_held_back_selections() {
        let prerelease = Selection {
            needs_prerelease: true,
            ..Selection::new(v("2.0b1"))
        };
        let yanked = Selection {
            needs_pin: true,
            ..Selection::new(v("3.0"))
        };

        let mut state = State::default();
        state.assignment.insert(key("a"), prerelease.clone());
        state.assignment.insert(key("b"), yanked.clone());
        state.add_constraint(&key("a"), &set(">=1.0"), None).unwrap();
        state.add_constraint(&key("b"), &set(">=1.0"), None).unwrap();
        let conflict = state.verify().unwrap();
        assert_eq!(conflict.package, key("a"));
        assert_eq!(conflict.reason, ConflictReason::PrereleaseNotRequested(v("2.0b1")));

        state.add_constraint(&key("a"), &set(">=2.0b1"), None).unwrap();
        let conflict = state.verify().unwrap();
        assert_eq!(conflict.package, key("b"));
        assert_eq!(conflict.reason, ConflictReason::YankedNotPinned(v("3.0")));

        state.add_constraint(&key("b"), &set("==3.0"), None).unwrap();
        assert!(state.verify().is_none());
    }

    #[test]
    fn test_requirement_keys() {
        let requirement = Requirement::from_str("Requests[socks,security]>=2").unwrap();
        let keys: Vec<_> = requirement_keys(&requirement)
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(
            keys,
            vec!["requests", "requests[socks]", "requests[security]"]
        );
    }
}
