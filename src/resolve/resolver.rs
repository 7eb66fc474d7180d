use super::candidate::PackageKey;
use super::engine::Solver;
use super::error::ResolutionError;
use super::options::ResolveOptions;
use super::reporter::{NoOpReporter, Reporter};
use crate::index::{CandidateIndex, IndexError, PyPiSource, PyPiSourceConfig};
use crate::types::{Dependency, Pep508EnvMarkers, Requirement, RequirementExt};

/// Resolves requirements into a set of concrete package versions.
///
/// A resolver owns a [`CandidateIndex`]; everything the index learns is kept for as long as the
/// resolver lives and is shared by all resolutions, also concurrent ones. The state of a single
/// resolution is private to that resolution.
pub struct Resolver {
    index: CandidateIndex,
    options: ResolveOptions,
    reporter: Box<dyn Reporter>,
}

impl Resolver {
    /// Constructs a new instance that resolves against `index`.
    pub fn new(index: CandidateIndex, options: ResolveOptions) -> Self {
        Self {
            index,
            options,
            reporter: Box::new(NoOpReporter),
        }
    }

    /// Constructs a resolver that talks to a PyPI compatible index over HTTP.
    pub fn pypi(
        config: PyPiSourceConfig,
        env_markers: Pep508EnvMarkers,
        options: ResolveOptions,
    ) -> Result<Self, IndexError> {
        let source = PyPiSource::new(config)?;
        Ok(Self::new(
            CandidateIndex::new(Box::new(source), env_markers),
            options,
        ))
    }

    /// Replaces the reporter that observes the decisions of the resolver.
    pub fn with_reporter(self, reporter: impl Reporter + 'static) -> Self {
        Self {
            reporter: Box::new(reporter),
            ..self
        }
    }

    /// Returns the index the resolver uses.
    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Returns the options of the resolver.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolves a single requirement and all of its dependencies. See [`Resolver::resolve_all`].
    pub async fn resolve(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<Dependency>, ResolutionError> {
        self.resolve_all([requirement]).await
    }

    /// Resolves several requirements together. The result holds exactly one version per package,
    /// sorted by package name. Requirements whose environment marker does not apply to the target
    /// environment are ignored.
    pub async fn resolve_all(
        &self,
        requirements: impl IntoIterator<Item = &Requirement>,
    ) -> Result<Vec<Dependency>, ResolutionError> {
        let mut roots = Vec::new();
        for requirement in requirements {
            if requirement.applies_to(self.index.env_markers(), None) {
                roots.push(requirement.clone());
            } else {
                tracing::info!("skipping '{requirement}', it does not apply to this environment");
            }
        }

        let solver = Solver::new(&self.index, &self.options, self.reporter.as_ref());
        let candidates = solver.solve(&roots).await?;

        let mut result = candidates
            .into_iter()
            .filter_map(|candidate| match candidate.name {
                PackageKey::Base(name) => Some(Dependency::new(name, candidate.version)),
                PackageKey::Extra(..) => None,
            })
            .collect::<Vec<_>>();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}
