use super::source::{IndexError, PackageSource, Release};
use crate::types::{
    Extra, NormalizedPackageName, Pep508EnvMarkers, Requirement, RequirementExt, Version,
};
use elsa::sync::FrozenMap;

/// Answers the questions of the resolver: which versions of a package exist and what does a
/// specific version require.
///
/// Every successful answer is kept for the lifetime of the index, so backtracking never asks the
/// underlying [`PackageSource`] the same question twice. Failures are not remembered. The caches
/// are append-only, which makes it safe to share one index between concurrent resolutions.
pub struct CandidateIndex {
    source: Box<dyn PackageSource>,
    env_markers: Pep508EnvMarkers,
    python_version: Version,

    releases: FrozenMap<NormalizedPackageName, Box<Vec<Release>>>,
    requires_dist: FrozenMap<(NormalizedPackageName, Version), Box<Vec<Requirement>>>,
}

impl CandidateIndex {
    /// Constructs a new index that reads from `source` and evaluates environment markers against
    /// `env_markers`.
    pub fn new(source: Box<dyn PackageSource>, env_markers: Pep508EnvMarkers) -> Self {
        let python_version = env_markers.python_full_version.version.clone();
        Self {
            source,
            env_markers,
            python_version,
            releases: FrozenMap::new(),
            requires_dist: FrozenMap::new(),
        }
    }

    /// Returns the environment that markers are evaluated against.
    pub fn env_markers(&self) -> &Pep508EnvMarkers {
        &self.env_markers
    }

    /// Returns the releases of a package that can be installed in the configured environment,
    /// newest first. A package that does not exist has no releases.
    pub async fn fetch_releases(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<&[Release], IndexError> {
        if let Some(releases) = self.releases.get(name) {
            return Ok(releases.as_slice());
        }

        tracing::info!("fetching releases of {name}");
        let mut releases = self.source.project_releases(name).await?;
        releases.retain(|release| self.supports_python(name, release));
        releases.sort_by(|a, b| b.version.cmp(&a.version));
        releases.dedup_by(|a, b| a.version == b.version);
        tracing::debug!("found {} usable releases of {name}", releases.len());

        Ok(self
            .releases
            .insert(name.clone(), Box::new(releases))
            .as_slice())
    }

    /// Returns the versions of a package that can be installed in the configured environment,
    /// newest first.
    pub async fn fetch_versions(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Version>, IndexError> {
        Ok(self
            .fetch_releases(name)
            .await?
            .iter()
            .map(|release| release.version.clone())
            .collect())
    }

    /// Returns everything a specific version of a package declares as requirements, without
    /// looking at environment markers.
    pub async fn fetch_requirements(
        &self,
        name: &NormalizedPackageName,
        version: &Version,
    ) -> Result<&[Requirement], IndexError> {
        let key = (name.clone(), version.clone());
        if let Some(requirements) = self.requires_dist.get(&key) {
            return Ok(requirements.as_slice());
        }

        tracing::info!("fetching requirements of {name} {version}");
        let requirements = self.source.requires_dist(name, version).await?;
        Ok(self
            .requires_dist
            .insert(key, Box::new(requirements))
            .as_slice())
    }

    /// Returns the requirements of a specific version of a package that apply in the configured
    /// environment. With `extra`, the requirements of that optional feature are selected as well.
    pub async fn requirements(
        &self,
        name: &NormalizedPackageName,
        version: &Version,
        extra: Option<&Extra>,
    ) -> Result<Vec<Requirement>, IndexError> {
        let requirements = self.fetch_requirements(name, version).await?;
        Ok(requirements
            .iter()
            .filter(|req| req.applies_to(&self.env_markers, extra))
            .cloned()
            .collect())
    }

    fn supports_python(&self, name: &NormalizedPackageName, release: &Release) -> bool {
        let Some(requires_python) = &release.requires_python else {
            return true;
        };
        if requires_python.contains(&self.python_version) {
            return true;
        }
        tracing::debug!(
            "skipping {name} {}, it requires python {requires_python}",
            release.version
        );
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::InMemorySource;
    use std::str::FromStr;

    fn index() -> CandidateIndex {
        let mut source = InMemorySource::new();
        source
            .add_release("a", "1.0", &[])
            .unwrap()
            .add_release("a", "2.0", &["b; extra == 'fast'", "c; sys_platform == 'win32'", "d"])
            .unwrap()
            .add_release("a", "1.5", &[])
            .unwrap()
            .add_release("a", "3.0", &[])
            .unwrap()
            .set_requires_python("a", "3.0", ">=3.13")
            .unwrap();
        CandidateIndex::new(Box::new(source), Pep508EnvMarkers::default())
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_versions_are_newest_first() {
        let index = index();
        let versions = index.fetch_versions(&"a".parse().unwrap()).await.unwrap();
        let versions: Vec<_> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(versions, vec!["2.0", "1.5", "1.0"]);
        assert!(logs_contain("it requires python"));
    }

    #[tokio::test]
    async fn test_unknown_package_has_no_versions() {
        let index = index();
        let versions = index.fetch_versions(&"zzz".parse().unwrap()).await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn test_requirements_follow_markers() {
        let index = index();
        let name = "a".parse().unwrap();
        let version = Version::from_str("2.0").unwrap();

        assert_eq!(index.fetch_requirements(&name, &version).await.unwrap().len(), 3);

        let plain = index.requirements(&name, &version, None).await.unwrap();
        let plain: Vec<_> = plain.iter().map(|r| r.name.clone()).collect();
        assert_eq!(plain, vec!["d"]);

        let fast: Extra = "fast".parse().unwrap();
        let with_extra = index.requirements(&name, &version, Some(&fast)).await.unwrap();
        let with_extra: Vec<_> = with_extra.iter().map(|r| r.name.clone()).collect();
        assert_eq!(with_extra, vec!["b", "d"]);
    }
}
