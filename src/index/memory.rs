use super::source::{IndexError, PackageSource, Release};
use crate::types::{
    NormalizedPackageName, Requirement, RequirementExt, Version, VersionSpecifiers,
};
use async_trait::async_trait;
use miette::IntoDiagnostic;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone)]
struct Entry {
    release: Release,
    requires_dist: Vec<Requirement>,
}

/// A [`PackageSource`] that keeps all packages in memory. Useful to resolve against a fixed set of
/// packages, for instance in tests or when the metadata was obtained some other way.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    projects: HashMap<NormalizedPackageName, Vec<Entry>>,
}

impl InMemorySource {
    /// Constructs an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a release of a package together with the requirement strings it declares. Adding the
    /// same version twice replaces the earlier release.
    pub fn add_release(
        &mut self,
        name: &str,
        version: &str,
        requires_dist: &[&str],
    ) -> miette::Result<&mut Self> {
        let name = NormalizedPackageName::from_str(name).into_diagnostic()?;
        let version = Version::from_str(version)
            .map_err(|_| miette::miette!("invalid version '{version}'"))?;
        let requires_dist = requires_dist
            .iter()
            .map(|s| {
                let requirement = Requirement::from_str(s).into_diagnostic()?;
                requirement.package_name()?;
                requirement.version_set()?;
                Ok::<_, miette::Report>(requirement)
            })
            .collect::<miette::Result<Vec<_>>>()?;

        let entries = self.projects.entry(name).or_default();
        entries.retain(|e| e.release.version != version);
        entries.push(Entry {
            release: Release::new(version),
            requires_dist,
        });
        Ok(self)
    }

    /// Marks a previously added release as yanked.
    pub fn yank(&mut self, name: &str, version: &str) -> miette::Result<&mut Self> {
        self.entry_mut(name, version)?.release.yanked = true;
        Ok(self)
    }

    /// Sets the python versions a previously added release supports.
    pub fn set_requires_python(
        &mut self,
        name: &str,
        version: &str,
        requires_python: &str,
    ) -> miette::Result<&mut Self> {
        let specifiers = VersionSpecifiers::from_str(requires_python).into_diagnostic()?;
        self.entry_mut(name, version)?.release.requires_python = Some(specifiers);
        Ok(self)
    }

    fn entry_mut(&mut self, name: &str, version: &str) -> miette::Result<&mut Entry> {
        let name = NormalizedPackageName::from_str(name).into_diagnostic()?;
        let version = Version::from_str(version)
            .map_err(|_| miette::miette!("invalid version '{version}'"))?;
        self.projects
            .get_mut(&name)
            .and_then(|entries| entries.iter_mut().find(|e| e.release.version == version))
            .ok_or_else(|| miette::miette!("{name} {version} has not been added"))
    }
}

#[async_trait]
impl PackageSource for InMemorySource {
    async fn project_releases(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Release>, IndexError> {
        Ok(self
            .projects
            .get(name)
            .map(|entries| entries.iter().map(|e| e.release.clone()).collect())
            .unwrap_or_default())
    }

    async fn requires_dist(
        &self,
        name: &NormalizedPackageName,
        version: &Version,
    ) -> Result<Vec<Requirement>, IndexError> {
        Ok(self
            .projects
            .get(name)
            .and_then(|entries| entries.iter().find(|e| &e.release.version == version))
            .map(|e| e.requires_dist.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_source() {
        let mut source = InMemorySource::new();
        source
            .add_release("Flask", "3.0.2", &["Werkzeug>=3.0.0", "click>=8.1.3"])
            .unwrap()
            .add_release("flask", "2.3.3", &["Werkzeug>=2.3.7"])
            .unwrap()
            .yank("flask", "2.3.3")
            .unwrap();

        let name: NormalizedPackageName = "FLASK".parse().unwrap();
        let releases = source.project_releases(&name).await.unwrap();
        assert_eq!(releases.len(), 2);
        assert!(releases.iter().any(|r| r.yanked));

        let reqs = source
            .requires_dist(&name, &Version::from_str("3.0.2").unwrap())
            .await
            .unwrap();
        let reqs: Vec<_> = reqs
            .iter()
            .map(|r| format!("{} {}", r.name, r.version_set().unwrap()))
            .collect();
        insta::assert_debug_snapshot!(reqs, @r###"
        [
            "Werkzeug >=3.0.0",
            "click >=8.1.3",
        ]
        "###);
    }

    #[tokio::test]
    async fn test_unknown_project_has_no_releases() {
        let source = InMemorySource::new();
        let name: NormalizedPackageName = "nothing-here".parse().unwrap();
        assert!(source.project_releases(&name).await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_input() {
        let mut source = InMemorySource::new();
        assert!(source.add_release("foo", "not a version", &[]).is_err());
        assert!(source.add_release("foo", "1.0", &["bar @ https://example.com/bar.whl"]).is_err());
        assert!(source.add_release("foo", "1.0", &["bar >=< 1"]).is_err());
        assert!(source.set_requires_python("foo", "1.0", ">=3.8").is_err());
        assert!(source.yank("foo", "1.0").is_err());
    }
}
