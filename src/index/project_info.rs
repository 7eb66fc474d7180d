//! Structs that represent the responses of the PyPI JSON API.
//!
//! Only the fields the resolver looks at are modeled, everything else is ignored.

use indexmap::IndexMap;
use serde::Deserialize;

/// Response of `GET /pypi/<project>/json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProjectInfo {
    /// All releases of the project keyed by their version string, with the files of each.
    #[serde(default)]
    pub releases: IndexMap<String, Vec<ReleaseFile>>,
}

/// A single distribution file of a release.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ReleaseFile {
    #[serde(default)]
    pub yanked: bool,
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// Response of `GET /pypi/<project>/<version>/json`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VersionInfo {
    pub info: VersionDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VersionDetails {
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_project_info() {
        let json = r#"{
            "info": {"name": "demo"},
            "releases": {
                "1.0": [{"filename": "demo-1.0.tar.gz", "yanked": false, "requires_python": ">=3.7"}],
                "1.1": [{"filename": "demo-1.1.tar.gz", "yanked": true, "requires_python": null}],
                "2.0": []
            }
        }"#;
        let info: ProjectInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.releases.len(), 3);
        let keys: Vec<_> = info.releases.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1.0", "1.1", "2.0"]);
        assert_eq!(
            info.releases["1.0"][0].requires_python.as_deref(),
            Some(">=3.7")
        );
        assert!(info.releases["1.1"][0].yanked);
        assert!(info.releases["2.0"].is_empty());
    }

    #[test]
    fn test_parse_version_info() {
        let json = r#"{"info": {"requires_dist": ["idna (>=2.5)", "PySocks!=1.5.7; extra == 'socks'"]}}"#;
        let info: VersionInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.info.requires_dist.unwrap().len(), 2);

        let json = r#"{"info": {"requires_dist": null}}"#;
        let info: VersionInfo = serde_json::from_str(json).unwrap();
        assert!(info.info.requires_dist.is_none());
    }
}
