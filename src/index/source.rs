use crate::types::{NormalizedPackageName, Requirement, Version, VersionSpecifiers};
use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// A single release of a project as reported by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// The version of the release
    pub version: Version,

    /// True if every file of the release has been yanked (PEP 592).
    pub yanked: bool,

    /// The python versions the release supports, if the index knows.
    pub requires_python: Option<VersionSpecifiers>,
}

impl Release {
    /// Constructs a regular, non-yanked release without python restrictions.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            yanked: false,
            requires_python: None,
        }
    }
}

/// The index could not answer a question. This is an infrastructure problem and is never the same
/// as "this package has no versions".
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum IndexError {
    #[error("request to {url} failed with status {status}")]
    BadStatus { url: Url, status: StatusCode },

    #[error("failed to send request to {url}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("the response from {url} could not be decoded")]
    InvalidResponse {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not construct an index url for '{name}'")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to construct the http client")]
    Client(#[source] reqwest::Error),
}

/// The raw source of package information, usually a remote index. Implementations answer every
/// question fresh; caching is done by [`super::CandidateIndex`].
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Returns all releases of the project. A project that does not exist has no releases.
    async fn project_releases(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Release>, IndexError>;

    /// Returns the requirements declared by a specific release, environment markers included.
    async fn requires_dist(
        &self,
        name: &NormalizedPackageName,
        version: &Version,
    ) -> Result<Vec<Requirement>, IndexError>;
}
