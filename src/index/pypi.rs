use super::project_info::{ProjectInfo, VersionInfo};
use super::source::{IndexError, PackageSource, Release};
use crate::types::{NormalizedPackageName, Requirement, Version, VersionSpecifiers};
use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// The index that is used when nothing else is configured.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/";

/// Configures how a [`PyPiSource`] talks to the index.
#[derive(Debug, Clone)]
pub struct PyPiSourceConfig {
    /// The root of the index. The JSON API lives at `<index_url>pypi/<name>/json`.
    pub index_url: Url,

    /// How often a request is retried after a server error or a network failure.
    pub max_retries: u32,

    /// The delay before the first retry. Every following retry waits exponentially longer.
    pub retry_backoff: Duration,

    /// The longest delay between two retries.
    pub max_retry_backoff: Duration,

    /// The timeout of a single request.
    pub timeout: Option<Duration>,

    /// The user agent that is sent with every request.
    pub user_agent: String,
}

impl Default for PyPiSourceConfig {
    fn default() -> Self {
        Self {
            index_url: Url::parse(DEFAULT_INDEX_URL).expect("the default index url is valid"),
            max_retries: 3,
            retry_backoff: Duration::from_millis(250),
            max_retry_backoff: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Normalize url according to pip standards
pub fn normalize_index_url(mut url: Url) -> Url {
    let path = url.path();
    if !path.ends_with('/') {
        url.set_path(&format!("{path}/"));
    }
    url
}

/// A [`PackageSource`] backed by the JSON API of a PyPI compatible index.
#[derive(Debug, Clone)]
pub struct PyPiSource {
    client: ClientWithMiddleware,
    index_url: Url,
}

impl PyPiSource {
    /// Constructs a new instance with a fresh http client that retries server errors and network
    /// failures with an exponential backoff.
    pub fn new(config: PyPiSourceConfig) -> Result<Self, IndexError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(IndexError::Client)?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(
                config.retry_backoff,
                config.max_retry_backoff.max(config.retry_backoff),
            )
            .build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self::with_client(client, config))
    }

    /// Constructs a new instance that uses an existing http client. Only the index url of the
    /// config is used; retries, timeout and user agent are whatever the client does.
    pub fn with_client(client: impl Into<ClientWithMiddleware>, config: PyPiSourceConfig) -> Self {
        Self {
            client: client.into(),
            index_url: normalize_index_url(config.index_url),
        }
    }

    /// Returns the root url of the index.
    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    fn api_url(&self, name: &NormalizedPackageName, path: &str) -> Result<Url, IndexError> {
        self.index_url
            .join(&format!("pypi/{}/{path}", name.as_str()))
            .map_err(|source| IndexError::InvalidUrl {
                name: name.to_string(),
                source,
            })
    }

    /// Issues a GET request and decodes the JSON body. Retries happen inside the client, any
    /// status that is still not a success afterwards is an error.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, IndexError> {
        tracing::debug!(url=%url, "executing request");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| IndexError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url=%url, "request failed with status {status}");
            return Err(IndexError::BadStatus { url, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| IndexError::InvalidResponse { url, source })
    }
}

#[async_trait]
impl PackageSource for PyPiSource {
    async fn project_releases(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Release>, IndexError> {
        let url = self.api_url(name, "json")?;
        let info: ProjectInfo = self.get_json(url).await?;
        Ok(releases_from_project_info(name, info))
    }

    async fn requires_dist(
        &self,
        name: &NormalizedPackageName,
        version: &Version,
    ) -> Result<Vec<Requirement>, IndexError> {
        let url = self.api_url(name, &format!("{version}/json"))?;
        let info: VersionInfo = self.get_json(url).await?;
        Ok(requirements_from_version_info(name, version, info))
    }
}

/// Converts the release listing of the JSON API. Versions without any files cannot be installed
/// and are left out, as are versions that are not valid PEP 440.
fn releases_from_project_info(name: &NormalizedPackageName, info: ProjectInfo) -> Vec<Release> {
    let mut result = Vec::with_capacity(info.releases.len());
    for (version_str, files) in info.releases {
        if files.is_empty() {
            continue;
        }
        let Ok(version) = Version::from_str(&version_str) else {
            tracing::warn!("skipping invalid version '{version_str}' of {name}");
            continue;
        };

        let yanked = files.iter().all(|f| f.yanked);
        let requires_python = files
            .iter()
            .find_map(|f| f.requires_python.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| match VersionSpecifiers::from_str(s) {
                Ok(specifiers) => Some(specifiers),
                Err(e) => {
                    tracing::warn!("ignoring invalid requires-python '{s}' of {name} {version}: {e}");
                    None
                }
            });

        result.push(Release {
            version,
            yanked,
            requires_python,
        });
    }
    result
}

fn requirements_from_version_info(
    name: &NormalizedPackageName,
    version: &Version,
    info: VersionInfo,
) -> Vec<Requirement> {
    info.info
        .requires_dist
        .unwrap_or_default()
        .iter()
        .filter_map(|s| match Requirement::from_str(s) {
            Ok(req) => Some(req),
            Err(e) => {
                tracing::warn!("skipping invalid requirement '{s}' of {name} {version}: {e}");
                None
            }
        })
        .collect()
}
