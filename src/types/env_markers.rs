use pep508_rs::MarkerEnvironment;
use serde::{Deserialize, Serialize};
use std::io;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::Path;
use std::process::ExitStatus;
use thiserror::Error;

/// Describes the environment markers that can be used in dependency specifications to enable or
/// disable certain dependencies based on the target interpreter.
///
/// Note that the "extra" variable is not defined in this struct because it depends on the package
/// that is being inspected.
///
/// The behavior and the names of the markers are described in PEP 508.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
#[serde(transparent)]
pub struct Pep508EnvMarkers(pub MarkerEnvironment);

impl From<MarkerEnvironment> for Pep508EnvMarkers {
    fn from(value: MarkerEnvironment) -> Self {
        Self(value)
    }
}

impl Deref for Pep508EnvMarkers {
    type Target = MarkerEnvironment;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for Pep508EnvMarkers {
    /// CPython 3.12 on x86_64 Linux.
    fn default() -> Self {
        Self(MarkerEnvironment {
            implementation_name: "cpython".to_string(),
            implementation_version: "3.12.0"
                .parse()
                .expect("failed to parse the default implementation version"),
            os_name: "posix".to_string(),
            platform_machine: "x86_64".to_string(),
            platform_python_implementation: "CPython".to_string(),
            platform_release: String::new(),
            platform_system: "Linux".to_string(),
            platform_version: String::new(),
            python_full_version: "3.12.0"
                .parse()
                .expect("failed to parse the default python version"),
            python_version: "3.12"
                .parse()
                .expect("failed to parse the default python version"),
            sys_platform: "linux".to_string(),
        })
    }
}

#[derive(Debug, Error)]
#[allow(missing_docs)]
/// Failure to read the markers from a python interpreter.
pub enum FromPythonError {
    #[error("could not find python executable")]
    CouldNotFindPythonExecutable,

    #[error(transparent)]
    FailedToExecute(#[from] io::Error),

    #[error(transparent)]
    FailedToParse(#[from] serde_json::Error),

    #[error("execution failed with exit code {0}")]
    FailedToRun(ExitStatus),
}

const PEP508_PY: &str = r#"
import json, os, platform, sys

def format_full_version(info):
    version = "{0.major}.{0.minor}.{0.micro}".format(info)
    kind = info.releaselevel
    if kind != "final":
        version += kind[0] + str(info.serial)
    return version

print(json.dumps({
    "implementation_name": sys.implementation.name,
    "implementation_version": format_full_version(sys.implementation.version),
    "os_name": os.name,
    "platform_machine": platform.machine(),
    "platform_python_implementation": platform.python_implementation(),
    "platform_release": platform.release(),
    "platform_system": platform.system(),
    "platform_version": platform.version(),
    "python_full_version": platform.python_version(),
    "python_version": ".".join(platform.python_version_tuple()[:2]),
    "sys_platform": sys.platform,
}))
"#;

impl Pep508EnvMarkers {
    /// Try to determine the environment markers by executing `python` from the `PATH`.
    pub async fn from_env() -> Result<Self, FromPythonError> {
        Self::from_python(Path::new("python")).await
    }

    /// Try to determine the environment markers from an existing python executable. The executable
    /// is used to run a simple python program to extract the information.
    pub async fn from_python(python: &Path) -> Result<Self, FromPythonError> {
        tracing::info!("reading environment markers from {}", python.display());
        let output = match tokio::process::Command::new(python)
            .arg("-c")
            .arg(PEP508_PY)
            .output()
            .await
        {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FromPythonError::CouldNotFindPythonExecutable)
            }
            Err(e) => return Err(FromPythonError::FailedToExecute(e)),
            Ok(output) => output,
        };

        if !output.status.success() {
            return Err(FromPythonError::FailedToRun(output.status));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(serde_json::from_str(stdout.trim())?)
    }
}
