use crate::types::NormalizedPackageName;

/// Defines how to pre-releases are handled during package resolution.
#[derive(Debug, Clone, Eq, PartialOrd, PartialEq)]
pub enum PreReleaseResolution {
    /// Don't allow pre-releases to be selected during resolution
    Disallow,

    /// Conditionally allow pre-releases to be selected during resolution. This
    /// behavior emulates `pip`'s pre-release resolution.
    ///
    /// It works as follows:
    ///
    /// - if a version specifier mentions a pre-release, then we allow
    ///   pre-releases to be selected, for example `jupyterlab==4.1.0b0` will
    ///   allow the selection of the `jupyterlab-4.1.0b0` beta release during
    ///   resolution.
    /// - if a package _only_ contains pre-release versions then we allow
    ///   pre-releases to be selected for any version specifier. For example, if
    ///   the package `supernew` only contains `supernew-1.0.0b0` and
    ///   `supernew-1.0.0b1` then we allow `supernew` to select
    ///   `supernew-1.0.0b1` during resolution.
    /// - Any name that is mentioned in the `allow_names` list will allow pre-releases, also as a
    ///   transitive dependency.
    AllowIfNoOtherVersionsOrEnabled {
        /// A list of package names that will allow pre-releases to be selected
        allow_names: Vec<NormalizedPackageName>,
    },

    /// Allow any pre-releases to be selected during resolution
    Allow,
}

impl Default for PreReleaseResolution {
    fn default() -> Self {
        PreReleaseResolution::AllowIfNoOtherVersionsOrEnabled {
            allow_names: Vec::new(),
        }
    }
}

impl PreReleaseResolution {
    /// Returns true if pre-releases of `name` may be selected, given whether its current
    /// constraint names a pre-release and whether the package has any final releases at all.
    pub(crate) fn allows(
        &self,
        name: &NormalizedPackageName,
        constraint_allows_prerelease: bool,
        only_prereleases: bool,
    ) -> bool {
        match self {
            PreReleaseResolution::Disallow => false,
            PreReleaseResolution::Allow => true,
            PreReleaseResolution::AllowIfNoOtherVersionsOrEnabled { allow_names } => {
                constraint_allows_prerelease || only_prereleases || allow_names.contains(name)
            }
        }
    }
}

/// Additional options that may influence the solver. In general passing [`Default::default`] to
/// the [`super::Resolver`] should provide sane defaults, however if you want to fine tune the
/// resolver you can do so via this struct.
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    /// Defines how to handle pre-releases during resolution.
    pub pre_release_resolution: PreReleaseResolution,
}
