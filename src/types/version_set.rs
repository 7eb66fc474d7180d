use pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::Bound;
use std::str::FromStr;

/// The versions a package may take: the conjunction of every specifier that was added to it.
///
/// Membership is decided by the specifiers themselves, so every PEP 440 rule (wildcards, `~=`,
/// local versions, the treatment of pre- and post-releases by `<` and `>`) holds exactly. Next to
/// the specifiers the set keeps the interval of versions they can possibly admit. Intersecting two
/// sets narrows that interval, and once it is empty no version can ever satisfy the set. The
/// interval compares full versions, local labels included.
///
/// A set allows pre-releases when one of its specifiers names a pre-release, like `>=2.0b1`.
/// Membership ignores that flag, candidate selection does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSet {
    specifiers: Vec<VersionSpecifier>,
    lower: Bound<Version>,
    upper: Bound<Version>,
}

impl VersionSet {
    /// The set that contains every version.
    pub fn any() -> Self {
        Self {
            specifiers: Vec::new(),
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// The set that contains exactly `version`.
    pub fn exact(version: &Version) -> Self {
        let specifier = VersionSpecifier::new(Operator::Equal, version.clone(), false)
            .expect("failed to construct equality version specifier");
        Self::from_specifiers(&VersionSpecifiers::from_iter([specifier]))
    }

    /// Builds the set of versions accepted by all of `specifiers`.
    pub fn from_specifiers(specifiers: &VersionSpecifiers) -> Self {
        specifiers
            .iter()
            .fold(Self::any(), |set, specifier| set.with(specifier))
    }

    fn with(mut self, specifier: &VersionSpecifier) -> Self {
        if self.specifiers.contains(specifier) {
            return self;
        }
        let (lower, upper) = interval(specifier);
        self.lower = max_lower(self.lower, lower);
        self.upper = min_upper(self.upper, upper);
        self.specifiers.push(specifier.clone());
        self
    }

    /// Returns true if `version` lies within the set.
    pub fn contains(&self, version: &Version) -> bool {
        !self.is_empty() && self.specifiers.iter().all(|s| s.contains(version))
    }

    /// Returns the versions that lie in both sets. When the sets cannot overlap the result
    /// [`is_empty`](VersionSet::is_empty).
    pub fn intersect(&self, other: &VersionSet) -> VersionSet {
        other.specifiers.iter().fold(self.clone(), |set, s| set.with(s))
    }

    /// Returns true if no version can ever satisfy this set.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(low), Bound::Included(high)) => low > high,
            (Bound::Included(low), Bound::Excluded(high))
            | (Bound::Excluded(low), Bound::Included(high))
            | (Bound::Excluded(low), Bound::Excluded(high)) => low >= high,
            _ => false,
        }
    }

    /// Returns true if one of the specifiers of this set names a pre-release.
    pub fn allows_prerelease(&self) -> bool {
        self.specifiers.iter().any(|s| s.version().any_prerelease())
    }

    /// If the set pins a single version with `==` returns that version.
    pub fn as_exact(&self) -> Option<&Version> {
        self.specifiers
            .iter()
            .find(|s| matches!(s.operator(), Operator::Equal | Operator::ExactEqual))
            .map(|s| s.version())
    }

    /// Returns the specifiers the set was built from.
    pub fn specifiers(&self) -> &[VersionSpecifier] {
        &self.specifiers
    }
}

impl Default for VersionSet {
    fn default() -> Self {
        Self::any()
    }
}

impl From<&VersionSpecifiers> for VersionSet {
    fn from(value: &VersionSpecifiers) -> Self {
        Self::from_specifiers(value)
    }
}

/// Returns true if `version` is a member of `constraint`.
pub fn satisfies(version: &Version, constraint: &VersionSet) -> bool {
    constraint.contains(version)
}

/// Returns the intersection of two constraints, which is empty when they cannot overlap.
pub fn intersect(a: &VersionSet, b: &VersionSet) -> VersionSet {
    a.intersect(b)
}

/// The interval of versions a specifier can admit. Wildcards and `~=` only bound the interval
/// from below, `!=` and `===` do not bound it at all.
fn interval(specifier: &VersionSpecifier) -> (Bound<Version>, Bound<Version>) {
    let version = specifier.version().clone();
    match specifier.operator() {
        Operator::Equal => (Bound::Included(version.clone()), Bound::Included(version)),
        Operator::EqualStar => (
            // `1.2.dev0` is the smallest version that starts with `1.2`
            Version::from_str(&format!("{version}.dev0"))
                .map_or(Bound::Unbounded, Bound::Included),
            Bound::Unbounded,
        ),
        Operator::TildeEqual | Operator::GreaterThanEqual => {
            (Bound::Included(version), Bound::Unbounded)
        }
        Operator::GreaterThan => (Bound::Excluded(version), Bound::Unbounded),
        Operator::LessThan => (Bound::Unbounded, Bound::Excluded(version)),
        Operator::LessThanEqual => (Bound::Unbounded, Bound::Included(version)),
        _ => (Bound::Unbounded, Bound::Unbounded),
    }
}

fn max_lower(a: Bound<Version>, b: Bound<Version>) -> Bound<Version> {
    match (&a, &b) {
        (Bound::Unbounded, _) => b,
        (_, Bound::Unbounded) => a,
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            match x.cmp(y) {
                Ordering::Greater => a,
                Ordering::Less => b,
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a,
                Ordering::Equal => b,
            }
        }
    }
}

fn min_upper(a: Bound<Version>, b: Bound<Version>) -> Bound<Version> {
    match (&a, &b) {
        (Bound::Unbounded, _) => b,
        (_, Bound::Unbounded) => a,
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            match x.cmp(y) {
                Ordering::Less => a,
                Ordering::Greater => b,
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a,
                Ordering::Equal => b,
            }
        }
    }
}

impl Display for VersionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.specifiers.is_empty() {
            return write!(f, "*");
        }
        for (i, specifier) in self.specifiers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{specifier}")?;
        }
        Ok(())
    }
}
