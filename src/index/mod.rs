//! Everything needed to ask a package index about packages, their versions and their
//! requirements.
//!
//! A [`PackageSource`] answers the raw questions, for example [`PyPiSource`] over the PyPI JSON
//! API. The [`CandidateIndex`] sits in front of a source, remembers its answers and applies the
//! environment the resolution targets.

mod candidate_index;
mod memory;
mod project_info;
mod pypi;
mod source;

pub use candidate_index::CandidateIndex;
pub use memory::InMemorySource;
pub use pypi::{normalize_index_url, PyPiSource, PyPiSourceConfig, DEFAULT_INDEX_URL};
pub use source::{IndexError, PackageSource, Release};
