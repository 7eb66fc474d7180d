//! Finds a consistent set of package versions for a set of requirements.
//!
//! Use a [`Resolver`] to run a resolution. The search itself is a depth-first backtracking search,
//! it always selects the newest version it is allowed to and only goes back to an older version
//! when a newer one leads to a conflict. A [`Reporter`] can be attached to observe the decisions.

mod candidate;
mod engine;
mod error;
mod options;
mod reporter;
mod resolver;

pub use candidate::{Candidate, PackageKey};
pub use error::{Conflict, ConflictReason, ConstraintOrigin, ResolutionError};
pub use options::{PreReleaseResolution, ResolveOptions};
pub use reporter::{NoOpReporter, Reporter, TracingReporter};
pub use resolver::Resolver;
