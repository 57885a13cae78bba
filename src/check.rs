//! Health predicates and their aggregation.
//!
//! A [`Check`] is a named, zero-argument predicate supplied by the embedding
//! application (e.g. "database reachable"). A [`CheckSet`] is the ordered,
//! immutable collection handed to the responder at setup time. Evaluation is a
//! left fold of AND over the whole set: every check runs, in order, even after
//! one has already failed.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type CheckFn = dyn Fn() -> bool + Send + Sync;

/// A single health predicate.
///
/// Cloning is cheap; the closure is shared behind an `Arc`.
#[derive(Clone)]
pub struct Check {
    name: Arc<str>,
    func: Arc<CheckFn>,
}

impl Check {
    /// Creates a check with a name used in log output.
    pub fn named<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Creates an anonymous check.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::named("anonymous", func)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the predicate. A panic inside the predicate counts as `false`.
    pub fn run(&self) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.func)())) {
            Ok(passed) => passed,
            Err(_) => {
                tracing::error!(check = %self.name, "Health check panicked, treating as failed");
                false
            }
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish()
    }
}

/// The checks configured for a responder.
///
/// `Unconfigured` is the "no checks supplied" case and is vacuously healthy,
/// as is an empty `Checks` list.
#[derive(Clone, Debug, Default)]
pub enum CheckSet {
    #[default]
    Unconfigured,
    Checks(Arc<[Check]>),
}

impl CheckSet {
    /// Builds a set from already named checks, keeping their order.
    pub fn new(checks: impl IntoIterator<Item = Check>) -> Self {
        Self::Checks(checks.into_iter().collect())
    }

    /// Builds a set from bare closures, naming them `check-0`, `check-1`, ...
    pub fn from_fns<I, F>(funcs: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::new(
            funcs
                .into_iter()
                .enumerate()
                .map(|(i, f)| Check::named(format!("check-{}", i), f)),
        )
    }

    /// Number of configured checks (zero when unconfigured).
    pub fn len(&self) -> usize {
        match self {
            CheckSet::Unconfigured => 0,
            CheckSet::Checks(checks) => checks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evaluate(&self) -> bool {
        evaluate(self)
    }
}

impl From<Vec<Check>> for CheckSet {
    fn from(checks: Vec<Check>) -> Self {
        Self::Checks(checks.into())
    }
}

impl From<Option<Vec<Check>>> for CheckSet {
    fn from(checks: Option<Vec<Check>>) -> Self {
        checks.map_or(CheckSet::Unconfigured, CheckSet::from)
    }
}

/// Evaluates every check in order and ANDs the results.
///
/// Does not short-circuit: a failing check never prevents later checks from
/// running. Returns `true` for an unconfigured or empty set.
pub fn evaluate(checks: &CheckSet) -> bool {
    let checks = match checks {
        CheckSet::Unconfigured => {
            tracing::debug!("No health checks configured, reporting healthy");
            return true;
        }
        CheckSet::Checks(checks) => checks,
    };

    let healthy = checks.iter().fold(true, |healthy, check| {
        let passed = check.run();
        if !passed {
            tracing::warn!(check = %check.name(), "Health check failed");
        }
        healthy & passed
    });

    tracing::debug!(checks = checks.len(), healthy, "Evaluated health checks");
    healthy
}
