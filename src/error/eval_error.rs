use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::context::ContextError;

/// Why a formula produced no time.
///
/// Evaluation never panics; every way it can come up empty is one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The sun does not reach the requested position on this date here,
    /// e.g. 16.1° below the horizon during a high-latitude summer.
    #[error("the sun does not reach {event} on this date at this location")]
    AstronomicalEventNotReached {
        /// The unreached event, e.g. `16.1° below the horizon (morning)`.
        event: String,
    },
    /// `@name` names no formula of the registry snapshot.
    #[error("unknown formula `@{name}`")]
    UnknownReference {
        /// The missing name.
        name: String,
    },
    /// Resolving references led back to a formula already being resolved.
    #[error("circular reference: {}", chain.join(" -> "))]
    CycleDetected {
        /// Formula names from the outermost reference to the repeat.
        chain: Vec<String>,
    },
    /// The reference and combinator step budget ran out.
    #[error("evaluation needed more than the budget of {budget} steps")]
    DepthExceeded {
        /// The budget evaluation started with.
        budget: usize,
    },
    /// Every alternative of a combinator failed.
    #[error("all {attempts} alternatives of {function}() failed")]
    AllAlternativesFailed {
        /// The combinator.
        function: &'static str,
        /// How many alternatives were tried.
        attempts: usize,
    },
    /// An operation the values do not support, e.g. adding two times.
    #[error("invalid operation: {details}")]
    InvalidOperation {
        /// What was attempted.
        details: String,
    },
    /// The result lies outside the calendar day it was computed for.
    #[error("{instant} is outside {date} in the requested time zone")]
    OutsideWindow {
        /// The out-of-window result.
        instant: DateTime<Utc>,
        /// The calculation date.
        date:    NaiveDate,
    },
    /// A referenced formula did not compile.
    #[error("formula `@{name}` has errors and cannot be evaluated")]
    RejectedFormula {
        /// The rejected formula.
        name: String,
    },
    /// The location or date given to [`crate::evaluate_at`] is unusable.
    #[error(transparent)]
    InvalidContext(#[from] ContextError),
}

impl EvalError {
    /// Builds an [`EvalError::InvalidOperation`].
    pub(crate) fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidOperation { details: details.into() }
    }

    /// Failures that stop a combinator instead of moving it on to its
    /// next alternative.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. })
    }
}
