use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    EvaluationResult, config::EngineConfig, context::CalculationContext, evaluate_named,
    registry::RegistrySnapshot,
};

/// One evaluation of a batch: a registry formula at a date and place.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    /// Registry name of the formula.
    pub name:    String,
    /// Where and when to evaluate it.
    pub context: CalculationContext,
}

impl BatchJob {
    /// Creates a job.
    #[must_use]
    pub fn new(name: impl Into<String>, context: CalculationContext) -> Self {
        Self { name: name.into(),
               context }
    }

    /// Every combination of `names` and `dates` at the place of `context`,
    /// date-major.
    ///
    /// ## Example
    /// ```
    /// use chrono::NaiveDate;
    /// use zmanim_dsl::{CalculationContext, batch::BatchJob};
    ///
    /// let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let tz = chrono_tz::Asia::Jerusalem;
    /// let context = CalculationContext::new(first, 31.77, 35.21, 0.0, tz).unwrap();
    /// let dates: Vec<_> = first.iter_days().take(7).collect();
    ///
    /// let jobs = BatchJob::grid(&["alos", "tzais"], &dates, context);
    /// assert_eq!(jobs.len(), 14);
    /// assert_eq!(jobs[1].name, "tzais");
    /// ```
    #[must_use]
    pub fn grid(names: &[&str], dates: &[NaiveDate], context: CalculationContext) -> Vec<Self> {
        dates.iter()
             .flat_map(|date| names.iter().map(move |name| Self::new(*name, context.with_date(*date))))
             .collect()
    }
}

/// Evaluates `jobs` in parallel against one registry snapshot.
///
/// Results come back in job order. Each job stands alone: a failing
/// formula never affects the others.
#[must_use]
pub fn evaluate_batch(jobs: &[BatchJob],
                      registry: &RegistrySnapshot,
                      config: &EngineConfig)
                      -> Vec<EvaluationResult> {
    debug!(jobs = jobs.len(), formulas = registry.len(), "evaluating batch");
    jobs.par_iter()
        .map(|job| evaluate_named(&job.name, &job.context, registry, config.depth_budget))
        .collect()
}

/// Evaluates every formula of `registry` at `context`, keyed by name.
#[must_use]
pub fn evaluate_all(context: &CalculationContext,
                    registry: &RegistrySnapshot,
                    config: &EngineConfig)
                    -> BTreeMap<String, EvaluationResult> {
    registry.names()
            .into_par_iter()
            .map(|name| (name.to_string(), evaluate_named(name, context, registry, config.depth_budget)))
            .collect()
}
