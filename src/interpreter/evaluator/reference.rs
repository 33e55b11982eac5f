use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::{
    error::EvalError,
    interpreter::evaluator::core::{EvalResult, Evaluator},
};

impl Evaluator<'_> {
    /// Resolves `@name` against the registry snapshot and evaluates the
    /// referenced formula.
    ///
    /// The name stays on the resolution stack while its tree is evaluated,
    /// so a reference back to it is caught as a cycle instead of recursing.
    /// A finished result is kept and reused for later references to the
    /// same name, unless it depends on where in the chain it was reached
    /// (a cycle or an exhausted budget).
    pub(crate) fn eval_reference(&mut self, name: &str) -> EvalResult<DateTime<Utc>> {
        let registry = self.registry;
        let Some(entry) = registry.get(name) else {
            return Err(EvalError::UnknownReference { name: name.to_string() });
        };

        if let Some(result) = self.resolved.get(entry.name()) {
            trace!(formula = name, "reusing resolved reference");
            return result.clone();
        }

        if let Some(start) = self.resolving.iter().position(|active| *active == name) {
            let chain: Vec<String> = self.resolving[start..].iter()
                                                            .copied()
                                                            .chain([entry.name()])
                                                            .map(str::to_string)
                                                            .collect();
            debug!(chain = %chain.join(" -> "), "reference cycle");
            return Err(EvalError::CycleDetected { chain });
        }

        let Some(ast) = entry.ast() else {
            return Err(EvalError::RejectedFormula { name: name.to_string() });
        };

        trace!(formula = name, depth = self.resolving.len(), "resolving reference");
        self.resolving.push(entry.name());
        let result =
            self.nested(|this| this.eval(ast, ast.root())?.as_instant(&format!("formula `@{name}`")));
        self.resolving.pop();

        if !matches!(result,
                     Err(EvalError::CycleDetected { .. } | EvalError::DepthExceeded { .. }))
        {
            self.resolved.insert(entry.name(), result.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        context::CalculationContext,
        error::EvalError,
        interpreter::evaluator::core::Evaluator,
        registry::FormulaRegistry,
    };

    fn evaluate(registry: &FormulaRegistry, name: &str) -> crate::EvaluationResult {
        let context = CalculationContext::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
                                              31.7683,
                                              35.2137,
                                              0.0,
                                              chrono_tz::Asia::Jerusalem).unwrap();
        let snapshot = registry.snapshot();
        Evaluator::new(context, &snapshot, 16).evaluate_named(name)
    }

    #[test]
    fn chains_resolve() {
        let registry: FormulaRegistry =
            [("shkia", "sunset"), ("tzais", "@shkia + 18min")].into_iter().collect();
        let shkia = evaluate(&registry, "shkia").unwrap();
        let tzais = evaluate(&registry, "tzais").unwrap();
        assert_eq!(tzais.utc() - shkia.utc(), chrono::TimeDelta::minutes(18));
    }

    #[test]
    fn cycles_report_the_chain() {
        let registry: FormulaRegistry =
            [("a", "@b + 1min"), ("b", "@c"), ("c", "@a")].into_iter().collect();
        assert_eq!(evaluate(&registry, "a"),
                   Err(EvalError::CycleDetected { chain: vec!["a".into(),
                                                              "b".into(),
                                                              "c".into(),
                                                              "a".into()] }));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let registry: FormulaRegistry = [("a", "@a")].into_iter().collect();
        assert!(matches!(evaluate(&registry, "a"), Err(EvalError::CycleDetected { .. })));
    }

    #[test]
    fn missing_and_broken_references() {
        let registry: FormulaRegistry = [("a", "@ghost"), ("b", "@broken"), ("broken", "sunrise +")]
            .into_iter()
            .collect();
        assert_eq!(evaluate(&registry, "a"),
                   Err(EvalError::UnknownReference { name: "ghost".into() }));
        assert_eq!(evaluate(&registry, "b"),
                   Err(EvalError::RejectedFormula { name: "broken".into() }));
    }

    #[test]
    fn shared_references_are_resolved_once() {
        let mut registry: FormulaRegistry = [("f0", "sunrise")].into_iter().collect();
        for i in 1..=40 {
            registry.define(format!("f{i}"), format!("midpoint(@f{0}, @f{0})", i - 1));
        }
        let context = CalculationContext::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
                                              31.7683,
                                              35.2137,
                                              0.0,
                                              chrono_tz::Asia::Jerusalem).unwrap();
        let snapshot = registry.snapshot();

        // 41 resolutions and 40 midpoints.
        let mut evaluator = Evaluator::new(context, &snapshot, 81);
        assert_eq!(evaluator.evaluate_named("f40").map(|t| t.utc()),
                   evaluate(&registry, "f0").map(|t| t.utc()));
        assert_eq!(evaluator.remaining(), 0);

        assert_eq!(Evaluator::new(context, &snapshot, 80).evaluate_named("f40"),
                   Err(EvalError::DepthExceeded { budget: 80 }));
    }

    #[test]
    fn the_same_formula_may_be_used_twice() {
        let registry: FormulaRegistry =
            [("noon", "solar_noon"), ("twice", "midpoint(@noon, @noon)")].into_iter().collect();
        assert_eq!(evaluate(&registry, "twice").map(|t| t.utc()),
                   evaluate(&registry, "noon").map(|t| t.utc()));
    }
}
