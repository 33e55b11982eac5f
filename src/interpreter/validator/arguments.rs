use crate::{
    ast::{Expr, NodeId, Unit},
    error::DiagnosticKind,
    interpreter::{
        symbols::{Base, Direction, FUNCTION_NAMES, Function, Symbol},
        validator::core::{Validator, suggest},
        value::core::ValueKind,
    },
};

/// Largest sensible argument of `proportional_minutes`.
const MAX_PROPORTIONAL_MINUTES: f64 = 200.0;

impl Validator<'_> {
    /// Checks a call and returns the kind it produces.
    pub(crate) fn check_call(&mut self,
                             name: &str,
                             function: Option<Function>,
                             args: &[NodeId],
                             offset: usize)
                             -> Option<ValueKind> {
        let Some(function) = function else {
            let hint = suggest(name, FUNCTION_NAMES.iter().copied(), "");
            self.error(DiagnosticKind::UnknownFunction,
                       offset,
                       format!("unknown function `{name}`{hint}"));
            self.check_loosely(args);
            return None;
        };

        let arity = function.arity();
        if !arity.accepts(args.len()) {
            self.error(DiagnosticKind::ArityMismatch,
                       offset,
                       format!("`{name}` takes {arity}, but was given {}", args.len()));
            self.check_loosely(args);
            return None;
        }

        match (function, args) {
            (Function::Solar, [angle, direction]) => {
                self.check_angle(function, *angle);
                self.check_direction(function, *direction, false);
                Some(ValueKind::Instant)
            },
            (Function::SeasonalSolar, [angle, direction]) => {
                self.check_angle(function, *angle);
                self.check_direction(function, *direction, true);
                Some(ValueKind::Instant)
            },
            (Function::ProportionalHours, [hours, rest @ ..]) => {
                self.check_hours(*hours);
                match rest {
                    [base] => self.check_base(*base),
                    [start, end] => {
                        self.expect_instant(function, 2, *start);
                        self.expect_instant(function, 3, *end);
                    },
                    _ => {},
                }
                Some(ValueKind::Instant)
            },
            (Function::ProportionalMinutes, [minutes, direction]) => {
                self.check_minutes(*minutes);
                self.check_direction(function, *direction, true);
                Some(ValueKind::Instant)
            },
            (Function::If, [condition, then, otherwise]) => {
                self.check_if(*condition, *then, *otherwise, offset)
            },
            (_, args) => {
                for (position, arg) in args.iter().enumerate() {
                    self.expect_instant(function, position + 1, *arg);
                }
                Some(ValueKind::Instant)
            },
        }
    }

    /// Checks the arguments of a call that is already known to be broken,
    /// so problems inside them still surface. Keywords are skipped since
    /// their meaning depends on the call.
    fn check_loosely(&mut self, args: &[NodeId]) {
        for arg in args {
            let keyword = matches!(self.ast.node(*arg),
                                   Expr::Identifier { name, .. }
                                   if matches!(Symbol::lookup(name),
                                               Some(Symbol::Direction(_) | Symbol::Base(_))));
            if !keyword {
                self.check(*arg);
            }
        }
    }

    fn check_angle(&mut self, function: Function, id: NodeId) {
        let Some(kind) = self.check(id) else { return };
        let offset = self.ast.node(id).offset();

        if !kind.is_numeric() {
            self.error(DiagnosticKind::InvalidArgument,
                       offset,
                       format!("the angle of `{}` must be a number of degrees, found a {kind}",
                               function.name()));
        } else if let Some((degrees, _)) = self.literal(id)
                  && !(-90.0..=90.0).contains(&degrees)
        {
            self.error(DiagnosticKind::InvalidArgument,
                       offset,
                       format!("solar angle {degrees}° is outside the range -90° to 90°"));
        }
    }

    fn check_direction(&mut self, function: Function, id: NodeId, outward_only: bool) {
        let node = self.ast.node(id);
        let direction = match node {
            Expr::Identifier { name, .. } => Direction::from_name(name),
            _ => None,
        };

        match direction {
            Some(direction) if outward_only && direction.outward().is_none() => {
                self.error(DiagnosticKind::InvalidArgument,
                           node.offset(),
                           format!("`{}` only works before sunrise or after sunset",
                                   function.name()));
            },
            Some(_) => {},
            None => {
                self.error(DiagnosticKind::InvalidArgument,
                           node.offset(),
                           format!("the second argument of `{}` must be a direction such as \
                                    `before_sunrise` or `after_sunset`",
                                   function.name()));
            },
        }
    }

    fn check_base(&mut self, id: NodeId) {
        let node = self.ast.node(id);
        let is_base = matches!(node, Expr::Identifier { name, .. } if Base::from_name(name).is_some());
        if !is_base {
            self.error(DiagnosticKind::InvalidArgument,
                       node.offset(),
                       format!("the day definition of `proportional_hours` must be one of {}",
                               Base::NAMES.join(", ")));
        }
    }

    fn check_hours(&mut self, id: NodeId) {
        let Some(kind) = self.check(id) else { return };
        let offset = self.ast.node(id).offset();

        if kind != ValueKind::Number {
            self.error(DiagnosticKind::InvalidArgument,
                       offset,
                       format!("the hour count of `proportional_hours` must be a plain number, \
                                found a {kind}"));
        } else if let Some((hours, _)) = self.literal(id)
                  && !(0.0..=12.0).contains(&hours)
        {
            self.warning(DiagnosticKind::SuspiciousValue,
                         offset,
                         format!("{hours} proportional hours falls outside the day, which has 12"));
        }
    }

    fn check_minutes(&mut self, id: NodeId) {
        let Some(kind) = self.check(id) else { return };
        let offset = self.ast.node(id).offset();

        if !matches!(kind, ValueKind::Number | ValueKind::Duration) {
            self.error(DiagnosticKind::InvalidArgument,
                       offset,
                       format!("the minute count of `proportional_minutes` must be a number or \
                                a duration, found a {kind}"));
        } else if let Some((value, unit)) = self.literal(id) {
            let minutes = if unit == Some(Unit::Hours) { value * 60.0 } else { value };
            if minutes <= 0.0 || minutes > MAX_PROPORTIONAL_MINUTES {
                self.warning(DiagnosticKind::SuspiciousValue,
                             offset,
                             format!("{minutes} proportional minutes is outside the usual range \
                                      of 0 to {MAX_PROPORTIONAL_MINUTES}"));
            }
        }
    }

    fn check_if(&mut self,
                condition: NodeId,
                then: NodeId,
                otherwise: NodeId,
                offset: usize)
                -> Option<ValueKind> {
        if let Some(kind) = self.check(condition)
           && !matches!(kind, ValueKind::Boolean | ValueKind::Instant)
        {
            let at = self.ast.node(condition).offset();
            self.error(DiagnosticKind::InvalidArgument,
                       at,
                       format!("the condition of `if` must be a comparison or a time, found a \
                                {kind}"));
        }

        match (self.check(then), self.check(otherwise)) {
            (Some(a), Some(b)) if a == b => Some(a),
            (Some(a), Some(b)) => {
                self.error(DiagnosticKind::UnitMismatch,
                           offset,
                           format!("the branches of `if` produce a {a} and a {b}"));
                None
            },
            (a, b) => a.or(b),
        }
    }

    fn expect_instant(&mut self, function: Function, position: usize, id: NodeId) {
        if let Some(kind) = self.check(id)
           && kind != ValueKind::Instant
        {
            let offset = self.ast.node(id).offset();
            self.error(DiagnosticKind::InvalidArgument,
                       offset,
                       format!("argument {position} of `{}` must be a time, found a {kind}",
                               function.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compile,
        error::{Diagnostic, DiagnosticKind, Severity},
        interpreter::validator::core::validate,
        registry::FormulaRegistry,
    };

    fn diagnose(source: &str) -> Vec<Diagnostic> {
        let ast = compile(source).ast.expect("source should parse");
        validate(&ast, &FormulaRegistry::new().snapshot())
    }

    #[test]
    fn arity_errors_name_the_function_and_count() {
        let diagnostics = diagnose("coalesce(sunrise)");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ArityMismatch);
        assert_eq!(diagnostics[0].message,
                   "`coalesce` takes at least 2 arguments, but was given 1");
    }

    #[test]
    fn aliases_report_the_name_as_written() {
        let diagnostics = diagnose("first_valid(sunrise)");
        assert!(diagnostics[0].message.starts_with("`first_valid`"));
    }

    #[test]
    fn broken_calls_still_check_their_arguments() {
        let kinds: Vec<_> = diagnose("solar(16.1, before_sunrise, nope)").into_iter()
                                                                          .map(|d| d.kind)
                                                                          .collect();
        assert_eq!(kinds, [DiagnosticKind::ArityMismatch, DiagnosticKind::UnknownIdentifier]);
    }

    #[test]
    fn solar_angles_are_bounded() {
        let diagnostics = diagnose("solar(95, before_sunrise)");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidArgument);
        assert!(diagnostics[0].message.contains("95"));
        assert!(diagnose("solar(-90, before_sunrise)").is_empty());
    }

    #[test]
    fn solar_needs_a_direction() {
        assert_eq!(diagnose("solar(16.1, sunrise)")[0].kind, DiagnosticKind::InvalidArgument);
        assert!(diagnose("solar(3, after_noon)").is_empty());
    }

    #[test]
    fn seasonal_functions_only_face_outward() {
        assert_eq!(diagnose("seasonal_solar(16.1, after_sunrise)")[0].kind,
                   DiagnosticKind::InvalidArgument);
        assert_eq!(diagnose("proportional_minutes(72, before_noon)")[0].kind,
                   DiagnosticKind::InvalidArgument);
        assert!(diagnose("seasonal_solar(16.1, before_geometric_sunrise)").is_empty());
    }

    #[test]
    fn proportional_hours_checks_its_base() {
        assert!(diagnose("proportional_hours(3)").is_empty());
        assert!(diagnose("proportional_hours(3, mga_72_zmanis)").is_empty());
        assert_eq!(diagnose("proportional_hours(3, mga_73)")[0].kind,
                   DiagnosticKind::InvalidArgument);
        assert_eq!(diagnose("proportional_hours(3, sunrise, 5min)")[0].kind,
                   DiagnosticKind::InvalidArgument);
    }

    #[test]
    fn odd_values_are_warnings() {
        let diagnostics = diagnose("proportional_hours(13)");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::SuspiciousValue);

        let diagnostics = diagnose("proportional_minutes(4hr, after_sunset)");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnose("proportional_minutes(72min, after_sunset)").is_empty());
    }

    #[test]
    fn combinators_take_times() {
        let diagnostics = diagnose("min(sunrise, 5min)");
        assert_eq!(diagnostics[0].message, "argument 2 of `min` must be a time, found a duration");
        assert!(diagnose("max(sunrise, sunset, solar_noon)").is_empty());
    }

    #[test]
    fn if_branches_must_agree() {
        assert_eq!(diagnose("if(month == 6, sunrise, 5min)")[0].kind,
                   DiagnosticKind::UnitMismatch);
        assert!(diagnose("if(solar(16.1, before_sunrise), sunrise, sunset)").is_empty());
        assert_eq!(diagnose("if(latitude, sunrise, sunset)")[0].kind,
                   DiagnosticKind::InvalidArgument);
    }

    #[test]
    fn unknown_functions_are_reported() {
        let diagnostics = diagnose("chatzos(sunrise, sunset)");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownFunction);
        assert_eq!(diagnostics[0].message, "unknown function `chatzos`");

        let diagnostics = diagnose("sollar(16.1, before_sunrise)");
        assert!(diagnostics[0].message.ends_with("did you mean `solar`?"),
                "{}",
                diagnostics[0].message);
    }
}
