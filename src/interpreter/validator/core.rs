use crate::{
    ast::{Ast, Expr, NodeId, Unit, UnaryOperator, month_name},
    error::{Diagnostic, DiagnosticKind},
    interpreter::{
        symbols::Symbol,
        validator::units,
        value::core::{MonthDay, ValueKind},
    },
    registry::RegistrySnapshot,
};

/// Most alternatives listed after an unknown name.
const MAX_SUGGESTIONS: usize = 5;
/// Jaro-Winkler similarity a name needs to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Checks an anonymous formula against the formulas of `registry`.
///
/// Returns every semantic diagnostic found; the formula may be evaluated if
/// none of them is an error.
///
/// ## Example
/// ```
/// use zmanim_dsl::{compile, interpreter::validator::core::validate, registry::FormulaRegistry};
///
/// let registry = FormulaRegistry::new().snapshot();
/// let ast = compile("sunrise + 72").ast.unwrap();
///
/// let diagnostics = validate(&ast, &registry);
/// assert_eq!(diagnostics.len(), 1);
/// assert!(diagnostics[0].message.contains("72min"));
/// ```
#[must_use]
pub fn validate(ast: &Ast, registry: &RegistrySnapshot) -> Vec<Diagnostic> {
    Validator::new(ast, registry, None).run()
}

/// Checks formula `name` as it would be stored in `registry`, additionally
/// rejecting references that lead back to `name`.
#[must_use]
pub fn validate_named(name: &str, ast: &Ast, registry: &RegistrySnapshot) -> Vec<Diagnostic> {
    Validator::new(ast, registry, Some(name)).run()
}

/// Walks a tree once, computing the static kind of every node.
///
/// A node whose kind cannot be determined is "poisoned": its checker
/// returns `None`, the problem is reported once, and the parents stay
/// silent about it.
pub struct Validator<'a> {
    pub(crate) ast:         &'a Ast,
    registry:               &'a RegistrySnapshot,
    current:                Option<&'a str>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    /// Creates a validator. `current` is the registry name of the formula
    /// being checked, if it has one.
    #[must_use]
    pub const fn new(ast: &'a Ast, registry: &'a RegistrySnapshot, current: Option<&'a str>) -> Self {
        Self { ast,
               registry,
               current,
               diagnostics: Vec::new() }
    }

    /// Checks the whole tree and returns the diagnostics.
    #[must_use]
    pub fn run(mut self) -> Vec<Diagnostic> {
        let root = self.ast.root();
        if let Some(kind) = self.check(root)
           && kind != ValueKind::Instant
        {
            let offset = self.ast.node(root).offset();
            self.error(DiagnosticKind::UnitMismatch,
                       offset,
                       format!("a formula must produce a time, but this one produces a {kind}"));
        }
        self.diagnostics
    }

    /// Computes the kind of node `id`, reporting problems on the way.
    pub(crate) fn check(&mut self, id: NodeId) -> Option<ValueKind> {
        let ast = self.ast;
        match ast.node(id) {
            Expr::Literal { unit, .. } => Some(literal_kind(*unit)),
            Expr::MonthDay { month, day, offset } => {
                if MonthDay::new(*month, *day).is_ok() {
                    return Some(ValueKind::Date);
                }
                self.error(DiagnosticKind::InvalidArgument,
                           *offset,
                           format!("{day}-{} is not a day of the year", month_name(*month)));
                None
            },
            Expr::Identifier { name, offset } => self.check_identifier(name, *offset),
            Expr::Reference { name, offset } => self.check_reference(name, *offset),
            Expr::Call { name,
                         function,
                         args,
                         offset, } => self.check_call(name, *function, args, *offset),
            Expr::UnaryOp { op, operand, offset } => {
                let kind = self.check(*operand)?;
                self.settle(units::unary(*op, kind), *offset)
            },
            Expr::BinaryOp { op,
                             left,
                             right,
                             offset, } => {
                let (left, right) = (self.check(*left), self.check(*right));
                self.settle(units::binary(*op, left?, right?), *offset)
            },
            Expr::Comparison { op,
                               left,
                               right,
                               offset, } => {
                let (left, right) = (self.check(*left), self.check(*right));
                self.settle(units::comparison(*op, left?, right?), *offset)
            },
            Expr::Logical { left, right, offset, .. } => {
                let (left, right) = (self.check(*left), self.check(*right));
                self.settle(units::logical(left?, right?), *offset)
            },
            Expr::Error { .. } => None,
        }
    }

    fn check_identifier(&mut self, name: &str, offset: usize) -> Option<ValueKind> {
        match Symbol::lookup(name) {
            Some(Symbol::Primitive(_)) => Some(ValueKind::Instant),
            Some(Symbol::Condition(var)) => Some(var.kind()),
            Some(Symbol::Season(_)) => Some(ValueKind::Season),
            Some(Symbol::Direction(_)) => {
                self.error(DiagnosticKind::InvalidArgument,
                           offset,
                           format!("`{name}` is a direction; it only makes sense as the second \
                                    argument of `solar`, `seasonal_solar` or \
                                    `proportional_minutes`"));
                None
            },
            Some(Symbol::Base(_)) => {
                self.error(DiagnosticKind::InvalidArgument,
                           offset,
                           format!("`{name}` is a day definition; it only makes sense as the \
                                    second argument of `proportional_hours`"));
                None
            },
            None => {
                let hint = if self.registry.contains(name) {
                    format!("; write `@{name}` to use the formula of that name")
                } else {
                    String::new()
                };
                self.error(DiagnosticKind::UnknownIdentifier,
                           offset,
                           format!("unknown name `{name}`{hint}"));
                None
            },
        }
    }

    fn check_reference(&mut self, name: &str, offset: usize) -> Option<ValueKind> {
        if self.current == Some(name) {
            self.error(DiagnosticKind::CircularReference,
                       offset,
                       format!("formula `{name}` references itself"));
            return None;
        }
        if !self.registry.contains(name) {
            let names = self.registry.names();
            let hint = suggest(name, names.iter().copied(), "@");
            self.error(DiagnosticKind::UnknownReference,
                       offset,
                       format!("unknown formula `@{name}`{hint}"));
            return None;
        }
        if let Some(current) = self.current
           && self.registry.reaches(name, current)
        {
            self.error(DiagnosticKind::CircularReference,
                       offset,
                       format!("`@{name}` leads back to `{current}`"));
            return None;
        }
        Some(ValueKind::Instant)
    }

    /// Turns the outcome of an operator rule into a kind, reporting the
    /// message of a failed rule at `offset`.
    fn settle(&mut self, outcome: Result<ValueKind, String>, offset: usize) -> Option<ValueKind> {
        outcome.map_err(|message| self.error(DiagnosticKind::UnitMismatch, offset, message))
               .ok()
    }

    /// Constant value of a literal, or of a negated literal, with its unit.
    pub(crate) fn literal(&self, id: NodeId) -> Option<(f64, Option<Unit>)> {
        match self.ast.node(id) {
            Expr::Literal { value, unit, .. } => Some((value.0, *unit)),
            Expr::UnaryOp { op: UnaryOperator::Negate,
                            operand,
                            .. } => self.literal(*operand).map(|(value, unit)| (-value, unit)),
            _ => None,
        }
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, offset: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(kind, offset, message));
    }

    pub(crate) fn warning(&mut self, kind: DiagnosticKind, offset: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(kind, offset, message));
    }
}

/// A "did you mean" hint listing up to five `candidates` that look like
/// `name`, best match first, or an empty string when none does.
///
/// ## Example
/// ```
/// use zmanim_dsl::interpreter::validator::core::suggest;
///
/// let hint = suggest("tzeis", ["alos", "tzais", "tzais_72"].into_iter(), "@");
/// assert_eq!(hint, "; did you mean `@tzais` or `@tzais_72`?");
/// assert_eq!(suggest("xyz", ["alos"].into_iter(), ""), "");
/// ```
#[must_use]
pub fn suggest<'n>(name: &str, candidates: impl Iterator<Item = &'n str>, sigil: &str) -> String {
    let mut scored: Vec<(f64, &str)> =
        candidates.map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
                  .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
                  .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    let names: Vec<String> = scored.into_iter()
                                   .take(MAX_SUGGESTIONS)
                                   .map(|(_, candidate)| format!("`{sigil}{candidate}`"))
                                   .collect();
    match names.split_last() {
        None => String::new(),
        Some((only, [])) => format!("; did you mean {only}?"),
        Some((last, rest)) => format!("; did you mean {} or {last}?", rest.join(", ")),
    }
}

/// Static kind of a literal with the given unit.
#[must_use]
pub const fn literal_kind(unit: Option<Unit>) -> ValueKind {
    match unit {
        Some(Unit::Minutes | Unit::Hours) => ValueKind::Duration,
        Some(Unit::Degrees) => ValueKind::Angle,
        None => ValueKind::Number,
    }
}
