use std::fmt;

use ordered_float::OrderedFloat;

use crate::interpreter::symbols::Function;

/// Index of a node inside an [`Ast`] arena.
///
/// Nodes refer to their children by position, never by pointer, so every
/// node has exactly one parent and the tree can be shared freely between
/// threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the position of the node in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unit attached to a numeric literal.
///
/// `mins` is accepted as a spelling of [`Unit::Minutes`] and `hrs` of
/// [`Unit::Hours`]; the AST only ever stores the normalized unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// `min` / `mins`
    Minutes,
    /// `hr` / `hrs`
    Hours,
    /// `deg`
    Degrees,
}

impl Unit {
    /// Looks up a unit suffix as written in formula source.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::ast::Unit;
    ///
    /// assert_eq!(Unit::from_suffix("mins"), Some(Unit::Minutes));
    /// assert_eq!(Unit::from_suffix("deg"), Some(Unit::Degrees));
    /// assert_eq!(Unit::from_suffix("days"), None);
    /// ```
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "min" | "mins" => Some(Self::Minutes),
            "hr" | "hrs" => Some(Self::Hours),
            "deg" => Some(Self::Degrees),
            _ => None,
        }
    }

    /// Canonical spelling of the unit.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Minutes => "min",
            Self::Hours => "hr",
            Self::Degrees => "deg",
        }
    }
}

/// Arithmetic operators. Only addition and subtraction exist in the
/// language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `-`
    Negate,
    /// `!`
    Not,
}

/// Comparison operators, used in `if` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

/// Short-circuiting boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// A node of the formula syntax tree.
///
/// Every variant records the byte offset of the token that introduced it so
/// that diagnostics can point back into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A numeric constant with an optional unit, e.g. `72min` or `16.1`.
    Literal {
        /// The constant value.
        value:  OrderedFloat<f64>,
        /// The normalized unit, if any.
        unit:   Option<Unit>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A day of the year such as `21-May`, compared against `date`.
    MonthDay {
        /// Month, 1 to 12.
        month:  u32,
        /// Day of the month as written; checked by the validator.
        day:    u32,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A bare name: an astronomical primitive (`sunrise`), a direction
    /// (`before_sunrise`), a base (`gra`), a condition variable
    /// (`latitude`) or a season (`winter`).
    Identifier {
        /// The name as written.
        name:   String,
        /// Byte offset in the source.
        offset: usize,
    },
    /// `@name`, a reference to another formula of the registry.
    Reference {
        /// Name of the referenced formula, without the sigil.
        name:   String,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A function or combinator invocation.
    Call {
        /// The name as written.
        name:     String,
        /// The resolved function, `None` when the name is not known.
        function: Option<Function>,
        /// Arguments in declaration order.
        args:     Vec<NodeId>,
        /// Byte offset in the source.
        offset:   usize,
    },
    /// A prefix operation.
    UnaryOp {
        /// The operator.
        op:      UnaryOperator,
        /// The operand.
        operand: NodeId,
        /// Byte offset in the source.
        offset:  usize,
    },
    /// Unit-aware addition or subtraction.
    BinaryOp {
        /// The operator.
        op:     BinaryOperator,
        /// Left operand.
        left:   NodeId,
        /// Right operand.
        right:  NodeId,
        /// Byte offset of the operator.
        offset: usize,
    },
    /// A comparison producing a boolean.
    Comparison {
        /// The operator.
        op:     CompareOperator,
        /// Left operand.
        left:   NodeId,
        /// Right operand.
        right:  NodeId,
        /// Byte offset of the operator.
        offset: usize,
    },
    /// `&&` or `||`.
    Logical {
        /// The operator.
        op:     LogicalOperator,
        /// Left operand.
        left:   NodeId,
        /// Right operand.
        right:  NodeId,
        /// Byte offset of the operator.
        offset: usize,
    },
    /// Placeholder for a sub-expression that failed to parse.
    Error {
        /// Byte offset where parsing gave up.
        offset: usize,
    },
}

impl Expr {
    /// Gets the source offset of the node.
    /// ## Example
    /// ```
    /// use zmanim_dsl::ast::Expr;
    ///
    /// let expr = Expr::Reference { name:   "alos".to_string(),
    ///                              offset: 4, };
    ///
    /// assert_eq!(expr.offset(), 4);
    /// ```
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Literal { offset, .. }
            | Self::MonthDay { offset, .. }
            | Self::Identifier { offset, .. }
            | Self::Reference { offset, .. }
            | Self::Call { offset, .. }
            | Self::UnaryOp { offset, .. }
            | Self::BinaryOp { offset, .. }
            | Self::Comparison { offset, .. }
            | Self::Logical { offset, .. }
            | Self::Error { offset } => *offset,
        }
    }
}

/// A compiled formula: an arena of [`Expr`] nodes plus the root index.
///
/// The parser pushes children before their parents, so the arena is a
/// post-order listing of the tree and the root is always the last node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ast {
    nodes: Vec<Expr>,
    root:  NodeId,
}

impl Ast {
    /// Returns the root node id.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree. Ids are only ever handed
    /// out by the arena that owns them.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// Returns the root node.
    #[must_use]
    pub fn root_node(&self) -> &Expr {
        self.node(self.root)
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the names of all `@references` in the tree, in source
    /// order of appearance in the arena.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
                                       Expr::Reference { name, .. } => Some(name.as_str()),
                                       _ => None,
                                   })
    }

    /// Whether any sub-expression failed to parse.
    #[must_use]
    pub fn contains_errors(&self) -> bool {
        self.nodes.iter().any(|node| matches!(node, Expr::Error { .. }))
    }

    /// Canonical text of the sub-tree rooted at `id`.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::{ast::Expr, compile};
    ///
    /// let ast = compile("midpoint(@alos, sunset) - 5 mins").ast.unwrap();
    /// let Expr::BinaryOp { left, .. } = ast.root_node() else { unreachable!() };
    ///
    /// assert_eq!(ast.display(*left).to_string(), "midpoint(@alos, sunset)");
    /// ```
    #[must_use]
    pub const fn display(&self, id: NodeId) -> Subtree<'_> {
        Subtree { ast: self, id }
    }

    fn render(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node(id) {
            Expr::Literal { value, unit, .. } => match unit {
                Some(unit) => write!(f, "{}{}", value.0, unit.suffix()),
                None => write!(f, "{}", value.0),
            },
            Expr::MonthDay { month, day, .. } => write!(f, "{day}-{}", month_name(*month)),
            Expr::Identifier { name, .. } => f.write_str(name),
            Expr::Reference { name, .. } => write!(f, "@{name}"),
            Expr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.render(*arg, f)?;
                }
                f.write_str(")")
            },
            Expr::UnaryOp { op, operand, .. } => {
                match op {
                    UnaryOperator::Negate => {
                        f.write_str("-")?;
                        self.render_tighter(*operand, Precedence::Negation, f)
                    },
                    UnaryOperator::Not => {
                        f.write_str("!")?;
                        self.render_operand(*operand, f)
                    },
                }
            },
            Expr::BinaryOp { op, left, right, .. } => {
                self.render_tighter(*left, Precedence::Additive, f)?;
                f.write_str(match op {
                                BinaryOperator::Add => " + ",
                                BinaryOperator::Sub => " - ",
                            })?;
                self.render_tighter(*right, Precedence::Negation, f)
            },
            Expr::Comparison { op, left, right, .. } => {
                self.render_tighter(*left, Precedence::Additive, f)?;
                f.write_str(match op {
                                CompareOperator::Less => " < ",
                                CompareOperator::LessEqual => " <= ",
                                CompareOperator::Greater => " > ",
                                CompareOperator::GreaterEqual => " >= ",
                                CompareOperator::Equal => " == ",
                                CompareOperator::NotEqual => " != ",
                            })?;
                self.render_tighter(*right, Precedence::Additive, f)
            },
            Expr::Logical { op, left, right, .. } => {
                self.render_operand(*left, f)?;
                f.write_str(match op {
                                LogicalOperator::And => " && ",
                                LogicalOperator::Or => " || ",
                            })?;
                self.render_operand(*right, f)
            },
            Expr::Error { .. } => f.write_str("<error>"),
        }
    }

    /// Renders an operand of `!`, `&&` or `||`, parenthesizing compound
    /// expressions for readability.
    fn render_operand(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node(id) {
            Expr::BinaryOp { .. } | Expr::Comparison { .. } | Expr::Logical { .. } => {
                self.render_grouped(id, f)
            },
            _ => self.render(id, f),
        }
    }

    /// Renders a child that must bind at least as tightly as `min` to
    /// parse back into the same tree.
    fn render_tighter(&self, id: NodeId, min: Precedence, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if Precedence::of(self.node(id)) < min {
            self.render_grouped(id, f)
        } else {
            self.render(id, f)
        }
    }

    fn render_grouped(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        self.render(id, f)?;
        f.write_str(")")
    }
}

/// Month abbreviations as written in day-of-year literals.
pub const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Abbreviation of `month`, 1 to 12.
pub(crate) fn month_name(month: u32) -> &'static str {
    month.checked_sub(1)
         .and_then(|i| MONTHS.get(i as usize))
         .copied()
         .unwrap_or("?")
}

/// Binding strength of a node, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Or,
    And,
    Not,
    Comparison,
    Additive,
    Negation,
    Atom,
}

impl Precedence {
    const fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Logical { op: LogicalOperator::Or, .. } => Self::Or,
            Expr::Logical { op: LogicalOperator::And, .. } => Self::And,
            Expr::UnaryOp { op: UnaryOperator::Not, .. } => Self::Not,
            Expr::Comparison { .. } => Self::Comparison,
            Expr::BinaryOp { .. } => Self::Additive,
            Expr::UnaryOp { op: UnaryOperator::Negate, .. } => Self::Negation,
            _ => Self::Atom,
        }
    }
}

/// Display adapter returned by [`Ast::display`].
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    ast: &'a Ast,
    id:  NodeId,
}

impl fmt::Display for Subtree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ast.render(self.id, f)
    }
}

/// Prints the formula in canonical form: normalized units, single spaces
/// around operators, parentheses only where grouping requires them.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(self.root, f)
    }
}

/// Append-only arena used by the parser.
///
/// Tracks the height of every node so that the parser can refuse trees too
/// deep to walk recursively.
#[derive(Debug, Default)]
pub(crate) struct AstBuilder {
    nodes:   Vec<Expr>,
    heights: Vec<usize>,
}

impl AstBuilder {
    /// Appends a node and returns its id.
    pub(crate) fn push(&mut self, expr: Expr) -> NodeId {
        let id = u32::try_from(self.nodes.len()).map_or(NodeId(u32::MAX), NodeId);
        self.heights.push(1 + self.child_height(&expr));
        self.nodes.push(expr);
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// Levels from `id` down to its deepest leaf, `id` included.
    pub(crate) fn height(&self, id: NodeId) -> usize {
        self.heights[id.index()]
    }

    fn child_height(&self, expr: &Expr) -> usize {
        let of = |id: &NodeId| self.heights[id.index()];
        match expr {
            Expr::Call { args, .. } => args.iter().map(of).max().unwrap_or(0),
            Expr::UnaryOp { operand, .. } => of(operand),
            Expr::BinaryOp { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::Logical { left, right, .. } => of(left).max(of(right)),
            _ => 0,
        }
    }

    /// Seals the arena with `root` as its root.
    pub(crate) fn finish(self, root: NodeId) -> Ast {
        Ast { nodes: self.nodes,
              root }
    }
}
