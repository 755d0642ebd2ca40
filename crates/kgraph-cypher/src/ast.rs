//! Abstract Syntax Tree for the read-only Cypher subset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete read query:
/// `MATCH pattern [WHERE expr] RETURN items [ORDER BY ..] [SKIP n] [LIMIT n]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The single MATCH pattern
    pub pattern: Pattern,
    /// Optional WHERE predicate
    pub where_clause: Option<Expression>,
    /// RETURN projection
    pub return_clause: ReturnClause,
    /// ORDER BY keys, empty when absent
    pub order_by: Vec<OrderByItem>,
    /// SKIP count
    pub skip: Option<usize>,
    /// LIMIT count
    pub limit: Option<usize>,
}

/// A MATCH pattern: one node, or one relationship hop between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// `(n:Label {k: v})`
    Node(NodePattern),
    /// `(a)-[r:TYPE]->(b)` and friends
    Path {
        left: NodePattern,
        relationship: RelPattern,
        right: NodePattern,
    },
}

impl Pattern {
    /// Returns the variables bound by this pattern, in pattern order.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Pattern::Node(node) => node.variable.as_deref().into_iter().collect(),
            Pattern::Path {
                left,
                relationship,
                right,
            } => [
                left.variable.as_deref(),
                relationship.variable.as_deref(),
                right.variable.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }
}

/// A node pattern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expression)>,
}

/// A relationship pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelPattern {
    pub variable: Option<String>,
    /// Alternative types (`:A|B`); empty matches any type
    pub types: Vec<String>,
    pub properties: Vec<(String, Expression)>,
    pub direction: Direction,
}

/// Direction of a relationship pattern, relative to the left node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `(a)-[]->(b)`
    Outgoing,
    /// `(a)<-[]-(b)`
    Incoming,
    /// `(a)-[]-(b)`
    Both,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    /// `$name`
    Parameter(String),
    /// A bare variable reference
    Variable(String),
    /// `variable.property`
    Property { variable: String, property: String },
    /// `name(args...)`
    Function { name: String, args: Vec<Expression> },
    /// `[a, b, c]`
    List(Vec<Expression>),
    Comparison {
        left: Box<Expression>,
        op: ComparisonOp,
        right: Box<Expression>,
    },
    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expression>, negated: bool },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// RETURN clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnClause {
    pub distinct: bool,
    pub items: Vec<ReturnItem>,
}

/// One projected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl ReturnItem {
    /// The column name: the alias if present, otherwise the expression text.
    pub fn column_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expression.to_string(),
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expression,
    pub direction: SortDirection,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Neq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Contains => "CONTAINS",
            ComparisonOp::StartsWith => "STARTS WITH",
            ComparisonOp::EndsWith => "ENDS WITH",
            ComparisonOp::In => "IN",
        };
        f.write_str(op)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit),
            Expression::Parameter(name) => write!(f, "${}", name),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Property { variable, property } => write!(f, "{}.{}", variable, property),
            Expression::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expression::Comparison { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expression::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{} IS NOT NULL", expr)
                } else {
                    write!(f, "{} IS NULL", expr)
                }
            }
            Expression::And(a, b) => write!(f, "{} AND {}", a, b),
            Expression::Or(a, b) => write!(f, "{} OR {}", a, b),
            Expression::Not(e) => write!(f, "NOT {}", e),
        }
    }
}
