//! The expression language used inside tags and directive arguments.
//!
//! Expressions are small and side-effect-free apart from the functions they
//! call:
//!
//! ```text
//! "literal"  'literal'  42  1.5  true  false  null
//! $var  $var[0]  $var.field  title            (variables and tags)
//! upper(title)  date("Y", $stamp)             (calls)
//! !a  -a  a && b  a || b  a == b  a < b  c ? a : b  (a)
//! ```
//!
//! Parsing is a Pratt parser over the tokens produced by the scanner; evaluation
//! is done by [`Evaluator`] against a template's tags and vars.

pub mod errors;
mod eval;
mod parser;
mod precedence;
mod scan;

use serde_json::Value;

pub use errors::{ParseError, ParseErrorKind, ParseResult};
pub use eval::{EvalError, Evaluator};

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, boolean or null literal.
    Literal(Value),
    /// `$name`
    Var(String),
    /// A bare identifier, resolved against the tag map.
    Ident(String),
    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },
    /// `target.field`
    Field { target: Box<Expr>, field: String },
    /// `name(args...)`
    Call { name: String, args: Vec<Expr> },
    /// `!operand`
    Not(Box<Expr>),
    /// `-operand`
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `condition ? then : otherwise`
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Parses a complete expression body.
pub fn parse(input: &str) -> ParseResult<Expr> {
    let tokens = scan::scan(input)?;
    parser::ExprParser::new(tokens).parse_complete()
}
