//! Operator precedence and binding power for the Pratt parser.

use super::BinaryOp;
use super::scan::ExprTokenKind;

/// Binding power for operators in Pratt parser style.
///
/// Using (left, right) pairs enables both left and right associativity:
/// - Left-associative: `left < right` (e.g., `a && b && c` = `(a && b) && c`)
/// - Right-associative: `left > right` (e.g., `a ? b : c ? d : e` = `a ? b : (c ? d : e)`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingPower {
    /// Left binding power - compared against previous operator's right bp.
    pub left: u8,
    /// Right binding power - compared against next operator's left bp.
    pub right: u8,
}

impl BindingPower {
    /// Creates a left-associative binding power.
    #[inline]
    pub const fn left(power: u8) -> Self {
        Self {
            left: power,
            right: power + 1,
        }
    }

    /// Creates a right-associative binding power.
    #[inline]
    pub const fn right(power: u8) -> Self {
        Self {
            left: power + 1,
            right: power,
        }
    }
}

/// Precedence levels. Higher numbers bind tighter.
pub mod prec {
    use super::BindingPower;

    /// Conditional `c ? a : b`, right associative.
    pub const CONDITIONAL: BindingPower = BindingPower::right(2);

    /// Logical OR (`||`).
    pub const LOGICAL_OR: BindingPower = BindingPower::left(4);

    /// Logical AND (`&&`).
    pub const LOGICAL_AND: BindingPower = BindingPower::left(6);

    /// Equality (`==`, `!=`).
    pub const EQUALITY: BindingPower = BindingPower::left(8);

    /// Relational (`<`, `<=`, `>`, `>=`).
    pub const RELATIONAL: BindingPower = BindingPower::left(10);

    /// Prefix `!` and `-`. Binds to the operand immediately to the right.
    pub const PREFIX: u8 = 12;
}

/// Gets the binary operator and its binding power for a token.
///
/// Returns `None` for tokens that are not binary operators, including `?`,
/// which the parser handles separately.
pub fn infix_binding_power(kind: &ExprTokenKind) -> Option<(BinaryOp, BindingPower)> {
    let op = match kind {
        ExprTokenKind::OrOr => BinaryOp::Or,
        ExprTokenKind::AndAnd => BinaryOp::And,
        ExprTokenKind::EqEq => BinaryOp::Eq,
        ExprTokenKind::NotEq => BinaryOp::NotEq,
        ExprTokenKind::Lt => BinaryOp::Lt,
        ExprTokenKind::LtEq => BinaryOp::LtEq,
        ExprTokenKind::Gt => BinaryOp::Gt,
        ExprTokenKind::GtEq => BinaryOp::GtEq,
        _ => return None,
    };
    let bp = match op {
        BinaryOp::Or => prec::LOGICAL_OR,
        BinaryOp::And => prec::LOGICAL_AND,
        BinaryOp::Eq | BinaryOp::NotEq => prec::EQUALITY,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => prec::RELATIONAL,
    };
    Some((op, bp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_power_associativity() {
        let bp = BindingPower::left(10);
        assert_eq!((bp.left, bp.right), (10, 11));
        let bp = BindingPower::right(10);
        assert_eq!((bp.left, bp.right), (11, 10));
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(prec::CONDITIONAL.left < prec::LOGICAL_OR.left);
        assert!(prec::LOGICAL_OR.left < prec::LOGICAL_AND.left);
        assert!(prec::LOGICAL_AND.left < prec::EQUALITY.left);
        assert!(prec::EQUALITY.left < prec::RELATIONAL.left);
        assert!(prec::RELATIONAL.right < prec::PREFIX);
    }

    #[test]
    fn test_question_is_not_a_binary_operator() {
        assert_eq!(infix_binding_power(&ExprTokenKind::Question), None);
        assert_eq!(
            infix_binding_power(&ExprTokenKind::AndAnd),
            Some((BinaryOp::And, prec::LOGICAL_AND))
        );
    }
}
