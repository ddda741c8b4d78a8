//! Pratt parser for expressions.
//!
//! 1. **`parse_expression`** - entry point, `parse_with_precedence(0)`
//! 2. **`parse_with_precedence`** - core loop over binary operators and `?:`
//! 3. **`parse_prefix`** - `!` and `-`, then a primary with its postfix chain
//! 4. **`parse_primary`** - literals, variables, identifiers, calls, groups

use serde_json::Value;

use super::errors::{ParseError, ParseErrorKind, ParseResult};
use super::precedence::{infix_binding_power, prec};
use super::scan::{ExprToken, ExprTokenKind};
use super::Expr;

pub(crate) struct ExprParser {
    tokens: Vec<ExprToken>,
    pos: usize,
}

impl ExprParser {
    /// `tokens` must end with `Eof`, as produced by the scanner.
    pub fn new(tokens: Vec<ExprToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses an expression and requires that no input is left over.
    pub fn parse_complete(mut self) -> ParseResult<Expr> {
        let expr = self.parse_expression()?;
        let token = self.current();
        if token.kind != ExprTokenKind::Eof {
            return Err(ParseError::new(ParseErrorKind::TrailingInput, token.pos)
                .with_found(&token.kind.describe()));
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_with_precedence(0)
    }

    fn parse_with_precedence(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let kind = &self.current().kind;

            if *kind == ExprTokenKind::Question {
                if prec::CONDITIONAL.left < min_bp {
                    break;
                }
                self.bump();
                let then = self.parse_expression()?;
                self.expect(ExprTokenKind::Colon, ParseErrorKind::MissingConditionalColon)?;
                let otherwise = self.parse_with_precedence(prec::CONDITIONAL.right)?;
                left = Expr::Ternary {
                    condition: Box::new(left),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                };
                continue;
            }

            let Some((op, bp)) = infix_binding_power(kind) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }
            self.bump();
            let right = self.parse_with_precedence(bp.right)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.current().kind {
            ExprTokenKind::Bang => {
                self.bump();
                let operand = self.parse_with_precedence(prec::PREFIX)?;
                Ok(Expr::Not(Box::new(operand)))
            }
            ExprTokenKind::Minus => {
                self.bump();
                let operand = self.parse_with_precedence(prec::PREFIX)?;
                Ok(Expr::Neg(Box::new(operand)))
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    /// Member access binds tighter than any operator.
    fn parse_postfix(&mut self, mut target: Expr) -> ParseResult<Expr> {
        loop {
            match self.current().kind {
                ExprTokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expression()?;
                    self.expect(ExprTokenKind::RBracket, ParseErrorKind::MissingClosingBracket)?;
                    target = Expr::Index {
                        target: Box::new(target),
                        index: Box::new(index),
                    };
                }
                ExprTokenKind::Dot => {
                    self.bump();
                    let token = self.bump();
                    let field = match token.kind {
                        ExprTokenKind::Ident(name) => name,
                        ExprTokenKind::Number(n) if n.is_u64() => n.to_string(),
                        other => {
                            return Err(ParseError::new(
                                ParseErrorKind::MissingPropertyName,
                                token.pos,
                            )
                            .with_found(&other.describe()));
                        }
                    };
                    target = Expr::Field {
                        target: Box::new(target),
                        field,
                    };
                }
                _ => return Ok(target),
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.bump();
        match token.kind {
            ExprTokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            ExprTokenKind::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            ExprTokenKind::Var(name) => Ok(Expr::Var(name)),
            ExprTokenKind::Ident(name) => {
                if self.current().kind == ExprTokenKind::LParen {
                    self.bump();
                    let args = self.parse_arguments()?;
                    return Ok(Expr::Call { name, args });
                }
                Ok(match name.as_str() {
                    "true" => Expr::Literal(Value::Bool(true)),
                    "false" => Expr::Literal(Value::Bool(false)),
                    "null" => Expr::Literal(Value::Null),
                    _ => Expr::Ident(name),
                })
            }
            ExprTokenKind::LParen => {
                let inner = self.parse_expression()?;
                self.expect(ExprTokenKind::RParen, ParseErrorKind::MissingClosingParen)?;
                Ok(inner)
            }
            ExprTokenKind::Eof => Err(ParseError::new(ParseErrorKind::UnexpectedEof, token.pos)
                .with_expected(&["expression"])),
            other => Err(ParseError::expected_expression(token.pos, &other.describe())),
        }
    }

    /// Parses call arguments after the opening `(`. A trailing comma is allowed.
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            if self.current().kind == ExprTokenKind::RParen {
                self.bump();
                return Ok(args);
            }
            args.push(self.parse_expression()?);

            let token = self.bump();
            match token.kind {
                ExprTokenKind::Comma => {}
                ExprTokenKind::RParen => return Ok(args),
                ExprTokenKind::Eof => {
                    return Err(ParseError::missing_closing(
                        ParseErrorKind::MissingClosingParen,
                        token.pos,
                        &token.kind.describe(),
                    ));
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        token.pos,
                        &["','", "')'"],
                        &other.describe(),
                    ));
                }
            }
        }
    }

    fn current(&self) -> &ExprToken {
        // The scanner always ends the stream with Eof, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Consumes the current token. `Eof` is returned repeatedly at the end.
    fn bump(&mut self) -> ExprToken {
        let token = self.current().clone();
        if token.kind != ExprTokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: ExprTokenKind, error: ParseErrorKind) -> ParseResult<()> {
        let token = self.current();
        if token.kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::missing_closing(error, token.pos, &token.kind.describe()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BinaryOp, parse};
    use super::*;

    fn lit(value: Value) -> Box<Expr> {
        Box::new(Expr::Literal(value))
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("'a'").unwrap(), Expr::Literal(Value::from("a")));
        assert_eq!(parse("true").unwrap(), Expr::Literal(Value::Bool(true)));
        assert_eq!(parse("null").unwrap(), Expr::Literal(Value::Null));
        assert_eq!(parse("(42)").unwrap(), Expr::Literal(Value::from(42)));
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(
            parse(r#"date(strtoupper("y"))"#).unwrap(),
            Expr::Call {
                name: "date".into(),
                args: vec![Expr::Call {
                    name: "strtoupper".into(),
                    args: vec![Expr::Literal(Value::from("y"))],
                }],
            }
        );
    }

    #[test]
    fn test_multiline_call_with_trailing_comma() {
        let expr = parse("join(\n  $items,\n  ', ',\n)").unwrap();
        let Expr::Call { args, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_precedence() {
        // a || b && c  =>  a || (b && c)
        let expr = parse("a || b && c").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let expr = parse("$a ? 1 : $b ? 2 : 3").unwrap();
        assert_eq!(
            expr,
            Expr::Ternary {
                condition: Box::new(Expr::Var("a".into())),
                then: lit(Value::from(1)),
                otherwise: Box::new(Expr::Ternary {
                    condition: Box::new(Expr::Var("b".into())),
                    then: lit(Value::from(2)),
                    otherwise: lit(Value::from(3)),
                }),
            }
        );
    }

    #[test]
    fn test_ternary_condition_takes_whole_comparison() {
        let expr = parse("$n > 1 ? 'many' : 'one'").unwrap();
        let Expr::Ternary { condition, .. } = expr else {
            panic!("expected ternary");
        };
        assert!(matches!(*condition, Expr::Binary { op: BinaryOp::Gt, .. }));
    }

    #[test]
    fn test_postfix_access() {
        assert_eq!(
            parse("!$user.tags[0]").unwrap(),
            Expr::Not(Box::new(Expr::Index {
                target: Box::new(Expr::Field {
                    target: Box::new(Expr::Var("user".into())),
                    field: "tags".into(),
                }),
                index: lit(Value::from(0)),
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("").unwrap_err().kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(parse("f(1").unwrap_err().kind, ParseErrorKind::MissingClosingParen);
        assert_eq!(parse("(1").unwrap_err().kind, ParseErrorKind::MissingClosingParen);
        assert_eq!(parse("$a[0").unwrap_err().kind, ParseErrorKind::MissingClosingBracket);
        assert_eq!(parse("a ? b").unwrap_err().kind, ParseErrorKind::MissingConditionalColon);
        assert_eq!(parse("$a.").unwrap_err().kind, ParseErrorKind::MissingPropertyName);
        assert_eq!(parse("a b").unwrap_err().kind, ParseErrorKind::TrailingInput);
        assert_eq!(parse(")").unwrap_err().kind, ParseErrorKind::ExpectedExpression);
        assert_eq!(parse("f(1 2)").unwrap_err().kind, ParseErrorKind::UnexpectedToken);
    }
}
