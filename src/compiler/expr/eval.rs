//! Expression evaluation against a template's tags and vars.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use thiserror::Error;
use tracing::trace;

use super::{BinaryOp, Expr};
use crate::functions::{CallTarget, FunctionError, FunctionRegistry};
use crate::template::Template;
use crate::value::{compare, is_truthy, loose_eq, render_value};

/// Failure to evaluate a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("undefined variable `${0}`")]
    UndefinedVariable(String),
    #[error("unresolved identifier `{0}`: not a tag, string literal, or function call")]
    UnresolvedIdentifier(String),
    #[error("call to unknown function `{0}`")]
    UnknownFunction(String),
    #[error("cannot negate non-numeric value {0}")]
    NotANumber(String),
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Evaluates expressions with a template's visible tags and vars in scope.
pub struct Evaluator<'a> {
    template: &'a Template,
    functions: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(template: &'a Template, functions: &'a FunctionRegistry) -> Self {
        Self {
            template,
            functions,
        }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self
                .template
                .var(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Expr::Ident(name) => self
                .template
                .tag(name)
                .map(Value::from)
                .ok_or_else(|| EvalError::UnresolvedIdentifier(name.clone())),
            Expr::Index { target, index } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;
                Ok(member(target, &index))
            }
            Expr::Field { target, field } => {
                let target = self.evaluate(target)?;
                Ok(member(target, &Value::from(field.as_str())))
            }
            Expr::Call { name, args } => self.call(name, args),
            Expr::Not(operand) => Ok(Value::Bool(!is_truthy(&self.evaluate(operand)?))),
            Expr::Neg(operand) => negate(self.evaluate(operand)?),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then)
                } else {
                    self.evaluate(otherwise)
                }
            }
        }
    }

    /// Evaluates the arguments left to right, then dispatches the call.
    fn call(&self, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        let target = CallTarget::resolve(name, self.functions);
        trace!(function = name, ?target, "resolved call");

        let args = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match target {
            CallTarget::Registered(function) => Ok(function(&args)),
            CallTarget::Builtin(builtin) => Ok(builtin.call(&args)?),
            CallTarget::Unresolved => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, EvalError> {
        let left = self.evaluate(left)?;
        let result = match op {
            BinaryOp::And => is_truthy(&left) && is_truthy(&self.evaluate(right)?),
            BinaryOp::Or => is_truthy(&left) || is_truthy(&self.evaluate(right)?),
            BinaryOp::Eq => loose_eq(&left, &self.evaluate(right)?),
            BinaryOp::NotEq => !loose_eq(&left, &self.evaluate(right)?),
            BinaryOp::Lt => compare(&left, &self.evaluate(right)?).is_some_and(Ordering::is_lt),
            BinaryOp::LtEq => compare(&left, &self.evaluate(right)?).is_some_and(Ordering::is_le),
            BinaryOp::Gt => compare(&left, &self.evaluate(right)?).is_some_and(Ordering::is_gt),
            BinaryOp::GtEq => compare(&left, &self.evaluate(right)?).is_some_and(Ordering::is_ge),
        };
        Ok(Value::Bool(result))
    }
}

/// `target[key]` / `target.key`. Missing members are `null`.
fn member(target: Value, key: &Value) -> Value {
    match target {
        Value::Array(mut items) => {
            let index = match key {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse::<u64>().ok(),
                _ => None,
            };
            index
                .and_then(|i| usize::try_from(i).ok())
                .filter(|i| *i < items.len())
                .map(|i| items.swap_remove(i))
                .unwrap_or(Value::Null)
        }
        Value::Object(mut map) => map.remove(&render_value(key)).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn negate(value: Value) -> Result<Value, EvalError> {
    let Value::Number(n) = &value else {
        return Err(EvalError::NotANumber(value.to_string()));
    };
    if let Some(negated) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Value::from(negated));
    }
    Ok(n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .unwrap_or(Value::Null))
}
