//! Postfix stack machine over tagged operands.

use crate::error::{ExprError, Result};
use crate::parser::{to_postfix, PfItem};
use crate::template::resolve_spec;
use crate::token::{tokenize, CmpOp, Token};
use crate::EvalContext;
use mqwatch_common::value::{canonical_string, normalized_eq, ordering_number, truthy};
use serde_json::Value;

/// A resolved operand. `Missing` marks an unresolved placeholder or an
/// unbound `value`; it is falsy, equal only to itself, and never orders
/// before or after anything.
enum Operand {
    Json(Value),
    Missing,
}

/// Evaluate an expression against the context. Total over well-formed
/// expressions; malformed input yields an [`ExprError`], never a panic.
pub fn evaluate(expr: &str, ctx: &EvalContext) -> Result<bool> {
    let postfix = to_postfix(tokenize(expr)?)?;
    let mut stack: Vec<Operand> = Vec::with_capacity(4);

    for item in postfix {
        match item {
            PfItem::Operand(tok) => stack.push(resolve_operand(tok, ctx)),
            PfItem::Not => {
                let a = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(bool_operand(!operand_truthy(&a)));
            }
            PfItem::And => {
                let b = stack.pop().ok_or(ExprError::Malformed)?;
                let a = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(bool_operand(operand_truthy(&a) && operand_truthy(&b)));
            }
            PfItem::Or => {
                let b = stack.pop().ok_or(ExprError::Malformed)?;
                let a = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(bool_operand(operand_truthy(&a) || operand_truthy(&b)));
            }
            PfItem::Cmp(op) => {
                let b = stack.pop().ok_or(ExprError::Malformed)?;
                let a = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(bool_operand(compare(op, &a, &b)));
            }
        }
    }

    if stack.len() != 1 {
        return Err(ExprError::Malformed);
    }
    Ok(operand_truthy(&stack[0]))
}

fn resolve_operand(tok: Token, ctx: &EvalContext) -> Operand {
    match tok {
        Token::Num(f) => serde_json::Number::from_f64(f)
            .map(|n| Operand::Json(Value::Number(n)))
            .unwrap_or(Operand::Missing),
        Token::Bool(b) => Operand::Json(Value::Bool(b)),
        Token::Str(s) | Token::Word(s) => Operand::Json(Value::String(s)),
        Token::ValueRef => match ctx.value {
            Some(v) => Operand::Json(v.clone()),
            None => Operand::Missing,
        },
        Token::Placeholder(spec) => match resolve_spec(&spec, ctx) {
            Some(v) => Operand::Json(v),
            None => Operand::Missing,
        },
        // Operator tokens never reach resolve_operand; the parser only
        // wraps operand tokens in PfItem::Operand.
        _ => Operand::Missing,
    }
}

fn bool_operand(b: bool) -> Operand {
    Operand::Json(Value::Bool(b))
}

fn operand_truthy(o: &Operand) -> bool {
    match o {
        Operand::Json(v) => truthy(v),
        Operand::Missing => false,
    }
}

fn compare(op: CmpOp, a: &Operand, b: &Operand) -> bool {
    match op {
        CmpOp::Eq | CmpOp::Ne => {
            let eq = match (a, b) {
                (Operand::Json(x), Operand::Json(y)) => normalized_eq(x, y),
                (Operand::Missing, Operand::Missing) => true,
                _ => false,
            };
            if matches!(op, CmpOp::Eq) {
                eq
            } else {
                !eq
            }
        }
        CmpOp::Gt | CmpOp::Ge | CmpOp::Lt | CmpOp::Le => {
            let (x, y) = match (a, b) {
                (Operand::Json(x), Operand::Json(y)) => (x, y),
                _ => return false,
            };
            match (ordering_number(x), ordering_number(y)) {
                (Some(l), Some(r)) => match op {
                    CmpOp::Gt => l > r,
                    CmpOp::Ge => l >= r,
                    CmpOp::Lt => l < r,
                    CmpOp::Le => l <= r,
                    CmpOp::Eq | CmpOp::Ne => false,
                },
                _ => {
                    let l = canonical_string(x);
                    let r = canonical_string(y);
                    match op {
                        CmpOp::Gt => l > r,
                        CmpOp::Ge => l >= r,
                        CmpOp::Lt => l < r,
                        CmpOp::Le => l <= r,
                        CmpOp::Eq | CmpOp::Ne => false,
                    }
                }
            }
        }
    }
}
