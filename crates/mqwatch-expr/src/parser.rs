//! Shunting-yard rewrite of a token stream into postfix form.
//!
//! Precedence, highest first: unary `!`, comparisons, `&&`, `||`.
//! Comparisons are non-associative; chaining them without parentheses is
//! a parse error.

use crate::error::{ExprError, Result};
use crate::token::{CmpOp, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum PfItem {
    Operand(Token),
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

fn precedence(tok: &Token) -> u8 {
    match tok {
        Token::Not => 4,
        Token::Cmp(_) => 3,
        Token::And => 2,
        Token::Or => 1,
        _ => 0,
    }
}

fn to_pf(tok: Token) -> PfItem {
    match tok {
        Token::Not => PfItem::Not,
        Token::And => PfItem::And,
        Token::Or => PfItem::Or,
        Token::Cmp(op) => PfItem::Cmp(op),
        operand => PfItem::Operand(operand),
    }
}

pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<PfItem>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Num(_)
            | Token::Bool(_)
            | Token::Str(_)
            | Token::Word(_)
            | Token::ValueRef
            | Token::Placeholder(_) => output.push(PfItem::Operand(tok)),
            Token::Not => ops.push(tok),
            Token::Cmp(_) | Token::And | Token::Or => {
                let p = precedence(&tok);
                while let Some(top) = ops.last() {
                    if matches!(top, Token::LParen) {
                        break;
                    }
                    let tp = precedence(top);
                    if tp < p {
                        break;
                    }
                    if tp == p && matches!(tok, Token::Cmp(_)) {
                        return Err(ExprError::ChainedComparison);
                    }
                    output.push(to_pf(ops.pop().ok_or(ExprError::Malformed)?));
                }
                ops.push(tok);
            }
            Token::LParen => ops.push(tok),
            Token::RParen => loop {
                match ops.pop() {
                    Some(Token::LParen) => break,
                    Some(op) => output.push(to_pf(op)),
                    None => return Err(ExprError::UnbalancedParens),
                }
            },
        }
    }

    while let Some(op) = ops.pop() {
        if matches!(op, Token::LParen) {
            return Err(ExprError::UnbalancedParens);
        }
        output.push(to_pf(op));
    }

    if output.is_empty() {
        return Err(ExprError::Empty);
    }
    Ok(output)
}
