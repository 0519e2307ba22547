/// Errors produced while tokenizing, parsing or evaluating rule text.
///
/// The pipeline treats every variant the same way: log at warn, evaluate
/// the rule to `false`, keep processing the message.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated placeholder")]
    UnterminatedPlaceholder,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid numeric literal '{0}'")]
    BadNumber(String),

    #[error("chained comparison requires parentheses")]
    ChainedComparison,

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("empty expression")]
    Empty,

    #[error("malformed expression")]
    Malformed,
}

pub type Result<T> = std::result::Result<T, ExprError>;
