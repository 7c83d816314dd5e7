//! Parse Rules
//!
//! Binding powers and the prefix/infix handler table that drives the
//! precedence-climbing expression parser.

use super::scanner::TokenKind;

/// Binding power, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// The next-tighter level, used for left-associative binary operators
    pub fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Parse handlers the compiler dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    String,
    Literal,
    Variable,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

const fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule { prefix, infix, precedence }
}

pub fn get_rule(kind: TokenKind) -> ParseRule {
    use ParseFn as F;
    use Precedence as P;

    match kind {
        TokenKind::LeftParen => rule(Some(F::Grouping), None, P::None),
        TokenKind::Minus => rule(Some(F::Unary), Some(F::Binary), P::Term),
        TokenKind::Plus => rule(None, Some(F::Binary), P::Term),
        TokenKind::Slash | TokenKind::Star => rule(None, Some(F::Binary), P::Factor),
        TokenKind::Bang => rule(Some(F::Unary), None, P::None),
        TokenKind::BangEqual | TokenKind::EqualEqual => rule(None, Some(F::Binary), P::Equality),
        TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual => rule(None, Some(F::Binary), P::Comparison),
        TokenKind::Identifier => rule(Some(F::Variable), None, P::None),
        TokenKind::String => rule(Some(F::String), None, P::None),
        TokenKind::Number => rule(Some(F::Number), None, P::None),
        TokenKind::And => rule(None, Some(F::And), P::And),
        TokenKind::Or => rule(None, Some(F::Or), P::Or),
        TokenKind::False | TokenKind::True | TokenKind::Nil => rule(Some(F::Literal), None, P::None),
        _ => rule(None, None, P::None),
    }
}
