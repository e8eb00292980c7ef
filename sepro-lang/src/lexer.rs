use crate::error::{Result, SeproError, Span};
use logos::Logos;

/// Tokens for the Sepro model language. Keywords are case-insensitive;
/// the uppercase spelling is the convention in model sources.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Declarations
    #[token("CONCEPT", ignore(ascii_case))]
    Concept,
    #[token("WHERE", ignore(ascii_case))]
    Where,
    #[token("WORLD", ignore(ascii_case))]
    World,
    #[token("MEASURE", ignore(ascii_case))]
    Measure,

    // Concept body
    #[token("TAG", ignore(ascii_case))]
    Tag,
    #[token("SLOT", ignore(ascii_case))]
    Slot,
    #[token("COUNTER", ignore(ascii_case))]
    Counter,

    // Selectors and predicates
    #[token("ON", ignore(ascii_case))]
    On,
    #[token("DO", ignore(ascii_case))]
    Do,
    #[token("ALL", ignore(ascii_case))]
    All,
    #[token("NOT", ignore(ascii_case))]
    Not,
    #[token("AND", ignore(ascii_case))]
    And,
    #[token("ZERO", ignore(ascii_case))]
    Zero,
    #[token("BOUND", ignore(ascii_case))]
    Bound,

    // Modifiers
    #[token("IN", ignore(ascii_case))]
    In,
    #[token("NOTHING", ignore(ascii_case))]
    Nothing,
    #[token("SET", ignore(ascii_case))]
    Set,
    #[token("UNSET", ignore(ascii_case))]
    Unset,
    #[token("INC", ignore(ascii_case))]
    Inc,
    #[token("DEC", ignore(ascii_case))]
    Dec,
    #[token("BIND", ignore(ascii_case))]
    Bind,
    #[token("TO", ignore(ascii_case))]
    To,
    #[token("UNBIND", ignore(ascii_case))]
    Unbind,

    // Reference targets
    #[token("ROOT", ignore(ascii_case))]
    Root,
    #[token("THIS", ignore(ascii_case))]
    This,
    #[token("OTHER", ignore(ascii_case))]
    Other,

    // Actuator effects
    #[token("TRAP", ignore(ascii_case))]
    Trap,
    #[token("NOTIFY", ignore(ascii_case))]
    Notify,
    #[token("HALT", ignore(ascii_case))]
    Halt,

    // World body
    #[token("OBJECT", ignore(ascii_case))]
    Object,
    #[token("AS", ignore(ascii_case))]
    As,

    // Measure functions
    #[token("COUNT", ignore(ascii_case))]
    Count,
    #[token("SUM", ignore(ascii_case))]
    Sum,
    #[token("MIN", ignore(ascii_case))]
    Min,
    #[token("MAX", ignore(ascii_case))]
    Max,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(Option<i64>),

    // Punctuation
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("*")]
    Star,
    #[token("=")]
    Eq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // End of file
    Eof,
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}

/// Tokenize the entire source, appending an explicit EOF token.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>> {
    let mut lex = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token_result) = lex.next() {
        let span = Span::new(lex.span().start, lex.span().end);

        match token_result {
            Ok(token) => {
                tokens.push(SpannedToken::new(token, span));
            }
            Err(_) => {
                return Err(SeproError::LexerError {
                    span,
                    message: format!("Invalid token: {}", &source[span.start..span.end]),
                });
            }
        }
    }

    tokens.push(SpannedToken::new(
        Token::Eof,
        Span::new(source.len(), source.len()),
    ));
    Ok(tokens)
}
