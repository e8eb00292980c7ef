use serde::{Deserialize, Serialize};

/// Byte range in the model source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors that can occur while turning model source into a compiled `Model`
#[derive(Debug, thiserror::Error)]
pub enum SeproError {
    #[error("Lexer error at {span:?}: {message}")]
    LexerError { span: Span, message: String },

    #[error("Parser error at {span:?}: {message}")]
    ParserError { span: Span, message: String },

    #[error("Compile error: {message}")]
    CompileError { message: String },
}

pub type Result<T> = std::result::Result<T, SeproError>;
