//! Recursive-descent parser for the Sepro model language.
//!
//! The parser produces a declaration AST with plain string names; symbol
//! interning and assembly into a [`crate::model::Model`] happen in the
//! [`crate::compiler`] pass.
//!
//! ```text
//! CONCEPT link TAG free SLOT next
//! CONCEPT linker TAG ready SLOT left, right
//!
//! WHERE linker AND NOT BOUND left ON link AND free
//!     DO BIND left TO OTHER IN OTHER UNSET free SET one
//!
//! WORLD main OBJECT linker OBJECT link * 3
//! ```

use crate::error::{Result, SeproError, Span};
use crate::lexer::{SpannedToken, Token};

/// Top-level declaration in a model source file
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Concept(ConceptDecl),
    Actuator(ActuatorDecl),
    World(WorldDecl),
    Measure(MeasureDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDecl {
    pub name: String,
    pub tags: Vec<String>,
    pub slots: Vec<String>,
    pub counters: Vec<(String, i64)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorDecl {
    pub selector: SelectorDecl,
    pub combined: Option<SelectorDecl>,
    pub modifiers: Vec<ModifierDecl>,
    pub traps: Vec<String>,
    pub notifications: Vec<String>,
    pub does_halt: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorDecl {
    All,
    Match(Vec<PredicateDecl>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateDecl {
    pub negated: bool,
    pub in_slot: Option<String>,
    pub kind: PredicateKindDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKindDecl {
    /// A bare tag name
    Tag(String),
    /// `ZERO counter`
    Zero(String),
    /// `BOUND slot`
    Bound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierDecl {
    pub target: TargetDecl,
    pub action: ActionDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDecl {
    pub kind: TargetKindDecl,
    pub slot: Option<String>,
}

impl TargetDecl {
    fn this() -> Self {
        Self {
            kind: TargetKindDecl::This,
            slot: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKindDecl {
    Root,
    This,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionDecl {
    Nothing,
    Set(Vec<String>),
    Unset(Vec<String>),
    Inc(String),
    Dec(String),
    Zero(String),
    Bind { slot: String, to: TargetDecl },
    Unbind(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldDecl {
    pub name: String,
    pub root: Option<String>,
    pub instances: Vec<InstanceDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDecl {
    pub concept: String,
    /// `OBJECT concept AS alias` remembers the instance under this alias.
    pub alias: Option<String>,
    pub count: u32,
    pub initializers: Vec<InitializerDecl>,
}

/// `tag` or `counter = value` inside an instance's parenthesized list
#[derive(Debug, Clone, PartialEq)]
pub struct InitializerDecl {
    pub name: String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureDecl {
    pub name: String,
    pub function: FunctionDecl,
    /// Empty when the measure is declared over `WHERE ALL`.
    pub predicates: Vec<PredicateDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionDecl {
    Count,
    Sum(String),
    Min(String),
    Max(String),
}

/// Parser over a token stream produced by [`crate::lexer::tokenize`]
pub struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [SpannedToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at current token
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    /// Advance to next token
    fn advance(&mut self) -> Option<&SpannedToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if current token matches expected
    fn check(&self, expected: &Token) -> bool {
        self.peek()
            .map(|t| std::mem::discriminant(&t.token) == std::mem::discriminant(expected))
            .unwrap_or(false)
    }

    /// Consume token if it matches
    fn consume(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a token, error if not found
    fn expect(&mut self, expected: Token) -> Result<&SpannedToken> {
        if self.check(&expected) {
            Ok(self.advance().unwrap())
        } else {
            Err(self.error_at_current(format!("Expected {:?}", expected)))
        }
    }

    fn is_eof(&self) -> bool {
        self.peek()
            .map(|t| matches!(t.token, Token::Eof))
            .unwrap_or(true)
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_default()
    }

    fn error_at_current(&self, message: String) -> SeproError {
        SeproError::ParserError {
            span: self.current_span(),
            message,
        }
    }

    /// Parse an identifier token into its name
    fn ident(&mut self) -> Result<String> {
        match self.peek().map(|t| t.token.clone()) {
            Some(Token::Identifier(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_at_current("Expected identifier".to_string())),
        }
    }

    /// Parse a comma-separated identifier list (at least one)
    fn ident_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.ident()?];
        while self.consume(&Token::Comma) {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    fn int(&mut self) -> Result<i64> {
        match self.peek().map(|t| t.token.clone()) {
            Some(Token::IntLiteral(Some(value))) => {
                self.advance();
                Ok(value)
            }
            Some(Token::IntLiteral(None)) => {
                Err(self.error_at_current("Invalid integer literal".to_string()))
            }
            _ => Err(self.error_at_current("Expected integer".to_string())),
        }
    }

    /// Parse the entire token stream as a list of declarations
    pub fn parse(&mut self) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();

        while !self.is_eof() {
            let declaration = match self.peek().map(|t| &t.token) {
                Some(Token::Concept) => Declaration::Concept(self.parse_concept()?),
                Some(Token::Where) => Declaration::Actuator(self.parse_actuator()?),
                Some(Token::World) => Declaration::World(self.parse_world()?),
                Some(Token::Measure) => Declaration::Measure(self.parse_measure()?),
                _ => {
                    return Err(self.error_at_current(
                        "Expected CONCEPT, WHERE, WORLD, or MEASURE".to_string(),
                    ))
                }
            };
            declarations.push(declaration);
        }

        Ok(declarations)
    }

    fn parse_concept(&mut self) -> Result<ConceptDecl> {
        let start = self.current_span().start;
        self.expect(Token::Concept)?;
        let name = self.ident()?;

        let mut decl = ConceptDecl {
            name,
            tags: Vec::new(),
            slots: Vec::new(),
            counters: Vec::new(),
            span: Span::default(),
        };

        loop {
            match self.peek().map(|t| &t.token) {
                Some(Token::Tag) => {
                    self.advance();
                    decl.tags.extend(self.ident_list()?);
                }
                Some(Token::Slot) => {
                    self.advance();
                    decl.slots.extend(self.ident_list()?);
                }
                Some(Token::Counter) => {
                    self.advance();
                    let counter = self.ident()?;
                    let value = self.int()?;
                    decl.counters.push((counter, value));
                }
                _ => break,
            }
        }

        decl.span = Span::new(start, self.current_span().start);
        Ok(decl)
    }

    fn parse_actuator(&mut self) -> Result<ActuatorDecl> {
        let start = self.current_span().start;
        self.expect(Token::Where)?;
        let selector = self.parse_selector()?;

        let combined = if self.consume(&Token::On) {
            Some(self.parse_selector()?)
        } else {
            None
        };

        self.expect(Token::Do)?;

        let mut modifiers = Vec::new();
        loop {
            match self.peek().map(|t| &t.token) {
                Some(
                    Token::In
                    | Token::Nothing
                    | Token::Set
                    | Token::Unset
                    | Token::Inc
                    | Token::Dec
                    | Token::Zero
                    | Token::Bind
                    | Token::Unbind,
                ) => modifiers.push(self.parse_modifier()?),
                _ => break,
            }
        }

        let mut traps = Vec::new();
        let mut notifications = Vec::new();
        let mut does_halt = false;
        loop {
            match self.peek().map(|t| &t.token) {
                Some(Token::Trap) => {
                    self.advance();
                    traps.push(self.ident()?);
                }
                Some(Token::Notify) => {
                    self.advance();
                    notifications.push(self.ident()?);
                }
                Some(Token::Halt) => {
                    self.advance();
                    does_halt = true;
                }
                _ => break,
            }
        }

        Ok(ActuatorDecl {
            selector,
            combined,
            modifiers,
            traps,
            notifications,
            does_halt,
            span: Span::new(start, self.current_span().start),
        })
    }

    fn parse_selector(&mut self) -> Result<SelectorDecl> {
        if self.consume(&Token::All) {
            return Ok(SelectorDecl::All);
        }

        let mut predicates = vec![self.parse_predicate()?];
        while self.consume(&Token::And) || self.consume(&Token::Comma) {
            predicates.push(self.parse_predicate()?);
        }
        Ok(SelectorDecl::Match(predicates))
    }

    fn parse_predicate(&mut self) -> Result<PredicateDecl> {
        let negated = self.consume(&Token::Not);
        let in_slot = if self.consume(&Token::In) {
            Some(self.ident()?)
        } else {
            None
        };

        let kind = match self.peek().map(|t| &t.token) {
            Some(Token::Zero) => {
                self.advance();
                PredicateKindDecl::Zero(self.ident()?)
            }
            Some(Token::Bound) => {
                self.advance();
                PredicateKindDecl::Bound(self.ident()?)
            }
            Some(Token::Identifier(_)) => PredicateKindDecl::Tag(self.ident()?),
            _ => return Err(self.error_at_current("Expected predicate".to_string())),
        };

        Ok(PredicateDecl {
            negated,
            in_slot,
            kind,
        })
    }

    fn parse_modifier(&mut self) -> Result<ModifierDecl> {
        let target = if self.consume(&Token::In) {
            self.parse_target()?
        } else {
            TargetDecl::this()
        };

        let action = match self.peek().map(|t| &t.token) {
            Some(Token::Nothing) => {
                self.advance();
                ActionDecl::Nothing
            }
            Some(Token::Set) => {
                self.advance();
                ActionDecl::Set(self.ident_list()?)
            }
            Some(Token::Unset) => {
                self.advance();
                ActionDecl::Unset(self.ident_list()?)
            }
            Some(Token::Inc) => {
                self.advance();
                ActionDecl::Inc(self.ident()?)
            }
            Some(Token::Dec) => {
                self.advance();
                ActionDecl::Dec(self.ident()?)
            }
            Some(Token::Zero) => {
                self.advance();
                ActionDecl::Zero(self.ident()?)
            }
            Some(Token::Bind) => {
                self.advance();
                let slot = self.ident()?;
                self.expect(Token::To)?;
                let to = self.parse_target()?;
                ActionDecl::Bind { slot, to }
            }
            Some(Token::Unbind) => {
                self.advance();
                ActionDecl::Unbind(self.ident()?)
            }
            _ => return Err(self.error_at_current("Expected modifier action".to_string())),
        };

        Ok(ModifierDecl { target, action })
    }

    /// Parse a reference target: `ROOT`, `THIS`, or `OTHER` with an optional
    /// `.slot` dereference. A bare identifier is shorthand for `THIS.slot`.
    fn parse_target(&mut self) -> Result<TargetDecl> {
        let kind = match self.peek().map(|t| &t.token) {
            Some(Token::Root) => {
                self.advance();
                TargetKindDecl::Root
            }
            Some(Token::This) => {
                self.advance();
                TargetKindDecl::This
            }
            Some(Token::Other) => {
                self.advance();
                TargetKindDecl::Other
            }
            Some(Token::Identifier(_)) => {
                let slot = self.ident()?;
                return Ok(TargetDecl {
                    kind: TargetKindDecl::This,
                    slot: Some(slot),
                });
            }
            _ => return Err(self.error_at_current("Expected ROOT, THIS, OTHER, or slot".to_string())),
        };

        let slot = if self.consume(&Token::Dot) {
            Some(self.ident()?)
        } else {
            None
        };

        Ok(TargetDecl { kind, slot })
    }

    fn parse_world(&mut self) -> Result<WorldDecl> {
        let start = self.current_span().start;
        self.expect(Token::World)?;
        let name = self.ident()?;

        let mut root = None;
        let mut instances = Vec::new();

        loop {
            match self.peek().map(|t| &t.token) {
                Some(Token::Root) => {
                    self.advance();
                    root = Some(self.ident()?);
                }
                Some(Token::Object) => {
                    self.advance();
                    instances.push(self.parse_instance()?);
                }
                _ => break,
            }
        }

        Ok(WorldDecl {
            name,
            root,
            instances,
            span: Span::new(start, self.current_span().start),
        })
    }

    fn parse_instance(&mut self) -> Result<InstanceDecl> {
        let concept = self.ident()?;

        let (alias, count) = if self.consume(&Token::As) {
            (Some(self.ident()?), 1)
        } else if self.consume(&Token::Star) {
            let count = self.int()?;
            if count < 1 {
                return Err(self.error_at_current("Instance count must be at least 1".to_string()));
            }
            (None, count as u32)
        } else {
            (None, 1)
        };

        let mut initializers = Vec::new();
        if self.consume(&Token::LParen) {
            loop {
                let name = self.ident()?;
                let value = if self.consume(&Token::Eq) {
                    Some(self.int()?)
                } else {
                    None
                };
                initializers.push(InitializerDecl { name, value });
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        Ok(InstanceDecl {
            concept,
            alias,
            count,
            initializers,
        })
    }

    fn parse_measure(&mut self) -> Result<MeasureDecl> {
        let start = self.current_span().start;
        self.expect(Token::Measure)?;
        let name = self.ident()?;

        let function = match self.peek().map(|t| &t.token) {
            Some(Token::Count) => {
                self.advance();
                FunctionDecl::Count
            }
            Some(Token::Sum) => {
                self.advance();
                FunctionDecl::Sum(self.ident()?)
            }
            Some(Token::Min) => {
                self.advance();
                FunctionDecl::Min(self.ident()?)
            }
            Some(Token::Max) => {
                self.advance();
                FunctionDecl::Max(self.ident()?)
            }
            _ => return Err(self.error_at_current("Expected COUNT, SUM, MIN, or MAX".to_string())),
        };

        // The filter clause is mandatory so a following actuator's WHERE is
        // never swallowed by the measure.
        self.expect(Token::Where)?;
        let predicates = match self.parse_selector()? {
            SelectorDecl::All => Vec::new(),
            SelectorDecl::Match(predicates) => predicates,
        };

        Ok(MeasureDecl {
            name,
            function,
            predicates,
            span: Span::new(start, self.current_span().start),
        })
    }
}

/// Parse model source into declarations
pub fn parse(tokens: &[SpannedToken]) -> Result<Vec<Declaration>> {
    Parser::new(tokens).parse()
}
