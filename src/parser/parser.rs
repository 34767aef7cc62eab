//! Declaration parser state machine
//!
//! The parser holds one [`ParserState`] and a cursor: the tree node that
//! currently receives new children. Each token is handed to the handler of
//! the current state, which mutates the tree and returns the next state and
//! cursor as a [`Step`]. There is no backtracking and no lookahead beyond the
//! token being handled.
//!
//! ```text
//! Idle ──#──▶ Preprocessor ──include──▶ IncludeFilename ──▶ Idle
//!   │                      ├─define───▶ DefineIdentifier ─▶ DefineLiteral ─▶ Idle
//!   │                      └─pragma───▶ Pragma ──▶ Idle
//!   └─ident─▶ Datatype ──name──▶ Identifier ──;──▶ Idle
//!                                  ├─[──▶ ArrayDefinition ──]──▶ Identifier
//!                                  ├─=──▶ Initialization ──;──▶ Idle
//!                                  └─(──▶ FunctionParameters ──)──▶ FunctionDeclared
//! ```
//!
//! Any rejected token appends an error node and moves to `Error`, which is
//! terminal: the driver stops reading input.

use super::errors::{GrammarError, UnsupportedConstruct};
use super::lexer::{LexMode, Lexer, Token, TokenKind};
use super::specifiers::{digest, DigestOutcome, SpecifierFlags};
use super::tree::{NodeId, NodeKind, ParseTree};
use crate::source::SourceKind;
use std::fmt;

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Idle,
    Preprocessor,
    IncludeFilename,
    DefineIdentifier,
    DefineLiteral,
    Pragma,
    Datatype,
    Identifier,
    ArrayDefinition,
    Initialization,
    FunctionParameters,
    FunctionDeclared,
    Error,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of handling one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: ParserState,
    pub cursor: NodeId,
}

impl Step {
    fn to(state: ParserState, cursor: NodeId) -> Self {
        Self { state, cursor }
    }
}

/// How a parse ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// All input consumed and every declaration closed
    Completed,
    /// The input was rejected; the tree holds the error node
    Rejected(GrammarError),
    /// The input uses a construct the parser does not model yet
    Unsupported(UnsupportedConstruct),
}

impl ParseStatus {
    pub fn is_completed(self) -> bool {
        self == ParseStatus::Completed
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStatus::Completed => write!(f, "completed"),
            ParseStatus::Rejected(e) => write!(f, "rejected: {}", e),
            ParseStatus::Unsupported(c) => write!(f, "unsupported: {}", c),
        }
    }
}

/// The tree of one translation unit and how its parse ended
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub tree: ParseTree,
    pub status: ParseStatus,
}

/// State machine parser for one translation unit
pub struct Parser {
    lexer: Lexer,
    tree: ParseTree,
    state: ParserState,
    cursor: NodeId,
    /// Lexing mode for the next token only
    mode: LexMode,
    /// Flags of the specifier sequence being digested
    flags: SpecifierFlags,
    /// Open `{` levels of the current initializer
    nesting: i32,
    status: ParseStatus,
}

impl Parser {
    /// Create a parser for `source`. `filename` becomes the root payload.
    pub fn new(source: &str, kind: SourceKind, filename: &str) -> Self {
        Self::with_lexer(Lexer::new(source), kind, filename)
    }

    /// Create a parser over raw file bytes.
    pub fn from_bytes(bytes: &[u8], kind: SourceKind, filename: &str) -> Self {
        Self::with_lexer(Lexer::from_bytes(bytes), kind, filename)
    }

    fn with_lexer(lexer: Lexer, kind: SourceKind, filename: &str) -> Self {
        let tree = ParseTree::new(kind.root_kind(), filename);
        let cursor = tree.root();
        Self {
            lexer,
            tree,
            state: ParserState::Idle,
            cursor,
            mode: LexMode::Normal,
            flags: SpecifierFlags::NONE,
            nesting: 0,
            status: ParseStatus::Completed,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    /// Run the driver loop until end of input or the `Error` state.
    pub fn parse(mut self) -> ParseOutcome {
        log::info!(
            "parsing {}",
            self.tree.node(self.tree.root()).payload.as_deref().unwrap_or("<unnamed>")
        );

        while self.state != ParserState::Error {
            let mode = std::mem::take(&mut self.mode);
            let Some(token) = self.lexer.next_token(mode) else {
                break;
            };
            log::trace!(
                "R{}, C{}, {:?}: {}",
                token.location.line,
                token.location.column,
                token.kind,
                token.text
            );
            self.feed(&token);
        }

        if !matches!(self.state, ParserState::Idle | ParserState::Error) {
            log::warn!("end of input in state {}", self.state);
            let error = GrammarError::UnexpectedEndOfInput;
            let location = self.lexer.location();
            self.tree
                .add_diagnostic(self.cursor, NodeKind::Error, location, None, error.message());
            self.status = ParseStatus::Rejected(error);
            self.state = ParserState::Error;
        }

        log::info!("parse finished: {} ({} nodes)", self.status, self.tree.len());
        ParseOutcome {
            tree: self.tree,
            status: self.status,
        }
    }

    /// Handle a single token: comments are attached at the cursor, every
    /// other token goes to the handler of the current state.
    pub fn feed(&mut self, token: &Token) {
        if self.state == ParserState::Error {
            return;
        }

        let step = match token.kind {
            kind if kind.is_comment() => {
                let comment = if kind == TokenKind::BlockComment {
                    NodeKind::BlockComment
                } else {
                    NodeKind::LineComment
                };
                self.leaf(self.cursor, comment, token);
                Step::to(self.state, self.cursor)
            }
            TokenKind::Invalid => self.reject(self.cursor, token, GrammarError::InvalidToken),
            _ => self.dispatch(self.cursor, token),
        };

        if step.state != self.state {
            log::debug!("{} -> {} on '{}'", self.state, step.state, token.text);
        }
        self.state = step.state;
        self.cursor = step.cursor;
    }

    fn dispatch(&mut self, cursor: NodeId, token: &Token) -> Step {
        match self.state {
            ParserState::Idle => self.on_idle(cursor, token),
            ParserState::Preprocessor => self.on_preprocessor(cursor, token),
            ParserState::IncludeFilename => self.on_include_filename(cursor, token),
            ParserState::DefineIdentifier => self.on_define_identifier(cursor, token),
            ParserState::DefineLiteral => self.on_define_literal(cursor, token),
            ParserState::Pragma => self.on_pragma(cursor, token),
            ParserState::Datatype => self.on_datatype(cursor, token),
            ParserState::Identifier => self.on_identifier(cursor, token),
            ParserState::ArrayDefinition => self.on_array_definition(cursor, token),
            ParserState::Initialization => self.on_initialization(cursor, token),
            ParserState::FunctionParameters => self.on_function_parameters(cursor, token),
            ParserState::FunctionDeclared => self.on_function_declared(cursor, token),
            ParserState::Error => Step::to(ParserState::Error, cursor),
        }
    }

    fn on_idle(&mut self, cursor: NodeId, token: &Token) -> Step {
        if token.is_punct('#') {
            let directive = self.container(cursor, NodeKind::Directive, token);
            return Step::to(ParserState::Preprocessor, directive);
        }
        if token.kind == TokenKind::Identifier {
            let datatype = self.container(cursor, NodeKind::Datatype, token);
            return self.digest_into(datatype, token, ParserState::Datatype, ParserState::Identifier);
        }
        self.reject(cursor, token, GrammarError::UnexpectedToken)
    }

    fn on_preprocessor(&mut self, directive: NodeId, token: &Token) -> Step {
        if token.is_word("include") {
            let include = self.container(directive, NodeKind::Include, token);
            self.request(LexMode::IncludeFilename);
            Step::to(ParserState::IncludeFilename, include)
        } else if token.is_word("define") {
            let define = self.container(directive, NodeKind::Define, token);
            Step::to(ParserState::DefineIdentifier, define)
        } else if token.is_word("pragma") {
            let pragma = self.container(directive, NodeKind::Pragma, token);
            self.request(LexMode::DefineLiteral);
            Step::to(ParserState::Pragma, pragma)
        } else {
            self.reject(directive, token, GrammarError::UnexpectedDirective)
        }
    }

    fn on_include_filename(&mut self, include: NodeId, token: &Token) -> Step {
        self.leaf(include, NodeKind::IncludeFilename, token);
        Step::to(ParserState::Idle, self.up(include, 2))
    }

    fn on_define_identifier(&mut self, define: NodeId, token: &Token) -> Step {
        self.leaf(define, NodeKind::DefineIdentifier, token);
        self.request(LexMode::DefineLiteral);
        Step::to(ParserState::DefineLiteral, define)
    }

    fn on_define_literal(&mut self, define: NodeId, token: &Token) -> Step {
        self.leaf(define, NodeKind::DefineExpression, token);
        Step::to(ParserState::Idle, self.up(define, 2))
    }

    fn on_pragma(&mut self, pragma: NodeId, token: &Token) -> Step {
        self.leaf(pragma, NodeKind::PragmaText, token);
        Step::to(ParserState::Idle, self.up(pragma, 2))
    }

    fn on_datatype(&mut self, datatype: NodeId, token: &Token) -> Step {
        self.digest_into(datatype, token, ParserState::Datatype, ParserState::Identifier)
    }

    fn on_identifier(&mut self, cursor: NodeId, token: &Token) -> Step {
        if token.is_punct(';') {
            self.leaf(cursor, NodeKind::SentenceEnd, token);
            Step::to(ParserState::Idle, cursor)
        } else if token.is_punct('[') {
            let array = self.container(cursor, NodeKind::ArrayDefinition, token);
            self.leaf(array, NodeKind::OpenBracket, token);
            Step::to(ParserState::ArrayDefinition, array)
        } else if token.is_punct('(') {
            let parameters = self.container(cursor, NodeKind::FunctionParameters, token);
            self.leaf(parameters, NodeKind::OpenParen, token);
            let datatype = self.container(parameters, NodeKind::Datatype, token);
            Step::to(ParserState::FunctionParameters, datatype)
        } else if token.is_punct('=') {
            let initialization = self.container(cursor, NodeKind::Initialization, token);
            self.nesting = 0;
            Step::to(ParserState::Initialization, initialization)
        } else if token.is_punct('{') {
            self.unsupported(cursor, token, UnsupportedConstruct::EmbeddedDefinition)
        } else {
            self.reject(cursor, token, GrammarError::UnexpectedTokenAfterIdentifier)
        }
    }

    fn on_array_definition(&mut self, array: NodeId, token: &Token) -> Step {
        if token.is_punct(']') {
            self.leaf(array, NodeKind::CloseBracket, token);
            Step::to(ParserState::Identifier, self.up(array, 1))
        } else if token.is_punct('[') {
            self.reject(array, token, GrammarError::UnexpectedOpenSquareBracket)
        } else {
            self.leaf(array, NodeKind::ExpressionToken, token);
            Step::to(ParserState::ArrayDefinition, array)
        }
    }

    fn on_initialization(&mut self, cursor: NodeId, token: &Token) -> Step {
        if self.tree.kind(cursor) != NodeKind::ArrayItem {
            self.nesting = 0;
        }

        if token.is_punct('{') {
            let data = self.container(cursor, NodeKind::ArrayData, token);
            self.leaf(data, NodeKind::OpenBrace, token);
            let item = self.container(data, NodeKind::ArrayItem, token);
            self.nesting += 1;
            Step::to(ParserState::Initialization, item)
        } else if token.is_punct('}') {
            self.nesting -= 1;
            if self.nesting >= 0 {
                let data = self.up(cursor, 1);
                self.leaf(data, NodeKind::CloseBrace, token);
                Step::to(ParserState::Initialization, self.up(data, 1))
            } else {
                self.reject(cursor, token, GrammarError::UnexpectedCloseBrace)
            }
        } else if token.is_punct(',') {
            if self.nesting > 0 {
                let data = self.up(cursor, 1);
                let item = self.container(data, NodeKind::ArrayItem, token);
                Step::to(ParserState::Initialization, item)
            } else {
                self.reject(cursor, token, GrammarError::UnexpectedComma)
            }
        } else if token.is_punct(';') {
            if self.nesting == 0 {
                let enclosing = self.up(cursor, 1);
                self.leaf(enclosing, NodeKind::SentenceEnd, token);
                Step::to(ParserState::Idle, enclosing)
            } else {
                self.reject(cursor, token, GrammarError::UnexpectedSentenceEnd)
            }
        } else {
            self.leaf(cursor, NodeKind::ExpressionToken, token);
            Step::to(ParserState::Initialization, cursor)
        }
    }

    fn on_function_parameters(&mut self, cursor: NodeId, token: &Token) -> Step {
        let slot_open = self.tree.kind(cursor) == NodeKind::Datatype;
        let parameters = if slot_open { self.up(cursor, 1) } else { cursor };

        if token.is_punct(')') {
            self.leaf(parameters, NodeKind::CloseParen, token);
            Step::to(ParserState::FunctionDeclared, self.up(parameters, 1))
        } else if token.is_punct(',') {
            self.leaf(parameters, NodeKind::ParametersSeparator, token);
            let datatype = self.container(parameters, NodeKind::Datatype, token);
            Step::to(ParserState::FunctionParameters, datatype)
        } else if slot_open {
            self.digest_into(
                cursor,
                token,
                ParserState::FunctionParameters,
                ParserState::FunctionParameters,
            )
        } else {
            self.reject(cursor, token, GrammarError::UnexpectedTokenAfterParameter)
        }
    }

    fn on_function_declared(&mut self, cursor: NodeId, token: &Token) -> Step {
        let construct = if token.is_punct('{') {
            UnsupportedConstruct::FunctionBody
        } else if token.is_punct(';') {
            UnsupportedConstruct::FunctionForwardDeclaration
        } else {
            UnsupportedConstruct::FunctionDeclarationSuffix
        };
        self.unsupported(cursor, token, construct)
    }

    /// Digest `token` into `datatype`. While the sequence is open the cursor
    /// stays on the datatype in `open`; once the declared name closes it the
    /// cursor moves to the datatype's parent in `closed`.
    fn digest_into(
        &mut self,
        datatype: NodeId,
        token: &Token,
        open: ParserState,
        closed: ParserState,
    ) -> Step {
        match digest(&mut self.tree, datatype, &mut self.flags, token) {
            DigestOutcome::Classified(_) => Step::to(open, datatype),
            DigestOutcome::Declared(_) => Step::to(closed, self.up(datatype, 1)),
            DigestOutcome::Rejected(_, error) => {
                log::warn!("{} at {}: {}", token.text, token.location, error);
                self.status = ParseStatus::Rejected(error);
                Step::to(ParserState::Error, datatype)
            }
            DigestOutcome::Unsupported(_, construct) => {
                log::warn!("{} at {}: {}", token.text, token.location, construct);
                self.status = ParseStatus::Unsupported(construct);
                Step::to(ParserState::Error, datatype)
            }
        }
    }

    fn reject(&mut self, cursor: NodeId, token: &Token, error: GrammarError) -> Step {
        log::warn!("{} at {}: {}", token.text, token.location, error);
        self.tree.add_diagnostic(
            cursor,
            NodeKind::Error,
            token.location,
            Some(&token.text),
            error.message(),
        );
        self.status = ParseStatus::Rejected(error);
        Step::to(ParserState::Error, cursor)
    }

    fn unsupported(&mut self, cursor: NodeId, token: &Token, construct: UnsupportedConstruct) -> Step {
        log::warn!("{} at {}: {}", token.text, token.location, construct);
        self.tree.add_diagnostic(
            cursor,
            NodeKind::Error,
            token.location,
            Some(&token.text),
            construct.message(),
        );
        self.status = ParseStatus::Unsupported(construct);
        Step::to(ParserState::Error, cursor)
    }

    /// Append a node carrying the token text.
    fn leaf(&mut self, parent: NodeId, kind: NodeKind, token: &Token) -> NodeId {
        self.tree.add_child(parent, kind, token.location, Some(&token.text))
    }

    /// Append a container node positioned at the token.
    fn container(&mut self, parent: NodeId, kind: NodeKind, token: &Token) -> NodeId {
        self.tree.add_child(parent, kind, token.location, None)
    }

    /// Walk `levels` parents up from `id`, stopping at the root.
    fn up(&self, id: NodeId, levels: usize) -> NodeId {
        (0..levels).fold(id, |node, _| self.tree.parent_or_self(node))
    }

    fn request(&mut self, mode: LexMode) {
        log::debug!("next token lexed in {:?} mode", mode);
        self.mode = mode;
    }
}

/// Parse an in-memory translation unit.
pub fn parse_source(source: &str, kind: SourceKind, filename: &str) -> ParseOutcome {
    Parser::new(source, kind, filename).parse()
}
