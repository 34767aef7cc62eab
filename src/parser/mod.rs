//! C declaration parser
//!
//! This module turns the text of one C translation unit into an annotated
//! concrete parse tree:
//! - [`lexer`]: Tokenization (bytes → tokens), with one-token lexing modes
//!   for include filenames and define bodies
//! - [`specifiers`]: Declaration specifier digesting and validation
//! - [`parser`]: The state machine that consumes tokens and grows the tree
//! - [`tree`]: Arena parse tree, node kinds and pre-order rendering
//! - [`errors`]: Grammar errors and unsupported constructs
//!
//! # Supported subset
//!
//! - Preprocessor: `#include`, `#define`, `#pragma` (others are rejected)
//! - Comments anywhere, kept in the tree
//! - Declarations: storage specifiers, qualifiers, modifiers, primitive
//!   types, `union`/`enum`/`struct` tags, typedef names and pointers
//! - Declarators: identifiers, array suffixes, initializers (including
//!   nested brace lists) and function parameter lists
//!
//! Function bodies, forward declarations and embedded aggregate definitions
//! are recognized and reported as unsupported.

pub mod errors;
pub mod lexer;
pub mod parser;
pub mod specifiers;
pub mod tree;

pub use errors::{GrammarError, UnsupportedConstruct};
pub use parser::{parse_source, ParseOutcome, ParseStatus, Parser, ParserState};
pub use tree::{NodeId, NodeKind, ParseNode, ParseTree, SourceLocation};
