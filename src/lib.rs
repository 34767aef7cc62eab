//! # Introduction
//!
//! cdecl-tree reads a C header or source file and builds an annotated
//! concrete parse tree of its top-level declarations. Every token ends up in
//! the tree, comments included; a rejected or unsupported construct ends the
//! parse with an error node at the place it was found. The tree can be
//! dumped as indented text or browsed in a terminal UI built with
//! [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! File → Source → Lexer → Parser (state machine + specifier digester) → Tree → TUI
//! ```
//!
//! 1. [`source`]: classifies the file as header or source, resolves headers
//!    through the search directories and reads the bytes.
//! 2. [`parser`]: tokenises the text and drives the parser state machine,
//!    producing a [`parser::ParseTree`] and a [`parser::ParseStatus`].
//! 3. [`ui`]: ratatui-based tree browser; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use cdecl_tree::parser::{parse_source, NodeKind, ParseStatus};
//! use cdecl_tree::source::SourceKind;
//!
//! let outcome = parse_source("static const int limit = 4;", SourceKind::Source, "limit.c");
//! assert_eq!(outcome.status, ParseStatus::Completed);
//! assert_eq!(outcome.tree.count(NodeKind::Identifier), 1);
//! ```

pub mod parser;
pub mod source;
pub mod ui;
