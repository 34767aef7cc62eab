//! Diagnostics produced while parsing
//!
//! Two families:
//!
//! - [`GrammarError`]: the input is not valid for the supported grammar
//!   (contradictory specifiers, a token with no action in the current state,
//!   an invalid token from the lexer).
//! - [`UnsupportedConstruct`]: the input is plausible C but the construct is
//!   not modelled yet (function bodies, embedded aggregate definitions).
//!
//! Both are recorded in the tree as error nodes; the parse status tells them
//! apart.

use std::fmt;

/// Grammar and lexical errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarError {
    // Storage specifiers and qualifiers
    SpecifierAlreadyDefined,
    QualifierAlreadyDefined,

    // Modifiers
    RepeatedModifier,
    ModifierOnUserDefined,
    ModifierOnVoid,
    ShortLongOnChar,
    ModifierOnFloat,
    ModifierOnDouble,
    SignedAndUnsigned,
    LongAndShort,

    // Basic built in datatypes
    RepeatedPrimitive,
    PrimitiveAfterUserDefined,
    VoidWithModifiers,
    CharWithShortLong,
    FloatWithModifiers,
    DoubleWithModifiers,

    // union / enum / struct
    ComposedOverDefinedType,
    ExpectedTagName,

    // State machine
    UnexpectedToken,
    InvalidToken,
    UnexpectedDirective,
    UnexpectedTokenAfterIdentifier,
    UnexpectedTokenAfterParameter,
    UnexpectedOpenSquareBracket,
    UnexpectedCloseBrace,
    UnexpectedComma,
    UnexpectedSentenceEnd,
    UnexpectedEndOfInput,
}

impl GrammarError {
    /// Stable message stored on the error node.
    pub fn message(self) -> &'static str {
        match self {
            GrammarError::SpecifierAlreadyDefined => "specifier already defined",
            GrammarError::QualifierAlreadyDefined => "qualifier already defined",
            GrammarError::RepeatedModifier => "cannot apply the same modifier twice",
            GrammarError::ModifierOnUserDefined => "cannot apply modifiers to user defined datatypes",
            GrammarError::ModifierOnVoid => "cannot apply modifiers to void datatype",
            GrammarError::ShortLongOnChar => "cannot apply modifier short nor long to char datatype",
            GrammarError::ModifierOnFloat => "cannot apply modifiers to float datatype",
            GrammarError::ModifierOnDouble => {
                "cannot apply modifiers short, unsigned nor signed to double datatype"
            }
            GrammarError::SignedAndUnsigned => {
                "cannot apply signed and unsigned modifiers at the same time"
            }
            GrammarError::LongAndShort => "cannot apply long and short modifiers at the same time",
            GrammarError::RepeatedPrimitive => "cannot specify the same basic built in datatype twice",
            GrammarError::PrimitiveAfterUserDefined => {
                "cannot specify a basic built in datatype when a user defined datatype is already defined"
            }
            GrammarError::VoidWithModifiers => "cannot specify modifiers to void datatype",
            GrammarError::CharWithShortLong => "cannot specify short nor long modifiers to char datatype",
            GrammarError::FloatWithModifiers => "cannot specify modifiers to float datatype",
            GrammarError::DoubleWithModifiers => {
                "cannot specify signed, unsigned nor short modifiers to double datatype"
            }
            GrammarError::ComposedOverDefinedType => {
                "cannot declare a union, enum or struct over an already specified datatype"
            }
            GrammarError::ExpectedTagName => "expected a tag name after union, enum or struct",
            GrammarError::UnexpectedToken => "unexpected token",
            GrammarError::InvalidToken => "unexpected invalid token",
            GrammarError::UnexpectedDirective => "unexpected preprocessor directive",
            GrammarError::UnexpectedTokenAfterIdentifier => "unexpected token after identifier",
            GrammarError::UnexpectedTokenAfterParameter => {
                "unexpected token after parameter identifier"
            }
            GrammarError::UnexpectedOpenSquareBracket => "unexpected open square bracket",
            GrammarError::UnexpectedCloseBrace => {
                "unexpected close bracket during variable initialization"
            }
            GrammarError::UnexpectedComma => "unexpected comma during variable initialization",
            GrammarError::UnexpectedSentenceEnd => {
                "unexpected sentence end during array variable initialization"
            }
            GrammarError::UnexpectedEndOfInput => "unexpected end of input",
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for GrammarError {}

/// Valid C that the parser does not model yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedConstruct {
    /// `{ ... }` inside a declaration specifier sequence or after a declared name
    EmbeddedDefinition,
    /// `{ ... }` after a function's parameter list
    FunctionBody,
    /// `;` after a function's parameter list
    FunctionForwardDeclaration,
    /// Anything else after a function's parameter list
    FunctionDeclarationSuffix,
}

impl UnsupportedConstruct {
    pub fn message(self) -> &'static str {
        match self {
            UnsupportedConstruct::EmbeddedDefinition => {
                "not supported yet: embedded union, enum or struct definition"
            }
            UnsupportedConstruct::FunctionBody => "not supported yet: function body",
            UnsupportedConstruct::FunctionForwardDeclaration => {
                "not supported yet: function forward declaration"
            }
            UnsupportedConstruct::FunctionDeclarationSuffix => {
                "not supported yet: function declaration suffix"
            }
        }
    }
}

impl fmt::Display for UnsupportedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for UnsupportedConstruct {}
