//! Declaration specifier digestion
//!
//! A declaration specifier sequence (`static const unsigned long int`) is
//! validated one token at a time. [`SpecifierFlags`] remembers which
//! categories the current sequence already holds; [`digest`] checks the next
//! token against them, appends exactly one node to the tree and tells the
//! caller what happened through a [`DigestOutcome`].
//!
//! The flag set is reset when the datatype node being filled holds nothing
//! but comments yet, so each sequence (each top-level declaration, each function
//! parameter) is validated on its own.
//!
//! # Precedence
//!
//! ```text
//! storage specifier  static extern auto register typedef
//! qualifier          const volatile
//! modifier           signed unsigned short long
//! base type          void char int float double
//! composed type      union enum struct  (tag name follows)
//! pointer            *
//! identifier         type name, or the declared name once a type is known
//! ```

use super::errors::{GrammarError, UnsupportedConstruct};
use super::lexer::{Token, TokenKind};
use super::tree::{NodeId, NodeKind, ParseTree};

/// Categories already consumed by the current specifier sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecifierFlags(u16);

impl SpecifierFlags {
    pub const NONE: Self = Self(0);
    pub const STORAGE: Self = Self(1 << 0);
    pub const QUALIFIER: Self = Self(1 << 1);
    pub const SIGNED: Self = Self(1 << 2);
    pub const UNSIGNED: Self = Self(1 << 3);
    pub const SHORT: Self = Self(1 << 4);
    pub const LONG: Self = Self(1 << 5);
    pub const LONG_LONG: Self = Self(1 << 6);
    pub const VOID: Self = Self(1 << 7);
    pub const CHAR: Self = Self(1 << 8);
    pub const INT: Self = Self(1 << 9);
    pub const FLOAT: Self = Self(1 << 10);
    pub const DOUBLE: Self = Self(1 << 11);
    pub const USER_DEFINED: Self = Self(1 << 12);
    pub const COMPOSED: Self = Self(1 << 13);

    /// signed, unsigned, short and long
    pub const MODIFIERS: Self = Self(Self::SIGNED.0 | Self::UNSIGNED.0 | Self::SHORT.0 | Self::LONG.0);

    /// Any of these means a type is known, so the next identifier is the declared name
    pub const TYPE_DEFINED: Self = Self(
        Self::MODIFIERS.0
            | Self::LONG_LONG.0
            | Self::VOID.0
            | Self::CHAR.0
            | Self::INT.0
            | Self::FLOAT.0
            | Self::DOUBLE.0
            | Self::USER_DEFINED.0,
    );

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when at least one flag of `other` is set.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// The sequence has reached a known type.
    pub fn type_defined(self) -> bool {
        self.intersects(Self::TYPE_DEFINED)
    }
}

impl std::ops::BitOr for SpecifierFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What [`digest`] did with a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Accepted as part of the sequence; the node sits inside the datatype
    Classified(NodeId),
    /// The token is the declared name; the sequence is closed and the
    /// identifier node was appended to the datatype's parent
    Declared(NodeId),
    /// Rejected; an error node was appended to the datatype
    Rejected(NodeId, GrammarError),
    /// Valid but not modelled; an error node was appended to the datatype
    Unsupported(NodeId, UnsupportedConstruct),
}

/// Keyword classes recognised inside a specifier sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Storage,
    Qualifier,
    Modifier(SpecifierFlags),
    Primitive(SpecifierFlags),
    Composed(NodeKind),
}

fn classify(token: &Token) -> Option<Keyword> {
    if token.kind != TokenKind::Identifier {
        return None;
    }
    let keyword = match token.text.as_str() {
        "static" | "extern" | "auto" | "register" | "typedef" => Keyword::Storage,
        "const" | "volatile" => Keyword::Qualifier,
        "signed" => Keyword::Modifier(SpecifierFlags::SIGNED),
        "unsigned" => Keyword::Modifier(SpecifierFlags::UNSIGNED),
        "short" => Keyword::Modifier(SpecifierFlags::SHORT),
        "long" => Keyword::Modifier(SpecifierFlags::LONG),
        "void" => Keyword::Primitive(SpecifierFlags::VOID),
        "char" => Keyword::Primitive(SpecifierFlags::CHAR),
        "int" => Keyword::Primitive(SpecifierFlags::INT),
        "float" => Keyword::Primitive(SpecifierFlags::FLOAT),
        "double" => Keyword::Primitive(SpecifierFlags::DOUBLE),
        "union" => Keyword::Composed(NodeKind::Union),
        "enum" => Keyword::Composed(NodeKind::Enum),
        "struct" => Keyword::Composed(NodeKind::Struct),
        _ => return None,
    };
    Some(keyword)
}

/// Validate and classify one token of the specifier sequence held by
/// `datatype`, updating `flags`.
pub fn digest(
    tree: &mut ParseTree,
    datatype: NodeId,
    flags: &mut SpecifierFlags,
    token: &Token,
) -> DigestOutcome {
    // comments do not start a sequence
    if tree.children(datatype).iter().all(|&c| tree.kind(c).is_comment()) {
        flags.clear();
    }

    let text = Some(token.text.as_str());
    let loc = token.location;

    let reject = |tree: &mut ParseTree, error: GrammarError| {
        let id = tree.add_diagnostic(datatype, NodeKind::Error, loc, text, error.message());
        DigestOutcome::Rejected(id, error)
    };

    if token.is_punct('{') {
        let construct = UnsupportedConstruct::EmbeddedDefinition;
        let id = tree.add_diagnostic(datatype, NodeKind::Error, loc, text, construct.message());
        return DigestOutcome::Unsupported(id, construct);
    }

    // The tag name has to follow union / enum / struct directly
    let awaiting_tag = flags.contains(SpecifierFlags::COMPOSED) && !flags.contains(SpecifierFlags::USER_DEFINED);
    if awaiting_tag {
        if token.kind != TokenKind::Identifier || classify(token).is_some() {
            return reject(tree, GrammarError::ExpectedTagName);
        }
        flags.insert(SpecifierFlags::USER_DEFINED);
        let composed = tree
            .children_of_kind(datatype, NodeKind::UserDefinedType)
            .last()
            .copied()
            .unwrap_or(datatype);
        let id = tree.add_child(composed, NodeKind::Identifier, loc, text);
        return DigestOutcome::Classified(id);
    }

    match classify(token) {
        Some(Keyword::Storage) => {
            if flags.contains(SpecifierFlags::STORAGE) {
                return reject(tree, GrammarError::SpecifierAlreadyDefined);
            }
            flags.insert(SpecifierFlags::STORAGE);
            DigestOutcome::Classified(tree.add_child(datatype, NodeKind::Specifier, loc, text))
        }
        Some(Keyword::Qualifier) => {
            if flags.contains(SpecifierFlags::QUALIFIER) {
                return reject(tree, GrammarError::QualifierAlreadyDefined);
            }
            flags.insert(SpecifierFlags::QUALIFIER);
            DigestOutcome::Classified(tree.add_child(datatype, NodeKind::Qualifier, loc, text))
        }
        Some(Keyword::Modifier(modifier)) => match check_modifier(*flags, modifier) {
            Ok(added) => {
                flags.insert(added);
                DigestOutcome::Classified(tree.add_child(datatype, NodeKind::Modifier, loc, text))
            }
            Err(error) => reject(tree, error),
        },
        Some(Keyword::Primitive(primitive)) => match check_primitive(*flags, primitive) {
            Ok(()) => {
                flags.insert(primitive);
                DigestOutcome::Classified(tree.add_child(datatype, NodeKind::PrimitiveType, loc, text))
            }
            Err(error) => reject(tree, error),
        },
        Some(Keyword::Composed(marker)) => {
            if flags.type_defined() || flags.contains(SpecifierFlags::COMPOSED) {
                return reject(tree, GrammarError::ComposedOverDefinedType);
            }
            flags.insert(SpecifierFlags::COMPOSED);
            let composed = tree.add_child(datatype, NodeKind::UserDefinedType, loc, None);
            DigestOutcome::Classified(tree.add_child(composed, marker, loc, text))
        }
        None if token.is_punct('*') => {
            // a qualifier may follow the pointer again
            flags.remove(SpecifierFlags::QUALIFIER);
            DigestOutcome::Classified(tree.add_child(datatype, NodeKind::Pointer, loc, text))
        }
        None if token.kind == TokenKind::Identifier => {
            if flags.type_defined() {
                let enclosing = tree.parent_or_self(datatype);
                DigestOutcome::Declared(tree.add_child(enclosing, NodeKind::Identifier, loc, text))
            } else {
                flags.insert(SpecifierFlags::USER_DEFINED);
                DigestOutcome::Classified(tree.add_child(datatype, NodeKind::UserDefinedType, loc, text))
            }
        }
        None => reject(tree, GrammarError::UnexpectedToken),
    }
}

/// Returns the flags to add for `modifier`, or why it cannot be applied.
fn check_modifier(flags: SpecifierFlags, modifier: SpecifierFlags) -> Result<SpecifierFlags, GrammarError> {
    use SpecifierFlags as F;

    if flags.contains(modifier) {
        // long long
        let long_long_allowed = modifier == F::LONG && !flags.intersects(F::LONG_LONG | F::DOUBLE);
        return if long_long_allowed {
            Ok(F::LONG_LONG)
        } else {
            Err(GrammarError::RepeatedModifier)
        };
    }
    if flags.contains(F::USER_DEFINED) {
        return Err(GrammarError::ModifierOnUserDefined);
    }
    if flags.contains(F::VOID) {
        return Err(GrammarError::ModifierOnVoid);
    }
    if flags.contains(F::CHAR) && (modifier == F::SHORT || modifier == F::LONG) {
        return Err(GrammarError::ShortLongOnChar);
    }
    if flags.contains(F::FLOAT) {
        return Err(GrammarError::ModifierOnFloat);
    }
    if flags.contains(F::DOUBLE) && modifier != F::LONG {
        return Err(GrammarError::ModifierOnDouble);
    }
    if (flags.contains(F::UNSIGNED) && modifier == F::SIGNED) || (flags.contains(F::SIGNED) && modifier == F::UNSIGNED) {
        return Err(GrammarError::SignedAndUnsigned);
    }
    if (flags.contains(F::LONG) && modifier == F::SHORT) || (flags.contains(F::SHORT) && modifier == F::LONG) {
        return Err(GrammarError::LongAndShort);
    }
    Ok(modifier)
}

fn check_primitive(flags: SpecifierFlags, primitive: SpecifierFlags) -> Result<(), GrammarError> {
    use SpecifierFlags as F;

    if flags.contains(primitive) {
        return Err(GrammarError::RepeatedPrimitive);
    }
    if flags.contains(F::USER_DEFINED) {
        return Err(GrammarError::PrimitiveAfterUserDefined);
    }
    if primitive == F::VOID && flags.intersects(F::MODIFIERS) {
        return Err(GrammarError::VoidWithModifiers);
    }
    if primitive == F::CHAR && flags.intersects(F::SHORT | F::LONG) {
        return Err(GrammarError::CharWithShortLong);
    }
    if primitive == F::FLOAT && flags.intersects(F::MODIFIERS) {
        return Err(GrammarError::FloatWithModifiers);
    }
    if primitive == F::DOUBLE && flags.intersects(F::SIGNED | F::UNSIGNED | F::SHORT) {
        return Err(GrammarError::DoubleWithModifiers);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    /// Digests every token of `source` into one datatype node, stopping at
    /// the first outcome that is not `Classified`.
    fn digest_all(source: &str) -> (ParseTree, NodeId, Vec<DigestOutcome>) {
        let mut tree = ParseTree::new(NodeKind::SourceUnit, "test.c");
        let root = tree.root();
        let datatype = tree.add_child(root, NodeKind::Datatype, Default::default(), None);
        let mut flags = SpecifierFlags::NONE;
        let mut outcomes = Vec::new();
        for token in Lexer::new(source) {
            let outcome = digest(&mut tree, datatype, &mut flags, &token);
            outcomes.push(outcome);
            if !matches!(outcome, DigestOutcome::Classified(_)) {
                break;
            }
        }
        (tree, datatype, outcomes)
    }

    fn first_error(source: &str) -> Option<GrammarError> {
        let (_, _, outcomes) = digest_all(source);
        outcomes.into_iter().find_map(|o| match o {
            DigestOutcome::Rejected(_, e) => Some(e),
            _ => None,
        })
    }

    fn kinds(tree: &ParseTree, id: NodeId) -> Vec<NodeKind> {
        tree.children(id).iter().map(|&c| tree.kind(c)).collect()
    }

    #[test]
    fn test_full_sequence_then_name() {
        let (tree, datatype, outcomes) = digest_all("static const unsigned long int counter");
        assert!(matches!(outcomes.last(), Some(DigestOutcome::Declared(_))));
        assert_eq!(
            kinds(&tree, datatype),
            vec![
                NodeKind::Specifier,
                NodeKind::Qualifier,
                NodeKind::Modifier,
                NodeKind::Modifier,
                NodeKind::PrimitiveType,
            ]
        );
        let root_children = kinds(&tree, tree.root());
        assert_eq!(root_children, vec![NodeKind::Datatype, NodeKind::Identifier]);
    }

    #[test]
    fn test_storage_specifiers_are_exclusive() {
        for pair in ["static static", "static extern", "extern typedef", "auto register"] {
            assert_eq!(first_error(pair), Some(GrammarError::SpecifierAlreadyDefined), "for {}", pair);
        }
    }

    #[test]
    fn test_qualifier_twice() {
        assert_eq!(first_error("const volatile int"), Some(GrammarError::QualifierAlreadyDefined));
    }

    #[test]
    fn test_long_long() {
        let (tree, datatype, outcomes) = digest_all("long long int x");
        assert!(matches!(outcomes.last(), Some(DigestOutcome::Declared(_))));
        assert_eq!(tree.count(NodeKind::Error), 0);
        assert_eq!(tree.children_of_kind(datatype, NodeKind::Modifier).len(), 2);

        assert_eq!(first_error("long long long int x"), Some(GrammarError::RepeatedModifier));
        assert_eq!(first_error("long double long"), Some(GrammarError::RepeatedModifier));
    }

    #[test]
    fn test_modifier_rules() {
        assert_eq!(first_error("unsigned unsigned"), Some(GrammarError::RepeatedModifier));
        assert_eq!(first_error("size_t unsigned"), Some(GrammarError::ModifierOnUserDefined));
        assert_eq!(first_error("void unsigned"), Some(GrammarError::ModifierOnVoid));
        assert_eq!(first_error("char long"), Some(GrammarError::ShortLongOnChar));
        assert_eq!(first_error("float signed"), Some(GrammarError::ModifierOnFloat));
        assert_eq!(first_error("double short"), Some(GrammarError::ModifierOnDouble));
        assert_eq!(first_error("signed unsigned"), Some(GrammarError::SignedAndUnsigned));
        assert_eq!(first_error("short long"), Some(GrammarError::LongAndShort));
        assert_eq!(first_error("unsigned char c"), None);
        assert_eq!(first_error("double long d"), None);
    }

    #[test]
    fn test_primitive_rules() {
        assert_eq!(first_error("int int"), Some(GrammarError::RepeatedPrimitive));
        assert_eq!(first_error("GLuint int"), Some(GrammarError::PrimitiveAfterUserDefined));
        assert_eq!(first_error("unsigned void"), Some(GrammarError::VoidWithModifiers));
        assert_eq!(first_error("short char"), Some(GrammarError::CharWithShortLong));
        assert_eq!(first_error("long float"), Some(GrammarError::FloatWithModifiers));
        assert_eq!(first_error("unsigned double"), Some(GrammarError::DoubleWithModifiers));
        assert_eq!(first_error("long double d"), None);
    }

    #[test]
    fn test_pointer_resets_qualifier() {
        let (tree, datatype, outcomes) = digest_all("const char * const * p");
        assert!(matches!(outcomes.last(), Some(DigestOutcome::Declared(_))));
        assert_eq!(
            kinds(&tree, datatype),
            vec![
                NodeKind::Qualifier,
                NodeKind::PrimitiveType,
                NodeKind::Pointer,
                NodeKind::Qualifier,
                NodeKind::Pointer,
            ]
        );
    }

    #[test]
    fn test_user_defined_type_then_name() {
        let (tree, datatype, outcomes) = digest_all("static GLenum mode");
        assert!(matches!(outcomes.last(), Some(DigestOutcome::Declared(_))));
        let user = tree.children_of_kind(datatype, NodeKind::UserDefinedType);
        assert_eq!(user.len(), 1);
        assert_eq!(tree.node(user[0]).payload.as_deref(), Some("GLenum"));
    }

    #[test]
    fn test_composed_type_with_tag() {
        let (tree, datatype, outcomes) = digest_all("struct point origin");
        assert!(matches!(outcomes.last(), Some(DigestOutcome::Declared(_))));
        let composed = tree.children_of_kind(datatype, NodeKind::UserDefinedType);
        assert_eq!(composed.len(), 1);
        assert_eq!(kinds(&tree, composed[0]), vec![NodeKind::Struct, NodeKind::Identifier]);
    }

    #[test]
    fn test_composed_type_errors() {
        assert_eq!(first_error("struct int"), Some(GrammarError::ExpectedTagName));
        assert_eq!(first_error("int struct"), Some(GrammarError::ComposedOverDefinedType));
        assert_eq!(first_error("union u unsigned"), Some(GrammarError::ModifierOnUserDefined));

        let (_, _, outcomes) = digest_all("struct point {");
        assert!(matches!(
            outcomes.last(),
            Some(DigestOutcome::Unsupported(_, UnsupportedConstruct::EmbeddedDefinition))
        ));
    }

    #[test]
    fn test_unexpected_token_keeps_flags() {
        let mut tree = ParseTree::new(NodeKind::SourceUnit, "test.c");
        let root = tree.root();
        let datatype = tree.add_child(root, NodeKind::Datatype, Default::default(), None);
        let mut flags = SpecifierFlags::NONE;
        let tokens: Vec<_> = Lexer::new("int ;").collect();

        digest(&mut tree, datatype, &mut flags, &tokens[0]);
        let before = flags;
        let outcome = digest(&mut tree, datatype, &mut flags, &tokens[1]);
        assert!(matches!(outcome, DigestOutcome::Rejected(_, GrammarError::UnexpectedToken)));
        assert_eq!(flags, before);
    }

    #[test]
    fn test_flags_reset_for_empty_datatype() {
        let mut tree = ParseTree::new(NodeKind::SourceUnit, "test.c");
        let root = tree.root();
        let mut flags = SpecifierFlags::NONE;
        let tokens: Vec<_> = Lexer::new("int int").collect();

        let first = tree.add_child(root, NodeKind::Datatype, Default::default(), None);
        digest(&mut tree, first, &mut flags, &tokens[0]);
        assert!(flags.contains(SpecifierFlags::INT));

        let second = tree.add_child(root, NodeKind::Datatype, Default::default(), None);
        let outcome = digest(&mut tree, second, &mut flags, &tokens[1]);
        assert!(matches!(outcome, DigestOutcome::Classified(_)));
    }
}
