//! Parse tree for a single translation unit
//!
//! The tree is an append-only arena: every node lives in [`ParseTree::nodes`]
//! and is addressed by a [`NodeId`]. Children are ordered by insertion, which
//! is the left-to-right order of the tokens that produced them. The parent
//! link is a plain index used by the parser to move its cursor back up.
//!
//! Nothing is ever removed or reordered once appended, including error
//! nodes, so a failed parse can still be inspected up to the point where it
//! stopped.

use rustc_hash::FxHashMap;
use std::fmt;

/// Index of a node inside its [`ParseTree`]
pub type NodeId = usize;

/// Source location information for nodes and tokens (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // File units
    HeaderUnit,
    SourceUnit,

    // Comments
    BlockComment,
    LineComment,

    // Preprocessor
    Directive,
    Include,
    IncludeFilename,
    Define,
    DefineIdentifier,
    DefineExpression,
    Pragma,
    PragmaText,

    // Declaration specifiers
    Datatype,
    Specifier,
    Qualifier,
    Modifier,
    PrimitiveType,
    UserDefinedType,
    Union,
    Enum,
    Struct,
    Pointer,

    // Structural tokens
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,

    // Declaration shapes
    Identifier,
    ArrayDefinition,
    FunctionParameters,
    ParametersSeparator,
    Initialization,
    ArrayData,
    ArrayItem,
    ExpressionToken,
    SentenceEnd,

    // Diagnostics
    Error,
    /// Reserved for non-fatal diagnostics; nothing in the current grammar emits it
    Warning,
}

impl NodeKind {
    /// Returns true for error and warning nodes.
    pub fn is_diagnostic(self) -> bool {
        matches!(self, NodeKind::Error | NodeKind::Warning)
    }

    /// Returns true for block and line comments.
    pub fn is_comment(self) -> bool {
        matches!(self, NodeKind::BlockComment | NodeKind::LineComment)
    }

    /// Returns true for the two root kinds.
    pub fn is_unit(self) -> bool {
        matches!(self, NodeKind::HeaderUnit | NodeKind::SourceUnit)
    }

    /// Short, stable name used by the text dump and the tree browser.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::HeaderUnit => "header-unit",
            NodeKind::SourceUnit => "source-unit",
            NodeKind::BlockComment => "block-comment",
            NodeKind::LineComment => "line-comment",
            NodeKind::Directive => "directive",
            NodeKind::Include => "include",
            NodeKind::IncludeFilename => "include-filename",
            NodeKind::Define => "define",
            NodeKind::DefineIdentifier => "define-identifier",
            NodeKind::DefineExpression => "define-expression",
            NodeKind::Pragma => "pragma",
            NodeKind::PragmaText => "pragma-text",
            NodeKind::Datatype => "datatype",
            NodeKind::Specifier => "specifier",
            NodeKind::Qualifier => "qualifier",
            NodeKind::Modifier => "modifier",
            NodeKind::PrimitiveType => "primitive-type",
            NodeKind::UserDefinedType => "user-defined-type",
            NodeKind::Union => "union",
            NodeKind::Enum => "enum",
            NodeKind::Struct => "struct",
            NodeKind::Pointer => "pointer",
            NodeKind::OpenParen => "open-parenthesis",
            NodeKind::CloseParen => "close-parenthesis",
            NodeKind::OpenBracket => "open-bracket",
            NodeKind::CloseBracket => "close-bracket",
            NodeKind::OpenBrace => "open-brace",
            NodeKind::CloseBrace => "close-brace",
            NodeKind::Identifier => "identifier",
            NodeKind::ArrayDefinition => "array-definition",
            NodeKind::FunctionParameters => "function-parameters",
            NodeKind::ParametersSeparator => "parameters-separator",
            NodeKind::Initialization => "initialization",
            NodeKind::ArrayData => "array-data",
            NodeKind::ArrayItem => "array-item",
            NodeKind::ExpressionToken => "expression-token",
            NodeKind::SentenceEnd => "sentence-end",
            NodeKind::Error => "error",
            NodeKind::Warning => "warning",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single node of the parse tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub kind: NodeKind,
    /// `None` only for the root
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub location: SourceLocation,
    /// Literal text copied from the token that produced the node
    pub payload: Option<String>,
    /// Human-readable message, only set on error and warning nodes
    pub diagnostic: Option<String>,
}

/// Arena-backed, append-only parse tree rooted at a header or source unit
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
}

impl ParseTree {
    const ROOT: NodeId = 0;

    /// Create a tree holding only its root. The root payload is the filename.
    pub fn new(root_kind: NodeKind, filename: &str) -> Self {
        debug_assert!(root_kind.is_unit());
        Self {
            nodes: vec![ParseNode {
                kind: root_kind,
                parent: None,
                children: Vec::new(),
                location: SourceLocation::default(),
                payload: Some(filename.to_string()),
                diagnostic: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append a new child under `parent` and return its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        location: SourceLocation,
        payload: Option<&str>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ParseNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            location,
            payload: payload.map(str::to_string),
            diagnostic: None,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append an error or warning node carrying `message`.
    pub fn add_diagnostic(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        location: SourceLocation,
        payload: Option<&str>,
        message: &str,
    ) -> NodeId {
        debug_assert!(kind.is_diagnostic());
        let id = self.add_child(parent, kind, location, payload);
        self.nodes[id].diagnostic = Some(message.to_string());
        id
    }

    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Parent of `id`, or `id` itself for the root.
    pub(crate) fn parent_or_self(&self, id: NodeId) -> NodeId {
        self.nodes[id].parent.unwrap_or(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].children.last().copied()
    }

    /// Children of `id` with the given kind, in order.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == kind)
            .collect()
    }

    /// Pre-order walk yielding `(depth, id)`, children in insertion order.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![(0, Self::ROOT)],
        }
    }

    /// All error and warning nodes in pre-order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &ParseNode> + '_ {
        self.pre_order()
            .map(|(_, id)| self.node(id))
            .filter(|n| n.kind.is_diagnostic())
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.kind == NodeKind::Error)
    }

    /// Number of nodes per kind.
    pub fn kind_counts(&self) -> FxHashMap<NodeKind, usize> {
        let mut counts = FxHashMap::default();
        for node in &self.nodes {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// One-line description of a node, as used by [`ParseTree::render`].
    pub fn describe(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut line = node.kind.name().to_string();
        if let Some(payload) = &node.payload {
            line.push_str(&format!(" {:?}", payload));
        }
        if !node.kind.is_unit() {
            line.push_str(&format!(" @{}", node.location));
        }
        if let Some(message) = &node.diagnostic {
            line.push_str(&format!(" ({})", message));
        }
        line
    }

    /// Deterministic indented dump of the whole tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (depth, id) in self.pre_order() {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&self.describe(id));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Iterator returned by [`ParseTree::pre_order`]
pub struct PreOrder<'a> {
    tree: &'a ParseTree,
    stack: Vec<(usize, NodeId)>,
}

impl Iterator for PreOrder<'_> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        for &child in self.tree.children(id).iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, id))
    }
}
