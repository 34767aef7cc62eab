// Integration tests for the declaration parser

use cdecl_tree::parser::{parse_source, NodeId, NodeKind, ParseOutcome, ParseStatus, ParseTree};
use cdecl_tree::parser::{GrammarError, UnsupportedConstruct};
use cdecl_tree::source::{parse_file, SearchPaths, SourceError, SourceKind};
use similar_asserts::assert_eq;
use std::fs;
use std::path::PathBuf;
use test_log::test;

fn parse(source: &str) -> ParseOutcome {
    parse_source(source, SourceKind::Source, "test.c")
}

fn kinds(tree: &ParseTree, id: NodeId) -> Vec<NodeKind> {
    tree.children(id).iter().map(|&c| tree.kind(c)).collect()
}

#[test]
fn test_header_with_everything() {
    let source = r#"
/* config.h: shared settings */
#include <stddef.h>
#include "local.h"
#define MAX_USERS 64
#define GREETING "hello" \
    " world"
#pragma pack(1)

// counters
static unsigned long long total_bytes = 0;
extern const char *program_name;
volatile short int flags[4] = {0, 1, 2, 3};
struct node *head;
size_t length;
long double ratios[2][2] = {{1.0, 0.5}, {0.25, 2e-3}};
"#;

    let outcome = parse_source(source, SourceKind::Header, "config.h");
    assert_eq!(outcome.status, ParseStatus::Completed);

    let tree = &outcome.tree;
    let root = tree.root();
    assert_eq!(tree.kind(root), NodeKind::HeaderUnit);
    assert!(!tree.has_errors());
    assert_eq!(tree.children_of_kind(root, NodeKind::Directive).len(), 5);
    assert_eq!(tree.children_of_kind(root, NodeKind::Datatype).len(), 6);
    assert_eq!(tree.children_of_kind(root, NodeKind::SentenceEnd).len(), 6);
    assert_eq!(tree.count(NodeKind::BlockComment), 1);
    assert_eq!(tree.count(NodeKind::LineComment), 1);

    let names: Vec<&str> = tree
        .children_of_kind(root, NodeKind::Identifier)
        .into_iter()
        .filter_map(|id| tree.node(id).payload.as_deref())
        .collect();
    assert_eq!(
        names,
        vec!["total_bytes", "program_name", "flags", "head", "length", "ratios"]
    );

    let define_bodies: Vec<&str> = tree
        .pre_order()
        .map(|(_, id)| tree.node(id))
        .filter(|n| n.kind == NodeKind::DefineExpression)
        .filter_map(|n| n.payload.as_deref())
        .collect();
    assert_eq!(define_bodies[0], "64");
    assert!(define_bodies[1].starts_with("\"hello\""));
    assert!(define_bodies[1].ends_with("\" world\""));
}

#[test]
fn test_parse_is_deterministic() {
    let source = "#include <stdio.h>\nconst int *const p = 0;\nint m[2] = {1, 2};\n";
    let first = parse(source);
    let second = parse(source);
    assert_eq!(first.tree.render(), second.tree.render());
    assert_eq!(first.status, second.status);
}

#[test]
fn test_render_format() {
    let outcome = parse("int x;");
    let expected = "\
source-unit \"test.c\"
  datatype @1:1
    primitive-type \"int\" @1:1
  identifier \"x\" @1:5
  sentence-end \";\" @1:6
";
    assert_eq!(outcome.tree.render(), expected);
}

#[test]
fn test_specifier_exclusivity() {
    assert_eq!(
        parse("static extern int x;").status,
        ParseStatus::Rejected(GrammarError::SpecifierAlreadyDefined)
    );
    assert_eq!(
        parse("const volatile int x;").status,
        ParseStatus::Rejected(GrammarError::QualifierAlreadyDefined)
    );
    assert_eq!(
        parse("signed unsigned x;").status,
        ParseStatus::Rejected(GrammarError::SignedAndUnsigned)
    );
    assert_eq!(
        parse("short long x;").status,
        ParseStatus::Rejected(GrammarError::LongAndShort)
    );
    assert_eq!(
        parse("int int x;").status,
        ParseStatus::Rejected(GrammarError::RepeatedPrimitive)
    );
}

#[test]
fn test_long_long() {
    for source in [
        "long long x;",
        "long long int x;",
        "unsigned long long x;",
        "long unsigned long x;",
        "long int long x;",
    ] {
        assert_eq!(parse(source).status, ParseStatus::Completed, "{}", source);
    }
    assert_eq!(
        parse("long long long x;").status,
        ParseStatus::Rejected(GrammarError::RepeatedModifier)
    );
    assert_eq!(
        parse("long double long x;").status,
        ParseStatus::Rejected(GrammarError::RepeatedModifier)
    );
}

#[test]
fn test_void_exclusivity() {
    let before = parse("unsigned void x;");
    assert_eq!(before.status, ParseStatus::Rejected(GrammarError::VoidWithModifiers));
    assert_eq!(before.tree.count(NodeKind::Error), 1);

    let after = parse("void unsigned x;");
    assert_eq!(after.status, ParseStatus::Rejected(GrammarError::ModifierOnVoid));
    assert_eq!(after.tree.count(NodeKind::Error), 1);
}

#[test]
fn test_pointer_resets_qualifier() {
    let outcome = parse("const char * const * volatile p;");
    assert_eq!(outcome.status, ParseStatus::Completed);
    let tree = &outcome.tree;
    let datatype = tree.children_of_kind(tree.root(), NodeKind::Datatype)[0];
    assert_eq!(
        kinds(tree, datatype),
        vec![
            NodeKind::Qualifier,
            NodeKind::PrimitiveType,
            NodeKind::Pointer,
            NodeKind::Qualifier,
            NodeKind::Pointer,
            NodeKind::Qualifier,
        ]
    );

    assert_eq!(
        parse("const char * const const p;").status,
        ParseStatus::Rejected(GrammarError::QualifierAlreadyDefined)
    );
}

#[test]
fn test_array_initializer() {
    let outcome = parse("int a[2] = {1, 2};");
    assert_eq!(outcome.status, ParseStatus::Completed);
    let tree = &outcome.tree;
    let root = tree.root();
    assert_eq!(
        kinds(tree, root),
        vec![
            NodeKind::Datatype,
            NodeKind::Identifier,
            NodeKind::ArrayDefinition,
            NodeKind::Initialization,
            NodeKind::SentenceEnd,
        ]
    );

    let array = tree.children_of_kind(root, NodeKind::ArrayDefinition)[0];
    assert_eq!(
        kinds(tree, array),
        vec![NodeKind::OpenBracket, NodeKind::ExpressionToken, NodeKind::CloseBracket]
    );

    let init = tree.children_of_kind(root, NodeKind::Initialization)[0];
    let data = tree.children(init)[0];
    assert_eq!(
        kinds(tree, data),
        vec![
            NodeKind::OpenBrace,
            NodeKind::ArrayItem,
            NodeKind::ArrayItem,
            NodeKind::CloseBrace,
        ]
    );
    let values: Vec<&str> = tree
        .children_of_kind(data, NodeKind::ArrayItem)
        .into_iter()
        .map(|item| tree.children(item)[0])
        .filter_map(|token| tree.node(token).payload.as_deref())
        .collect();
    assert_eq!(values, vec!["1", "2"]);
}

#[test]
fn test_unexpected_brace() {
    let outcome = parse("int x = 1 };");
    assert_eq!(outcome.status, ParseStatus::Rejected(GrammarError::UnexpectedCloseBrace));
    let tree = &outcome.tree;
    let errors: Vec<_> = tree.diagnostics().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].payload.as_deref(), Some("}"));
    assert_eq!(errors[0].location.column, 11);
}

#[test]
fn test_function_parameter_scoping() {
    let outcome = parse("int f(int a, char b);");
    assert_eq!(
        outcome.status,
        ParseStatus::Unsupported(UnsupportedConstruct::FunctionForwardDeclaration)
    );

    let tree = &outcome.tree;
    let root = tree.root();
    let parameters = tree.children_of_kind(root, NodeKind::FunctionParameters)[0];
    assert_eq!(
        kinds(tree, parameters),
        vec![
            NodeKind::OpenParen,
            NodeKind::Datatype,
            NodeKind::Identifier,
            NodeKind::ParametersSeparator,
            NodeKind::Datatype,
            NodeKind::Identifier,
            NodeKind::CloseParen,
        ]
    );

    // each parameter is validated on its own
    let first = tree.children(parameters)[1];
    let second = tree.children(parameters)[4];
    assert_eq!(kinds(tree, first), vec![NodeKind::PrimitiveType]);
    assert_eq!(kinds(tree, second), vec![NodeKind::PrimitiveType]);

    assert_eq!(tree.last_child(root).map(|id| tree.kind(id)), Some(NodeKind::Error));
}

#[test]
fn test_parameter_comments_keep_sequences_apart() {
    let plain = parse("int f(int a, int b);");
    for source in [
        "int f(/* in */ int a, int b);",
        "int f(int a, /* second */ int b);",
        "int f(int a, // second\n int b);",
    ] {
        let commented = parse(source);
        assert_eq!(commented.status, plain.status, "{}", source);
        assert_eq!(commented.tree.diagnostics().count(), 1, "{}", source);
        assert_eq!(commented.tree.count(NodeKind::Identifier), 3, "{}", source);
    }
}

#[test]
fn test_composed_types() {
    let outcome = parse("struct point origin;\nenum color c;\nunion value *v;");
    assert_eq!(outcome.status, ParseStatus::Completed);
    let tree = &outcome.tree;
    let tags: Vec<(NodeKind, &str)> = tree
        .children_of_kind(tree.root(), NodeKind::Datatype)
        .into_iter()
        .map(|datatype| tree.children(datatype)[0])
        .map(|composed| {
            let children = tree.children(composed);
            let marker = tree.kind(children[0]);
            let tag = tree.node(children[1]).payload.as_deref().unwrap_or("");
            (marker, tag)
        })
        .collect();
    assert_eq!(
        tags,
        vec![
            (NodeKind::Struct, "point"),
            (NodeKind::Enum, "color"),
            (NodeKind::Union, "value"),
        ]
    );

    assert_eq!(
        parse("int struct s x;").status,
        ParseStatus::Rejected(GrammarError::ComposedOverDefinedType)
    );
    assert_eq!(
        parse("struct * p;").status,
        ParseStatus::Rejected(GrammarError::ExpectedTagName)
    );
}

#[test]
fn test_error_is_terminal() {
    let outcome = parse("float short x;\nint y;");
    assert_eq!(outcome.status, ParseStatus::Rejected(GrammarError::ModifierOnFloat));
    let tree = &outcome.tree;
    assert_eq!(tree.count(NodeKind::Datatype), 1);
    assert_eq!(tree.count(NodeKind::Identifier), 0);
    assert_eq!(tree.diagnostics().count(), 1);
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cdecl-tree-it-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn test_parse_file_source_and_header() {
    let root = scratch_dir("files");
    let include = root.join("include");
    fs::create_dir_all(&include).unwrap();
    fs::write(include.join("types.h"), "typedef unsigned int uint;\n").unwrap();
    let main = root.join("main.c");
    fs::write(&main, "#include \"types.h\"\nuint counter = 0;\n").unwrap();

    let outcome = parse_file(&main, &SearchPaths::new()).expect("source file should parse");
    assert_eq!(outcome.status, ParseStatus::Completed);
    assert_eq!(outcome.tree.kind(outcome.tree.root()), NodeKind::SourceUnit);

    let paths: SearchPaths = [include].into_iter().collect();
    let header = parse_file("types.h", &paths).expect("header should resolve");
    assert_eq!(header.status, ParseStatus::Completed);
    assert_eq!(header.tree.kind(header.tree.root()), NodeKind::HeaderUnit);

    assert!(matches!(
        parse_file("types.h", &SearchPaths::new()),
        Err(SourceError::NotFound { .. })
    ));
    assert!(matches!(
        parse_file(root.join("notes.md"), &paths),
        Err(SourceError::NotCFile { .. })
    ));

    let _ = fs::remove_dir_all(&root);
}
