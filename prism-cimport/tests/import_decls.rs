//! Walker + emitter: AST fixtures → the declarations file.

use std::collections::HashSet;

use prism_cimport::Importer;
use prism_cimport::ast::Node;
use prism_cimport::platform::Platform;
use serde_json::json;

fn import(nodes: serde_json::Value) -> (String, String) {
    let nodes: Vec<Node> = serde_json::from_value(nodes).expect("fixture nodes");
    let mut importer = Importer::new(Platform::Linux);
    let mut decls = Vec::new();
    let mut syms = Vec::new();
    importer
        .process_ast(
            "fixture",
            &nodes,
            &HashSet::new(),
            None,
            &mut decls,
            &mut syms,
        )
        .expect("import fixture");
    (
        String::from_utf8(decls).unwrap(),
        String::from_utf8(syms).unwrap(),
    )
}

#[test]
fn primitive_typedef_folds_to_canonical() {
    let (decls, _) = import(json!([
        {"kind": "TypedefDecl", "name": "u64", "inner": [
            {"kind": "BuiltinType", "type": {"qualType": "unsigned long long"}}
        ]}
    ]));
    assert!(
        decls.contains("export type u64 = uint64"),
        "typedef missing. Output:\n{decls}"
    );
}

#[test]
fn pointer_to_const_elides_the_qualifier() {
    let (decls, _) = import(json!([
        {"kind": "VarDecl", "name": "p", "type": {"qualType": "const int *"}}
    ]));
    assert!(
        decls.contains("export import var #extern p: *int"),
        "variable missing. Output:\n{decls}"
    );
}

#[test]
fn anonymous_struct_inlines_at_the_field_site() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x100", "tagUsed": "struct", "name": "Outer", "inner": [
            {"kind": "RecordDecl", "id": "0x101", "tagUsed": "struct", "inner": [
                {"kind": "FieldDecl", "name": "x", "type": {"qualType": "int"}}
            ]},
            {"kind": "FieldDecl", "name": "inner", "type": {
                "qualType": "struct (unnamed struct at /w.c:2:3)"
            }}
        ]}
    ]));
    assert!(
        decls.contains("export type Outer = struct { inner: struct { x: int; }; }"),
        "inline definition missing. Output:\n{decls}"
    );
    // The inner aggregate must not surface as its own type.
    assert_eq!(
        decls.matches("export type").count(),
        1,
        "anonymous aggregate printed at top level. Output:\n{decls}"
    );
}

#[test]
fn untagged_enum_members_become_constants() {
    let (decls, _) = import(json!([
        {"kind": "EnumDecl", "id": "0x5", "inner": [
            {"kind": "EnumConstantDecl", "name": "A"},
            {"kind": "EnumConstantDecl", "name": "B", "inner": [
                {"kind": "ConstantExpr", "inner": [{"kind": "IntegerLiteral", "value": "5"}]}
            ]},
            {"kind": "EnumConstantDecl", "name": "C"}
        ]}
    ]));
    assert!(decls.contains("export const A: int = 0"), "Output:\n{decls}");
    assert!(decls.contains("export const B: int = 5"), "Output:\n{decls}");
    assert!(decls.contains("export const C: int = B + 1"), "Output:\n{decls}");
    assert!(
        !decls.contains("export type"),
        "an untagged enum has no type to print. Output:\n{decls}"
    );
}

#[test]
fn tagged_enum_prints_its_definition() {
    let (decls, _) = import(json!([
        {"kind": "EnumDecl", "id": "0x6", "name": "color", "inner": [
            {"kind": "EnumConstantDecl", "name": "RED"},
            {"kind": "EnumConstantDecl", "name": "GREEN", "inner": [
                {"kind": "ConstantExpr", "inner": [{"kind": "IntegerLiteral", "value": "5"}]}
            ]},
            {"kind": "EnumConstantDecl", "name": "BLUE"}
        ]}
    ]));
    assert!(
        decls.contains("export type color = enum { RED; GREEN = 5; BLUE; }"),
        "Output:\n{decls}"
    );
}

#[test]
fn function_pointer_typedef() {
    let (decls, _) = import(json!([
        {"kind": "TypedefDecl", "name": "cmp_t", "inner": [
            {"kind": "PointerType", "type": {
                "qualType": "int (*)(const void *, const void *)"
            }}
        ]}
    ]));
    assert!(
        decls.contains("export type cmp_t = def (*, *) -> (int)"),
        "Output:\n{decls}"
    );
}

#[test]
fn dll_imported_function_carries_the_attribute() {
    let (decls, syms) = import(json!([
        {"kind": "FunctionDecl", "name": "beep", "type": {"qualType": "int (unsigned long)"}, "inner": [
            {"kind": "ParmVarDecl", "name": "freq", "type": {"qualType": "unsigned long"}},
            {"kind": "DLLImportAttr"}
        ]}
    ]));
    assert!(
        decls.contains("export import def #extern #dllimport beep(freq: ulong) -> int"),
        "Output:\n{decls}"
    );
    assert!(
        syms.contains("dllimport = true, name = \"beep\"}"),
        "dll-imported entry must omit the address slot. Output:\n{syms}"
    );
}

#[test]
fn variadic_function_keeps_the_ellipsis_last() {
    let (decls, _) = import(json!([
        {"kind": "FunctionDecl", "name": "printf", "variadic": true,
         "type": {"qualType": "int (const char *, ...)"}, "inner": [
            {"kind": "ParmVarDecl", "name": "fmt", "type": {"qualType": "const char *"}}
        ]}
    ]));
    assert!(
        decls.contains("export import def #extern printf(fmt: *char, ...) -> int"),
        "Output:\n{decls}"
    );
}

#[test]
fn void_return_is_elided() {
    let (decls, _) = import(json!([
        {"kind": "FunctionDecl", "name": "srand", "type": {"qualType": "void (unsigned int)"}, "inner": [
            {"kind": "ParmVarDecl", "name": "seed", "type": {"qualType": "unsigned int"}}
        ]}
    ]));
    assert!(
        decls.contains("export import def #extern srand(seed: uint)\n"),
        "Output:\n{decls}"
    );
}

#[test]
fn static_and_inline_functions_are_skipped() {
    let (decls, syms) = import(json!([
        {"kind": "FunctionDecl", "name": "internal", "storageClass": "static",
         "type": {"qualType": "void (void)"}},
        {"kind": "FunctionDecl", "name": "fastpath", "inline": true,
         "type": {"qualType": "int (int)"}, "inner": [
            {"kind": "ParmVarDecl", "name": "x", "type": {"qualType": "int"}}
        ]}
    ]));
    assert!(!decls.contains("internal"), "Output:\n{decls}");
    assert!(!decls.contains("fastpath"), "Output:\n{decls}");
    assert!(syms.contains("export var __SYMBOLS: [0; symbol::Symbol]"));
}

#[test]
fn reserved_words_are_escaped_in_argument_names() {
    let (decls, _) = import(json!([
        {"kind": "FunctionDecl", "name": "seek", "type": {"qualType": "int (int, void *, long)"}, "inner": [
            {"kind": "ParmVarDecl", "name": "type", "type": {"qualType": "int"}},
            {"kind": "ParmVarDecl", "name": "in", "type": {"qualType": "void *"}},
            {"kind": "ParmVarDecl", "name": "from", "type": {"qualType": "long"}}
        ]}
    ]));
    assert!(
        decls.contains("export import def #extern seek(type_: int, in_: *, from_: long) -> int"),
        "Output:\n{decls}"
    );
}

#[test]
fn unnamed_parameters_are_numbered() {
    let (decls, _) = import(json!([
        {"kind": "FunctionDecl", "name": "hook", "type": {"qualType": "void (int, char *)"}, "inner": [
            {"kind": "ParmVarDecl", "type": {"qualType": "int"}},
            {"kind": "ParmVarDecl", "type": {"qualType": "char *"}}
        ]}
    ]));
    assert!(
        decls.contains("export import def #extern hook(_0: int, _1: *char)\n"),
        "Output:\n{decls}"
    );
}

#[test]
fn bitfields_carry_their_width() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x3", "tagUsed": "struct", "name": "flags", "inner": [
            {"kind": "FieldDecl", "name": "ready", "isBitfield": true,
             "type": {"qualType": "unsigned int"},
             "inner": [{"kind": "IntegerLiteral", "value": "3"}]},
            {"kind": "FieldDecl", "isBitfield": true,
             "type": {"qualType": "unsigned int"},
             "inner": [{"kind": "IntegerLiteral", "value": "2"}]}
        ]}
    ]));
    assert!(
        decls.contains("export type flags = struct { #bits(3) ready: uint; #bits(2) : uint; }"),
        "Output:\n{decls}"
    );
}

#[test]
fn unnamed_fields_take_their_ordinal() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x8", "tagUsed": "union", "name": "value", "inner": [
            {"kind": "RecordDecl", "id": "0x9", "tagUsed": "struct", "inner": [
                {"kind": "FieldDecl", "name": "lo", "type": {"qualType": "unsigned int"}},
                {"kind": "FieldDecl", "name": "hi", "type": {"qualType": "unsigned int"}}
            ]},
            {"kind": "FieldDecl", "type": {
                "qualType": "struct (unnamed struct at /v.c:3:5)"
            }},
            {"kind": "FieldDecl", "name": "word", "type": {"qualType": "unsigned long long"}}
        ]}
    ]));
    assert!(
        decls.contains(
            "export type value = struct #union { _1: struct { lo: uint; hi: uint; }; word: uint64; }"
        ),
        "Output:\n{decls}"
    );
}

#[test]
fn typedef_binding_an_owned_tag_prints_once_under_the_typedef() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x1", "tagUsed": "struct", "name": "point_s", "inner": [
            {"kind": "FieldDecl", "name": "x", "type": {"qualType": "int"}},
            {"kind": "FieldDecl", "name": "y", "type": {"qualType": "int"}}
        ]},
        {"kind": "TypedefDecl", "name": "Point", "inner": [
            {"kind": "ElaboratedType", "type": {"qualType": "struct point_s"},
             "ownedTagDecl": {"id": "0x1"}}
        ]}
    ]));
    assert!(
        decls.contains("export type Point = struct { x: int; y: int; }"),
        "Output:\n{decls}"
    );
    assert!(
        !decls.contains("export type point_s"),
        "the tag form must not print separately. Output:\n{decls}"
    );
    assert_eq!(decls.matches("export type").count(), 1, "Output:\n{decls}");
}

#[test]
fn typedef_owning_an_untagged_record_adopts_the_name() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x2", "tagUsed": "struct", "inner": [
            {"kind": "FieldDecl", "name": "fd", "type": {"qualType": "int"}}
        ]},
        {"kind": "TypedefDecl", "name": "Handle", "inner": [
            {"kind": "ElaboratedType", "type": {"qualType": "Handle"},
             "ownedTagDecl": {"id": "0x2"}}
        ]},
        {"kind": "VarDecl", "name": "stdin_handle", "type": {"qualType": "struct Handle *"}}
    ]));
    assert!(
        decls.contains("export type Handle = struct { fd: int; }"),
        "Output:\n{decls}"
    );
    assert!(
        decls.contains("export import var #extern stdin_handle: *Handle"),
        "tag references must resolve to the adopted name. Output:\n{decls}"
    );
    assert_eq!(decls.matches("export type").count(), 1, "Output:\n{decls}");
}

#[test]
fn self_referential_record_prints_exactly_once() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x4", "tagUsed": "struct", "name": "node", "inner": [
            {"kind": "FieldDecl", "name": "value", "type": {"qualType": "int"}},
            {"kind": "FieldDecl", "name": "next", "type": {"qualType": "struct node *"}}
        ]}
    ]));
    assert!(
        decls.contains("export type node = struct { value: int; next: *node; }"),
        "Output:\n{decls}"
    );
    assert_eq!(decls.matches("export type node").count(), 1, "Output:\n{decls}");
}

#[test]
fn forward_declared_record_prints_without_a_body() {
    let (decls, _) = import(json!([
        {"kind": "RecordDecl", "id": "0x7", "tagUsed": "struct", "name": "internal"},
        {"kind": "VarDecl", "name": "handle", "type": {"qualType": "struct internal *"}}
    ]));
    assert!(decls.contains("export type internal\n"), "Output:\n{decls}");
    assert!(
        decls.contains("export import var #extern handle: *internal"),
        "Output:\n{decls}"
    );
}

#[test]
fn desugared_type_is_preferred_over_the_sugared_spelling() {
    let (decls, _) = import(json!([
        {"kind": "VarDecl", "name": "count", "type": {
            "qualType": "u32", "desugaredQualType": "unsigned int"
        }}
    ]));
    assert!(
        decls.contains("export import var #extern count: uint"),
        "Output:\n{decls}"
    );
}

#[test]
fn sections_are_ordered_constants_types_functions_variables() {
    let (decls, _) = import(json!([
        {"kind": "VarDecl", "name": "errno_value", "type": {"qualType": "int"}},
        {"kind": "FunctionDecl", "name": "reset", "type": {"qualType": "void (void)"}},
        {"kind": "TypedefDecl", "name": "u8", "inner": [
            {"kind": "BuiltinType", "type": {"qualType": "unsigned char"}}
        ]},
        {"kind": "EnumDecl", "id": "0xa", "inner": [
            {"kind": "EnumConstantDecl", "name": "OK"}
        ]}
    ]));
    let constant = decls.find("export const OK").expect("constant present");
    let type_line = decls.find("export type u8").expect("type present");
    let function = decls.find("export import def").expect("function present");
    let variable = decls.find("export import var").expect("variable present");
    assert!(
        constant < type_line && type_line < function && function < variable,
        "sections out of order. Output:\n{decls}"
    );
}
