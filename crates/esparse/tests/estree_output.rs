//! Integration tests for the ESTree JSON produced by `to_estree`.

use esparse::{parse_module, parse_script, to_estree, ParserOptions};
use serde_json::{json, Value};

fn script(source: &str) -> Value {
    let options = ParserOptions::default();
    let program = parse_script(source, &options).expect("source should parse");
    to_estree(&program, source, &options)
}

fn first_expression(source: &str) -> Value {
    script(source)["body"][0]["expression"].clone()
}

fn without_positions(mut value: Value) -> Value {
    fn strip(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for key in ["start", "end", "range"] {
                    map.remove(key);
                }
                map.values_mut().for_each(strip);
            }
            Value::Array(items) => items.iter_mut().for_each(strip),
            _ => {}
        }
    }
    strip(&mut value);
    value
}

#[test]
fn test_exponent_literal_operands() {
    let expr = first_expression("2 ** 4");
    assert_eq!(expr["type"], "BinaryExpression");
    assert_eq!(expr["operator"], "**");
    assert_eq!(expr["left"]["value"], 2);
    assert_eq!(expr["right"]["value"], 4);
}

#[test]
fn test_exponent_is_right_associative() {
    let expr = first_expression("a ** b ** c");
    assert_eq!(expr["left"]["name"], "a");
    assert_eq!(expr["right"]["type"], "BinaryExpression");
    assert_eq!(expr["right"]["left"]["name"], "b");
    assert_eq!(expr["right"]["right"]["name"], "c");
}

#[test]
fn test_async_arrow() {
    let expr = first_expression("async (a, b) => a");
    assert_eq!(expr["type"], "ArrowFunctionExpression");
    assert_eq!(expr["async"], true);
    assert_eq!(expr["expression"], true);
    let params = expr["params"].as_array().expect("params array");
    assert_eq!(params.len(), 2);
    assert!(params.iter().all(|param| param["type"] == "Identifier"));
}

#[test]
fn test_optional_chain_wrapping() {
    let expr = first_expression("a?.b.c");
    assert_eq!(expr["type"], "ChainExpression");
    let outer = &expr["expression"];
    assert_eq!(outer["type"], "MemberExpression");
    assert_eq!(outer["optional"], false);
    assert_eq!(outer["object"]["type"], "MemberExpression");
    assert_eq!(outer["object"]["optional"], true);

    assert_eq!(first_expression("a.b.c")["type"], "MemberExpression");
    assert_eq!(first_expression("a?.()")["type"], "ChainExpression");
    assert_eq!(first_expression("(a?.b).c")["type"], "MemberExpression");
}

#[test]
fn test_arrow_head_reinterpretation() {
    let arrow = first_expression("(a, {b} = c) => b");
    assert_eq!(arrow["type"], "ArrowFunctionExpression");
    assert_eq!(arrow["params"][0]["type"], "Identifier");
    assert_eq!(arrow["params"][1]["type"], "AssignmentPattern");
    assert_eq!(arrow["params"][1]["left"]["type"], "ObjectPattern");

    let sequence = first_expression("(a, {b} = c)");
    assert_eq!(sequence["type"], "SequenceExpression");
    let assign = &sequence["expressions"][1];
    assert_eq!(assign["type"], "AssignmentExpression");
    assert_eq!(assign["left"]["type"], "ObjectPattern");
}

#[test]
fn test_ranges_only_add_positions() {
    let source = r#"
        'use strict';
        class A extends B { static #x = 1; m() { return super.m?.(...args); } }
        for (const [k, v = 1] of map) label: { break label; }
        let re = /a|b/giu, big = 12n, t = tag`a${b}c`;
    "#;
    let plain = ParserOptions::default();
    let ranged = ParserOptions {
        ranges: true,
        ..ParserOptions::default()
    };
    let program = parse_script(source, &plain).expect("source should parse");
    let with_ranges = to_estree(&program, source, &ranged);
    assert_eq!(without_positions(with_ranges), to_estree(&program, source, &plain));
}

#[test]
fn test_locations_count_characters() {
    let source = "'ä';\nx";
    let options = ParserOptions {
        loc: true,
        ranges: true,
        ..ParserOptions::default()
    };
    let program = parse_script(source, &options).expect("source should parse");
    let tree = to_estree(&program, source, &options);
    let literal = &tree["body"][0]["expression"];
    assert_eq!(literal["end"], 4);
    assert_eq!(literal["loc"]["end"], json!({ "line": 1, "column": 3 }));
    assert_eq!(tree["body"][1]["loc"]["start"], json!({ "line": 2, "column": 0 }));
}

#[test]
fn test_template_elements() {
    let expr = first_expression("`a\\n${b}c`");
    assert_eq!(expr["type"], "TemplateLiteral");
    assert_eq!(expr["quasis"][0]["value"], json!({ "raw": "a\\n", "cooked": "a\n" }));
    assert_eq!(expr["quasis"][0]["tail"], false);
    assert_eq!(expr["quasis"][1]["tail"], true);

    let tagged = first_expression("tag`\\unicode`");
    assert_eq!(tagged["type"], "TaggedTemplateExpression");
    assert_eq!(tagged["quasi"]["quasis"][0]["value"]["cooked"], Value::Null);
}

#[test]
fn test_module_output() {
    let source = "import x from 'a' with { type: 'json' };\nexport const y = import.meta;";
    let options = ParserOptions::default();
    let program = parse_module(source, &options).expect("source should parse");
    let tree = to_estree(&program, source, &options);
    assert_eq!(tree["sourceType"], "module");
    let attribute = &tree["body"][0]["attributes"][0];
    assert_eq!(attribute["type"], "ImportAttribute");
    assert_eq!(attribute["key"]["name"], "type");
    assert_eq!(attribute["value"]["value"], "json");
    let declaration = &tree["body"][1]["declaration"];
    assert_eq!(declaration["type"], "VariableDeclaration");
    assert_eq!(declaration["declarations"][0]["init"]["type"], "MetaProperty");
}

#[test]
fn test_dynamic_import() {
    let expr = first_expression("import('a', { with: {} })");
    assert_eq!(expr["type"], "ImportExpression");
    assert_eq!(expr["source"]["value"], "a");
    assert_eq!(expr["options"]["type"], "ObjectExpression");
}

#[test]
fn test_object_literal_members() {
    let expr = first_expression("({ a, b: 1, get c() {}, [d]() {}, ...e })");
    let properties = expr["properties"].as_array().expect("properties array");
    assert_eq!(properties[0]["shorthand"], true);
    assert_eq!(properties[1]["shorthand"], false);
    assert_eq!(properties[2]["kind"], "get");
    assert_eq!(properties[3]["method"], true);
    assert_eq!(properties[3]["computed"], true);
    assert_eq!(properties[4]["type"], "SpreadElement");
}
