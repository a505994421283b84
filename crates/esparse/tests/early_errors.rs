//! Integration tests for early errors, grouped by feature area.

use esparse::{
    parse_module, parse_script, parse_source, to_estree, Context, ErrorCode, ErrorKind,
    ParseError, ParserOptions,
};

fn script_err(source: &str) -> ParseError {
    match parse_script(source, &ParserOptions::default()) {
        Ok(_) => panic!("expected {source:?} to fail"),
        Err(err) => err,
    }
}

fn script_ok(source: &str) {
    if let Err(err) = parse_script(source, &ParserOptions::default()) {
        panic!("expected {source:?} to parse, got {err}");
    }
}

fn module_ok(source: &str) {
    if let Err(err) = parse_module(source, &ParserOptions::default()) {
        panic!("expected {source:?} to parse as a module, got {err}");
    }
}

fn module_err(source: &str) -> ParseError {
    match parse_module(source, &ParserOptions::default()) {
        Ok(_) => panic!("expected {source:?} to fail as a module"),
        Err(err) => err,
    }
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_unary_exponent_operand() {
    assert_eq!(script_err("-x ** y").kind(), ErrorKind::UnexpectedToken);
    script_err("typeof a ** b");
    script_ok("(-x) ** y");
    script_ok("x ** -y");
}

#[test]
fn test_nullish_mixing() {
    script_err("a ?? b || c");
    script_err("a && b ?? c");
    script_ok("(a ?? b) || c");
    script_ok("a ?? (b && c)");
}

// =============================================================================
// Strict mode
// =============================================================================

#[test]
fn test_retroactive_strictness() {
    assert_eq!(
        script_err("\"use strict\"; function f(eval){}").code,
        ErrorCode::StrictEvalArguments
    );
    assert_eq!(
        script_err("function f(eval){ \"use strict\"; }").code,
        ErrorCode::StrictEvalArguments
    );
    script_ok("function f(eval){}");
}

#[test]
fn test_yield_reserved_in_strict_code() {
    let err = module_err("yield");
    assert_eq!(err.kind(), ErrorKind::StrictMode);
    let options = ParserOptions::default();
    assert!(parse_source("yield", &options, Context::STRICT).is_err());
    script_ok("yield");
}

#[test]
fn test_legacy_for_in_initializer() {
    let source = "for (var a = 0 in {});";
    script_ok(source);
    let options = ParserOptions::default();
    assert!(parse_source(source, &options, Context::STRICT).is_err());
    script_err("for (let a = 0 in {});");
    script_err("for (var [a] = 0 in {});");
}

#[test]
fn test_for_in_of_left_side() {
    assert_eq!(
        script_err("for (x = 0 in y);").code,
        ErrorCode::ForInOfInitializer("in")
    );
    assert_eq!(
        script_err("for ([a] = 0 in y);").code,
        ErrorCode::ForInOfInitializer("in")
    );
    assert_eq!(
        script_err("for (x = 0 of y);").code,
        ErrorCode::ForInOfInitializer("of")
    );
    assert_eq!(
        script_err("for ((x = 0) in y);").code,
        ErrorCode::ParenthesizedPattern
    );
    script_err("for (({a}) of y);");
    script_ok("for ((x) in y);");
    script_ok("for ((x.y) of z);");
    script_ok("for ([a = 1] of y);");
}

#[test]
fn test_for_await_declaration_head() {
    assert_eq!(
        module_err("for await (const a in b);").code,
        ErrorCode::ForAwaitWithoutOf
    );
    assert_eq!(
        module_err("for await (let a = 0;;);").code,
        ErrorCode::ForAwaitWithoutOf
    );
    module_ok("for await (const a of b);");
}

#[test]
fn test_octal_escape_in_strict_directive() {
    let err = script_err("'use strict'; function f(){ \"\\0\"; }");
    assert_eq!(err.code, ErrorCode::StrictOctalEscape);
    script_ok("function f(){ \"\\0\"; }");
}

#[test]
fn test_strict_only_errors() {
    let strict = |body: &str| script_err(&format!("'use strict'; {body}"));
    assert_eq!(strict("with (a) {}").code, ErrorCode::StrictWith);
    assert_eq!(strict("delete x;").code, ErrorCode::StrictDelete);
    assert_eq!(strict("010;").code, ErrorCode::StrictOctalLiteral);
    assert_eq!(strict("var let;").kind(), ErrorKind::StrictMode);
    assert_eq!(strict("eval = 1;").code, ErrorCode::StrictEvalArguments);
    script_ok("with (a) {} delete x; 010; var let; eval = 1;");
}

// =============================================================================
// Bindings and scopes
// =============================================================================

#[test]
fn test_lexical_redeclaration() {
    assert_eq!(
        script_err("let x; let x;").code,
        ErrorCode::Redeclaration("x".into())
    );
    script_err("let x; var x;");
    script_err("const x = 1; function x() {}");
    script_ok("let x; { let x; }");
    script_ok("var x; var x;");
    script_ok("function f() {} var f;");
}

#[test]
fn test_redeclaration_span() {
    let err = script_err("let a;\nconst a = 1;");
    assert_eq!(err.span.start, 13);
    assert_eq!(err.loc.start.line, 2);
    assert_eq!(err.loc.start.column, 6);
}

#[test]
fn test_catch_parameter_conflicts() {
    script_err("try {} catch (e) { let e; }");
    script_ok("try {} catch (e) { var e; }");
    script_err("try {} catch ([e]) { var e; }");
}

#[test]
fn test_invalid_targets() {
    assert_eq!(script_err("1 = a;").kind(), ErrorKind::PatternValidation);
    script_err("a + b = c;");
    script_err("++a++;");
    script_err("[...a, b] = c;");
    script_err("({a: 1} = b);");
    script_ok("[a.b, c[d]] = e;");
}

#[test]
fn test_cover_grammar_leftovers() {
    script_err("({a = 1});");
    script_ok("({a = 1} = b);");
    script_err("(a, b,) ;");
    script_ok("(a, b,) => a;");
    script_err("({__proto__: a, __proto__: b});");
    script_ok("({__proto__: a, __proto__: b} = c);");
}

// =============================================================================
// Functions and classes
// =============================================================================

#[test]
fn test_yield_and_await_positions() {
    script_err("function* g(a = yield) {}");
    script_err("async function f(a = await b) {}");
    script_err("async (a = await b) => a;");
    script_ok("function* g() { yield* other(); }");
    script_ok("var await; async function f() { await x; }");
    module_ok("await x;");
    script_err("async function f() { var await; }");
}

#[test]
fn test_super_and_new_target() {
    script_err("function f() { super.x; }");
    script_err("class A { constructor() { super(); } }");
    script_ok("class A extends B { constructor() { super(); } }");
    script_ok("({ m() { return super.m(); } })");
    script_err("new.target;");
    script_ok("function f() { return new.target; }");
}

#[test]
fn test_private_names() {
    script_err("class A { #x; #x; }");
    script_err("class A { m() { this.#y; } }");
    script_ok("class A { get #x() {} set #x(v) {} }");
    script_ok("class A { m() { class B { n() { this.#x; } } } #x; }");
    script_err("class A { #x; m() { delete this.#x; } }");
}

#[test]
fn test_class_constructor_rules() {
    script_err("class A { constructor() {} constructor() {} }");
    script_err("class A { get constructor() {} }");
    script_err("class A { *constructor() {} }");
    script_err("class A { static prototype() {} }");
    script_ok("class A { static constructor() {} }");
}

// =============================================================================
// Modules
// =============================================================================

#[test]
fn test_module_exports() {
    module_ok("export { a as default }; var a;");
    assert_eq!(
        module_err("export { a };").code,
        ErrorCode::UndeclaredExport("a".into())
    );
    assert_eq!(
        module_err("export var a; export { a };").code,
        ErrorCode::DuplicateExport("a".into())
    );
    module_err("export default 1; export default 2;");
    module_ok("export * from 'a'; export * from 'b';");
}

#[test]
fn test_module_goal() {
    module_err("<!-- comment");
    module_err("with (a) {}");
    module_err("var await;");
    script_err("import a from 'a';");
    script_ok("import('a');");
}

// =============================================================================
// Resources
// =============================================================================

#[test]
fn test_max_depth() {
    let options = ParserOptions {
        max_depth: 50,
        ..ParserOptions::default()
    };
    let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    let err = parse_script(&source, &options).unwrap_err();
    assert_eq!(err.code, ErrorCode::MaxRecursionDepth);
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert!(parse_script(&source, &ParserOptions::default()).is_ok());
}

#[test]
fn test_long_chains_hit_depth_limit() {
    let options = ParserOptions::default();
    for source in [
        format!("{}a", "a+".repeat(100_000)),
        format!("x = {}'a';", "'a'+".repeat(100_000)),
        format!("a{}", ".b".repeat(100_000)),
        format!("f{}", "()".repeat(100_000)),
    ] {
        let err = parse_script(&source, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxRecursionDepth);
    }
}

#[test]
fn test_deep_input_converts_to_estree() {
    let options = ParserOptions::default();

    let source = format!("{}a;", "a + ".repeat(1000));
    let program = parse_script(&source, &options).unwrap();
    let json = to_estree(&program, &source, &options);
    let mut node = &json["body"][0]["expression"];
    let mut depth = 0;
    while node["type"] == "BinaryExpression" {
        node = &node["left"];
        depth += 1;
    }
    assert_eq!(depth, 1000);

    let source = format!("{}{};", "[".repeat(400), "]".repeat(400));
    let program = parse_script(&source, &options).unwrap();
    let json = to_estree(&program, &source, &options);
    let mut node = &json["body"][0]["expression"];
    let mut depth = 0;
    while node["type"] == "ArrayExpression" {
        node = &node["elements"][0];
        depth += 1;
    }
    assert_eq!(depth, 400);
}
