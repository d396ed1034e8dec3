use ecmalite::evaluate_script;

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[cfg(test)]
mod function_tests {
    use super::*;
    use ecmalite::JSErrorKind;

    #[test]
    fn test_closures_keep_private_state() {
        let script = r#"
            function makeCounter() { var n = 0; return function () { n = n + 1; return n; }; }
            var c = makeCounter();
            var d = makeCounter();
            var first = c();
            var second = c();
            d();
            first + ',' + second + ',' + c() + ',' + d()
        "#;
        assert_eq!(eval(script), "1,2,3,2");
    }

    #[test]
    fn test_closure_sees_later_writes_to_parent_scope() {
        let script = "var x = 1; function get() { return x; } x = 2; get()";
        assert_eq!(eval(script), "2");
    }

    #[test]
    fn test_recursion() {
        let script = "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)";
        assert_eq!(eval(script), "610");
    }

    #[test]
    fn test_declarations_are_hoisted() {
        assert_eq!(eval("var r = f(); function f() { return 'hoisted'; } r"), "hoisted");
        assert_eq!(eval("var r = typeof v; var v = 1; r"), "undefined");
        assert_eq!(eval("function f() { return typeof inner; function inner() {} } f()"), "function");
    }

    #[test]
    fn test_arguments_object() {
        assert_eq!(eval("function f() { return arguments.length + ':' + arguments[1]; } f(1, 'b', 3)"), "3:b");
        assert_eq!(eval("function f(a, b) { return b; } f(1)"), "undefined");
        assert_eq!(eval("function f() { return arguments.callee === f; } f()"), "true");
        assert_eq!(
            eval("function f() { var s = ''; for (var k in arguments) s += k; return s; } f('x', 'y')"),
            "01"
        );
    }

    #[test]
    fn test_function_length_and_prototype() {
        assert_eq!(eval("function f(a, b, c) {} f.length"), "3");
        assert_eq!(eval("function f() {} f.prototype.constructor === f"), "true");
        assert_eq!(eval("function f() {} var s = ''; for (var k in f.prototype) s += k; s"), "");
    }

    #[test]
    fn test_named_function_expression() {
        let script = "var g = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }; g(5)";
        assert_eq!(eval(script), "120");
        assert_eq!(eval("var h = function inner() {}; typeof inner"), "undefined");
        assert_eq!(eval("var h = function self() { self = 1; return typeof self; }; h()"), "function");
    }

    #[test]
    fn test_nested_function_statement_binds_when_executed() {
        let script = "function f(flag) { if (flag) { function g() { return 'g'; } return g(); } return 'none'; } f(true) + f(false)";
        assert_eq!(eval(script), "gnone");
    }

    #[test]
    fn test_constructors_and_instanceof() {
        let script = r#"
            function P(x) { this.x = x; }
            P.prototype.get = function () { return this.x; };
            var p = new P(4);
            '' + p.get() + ',' + (p instanceof P) + ',' + (p instanceof Object) + ',' + ({} instanceof P)
        "#;
        assert_eq!(eval(script), "4,true,true,false");
    }

    #[test]
    fn test_constructor_returning_object_replaces_instance() {
        let script = "function Q() { this.a = 1; return { b: 2 }; } var q = new Q(); q.a + ',' + q.b";
        assert_eq!(eval(script), "undefined,2");
        let script = "function R() { this.a = 1; return 5; } new R().a";
        assert_eq!(eval(script), "1");
    }

    #[test]
    fn test_this_binding() {
        assert_eq!(eval("var name = 'g'; function f() { return this.name; } f()"), "g");
        assert_eq!(eval("var o = { name: 'o', f: function () { return this.name; } }; o.f()"), "o");
        assert_eq!(eval("var o = { name: 'o', f: function () { return this.name; } }; o['f']()"), "o");
    }

    #[test]
    fn test_call_and_apply() {
        let script = "function add(a, b) { return this.base + a + b; } var o = { base: 10 }; add.call(o, 1, 2) + ',' + add.apply(o, [3, 4])";
        assert_eq!(eval(script), "13,17");
        assert_eq!(eval("function n() { return arguments.length; } n.apply(null)"), "0");
    }

    #[test]
    fn test_function_to_string_returns_source() {
        assert_eq!(eval("function foo(a) { return a; }\nfoo.toString()"), "function foo(a) { return a; }");
        assert_eq!(eval("'' + function () { return 1; }"), "function () { return 1; }");
    }

    #[test]
    fn test_function_constructor() {
        assert_eq!(eval("var add = new Function('a', 'b', 'return a + b'); add(2, 3)"), "5");
        assert_eq!(eval("Function('return 7')()"), "7");
        let script = "var x = 'global'; function outer() { var x = 'local'; var f = new Function('return x'); return f(); } outer()";
        assert_eq!(eval(script), "global");
    }

    #[test]
    fn test_calling_non_function_is_type_error() {
        let err = evaluate_script("var o = {}; o.missing()", None::<&std::path::Path>).unwrap_err();
        match err.kind() {
            JSErrorKind::TypeError { message } => assert_eq!(message, "o.missing is not a function"),
            other => panic!("expected TypeError, got {other:?}"),
        }
        let err = evaluate_script("new 5", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_arguments_are_evaluated_before_callee_is_read() {
        let script = "var f = function () { return 'old'; }; f((f = function () { return 'new'; }, 0))";
        assert_eq!(eval(script), "new");
        let script = "var o = { m: function () { return this.tag; }, tag: 'o' }; o.m(o.m = function () { return 'swapped ' + this.tag; })";
        assert_eq!(eval(script), "swapped o");
    }

    #[test]
    fn test_unbounded_recursion_raises_range_error() {
        let err = evaluate_script("function r() { return r(); } r()", None::<&std::path::Path>).unwrap_err();
        match err.kind() {
            JSErrorKind::RangeError { message } => assert_eq!(message, "Maximum call stack size exceeded"),
            other => panic!("expected RangeError, got {other:?}"),
        }
        assert_eq!(eval("function r() { return r(); } try { r(); } catch (e) { e instanceof RangeError }"), "true");
    }
}
