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
mod eval_tests {
    use super::*;
    use ecmalite::{Engine, JSErrorKind};

    #[test]
    fn test_eval_sees_caller_scope() {
        assert_eq!(eval("function f() { var local = 5; return eval('local * 2'); } f()"), "10");
        assert_eq!(eval("var x = 'outer'; function f() { var x = 'inner'; return eval('x'); } f()"), "inner");
        assert_eq!(eval("var o = { m: function () { return eval('this === o'); } }; o.m()"), "true");
    }

    #[test]
    fn test_eval_declares_in_caller_variables() {
        assert_eq!(eval("function f() { eval('var made = 3'); return made; } f()"), "3");
        assert_eq!(eval("function f() { eval('var hidden = 1'); } f(); typeof hidden"), "undefined");
        assert_eq!(eval("eval('function g() { return 4; }'); g()"), "4");
    }

    #[test]
    fn test_eval_declarations_are_deletable() {
        assert_eq!(eval("eval('var d = 1'); delete d"), "true");
        assert_eq!(eval("eval('var d = 1'); delete d; typeof d"), "undefined");
        assert_eq!(eval("var kept = 1; delete kept"), "false");
    }

    #[test]
    fn test_non_string_argument_is_returned_unchanged() {
        assert_eq!(eval("eval(42)"), "42");
        assert_eq!(eval("var o = {}; eval(o) === o"), "true");
        assert_eq!(eval("typeof eval()"), "undefined");
    }

    #[test]
    fn test_completion_value() {
        assert_eq!(eval("eval('1; 2; 3')"), "3");
        assert_eq!(eval("typeof eval('')"), "undefined");
        assert_eq!(eval("eval('if (true) { \"yes\" }')"), "yes");
    }

    #[test]
    fn test_syntax_error_in_eval_is_catchable() {
        assert_eq!(eval("try { eval('var = ;'); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("try { eval(\"throw 'e1'\"); } catch (e) { e }"), "e1");
    }

    #[test]
    fn test_errors_inside_eval_name_the_eval_source() {
        let mut engine = Engine::new();
        let err = engine.evaluate("var a = 1;\neval('missing');", "main.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
        assert_eq!(err.js_file(), Some("main.js (eval)"));
        assert_eq!(err.js_line(), Some(1));
    }

    #[test]
    fn test_nested_eval() {
        assert_eq!(eval("var n = 2; eval('eval(\"n * 21\")')"), "42");
    }
}
