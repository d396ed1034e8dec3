use ecmalite::evaluate_script;

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
// Using `ctor` ensures initialization runs before tests start.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[cfg(test)]
mod control_flow_tests {
    use super::*;
    use ecmalite::{Engine, EngineConfig, JSErrorKind};

    #[test]
    fn test_if_else_chain() {
        let script = "function grade(n) { if (n > 90) return 'a'; else if (n > 50) return 'b'; else return 'c'; } grade(95) + grade(60) + grade(1)";
        assert_eq!(eval(script), "abc");
    }

    #[test]
    fn test_while_and_do_while() {
        assert_eq!(eval("var s = 0; var i = 0; while (i < 5) { s += i; i++; } s"), "10");
        assert_eq!(eval("var i = 10; do { i++; } while (i < 5); i"), "11");
        assert_eq!(eval("var i = 0; do i += 2; while (i < 7); i"), "8");
    }

    #[test]
    fn test_for_with_break_and_continue() {
        let script = "var s = 0; for (var i = 0; i < 10; i++) { if (i % 2) continue; if (i > 6) break; s += i; } s";
        assert_eq!(eval(script), "12");
        assert_eq!(eval("var n = 0; for (;;) { if (++n == 3) break; } n"), "3");
    }

    #[test]
    fn test_labeled_loops() {
        let script = r#"
            var n = 0;
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j == 1) continue outer;
                    if (i == 2) break outer;
                    n++;
                }
            }
            n + ':' + i
        "#;
        assert_eq!(eval(script), "2:2");
        assert_eq!(eval("var r = 'start'; block: { r = 'inside'; break block; r = 'unreachable'; } r"), "inside");
    }

    #[test]
    fn test_switch_uses_loose_equality() {
        let script = r#"
            function f(x) {
                switch (x) {
                    case 1: return 'one';
                    case '2': return 'two';
                    default: return 'other';
                }
            }
            f(1) + f(2) + f(3)
        "#;
        assert_eq!(eval(script), "onetwoother");
    }

    #[test]
    fn test_switch_fallthrough_and_default_position() {
        let script = "var r = ''; switch (2) { case 1: r += 'a'; case 2: r += 'b'; case 3: r += 'c'; break; case 4: r += 'd'; } r";
        assert_eq!(eval(script), "bc");
        let script = "var r = ''; switch (9) { case 1: r += 'a'; default: r += 'd'; case 2: r += 'b'; } r";
        assert_eq!(eval(script), "db");
        let script = "var r = 'none'; switch (9) { case 1: r = 'a'; } r";
        assert_eq!(eval(script), "none");
    }

    #[test]
    fn test_break_inside_switch_inside_loop() {
        let script = "var n = 0; for (var i = 0; i < 4; i++) { switch (i) { case 2: continue; default: break; } n++; } n";
        assert_eq!(eval(script), "3");
    }

    #[test]
    fn test_for_in_visits_own_enumerable_keys() {
        assert_eq!(eval("var o = { a: 1, b: 2, c: 3 }; var keys = ''; for (var k in o) { keys += k; } keys"), "abc");
        assert_eq!(eval("var a = [5, 6]; var s = ''; for (var i in a) s += i; s"), "01");
        let script = "function P() { this.own = 1; } P.prototype.inherited = 2; var s = ''; for (var k in new P()) s += k; s";
        assert_eq!(eval(script), "own");
        assert_eq!(eval("var o = { x: 1 }; var t; for (t in o) ; t"), "x");
    }

    #[test]
    fn test_for_in_iterates_a_snapshot() {
        let script = "var o = { a: 1, b: 2 }; var n = 0; for (var k in o) { o['x' + n] = n; n++; } n";
        assert_eq!(eval(script), "2");
        let script = "var o = { a: 1, b: 2 }; var seen = ''; for (var k in o) { delete o.b; seen += k; } seen";
        assert_eq!(eval(script), "ab");
    }

    #[test]
    fn test_for_in_over_null_runs_zero_times() {
        assert_eq!(eval("var n = 0; for (var k in null) n++; for (var k in undefined) n++; n"), "0");
        assert_eq!(eval("var s = ''; for (var i in 'ab') s += i; s"), "01");
    }

    #[test]
    fn test_with_statement() {
        assert_eq!(eval("var o = { a: 1 }; with (o) { a = 5; } o.a"), "5");
        assert_eq!(eval("var o = { a: 1 }; var b = 2; with (o) { b = a + b; } b"), "3");
        let err = evaluate_script("with (null) {}", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_loop_iteration_limit() {
        let config = EngineConfig {
            max_loop_iterations: Some(1000),
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config);
        let err = engine.evaluate("while (true) {}", "loop.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::InfiniteLoopError { iterations: 1000 }));

        // A bounded loop under the limit still runs to completion.
        let value = engine.evaluate_to_string("var n = 0; for (var i = 0; i < 999; i++) n++; n", "ok.js", 1).unwrap();
        assert_eq!(value, "999");
    }

    #[test]
    fn test_loop_limit_is_not_catchable() {
        let config = EngineConfig {
            max_loop_iterations: Some(50),
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config);
        let err = engine
            .evaluate("var r = 'none'; try { for (;;) {} } catch (e) { r = 'caught'; } finally { r = 'finally'; }", "loop.js", 1)
            .unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::InfiniteLoopError { .. }));
        assert_eq!(engine.evaluate_to_string("r", "check.js", 1).unwrap(), "none");
    }

    #[test]
    fn test_debugger_statement_is_ignored() {
        assert_eq!(eval("var x = 1; debugger; x + 1"), "2");
    }
}
