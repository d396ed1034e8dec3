use ecmalite::{Engine, EngineConfig, EvalError, ExecutionContext, JSErrorKind, MutationContext, ScriptValue, Value, to_number};

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
// Using `ctor` ensures initialization runs before tests start.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn host_sum<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let mut total = 0.0;
    for arg in args {
        total += to_number(mc, cx, arg)?;
    }
    Ok(Value::Number(total))
}

fn host_fail<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    Err(ecmalite::raise_type_error!("host refused").into())
}

#[cfg(test)]
mod engine_api_tests {
    use super::*;

    #[test]
    fn test_engine_keeps_globals_between_evaluations() {
        let mut engine = Engine::new();
        assert_eq!(engine.evaluate("var counter = 1;", "a.js", 1).unwrap(), ScriptValue::Undefined);
        assert_eq!(engine.evaluate("counter += 1; counter", "b.js", 1).unwrap(), ScriptValue::Number(2.0));
        assert_eq!(engine.evaluate_to_string("function twice(x) { return x * 2; } twice(counter)", "c.js", 1).unwrap(), "4");
        assert_eq!(engine.evaluate_to_string("twice(5)", "d.js", 1).unwrap(), "10");
    }

    #[test]
    fn test_engines_are_isolated() {
        let mut first = Engine::new();
        let mut second = Engine::new();
        first.evaluate("var only = 'first';", "a.js", 1).unwrap();
        assert_eq!(second.evaluate_to_string("typeof only", "b.js", 1).unwrap(), "undefined");
    }

    #[test]
    fn test_script_value_variants() {
        let mut engine = Engine::default();
        assert_eq!(engine.evaluate("null", "v.js", 1).unwrap(), ScriptValue::Null);
        assert_eq!(engine.evaluate("1 < 2", "v.js", 1).unwrap(), ScriptValue::Boolean(true));
        assert_eq!(engine.evaluate("'abc'", "v.js", 1).unwrap(), ScriptValue::String("abc".to_string()));
        assert_eq!(
            engine.evaluate("({ a: 1 })", "v.js", 1).unwrap(),
            ScriptValue::Object {
                class: "Object".to_string(),
                display: "[object Object]".to_string()
            }
        );
        assert_eq!(
            engine.evaluate("[1, 2]", "v.js", 1).unwrap(),
            ScriptValue::Object {
                class: "Array".to_string(),
                display: "1,2".to_string()
            }
        );
        assert_eq!(
            engine.evaluate("function sq(x) { return x * x; }\nsq", "v.js", 1).unwrap(),
            ScriptValue::Function {
                name: "sq".to_string(),
                source: "function sq(x) { return x * x; }".to_string()
            }
        );
        assert_eq!(ScriptValue::Number(0.5).to_string(), "0.5");
        assert_eq!(ScriptValue::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_set_global_binds_primitives() {
        let mut engine = Engine::new();
        engine.set_global("limit", ScriptValue::Number(3.0)).unwrap();
        engine.set_global("label", ScriptValue::String("n".to_string())).unwrap();
        assert_eq!(engine.evaluate_to_string("label + limit * 2", "g.js", 1).unwrap(), "n6");

        let err = engine
            .set_global(
                "obj",
                ScriptValue::Object {
                    class: "Object".to_string(),
                    display: String::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_register_function() {
        let mut engine = Engine::new();
        engine.register_function("sum", 2, host_sum);
        engine.register_function("fail", 0, host_fail);
        assert_eq!(engine.evaluate_to_string("sum(1, 2, '3')", "h.js", 1).unwrap(), "6");
        assert_eq!(engine.evaluate_to_string("sum.length + ',' + typeof sum", "h.js", 1).unwrap(), "2,function");
        assert_eq!(
            engine
                .evaluate_to_string("try { fail(); } catch (e) { e.name + ':' + e.message }", "h.js", 1)
                .unwrap(),
            "TypeError:host refused"
        );
        let err = engine.evaluate("fail()", "h.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_parse_error_metadata() {
        let mut engine = Engine::new();
        let err = engine.evaluate("var ok = 1;\nvar = 2;", "meta.js", 10).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));
        assert_eq!(err.js_file(), Some("meta.js"));
        assert_eq!(err.js_line(), Some(11));
        assert!(err.excerpt().is_some());
    }

    #[test]
    fn test_runtime_error_location() {
        let mut engine = Engine::new();
        let err = engine.evaluate("var a;\n\nnull.x;", "run.js", 5).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
        assert_eq!(err.js_file(), Some("run.js"));
        assert_eq!(err.js_line(), Some(7));
    }

    #[test]
    fn test_error_stack_lists_script_frames() {
        let mut engine = Engine::new();
        let script = "function inner() { return missing; }\nfunction outer() { return inner(); }\nouter();";
        let err = engine.evaluate(script, "stack.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
        let stack = err.stack();
        assert_eq!(stack.len(), 2);
        assert!(stack[0].starts_with("at inner"), "{stack:?}");
        assert!(stack[1].starts_with("at outer"), "{stack:?}");
    }

    #[test]
    fn test_evaluate_script_uses_path_as_source_name() {
        let err = ecmalite::evaluate_script("undefinedName", Some(std::path::Path::new("scripts/main.js"))).unwrap_err();
        assert_eq!(err.js_file(), Some("scripts/main.js"));
        assert_eq!(err.js_line(), Some(1));
        assert_eq!(err.message(), "undefinedName is not defined");
    }

    #[test]
    fn test_custom_call_depth() {
        let config = EngineConfig {
            max_call_depth: 10,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config);
        assert_eq!(engine.config().max_call_depth, 10);
        let script = "function r(n) { return n == 0 ? 0 : r(n - 1); }";
        engine.evaluate(script, "depth.js", 1).unwrap();
        assert_eq!(engine.evaluate_to_string("r(5)", "depth.js", 1).unwrap(), "0");
        let err = engine.evaluate("r(20)", "depth.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::RangeError { .. }));
    }

    #[test]
    fn test_error_display_includes_kind() {
        let mut engine = Engine::new();
        let err = engine.evaluate("throw 'boom'", "t.js", 1).unwrap_err();
        assert!(err.to_string().contains("Uncaught boom"), "{err}");
    }
}
