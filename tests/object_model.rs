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
mod object_model_tests {
    use super::*;
    use ecmalite::JSErrorKind;

    #[test]
    fn test_prototype_delegation() {
        let script = r#"
            function Base() {}
            Base.prototype.tag = 'proto';
            var a = new Base();
            var before = a.tag;
            a.tag = 'own';
            var b = new Base();
            before + ',' + a.tag + ',' + b.tag
        "#;
        assert_eq!(eval(script), "proto,own,proto");
    }

    #[test]
    fn test_const_is_read_only() {
        assert_eq!(eval("const c = 1; c = 2; c"), "1");
        assert_eq!(eval("const c = 1; c++; c"), "1");
        assert_eq!(eval("function f() { const k = 'a'; k = 'b'; return k; } f()"), "a");
    }

    #[test]
    fn test_const_redeclaration_is_type_error() {
        let err = evaluate_script("const c = 1; const c = 2;", None::<&std::path::Path>).unwrap_err();
        match err.kind() {
            JSErrorKind::TypeError { message } => assert_eq!(message, "redeclaration of const c"),
            other => panic!("expected TypeError, got {other:?}"),
        }
    }

    #[test]
    fn test_getters_and_setters() {
        assert_eq!(eval("var o = { _x: 20, get x() { return this._x * 2; } }; o.x"), "40");
        assert_eq!(eval("var o = { get x() { return 1; } }; o.x = 5; o.x"), "1");
        assert_eq!(eval("var o = { set x(v) { this.seen = v; } }; o.x = 5; typeof o.x + ',' + o.seen"), "undefined,5");
        let script = r#"
            var o = {
                v: 1,
                get double() { return this.v * 2; },
                set double(d) { this.v = d / 2; }
            };
            o.double = 10;
            o.v + ',' + o.double
        "#;
        assert_eq!(eval(script), "5,10");
    }

    #[test]
    fn test_inherited_setter_runs_on_receiver() {
        let script = r#"
            var proto = { set v(x) { this.stored = x; } };
            function C() {}
            C.prototype = proto;
            var c = new C();
            c.v = 3;
            c.stored + ',' + c.hasOwnProperty('v')
        "#;
        assert_eq!(eval(script), "3,false");
    }

    #[test]
    fn test_for_in_skips_accessors() {
        assert_eq!(eval("var o = { a: 1, get b() { return 2; } }; var s = ''; for (var k in o) s += k; s"), "a");
    }

    #[test]
    fn test_delete() {
        assert_eq!(eval("var o = { a: 1 }; delete o.a + ',' + o.a + ',' + delete o.a"), "true,undefined,false");
        assert_eq!(eval("var x = 1; delete x"), "false");
        assert_eq!(eval("y = 1; delete y"), "true");
        assert_eq!(eval("delete neverDeclared"), "false");
        assert_eq!(eval("delete 5"), "true");
        assert_eq!(eval("delete NaN"), "false");
    }

    #[test]
    fn test_own_property_queries() {
        let script = "function P() { this.own = 1; } P.prototype.inherited = 2; var p = new P(); p.hasOwnProperty('own') + ',' + p.hasOwnProperty('inherited')";
        assert_eq!(eval(script), "true,false");
        assert_eq!(eval("var o = { a: 1 }; o.propertyIsEnumerable('a') + ',' + o.propertyIsEnumerable('toString')"), "true,false");
        assert_eq!(eval("'abc'.hasOwnProperty('length') + ',' + 'abc'.hasOwnProperty('1')"), "true,true");
    }

    #[test]
    fn test_object_to_string_reports_class() {
        assert_eq!(eval("Object.prototype.toString.call([])"), "[object Array]");
        assert_eq!(eval("Object.prototype.toString.call(function () {})"), "[object Function]");
        assert_eq!(eval("'' + {}"), "[object Object]");
        assert_eq!(eval("Object.prototype.toString.call(null)"), "[object Null]");
    }

    #[test]
    fn test_object_constructor() {
        assert_eq!(eval("var o = {}; Object(o) === o"), "true");
        assert_eq!(eval("typeof new Object()"), "object");
        assert_eq!(eval("var o = new Object(); o.k = 1; o.k"), "1");
    }

    #[test]
    fn test_array_length_tracks_indices() {
        assert_eq!(eval("var a = [1, 2, 3]; a.length"), "3");
        assert_eq!(eval("var a = []; a[4] = 'x'; a.length"), "5");
        assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; a.join(',') + '|' + a[3]"), "1,2|undefined");
        assert_eq!(eval("var a = [1]; a.push(2, 3) + ':' + a"), "3:1,2,3");
        assert_eq!(eval("var a = [1, , 3]; a.length + ',' + (1 in a)"), "3,false");
        assert_eq!(eval("[1, [2, 3], null, undefined].toString()"), "1,2,3,,");
    }

    #[test]
    fn test_array_constructor() {
        assert_eq!(eval("new Array(3).length"), "3");
        assert_eq!(eval("new Array(1, 2).join('-')"), "1-2");
        assert_eq!(eval("Array('a').length"), "1");
        let err = evaluate_script("new Array(-1)", None::<&std::path::Path>).unwrap_err();
        match err.kind() {
            JSErrorKind::RangeError { message } => assert_eq!(message, "Invalid array length"),
            other => panic!("expected RangeError, got {other:?}"),
        }
    }

    #[test]
    fn test_object_identity() {
        assert_eq!(eval("var a = {}; var b = a; var c = {}; (a === b) + ',' + (a === c) + ',' + (a == c)"), "true,false,false");
        assert_eq!(eval("var a = {}; b = a; b.x = 1; a.x"), "1");
    }

    #[test]
    fn test_in_operator() {
        assert_eq!(eval("var o = { a: undefined }; ('a' in o) + ',' + ('b' in o) + ',' + ('toString' in o)"), "true,false,true");
        assert_eq!(eval("0 in [7]"), "true");
        let err = evaluate_script("'a' in 'abc'", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_string_length_and_index() {
        assert_eq!(eval("'abc'.length + 'abc'[1]"), "3b");
        assert_eq!(eval("typeof 'abc'[5]"), "undefined");
        assert_eq!(eval("var s = 'abc'; s.length = 1; s.length"), "3");
    }

    #[test]
    fn test_member_access_on_null_is_type_error() {
        let err = evaluate_script("var n = null; n.x", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
        let err = evaluate_script("undefined.x = 1", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    }

    #[test]
    fn test_undefined_is_read_only() {
        assert_eq!(eval("undefined = 1; typeof undefined"), "undefined");
        assert_eq!(eval("NaN = 1; isNaN(NaN)"), "true");
    }
}
