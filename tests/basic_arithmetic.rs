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
mod arithmetic_tests {
    use super::*;
    use ecmalite::JSErrorKind;

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3"), "7");
        assert_eq!(eval("(1 + 2) * 3"), "9");
        assert_eq!(eval("2 * 3 - 4 / 2"), "4");
        assert_eq!(eval("1 - 2 - 3"), "-4");
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(eval("10 / 4"), "2.5");
        assert_eq!(eval("1 / 0"), "Infinity");
        assert_eq!(eval("-1 / 0"), "-Infinity");
        assert_eq!(eval("0 / 0"), "NaN");
        assert_eq!(eval("0.1 + 0.2"), "0.30000000000000004");
        assert_eq!(eval("1e21"), "1e+21");
        assert_eq!(eval("0x1F + 010"), "39");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("'a' + 1 + 2"), "a12");
        assert_eq!(eval("1 + 2 + 'a'"), "3a");
        assert_eq!(eval("'n: ' + null + ' ' + undefined + ' ' + true"), "n: null undefined true");
        assert_eq!(eval("'5' * '2'"), "10");
    }

    #[test]
    fn test_modulo_follows_dividend_sign() {
        assert_eq!(eval("7 % 3"), "1");
        assert_eq!(eval("-7 % 3"), "-1");
        assert_eq!(eval("5.5 % 2"), "1.5");
    }

    #[test]
    fn test_bitwise_and_shifts() {
        assert_eq!(eval("5 & 3"), "1");
        assert_eq!(eval("5 | 3"), "7");
        assert_eq!(eval("5 ^ 3"), "6");
        assert_eq!(eval("~5"), "-6");
        assert_eq!(eval("-8 >> 1"), "-4");
        assert_eq!(eval("-8 >>> 28"), "15");
        assert_eq!(eval("1 << 33"), "2");
        assert_eq!(eval("4294967296 | 0"), "0");
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("'10' == 10"), "true");
        assert_eq!(eval("null == undefined"), "true");
        assert_eq!(eval("null == 0"), "false");
        assert_eq!(eval("'10' === 10"), "false");
        assert_eq!(eval("1 != '1'"), "false");
        assert_eq!(eval("1 !== '1'"), "true");
        assert_eq!(eval("true == 1"), "true");
        assert_eq!(eval("NaN == NaN"), "false");
    }

    #[test]
    fn test_relational_comparisons() {
        assert_eq!(eval("'a' < 'b'"), "true");
        assert_eq!(eval("'10' < '9'"), "true");
        assert_eq!(eval("10 < 9"), "false");
        assert_eq!(eval("'10' < 9"), "false");
        assert_eq!(eval("NaN < 1"), "false");
        assert_eq!(eval("NaN >= 1"), "false");
        assert_eq!(eval("2 >= 2"), "true");
        // U+1F600 starts with the surrogate 0xD83D, which sorts below U+FF61.
        assert_eq!(eval("'\u{1F600}' < '\u{FF61}'"), "true");
        assert_eq!(eval("'\u{FF61}' >= '\u{1F600}'"), "true");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("typeof undeclared"), "undefined");
        assert_eq!(eval("typeof null"), "object");
        assert_eq!(eval("typeof function () {}"), "function");
        assert_eq!(eval("typeof '' + typeof 1 + typeof true"), "stringnumberboolean");
        assert_eq!(eval("void 0"), "undefined");
        assert_eq!(eval("-'3'"), "-3");
        assert_eq!(eval("+'  42  '"), "42");
        assert_eq!(eval("!''"), "true");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(eval("var n = 0; false && n++; true || n++; n"), "0");
        assert_eq!(eval("0 || 'fallback'"), "fallback");
        assert_eq!(eval("1 && 2 && 3"), "3");
        assert_eq!(eval("1 && 0 && 3"), "0");
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(eval("var x = 5; x += 3; x *= 2; x -= 1; x"), "15");
        assert_eq!(eval("var s = 'a'; s += 'b'; s"), "ab");
        assert_eq!(eval("var b = 1; b <<= 4; b |= 1; b"), "17");
        assert_eq!(eval("var o = { n: 1 }; o.n += 9; o['n'] *= 2; o.n"), "20");
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(eval("var i = 1; var j = i++; j + ',' + i"), "1,2");
        assert_eq!(eval("var i = 1; ++i + i"), "4");
        assert_eq!(eval("var o = { c: '5' }; o.c--; o.c"), "4");
    }

    #[test]
    fn test_conditional_and_comma() {
        assert_eq!(eval("true ? 'y' : 'n'"), "y");
        assert_eq!(eval("0 ? 'y' : 1 ? 'z' : 'n'"), "z");
        assert_eq!(eval("1 ? 0 ? 'x' : 'y' : 'z'"), "y");
        assert_eq!(eval("0 ? 1 ? 'x' : 'y' : 'z'"), "z");
        assert_eq!(eval("1 ? 1 ? 'x' : 'y' : 'z'"), "x");
        assert_eq!(eval("var v; 1 ? v = 'set' : 'no'; v"), "set");
        assert_eq!(eval("(1, 2, 3)"), "3");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        for script in ["!".repeat(200_000) + "0", "[".repeat(50_000) + &"]".repeat(50_000)] {
            let err = evaluate_script(&script, None::<&std::path::Path>).unwrap_err();
            assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err}");
        }
        assert_eq!(eval(&("!".repeat(200) + "0")), "false");
        assert_eq!(eval(&("[".repeat(200) + "7" + &"]".repeat(200) + &"[0]".repeat(200))), "7");
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(eval("var x = 1\nvar y = 2\nx + y"), "3");
        assert_eq!(eval("var a = 1\n;a"), "1");
        let err = evaluate_script("var a = 1 var b = 2", None::<&std::path::Path>).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));
    }

    #[test]
    fn test_completion_value_is_last_expression() {
        assert_eq!(eval("var x = 3;"), "undefined");
        assert_eq!(eval("'first'; var y = 1;"), "first");
        assert_eq!(eval("if (true) { 'then' } else { 'else' }"), "then");
    }
}
