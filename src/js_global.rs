use crate::core::{
    EvalError, ExecutionContext, MutationContext, PropertyAttributes, Realm, Value, create_native_function, evaluate_program,
    number::{parse_float, parse_int, to_int32},
    parse_program, to_js_string, to_number,
};

/// Installs the value properties and global functions.
pub fn initialize_global<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    let constant = PropertyAttributes::empty();
    {
        let mut global = realm.global.borrow_mut(mc);
        global.set_own("undefined", Value::Undefined, constant);
        global.set_own("NaN", Value::Number(f64::NAN), constant);
        global.set_own("Infinity", Value::Number(f64::INFINITY), constant);
    }

    let functions: [(&str, usize, crate::core::NativeFn); 5] = [
        ("eval", 1, global_eval),
        ("isNaN", 1, global_is_nan),
        ("isFinite", 1, global_is_finite),
        ("parseInt", 2, global_parse_int),
        ("parseFloat", 1, global_parse_float),
    ];
    for (name, arity, func) in functions {
        let function = create_native_function(mc, realm, name, arity, func);
        realm
            .global
            .borrow_mut(mc)
            .set_own(name, Value::Object(function), PropertyAttributes::HIDDEN);
    }
}

fn first_arg<'a, 'gc>(args: &'a [Value<'gc>]) -> &'a Value<'gc> {
    args.first().unwrap_or(&Value::Undefined)
}

/// Runs a string as eval code in the caller's scope. Declarations it makes
/// are deletable; anything other than a string is returned unchanged.
fn global_eval<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Value::String(source) = first_arg(args) else {
        return Ok(first_arg(args).clone());
    };
    let source_name = format!("{} (eval)", cx.source_name);
    let program = parse_program(source, &source_name, 1)?;
    log::debug!("eval of {} statements at depth {}", program.body.statements.len(), cx.depth);
    let eval_cx = cx.for_eval(program.source_name().clone());
    evaluate_program(mc, &eval_cx, &program.body)
}

fn global_is_nan<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(Value::Boolean(to_number(mc, cx, first_arg(args))?.is_nan()))
}

fn global_is_finite<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(Value::Boolean(to_number(mc, cx, first_arg(args))?.is_finite()))
}

fn global_parse_int<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let text = to_js_string(mc, cx, first_arg(args))?;
    let radix = match args.get(1) {
        None | Some(Value::Undefined) => 0,
        Some(radix) => to_int32(to_number(mc, cx, radix)?),
    };
    Ok(Value::Number(parse_int(&text, radix)))
}

fn global_parse_float<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let text = to_js_string(mc, cx, first_arg(args))?;
    Ok(Value::Number(parse_float(&text)))
}
