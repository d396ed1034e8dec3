use crate::core::{
    Callable, EvalError, ExecutionContext, MutationContext, NativeFunction, PropertyAttributes, Realm, Value, array_length, call_function,
    create_closure, create_native_constructor, define_native_method, function_source_text, new_scope, object_get, parse_program,
    to_js_string,
};
use crate::{raise_syntax_error, raise_type_error};

pub fn initialize_function<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    let proto = realm.function_prototype;
    // Function.prototype is itself callable and returns undefined.
    proto.borrow_mut(mc).callable = Some(Callable::Native(NativeFunction {
        func: function_prototype_call,
        constructible: false,
    }));

    let function_ctor = create_native_constructor(mc, realm, "Function", 1, function_constructor, proto);
    realm
        .global
        .borrow_mut(mc)
        .set_own("Function", Value::Object(function_ctor), PropertyAttributes::HIDDEN);

    define_native_method(mc, realm, &proto, "call", 1, function_call);
    define_native_method(mc, realm, &proto, "apply", 2, function_apply);
    define_native_method(mc, realm, &proto, "toString", 0, function_to_string);
}

fn function_prototype_call<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(Value::Undefined)
}

/// `new Function(p1, ..., body)`: the function closes over the global scope
/// only, whatever scope the constructor was called from.
fn function_constructor<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let (params, body) = match args.split_last() {
        Some((body, params)) => (params, to_js_string(mc, cx, body)?),
        None => (&[][..], String::new()),
    };
    let params = params.iter().map(|p| to_js_string(mc, cx, p)).collect::<Result<Vec<_>, _>>()?;
    let source = format!("function anonymous({}) {{\n{body}\n}}", params.join(", "));
    log::debug!("Function constructor compiling {} bytes", source.len());

    let program = parse_program(&source, "anonymous", 1)?;
    let node = match (program.body.statements.len(), program.body.fun_decls.first()) {
        (1, Some(node)) => node.clone(),
        _ => return Err(raise_syntax_error!("malformed function body").into()),
    };
    let global_scope = new_scope(mc, cx.realm.global, None);
    Ok(Value::Object(create_closure(mc, cx, node, global_scope)))
}

fn function_call<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    if this.as_callable().is_none() {
        return Err(raise_type_error!("Function.prototype.call called on a non-function").into());
    }
    let (this_arg, rest) = match args.split_first() {
        Some((first, rest)) => (first.clone(), rest),
        None => (Value::Undefined, &[][..]),
    };
    call_function(mc, cx, this, &this_arg, rest)
}

fn function_apply<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    if this.as_callable().is_none() {
        return Err(raise_type_error!("Function.prototype.apply called on a non-function").into());
    }
    let this_arg = args.first().cloned().unwrap_or(Value::Undefined);
    let call_args = match args.get(1) {
        None | Some(Value::Undefined) | Some(Value::Null) => Vec::new(),
        Some(Value::Object(list)) => {
            let receiver = Value::Object(*list);
            (0..array_length(list))
                .map(|index| object_get(mc, cx, list, &index.to_string(), &receiver))
                .collect::<Result<Vec<_>, _>>()?
        }
        Some(_) => return Err(raise_type_error!("second argument to Function.prototype.apply must be an array").into()),
    };
    call_function(mc, cx, this, &this_arg, &call_args)
}

fn function_to_string<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    match this.as_callable() {
        Some(func) => Ok(Value::String(function_source_text(&func))),
        None => Err(raise_type_error!("Function.prototype.toString called on a non-function").into()),
    }
}
