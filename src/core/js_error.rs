use crate::{
    JSError, JSErrorKind,
    core::{
        ExecutionContext, JSObjectDataPtr, MutationContext, ObjectClass, PropertyAttributes, Realm, Value, create_native_constructor,
        define_native_method, new_js_object_data, object_get, object_get_value, to_js_string, value_to_string,
    },
    raise_type_error,
};

#[derive(Debug)]
pub enum EvalError<'gc> {
    Js(JSError),
    Throw(Value<'gc>, Option<usize>, Option<usize>),
}

impl<'gc> From<JSError> for EvalError<'gc> {
    fn from(e: JSError) -> Self {
        EvalError::Js(e)
    }
}

impl<'gc> From<EvalError<'gc>> for JSError {
    fn from(e: EvalError<'gc>) -> Self {
        match e {
            EvalError::Js(j) => j,
            EvalError::Throw(v, line, column) => {
                let msg = value_to_string(&v);
                let mut e = crate::make_js_error!(JSErrorKind::Throw(msg));
                e.inner.js_line = line;
                e.inner.js_column = column;
                e
            }
        }
    }
}

impl<'gc> EvalError<'gc> {
    pub fn message(&self) -> String {
        match self {
            EvalError::Js(e) => e.message(),
            EvalError::Throw(v, ..) => value_to_string(v),
        }
    }

    /// Whether a `catch` clause may observe this error.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, EvalError::Js(e) if matches!(e.kind(), JSErrorKind::InfiniteLoopError { .. }))
    }
}

pub fn js_error_to_value<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>, err: &JSError) -> Value<'gc> {
    let prototype = realm.error_prototype_for(err.kind().constructor_name());
    let obj = new_js_object_data(mc, Some(prototype), ObjectClass::Error);
    {
        let mut o = obj.borrow_mut(mc);
        o.set_own("message", Value::String(err.message()), PropertyAttributes::HIDDEN);
        if let Some(file) = err.js_file() {
            o.set_own("fileName", Value::String(file.to_string()), PropertyAttributes::HIDDEN);
        }
        if let Some(line) = err.js_line() {
            o.set_own("lineNumber", Value::Number(line as f64), PropertyAttributes::HIDDEN);
        }
    }
    log::debug!("converted engine error into script value: {}", err.kind());
    Value::Object(obj)
}

/// Shared by every error constructor; the instance prototype comes from the
/// constructor being invoked.
fn error_constructor<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let prototype = match cx.callee.and_then(|ctor| object_get_value(&ctor, "prototype")) {
        Some(Value::Object(proto)) => proto,
        _ => cx.realm.error_prototype,
    };
    let obj = new_js_object_data(mc, Some(prototype), ObjectClass::Error);
    if let Some(message) = args.first().filter(|m| !matches!(m, Value::Undefined)) {
        let message = to_js_string(mc, cx, message)?;
        obj.borrow_mut(mc)
            .set_own("message", Value::String(message), PropertyAttributes::HIDDEN);
    }
    Ok(Value::Object(obj))
}

fn error_to_string<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Value::Object(obj) = this else {
        return Err(raise_type_error!("Error.prototype.toString called on non-object").into());
    };
    let name = match object_get(mc, cx, obj, "name", this)? {
        Value::Undefined => "Error".to_string(),
        other => to_js_string(mc, cx, &other)?,
    };
    let message = match object_get(mc, cx, obj, "message", this)? {
        Value::Undefined => String::new(),
        other => to_js_string(mc, cx, &other)?,
    };
    Ok(Value::String(match (name.is_empty(), message.is_empty()) {
        (_, true) => name,
        (true, false) => message,
        (false, false) => format!("{name}: {message}"),
    }))
}

fn install_error_constructor<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>, name: &str, prototype: JSObjectDataPtr<'gc>) {
    let ctor = create_native_constructor(mc, realm, name, 1, error_constructor, prototype);
    prototype
        .borrow_mut(mc)
        .set_own("name", Value::String(name.to_string()), PropertyAttributes::HIDDEN);
    realm
        .global
        .borrow_mut(mc)
        .set_own(name, Value::Object(ctor), PropertyAttributes::HIDDEN);
}

/// Installs `Error` and the native error constructors on the global object.
pub fn initialize_error_constructors<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    install_error_constructor(mc, realm, "Error", realm.error_prototype);
    realm
        .error_prototype
        .borrow_mut(mc)
        .set_own("message", Value::String(String::new()), PropertyAttributes::HIDDEN);
    define_native_method(mc, realm, &realm.error_prototype, "toString", 0, error_to_string);

    install_error_constructor(mc, realm, "TypeError", realm.type_error_prototype);
    install_error_constructor(mc, realm, "ReferenceError", realm.reference_error_prototype);
    install_error_constructor(mc, realm, "SyntaxError", realm.syntax_error_prototype);
    install_error_constructor(mc, realm, "RangeError", realm.range_error_prototype);
    install_error_constructor(mc, realm, "URIError", realm.uri_error_prototype);
    install_error_constructor(mc, realm, "EvalError", realm.eval_error_prototype);
}
