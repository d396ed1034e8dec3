use crate::core::{
    EvalError, ExecutionContext, JSObjectDataPtr, MutationContext, ObjectClass, PropertyAttributes, Realm, Value, array_length,
    create_native_constructor, define_native_method, define_value, new_js_object_data, number::to_uint32, object_get, object_put, to_js_string,
};
use crate::{raise_range_error, raise_type_error};

pub fn initialize_array<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    let proto = realm.array_prototype;
    proto
        .borrow_mut(mc)
        .set_own("length", Value::Number(0.0), PropertyAttributes::WRITABLE);

    let array_ctor = create_native_constructor(mc, realm, "Array", 1, array_constructor, proto);
    realm
        .global
        .borrow_mut(mc)
        .set_own("Array", Value::Object(array_ctor), PropertyAttributes::HIDDEN);

    define_native_method(mc, realm, &proto, "join", 1, array_join);
    define_native_method(mc, realm, &proto, "toString", 0, array_to_string);
    define_native_method(mc, realm, &proto, "push", 1, array_push);
}

/// A new empty array linked to `Array.prototype`.
pub(crate) fn create_array<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> JSObjectDataPtr<'gc> {
    let array = new_js_object_data(mc, Some(realm.array_prototype), ObjectClass::Array);
    array
        .borrow_mut(mc)
        .set_own("length", Value::Number(0.0), PropertyAttributes::WRITABLE);
    array
}

/// `Array(len)` preallocates a length; any other argument list becomes the
/// elements.
fn array_constructor<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let array = create_array(mc, &cx.realm);
    if let [Value::Number(n)] = args {
        let length = to_uint32(*n);
        if length as f64 != *n {
            return Err(raise_range_error!("Invalid array length").into());
        }
        array
            .borrow_mut(mc)
            .set_own("length", Value::Number(length as f64), PropertyAttributes::WRITABLE);
    } else {
        for (index, arg) in args.iter().enumerate() {
            define_value(mc, &array, &index.to_string(), arg.clone(), PropertyAttributes::DEFAULT);
        }
    }
    Ok(Value::Object(array))
}

fn this_object<'gc>(this: &Value<'gc>, method: &str) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    match this {
        Value::Object(obj) => Ok(*obj),
        _ => Err(raise_type_error!(format!("Array.prototype.{method} called on a non-object")).into()),
    }
}

fn join_elements<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    array: &JSObjectDataPtr<'gc>,
    separator: &str,
) -> Result<String, EvalError<'gc>> {
    let receiver = Value::Object(*array);
    let mut parts = Vec::new();
    for index in 0..array_length(array) {
        let element = object_get(mc, cx, array, &index.to_string(), &receiver)?;
        parts.push(match element {
            Value::Undefined | Value::Null => String::new(),
            other => to_js_string(mc, cx, &other)?,
        });
    }
    Ok(parts.join(separator))
}

fn array_join<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let array = this_object(this, "join")?;
    let separator = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(sep) => to_js_string(mc, cx, sep)?,
    };
    Ok(Value::String(join_elements(mc, cx, &array, &separator)?))
}

fn array_to_string<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let array = this_object(this, "toString")?;
    Ok(Value::String(join_elements(mc, cx, &array, ",")?))
}

fn array_push<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let array = this_object(this, "push")?;
    let mut length = array_length(&array) as u64;
    for arg in args {
        object_put(mc, cx, &array, &length.to_string(), arg.clone())?;
        length += 1;
    }
    object_put(mc, cx, &array, "length", Value::Number(length as f64))?;
    Ok(Value::Number(length as f64))
}
