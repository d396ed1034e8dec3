use crate::core::{
    EvalError, ExecutionContext, MutationContext, ObjectClass, PropertyAttributes, Realm, Value, array_index, create_native_constructor,
    define_native_method, get_own_property, new_js_object_data, to_js_string,
};

pub fn initialize_object<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    let object_ctor = create_native_constructor(mc, realm, "Object", 1, object_constructor, realm.object_prototype);
    realm
        .global
        .borrow_mut(mc)
        .set_own("Object", Value::Object(object_ctor), PropertyAttributes::HIDDEN);

    let proto = &realm.object_prototype;
    define_native_method(mc, realm, proto, "toString", 0, object_to_string);
    define_native_method(mc, realm, proto, "valueOf", 0, object_value_of);
    define_native_method(mc, realm, proto, "hasOwnProperty", 1, object_has_own_property);
    define_native_method(mc, realm, proto, "propertyIsEnumerable", 1, object_property_is_enumerable);
}

/// `Object(v)` and `new Object(v)`: objects pass through, anything else
/// yields a fresh plain object.
fn object_constructor<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    if let Some(Value::Object(obj)) = args.first() {
        return Ok(Value::Object(*obj));
    }
    Ok(Value::Object(new_js_object_data(mc, Some(cx.realm.object_prototype), ObjectClass::Object)))
}

fn object_to_string<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let class = match this {
        Value::Object(obj) => obj.borrow().class.name(),
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Boolean(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
    };
    Ok(Value::String(format!("[object {class}]")))
}

fn object_value_of<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(this.clone())
}

fn property_key<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, args: &[Value<'gc>]) -> Result<String, EvalError<'gc>> {
    to_js_string(mc, cx, args.first().unwrap_or(&Value::Undefined))
}

fn object_has_own_property<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let key = property_key(mc, cx, args)?;
    let found = match this {
        Value::Object(obj) => obj.borrow().properties.contains_key(&key),
        Value::String(s) => key == "length" || array_index(&key).is_some_and(|index| (index as usize) < s.chars().count()),
        _ => false,
    };
    Ok(Value::Boolean(found))
}

fn object_property_is_enumerable<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let key = property_key(mc, cx, args)?;
    let enumerable = match this {
        Value::Object(obj) => get_own_property(obj, &key).is_some_and(|desc| desc.enumerable()),
        _ => false,
    };
    Ok(Value::Boolean(enumerable))
}
