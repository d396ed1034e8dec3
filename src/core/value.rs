use crate::core::{
    Collect, EvalError, ExecutionContext, Gc, GcTrace, JSObjectDataPtr, MutationContext, ObjectClass, call_function, function_source_text, get_property,
    number::{format_number, string_to_number},
    object_get,
};
use crate::raise_type_error;

#[derive(Clone)]
pub enum Value<'gc> {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(JSObjectDataPtr<'gc>),
}

unsafe impl<'gc> Collect<'gc> for Value<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        if let Value::Object(obj) = self {
            obj.trace(cc);
        }
    }
}

impl<'gc> std::fmt::Debug for Value<'gc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({})", format_number(*n)),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Null => write!(f, "Null"),
            Value::Undefined => write!(f, "Undefined"),
            Value::Object(obj) => write!(f, "Object({})", obj.borrow().class.name()),
        }
    }
}

impl<'gc> Value<'gc> {
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn as_object(&self) -> Option<JSObjectDataPtr<'gc>> {
        match self {
            Value::Object(obj) => Some(*obj),
            _ => None,
        }
    }

    /// The object, if this value is a callable object.
    pub fn as_callable(&self) -> Option<JSObjectDataPtr<'gc>> {
        self.as_object().filter(|obj| obj.borrow().is_callable())
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value<'_> {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

pub fn to_boolean(val: &Value<'_>) -> bool {
    match val {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => !(n.is_nan() || *n == 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
    }
}

/// ToPrimitive: objects try `valueOf` then `toString`, or the reverse for a
/// string hint. The first primitive result wins.
pub fn to_primitive<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    val: &Value<'gc>,
    hint: PreferredType,
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Value::Object(obj) = val else {
        return Ok(val.clone());
    };
    let order = match hint {
        PreferredType::String => ["toString", "valueOf"],
        PreferredType::Number | PreferredType::Default => ["valueOf", "toString"],
    };
    for method in order {
        let func = object_get(mc, cx, obj, method, val)?;
        if func.as_callable().is_some() {
            let result = call_function(mc, cx, &func, val, &[])?;
            if !matches!(result, Value::Object(_)) {
                return Ok(result);
            }
        }
    }
    log::debug!("to_primitive: no primitive from {:p}", Gc::as_ptr(*obj));
    Err(raise_type_error!("Cannot convert object to primitive value").into())
}

pub fn to_number<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, val: &Value<'gc>) -> Result<f64, EvalError<'gc>> {
    Ok(match val {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Object(_) => {
            let prim = to_primitive(mc, cx, val, PreferredType::Number)?;
            to_number(mc, cx, &prim)?
        }
    })
}

/// ToString, which may run script code for objects.
pub fn to_js_string<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, val: &Value<'gc>) -> Result<String, EvalError<'gc>> {
    match val {
        Value::Object(_) => {
            let prim = to_primitive(mc, cx, val, PreferredType::String)?;
            Ok(value_to_string(&prim))
        }
        other => Ok(value_to_string(other)),
    }
}

/// Rendering that never runs script code. Objects show their class, or the
/// source text for script functions.
pub fn value_to_string(val: &Value<'_>) -> String {
    match val {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let borrowed = obj.borrow();
            if borrowed.is_callable() {
                return function_source_text(obj);
            }
            if borrowed.class == ObjectClass::Error {
                let name = get_property(obj, "name").and_then(|d| d.value().cloned());
                let message = get_property(obj, "message").and_then(|d| d.value().cloned());
                return match (name, message) {
                    (Some(Value::String(name)), Some(Value::String(msg))) if !msg.is_empty() => format!("{name}: {msg}"),
                    (Some(Value::String(name)), _) => name,
                    _ => "Error".to_string(),
                };
            }
            format!("[object {}]", borrowed.class.name())
        }
    }
}

pub fn type_of(val: &Value<'_>) -> &'static str {
    match val {
        Value::Undefined => "undefined",
        Value::Null => "object",
        Value::Boolean(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Object(obj) => {
            if obj.borrow().is_callable() {
                "function"
            } else {
                "object"
            }
        }
    }
}

/// `===`: objects compare by identity.
pub fn strict_equals(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Gc::ptr_eq(*x, *y),
        _ => false,
    }
}

/// `==` with the usual coercions.
pub fn loose_equals<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    a: &Value<'gc>,
    b: &Value<'gc>,
) -> Result<bool, EvalError<'gc>> {
    Ok(match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(x), Value::String(s)) => *x == string_to_number(s),
        (Value::String(s), Value::Number(y)) => string_to_number(s) == *y,
        (Value::Boolean(x), _) => {
            let n = Value::Number(if *x { 1.0 } else { 0.0 });
            loose_equals(mc, cx, &n, b)?
        }
        (_, Value::Boolean(y)) => {
            let n = Value::Number(if *y { 1.0 } else { 0.0 });
            loose_equals(mc, cx, a, &n)?
        }
        (Value::Object(_), Value::Number(_) | Value::String(_)) => {
            let prim = to_primitive(mc, cx, a, PreferredType::Default)?;
            loose_equals(mc, cx, &prim, b)?
        }
        (Value::Number(_) | Value::String(_), Value::Object(_)) => {
            let prim = to_primitive(mc, cx, b, PreferredType::Default)?;
            loose_equals(mc, cx, a, &prim)?
        }
        _ => strict_equals(a, b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!to_boolean(&Value::Number(f64::NAN)));
        assert!(!to_boolean(&Value::Number(-0.0)));
        assert!(!to_boolean(&Value::String(String::new())));
        assert!(to_boolean(&Value::String("0".to_string())));
        assert!(!to_boolean(&Value::Null));
    }

    #[test]
    fn test_strict_equality_of_primitives() {
        assert!(strict_equals(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(!strict_equals(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(!strict_equals(&Value::Number(1.0), &Value::String("1".into())));
        assert!(strict_equals(&Value::Undefined, &Value::Undefined));
        assert!(!strict_equals(&Value::Undefined, &Value::Null));
    }

    #[test]
    fn test_primitive_rendering() {
        assert_eq!(value_to_string(&Value::Number(1e21)), "1e+21");
        assert_eq!(value_to_string(&Value::Boolean(true)), "true");
        assert_eq!(type_of(&Value::Null), "object");
        assert_eq!(type_of(&Value::String("x".into())), "string");
    }
}
