use crate::core::{
    EvalError, ExecutionContext, InternalSlot, JSObjectDataPtr, MutationContext, ObjectClass, PropertyAttributes, Realm, RegExpData, Value,
    create_native_constructor, define_native_method, define_value, new_js_object_data, number::to_integer, object_get, object_put,
    to_js_string, to_number,
};
use crate::js_array::create_array;
use crate::{raise_syntax_error, raise_type_error};
use regress::Regex;
use std::rc::Rc;

pub fn initialize_regexp<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) {
    let proto = realm.regexp_prototype;
    let regexp_ctor = create_native_constructor(mc, realm, "RegExp", 2, regexp_constructor, proto);
    realm
        .global
        .borrow_mut(mc)
        .set_own("RegExp", Value::Object(regexp_ctor), PropertyAttributes::HIDDEN);

    define_native_method(mc, realm, &proto, "exec", 1, regexp_exec);
    define_native_method(mc, realm, &proto, "test", 1, regexp_test);
    define_native_method(mc, realm, &proto, "toString", 0, regexp_to_string);
}

/// Compiles `pattern` and wraps it in a RegExp object. Used for literals and
/// the constructor alike; an invalid pattern or flag is a SyntaxError.
pub fn create_regexp<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    pattern: &str,
    flags: &str,
) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    let (mut global, mut ignore_case, mut multiline) = (false, false, false);
    for flag in flags.chars() {
        let seen = match flag {
            'g' => &mut global,
            'i' => &mut ignore_case,
            'm' => &mut multiline,
            other => return Err(raise_syntax_error!(format!("invalid regular expression flag {other}")).into()),
        };
        if std::mem::replace(seen, true) {
            return Err(raise_syntax_error!(format!("repeated regular expression flag {flag}")).into());
        }
    }

    // `g` only affects lastIndex handling, which is done here.
    let engine_flags: String = flags.chars().filter(|c| *c != 'g').collect();
    let regex = Regex::with_flags(pattern, engine_flags.as_str())
        .map_err(|e| raise_syntax_error!(format!("invalid regular expression /{pattern}/: {e}")))?;
    log::trace!("compiled regular expression /{pattern}/{flags}");

    let obj = new_js_object_data(mc, Some(realm.regexp_prototype), ObjectClass::RegExp);
    {
        let mut o = obj.borrow_mut(mc);
        o.internal = Some(InternalSlot::RegExp(Rc::new(RegExpData {
            regex,
            source: pattern.to_string(),
            global,
            ignore_case,
            multiline,
        })));
        o.set_own("source", Value::String(pattern.to_string()), PropertyAttributes::empty());
        o.set_own("global", Value::Boolean(global), PropertyAttributes::empty());
        o.set_own("ignoreCase", Value::Boolean(ignore_case), PropertyAttributes::empty());
        o.set_own("multiline", Value::Boolean(multiline), PropertyAttributes::empty());
        o.set_own("lastIndex", Value::Number(0.0), PropertyAttributes::WRITABLE);
    }
    Ok(obj)
}

fn regexp_constructor<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    _this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let existing = args.first().and_then(Value::as_object).and_then(|obj| obj.borrow().regexp());
    let pattern = match (existing, args.first()) {
        (Some(data), _) => data.source.clone(),
        (None, None | Some(Value::Undefined)) => String::new(),
        (None, Some(other)) => to_js_string(mc, cx, other)?,
    };
    let flags = match args.get(1) {
        None | Some(Value::Undefined) => String::new(),
        Some(other) => to_js_string(mc, cx, other)?,
    };
    Ok(Value::Object(create_regexp(mc, &cx.realm, &pattern, &flags)?))
}

fn this_regexp<'gc>(this: &Value<'gc>, method: &str) -> Result<(JSObjectDataPtr<'gc>, Rc<RegExpData>), EvalError<'gc>> {
    if let Value::Object(obj) = this
        && let Some(data) = obj.borrow().regexp()
    {
        return Ok((*obj, data));
    }
    Err(raise_type_error!(format!("RegExp.prototype.{method} called on an incompatible receiver")).into())
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices().nth(char_index).map(|(offset, _)| offset).unwrap_or(text.len())
}

fn char_index(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

/// Runs the pattern against the string argument. Indices visible to
/// scripts (`index`, `lastIndex`) count characters, not bytes.
fn regexp_exec<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let (obj, data) = this_regexp(this, "exec")?;
    let input = to_js_string(mc, cx, args.first().unwrap_or(&Value::Undefined))?;

    let start = if data.global {
        let last_index = object_get(mc, cx, &obj, "lastIndex", this)?;
        to_integer(to_number(mc, cx, &last_index)?)
    } else {
        0.0
    };
    if start < 0.0 || start > input.chars().count() as f64 {
        object_put(mc, cx, &obj, "lastIndex", Value::Number(0.0))?;
        return Ok(Value::Null);
    }

    let Some(found) = data.regex.find_from(&input, byte_offset(&input, start as usize)).next() else {
        if data.global {
            object_put(mc, cx, &obj, "lastIndex", Value::Number(0.0))?;
        }
        return Ok(Value::Null);
    };

    let result = create_array(mc, &cx.realm);
    let matched = &input[found.range.clone()];
    define_value(mc, &result, "0", Value::String(matched.to_string()), PropertyAttributes::DEFAULT);
    for (group, capture) in found.captures.iter().enumerate() {
        let value = match capture {
            Some(range) => Value::String(input[range.clone()].to_string()),
            None => Value::Undefined,
        };
        define_value(mc, &result, &(group + 1).to_string(), value, PropertyAttributes::DEFAULT);
    }
    let index = char_index(&input, found.range.start);
    define_value(mc, &result, "index", Value::Number(index as f64), PropertyAttributes::DEFAULT);
    define_value(mc, &result, "input", Value::String(input.clone()), PropertyAttributes::DEFAULT);

    if data.global {
        let end = char_index(&input, found.range.end);
        object_put(mc, cx, &obj, "lastIndex", Value::Number(end as f64))?;
    }
    Ok(Value::Object(result))
}

fn regexp_test<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let result = regexp_exec(mc, cx, this, args)?;
    Ok(Value::Boolean(!matches!(result, Value::Null)))
}

fn regexp_to_string<'gc>(
    _mc: &MutationContext<'gc>,
    _cx: &ExecutionContext<'gc>,
    this: &Value<'gc>,
    _args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let (_, data) = this_regexp(this, "toString")?;
    let mut flags = String::new();
    for (set, flag) in [(data.global, 'g'), (data.ignore_case, 'i'), (data.multiline, 'm')] {
        if set {
            flags.push(flag);
        }
    }
    Ok(Value::String(format!("/{}/{flags}", data.source)))
}
