use crate::core::{
    EvalError, ExecutionContext, JSObjectDataPtr, MutationContext, ObjectClass, Value, array_index, has_property, object_delete, object_get,
    object_put,
};
use crate::raise_reference_error;

#[derive(Clone)]
pub enum ReferenceBase<'gc> {
    /// Identifier not found on the scope chain at resolution time.
    Unresolved,
    Object(JSObjectDataPtr<'gc>),
    /// Property access on a primitive; reads only.
    Primitive(Value<'gc>),
}

/// A resolved storage location: a base plus a property name.
#[derive(Clone)]
pub struct Reference<'gc> {
    pub base: ReferenceBase<'gc>,
    pub key: String,
}

impl<'gc> Reference<'gc> {
    pub fn property(base: &Value<'gc>, key: String) -> Self {
        let base = match base {
            Value::Object(obj) => ReferenceBase::Object(*obj),
            other => ReferenceBase::Primitive(other.clone()),
        };
        Reference { base, key }
    }

    /// `this` for a call made through this reference. Scope objects other than
    /// `with` targets yield undefined, which the callee replaces with the global.
    pub fn this_value(&self) -> Value<'gc> {
        match &self.base {
            ReferenceBase::Unresolved => Value::Undefined,
            ReferenceBase::Object(obj) => match obj.borrow().class {
                ObjectClass::Activation | ObjectClass::Scope => Value::Undefined,
                _ => Value::Object(*obj),
            },
            ReferenceBase::Primitive(v) => v.clone(),
        }
    }
}

/// Finds the innermost scope object that has `name`.
pub fn resolve_identifier<'gc>(cx: &ExecutionContext<'gc>, name: &str) -> Reference<'gc> {
    let base = cx
        .scope_objects()
        .find(|object| has_property(object, name))
        .map(ReferenceBase::Object)
        .unwrap_or(ReferenceBase::Unresolved);
    Reference {
        base,
        key: name.to_string(),
    }
}

pub fn get_value<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, reference: &Reference<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
    match &reference.base {
        ReferenceBase::Object(obj) => object_get(mc, cx, obj, &reference.key, &Value::Object(*obj)),
        ReferenceBase::Unresolved => {
            // The binding may have been created since resolution.
            let global = cx.realm.global;
            if has_property(&global, &reference.key) {
                object_get(mc, cx, &global, &reference.key, &Value::Object(global))
            } else {
                Err(raise_reference_error!(format!("{} is not defined", reference.key)).into())
            }
        }
        ReferenceBase::Primitive(prim) => {
            if let Value::String(s) = prim {
                if reference.key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Some(index) = array_index(&reference.key) {
                    return Ok(s.chars().nth(index as usize).map(|c| Value::String(c.to_string())).unwrap_or(Value::Undefined));
                }
            }
            object_get(mc, cx, &cx.realm.object_prototype, &reference.key, prim)
        }
    }
}

pub fn put_value<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    reference: &Reference<'gc>,
    value: Value<'gc>,
) -> Result<(), EvalError<'gc>> {
    match &reference.base {
        ReferenceBase::Object(obj) => object_put(mc, cx, obj, &reference.key, value),
        ReferenceBase::Unresolved => object_put(mc, cx, &cx.realm.global, &reference.key, value),
        ReferenceBase::Primitive(_) => {
            log::debug!("discarding write of '{}' on a primitive", reference.key);
            Ok(())
        }
    }
}

pub fn delete_reference<'gc>(mc: &MutationContext<'gc>, reference: &Reference<'gc>) -> bool {
    match &reference.base {
        ReferenceBase::Object(obj) => object_delete(mc, obj, &reference.key),
        ReferenceBase::Unresolved | ReferenceBase::Primitive(_) => false,
    }
}
