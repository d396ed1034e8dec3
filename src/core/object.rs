use crate::core::{
    Callable, Collect, EvalError, ExecutionContext, GcPtr, GcTrace, MutationContext, PropertyAttributes, PropertyDescriptor, PropertySlot,
    Value, call_function, new_gc_cell_ptr, number::to_uint32, to_number,
};
use crate::raise_range_error;
use indexmap::IndexMap;
use std::rc::Rc;

pub type JSObjectDataPtr<'gc> = GcPtr<'gc, JSObjectData<'gc>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Object,
    Function,
    Array,
    Arguments,
    Error,
    RegExp,
    /// Variable object of a function invocation.
    Activation,
    /// Block scope such as a catch clause or a named function expression.
    Scope,
    Global,
}

impl ObjectClass {
    pub fn name(self) -> &'static str {
        match self {
            ObjectClass::Object | ObjectClass::Activation | ObjectClass::Scope => "Object",
            ObjectClass::Function => "Function",
            ObjectClass::Array => "Array",
            ObjectClass::Arguments => "Arguments",
            ObjectClass::Error => "Error",
            ObjectClass::RegExp => "RegExp",
            ObjectClass::Global => "global",
        }
    }
}

/// Compiled pattern of a RegExp object.
pub struct RegExpData {
    pub regex: regress::Regex,
    pub source: String,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
}

/// Host data attached to an object that is invisible to scripts.
#[derive(Clone)]
pub enum InternalSlot {
    RegExp(Rc<RegExpData>),
}

pub struct JSObjectData<'gc> {
    pub properties: IndexMap<String, PropertyDescriptor<'gc>>,
    pub prototype: Option<JSObjectDataPtr<'gc>>,
    pub class: ObjectClass,
    pub callable: Option<Callable<'gc>>,
    pub internal: Option<InternalSlot>,
}

unsafe impl<'gc> Collect<'gc> for JSObjectData<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        for desc in self.properties.values() {
            desc.trace(cc);
        }
        if let Some(p) = &self.prototype {
            p.trace(cc);
        }
        if let Some(callable) = &self.callable {
            callable.trace(cc);
        }
    }
}

impl<'gc> JSObjectData<'gc> {
    pub fn new(prototype: Option<JSObjectDataPtr<'gc>>, class: ObjectClass) -> Self {
        JSObjectData {
            properties: IndexMap::new(),
            prototype,
            class,
            callable: None,
            internal: None,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    /// Inserts or replaces an own data property.
    pub fn set_own(&mut self, key: impl Into<String>, value: Value<'gc>, attributes: PropertyAttributes) {
        self.properties.insert(key.into(), PropertyDescriptor::new_data(value, attributes));
    }

    pub fn regexp(&self) -> Option<Rc<RegExpData>> {
        match &self.internal {
            Some(InternalSlot::RegExp(data)) => Some(data.clone()),
            None => None,
        }
    }
}

#[inline]
pub fn new_js_object_data<'gc>(mc: &MutationContext<'gc>, prototype: Option<JSObjectDataPtr<'gc>>, class: ObjectClass) -> JSObjectDataPtr<'gc> {
    new_gc_cell_ptr(mc, JSObjectData::new(prototype, class))
}

/// Canonical array index of `key`, if it is one.
pub fn array_index(key: &str) -> Option<u32> {
    let index: u32 = key.parse().ok()?;
    (index != u32::MAX && index.to_string() == key).then_some(index)
}

pub fn get_own_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &str) -> Option<PropertyDescriptor<'gc>> {
    obj.borrow().properties.get(key).cloned()
}

/// Looks `key` up along the prototype chain.
pub fn get_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &str) -> Option<PropertyDescriptor<'gc>> {
    let mut current = Some(*obj);
    while let Some(o) = current {
        let borrowed = o.borrow();
        if let Some(desc) = borrowed.properties.get(key) {
            return Some(desc.clone());
        }
        current = borrowed.prototype;
    }
    None
}

pub fn has_own_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &str) -> bool {
    obj.borrow().properties.contains_key(key)
}

pub fn has_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &str) -> bool {
    get_property(obj, key).is_some()
}

/// Reads a property, running a getter with `receiver` as `this`.
pub fn object_get<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    key: &str,
    receiver: &Value<'gc>,
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Some(desc) = get_property(obj, key) else {
        return Ok(Value::Undefined);
    };
    match desc.slot {
        PropertySlot::Value(v) => Ok(v),
        PropertySlot::Accessor { get: Some(getter), .. } => call_function(mc, cx, &Value::Object(getter), receiver, &[]),
        PropertySlot::Accessor { get: None, .. } => Ok(Value::Undefined),
    }
}

/// Data value of a property without running accessors.
pub fn object_get_value<'gc>(obj: &JSObjectDataPtr<'gc>, key: &str) -> Option<Value<'gc>> {
    get_property(obj, key).and_then(|desc| desc.value().cloned())
}

/// Assignment semantics: writes an own data property, runs a setter found on
/// the object or its prototypes, and otherwise creates a new own property.
/// Read-only properties, own or inherited, silently ignore the write.
pub fn object_put<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    key: &str,
    value: Value<'gc>,
) -> Result<(), EvalError<'gc>> {
    let (class, own) = {
        let borrowed = obj.borrow();
        (borrowed.class, borrowed.properties.get(key).cloned())
    };
    if class == ObjectClass::Array && key == "length" {
        return set_array_length(mc, cx, obj, &value);
    }

    if let Some(desc) = own {
        match desc.slot {
            PropertySlot::Value(_) if !desc.writable() => {
                log::debug!("ignoring write to read-only property '{key}'");
            }
            PropertySlot::Value(_) => {
                if let Some(existing) = obj.borrow_mut(mc).properties.get_mut(key) {
                    existing.slot = PropertySlot::Value(value);
                }
            }
            PropertySlot::Accessor { set: Some(setter), .. } => {
                call_function(mc, cx, &Value::Object(setter), &Value::Object(*obj), &[value])?;
            }
            PropertySlot::Accessor { set: None, .. } => {
                log::debug!("ignoring write to getter-only property '{key}'");
            }
        }
        return Ok(());
    }

    let mut proto = obj.borrow().prototype;
    while let Some(p) = proto {
        let inherited = p.borrow().properties.get(key).cloned();
        if let Some(desc) = inherited {
            match desc.slot {
                PropertySlot::Value(_) if desc.writable() => break,
                PropertySlot::Value(_) => {
                    log::debug!("inherited read-only property '{key}' blocks the write");
                    return Ok(());
                }
                PropertySlot::Accessor { set: Some(setter), .. } => {
                    call_function(mc, cx, &Value::Object(setter), &Value::Object(*obj), &[value])?;
                    return Ok(());
                }
                PropertySlot::Accessor { set: None, .. } => return Ok(()),
            }
        }
        proto = p.borrow().prototype;
    }

    define_value(mc, obj, key, value, PropertyAttributes::DEFAULT);
    Ok(())
}

/// Defines or replaces an own data property, keeping an array's length in step.
pub fn define_value<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: &str, value: Value<'gc>, attributes: PropertyAttributes) {
    define_own_property(mc, obj, key, PropertyDescriptor::new_data(value, attributes));
}

pub fn define_own_property<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: &str, desc: PropertyDescriptor<'gc>) {
    let mut borrowed = obj.borrow_mut(mc);
    borrowed.properties.insert(key.to_string(), desc);
    if borrowed.class == ObjectClass::Array
        && let Some(index) = array_index(key)
    {
        let length = borrowed.properties.get("length").and_then(|d| d.value().cloned());
        let length = match length {
            Some(Value::Number(n)) => n,
            _ => 0.0,
        };
        if index as f64 >= length {
            borrowed.set_own("length", Value::Number(index as f64 + 1.0), PropertyAttributes::WRITABLE);
        }
    }
}

/// Defines a getter or setter half of an accessor, merging with an existing pair.
pub fn define_accessor<'gc>(
    mc: &MutationContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    key: &str,
    getter: Option<JSObjectDataPtr<'gc>>,
    setter: Option<JSObjectDataPtr<'gc>>,
) {
    let (mut get, mut set) = match get_own_property(obj, key).map(|d| d.slot) {
        Some(PropertySlot::Accessor { get, set }) => (get, set),
        _ => (None, None),
    };
    if getter.is_some() {
        get = getter;
    }
    if setter.is_some() {
        set = setter;
    }
    define_own_property(mc, obj, key, PropertyDescriptor::new_accessor(get, set, PropertyAttributes::DEFAULT));
}

fn set_array_length<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    value: &Value<'gc>,
) -> Result<(), EvalError<'gc>> {
    let requested = to_number(mc, cx, value)?;
    let length = to_uint32(requested);
    if length as f64 != requested {
        return Err(raise_range_error!("Invalid array length").into());
    }
    let mut borrowed = obj.borrow_mut(mc);
    borrowed.properties.retain(|key, _| array_index(key).is_none_or(|index| index < length));
    borrowed.set_own("length", Value::Number(length as f64), PropertyAttributes::WRITABLE);
    Ok(())
}

/// Length of an array-like object, zero when absent.
pub fn array_length<'gc>(obj: &JSObjectDataPtr<'gc>) -> u32 {
    match object_get_value(obj, "length") {
        Some(Value::Number(n)) => to_uint32(n),
        _ => 0,
    }
}

/// Removes an own configurable property. Returns false when the property is
/// absent or cannot be deleted.
pub fn object_delete<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: &str) -> bool {
    let configurable = match obj.borrow().properties.get(key) {
        Some(desc) => desc.configurable(),
        None => return false,
    };
    if !configurable {
        log::debug!("refusing to delete non-configurable property '{key}'");
        return false;
    }
    obj.borrow_mut(mc).properties.shift_remove(key).is_some()
}

/// Own enumerable data property names in insertion order.
pub fn object_enumerate<'gc>(obj: &JSObjectDataPtr<'gc>) -> Vec<String> {
    obj.borrow()
        .properties
        .iter()
        .filter(|(_, desc)| desc.enumerable() && !desc.is_accessor())
        .map(|(key, _)| key.clone())
        .collect()
}
