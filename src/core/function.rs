use crate::core::{
    CodeType, Collect, ControlFlow, EvalError, ExecutionContext, FunctionNode, Gc, GcTrace, JSObjectDataPtr, MutationContext, ObjectClass,
    PropertyAttributes, Realm, ScopeRef, Value, define_value, evaluate_statements, hoist_declarations, new_js_object_data, new_scope,
    object_get_value, value_to_string,
};
use crate::{raise_range_error, raise_type_error};
use std::rc::Rc;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// A script function: its definition plus the scope chain it closes over.
pub struct ClosureData<'gc> {
    pub node: Rc<FunctionNode>,
    pub scope: ScopeRef<'gc>,
}

unsafe impl<'gc> Collect<'gc> for ClosureData<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        self.scope.trace(cc);
    }
}

/// Signature of a host function callable from script.
pub type NativeFn =
    for<'gc> fn(&MutationContext<'gc>, &ExecutionContext<'gc>, &Value<'gc>, &[Value<'gc>]) -> Result<Value<'gc>, EvalError<'gc>>;

#[derive(Clone, Copy, Collect)]
#[collect(require_static)]
pub struct NativeFunction {
    pub func: NativeFn,
    pub constructible: bool,
}

#[derive(Clone, Copy)]
pub enum Callable<'gc> {
    Closure(Gc<'gc, ClosureData<'gc>>),
    Native(NativeFunction),
}

unsafe impl<'gc> Collect<'gc> for Callable<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        if let Callable::Closure(closure) = self {
            closure.trace(cc);
        }
    }
}

fn function_name<'gc>(func: &JSObjectDataPtr<'gc>) -> String {
    match object_get_value(func, "name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => "anonymous".to_string(),
    }
}

/// Source text of a script function, or a native-code placeholder.
pub fn function_source_text<'gc>(func: &JSObjectDataPtr<'gc>) -> String {
    let callable = func.borrow().callable;
    match callable {
        Some(Callable::Closure(closure)) => closure.node.source_text.clone(),
        Some(Callable::Native(_)) => {
            let name = match object_get_value(func, "name") {
                Some(Value::String(name)) => name,
                _ => String::new(),
            };
            format!("function {name}() {{\n    [native code]\n}}")
        }
        None => value_to_string(&Value::Object(*func)),
    }
}

fn new_function_object<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    callable: Callable<'gc>,
    name: &str,
    arity: usize,
) -> JSObjectDataPtr<'gc> {
    let func = new_js_object_data(mc, Some(realm.function_prototype), ObjectClass::Function);
    {
        let mut f = func.borrow_mut(mc);
        f.callable = Some(callable);
        f.set_own("length", Value::Number(arity as f64), PropertyAttributes::empty());
        f.set_own("name", Value::String(name.to_string()), PropertyAttributes::empty());
    }
    func
}

/// Creates a function object for `node` closing over `scope`.
pub fn create_closure<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    node: Rc<FunctionNode>,
    scope: ScopeRef<'gc>,
) -> JSObjectDataPtr<'gc> {
    let name = node.name.clone().unwrap_or_default();
    let arity = node.params.len();
    let closure = Gc::new(mc, ClosureData { node, scope });
    let func = new_function_object(mc, &cx.realm, Callable::Closure(closure), &name, arity);
    let prototype = new_js_object_data(mc, Some(cx.realm.object_prototype), ObjectClass::Object);
    prototype
        .borrow_mut(mc)
        .set_own("constructor", Value::Object(func), PropertyAttributes::HIDDEN);
    func.borrow_mut(mc)
        .set_own("prototype", Value::Object(prototype), PropertyAttributes::WRITABLE);
    func
}

pub fn create_native_function<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    name: &str,
    arity: usize,
    func: NativeFn,
) -> JSObjectDataPtr<'gc> {
    let native = NativeFunction { func, constructible: false };
    new_function_object(mc, realm, Callable::Native(native), name, arity)
}

/// A native constructor wired to `prototype` in both directions.
pub fn create_native_constructor<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    name: &str,
    arity: usize,
    func: NativeFn,
    prototype: JSObjectDataPtr<'gc>,
) -> JSObjectDataPtr<'gc> {
    let native = NativeFunction { func, constructible: true };
    let ctor = new_function_object(mc, realm, Callable::Native(native), name, arity);
    ctor.borrow_mut(mc)
        .set_own("prototype", Value::Object(prototype), PropertyAttributes::empty());
    prototype
        .borrow_mut(mc)
        .set_own("constructor", Value::Object(ctor), PropertyAttributes::HIDDEN);
    ctor
}

/// Installs a native method on `target` as a hidden property.
pub fn define_native_method<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    target: &JSObjectDataPtr<'gc>,
    name: &str,
    arity: usize,
    func: NativeFn,
) {
    let method = create_native_function(mc, realm, name, arity, func);
    target
        .borrow_mut(mc)
        .set_own(name, Value::Object(method), PropertyAttributes::HIDDEN);
}

/// Invokes `callee` with the given `this` and arguments.
pub fn call_function<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    callee: &Value<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Some(func) = callee.as_callable() else {
        return Err(raise_type_error!(format!("{} is not a function", value_to_string(callee))).into());
    };
    if cx.depth >= cx.config.max_call_depth {
        return Err(raise_range_error!("Maximum call stack size exceeded").into());
    }
    let Some(callable) = func.borrow().callable else {
        return Err(raise_type_error!("object is not a function").into());
    };
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || match callable {
        Callable::Native(native) => {
            let native_cx = cx.for_native_call(func);
            (native.func)(mc, &native_cx, this, args)
        }
        Callable::Closure(closure) => call_closure(mc, cx, func, &closure, this, args),
    })
}

fn call_closure<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    func: JSObjectDataPtr<'gc>,
    closure: &ClosureData<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let node = &closure.node;
    let binding = PropertyAttributes::WRITABLE | PropertyAttributes::ENUMERABLE;

    let activation = new_js_object_data(mc, None, ObjectClass::Activation);
    let arguments = new_js_object_data(mc, Some(cx.realm.object_prototype), ObjectClass::Arguments);
    {
        let mut a = arguments.borrow_mut(mc);
        for (index, arg) in args.iter().enumerate() {
            a.set_own(index.to_string(), arg.clone(), PropertyAttributes::DEFAULT);
        }
        a.set_own("length", Value::Number(args.len() as f64), PropertyAttributes::HIDDEN);
        a.set_own("callee", Value::Object(func), PropertyAttributes::HIDDEN);
    }
    {
        let mut act = activation.borrow_mut(mc);
        act.set_own("arguments", Value::Object(arguments), PropertyAttributes::WRITABLE);
        for (index, param) in node.params.iter().enumerate() {
            act.set_own(param.as_str(), args.get(index).cloned().unwrap_or(Value::Undefined), binding);
        }
    }

    let this = match this {
        Value::Undefined | Value::Null => Value::Object(cx.realm.global),
        other => other.clone(),
    };
    let function_cx = ExecutionContext {
        realm: cx.realm,
        scope: new_scope(mc, activation, Some(closure.scope)),
        variables: activation,
        this,
        code_type: CodeType::Function,
        callee: Some(func),
        depth: cx.depth + 1,
        source_name: node.body.source_name.clone(),
        config: cx.config,
    };
    log::debug!(
        "call {} with {} args at depth {}",
        node.name.as_deref().unwrap_or("anonymous"),
        args.len(),
        function_cx.depth
    );

    let outcome = hoist_declarations(mc, &function_cx, &node.body).and_then(|_| evaluate_statements(mc, &function_cx, &node.body.statements));
    match outcome {
        Ok(ControlFlow::Return(value)) => Ok(value),
        Ok(ControlFlow::Throw(value, line, column)) => Err(EvalError::Throw(value, line, column)),
        Ok(_) => Ok(Value::Undefined),
        Err(EvalError::Js(mut err)) => {
            let line = err.js_line().unwrap_or(node.line);
            err.push_frame(format!("at {} ({}:{line})", function_name(&func), node.body.source_name));
            Err(EvalError::Js(err))
        }
        Err(other) => Err(other),
    }
}

/// `new callee(args)`.
pub fn construct<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    callee: &Value<'gc>,
    args: &[Value<'gc>],
) -> Result<Value<'gc>, EvalError<'gc>> {
    let Some(func) = callee.as_callable() else {
        return Err(raise_type_error!(format!("{} is not a constructor", value_to_string(callee))).into());
    };
    let callable = func.borrow().callable;
    if let Some(Callable::Native(native)) = callable {
        if !native.constructible {
            return Err(raise_type_error!(format!("{} is not a constructor", function_name(&func))).into());
        }
        // Native constructors allocate their own instance.
        return call_function(mc, cx, callee, &Value::Undefined, args);
    }
    let prototype = match object_get_value(&func, "prototype") {
        Some(Value::Object(proto)) => proto,
        _ => cx.realm.object_prototype,
    };
    let instance = new_js_object_data(mc, Some(prototype), ObjectClass::Object);
    let result = call_function(mc, cx, callee, &Value::Object(instance), args)?;
    Ok(match result {
        Value::Object(_) => result,
        _ => Value::Object(instance),
    })
}

/// `instanceof`: walks `value`'s prototype chain looking for `func.prototype`.
pub fn has_instance<'gc>(func: &JSObjectDataPtr<'gc>, value: &Value<'gc>) -> Result<bool, EvalError<'gc>> {
    let Value::Object(obj) = value else {
        return Ok(false);
    };
    let Some(Value::Object(prototype)) = object_get_value(func, "prototype") else {
        return Err(raise_type_error!("Function has non-object prototype in instanceof check").into());
    };
    let mut current = obj.borrow().prototype;
    while let Some(p) = current {
        if Gc::ptr_eq(p, prototype) {
            return Ok(true);
        }
        current = p.borrow().prototype;
    }
    Ok(false)
}

/// Binds a function's own name in a read-only scope between the closure and
/// the defining scope, for named function expressions.
pub fn create_named_function_expression<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    node: Rc<FunctionNode>,
) -> JSObjectDataPtr<'gc> {
    let Some(name) = node.name.clone() else {
        return create_closure(mc, cx, node, cx.scope);
    };
    let name_scope = new_js_object_data(mc, None, ObjectClass::Scope);
    let scope = new_scope(mc, name_scope, Some(cx.scope));
    let func = create_closure(mc, cx, node, scope);
    define_value(mc, &name_scope, &name, Value::Object(func), PropertyAttributes::ENUMERABLE);
    func
}
