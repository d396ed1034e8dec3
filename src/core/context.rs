use crate::core::{Collect, EngineConfig, Gc, JSObjectDataPtr, MutationContext, ObjectClass, Value, new_js_object_data};
use std::rc::Rc;

/// The global object and the intrinsic prototypes every new object links to.
#[derive(Clone, Copy, Collect)]
#[collect(no_drop)]
pub struct Realm<'gc> {
    pub global: JSObjectDataPtr<'gc>,
    pub object_prototype: JSObjectDataPtr<'gc>,
    pub function_prototype: JSObjectDataPtr<'gc>,
    pub array_prototype: JSObjectDataPtr<'gc>,
    pub regexp_prototype: JSObjectDataPtr<'gc>,
    pub error_prototype: JSObjectDataPtr<'gc>,
    pub type_error_prototype: JSObjectDataPtr<'gc>,
    pub reference_error_prototype: JSObjectDataPtr<'gc>,
    pub syntax_error_prototype: JSObjectDataPtr<'gc>,
    pub range_error_prototype: JSObjectDataPtr<'gc>,
    pub uri_error_prototype: JSObjectDataPtr<'gc>,
    pub eval_error_prototype: JSObjectDataPtr<'gc>,
}

impl<'gc> Realm<'gc> {
    /// Allocates the global object and bare intrinsic prototypes. Their methods
    /// are installed afterwards, once function objects can be created.
    pub fn allocate(mc: &MutationContext<'gc>) -> Self {
        let object_prototype = new_js_object_data(mc, None, ObjectClass::Object);
        let object = |class| new_js_object_data(mc, Some(object_prototype), class);
        let error_prototype = object(ObjectClass::Error);
        let error_subtype = || new_js_object_data(mc, Some(error_prototype), ObjectClass::Error);
        Realm {
            global: object(ObjectClass::Global),
            object_prototype,
            function_prototype: object(ObjectClass::Function),
            array_prototype: object(ObjectClass::Array),
            regexp_prototype: object(ObjectClass::Object),
            error_prototype,
            type_error_prototype: error_subtype(),
            reference_error_prototype: error_subtype(),
            syntax_error_prototype: error_subtype(),
            range_error_prototype: error_subtype(),
            uri_error_prototype: error_subtype(),
            eval_error_prototype: error_subtype(),
        }
    }

    pub fn error_prototype_for(&self, constructor_name: &str) -> JSObjectDataPtr<'gc> {
        match constructor_name {
            "TypeError" => self.type_error_prototype,
            "ReferenceError" => self.reference_error_prototype,
            "SyntaxError" => self.syntax_error_prototype,
            "RangeError" => self.range_error_prototype,
            "URIError" => self.uri_error_prototype,
            "EvalError" => self.eval_error_prototype,
            _ => self.error_prototype,
        }
    }
}

/// One link of the scope chain.
#[derive(Collect)]
#[collect(no_drop)]
pub struct ScopeFrame<'gc> {
    pub object: JSObjectDataPtr<'gc>,
    pub parent: Option<ScopeRef<'gc>>,
}

pub type ScopeRef<'gc> = Gc<'gc, ScopeFrame<'gc>>;

pub fn new_scope<'gc>(mc: &MutationContext<'gc>, object: JSObjectDataPtr<'gc>, parent: Option<ScopeRef<'gc>>) -> ScopeRef<'gc> {
    Gc::new(mc, ScopeFrame { object, parent })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    Global,
    Eval,
    Function,
}

/// State of the code currently running. Lives on the Rust stack for the
/// duration of one script, eval or function body.
#[derive(Clone)]
pub struct ExecutionContext<'gc> {
    pub realm: Realm<'gc>,
    pub scope: ScopeRef<'gc>,
    /// Object receiving `var` and function declarations.
    pub variables: JSObjectDataPtr<'gc>,
    pub this: Value<'gc>,
    pub code_type: CodeType,
    /// Function object being executed, for function and native code.
    pub callee: Option<JSObjectDataPtr<'gc>>,
    pub depth: usize,
    pub source_name: Rc<str>,
    pub config: EngineConfig,
}

impl<'gc> ExecutionContext<'gc> {
    pub fn global(mc: &MutationContext<'gc>, realm: Realm<'gc>, source_name: Rc<str>, config: EngineConfig) -> Self {
        ExecutionContext {
            realm,
            scope: new_scope(mc, realm.global, None),
            variables: realm.global,
            this: Value::Object(realm.global),
            code_type: CodeType::Global,
            callee: None,
            depth: 0,
            source_name,
            config,
        }
    }

    /// Same context with `object` pushed as the innermost scope.
    pub fn with_scope(&self, mc: &MutationContext<'gc>, object: JSObjectDataPtr<'gc>) -> Self {
        ExecutionContext {
            scope: new_scope(mc, object, Some(self.scope)),
            ..self.clone()
        }
    }

    /// Context seen by a native function invoked from this one.
    pub fn for_native_call(&self, callee: JSObjectDataPtr<'gc>) -> Self {
        ExecutionContext {
            callee: Some(callee),
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Context for eval code: the caller's scope, variables and `this`.
    pub fn for_eval(&self, source_name: Rc<str>) -> Self {
        ExecutionContext {
            code_type: CodeType::Eval,
            source_name,
            ..self.clone()
        }
    }

    /// Iterates scope objects from innermost to the global object.
    pub fn scope_objects(&self) -> impl Iterator<Item = JSObjectDataPtr<'gc>> {
        let mut frame = Some(self.scope);
        std::iter::from_fn(move || {
            let current = frame?;
            frame = current.parent;
            Some(current.object)
        })
    }
}
