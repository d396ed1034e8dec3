use crate::error::JSError;
use crate::js_array::initialize_array;
use crate::js_function::initialize_function;
use crate::js_global::initialize_global;
use crate::js_object::initialize_object;
use crate::js_regexp::initialize_regexp;
use crate::{JSErrorKind, make_js_error, raise_type_error};
pub(crate) use gc_arena::Mutation as MutationContext;
pub(crate) use gc_arena::collect::Trace as GcTrace;
pub(crate) use gc_arena::lock::RefLock as GcCell;
pub(crate) use gc_arena::{Collect, Gc};
pub(crate) type GcPtr<'gc, T> = Gc<'gc, GcCell<T>>;
use std::fmt;

#[inline]
pub fn new_gc_cell_ptr<'gc, T: 'gc + Collect<'gc>>(mc: &MutationContext<'gc>, value: T) -> GcPtr<'gc, T> {
    Gc::new(mc, GcCell::new(value))
}

mod token;
pub use token::*;

mod lexer;
pub use lexer::*;

mod statement;
pub use statement::*;

mod parser;
pub use parser::*;

pub(crate) mod number;

mod descriptor;
pub use descriptor::*;

mod object;
pub use object::*;

mod value;
pub use value::*;

mod context;
pub use context::*;

mod reference;
pub use reference::*;

mod function;
pub use function::*;

pub mod js_error;
pub use js_error::*;

mod eval;
pub use eval::*;

/// Limits applied to every evaluation run by an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Nesting depth of script and native calls before a RangeError.
    pub max_call_depth: usize,
    /// Back-edges one loop statement may take before the fatal
    /// InfiniteLoopError. `None` disables the check.
    pub max_loop_iterations: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: 400,
            max_loop_iterations: None,
        }
    }
}

#[derive(Collect)]
#[collect(no_drop)]
pub struct JsRoot<'gc> {
    pub realm: Realm<'gc>,
}

pub type JsArena = gc_arena::Arena<gc_arena::Rootable!['gc => JsRoot<'gc>]>;

/// Builds the global object and installs the intrinsics on it.
pub fn initialize_realm<'gc>(mc: &MutationContext<'gc>) -> Realm<'gc> {
    let realm = Realm::allocate(mc);
    initialize_object(mc, &realm);
    initialize_function(mc, &realm);
    initialize_array(mc, &realm);
    initialize_regexp(mc, &realm);
    initialize_error_constructors(mc, &realm);
    initialize_global(mc, &realm);
    log::debug!("realm initialized with {} global bindings", realm.global.borrow().properties.len());
    realm
}

/// Owned snapshot of a script value, valid outside the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Any non-callable object, with its class and ToString rendering.
    Object { class: String, display: String },
    Function { name: String, source: String },
}

impl ScriptValue {
    fn from_value<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, value: &Value<'gc>) -> Self {
        match value {
            Value::Undefined => ScriptValue::Undefined,
            Value::Null => ScriptValue::Null,
            Value::Boolean(b) => ScriptValue::Boolean(*b),
            Value::Number(n) => ScriptValue::Number(*n),
            Value::String(s) => ScriptValue::String(s.clone()),
            Value::Object(obj) => {
                if obj.borrow().is_callable() {
                    let name = match object_get_value(obj, "name") {
                        Some(Value::String(name)) => name,
                        _ => String::new(),
                    };
                    return ScriptValue::Function {
                        name,
                        source: function_source_text(obj),
                    };
                }
                // A throwing toString falls back to the class rendering.
                let display = to_js_string(mc, cx, value).unwrap_or_else(|_| value_to_string(value));
                ScriptValue::Object {
                    class: obj.borrow().class.name().to_string(),
                    display,
                }
            }
        }
    }

    fn to_primitive_value<'gc>(&self) -> Option<Value<'gc>> {
        Some(match self {
            ScriptValue::Undefined => Value::Undefined,
            ScriptValue::Null => Value::Null,
            ScriptValue::Boolean(b) => Value::Boolean(*b),
            ScriptValue::Number(n) => Value::Number(*n),
            ScriptValue::String(s) => Value::String(s.clone()),
            ScriptValue::Object { .. } | ScriptValue::Function { .. } => return None,
        })
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => write!(f, "undefined"),
            ScriptValue::Null => write!(f, "null"),
            ScriptValue::Boolean(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => write!(f, "{}", number::format_number(*n)),
            ScriptValue::String(s) => write!(f, "{s}"),
            ScriptValue::Object { display, .. } => write!(f, "{display}"),
            ScriptValue::Function { source, .. } => write!(f, "{source}"),
        }
    }
}

/// Turns an error that escaped the top-level program into the host-facing
/// error, rendering thrown script values with their `toString`.
fn uncaught_error<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, err: EvalError<'gc>) -> JSError {
    match err {
        EvalError::Js(e) => e,
        EvalError::Throw(value, line, column) => {
            let rendered = to_js_string(mc, cx, &value).unwrap_or_else(|_| value_to_string(&value));
            log::debug!("uncaught exception: {rendered}");
            let mut e = make_js_error!(JSErrorKind::Throw(rendered));
            if let Some(line) = line {
                e.set_js_location(Some(&cx.source_name), line, column);
            }
            e
        }
    }
}

/// An engine instance: one global object with its intrinsics, reused across
/// evaluations. Each engine owns its own arena and must stay on one thread.
pub struct Engine {
    arena: JsArena,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let arena = JsArena::new(|mc| JsRoot {
            realm: initialize_realm(mc),
        });
        log::debug!("engine created with {config:?}");
        Engine { arena, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses and runs `source` in the global scope, returning its completion
    /// value. `start_line` is the line number reported for the first line.
    pub fn evaluate(&mut self, source: &str, source_name: &str, start_line: usize) -> Result<ScriptValue, JSError> {
        let program = parse_program(source, source_name, start_line)?;
        log::trace!("parsed {} top-level statements from {source_name}", program.body.statements.len());
        let config = self.config;
        let result = self.arena.mutate(|mc, root| {
            let cx = ExecutionContext::global(mc, root.realm, program.source_name().clone(), config);
            match evaluate_program(mc, &cx, &program.body) {
                Ok(value) => Ok(ScriptValue::from_value(mc, &cx, &value)),
                Err(err) => Err(uncaught_error(mc, &cx, err)),
            }
        });
        self.arena.collect_debt();
        result
    }

    /// Like [`Engine::evaluate`], rendering the completion value as a string.
    pub fn evaluate_to_string(&mut self, source: &str, source_name: &str, start_line: usize) -> Result<String, JSError> {
        self.evaluate(source, source_name, start_line).map(|value| value.to_string())
    }

    /// Binds a primitive value on the global object.
    pub fn set_global(&mut self, name: &str, value: ScriptValue) -> Result<(), JSError> {
        self.arena.mutate(|mc, root| {
            let Some(value) = value.to_primitive_value() else {
                return Err(raise_type_error!(format!("cannot bind a non-primitive value to global '{name}'")));
            };
            root.realm
                .global
                .borrow_mut(mc)
                .set_own(name, value, PropertyAttributes::WRITABLE | PropertyAttributes::ENUMERABLE);
            Ok(())
        })
    }

    /// Exposes a host function to scripts as a global binding.
    pub fn register_function(&mut self, name: &str, arity: usize, func: NativeFn) {
        self.arena.mutate(|mc, root| {
            let function = create_native_function(mc, &root.realm, name, arity, func);
            root.realm
                .global
                .borrow_mut(mc)
                .set_own(name, Value::Object(function), PropertyAttributes::HIDDEN);
        });
        log::debug!("registered host function {name}/{arity}");
    }
}

/// Evaluates `script` in a fresh engine and renders the completion value.
pub fn evaluate_script<T, P>(script: T, script_path: Option<P>) -> Result<String, JSError>
where
    T: AsRef<str>,
    P: AsRef<std::path::Path>,
{
    let source_name = match script_path.as_ref() {
        Some(path) => path.as_ref().to_string_lossy().to_string(),
        None => "<script>".to_string(),
    };
    Engine::new().evaluate_to_string(script.as_ref(), &source_name, 1)
}
