pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod js_array;
pub(crate) mod js_function;
pub(crate) mod js_global;
pub(crate) mod js_object;
pub(crate) mod js_regexp;

pub use core::{
    BinaryOp, CodeType, Engine, EngineConfig, EvalError, ExecutionContext, Expr, FunctionForm, FunctionNode, JsArena, JsRoot, Lexer,
    JSObjectDataPtr, ObjectClass, Parser, PreferredType, Program, PropertyAttributes, Realm, ScriptBody, ScriptValue, Statement, StatementKind,
    TokenData, TokenKind, TokenValue, Value, evaluate_script, get_value, object_enumerate, object_get, object_put, parse_program, put_value,
    resolve_identifier, to_boolean, to_js_string, to_number, to_primitive, type_of, value_to_string,
};
pub use core::{NativeFn, create_native_function, new_js_object_data};
pub use error::{JSError, JSErrorKind};
pub use gc_arena::Mutation as MutationContext;
