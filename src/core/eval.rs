use crate::core::{
    BinaryOp, CatchClause, CodeType, EvalError, ExecutionContext, Expr, ForInit, FunctionForm, JSObjectDataPtr, LogicalOp, MutationContext,
    ObjectClass, PreferredType, PropertyAttributes, PropertyInit, PropertySlot, Reference, ReferenceBase, ScriptBody, Statement, StatementKind,
    SwitchCase, TargetId, UnaryOp, UpdateOp, Value, call_function, construct, create_closure, create_named_function_expression,
    define_accessor, define_value, delete_reference, get_own_property, get_value, has_instance, has_property, js_error_to_value,
    loose_equals,
    number::{to_int32, to_uint32},
    new_js_object_data, object_enumerate, put_value, resolve_identifier, strict_equals, to_boolean, to_js_string, to_number, to_primitive,
    type_of, value_to_string,
};
use crate::{JSErrorKind, make_js_error, raise_eval_error, raise_reference_error, raise_type_error};

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Completion of a statement. Break and continue carry the identity of the
/// statement they target, assigned by the parser.
#[derive(Debug)]
pub enum ControlFlow<'gc> {
    Normal(Option<Value<'gc>>),
    Return(Value<'gc>),
    Throw(Value<'gc>, Option<usize>, Option<usize>),
    Break(TargetId),
    Continue(TargetId),
}

/// Result of evaluating an expression node: a value, or a reference that is
/// only dereferenced when the consumer needs a value.
pub enum Evaluated<'gc> {
    Value(Value<'gc>),
    Reference(Reference<'gc>),
}

impl<'gc> Evaluated<'gc> {
    pub fn into_value(self, mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        match self {
            Evaluated::Value(v) => Ok(v),
            Evaluated::Reference(r) => get_value(mc, cx, &r),
        }
    }
}

/// Runs a whole script or eval body in `cx` and returns its completion value.
pub fn evaluate_program<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, body: &ScriptBody) -> Result<Value<'gc>, EvalError<'gc>> {
    hoist_declarations(mc, cx, body)?;
    match evaluate_statements(mc, cx, &body.statements)? {
        ControlFlow::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
        ControlFlow::Return(value) => Ok(value),
        ControlFlow::Throw(value, line, column) => Err(EvalError::Throw(value, line, column)),
        ControlFlow::Break(_) | ControlFlow::Continue(_) => Err(raise_eval_error!("unhandled control signal at top level").into()),
    }
}

fn binding_attributes(cx: &ExecutionContext<'_>) -> PropertyAttributes {
    match cx.code_type {
        CodeType::Eval => PropertyAttributes::ENUMERABLE | PropertyAttributes::CONFIGURABLE,
        CodeType::Global | CodeType::Function => PropertyAttributes::ENUMERABLE,
    }
}

/// Binds a body's function declarations and `var`/`const` names on the
/// variable object before any statement runs.
pub fn hoist_declarations<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, body: &ScriptBody) -> Result<(), EvalError<'gc>> {
    let variables = cx.variables;
    let binding = binding_attributes(cx);
    for node in &body.fun_decls {
        let Some(name) = &node.name else {
            continue;
        };
        let func = create_closure(mc, cx, node.clone(), cx.scope);
        define_value(mc, &variables, name, Value::Object(func), binding | PropertyAttributes::WRITABLE);
    }
    for decl in &body.var_decls {
        let exists = get_own_property(&variables, &decl.name).is_some();
        if decl.read_only {
            if exists {
                let mut err = raise_type_error!(format!("redeclaration of const {}", decl.name));
                err.set_js_location(Some(&body.source_name), decl.line, None);
                return Err(err.into());
            }
            define_value(mc, &variables, &decl.name, Value::Undefined, binding);
        } else if !exists {
            define_value(mc, &variables, &decl.name, Value::Undefined, binding | PropertyAttributes::WRITABLE);
        }
    }
    log::debug!(
        "hoisted {} functions and {} variables ({:?} code)",
        body.fun_decls.len(),
        body.var_decls.len(),
        cx.code_type
    );
    Ok(())
}

pub fn evaluate_statements<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    statements: &[Statement],
) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    let mut last = None;
    for statement in statements {
        match evaluate_statement(mc, cx, statement)? {
            ControlFlow::Normal(value) => {
                if value.is_some() {
                    last = value;
                }
            }
            other => return Ok(other),
        }
    }
    Ok(ControlFlow::Normal(last))
}

fn evaluate_statement<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, statement: &Statement) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    log::trace!("{}:{} executing statement", cx.source_name, statement.line);
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || evaluate_statement_inner(mc, cx, statement)).map_err(|err| match err {
        EvalError::Js(mut e) => {
            e.set_js_location(Some(&cx.source_name), statement.line, Some(statement.column));
            EvalError::Js(e)
        }
        EvalError::Throw(value, None, None) => EvalError::Throw(value, Some(statement.line), Some(statement.column)),
        other => other,
    })
}

fn evaluate_statement_inner<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    statement: &Statement,
) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    match &statement.kind {
        StatementKind::Empty => Ok(ControlFlow::Normal(None)),
        StatementKind::Debugger => {
            log::warn!("debugger statement at {}:{} ignored", cx.source_name, statement.line);
            Ok(ControlFlow::Normal(None))
        }
        StatementKind::Expr(expr) => Ok(ControlFlow::Normal(Some(evaluate_expr(mc, cx, expr)?))),
        StatementKind::Var { decls, read_only } => {
            for decl in decls {
                let Some(init) = &decl.init else {
                    continue;
                };
                let value = evaluate_expr(mc, cx, init)?;
                if *read_only {
                    initialize_const(mc, cx, &decl.name, value);
                } else {
                    let reference = resolve_identifier(cx, &decl.name);
                    put_value(mc, cx, &reference, value)?;
                }
            }
            Ok(ControlFlow::Normal(None))
        }
        StatementKind::Function(node) => {
            // Declared functions were bound during hoisting.
            if node.form == FunctionForm::Statement
                && let Some(name) = &node.name
            {
                let func = create_closure(mc, cx, node.clone(), cx.scope);
                let attributes = binding_attributes(cx) | PropertyAttributes::WRITABLE;
                define_value(mc, &cx.variables, name, Value::Object(func), attributes);
            }
            Ok(ControlFlow::Normal(None))
        }
        StatementKind::Block(statements) => evaluate_statements(mc, cx, statements),
        StatementKind::If {
            condition,
            then_part,
            else_part,
        } => {
            if to_boolean(&evaluate_expr(mc, cx, condition)?) {
                evaluate_statement(mc, cx, then_part)
            } else if let Some(else_part) = else_part {
                evaluate_statement(mc, cx, else_part)
            } else {
                Ok(ControlFlow::Normal(None))
            }
        }
        StatementKind::Switch {
            target,
            discriminant,
            cases,
            default_index,
        } => evaluate_switch(mc, cx, *target, discriminant, cases, *default_index),
        StatementKind::For {
            target,
            setup,
            condition,
            update,
            body,
        } => {
            match setup {
                Some(ForInit::Var(var)) => {
                    evaluate_statement(mc, cx, var)?;
                }
                Some(ForInit::Expr(expr)) => {
                    evaluate_expr(mc, cx, expr)?;
                }
                None => {}
            }
            let mut guard = LoopGuard::new(cx);
            let mut last = None;
            loop {
                if let Some(condition) = condition
                    && !to_boolean(&evaluate_expr(mc, cx, condition)?)
                {
                    break;
                }
                guard.tick()?;
                let flow = evaluate_statement(mc, cx, body)?;
                if let Some(exit) = loop_exit(flow, *target, &mut last) {
                    return Ok(exit);
                }
                if let Some(update) = update {
                    evaluate_expr(mc, cx, update)?;
                }
            }
            Ok(ControlFlow::Normal(last))
        }
        StatementKind::ForIn {
            target,
            var_decl,
            iterator,
            object,
            body,
        } => {
            if let Some(var) = var_decl {
                evaluate_statement(mc, cx, var)?;
            }
            let subject = evaluate_expr(mc, cx, object)?;
            // The key list is fixed before the first iteration.
            let keys: Vec<String> = match &subject {
                Value::Object(obj) => object_enumerate(obj),
                Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
                _ => Vec::new(),
            };
            let mut guard = LoopGuard::new(cx);
            let mut last = None;
            for key in keys {
                guard.tick()?;
                let reference = evaluate_reference(mc, cx, iterator)?;
                put_value(mc, cx, &reference, Value::String(key))?;
                let flow = evaluate_statement(mc, cx, body)?;
                if let Some(exit) = loop_exit(flow, *target, &mut last) {
                    return Ok(exit);
                }
            }
            Ok(ControlFlow::Normal(last))
        }
        StatementKind::While { target, condition, body } => {
            let mut guard = LoopGuard::new(cx);
            let mut last = None;
            while to_boolean(&evaluate_expr(mc, cx, condition)?) {
                guard.tick()?;
                let flow = evaluate_statement(mc, cx, body)?;
                if let Some(exit) = loop_exit(flow, *target, &mut last) {
                    return Ok(exit);
                }
            }
            Ok(ControlFlow::Normal(last))
        }
        StatementKind::DoWhile { target, body, condition } => {
            let mut guard = LoopGuard::new(cx);
            let mut last = None;
            loop {
                guard.tick()?;
                let flow = evaluate_statement(mc, cx, body)?;
                if let Some(exit) = loop_exit(flow, *target, &mut last) {
                    return Ok(exit);
                }
                if !to_boolean(&evaluate_expr(mc, cx, condition)?) {
                    break;
                }
            }
            Ok(ControlFlow::Normal(last))
        }
        StatementKind::Break(target) => Ok(ControlFlow::Break(*target)),
        StatementKind::Continue(target) => Ok(ControlFlow::Continue(*target)),
        StatementKind::Return(value) => {
            let value = match value {
                Some(expr) => evaluate_expr(mc, cx, expr)?,
                None => Value::Undefined,
            };
            Ok(ControlFlow::Return(value))
        }
        StatementKind::Throw(expr) => {
            let value = evaluate_expr(mc, cx, expr)?;
            Ok(ControlFlow::Throw(value, Some(statement.line), Some(statement.column)))
        }
        StatementKind::Try {
            block,
            catch_clauses,
            finally_block,
        } => evaluate_try(mc, cx, block, catch_clauses, finally_block.as_deref()),
        StatementKind::With { object, body } => {
            let Value::Object(scope_object) = evaluate_expr(mc, cx, object)? else {
                return Err(raise_type_error!(format!("{} is not an object", object.describe())).into());
            };
            let inner = cx.with_scope(mc, scope_object);
            evaluate_statement(mc, &inner, body)
        }
        StatementKind::Labeled { target, body, .. } => match evaluate_statement(mc, cx, body)? {
            ControlFlow::Break(t) if t == *target => Ok(ControlFlow::Normal(None)),
            other => Ok(other),
        },
    }
}

/// Counts back-edges of one loop statement against the configured bound.
struct LoopGuard {
    limit: Option<usize>,
    count: usize,
}

impl LoopGuard {
    fn new(cx: &ExecutionContext<'_>) -> Self {
        LoopGuard {
            limit: cx.config.max_loop_iterations,
            count: 0,
        }
    }

    fn tick<'gc>(&mut self) -> Result<(), EvalError<'gc>> {
        self.count += 1;
        match self.limit {
            Some(limit) if self.count > limit => Err(make_js_error!(JSErrorKind::InfiniteLoopError { iterations: limit }).into()),
            _ => Ok(()),
        }
    }
}

/// Interprets a loop body's completion. `None` means keep iterating.
fn loop_exit<'gc>(flow: ControlFlow<'gc>, target: TargetId, last: &mut Option<Value<'gc>>) -> Option<ControlFlow<'gc>> {
    match flow {
        ControlFlow::Normal(value) => {
            if value.is_some() {
                *last = value;
            }
            None
        }
        ControlFlow::Continue(t) if t == target => None,
        ControlFlow::Break(t) if t == target => Some(ControlFlow::Normal(last.take())),
        other => Some(other),
    }
}

fn evaluate_switch<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    target: TargetId,
    discriminant: &Expr,
    cases: &[SwitchCase],
    default_index: Option<usize>,
) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    let subject = evaluate_expr(mc, cx, discriminant)?;
    let mut start = None;
    for (index, case) in cases.iter().enumerate() {
        if let Some(label) = &case.label {
            let candidate = evaluate_expr(mc, cx, label)?;
            if loose_equals(mc, cx, &subject, &candidate)? {
                start = Some(index);
                break;
            }
        }
    }
    let Some(start) = start.or(default_index) else {
        return Ok(ControlFlow::Normal(None));
    };
    let mut last = None;
    for case in &cases[start..] {
        match evaluate_statements(mc, cx, &case.body)? {
            ControlFlow::Normal(value) => {
                if value.is_some() {
                    last = value;
                }
            }
            ControlFlow::Break(t) if t == target => return Ok(ControlFlow::Normal(last)),
            other => return Ok(other),
        }
    }
    Ok(ControlFlow::Normal(last))
}

fn evaluate_try<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    block: &[Statement],
    catch_clauses: &[CatchClause],
    finally_block: Option<&[Statement]>,
) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    let mut outcome = match evaluate_statements(mc, cx, block) {
        Ok(ControlFlow::Throw(value, line, column)) => Err(EvalError::Throw(value, line, column)),
        other => other,
    };
    if !catch_clauses.is_empty() {
        outcome = match outcome {
            Err(err) if err.is_catchable() => run_catch_clauses(mc, cx, catch_clauses, err),
            other => other,
        };
    }
    // A fatal abort skips finally blocks too.
    if let Err(err) = &outcome
        && !err.is_catchable()
    {
        return outcome;
    }
    if let Some(finally_block) = finally_block {
        // An abrupt finally replaces whatever the try or catch produced.
        match evaluate_statements(mc, cx, finally_block)? {
            ControlFlow::Normal(_) => {}
            abrupt => return Ok(abrupt),
        }
    }
    outcome
}

fn run_catch_clauses<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    catch_clauses: &[CatchClause],
    err: EvalError<'gc>,
) -> Result<ControlFlow<'gc>, EvalError<'gc>> {
    let (exception, original) = match err {
        EvalError::Throw(value, line, column) => (value.clone(), EvalError::Throw(value, line, column)),
        EvalError::Js(e) => (js_error_to_value(mc, &cx.realm, &e), EvalError::Js(e)),
    };
    for clause in catch_clauses {
        let scope_object = new_js_object_data(mc, None, ObjectClass::Scope);
        define_value(
            mc,
            &scope_object,
            &clause.param,
            exception.clone(),
            PropertyAttributes::WRITABLE | PropertyAttributes::ENUMERABLE,
        );
        let catch_cx = cx.with_scope(mc, scope_object);
        if let Some(guard) = &clause.guard
            && !to_boolean(&evaluate_expr(mc, &catch_cx, guard)?)
        {
            continue;
        }
        log::debug!("exception caught by clause binding '{}'", clause.param);
        return evaluate_statements(mc, &catch_cx, &clause.body);
    }
    Err(original)
}

/// Assigns the initializer of a `const`, bypassing its read-only attribute.
fn initialize_const<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, name: &str, value: Value<'gc>) {
    let owner = cx.scope_objects().find(|object| object.borrow().properties.contains_key(name));
    match owner {
        Some(object) => {
            if let Some(desc) = object.borrow_mut(mc).properties.get_mut(name) {
                desc.slot = PropertySlot::Value(value);
            }
        }
        None => define_value(mc, &cx.variables, name, value, binding_attributes(cx)),
    }
}

pub fn evaluate_expr<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, expr: &Expr) -> Result<Value<'gc>, EvalError<'gc>> {
    evaluate_node(mc, cx, expr)?.into_value(mc, cx)
}

fn evaluate_reference<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, expr: &Expr) -> Result<Reference<'gc>, EvalError<'gc>> {
    match evaluate_node(mc, cx, expr)? {
        Evaluated::Reference(reference) => Ok(reference),
        Evaluated::Value(_) => Err(raise_reference_error!(format!("invalid assignment target: {}", expr.describe())).into()),
    }
}

fn evaluate_arguments<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, args: &[Expr]) -> Result<Vec<Value<'gc>>, EvalError<'gc>> {
    args.iter().map(|arg| evaluate_expr(mc, cx, arg)).collect()
}

fn property_base<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, object: &Expr) -> Result<Value<'gc>, EvalError<'gc>> {
    let base = evaluate_expr(mc, cx, object)?;
    if base.is_null_or_undefined() {
        return Err(raise_type_error!(format!("{} is {}", object.describe(), value_to_string(&base))).into());
    }
    Ok(base)
}

pub fn evaluate_node<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, expr: &Expr) -> Result<Evaluated<'gc>, EvalError<'gc>> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || evaluate_node_inner(mc, cx, expr))
}

fn evaluate_node_inner<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, expr: &Expr) -> Result<Evaluated<'gc>, EvalError<'gc>> {
    let value = match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::String(s) => Value::String(s.clone()),
        Expr::Boolean(b) => Value::Boolean(*b),
        Expr::Null => Value::Null,
        Expr::This => cx.this.clone(),
        Expr::RegExp { pattern, flags } => Value::Object(crate::js_regexp::create_regexp(mc, &cx.realm, pattern, flags)?),
        Expr::Identifier(name) => return Ok(Evaluated::Reference(resolve_identifier(cx, name))),
        Expr::Group(inner) => return evaluate_node(mc, cx, inner),
        Expr::Member(object, name) => {
            let base = property_base(mc, cx, object)?;
            return Ok(Evaluated::Reference(Reference::property(&base, name.clone())));
        }
        Expr::Index(object, index) => {
            let base = property_base(mc, cx, object)?;
            let key = evaluate_expr(mc, cx, index)?;
            let key = to_js_string(mc, cx, &key)?;
            return Ok(Evaluated::Reference(Reference::property(&base, key)));
        }
        Expr::Array(elements) => {
            let array = crate::js_array::create_array(mc, &cx.realm);
            for (index, element) in elements.iter().enumerate() {
                if let Some(element) = element {
                    let value = evaluate_expr(mc, cx, element)?;
                    define_value(mc, &array, &index.to_string(), value, PropertyAttributes::DEFAULT);
                }
            }
            array
                .borrow_mut(mc)
                .set_own("length", Value::Number(elements.len() as f64), PropertyAttributes::WRITABLE);
            Value::Object(array)
        }
        Expr::Object(properties) => Value::Object(evaluate_object_literal(mc, cx, properties)?),
        Expr::Function(node) => Value::Object(create_named_function_expression(mc, cx, node.clone())),
        Expr::Call(callee, args) => evaluate_call(mc, cx, callee, args)?,
        Expr::New(callee, args) => {
            let constructor = evaluate_expr(mc, cx, callee)?;
            let args = evaluate_arguments(mc, cx, args)?;
            if constructor.as_callable().is_none() {
                return Err(raise_type_error!(format!("{} is not a constructor", callee.describe())).into());
            }
            construct(mc, cx, &constructor, &args)?
        }
        Expr::Unary(op, operand) => evaluate_unary(mc, cx, *op, operand)?,
        Expr::Update { op, prefix, target } => {
            let reference = evaluate_reference(mc, cx, target)?;
            let old = to_number(mc, cx, &get_value(mc, cx, &reference)?)?;
            let new = match op {
                UpdateOp::Increment => old + 1.0,
                UpdateOp::Decrement => old - 1.0,
            };
            put_value(mc, cx, &reference, Value::Number(new))?;
            Value::Number(if *prefix { new } else { old })
        }
        Expr::Binary(op, operands) => {
            let Some((first, rest)) = operands.split_first() else {
                return Err(raise_eval_error!("empty operator chain").into());
            };
            let mut acc = evaluate_expr(mc, cx, first)?;
            for operand in rest {
                let rhs = evaluate_expr(mc, cx, operand)?;
                acc = binary_operation(mc, cx, *op, &acc, &rhs)?;
            }
            acc
        }
        Expr::Logical(op, operands) => {
            let mut value = Value::Undefined;
            for (index, operand) in operands.iter().enumerate() {
                if index > 0 {
                    let truthy = to_boolean(&value);
                    let short_circuit = match op {
                        LogicalOp::And => !truthy,
                        LogicalOp::Or => truthy,
                    };
                    if short_circuit {
                        break;
                    }
                }
                value = evaluate_expr(mc, cx, operand)?;
            }
            value
        }
        Expr::Conditional(condition, then_part, else_part) => {
            if to_boolean(&evaluate_expr(mc, cx, condition)?) {
                evaluate_expr(mc, cx, then_part)?
            } else {
                evaluate_expr(mc, cx, else_part)?
            }
        }
        Expr::Assign { op, target, value } => {
            let reference = evaluate_reference(mc, cx, target)?;
            let result = match op {
                None => evaluate_expr(mc, cx, value)?,
                Some(op) => {
                    let current = get_value(mc, cx, &reference)?;
                    let rhs = evaluate_expr(mc, cx, value)?;
                    binary_operation(mc, cx, *op, &current, &rhs)?
                }
            };
            put_value(mc, cx, &reference, result.clone())?;
            result
        }
        Expr::Comma(items) => {
            let mut value = Value::Undefined;
            for item in items {
                value = evaluate_expr(mc, cx, item)?;
            }
            value
        }
    };
    Ok(Evaluated::Value(value))
}

fn evaluate_object_literal<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    properties: &[PropertyInit],
) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    let object = new_js_object_data(mc, Some(cx.realm.object_prototype), ObjectClass::Object);
    for property in properties {
        match property {
            PropertyInit::Data(key, expr) => {
                let value = evaluate_expr(mc, cx, expr)?;
                define_value(mc, &object, key, value, PropertyAttributes::DEFAULT);
            }
            PropertyInit::Getter(key, node) => {
                let getter = create_closure(mc, cx, node.clone(), cx.scope);
                define_accessor(mc, &object, key, Some(getter), None);
            }
            PropertyInit::Setter(key, node) => {
                let setter = create_closure(mc, cx, node.clone(), cx.scope);
                define_accessor(mc, &object, key, None, Some(setter));
            }
        }
    }
    Ok(object)
}

fn evaluate_call<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, callee: &Expr, args: &[Expr]) -> Result<Value<'gc>, EvalError<'gc>> {
    let target = evaluate_node(mc, cx, callee)?;
    // Arguments are evaluated before the callee reference is read.
    let args = evaluate_arguments(mc, cx, args)?;
    let (func, this) = match target {
        Evaluated::Reference(reference) => (get_value(mc, cx, &reference)?, reference.this_value()),
        Evaluated::Value(value) => (value, Value::Undefined),
    };
    if func.as_callable().is_none() {
        return Err(raise_type_error!(format!("{} is not a function", callee.describe())).into());
    }
    call_function(mc, cx, &func, &this, &args)
}

fn evaluate_unary<'gc>(mc: &MutationContext<'gc>, cx: &ExecutionContext<'gc>, op: UnaryOp, operand: &Expr) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(match op {
        UnaryOp::Delete => match evaluate_node(mc, cx, operand)? {
            Evaluated::Reference(reference) => Value::Boolean(delete_reference(mc, &reference)),
            Evaluated::Value(_) => Value::Boolean(true),
        },
        UnaryOp::Void => {
            evaluate_expr(mc, cx, operand)?;
            Value::Undefined
        }
        UnaryOp::TypeOf => {
            let value = match evaluate_node(mc, cx, operand)? {
                Evaluated::Reference(reference)
                    if matches!(reference.base, ReferenceBase::Unresolved) && !has_property(&cx.realm.global, &reference.key) =>
                {
                    return Ok(Value::String("undefined".to_string()));
                }
                evaluated => evaluated.into_value(mc, cx)?,
            };
            Value::String(type_of(&value).to_string())
        }
        UnaryOp::Not => Value::Boolean(!to_boolean(&evaluate_expr(mc, cx, operand)?)),
        UnaryOp::BitNot => {
            let n = to_number(mc, cx, &evaluate_expr(mc, cx, operand)?)?;
            Value::Number(!to_int32(n) as f64)
        }
        UnaryOp::Plus => Value::Number(to_number(mc, cx, &evaluate_expr(mc, cx, operand)?)?),
        UnaryOp::Minus => Value::Number(-to_number(mc, cx, &evaluate_expr(mc, cx, operand)?)?),
    })
}

/// Applies a binary operator to two evaluated operands.
pub fn binary_operation<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    op: BinaryOp,
    lhs: &Value<'gc>,
    rhs: &Value<'gc>,
) -> Result<Value<'gc>, EvalError<'gc>> {
    let number = |v: &Value<'gc>| to_number(mc, cx, v);
    Ok(match op {
        BinaryOp::Add => {
            let a = to_primitive(mc, cx, lhs, PreferredType::Default)?;
            let b = to_primitive(mc, cx, rhs, PreferredType::Default)?;
            if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
                Value::String(value_to_string(&a) + &value_to_string(&b))
            } else {
                Value::Number(number(&a)? + number(&b)?)
            }
        }
        BinaryOp::Sub => Value::Number(number(lhs)? - number(rhs)?),
        BinaryOp::Mul => Value::Number(number(lhs)? * number(rhs)?),
        BinaryOp::Div => Value::Number(number(lhs)? / number(rhs)?),
        BinaryOp::Mod => Value::Number(number(lhs)? % number(rhs)?),
        BinaryOp::BitAnd => Value::Number((to_int32(number(lhs)?) & to_int32(number(rhs)?)) as f64),
        BinaryOp::BitOr => Value::Number((to_int32(number(lhs)?) | to_int32(number(rhs)?)) as f64),
        BinaryOp::BitXor => Value::Number((to_int32(number(lhs)?) ^ to_int32(number(rhs)?)) as f64),
        BinaryOp::Lsh => {
            let (a, count) = (to_int32(number(lhs)?), to_uint32(number(rhs)?) & 0x1f);
            Value::Number(a.wrapping_shl(count) as f64)
        }
        BinaryOp::Rsh => {
            let (a, count) = (to_int32(number(lhs)?), to_uint32(number(rhs)?) & 0x1f);
            Value::Number((a >> count) as f64)
        }
        BinaryOp::Ursh => {
            let (a, count) = (to_uint32(number(lhs)?), to_uint32(number(rhs)?) & 0x1f);
            Value::Number((a >> count) as f64)
        }
        BinaryOp::Eq => Value::Boolean(loose_equals(mc, cx, lhs, rhs)?),
        BinaryOp::Ne => Value::Boolean(!loose_equals(mc, cx, lhs, rhs)?),
        BinaryOp::StrictEq => Value::Boolean(strict_equals(lhs, rhs)),
        BinaryOp::StrictNe => Value::Boolean(!strict_equals(lhs, rhs)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => Value::Boolean(compare(mc, cx, op, lhs, rhs)?),
        BinaryOp::In => {
            let Value::Object(obj) = rhs else {
                return Err(raise_type_error!(format!("invalid 'in' operand {}", value_to_string(rhs))).into());
            };
            let key = to_js_string(mc, cx, lhs)?;
            Value::Boolean(has_property(obj, &key))
        }
        BinaryOp::InstanceOf => {
            let Some(func) = rhs.as_callable() else {
                return Err(raise_type_error!(format!("{} is not a function", value_to_string(rhs))).into());
            };
            Value::Boolean(has_instance(&func, lhs)?)
        }
    })
}

/// Relational comparison: UTF-16 code unit order on two strings, numeric otherwise. Any NaN
/// operand makes the result false.
fn compare<'gc>(
    mc: &MutationContext<'gc>,
    cx: &ExecutionContext<'gc>,
    op: BinaryOp,
    lhs: &Value<'gc>,
    rhs: &Value<'gc>,
) -> Result<bool, EvalError<'gc>> {
    let a = to_primitive(mc, cx, lhs, PreferredType::Number)?;
    let b = to_primitive(mc, cx, rhs, PreferredType::Number)?;
    if let (Value::String(x), Value::String(y)) = (&a, &b) {
        let order = x.encode_utf16().cmp(y.encode_utf16());
        return Ok(match op {
            BinaryOp::Lt => order.is_lt(),
            BinaryOp::Le => order.is_le(),
            BinaryOp::Gt => order.is_gt(),
            _ => order.is_ge(),
        });
    }
    let (x, y) = (to_number(mc, cx, &a)?, to_number(mc, cx, &b)?);
    Ok(match op {
        BinaryOp::Lt => x < y,
        BinaryOp::Le => x <= y,
        BinaryOp::Gt => x > y,
        _ => x >= y,
    })
}
