use crate::core::{
    BinaryOp, CatchClause, Expr, ForInit, FunctionForm, FunctionNode, Lexer, LogicalOp, Program, PropertyInit, ScriptBody, Statement,
    StatementKind, SwitchCase, TargetId, TokenData, TokenKind, TokenValue, UnaryOp, UpdateOp, VarDecl, VarDeclarator, number::format_number,
};
use crate::{JSError, raise_eval_error};
use std::rc::Rc;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;
/// Bound on syntax tree depth, counting statements and expressions together.
const MAX_NESTING_DEPTH: usize = 1000;

/// Parses a complete program. Line numbers in diagnostics start at `start_line`.
pub fn parse_program(source: &str, source_name: &str, start_line: usize) -> Result<Program, JSError> {
    let mut parser = Parser::new(source, source_name, start_line);
    let mut x = ParseContext::default();
    let body = parser.parse_script(&mut x)?;
    if !parser.lexer.done()? {
        return Err(parser.lexer.syntax_error("Syntax error"));
    }
    log::debug!(
        "parsed '{}': {} statements, {} hoisted functions, {} hoisted vars",
        source_name,
        body.statements.len(),
        body.fun_decls.len(),
        body.var_decls.len()
    );
    Ok(Program { body: Rc::new(body) })
}

#[derive(Debug, Clone, PartialEq)]
enum NestKind {
    Other,
    Loop,
    Switch,
    Label(String),
}

#[derive(Debug, Clone)]
struct NestEntry {
    kind: NestKind,
    target: TargetId,
}

/// Per function-body parse state.
#[derive(Default)]
struct ParseContext {
    in_function: bool,
    stmt_stack: Vec<NestEntry>,
    fun_decls: Vec<Rc<FunctionNode>>,
    var_decls: Vec<VarDecl>,
    bracket_level: usize,
    curly_level: usize,
    paren_level: usize,
    hook_level: usize,
    in_for_loop_init: bool,
    /// Statements and expressions currently open above this point.
    nesting: usize,
}

impl ParseContext {
    fn levels(&self) -> (usize, usize, usize, usize) {
        (self.bracket_level, self.curly_level, self.paren_level, self.hook_level)
    }
}

/// An expression on the operand stack with the depth of its tree.
struct Operand {
    expr: Expr,
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    Comma,
    Assign(Option<BinaryOp>),
    Hook,
    // A `?` whose `:` has been seen.
    Colon,
    Or,
    And,
    Binary(BinaryOp),
    Unary(UnaryOp),
    PreIncrement,
    PreDecrement,
    New,
    NewWithArgs,
    Index,
    Call,
    Group,
}

const NEW_PRECEDENCE: u8 = 16;
const POSTFIX_PRECEDENCE: u8 = 15;

fn operator_precedence(op: Operator) -> u8 {
    match op {
        Operator::Comma => 1,
        Operator::Assign(_) | Operator::Hook | Operator::Colon => 2,
        Operator::Or => 4,
        Operator::And => 5,
        Operator::Binary(b) => binary_precedence(b),
        Operator::Unary(_) => 14,
        Operator::PreIncrement | Operator::PreDecrement => POSTFIX_PRECEDENCE,
        Operator::New => NEW_PRECEDENCE,
        Operator::NewWithArgs | Operator::Index | Operator::Call | Operator::Group => 0,
    }
}

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::BitOr => 6,
        BinaryOp::BitXor => 7,
        BinaryOp::BitAnd => 8,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => 9,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::In | BinaryOp::InstanceOf => 10,
        BinaryOp::Lsh | BinaryOp::Rsh | BinaryOp::Ursh => 11,
        BinaryOp::Add | BinaryOp::Sub => 12,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 13,
    }
}

fn token_precedence(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Comma => 1,
        TokenKind::Assign | TokenKind::Hook | TokenKind::Colon => 2,
        TokenKind::Or => 4,
        TokenKind::And => 5,
        TokenKind::Dot => 17,
        other => binary_op(other).map(binary_precedence).unwrap_or(0),
    }
}

pub(crate) fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::BitOr => BinaryOp::BitOr,
        TokenKind::BitXor => BinaryOp::BitXor,
        TokenKind::BitAnd => BinaryOp::BitAnd,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        TokenKind::StrictEq => BinaryOp::StrictEq,
        TokenKind::StrictNe => BinaryOp::StrictNe,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::In => BinaryOp::In,
        TokenKind::InstanceOf => BinaryOp::InstanceOf,
        TokenKind::Lsh => BinaryOp::Lsh,
        TokenKind::Rsh => BinaryOp::Rsh,
        TokenKind::Ursh => BinaryOp::Ursh,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Mul => BinaryOp::Mul,
        TokenKind::Div => BinaryOp::Div,
        TokenKind::Mod => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    let op = match kind {
        TokenKind::Delete => UnaryOp::Delete,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::TypeOf => UnaryOp::TypeOf,
        TokenKind::Not => UnaryOp::Not,
        TokenKind::BitNot => UnaryOp::BitNot,
        TokenKind::UnaryPlus => UnaryOp::Plus,
        TokenKind::UnaryMinus => UnaryOp::Minus,
        _ => return None,
    };
    Some(op)
}

fn literal_operand(token: &TokenData) -> Option<Expr> {
    let expr = match (token.kind, &token.value) {
        (TokenKind::Null, _) => Expr::Null,
        (TokenKind::This, _) => Expr::This,
        (TokenKind::True, _) => Expr::Boolean(true),
        (TokenKind::False, _) => Expr::Boolean(false),
        (TokenKind::Identifier, Some(TokenValue::Identifier(name))) => Expr::Identifier(name.clone()),
        (TokenKind::Number, Some(TokenValue::Number(n))) => Expr::Number(*n),
        (TokenKind::String, Some(TokenValue::String(s))) => Expr::String(s.clone()),
        (TokenKind::RegExp, Some(TokenValue::RegExp { pattern, flags })) => Expr::RegExp {
            pattern: pattern.clone(),
            flags: flags.clone(),
        },
        _ => return None,
    };
    Some(expr)
}

fn into_argument_list(args: Expr) -> Vec<Expr> {
    match args {
        Expr::Comma(items) => items,
        single => vec![single],
    }
}

fn is_valid_for_in_target(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(_) | Expr::Member(..) | Expr::Index(..) | Expr::Call(..) => true,
        Expr::Group(inner) => is_valid_for_in_target(inner),
        _ => false,
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    next_target: TargetId,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, source_name: &str, start_line: usize) -> Self {
        Parser {
            lexer: Lexer::new(source, source_name, start_line),
            next_target: 0,
        }
    }

    fn new_target(&mut self) -> TargetId {
        self.next_target += 1;
        self.next_target
    }

    fn error(&self, message: &str) -> JSError {
        self.lexer.syntax_error(message)
    }

    fn parse_script(&mut self, x: &mut ParseContext) -> Result<ScriptBody, JSError> {
        let statements = self.parse_statements(x)?;
        Ok(ScriptBody {
            statements,
            fun_decls: std::mem::take(&mut x.fun_decls),
            var_decls: std::mem::take(&mut x.var_decls),
            source_name: self.lexer.source_name().clone(),
        })
    }

    fn parse_statements(&mut self, x: &mut ParseContext) -> Result<Vec<Statement>, JSError> {
        let mut statements = Vec::new();
        while !matches!(self.lexer.peek()?, TokenKind::End | TokenKind::RightCurly) {
            statements.push(self.parse_statement(x)?);
        }
        Ok(statements)
    }

    fn parse_block(&mut self, x: &mut ParseContext) -> Result<Vec<Statement>, JSError> {
        self.lexer.must_match(TokenKind::LeftCurly)?;
        self.parse_block_body(x)
    }

    /// Parses statements up to and including the closing `}`.
    fn parse_block_body(&mut self, x: &mut ParseContext) -> Result<Vec<Statement>, JSError> {
        x.stmt_stack.push(NestEntry {
            kind: NestKind::Other,
            target: 0,
        });
        let statements = self.parse_statements(x)?;
        x.stmt_stack.pop();
        self.lexer.must_match(TokenKind::RightCurly)?;
        Ok(statements)
    }

    fn nest(&mut self, x: &mut ParseContext, kind: NestKind, target: TargetId) -> Result<Box<Statement>, JSError> {
        x.stmt_stack.push(NestEntry { kind, target });
        let statement = self.parse_statement(x)?;
        x.stmt_stack.pop();
        Ok(Box::new(statement))
    }

    fn paren_expression(&mut self, x: &mut ParseContext) -> Result<Expr, JSError> {
        self.lexer.must_match(TokenKind::LeftParen)?;
        let expr = self.parse_expression(x, None)?;
        self.lexer.must_match(TokenKind::RightParen)?;
        Ok(expr)
    }

    fn parse_statement(&mut self, x: &mut ParseContext) -> Result<Statement, JSError> {
        self.enter(x)?;
        let statement = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_statement_inner(x));
        x.nesting -= 1;
        statement
    }

    fn enter(&self, x: &mut ParseContext) -> Result<(), JSError> {
        if x.nesting >= MAX_NESTING_DEPTH {
            return Err(self.error("Nesting too deep"));
        }
        x.nesting += 1;
        Ok(())
    }

    fn parse_statement_inner(&mut self, x: &mut ParseContext) -> Result<Statement, JSError> {
        let token = self.lexer.next()?.clone();
        let (line, column) = (token.line, token.column);
        let at = |kind| Statement { kind, line, column };

        // Statements ending in a right curly return early and skip semicolon insertion.
        let kind = match token.kind {
            TokenKind::Function => {
                let form = if x.stmt_stack.is_empty() {
                    FunctionForm::Declared
                } else {
                    FunctionForm::Statement
                };
                let function = self.parse_function(x, true, form)?;
                return Ok(at(StatementKind::Function(function)));
            }
            TokenKind::LeftCurly => {
                let body = self.parse_block_body(x)?;
                return Ok(at(StatementKind::Block(body)));
            }
            TokenKind::If => {
                let condition = self.paren_expression(x)?;
                let then_part = self.nest(x, NestKind::Other, 0)?;
                let else_part = if self.lexer.match_token(TokenKind::Else)? {
                    Some(self.nest(x, NestKind::Other, 0)?)
                } else {
                    None
                };
                return Ok(at(StatementKind::If {
                    condition,
                    then_part,
                    else_part,
                }));
            }
            TokenKind::Switch => return self.parse_switch(x).map(at),
            TokenKind::For => return self.parse_for(x).map(at),
            TokenKind::While => {
                let target = self.new_target();
                let condition = self.paren_expression(x)?;
                let body = self.nest(x, NestKind::Loop, target)?;
                return Ok(at(StatementKind::While { target, condition, body }));
            }
            TokenKind::Do => {
                let target = self.new_target();
                let body = self.nest(x, NestKind::Loop, target)?;
                self.lexer.must_match(TokenKind::While)?;
                let condition = self.paren_expression(x)?;
                self.lexer.match_token(TokenKind::Semicolon)?;
                return Ok(at(StatementKind::DoWhile { target, body, condition }));
            }
            TokenKind::Break | TokenKind::Continue => self.parse_jump(x, token.kind)?,
            TokenKind::Try => return self.parse_try(x).map(at),
            TokenKind::Catch | TokenKind::Finally => {
                return Err(self.error(&format!("{} without preceding try", token.kind)));
            }
            TokenKind::Throw => StatementKind::Throw(self.parse_expression(x, None)?),
            TokenKind::Return => {
                if !x.in_function {
                    return Err(self.error("Invalid return"));
                }
                let next = self.lexer.peek_same_line()?;
                if matches!(next, TokenKind::End | TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightCurly) {
                    StatementKind::Return(None)
                } else {
                    StatementKind::Return(Some(self.parse_expression(x, None)?))
                }
            }
            TokenKind::With => {
                let object = self.paren_expression(x)?;
                let body = self.nest(x, NestKind::Other, 0)?;
                return Ok(at(StatementKind::With { object, body }));
            }
            TokenKind::Var | TokenKind::Const => {
                let read_only = token.kind == TokenKind::Const;
                let decls = self.parse_variables(x, read_only)?;
                StatementKind::Var { decls, read_only }
            }
            TokenKind::Debugger => StatementKind::Debugger,
            TokenKind::Newline | TokenKind::Semicolon => return Ok(at(StatementKind::Empty)),
            _ => {
                if token.kind == TokenKind::Identifier {
                    self.lexer.scan_operand = false;
                    let next = self.lexer.peek()?;
                    self.lexer.scan_operand = true;
                    if next == TokenKind::Colon {
                        let label = token.identifier().unwrap_or_default().to_string();
                        if x.stmt_stack.iter().any(|entry| entry.kind == NestKind::Label(label.clone())) {
                            return Err(self.error("Duplicate label"));
                        }
                        self.lexer.next()?;
                        let target = self.new_target();
                        let body = self.nest(x, NestKind::Label(label.clone()), target)?;
                        return Ok(at(StatementKind::Labeled { label, target, body }));
                    }
                }
                self.lexer.pushback()?;
                StatementKind::Expr(self.parse_expression(x, None)?)
            }
        };

        let next = self.lexer.peek_same_line()?;
        if !matches!(next, TokenKind::End | TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightCurly) {
            return Err(self.error("Missing ; before statement"));
        }
        self.lexer.match_token(TokenKind::Semicolon)?;
        Ok(at(kind))
    }

    fn parse_jump(&mut self, x: &mut ParseContext, kind: TokenKind) -> Result<StatementKind, JSError> {
        let is_break = kind == TokenKind::Break;
        let label = if self.lexer.peek_same_line()? == TokenKind::Identifier {
            self.lexer.next()?.identifier().map(str::to_string)
        } else {
            None
        };
        let target = match label {
            Some(label) => {
                let Some(index) = x.stmt_stack.iter().rposition(|entry| entry.kind == NestKind::Label(label.clone())) else {
                    return Err(self.error("Label not found"));
                };
                if is_break {
                    x.stmt_stack[index].target
                } else {
                    // continue must name a label attached to a loop
                    match x.stmt_stack[index + 1..].iter().find(|entry| !matches!(entry.kind, NestKind::Label(_))) {
                        Some(entry) if entry.kind == NestKind::Loop => entry.target,
                        _ => return Err(self.error("Invalid continue")),
                    }
                }
            }
            None => {
                let found = x
                    .stmt_stack
                    .iter()
                    .rev()
                    .find(|entry| entry.kind == NestKind::Loop || (is_break && entry.kind == NestKind::Switch));
                match found {
                    Some(entry) => entry.target,
                    None => return Err(self.error(if is_break { "Invalid break" } else { "Invalid continue" })),
                }
            }
        };
        Ok(if is_break {
            StatementKind::Break(target)
        } else {
            StatementKind::Continue(target)
        })
    }

    fn parse_switch(&mut self, x: &mut ParseContext) -> Result<StatementKind, JSError> {
        let discriminant = self.paren_expression(x)?;
        let target = self.new_target();
        x.stmt_stack.push(NestEntry {
            kind: NestKind::Switch,
            target,
        });
        self.lexer.must_match(TokenKind::LeftCurly)?;
        let mut cases = Vec::new();
        let mut default_index = None;
        loop {
            let label = match self.lexer.next()?.kind {
                TokenKind::RightCurly => break,
                TokenKind::Default => {
                    if default_index.is_some() {
                        return Err(self.error("More than one switch default"));
                    }
                    default_index = Some(cases.len());
                    None
                }
                TokenKind::Case => Some(self.parse_expression(x, Some(TokenKind::Colon))?),
                _ => return Err(self.error("Invalid switch case")),
            };
            self.lexer.must_match(TokenKind::Colon)?;
            let mut body = Vec::new();
            while !matches!(self.lexer.peek()?, TokenKind::Case | TokenKind::Default | TokenKind::RightCurly) {
                body.push(self.parse_statement(x)?);
            }
            cases.push(SwitchCase { label, body });
        }
        x.stmt_stack.pop();
        Ok(StatementKind::Switch {
            target,
            discriminant,
            cases,
            default_index,
        })
    }

    fn parse_for(&mut self, x: &mut ParseContext) -> Result<StatementKind, JSError> {
        let target = self.new_target();
        self.lexer.must_match(TokenKind::LeftParen)?;
        let mut setup = None;
        let first = self.lexer.peek()?;
        if first != TokenKind::Semicolon {
            x.in_for_loop_init = true;
            if matches!(first, TokenKind::Var | TokenKind::Const) {
                let token = self.lexer.next()?;
                let (line, column) = (token.line, token.column);
                let read_only = first == TokenKind::Const;
                let decls = self.parse_variables(x, read_only)?;
                setup = Some(ForInit::Var(Box::new(Statement {
                    kind: StatementKind::Var { decls, read_only },
                    line,
                    column,
                })));
            } else {
                setup = Some(ForInit::Expr(self.parse_expression(x, None)?));
            }
            x.in_for_loop_init = false;
        }

        if let Some(init) = setup.take() {
            if self.lexer.match_token(TokenKind::In)? {
                let (var_decl, iterator) = match init {
                    ForInit::Var(statement) => {
                        let name = match &statement.kind {
                            StatementKind::Var { decls, .. } if decls.len() == 1 => decls[0].name.clone(),
                            _ => return Err(self.error("Invalid for..in left-hand side")),
                        };
                        (Some(statement), Expr::Identifier(name))
                    }
                    ForInit::Expr(expr) => {
                        if !is_valid_for_in_target(&expr) {
                            return Err(self.error("Invalid for..in left-hand side"));
                        }
                        (None, expr)
                    }
                };
                let object = self.parse_expression(x, None)?;
                self.lexer.must_match(TokenKind::RightParen)?;
                let body = self.nest(x, NestKind::Loop, target)?;
                return Ok(StatementKind::ForIn {
                    target,
                    var_decl,
                    iterator,
                    object,
                    body,
                });
            }
            setup = Some(init);
        }

        self.lexer.must_match(TokenKind::Semicolon)?;
        let condition = if self.lexer.peek()? == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression(x, None)?)
        };
        self.lexer.must_match(TokenKind::Semicolon)?;
        let update = if self.lexer.peek()? == TokenKind::RightParen {
            None
        } else {
            Some(self.parse_expression(x, None)?)
        };
        self.lexer.must_match(TokenKind::RightParen)?;
        let body = self.nest(x, NestKind::Loop, target)?;
        Ok(StatementKind::For {
            target,
            setup,
            condition,
            update,
            body,
        })
    }

    fn parse_try(&mut self, x: &mut ParseContext) -> Result<StatementKind, JSError> {
        let block = self.parse_block(x)?;
        let mut catch_clauses: Vec<CatchClause> = Vec::new();
        while self.lexer.match_token(TokenKind::Catch)? {
            self.lexer.must_match(TokenKind::LeftParen)?;
            let param = self.lexer.must_match(TokenKind::Identifier)?.identifier().unwrap_or_default().to_string();
            // An unguarded clause catches everything, so nothing may follow it.
            if catch_clauses.last().is_some_and(|clause| clause.guard.is_none()) {
                return Err(self.error("Guarded catch after unguarded"));
            }
            let guard = if self.lexer.match_token(TokenKind::If)? {
                Some(self.parse_expression(x, None)?)
            } else {
                None
            };
            self.lexer.must_match(TokenKind::RightParen)?;
            let body = self.parse_block(x)?;
            catch_clauses.push(CatchClause { param, guard, body });
        }
        let finally_block = if self.lexer.match_token(TokenKind::Finally)? {
            Some(self.parse_block(x)?)
        } else {
            None
        };
        if catch_clauses.is_empty() && finally_block.is_none() {
            return Err(self.error("Invalid try statement"));
        }
        Ok(StatementKind::Try {
            block,
            catch_clauses,
            finally_block,
        })
    }

    fn parse_variables(&mut self, x: &mut ParseContext, read_only: bool) -> Result<Vec<VarDeclarator>, JSError> {
        let mut decls = Vec::new();
        loop {
            let token = self.lexer.must_match(TokenKind::Identifier)?;
            let name = token.identifier().unwrap_or_default().to_string();
            let line = token.line;
            let init = if self.lexer.match_token(TokenKind::Assign)? {
                if self.lexer.current().assign_op.is_some() {
                    return Err(self.error("Invalid variable initialization"));
                }
                Some(self.parse_expression(x, Some(TokenKind::Comma))?)
            } else {
                None
            };
            x.var_decls.push(VarDecl {
                name: name.clone(),
                read_only,
                line,
            });
            decls.push(VarDeclarator { name, init, line });
            if !self.lexer.match_token(TokenKind::Comma)? {
                return Ok(decls);
            }
        }
    }

    /// Parses a function whose `function` (or `get`/`set`) token was just consumed.
    fn parse_function(&mut self, x: &mut ParseContext, require_name: bool, form: FunctionForm) -> Result<Rc<FunctionNode>, JSError> {
        let (start, line) = (self.lexer.current().start, self.lexer.current().line);
        let name = match self.lexer.peek()? {
            TokenKind::Identifier => self.lexer.next()?.identifier().map(str::to_string),
            _ if require_name => return Err(self.error("Missing function identifier")),
            _ => None,
        };
        self.lexer.must_match(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        loop {
            let token = self.lexer.next()?;
            match token.kind {
                TokenKind::RightParen => break,
                TokenKind::Identifier => {
                    params.push(token.identifier().unwrap_or_default().to_string());
                    if self.lexer.peek()? != TokenKind::RightParen {
                        self.lexer.must_match(TokenKind::Comma)?;
                    }
                }
                _ => return Err(self.error("Missing formal parameter")),
            }
        }
        self.lexer.must_match(TokenKind::LeftCurly)?;
        let mut inner = ParseContext {
            in_function: true,
            nesting: x.nesting,
            ..ParseContext::default()
        };
        let body = self.parse_script(&mut inner)?;
        let end = self.lexer.must_match(TokenKind::RightCurly)?.end;
        log::trace!("parsed function {:?} with {} params at line {}", name, params.len(), line);
        let function = Rc::new(FunctionNode {
            name,
            params,
            body,
            form,
            source_text: self.lexer.source()[start..end].to_string(),
            line,
        });
        if form == FunctionForm::Declared {
            x.fun_decls.push(function.clone());
        }
        Ok(function)
    }

    /// Operator-precedence expression parser. Stops before `stop` when that token
    /// appears outside any bracket opened by this expression.
    fn parse_expression(&mut self, x: &mut ParseContext, stop: Option<TokenKind>) -> Result<Expr, JSError> {
        self.parse_operand(x, stop).map(|operand| operand.expr)
    }

    fn parse_operand(&mut self, x: &mut ParseContext, stop: Option<TokenKind>) -> Result<Operand, JSError> {
        self.enter(x)?;
        let operand = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_operand_inner(x, stop));
        x.nesting -= 1;
        operand
    }

    fn parse_operand_inner(&mut self, x: &mut ParseContext, stop: Option<TokenKind>) -> Result<Operand, JSError> {
        let mut operators: Vec<Operator> = Vec::new();
        let mut operands: Vec<Operand> = Vec::new();
        let entry_levels = x.levels();
        let (bracket_level, _, paren_level, hook_level) = entry_levels;

        loop {
            let token = self.lexer.next()?.clone();
            let kind = token.kind;
            if kind == TokenKind::End {
                break;
            }
            if Some(kind) == stop && x.levels() == entry_levels {
                break;
            }
            match kind {
                TokenKind::Semicolon => break,
                TokenKind::Assign | TokenKind::Hook | TokenKind::Colon => {
                    if self.lexer.scan_operand {
                        break;
                    }
                    // Use >, not >=, for right-associative assignment and conditionals.
                    // A `:` also closes any finished assignment or conditional before it.
                    while let Some(&top) = operators.last()
                        && (operator_precedence(top) > token_precedence(kind)
                            || (kind == TokenKind::Colon && matches!(top, Operator::Assign(_) | Operator::Colon)))
                    {
                        self.reduce(x, &mut operators, &mut operands)?;
                    }
                    match kind {
                        TokenKind::Colon => {
                            match operators.last_mut() {
                                Some(top) if *top == Operator::Hook => *top = Operator::Colon,
                                _ => return Err(self.error("Invalid label")),
                            }
                            x.hook_level -= 1;
                        }
                        TokenKind::Assign => operators.push(Operator::Assign(token.assign_op.and_then(binary_op))),
                        _ => {
                            operators.push(Operator::Hook);
                            x.hook_level += 1;
                        }
                    }
                    self.lexer.scan_operand = true;
                }
                TokenKind::In
                    if x.in_for_loop_init && x.hook_level == 0 && x.bracket_level == 0 && x.curly_level == 0 && x.paren_level == 0 =>
                {
                    break;
                }
                TokenKind::Comma | TokenKind::Or | TokenKind::And | TokenKind::Dot => {
                    if self.lexer.scan_operand {
                        break;
                    }
                    self.reduce_while_at_least(x, &mut operators, &mut operands, token_precedence(kind))?;
                    match kind {
                        TokenKind::Dot => {
                            let name = self.lexer.next()?.identifier().map(str::to_string);
                            let Some(name) = name else {
                                return Err(self.error("Missing identifier after ."));
                            };
                            let object = self.pop_operand(&mut operands)?;
                            self.push_operand(x, &mut operands, Expr::Member(Box::new(object.expr), name), object.depth + 1)?;
                        }
                        _ => {
                            operators.push(match kind {
                                TokenKind::Comma => Operator::Comma,
                                TokenKind::Or => Operator::Or,
                                _ => Operator::And,
                            });
                            self.lexer.scan_operand = true;
                        }
                    }
                }
                _ if binary_op(kind).is_some() => {
                    if self.lexer.scan_operand {
                        break;
                    }
                    self.reduce_while_at_least(x, &mut operators, &mut operands, token_precedence(kind))?;
                    if let Some(op) = binary_op(kind) {
                        operators.push(Operator::Binary(op));
                    }
                    self.lexer.scan_operand = true;
                }
                _ if unary_op(kind).is_some() || kind == TokenKind::New => {
                    if !self.lexer.scan_operand {
                        break;
                    }
                    operators.push(match unary_op(kind) {
                        Some(op) => Operator::Unary(op),
                        None => Operator::New,
                    });
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let update = if kind == TokenKind::Increment {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    if self.lexer.scan_operand {
                        operators.push(match update {
                            UpdateOp::Increment => Operator::PreIncrement,
                            UpdateOp::Decrement => Operator::PreDecrement,
                        });
                    } else {
                        // Postfix operators may not follow a line break.
                        let previous = self.lexer.previous();
                        if previous.kind == TokenKind::Newline || previous.line != token.line {
                            break;
                        }
                        // Use >, not >=, so postfix binds tighter than prefix.
                        while let Some(&top) = operators.last()
                            && operator_precedence(top) > POSTFIX_PRECEDENCE
                        {
                            self.reduce(x, &mut operators, &mut operands)?;
                        }
                        let target = self.pop_operand(&mut operands)?;
                        let expr = Expr::Update {
                            op: update,
                            prefix: false,
                            target: Box::new(target.expr),
                        };
                        self.push_operand(x, &mut operands, expr, target.depth + 1)?;
                    }
                }
                TokenKind::Function => {
                    if !self.lexer.scan_operand {
                        break;
                    }
                    let function = self.parse_function(x, false, FunctionForm::Expressed)?;
                    self.push_operand(x, &mut operands, Expr::Function(function), 1)?;
                    self.lexer.scan_operand = false;
                }
                TokenKind::Null
                | TokenKind::This
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::RegExp => {
                    if !self.lexer.scan_operand {
                        break;
                    }
                    let Some(operand) = literal_operand(&token) else {
                        return Err(raise_eval_error!(format!("token {kind} without a literal value")));
                    };
                    self.push_operand(x, &mut operands, operand, 1)?;
                    self.lexer.scan_operand = false;
                }
                TokenKind::LeftBracket => {
                    if self.lexer.scan_operand {
                        let (elements, depth) = self.parse_array_literal(x)?;
                        self.push_operand(x, &mut operands, Expr::Array(elements), depth + 1)?;
                        self.lexer.scan_operand = false;
                    } else {
                        operators.push(Operator::Index);
                        self.lexer.scan_operand = true;
                        x.bracket_level += 1;
                    }
                }
                TokenKind::RightBracket => {
                    if self.lexer.scan_operand || x.bracket_level == bracket_level {
                        break;
                    }
                    while self.reduce(x, &mut operators, &mut operands)? != Operator::Index {}
                    x.bracket_level -= 1;
                }
                TokenKind::LeftCurly => {
                    if !self.lexer.scan_operand {
                        break;
                    }
                    x.curly_level += 1;
                    let (properties, depth) = self.parse_object_literal(x)?;
                    x.curly_level -= 1;
                    self.push_operand(x, &mut operands, Expr::Object(properties), depth + 1)?;
                    self.lexer.scan_operand = false;
                }
                TokenKind::LeftParen => {
                    if self.lexer.scan_operand {
                        operators.push(Operator::Group);
                    } else {
                        while let Some(&top) = operators.last()
                            && operator_precedence(top) > NEW_PRECEDENCE
                        {
                            self.reduce(x, &mut operators, &mut operands)?;
                        }
                        // Handle `()` now so calls with arguments are the only n-ary case left.
                        self.lexer.scan_operand = true;
                        if self.lexer.match_token(TokenKind::RightParen)? {
                            let callee = self.pop_operand(&mut operands)?;
                            let expr = if operators.last() == Some(&Operator::New) {
                                operators.pop();
                                Expr::New(Box::new(callee.expr), Vec::new())
                            } else {
                                Expr::Call(Box::new(callee.expr), Vec::new())
                            };
                            self.push_operand(x, &mut operands, expr, callee.depth + 1)?;
                            self.lexer.scan_operand = false;
                            continue;
                        }
                        match operators.last_mut() {
                            Some(top) if *top == Operator::New => *top = Operator::NewWithArgs,
                            _ => operators.push(Operator::Call),
                        }
                    }
                    x.paren_level += 1;
                }
                TokenKind::RightParen => {
                    if self.lexer.scan_operand || x.paren_level == paren_level {
                        break;
                    }
                    loop {
                        let op = self.reduce(x, &mut operators, &mut operands)?;
                        if matches!(op, Operator::Group | Operator::Call | Operator::NewWithArgs) {
                            break;
                        }
                    }
                    x.paren_level -= 1;
                }
                _ => break,
            }
        }

        if x.hook_level != hook_level {
            return Err(self.error("Missing : after ?"));
        }
        if x.paren_level != paren_level {
            return Err(self.error("Missing ) in parenthetical"));
        }
        if x.bracket_level != bracket_level {
            return Err(self.error("Missing ] in index expression"));
        }
        if self.lexer.scan_operand {
            return Err(self.error("Missing operand"));
        }

        // Resume scanning for operands and give back the token that stopped us.
        self.lexer.scan_operand = true;
        self.lexer.pushback()?;
        while !operators.is_empty() {
            self.reduce(x, &mut operators, &mut operands)?;
        }
        self.pop_operand(&mut operands)
    }

    /// Returns the elements with the depth of the deepest one.
    fn parse_array_literal(&mut self, x: &mut ParseContext) -> Result<(Vec<Option<Expr>>, usize), JSError> {
        let mut elements = Vec::new();
        let mut depth = 0;
        loop {
            match self.lexer.peek()? {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    self.lexer.next()?;
                    elements.push(None);
                    continue;
                }
                _ => {}
            }
            let element = self.parse_operand(x, Some(TokenKind::Comma))?;
            depth = depth.max(element.depth);
            elements.push(Some(element.expr));
            if !self.lexer.match_token(TokenKind::Comma)? {
                break;
            }
        }
        self.lexer.must_match(TokenKind::RightBracket)?;
        Ok((elements, depth))
    }

    fn parse_object_literal(&mut self, x: &mut ParseContext) -> Result<(Vec<PropertyInit>, usize), JSError> {
        let mut properties = Vec::new();
        let mut depth = 0;
        if self.lexer.match_token(TokenKind::RightCurly)? {
            return Ok((properties, depth));
        }
        loop {
            let token = self.lexer.next()?.clone();
            let accessor = match (token.kind, token.identifier()) {
                (TokenKind::Identifier, Some(word @ ("get" | "set"))) if self.lexer.peek()? == TokenKind::Identifier => Some(word == "get"),
                _ => None,
            };
            if let Some(is_getter) = accessor {
                let function = self.parse_function(x, true, FunctionForm::Expressed)?;
                let key = function.name.clone().unwrap_or_default();
                properties.push(if is_getter {
                    PropertyInit::Getter(key, function)
                } else {
                    PropertyInit::Setter(key, function)
                });
            } else {
                let key = match (&token.kind, &token.value) {
                    (TokenKind::RightCurly, _) => return Ok((properties, depth)),
                    (TokenKind::Number, Some(TokenValue::Number(n))) => format_number(*n),
                    (TokenKind::String, Some(TokenValue::String(s))) => s.clone(),
                    (_, Some(TokenValue::Identifier(name))) => name.clone(),
                    _ => return Err(self.error("Invalid property name")),
                };
                self.lexer.must_match(TokenKind::Colon)?;
                let value = self.parse_operand(x, Some(TokenKind::Comma))?;
                depth = depth.max(value.depth);
                properties.push(PropertyInit::Data(key, value.expr));
            }
            if !self.lexer.match_token(TokenKind::Comma)? {
                break;
            }
        }
        self.lexer.must_match(TokenKind::RightCurly)?;
        Ok((properties, depth))
    }

    fn pop_operand(&self, operands: &mut Vec<Operand>) -> Result<Operand, JSError> {
        operands.pop().ok_or_else(|| self.error("Missing operand"))
    }

    fn push_operand(&self, x: &ParseContext, operands: &mut Vec<Operand>, expr: Expr, depth: usize) -> Result<(), JSError> {
        if x.nesting + depth > MAX_NESTING_DEPTH {
            return Err(self.error("Nesting too deep"));
        }
        operands.push(Operand { expr, depth });
        Ok(())
    }

    fn reduce_while_at_least(
        &self,
        x: &ParseContext,
        operators: &mut Vec<Operator>,
        operands: &mut Vec<Operand>,
        precedence: u8,
    ) -> Result<(), JSError> {
        while let Some(&top) = operators.last()
            && operator_precedence(top) >= precedence
        {
            self.reduce(x, operators, operands)?;
        }
        Ok(())
    }

    /// Pops the top operator and combines it with its operands. Left-associative
    /// chains of the same operator are folded into one n-ary node.
    fn reduce(&self, x: &ParseContext, operators: &mut Vec<Operator>, operands: &mut Vec<Operand>) -> Result<Operator, JSError> {
        let Some(op) = operators.pop() else {
            return Err(self.error("Missing operand"));
        };
        let (expr, depth) = match op {
            Operator::Comma | Operator::Or | Operator::And | Operator::Binary(_) => {
                let right = self.pop_operand(operands)?;
                let left = self.pop_operand(operands)?;
                // Folding into an existing chain does not deepen it.
                let folded = left.depth.max(right.depth + 1);
                let fresh = left.depth.max(right.depth) + 1;
                let right = right.expr;
                match (op, left.expr) {
                    (Operator::Comma, Expr::Comma(mut items)) => {
                        items.push(right);
                        (Expr::Comma(items), folded)
                    }
                    (Operator::Comma, left) => (Expr::Comma(vec![left, right]), fresh),
                    (Operator::Binary(b), Expr::Binary(existing, mut items)) if existing == b => {
                        items.push(right);
                        (Expr::Binary(b, items), folded)
                    }
                    (Operator::Binary(b), left) => (Expr::Binary(b, vec![left, right]), fresh),
                    (logical, left) => {
                        let kind = if logical == Operator::Or { LogicalOp::Or } else { LogicalOp::And };
                        match left {
                            Expr::Logical(existing, mut items) if existing == kind => {
                                items.push(right);
                                (Expr::Logical(kind, items), folded)
                            }
                            left => (Expr::Logical(kind, vec![left, right]), fresh),
                        }
                    }
                }
            }
            Operator::Assign(assign_op) => {
                let value = self.pop_operand(operands)?;
                let target = self.pop_operand(operands)?;
                let depth = target.depth.max(value.depth) + 1;
                let expr = Expr::Assign {
                    op: assign_op,
                    target: Box::new(target.expr),
                    value: Box::new(value.expr),
                };
                (expr, depth)
            }
            Operator::Hook => return Err(self.error("Missing : after ?")),
            Operator::Colon => {
                let else_part = self.pop_operand(operands)?;
                let then_part = self.pop_operand(operands)?;
                let condition = self.pop_operand(operands)?;
                let depth = condition.depth.max(then_part.depth).max(else_part.depth) + 1;
                let expr = Expr::Conditional(Box::new(condition.expr), Box::new(then_part.expr), Box::new(else_part.expr));
                (expr, depth)
            }
            Operator::Unary(unary) => {
                let operand = self.pop_operand(operands)?;
                (Expr::Unary(unary, Box::new(operand.expr)), operand.depth + 1)
            }
            Operator::PreIncrement | Operator::PreDecrement => {
                let target = self.pop_operand(operands)?;
                let expr = Expr::Update {
                    op: if op == Operator::PreIncrement {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    },
                    prefix: true,
                    target: Box::new(target.expr),
                };
                (expr, target.depth + 1)
            }
            Operator::New => {
                let callee = self.pop_operand(operands)?;
                (Expr::New(Box::new(callee.expr), Vec::new()), callee.depth + 1)
            }
            Operator::NewWithArgs | Operator::Call => {
                let args = self.pop_operand(operands)?;
                let callee = self.pop_operand(operands)?;
                let depth = callee.depth.max(args.depth) + 1;
                let args = into_argument_list(args.expr);
                let callee = Box::new(callee.expr);
                if op == Operator::Call {
                    (Expr::Call(callee, args), depth)
                } else {
                    (Expr::New(callee, args), depth)
                }
            }
            Operator::Index => {
                let index = self.pop_operand(operands)?;
                let object = self.pop_operand(operands)?;
                let depth = object.depth.max(index.depth) + 1;
                (Expr::Index(Box::new(object.expr), Box::new(index.expr)), depth)
            }
            Operator::Group => {
                let inner = self.pop_operand(operands)?;
                (Expr::Group(Box::new(inner.expr)), inner.depth + 1)
            }
        };
        self.push_operand(x, operands, expr, depth)?;
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JSErrorKind;

    fn parse(source: &str) -> Program {
        parse_program(source, "test.js", 1).unwrap()
    }

    fn parse_err(source: &str) -> String {
        let err = parse_program(source, "test.js", 1).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "unexpected error kind: {err}");
        err.message()
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse(source);
        match &program.body.statements[0].kind {
            StatementKind::Expr(expr) => expr.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_builds_product_under_sum() {
        match single_expr("1 + 2 * 3") {
            Expr::Binary(BinaryOp::Add, operands) => {
                assert!(matches!(operands[0], Expr::Number(n) if n == 1.0));
                assert!(matches!(&operands[1], Expr::Binary(BinaryOp::Mul, inner) if inner.len() == 2));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_left_associative_chain_is_flattened() {
        match single_expr("a - b - c - d") {
            Expr::Binary(BinaryOp::Sub, operands) => assert_eq!(operands.len(), 4),
            other => panic!("unexpected tree {other:?}"),
        }
        match single_expr("a || b || c") {
            Expr::Logical(LogicalOp::Or, operands) => assert_eq!(operands.len(), 3),
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_group_stops_flattening() {
        match single_expr("a - (b - c)") {
            Expr::Binary(BinaryOp::Sub, operands) => {
                assert_eq!(operands.len(), 2);
                assert!(matches!(operands[1], Expr::Group(_)));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        match single_expr("a = b += c") {
            Expr::Assign { op: None, value, .. } => {
                assert!(matches!(*value, Expr::Assign { op: Some(BinaryOp::Add), .. }));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_conditional_and_calls() {
        match single_expr("f(a, b) ? new G(1) : o.m()") {
            Expr::Conditional(condition, then_part, else_part) => {
                assert!(matches!(*condition, Expr::Call(_, ref args) if args.len() == 2));
                assert!(matches!(*then_part, Expr::New(_, ref args) if args.len() == 1));
                assert!(matches!(*else_part, Expr::Call(ref callee, _) if matches!(**callee, Expr::Member(..))));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_conditional_nested_in_either_branch() {
        match single_expr("a ? b ? c : d : e") {
            Expr::Conditional(condition, then_part, else_part) => {
                assert!(matches!(*condition, Expr::Identifier(ref name) if name == "a"));
                assert!(matches!(*then_part, Expr::Conditional(..)));
                assert!(matches!(*else_part, Expr::Identifier(ref name) if name == "e"));
            }
            other => panic!("unexpected tree {other:?}"),
        }
        match single_expr("a ? b : c ? d : e") {
            Expr::Conditional(_, then_part, else_part) => {
                assert!(matches!(*then_part, Expr::Identifier(ref name) if name == "b"));
                assert!(matches!(*else_part, Expr::Conditional(..)));
            }
            other => panic!("unexpected tree {other:?}"),
        }
        assert_eq!(parse_err("a ? b : c : d"), "Invalid label");
        assert_eq!(parse_err("(a ? b)"), "Missing : after ?");
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let deep = 2 * MAX_NESTING_DEPTH;
        assert_eq!(parse_err(&("!".repeat(deep) + "1")), "Nesting too deep");
        assert_eq!(parse_err(&("[".repeat(deep) + &"]".repeat(deep))), "Nesting too deep");
        assert_eq!(parse_err(&("(".repeat(deep) + "1" + &")".repeat(deep))), "Nesting too deep");
        assert_eq!(parse_err(&("x".to_string() + &".y".repeat(deep))), "Nesting too deep");
        assert_eq!(parse_err(&("{".repeat(deep) + &"}".repeat(deep))), "Nesting too deep");

        // Long flat chains fold into one node and stay shallow.
        let sum = vec!["1"; 5 * MAX_NESTING_DEPTH].join(" + ");
        match single_expr(&sum) {
            Expr::Binary(BinaryOp::Add, operands) => assert_eq!(operands.len(), 5 * MAX_NESTING_DEPTH),
            other => panic!("unexpected tree {other:?}"),
        }
        parse(&("[".repeat(100) + &"]".repeat(100)));
    }

    #[test]
    fn test_postfix_binds_tighter_than_prefix() {
        match single_expr("-x++") {
            Expr::Unary(UnaryOp::Minus, inner) => assert!(matches!(*inner, Expr::Update { prefix: false, .. })),
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_postfix_not_across_line_break() {
        let program = parse("a\n++b");
        assert_eq!(program.body.statements.len(), 2);
        assert!(matches!(
            &program.body.statements[1].kind,
            StatementKind::Expr(Expr::Update { prefix: true, .. })
        ));
    }

    #[test]
    fn test_semicolon_insertion_at_newline() {
        let program = parse("var x = 1\nvar y = 2");
        assert_eq!(program.body.statements.len(), 2);
        assert_eq!(program.body.var_decls.len(), 2);
    }

    #[test]
    fn test_missing_semicolon_on_same_line() {
        assert_eq!(parse_err("var x = 1 var y = 2"), "Missing ; before statement");
    }

    #[test]
    fn test_return_without_value_before_newline() {
        let program = parse("function f() { return\n1 }");
        let f = &program.body.fun_decls[0];
        assert!(matches!(f.body.statements[0].kind, StatementKind::Return(None)));
        assert_eq!(f.body.statements.len(), 2);
    }

    #[test]
    fn test_hoisting_lists() {
        let program = parse("var a; if (a) { var b = 1; function inner() {} } function outer() { var c; }");
        let names: Vec<_> = program.body.var_decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(program.body.fun_decls.len(), 1);
        assert_eq!(program.body.fun_decls[0].name.as_deref(), Some("outer"));
        assert_eq!(program.body.fun_decls[0].body.var_decls[0].name, "c");
    }

    #[test]
    fn test_nested_function_is_statement_form() {
        let program = parse("{ function g() {} }");
        match &program.body.statements[0].kind {
            StatementKind::Block(body) => {
                assert!(matches!(&body[0].kind, StatementKind::Function(f) if f.form == FunctionForm::Statement));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_object_literal_with_accessors() {
        match single_expr("({ a: 1, 'b': 2, 3: 4, get c() { return 1; }, set c(v) {} })") {
            Expr::Group(inner) => match *inner {
                Expr::Object(properties) => {
                    assert_eq!(properties.len(), 5);
                    assert!(matches!(&properties[2], PropertyInit::Data(key, _) if key == "3"));
                    assert!(matches!(&properties[3], PropertyInit::Getter(key, _) if key == "c"));
                    assert!(matches!(&properties[4], PropertyInit::Setter(key, _) if key == "c"));
                }
                other => panic!("unexpected tree {other:?}"),
            },
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_array_literal_elisions() {
        match single_expr("[1, , 3,]") {
            Expr::Array(elements) => {
                assert_eq!(elements.len(), 3);
                assert!(elements[1].is_none());
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn test_for_in_heads() {
        let program = parse("for (var k in o) {} for (x.y in o) ; for (var i = 0, j = 1; i < j; i++) ;");
        assert!(matches!(&program.body.statements[0].kind, StatementKind::ForIn { var_decl: Some(_), .. }));
        assert!(matches!(&program.body.statements[1].kind, StatementKind::ForIn { var_decl: None, .. }));
        assert!(matches!(&program.body.statements[2].kind, StatementKind::For { setup: Some(_), .. }));
        assert_eq!(parse_err("for (var a, b in o) {}"), "Invalid for..in left-hand side");
        assert_eq!(parse_err("for (1 in o) {}"), "Invalid for..in left-hand side");
    }

    #[test]
    fn test_labels_and_jumps() {
        parse("outer: for (;;) { inner: while (1) { break outer; continue inner; } }");
        assert_eq!(parse_err("while (1) { break nowhere; }"), "Label not found");
        assert_eq!(parse_err("a: { a: ; }"), "Duplicate label");
        assert_eq!(parse_err("break;"), "Invalid break");
        assert_eq!(parse_err("l: { continue l; }"), "Invalid continue");
    }

    #[test]
    fn test_statement_errors() {
        assert_eq!(parse_err("return 1;"), "Invalid return");
        assert_eq!(parse_err("switch (x) { default: ; default: ; }"), "More than one switch default");
        assert_eq!(parse_err("(1 + 2"), "Missing ) in parenthetical");
        assert_eq!(parse_err("a[1"), "Missing ] in index expression");
        assert_eq!(parse_err("a ? b"), "Missing : after ?");
        assert_eq!(parse_err("1 +"), "Missing operand");
        assert_eq!(parse_err("try {} catch (e) {} catch (f if f) {}"), "Guarded catch after unguarded");
        assert_eq!(parse_err("try {}"), "Invalid try statement");
    }

    #[test]
    fn test_syntax_error_metadata() {
        let err = parse_program("var ok = 1;\nvar = 2;", "meta.js", 5).unwrap_err();
        assert_eq!(err.js_file(), Some("meta.js"));
        assert_eq!(err.js_line(), Some(6));
    }
}
