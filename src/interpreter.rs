use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Reporter, Result};
use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Nonlocal exit during evaluation: either a genuine runtime failure, or the
/// return signal that unwinds to the nearest enclosing function invocation.
///
/// Only [`LoxFunction::call`] consumes the `Return` variant; everything else
/// propagates it so intermediate frames get their environment restored.
#[derive(Debug)]
pub enum Interrupt {
    Error(LoxError),
    Return(Value),
}

impl From<LoxError> for Interrupt {
    fn from(error: LoxError) -> Self {
        Interrupt::Error(error)
    }
}

impl From<io::Error> for Interrupt {
    fn from(error: io::Error) -> Self {
        Interrupt::Error(LoxError::Io(error))
    }
}

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: W,
    is_repl: bool,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W, is_repl: bool) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            })),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            is_repl,
        }
    }

    /// Records a resolved lexical distance for a variable-referencing
    /// expression.  Called by the resolver; ids it never records are treated
    /// as globals at lookup time.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Runs a statement list, reporting the first runtime error and aborting
    /// the rest.  The session (globals, resolved locals) survives so a REPL
    /// can keep going.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Interrupt::Error(error)) => {
                    reporter.report(&error);
                    break;
                }

                Err(Interrupt::Return(_)) => {
                    debug!("return signal escaped to top level");
                    break;
                }
            }
        }
    }

    /// Consumes the interpreter and hands back its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<(), Interrupt> {
        match stmt {
            Stmt::Expression(expr) => {
                let value: Value = self.evaluate(expr)?;

                // The REPL echoes expression values, except for assignments
                // and calls.
                if self.is_repl && !matches!(expr, Expr::Assign { .. } | Expr::Call { .. }) {
                    writeln!(self.output, "{}", value)?;
                }

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(decl) => {
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { keyword: _, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
    ) -> std::result::Result<(), Interrupt> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line: usize = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(
                        LoxError::runtime(line, "Superclass must be a class.").into()
                    );
                }
            },

            None => None,
        };

        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        // Methods of a subclass close over a frame that binds `super` once
        // and never changes.
        if let Some(superclass) = &superclass_value {
            let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                &self.environment,
            ))));

            environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(superclass)));

            self.environment = environment;
        }

        let mut method_map: HashMap<String, LoxFunction> = HashMap::new();

        for method in methods {
            let is_initializer: bool = method.name.lexeme == "init";

            let function =
                LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);

            method_map.insert(method.name.lexeme.clone(), function);
        }

        debug!(
            "Defining class '{}' with {} method(s)",
            name.lexeme,
            method_map.len()
        );

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment = previous;

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    /// Runs `statements` inside `environment`, restoring the previous frame
    /// on every exit path: normal completion, runtime error, or return
    /// signal.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> std::result::Result<(), Interrupt> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: std::result::Result<(), Interrupt> = Ok(());

        for statement in statements {
            result = self.execute(statement);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, Interrupt> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { op, expr } => self.evaluate_unary(op, expr),

            Expr::Binary { lhs, op, rhs } => self.evaluate_binary(lhs, op, rhs),

            Expr::Logical { lhs, op, rhs } => {
                let left: Value = self.evaluate(lhs)?;

                match op.token_type {
                    TokenType::OR if is_truthy(&left) => Ok(left),

                    TokenType::AND if !is_truthy(&left) => Ok(left),

                    _ => self.evaluate(rhs),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        ) {
                            return Err(undefined_variable(name));
                        }
                    }

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                args,
            } => {
                let callee_value: Value = self.evaluate(callee)?;

                // Arguments evaluate left to right; the order is observable.
                let mut arg_values: Vec<Value> = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }

                match callee_value {
                    Value::Function(function) => {
                        check_arity(function.arity(), arg_values.len(), paren)?;

                        function.call(self, arg_values)
                    }

                    Value::NativeFunction(native) => {
                        check_arity(native.arity, arg_values.len(), paren)?;

                        (native.func)(&arg_values).map_err(Interrupt::from)
                    }

                    Value::Class(class) => {
                        check_arity(class.arity(), arg_values.len(), paren)?;

                        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                        if let Some(initializer) = class.find_method("init") {
                            initializer.bind(Rc::clone(&instance)).call(self, arg_values)?;
                        }

                        Ok(Value::Instance(instance))
                    }

                    _ => Err(LoxError::runtime(
                        paren.line,
                        "Can only call functions and classes.",
                    )
                    .into()),
                }
            }

            Expr::Get { obj, name } => match self.evaluate(obj)? {
                Value::Instance(instance) => {
                    LoxInstance::get(&instance, name).map_err(Interrupt::from)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
            },

            Expr::Set { obj, name, value } => match self.evaluate(obj)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
            },

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => {
                // The frame at the recorded distance binds `super`; the one
                // just inside it binds `this`.
                let distance: usize = match self.locals.get(id) {
                    Some(&distance) => distance,
                    None => return Err(undefined_variable(keyword)),
                };

                let superclass: Rc<LoxClass> =
                    match Environment::get_at(&self.environment, distance, "super") {
                        Some(Value::Class(class)) => class,
                        _ => return Err(undefined_variable(keyword)),
                    };

                let instance = match distance
                    .checked_sub(1)
                    .and_then(|d| Environment::get_at(&self.environment, d, "this"))
                {
                    Some(Value::Instance(instance)) => instance,
                    _ => {
                        return Err(Interrupt::from(LoxError::runtime(
                            keyword.line,
                            "Undefined variable 'this'.",
                        )))
                    }
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                    .into()),
                }
            }
        }
    }

    fn evaluate_literal(&self, token: &Token) -> std::result::Result<Value, Interrupt> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(
        &mut self,
        op: &Token,
        expr: &Expr,
    ) -> std::result::Result<Value, Interrupt> {
        let value: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(op.line, "Operand must be a number.").into()),
            },

            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        lhs: &Expr,
        op: &Token,
        rhs: &Expr,
    ) -> std::result::Result<Value, Interrupt> {
        let left: Value = self.evaluate(lhs)?;
        let right: Value = self.evaluate(rhs)?;

        match op.token_type {
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_required(op)),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_required(op)),
            },

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.").into()),
        }
    }

    fn look_up_variable(
        &self,
        name: &Token,
        id: ExprId,
    ) -> std::result::Result<Value, Interrupt> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| undefined_variable(name)),

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Interrupt::from),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn check_arity(
    expected: usize,
    got: usize,
    paren: &Token,
) -> std::result::Result<(), Interrupt> {
    if got == expected {
        Ok(())
    } else {
        Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        )
        .into())
    }
}

fn numbers_required(op: &Token) -> Interrupt {
    LoxError::runtime(op.line, "Operands must be numbers.").into()
}

fn undefined_variable(name: &Token) -> Interrupt {
    LoxError::runtime(
        name.line,
        format!("Undefined variable '{}'.", name.lexeme),
    )
    .into()
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
