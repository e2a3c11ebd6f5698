use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Interpreter, Interrupt};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Built-in function backed by a plain fn pointer.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// User-declared function or method.
///
/// Holds the shared declaration and the environment captured where the
/// declaration was executed; invoking it always extends that captured chain,
/// never the caller's.
#[derive(Clone)]
pub struct LoxFunction {
    decl: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl LoxFunction {
    pub fn new(
        decl: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            decl,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// A copy of this function whose closure is extended with a frame binding
    /// `this` to the receiver.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            decl: Rc::clone(&self.decl),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// Invokes the function body in a fresh frame under the captured closure.
    ///
    /// A return signal from the body is consumed here; initializers yield the
    /// bound instance no matter how the body exits.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Value>,
    ) -> std::result::Result<Value, Interrupt> {
        debug!("Calling fn '{}' with {} arg(s)", self.name(), args.len());

        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        for (param, arg) in self.decl.params.iter().zip(args) {
            environment.borrow_mut().define(&param.lexeme, arg);
        }

        match interpreter.execute_block(&self.decl.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Interrupt::Return(value)) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(value)
                }
            }

            Err(interrupt) => Err(interrupt),
        }
    }

    // An initializer's closure is always a `bind` frame, so `this` sits at
    // distance zero.
    fn bound_this(&self) -> std::result::Result<Value, Interrupt> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            Interrupt::from(LoxError::runtime(
                self.decl.name.line,
                "Undefined variable 'this'.",
            ))
        })
    }
}
