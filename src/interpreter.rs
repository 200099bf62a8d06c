//! Tree-walking evaluator.
//!
//! Statement execution threads a [`Signal`] back up the call stack instead
//! of using `Result`'s error channel for `retornar`/`romper`/`continuar` —
//! that keeps `intentar ... capturar` from ever intercepting a loop's
//! `romper` the way it would if both were the same enum. `this` is tracked
//! as an explicit stack of call frames rather than a field on `Environment`,
//! so a function value can be passed around and called later without
//! dragging someone else's `this` along with it.
//!
//! `evaluate` takes the enclosing statement's line number and threads it
//! through every nested call, since expression nodes don't carry their own
//! span — a runtime error inside a multi-line expression is reported at the
//! line of the statement that contains it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::environment::Environment;
use crate::error::{HispanoError, Result};
use crate::value::{BoundMethod, Class, Function, Instance, Value};

pub enum Signal {
    Return(Value),
    Break,
    Continue,
}

struct CallFrame {
    receiver: Option<Value>,
}

pub struct Interpreter {
    env: Environment,
    call_stack: Vec<CallFrame>,
    pub output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter { env: Environment::new(), call_stack: Vec::new(), output: Vec::new() }
    }

    pub fn with_environment(env: Environment) -> Self {
        Interpreter { env, call_stack: Vec::new(), output: Vec::new() }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn run(&mut self, program: &Program) -> Result<()> {
        let env = self.env.clone();
        for stmt in program {
            if let Some(signal) = self.execute_stmt(stmt, &env)? {
                return match signal {
                    Signal::Return(_) => Err(HispanoError::ReturnOutsideFunction { line: stmt.line }),
                    Signal::Break | Signal::Continue => Ok(()),
                };
            }
        }
        Ok(())
    }

    // ---- statements -----------------------------------------------------

    fn execute_block(&mut self, block: &Block, env: &Environment) -> Result<Option<Signal>> {
        for stmt in block {
            if let Some(signal) = self.execute_stmt(stmt, env)? {
                return Ok(Some(signal));
            }
        }
        Ok(None)
    }

    fn execute_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Option<Signal>> {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::VariableDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.evaluate(expr, env, line)?,
                    None => Value::Undefined,
                };
                env.define(name, value);
                Ok(None)
            }
            StmtKind::ConstantDecl { name, init } => {
                let value = self.evaluate(init, env, line)?;
                env.define_constant(name, value);
                Ok(None)
            }
            StmtKind::FunctionDecl { name, params, body } => {
                let function = Function {
                    name: Some(name.clone()),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                env.define(name, Value::Function(Rc::new(function)));
                Ok(None)
            }
            StmtKind::ClassDecl(decl) => {
                self.execute_class_decl(decl, env, line)?;
                Ok(None)
            }
            StmtKind::Print(expr) => {
                let value = self.evaluate(expr, env, line)?;
                self.output.push(value.stringify());
                Ok(None)
            }
            StmtKind::Read { name } => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_line(&mut raw)
                    .map_err(|_| HispanoError::TypeError { message: "no se pudo leer la entrada".to_string(), line })?;
                let trimmed = raw.trim();
                let value =
                    trimmed.parse::<f64>().map(Value::Number).unwrap_or_else(|_| Value::string(trimmed.to_string()));
                env.define(name, value);
                Ok(None)
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                if self.evaluate(cond, env, line)?.is_truthy() {
                    self.execute_block(then_branch, &env.child())
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch, &env.child())
                } else {
                    Ok(None)
                }
            }
            StmtKind::While { cond, body } => {
                while self.evaluate(cond, env, line)?.is_truthy() {
                    match self.execute_block(body, &env.child())? {
                        Some(Signal::Break) => break,
                        Some(Signal::Continue) | None => {}
                        signal @ Some(Signal::Return(_)) => return Ok(signal),
                    }
                }
                Ok(None)
            }
            StmtKind::DoWhile { body, cond } => {
                loop {
                    match self.execute_block(body, &env.child())? {
                        Some(Signal::Break) => break,
                        Some(Signal::Continue) | None => {}
                        signal @ Some(Signal::Return(_)) => return Ok(signal),
                    }
                    if !self.evaluate(cond, env, line)?.is_truthy() {
                        break;
                    }
                }
                Ok(None)
            }
            StmtKind::For { header, body } => {
                let loop_env = env.child();
                if let Some(init) = &header.init {
                    self.execute_stmt(init, &loop_env)?;
                }
                loop {
                    if let Some(cond) = &header.cond {
                        if !self.evaluate(cond, &loop_env, line)?.is_truthy() {
                            break;
                        }
                    }
                    match self.execute_block(body, &loop_env.child())? {
                        Some(Signal::Break) => break,
                        Some(Signal::Continue) | None => {}
                        signal @ Some(Signal::Return(_)) => return Ok(signal),
                    }
                    if let Some(step) = &header.step {
                        self.evaluate(step, &loop_env, line)?;
                    }
                }
                Ok(None)
            }
            StmtKind::ForEach { var, iterable, body } => {
                let iterable_value = self.evaluate(iterable, env, line)?;
                let items = match &iterable_value {
                    Value::Array(items) => items.borrow().clone(),
                    other => {
                        return Err(HispanoError::TypeError {
                            message: format!("no se puede iterar sobre un valor de tipo {}", other.type_tag()),
                            line,
                        });
                    }
                };
                for item in items {
                    let iter_env = env.child();
                    iter_env.define(var, item);
                    match self.execute_block(body, &iter_env)? {
                        Some(Signal::Break) => break,
                        Some(Signal::Continue) | None => {}
                        signal @ Some(Signal::Return(_)) => return Ok(signal),
                    }
                }
                Ok(None)
            }
            StmtKind::Switch { discriminant, cases, default } => {
                let disc = self.evaluate(discriminant, env, line)?;
                let switch_env = env.child();
                for case in cases {
                    let test_value = self.evaluate(&case.test, &switch_env, line)?;
                    if disc == test_value {
                        return match self.execute_block(&case.body, &switch_env.child())? {
                            Some(Signal::Break) => Ok(None),
                            other => Ok(other),
                        };
                    }
                }
                if let Some(default_body) = default {
                    return match self.execute_block(default_body, &switch_env.child())? {
                        Some(Signal::Break) => Ok(None),
                        other => Ok(other),
                    };
                }
                Ok(None)
            }
            StmtKind::TryCatch { try_block, catch_var, catch_block } => {
                match self.execute_block(try_block, &env.child()) {
                    Ok(signal) => Ok(signal),
                    Err(err) => {
                        let catch_env = env.child();
                        catch_env.define(catch_var, Value::string(err.message()));
                        self.execute_block(catch_block, &catch_env)
                    }
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env, line)?,
                    None => Value::Undefined,
                };
                Ok(Some(Signal::Return(value)))
            }
            StmtKind::Break => Ok(Some(Signal::Break)),
            StmtKind::Continue => Ok(Some(Signal::Continue)),
            StmtKind::Block(block) => self.execute_block(block, &env.child()),
            StmtKind::ExpressionStatement(expr) => {
                self.evaluate(expr, env, line)?;
                Ok(None)
            }
        }
    }

    fn execute_class_decl(&mut self, decl: &ClassDecl, env: &Environment, line: usize) -> Result<()> {
        let superclass = match &decl.superclass {
            Some(name) => match env.get(name, line)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(HispanoError::TypeError {
                        message: format!("'{}' no es una clase", other.type_tag()),
                        line,
                    });
                }
            },
            None => None,
        };
        let mut methods = IndexMap::new();
        for method in &decl.methods {
            methods.insert(
                method.name.clone(),
                Rc::new(Function {
                    name: Some(method.name.clone()),
                    params: method.params.clone(),
                    body: method.body.clone(),
                    closure: env.clone(),
                }),
            );
        }
        let class = Rc::new(Class {
            name: decl.name.clone(),
            superclass,
            constructor: decl.constructor.clone(),
            methods,
            closure: env.clone(),
        });
        env.define(&decl.name, Value::Class(class));
        Ok(())
    }

    // ---- expressions ------------------------------------------------------

    fn evaluate(&mut self, expr: &Expr, env: &Environment, line: usize) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(Self::literal_value(lit)),
            Expr::TemplateString { parts, expressions } => self.evaluate_template(parts, expressions, env, line),
            Expr::Variable(name) => self.resolve_variable(name, env, line),
            Expr::Assign { name, value } => {
                let v = self.evaluate(value, env, line)?;
                env.assign(name, v.clone(), line)?;
                Ok(v)
            }
            Expr::ArrayLiteral(items) => {
                let values = self.evaluate_args(items, env, line)?;
                Ok(Value::array(values))
            }
            Expr::ArrayAccess { array, index } => {
                let arr = self.evaluate(array, env, line)?;
                let idx = self.evaluate(index, env, line)?;
                self.array_get(&arr, &idx, line)
            }
            Expr::ArrayAssign { array, index, value } => {
                let arr = self.evaluate(array, env, line)?;
                let idx = self.evaluate(index, env, line)?;
                let v = self.evaluate(value, env, line)?;
                self.array_set(&arr, &idx, v.clone(), line)?;
                Ok(v)
            }
            Expr::ObjectLiteral(fields) => {
                let mut map = IndexMap::new();
                for (key, value_expr) in fields {
                    let value = self.evaluate(value_expr, env, line)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::object(map))
            }
            Expr::PropertyAccess { object, name } => {
                let obj = self.evaluate(object, env, line)?;
                self.property_get(&obj, name, line)
            }
            Expr::PropertyAssign { object, name, value } => {
                let obj = self.evaluate(object, env, line)?;
                let v = self.evaluate(value, env, line)?;
                self.property_set(&obj, name, v.clone(), line)?;
                Ok(v)
            }
            Expr::CompoundAssign { target, op, value } => {
                let current = self.get_lvalue(target, env, line)?;
                let rhs = self.evaluate(value, env, line)?;
                let new_value = self.apply_assign_op(*op, current, rhs, line)?;
                self.set_lvalue(target, new_value.clone(), env, line)?;
                Ok(new_value)
            }
            Expr::Logical { op, left, right } => {
                let left_value = self.evaluate(left, env, line)?;
                match op {
                    LogicalOp::And if !left_value.is_truthy() => Ok(left_value),
                    LogicalOp::Or if left_value.is_truthy() => Ok(left_value),
                    _ => self.evaluate(right, env, line),
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand, env, line)?;
                match op {
                    UnaryOp::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(HispanoError::TypeError {
                            message: format!("no se puede negar un valor de tipo {}", other.type_tag()),
                            line,
                        }),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.evaluate(left, env, line)?;
                let r = self.evaluate(right, env, line)?;
                self.binary_op(*op, l, r, line)
            }
            Expr::Prefix { op, target } => {
                let current = self.get_lvalue(target, env, line)?;
                let new_value = Self::step_numeric(*op, &current, line)?;
                self.set_lvalue(target, new_value.clone(), env, line)?;
                Ok(new_value)
            }
            Expr::Postfix { op, target } => {
                let current = self.get_lvalue(target, env, line)?;
                let new_value = Self::step_numeric(*op, &current, line)?;
                self.set_lvalue(target, new_value, env, line)?;
                Ok(current)
            }
            Expr::Call { callee, args } => {
                let callee_value = self.evaluate(callee, env, line)?;
                let values = self.evaluate_args(args, env, line)?;
                self.call_value(callee_value, values, line)
            }
            Expr::MethodCall { receiver, name, args } => {
                let receiver_value = self.evaluate(receiver, env, line)?;
                let values = self.evaluate_args(args, env, line)?;
                self.call_method_on(receiver_value, name, values, line)
            }
            Expr::New { class_name, args } => {
                let class_value = env.get(class_name, line)?;
                let values = self.evaluate_args(args, env, line)?;
                match class_value {
                    Value::Class(class) => self.instantiate(&class, values, line),
                    other => Err(HispanoError::TypeError {
                        message: format!("'{}' no es una clase", other.type_tag()),
                        line,
                    }),
                }
            }
            Expr::This => self.current_receiver(line),
            Expr::ThisPropertyAccess { name } => {
                let this = self.current_receiver(line)?;
                self.property_get(&this, name, line)
            }
            Expr::ThisPropertyAssign { name, value } => {
                let this = self.current_receiver(line)?;
                let v = self.evaluate(value, env, line)?;
                self.property_set(&this, name, v.clone(), line)?;
                Ok(v)
            }
            Expr::ThisMethodCall { name, args } => {
                let this = self.current_receiver(line)?;
                let values = self.evaluate_args(args, env, line)?;
                self.call_method_on(this, name, values, line)
            }
            Expr::SuperCall { args } => self.evaluate_super_call(args, env, line),
            Expr::AnonymousFunction { params, body } => Ok(Value::Function(Rc::new(Function {
                name: None,
                params: params.clone(),
                body: body.clone(),
                closure: env.clone(),
            }))),
            Expr::ArrowFunction { params, body } => {
                let block = match body {
                    ArrowBody::Expression(expr) => vec![Stmt::new(line, StmtKind::Return(Some((**expr).clone())))],
                    ArrowBody::Block(block) => block.clone(),
                };
                Ok(Value::Function(Rc::new(Function {
                    name: None,
                    params: params.clone(),
                    body: block,
                    closure: env.clone(),
                })))
            }
        }
    }

    fn literal_value(lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
            Literal::Undefined => Value::Undefined,
        }
    }

    fn evaluate_template(&mut self, parts: &[String], expressions: &[Expr], env: &Environment, line: usize) -> Result<Value> {
        let mut result = String::new();
        for (i, part) in parts.iter().enumerate() {
            result.push_str(part);
            if let Some(expr) = expressions.get(i) {
                let value = self.evaluate(expr, env, line)?;
                result.push_str(&value.stringify_spanish());
            }
        }
        Ok(Value::string(result))
    }

    fn evaluate_args(&mut self, args: &[Expr], env: &Environment, line: usize) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg, env, line)).collect()
    }

    /// Built-in free functions always win over a same-named
    /// environment binding — a user `variable raiz = ...;` never shadows the
    /// `raiz()` built-in.
    fn resolve_variable(&self, name: &str, env: &Environment, line: usize) -> Result<Value> {
        if let Some(native) = crate::builtins::lookup_free_function(name) {
            return Ok(Value::NativeFunction(Rc::new(native)));
        }
        env.get(name, line)
    }

    fn get_lvalue(&mut self, target: &LValue, env: &Environment, line: usize) -> Result<Value> {
        match target {
            LValue::Variable(name) => self.resolve_variable(name, env, line),
            LValue::ArrayElement { array, index } => {
                let arr = self.evaluate(array, env, line)?;
                let idx = self.evaluate(index, env, line)?;
                self.array_get(&arr, &idx, line)
            }
            LValue::Property { object, name } => {
                let obj = self.evaluate(object, env, line)?;
                self.property_get(&obj, name, line)
            }
            LValue::ThisProperty { name } => {
                let this = self.current_receiver(line)?;
                self.property_get(&this, name, line)
            }
        }
    }

    fn set_lvalue(&mut self, target: &LValue, value: Value, env: &Environment, line: usize) -> Result<()> {
        match target {
            LValue::Variable(name) => env.assign(name, value, line),
            LValue::ArrayElement { array, index } => {
                let arr = self.evaluate(array, env, line)?;
                let idx = self.evaluate(index, env, line)?;
                self.array_set(&arr, &idx, value, line)
            }
            LValue::Property { object, name } => {
                let obj = self.evaluate(object, env, line)?;
                self.property_set(&obj, name, value, line)
            }
            LValue::ThisProperty { name } => {
                let this = self.current_receiver(line)?;
                self.property_set(&this, name, value, line)
            }
        }
    }

    fn step_numeric(op: IncDec, current: &Value, line: usize) -> Result<Value> {
        match current {
            Value::Number(n) => Ok(Value::Number(match op {
                IncDec::Inc => n + 1.0,
                IncDec::Dec => n - 1.0,
            })),
            other => Err(HispanoError::TypeError {
                message: format!("no se puede incrementar un valor de tipo {}", other.type_tag()),
                line,
            }),
        }
    }

    fn apply_assign_op(&mut self, op: AssignOp, current: Value, rhs: Value, line: usize) -> Result<Value> {
        let binary_op = match op {
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
        };
        self.binary_op(binary_op, current, rhs, line)
    }

    fn binary_op(&self, op: BinaryOp, l: Value, r: Value, line: usize) -> Result<Value> {
        match op {
            BinaryOp::Add => match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::string(format!("{}{}", l.stringify(), r.stringify())))
                }
                _ => Err(HispanoError::TypeError {
                    message: format!("no se puede sumar un valor de tipo {} con uno de tipo {}", l.type_tag(), r.type_tag()),
                    line,
                }),
            },
            BinaryOp::Sub => Self::numeric_op(&l, &r, line, "restar", |a, b| a - b),
            BinaryOp::Mul => Self::numeric_op(&l, &r, line, "multiplicar", |a, b| a * b),
            BinaryOp::Div => {
                let (a, b) = Self::require_numbers(&l, &r, line, "dividir")?;
                if b == 0.0 {
                    return Err(HispanoError::DivisionByZero { line });
                }
                Ok(Value::Number(a / b))
            }
            BinaryOp::Mod => {
                let (a, b) = Self::require_numbers(&l, &r, line, "calcular el módulo de")?;
                if b == 0.0 {
                    return Err(HispanoError::ModuloByZero { line });
                }
                Ok(Value::Number(a % b))
            }
            BinaryOp::Eq => Ok(Value::Bool(l == r)),
            BinaryOp::NotEq => Ok(Value::Bool(l != r)),
            BinaryOp::Lt => Ok(Value::Bool(Self::compare(&l, &r, line)? == std::cmp::Ordering::Less)),
            BinaryOp::LtEq => Ok(Value::Bool(Self::compare(&l, &r, line)? != std::cmp::Ordering::Greater)),
            BinaryOp::Gt => Ok(Value::Bool(Self::compare(&l, &r, line)? == std::cmp::Ordering::Greater)),
            BinaryOp::GtEq => Ok(Value::Bool(Self::compare(&l, &r, line)? != std::cmp::Ordering::Less)),
        }
    }

    fn numeric_op(l: &Value, r: &Value, line: usize, verb: &str, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
        let (a, b) = Self::require_numbers(l, r, line, verb)?;
        Ok(Value::Number(f(a, b)))
    }

    fn require_numbers(l: &Value, r: &Value, line: usize, verb: &str) -> Result<(f64, f64)> {
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(HispanoError::TypeError {
                message: format!("no se puede {} un valor de tipo {} con uno de tipo {}", verb, l.type_tag(), r.type_tag()),
                line,
            }),
        }
    }

    fn compare(l: &Value, r: &Value, line: usize) -> Result<std::cmp::Ordering> {
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => {
                a.partial_cmp(b).ok_or_else(|| HispanoError::TypeError { message: "no se puede comparar NaN".to_string(), line })
            }
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            _ => Err(HispanoError::TypeError {
                message: format!("no se pueden comparar valores de tipo {} y {}", l.type_tag(), r.type_tag()),
                line,
            }),
        }
    }

    fn array_get(&self, arr: &Value, idx: &Value, line: usize) -> Result<Value> {
        let Value::Array(items) = arr else {
            return Err(HispanoError::TypeError { message: format!("no se puede indexar un valor de tipo {}", arr.type_tag()), line });
        };
        let Value::Number(n) = idx else {
            return Err(HispanoError::TypeError { message: "el índice debe ser un número".to_string(), line });
        };
        let items_ref = items.borrow();
        let i = *n as i64;
        if i < 0 || i as usize >= items_ref.len() {
            return Err(HispanoError::BoundsError { index: i, length: items_ref.len(), line });
        }
        Ok(items_ref[i as usize].clone())
    }

    fn array_set(&self, arr: &Value, idx: &Value, value: Value, line: usize) -> Result<()> {
        let Value::Array(items) = arr else {
            return Err(HispanoError::TypeError { message: format!("no se puede indexar un valor de tipo {}", arr.type_tag()), line });
        };
        let Value::Number(n) = idx else {
            return Err(HispanoError::TypeError { message: "el índice debe ser un número".to_string(), line });
        };
        let mut items_ref = items.borrow_mut();
        let i = *n as i64;
        if i < 0 || i as usize >= items_ref.len() {
            return Err(HispanoError::BoundsError { index: i, length: items_ref.len(), line });
        }
        items_ref[i as usize] = value;
        Ok(())
    }

    fn property_get(&self, obj: &Value, name: &str, line: usize) -> Result<Value> {
        match obj {
            Value::Object(fields) => Ok(fields.borrow().get(name).cloned().unwrap_or(Value::Undefined)),
            Value::Instance(instance) => {
                let borrowed = instance.borrow();
                if let Some(value) = borrowed.fields.get(name) {
                    return Ok(value.clone());
                }
                if let Some(method) = borrowed.class.find_method(name) {
                    return Ok(Value::BoundMethod(Rc::new(BoundMethod { receiver: obj.clone(), method })));
                }
                Ok(Value::Undefined)
            }
            _ => crate::builtins::call_method(obj, name, &[], line)
                .unwrap_or_else(|| Err(HispanoError::UnknownMethod { class: obj.type_tag().to_string(), method: name.to_string(), line })),
        }
    }

    fn property_set(&self, obj: &Value, name: &str, value: Value, line: usize) -> Result<()> {
        match obj {
            Value::Object(fields) => {
                fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            Value::Instance(instance) => {
                instance.borrow_mut().fields.insert(name.to_string(), value);
                Ok(())
            }
            other => Err(HispanoError::TypeError {
                message: format!("no se pueden asignar propiedades a un valor de tipo {}", other.type_tag()),
                line,
            }),
        }
    }

    fn current_receiver(&self, line: usize) -> Result<Value> {
        match self.call_stack.last() {
            Some(CallFrame { receiver: Some(value) }) => Ok(value.clone()),
            _ => Err(HispanoError::InvalidThis { line }),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, line: usize) -> Result<Value> {
        match callee {
            Value::Function(function) => self.call_function(&function, args, None, line),
            Value::NativeFunction(native) => crate::builtins::call_free_function(native.name, &args, line),
            Value::BoundMethod(bound) => self.call_function(&bound.method, args, Some(bound.receiver.clone()), line),
            Value::Class(class) => self.instantiate(&class, args, line),
            other => Err(HispanoError::TypeError { message: format!("no se puede invocar un valor de tipo {}", other.type_tag()), line }),
        }
    }

    fn call_method_on(&mut self, receiver: Value, name: &str, args: Vec<Value>, line: usize) -> Result<Value> {
        if let Value::Array(items) = &receiver {
            if let Some(result) = self.array_higher_order(items.clone(), name, args.clone(), line) {
                return result;
            }
        }
        match &receiver {
            Value::Instance(instance) => {
                let method = instance.borrow().class.find_method(name);
                if let Some(method) = method {
                    return self.call_function(&method, args, Some(receiver.clone()), line);
                }
                let field = instance.borrow().fields.get(name).cloned();
                if let Some(field_value) = field {
                    return self.call_value(field_value, args, line);
                }
                Err(HispanoError::UnknownMethod { class: instance.borrow().class.name.clone(), method: name.to_string(), line })
            }
            Value::Object(fields) => {
                let field = fields.borrow().get(name).cloned();
                if let Some(field_value) = field {
                    return self.call_value(field_value, args, line);
                }
                crate::builtins::call_method(&receiver, name, &args, line)
                    .unwrap_or_else(|| Err(HispanoError::UnknownMethod { class: "objeto".to_string(), method: name.to_string(), line }))
            }
            _ => crate::builtins::call_method(&receiver, name, &args, line)
                .unwrap_or_else(|| Err(HispanoError::UnknownMethod { class: receiver.type_tag().to_string(), method: name.to_string(), line })),
        }
    }

    /// The array methods that take a callback. These live here
    /// rather than in `builtins` because invoking the callback needs
    /// `call_value`, which only the interpreter has.
    fn array_higher_order(&mut self, items: Rc<RefCell<Vec<Value>>>, name: &str, args: Vec<Value>, line: usize) -> Option<Result<Value>> {
        match name {
            "recorrer" => Some(self.array_for_each(items, args, line)),
            "filtrar" => Some(self.array_filter(items, args, line)),
            "mapear" => Some(self.array_map(items, args, line)),
            "reducir" => Some(self.array_reduce(items, args, line)),
            "algunos" => Some(self.array_some(items, args, line)),
            "todos" => Some(self.array_every(items, args, line)),
            "ordenar" => Some(self.array_sort(items, args, line)),
            "buscar" => Some(self.array_find(items, args, line)),
            _ => None,
        }
    }

    fn take_callback(mut args: Vec<Value>, line: usize) -> Result<Value> {
        if args.is_empty() {
            return Err(HispanoError::Arity { expected: 1, found: 0, line });
        }
        Ok(args.remove(0))
    }

    fn array_for_each(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        for (i, item) in snapshot.into_iter().enumerate() {
            self.call_value(callback.clone(), vec![item, Value::Number(i as f64)], line)?;
        }
        Ok(Value::Undefined)
    }

    fn array_filter(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        let mut kept = Vec::new();
        for (i, item) in snapshot.into_iter().enumerate() {
            let keep = self.call_value(callback.clone(), vec![item.clone(), Value::Number(i as f64)], line)?;
            if keep.is_truthy() {
                kept.push(item);
            }
        }
        Ok(Value::array(kept))
    }

    fn array_map(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        let mut mapped = Vec::with_capacity(snapshot.len());
        for (i, item) in snapshot.into_iter().enumerate() {
            mapped.push(self.call_value(callback.clone(), vec![item, Value::Number(i as f64)], line)?);
        }
        Ok(Value::array(mapped))
    }

    fn array_reduce(&mut self, items: Rc<RefCell<Vec<Value>>>, mut args: Vec<Value>, line: usize) -> Result<Value> {
        if args.is_empty() {
            return Err(HispanoError::Arity { expected: 1, found: 0, line });
        }
        let callback = args.remove(0);
        let initial = if args.is_empty() { None } else { Some(args.remove(0)) };
        let snapshot: Vec<Value> = items.borrow().clone();
        let mut iter = snapshot.into_iter();
        let mut accumulator = match initial {
            Some(value) => value,
            None => iter.next().ok_or(HispanoError::EmptyCollection { line })?,
        };
        for (i, item) in iter.enumerate() {
            accumulator = self.call_value(callback.clone(), vec![accumulator, item, Value::Number(i as f64)], line)?;
        }
        Ok(accumulator)
    }

    fn array_some(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        for (i, item) in snapshot.into_iter().enumerate() {
            if self.call_value(callback.clone(), vec![item, Value::Number(i as f64)], line)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }

    fn array_every(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        for (i, item) in snapshot.into_iter().enumerate() {
            if !self.call_value(callback.clone(), vec![item, Value::Number(i as f64)], line)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }

    /// `ordenar([cmp])`: sorts by `cmp(a, b)` (negative, zero, positive — the
    /// usual comparator convention) when a callback is given, falling back
    /// to the default ordering otherwise. Non-mutating, like the no-argument
    /// form.
    fn array_sort(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let snapshot: Vec<Value> = items.borrow().clone();
        match args.into_iter().next() {
            None => {
                let mut sorted = snapshot;
                sorted.sort_by(crate::builtins::compare_values);
                Ok(Value::array(sorted))
            }
            Some(callback) => {
                let mut sorted = snapshot;
                let mut err = None;
                sorted.sort_by(|a, b| {
                    if err.is_some() {
                        return std::cmp::Ordering::Equal;
                    }
                    match self.call_value(callback.clone(), vec![a.clone(), b.clone()], line) {
                        Ok(Value::Number(n)) => n.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal),
                        Ok(_) => std::cmp::Ordering::Equal,
                        Err(e) => {
                            err = Some(e);
                            std::cmp::Ordering::Equal
                        }
                    }
                });
                match err {
                    Some(e) => Err(e),
                    None => Ok(Value::array(sorted)),
                }
            }
        }
    }

    /// `buscar(f)`: returns the first element for which `f` is truthy, or
    /// `nulo` if none matches.
    fn array_find(&mut self, items: Rc<RefCell<Vec<Value>>>, args: Vec<Value>, line: usize) -> Result<Value> {
        let callback = Self::take_callback(args, line)?;
        let snapshot: Vec<Value> = items.borrow().clone();
        for (i, item) in snapshot.into_iter().enumerate() {
            if self.call_value(callback.clone(), vec![item.clone(), Value::Number(i as f64)], line)?.is_truthy() {
                return Ok(item);
            }
        }
        Ok(Value::Null)
    }

    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>, receiver: Option<Value>, line: usize) -> Result<Value> {
        if args.len() != function.params.len() {
            return Err(HispanoError::Arity { expected: function.params.len(), found: args.len(), line });
        }
        let call_env = function.closure.child();
        for (param, arg) in function.params.iter().zip(args) {
            call_env.define(&param.name, arg);
        }
        self.call_stack.push(CallFrame { receiver });
        let result = self.execute_block(&function.body, &call_env);
        self.call_stack.pop();
        match result? {
            Some(Signal::Return(value)) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>, line: usize) -> Result<Value> {
        let instance = Rc::new(RefCell::new(Instance { class: class.clone(), fields: IndexMap::new() }));
        match &class.constructor {
            Some((params, body)) => {
                if args.len() != params.len() {
                    return Err(HispanoError::Arity { expected: params.len(), found: args.len(), line });
                }
                let call_env = class.closure.child();
                for (param, arg) in params.iter().zip(args) {
                    call_env.define(&param.name, arg);
                }
                self.call_stack.push(CallFrame { receiver: Some(Value::Instance(instance.clone())) });
                let result = self.execute_block(body, &call_env);
                self.call_stack.pop();
                result?;
            }
            None if !args.is_empty() => {
                return Err(HispanoError::Arity { expected: 0, found: args.len(), line });
            }
            None => {}
        }
        Ok(Value::Instance(instance))
    }

    fn evaluate_super_call(&mut self, args: &[Expr], env: &Environment, line: usize) -> Result<Value> {
        let this = self.current_receiver(line)?;
        let class = match &this {
            Value::Instance(instance) => instance.borrow().class.clone(),
            _ => return Err(HispanoError::InvalidThis { line }),
        };
        let superclass = class.superclass.clone().ok_or(HispanoError::InvalidThis { line })?;
        let values = self.evaluate_args(args, env, line)?;
        if let Some((params, body)) = &superclass.constructor {
            if values.len() != params.len() {
                return Err(HispanoError::Arity { expected: params.len(), found: values.len(), line });
            }
            let call_env = superclass.closure.child();
            for (param, arg) in params.iter().zip(values) {
                call_env.define(&param.name, arg);
            }
            self.call_stack.push(CallFrame { receiver: Some(this) });
            let result = self.execute_block(body, &call_env);
            self.call_stack.pop();
            result?;
        }
        Ok(Value::Undefined)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(source: &str) -> Result<Vec<String>> {
        let mut interner = crate::token::Interner::new();
        let lexer = Lexer::new(source, &mut interner);
        let tokens = lexer.tokenize()?;
        let program = Parser::new(tokens, &mut interner).parse()?;
        let mut interp = Interpreter::new();
        interp.run(&program)?;
        Ok(interp.output)
    }

    #[test]
    fn prints_arithmetic_result() {
        let output = run("mostrar 1 + 2;").unwrap();
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn string_concatenation_coerces_numbers() {
        let output = run("mostrar \"total: \" + 5;").unwrap();
        assert_eq!(output, vec!["total: 5"]);
    }

    #[test]
    fn function_call_and_recursion_work() {
        let output = run(
            "funcion fib(n) { si (n < 2) { retornar n; } retornar fib(n - 1) + fib(n - 2); } mostrar fib(7);",
        )
        .unwrap();
        assert_eq!(output, vec!["13"]);
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let output = run(
            "funcion contador() { variable n = 0; retornar funcion() { n = n + 1; retornar n; }; } variable c = contador(); mostrar c(); mostrar c();",
        )
        .unwrap();
        assert_eq!(output, vec!["1", "2"]);
    }

    #[test]
    fn for_each_scope_does_not_leak_outside_loop() {
        let result = run("para cada x en [1, 2] { } mostrar x;");
        assert!(result.is_err());
    }

    #[test]
    fn do_while_runs_body_once_even_if_condition_is_false() {
        let output = run("variable n = 0; hacer { n = n + 1; } mientras (falso); mostrar n;").unwrap();
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn switch_does_not_fall_through() {
        let output = run("elegir (2) { caso 1: mostrar \"uno\"; romper; caso 2: mostrar \"dos\"; romper; caso 3: mostrar \"tres\"; }").unwrap();
        assert_eq!(output, vec!["dos"]);
    }

    #[test]
    fn try_catch_recovers_from_division_by_zero() {
        let output = run("intentar { mostrar 1 / 0; } capturar (e) { mostrar \"error capturado\"; }").unwrap();
        assert_eq!(output, vec!["error capturado"]);
    }

    #[test]
    fn errors_reference_the_statement_line() {
        let result = run("variable a = 1;\nvariable b = 2;\nmostrar noExiste;");
        match result {
            Err(err) => assert_eq!(err.line(), Some(3)),
            Ok(_) => panic!("expected an undefined variable error"),
        }
    }

    #[test]
    fn stray_return_at_top_level_is_an_error() {
        let result = run("retornar 5;");
        assert!(matches!(result, Err(HispanoError::ReturnOutsideFunction { .. })));
    }

    #[test]
    fn constant_reassignment_is_rejected() {
        let result = run("constante PI = 3; PI = 4;");
        assert!(matches!(result, Err(HispanoError::ConstantReassignment { .. })));
    }

    #[test]
    fn class_instantiation_and_method_dispatch() {
        let output = run(
            "clase Persona { constructor(nombre) { este.nombre = nombre; } saludar() { retornar \"hola \" + este.nombre; } } variable p = nuevo Persona(\"Ana\"); mostrar p.saludar();",
        )
        .unwrap();
        assert_eq!(output, vec!["hola Ana"]);
    }

    #[test]
    fn inherited_methods_are_found_on_subclass() {
        let output = run(
            "clase Animal { hacerSonido() { retornar \"...\"; } } clase Perro extiende Animal { } variable d = nuevo Perro(); mostrar d.hacerSonido();",
        )
        .unwrap();
        assert_eq!(output, vec!["..."]);
    }

    #[test]
    fn array_sort_does_not_mutate_other_references_unexpectedly() {
        let output = run("variable a = [3, 1, 2]; variable b = a.ordenar(); mostrar b;").unwrap();
        assert_eq!(output, vec!["[1, 2, 3]"]);
    }

    #[test]
    fn array_map_applies_a_callback_and_returns_a_new_array() {
        let output =
            run("variable a = [1, 2, 3]; variable b = a.mapear(funcion(x) { retornar x * 2; }); mostrar b;").unwrap();
        assert_eq!(output, vec!["[2, 4, 6]"]);
    }

    #[test]
    fn array_reduce_without_initial_value_uses_the_first_element() {
        let output = run("variable total = [1, 2, 3, 4].reducir((acc, x) => acc + x); mostrar total;").unwrap();
        assert_eq!(output, vec!["10"]);
    }

    #[test]
    fn array_filter_keeps_only_truthy_results() {
        let output = run("variable pares = [1, 2, 3, 4].filtrar((x) => x % 2 == 0); mostrar pares;").unwrap();
        assert_eq!(output, vec!["[2, 4]"]);
    }

    #[test]
    fn builtin_name_always_wins_over_shadowing_variable() {
        let output = run("variable raiz = 999; mostrar raiz(9);").unwrap();
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn array_only_method_on_a_string_raises_a_type_error() {
        let result = run("variable s = \"hola\"; s.agregar(1);");
        match result {
            Err(HispanoError::TypeError { message, .. }) => assert!(message.contains("arreglos")),
            other => panic!("expected a type error, got {other:?}"),
        }
    }

    #[test]
    fn template_string_interpolates_expressions() {
        let output = run("variable nombre = \"Ana\"; mostrar `Hola ${nombre}, 2+2=${2+2}`;").unwrap();
        assert_eq!(output, vec!["Hola Ana, 2+2=4"]);
    }

    #[test]
    fn print_and_concatenation_render_booleans_in_english() {
        let output = run("mostrar verdadero; mostrar \"es \" + falso;").unwrap();
        assert_eq!(output, vec!["true", "es false"]);
    }

    #[test]
    fn template_interpolation_renders_booleans_in_spanish() {
        let output = run("mostrar `${verdadero}`;").unwrap();
        assert_eq!(output, vec!["verdadero"]);
    }

    #[test]
    fn ordenar_accepts_a_comparator_callback() {
        let output =
            run("variable a = [3, 1, 2]; variable b = a.ordenar((x, y) => y - x); mostrar b;").unwrap();
        assert_eq!(output, vec!["[3, 2, 1]"]);
    }

    #[test]
    fn buscar_returns_the_first_matching_element() {
        let output = run("variable a = [1, 3, 4, 5]; mostrar a.buscar((x) => x % 2 == 0);").unwrap();
        assert_eq!(output, vec!["4"]);
    }

    #[test]
    fn buscar_returns_null_when_nothing_matches() {
        let output = run("variable a = [1, 3, 5]; mostrar a.buscar((x) => x % 2 == 0);").unwrap();
        assert_eq!(output, vec!["nulo"]);
    }

    #[test]
    fn tipo_reports_the_class_name_for_an_instance() {
        let output = run("clase Persona { } mostrar tipo(nuevo Persona());").unwrap();
        assert_eq!(output, vec!["Persona"]);
    }

    #[test]
    fn redefining_a_constant_as_a_variable_allows_reassignment() {
        let output = run("constante x = 1; variable x = 2; x = 3; mostrar x;").unwrap();
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn empty_string_is_truthy_in_a_condition() {
        let output = run("si (\"\") { mostrar \"vacía es verdadera\"; }").unwrap();
        assert_eq!(output, vec!["vacía es verdadera"]);
    }

    #[test]
    fn raiz_of_a_negative_number_is_a_type_error() {
        let result = run("raiz(-1);");
        assert!(matches!(result, Err(HispanoError::TypeError { .. })));
    }

    #[test]
    fn logaritmo_of_zero_is_a_type_error() {
        let result = run("logaritmo(0);");
        assert!(matches!(result, Err(HispanoError::TypeError { .. })));
    }

    #[test]
    fn super_without_a_parent_class_is_invalid_this() {
        let result = run("clase A { saludar() { super.saludar(); } } nuevo A().saludar();");
        assert!(matches!(result, Err(HispanoError::InvalidThis { .. })));
    }
}
