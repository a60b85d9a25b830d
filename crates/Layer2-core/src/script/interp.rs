//! Tree-walking interpreter with a step / wall-clock budget
//!
//! 모든 문장과 식 평가가 한 스텝입니다. 스텝 한도는 매 스텝,
//! 시계는 256 스텝마다 확인합니다.

use super::ast::*;
use super::sandbox::SandboxLimits;
use super::value::{
    format_number, parse_float_prefix, parse_int_prefix, write_joined, ArrayRef, Closure, Native,
    Value,
};
use super::ScriptError;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// 클로저 호출 깊이 한도
const MAX_CALL_DEPTH: usize = 64;

/// 인덱스 대입으로 늘릴 수 있는 배열 길이 한도
const MAX_ARRAY_GAP: usize = 100_000;

const CLOCK_CHECK_INTERVAL: u64 = 256;

type Eval<T> = Result<T, ScriptError>;

fn type_error(message: impl Into<String>) -> ScriptError {
    ScriptError::Thrown(message.into())
}

// ============================================================================
// Environment
// ============================================================================

#[derive(Debug)]
struct Binding {
    value: Value,
    constant: bool,
    redeclarable: bool,
}

/// 렉시컬 스코프
#[derive(Debug, Default)]
pub struct Env {
    vars: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    fn declare(&self, name: &str, value: Value, kind: DeclKind) -> Eval<()> {
        let mut vars = self.vars.borrow_mut();
        if let Some(existing) = vars.get(name) {
            if !(existing.redeclarable && kind == DeclKind::Var) {
                return Err(ScriptError::Syntax(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
        }
        vars.insert(
            name.to_string(),
            Binding {
                value,
                constant: kind == DeclKind::Const,
                redeclarable: kind == DeclKind::Var,
            },
        );
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.vars.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    fn assign(&self, name: &str, value: Value) -> Eval<()> {
        if let Some(binding) = self.vars.borrow_mut().get_mut(name) {
            if binding.constant {
                return Err(type_error("Assignment to constant variable."));
            }
            binding.value = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(type_error(format!("{} is not defined", name))),
        }
    }

    /// 클로저 ↔ 스코프 순환 참조 해제
    fn clear_chain(&self) {
        self.vars.borrow_mut().clear();
        if let Some(parent) = &self.parent {
            parent.clear_chain();
        }
    }
}

// ============================================================================
// Interpreter
// ============================================================================

enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter<'a> {
    limits: &'a SandboxLimits,
    started: Instant,
    steps: u64,
    depth: usize,
    captured: Vec<Rc<Env>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(limits: &'a SandboxLimits) -> Self {
        Self {
            limits,
            started: Instant::now(),
            steps: 0,
            depth: 0,
            captured: Vec::new(),
        }
    }

    /// `line` 하나만 바인딩된 새 스코프에서 프로그램을 실행하고 반환값을 문자열로
    ///
    /// `undefined`/`null` 반환은 빈 문자열. 반환값 변환도 같은 한도 안에서 이뤄집니다.
    pub fn run(&mut self, program: &[Stmt], line: &str) -> Eval<String> {
        let env = Env::root();
        env.declare("line", Value::from(line), DeclKind::Let)?;

        let result = self.exec_body(program, &env);

        env.clear_chain();
        for captured in self.captured.drain(..) {
            captured.clear_chain();
        }

        match result? {
            Flow::Return(value) if !value.is_nullish() => self.stringify(&value),
            _ => Ok(String::new()),
        }
    }

    fn tick(&mut self) -> Eval<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ScriptError::Timeout);
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > self.limits.timeout
        {
            return Err(ScriptError::Timeout);
        }
        Ok(())
    }

    fn string(&self, s: String) -> Eval<Value> {
        if s.len() > self.limits.max_string_len {
            return Err(type_error("Invalid string length"));
        }
        Ok(Value::from(s))
    }

    /// 배열 원소 하나마다 한 스텝 + 길이 확인
    fn check_len(&mut self, len: usize) -> Eval<()> {
        self.tick()?;
        if len > self.limits.max_string_len {
            return Err(type_error("Invalid string length"));
        }
        Ok(())
    }

    /// 한도 안에서의 `String(value)`
    fn stringify(&mut self, value: &Value) -> Eval<String> {
        let mut out = String::new();
        value.write_js_string(&mut out, &mut Vec::new(), &mut |len: usize| self.check_len(len))?;
        self.check_len(out.len())?;
        Ok(out)
    }

    fn join(&mut self, items: &ArrayRef, separator: &str) -> Eval<Value> {
        let mut out = String::new();
        write_joined(items, separator, &mut out, &mut Vec::new(), &mut |len: usize| {
            self.check_len(len)
        })?;
        self.string(out)
    }

    /// `ToPrimitive`: 배열은 한도 안에서 문자열로
    fn primitive(&mut self, value: &Value) -> Eval<Value> {
        match value {
            Value::Array(_) => Ok(Value::from(self.stringify(value)?)),
            other => Ok(other.to_primitive()),
        }
    }

    fn number(&mut self, value: &Value) -> Eval<f64> {
        Ok(self.primitive(value)?.to_number())
    }

    /// 배열 인자만 문자열로 (콜백 등은 그대로)
    fn flatten_arrays(&mut self, args: Vec<Value>) -> Eval<Vec<Value>> {
        args.into_iter()
            .map(|arg| match arg {
                Value::Array(_) => Ok(Value::from(self.stringify(&arg)?)),
                other => Ok(other),
            })
            .collect()
    }

    fn loose_eq(&mut self, a: &Value, b: &Value) -> Eval<bool> {
        let scalar = |v: &Value| matches!(v, Value::Str(_) | Value::Num(_) | Value::Bool(_));
        let mixed = (matches!(a, Value::Array(_)) && scalar(b))
            || (scalar(a) && matches!(b, Value::Array(_)));
        if mixed {
            let pa = self.primitive(a)?;
            let pb = self.primitive(b)?;
            return Ok(pa.loose_eq(&pb));
        }
        Ok(a.loose_eq(b))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec_body(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Eval<Flow> {
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Eval<Flow> {
        self.tick()?;

        match stmt {
            Stmt::Empty => Ok(Flow::Normal),
            Stmt::Decl(kind, decls) => {
                for (name, init) in decls {
                    let value = match init {
                        Some(expr) => self.eval(expr, env)?,
                        None => Value::Undefined,
                    };
                    env.declare(name, value, *kind)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If(test, then, otherwise) => {
                if self.eval(test, env)?.truthy() {
                    self.exec(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(test, body) => {
                while self.eval(test, env)?.truthy() {
                    match self.exec(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let loop_env = Env::child(env);
                if let Some(init) = init {
                    self.exec(init, &loop_env)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &loop_env)?.truthy() {
                            break;
                        }
                    } else {
                        self.tick()?;
                    }
                    match self.exec(body, &loop_env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, &loop_env)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
                    other => {
                        return Err(type_error(format!(
                            "{} is not iterable",
                            other.to_js_string()
                        )))
                    }
                };
                for item in items {
                    let iter_env = Env::child(env);
                    iter_env.declare(name, item, *kind)?;
                    match self.exec(body, &iter_env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => {
                let block_env = Env::child(env);
                self.exec_body(stmts, &block_env)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval(expr, env)?;
                Err(ScriptError::Thrown(self.stringify(&value)?))
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn eval(&mut self, expr: &Expr, env: &Rc<Env>) -> Eval<Value> {
        self.tick()?;

        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::from(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Lit(s) => out.push_str(s),
                        TemplatePart::Expr(e) => {
                            let value = self.eval(e, env)?;
                            out.push_str(&self.stringify(&value)?);
                        }
                    }
                    if out.len() > self.limits.max_string_len {
                        return Err(type_error("Invalid string length"));
                    }
                }
                Ok(Value::from(out))
            }
            Expr::Ident(name) => self.resolve(name, env),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, env)?);
                }
                Ok(Value::array(values))
            }
            Expr::Unary(op, operand) => {
                if *op == UnaryOp::TypeOf {
                    if let Expr::Ident(name) = operand.as_ref() {
                        if env.lookup(name).is_none() && Native::global(name).is_none() {
                            return Ok(Value::from("undefined"));
                        }
                    }
                }
                let value = self.eval(operand, env)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Num(-self.number(&value)?),
                    UnaryOp::Plus => Value::Num(self.number(&value)?),
                    UnaryOp::TypeOf => Value::from(value.type_of()),
                })
            }
            Expr::Binary(op, left, right) => {
                let a = self.eval(left, env)?;
                let b = self.eval(right, env)?;
                self.binary(*op, &a, &b)
            }
            Expr::Logical(op, left, right) => {
                let a = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !a.truthy(),
                    LogicalOp::Or => a.truthy(),
                    LogicalOp::Nullish => !a.is_nullish(),
                };
                if short_circuit {
                    Ok(a)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Cond(test, then, otherwise) => {
                if self.eval(test, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Assign(op, target, value) => {
                let new_value = match op {
                    AssignOp::Assign => self.eval(value, env)?,
                    compound => {
                        let current = self.eval(target, env)?;
                        let rhs = self.eval(value, env)?;
                        let binary = match compound {
                            AssignOp::Add => BinaryOp::Add,
                            AssignOp::Sub => BinaryOp::Sub,
                            AssignOp::Mul => BinaryOp::Mul,
                            AssignOp::Div => BinaryOp::Div,
                            _ => BinaryOp::Rem,
                        };
                        self.binary(binary, &current, &rhs)?
                    }
                };
                self.store(target, new_value.clone(), env)?;
                Ok(new_value)
            }
            Expr::Update {
                increment,
                prefix,
                target,
            } => {
                let current = self.eval(target, env)?;
                let old = self.number(&current)?;
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.store(target, Value::Num(new), env)?;
                Ok(Value::Num(if *prefix { new } else { old }))
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let target = self.eval(object, env)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                self.property(&target, property)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object, env)?;
                let key = self.eval(index, env)?;
                self.index(&target, &key)
            }
            Expr::Call { callee, args } => self.call_expr(callee, args, env),
            Expr::Arrow(function) => {
                self.captured.push(Rc::clone(env));
                Ok(Value::Closure(Rc::new(Closure {
                    function: Rc::clone(function),
                    env: Rc::clone(env),
                })))
            }
        }
    }

    fn resolve(&self, name: &str, env: &Rc<Env>) -> Eval<Value> {
        if let Some(value) = env.lookup(name) {
            return Ok(value);
        }
        Native::global(name)
            .map(Value::Native)
            .ok_or_else(|| type_error(format!("{} is not defined", name)))
    }

    fn store(&mut self, target: &Expr, value: Value, env: &Rc<Env>) -> Eval<()> {
        match target {
            Expr::Ident(name) => env.assign(name, value),
            Expr::Index { object, index } => {
                let container = self.eval(object, env)?;
                let key = self.eval(index, env)?;
                let key = self.primitive(&key)?;
                match container {
                    Value::Array(items) => {
                        let idx = key.to_number();
                        if idx.fract() != 0.0 || idx < 0.0 {
                            return Ok(());
                        }
                        let idx = idx as usize;
                        let mut items = items.borrow_mut();
                        if idx >= items.len() + MAX_ARRAY_GAP {
                            return Err(type_error("Invalid array length"));
                        }
                        if idx >= items.len() {
                            items.resize(idx + 1, Value::Undefined);
                        }
                        items[idx] = value;
                        Ok(())
                    }
                    v if v.is_nullish() => Err(type_error(format!(
                        "Cannot set properties of {} (setting '{}')",
                        v.to_js_string(),
                        key.to_js_string()
                    ))),
                    _ => Ok(()),
                }
            }
            _ => Err(ScriptError::Syntax(
                "Invalid left-hand side in assignment".to_string(),
            )),
        }
    }

    fn binary(&mut self, op: BinaryOp, a: &Value, b: &Value) -> Eval<Value> {
        Ok(match op {
            BinaryOp::Add => {
                let pa = self.primitive(a)?;
                let pb = self.primitive(b)?;
                if matches!(pa, Value::Str(_)) || matches!(pb, Value::Str(_)) {
                    let mut s = pa.to_js_string();
                    s.push_str(&pb.to_js_string());
                    return self.string(s);
                }
                Value::Num(pa.to_number() + pb.to_number())
            }
            BinaryOp::Sub => Value::Num(self.number(a)? - self.number(b)?),
            BinaryOp::Mul => Value::Num(self.number(a)? * self.number(b)?),
            BinaryOp::Div => Value::Num(self.number(a)? / self.number(b)?),
            BinaryOp::Rem => Value::Num(self.number(a)? % self.number(b)?),
            BinaryOp::Eq => Value::Bool(self.loose_eq(a, b)?),
            BinaryOp::NotEq => Value::Bool(!self.loose_eq(a, b)?),
            BinaryOp::StrictEq => Value::Bool(a.strict_eq(b)),
            BinaryOp::StrictNotEq => Value::Bool(!a.strict_eq(b)),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let pa = self.primitive(a)?;
                let pb = self.primitive(b)?;
                let ordering = pa.compare(&pb);
                Value::Bool(match op {
                    BinaryOp::Lt => ordering == Some(Ordering::Less),
                    BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    BinaryOp::Gt => ordering == Some(Ordering::Greater),
                    _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                })
            }
        })
    }

    // ========================================================================
    // Property access
    // ========================================================================

    fn property(&self, target: &Value, name: &str) -> Eval<Value> {
        match target {
            v if v.is_nullish() => Err(type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                v.to_js_string(),
                name
            ))),
            Value::Str(s) if name == "length" => Ok(Value::Num(s.chars().count() as f64)),
            Value::Array(items) if name == "length" => Ok(Value::Num(items.borrow().len() as f64)),
            Value::Native(Native::Math) => Ok(match name {
                "PI" => Value::Num(std::f64::consts::PI),
                "E" => Value::Num(std::f64::consts::E),
                _ => Native::math_member(name)
                    .map(Value::Native)
                    .unwrap_or(Value::Undefined),
            }),
            _ => Ok(Value::Undefined),
        }
    }

    fn index(&mut self, target: &Value, key: &Value) -> Eval<Value> {
        let key = self.primitive(key)?;
        if let Value::Str(k) = &key {
            if &**k != "length" {
                if let Ok(n) = k.parse::<usize>() {
                    return self.index(target, &Value::Num(n as f64));
                }
            }
            return self.property(target, k);
        }

        let idx = key.to_number();
        let position = (idx >= 0.0 && idx.fract() == 0.0).then_some(idx as usize);
        match target {
            v if v.is_nullish() => Err(type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                v.to_js_string(),
                key.to_js_string()
            ))),
            Value::Array(items) => Ok(position
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or(Value::Undefined)),
            Value::Str(s) => Ok(position
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::from(c.to_string()))
                .unwrap_or(Value::Undefined)),
            _ => Ok(Value::Undefined),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn call_expr(&mut self, callee: &Expr, args: &[Expr], env: &Rc<Env>) -> Eval<Value> {
        if let Expr::Member {
            object,
            property,
            optional,
        } = callee
        {
            let target = self.eval(object, env)?;
            if *optional && target.is_nullish() {
                return Ok(Value::Undefined);
            }
            let args = self.eval_args(args, env)?;
            return self.call_method(&target, property, args, &describe(callee));
        }

        let function = self.eval(callee, env)?;
        let args = self.eval_args(args, env)?;
        self.call_value(&function, args, &describe(callee))
    }

    fn eval_args(&mut self, args: &[Expr], env: &Rc<Env>) -> Eval<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, env)?);
        }
        Ok(values)
    }

    fn call_value(&mut self, function: &Value, args: Vec<Value>, name: &str) -> Eval<Value> {
        match function {
            Value::Closure(closure) => self.call_closure(closure, args),
            Value::Native(native) if *native != Native::Math => self.call_native(*native, &args),
            _ => Err(type_error(format!("{} is not a function", name))),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, args: Vec<Value>) -> Eval<Value> {
        self.depth += 1;
        if self.depth > MAX_CALL_DEPTH {
            self.depth -= 1;
            return Err(type_error("Maximum call stack size exceeded"));
        }

        let result = self.invoke(closure, args);
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, closure: &Rc<Closure>, args: Vec<Value>) -> Eval<Value> {
        let call_env = Env::child(&closure.env);
        let mut args = args.into_iter();
        for param in &closure.function.params {
            call_env.declare(param, args.next().unwrap_or(Value::Undefined), DeclKind::Let)?;
        }

        match &closure.function.body {
            FnBody::Expr(expr) => self.eval(expr, &call_env),
            FnBody::Block(stmts) => match self.exec_body(stmts, &call_env)? {
                Flow::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
        }
    }

    fn call_native(&mut self, native: Native, args: &[Value]) -> Eval<Value> {
        let truthy = args.first().map(Value::truthy).unwrap_or(false);
        let args = self.flatten_arrays(args.to_vec())?;
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
        let num = |i: usize| arg(i).to_number();

        Ok(match native {
            Native::ParseInt => {
                let radix = args
                    .get(1)
                    .map(|r| r.to_number())
                    .filter(|r| r.is_finite() && *r != 0.0)
                    .map(|r| r as u32);
                Value::Num(parse_int_prefix(&arg(0).to_js_string(), radix))
            }
            Native::ParseFloat => Value::Num(parse_float_prefix(&arg(0).to_js_string())),
            Native::Number => Value::Num(if args.is_empty() { 0.0 } else { num(0) }),
            Native::String => {
                if args.is_empty() {
                    Value::from("")
                } else {
                    Value::from(arg(0).to_js_string())
                }
            }
            Native::Boolean => Value::Bool(truthy),
            Native::IsNaN => Value::Bool(num(0).is_nan()),
            Native::MathFloor => Value::Num(num(0).floor()),
            Native::MathCeil => Value::Num(num(0).ceil()),
            Native::MathRound => Value::Num((num(0) + 0.5).floor()),
            Native::MathTrunc => Value::Num(num(0).trunc()),
            Native::MathAbs => Value::Num(num(0).abs()),
            Native::MathSqrt => Value::Num(num(0).sqrt()),
            Native::MathPow => Value::Num(num(0).powf(num(1))),
            Native::MathSign => {
                let n = num(0);
                Value::Num(if n.is_nan() || n == 0.0 { n } else { n.signum() })
            }
            Native::MathMin => Value::Num(
                args.iter()
                    .map(Value::to_number)
                    .fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
            ),
            Native::MathMax => Value::Num(
                args.iter()
                    .map(Value::to_number)
                    .fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
            ),
            Native::Math => return Err(type_error("Math is not a function")),
        })
    }

    fn call_method(
        &mut self,
        target: &Value,
        name: &str,
        args: Vec<Value>,
        description: &str,
    ) -> Eval<Value> {
        match target {
            v if v.is_nullish() => Err(type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                v.to_js_string(),
                name
            ))),
            Value::Str(s) => {
                let args = self.flatten_arrays(args)?;
                self.string_method(s, name, args, description)
            }
            Value::Array(items) => self.array_method(items, name, args, description),
            Value::Num(n) => {
                let args = self.flatten_arrays(args)?;
                number_method(*n, name, &args, description)
            }
            Value::Bool(b) if name == "toString" => Ok(Value::from(b.to_string())),
            Value::Native(Native::Math) => match Native::math_member(name) {
                Some(native) => self.call_native(native, &args),
                None => Err(type_error(format!("{} is not a function", description))),
            },
            _ => Err(type_error(format!("{} is not a function", description))),
        }
    }

    // ========================================================================
    // String methods
    // ========================================================================

    fn string_method(
        &mut self,
        s: &str,
        name: &str,
        args: Vec<Value>,
        description: &str,
    ) -> Eval<Value> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
        let len = s.chars().count();

        match name {
            "toUpperCase" | "toLocaleUpperCase" => Ok(Value::from(s.to_uppercase())),
            "toLowerCase" | "toLocaleLowerCase" => Ok(Value::from(s.to_lowercase())),
            "trim" => Ok(Value::from(s.trim())),
            "trimStart" | "trimLeft" => Ok(Value::from(s.trim_start())),
            "trimEnd" | "trimRight" => Ok(Value::from(s.trim_end())),
            "toString" | "valueOf" => Ok(Value::from(s)),
            "split" => {
                let limit = match arg(1) {
                    Value::Undefined => usize::MAX,
                    v => v.to_number().max(0.0) as usize,
                };
                let parts: Vec<Value> = match arg(0) {
                    Value::Undefined => vec![Value::from(s)],
                    sep => {
                        let sep = sep.to_js_string();
                        if sep.is_empty() {
                            s.chars().map(|c| Value::from(c.to_string())).collect()
                        } else {
                            s.split(sep.as_str()).map(Value::from).collect()
                        }
                    }
                };
                Ok(Value::array(parts.into_iter().take(limit).collect()))
            }
            "replace" | "replaceAll" => {
                let pattern = arg(0).to_js_string();
                let replacement = arg(1);
                let all = name == "replaceAll";
                self.replace(s, &pattern, &replacement, all)
            }
            "slice" => {
                let start = relative_index(arg(0), len, 0);
                let end = relative_index(arg(1), len, len);
                Ok(Value::from(char_range(s, start, end.max(start))))
            }
            "substring" => {
                let clamp = |v: Value, default: usize| match v {
                    Value::Undefined => default,
                    v => {
                        let n = v.to_number();
                        if n.is_nan() {
                            0
                        } else {
                            n.max(0.0).min(len as f64) as usize
                        }
                    }
                };
                let a = clamp(arg(0), 0);
                let b = clamp(arg(1), len);
                Ok(Value::from(char_range(s, a.min(b), a.max(b))))
            }
            "indexOf" => {
                let needle = arg(0).to_js_string();
                let from = relative_index(arg(1), len, 0).min(len);
                let offset = char_to_byte(s, from);
                Ok(Value::Num(
                    s[offset..]
                        .find(&needle)
                        .map(|b| (from + s[offset..offset + b].chars().count()) as f64)
                        .unwrap_or(-1.0),
                ))
            }
            "lastIndexOf" => {
                let needle = arg(0).to_js_string();
                Ok(Value::Num(
                    s.rfind(&needle)
                        .map(|b| s[..b].chars().count() as f64)
                        .unwrap_or(-1.0),
                ))
            }
            "includes" => Ok(Value::Bool(s.contains(&arg(0).to_js_string()))),
            "startsWith" => Ok(Value::Bool(s.starts_with(&arg(0).to_js_string()))),
            "endsWith" => Ok(Value::Bool(s.ends_with(&arg(0).to_js_string()))),
            "repeat" => {
                let count = arg(0).to_number();
                if count < 0.0 || count.is_infinite() {
                    return Err(type_error(format!(
                        "Invalid count value: {}",
                        format_number(count)
                    )));
                }
                let count = if count.is_nan() { 0 } else { count as usize };
                if s.len().saturating_mul(count) > self.limits.max_string_len {
                    return Err(type_error("Invalid string length"));
                }
                Ok(Value::from(s.repeat(count)))
            }
            "padStart" | "padEnd" => {
                let target = arg(0).to_number();
                let target = if target.is_nan() { 0 } else { target.max(0.0) as usize };
                if target > self.limits.max_string_len {
                    return Err(type_error("Invalid string length"));
                }
                let fill = match arg(1) {
                    Value::Undefined => " ".to_string(),
                    v => v.to_js_string(),
                };
                if target <= len || fill.is_empty() {
                    return Ok(Value::from(s));
                }
                let padding: String = fill.chars().cycle().take(target - len).collect();
                Ok(Value::from(if name == "padStart" {
                    format!("{}{}", padding, s)
                } else {
                    format!("{}{}", s, padding)
                }))
            }
            "charAt" => {
                let i = arg(0).to_number();
                let i = if i.is_nan() { 0.0 } else { i };
                Ok(Value::from(
                    (i >= 0.0)
                        .then(|| s.chars().nth(i as usize))
                        .flatten()
                        .map(|c| c.to_string())
                        .unwrap_or_default(),
                ))
            }
            "at" => {
                let i = arg(0).to_number();
                let i = if i.is_nan() { 0.0 } else { i.trunc() };
                let idx = if i < 0.0 { len as f64 + i } else { i };
                Ok((idx >= 0.0)
                    .then(|| s.chars().nth(idx as usize))
                    .flatten()
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or(Value::Undefined))
            }
            "charCodeAt" | "codePointAt" => {
                let i = arg(0).to_number();
                let i = if i.is_nan() { 0.0 } else { i };
                Ok(Value::Num(
                    (i >= 0.0)
                        .then(|| s.chars().nth(i as usize))
                        .flatten()
                        .map(|c| c as u32 as f64)
                        .unwrap_or(f64::NAN),
                ))
            }
            "concat" => {
                let mut out = s.to_string();
                for a in &args {
                    out.push_str(&a.to_js_string());
                }
                self.string(out)
            }
            _ => Err(type_error(format!("{} is not a function", description))),
        }
    }

    fn replace(&mut self, s: &str, pattern: &str, replacement: &Value, all: bool) -> Eval<Value> {
        let mut out = String::new();
        let mut rest = s;
        let mut replaced_any = false;

        if pattern.is_empty() {
            let insert = self.replacement_text(replacement, pattern)?;
            if !all {
                return self.string(format!("{}{}", insert, s));
            }
            for c in s.chars() {
                out.push_str(&insert);
                out.push(c);
            }
            out.push_str(&insert);
            return self.string(out);
        }

        while let Some(pos) = rest.find(pattern) {
            if replaced_any && !all {
                break;
            }
            out.push_str(&rest[..pos]);
            out.push_str(&self.replacement_text(replacement, pattern)?);
            rest = &rest[pos + pattern.len()..];
            replaced_any = true;
            if out.len() > self.limits.max_string_len {
                return Err(type_error("Invalid string length"));
            }
        }
        out.push_str(rest);
        self.string(out)
    }

    fn replacement_text(&mut self, replacement: &Value, matched: &str) -> Eval<String> {
        match replacement {
            Value::Closure(closure) => {
                let result = self.call_closure(closure, vec![Value::from(matched)])?;
                self.stringify(&result)
            }
            other => Ok(other.to_js_string().replace("$&", matched)),
        }
    }

    // ========================================================================
    // Array methods
    // ========================================================================

    fn array_method(
        &mut self,
        items: &ArrayRef,
        name: &str,
        args: Vec<Value>,
        description: &str,
    ) -> Eval<Value> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
        let snapshot = || items.borrow().clone();

        match name {
            "join" => {
                let separator = match arg(0) {
                    Value::Undefined => ",".to_string(),
                    v => self.stringify(&v)?,
                };
                self.join(items, &separator)
            }
            "toString" => self.join(items, ","),
            "push" => {
                let mut items = items.borrow_mut();
                items.extend(args.iter().cloned());
                Ok(Value::Num(items.len() as f64))
            }
            "pop" => Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined)),
            "shift" => {
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    Ok(Value::Undefined)
                } else {
                    Ok(items.remove(0))
                }
            }
            "reverse" => {
                items.borrow_mut().reverse();
                Ok(Value::Array(Rc::clone(items)))
            }
            "slice" => {
                let bounds = self.flatten_arrays(vec![arg(0), arg(1)])?;
                let all = snapshot();
                let len = all.len();
                let start = relative_index(bounds[0].clone(), len, 0);
                let end = relative_index(bounds[1].clone(), len, len).max(start);
                Ok(Value::array(all[start..end].to_vec()))
            }
            "includes" => {
                let needle = arg(0);
                Ok(Value::Bool(items.borrow().iter().any(|v| {
                    v.strict_eq(&needle)
                        || matches!((v, &needle), (Value::Num(a), Value::Num(b)) if a.is_nan() && b.is_nan())
                })))
            }
            "indexOf" => {
                let needle = arg(0);
                Ok(Value::Num(
                    items
                        .borrow()
                        .iter()
                        .position(|v| v.strict_eq(&needle))
                        .map(|p| p as f64)
                        .unwrap_or(-1.0),
                ))
            }
            "concat" => {
                let mut all = snapshot();
                for a in &args {
                    match a {
                        Value::Array(other) => all.extend(other.borrow().iter().cloned()),
                        v => all.push(v.clone()),
                    }
                }
                Ok(Value::array(all))
            }
            "map" | "filter" | "forEach" | "some" | "every" | "find" | "findIndex" => {
                let callback = match arg(0) {
                    Value::Closure(c) => c,
                    Value::Native(n) if n != Native::Math => {
                        return self.array_native_callback(n, snapshot(), name, description)
                    }
                    other => {
                        return Err(type_error(format!(
                            "{} is not a function",
                            self.stringify(&other)?
                        )))
                    }
                };
                let all = snapshot();
                let mut mapped = Vec::new();
                for (i, item) in all.into_iter().enumerate() {
                    let result =
                        self.call_closure(&callback, vec![item.clone(), Value::Num(i as f64)])?;
                    match name {
                        "map" => mapped.push(result),
                        "filter" if result.truthy() => mapped.push(item),
                        "some" if result.truthy() => return Ok(Value::Bool(true)),
                        "every" if !result.truthy() => return Ok(Value::Bool(false)),
                        "find" if result.truthy() => return Ok(item),
                        "findIndex" if result.truthy() => return Ok(Value::Num(i as f64)),
                        _ => {}
                    }
                }
                Ok(match name {
                    "map" | "filter" => Value::array(mapped),
                    "some" => Value::Bool(false),
                    "every" => Value::Bool(true),
                    "findIndex" => Value::Num(-1.0),
                    _ => Value::Undefined,
                })
            }
            "sort" => {
                let comparator = match arg(0) {
                    Value::Closure(c) => Some(c),
                    _ => None,
                };
                let sorted = self.merge_sort(snapshot(), comparator.as_ref())?;
                *items.borrow_mut() = sorted;
                Ok(Value::Array(Rc::clone(items)))
            }
            _ => Err(type_error(format!("{} is not a function", description))),
        }
    }

    /// `arr.map(Number)` 같은 내장 함수 콜백
    fn array_native_callback(
        &mut self,
        native: Native,
        all: Vec<Value>,
        name: &str,
        description: &str,
    ) -> Eval<Value> {
        let mut results = Vec::with_capacity(all.len());
        for item in &all {
            self.tick()?;
            results.push(self.call_native(native, std::slice::from_ref(item))?);
        }
        match name {
            "map" => Ok(Value::array(results)),
            "filter" => Ok(Value::array(
                all.into_iter()
                    .zip(results)
                    .filter(|(_, r)| r.truthy())
                    .map(|(v, _)| v)
                    .collect(),
            )),
            "forEach" => Ok(Value::Undefined),
            "some" => Ok(Value::Bool(results.iter().any(Value::truthy))),
            "every" => Ok(Value::Bool(results.iter().all(Value::truthy))),
            _ => Err(type_error(format!("{} is not supported", description))),
        }
    }

    fn merge_sort(&mut self, items: Vec<Value>, comparator: Option<&Rc<Closure>>) -> Eval<Vec<Value>> {
        if items.len() <= 1 {
            return Ok(items);
        }
        let mut left = items;
        let right = left.split_off(left.len() / 2);
        let left = self.merge_sort(left, comparator)?;
        let right = self.merge_sort(right, comparator)?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
            self.tick()?;
            let take_right = match comparator {
                Some(c) => {
                    let order = self.call_closure(c, vec![a.clone(), b.clone()])?;
                    self.number(&order)? > 0.0
                }
                None => self.sort_key(a)? > self.sort_key(b)?,
            };
            let next = if take_right { right.next() } else { left.next() };
            if let Some(v) = next {
                merged.push(v);
            }
        }
        merged.extend(left);
        merged.extend(right);
        Ok(merged)
    }

    fn sort_key(&mut self, v: &Value) -> Eval<(bool, String)> {
        // undefined는 항상 뒤로
        Ok((matches!(v, Value::Undefined), self.stringify(v)?))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn number_method(n: f64, name: &str, args: &[Value], description: &str) -> Eval<Value> {
    match name {
        "toFixed" => {
            let digits = args.first().map(|d| d.to_number()).unwrap_or(0.0);
            let digits = if digits.is_nan() { 0.0 } else { digits };
            if !(0.0..=100.0).contains(&digits) {
                return Err(type_error("toFixed() digits argument must be between 0 and 100"));
            }
            if !n.is_finite() {
                return Ok(Value::from(format_number(n)));
            }
            Ok(Value::from(format!("{:.*}", digits as usize, n)))
        }
        "toString" => {
            let radix = args.first().map(|r| r.to_number()).unwrap_or(10.0);
            if radix == 10.0 || !n.is_finite() || n.fract() != 0.0 {
                return Ok(Value::from(format_number(n)));
            }
            let radix = radix as u32;
            if !(2..=36).contains(&radix) {
                return Err(type_error("toString() radix must be between 2 and 36"));
            }
            let mut value = n.abs() as u64;
            let mut digits = Vec::new();
            loop {
                let d = (value % radix as u64) as u32;
                digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
                value /= radix as u64;
                if value == 0 {
                    break;
                }
            }
            if n < 0.0 {
                digits.push('-');
            }
            Ok(Value::from(digits.into_iter().rev().collect::<String>()))
        }
        "valueOf" => Ok(Value::Num(n)),
        _ => Err(type_error(format!("{} is not a function", description))),
    }
}

/// slice 스타일 인덱스 (음수는 끝에서부터)
fn relative_index(v: Value, len: usize, default: usize) -> usize {
    match v {
        Value::Undefined => default,
        v => {
            let n = v.to_number();
            if n.is_nan() {
                0
            } else if n < 0.0 {
                (len as f64 + n.trunc()).max(0.0) as usize
            } else {
                n.min(len as f64) as usize
            }
        }
    }
}

fn char_to_byte(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(b, _)| b).unwrap_or(s.len())
}

fn char_range(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// 에러 메시지용 호출 대상 표현
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe(object), property),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        Expr::Str(_) | Expr::Template(_) => "string".to_string(),
        _ => "expression".to_string(),
    }
}
