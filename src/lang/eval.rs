use std::collections::HashMap;

use super::ast::{BinOp, Expr, Program, Stmt};
use super::value::Value;
use crate::shell::error::EvalError;

type EvalResult<T> = std::result::Result<T, EvalError>;

/// Host trait implemented by whatever runs interpreter programs.
///
/// Every operation must return immediately: console I/O is requested, never
/// performed, by the host.
pub trait Host {
    /// Write `text` to the console, optionally followed by a newline.
    fn print(&mut self, text: String, newline: bool);
    /// Ask for one console line; once it arrives, bind it to global `target`.
    fn read_line(&mut self, target: String, prompt: Option<String>);
    /// Program arguments.
    fn argv(&self) -> &[String];
}

/// Tree-walking evaluator holding the persistent variable scopes.
#[derive(Debug, Clone)]
pub struct Interpreter {
    scopes: Vec<HashMap<String, Value>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with an empty global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Bind (or rebind) a global variable
    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        self.scopes[0].insert(name.into(), value);
    }

    /// Look up a variable, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Run a program to completion, returning the value of its last statement.
    pub fn execute(&mut self, program: &Program, host: &mut dyn Host) -> EvalResult<Value> {
        let result = self.exec_body(&program.body, &program.label, host);
        // Blocks pop their own scopes, but an error unwinds past them.
        self.scopes.truncate(1);
        result
    }

    fn exec_body(&mut self, body: &[Stmt], label: &str, host: &mut dyn Host) -> EvalResult<Value> {
        let mut last = Value::Nil;
        for stmt in body {
            last = self.exec_stmt(stmt, label, host)?;
        }
        Ok(last)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, label: &str, host: &mut dyn Host) -> EvalResult<Value> {
        match stmt {
            Stmt::Def { name, value } => {
                let value = self.eval(value, label, host)?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value.clone());
                }
                Ok(value)
            }
            Stmt::Assign { name, value, line } => {
                let value = self.eval(value, label, host)?;
                match self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name)) {
                    Some(slot) => {
                        *slot = value.clone();
                        Ok(value)
                    }
                    None => Err(EvalError::new(format!("undefined variable '{}'", name))
                        .within(format!("assignment at {}:{}", label, line))),
                }
            }
            Stmt::Expr(expr) => self.eval(expr, label, host),
        }
    }

    fn eval_args(&mut self, exprs: &[Expr], label: &str, host: &mut dyn Host) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for arg in exprs {
            values.push(self.eval(arg, label, host)?);
        }
        Ok(values)
    }

    fn eval(&mut self, expr: &Expr, label: &str, host: &mut dyn Host) -> EvalResult<Value> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Text(text) => Ok(Value::Text(text.clone())),
            Expr::Ident { name, line } => self.lookup(name).cloned().ok_or_else(|| {
                EvalError::new(format!("undefined variable '{}'", name))
                    .within(format!("{}:{}", label, line))
            }),
            Expr::Table(items) => Ok(Value::Table(self.eval_args(items, label, host)?)),
            Expr::Block { body, line } => {
                self.scopes.push(HashMap::new());
                let result = self.exec_body(body, label, host);
                self.scopes.pop();
                result.map_err(|e| e.within(format!("block at {}:{}", label, line)))
            }
            Expr::Neg(operand) => match self.eval(operand, label, host)? {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::new("integer overflow")),
                other => Err(EvalError::new(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            },
            Expr::Binary {
                op,
                left,
                right,
                line,
            } => {
                let left = self.eval(left, label, host)?;
                let right = self.eval(right, label, host)?;
                apply_binary(*op, left, right)
                    .map_err(|e| e.within(format!("'{}' at {}:{}", op.symbol(), label, line)))
            }
            Expr::Call { name, args, line } => {
                let outcome = match self.eval_args(args, label, host) {
                    Ok(values) => call_builtin(name, values, host),
                    Err(err) => Err(err),
                };
                outcome.map_err(|e| e.within(format!("{}() at {}:{}", name, label, line)))
            }
        }
    }
}

fn apply_binary(op: BinOp, left: Value, right: Value) -> EvalResult<Value> {
    use Value::*;

    let overflow = || EvalError::new("integer overflow");
    match (op, left, right) {
        (BinOp::Eq, l, r) => Ok(Bool(l == r)),
        (BinOp::Ne, l, r) => Ok(Bool(l != r)),
        (BinOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or_else(overflow),
        (BinOp::Sub, Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or_else(overflow),
        (BinOp::Mul, Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or_else(overflow),
        (BinOp::Div | BinOp::Rem, Int(_), Int(0)) => Err(EvalError::new("division by zero")),
        (BinOp::Div, Int(a), Int(b)) => a.checked_div(b).map(Int).ok_or_else(overflow),
        (BinOp::Rem, Int(a), Int(b)) => a.checked_rem(b).map(Int).ok_or_else(overflow),
        (BinOp::Add, Text(a), b) => Ok(Text(a + &b.render())),
        (BinOp::Add, a, Text(b)) => Ok(Text(a.render() + &b)),
        (BinOp::Add, Table(mut a), Table(b)) => {
            a.extend(b);
            Ok(Table(a))
        }
        (BinOp::Lt, Int(a), Int(b)) => Ok(Bool(a < b)),
        (BinOp::Le, Int(a), Int(b)) => Ok(Bool(a <= b)),
        (BinOp::Gt, Int(a), Int(b)) => Ok(Bool(a > b)),
        (BinOp::Ge, Int(a), Int(b)) => Ok(Bool(a >= b)),
        (BinOp::Lt, Text(a), Text(b)) => Ok(Bool(a < b)),
        (BinOp::Le, Text(a), Text(b)) => Ok(Bool(a <= b)),
        (BinOp::Gt, Text(a), Text(b)) => Ok(Bool(a > b)),
        (BinOp::Ge, Text(a), Text(b)) => Ok(Bool(a >= b)),
        (op, l, r) => Err(EvalError::new(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn call_builtin(name: &str, args: Vec<Value>, host: &mut dyn Host) -> EvalResult<Value> {
    match name {
        "print" | "println" => {
            let text: String = args.iter().map(Value::render).collect();
            host.print(text, name == "println");
            Ok(Value::Nil)
        }
        "readln" => {
            let mut args = args.into_iter();
            let target = match args.next() {
                Some(Value::Text(target)) => target,
                Some(other) => {
                    return Err(EvalError::new(format!(
                        "readln expects a variable name as text, got {}",
                        other.type_name()
                    )));
                }
                None => return Err(arity("readln", "1 or 2", 0)),
            };
            let prompt = match args.next() {
                None => None,
                Some(prompt) => Some(prompt.render()),
            };
            if args.next().is_some() {
                return Err(EvalError::new("readln expects 1 or 2 arguments"));
            }
            host.read_line(target, prompt);
            Ok(Value::Nil)
        }
        "argv" => {
            if !args.is_empty() {
                return Err(arity("argv", "0", args.len()));
            }
            Ok(Value::Table(
                host.argv().iter().cloned().map(Value::Text).collect(),
            ))
        }
        "len" => match args.as_slice() {
            [Value::Text(text)] => Ok(Value::Int(text.chars().count() as i64)),
            [Value::Table(items)] => Ok(Value::Int(items.len() as i64)),
            [other] => Err(EvalError::new(format!(
                "len expects text or a table, got {}",
                other.type_name()
            ))),
            _ => Err(arity("len", "1", args.len())),
        },
        _ => Err(EvalError::new(format!("undefined function '{}'", name))),
    }
}

fn arity(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::new(format!(
        "{} expects {} argument(s), got {}",
        name, expected, got
    ))
}
