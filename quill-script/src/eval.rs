//! Statement and expression evaluator

use crate::ast::{BinOp, Expr, Stmt, UnaryOp};
use crate::scope::{Binding, Namespace};
use crate::{CancelToken, ExecError};
use quill_core::Value;

pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Run statements in order against the namespace. The script result is
    /// the value of the last statement. Cancellation is observed between
    /// statements and never leaves the namespace half-updated.
    pub fn run(
        &self,
        stmts: &[Stmt],
        scope: &mut Namespace,
        cancel: &CancelToken,
    ) -> Result<Value, ExecError> {
        let mut last = Value::Null;
        for stmt in stmts {
            if cancel.is_cancelled() {
                return Err(ExecError::Cancelled);
            }
            last = self.eval_stmt(stmt, scope)?;
        }
        Ok(last)
    }

    fn eval_stmt(&self, stmt: &Stmt, scope: &mut Namespace) -> Result<Value, ExecError> {
        match stmt {
            Stmt::Assign { name, expr, .. } => {
                let value = self.eval_expr(expr, scope)?;
                scope.bind_value(name.clone(), value.clone());
                Ok(value)
            }
            Stmt::Expr { expr, .. } => self.eval_expr(expr, scope),
        }
    }

    fn eval_expr(&self, expr: &Expr, scope: &Namespace) -> Result<Value, ExecError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope)?);
                }
                Ok(Value::List(values))
            }
            Expr::Var(name) => match scope.get(name) {
                Some(Binding::Value(value)) => Ok(value.clone()),
                Some(Binding::Service(_)) => Err(ExecError::runtime(format!(
                    "service '{}' cannot be used as a value",
                    name
                ))),
                None => Err(ExecError::runtime(format!("name '{}' is not defined", name))),
            },
            Expr::Member { target, name } => {
                // service property access short-circuits value evaluation
                if let Expr::Var(var) = target.as_ref() {
                    if let Some(Binding::Service(service)) = scope.get(var) {
                        return service.get(name).map_err(ExecError::service);
                    }
                }
                let value = self.eval_expr(target, scope)?;
                match value {
                    Value::Object(map) => map.get(name).cloned().ok_or_else(|| {
                        ExecError::runtime(format!("object has no field '{}'", name))
                    }),
                    other => Err(ExecError::runtime(format!(
                        "{} has no member '{}'",
                        other.type_name(),
                        name
                    ))),
                }
            }
            Expr::Call {
                service,
                method,
                args,
            } => {
                let binding = scope
                    .get(service)
                    .ok_or_else(|| ExecError::runtime(format!("name '{}' is not defined", service)))?;
                let Binding::Service(instance) = binding else {
                    return Err(ExecError::runtime(format!("'{}' is not a service", service)));
                };
                let instance = instance.clone();
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope)?);
                }
                instance.call(method, &values).map_err(ExecError::service)
            }
            Expr::Unary { op, expr } => {
                let value = self.eval_expr(expr, scope)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(ExecError::runtime(format!(
                            "cannot negate {}",
                            other.type_name()
                        ))),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                self.eval_binary(*op, left, right)
            }
        }
    }

    fn eval_binary(&self, op: BinOp, left: Value, right: Value) -> Result<Value, ExecError> {
        use BinOp::*;
        match op {
            Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (a, b) => Err(self.type_error(op, &a, &b)),
            },
            Sub | Mul | Div | Mod => match (left, right) {
                (Value::Number(a), Value::Number(b)) => match op {
                    Sub => Ok(Value::Number(a - b)),
                    Mul => Ok(Value::Number(a * b)),
                    Div => {
                        if b == 0.0 {
                            Err(ExecError::runtime("division by zero"))
                        } else {
                            Ok(Value::Number(a / b))
                        }
                    }
                    Mod => {
                        if b == 0.0 {
                            Err(ExecError::runtime("division by zero"))
                        } else {
                            Ok(Value::Number(a % b))
                        }
                    }
                    _ => unreachable!(),
                },
                (a, b) => Err(self.type_error(op, &a, &b)),
            },
            Eq => Ok(Value::Bool(left == right)),
            Ne => Ok(Value::Bool(left != right)),
            Lt | Le | Gt | Ge => {
                let ordering = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
                    _ => None,
                };
                let Some(ordering) = ordering else {
                    return Err(self.type_error(op, &left, &right));
                };
                let result = match op {
                    Lt => ordering.is_lt(),
                    Le => ordering.is_le(),
                    Gt => ordering.is_gt(),
                    Ge => ordering.is_ge(),
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
        }
    }

    fn type_error(&self, op: BinOp, left: &Value, right: &Value) -> ExecError {
        ExecError::runtime(format!(
            "operator '{}' not defined for {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
