//! Array methods that don't need a callback. The higher-order methods
//! (`recorrer`, `filtrar`, `mapear`, `reducir`, `algunos`, `todos`, plus
//! `ordenar`'s optional-comparator form and `buscar`'s find-by-predicate
//! form) live in the interpreter instead, since invoking a user function
//! requires `Interpreter::call_value`, which this module has no handle to.

use super::common::{expect_string, number_to_i64, require_arity};
use crate::error::{HispanoError, Result};
use crate::value::Value;

pub fn call(receiver: &Value, name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    let Value::Array(items) = receiver else { return None };
    const NAMES: &[&str] =
        &["longitud", "primero", "ultimo", "agregar", "remover", "contiene", "invertir", "unir", "cortar", "insertar"];
    if !NAMES.contains(&name) {
        return None;
    }
    Some((|| -> Result<Value> {
        match name {
            "longitud" => {
                require_arity(args, 0, line)?;
                Ok(Value::Number(items.borrow().len() as f64))
            }
            "primero" => {
                require_arity(args, 0, line)?;
                items.borrow().first().cloned().ok_or(HispanoError::EmptyCollection { line })
            }
            "ultimo" => {
                require_arity(args, 0, line)?;
                items.borrow().last().cloned().ok_or(HispanoError::EmptyCollection { line })
            }
            "agregar" => {
                if args.is_empty() {
                    return Err(HispanoError::Arity { expected: 1, found: 0, line });
                }
                let mut b = items.borrow_mut();
                for a in args {
                    b.push(a.clone());
                }
                Ok(Value::Number(b.len() as f64))
            }
            "remover" => {
                require_arity(args, 0, line)?;
                items.borrow_mut().pop().ok_or(HispanoError::EmptyCollection { line })
            }
            "contiene" => {
                require_arity(args, 1, line)?;
                Ok(Value::Bool(items.borrow().iter().any(|v| v == &args[0])))
            }
            "invertir" => {
                require_arity(args, 0, line)?;
                let mut cloned: Vec<Value> = items.borrow().clone();
                cloned.reverse();
                Ok(Value::array(cloned))
            }
            "unir" => {
                let sep = match args.first() {
                    Some(v) => expect_string(v, line)?.as_str().to_string(),
                    None => ",".to_string(),
                };
                let parts: Vec<String> = items.borrow().iter().map(Value::stringify).collect();
                Ok(Value::string(parts.join(&sep)))
            }
            "cortar" => {
                let b = items.borrow();
                let len = b.len() as i64;
                let start = args.first().and_then(number_to_i64).unwrap_or(0).clamp(0, len);
                let end = args.get(1).and_then(number_to_i64).unwrap_or(len).clamp(start, len);
                Ok(Value::array(b[start as usize..end as usize].to_vec()))
            }
            "insertar" => {
                require_arity(args, 2, line)?;
                let index = number_to_i64(&args[0]).ok_or_else(|| HispanoError::TypeError {
                    message: "el índice debe ser un número".to_string(),
                    line,
                })?;
                let mut b = items.borrow_mut();
                if index < 0 || index as usize > b.len() {
                    return Err(HispanoError::BoundsError { index, length: b.len(), line });
                }
                b.insert(index as usize, args[1].clone());
                Ok(Value::Number(b.len() as f64))
            }
            _ => unreachable!(),
        }
    })())
}
