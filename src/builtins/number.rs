//! Number methods.

use super::common::require_arity;
use crate::error::Result;
use crate::value::Value;

pub fn call(receiver: &Value, name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    let Value::Number(n) = receiver else { return None };
    const NAMES: &[&str] = &["esPar", "esImpar", "esPositivo", "esNegativo", "aTexto"];
    if !NAMES.contains(&name) {
        return None;
    }
    Some((|| -> Result<Value> {
        match name {
            "esPar" => {
                require_arity(args, 0, line)?;
                Ok(Value::Bool(n.rem_euclid(2.0) == 0.0))
            }
            "esImpar" => {
                require_arity(args, 0, line)?;
                Ok(Value::Bool(n.rem_euclid(2.0) != 0.0))
            }
            "esPositivo" => {
                require_arity(args, 0, line)?;
                Ok(Value::Bool(*n > 0.0))
            }
            "esNegativo" => {
                require_arity(args, 0, line)?;
                Ok(Value::Bool(*n < 0.0))
            }
            "aTexto" => {
                require_arity(args, 0, line)?;
                Ok(Value::string(receiver.stringify()))
            }
            _ => unreachable!(),
        }
    })())
}
