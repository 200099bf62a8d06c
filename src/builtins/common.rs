//! Small helpers shared by the per-type method tables.

use crate::error::{HispanoError, Result};
use crate::value::Value;

pub fn require_arity(args: &[Value], expected: usize, line: usize) -> Result<()> {
    if args.len() != expected {
        return Err(HispanoError::Arity { expected, found: args.len(), line });
    }
    Ok(())
}

pub fn number_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => Some(*n as i64),
        _ => None,
    }
}

pub fn expect_string(value: &Value, line: usize) -> Result<std::rc::Rc<String>> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(HispanoError::TypeError {
            message: format!("se esperaba una cadena de texto, se recibió {}", other.type_tag()),
            line,
        }),
    }
}

pub fn expect_number(value: &Value, line: usize) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(HispanoError::TypeError {
            message: format!("se esperaba un número, se recibió {}", other.type_tag()),
            line,
        }),
    }
}

pub fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.stringify().cmp(&b.stringify()),
    }
}
