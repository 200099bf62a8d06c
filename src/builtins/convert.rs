//! Conversion free functions: `entero`, `decimal`, `texto`,
//! `booleano`, `tipo`.

use crate::error::{HispanoError, Result};
use crate::value::Value;

pub fn call(name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    const NAMES: &[&str] = &["entero", "decimal", "texto", "booleano", "tipo"];
    if !NAMES.contains(&name) {
        return None;
    }
    if args.len() != 1 {
        return Some(Err(HispanoError::Arity { expected: 1, found: args.len(), line }));
    }
    let value = &args[0];
    let result = match name {
        "entero" => Ok(Value::Number(to_number(value).trunc())),
        "decimal" => Ok(Value::Number(to_number(value))),
        "texto" => Ok(Value::string(value.stringify_spanish())),
        "booleano" => Ok(Value::Bool(value.is_truthy())),
        "tipo" => Ok(Value::string(tipo_of(value))),
        _ => unreachable!(),
    };
    Some(result)
}

/// `tipo()`'s answer for an instance is its class name, not the generic
/// `type_tag()` label every other instance of the same class would share.
fn tipo_of(value: &Value) -> String {
    match value {
        Value::Instance(instance) => instance.borrow().class.name.clone(),
        other => other.type_tag().to_string(),
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
