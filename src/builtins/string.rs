//! String methods. All operate on chars, not bytes, so accented
//! text indexes correctly.

use super::common::{expect_string, number_to_i64, require_arity};
use crate::error::{HispanoError, Result};
use crate::value::Value;

pub fn call(receiver: &Value, name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    let Value::String(s) = receiver else { return None };
    const NAMES: &[&str] = &[
        "longitud", "mayusculas", "minusculas", "dividir", "reemplazar", "recortar", "incluye",
        "contiene", "empiezaCon", "terminaCon", "caracter", "subcadena", "invertir",
    ];
    if !NAMES.contains(&name) {
        return None;
    }
    Some((|| -> Result<Value> {
        match name {
            "longitud" => {
                require_arity(args, 0, line)?;
                Ok(Value::Number(s.chars().count() as f64))
            }
            "mayusculas" => {
                require_arity(args, 0, line)?;
                Ok(Value::string(s.to_uppercase()))
            }
            "minusculas" => {
                require_arity(args, 0, line)?;
                Ok(Value::string(s.to_lowercase()))
            }
            "dividir" => {
                require_arity(args, 1, line)?;
                let sep = expect_string(&args[0], line)?;
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::string).collect()
                };
                Ok(Value::array(parts))
            }
            "reemplazar" => {
                require_arity(args, 2, line)?;
                let from = expect_string(&args[0], line)?;
                let to = expect_string(&args[1], line)?;
                Ok(Value::string(s.replace(from.as_str(), &to)))
            }
            "recortar" => {
                require_arity(args, 0, line)?;
                Ok(Value::string(s.trim().to_string()))
            }
            "incluye" | "contiene" => {
                require_arity(args, 1, line)?;
                let needle = expect_string(&args[0], line)?;
                Ok(Value::Bool(s.contains(needle.as_str())))
            }
            "empiezaCon" => {
                require_arity(args, 1, line)?;
                let needle = expect_string(&args[0], line)?;
                Ok(Value::Bool(s.starts_with(needle.as_str())))
            }
            "terminaCon" => {
                require_arity(args, 1, line)?;
                let needle = expect_string(&args[0], line)?;
                Ok(Value::Bool(s.ends_with(needle.as_str())))
            }
            "caracter" => {
                require_arity(args, 1, line)?;
                let index = number_to_i64(&args[0]).ok_or_else(|| HispanoError::TypeError {
                    message: "el índice debe ser un número".to_string(),
                    line,
                })?;
                let chars: Vec<char> = s.chars().collect();
                if index < 0 || index as usize >= chars.len() {
                    return Err(HispanoError::BoundsError { index, length: chars.len(), line });
                }
                Ok(Value::string(chars[index as usize].to_string()))
            }
            "subcadena" => {
                let chars: Vec<char> = s.chars().collect();
                let len = chars.len() as i64;
                let start = args.first().and_then(number_to_i64).unwrap_or(0).clamp(0, len);
                let end = args.get(1).and_then(number_to_i64).unwrap_or(len).clamp(start, len);
                Ok(Value::string(chars[start as usize..end as usize].iter().collect::<String>()))
            }
            "invertir" => {
                require_arity(args, 0, line)?;
                Ok(Value::string(s.chars().rev().collect::<String>()))
            }
            _ => unreachable!(),
        }
    })())
}
