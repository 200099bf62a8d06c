//! Free-standing math functions.

use rand::Rng;

use super::common::expect_number;
use crate::error::{HispanoError, Result};
use crate::value::Value;

pub fn call(name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    const NAMES: &[&str] = &[
        "raiz", "potencia", "seno", "coseno", "tangente", "logaritmo", "valorAbsoluto",
        "redondear", "techo", "piso", "aleatorio", "maximo", "minimo", "suma", "promedio",
    ];
    if !NAMES.contains(&name) {
        return None;
    }
    Some((|| -> Result<Value> {
        match name {
            "raiz" => {
                if args.len() != 1 {
                    return Err(HispanoError::Arity { expected: 1, found: args.len(), line });
                }
                let n = expect_number(&args[0], line)?;
                if n < 0.0 {
                    return Err(HispanoError::TypeError {
                        message: "raiz() no acepta números negativos".to_string(),
                        line,
                    });
                }
                Ok(Value::Number(n.sqrt()))
            }
            "seno" => unary(args, line, f64::sin),
            "coseno" => unary(args, line, f64::cos),
            "tangente" => unary(args, line, f64::tan),
            "logaritmo" => {
                if args.len() != 1 {
                    return Err(HispanoError::Arity { expected: 1, found: args.len(), line });
                }
                let n = expect_number(&args[0], line)?;
                if n <= 0.0 {
                    return Err(HispanoError::TypeError {
                        message: "logaritmo() solo acepta números positivos".to_string(),
                        line,
                    });
                }
                Ok(Value::Number(n.ln()))
            }
            "valorAbsoluto" => unary(args, line, f64::abs),
            "redondear" => unary(args, line, f64::round),
            "techo" => unary(args, line, f64::ceil),
            "piso" => unary(args, line, f64::floor),
            "potencia" => {
                if args.len() != 2 {
                    return Err(HispanoError::Arity { expected: 2, found: args.len(), line });
                }
                let base = expect_number(&args[0], line)?;
                let exponent = expect_number(&args[1], line)?;
                Ok(Value::Number(base.powf(exponent)))
            }
            "aleatorio" => {
                if !args.is_empty() {
                    return Err(HispanoError::Arity { expected: 0, found: args.len(), line });
                }
                Ok(Value::Number(rand::thread_rng().gen::<f64>()))
            }
            "maximo" => fold(args, line, f64::NEG_INFINITY, f64::max),
            "minimo" => fold(args, line, f64::INFINITY, f64::min),
            "suma" => {
                let nums = numbers_from(args, line)?;
                Ok(Value::Number(nums.iter().sum()))
            }
            "promedio" => {
                let nums = numbers_from(args, line)?;
                if nums.is_empty() {
                    return Err(HispanoError::EmptyCollection { line });
                }
                let total: f64 = nums.iter().sum();
                Ok(Value::Number(total / nums.len() as f64))
            }
            _ => unreachable!(),
        }
    })())
}

fn unary(args: &[Value], line: usize, f: impl Fn(f64) -> f64) -> Result<Value> {
    if args.len() != 1 {
        return Err(HispanoError::Arity { expected: 1, found: args.len(), line });
    }
    Ok(Value::Number(f(expect_number(&args[0], line)?)))
}

/// `maximo`/`minimo`/`suma`/`promedio` accept either a single array argument
/// or a variadic list of numbers, mirroring how `mostrar` accepts one value
/// but callers usually reach for an array when the count is dynamic.
fn numbers_from(args: &[Value], line: usize) -> Result<Vec<f64>> {
    if args.len() == 1 {
        if let Value::Array(items) = &args[0] {
            return items.borrow().iter().map(|v| expect_number(v, line)).collect();
        }
    }
    args.iter().map(|v| expect_number(v, line)).collect()
}

fn fold(args: &[Value], line: usize, seed: f64, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    let nums = numbers_from(args, line)?;
    if nums.is_empty() {
        return Err(HispanoError::EmptyCollection { line });
    }
    Ok(Value::Number(nums.into_iter().fold(seed, f)))
}
