//! The fixed built-in surface: free functions that always
//! resolve ahead of a same-named variable, and methods on arrays, strings,
//! and numbers.
//!
//! The higher-order array methods (`recorrer`, `filtrar`, `mapear`,
//! `reducir`, `algunos`, `todos`, plus `ordenar`'s optional-comparator form
//! and `buscar`'s find-by-predicate form) are not implemented here — they
//! need to call back into a user function, which only
//! `Interpreter::call_value` knows how to do, so the interpreter
//! special-cases them before ever reaching [`call_method`].

mod array;
mod common;
mod convert;
mod math;
mod number;
mod string;

use crate::error::{HispanoError, Result};
use crate::value::{NativeFunction, Value};

/// Exposed so the interpreter's `ordenar` fallback (no comparator given) can
/// reuse the same default ordering the non-callback sort path uses.
pub(crate) use common::compare_values;

const FREE_FUNCTIONS: &[&str] = &[
    "raiz", "potencia", "seno", "coseno", "tangente", "logaritmo", "valorAbsoluto", "redondear",
    "techo", "piso", "aleatorio", "maximo", "minimo", "suma", "promedio", "entero", "decimal",
    "texto", "booleano", "tipo",
];

/// Array-only method names, including the higher-order ones the interpreter
/// handles directly, so a call like `"hola".mapear(f)` still gets the
/// cross-type error below instead of a generic "unknown method".
const ARRAY_METHODS: &[&str] = &[
    "longitud", "primero", "ultimo", "agregar", "remover", "contiene", "recorrer", "filtrar",
    "mapear", "reducir", "ordenar", "invertir", "buscar", "algunos", "todos", "unir", "cortar",
    "insertar",
];

const STRING_METHODS: &[&str] = &[
    "longitud", "mayusculas", "minusculas", "dividir", "reemplazar", "recortar", "incluye",
    "contiene", "empiezaCon", "terminaCon", "caracter", "subcadena", "invertir",
];

const NUMBER_METHODS: &[&str] = &["esPar", "esImpar", "esPositivo", "esNegativo", "aTexto"];

pub fn lookup_free_function(name: &str) -> Option<NativeFunction> {
    FREE_FUNCTIONS.iter().find(|&&n| n == name).map(|&n| NativeFunction { name: n, arity: None })
}

pub fn call_free_function(name: &str, args: &[Value], line: usize) -> Result<Value> {
    if let Some(result) = math::call(name, args, line) {
        return result;
    }
    if let Some(result) = convert::call(name, args, line) {
        return result;
    }
    Err(HispanoError::UnknownMethod { class: "global".to_string(), method: name.to_string(), line })
}

/// Dispatches a method call on a runtime value to its fixed table, or
/// returns `None` so the caller can raise `UnknownMethod` itself.
pub fn call_method(receiver: &Value, name: &str, args: &[Value], line: usize) -> Option<Result<Value>> {
    let own = match receiver {
        Value::Array(_) => array::call(receiver, name, args, line),
        Value::String(_) => string::call(receiver, name, args, line),
        Value::Number(_) => number::call(receiver, name, args, line),
        _ => None,
    };
    own.or_else(|| cross_type_error(receiver, name, line))
}

fn cross_type_error(receiver: &Value, name: &str, line: usize) -> Option<Result<Value>> {
    if ARRAY_METHODS.contains(&name) && !matches!(receiver, Value::Array(_)) {
        return Some(Err(HispanoError::TypeError {
            message: format!("el método {name}() solo se puede llamar en arreglos"),
            line,
        }));
    }
    if STRING_METHODS.contains(&name) && !matches!(receiver, Value::String(_)) {
        return Some(Err(HispanoError::TypeError {
            message: format!("el método {name}() solo se puede llamar en cadenas de texto"),
            line,
        }));
    }
    if NUMBER_METHODS.contains(&name) && !matches!(receiver, Value::Number(_)) {
        return Some(Err(HispanoError::TypeError {
            message: format!("el método {name}() solo se puede llamar en números"),
            line,
        }));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_free_function_recognizes_math_functions() {
        assert!(lookup_free_function("raiz").is_some());
        assert!(lookup_free_function("no_existe").is_none());
    }

    #[test]
    fn raiz_computes_square_root() {
        let result = call_free_function("raiz", &[Value::Number(9.0)], 1).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn tipo_reports_the_spanish_type_name() {
        let result = call_free_function("tipo", &[Value::array(vec![])], 1).unwrap();
        assert_eq!(result, Value::string("arreglo"));
    }

    #[test]
    fn array_longitud_reports_length() {
        let arr = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let result = call_method(&arr, "longitud", &[], 1).unwrap().unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[test]
    fn invertir_does_not_mutate_the_original_array() {
        let arr = Value::array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let reversed = call_method(&arr, "invertir", &[], 1).unwrap().unwrap();
        assert_ne!(arr, reversed);
        if let Value::Array(items) = &arr {
            assert_eq!(items.borrow()[0], Value::Number(1.0));
        }
    }

    #[test]
    fn ordenar_and_buscar_are_handled_by_the_interpreter_not_this_module() {
        let arr = Value::array(vec![Value::Number(3.0), Value::Number(1.0)]);
        assert!(call_method(&arr, "ordenar", &[], 1).is_none());
        assert!(call_method(&arr, "buscar", &[Value::Number(1.0)], 1).is_none());
    }

    #[test]
    fn array_only_method_on_a_string_is_a_type_error() {
        let err = call_method(&Value::string("hola"), "agregar", &[Value::Number(1.0)], 1)
            .unwrap()
            .unwrap_err();
        assert!(err.message().contains("arreglos"));
    }

    #[test]
    fn string_mayusculas_uppercases() {
        let result = call_method(&Value::string("hola"), "mayusculas", &[], 1).unwrap().unwrap();
        assert_eq!(result, Value::string("HOLA"));
    }

    #[test]
    fn number_es_par_detects_even_numbers() {
        let result = call_method(&Value::Number(4.0), "esPar", &[], 1).unwrap().unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[test]
    fn unknown_name_on_a_non_builtin_type_returns_none() {
        assert!(call_method(&Value::Null, "longitud", &[], 1).is_none());
    }
}
