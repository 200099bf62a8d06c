//! Runtime values.
//!
//! A small closed-set enum owning its data outright would be enough for a
//! language with no first-class functions or object identity, but
//! HispanoLang has both, so arrays, objects, and instances here are
//! `Rc<RefCell<_>>` handles: assigning an array to a second variable must
//! alias it, not copy it, and a method closing over `this` must see field
//! mutations made through any other reference to the same instance.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Block, Param};
use crate::environment::Environment;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
    BoundMethod(Rc<BoundMethod>),
    /// A handle to one of the built-in free functions (`raiz`, `texto`, ...)
    /// so it can be passed around as a value, e.g. into `mapear`.
    NativeFunction(Rc<NativeFunction>),
}

pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Block,
    pub closure: Environment,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub constructor: Option<(Vec<Param>, Block)>,
    pub methods: IndexMap<String, Rc<Function>>,
    pub closure: Environment,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class").field("name", &self.name).finish()
    }
}

impl Class {
    /// Looks up a method on this class, falling back to the superclass
    /// chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass.as_ref().and_then(|parent| parent.find_method(name))
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Rc<Function>,
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Option<usize>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(fields: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    /// `nulo`, `indefinido`, `falso`, and `0` are falsy; everything else —
    /// including an empty string, an empty array, and an empty object — is
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            _ => true,
        }
    }

    /// The `tipo()` built-in's answer.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Null => "nulo",
            Value::Undefined => "indefinido",
            Value::Bool(_) => "booleano",
            Value::Number(_) => "numero",
            Value::String(_) => "texto",
            Value::Array(_) => "arreglo",
            Value::Object(_) => "objeto",
            Value::Function(_) | Value::NativeFunction(_) | Value::BoundMethod(_) => "funcion",
            Value::Class(_) => "clase",
            Value::Instance(_) => "instancia",
        }
    }

    fn number_to_string(n: f64) -> String {
        if n.fract() == 0.0 && n.is_finite() {
            format!("{}", n as i64)
        } else {
            n.to_string()
        }
    }

    /// Used for string concatenation (`+`) and template interpolation:
    /// plain English `true`/`false`/`null` tokens, distinct from the
    /// Spanish rendering `mostrar` uses below.
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Undefined => "undefined".to_string(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => Self::number_to_string(*n),
            Value::String(s) => s.as_str().to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::stringify).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(fields) => {
                let parts: Vec<String> = fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.stringify()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Function(f) => format!("<funcion {}>", f.name.as_deref().unwrap_or("anonima")),
            Value::NativeFunction(f) => format!("<funcion nativa {}>", f.name),
            Value::Class(c) => format!("<clase {}>", c.name),
            Value::Instance(i) => format!("<instancia de {}>", i.borrow().class.name),
            Value::BoundMethod(m) => {
                format!("<metodo {}>", m.method.name.as_deref().unwrap_or("anonimo"))
            }
        }
    }

    /// `mostrar`'s rendering: the same shapes as [`Self::stringify`]
    /// but with Spanish tokens for booleans and the null/undefined values.
    /// Kept distinct from `stringify` on purpose rather than unified.
    pub fn stringify_spanish(&self) -> String {
        match self {
            Value::Null => "nulo".to_string(),
            Value::Undefined => "indefinido".to_string(),
            Value::Bool(b) => if *b { "verdadero" } else { "falso" }.to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::stringify_spanish).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(fields) => {
                let parts: Vec<String> = fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.stringify_spanish()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            _ => self.stringify(),
        }
    }
}

impl PartialEq for Value {
    /// Strict, tag-based equality: no numeric/string coercion,
    /// and arrays/objects/instances compare by reference identity rather
    /// than structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_falsy() {
        assert!(!Value::Number(0.0).is_truthy());
    }

    #[test]
    fn empty_string_is_truthy() {
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn empty_array_is_truthy() {
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn stringify_uses_english_booleans() {
        assert_eq!(Value::Bool(true).stringify(), "true");
    }

    #[test]
    fn stringify_spanish_uses_spanish_booleans() {
        assert_eq!(Value::Bool(true).stringify_spanish(), "verdadero");
        assert_eq!(Value::Null.stringify_spanish(), "nulo");
    }

    #[test]
    fn integral_numbers_print_without_decimal_point() {
        assert_eq!(Value::Number(10.0).stringify(), "10");
        assert_eq!(Value::Number(2.5).stringify(), "2.5");
    }

    #[test]
    fn arrays_compare_by_identity_not_contents() {
        let a = Value::array(vec![Value::Number(1.0)]);
        let b = Value::array(vec![Value::Number(1.0)]);
        assert_ne!(a, b);
        let c = a.clone();
        assert_eq!(a, c);
    }

    #[test]
    fn strings_compare_structurally() {
        assert_eq!(Value::string("hola"), Value::string("hola"));
    }

    #[test]
    fn type_tag_reports_spanish_names() {
        assert_eq!(Value::Number(1.0).type_tag(), "numero");
        assert_eq!(Value::array(vec![]).type_tag(), "arreglo");
        assert_eq!(Value::Null.type_tag(), "nulo");
    }
}
