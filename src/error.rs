//! Error taxonomy and Spanish-language rendering.
//!
//! Every fallible operation in the lexer, parser, and evaluator returns
//! `Result<T, HispanoError>`. The public `interpret` boundary collapses the
//! first error encountered into a single rendered string; `intentar ...
//! capturar` bindings see only that rendered string too, never
//! the structured variant.

use crate::token::{Span, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HispanoError {
    #[error("carácter inesperado '{found}'")]
    UnexpectedCharacter { found: char, span: Span },

    #[error("cadena de texto sin cerrar")]
    UnterminatedString { span: Span },

    #[error("plantilla de texto sin cerrar")]
    UnterminatedTemplate { span: Span },

    #[error("se esperaba {expected} pero se encontró {found}")]
    UnexpectedToken { expected: String, found: String, span: Span },

    #[error("objetivo de asignación inválido")]
    InvalidAssignmentTarget { span: Span },

    #[error("variable '{name}' no está definida")]
    UndefinedVariable { name: String, line: usize },

    #[error("no se puede reasignar la constante '{name}'")]
    ConstantReassignment { name: String, line: usize },

    #[error("se esperaban {expected} argumentos pero se recibieron {found}")]
    Arity { expected: usize, found: usize, line: usize },

    #[error("{message}")]
    TypeError { message: String, line: usize },

    #[error("división entre cero")]
    DivisionByZero { line: usize },

    #[error("módulo entre cero")]
    ModuloByZero { line: usize },

    #[error("índice {index} fuera de los límites (longitud {length})")]
    BoundsError { index: i64, length: usize, line: usize },

    #[error("la colección está vacía")]
    EmptyCollection { line: usize },

    #[error("'{class}' no tiene un método llamado '{method}'")]
    UnknownMethod { class: String, method: String, line: usize },

    #[error("'este' solo puede usarse dentro de un método de clase")]
    InvalidThis { line: usize },

    #[error("'retornar' fuera de una función")]
    ReturnOutsideFunction { line: usize },
}

impl HispanoError {
    pub fn line(&self) -> Option<usize> {
        use HispanoError::*;
        match self {
            UnexpectedCharacter { span, .. }
            | UnterminatedString { span }
            | UnterminatedTemplate { span }
            | UnexpectedToken { span, .. }
            | InvalidAssignmentTarget { span } => Some(span.line),
            UndefinedVariable { line, .. }
            | ConstantReassignment { line, .. }
            | Arity { line, .. }
            | TypeError { line, .. }
            | DivisionByZero { line }
            | ModuloByZero { line }
            | BoundsError { line, .. }
            | EmptyCollection { line }
            | UnknownMethod { line, .. }
            | InvalidThis { line }
            | ReturnOutsideFunction { line } => Some(*line),
        }
    }

    /// The message alone, in Spanish — what `intentar ... capturar (e)`
    /// binds `e` to, and what `interpret`'s `error` field carries.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Multi-line rendering with source-line context, used by callers that
    /// want to show a human where the error happened, minus any terminal
    /// colour — colourizing output is a host program's job, not the core's.
    pub fn render(&self, source: &str) -> String {
        let Some(line_no) = self.line() else {
            return self.message();
        };
        let line_content = source.lines().nth(line_no.saturating_sub(1)).unwrap_or("");
        let mut out = format!("error: {}\n\n{:>4} | {}", self.message(), line_no, line_content);
        if let Some(hint) = self.suggestion() {
            out.push_str(&format!("\n     | ayuda: ¿quisiste decir '{hint}'?"));
        }
        out
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            HispanoError::UndefinedVariable { name, .. } => find_similar(name, KNOWN_IDENTIFIERS, 2).map(str::to_string),
            HispanoError::UnknownMethod { method, .. } => find_similar(method, KNOWN_METHOD_NAMES, 2).map(str::to_string),
            _ => None,
        }
    }
}

/// Keywords and built-in function names, consulted when a variable lookup
/// fails — catches typos like `mstrar` meaning `mostrar`.
const KNOWN_IDENTIFIERS: &[&str] = &[
    "variable", "constante", "mostrar", "leer", "si", "sino", "mientras", "para", "cada", "en",
    "hacer", "elegir", "caso", "pordefecto", "funcion", "retornar", "romper", "continuar",
    "intentar", "capturar", "clase", "constructor", "este", "nuevo", "extiende", "super",
    "verdadero", "falso", "nulo", "indefinido",
    "raiz", "potencia", "seno", "coseno", "tangente", "logaritmo", "valorAbsoluto", "redondear",
    "techo", "piso", "aleatorio", "maximo", "minimo", "suma", "promedio",
    "entero", "decimal", "texto", "booleano", "tipo",
];

/// All array/string/number method names across the fixed method tables,
/// consulted when a method call resolves to nothing.
const KNOWN_METHOD_NAMES: &[&str] = &[
    "longitud", "primero", "ultimo", "agregar", "remover", "contiene", "recorrer", "filtrar",
    "mapear", "reducir", "ordenar", "invertir", "buscar", "algunos", "todos", "unir", "cortar",
    "insertar", "mayusculas", "minusculas", "dividir", "reemplazar", "recortar", "incluye",
    "empiezaCon", "terminaCon", "caracter", "subcadena", "esPar", "esImpar", "esPositivo",
    "esNegativo", "aTexto",
];

/// Levenshtein edit distance between two strings, compared by char rather
/// than by byte so accented Spanish letters count as one edit, not several.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// The closest candidate to `word` within `max_distance` edits, or `None`
/// if nothing is close enough to be worth suggesting.
fn find_similar<'a>(word: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let word_lower = word.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for &candidate in candidates {
        let dist = levenshtein(&word_lower, &candidate.to_lowercase());
        if dist <= max_distance {
            match best {
                None => best = Some((candidate, dist)),
                Some((_, d)) if dist < d => best = Some((candidate, dist)),
                _ => {}
            }
        }
    }

    best.map(|(s, _)| s)
}

pub fn kind_name(kind: TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        Eof => "fin de archivo",
        Identifier => "un identificador",
        Number => "un número",
        String | TemplateString => "una cadena de texto",
        LeftBrace => "'{'",
        RightBrace => "'}'",
        LeftParen => "'('",
        RightParen => "')'",
        LeftBracket => "'['",
        RightBracket => "']'",
        Colon => "':'",
        Semicolon => "';'",
        Comma => "','",
        _ => "un token",
    }
}

pub type Result<T> = std::result::Result<T, HispanoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_renders_spanish_message() {
        let err = HispanoError::DivisionByZero { line: 3 };
        assert_eq!(err.message(), "división entre cero");
    }

    #[test]
    fn render_includes_line_number_and_content() {
        let err = HispanoError::UndefinedVariable { name: "x".into(), line: 2 };
        let source = "variable a = 1\nmostrar x";
        let rendered = err.render(source);
        assert!(rendered.contains("mostrar x"));
        assert!(rendered.contains('2'));
    }

    #[test]
    fn constant_reassignment_names_the_constant() {
        let err = HispanoError::ConstantReassignment { name: "PI".into(), line: 1 };
        assert!(err.message().contains("PI"));
    }

    #[test]
    fn undefined_variable_renders_a_suggestion_for_a_close_typo() {
        let err = HispanoError::UndefinedVariable { name: "mstrar".into(), line: 1 };
        let rendered = err.render("mstrar(1);");
        assert!(rendered.contains("mostrar"));
    }

    #[test]
    fn levenshtein_identical() {
        assert_eq!(levenshtein("mostrar", "mostrar"), 0);
    }

    #[test]
    fn levenshtein_one_char_diff() {
        assert_eq!(levenshtein("mostrar", "mnstrar"), 1);
    }

    #[test]
    fn find_similar_typo() {
        assert_eq!(find_similar("mstrar", KNOWN_IDENTIFIERS, 2), Some("mostrar"));
    }

    #[test]
    fn find_similar_no_match_beyond_distance() {
        assert_eq!(find_similar("zzzzzzzzzz", KNOWN_IDENTIFIERS, 2), None);
    }

    #[test]
    fn find_similar_method_typo() {
        assert_eq!(find_similar("longitu", KNOWN_METHOD_NAMES, 2), Some("longitud"));
    }
}
