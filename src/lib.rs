//! HispanoLang: a tree-walking interpreter for a Spanish-keyword scripting
//! language. `interpret` and `run` are the two stateless entry
//! points; [`Repl`] is the stateful wrapper that keeps one top-level
//! `Environment` alive across calls, for host programs that want REPL-style
//! variable persistence between lines.

mod ast;
mod builtins;
mod environment;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod token;
mod value;

use environment::Environment;
use error::HispanoError;
use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;
use token::Interner;

/// The result of one `interpret` call: either the ordered list of
/// lines `mostrar` produced, or the first error encountered, rendered in
/// Spanish.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretOutcome {
    pub success: bool,
    pub outputs: Vec<String>,
    pub error: Option<String>,
}

fn run_in(source: &str, env: Environment) -> (Vec<String>, Environment, Option<HispanoError>) {
    let mut interner = Interner::new();
    let tokens = match Lexer::new(source, &mut interner).tokenize() {
        Ok(tokens) => tokens,
        Err(err) => return (Vec::new(), env, Some(err)),
    };
    let program = match Parser::new(tokens, &mut interner).parse() {
        Ok(program) => program,
        Err(err) => return (Vec::new(), env, Some(err)),
    };
    let mut interpreter = Interpreter::with_environment(env);
    let result = interpreter.run(&program);
    let env = interpreter.environment().clone();
    match result {
        Ok(()) => (interpreter.output, env, None),
        Err(err) => (interpreter.output, env, Some(err)),
    }
}

/// Runs a complete program against a fresh top-level environment.
pub fn interpret(source: &str) -> InterpretOutcome {
    let (outputs, _env, error) = run_in(source, Environment::new());
    match error {
        Some(err) => InterpretOutcome { success: false, outputs, error: Some(err.render(source)) },
        None => InterpretOutcome { success: true, outputs, error: None },
    }
}

/// Runs a program and returns only its output lines, dropping any error —
/// equivalent to `interpret(source).outputs`.
pub fn run(source: &str) -> Vec<String> {
    interpret(source).outputs
}

/// A persistent top-level environment for host programs that want REPL-style
/// variable survival between successive snippets of source.
pub struct Repl {
    env: Environment,
}

impl Repl {
    pub fn new() -> Self {
        Repl { env: Environment::new() }
    }

    /// Runs `source` against this REPL's persistent environment. Top-level
    /// bindings made by `source` are visible to the next call even if this
    /// one errors out partway through.
    pub fn interpret(&mut self, source: &str) -> InterpretOutcome {
        let (outputs, env, error) = run_in(source, self.env.clone());
        self.env = env;
        match error {
            Some(err) => InterpretOutcome { success: false, outputs, error: Some(err.render(source)) },
            None => InterpretOutcome { success: true, outputs, error: None },
        }
    }

    /// The REPL's `variables`/`vars` command: every top-level
    /// name paired with its current value, rendered the way `mostrar` would.
    pub fn top_level_bindings(&self) -> Vec<(String, String)> {
        self.env.local_bindings().into_iter().map(|(name, value)| (name, value.stringify_spanish())).collect()
    }

    /// The REPL's `limpiar`/`clear` command: discards all top-level bindings.
    pub fn reset(&mut self) {
        self.env = Environment::new();
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_reports_success_and_outputs() {
        let outcome = interpret("mostrar 1 + 2;");
        assert!(outcome.success);
        assert_eq!(outcome.outputs, vec!["3"]);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn interpret_reports_the_first_error_in_spanish() {
        let outcome = interpret("mostrar noExiste;");
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("no está definida"));
    }

    #[test]
    fn run_returns_bare_output_lines() {
        assert_eq!(run("variable a = 10; variable b = 40; mostrar a + b;"), vec!["50"]);
    }

    #[test]
    fn repl_keeps_top_level_bindings_across_calls() {
        let mut repl = Repl::new();
        repl.interpret("variable contador = 1;");
        let outcome = repl.interpret("contador = contador + 1; mostrar contador;");
        assert_eq!(outcome.outputs, vec!["2"]);
    }

    #[test]
    fn repl_top_level_bindings_reports_current_values() {
        let mut repl = Repl::new();
        repl.interpret("variable nombre = \"Ana\"; constante PI = 3;");
        let bindings = repl.top_level_bindings();
        assert!(bindings.contains(&("nombre".to_string(), "Ana".to_string())));
        assert!(bindings.contains(&("PI".to_string(), "3".to_string())));
    }

    #[test]
    fn repl_reset_clears_bindings() {
        let mut repl = Repl::new();
        repl.interpret("variable a = 1;");
        repl.reset();
        let outcome = repl.interpret("mostrar a;");
        assert!(!outcome.success);
    }
}
