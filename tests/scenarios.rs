//! End-to-end scenarios exercising the crate's public API on whole programs
//! (the concrete examples from the language's testable-properties table).

use hispano_lang::{interpret, run};

#[test]
fn adds_and_multiplies_two_variables() {
    let output = run("variable a = 10; variable b = 5; mostrar a + b; mostrar a * b;");
    assert_eq!(output, vec!["15", "50"]);
}

#[test]
fn classic_for_loop_builds_a_string() {
    let output = run(
        "variable s = \"\"; para (variable i = 1; i <= 3; i = i + 1) { s = s + i; } mostrar s;",
    );
    assert_eq!(output, vec!["123"]);
}

#[test]
fn ordenar_returns_a_new_array_without_mutating_the_original() {
    let output = run("variable a = [3, 1, 2]; mostrar a.ordenar(); mostrar a;");
    assert_eq!(output, vec!["[1, 2, 3]", "[3, 1, 2]"]);
}

#[test]
fn recursive_fibonacci() {
    let output = run(
        "funcion f(n) { si (n <= 1) { retornar n; } retornar f(n - 1) + f(n - 2); } mostrar f(10);",
    );
    assert_eq!(output, vec!["55"]);
}

#[test]
fn class_method_doubles_a_constructor_argument() {
    let output = run(
        "clase A { constructor(x) { este.x = x; } doble() { retornar este.x * 2; } } mostrar nuevo A(7).doble();",
    );
    assert_eq!(output, vec!["14"]);
}

#[test]
fn division_by_zero_is_caught_and_recovers() {
    let outcome = interpret("intentar { mostrar 10 / 0; } capturar (e) { mostrar \"no se puede dividir\"; }");
    assert!(outcome.success);
    assert_eq!(outcome.outputs, vec!["no se puede dividir"]);
}

#[test]
fn switch_statement_runs_only_the_matching_case() {
    let output = run(
        "variable dia = 3; elegir (dia) { caso 1: mostrar \"lunes\"; romper; caso 2: mostrar \"martes\"; romper; caso 3: mostrar \"miercoles\"; romper; pordefecto: mostrar \"desconocido\"; }",
    );
    assert_eq!(output, vec!["miercoles"]);
}

#[test]
fn undefined_variable_surfaces_as_a_spanish_error_message() {
    let outcome = interpret("mostrar x;");
    assert!(!outcome.success);
    let message = outcome.error.unwrap();
    assert!(message.contains("'x'"));
    assert!(message.contains("no está definida"));
}

#[test]
fn array_of_objects_with_template_strings() {
    let output = run(
        "variable personas = [{nombre: \"Ana\", edad: 30}, {nombre: \"Luis\", edad: 25}]; para cada p en personas { mostrar `${p.nombre} tiene ${p.edad} años`; }",
    );
    assert_eq!(output, vec!["Ana tiene 30 años", "Luis tiene 25 años"]);
}
