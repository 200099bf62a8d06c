//! Black-box tests for the invariants the language promises regardless of
//! program shape: scoping, constancy, short-circuiting, equality, and the
//! control-flow edge cases around switch/do-while/for-each.

use hispano_lang::{interpret, run};

#[test]
fn interpreting_the_same_source_twice_is_deterministic() {
    let source = "variable total = 0; para cada n en [1, 2, 3, 4] { total = total + n; } mostrar total;";
    assert_eq!(run(source), run(source));
}

#[test]
fn inner_block_scope_does_not_leak_outward() {
    let outcome = interpret("si (verdadero) { variable interno = 1; } mostrar interno;");
    assert!(!outcome.success);
}

#[test]
fn reassignment_reaches_the_nearest_enclosing_definition() {
    let output = run("variable x = 1; si (verdadero) { x = 2; } mostrar x;");
    assert_eq!(output, vec!["2"]);
}

#[test]
fn constant_rvalue_yields_its_value_and_rejects_reassignment() {
    let output = run("constante PI = 3; mostrar PI;");
    assert_eq!(output, vec!["3"]);

    let outcome = interpret("constante PI = 3; PI = 4;");
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("constante"));
}

#[test]
fn logical_and_short_circuits_without_evaluating_the_right_side() {
    let output = run(
        "funcion falsoConEfecto() { mostrar \"izquierda\"; retornar falso; } funcion derecha() { mostrar \"derecha\"; retornar verdadero; } falsoConEfecto() y derecha();",
    );
    assert_eq!(output, vec!["izquierda"]);
}

#[test]
fn logical_or_short_circuits_when_the_left_side_is_truthy() {
    let output = run(
        "funcion verdaderoConEfecto() { mostrar \"izquierda\"; retornar verdadero; } funcion derecha() { mostrar \"derecha\"; retornar falso; } verdaderoConEfecto() o derecha();",
    );
    assert_eq!(output, vec!["izquierda"]);
}

#[test]
fn equality_is_reflexive_and_symmetric() {
    let output = run(
        "variable a = 5; variable b = 5; mostrar a == b; mostrar b == a; mostrar a == a; mostrar !(a != b);",
    );
    assert_eq!(output, vec!["true", "true", "true", "true"]);
}

#[test]
fn switch_with_no_matching_case_and_no_default_runs_nothing() {
    let output = run("elegir (99) { caso 1: mostrar \"uno\"; romper; }");
    assert!(output.is_empty());
}

#[test]
fn do_while_body_runs_exactly_once_when_the_condition_is_false() {
    let output = run("variable contador = 0; hacer { contador = contador + 1; } mientras (falso); mostrar contador;");
    assert_eq!(output, vec!["1"]);
}

#[test]
fn for_each_iterator_name_does_not_escape_the_loop_body() {
    let outcome = interpret("para cada elemento en [1, 2, 3] { } mostrar elemento;");
    assert!(!outcome.success);
}

#[test]
fn template_string_has_one_more_segment_than_interpolation() {
    let output = run("variable a = 1; variable b = 2; mostrar `${a} + ${b} = ${a + b}`;");
    assert_eq!(output, vec!["1 + 2 = 3"]);
}

#[test]
fn tipo_reports_the_spanish_type_name_for_every_kind_of_value() {
    let output = run(
        "mostrar tipo([1, 2]); mostrar tipo(5); mostrar tipo(\"hola\"); mostrar tipo(verdadero); mostrar tipo(nulo);",
    );
    assert_eq!(output, vec!["arreglo", "numero", "texto", "booleano", "nulo"]);
}

#[test]
fn break_and_continue_are_not_intercepted_by_try_catch() {
    let output = run(
        "variable total = 0; mientras (verdadero) { intentar { total = total + 1; si (total == 3) { romper; } } capturar (e) { mostrar \"no debería pasar\"; } } mostrar total;",
    );
    assert_eq!(output, vec!["3"]);
}

#[test]
fn a_stray_return_at_top_level_is_an_error() {
    let outcome = interpret("retornar 5;");
    assert!(!outcome.success);
}
