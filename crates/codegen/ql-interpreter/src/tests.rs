use crate::{EvaluationResult, Value, VariableStore, evaluate};
use ql_binder::{BindOptions, bind_program};
use ql_const_eval::DIVIDE_BY_ZERO;
use ql_diagnostics::DiagnosticKind;
use ql_lower::{LowerOptions, LoweredProgram, lower};
use ql_syntax::{SyntaxFactory, SyntaxNode, SyntaxTree};

fn compile(tree: SyntaxTree, options: LowerOptions) -> LoweredProgram {
    let bound = bind_program(&[tree], &BindOptions::default()).expect("bound");
    assert!(bound.is_valid(), "{:?}", bound.diagnostics);
    lower(&bound, options).expect("lowered")
}

fn run(tree: SyntaxTree) -> (EvaluationResult, VariableStore) {
    let program = compile(tree, LowerOptions::default());
    let mut store = VariableStore::new();
    let result = evaluate(&program, &mut store).expect("evaluated");
    (result, store)
}

fn print(factory: &SyntaxFactory, value: SyntaxNode) -> SyntaxNode {
    factory.expression_statement(factory.call("print", vec![value]))
}

fn runtime_message(result: &EvaluationResult) -> Option<String> {
    match result.diagnostics.as_slice() {
        [diagnostic] => match &diagnostic.kind {
            DiagnosticKind::Runtime { message } => Some(message.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[test]
fn test_for_loop_leaves_result_in_caller_store() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("result", factory.int(0)),
        factory.for_statement(
            Some(factory.variable("i", factory.int(1))),
            Some(factory.binary(factory.name("i"), "<=", factory.int(10))),
            Some(factory.assignment(
                factory.name("i"),
                factory.binary(factory.name("i"), "+", factory.int(1)),
            )),
            factory.block(vec![factory.expression_statement(factory.assignment(
                factory.name("result"),
                factory.binary(factory.name("result"), "+", factory.name("i")),
            ))]),
        ),
    ]);

    let (result, store) = run(tree);
    assert!(result.is_success());
    assert_eq!(store.value_of("result"), Some(&Value::Int(55)));
}

#[test]
fn test_assignment_inside_expression_yields_last_value() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("a", factory.int(0)),
        factory.variable(
            "result",
            factory.binary(
                factory.parenthesized(factory.assignment(factory.name("a"), factory.int(10))),
                "*",
                factory.name("a"),
            ),
        ),
    ]);

    let (result, _) = run(tree);
    assert_eq!(result.value, Some(Value::Int(100)));
}

#[test]
fn test_recursive_calls_get_fresh_frames() {
    let factory = SyntaxFactory::new();
    let fact = factory.method(
        "fact",
        vec![("n", factory.type_name("int"))],
        Some(factory.type_name("int")),
        factory.block(vec![
            factory.if_statement(
                factory.binary(factory.name("n"), "<=", factory.int(1)),
                factory.return_statement(Some(factory.int(1))),
                None,
            ),
            factory.return_statement(Some(factory.binary(
                factory.name("n"),
                "*",
                factory.call("fact", vec![factory.binary(factory.name("n"), "-", factory.int(1))]),
            ))),
        ]),
    );
    let tree = factory.tree(vec![fact, print(&factory, factory.call("fact", vec![factory.int(5)]))]);

    let (result, _) = run(tree);
    assert_eq!(result.output, vec!["120".to_string()]);
}

#[test]
fn test_arrays_hold_elements_and_length() {
    let factory = SyntaxFactory::new();
    let array_of_int = factory.generic_type("Array", vec![factory.type_name("int")]);
    let tree = factory.tree(vec![
        factory.variable("values", factory.array_creation(array_of_int, factory.int(3))),
        factory.expression_statement(factory.assignment(
            factory.element_access(factory.name("values"), factory.int(0)),
            factory.int(10),
        )),
        print(&factory, factory.element_access(factory.name("values"), factory.int(0))),
        print(&factory, factory.element_access(factory.name("values"), factory.int(2))),
        print(
            &factory,
            factory.call_on(factory.member_access(factory.name("values"), "Length"), Vec::new()),
        ),
    ]);

    let (result, _) = run(tree);
    assert!(result.is_success());
    assert_eq!(result.output, vec!["10".to_string(), "0".to_string(), "3".to_string()]);
}

#[test]
fn test_compound_element_assignment_evaluates_index_once() {
    let factory = SyntaxFactory::new();
    let array_of_int = factory.generic_type("Array", vec![factory.type_name("int")]);
    let next = factory.method(
        "next",
        Vec::new(),
        Some(factory.type_name("int")),
        factory.block(vec![
            print(&factory, factory.string("next")),
            factory.return_statement(Some(factory.int(1))),
        ]),
    );
    let bump = |amount| {
        factory.expression_statement(factory.compound_assignment(
            factory.element_access(factory.name("values"), factory.call("next", Vec::new())),
            "+=",
            factory.int(amount),
        ))
    };
    let tree = factory.tree(vec![
        next,
        factory.variable("values", factory.array_creation(array_of_int, factory.int(3))),
        bump(5),
        bump(2),
        print(&factory, factory.element_access(factory.name("values"), factory.int(1))),
    ]);

    let (result, _) = run(tree);
    assert!(result.is_success());
    assert_eq!(result.output, vec!["next", "next", "7"]);
}

#[test]
fn test_index_out_of_range_is_a_runtime_diagnostic() {
    let factory = SyntaxFactory::new();
    let array_of_int = factory.generic_type("Array", vec![factory.type_name("int")]);
    let tree = factory.tree(vec![
        factory.variable("values", factory.array_creation(array_of_int, factory.int(3))),
        print(&factory, factory.string("before")),
        print(&factory, factory.element_access(factory.name("values"), factory.int(5))),
        print(&factory, factory.string("after")),
    ]);

    let (result, _) = run(tree);
    assert_eq!(
        runtime_message(&result).as_deref(),
        Some("index 5 is out of range for length 3")
    );
    assert_eq!(result.output, vec!["before".to_string()]);
}

#[test]
fn test_runtime_division_by_zero_yields_sentinel() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("a", factory.int(10)),
        factory.variable("b", factory.int(0)),
        print(&factory, factory.binary(factory.name("a"), "/", factory.name("b"))),
    ]);
    let options = LowerOptions {
        fold_constants: false,
        ..LowerOptions::default()
    };
    let program = compile(tree, options);

    let result = evaluate(&program, &mut VariableStore::new()).expect("evaluated");
    assert!(result.is_success());
    assert_eq!(result.output, vec![DIVIDE_BY_ZERO.to_string()]);
}

#[test]
fn test_logical_operators_short_circuit() {
    let factory = SyntaxFactory::new();
    let side_effect = factory.method(
        "touch",
        Vec::new(),
        Some(factory.type_name("bool")),
        factory.block(vec![
            print(&factory, factory.string("touched")),
            factory.return_statement(Some(factory.boolean(true))),
        ]),
    );
    let tree = factory.tree(vec![
        side_effect,
        print(
            &factory,
            factory.binary(factory.boolean(false), "&&", factory.call("touch", Vec::new())),
        ),
        print(
            &factory,
            factory.binary(factory.boolean(true), "||", factory.call("touch", Vec::new())),
        ),
    ]);

    let (result, _) = run(tree);
    assert_eq!(result.output, vec!["false".to_string(), "true".to_string()]);
}

#[test]
fn test_failed_cast_is_a_runtime_diagnostic() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![print(
        &factory,
        factory.cast(factory.type_name("int"), factory.string("abc")),
    )]);

    let (result, _) = run(tree);
    assert!(!result.is_success());
    assert!(runtime_message(&result).is_some());
    assert!(result.output.is_empty());
}

#[test]
fn test_builtin_len_counts_characters() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![print(&factory, factory.call("len", vec![factory.string("héllo")]))]);

    let (result, _) = run(tree);
    assert_eq!(result.output, vec!["5".to_string()]);
}

#[test]
fn test_program_without_entry_does_nothing() {
    let mut store = VariableStore::new();
    let result = evaluate(&LoweredProgram::default(), &mut store).expect("evaluated");
    assert_eq!(result, EvaluationResult::default());
    assert!(store.is_empty());
}
