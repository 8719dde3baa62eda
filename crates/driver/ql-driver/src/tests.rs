use crate::{Compilation, CompileError, CompilerOptions};
use ql_diagnostics::DiagnosticKind;
use ql_interpreter::{Value, VariableStore};
use ql_syntax::{SyntaxFactory, SyntaxTree};
use std::io::Write as _;
use std::{ptr, thread};

fn counting_program() -> SyntaxTree {
    let factory = SyntaxFactory::new();
    factory.tree(vec![
        factory.variable("total", factory.int(0)),
        factory.while_statement(
            factory.binary(factory.name("total"), "<", factory.int(3)),
            factory.expression_statement(factory.compound_assignment(
                factory.name("total"),
                "+=",
                factory.int(1),
            )),
        ),
        factory.expression_statement(factory.call("print", vec![factory.name("total")])),
    ])
}

#[test]
fn test_binding_is_memoized() {
    let compilation = Compilation::new(vec![counting_program()], CompilerOptions::default());
    let first = compilation.bound_program().expect("bound");
    let second = compilation.bound_program().expect("bound");
    assert!(ptr::eq(first, second));
}

#[test]
fn test_concurrent_callers_observe_one_bound_program() {
    let compilation = Compilation::new(vec![counting_program()], CompilerOptions::default());
    let programs: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| compilation.bound_program().expect("bound")))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("joined"))
            .collect()
    });
    let first = programs[0];
    assert!(programs.iter().all(|program| ptr::eq(*program, first)));
}

#[test]
fn test_evaluation_updates_caller_store() {
    let compilation = Compilation::new(vec![counting_program()], CompilerOptions::default());
    let mut store = VariableStore::new();
    let result = compilation.evaluate(&mut store).expect("evaluated");

    assert!(result.is_success());
    assert_eq!(result.output, vec!["3".to_string()]);
    assert_eq!(store.value_of("total"), Some(&Value::Int(3)));
}

#[test]
fn test_evaluation_is_skipped_when_binding_reports() {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.expression_statement(factory.call("print", vec![factory.string("never")])),
        factory.expression_statement(factory.name("missing")),
    ]);
    let compilation = Compilation::new(vec![tree], CompilerOptions::default());
    let result = compilation.evaluate(&mut VariableStore::new()).expect("evaluated");

    assert!(result.output.is_empty());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.kind.clone())
            .collect::<Vec<_>>(),
        vec![DiagnosticKind::UndefinedName {
            name: "missing".to_string()
        }]
    );
    assert!(matches!(
        compilation.lowered_program(),
        Err(CompileError::HasDiagnostics { count: 1 })
    ));
}

#[test]
fn test_pass_limit_becomes_internal_diagnostic() {
    let options = CompilerOptions {
        max_lowering_passes: 1,
        ..CompilerOptions::default()
    };
    let compilation = Compilation::new(vec![counting_program()], options);
    let result = compilation.evaluate(&mut VariableStore::new()).expect("evaluated");

    assert_eq!(result.diagnostics.len(), 1);
    assert!(matches!(result.diagnostics[0].kind, DiagnosticKind::Internal { .. }));
    assert!(result.output.is_empty());
}

#[test]
fn test_pass_limit_in_non_void_method_becomes_internal_diagnostic() {
    let factory = SyntaxFactory::new();
    let one = factory.method(
        "one",
        Vec::new(),
        Some(factory.type_name("int")),
        factory.block(vec![
            factory.variable("total", factory.int(0)),
            factory.while_statement(
                factory.binary(factory.name("total"), "<", factory.int(3)),
                factory.expression_statement(factory.compound_assignment(
                    factory.name("total"),
                    "+=",
                    factory.int(1),
                )),
            ),
            factory.return_statement(Some(factory.name("total"))),
        ]),
    );
    let tree = factory.tree(vec![
        one,
        factory.expression_statement(factory.call("print", vec![factory.call("one", Vec::new())])),
    ]);
    let options = CompilerOptions {
        max_lowering_passes: 1,
        ..CompilerOptions::default()
    };
    let compilation = Compilation::new(vec![tree], options);
    let result = compilation.evaluate(&mut VariableStore::new()).expect("evaluated");

    assert_eq!(result.diagnostics.len(), 1);
    assert!(matches!(result.diagnostics[0].kind, DiagnosticKind::Internal { .. }));
    assert!(result.output.is_empty());
}

#[test]
fn test_runaway_recursion_is_a_runtime_diagnostic() {
    let factory = SyntaxFactory::new();
    let forever = factory.method(
        "forever",
        vec![("n", factory.type_name("int"))],
        Some(factory.type_name("int")),
        factory.block(vec![factory.return_statement(Some(factory.call(
            "forever",
            vec![factory.binary(factory.name("n"), "+", factory.int(1))],
        )))]),
    );
    let tree = factory.tree(vec![
        forever,
        factory.expression_statement(factory.call("print", vec![factory.call("forever", vec![factory.int(0)])])),
    ]);
    let options = CompilerOptions {
        max_call_depth: 16,
        ..CompilerOptions::default()
    };
    let compilation = Compilation::new(vec![tree], options);
    let result = compilation.evaluate(&mut VariableStore::new()).expect("evaluated");

    assert!(result.output.is_empty());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.kind.clone())
            .collect::<Vec<_>>(),
        vec![DiagnosticKind::Runtime {
            message: "call to 'forever' exceeds the maximum call depth of 16".to_string()
        }]
    );
}

#[test]
fn test_emitted_tree_and_graphs() {
    let factory = SyntaxFactory::new();
    let pick = factory.method(
        "pick",
        vec![("flag", factory.type_name("bool"))],
        Some(factory.type_name("int")),
        factory.block(vec![factory.if_statement(
            factory.name("flag"),
            factory.return_statement(Some(factory.int(1))),
            Some(factory.return_statement(Some(factory.int(2)))),
        )]),
    );
    let tree = factory.tree(vec![
        pick,
        factory.expression_statement(factory.call(
            "print",
            vec![factory.call("pick", vec![factory.boolean(true)])],
        )),
    ]);
    let compilation = Compilation::new(vec![tree], CompilerOptions::default());

    let emitted = compilation.emit_tree().expect("emitted");
    assert!(emitted.contains("pick(bool): int"));
    assert!(emitted.contains("main(): void"));

    let graphs = compilation.control_flow_graphs().expect("graphs");
    let names: Vec<_> = graphs.iter().map(|(method, _)| method.name.as_str()).collect();
    assert_eq!(names, ["pick", "main"]);
    assert!(graphs.iter().all(|(method, graph)| method.name != "pick" || graph.all_paths_return()));

    let dot = compilation.emit_control_flow_graphs().expect("dot");
    assert_eq!(dot.matches("digraph G {").count(), 2);
}

#[test]
fn test_options_from_toml_keep_defaults() {
    let options = CompilerOptions::from_toml("fold_constants = false").expect("parsed");
    assert_eq!(
        options,
        CompilerOptions {
            fold_constants: false,
            ..CompilerOptions::default()
        }
    );
    assert_eq!(options.lower_options().max_passes, 64);
    assert!(CompilerOptions::from_toml("optimize = true").is_err());
}

#[test]
fn test_options_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "max_lowering_passes = 8").expect("written");
    writeln!(file, "check_all_paths_return = false").expect("written");

    writeln!(file, "max_call_depth = 500").expect("written");

    let options = CompilerOptions::from_file(file.path()).expect("loaded");
    assert_eq!(options.max_lowering_passes, 8);
    assert_eq!(options.max_call_depth, 500);
    assert!(!options.bind_options().check_all_paths_return);

    let directory = tempfile::tempdir().expect("temp dir");
    let missing = directory.path().join("quill.toml");
    let error = CompilerOptions::from_file(&missing).expect_err("missing file");
    assert!(error.to_string().contains("failed to read"));
}
