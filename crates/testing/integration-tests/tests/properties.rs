//! Properties the semantic core must uphold

use integration_tests::fixtures;
use integration_tests::init_tracing;
use ql_binder::{BindOptions, bind_program};
use ql_const_eval::DIVIDE_BY_ZERO;
use ql_diagnostics::DiagnosticKind;
use ql_driver::{Compilation, CompilerOptions};
use ql_interpreter::{Value, VariableStore};
use ql_lower::{LowerOptions, LoweringContext, lower};
use ql_symbols::{InstantiationCache, builtins};
use ql_syntax::{SyntaxFactory, SyntaxNode, SyntaxTree};
use std::sync::Arc;

fn print(factory: &SyntaxFactory, value: SyntaxNode) -> SyntaxNode {
    factory.expression_statement(factory.call("print", vec![value]))
}

fn output(trees: Vec<SyntaxTree>, options: CompilerOptions) -> Vec<String> {
    let result = Compilation::new(trees, options)
        .evaluate(&mut VariableStore::new())
        .expect("evaluated");
    assert!(result.is_success(), "{:?}", result.diagnostics);
    result.output
}

#[test]
fn test_lowering_is_idempotent() {
    init_tracing();
    let trees = fixtures::do_while_continue().trees;
    let bound = bind_program(&trees, &BindOptions::default()).expect("bound");
    let lowered = lower(&bound, LowerOptions::default()).expect("lowered");

    let mut context = LoweringContext::new(LowerOptions::default(), bound.labels.clone());
    for method in &lowered.methods {
        let (again, hoisted) = context
            .lower_body(&method.symbol.name, method.body.clone())
            .expect("lowered again");
        assert_eq!(again, method.body);
        assert!(hoisted.is_empty());
    }
}

#[test]
fn test_folding_agrees_with_evaluation() {
    init_tracing();
    let program = || {
        let factory = SyntaxFactory::new();
        factory.tree(vec![
            print(&factory, factory.binary(factory.int(4), "*", factory.int(2))),
            print(&factory, factory.binary(factory.int(9), "/", factory.int(0))),
            print(&factory, factory.binary(factory.int(7), "%", factory.int(0))),
            print(
                &factory,
                factory.binary(factory.float(0.5), "+", factory.int(1)),
            ),
            print(&factory, factory.unary("-", factory.int(3))),
        ])
    };
    let unfolded = CompilerOptions {
        fold_constants: false,
        ..CompilerOptions::default()
    };

    let folded_output = output(vec![program()], CompilerOptions::default());
    assert_eq!(output(vec![program()], unfolded), folded_output);
    assert_eq!(
        folded_output,
        ["8", DIVIDE_BY_ZERO, DIVIDE_BY_ZERO, "1.5", "-3"]
    );

    let emitted = Compilation::new(vec![program()], CompilerOptions::default())
        .emit_tree()
        .expect("emitted");
    assert!(emitted.contains("print(object(8))"), "{emitted}");
}

#[test]
fn test_assignment_inside_used_expression_survives_dead_store_removal() {
    init_tracing();
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
    let compilation = Compilation::new(vec![tree], CompilerOptions::default());
    let mut store = VariableStore::new();
    let result = compilation.evaluate(&mut store).expect("evaluated");

    assert_eq!(result.value, Some(Value::Int(100)));
    assert_eq!(store.value_of("a"), Some(&Value::Int(10)));
}

#[test]
fn test_for_loop_sums_to_55() {
    init_tracing();
    let compilation = Compilation::new(fixtures::loop_sum().trees, CompilerOptions::default());
    let mut store = VariableStore::new();
    let result = compilation.evaluate(&mut store).expect("evaluated");

    assert!(result.is_success());
    assert_eq!(store.value_of("result"), Some(&Value::Int(55)));
}

#[test]
fn test_all_paths_return_follows_branches() {
    init_tracing();
    let factory = SyntaxFactory::new();
    let method = |name: &str, otherwise: Option<SyntaxNode>| {
        factory.method(
            name,
            vec![("flag", factory.type_name("bool"))],
            Some(factory.type_name("int")),
            factory.block(vec![factory.if_statement(
                factory.name("flag"),
                factory.return_statement(Some(factory.int(1))),
                otherwise,
            )]),
        )
    };
    let partial = method("partial", None);
    let total = method("total", Some(factory.return_statement(Some(factory.int(2)))));
    let tree = factory.tree(vec![partial, total]);

    let options = CompilerOptions {
        check_all_paths_return: false,
        ..CompilerOptions::default()
    };
    let graphs = Compilation::new(vec![tree.clone()], options)
        .control_flow_graphs()
        .expect("graphs");
    let verdicts: Vec<(&str, bool)> = graphs
        .iter()
        .map(|(symbol, graph)| (symbol.name.as_str(), graph.all_paths_return()))
        .collect();
    assert_eq!(
        verdicts,
        [("partial", false), ("total", true)]
    );

    let checked = Compilation::new(vec![tree], CompilerOptions::default());
    let kinds: Vec<DiagnosticKind> = checked
        .diagnostics()
        .expect("bound")
        .iter()
        .map(|diagnostic| diagnostic.kind.clone())
        .collect();
    assert_eq!(
        kinds,
        [DiagnosticKind::NotAllPathsReturn {
            name: "partial".to_string()
        }]
    );
}

#[test]
fn test_pass_limit_surfaces_as_one_internal_diagnostic() {
    init_tracing();
    let factory = SyntaxFactory::new();
    let counter = factory.method(
        "counter",
        Vec::new(),
        Some(factory.type_name("int")),
        factory.block(vec![
            factory.variable("count", factory.int(0)),
            factory.do_while_statement(
                factory.expression_statement(factory.compound_assignment(
                    factory.name("count"),
                    "+=",
                    factory.int(2),
                )),
                factory.binary(factory.name("count"), "<", factory.int(6)),
            ),
            factory.return_statement(Some(factory.name("count"))),
        ]),
    );
    let tree = factory.tree(vec![counter, print(&factory, factory.call("counter", Vec::new()))]);

    let limited = CompilerOptions {
        max_lowering_passes: 1,
        ..CompilerOptions::default()
    };
    let result = Compilation::new(vec![tree.clone()], limited)
        .evaluate(&mut VariableStore::new())
        .expect("evaluated");
    assert!(result.output.is_empty());
    assert!(matches!(
        result.diagnostics.as_slice(),
        [diagnostic] if matches!(diagnostic.kind, DiagnosticKind::Internal { .. })
    ));

    assert_eq!(output(vec![tree], CompilerOptions::default()), ["6"]);
}

#[test]
fn test_one_diagnostic_per_span() {
    init_tracing();
    let factory = SyntaxFactory::new();
    let main = factory.method("main", Vec::new(), Some(factory.type_name("int")), factory.block(Vec::new()));
    let compilation = Compilation::new(vec![factory.tree(vec![main])], CompilerOptions::default());
    let diagnostics = compilation.diagnostics().expect("bound");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidMainSignature);
}

#[test]
fn test_generic_instantiation_substitutes_indexer() {
    let builtins = builtins();
    let concrete = builtins
        .array
        .make_concrete_type(&[Arc::clone(&builtins.int)])
        .expect("instantiated");
    let indexer = concrete.indexer().expect("indexer");
    assert_eq!(indexer.element, builtins.int);

    let mut cache = InstantiationCache::new();
    let first = cache
        .instantiate(&builtins.array, &[Arc::clone(&builtins.int)])
        .expect("instantiated");
    let second = cache
        .instantiate(&builtins.array, &[Arc::clone(&builtins.int)])
        .expect("instantiated");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.hits(), 1);
}

#[test]
fn test_redeclaration_diagnostic_is_deterministic() {
    init_tracing();
    let factory = SyntaxFactory::new();
    let second = factory.variable("x", factory.int(5));
    let second_span = second.span;
    let tree = factory.tree(vec![factory.variable("x", factory.int(10)), second]);

    let runs: Vec<_> = (0..3)
        .map(|_| {
            Compilation::new(vec![tree.clone()], CompilerOptions::default())
                .diagnostics()
                .expect("bound")
                .to_vec()
        })
        .collect();
    assert!(runs.iter().all(|run| *run == runs[0]));
    assert_eq!(runs[0].len(), 1);
    assert_eq!(runs[0][0].span, second_span);

    let json = serde_json::to_value(&runs[0]).expect("serialized");
    assert_eq!(json[0]["kind"], "VariableAlreadyDeclared");
    assert_eq!(json[0]["name"], "x");
}
