//! Small programs with known outcomes
//!
//! Each [`Project`] is a set of syntax trees, one per compilation unit, and
//! the output or diagnostics evaluating them must produce.

use ql_diagnostics::DiagnosticKind;
use ql_driver::{Compilation, CompilerOptions};
use ql_interpreter::VariableStore;
use ql_syntax::{SyntaxFactory, SyntaxNode, SyntaxTree};

/// Outcome of running a [`Project`]
#[derive(Debug)]
pub enum TestResult {
    /// Evaluation matched the expectation
    Pass,
    /// Evaluation diverged from the expectation
    Fail {
        /// What was observed instead
        reason: String,
    },
}

/// What a [`Project`] must produce
#[derive(Debug, Clone)]
pub enum Expected {
    /// No diagnostics and exactly these printed lines
    Output(Vec<String>),
    /// Exactly these diagnostics, in order
    Diagnostics(Vec<DiagnosticKind>),
}

/// A program under test
#[derive(Debug)]
pub struct Project {
    /// Name used in failure messages
    pub name: &'static str,
    /// Compilation units
    pub trees: Vec<SyntaxTree>,
    /// Options the program is compiled with
    pub options: CompilerOptions,
    /// Expected outcome
    pub expected: Expected,
}

impl Project {
    fn new(name: &'static str, trees: Vec<SyntaxTree>, expected: Expected) -> Self {
        Self {
            name,
            trees,
            options: CompilerOptions::default(),
            expected,
        }
    }

    /// Compiles and evaluates the program, comparing against the expectation
    pub fn run(&self) -> TestResult {
        let compilation = Compilation::new(self.trees.clone(), self.options);
        let result = match compilation.evaluate(&mut VariableStore::new()) {
            Ok(result) => result,
            Err(error) => {
                return TestResult::Fail {
                    reason: format!("{}: {error}", self.name),
                };
            }
        };
        let kinds: Vec<DiagnosticKind> = result
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.kind.clone())
            .collect();
        match &self.expected {
            Expected::Output(lines) if kinds.is_empty() && result.output == *lines => TestResult::Pass,
            Expected::Diagnostics(expected) if kinds == *expected => TestResult::Pass,
            Expected::Output(_) | Expected::Diagnostics(_) => TestResult::Fail {
                reason: format!(
                    "{}: printed {:?} with diagnostics {kinds:?}",
                    self.name, result.output
                ),
            },
        }
    }
}

fn lines(lines: &[&str]) -> Expected {
    Expected::Output(lines.iter().map(ToString::to_string).collect())
}

fn print(factory: &SyntaxFactory, value: SyntaxNode) -> SyntaxNode {
    factory.expression_statement(factory.call("print", vec![value]))
}

/// `for (var i = 0; i <= 10; ++i) result = result + i;`
pub fn loop_sum() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("result", factory.int(0)),
        factory.for_statement(
            Some(factory.variable("i", factory.int(0))),
            Some(factory.binary(factory.name("i"), "<=", factory.int(10))),
            Some(factory.unary("++", factory.name("i"))),
            factory.expression_statement(factory.assignment(
                factory.name("result"),
                factory.binary(factory.name("result"), "+", factory.name("i")),
            )),
        ),
        print(&factory, factory.name("result")),
    ]);
    Project::new("loop-sum", vec![tree], lines(&["55"]))
}

/// `{ var a = 0; var result = (a = 10) * a; }`
pub fn assignment_in_expression() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![factory.block(vec![
        factory.variable("a", factory.int(0)),
        factory.variable(
            "result",
            factory.binary(
                factory.parenthesized(factory.assignment(factory.name("a"), factory.int(10))),
                "*",
                factory.name("a"),
            ),
        ),
        print(&factory, factory.name("result")),
    ])]);
    Project::new("assignment-in-expression", vec![tree], lines(&["100"]))
}

/// `continue` inside `do ... while` still evaluates the guard
pub fn do_while_continue() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("i", factory.int(0)),
        factory.do_while_statement(
            factory.block(vec![
                factory.expression_statement(factory.compound_assignment(
                    factory.name("i"),
                    "+=",
                    factory.int(1),
                )),
                factory.if_statement(
                    factory.binary(factory.name("i"), "==", factory.int(2)),
                    factory.continue_statement(),
                    None,
                ),
                print(&factory, factory.name("i")),
            ]),
            factory.binary(factory.name("i"), "<", factory.int(3)),
        ),
    ]);
    Project::new("do-while-continue", vec![tree], lines(&["1", "3"]))
}

/// A backward `goto` forming a loop
pub fn goto_loop() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("n", factory.int(0)),
        factory.label("top"),
        factory.expression_statement(factory.compound_assignment(factory.name("n"), "+=", factory.int(1))),
        factory.if_statement(
            factory.binary(factory.name("n"), "<", factory.int(3)),
            factory.goto("top"),
            None,
        ),
        print(&factory, factory.name("n")),
    ]);
    Project::new("goto-loop", vec![tree], lines(&["3"]))
}

/// A namespace declared in one unit and called through an alias from another
pub fn namespace_across_units() -> Project {
    let factory = SyntaxFactory::new();
    let square = factory.method(
        "square",
        vec![("side", factory.type_name("int"))],
        Some(factory.type_name("int")),
        factory.block(vec![factory.return_statement(Some(factory.binary(
            factory.name("side"),
            "*",
            factory.name("side"),
        )))]),
    );
    let library = factory.tree(vec![factory.namespace("Geo.Shapes", vec![square])]);
    let program = factory.tree(vec![
        factory.with_alias("shapes", "Geo.Shapes"),
        print(
            &factory,
            factory.call_on(factory.qualified_name("shapes.square"), vec![factory.int(4)]),
        ),
    ]);
    Project::new("namespace-across-units", vec![library, program], lines(&["16"]))
}

/// Strings, chars and floats through the operator table
pub fn mixed_literals() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("greeting", factory.string("hi ")),
        print(
            &factory,
            factory.binary(factory.name("greeting"), "+", factory.int(2)),
        ),
        print(&factory, factory.binary(factory.float(1.5), "*", factory.int(2))),
        print(&factory, factory.call("len", vec![factory.name("greeting")])),
    ]);
    Project::new("mixed-literals", vec![tree], lines(&["hi 2", "3.0", "3"]))
}

/// `var x = 10; var x = 5;` in one block
pub fn redeclaration() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable("x", factory.int(10)),
        factory.variable("x", factory.int(5)),
    ]);
    Project::new(
        "redeclaration",
        vec![tree],
        Expected::Diagnostics(vec![DiagnosticKind::VariableAlreadyDeclared {
            name: "x".to_string(),
        }]),
    )
}

/// Reading past the end of an array
pub fn index_out_of_range() -> Project {
    let factory = SyntaxFactory::new();
    let tree = factory.tree(vec![
        factory.variable(
            "values",
            factory.array_creation(
                factory.generic_type("Array", vec![factory.type_name("int")]),
                factory.int(2),
            ),
        ),
        print(&factory, factory.element_access(factory.name("values"), factory.int(2))),
    ]);
    Project::new(
        "index-out-of-range",
        vec![tree],
        Expected::Diagnostics(vec![DiagnosticKind::Runtime {
            message: "index 2 is out of range for length 2".to_string(),
        }]),
    )
}

/// Every fixture
pub fn all_projects() -> Vec<Project> {
    vec![
        loop_sum(),
        assignment_in_expression(),
        do_while_continue(),
        goto_loop(),
        namespace_across_units(),
        mixed_literals(),
        redeclaration(),
        index_out_of_range(),
    ]
}
