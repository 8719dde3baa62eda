use crate::{LowerError, LowerOptions, LoweringContext};
use expect_test::expect;
use ql_bound::{BoundBinaryOperator, BoundExpression, BoundMethod, BoundStatement, LoopLabels};
use ql_const_eval::DIVIDE_BY_ZERO;
use ql_symbols::{
    ConstValue, LabelAllocator, MethodId, MethodKind, MethodSymbol, VariableId, VariableRef, VariableSymbol,
    builtins,
};
use std::sync::Arc;

fn int(value: i64) -> BoundExpression {
    BoundExpression::Literal(ConstValue::Int(value))
}

fn text(value: &str) -> BoundExpression {
    BoundExpression::Literal(ConstValue::from(value))
}

fn local(id: u32, name: &str) -> VariableRef {
    VariableSymbol::local(VariableId(id), name, Arc::clone(&builtins().int), false)
}

fn read(variable: &VariableRef) -> BoundExpression {
    BoundExpression::Variable(Arc::clone(variable))
}

fn assign(variable: &VariableRef, value: BoundExpression) -> BoundExpression {
    BoundExpression::Assignment {
        variable: Arc::clone(variable),
        value: Box::new(value),
    }
}

fn declare(variable: &VariableRef, initializer: BoundExpression) -> BoundStatement {
    BoundStatement::VariableDeclaration {
        variable: Arc::clone(variable),
        initializer,
    }
}

fn binary(left: BoundExpression, syntax: &str, right: BoundExpression) -> BoundExpression {
    let operator = BoundBinaryOperator::bind(syntax, &left.ty(), &right.ty()).expect("operator");
    BoundExpression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn print(argument: BoundExpression) -> BoundStatement {
    let method = builtins()
        .methods()
        .iter()
        .find(|method| method.name == "print")
        .cloned()
        .expect("print");
    BoundStatement::Expression(BoundExpression::Call {
        method,
        arguments: vec![argument],
    })
}

fn fresh_loop_labels(labels: &mut LabelAllocator) -> LoopLabels {
    LoopLabels {
        break_label: labels.fresh("break"),
        continue_label: labels.fresh("continue"),
    }
}

fn lower_with(labels: LabelAllocator, body: BoundStatement) -> BoundStatement {
    LoweringContext::new(LowerOptions::default(), labels)
        .lower_body("test", body)
        .expect("lowered")
        .0
}

fn lower(body: BoundStatement) -> BoundStatement {
    lower_with(LabelAllocator::new(), body)
}

#[test]
fn test_constant_folding_propagates_read_only_values() {
    let x = local(1, "x");
    let lowered = lower(BoundStatement::Block(vec![
        declare(&x, binary(int(4), "*", int(2))),
        print(read(&x)),
    ]));
    expect![[r#"
        {
            8
            print(8)
        }
    "#]]
    .assert_eq(&lowered.to_string());
}

#[test]
fn test_division_by_zero_folds_to_sentinel() {
    let lowered = lower(BoundStatement::Block(vec![print(binary(int(9), "/", int(0)))]));
    assert_eq!(lowered, BoundStatement::Block(vec![print(text(DIVIDE_BY_ZERO))]));
}

#[test]
fn test_folding_can_be_disabled() {
    let options = LowerOptions {
        fold_constants: false,
        ..LowerOptions::default()
    };
    let body = BoundStatement::Block(vec![print(binary(int(4), "*", int(2)))]);
    let (lowered, _) = LoweringContext::new(options, LabelAllocator::new())
        .lower_body("test", body.clone())
        .expect("lowered");
    assert_eq!(lowered, body);
}

#[test]
fn test_if_else_desugaring() {
    let flag = VariableSymbol::parameter(VariableId(1), "flag", Arc::clone(&builtins().bool), 0);
    let lowered = lower(BoundStatement::Block(vec![BoundStatement::If {
        condition: read(&flag),
        then_statement: Box::new(print(text("a"))),
        else_statement: Some(Box::new(print(text("b")))),
    }]));
    expect![[r#"
        {
            goto else2 unless flag
            print("a")
            goto end1
        else2:
            print("b")
        end1:
        }
    "#]]
    .assert_eq(&lowered.to_string());
}

#[test]
fn test_literal_condition_collapses() {
    let lowered = lower(BoundStatement::Block(vec![BoundStatement::If {
        condition: BoundExpression::Literal(ConstValue::Bool(true)),
        then_statement: Box::new(print(text("a"))),
        else_statement: None,
    }]));
    assert_eq!(lowered, BoundStatement::Block(vec![print(text("a"))]));
}

#[test]
fn test_while_desugaring_is_idempotent() {
    let mut labels = LabelAllocator::new();
    let i = local(1, "i");
    let loop_labels = fresh_loop_labels(&mut labels);
    let lowered = lower_with(
        labels,
        BoundStatement::Block(vec![
            declare(&i, int(0)),
            BoundStatement::While {
                condition: binary(read(&i), "<", int(3)),
                body: Box::new(BoundStatement::Block(vec![BoundStatement::Expression(assign(
                    &i,
                    binary(read(&i), "+", int(1)),
                ))])),
                labels: loop_labels,
            },
        ]),
    );
    expect![[r#"
        {
            var i = 0
        continue2:
            goto break1 unless i < 3
            i = i + 1
            goto continue2
        break1:
        }
    "#]]
    .assert_eq(&lowered.to_string());
    assert_eq!(lower(lowered.clone()), lowered);
}

#[test]
fn test_for_desugaring() {
    let mut labels = LabelAllocator::new();
    let i = local(1, "i");
    let loop_labels = fresh_loop_labels(&mut labels);
    let lowered = lower_with(
        labels,
        BoundStatement::Block(vec![BoundStatement::For {
            initializer: Some(Box::new(declare(&i, int(0)))),
            condition: Some(binary(read(&i), "<", int(2))),
            update: Some(assign(&i, binary(read(&i), "+", int(1)))),
            body: Box::new(print(read(&i))),
            labels: loop_labels,
        }]),
    );
    expect![[r#"
        {
            var i = 0
        check3:
            goto break1 unless i < 2
            print(i)
            i = i + 1
            goto check3
        break1:
        }
    "#]]
    .assert_eq(&lowered.to_string());
}

#[test]
fn test_do_while_desugaring() {
    let mut labels = LabelAllocator::new();
    let i = local(1, "i");
    let loop_labels = fresh_loop_labels(&mut labels);
    let lowered = lower_with(
        labels,
        BoundStatement::Block(vec![
            declare(&i, int(0)),
            BoundStatement::DoWhile {
                body: Box::new(BoundStatement::Expression(assign(&i, binary(read(&i), "+", int(1))))),
                condition: binary(read(&i), "<", int(5)),
                labels: loop_labels,
            },
        ]),
    );
    expect![[r#"
        {
            var i = 0
        body3:
            i = i + 1
            goto body3 if i < 5
        }
    "#]]
    .assert_eq(&lowered.to_string());
}

#[test]
fn test_assignment_inside_used_expression_is_kept() {
    let a = local(1, "a");
    let result = local(2, "result");
    let lowered = lower(BoundStatement::Block(vec![
        declare(&a, int(0)),
        declare(&result, binary(assign(&a, int(10)), "*", read(&a))),
    ]));
    expect![[r#"
        {
            var a = 0
            (a = 10) * a
        }
    "#]]
    .assert_eq(&lowered.to_string());
}

#[test]
fn test_nested_methods_are_hoisted() {
    let method = |id, name: &str| MethodSymbol {
        name: name.to_string(),
        namespace: None,
        parameters: Vec::new(),
        return_type: Arc::clone(&builtins().void),
        kind: MethodKind::User(MethodId(id)),
    };
    let inner = BoundMethod {
        symbol: method(2, "inner"),
        parameters: Vec::new(),
        body: BoundStatement::Block(vec![print(int(2))]),
    };
    let outer = BoundMethod {
        symbol: method(1, "outer"),
        parameters: Vec::new(),
        body: BoundStatement::Block(vec![BoundStatement::MethodDeclaration(Box::new(inner)), print(int(1))]),
    };
    let lowered = LoweringContext::new(LowerOptions::default(), LabelAllocator::new())
        .lower_method(outer)
        .expect("lowered");
    let names: Vec<&str> = lowered.iter().map(|method| method.symbol.name.as_str()).collect();
    assert_eq!(names, vec!["outer", "inner"]);
    assert_eq!(lowered[0].body, BoundStatement::Block(vec![print(int(1))]));
}

#[test]
fn test_pass_limit_is_reported() {
    let options = LowerOptions {
        max_passes: 1,
        ..LowerOptions::default()
    };
    let x = local(1, "x");
    let result = LoweringContext::new(options, LabelAllocator::new())
        .lower_body("limited", BoundStatement::Block(vec![declare(&x, int(1)), print(read(&x))]));
    assert!(matches!(
        result,
        Err(LowerError::FixedPointNotReached { passes: 1, .. })
    ));
}

#[test]
fn test_jump_to_undeclared_label_is_an_error() {
    let mut labels = LabelAllocator::new();
    let missing = labels.fresh("missing");
    let result = LoweringContext::new(LowerOptions::default(), labels)
        .lower_body("broken", BoundStatement::Block(vec![BoundStatement::Goto(missing)]));
    assert!(matches!(result, Err(LowerError::UndeclaredLabel { .. })));
}
