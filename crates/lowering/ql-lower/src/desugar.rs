//! Structured control flow to labels and gotos
//!
//! One rewrite pass: `if`, `while`, `do`/`while` and `for` become label and
//! goto sequences, literal operands fold, read-only variables with literal
//! initializers are replaced by their value and nested methods are pulled out
//! of the body.

use ql_bound::{
    BoundBinaryOperator, BoundExpression, BoundMethod, BoundNodeRef, BoundStatement, BoundTreeRewriter,
    BoundUnaryOperator, LoopLabels,
};
use ql_const_eval::{convert, fold_binary, fold_unary};
use ql_symbols::{ConstValue, LabelAllocator, LabelSymbol, TypeRef, VariableId, VariableRef, builtins};
use rustc_hash::FxHashMap;

/// Rewriter for a single lowering pass
pub struct Desugarer<'ctx> {
    labels: &'ctx mut LabelAllocator,
    constants: FxHashMap<VariableId, ConstValue>,
    hoisted: Vec<BoundMethod>,
    fold_constants: bool,
}

/// Read-only variables declared with a literal initializer
pub fn collect_constants(body: &BoundStatement) -> FxHashMap<VariableId, ConstValue> {
    BoundNodeRef::Statement(body)
        .descendants()
        .into_iter()
        .filter_map(|node| match node {
            BoundNodeRef::Statement(BoundStatement::VariableDeclaration {
                variable,
                initializer: BoundExpression::Literal(value),
            }) if variable.read_only => Some((variable.id, value.clone())),
            _ => None,
        })
        .collect()
}

fn goto_false(label: LabelSymbol, condition: BoundExpression) -> BoundStatement {
    BoundStatement::ConditionalGoto {
        label,
        condition,
        jump_if_true: false,
    }
}

impl<'ctx> Desugarer<'ctx> {
    /// Creates a pass that propagates `constants`
    pub fn new(
        labels: &'ctx mut LabelAllocator,
        constants: FxHashMap<VariableId, ConstValue>,
        fold_constants: bool,
    ) -> Self {
        Self {
            labels,
            constants,
            hoisted: Vec::new(),
            fold_constants,
        }
    }

    /// Nested methods removed from the rewritten body
    pub fn into_hoisted(self) -> Vec<BoundMethod> {
        self.hoisted
    }
}

impl BoundTreeRewriter for Desugarer<'_> {
    fn rewrite_if(
        &mut self,
        condition: BoundExpression,
        then_statement: BoundStatement,
        else_statement: Option<BoundStatement>,
    ) -> BoundStatement {
        let end = self.labels.fresh("end");
        let Some(else_statement) = else_statement else {
            return self.rewrite_statement(BoundStatement::Block(vec![
                goto_false(end.clone(), condition),
                then_statement,
                BoundStatement::Label(end),
            ]));
        };
        let otherwise = self.labels.fresh("else");
        self.rewrite_statement(BoundStatement::Block(vec![
            goto_false(otherwise.clone(), condition),
            then_statement,
            BoundStatement::Goto(end.clone()),
            BoundStatement::Label(otherwise),
            else_statement,
            BoundStatement::Label(end),
        ]))
    }

    fn rewrite_while(&mut self, condition: BoundExpression, body: BoundStatement, labels: LoopLabels) -> BoundStatement {
        let LoopLabels {
            break_label,
            continue_label,
        } = labels;
        self.rewrite_statement(BoundStatement::Block(vec![
            BoundStatement::Label(continue_label.clone()),
            goto_false(break_label.clone(), condition),
            body,
            BoundStatement::Goto(continue_label),
            BoundStatement::Label(break_label),
        ]))
    }

    fn rewrite_do_while(&mut self, body: BoundStatement, condition: BoundExpression, labels: LoopLabels) -> BoundStatement {
        let start = self.labels.fresh("body");
        self.rewrite_statement(BoundStatement::Block(vec![
            BoundStatement::Label(start.clone()),
            body,
            BoundStatement::Label(labels.continue_label),
            BoundStatement::ConditionalGoto {
                label: start,
                condition,
                jump_if_true: true,
            },
            BoundStatement::Label(labels.break_label),
        ]))
    }

    fn rewrite_for(
        &mut self,
        initializer: Option<BoundStatement>,
        condition: Option<BoundExpression>,
        update: Option<BoundExpression>,
        body: BoundStatement,
        labels: LoopLabels,
    ) -> BoundStatement {
        let mut inner = vec![body, BoundStatement::Label(labels.continue_label)];
        inner.extend(update.map(BoundStatement::Expression));
        let loop_statement = BoundStatement::While {
            condition: condition.unwrap_or(BoundExpression::Literal(ConstValue::Bool(true))),
            body: Box::new(BoundStatement::Block(inner)),
            labels: LoopLabels {
                break_label: labels.break_label,
                continue_label: self.labels.fresh("check"),
            },
        };
        let mut outer: Vec<BoundStatement> = initializer.into_iter().collect();
        outer.push(loop_statement);
        self.rewrite_statement(BoundStatement::Block(outer))
    }

    fn rewrite_conditional_goto(
        &mut self,
        label: LabelSymbol,
        condition: BoundExpression,
        jump_if_true: bool,
    ) -> BoundStatement {
        let condition = self.rewrite_expression(condition);
        match condition.as_literal().and_then(ConstValue::as_bool) {
            Some(value) if value == jump_if_true => BoundStatement::Goto(label),
            Some(_) => BoundStatement::Nop,
            None => BoundStatement::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            },
        }
    }

    fn rewrite_method_declaration(&mut self, method: BoundMethod) -> BoundStatement {
        self.hoisted.push(method);
        BoundStatement::Nop
    }

    fn rewrite_variable(&mut self, variable: VariableRef) -> BoundExpression {
        self.constants.get(&variable.id).map_or_else(
            || BoundExpression::Variable(variable),
            |value| BoundExpression::Literal(value.clone()),
        )
    }

    fn rewrite_unary(&mut self, operator: BoundUnaryOperator, operand: BoundExpression) -> BoundExpression {
        let operand = self.rewrite_expression(operand);
        let folded = match operand.as_literal() {
            Some(value) if self.fold_constants => fold_unary(operator.kind, value).ok(),
            _ => None,
        };
        folded.map_or_else(
            || BoundExpression::Unary {
                operator,
                operand: Box::new(operand),
            },
            BoundExpression::Literal,
        )
    }

    fn rewrite_binary(
        &mut self,
        left: BoundExpression,
        operator: BoundBinaryOperator,
        right: BoundExpression,
    ) -> BoundExpression {
        let left = self.rewrite_expression(left);
        let right = self.rewrite_expression(right);
        let folded = match (left.as_literal(), right.as_literal()) {
            (Some(lhs), Some(rhs)) if self.fold_constants => fold_binary(lhs, operator.kind, rhs).ok(),
            _ => None,
        };
        folded.map_or_else(
            || BoundExpression::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            },
            BoundExpression::Literal,
        )
    }

    fn rewrite_conversion(&mut self, ty: TypeRef, operand: BoundExpression) -> BoundExpression {
        let operand = self.rewrite_expression(operand);
        // Boxing to object keeps its node so the expression stays object-typed.
        let folded = match operand.as_literal() {
            Some(value) if self.fold_constants && ty != builtins().object => convert(value, &ty).ok(),
            _ => None,
        };
        folded.map_or_else(
            || BoundExpression::Conversion {
                ty,
                operand: Box::new(operand),
            },
            BoundExpression::Literal,
        )
    }
}
