//! Bound tree rewriting infrastructure

use crate::operators::{BoundBinaryOperator, BoundUnaryOperator};
use crate::tree::{BoundExpression, BoundMethod, BoundStatement, LoopLabels};
use ql_symbols::{ConstValue, IndexerSymbol, LabelSymbol, TypeRef, VariableRef};

/// Rewrites a bound tree bottom-up
///
/// Every hook receives an owned node and returns its replacement. The default
/// implementations rebuild the node from rewritten children, so an
/// implementation only overrides the shapes it cares about.
pub trait BoundTreeRewriter {
    /// Dispatches on the statement shape
    fn rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        match statement {
            BoundStatement::Block(statements) => self.rewrite_block(statements),
            BoundStatement::VariableDeclaration { variable, initializer } => {
                self.rewrite_variable_declaration(variable, initializer)
            }
            BoundStatement::Expression(expression) => {
                BoundStatement::Expression(self.rewrite_expression(expression))
            }
            BoundStatement::If {
                condition,
                then_statement,
                else_statement,
            } => self.rewrite_if(condition, *then_statement, else_statement.map(|statement| *statement)),
            BoundStatement::While { condition, body, labels } => self.rewrite_while(condition, *body, labels),
            BoundStatement::DoWhile { body, condition, labels } => self.rewrite_do_while(*body, condition, labels),
            BoundStatement::For {
                initializer,
                condition,
                update,
                body,
                labels,
            } => self.rewrite_for(initializer.map(|statement| *statement), condition, update, *body, labels),
            BoundStatement::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            } => self.rewrite_conditional_goto(label, condition, jump_if_true),
            BoundStatement::Return(value) => {
                BoundStatement::Return(value.map(|expression| self.rewrite_expression(expression)))
            }
            BoundStatement::MethodDeclaration(method) => self.rewrite_method_declaration(*method),
            BoundStatement::Label(_) | BoundStatement::Goto(_) | BoundStatement::Nop => statement,
        }
    }

    /// `{ statements }`
    fn rewrite_block(&mut self, statements: Vec<BoundStatement>) -> BoundStatement {
        BoundStatement::Block(
            statements
                .into_iter()
                .map(|statement| self.rewrite_statement(statement))
                .collect(),
        )
    }

    /// `var variable = initializer`
    fn rewrite_variable_declaration(&mut self, variable: VariableRef, initializer: BoundExpression) -> BoundStatement {
        BoundStatement::VariableDeclaration {
            variable,
            initializer: self.rewrite_expression(initializer),
        }
    }

    /// `if (condition) then_statement else else_statement`
    fn rewrite_if(
        &mut self,
        condition: BoundExpression,
        then_statement: BoundStatement,
        else_statement: Option<BoundStatement>,
    ) -> BoundStatement {
        BoundStatement::If {
            condition: self.rewrite_expression(condition),
            then_statement: Box::new(self.rewrite_statement(then_statement)),
            else_statement: else_statement.map(|statement| Box::new(self.rewrite_statement(statement))),
        }
    }

    /// `while (condition) body`
    fn rewrite_while(&mut self, condition: BoundExpression, body: BoundStatement, labels: LoopLabels) -> BoundStatement {
        BoundStatement::While {
            condition: self.rewrite_expression(condition),
            body: Box::new(self.rewrite_statement(body)),
            labels,
        }
    }

    /// `do body while (condition)`
    fn rewrite_do_while(&mut self, body: BoundStatement, condition: BoundExpression, labels: LoopLabels) -> BoundStatement {
        BoundStatement::DoWhile {
            body: Box::new(self.rewrite_statement(body)),
            condition: self.rewrite_expression(condition),
            labels,
        }
    }

    /// `for (initializer; condition; update) body`
    fn rewrite_for(
        &mut self,
        initializer: Option<BoundStatement>,
        condition: Option<BoundExpression>,
        update: Option<BoundExpression>,
        body: BoundStatement,
        labels: LoopLabels,
    ) -> BoundStatement {
        BoundStatement::For {
            initializer: initializer.map(|statement| Box::new(self.rewrite_statement(statement))),
            condition: condition.map(|expression| self.rewrite_expression(expression)),
            update: update.map(|expression| self.rewrite_expression(expression)),
            body: Box::new(self.rewrite_statement(body)),
            labels,
        }
    }

    /// `goto label if condition == jump_if_true`
    fn rewrite_conditional_goto(
        &mut self,
        label: LabelSymbol,
        condition: BoundExpression,
        jump_if_true: bool,
    ) -> BoundStatement {
        BoundStatement::ConditionalGoto {
            label,
            condition: self.rewrite_expression(condition),
            jump_if_true,
        }
    }

    /// Nested method declaration
    fn rewrite_method_declaration(&mut self, method: BoundMethod) -> BoundStatement {
        BoundStatement::MethodDeclaration(Box::new(BoundMethod {
            body: self.rewrite_statement(method.body),
            ..method
        }))
    }

    /// Dispatches on the expression shape
    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        match expression {
            BoundExpression::Error => BoundExpression::Error,
            BoundExpression::Literal(value) => self.rewrite_literal(value),
            BoundExpression::Variable(variable) => self.rewrite_variable(variable),
            BoundExpression::Assignment { variable, value } => self.rewrite_assignment(variable, *value),
            BoundExpression::Unary { operator, operand } => self.rewrite_unary(operator, *operand),
            BoundExpression::Binary { left, operator, right } => self.rewrite_binary(*left, operator, *right),
            BoundExpression::Call { method, arguments } => BoundExpression::Call {
                method,
                arguments: self.rewrite_expressions(arguments),
            },
            BoundExpression::MemberCall {
                receiver,
                method,
                arguments,
            } => BoundExpression::MemberCall {
                receiver: Box::new(self.rewrite_expression(*receiver)),
                method,
                arguments: self.rewrite_expressions(arguments),
            },
            BoundExpression::Index {
                receiver,
                index,
                indexer,
            } => self.rewrite_index(*receiver, *index, indexer),
            BoundExpression::IndexAssignment {
                receiver,
                index,
                indexer,
                operator,
                value,
            } => BoundExpression::IndexAssignment {
                receiver: Box::new(self.rewrite_expression(*receiver)),
                index: Box::new(self.rewrite_expression(*index)),
                indexer,
                operator,
                value: Box::new(self.rewrite_expression(*value)),
            },
            BoundExpression::Conversion { ty, operand } => self.rewrite_conversion(ty, *operand),
            BoundExpression::ArrayCreation { ty, size } => BoundExpression::ArrayCreation {
                ty,
                size: Box::new(self.rewrite_expression(*size)),
            },
        }
    }

    /// Rewrites each expression in order
    fn rewrite_expressions(&mut self, expressions: Vec<BoundExpression>) -> Vec<BoundExpression> {
        expressions
            .into_iter()
            .map(|expression| self.rewrite_expression(expression))
            .collect()
    }

    /// Literal value
    fn rewrite_literal(&mut self, value: ConstValue) -> BoundExpression {
        BoundExpression::Literal(value)
    }

    /// Variable read
    fn rewrite_variable(&mut self, variable: VariableRef) -> BoundExpression {
        BoundExpression::Variable(variable)
    }

    /// `variable = value`
    fn rewrite_assignment(&mut self, variable: VariableRef, value: BoundExpression) -> BoundExpression {
        BoundExpression::Assignment {
            variable,
            value: Box::new(self.rewrite_expression(value)),
        }
    }

    /// Prefix operator
    fn rewrite_unary(&mut self, operator: BoundUnaryOperator, operand: BoundExpression) -> BoundExpression {
        BoundExpression::Unary {
            operator,
            operand: Box::new(self.rewrite_expression(operand)),
        }
    }

    /// Infix operator
    fn rewrite_binary(
        &mut self,
        left: BoundExpression,
        operator: BoundBinaryOperator,
        right: BoundExpression,
    ) -> BoundExpression {
        BoundExpression::Binary {
            left: Box::new(self.rewrite_expression(left)),
            operator,
            right: Box::new(self.rewrite_expression(right)),
        }
    }

    /// `receiver[index]`
    fn rewrite_index(
        &mut self,
        receiver: BoundExpression,
        index: BoundExpression,
        indexer: IndexerSymbol,
    ) -> BoundExpression {
        BoundExpression::Index {
            receiver: Box::new(self.rewrite_expression(receiver)),
            index: Box::new(self.rewrite_expression(index)),
            indexer,
        }
    }

    /// Conversion to `ty`
    fn rewrite_conversion(&mut self, ty: TypeRef, operand: BoundExpression) -> BoundExpression {
        BoundExpression::Conversion {
            ty,
            operand: Box::new(self.rewrite_expression(operand)),
        }
    }
}
