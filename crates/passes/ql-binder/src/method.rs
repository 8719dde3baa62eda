//! Binding of method bodies

use crate::context::BindContext;
use crate::overload::{Resolution, select_overload};
use crate::program::BindOptions;
use crate::scope::{ScopeId, ScopeKind};
use crate::BindError;
use ql_bound::{
    BoundBinaryOperator, BoundExpression, BoundMethod, BoundStatement, BoundUnaryOperator, Conversion, LoopLabels,
};
use ql_cfg::ControlFlowGraph;
use ql_diagnostics::DiagnosticKind;
use ql_lower::LoweringContext;
use ql_span::Span;
use ql_symbols::{
    ConstValue, IndexerSymbol, LabelSymbol, MethodKind, MethodSymbol, NamespaceSymbol, ParameterSymbol, TypeRef,
    VariableRef, VariableSymbol, builtins,
};
use ql_syntax::{SyntaxKind, SyntaxNode};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Child `index` of `node`, or an error naming the malformed node
///
/// # Errors
///
/// Returns [`BindError::MissingChild`] when `node` has fewer children.
pub fn child(node: &SyntaxNode, index: usize) -> Result<&SyntaxNode, BindError> {
    node.child(index).ok_or(BindError::MissingChild {
        kind: node.kind,
        span: node.span,
        index,
    })
}

/// Resolves the signature of a method declaration
///
/// # Errors
///
/// Returns [`BindError`] when the declaration lacks its parameter list or a
/// type reference is malformed.
pub fn bind_signature(
    ctx: &mut BindContext,
    node: &SyntaxNode,
    namespace: Option<NamespaceSymbol>,
) -> Result<MethodSymbol, BindError> {
    let parameter_list = node
        .child_of_kind(SyntaxKind::ParameterList)
        .ok_or(BindError::MissingChild {
            kind: node.kind,
            span: node.span,
            index: 0,
        })?;
    let mut parameters = Vec::with_capacity(parameter_list.children.len());
    for parameter in &parameter_list.children {
        parameters.push(ParameterSymbol {
            name: parameter.text.clone(),
            ty: ctx.resolve_type(child(parameter, 0)?)?,
        });
    }
    let return_type = match node.child_of_kind(SyntaxKind::ReturnType) {
        Some(return_type) => ctx.resolve_type(child(return_type, 0)?)?,
        None => Arc::clone(&builtins().void),
    };
    Ok(MethodSymbol {
        name: node.text.clone(),
        namespace,
        parameters,
        return_type,
        kind: MethodKind::User(ctx.fresh_method_id()),
    })
}

/// A declared method whose body is bound later
#[derive(Debug, Clone)]
pub struct PendingMethod<'syntax> {
    /// Resolved signature
    pub symbol: MethodSymbol,
    /// Where body diagnostics about the whole method point
    pub span: Span,
    /// Scope the method was declared in
    pub scope: ScopeId,
    /// Parameter nodes, for redeclaration spans
    pub parameters: &'syntax [SyntaxNode],
    /// Body statements
    pub statements: &'syntax [SyntaxNode],
}

impl<'syntax> PendingMethod<'syntax> {
    /// A method declared by a `MethodDeclaration` node
    ///
    /// # Errors
    ///
    /// Returns [`BindError::MissingChild`] when the node has no body block.
    pub fn declared(symbol: MethodSymbol, node: &'syntax SyntaxNode, scope: ScopeId) -> Result<Self, BindError> {
        let missing = |index| BindError::MissingChild {
            kind: node.kind,
            span: node.span,
            index,
        };
        let parameters = node.child_of_kind(SyntaxKind::ParameterList).ok_or_else(|| missing(0))?;
        let body = node
            .children
            .last()
            .filter(|last| last.kind == SyntaxKind::Block)
            .ok_or_else(|| missing(node.children.len()))?;
        Ok(Self {
            symbol,
            span: node.span,
            scope,
            parameters: &parameters.children,
            statements: &body.children,
        })
    }
}

/// Binds the body of `pending` and checks that every path returns a value
///
/// The return-path check only runs when the body bound without diagnostics.
///
/// # Errors
///
/// Returns [`BindError`] for malformed syntax. A failure of the lowering used
/// by the return-path check is reported as an internal diagnostic instead.
pub fn bind_method(
    ctx: &mut BindContext,
    options: &BindOptions,
    pending: &PendingMethod<'_>,
) -> Result<BoundMethod, BindError> {
    let reported = ctx.diagnostics.len();
    let scope = ctx.scopes.enter(pending.scope, ScopeKind::Method);
    let mut binder = MethodBinder::new(ctx, options, pending.symbol.clone(), scope);
    let method = binder.bind_body(pending.parameters, pending.statements)?;

    let builtins = builtins();
    let returns_value = method.symbol.return_type != builtins.void && method.symbol.return_type != builtins.error;
    if options.check_all_paths_return && returns_value && ctx.diagnostics.len() == reported {
        match all_paths_return(ctx, options, &method) {
            Ok(true) => {}
            Ok(false) => ctx.report(
                pending.span,
                DiagnosticKind::NotAllPathsReturn {
                    name: method.symbol.name.clone(),
                },
            ),
            Err(error) => {
                debug!(%error, method = %method.symbol, "return-path check failed");
                ctx.report(
                    pending.span,
                    DiagnosticKind::Internal {
                        message: error.to_string(),
                    },
                );
            }
        }
    }
    debug!(method = %method.symbol, "bound method");
    Ok(method)
}

/// Lowers a copy of the body and asks its graph whether every path returns
fn all_paths_return(ctx: &BindContext, options: &BindOptions, method: &BoundMethod) -> Result<bool, BindError> {
    let mut lowering = LoweringContext::new(options.lowering, ctx.labels.clone());
    let (body, _) = lowering.lower_body(&method.symbol.name, method.body.clone())?;
    Ok(ControlFlowGraph::from_body(&body)?.all_paths_return())
}

/// Operator and right operand of a bound compound element assignment
fn compound_parts(expression: BoundExpression) -> Option<(BoundBinaryOperator, BoundExpression)> {
    match expression {
        BoundExpression::Binary { operator, right, .. } => Some((operator, *right)),
        BoundExpression::Conversion { operand, .. } => compound_parts(*operand),
        _ => None,
    }
}

/// Where an assignment stores its value
enum AssignmentTarget {
    Variable(VariableRef),
    Element {
        receiver: BoundExpression,
        index: BoundExpression,
        indexer: IndexerSymbol,
    },
}

/// Binds the statements and expressions of one method
struct MethodBinder<'ctx> {
    ctx: &'ctx mut BindContext,
    options: &'ctx BindOptions,
    method: MethodSymbol,
    scope: ScopeId,
    labels: FxHashMap<String, LabelSymbol>,
    loops: Vec<LoopLabels>,
    nested: FxHashMap<Span, MethodSymbol>,
}

impl<'ctx> MethodBinder<'ctx> {
    fn new(ctx: &'ctx mut BindContext, options: &'ctx BindOptions, method: MethodSymbol, scope: ScopeId) -> Self {
        Self {
            ctx,
            options,
            method,
            scope,
            labels: FxHashMap::default(),
            loops: Vec::new(),
            nested: FxHashMap::default(),
        }
    }

    fn bind_body(
        &mut self,
        parameter_nodes: &[SyntaxNode],
        statements: &[SyntaxNode],
    ) -> Result<BoundMethod, BindError> {
        let mut parameters = Vec::with_capacity(self.method.parameters.len());
        for (ordinal, parameter) in self.method.parameters.iter().enumerate() {
            let variable = VariableSymbol::parameter(
                self.ctx.fresh_variable_id(),
                parameter.name.as_str(),
                Arc::clone(&parameter.ty),
                ordinal,
            );
            if !self.ctx.scopes.declare_variable(self.scope, &variable) {
                let span = parameter_nodes.get(ordinal).map_or(Span::default(), |node| node.span);
                self.ctx.report(
                    span,
                    DiagnosticKind::VariableAlreadyDeclared {
                        name: variable.name.clone(),
                    },
                );
            }
            parameters.push(variable);
        }
        self.declare_labels(statements);
        let body = self.bind_statements(statements)?;
        Ok(BoundMethod {
            symbol: self.method.clone(),
            parameters,
            body: BoundStatement::Block(body),
        })
    }

    /// Labels are method-scoped and declared up front so forward gotos resolve
    fn declare_labels(&mut self, nodes: &[SyntaxNode]) {
        for node in nodes {
            match node.kind {
                SyntaxKind::LabelStatement => {
                    if self.labels.contains_key(&node.text) {
                        self.ctx.report(
                            node.span,
                            DiagnosticKind::LabelAlreadyDeclared {
                                name: node.text.clone(),
                            },
                        );
                    } else {
                        let label = self.ctx.labels.named(&node.text);
                        self.labels.insert(node.text.clone(), label);
                    }
                }
                SyntaxKind::MethodDeclaration => {}
                _ => self.declare_labels(&node.children),
            }
        }
    }

    fn declare_nested_method(&mut self, node: &SyntaxNode) -> Result<MethodSymbol, BindError> {
        let symbol = bind_signature(self.ctx, node, None)?;
        if !self.ctx.scopes.declare_method(self.scope, symbol.clone()) {
            self.ctx.report(
                node.span,
                DiagnosticKind::MethodAlreadyDeclared {
                    name: symbol.name.clone(),
                },
            );
        }
        self.nested.insert(node.span, symbol.clone());
        Ok(symbol)
    }

    fn loop_labels(&mut self) -> LoopLabels {
        LoopLabels {
            break_label: self.ctx.labels.fresh("break"),
            continue_label: self.ctx.labels.fresh("continue"),
        }
    }

    // Statements

    fn bind_statements(&mut self, statements: &[SyntaxNode]) -> Result<Vec<BoundStatement>, BindError> {
        let outer = self.scope;
        self.scope = self.ctx.scopes.enter(outer, ScopeKind::Block);
        for statement in statements {
            if statement.kind == SyntaxKind::MethodDeclaration {
                self.declare_nested_method(statement)?;
            }
        }
        let mut bound = Vec::with_capacity(statements.len());
        for statement in statements {
            bound.push(self.bind_statement(statement)?);
        }
        self.scope = outer;
        Ok(bound)
    }

    fn bind_statement(&mut self, node: &SyntaxNode) -> Result<BoundStatement, BindError> {
        match node.kind {
            SyntaxKind::Block => Ok(BoundStatement::Block(self.bind_statements(&node.children)?)),
            SyntaxKind::VariableDeclaration => self.bind_declaration(node, false),
            SyntaxKind::ConstantDeclaration => self.bind_declaration(node, true),
            SyntaxKind::ExpressionStatement => Ok(BoundStatement::Expression(self.bind_expression(child(node, 0)?)?)),
            SyntaxKind::IfStatement => {
                let condition = self.bind_condition(child(node, 0)?)?;
                let then_statement = self.bind_statement(child(node, 1)?)?;
                let else_statement = node
                    .child(2)
                    .map(|statement| self.bind_statement(statement))
                    .transpose()?;
                Ok(BoundStatement::If {
                    condition,
                    then_statement: Box::new(then_statement),
                    else_statement: else_statement.map(Box::new),
                })
            }
            SyntaxKind::WhileStatement => {
                let condition = self.bind_condition(child(node, 0)?)?;
                let labels = self.loop_labels();
                let body = self.bind_loop_body(child(node, 1)?, &labels)?;
                Ok(BoundStatement::While {
                    condition,
                    body: Box::new(body),
                    labels,
                })
            }
            SyntaxKind::DoWhileStatement => {
                let labels = self.loop_labels();
                let body = self.bind_loop_body(child(node, 0)?, &labels)?;
                let condition = self.bind_condition(child(node, 1)?)?;
                Ok(BoundStatement::DoWhile {
                    body: Box::new(body),
                    condition,
                    labels,
                })
            }
            SyntaxKind::ForStatement => self.bind_for(node),
            SyntaxKind::BreakStatement | SyntaxKind::ContinueStatement => Ok(self.bind_loop_jump(node)),
            SyntaxKind::ReturnStatement => self.bind_return(node),
            SyntaxKind::LabelStatement => Ok(self
                .labels
                .get(&node.text)
                .map_or(BoundStatement::Nop, |label| BoundStatement::Label(label.clone()))),
            SyntaxKind::GotoStatement => {
                if let Some(label) = self.labels.get(&node.text) {
                    return Ok(BoundStatement::Goto(label.clone()));
                }
                self.ctx.report(
                    node.span,
                    DiagnosticKind::UndefinedLabel {
                        name: node.text.clone(),
                    },
                );
                Ok(BoundStatement::Nop)
            }
            SyntaxKind::MethodDeclaration => {
                let symbol = match self.nested.get(&node.span) {
                    Some(symbol) => symbol.clone(),
                    None => self.declare_nested_method(node)?,
                };
                let pending = PendingMethod::declared(symbol, node, self.scope)?;
                let method = bind_method(self.ctx, self.options, &pending)?;
                Ok(BoundStatement::MethodDeclaration(Box::new(method)))
            }
            kind => Err(BindError::UnexpectedNode {
                kind,
                span: node.span,
                expected: "a statement",
            }),
        }
    }

    fn bind_declaration(&mut self, node: &SyntaxNode, read_only: bool) -> Result<BoundStatement, BindError> {
        let (type_node, initializer_node) = match node.children.as_slice() {
            [initializer] => (None, initializer),
            [ty, initializer] => (Some(ty), initializer),
            _ => {
                return Err(BindError::MissingChild {
                    kind: node.kind,
                    span: node.span,
                    index: 0,
                });
            }
        };
        let initializer = self.bind_expression(initializer_node)?;
        let (ty, initializer) = match type_node {
            Some(type_node) => {
                let ty = self.ctx.resolve_type(type_node)?;
                let initializer = self.convert(initializer, &ty, initializer_node.span, false);
                (ty, initializer)
            }
            None => {
                let initializer = self.require_value(initializer, initializer_node.span);
                (initializer.ty(), initializer)
            }
        };

        let id = self.ctx.fresh_variable_id();
        let name = node.text.as_str();
        let variable = match &initializer {
            BoundExpression::Literal(value) if read_only => VariableSymbol::constant(id, name, ty, value.clone()),
            _ => VariableSymbol::local(id, name, ty, read_only),
        };
        if !self.ctx.scopes.declare_variable(self.scope, &variable) {
            self.ctx.report(
                node.span,
                DiagnosticKind::VariableAlreadyDeclared {
                    name: node.text.clone(),
                },
            );
        }
        Ok(BoundStatement::VariableDeclaration { variable, initializer })
    }

    fn bind_for(&mut self, node: &SyntaxNode) -> Result<BoundStatement, BindError> {
        let outer = self.scope;
        self.scope = self.ctx.scopes.enter(outer, ScopeKind::Block);
        let initializer = child(node, 0)?
            .child(0)
            .map(|statement| self.bind_statement(statement))
            .transpose()?;
        let condition = child(node, 1)?
            .child(0)
            .map(|condition| self.bind_condition(condition))
            .transpose()?;
        let update = child(node, 2)?
            .child(0)
            .map(|update| self.bind_expression(update))
            .transpose()?;
        let labels = self.loop_labels();
        let body = self.bind_loop_body(child(node, 3)?, &labels)?;
        self.scope = outer;
        Ok(BoundStatement::For {
            initializer: initializer.map(Box::new),
            condition,
            update,
            body: Box::new(body),
            labels,
        })
    }

    fn bind_loop_body(&mut self, node: &SyntaxNode, labels: &LoopLabels) -> Result<BoundStatement, BindError> {
        self.loops.push(labels.clone());
        let body = self.bind_statement(node);
        self.loops.pop();
        body
    }

    fn bind_loop_jump(&mut self, node: &SyntaxNode) -> BoundStatement {
        let is_break = node.kind == SyntaxKind::BreakStatement;
        match self.loops.last() {
            Some(labels) if is_break => BoundStatement::Goto(labels.break_label.clone()),
            Some(labels) => BoundStatement::Goto(labels.continue_label.clone()),
            None => {
                let keyword = if is_break { "break" } else { "continue" };
                self.ctx.report(
                    node.span,
                    DiagnosticKind::InvalidBreakOrContinue {
                        keyword: keyword.to_string(),
                    },
                );
                BoundStatement::Nop
            }
        }
    }

    fn bind_return(&mut self, node: &SyntaxNode) -> Result<BoundStatement, BindError> {
        let return_type = Arc::clone(&self.method.return_type);
        let is_void = return_type == builtins().void;
        let Some(value_node) = node.child(0) else {
            if !is_void {
                self.ctx.report(
                    node.span,
                    DiagnosticKind::MissingReturnValue {
                        name: self.method.name.clone(),
                        type_name: return_type.to_string(),
                    },
                );
            }
            return Ok(BoundStatement::Return(None));
        };
        let value = self.bind_expression(value_node)?;
        if is_void {
            self.ctx.report(
                node.span,
                DiagnosticKind::InvalidReturn {
                    name: self.method.name.clone(),
                },
            );
            return Ok(BoundStatement::Return(None));
        }
        Ok(BoundStatement::Return(Some(self.convert(
            value,
            &return_type,
            value_node.span,
            false,
        ))))
    }

    fn bind_condition(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        let condition = self.bind_expression(node)?;
        Ok(self.convert(condition, &builtins().bool, node.span, false))
    }

    // Conversions

    fn convert(&mut self, expression: BoundExpression, target: &TypeRef, span: Span, explicit: bool) -> BoundExpression {
        let from = expression.ty();
        let conversion = Conversion::classify(&from, target);
        match conversion {
            Conversion::Identity => expression,
            Conversion::Implicit => BoundExpression::Conversion {
                ty: Arc::clone(target),
                operand: Box::new(expression),
            },
            Conversion::Explicit if explicit => BoundExpression::Conversion {
                ty: Arc::clone(target),
                operand: Box::new(expression),
            },
            Conversion::Explicit => {
                self.ctx.report(
                    span,
                    DiagnosticKind::CannotImplicitlyConvert {
                        from: from.to_string(),
                        to: target.to_string(),
                    },
                );
                BoundExpression::Error
            }
            Conversion::None if from == builtins().void => {
                self.ctx.report(span, DiagnosticKind::ExpressionMustHaveValue);
                BoundExpression::Error
            }
            Conversion::None => {
                self.ctx.report(
                    span,
                    DiagnosticKind::NoExplicitConversion {
                        from: from.to_string(),
                        to: target.to_string(),
                    },
                );
                BoundExpression::Error
            }
        }
    }

    fn require_value(&mut self, expression: BoundExpression, span: Span) -> BoundExpression {
        if expression.ty() == builtins().void {
            self.ctx.report(span, DiagnosticKind::ExpressionMustHaveValue);
            return BoundExpression::Error;
        }
        expression
    }

    // Expressions

    fn bind_value(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        let expression = self.bind_expression(node)?;
        Ok(self.require_value(expression, node.span))
    }

    fn bind_expression(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        match node.kind {
            SyntaxKind::IntegerLiteral => Ok(self.bind_literal(node, "int", |text| text.parse().ok().map(ConstValue::Int))),
            SyntaxKind::FloatLiteral => Ok(self.bind_literal(node, "float", |text| text.parse().ok().map(ConstValue::Float))),
            SyntaxKind::StringLiteral => Ok(BoundExpression::Literal(ConstValue::String(node.text.clone()))),
            SyntaxKind::CharLiteral => Ok(self.bind_literal(node, "char", |text| {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(value), None) => Some(ConstValue::Char(value)),
                    _ => None,
                }
            })),
            SyntaxKind::BooleanLiteral => Ok(self.bind_literal(node, "bool", |text| text.parse().ok().map(ConstValue::Bool))),
            SyntaxKind::NameExpression => {
                if let Some(variable) = self.ctx.scopes.lookup_variable(self.scope, &node.text) {
                    return Ok(BoundExpression::Variable(variable));
                }
                self.ctx.report(
                    node.span,
                    DiagnosticKind::UndefinedName {
                        name: node.text.clone(),
                    },
                );
                Ok(BoundExpression::Error)
            }
            SyntaxKind::ParenthesizedExpression => self.bind_expression(child(node, 0)?),
            SyntaxKind::UnaryExpression => self.bind_unary(node),
            SyntaxKind::BinaryExpression => {
                let left = self.bind_value(child(node, 0)?)?;
                let right = self.bind_value(child(node, 1)?)?;
                Ok(self.bind_binary_operator(left, &node.text, right, node.span))
            }
            SyntaxKind::AssignmentExpression => {
                let value = self.bind_value(child(node, 1)?)?;
                let operator = match node.text.as_str() {
                    "=" => None,
                    compound => Some(compound.strip_suffix('=').unwrap_or(compound)),
                };
                self.bind_assignment(child(node, 0)?, operator, value, node.span)
            }
            SyntaxKind::CallExpression => self.bind_call(node),
            SyntaxKind::MemberAccessExpression => {
                let target = self.bind_value(child(node, 0)?)?;
                let ty = target.ty();
                if ty != builtins().error {
                    self.ctx.report(
                        node.span,
                        DiagnosticKind::UndefinedMember {
                            type_name: ty.to_string(),
                            member: node.text.clone(),
                        },
                    );
                }
                Ok(BoundExpression::Error)
            }
            SyntaxKind::ElementAccessExpression => Ok(self.bind_element(node)?.map_or(
                BoundExpression::Error,
                |(receiver, index, indexer)| BoundExpression::Index {
                    receiver: Box::new(receiver),
                    index: Box::new(index),
                    indexer,
                },
            )),
            SyntaxKind::CastExpression => {
                let ty = self.ctx.resolve_type(child(node, 0)?)?;
                let operand_node = child(node, 1)?;
                let operand = self.bind_value(operand_node)?;
                Ok(self.convert(operand, &ty, operand_node.span, true))
            }
            SyntaxKind::ArrayCreationExpression => self.bind_array_creation(node),
            kind => Err(BindError::UnexpectedNode {
                kind,
                span: node.span,
                expected: "an expression",
            }),
        }
    }

    fn bind_literal(
        &mut self,
        node: &SyntaxNode,
        type_name: &str,
        parse: impl FnOnce(&str) -> Option<ConstValue>,
    ) -> BoundExpression {
        if let Some(value) = parse(&node.text) {
            return BoundExpression::Literal(value);
        }
        self.ctx.report(
            node.span,
            DiagnosticKind::InvalidLiteral {
                text: node.text.clone(),
                type_name: type_name.to_string(),
            },
        );
        BoundExpression::Error
    }

    fn bind_unary(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        let operand_node = child(node, 0)?;
        let step = match node.text.as_str() {
            "++" => Some("+"),
            "--" => Some("-"),
            _ => None,
        };
        if let Some(operator) = step {
            let one = BoundExpression::Literal(ConstValue::Int(1));
            return self.bind_assignment(operand_node, Some(operator), one, node.span);
        }

        let operand = self.bind_value(operand_node)?;
        let ty = operand.ty();
        if ty == builtins().error {
            return Ok(BoundExpression::Error);
        }
        if let Some(operator) = BoundUnaryOperator::bind(&node.text, &ty) {
            return Ok(BoundExpression::Unary {
                operator,
                operand: Box::new(operand),
            });
        }
        self.ctx.report(
            node.span,
            DiagnosticKind::UndefinedUnaryOperator {
                operator: node.text.clone(),
                operand: ty.to_string(),
            },
        );
        Ok(BoundExpression::Error)
    }

    fn bind_binary_operator(
        &mut self,
        left: BoundExpression,
        operator: &str,
        right: BoundExpression,
        span: Span,
    ) -> BoundExpression {
        let (left_type, right_type) = (left.ty(), right.ty());
        let error = &builtins().error;
        if left_type == *error || right_type == *error {
            return BoundExpression::Error;
        }
        if let Some(operator) = BoundBinaryOperator::bind(operator, &left_type, &right_type) {
            return BoundExpression::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }
        self.ctx.report(
            span,
            DiagnosticKind::UndefinedBinaryOperator {
                operator: operator.to_string(),
                left: left_type.to_string(),
                right: right_type.to_string(),
            },
        );
        BoundExpression::Error
    }

    /// Binds `target = value`, or `target = target op value` for compound forms
    fn bind_assignment(
        &mut self,
        target_node: &SyntaxNode,
        operator: Option<&str>,
        value: BoundExpression,
        span: Span,
    ) -> Result<BoundExpression, BindError> {
        let Some(target) = self.bind_assignment_target(target_node)? else {
            return Ok(BoundExpression::Error);
        };
        Ok(match target {
            AssignmentTarget::Variable(variable) => {
                let mut value = value;
                if let Some(operator) = operator {
                    let current = BoundExpression::Variable(Arc::clone(&variable));
                    value = self.bind_binary_operator(current, operator, value, span);
                }
                let value = Box::new(self.convert(value, &variable.ty, span, false));
                BoundExpression::Assignment { variable, value }
            }
            AssignmentTarget::Element {
                receiver,
                index,
                indexer,
            } => {
                let (operator, value) = match operator {
                    None => (None, self.convert(value, &indexer.element, span, false)),
                    Some(operator) => {
                        // Type-checked against a read of the element; the store reads it itself
                        let current = BoundExpression::Index {
                            receiver: Box::new(receiver.clone()),
                            index: Box::new(index.clone()),
                            indexer: indexer.clone(),
                        };
                        let combined = self.bind_binary_operator(current, operator, value, span);
                        let checked = self.convert(combined, &indexer.element, span, false);
                        let Some((operator, right)) = compound_parts(checked) else {
                            return Ok(BoundExpression::Error);
                        };
                        (Some(operator), right)
                    }
                };
                BoundExpression::IndexAssignment {
                    receiver: Box::new(receiver),
                    index: Box::new(index),
                    indexer,
                    operator,
                    value: Box::new(value),
                }
            }
        })
    }

    fn bind_assignment_target(&mut self, node: &SyntaxNode) -> Result<Option<AssignmentTarget>, BindError> {
        match node.kind {
            SyntaxKind::NameExpression => {
                let Some(variable) = self.ctx.scopes.lookup_variable(self.scope, &node.text) else {
                    self.ctx.report(
                        node.span,
                        DiagnosticKind::UndefinedName {
                            name: node.text.clone(),
                        },
                    );
                    return Ok(None);
                };
                if variable.read_only {
                    self.ctx.report(
                        node.span,
                        DiagnosticKind::CannotAssignReadOnly {
                            name: variable.name.clone(),
                        },
                    );
                    return Ok(None);
                }
                Ok(Some(AssignmentTarget::Variable(variable)))
            }
            SyntaxKind::ElementAccessExpression => {
                let Some((receiver, index, indexer)) = self.bind_element(node)? else {
                    return Ok(None);
                };
                if indexer.read_only {
                    self.ctx.report(
                        node.span,
                        DiagnosticKind::CannotAssignReadOnly {
                            name: receiver.ty().to_string(),
                        },
                    );
                    return Ok(None);
                }
                Ok(Some(AssignmentTarget::Element {
                    receiver,
                    index,
                    indexer,
                }))
            }
            SyntaxKind::ParenthesizedExpression => self.bind_assignment_target(child(node, 0)?),
            _ => {
                self.ctx.report(node.span, DiagnosticKind::InvalidAssignmentTarget);
                Ok(None)
            }
        }
    }

    /// Receiver, converted index and indexer of `target[index]`
    fn bind_element(
        &mut self,
        node: &SyntaxNode,
    ) -> Result<Option<(BoundExpression, BoundExpression, IndexerSymbol)>, BindError> {
        let receiver = self.bind_value(child(node, 0)?)?;
        let index_node = child(node, 1)?;
        let index = self.bind_value(index_node)?;
        let ty = receiver.ty();
        if ty == builtins().error {
            return Ok(None);
        }
        let Some(indexer) = ty.indexer().cloned() else {
            self.ctx.report(
                node.span,
                DiagnosticKind::CannotIndex {
                    type_name: ty.to_string(),
                },
            );
            return Ok(None);
        };
        let index = self.convert(index, &indexer.index, index_node.span, false);
        Ok(Some((receiver, index, indexer)))
    }

    fn bind_array_creation(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        let ty = self.ctx.resolve_type(child(node, 0)?)?;
        let size_node = child(node, 1)?;
        let size = self.bind_value(size_node)?;
        let size = self.convert(size, &builtins().int, size_node.span, false);
        if ty == builtins().error {
            return Ok(BoundExpression::Error);
        }
        if ty.indexer().is_none() {
            self.ctx.report(
                node.span,
                DiagnosticKind::CannotIndex {
                    type_name: ty.to_string(),
                },
            );
            return Ok(BoundExpression::Error);
        }
        Ok(BoundExpression::ArrayCreation {
            ty,
            size: Box::new(size),
        })
    }

    // Calls

    fn bind_arguments(&mut self, node: &SyntaxNode) -> Result<Vec<(Span, BoundExpression)>, BindError> {
        let list = child(node, 1)?;
        let mut arguments = Vec::with_capacity(list.children.len());
        for argument in &list.children {
            arguments.push((argument.span, self.bind_value(argument)?));
        }
        Ok(arguments)
    }

    fn bind_call(&mut self, node: &SyntaxNode) -> Result<BoundExpression, BindError> {
        let callee = child(node, 0)?;
        match callee.kind {
            SyntaxKind::NameExpression => {
                let levels = self.ctx.method_levels(self.scope, &callee.text);
                let arguments = self.bind_arguments(node)?;
                Ok(self.finish_call(callee, &levels, arguments, None))
            }
            SyntaxKind::MemberAccessExpression => {
                let target = child(callee, 0)?;
                if let Some(namespace) = self.namespace_path(target) {
                    let arguments = self.bind_arguments(node)?;
                    let Some(methods) = self.ctx.namespace_methods(&namespace, &callee.text) else {
                        self.ctx.report(
                            target.span,
                            DiagnosticKind::UndefinedNamespace {
                                name: namespace.to_string(),
                            },
                        );
                        return Ok(BoundExpression::Error);
                    };
                    let levels = if methods.is_empty() { Vec::new() } else { vec![methods] };
                    return Ok(self.finish_call(callee, &levels, arguments, None));
                }

                let receiver = self.bind_value(target)?;
                let arguments = self.bind_arguments(node)?;
                let ty = receiver.ty();
                if ty == builtins().error {
                    return Ok(BoundExpression::Error);
                }
                let methods: Vec<MethodSymbol> = ty.methods_named(&callee.text).cloned().collect();
                if methods.is_empty() {
                    self.ctx.report(
                        callee.span,
                        DiagnosticKind::UndefinedMember {
                            type_name: ty.to_string(),
                            member: callee.text.clone(),
                        },
                    );
                    return Ok(BoundExpression::Error);
                }
                Ok(self.finish_call(callee, &[methods], arguments, Some(receiver)))
            }
            _ => {
                self.ctx.report(
                    callee.span,
                    DiagnosticKind::UndefinedMethod {
                        name: callee.text.clone(),
                    },
                );
                Ok(BoundExpression::Error)
            }
        }
    }

    /// Namespace named by a dotted callee target, after alias expansion
    ///
    /// Returns `None` when the first segment is a variable, or when a single
    /// segment is neither an alias nor a declared namespace, so the target is
    /// bound as a value instead.
    fn namespace_path(&self, target: &SyntaxNode) -> Option<NamespaceSymbol> {
        let mut segments = Vec::new();
        let mut current = target;
        loop {
            segments.push(current.text.clone());
            match current.kind {
                SyntaxKind::MemberAccessExpression => current = current.child(0)?,
                SyntaxKind::NameExpression => break,
                _ => return None,
            }
        }
        segments.reverse();
        let (first, rest) = segments.split_first()?;
        if self.ctx.scopes.lookup_variable(self.scope, first).is_some() {
            return None;
        }
        if let Some(alias) = self.ctx.scopes.resolve_alias(self.scope, first) {
            let mut expanded = alias.segments().to_vec();
            expanded.extend_from_slice(rest);
            return Some(NamespaceSymbol::from_segments(expanded));
        }
        let namespace = NamespaceSymbol::from_segments(segments.clone());
        (!rest.is_empty() || self.ctx.namespaces.contains_key(&namespace)).then_some(namespace)
    }

    fn finish_call(
        &mut self,
        callee: &SyntaxNode,
        levels: &[Vec<MethodSymbol>],
        arguments: Vec<(Span, BoundExpression)>,
        receiver: Option<BoundExpression>,
    ) -> BoundExpression {
        let name = callee.text.clone();
        let types: Vec<TypeRef> = arguments.iter().map(|(_, argument)| argument.ty()).collect();
        let has_errors = types.iter().any(|ty| *ty == builtins().error);
        let resolution = select_overload(levels, &types);
        trace!(name = %name, levels = levels.len(), ?resolution, "resolved call");

        let method = match resolution {
            Resolution::Found(method) => method,
            Resolution::Undefined => {
                self.ctx.report(callee.span, DiagnosticKind::UndefinedMethod { name });
                return BoundExpression::Error;
            }
            Resolution::WrongArgumentCount { expected } => {
                self.ctx.report(
                    callee.span,
                    DiagnosticKind::WrongArgumentCount {
                        name,
                        expected,
                        found: arguments.len(),
                    },
                );
                return BoundExpression::Error;
            }
            Resolution::NoMatch | Resolution::Ambiguous(_) if has_errors => return BoundExpression::Error,
            Resolution::NoMatch => {
                let arguments = types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                self.ctx
                    .report(callee.span, DiagnosticKind::NoMatchingOverload { name, arguments });
                return BoundExpression::Error;
            }
            Resolution::Ambiguous(candidates) => {
                let candidates = candidates.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                self.ctx
                    .report(callee.span, DiagnosticKind::AmbigousSymbolReference { name, candidates });
                return BoundExpression::Error;
            }
        };

        let mut converted = Vec::with_capacity(arguments.len());
        for ((span, argument), parameter) in arguments.into_iter().zip(&method.parameters) {
            converted.push(self.convert(argument, &parameter.ty, span, false));
        }
        if let Some(receiver) = receiver {
            return BoundExpression::MemberCall {
                receiver: Box::new(receiver),
                method,
                arguments: converted,
            };
        }
        BoundExpression::Call {
            method,
            arguments: converted,
        }
    }
}
