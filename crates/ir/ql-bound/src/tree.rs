//! Bound statements, expressions and methods

use crate::operators::{BoundBinaryOperator, BoundUnaryOperator};
use ql_diagnostics::Diagnostic;
use ql_symbols::{
    ConstValue, IndexerSymbol, LabelAllocator, LabelSymbol, MethodSymbol, TypeRef, VariableRef, builtins,
};
use std::iter;
use std::sync::Arc;

/// Labels a loop body jumps to for `break` and `continue`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopLabels {
    /// Target of `break`
    pub break_label: LabelSymbol,
    /// Target of `continue`
    pub continue_label: LabelSymbol,
}

/// A bound statement
#[derive(Debug, Clone, PartialEq)]
pub enum BoundStatement {
    /// Statements in order
    Block(Vec<BoundStatement>),
    /// `var`/`const` declaration with its initializer
    VariableDeclaration {
        /// Declared variable
        variable: VariableRef,
        /// Initial value
        initializer: BoundExpression,
    },
    /// Expression evaluated for its effect
    Expression(BoundExpression),
    /// `if (condition) then_statement else else_statement`
    If {
        /// Guard
        condition: BoundExpression,
        /// Taken when the guard is true
        then_statement: Box<BoundStatement>,
        /// Taken when the guard is false
        else_statement: Option<Box<BoundStatement>>,
    },
    /// `while (condition) body`
    While {
        /// Guard checked before every iteration
        condition: BoundExpression,
        /// Loop body
        body: Box<BoundStatement>,
        /// Break and continue targets
        labels: LoopLabels,
    },
    /// `do body while (condition)`
    DoWhile {
        /// Loop body
        body: Box<BoundStatement>,
        /// Guard checked after every iteration
        condition: BoundExpression,
        /// Break and continue targets
        labels: LoopLabels,
    },
    /// `for (initializer; condition; update) body`
    For {
        /// Runs once before the loop
        initializer: Option<Box<BoundStatement>>,
        /// Guard, missing means always true
        condition: Option<BoundExpression>,
        /// Runs after every iteration
        update: Option<BoundExpression>,
        /// Loop body
        body: Box<BoundStatement>,
        /// Break and continue targets
        labels: LoopLabels,
    },
    /// Jump target
    Label(LabelSymbol),
    /// Unconditional jump
    Goto(LabelSymbol),
    /// Jump taken when `condition` equals `jump_if_true`
    ConditionalGoto {
        /// Target
        label: LabelSymbol,
        /// Guard
        condition: BoundExpression,
        /// Guard value that takes the jump
        jump_if_true: bool,
    },
    /// Leaves the current method
    Return(Option<BoundExpression>),
    /// Method declared inside a body, hoisted by lowering
    MethodDeclaration(Box<BoundMethod>),
    /// Does nothing
    Nop,
}

/// A bound expression
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpression {
    /// Placeholder for an expression that failed to bind
    Error,
    /// Literal value
    Literal(ConstValue),
    /// Variable read
    Variable(VariableRef),
    /// `variable = value`, yields the assigned value
    Assignment {
        /// Assigned variable
        variable: VariableRef,
        /// New value
        value: Box<BoundExpression>,
    },
    /// Prefix operator application
    Unary {
        /// Resolved operator
        operator: BoundUnaryOperator,
        /// Operand
        operand: Box<BoundExpression>,
    },
    /// Infix operator application
    Binary {
        /// Left operand
        left: Box<BoundExpression>,
        /// Resolved operator
        operator: BoundBinaryOperator,
        /// Right operand
        right: Box<BoundExpression>,
    },
    /// Call of a global, namespaced or nested method
    Call {
        /// Resolved overload
        method: MethodSymbol,
        /// Arguments, already converted to parameter types
        arguments: Vec<BoundExpression>,
    },
    /// Call of a method declared on the receiver's type
    MemberCall {
        /// Receiver
        receiver: Box<BoundExpression>,
        /// Resolved member
        method: MethodSymbol,
        /// Arguments, already converted to parameter types
        arguments: Vec<BoundExpression>,
    },
    /// `receiver[index]`
    Index {
        /// Indexed value
        receiver: Box<BoundExpression>,
        /// Index
        index: Box<BoundExpression>,
        /// Resolved indexer of the receiver's concrete type
        indexer: IndexerSymbol,
    },
    /// `receiver[index] = value` or `receiver[index] op= value`, yields the
    /// stored value
    ///
    /// Receiver and index are evaluated once even for compound forms.
    IndexAssignment {
        /// Indexed value
        receiver: Box<BoundExpression>,
        /// Index
        index: Box<BoundExpression>,
        /// Resolved indexer of the receiver's concrete type
        indexer: IndexerSymbol,
        /// Operator combining the current element with `value`
        operator: Option<BoundBinaryOperator>,
        /// New element value, or the right operand of `operator`
        value: Box<BoundExpression>,
    },
    /// Implicit or explicit conversion to `ty`
    Conversion {
        /// Target type
        ty: TypeRef,
        /// Converted expression
        operand: Box<BoundExpression>,
    },
    /// `new Array<T>(size)`
    ArrayCreation {
        /// Concrete array type
        ty: TypeRef,
        /// Element count
        size: Box<BoundExpression>,
    },
}

impl BoundExpression {
    /// Resolved type of the expression
    pub fn ty(&self) -> TypeRef {
        match self {
            Self::Error => Arc::clone(&builtins().error),
            Self::Literal(value) => builtins().type_of(value),
            Self::Variable(variable) | Self::Assignment { variable, .. } => Arc::clone(&variable.ty),
            Self::Unary { operator, .. } => Arc::clone(&operator.result_type),
            Self::Binary { operator, .. } => Arc::clone(&operator.result_type),
            Self::Call { method, .. } | Self::MemberCall { method, .. } => Arc::clone(&method.return_type),
            Self::Index { indexer, .. } | Self::IndexAssignment { indexer, .. } => Arc::clone(&indexer.element),
            Self::Conversion { ty, .. } | Self::ArrayCreation { ty, .. } => Arc::clone(ty),
        }
    }

    /// Literal value, if this is a literal
    pub fn as_literal(&self) -> Option<&ConstValue> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<BoundNodeRef<'_>> {
        let expressions: Vec<&Self> = match self {
            Self::Error | Self::Literal(_) | Self::Variable(_) => Vec::new(),
            Self::Assignment { value, .. } => vec![value.as_ref()],
            Self::Unary { operand, .. } | Self::Conversion { operand, .. } => vec![operand.as_ref()],
            Self::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Call { arguments, .. } => arguments.iter().collect(),
            Self::MemberCall { receiver, arguments, .. } => {
                iter::once(receiver.as_ref()).chain(arguments).collect()
            }
            Self::Index { receiver, index, .. } => vec![receiver.as_ref(), index.as_ref()],
            Self::IndexAssignment {
                receiver, index, value, ..
            } => vec![receiver.as_ref(), index.as_ref(), value.as_ref()],
            Self::ArrayCreation { size, .. } => vec![size.as_ref()],
        };
        expressions.into_iter().map(BoundNodeRef::Expression).collect()
    }
}

impl BoundStatement {
    /// Direct children in execution order
    pub fn children(&self) -> Vec<BoundNodeRef<'_>> {
        match self {
            Self::Block(statements) => statements.iter().map(BoundNodeRef::Statement).collect(),
            Self::VariableDeclaration { initializer, .. } => vec![BoundNodeRef::Expression(initializer)],
            Self::Expression(expression) => vec![BoundNodeRef::Expression(expression)],
            Self::If {
                condition,
                then_statement,
                else_statement,
            } => {
                let mut children = vec![
                    BoundNodeRef::Expression(condition),
                    BoundNodeRef::Statement(then_statement),
                ];
                children.extend(else_statement.as_deref().map(BoundNodeRef::Statement));
                children
            }
            Self::While { condition, body, .. } => {
                vec![BoundNodeRef::Expression(condition), BoundNodeRef::Statement(body)]
            }
            Self::DoWhile { body, condition, .. } => {
                vec![BoundNodeRef::Statement(body), BoundNodeRef::Expression(condition)]
            }
            Self::For {
                initializer,
                condition,
                update,
                body,
                ..
            } => {
                let mut children = Vec::new();
                children.extend(initializer.as_deref().map(BoundNodeRef::Statement));
                children.extend(condition.as_ref().map(BoundNodeRef::Expression));
                children.push(BoundNodeRef::Statement(body));
                children.extend(update.as_ref().map(BoundNodeRef::Expression));
                children
            }
            Self::ConditionalGoto { condition, .. } => vec![BoundNodeRef::Expression(condition)],
            Self::Return(value) => value.iter().map(BoundNodeRef::Expression).collect(),
            Self::MethodDeclaration(method) => vec![BoundNodeRef::Statement(&method.body)],
            Self::Label(_) | Self::Goto(_) | Self::Nop => Vec::new(),
        }
    }

    /// Returns true for goto, conditional goto and return
    pub fn is_jump(&self) -> bool {
        matches!(self, Self::Goto(_) | Self::ConditionalGoto { .. } | Self::Return(_))
    }
}

/// Borrowed view of any bound node, for generic traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundNodeRef<'tree> {
    /// A statement
    Statement(&'tree BoundStatement),
    /// An expression
    Expression(&'tree BoundExpression),
}

impl<'tree> BoundNodeRef<'tree> {
    /// Direct children of the node
    pub fn children(self) -> Vec<Self> {
        match self {
            Self::Statement(statement) => statement.children(),
            Self::Expression(expression) => expression.children(),
        }
    }

    /// This node and all descendants, parents before children
    pub fn descendants(self) -> Vec<Self> {
        let mut nodes = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            nodes.push(node);
            let children = node.children();
            pending.extend(children.into_iter().rev());
        }
        nodes
    }
}

/// A method signature with its bound body
#[derive(Debug, Clone, PartialEq)]
pub struct BoundMethod {
    /// Signature
    pub symbol: MethodSymbol,
    /// Parameter variables in declaration order
    pub parameters: Vec<VariableRef>,
    /// Body, a block before lowering
    pub body: BoundStatement,
}

/// Output of the binder
#[derive(Debug, Clone, Default)]
pub struct BoundProgram {
    /// Top-level and namespaced methods in declaration order, entry included
    pub methods: Vec<BoundMethod>,
    /// Explicit or synthesized `main`
    pub entry: Option<MethodSymbol>,
    /// Diagnostics in report order
    pub diagnostics: Vec<Diagnostic>,
    /// Label allocator state after binding, so lowering keeps labels unique
    pub labels: LabelAllocator,
}

impl BoundProgram {
    /// Returns true when binding reported nothing
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
